//! Storage backends for durable identity state.
//!
//! One backend variant is selected per tracker instance at construction — a
//! capability probe, not per-call feature detection — and consumed through
//! the uniform [`StorageBackend`] trait thereafter.

pub mod cookie;
pub mod local;
pub mod memory;

use std::sync::Arc;

pub use cookie::{CookieJar, CookieStorage, PageOrigin};
pub use local::{LocalStorage, LocalStore};
pub use memory::MemoryStorage;

use crate::config::{StorageStrategy, TrackerConfig};
use crate::ids;

/// Key used by the one-time capability probe.
const PROBE_KEY: &str = "_bc_probe";

/// Uniform get/set/remove over one persistence variant.
///
/// `write` returns `false` when the backend refused the write (blocked
/// storage, foreign cookie domain, insecure origin). Refusal is an expected
/// outcome the caller tolerates, never an error.
pub trait StorageBackend: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str, ttl_secs: i64) -> bool;
    fn remove(&self, key: &str);
    /// Which variant this backend is; fixed for the life of the instance.
    fn kind(&self) -> BackendKind;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Cookie,
    Local,
    Memory,
}

/// Shared page-level storage handles. Tracker instances on the same page
/// are given clones of one environment, which is what lets a second tracker
/// (or a later page load reusing the environment) observe the durable
/// record the first one wrote.
#[derive(Clone, Default)]
pub struct StorageEnvironment {
    pub cookies: CookieJar,
    pub local: LocalStore,
    pub origin: PageOrigin,
}

impl StorageEnvironment {
    pub fn new(origin: PageOrigin) -> Self {
        Self {
            cookies: CookieJar::new(),
            local: LocalStore::new(),
            origin,
        }
    }
}

/// Namespace-qualified key under which the identity record is stored.
/// Stable across process restarts so a returning visitor is recognized;
/// cookie-backed keys carry a short scope suffix so differently-scoped
/// tracker configurations on one page use distinct cookie names.
pub fn identity_key(config: &TrackerConfig) -> String {
    let base = format!("_bc_{}id", config.namespace);
    match config.storage {
        StorageStrategy::Cookie => {
            let scope = config.cookie_domain.as_deref().unwrap_or("");
            format!("{base}.{}", ids::scope_suffix(scope))
        }
        StorageStrategy::LocalStorage | StorageStrategy::Memory => base,
    }
}

/// Select the backend for one tracker instance.
///
/// Anonymization takes precedence over the configured strategy: modes that
/// forbid persistence always get the in-memory backend. Otherwise the
/// configured variant is probed once with a write/read/remove cycle and the
/// engine falls back to in-memory identity when the probe fails, rather
/// than surfacing an error to the embedding application.
pub fn select_backend(config: &TrackerConfig, env: &StorageEnvironment) -> Arc<dyn StorageBackend> {
    if !config.anonymize.allows_persistence() {
        tracing::debug!(
            namespace = %config.namespace,
            "anonymization forbids persistence, using in-memory identity"
        );
        return Arc::new(MemoryStorage::new());
    }

    let candidate: Arc<dyn StorageBackend> = match config.storage {
        StorageStrategy::Cookie => Arc::new(CookieStorage::new(
            env.cookies.clone(),
            env.origin.clone(),
            config,
        )),
        StorageStrategy::LocalStorage => Arc::new(LocalStorage::new(env.local.clone())),
        StorageStrategy::Memory => return Arc::new(MemoryStorage::new()),
    };

    if probe(candidate.as_ref()) {
        candidate
    } else {
        tracing::warn!(
            namespace = %config.namespace,
            strategy = ?config.storage,
            "storage unavailable, tracking without durable identity"
        );
        Arc::new(MemoryStorage::new())
    }
}

fn probe(backend: &dyn StorageBackend) -> bool {
    if !backend.write(PROBE_KEY, "1", 60) {
        return false;
    }
    let readable = backend.read(PROBE_KEY).as_deref() == Some("1");
    backend.remove(PROBE_KEY);
    readable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnonymizationMode;

    fn cookie_config() -> TrackerConfig {
        let mut config = TrackerConfig::new("sp1", "shop");
        config.cookie_domain = Some("example.com".into());
        config
    }

    // --- Key naming ---

    #[test]
    fn identity_key_is_namespace_qualified() {
        let mut config = TrackerConfig::new("sp1", "shop");
        config.storage = StorageStrategy::LocalStorage;
        assert_eq!(identity_key(&config), "_bc_sp1id");
    }

    #[test]
    fn cookie_identity_key_carries_scope_suffix() {
        let config = cookie_config();
        let key = identity_key(&config);
        let suffix = ids::scope_suffix("example.com");
        assert_eq!(key, format!("_bc_sp1id.{suffix}"));
    }

    #[test]
    fn identity_keys_differ_per_namespace() {
        let a = identity_key(&cookie_config());
        let mut config = cookie_config();
        config.namespace = "sp2".into();
        let b = identity_key(&config);
        assert_ne!(a, b);
    }

    #[test]
    fn identity_key_is_stable_across_instances() {
        assert_eq!(identity_key(&cookie_config()), identity_key(&cookie_config()));
    }

    // --- Backend selection ---

    #[test]
    fn selects_cookie_backend_when_available() {
        let env = StorageEnvironment::new(PageOrigin::new("shop.example.com", true));
        let backend = select_backend(&cookie_config(), &env);
        assert_eq!(backend.kind(), BackendKind::Cookie);
    }

    #[test]
    fn selects_local_backend_when_configured() {
        let env = StorageEnvironment::default();
        let mut config = TrackerConfig::new("sp1", "shop");
        config.storage = StorageStrategy::LocalStorage;
        let backend = select_backend(&config, &env);
        assert_eq!(backend.kind(), BackendKind::Local);
    }

    #[test]
    fn falls_back_to_memory_when_secure_cookie_unavailable() {
        // Insecure page, cookie_secure stays at its default of true.
        let env = StorageEnvironment::new(PageOrigin::new("shop.example.com", false));
        let backend = select_backend(&cookie_config(), &env);
        assert_eq!(backend.kind(), BackendKind::Memory);
    }

    #[test]
    fn falls_back_to_memory_when_local_storage_blocked() {
        let env = StorageEnvironment::default();
        env.local.block();
        let mut config = TrackerConfig::new("sp1", "shop");
        config.storage = StorageStrategy::LocalStorage;
        let backend = select_backend(&config, &env);
        assert_eq!(backend.kind(), BackendKind::Memory);
    }

    #[test]
    fn anonymization_overrides_configured_strategy() {
        let env = StorageEnvironment::new(PageOrigin::new("shop.example.com", true));
        for mode in [AnonymizationMode::Client, AnonymizationMode::Both] {
            let mut config = cookie_config();
            config.anonymize = mode;
            let backend = select_backend(&config, &env);
            assert_eq!(backend.kind(), BackendKind::Memory);
        }
    }

    #[test]
    fn server_mode_keeps_durable_storage() {
        let env = StorageEnvironment::new(PageOrigin::new("shop.example.com", true));
        let mut config = cookie_config();
        config.anonymize = AnonymizationMode::Server;
        let backend = select_backend(&config, &env);
        assert_eq!(backend.kind(), BackendKind::Cookie);
    }

    #[test]
    fn probe_leaves_no_residue() {
        let env = StorageEnvironment::new(PageOrigin::new("shop.example.com", true));
        let _ = select_backend(&cookie_config(), &env);
        assert!(!env.cookies.contains(PROBE_KEY));
    }
}
