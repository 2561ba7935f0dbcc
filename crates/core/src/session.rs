//! Durable identity record and session lifecycle.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ids;
use crate::storage::{BackendKind, StorageBackend};

/// The durable per-visitor record, persisted as a JSON object under the
/// namespace-qualified storage key.
///
/// Deserialization requires every non-optional field, so a partially
/// corrupt stored record fails to parse and is recreated from scratch —
/// tracking availability wins over continuity of a damaged record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityRecord {
    /// Stable visitor identifier, created on first access.
    pub domain_user_id: String,
    /// Regenerated whenever a new session starts.
    pub session_id: String,
    /// Ordinal count of sessions for this visitor; starts at 1 and never
    /// decreases while the stored record survives.
    pub session_index: u32,
    /// Session id of the session before the current one, if any.
    #[serde(default)]
    pub previous_session_id: Option<String>,
    /// Event id of the first event observed in the current session.
    #[serde(default)]
    pub first_event_id: Option<String>,
    /// When the current session started, epoch milliseconds.
    pub created_at_ms: i64,
    /// Last time any event touched this record, epoch milliseconds.
    pub last_accessed_ms: i64,
    /// Mirror of `session_index`, kept for hosts reading visit counts.
    pub visit_count: u32,
}

/// Owns the durable identity record for one (namespace × storage scope).
///
/// The storage backend is the arbiter of the current durable value: every
/// operation re-reads it first, so concurrent instances sharing a scope
/// converge on the last written record. The in-memory copy is authoritative
/// only while the backend has nothing (refused or forbidden writes), and a
/// refused write is retried on the next mutation.
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
    key: String,
    /// False when the anonymization mode forbids durable writes.
    persist: bool,
    /// Storage lifetime for writes; doubles as the logical expiry horizon
    /// for backends that never expire values themselves.
    lifetime_secs: i64,
    cached: Option<IdentityRecord>,
    write_pending: bool,
}

impl SessionStore {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        key: String,
        persist: bool,
        lifetime_secs: i64,
    ) -> Self {
        Self {
            backend,
            key,
            persist,
            lifetime_secs,
            cached: None,
            write_pending: false,
        }
    }

    /// The storage key this store reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current record, creating and persisting a fresh one if neither the
    /// backend nor the page-lifetime cache has a usable value.
    pub fn get_or_create(&mut self, now_ms: i64) -> IdentityRecord {
        let (record, created) = match self.load(now_ms).or_else(|| self.cached.clone()) {
            Some(record) => (record, false),
            None => (Self::fresh(now_ms), true),
        };
        self.cached = Some(record.clone());
        if created || self.write_pending {
            self.write_through(&record);
        }
        record
    }

    /// Evaluate session timeout at `now_ms` and persist the result.
    ///
    /// Idle time beyond `session_timeout_ms` rolls the session: new session
    /// id, session index incremented by exactly one, session start reset to
    /// now. Otherwise only `last_accessed_ms` moves. `event_id` becomes the
    /// session's first event id when none is recorded yet.
    pub fn touch(
        &mut self,
        session_timeout_ms: u64,
        now_ms: i64,
        event_id: Option<&str>,
    ) -> IdentityRecord {
        let mut record = match self.load(now_ms).or_else(|| self.cached.clone()) {
            Some(mut record) => {
                let idle_ms = now_ms.saturating_sub(record.last_accessed_ms);
                if idle_ms > session_timeout_ms as i64 {
                    Self::roll_session(&mut record, now_ms);
                }
                record.last_accessed_ms = now_ms;
                record
            }
            None => Self::fresh(now_ms),
        };

        if record.first_event_id.is_none() {
            record.first_event_id = event_id.map(str::to_string);
        }

        self.cached = Some(record.clone());
        self.write_through(&record);
        record
    }

    fn fresh(now_ms: i64) -> IdentityRecord {
        IdentityRecord {
            domain_user_id: ids::new_id(),
            session_id: ids::new_id(),
            session_index: 1,
            previous_session_id: None,
            first_event_id: None,
            created_at_ms: now_ms,
            last_accessed_ms: now_ms,
            visit_count: 1,
        }
    }

    fn roll_session(record: &mut IdentityRecord, now_ms: i64) {
        record.previous_session_id = Some(std::mem::replace(
            &mut record.session_id,
            ids::new_id(),
        ));
        record.session_index += 1;
        record.visit_count += 1;
        record.created_at_ms = now_ms;
        record.first_event_id = None;
    }

    /// Read the backend value, discarding expired or corrupt records.
    fn load(&self, now_ms: i64) -> Option<IdentityRecord> {
        let raw = self.backend.read(&self.key)?;
        match serde_json::from_str::<IdentityRecord>(&raw) {
            Ok(record) => {
                // Backends without their own expiry get a logical one.
                let expired = self.backend.kind() == BackendKind::Local
                    && now_ms.saturating_sub(record.last_accessed_ms)
                        > self.lifetime_secs.saturating_mul(1000);
                if expired {
                    tracing::debug!(key = %self.key, "stored identity record past its lifetime, discarding");
                    None
                } else {
                    Some(record)
                }
            }
            Err(err) => {
                tracing::debug!(key = %self.key, error = %err, "corrupt identity record, discarding");
                None
            }
        }
    }

    fn write_through(&mut self, record: &IdentityRecord) {
        if !self.persist {
            self.write_pending = false;
            return;
        }
        match serde_json::to_string(record) {
            Ok(raw) => {
                let accepted = self.backend.write(&self.key, &raw, self.lifetime_secs);
                if !accepted {
                    tracing::debug!(
                        key = %self.key,
                        "identity write refused, continuing with in-memory record"
                    );
                }
                self.write_pending = !accepted;
            }
            Err(err) => {
                tracing::debug!(key = %self.key, error = %err, "identity record not serializable");
            }
        }
    }
}
