//! Tracker instance — an explicit per-instance context owning its own
//! session store, anonymization policy, and storage backend. No globals;
//! two trackers on one page interact only through shared storage.

use chrono::Utc;

use crate::anonymize;
use crate::config::TrackerConfig;
use crate::emitter::Emitter;
use crate::error::Result;
use crate::ids;
use crate::page::PageViewTracker;
use crate::payload::{self, Payload};
use crate::session::{IdentityRecord, SessionStore};
use crate::storage::{self, StorageEnvironment};

pub struct Tracker {
    config: TrackerConfig,
    store: SessionStore,
    page: PageViewTracker,
    emitters: Vec<Box<dyn Emitter>>,
    user_id: Option<String>,
    domain_user_id_override: Option<String>,
    network_user_id: Option<String>,
}

impl Tracker {
    /// Build a tracker from a validated configuration and the page's shared
    /// storage environment. Backend selection and the capability probe run
    /// here, once; nothing about storage is re-decided per event.
    pub fn new(
        config: TrackerConfig,
        env: &StorageEnvironment,
        emitters: Vec<Box<dyn Emitter>>,
    ) -> Result<Self> {
        config.validate()?;
        let backend = storage::select_backend(&config, env);
        let store = SessionStore::new(
            backend,
            storage::identity_key(&config),
            config.anonymize.allows_persistence(),
            config.cookie_lifetime_secs,
        );
        Ok(Self {
            config,
            store,
            page: PageViewTracker::new(),
            emitters,
            user_id: None,
            domain_user_id_override: None,
            network_user_id: None,
        })
    }

    /// Track an event, stamping identity at the current wall clock.
    pub fn track(&mut self, payload: Payload) {
        self.track_at(payload, Utc::now().timestamp_millis());
    }

    /// Track an event at an explicit epoch-millisecond timestamp.
    ///
    /// The session-timeout decision is a pure function of this timestamp,
    /// so embedders with their own clock get deterministic rollovers.
    pub fn track_at(&mut self, mut payload: Payload, now_ms: i64) {
        let event_id = ids::new_id();
        let record = self
            .store
            .touch(self.config.session_timeout_ms, now_ms, Some(&event_id));

        let mut identity =
            anonymize::apply(self.config.anonymize, &record, self.user_id.as_deref());
        if identity.domain_user_id.is_some() {
            if let Some(duid) = &self.domain_user_id_override {
                identity.domain_user_id = Some(duid.clone());
            }
        }
        let network_user_id =
            anonymize::network_user_id(self.config.anonymize, self.network_user_id.as_deref());

        payload.add(payload::KEY_EVENT_ID, &event_id);
        payload.add(payload::KEY_APP_ID, &self.config.app_id);
        payload.add(payload::KEY_NAMESPACE, &self.config.namespace);
        payload.add(payload::KEY_PLATFORM, &self.config.platform);

        let page_view_id = self.page.current();
        payload::enrich(&mut payload, &identity, network_user_id.as_deref(), &page_view_id);

        for emitter in &self.emitters {
            emitter.input(payload.clone());
        }
    }

    /// Track a page-view event. Rotates the page view id first, so
    /// sub-events that follow share the new id.
    pub fn track_page_view(&mut self, payload: Payload) {
        self.page.new_page_view();
        self.track(payload);
    }

    /// [`Tracker::track_page_view`] at an explicit timestamp.
    pub fn track_page_view_at(&mut self, payload: Payload, now_ms: i64) {
        self.page.new_page_view();
        self.track_at(payload, now_ms);
    }

    /// Set the application-assigned business user id.
    pub fn set_user_id(&mut self, user_id: impl Into<String>) {
        self.user_id = Some(user_id.into());
    }

    /// Override the domain user id exposed in payloads. The durable record
    /// keeps its own identifier.
    pub fn set_domain_user_id(&mut self, user_id: impl Into<String>) {
        self.domain_user_id_override = Some(user_id.into());
    }

    /// Supply the network user id assigned by the collector side. The engine
    /// never generates one itself.
    pub fn set_network_user_id(&mut self, user_id: impl Into<String>) {
        self.network_user_id = Some(user_id.into());
    }

    pub fn add_emitter(&mut self, emitter: Box<dyn Emitter>) {
        self.emitters.push(emitter);
    }

    /// The current domain user id, honoring the exposure policy: `None`
    /// under client/both anonymization.
    pub fn domain_user_id(&mut self) -> Option<String> {
        if !self.config.anonymize.exposes_client_ids() {
            return None;
        }
        if let Some(duid) = &self.domain_user_id_override {
            return Some(duid.clone());
        }
        let record = self.store.get_or_create(Utc::now().timestamp_millis());
        Some(record.domain_user_id)
    }

    /// The full identity record, honoring the exposure policy.
    pub fn domain_user_info(&mut self) -> Option<IdentityRecord> {
        if !self.config.anonymize.exposes_client_ids() {
            return None;
        }
        Some(self.store.get_or_create(Utc::now().timestamp_millis()))
    }

    /// The storage key (cookie name, for cookie storage) holding the
    /// durable identity record.
    pub fn storage_key(&self) -> &str {
        self.store.key()
    }

    /// The active page view id, minted lazily before the first page view.
    pub fn page_view_id(&mut self) -> String {
        self.page.current()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
