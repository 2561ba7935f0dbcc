//! Event payload assembly and identity enrichment.

use serde_json::{Map, Value};

use crate::anonymize::FilteredIdentity;

/// Recognized identity keys in an outgoing payload.
pub const KEY_DOMAIN_USER_ID: &str = "duid";
pub const KEY_NETWORK_USER_ID: &str = "nuid";
pub const KEY_SESSION_ID: &str = "sid";
pub const KEY_SESSION_INDEX: &str = "vid";
pub const KEY_PAGE_VIEW_ID: &str = "pvid";
pub const KEY_USER_ID: &str = "uid";
pub const KEY_EVENT_ID: &str = "eid";
pub const KEY_APP_ID: &str = "aid";
pub const KEY_NAMESPACE: &str = "tna";
pub const KEY_PLATFORM: &str = "p";

/// Name-value mapping handed to the emitter, backed by a JSON object.
/// Suppressed identity fields are present with a JSON null value so the
/// collector can distinguish "anonymized" from "key not sent".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    entries: Map<String, Value>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string value. Empty strings are skipped, mirroring how absent
    /// event fields are simply not sent.
    pub fn add(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.entries.insert(key.to_string(), Value::from(value));
        }
    }

    /// Add a string value or an explicit null.
    pub fn add_nullable(&mut self, key: &str, value: Option<&str>) {
        let value = value.map(Value::from).unwrap_or(Value::Null);
        self.entries.insert(key.to_string(), value);
    }

    /// Add a numeric value or an explicit null.
    pub fn add_nullable_u32(&mut self, key: &str, value: Option<u32>) {
        let value = value.map(Value::from).unwrap_or(Value::Null);
        self.entries.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// True when the key is present with an explicit JSON null.
    pub fn is_null(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some(Value::Null))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The payload as a JSON object, for serialization by the emitter.
    pub fn to_json(&self) -> Value {
        Value::Object(self.entries.clone())
    }
}

/// Write identity state into an outgoing payload before emitter handoff.
///
/// This is the single point where identity becomes visible to the rest of
/// the pipeline; it persists nothing. Suppressed client identifiers land as
/// explicit nulls. The network user id is omitted entirely when unknown and
/// the mode does not mask it, since its true value is assigned downstream.
pub fn enrich(
    payload: &mut Payload,
    identity: &FilteredIdentity,
    network_user_id: Option<&str>,
    page_view_id: &str,
) {
    payload.add_nullable(KEY_DOMAIN_USER_ID, identity.domain_user_id.as_deref());
    payload.add_nullable(KEY_SESSION_ID, identity.session_id.as_deref());
    payload.add_nullable_u32(KEY_SESSION_INDEX, identity.session_index);
    payload.add_nullable(KEY_USER_ID, identity.user_id.as_deref());
    if let Some(nuid) = network_user_id {
        payload.add(KEY_NETWORK_USER_ID, nuid);
    }
    payload.add(KEY_PAGE_VIEW_ID, page_view_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exposed_identity() -> FilteredIdentity {
        FilteredIdentity {
            domain_user_id: Some("11111111-1111-4111-8111-111111111111".into()),
            session_id: Some("22222222-2222-4222-8222-222222222222".into()),
            session_index: Some(4),
            user_id: Some("dave".into()),
        }
    }

    // --- Payload basics ---

    #[test]
    fn add_skips_empty_strings() {
        let mut payload = Payload::new();
        payload.add("aid", "");
        payload.add("tna", "sp1");
        assert!(!payload.contains_key("aid"));
        assert_eq!(payload.get_str("tna"), Some("sp1"));
    }

    #[test]
    fn add_nullable_writes_explicit_null() {
        let mut payload = Payload::new();
        payload.add_nullable("duid", None);
        assert!(payload.contains_key("duid"));
        assert!(payload.is_null("duid"));
    }

    #[test]
    fn to_json_is_an_object() {
        let mut payload = Payload::new();
        payload.add("aid", "shop");
        payload.add_nullable_u32("vid", Some(2));
        let json = payload.to_json();
        assert_eq!(json["aid"], "shop");
        assert_eq!(json["vid"], 2);
    }

    // --- Enrichment ---

    #[test]
    fn enrich_writes_exposed_identity() {
        let mut payload = Payload::new();
        enrich(
            &mut payload,
            &exposed_identity(),
            Some("33333333-3333-4333-8333-333333333333"),
            "44444444-4444-4444-8444-444444444444",
        );

        assert_eq!(
            payload.get_str(KEY_DOMAIN_USER_ID),
            Some("11111111-1111-4111-8111-111111111111")
        );
        assert_eq!(
            payload.get_str(KEY_SESSION_ID),
            Some("22222222-2222-4222-8222-222222222222")
        );
        assert_eq!(payload.get(KEY_SESSION_INDEX), Some(&Value::from(4u32)));
        assert_eq!(payload.get_str(KEY_USER_ID), Some("dave"));
        assert_eq!(
            payload.get_str(KEY_NETWORK_USER_ID),
            Some("33333333-3333-4333-8333-333333333333")
        );
        assert_eq!(
            payload.get_str(KEY_PAGE_VIEW_ID),
            Some("44444444-4444-4444-8444-444444444444")
        );
    }

    #[test]
    fn enrich_writes_nulls_for_suppressed_identity() {
        let mut payload = Payload::new();
        enrich(
            &mut payload,
            &FilteredIdentity::default(),
            None,
            "44444444-4444-4444-8444-444444444444",
        );

        assert!(payload.is_null(KEY_DOMAIN_USER_ID));
        assert!(payload.is_null(KEY_SESSION_ID));
        assert!(payload.is_null(KEY_SESSION_INDEX));
        assert!(payload.is_null(KEY_USER_ID));
        // Unknown and unmasked network user id is not sent at all.
        assert!(!payload.contains_key(KEY_NETWORK_USER_ID));
        // The page view id is never suppressed.
        assert_eq!(
            payload.get_str(KEY_PAGE_VIEW_ID),
            Some("44444444-4444-4444-8444-444444444444")
        );
    }

    #[test]
    fn enrich_preserves_existing_event_fields() {
        let mut payload = Payload::new();
        payload.add("e", "pv");
        payload.add("page_title", "Home");
        enrich(&mut payload, &exposed_identity(), None, "pv-id");
        assert_eq!(payload.get_str("e"), Some("pv"));
        assert_eq!(payload.get_str("page_title"), Some("Home"));
    }

    #[test]
    fn enrich_does_not_omit_session_fields_when_absent() {
        // Contract: the recognized identity keys are always present after
        // enrichment, null or not, except the network user id.
        let mut payload = Payload::new();
        enrich(&mut payload, &FilteredIdentity::default(), None, "pv-id");
        for key in [KEY_DOMAIN_USER_ID, KEY_SESSION_ID, KEY_SESSION_INDEX, KEY_USER_ID] {
            assert!(payload.contains_key(key), "missing {key}");
        }
    }
}
