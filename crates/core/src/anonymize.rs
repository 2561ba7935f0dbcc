//! Anonymization policy — which identifiers survive to the outgoing payload.
//!
//! Suppression is enforced at two layers. Persistence is gated where the
//! storage backend is selected (see `storage::select_backend`); exposure is
//! gated here, as a pure function, so `server` mode can keep persisting real
//! values locally while the collector-assigned identifier is withheld.

use crate::config::AnonymizationMode;
use crate::ids;
use crate::session::IdentityRecord;

/// Identity fields as they may appear in an outgoing payload.
/// `None` means the field is written as JSON null.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilteredIdentity {
    pub domain_user_id: Option<String>,
    pub session_id: Option<String>,
    pub session_index: Option<u32>,
    pub user_id: Option<String>,
}

/// Apply the exposure half of the policy to the current record.
///
/// Under `client` and `both` every client-assigned identifier is suppressed,
/// including the application-assigned user id. The record itself is left
/// untouched; suppression happens only at this point of exposure.
pub fn apply(
    mode: AnonymizationMode,
    record: &IdentityRecord,
    user_id: Option<&str>,
) -> FilteredIdentity {
    if !mode.exposes_client_ids() {
        return FilteredIdentity::default();
    }
    FilteredIdentity {
        domain_user_id: Some(record.domain_user_id.clone()),
        session_id: Some(record.session_id.clone()),
        session_index: Some(record.session_index),
        user_id: user_id.map(str::to_string),
    }
}

/// The network user id value to emit.
///
/// The true value is supplied externally (collector-side cookie); this
/// engine only decides between passing it through and replacing it with the
/// all-zero sentinel that tells downstream systems the value was
/// deliberately withheld.
pub fn network_user_id(mode: AnonymizationMode, external: Option<&str>) -> Option<String> {
    if mode.masks_network_user_id() {
        Some(ids::NIL_UUID.to_string())
    } else {
        external.map(str::to_string)
    }
}
