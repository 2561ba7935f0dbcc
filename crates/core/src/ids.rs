//! Identifier generation — canonical v4-UUID text and cookie-name suffixes.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// The all-zero UUID emitted as the network user id when it is deliberately
/// withheld. Downstream systems read it as "suppressed", not "unknown".
pub const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Generate a random identifier in canonical lowercase 8-4-4-4-12 layout.
/// One is minted per new domain user, per new session, per page view, and
/// per event, so uniform distribution within a page load is all that matters.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Whether `s` matches the canonical lowercase 8-4-4-4-12 hex UUID layout.
pub fn is_uuid_shaped(s: &str) -> bool {
    let group_lens = [8usize, 4, 4, 4, 12];
    let parts: Vec<&str> = s.split('-').collect();
    parts.len() == group_lens.len()
        && parts.iter().zip(group_lens).all(|(part, len)| {
            part.len() == len
                && part
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        })
}

/// Short hex suffix derived from the cookie scope, appended to cookie names
/// so trackers scoped to different domains on one page get distinct cookies.
pub fn scope_suffix(scope: &str) -> String {
    let digest = Sha256::digest(scope.as_bytes());
    format!("{:02x}{:02x}", digest[0], digest[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_is_uuid_shaped() {
        let id = new_id();
        assert!(is_uuid_shaped(&id), "not UUID-shaped: {id}");
    }

    #[test]
    fn new_id_is_unique_across_calls() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
    }

    #[test]
    fn nil_uuid_is_uuid_shaped() {
        assert!(is_uuid_shaped(NIL_UUID));
        assert_eq!(NIL_UUID, &Uuid::nil().to_string());
    }

    #[test]
    fn uuid_shape_rejects_malformed_input() {
        assert!(!is_uuid_shaped(""));
        assert!(!is_uuid_shaped("not-a-uuid"));
        assert!(!is_uuid_shaped("00000000-0000-0000-0000-00000000000")); // short
        assert!(!is_uuid_shaped("00000000-0000-0000-0000-0000000000000")); // long
        assert!(!is_uuid_shaped("0000000000000-0000-0000-000000000000"));
        assert!(!is_uuid_shaped("gggggggg-0000-0000-0000-000000000000"));
    }

    #[test]
    fn uuid_shape_rejects_uppercase() {
        assert!(!is_uuid_shaped("ABCDEF00-0000-0000-0000-000000000000"));
    }

    #[test]
    fn scope_suffix_is_four_lowercase_hex_chars() {
        let suffix = scope_suffix("example.com");
        assert_eq!(suffix.len(), 4);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn scope_suffix_is_stable_and_scope_dependent() {
        assert_eq!(scope_suffix("example.com"), scope_suffix("example.com"));
        assert_ne!(scope_suffix("example.com"), scope_suffix("example.org"));
    }
}
