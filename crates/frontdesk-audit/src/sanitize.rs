//! Metadata sanitization.
//!
//! Two rules, applied in order:
//! 1. Keys that look like secrets (`password`, `token`, `secret`, `key`)
//!    are dropped entirely.
//! 2. Keys that carry PII (`email`, `phone`, `name`) are rewritten to
//!    `<key>_hash` holding the PII hash of the value.

use frontdesk_core::hash_pii;
use serde_json::{Map, Value};

/// Key fragments that mark a secret. Matching keys are dropped.
const SECRET_MARKERS: [&str; 4] = ["password", "token", "secret", "key"];

/// Key fragments that mark PII. Matching keys are rewritten to a hash.
const PII_MARKERS: [&str; 3] = ["email", "phone", "name"];

/// Sanitize a metadata map for audit storage.
///
/// Secret keys are removed; PII keys (including `customer_name` and
/// `attendee_email`) become `<key>_hash` entries. All other entries pass
/// through unchanged.
#[must_use]
pub fn sanitize_metadata(metadata: Map<String, Value>) -> Map<String, Value> {
    let mut sanitized = Map::with_capacity(metadata.len());

    for (key, value) in metadata {
        let lower = key.to_lowercase();

        if SECRET_MARKERS.iter().any(|m| lower.contains(m)) {
            continue;
        }

        if PII_MARKERS.iter().any(|m| lower.contains(m)) {
            let raw = match &value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            sanitized.insert(format!("{key}_hash"), Value::String(hash_pii(&raw)));
            continue;
        }

        sanitized.insert(key, value);
    }

    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_secrets_dropped() {
        let out = sanitize_metadata(meta(&[
            ("api_key", json!("sk-123")),
            ("password", json!("hunter2")),
            ("auth_token", json!("t")),
            ("service", json!("consultation")),
        ]));
        assert_eq!(out.len(), 1);
        assert_eq!(out["service"], json!("consultation"));
    }

    #[test]
    fn test_pii_hashed() {
        let out = sanitize_metadata(meta(&[
            ("customer_email", json!("jane@ex.com")),
            ("customer_name", json!("Jane Doe")),
            ("attendee_email", json!("bob@ex.com")),
            ("customer_phone", json!("555-123-4567")),
        ]));
        assert!(out.contains_key("customer_email_hash"));
        assert!(out.contains_key("customer_name_hash"));
        assert!(out.contains_key("attendee_email_hash"));
        assert!(out.contains_key("customer_phone_hash"));
        assert_eq!(out["customer_email_hash"], json!(hash_pii("jane@ex.com")));
        // No raw value survives.
        let dump = serde_json::to_string(&out).unwrap();
        assert!(!dump.contains("jane@ex.com"));
        assert!(!dump.contains("Jane Doe"));
        assert!(!dump.contains("555-123-4567"));
    }

    #[test]
    fn test_plain_keys_pass_through() {
        let out = sanitize_metadata(meta(&[
            ("booking_date", json!("2025-06-01")),
            ("party_size", json!(4)),
        ]));
        assert_eq!(out["booking_date"], json!("2025-06-01"));
        assert_eq!(out["party_size"], json!(4));
    }
}
