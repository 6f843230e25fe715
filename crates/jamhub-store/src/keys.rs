//! Store key builders for every JamHub document.
//!
//! Keys are relative; the provider applies its own namespace prefix.

use jamhub_core::types::JamCode;

/// Prefix shared by all jam documents.
pub const JAM_PREFIX: &str = "jam:";

// ── Jam keys ───────────────────────────────────────────────

/// Key of the document holding one jam session.
pub fn jam_document(code: &JamCode) -> String {
    format!("{JAM_PREFIX}{code}")
}

/// Recover the jam code from a key produced by [`jam_document`].
pub fn code_from_key(key: &str) -> Option<JamCode> {
    key.strip_prefix(JAM_PREFIX)
        .and_then(|code| JamCode::parse(code).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jam_key_round_trips_code() {
        let code = JamCode::parse("ab23cd").unwrap();
        let key = jam_document(&code);
        assert_eq!(key, "jam:AB23CD");
        assert_eq!(code_from_key(&key), Some(code));
        assert_eq!(code_from_key("other:AB23CD"), None);
    }
}
