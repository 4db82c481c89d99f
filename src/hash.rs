//! Content fingerprint (spec §4.4).

use blake2::Blake2bVar;
use blake2::digest::{Update, VariableOutput};

/// BOM strip + BLAKE2b-8 fingerprint, returned as 16 lowercase hex chars.
/// Two files that differ only by a leading BOM hash equal.
pub fn hash_source(text: &str) -> String {
    let stripped = strip_bom(text);
    let mut hasher = Blake2bVar::new(8).expect("8 is a valid BLAKE2b digest size");
    hasher.update(stripped.as_bytes());
    let mut out = [0u8; 8];
    hasher
        .finalize_variable(&mut out)
        .expect("output buffer matches the configured digest size");
    to_hex(&out)
}

/// Strip a single leading UTF-8 BOM (`U+FEFF`), if present.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}

fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_16_lowercase_hex_chars() {
        let h = hash_source("table 50100 Foo { }");
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn bom_does_not_change_hash() {
        let plain = "table 50100 Foo { }";
        let bommed = format!("\u{FEFF}{plain}");
        assert_eq!(hash_source(plain), hash_source(&bommed));
    }

    #[test]
    fn different_content_hashes_differently() {
        assert_ne!(
            hash_source("table 1 A { }"),
            hash_source("table 2 B { }")
        );
    }
}
