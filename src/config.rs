//! Chunking policy (spec §4.5, §6).
//!
//! `ChunkingConfig` is plain serializable data: `Clone + Debug + Serialize
//! + Deserialize` with per-field defaults via `#[serde(default)]`, so a
//! caller can load chunking policy from a project config file without the
//! core knowing anything about files, the way `rlm::config::UserSettings`
//! loads its settings.

use serde::{Deserialize, Serialize};

/// Policy governing how an [`crate::types::Object`] is split into chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Hard size gate for whole-object emission and per-section grouping.
    pub max_chunk_chars: usize,
    /// Advisory only; the core never merges or drops chunks by this value.
    pub min_chunk_chars: usize,
    /// Prefix non-`whole_object` chunks with a two-line context header.
    pub include_context_header: bool,
    /// Compute `token_estimate`; when `false` it is always `0`.
    pub estimate_tokens: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 1500,
            min_chunk_chars: 100,
            include_context_header: true,
            estimate_tokens: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = ChunkingConfig::default();
        assert_eq!(cfg.max_chunk_chars, 1500);
        assert_eq!(cfg.min_chunk_chars, 100);
        assert!(cfg.include_context_header);
        assert!(cfg.estimate_tokens);
    }

    #[test]
    fn deserializes_with_partial_overrides() {
        let cfg: ChunkingConfig = serde_json::from_str(r#"{"max_chunk_chars": 400}"#).unwrap();
        assert_eq!(cfg.max_chunk_chars, 400);
        assert_eq!(cfg.min_chunk_chars, 100);
    }
}
