//! Per-chunk metadata assembly (spec §4.5 "Metadata", §3).

use crate::types::{ChunkMetadata, ChunkType, Object};

/// Everything that varies per chunk; `object` and `file_path` supply the
/// fields shared by every chunk from the same object.
pub struct MetaInputs<'a> {
    pub chunk_type: ChunkType,
    pub section_name: Option<String>,
    pub procedure_name: Option<String>,
    pub attributes: Vec<String>,
    pub line_start: usize,
    pub line_end: usize,
    pub object: &'a Object,
    pub file_path: &'a str,
}

/// Build a chunk's metadata from an object and the chunk-specific fields.
/// `source_table` is always derived here from the object's own properties
/// (spec §3: copied from a property named `SourceTable`, case-insensitive).
pub fn build_metadata(inputs: MetaInputs<'_>) -> ChunkMetadata {
    let source_table = inputs
        .object
        .properties
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case("sourcetable"))
        .map(|p| p.value.clone());

    ChunkMetadata {
        file_path: inputs.file_path.to_string(),
        object_type: inputs.object.kind.as_str().to_string(),
        object_id: inputs.object.id,
        object_name: inputs.object.name.clone(),
        chunk_type: inputs.chunk_type,
        section_name: inputs.section_name,
        procedure_name: inputs.procedure_name,
        extends: inputs.object.extends.clone(),
        source_table,
        attributes: inputs.attributes,
        line_start: inputs.line_start,
        line_end: inputs.line_end,
        file_hash: inputs.object.file_hash.clone(),
    }
}
