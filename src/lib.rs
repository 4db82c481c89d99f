//! Structural parser and hierarchical chunker for Business Central AL
//! source, turning object declarations into self-contained text chunks
//! suitable for embedding into a vector index for retrieval-augmented
//! generation.
//!
//! This crate is the CORE of that pipeline: a lexical-aware brace/keyword
//! scanner recovers an object-level syntax tree without a grammar, and a
//! size-gated hierarchical chunker splits that tree into chunks at natural
//! declarative boundaries. Everything here is a pure, deterministic
//! function over in-memory strings: no file discovery, no network
//! adapters, no JSON serialization plumbing, no CLI. Those are external
//! collaborators layered on top; see the crate's `DESIGN.md` for the
//! dividing line.
//!
//! # Propagation policy
//!
//! Parsing a single malformed object never aborts the whole file: the
//! parser records a [`errors::Diagnostic`] against it and resumes scanning
//! from the next recognizable object header. Well-formed objects before
//! and after the malformed one are still returned. See [`parse_source`].
//!
//! # Entry points
//!
//! - [`parse_source`]: text to parsed objects (+ diagnostics).
//! - [`chunk_object`]: one parsed object + config to chunks.
//! - [`chunk_file`]: text to chunks, via `parse_source` + `chunk_object`.
//! - [`hash_source`]: text to a 16-hex-char BLAKE2b-8 fingerprint.

mod body;
mod chunker;
pub mod config;
pub mod errors;
mod hash;
mod header;
mod lines;
mod metadata;
mod parser;
pub mod types;

pub use config::ChunkingConfig;
pub use errors::{Diagnostic, Error, ParseErrorKind, Result};
pub use hash::hash_source;
pub use types::{
    Access, Chunk, ChunkMetadata, ChunkType, Object, ObjectKind, Procedure, ProcedureKind,
    Property, Section,
};

/// Parse zero or more top-level AL objects out of `text` (spec §4.6).
///
/// Strips a leading UTF-8 BOM, computes the `file_hash` shared by every
/// returned object, and returns objects in source order alongside any
/// non-fatal diagnostics recorded against malformed objects encountered
/// along the way. Malformed objects do not prevent well-formed neighbors
/// from being parsed (see the propagation policy in the crate docs).
pub fn parse_source(text: &str, file_path: &str) -> (Vec<Object>, Vec<Diagnostic>) {
    parser::parse_source(text, file_path)
}

/// Split one parsed object into chunks under `config` (spec §4.5).
///
/// Pure and infallible: an object whose `source_text` is shorter than its
/// declared line range (a caller bug) degrades to a single `whole_object`
/// chunk rather than panicking or raising.
pub fn chunk_object(object: &Object, file_path: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    chunker::chunk_object(object, file_path, config)
}

/// Parse `text` and chunk every object found in it, in source order
/// (spec §4.6: "concatenation of `chunk_object` over `parse_source`").
///
/// Diagnostics from parsing are not surfaced here; callers that need them
/// should call [`parse_source`] directly.
pub fn chunk_file(text: &str, file_path: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    let (objects, _diagnostics) = parser::parse_source(text, file_path);
    objects
        .iter()
        .flat_map(|object| chunker::chunk_object(object, file_path, config))
        .collect()
}
