//! Hierarchical, size-gated chunker (spec §4.5).
//!
//! Given one parsed [`Object`] and a [`ChunkingConfig`], emits whole-object,
//! header, section, procedure and trigger chunks with synthesized context
//! headers. All line ranges are reconstructed verbatim from the object's
//! own `source_text` by line number, never by re-assembling parser fields
//! (`signature_text`/`body_text` overlap at the `begin` boundary, so
//! concatenating them would double that line; slicing by line avoids it).

use crate::config::ChunkingConfig;
use crate::lines::LineIndex;
use crate::metadata::{MetaInputs, build_metadata};
use crate::scanner::{advance_token, find_brace_block, find_paren_block, read_word, skip_whitespace_and_comments};
use crate::types::{Chunk, ChunkType, Object, Procedure, ProcedureKind, Section};

/// Split one object into chunks per the size-gated hierarchical policy.
pub fn chunk_object(object: &Object, file_path: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    let total_chars = object.source_text.chars().count();
    if total_chars <= config.max_chunk_chars {
        return vec![whole_object_chunk(object, file_path, config)];
    }

    // Caller-bug degrade path (spec §7): if the declared line range doesn't
    // actually contain a top-level brace, the object's `source_text` is
    // inconsistent with its own `line_start`/`line_end`; fall back to one
    // whole-object chunk rather than producing nonsense sub-chunks.
    let Some(decl_brace) = find_top_level_brace(&object.source_text) else {
        return vec![whole_object_chunk(object, file_path, config)];
    };

    let local_lines = LineIndex::new(&object.source_text);
    let src_lines: Vec<&str> = object.source_text.lines().collect();

    let mut chunks = Vec::new();
    if let Some(header) = build_header_chunk(object, file_path, config, decl_brace, &local_lines, &src_lines) {
        chunks.push(header);
    }
    for section in &object.sections {
        chunks.extend(build_section_chunks(object, section, file_path, config, &local_lines, &src_lines));
    }
    for proc in &object.procedures {
        if let Some(c) = build_procedure_chunk(object, proc, &src_lines, file_path, config) {
            chunks.push(c);
        }
    }

    // Empty-result policy: discard chunks whose content (after stripping
    // any context header) is empty or whitespace-only.
    chunks.retain(|c| !stripped_content(c, config).trim().is_empty());
    chunks
}

fn stripped_content<'a>(chunk: &'a Chunk, config: &ChunkingConfig) -> &'a str {
    if config.include_context_header && chunk.metadata.chunk_type != ChunkType::WholeObject {
        match chunk.content.splitn(3, '\n').nth(2) {
            Some(rest) => rest,
            None => "",
        }
    } else {
        &chunk.content
    }
}

fn estimate_tokens(content: &str, config: &ChunkingConfig) -> u64 {
    if !config.estimate_tokens {
        return 0;
    }
    (content.chars().count() / 4).max(1) as u64
}

fn context_header(object: &Object, file_path: &str) -> String {
    let id_part = if object.kind.has_id() {
        format!(" {}", object.id)
    } else {
        String::new()
    };
    format!(
        "// Object: {}{} \"{}\"\n// File: {}\n\n",
        object.kind.as_str(),
        id_part,
        object.name,
        file_path
    )
}

fn with_context_header(content: String, object: &Object, file_path: &str, config: &ChunkingConfig) -> String {
    if config.include_context_header {
        format!("{}{}", context_header(object, file_path), content)
    } else {
        content
    }
}

/// Verbatim text for absolute lines `[abs_start, abs_end]`, read out of
/// `src_lines` (the owning object's own source, split on `\n`).
fn extract_lines(src_lines: &[&str], object_line_start: usize, abs_start: usize, abs_end: usize) -> String {
    if abs_start < object_line_start || abs_end < abs_start {
        return String::new();
    }
    let rel_start = abs_start - object_line_start;
    let rel_end = abs_end - object_line_start;
    if rel_end >= src_lines.len() {
        return String::new();
    }
    src_lines[rel_start..=rel_end].join("\n")
}

fn find_top_level_brace(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    let len = b.len();
    let mut i = 0;
    while i < len {
        match b[i] {
            b'{' => return Some(i),
            b'\'' | b'"' | b'/' => {
                i = advance_token(s, i).ok()?;
            }
            _ => i += 1,
        }
    }
    None
}

fn whole_object_chunk(object: &Object, file_path: &str, config: &ChunkingConfig) -> Chunk {
    let content = object.source_text.clone();
    let metadata = build_metadata(MetaInputs {
        chunk_type: ChunkType::WholeObject,
        section_name: None,
        procedure_name: None,
        attributes: Vec::new(),
        line_start: object.line_start,
        line_end: object.line_end,
        object,
        file_path,
    });
    let token_estimate = estimate_tokens(&content, config);
    Chunk {
        content,
        token_estimate,
        metadata,
    }
}

/// Header chunk: declaration through the opening `{`, plus each top-level
/// property's own source lines, in order (spec §4.5 item 1).
fn build_header_chunk(
    object: &Object,
    file_path: &str,
    config: &ChunkingConfig,
    decl_brace: usize,
    local_lines: &LineIndex,
    src_lines: &[&str],
) -> Option<Chunk> {
    let decl_line_rel = local_lines.line_at(decl_brace);
    if decl_line_rel == 0 {
        return None;
    }
    let decl_line_abs = object.line_start + decl_line_rel - 1;

    let mut parts = vec![extract_lines(src_lines, object.line_start, object.line_start, decl_line_abs)];
    let mut line_end = decl_line_abs;
    for property in &object.properties {
        let part = extract_lines(src_lines, object.line_start, property.line_start, property.line_end);
        if !part.is_empty() {
            parts.push(part);
            line_end = line_end.max(property.line_end);
        }
    }

    let body = parts.join("\n");
    let content = with_context_header(body, object, file_path, config);
    if content.trim().is_empty() {
        return None;
    }
    let metadata = build_metadata(MetaInputs {
        chunk_type: ChunkType::Header,
        section_name: None,
        procedure_name: None,
        attributes: Vec::new(),
        line_start: object.line_start,
        line_end,
        object,
        file_path,
    });
    let token_estimate = estimate_tokens(&content, config);
    Some(Chunk {
        content,
        token_estimate,
        metadata,
    })
}

/// One section, possibly recursively split into sub-block groups when it
/// exceeds the size budget (spec §4.5 item 2).
fn build_section_chunks(
    object: &Object,
    section: &Section,
    file_path: &str,
    config: &ChunkingConfig,
    local_lines: &LineIndex,
    src_lines: &[&str],
) -> Vec<Chunk> {
    let full_text = extract_lines(src_lines, object.line_start, section.line_start, section.line_end);
    if full_text.chars().count() <= config.max_chunk_chars {
        return vec![section_chunk(
            object,
            section.name.clone(),
            full_text,
            section.line_start,
            section.line_end,
            file_path,
            config,
        )];
    }

    let blocks = scan_sub_blocks(&section.body_text);
    if blocks.is_empty() {
        // No nested sub-blocks to split on (0 or 1 candidate): emit the
        // whole section as a single oversize chunk rather than cut it
        // mid-declaration.
        return vec![section_chunk(
            object,
            section.name.clone(),
            full_text,
            section.line_start,
            section.line_end,
            file_path,
            config,
        )];
    }

    let mut chunks = Vec::new();
    let mut group: Option<(usize, usize, usize)> = None; // (start, end, char_count)
    for &(bstart, bend) in &blocks {
        let block_chars = section.body_text[bstart..=bend].chars().count();
        group = Some(match group {
            None => (bstart, bend, block_chars),
            Some((gstart, _, gchars)) if gchars + block_chars <= config.max_chunk_chars => {
                (gstart, bend, gchars + block_chars)
            }
            Some((gstart, gend, _)) => {
                chunks.push(emit_section_group(object, section, file_path, config, local_lines, gstart, gend));
                (bstart, bend, block_chars)
            }
        });
    }
    if let Some((gstart, gend, _)) = group {
        chunks.push(emit_section_group(object, section, file_path, config, local_lines, gstart, gend));
    }
    chunks
}

fn abs_line(object_line_start: usize, local_lines: &LineIndex, pos_in_object: usize) -> usize {
    object_line_start + local_lines.line_at(pos_in_object) - 1
}

fn emit_section_group(
    object: &Object,
    section: &Section,
    file_path: &str,
    config: &ChunkingConfig,
    local_lines: &LineIndex,
    gstart: usize,
    gend: usize,
) -> Chunk {
    let text = section.body_text[gstart..=gend].to_string();
    let line_start = abs_line(object.line_start, local_lines, section.body_offset + gstart);
    let line_end = abs_line(object.line_start, local_lines, section.body_offset + gend);
    section_chunk(object, section.name.clone(), text, line_start, line_end, file_path, config)
}

fn section_chunk(
    object: &Object,
    name: String,
    text: String,
    line_start: usize,
    line_end: usize,
    file_path: &str,
    config: &ChunkingConfig,
) -> Chunk {
    let content = with_context_header(text, object, file_path, config);
    let metadata = build_metadata(MetaInputs {
        chunk_type: ChunkType::Section,
        section_name: Some(name),
        procedure_name: None,
        attributes: Vec::new(),
        line_start,
        line_end,
        object,
        file_path,
    });
    let token_estimate = estimate_tokens(&content, config);
    Chunk {
        content,
        token_estimate,
        metadata,
    }
}

/// Find top-level `name[(args)] { ... }` sub-blocks inside a section body
/// (e.g. `area(...)`, `group(...)`, `field(...)`, `dataitem(...)`,
/// `value(...)`, `action(...)`), returning each as `(start, end_inclusive)`
/// byte ranges covering the sub-block's full text.
fn scan_sub_blocks(text: &str) -> Vec<(usize, usize)> {
    let mut blocks = Vec::new();
    let len = text.len();
    let mut i = 0usize;
    loop {
        i = skip_whitespace_and_comments(text, i);
        if i >= len {
            break;
        }
        let b0 = text.as_bytes()[i];
        if !(b0.is_ascii_alphabetic() || b0 == b'_') {
            i = match advance_token(text, i) {
                Ok(next) if next > i => next,
                _ => i + 1,
            };
            continue;
        }

        let (_, name_end) = read_word(text, i);
        let mut cursor = skip_whitespace_and_comments(text, name_end);
        if cursor < len && text.as_bytes()[cursor] == b'(' {
            match find_paren_block(text, cursor) {
                Ok((_, pclose)) => cursor = pclose + 1,
                Err(_) => {
                    i = name_end.max(i + 1);
                    continue;
                }
            }
        }
        let after_args = skip_whitespace_and_comments(text, cursor);
        if after_args < len && text.as_bytes()[after_args] == b'{' {
            match find_brace_block(text, after_args) {
                Ok((_, close)) => {
                    blocks.push((i, close));
                    i = close + 1;
                    continue;
                }
                Err(_) => {
                    i = after_args + 1;
                    continue;
                }
            }
        }
        i = name_end.max(i + 1);
    }
    blocks
}

fn build_procedure_chunk(
    object: &Object,
    proc: &Procedure,
    src_lines: &[&str],
    file_path: &str,
    config: &ChunkingConfig,
) -> Option<Chunk> {
    let text = extract_lines(src_lines, object.line_start, proc.line_start, proc.line_end);
    if text.trim().is_empty() {
        return None;
    }
    let chunk_type = match proc.kind {
        ProcedureKind::Procedure => ChunkType::Procedure,
        ProcedureKind::Trigger => ChunkType::Trigger,
    };
    let content = with_context_header(text, object, file_path, config);
    let metadata = build_metadata(MetaInputs {
        chunk_type,
        section_name: None,
        procedure_name: Some(proc.name.clone()),
        attributes: proc.attributes.clone(),
        line_start: proc.line_start,
        line_end: proc.line_end,
        object,
        file_path,
    });
    let token_estimate = estimate_tokens(&content, config);
    Some(Chunk {
        content,
        token_estimate,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn first_object(src: &str) -> Object {
        parse_source(src, "Test.al").0.into_iter().next().unwrap()
    }

    #[test]
    fn small_object_stays_whole() {
        let src = "enum 50100 \"Customer Loyalty\"\n{\n    Extensible = true;\n\n    value(0; Bronze) { Caption = 'Bronze'; }\n    value(1; Silver) { Caption = 'Silver'; }\n}\n";
        let object = first_object(src);
        let config = ChunkingConfig::default();
        let chunks = chunk_object(&object, "Loyalty.al", &config);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.chunk_type, ChunkType::WholeObject);
        assert_eq!(chunks[0].metadata.object_type, "enum");
        assert_eq!(chunks[0].metadata.object_id, 50100);
        assert_eq!(chunks[0].metadata.object_name, "Customer Loyalty");
        assert_eq!(chunks[0].content, object.source_text);
    }

    #[test]
    fn exact_budget_boundary_stays_whole() {
        let filler = "x".repeat(1500 - "enum 1 A{}".len());
        let src = format!("enum 1 A{{{filler}}}");
        assert_eq!(src.chars().count(), 1500);
        let object = first_object(&src);
        let config = ChunkingConfig::default();
        let chunks = chunk_object(&object, "f.al", &config);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.chunk_type, ChunkType::WholeObject);
    }

    fn large_codeunit() -> String {
        let mut procs = String::new();
        for i in 0..12 {
            procs.push_str(&format!(
                "    [EventSubscriber(ObjectType::Table, Database::Customer, 'OnAfterInsertEvent', '', false, false)]\n    local procedure OnAfterInsertCustomer{i}(var Rec: Record Customer)\n    begin\n        Message('inserted %1', Rec.\"No.\");\n    end;\n\n"
            ));
        }
        format!("codeunit 50101 \"Address Management\"\n{{\n    Access = Internal;\n\n{procs}}}\n")
    }

    #[test]
    fn large_codeunit_splits_into_header_and_procedures() {
        let src = large_codeunit();
        assert!(src.chars().count() > 1500);
        let object = first_object(&src);
        let config = ChunkingConfig::default();
        let chunks = chunk_object(&object, "AddressManagement.al", &config);

        assert_eq!(chunks[0].metadata.chunk_type, ChunkType::Header);
        let proc_chunks: Vec<_> = chunks
            .iter()
            .filter(|c| c.metadata.chunk_type == ChunkType::Procedure)
            .collect();
        assert_eq!(proc_chunks.len(), 12);
        assert!(
            chunks
                .iter()
                .all(|c| c.metadata.chunk_type != ChunkType::Section)
        );
        let first_proc = &proc_chunks[0];
        assert_eq!(first_proc.metadata.attributes.len(), 1);
        assert!(first_proc.metadata.attributes[0].starts_with("[EventSubscriber("));
        assert_eq!(first_proc.metadata.procedure_name.as_deref(), Some("OnAfterInsertCustomer0"));
    }

    #[test]
    fn table_with_triggers_and_local_procedure() {
        let mut fields = String::new();
        for i in 1..=10 {
            fields.push_str(&format!(
                "        field({i}; \"Field {i}\"; Code[20]) {{ Caption = 'Field {i}'; }}\n"
            ));
        }
        let src = format!(
            "table 50102 \"Customer Address\"\n{{\n    Caption = 'Customer Address';\n    DataPerCompany = false;\n\n    fields\n    {{\n{fields}    }}\n\n    keys\n    {{\n        key(PK; \"No.\") {{ Clustered = true; }}\n    }}\n\n    trigger OnInsert()\n    begin\n        ValidateCity();\n    end;\n\n    trigger OnModify()\n    begin\n        ValidateCity();\n    end;\n\n    local procedure ValidateCity()\n    begin\n        Message('validating');\n    end;\n}}\n"
        );
        let object = first_object(&src);
        let config = ChunkingConfig {
            max_chunk_chars: 400,
            ..ChunkingConfig::default()
        };
        let chunks = chunk_object(&object, "CustomerAddress.al", &config);

        assert_eq!(chunks[0].metadata.chunk_type, ChunkType::Header);
        let section_names: Vec<_> = chunks
            .iter()
            .filter(|c| c.metadata.chunk_type == ChunkType::Section)
            .filter_map(|c| c.metadata.section_name.clone())
            .collect();
        assert!(section_names.iter().any(|n| n == "fields"));
        assert!(section_names.iter().any(|n| n == "keys"));

        let trigger_names: Vec<_> = chunks
            .iter()
            .filter(|c| c.metadata.chunk_type == ChunkType::Trigger)
            .filter_map(|c| c.metadata.procedure_name.clone())
            .collect();
        assert_eq!(trigger_names, vec!["OnInsert".to_string(), "OnModify".to_string()]);

        let proc = chunks
            .iter()
            .find(|c| c.metadata.chunk_type == ChunkType::Procedure)
            .unwrap();
        assert_eq!(proc.metadata.procedure_name.as_deref(), Some("ValidateCity"));
    }

    #[test]
    fn chunk_line_ranges_stay_within_object_bounds() {
        let src = large_codeunit();
        let object = first_object(&src);
        let config = ChunkingConfig::default();
        let chunks = chunk_object(&object, "f.al", &config);
        for c in &chunks {
            assert!(c.metadata.line_start >= object.line_start);
            assert!(c.metadata.line_end <= object.line_end);
        }
    }

    #[test]
    fn token_estimate_matches_formula() {
        let src = large_codeunit();
        let object = first_object(&src);
        let config = ChunkingConfig::default();
        let chunks = chunk_object(&object, "f.al", &config);
        for c in &chunks {
            let expected = (c.content.chars().count() / 4).max(1) as u64;
            assert_eq!(c.token_estimate, expected);
        }
    }

    #[test]
    fn no_context_header_when_disabled() {
        let src = large_codeunit();
        let object = first_object(&src);
        let config = ChunkingConfig {
            include_context_header: false,
            ..ChunkingConfig::default()
        };
        let chunks = chunk_object(&object, "f.al", &config);
        for c in &chunks {
            assert!(!c.content.starts_with("// Object:"));
        }
    }

    #[test]
    fn context_header_present_and_well_formed() {
        let src = large_codeunit();
        let object = first_object(&src);
        let config = ChunkingConfig::default();
        let chunks = chunk_object(&object, "Foo.al", &config);
        let header = &chunks[0];
        assert!(header.content.starts_with("// Object: codeunit 50101 \"Address Management\"\n// File: Foo.al\n\n"));
    }

    #[test]
    fn interface_context_header_omits_id() {
        let src = "interface \"IAddress Provider\"\n{\n    procedure GetCity(): Text;\n}\n";
        let object = first_object(src);
        let config = ChunkingConfig {
            max_chunk_chars: 10,
            ..ChunkingConfig::default()
        };
        let chunks = chunk_object(&object, "f.al", &config);
        assert!(chunks[0].content.contains("// Object: interface \"IAddress Provider\""));
    }
}
