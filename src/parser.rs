//! Ties the header recognizer and body parser together into the public
//! `parse_source` entry point (spec §4.6), applying the non-fatal
//! propagation policy of spec §7: a malformed object is skipped by
//! scanning forward to the next recognizable header, not by aborting the
//! whole file.

use tracing::{debug, warn};

use crate::body::parse_body;
use crate::errors::Diagnostic;
use crate::hash::{hash_source, strip_bom};
use crate::header::find_next_header;
use crate::lines::LineIndex;
use crate::scanner::find_brace_block;
use crate::types::Object;

/// Parse zero or more top-level AL objects out of `text`. Strips a leading
/// BOM, computes the shared `file_hash`, and returns objects in source
/// order alongside any non-fatal diagnostics recorded against malformed
/// objects encountered along the way.
pub fn parse_source(text: &str, file_path: &str) -> (Vec<Object>, Vec<Diagnostic>) {
    let src = strip_bom(text);
    let file_hash = hash_source(text);
    let lines = LineIndex::new(src);

    let mut objects = Vec::new();
    let mut diagnostics = Vec::new();
    let mut pos = 0usize;

    while pos < src.len() {
        match find_next_header(src, pos) {
            None => break,
            Some(Err((err_start, kind))) => {
                warn!(
                    file = file_path,
                    byte_offset = err_start,
                    kind = %kind,
                    "malformed object header, resuming scan past it"
                );
                diagnostics.push(Diagnostic::new(
                    kind,
                    err_start,
                    format!("malformed object header at byte {err_start}"),
                ));
                pos = err_start + 1;
            }
            Some(Ok(header)) => match find_brace_block(src, header.brace_open) {
                Err(kind) => {
                    warn!(
                        file = file_path,
                        byte_offset = header.start,
                        kind = %kind,
                        "unterminated object body, resuming scan past it"
                    );
                    diagnostics.push(Diagnostic::new(
                        kind,
                        header.brace_open,
                        "object body has no matching closing brace",
                    ));
                    pos = header.brace_open + 1;
                }
                Ok((open, close)) => {
                    debug!(
                        file = file_path,
                        kind = %header.kind.as_str(),
                        name = %header.name,
                        "recognized object header"
                    );
                    let body_abs_start = open + 1;
                    let body_text = &src[body_abs_start..close];
                    let parsed = parse_body(body_text, body_abs_start, header.start, &lines);
                    diagnostics.extend(parsed.diagnostics);

                    let line_start = lines.line_at(header.start);
                    let line_end = lines.line_at(close);
                    objects.push(Object {
                        kind: header.kind,
                        id: header.id,
                        name: header.name,
                        extends: header.extends,
                        properties: parsed.properties,
                        sections: parsed.sections,
                        procedures: parsed.procedures,
                        source_text: src[header.start..=close].to_string(),
                        line_start,
                        line_end,
                        file_hash: file_hash.clone(),
                    });
                    pos = close + 1;
                }
            },
        }
    }

    (objects, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectKind;

    #[test]
    fn parses_single_object() {
        let src = "enum 50100 \"Customer Loyalty\"\n{\n    Extensible = true;\n    value(0; Bronze) { }\n}\n";
        let (objects, diags) = parse_source(src, "Loyalty.al");
        assert!(diags.is_empty());
        assert_eq!(objects.len(), 1);
        let o = &objects[0];
        assert_eq!(o.kind, ObjectKind::Enum);
        assert_eq!(o.id, 50100);
        assert_eq!(o.name, "Customer Loyalty");
        assert_eq!(o.properties.len(), 1);
        assert_eq!(o.sections.len(), 1);
    }

    #[test]
    fn parses_multiple_objects_in_source_order() {
        let src = "enum 1 A { }\n\ncodeunit 2 B { }\n";
        let (objects, diags) = parse_source(src, "Multi.al");
        assert!(diags.is_empty());
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].kind, ObjectKind::Enum);
        assert_eq!(objects[1].kind, ObjectKind::Codeunit);
        assert!(objects[1].line_start > objects[0].line_end);
        assert_eq!(objects[0].file_hash, objects[1].file_hash);
    }

    #[test]
    fn malformed_object_does_not_abort_file() {
        let src = "table Bad { }\n\ncodeunit 2 Good { }\n";
        let (objects, diags) = parse_source(src, "Mixed.al");
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].name, "Good");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn interface_has_zero_id_and_empty_bodies() {
        let src = "interface \"IAddress Provider\"\n{\n    procedure GetCity(): Text;\n    procedure GetZip(): Text;\n    procedure GetCountry(): Text;\n}\n";
        let (objects, _diags) = parse_source(src, "IAddressProvider.al");
        assert_eq!(objects.len(), 1);
        let o = &objects[0];
        assert_eq!(o.id, 0);
        assert_eq!(o.procedures.len(), 3);
        assert!(o.procedures.iter().all(|p| p.body_text.is_empty()));
    }

    #[test]
    fn bom_is_stripped_and_hash_stable() {
        let plain = "enum 1 A { }\n";
        let bommed = format!("\u{FEFF}{plain}");
        let (objs_plain, _) = parse_source(plain, "f.al");
        let (objs_bom, _) = parse_source(&bommed, "f.al");
        assert_eq!(objs_plain[0].file_hash, objs_bom[0].file_hash);
        assert_eq!(objs_plain[0].line_start, objs_bom[0].line_start);
    }

    #[test]
    fn lexical_neutrality_string_brace_does_not_confuse_bounds() {
        let src = "codeunit 1 Foo\n{\n    procedure Bar()\n    begin\n        X := '{{{{';\n    end;\n}\n";
        let (objects, diags) = parse_source(src, "f.al");
        assert!(diags.is_empty());
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].procedures.len(), 1);
    }
}
