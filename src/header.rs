//! Object header recognizer (spec §4.2).
//!
//! Scans for the next `<kind> [id] <name> [extends <target>] {` form,
//! routing every skip through the lexical primitives in [`crate::scanner`]
//! so that a keyword-looking run of bytes inside a string, a comment, or a
//! quoted identifier is never mistaken for a real header.

use crate::errors::ParseErrorKind;
use crate::scanner::{advance_token, read_name, read_word, skip_whitespace_and_comments, starts_word_boundary};
use crate::types::ObjectKind;

/// A recognized header, with everything needed to hand off to the body
/// parser.
pub struct Header {
    pub kind: ObjectKind,
    pub id: u32,
    pub name: String,
    pub extends: Option<String>,
    /// Byte offset of the first character of the header (start of the
    /// kind keyword, or of any attribute text the caller chooses to
    /// include; the core doesn't attach attributes to objects).
    pub start: usize,
    /// Byte offset of the `{` that opens the object body.
    pub brace_open: usize,
}

/// Search `s` starting at byte offset `from` for the next object header.
/// Returns `None` when no more recognizable kind keyword exists at a word
/// boundary outside of strings/comments/quoted identifiers.
///
/// On a structural mismatch once a kind keyword is found (bad id, no
/// opening brace, etc.) this returns `Err((kind_start, ParseErrorKind))`
/// so the caller can record a diagnostic and resume scanning just past
/// the keyword.
pub fn find_next_header(s: &str, from: usize) -> Option<Result<Header, (usize, ParseErrorKind)>> {
    let len = s.len();
    let mut i = from;
    while i < len {
        let b = s.as_bytes()[i];
        match b {
            b'\'' | b'"' | b'/' => {
                i = match advance_token(s, i) {
                    Ok(next) => next,
                    Err(_) => return None,
                };
                continue;
            }
            c if c.is_ascii_alphabetic() => {
                if starts_word_boundary(s, i) {
                    if let Some(kind) = match_kind_keyword(s, i) {
                        return Some(parse_header_at(s, i, kind));
                    }
                }
                let (_, end) = read_word(s, i);
                i = end.max(i + 1);
            }
            _ => i += 1,
        }
    }
    None
}

/// Match the longest AL object-kind keyword at `i`, requiring a trailing
/// word boundary (spec: "recognizer matches longest keyword first").
fn match_kind_keyword(s: &str, i: usize) -> Option<ObjectKind> {
    let (word, end) = read_word(s, i);
    if word.is_empty() {
        return None;
    }
    let lower = word.to_ascii_lowercase();
    ObjectKind::ALL
        .iter()
        .find(|(_, kw)| *kw == lower && end == i + kw.len())
        .map(|(k, _)| *k)
}

/// Having matched a kind keyword at `kind_start`, parse the rest of the
/// header form.
fn parse_header_at(
    s: &str,
    kind_start: usize,
    kind: ObjectKind,
) -> Result<Header, (usize, ParseErrorKind)> {
    let (_, mut i) = read_word(s, kind_start);
    i = skip_whitespace_and_comments(s, i);

    let id = if kind.has_id() {
        let (digits, end) = read_digits(s, i);
        if digits.is_empty() {
            return Err((kind_start, ParseErrorKind::MalformedHeader));
        }
        i = end;
        digits
            .parse::<u32>()
            .map_err(|_| (kind_start, ParseErrorKind::MalformedHeader))?
    } else {
        0
    };
    i = skip_whitespace_and_comments(s, i);

    if i >= s.len() || !(s.as_bytes()[i] == b'"' || s.as_bytes()[i].is_ascii_alphabetic() || s.as_bytes()[i] == b'_')
    {
        return Err((kind_start, ParseErrorKind::MalformedHeader));
    }
    let (name, name_end) = read_name(s, i);
    if name.is_empty() {
        return Err((kind_start, ParseErrorKind::MalformedHeader));
    }
    i = name_end;
    i = skip_whitespace_and_comments(s, i);

    let mut extends = None;
    if i < s.len() && starts_word_boundary(s, i) {
        let (word, end) = read_word(s, i);
        if word.eq_ignore_ascii_case("extends") {
            let mut j = skip_whitespace_and_comments(s, end);
            if j >= s.len() {
                return Err((kind_start, ParseErrorKind::MalformedHeader));
            }
            let (target, target_end) = read_name(s, j);
            if target.is_empty() {
                return Err((kind_start, ParseErrorKind::MalformedHeader));
            }
            j = target_end;
            extends = Some(target);
            i = skip_whitespace_and_comments(s, j);
        }
    }

    if i >= s.len() || s.as_bytes()[i] != b'{' {
        return Err((kind_start, ParseErrorKind::MalformedHeader));
    }

    Ok(Header {
        kind,
        id,
        name,
        extends,
        start: kind_start,
        brace_open: i,
    })
}

fn read_digits(s: &str, i: usize) -> (&str, usize) {
    let b = s.as_bytes();
    let len = b.len();
    let mut j = i;
    while j < len && b[j].is_ascii_digit() {
        j += 1;
    }
    (&s[i..j], j)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::find_brace_block;

    fn header_ok(s: &str) -> Header {
        match find_next_header(s, 0) {
            Some(Ok(h)) => h,
            other => panic!("expected header, got {:?}", other.is_some()),
        }
    }

    #[test]
    fn recognizes_table_with_id_and_name() {
        let s = "table 50100 \"Customer Address\" { }";
        let h = header_ok(s);
        assert_eq!(h.kind, ObjectKind::Table);
        assert_eq!(h.id, 50100);
        assert_eq!(h.name, "Customer Address");
        assert_eq!(h.extends, None);
    }

    #[test]
    fn recognizes_bare_name() {
        let s = "codeunit 50101 AddressManagement { }";
        let h = header_ok(s);
        assert_eq!(h.name, "AddressManagement");
    }

    #[test]
    fn interface_has_no_id() {
        let s = "interface \"IAddress Provider\" { }";
        let h = header_ok(s);
        assert_eq!(h.kind, ObjectKind::Interface);
        assert_eq!(h.id, 0);
        assert_eq!(h.name, "IAddress Provider");
    }

    #[test]
    fn recognizes_extends() {
        let s = "tableextension 50102 \"Customer Ext\" extends Customer { }";
        let h = header_ok(s);
        assert_eq!(h.kind, ObjectKind::TableExtension);
        assert_eq!(h.extends.as_deref(), Some("Customer"));
    }

    #[test]
    fn longest_keyword_wins_over_prefix() {
        let s = "tableextension 1 Foo { }";
        let h = header_ok(s);
        assert_eq!(h.kind, ObjectKind::TableExtension);
    }

    #[test]
    fn ignores_keyword_inside_string_literal() {
        let s = "codeunit 1 Foo { Caption = 'table 5 x { }'; }";
        let (_, close) = find_brace_block(s, s.find('{').unwrap()).unwrap();
        let h = header_ok(s);
        assert_eq!(h.kind, ObjectKind::Codeunit);
        assert_eq!(h.brace_open, s.find('{').unwrap());
        let _ = close;
    }

    #[test]
    fn ignores_keyword_inside_comment() {
        let s = "// table 1 Ghost { }\ncodeunit 2 Real { }";
        let h = header_ok(s);
        assert_eq!(h.kind, ObjectKind::Codeunit);
        assert_eq!(h.id, 2);
    }

    #[test]
    fn malformed_header_missing_id_reports_error() {
        let s = "table Foo { }";
        match find_next_header(s, 0) {
            Some(Err((_, kind))) => assert_eq!(kind, ParseErrorKind::MalformedHeader),
            other => panic!("expected malformed header, got {:?}", other.is_some()),
        }
    }

    #[test]
    fn no_header_found_returns_none() {
        assert!(find_next_header("just some text", 0).is_none());
    }
}
