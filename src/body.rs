//! Object body parser (spec §4.3).
//!
//! Walks the text inside a located object's `{ ... }` block and classifies
//! each top-level construct (property, section, or procedure/trigger)
//! by peeking the next identifier after skipping whitespace and comments.
//! Every brace/paren/semicolon decision routes through [`crate::scanner`].

use crate::errors::{Diagnostic, ParseErrorKind};
use crate::lines::LineIndex;
use crate::scanner::{
    advance_token, find_bracket_block, find_paren_block, read_name, read_word,
    skip_whitespace_and_comments, starts_word_boundary,
};
use crate::types::{Access, Procedure, ProcedureKind, Property, Section};

/// Result of parsing one object's body.
pub struct BodyParse {
    pub properties: Vec<Property>,
    pub sections: Vec<Section>,
    pub procedures: Vec<Procedure>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse the interior of an object's brace block.
///
/// `body` is the text strictly between the outer `{` and `}` (exclusive);
/// `body_abs_start` is its byte offset in the original (BOM-stripped)
/// source, `object_abs_start` is the byte offset where the owning
/// object's header begins (used only to compute [`Section::body_offset`]),
/// and `lines` converts absolute offsets to 1-based line numbers.
pub fn parse_body(
    body: &str,
    body_abs_start: usize,
    object_abs_start: usize,
    lines: &LineIndex,
) -> BodyParse {
    let mut properties = Vec::new();
    let mut sections = Vec::new();
    let mut procedures = Vec::new();
    let mut diagnostics = Vec::new();

    let len = body.len();
    let mut i = 0usize;
    loop {
        i = skip_whitespace_and_comments(body, i);
        if i >= len {
            break;
        }

        // Collect any attribute blocks preceding the construct.
        let attrs_start = i;
        let mut attributes = Vec::new();
        let mut j = i;
        loop {
            j = skip_whitespace_and_comments(body, j);
            if j < len && body.as_bytes()[j] == b'[' {
                match find_bracket_block(body, j) {
                    Ok((open, close)) => {
                        attributes.push(body[open..=close].to_string());
                        j = close + 1;
                    }
                    Err(kind) => {
                        diagnostics.push(Diagnostic::new(
                            kind,
                            body_abs_start + j,
                            "unterminated attribute block",
                        ));
                        j = len;
                        break;
                    }
                }
            } else {
                break;
            }
        }
        let after_attrs = j;

        if after_attrs >= len {
            i = len;
            continue;
        }

        // Optional access modifier, only meaningful ahead of `procedure`.
        let mut access = Access::Public;
        let mut cursor = after_attrs;
        if starts_word_boundary(body, cursor) {
            let (word, word_end) = read_word(body, cursor);
            let modifier = match_access_modifier(word);
            if let Some(m) = modifier {
                let peek = skip_whitespace_and_comments(body, word_end);
                if is_word_at(body, peek, "procedure") {
                    access = m;
                    cursor = word_end;
                }
            }
        }
        cursor = skip_whitespace_and_comments(body, cursor);

        if starts_word_boundary(body, cursor) && is_word_at(body, cursor, "procedure") {
            let (parsed, next) = parse_procedure(
                body,
                attrs_start,
                attributes,
                access,
                ProcedureKind::Procedure,
                cursor,
                body_abs_start,
                lines,
                &mut diagnostics,
            );
            if let Some(p) = parsed {
                procedures.push(p);
            }
            i = next;
            continue;
        }
        if starts_word_boundary(body, cursor) && is_word_at(body, cursor, "trigger") {
            let (parsed, next) = parse_procedure(
                body,
                attrs_start,
                attributes,
                Access::Public,
                ProcedureKind::Trigger,
                cursor,
                body_abs_start,
                lines,
                &mut diagnostics,
            );
            if let Some(p) = parsed {
                procedures.push(p);
            }
            i = next;
            continue;
        }

        // Not a procedure/trigger: any attributes collected above are
        // discarded (spec §4.3: "Attributes preceding anything else are
        // discarded").
        let construct_start = after_attrs;
        if construct_start >= len {
            i = len;
            continue;
        }
        let b0 = body.as_bytes()[construct_start];
        if b0 == b'"' || b0.is_ascii_alphabetic() || b0 == b'_' {
            let (name, name_end) = read_name(body, construct_start);
            let peek = skip_whitespace_and_comments(body, name_end);
            if peek < len && body.as_bytes()[peek] == b'{' {
                match crate::scanner::find_brace_block(body, peek) {
                    Ok((open, close)) => {
                        let line_start = lines.line_at(body_abs_start + construct_start);
                        let line_end = lines.line_at(body_abs_start + close);
                        let body_offset = body_abs_start + open + 1 - object_abs_start;
                        sections.push(Section {
                            name,
                            body_text: body[open + 1..close].to_string(),
                            line_start,
                            line_end,
                            children: Vec::new(),
                            body_offset,
                        });
                        i = close + 1;
                        continue;
                    }
                    Err(kind) => {
                        diagnostics.push(Diagnostic::new(
                            kind,
                            body_abs_start + peek,
                            "unterminated section block",
                        ));
                        i = len;
                        continue;
                    }
                }
            }
            // A bare identifier immediately followed by a parenthesized
            // argument list and then `{ ... }` (e.g. an enum's top-level
            // `value(0; Bronze) { }`) is treated the same as a named
            // section, with the args dropped and the brace body kept
            // verbatim, so these declarations aren't silently lost from
            // the tree.
            if peek < len && body.as_bytes()[peek] == b'(' {
                if let Ok((_, paren_close)) = find_paren_block(body, peek) {
                    let after_paren = skip_whitespace_and_comments(body, paren_close + 1);
                    if after_paren < len && body.as_bytes()[after_paren] == b'{' {
                        match crate::scanner::find_brace_block(body, after_paren) {
                            Ok((open, close)) => {
                                let line_start = lines.line_at(body_abs_start + construct_start);
                                let line_end = lines.line_at(body_abs_start + close);
                                let body_offset = body_abs_start + open + 1 - object_abs_start;
                                sections.push(Section {
                                    name,
                                    body_text: body[open + 1..close].to_string(),
                                    line_start,
                                    line_end,
                                    children: Vec::new(),
                                    body_offset,
                                });
                                i = close + 1;
                                continue;
                            }
                            Err(kind) => {
                                diagnostics.push(Diagnostic::new(
                                    kind,
                                    body_abs_start + after_paren,
                                    "unterminated section block",
                                ));
                                i = len;
                                continue;
                            }
                        }
                    }
                }
            }
            if peek < len && body.as_bytes()[peek] == b'=' {
                let rhs_start = peek + 1;
                match crate::scanner::find_end_semicolon(body, rhs_start) {
                    Ok(semi) => {
                        let value = body[rhs_start..semi].trim().to_string();
                        let line_start = lines.line_at(body_abs_start + construct_start);
                        let line_end = lines.line_at(body_abs_start + semi);
                        properties.push(Property {
                            name,
                            value,
                            line_start,
                            line_end,
                        });
                        i = semi + 1;
                        continue;
                    }
                    Err(kind) => {
                        diagnostics.push(Diagnostic::new(
                            kind,
                            body_abs_start + rhs_start,
                            "unterminated property statement",
                        ));
                        i = len;
                        continue;
                    }
                }
            }
            // Identifier followed by neither `{` nor `=`: unrecognized
            // construct. Skip one token and keep scanning rather than
            // looping forever.
            i = name_end.max(construct_start + 1);
            continue;
        }

        // Stray token we can't classify (e.g. a lone `;`). Advance by one
        // lexical token so the loop always makes progress.
        i = match advance_token(body, construct_start) {
            Ok(next) if next > construct_start => next,
            _ => construct_start + 1,
        };
    }

    BodyParse {
        properties,
        sections,
        procedures,
        diagnostics,
    }
}

fn match_access_modifier(word: &str) -> Option<Access> {
    if word.eq_ignore_ascii_case("local") {
        Some(Access::Local)
    } else if word.eq_ignore_ascii_case("internal") {
        Some(Access::Internal)
    } else if word.eq_ignore_ascii_case("protected") {
        Some(Access::Protected)
    } else {
        None
    }
}

fn is_word_at(s: &str, i: usize, word: &str) -> bool {
    let (found, end) = read_word(s, i);
    found.eq_ignore_ascii_case(word) && end == i + word.len()
}

/// Parse a `procedure`/`trigger` declaration starting at the keyword
/// (`kw_start`). `decl_start` is where the procedure's own source range
/// begins (its attributes, or the keyword itself if none).
#[allow(clippy::too_many_arguments)]
fn parse_procedure(
    body: &str,
    decl_start: usize,
    attributes: Vec<String>,
    access: Access,
    kind: ProcedureKind,
    kw_start: usize,
    body_abs_start: usize,
    lines: &LineIndex,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Option<Procedure>, usize) {
    let (_, mut i) = read_word(body, kw_start);
    i = skip_whitespace_and_comments(body, i);
    let (name, name_end) = read_name(body, i);
    if name.is_empty() {
        diagnostics.push(Diagnostic::new(
            ParseErrorKind::MalformedHeader,
            body_abs_start + i,
            "procedure/trigger with no name",
        ));
        return (None, body.len());
    }
    i = name_end;

    // Parameter list, if present.
    let mut params_end = i;
    let after_params = skip_whitespace_and_comments(body, i);
    if after_params < body.len() && body.as_bytes()[after_params] == b'(' {
        match find_paren_block(body, after_params) {
            Ok((_, close)) => params_end = close + 1,
            Err(kind) => {
                diagnostics.push(Diagnostic::new(
                    kind,
                    body_abs_start + after_params,
                    "unterminated parameter list",
                ));
                return (None, body.len());
            }
        }
    }

    // Locate either the first top-level `begin` (has a body) or the
    // declaration-terminating `;` (no body), tracking paren depth so a
    // `;` inside a parameter default or `begin` spelled inside a string
    // doesn't get mistaken for the real thing.
    let scan_start = params_end;
    let found = match scan_signature_tail(body, scan_start) {
        Ok(found) => found,
        Err(kind) => {
            diagnostics.push(Diagnostic::new(
                kind,
                body_abs_start + scan_start,
                "unterminated procedure declaration",
            ));
            return (None, body.len());
        }
    };

    // Return type: text between the parameter list and whichever
    // terminator (begin or `;`) was found, if it starts with `:`.
    let return_type = extract_return_type(body, params_end, found.tail_start());

    let (signature_text, body_text, decl_end) = match found {
        SignatureTail::NoBody { semicolon } => {
            let sig = body[decl_start..=semicolon].to_string();
            (sig, String::new(), semicolon)
        }
        SignatureTail::HasBody { begin, end_semi } => {
            let line_end_of_begin = body[begin..]
                .find('\n')
                .map(|off| begin + off)
                .unwrap_or(body.len());
            let sig = body[decl_start..line_end_of_begin].to_string();
            let bod = body[begin..=end_semi].to_string();
            (sig, bod, end_semi)
        }
    };

    let line_start = lines.line_at(body_abs_start + decl_start);
    let line_end = lines.line_at(body_abs_start + decl_end);

    let procedure = Procedure {
        kind,
        name,
        access,
        attributes,
        return_type,
        signature_text,
        body_text,
        line_start,
        line_end,
    };
    (Some(procedure), decl_end + 1)
}

enum SignatureTail {
    NoBody { semicolon: usize },
    HasBody { begin: usize, end_semi: usize },
}

impl SignatureTail {
    fn tail_start(&self) -> usize {
        match self {
            SignatureTail::NoBody { semicolon } => *semicolon,
            SignatureTail::HasBody { begin, .. } => *begin,
        }
    }
}

/// From just past the parameter list, find either the first top-level
/// `;` (no-body declaration) or the first top-level `begin` (body
/// follows), then, for the body case, the matching `end;` via
/// keyword-aware nesting (spec §4.3).
fn scan_signature_tail(s: &str, start: usize) -> Result<SignatureTail, ParseErrorKind> {
    let b = s.as_bytes();
    let len = b.len();
    let mut pos = start;
    let mut paren_depth: i64 = 0;
    loop {
        if pos >= len {
            return Err(ParseErrorKind::UnterminatedStatement);
        }
        match b[pos] {
            b'(' => {
                paren_depth += 1;
                pos += 1;
            }
            b')' => {
                paren_depth -= 1;
                pos += 1;
            }
            b';' if paren_depth <= 0 => return Ok(SignatureTail::NoBody { semicolon: pos }),
            b'\'' | b'"' | b'/' => {
                pos = advance_token(s, pos)?;
            }
            c if c.is_ascii_alphabetic() && paren_depth <= 0 => {
                if starts_word_boundary(s, pos) && is_word_at(s, pos, "begin") {
                    let end_semi = find_matching_end(s, pos)?;
                    return Ok(SignatureTail::HasBody {
                        begin: pos,
                        end_semi,
                    });
                }
                let (_, end) = read_word(s, pos);
                pos = end.max(pos + 1);
            }
            _ => pos += 1,
        }
    }
}

/// Keyword-aware `begin`/`case ... of`/`repeat` vs `end`/`until` nesting
/// (spec §4.3), starting at the opening `begin` and returning the index
/// of the terminating `;` after the matching `end`.
fn find_matching_end(s: &str, begin_at: usize) -> Result<usize, ParseErrorKind> {
    let len = s.len();
    let (_, mut pos) = read_word(s, begin_at);
    let mut depth: i64 = 1;
    loop {
        pos = skip_whitespace_and_comments(s, pos);
        if pos >= len {
            return Err(ParseErrorKind::UnterminatedBlock);
        }
        let bch = s.as_bytes()[pos];
        match bch {
            b'\'' | b'"' | b'/' => {
                pos = advance_token(s, pos)?;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let (word, end) = read_word(s, pos);
                if word.eq_ignore_ascii_case("begin") || word.eq_ignore_ascii_case("repeat") {
                    depth += 1;
                    pos = end;
                } else if word.eq_ignore_ascii_case("case") {
                    let peek = skip_whitespace_and_comments(s, end);
                    if is_word_at(s, peek, "of") {
                        depth += 1;
                        let (_, of_end) = read_word(s, peek);
                        pos = of_end;
                    } else {
                        pos = end;
                    }
                } else if word.eq_ignore_ascii_case("until") {
                    depth -= 1;
                    pos = end;
                } else if word.eq_ignore_ascii_case("end") {
                    depth -= 1;
                    if depth == 0 {
                        let after = skip_whitespace_and_comments(s, end);
                        return find_immediate_semicolon(s, after);
                    }
                    pos = end;
                } else {
                    pos = end;
                }
            }
            _ => pos += 1,
        }
    }
}

fn find_immediate_semicolon(s: &str, i: usize) -> Result<usize, ParseErrorKind> {
    if i < s.len() && s.as_bytes()[i] == b';' {
        Ok(i)
    } else {
        Err(ParseErrorKind::UnterminatedStatement)
    }
}

fn extract_return_type(s: &str, params_end: usize, tail_start: usize) -> Option<String> {
    let after = skip_whitespace_and_comments(s, params_end);
    if after < tail_start && after < s.len() && s.as_bytes()[after] == b':' {
        let text = s[after + 1..tail_start].trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> BodyParse {
        let lines = LineIndex::new(body);
        parse_body(body, 0, 0, &lines)
    }

    #[test]
    fn parses_property() {
        let r = parse("Caption = 'Customer Address';");
        assert_eq!(r.properties.len(), 1);
        assert_eq!(r.properties[0].name, "Caption");
        assert_eq!(r.properties[0].value, "'Customer Address'");
    }

    #[test]
    fn parses_section() {
        let r = parse("fields { field(1; \"No.\"; Code[20]) { } }");
        assert_eq!(r.sections.len(), 1);
        assert_eq!(r.sections[0].name, "fields");
        assert!(r.sections[0].body_text.contains("field(1"));
    }

    #[test]
    fn parses_parenthesized_top_level_block_as_section() {
        let r = parse("value(0; Bronze) { Caption = 'Bronze'; }\nvalue(1; Silver) { Caption = 'Silver'; }");
        assert_eq!(r.sections.len(), 2);
        assert_eq!(r.sections[0].name, "value");
        assert!(r.sections[0].body_text.contains("Bronze"));
        assert_eq!(r.sections[1].name, "value");
    }

    #[test]
    fn parses_unknown_section_name() {
        let r = parse("mystuff { anything here }");
        assert_eq!(r.sections.len(), 1);
        assert_eq!(r.sections[0].name, "mystuff");
    }

    #[test]
    fn parses_procedure_with_body() {
        let r = parse("local procedure Foo(x: Integer): Boolean\n    begin\n        exit(true);\n    end;");
        assert_eq!(r.procedures.len(), 1);
        let p = &r.procedures[0];
        assert_eq!(p.name, "Foo");
        assert_eq!(p.access, Access::Local);
        assert_eq!(p.return_type.as_deref(), Some("Boolean"));
        assert!(p.body_text.starts_with("begin"));
        assert!(p.body_text.trim_end().ends_with("end;"));
    }

    #[test]
    fn parses_procedure_without_body() {
        let r = parse("procedure Foo(x: Integer): Boolean;");
        assert_eq!(r.procedures.len(), 1);
        let p = &r.procedures[0];
        assert_eq!(p.body_text, "");
        assert!(p.signature_text.ends_with(';'));
    }

    #[test]
    fn parses_trigger_with_nested_begin_end() {
        let r = parse(
            "trigger OnInsert()\n    begin\n        if Foo then begin\n            Bar();\n        end;\n    end;",
        );
        assert_eq!(r.procedures.len(), 1);
        let p = &r.procedures[0];
        assert_eq!(p.kind, ProcedureKind::Trigger);
        assert_eq!(p.access, Access::Public);
        assert!(p.body_text.trim_end().ends_with("end;"));
    }

    #[test]
    fn parses_attributes_on_procedure() {
        let r = parse(
            "[EventSubscriber(ObjectType::Table, Database::Customer, 'OnAfterInsertEvent', '', false, false)]\n    local procedure OnAfterInsertCustomer()\n    begin\n    end;",
        );
        assert_eq!(r.procedures.len(), 1);
        assert_eq!(r.procedures[0].attributes.len(), 1);
        assert!(r.procedures[0].attributes[0].starts_with("[EventSubscriber("));
    }

    #[test]
    fn discards_attributes_before_property() {
        let r = parse("[Foo]\nCaption = 'x';");
        assert_eq!(r.properties.len(), 1);
    }

    #[test]
    fn case_of_pairs_with_end_not_until() {
        let r = parse(
            "procedure Foo()\n    begin\n        case X of\n            1: exit;\n        end;\n    end;",
        );
        assert_eq!(r.procedures.len(), 1);
        assert!(r.procedures[0].body_text.trim_end().ends_with("end;"));
    }

    #[test]
    fn repeat_until_pairs_correctly() {
        let r = parse(
            "procedure Foo()\n    begin\n        repeat\n            X := X + 1;\n        until X > 10;\n    end;",
        );
        assert_eq!(r.procedures.len(), 1);
        assert!(r.procedures[0].body_text.contains("until X > 10"));
    }
}
