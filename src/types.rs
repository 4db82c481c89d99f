//! The parse-tree and chunk data model (spec §3).
//!
//! `Object`/`Property`/`Section`/`Procedure` are internal parse-tree types;
//! they are never serialized directly. `Chunk`/`ChunkMetadata` are the
//! public wire types described in spec §6 and derive `Serialize`/
//! `Deserialize` so round-tripping through JSON is a straightforward
//! `serde_json::to_value`/`from_value` call for callers.

use serde::{Deserialize, Serialize};

/// One of the 19 AL object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Table,
    TableExtension,
    Page,
    PageExtension,
    Codeunit,
    Report,
    ReportExtension,
    Query,
    Xmlport,
    Enum,
    EnumExtension,
    Interface,
    PermissionSet,
    PermissionSetExtension,
    Profile,
    ControlAddIn,
    Entitlement,
    Dotnet,
    PageCustomization,
}

impl ObjectKind {
    /// All 19 kinds with their AL source keyword, ordered longest-keyword
    /// first per spec §4.2 ("recognizer matches longest keyword first").
    pub const ALL: &'static [(ObjectKind, &'static str)] = &[
        (ObjectKind::TableExtension, "tableextension"),
        (ObjectKind::PageExtension, "pageextension"),
        (ObjectKind::ReportExtension, "reportextension"),
        (ObjectKind::EnumExtension, "enumextension"),
        (ObjectKind::PermissionSetExtension, "permissionsetextension"),
        (ObjectKind::PageCustomization, "pagecustomization"),
        (ObjectKind::ControlAddIn, "controladdin"),
        (ObjectKind::PermissionSet, "permissionset"),
        (ObjectKind::Entitlement, "entitlement"),
        (ObjectKind::Profile, "profile"),
        (ObjectKind::Interface, "interface"),
        (ObjectKind::Dotnet, "dotnet"),
        (ObjectKind::Codeunit, "codeunit"),
        (ObjectKind::Xmlport, "xmlport"),
        (ObjectKind::Report, "report"),
        (ObjectKind::Query, "query"),
        (ObjectKind::Table, "table"),
        (ObjectKind::Page, "page"),
        (ObjectKind::Enum, "enum"),
    ];

    /// Lowercase wire spelling, matching the AL keyword.
    pub fn as_str(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(k, _)| *k == self)
            .map(|(_, s)| *s)
            .unwrap_or("")
    }

    /// Interfaces carry no numeric id.
    pub fn has_id(self) -> bool {
        !matches!(self, ObjectKind::Interface)
    }
}

/// Names commonly used for top-level sections; any other identifier
/// followed by `{ ... }` at object-body depth 1 is still captured as a
/// section (spec §3); this list is informative, not a gate.
pub const KNOWN_SECTION_NAMES: &[&str] = &[
    "fields",
    "keys",
    "layout",
    "actions",
    "views",
    "dataset",
    "elements",
    "requestpage",
    "schema",
    "rendering",
    "labels",
];

/// A top-level property assignment (`Name = value;`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    /// Raw right-hand side, trimmed, without the terminating `;`.
    pub value: String,
    pub line_start: usize,
    pub line_end: usize,
}

/// A named `{ ... }` region inside an object body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// Verbatim interior text between (not including) the outer braces.
    pub body_text: String,
    pub line_start: usize,
    pub line_end: usize,
    /// Not populated by the core parser (spec §3); retained for callers
    /// that want to recursively re-chunk `body_text` themselves.
    pub children: Vec<Section>,
    /// Byte offset of `body_text`'s first character, relative to the
    /// start of the owning [`Object`]'s `source_text`. Not part of the
    /// externally specified data model (Section is never serialized); the
    /// chunker uses it to map sub-block positions within `body_text` back
    /// to absolute source line numbers.
    pub(crate) body_offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureKind {
    Procedure,
    Trigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Public,
    Local,
    Internal,
    Protected,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Local => "local",
            Access::Internal => "internal",
            Access::Protected => "protected",
        }
    }
}

/// A procedure or trigger member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    pub kind: ProcedureKind,
    pub name: String,
    /// Always `Access::Public` for triggers (spec §3).
    pub access: Access,
    /// Each `[...]` directive preceding the declaration, verbatim and in
    /// source order.
    pub attributes: Vec<String>,
    pub return_type: Option<String>,
    /// From the keyword through the line containing the first `begin` at
    /// depth 1, or through the declaration terminator if there is no body.
    pub signature_text: String,
    /// From `begin` through the matching `end;`; empty for a body-less
    /// declaration.
    pub body_text: String,
    /// Covers attributes through the terminating `;` (spec §3).
    pub line_start: usize,
    pub line_end: usize,
}

/// A parsed top-level AL object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub kind: ObjectKind,
    /// 0 for interfaces.
    pub id: u32,
    pub name: String,
    pub extends: Option<String>,
    pub properties: Vec<Property>,
    pub sections: Vec<Section>,
    pub procedures: Vec<Procedure>,
    /// The object's full original text, header through closing brace.
    pub source_text: String,
    pub line_start: usize,
    pub line_end: usize,
    pub file_hash: String,
}

//
// ───────────────────────── Public wire types (spec §6) ─────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    WholeObject,
    Header,
    Section,
    Procedure,
    Trigger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub file_path: String,
    pub object_type: String,
    pub object_id: u32,
    pub object_name: String,
    pub chunk_type: ChunkType,
    /// `null` on the wire when absent, never omitted (spec §9).
    pub section_name: Option<String>,
    pub procedure_name: Option<String>,
    pub extends: Option<String>,
    pub source_table: Option<String>,
    pub attributes: Vec<String>,
    pub line_start: usize,
    pub line_end: usize,
    pub file_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub token_estimate: u64,
    pub metadata: ChunkMetadata,
}
