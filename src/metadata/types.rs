//! Data returned by the parser backend.
//!
//! The four metadata types are invariant for the lifetime of a loaded
//! backend. [`ParseOutcome`] is the only input-dependent result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Child keys to traverse, per node type (e.g. `"BinaryExpression" -> ["left", "right"]`).
pub type VisitorKeys = BTreeMap<String, Vec<String>>;

/// Human-readable label per token type (e.g. `"parenL" -> "("`).
pub type TokenLabels = BTreeMap<String, String>;

/// Node type introspection data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypesInfo {
    /// Alias name to the node types it covers (e.g. `"Expression" -> [...]`).
    #[serde(default)]
    pub flipped_alias_keys: BTreeMap<String, Vec<String>>,
    /// Visitor keys as the backend's type system defines them.
    #[serde(default)]
    pub visitor_keys: VisitorKeys,
}

impl TypesInfo {
    /// Node types covered by an alias, if the alias exists.
    pub fn alias(&self, name: &str) -> Option<&[String]> {
        self.flipped_alias_keys.get(name).map(Vec::as_slice)
    }
}

/// How the source text should be interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Script,
    #[default]
    Module,
    #[serde(rename = "commonjs")]
    CommonJs,
}

/// Options for a parse request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// File the source came from, used by the backend to locate its config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub source_type: SourceType,
    /// Language version to target; `None` means latest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecma_version: Option<u32>,
    /// Syntax plugins to enable.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,
    pub allow_return_outside_function: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn ecma_version(mut self, version: u32) -> Self {
        self.ecma_version = Some(version);
        self
    }

    pub fn plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugins.push(plugin.into());
        self
    }
}

/// Result of a parse request.
///
/// Parsing is negotiated in two phases: a backend may answer with a finished
/// tree, or with [`ParseOutcome::Deferred`] carrying the options it derived,
/// in which case the caller runs its own full parser with those options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParseOutcome<A> {
    /// The backend produced a tree.
    Parsed { ast: A },
    /// No tree; re-parse with `options`.
    Deferred { options: ParseOptions },
}

impl<A> ParseOutcome<A> {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred { .. })
    }

    /// The parsed tree, if the backend produced one.
    pub fn into_ast(self) -> Option<A> {
        match self {
            Self::Parsed { ast } => Some(ast),
            Self::Deferred { .. } => None,
        }
    }
}
