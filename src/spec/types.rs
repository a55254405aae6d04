use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Where a fragment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentOrigin {
    /// Hand-written schema document loaded from the schema directory
    HandWritten,
    /// Synthesized from foreign type declarations
    TypeDefinitions,
    /// Synthesized from component-library source text
    ComponentLibrary,
}

/// One loaded or synthesized unit of API-schema input.
///
/// Fragments are never mutated after construction; the merger works on
/// clones of the raw document.
#[derive(Debug, Clone)]
pub struct SchemaFragment {
    /// Source name, used to namespace shared sub-schemas (`<name>_<schema>`)
    pub name: String,
    /// File (or directory, for synthesized fragments) the fragment came from
    pub source_path: PathBuf,
    pub origin: FragmentOrigin,
    /// Generic structured form of the document
    pub document: Value,
}

impl SchemaFragment {
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<PathBuf>,
        origin: FragmentOrigin,
        document: Value,
    ) -> Self {
        SchemaFragment {
            name: name.into(),
            source_path: source_path.into(),
            origin,
            document,
        }
    }
}

/// HTTP methods an operation can be declared under.
///
/// Declaration order is the order routes are emitted in for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Parse a (case-insensitive) method key from a schema document.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "put" => Some(HttpMethod::Put),
            "post" => Some(HttpMethod::Post),
            "delete" => Some(HttpMethod::Delete),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "patch" => Some(HttpMethod::Patch),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Lower-case key as it appears in a schema document.
    pub fn key(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Cookie => write!(f, "cookie"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMeta {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<Value>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub required: bool,
    /// `application/json` schema, if one is declared
    pub schema: Option<Value>,
}

/// Declared pointer from an operation to its implementation artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerBinding {
    /// Implementation file, relative to the configured handler root
    pub file: PathBuf,
    pub function: String,
}

/// One `(method, path)` API entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Globally unique; seeds every generated identifier
    pub operation_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub summary: Option<String>,
    /// Path-level parameters merged with operation-level ones; path
    /// parameters come first, in template order
    pub parameters: Vec<ParameterMeta>,
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, Value>,
    pub handler: Option<HandlerBinding>,
    /// Name of the fragment that contributed this operation
    pub source: String,
}

impl Operation {
    pub fn key(&self) -> OperationKey {
        OperationKey {
            path: self.path.clone(),
            method: self.method,
        }
    }

    pub fn path_parameters(&self) -> impl Iterator<Item = &ParameterMeta> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Path)
    }

    /// `GET /sessions (core)` style label used in reports.
    pub fn label(&self) -> String {
        format!("{} {} ({})", self.method, self.path, self.source)
    }
}

/// Identity of an operation inside the unified specification.
///
/// Orders by path first, then method: the route-table order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationKey {
    pub path: String,
    pub method: HttpMethod,
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathItem {
    /// At most one operation per method
    pub operations: BTreeMap<HttpMethod, Operation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

impl Default for SpecInfo {
    fn default() -> Self {
        SpecInfo {
            title: "specweave".to_string(),
            version: "0.0.0".to_string(),
            description: None,
        }
    }
}

/// The single merged schema model consumed by the validator and every emitter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedSpecification {
    pub info: SpecInfo,
    pub paths: BTreeMap<String, PathItem>,
    /// Shared sub-schemas keyed by `<source>_<original name>`
    pub components: BTreeMap<String, Value>,
}

impl UnifiedSpecification {
    /// All operations in route-table order (path, then method).
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.paths
            .values()
            .flat_map(|item| item.operations.values())
    }

    pub fn operation(&self, key: &OperationKey) -> Option<&Operation> {
        self.paths
            .get(&key.path)
            .and_then(|item| item.operations.get(&key.method))
    }

    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|p| p.operations.len()).sum()
    }
}

/// One row of the deterministic route table handed to every emitter.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEntry {
    pub method: HttpMethod,
    pub path: String,
    pub operation_id: String,
    pub summary: Option<String>,
    /// Path parameter names in template order
    pub path_params: Vec<String>,
    pub request_body: Option<RequestBody>,
    pub handler: Option<HandlerBinding>,
    /// Handler binding is missing on disk; emit a placeholder instead
    pub stub: bool,
}

impl RouteEntry {
    pub fn has_body(&self) -> bool {
        self.request_body.is_some()
    }

    pub fn body_required(&self) -> bool {
        self.request_body.as_ref().map(|b| b.required).unwrap_or(false)
    }

    /// Positional argument count of the generated CLI subcommand.
    pub fn arity(&self) -> usize {
        self.path_params.len() + usize::from(self.body_required())
    }
}
