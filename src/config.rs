//! # Build Configuration
//!
//! A generator run is described by a TOML file (every key optional) plus
//! command-line overrides:
//!
//! ```toml
//! strict-validation = false
//! auto-routing = true
//! handler-validation = true
//! fail-on-missing-handlers = false
//! collision-policy = "last-writer-wins"   # or "error"
//!
//! [paths]
//! schemas = "schemas"
//! handler-root = "."
//! out-dir = "generated"
//! type-definitions = "vendor/types"
//! component-sources = "vendor/components"
//!
//! [outputs]
//! router = "router.rs"
//! cli = "cli.rs"
//! scripting = "client.py"
//!
//! [synth.types]
//! fragment-name = "geometries"
//! path = "/geometries"
//! method = "post"
//! operation-id = "createGeometry"
//! strip-suffixes = ["buffergeometry", "geometry"]
//! handler-file = "api/geometries/create.go"
//!
//! [synth.components]
//! fragment-name = "components"
//! extensions = ["js", "mjs"]
//!
//! [[synth.components.categories]]
//! keyword = "sky"
//! category = "environment"
//! ```
//!
//! Relative paths resolve against the directory holding the config file.

use crate::error::GenError;
use crate::generator::{to_snake_case, ArtifactKind};
use crate::spec::{CollisionPolicy, HandlerBinding, HttpMethod};
use crate::synth::{KeywordClassifier, KeywordRule, TypeScanOptions};
use crate::validator::ValidationOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Missing handlers fail the build; bound files must mention the function
    pub strict_validation: bool,
    /// Emit the router artifact
    pub auto_routing: bool,
    /// Run the handler validator at all
    pub handler_validation: bool,
    pub fail_on_missing_handlers: bool,
    pub collision_policy: CollisionPolicy,
    pub paths: PathsConfig,
    pub outputs: OutputsConfig,
    pub synth: SynthConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            strict_validation: false,
            auto_routing: true,
            handler_validation: true,
            fail_on_missing_handlers: false,
            collision_policy: CollisionPolicy::default(),
            paths: PathsConfig::default(),
            outputs: OutputsConfig::default(),
            synth: SynthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PathsConfig {
    pub schemas: Option<PathBuf>,
    pub handler_root: PathBuf,
    pub out_dir: PathBuf,
    pub type_definitions: Option<PathBuf>,
    pub component_sources: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            schemas: None,
            handler_root: PathBuf::from("."),
            out_dir: PathBuf::from("generated"),
            type_definitions: None,
            component_sources: None,
        }
    }
}

/// Artifact file names, relative to `out-dir`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputsConfig {
    pub router: PathBuf,
    pub cli: PathBuf,
    pub scripting: PathBuf,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        OutputsConfig {
            router: PathBuf::from("router.rs"),
            cli: PathBuf::from("cli.rs"),
            scripting: PathBuf::from("client.py"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthConfig {
    pub types: TypeSynthConfig,
    pub components: ComponentSynthConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct TypeSynthConfig {
    pub fragment_name: String,
    pub path: String,
    pub method: String,
    pub operation_id: String,
    pub strip_suffixes: Vec<String>,
    pub handler_file: Option<PathBuf>,
    pub handler_function: Option<String>,
}

impl Default for TypeSynthConfig {
    fn default() -> Self {
        let defaults = TypeScanOptions::default();
        TypeSynthConfig {
            fragment_name: defaults.fragment_name,
            path: defaults.path,
            method: defaults.method.key(),
            operation_id: defaults.operation_id,
            strip_suffixes: defaults.strip_suffixes,
            handler_file: None,
            handler_function: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ComponentSynthConfig {
    pub fragment_name: String,
    pub extensions: Vec<String>,
    /// Consulted before the built-in keyword rules
    pub categories: Vec<KeywordRule>,
}

impl Default for ComponentSynthConfig {
    fn default() -> Self {
        ComponentSynthConfig {
            fragment_name: "components".to_string(),
            extensions: vec!["js".to_string(), "mjs".to_string()],
            categories: Vec::new(),
        }
    }
}

fn resolve(base: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

impl BuildConfig {
    /// Parse a config document. Paths are left as written.
    pub fn from_toml_str(text: &str) -> Result<Self, GenError> {
        toml::from_str(text).map_err(|e| GenError::Config(e.to_string()))
    }

    /// Load a config file and resolve its relative paths against the file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self, GenError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| GenError::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut config: BuildConfig = toml::from_str(&text)
            .map_err(|e| GenError::Config(format!("{}: {e}", path.display())))?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        config.resolve_relative_to(base);
        Ok(config)
    }

    pub fn resolve_relative_to(&mut self, base: &Path) {
        let paths = &mut self.paths;
        for p in [&mut paths.schemas, &mut paths.type_definitions, &mut paths.component_sources]
            .into_iter()
            .flatten()
        {
            resolve(base, p);
        }
        resolve(base, &mut paths.handler_root);
        resolve(base, &mut paths.out_dir);
    }

    pub fn schemas_dir(&self) -> Result<&Path, GenError> {
        self.paths
            .schemas
            .as_deref()
            .ok_or_else(|| {
                GenError::Config("no schema directory configured (paths.schemas)".to_string())
            })
    }

    pub fn output_path(&self, kind: ArtifactKind) -> PathBuf {
        let file = match kind {
            ArtifactKind::Router => &self.outputs.router,
            ArtifactKind::Cli => &self.outputs.cli,
            ArtifactKind::ScriptingClient => &self.outputs.scripting,
        };
        self.paths.out_dir.join(file)
    }

    /// Artifacts this configuration emits, in emission order.
    pub fn enabled_artifacts(&self) -> Vec<ArtifactKind> {
        ArtifactKind::ALL
            .into_iter()
            .filter(|k| *k != ArtifactKind::Router || self.auto_routing)
            .collect()
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            strict: self.strict_validation,
            fail_on_missing_handlers: self.fail_on_missing_handlers,
            handler_root: self.paths.handler_root.clone(),
        }
    }

    pub fn type_scan_options(&self) -> Result<TypeScanOptions, GenError> {
        let types = &self.synth.types;
        let method = HttpMethod::parse(&types.method).ok_or_else(|| {
            GenError::Config(format!(
                "synth.types.method: unknown HTTP method '{}'",
                types.method
            ))
        })?;
        if !types.path.starts_with('/') {
            return Err(GenError::Config(format!(
                "synth.types.path: '{}' must start with '/'",
                types.path
            )));
        }
        let handler = types.handler_file.as_ref().map(|file| HandlerBinding {
            file: file.clone(),
            function: types
                .handler_function
                .clone()
                .unwrap_or_else(|| to_snake_case(&types.operation_id)),
        });
        Ok(TypeScanOptions {
            fragment_name: types.fragment_name.clone(),
            path: types.path.clone(),
            method,
            operation_id: types.operation_id.clone(),
            strip_suffixes: types.strip_suffixes.clone(),
            handler,
        })
    }

    pub fn classifier(&self) -> KeywordClassifier {
        KeywordClassifier::with_rules(self.synth.components.categories.clone())
    }
}
