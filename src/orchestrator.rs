//! # Build Orchestrator
//!
//! Sequences one generator run:
//!
//! ```text
//! load ─┐
//! types ├─► order ─► merge ─► validate ─► route table ─► name check ─► emit
//! comps ┘
//! ```
//!
//! Loading and the two synthesizers read disjoint inputs and run on scoped
//! threads. Their fragments are re-sorted into the stable load order before
//! merging, so the merge result does not depend on which finished first.
//! Everything after that is sequential.
//!
//! Errors are collected into a [`BuildReport`] rather than returned. Once any
//! error has been collected, nothing is emitted; a render failure only skips
//! its own artifact.

use crate::config::BuildConfig;
use crate::error::{BuildReport, GenError};
use crate::generator::{
    check_all_generated_names, check_parameter_identifiers, write_atomic, GenerationArtifact,
    TemplateCache,
};
use crate::spec::{
    build_route_table, load_fragments, merge_fragments, order_fragments, PathCollision, RouteEntry,
    SchemaFragment, UnifiedSpecification,
};
use crate::synth::{scan_component_sources, scan_type_definitions, CategoryClassifier, SynthOutput};
use crate::validator::validate_handlers;
use std::collections::BTreeSet;
use std::thread;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Full pipeline including emission
    Generate,
    /// Stop after validation and the generated-name check
    Validate,
}

/// Everything one run produced.
#[derive(Debug, Default)]
pub struct BuildOutcome {
    pub report: BuildReport,
    /// `None` when no usable fragment set was loaded
    pub spec: Option<UnifiedSpecification>,
    pub routes: Vec<RouteEntry>,
    pub collisions: Vec<PathCollision>,
    pub artifacts: Vec<GenerationArtifact>,
}

impl BuildOutcome {
    pub fn exit_code(&self) -> i32 {
        self.report.exit_code()
    }
}

/// Owns the configuration, the template cache and the category classifier
/// for the duration of one or more runs.
pub struct BuildOrchestrator {
    config: BuildConfig,
    templates: TemplateCache,
    classifier: Box<dyn CategoryClassifier>,
}

fn join_panic(stage: &str) -> GenError {
    GenError::Other(anyhow::anyhow!("{stage} worker panicked"))
}

impl BuildOrchestrator {
    pub fn new(config: BuildConfig) -> Self {
        let classifier = Box::new(config.classifier());
        BuildOrchestrator {
            config,
            templates: TemplateCache::new(),
            classifier,
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn CategoryClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_templates(mut self, templates: TemplateCache) -> Self {
        self.templates = templates;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Run both synthesizers (those with a configured input) concurrently.
    pub fn synthesize(&self) -> Result<Vec<SynthOutput>, GenError> {
        let type_options = self.config.type_scan_options()?;
        let classifier: &dyn CategoryClassifier = self.classifier.as_ref();
        let paths = &self.config.paths;
        let components = &self.config.synth.components;

        thread::scope(|s| {
            let types = paths
                .type_definitions
                .as_deref()
                .map(|dir| s.spawn(move || scan_type_definitions(dir, &type_options)));
            let comps = paths.component_sources.as_deref().map(|dir| {
                s.spawn(move || {
                    scan_component_sources(
                        dir,
                        &components.fragment_name,
                        &components.extensions,
                        classifier,
                    )
                })
            });
            let mut outputs = Vec::new();
            for (stage, handle) in [("type-definition scan", types), ("component scan", comps)] {
                if let Some(handle) = handle {
                    outputs.push(handle.join().map_err(|_| join_panic(stage))?);
                }
            }
            Ok(outputs)
        })
    }

    /// Load hand-written fragments and synthesize the rest concurrently, then
    /// put them into the stable load order.
    ///
    /// Returns `None` when there is nothing left to merge.
    pub fn collect_fragments(&self, report: &mut BuildReport) -> Option<Vec<SchemaFragment>> {
        let schemas = match self.config.schemas_dir() {
            Ok(dir) => dir,
            Err(e) => {
                report.error(e);
                return None;
            }
        };

        let (loaded, synthesized) = thread::scope(|s| {
            let loader = s.spawn(|| load_fragments(schemas));
            let synthesized = self.synthesize();
            let loaded = loader.join().map_err(|_| join_panic("fragment loader"));
            (loaded, synthesized)
        });

        let mut fragments = Vec::new();
        match loaded {
            Ok(Ok(loaded)) => {
                debug!(count = loaded.fragments.len(), "loaded hand-written fragments");
                fragments.extend(loaded.fragments);
                report.extend_errors(loaded.errors);
            }
            Ok(Err(e)) => report.error(GenError::Other(e)),
            Err(e) => report.error(e),
        }
        match synthesized {
            Ok(outputs) => {
                for out in outputs {
                    report.extend_warnings(out.warnings);
                    report.extend_errors(out.errors);
                    fragments.extend(out.fragment);
                }
            }
            Err(e) => report.error(e),
        }

        let (ordered, errors) = order_fragments(fragments);
        report.extend_errors(errors);
        if ordered.is_empty() {
            warn!("no usable schema fragments; skipping merge, validation and emission");
            if !report.has_errors() {
                report.error(GenError::Config(format!(
                    "no schema fragments found in {}",
                    schemas.display()
                )));
            }
            return None;
        }
        Some(ordered)
    }

    pub fn run(&self, mode: RunMode) -> BuildOutcome {
        let mut outcome = BuildOutcome::default();
        let Some(fragments) = self.collect_fragments(&mut outcome.report) else {
            return outcome;
        };
        let report = &mut outcome.report;

        let merged = merge_fragments(&fragments, self.config.collision_policy);
        info!(
            fragments = fragments.len(),
            operations = merged.spec.operation_count(),
            components = merged.spec.components.len(),
            "merged schema fragments"
        );
        report.extend_warnings(merged.warnings);
        report.extend_errors(merged.errors);
        for c in &merged.collisions {
            report.warn(format!(
                "{} {} from '{}' overrides '{}'",
                c.method, c.path, c.later, c.earlier
            ));
        }
        outcome.collisions = merged.collisions;
        let spec = merged.spec;

        let mut stubs = BTreeSet::new();
        if self.config.handler_validation {
            match validate_handlers(&spec, &self.config.validation_options()) {
                Ok(validation) => {
                    for m in &validation.missing {
                        report.warn(format!("missing handler {m}; emitting stub"));
                    }
                    stubs = validation.stubs;
                }
                Err(e) => report.error(e),
            }
        }

        let routes = build_route_table(&spec, &stubs);
        report.extend_errors(check_all_generated_names(
            spec.operations().map(|op| op.operation_id.as_str()),
        ));
        report.extend_errors(check_parameter_identifiers(&routes));

        if mode == RunMode::Generate {
            if report.has_errors() {
                warn!(errors = report.errors.len(), "errors collected; no artifacts written");
            } else {
                outcome.artifacts = self.emit(&spec, &routes, report);
            }
        }

        outcome.routes = routes;
        outcome.spec = Some(spec);
        outcome
    }

    /// Render and write every enabled artifact. A failing artifact is
    /// reported and skipped; the others are still written.
    fn emit(
        &self,
        spec: &UnifiedSpecification,
        routes: &[RouteEntry],
        report: &mut BuildReport,
    ) -> Vec<GenerationArtifact> {
        let mut artifacts = Vec::new();
        for kind in self.config.enabled_artifacts() {
            let output_path = self.config.output_path(kind);
            let written = kind
                .render(&self.templates, spec, routes)
                .and_then(|text| write_atomic(&output_path, &text));
            match written {
                Ok(status) => {
                    info!(
                        artifact = %kind,
                        path = %output_path.display(),
                        ?status,
                        "artifact emitted"
                    );
                    artifacts.push(GenerationArtifact {
                        kind,
                        output_path,
                        status,
                    });
                }
                Err(e) => {
                    warn!(artifact = %kind, error = %e, "artifact not emitted");
                    report.error(e);
                }
            }
        }
        artifacts
    }
}
