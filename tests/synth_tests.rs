mod common;

use common::{sessions_fixture, Fixture};
use serde_json::json;
use specweave::spec::HttpMethod;
use specweave::synth::{
    scan_component_sources, ComponentCapabilitySpec, KeywordClassifier, KeywordRule,
};
use specweave::{BuildOrchestrator, RunMode};

const BOX_DTS: &str = r#"
import { BufferGeometry } from "../core/BufferGeometry.js";

export class BoxGeometry extends BufferGeometry {
    /**
     * @param width Width along the X axis. Default `1`
     * @param height Height along the Y axis. Default `1`
     * @param depth Depth along the Z axis. Default `1`
     */
    constructor(width?: number, height?: number, depth?: number);
}
"#;

const SPHERE_YAML: &str = r#"
types:
  - name: SphereGeometry
    params:
      - name: radius
        type: number
        default: 1
      - name: widthSegments
        type: integer
        default: 32
"#;

const LIGHTS_JS: &str = r#"
AFRAME.registerComponent('light-point', {
  schema: {
    color: {type: 'color', default: '#ffffff'},
    intensity: {type: 'number', default: 1.0}
  },
  init: function () {}
});

AFRAME.registerComponent('sky-dome', {
  schema: {
    radius: {type: 'number', default: 500, min: 1}
  }
});

AFRAME.registerComponent('half-done', { schema: { a: {type: 'number' } );
"#;

fn synth_fixture() -> Fixture {
    let fx = sessions_fixture();
    fx.file("vendor/types/BoxGeometry.d.ts", BOX_DTS)
        .file("vendor/types/sphere.yaml", SPHERE_YAML)
        .file("vendor/components/lights.js", LIGHTS_JS);
    fx
}

#[test]
fn test_box_declaration_becomes_discriminated_variant() {
    let fx = synth_fixture();
    let mut config = fx.config();
    config.paths.type_definitions = Some(fx.root().join("vendor/types"));

    let outcome = BuildOrchestrator::new(config).run(RunMode::Validate);
    assert_eq!(outcome.exit_code(), 0, "{}", outcome.report);
    let spec = outcome.spec.unwrap();

    let variant = &spec.components["geometries_BoxGeometry"];
    assert_eq!(variant["properties"]["type"]["enum"], json!(["box"]));
    for dim in ["width", "height", "depth"] {
        assert_eq!(variant["properties"][dim]["type"], "number", "{dim}");
        assert_eq!(variant["properties"][dim]["default"], json!(1), "{dim}");
    }
    assert!(spec.components.contains_key("geometries_SphereGeometry"));

    let create = &spec.paths["/geometries"].operations[&HttpMethod::Post];
    assert_eq!(create.operation_id, "createGeometry");
    let body = create.request_body.as_ref().unwrap().schema.as_ref().unwrap();
    assert_eq!(
        body["discriminator"]["mapping"]["box"],
        "#/components/schemas/geometries_BoxGeometry"
    );
    assert_eq!(
        body["discriminator"]["mapping"]["sphere"],
        "#/components/schemas/geometries_SphereGeometry"
    );
    assert_eq!(body["oneOf"].as_array().unwrap().len(), 2);
}

#[test]
fn test_conflicting_discriminators_are_reported() {
    let fx = synth_fixture();
    fx.file(
        "vendor/types/legacy.json",
        r#"{"name": "BoxBufferGeometry", "params": []}"#,
    );
    let mut config = fx.config();
    config.paths.type_definitions = Some(fx.root().join("vendor/types"));

    let outcome = BuildOrchestrator::new(config).run(RunMode::Generate);
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.artifacts.is_empty());
    let err = outcome.report.errors[0].to_string();
    assert!(err.contains("'box'"), "{err}");
    assert!(err.contains("BoxBufferGeometry") && err.contains("BoxGeometry"), "{err}");
}

#[test]
fn test_light_point_component_is_extracted() {
    let fx = synth_fixture();
    let out = scan_component_sources(
        &fx.root().join("vendor/components"),
        "components",
        &["js".to_string()],
        &KeywordClassifier::builtin(),
    );
    assert!(out.errors.is_empty());
    assert_eq!(out.warnings.len(), 1, "{:?}", out.warnings);
    assert!(out.warnings[0].contains("half-done"));

    let fragment = out.fragment.unwrap();
    let schema = &fragment.document["components"]["schemas"]["light-point"];
    let light = ComponentCapabilitySpec::from_schema(schema).unwrap();
    assert_eq!(light.name, "light-point");
    assert_eq!(light.category, "light");
    let props: Vec<&str> = light.properties.keys().map(String::as_str).collect();
    assert_eq!(props, vec!["color", "intensity"]);
    assert_eq!(light.properties["color"].ty, "color");
    assert_eq!(light.properties["color"].default, Some(json!("#ffffff")));
    assert_eq!(light.properties["intensity"].ty, "number");
    assert_eq!(light.properties["intensity"].default, Some(json!(1.0)));
}

#[test]
fn test_configured_categories_take_precedence() {
    let fx = synth_fixture();
    let mut config = fx.config();
    config.paths.component_sources = Some(fx.root().join("vendor/components"));
    config.synth.components.categories = vec![KeywordRule::new("sky", "environment")];

    let outcome = BuildOrchestrator::new(config).run(RunMode::Validate);
    assert_eq!(outcome.exit_code(), 0, "{}", outcome.report);
    let spec = outcome.spec.unwrap();
    let sky =
        ComponentCapabilitySpec::from_schema(&spec.components["components_sky-dome"]).unwrap();
    assert_eq!(sky.category, "environment");
    // Skipped blocks surface as warnings, never errors.
    assert!(outcome.report.warnings.iter().any(|w| w.contains("half-done")));
}

#[test]
fn test_components_reach_the_scripting_client() {
    let fx = synth_fixture();
    let mut config = fx.config();
    config.paths.component_sources = Some(fx.root().join("vendor/components"));

    let outcome = BuildOrchestrator::new(config).run(RunMode::Generate);
    assert_eq!(outcome.exit_code(), 0, "{}", outcome.report);
    let client = fx.read_output("client.py");
    assert!(client.contains("light-point"));
    assert!(client.contains("#ffffff"));
}

#[test]
fn test_missing_type_definitions_directory_is_a_config_error() {
    let fx = sessions_fixture();
    let mut config = fx.config();
    config.paths.type_definitions = Some(fx.root().join("vendor/no-such-dir"));

    let outcome = BuildOrchestrator::new(config).run(RunMode::Generate);
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.artifacts.is_empty());
    let err = outcome
        .report
        .errors
        .iter()
        .find(|e| e.kind() == "ConfigError")
        .unwrap_or_else(|| panic!("no config error in {}", outcome.report));
    assert!(err.to_string().contains("no-such-dir"));
}

#[test]
fn test_empty_type_definitions_directory_adds_no_operation() {
    let fx = sessions_fixture();
    fx.file("vendor/types/README.txt", "no declarations here\n");
    let mut config = fx.config();
    config.paths.type_definitions = Some(fx.root().join("vendor/types"));

    let outcome = BuildOrchestrator::new(config).run(RunMode::Generate);
    assert_eq!(outcome.exit_code(), 0, "{}", outcome.report);
    let spec = outcome.spec.unwrap();
    assert!(!spec.paths.contains_key("/geometries"));
    assert!(outcome
        .report
        .warnings
        .iter()
        .any(|w| w.contains("no type declarations found")));
    assert!(!fx.read_output("cli.rs").contains("create-geometry"));
}
