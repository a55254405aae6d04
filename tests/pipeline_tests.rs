mod common;

use common::{sessions_fixture, with_captured_logs, Fixture, CORE_FRAGMENT};
use specweave::spec::{CollisionPolicy, HttpMethod};
use specweave::{BuildOrchestrator, RunMode};

#[test]
fn test_fragments_union_methods_on_shared_path() {
    let fx = sessions_fixture();
    let outcome = BuildOrchestrator::new(fx.config()).run(RunMode::Validate);
    assert_eq!(outcome.exit_code(), 0, "{}", outcome.report);

    let spec = outcome.spec.unwrap();
    let item = &spec.paths["/sessions"];
    let methods: Vec<HttpMethod> = item.operations.keys().copied().collect();
    assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Post]);
    assert_eq!(item.operations[&HttpMethod::Get].source, "core");
    assert_eq!(item.operations[&HttpMethod::Post].source, "sessions-ext");
    assert!(outcome.collisions.is_empty());
}

#[test]
fn test_components_are_namespaced_per_fragment() {
    let fx = sessions_fixture();
    let outcome = BuildOrchestrator::new(fx.config()).run(RunMode::Validate);
    let spec = outcome.spec.unwrap();

    assert!(spec.components.contains_key("core_Session"));
    assert!(spec.components.contains_key("sessions-ext_Session"));
    let create = &spec.paths["/sessions"].operations[&HttpMethod::Post];
    let schema = create.request_body.as_ref().unwrap().schema.as_ref().unwrap();
    assert_eq!(schema["$ref"], "#/components/schemas/sessions-ext_Session");
}

#[test]
fn test_missing_handler_fails_build_when_configured() {
    let fx = Fixture::new();
    fx.fragment("core.yaml", CORE_FRAGMENT)
        .fragment("sessions-ext.yaml", common::SESSIONS_EXT_FRAGMENT)
        .file("api/sessions/list.go", "func ListSessions() {}\n");
    let mut config = fx.config();
    config.fail_on_missing_handlers = true;

    let outcome = BuildOrchestrator::new(config).run(RunMode::Generate);
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.artifacts.is_empty());
    assert!(!fx.out_dir().exists());

    let report = outcome.report.to_string();
    assert!(report.contains("[MissingHandlerError]"), "{report}");
    let lines: Vec<&str> = report
        .lines()
        .map(str::trim)
        .filter(|l| l.contains(" -> "))
        .collect();
    assert_eq!(lines, vec!["POST /sessions -> api/sessions/create.go"]);
}

#[test]
fn test_every_missing_handler_is_reported() {
    let fx = Fixture::new();
    fx.fragment(
        "core.yaml",
        r#"
paths:
  /a:
    get: { operationId: getA, x-handler-file: api/a.go }
  /b:
    get: { operationId: getB, x-handler-file: api/b.go }
  /c:
    get: { operationId: getC, x-handler-file: api/c.go }
"#,
    );
    let mut config = fx.config();
    config.strict_validation = true;

    let outcome = BuildOrchestrator::new(config).run(RunMode::Validate);
    assert_eq!(outcome.exit_code(), 1);
    let report = outcome.report.to_string();
    for line in ["GET /a -> api/a.go", "GET /b -> api/b.go", "GET /c -> api/c.go"] {
        assert!(report.contains(line), "missing '{line}' in {report}");
    }
}

#[test]
fn test_missing_handlers_become_stubs_by_default() {
    let fx = Fixture::new();
    fx.fragment("core.yaml", CORE_FRAGMENT);

    let outcome = BuildOrchestrator::new(fx.config()).run(RunMode::Validate);
    assert_eq!(outcome.exit_code(), 0);
    let list = outcome
        .routes
        .iter()
        .find(|r| r.operation_id == "listSessions")
        .unwrap();
    assert!(list.stub);
    // Operations without a binding are never stubs.
    let get = outcome.routes.iter().find(|r| r.operation_id == "getSession").unwrap();
    assert!(!get.stub);
    assert!(outcome
        .report
        .warnings
        .iter()
        .any(|w| w.contains("GET /sessions -> api/sessions/list.go")));
}

#[test]
fn test_strict_mode_requires_function_in_bound_file() {
    let fx = Fixture::new();
    fx.fragment("core.yaml", CORE_FRAGMENT)
        .file("api/sessions/list.go", "package sessions\n");
    let mut config = fx.config();
    config.strict_validation = true;

    let outcome = BuildOrchestrator::new(config).run(RunMode::Validate);
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome
        .report
        .to_string()
        .contains("GET /sessions -> api/sessions/list.go#ListSessions"));
}

#[test]
fn test_duplicate_operation_id_names_both_operations() {
    let fx = sessions_fixture();
    fx.fragment(
        "rooms.yaml",
        r#"
paths:
  /rooms:
    get:
      operationId: listSessions
"#,
    );

    let outcome = BuildOrchestrator::new(fx.config()).run(RunMode::Generate);
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.artifacts.is_empty());
    let dup = outcome
        .report
        .errors
        .iter()
        .find(|e| e.kind() == "DuplicateOperationIDError")
        .unwrap()
        .to_string();
    assert!(dup.contains("GET /sessions"), "{dup}");
    assert!(dup.contains("GET /rooms"), "{dup}");
}

const OVERRIDE_FRAGMENT: &str = r#"
paths:
  /sessions:
    get:
      operationId: listAllSessions
      summary: Paginated listing
"#;

#[test]
fn test_last_writer_wins_is_logged_with_both_sources() {
    let fx = sessions_fixture();
    fx.fragment("zz-override.yaml", OVERRIDE_FRAGMENT);

    let (outcome, logs) =
        with_captured_logs(|| BuildOrchestrator::new(fx.config()).run(RunMode::Validate));
    assert_eq!(outcome.exit_code(), 0, "{}", outcome.report);

    let spec = outcome.spec.as_ref().unwrap();
    let get = &spec.paths["/sessions"].operations[&HttpMethod::Get];
    assert_eq!(get.operation_id, "listAllSessions");
    assert_eq!(get.source, "zz-override");

    assert_eq!(outcome.collisions.len(), 1);
    assert_eq!(outcome.collisions[0].earlier, "core");
    assert_eq!(outcome.collisions[0].later, "zz-override");

    let line = logs
        .lines()
        .find(|l| l.contains("path/method collision"))
        .unwrap_or_else(|| panic!("no collision log in:\n{logs}"));
    assert!(line.contains("INFO"));
    assert!(line.contains("earlier=core"));
    assert!(line.contains("later=zz-override"));
}

#[test]
fn test_error_policy_makes_collisions_fatal() {
    let fx = sessions_fixture();
    fx.fragment("zz-override.yaml", OVERRIDE_FRAGMENT);
    let mut config = fx.config();
    config.collision_policy = CollisionPolicy::Error;

    let outcome = BuildOrchestrator::new(config).run(RunMode::Generate);
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.artifacts.is_empty());
    let err = outcome
        .report
        .errors
        .iter()
        .find(|e| e.kind() == "PathConflictError")
        .unwrap()
        .to_string();
    assert!(err.contains("GET /sessions"));
    assert!(err.contains("'core'"));
    assert!(err.contains("'zz-override'"));
}

#[test]
fn test_malformed_fragment_does_not_block_others() {
    let fx = sessions_fixture();
    fx.fragment("broken.yaml", "paths:\n  /x: [unterminated\n");
    fx.fragment("no-slash.yaml", "paths:\n  sessions:\n    get: {}\n");

    let outcome = BuildOrchestrator::new(fx.config()).run(RunMode::Validate);
    let parse_errors: Vec<String> = outcome
        .report
        .errors
        .iter()
        .filter(|e| e.kind() == "SchemaParseError")
        .map(|e| e.to_string())
        .collect();
    assert_eq!(parse_errors.len(), 2, "{parse_errors:?}");
    assert!(parse_errors.iter().any(|e| e.contains("broken.yaml")));
    assert!(parse_errors.iter().any(|e| e.contains("no-slash.yaml")));

    // The remaining fragments still merged and validated.
    let spec = outcome.spec.as_ref().unwrap();
    assert_eq!(spec.operation_count(), 3);
    assert_eq!(outcome.exit_code(), 1);
}

#[test]
fn test_generated_names_are_stable_and_collision_free() {
    let fx = sessions_fixture();
    let outcome = BuildOrchestrator::new(fx.config()).run(RunMode::Validate);
    assert_eq!(outcome.exit_code(), 0);

    let names = specweave::generator::GeneratedNames::for_operation("listSessions");
    assert_eq!(names.subcommand, "list-sessions");
    assert_eq!(names.client_method, "listSessions");
    assert_eq!(names.router_stub, "stub_list_sessions");
    assert_eq!(
        specweave::generator::GeneratedNames::for_operation("listSessions"),
        names
    );
    assert!(!outcome
        .report
        .errors
        .iter()
        .any(|e| e.kind() == "GeneratedNameCollisionError"));
}

#[test]
fn test_generated_name_collision_is_fatal() {
    let fx = Fixture::new();
    fx.fragment(
        "core.yaml",
        r#"
paths:
  /sessions:
    get: { operationId: listSessions }
  /sessions-all:
    get: { operationId: list_sessions }
"#,
    );
    let outcome = BuildOrchestrator::new(fx.config()).run(RunMode::Generate);
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.artifacts.is_empty());
    let err = outcome
        .report
        .errors
        .iter()
        .find(|e| e.kind() == "GeneratedNameCollisionError")
        .unwrap()
        .to_string();
    assert!(err.contains("listSessions"));
    assert!(err.contains("list_sessions"));
}

#[test]
fn test_empty_schema_directory_is_a_config_error() {
    let fx = Fixture::new();
    let outcome = BuildOrchestrator::new(fx.config()).run(RunMode::Validate);
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.spec.is_none());
    assert_eq!(outcome.report.errors[0].kind(), "ConfigError");
}

#[test]
fn test_load_order_follows_file_names() {
    let fx = Fixture::new();
    fx.fragment(
        "sessions.yaml",
        "paths:\n  /sessions:\n    get: { operationId: fromPlain }\n",
    )
    .fragment(
        "sessions-v2.yaml",
        "paths:\n  /sessions:\n    get: { operationId: fromV2 }\n",
    );

    let outcome = BuildOrchestrator::new(fx.config()).run(RunMode::Validate);
    assert_eq!(outcome.exit_code(), 0, "{}", outcome.report);
    let spec = outcome.spec.as_ref().unwrap();
    assert_eq!(spec.paths["/sessions"].operations[&HttpMethod::Get].operation_id, "fromPlain");
    assert_eq!(outcome.collisions.len(), 1);
    assert_eq!(outcome.collisions[0].earlier, "sessions-v2");
    assert_eq!(outcome.collisions[0].later, "sessions");
}

#[test]
fn test_path_parameters_sharing_an_identifier_are_fatal() {
    let fx = Fixture::new();
    fx.fragment(
        "core.yaml",
        r#"
paths:
  /things/{thingId}/{thing_id}:
    get: { operationId: getThing }
"#,
    );
    let outcome = BuildOrchestrator::new(fx.config()).run(RunMode::Generate);
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome.artifacts.is_empty());
    assert!(!fx.out_dir().join("cli.rs").exists());

    let messages: Vec<String> = outcome
        .report
        .errors
        .iter()
        .filter(|e| e.kind() == "GeneratedNameCollisionError")
        .map(|e| e.to_string())
        .collect();
    assert_eq!(messages.len(), 2, "{messages:?}");
    assert!(messages[0].contains("cli argument of getThing"));
    assert!(messages[1].contains("client argument of getThing"));
    for m in &messages {
        assert!(m.contains("'thing_id'"), "{m}");
        assert!(m.contains("path parameter 'thingId'") && m.contains("path parameter 'thing_id'"));
    }
}
