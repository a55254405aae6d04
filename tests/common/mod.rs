#![allow(dead_code)]

use specweave::BuildConfig;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A throwaway project: schema fragments, handler files and an output
/// directory under one temp dir.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("schemas")).unwrap();
        Fixture { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn schemas_dir(&self) -> PathBuf {
        self.root().join("schemas")
    }

    pub fn out_dir(&self) -> PathBuf {
        self.root().join("generated")
    }

    /// Write `schemas/<file_name>`.
    pub fn fragment(&self, file_name: &str, content: &str) -> &Self {
        std::fs::write(self.schemas_dir().join(file_name), content).unwrap();
        self
    }

    /// Write a file relative to the fixture root (handler sources,
    /// type declarations, component libraries).
    pub fn file(&self, rel: &str, content: &str) -> &Self {
        let path = self.root().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
        self
    }

    /// Config with every path pointing into the fixture.
    pub fn config(&self) -> BuildConfig {
        let mut config = BuildConfig::default();
        config.paths.schemas = Some(self.schemas_dir());
        config.paths.handler_root = self.root().to_path_buf();
        config.paths.out_dir = self.out_dir();
        config
    }

    pub fn read_output(&self, name: &str) -> String {
        std::fs::read_to_string(self.out_dir().join(name)).unwrap()
    }
}

pub const CORE_FRAGMENT: &str = r#"
info:
  title: Session Service
  version: 1.2.0
paths:
  /sessions:
    get:
      operationId: listSessions
      summary: List sessions
      x-handler-file: api/sessions/list.go
      x-handler-function: ListSessions
      responses:
        "200":
          description: OK
  /sessions/{id}:
    get:
      operationId: getSession
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: string
      responses:
        "200":
          description: OK
components:
  schemas:
    Session:
      type: object
      properties:
        id:
          type: string
"#;

pub const SESSIONS_EXT_FRAGMENT: &str = r##"
paths:
  /sessions:
    post:
      operationId: createSession
      x-handler-file: api/sessions/create.go
      x-handler-function: CreateSession
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: "#/components/schemas/Session"
      responses:
        "201":
          description: Created
components:
  schemas:
    Session:
      type: object
      properties:
        name:
          type: string
"##;

/// Fixture holding the two session fragments with both handlers present.
pub fn sessions_fixture() -> Fixture {
    let fx = Fixture::new();
    fx.fragment("core.yaml", CORE_FRAGMENT)
        .fragment("sessions-ext.yaml", SESSIONS_EXT_FRAGMENT)
        .file("api/sessions/list.go", "func ListSessions() {}\n")
        .file("api/sessions/create.go", "func CreateSession() {}\n");
    fx
}

/// Log sink for `tracing_subscriber::fmt().with_writer(...)`.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with an `info`-level subscriber writing into the returned sink.
pub fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs.contents())
}
