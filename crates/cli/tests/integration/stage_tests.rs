use std::fs;

use predicates::prelude::*;

use super::common::{TestEnv, go_file};

// =============================================================================
// Legacy standard
// =============================================================================

#[test]
fn standard_app_merges_dependencies() {
  let env = TestEnv::new();
  let app = env.go_package("example.com/app", "app", &["example.com/dep", "appengine", "net/http"]);
  env.go_package("example.com/dep", "dep", &["example.com/dep/internal"]);
  env.go_package("example.com/dep/internal", "internal", &[]);
  env.write_file("gopath/src/example.com/app/static/index.html", "<html></html>");

  env
    .stage_cmd("standard.yaml", &app)
    .assert()
    .success()
    .stderr(predicate::str::contains("staging for go1.9"))
    .stdout(predicate::str::contains("Staged"))
    .stdout(predicate::str::contains("legacy-standard"));

  let staged = env.staged_dir();
  assert!(staged.join("app.go").is_file());
  assert!(staged.join("static/index.html").is_file());
  assert!(staged.join("example.com/dep/dep.go").is_file());
  assert!(staged.join("example.com/dep/internal/internal.go").is_file());
  assert!(!staged.join("appengine").exists());
}

#[test]
fn version_control_metadata_is_not_staged() {
  let env = TestEnv::new();
  let app = env.go_package("example.com/app", "main", &[]);
  env.write_file("gopath/src/example.com/app/.git/HEAD", "ref: refs/heads/main\n");
  env.write_file("gopath/src/example.com/app/.travis.yml", "language: go\n");

  env
    .stage_cmd("standard.yaml", &app)
    .assert()
    .success()
    .stderr(predicate::str::contains("skipping"));

  let staged = env.staged_dir();
  assert!(staged.join("main.go").is_file());
  assert!(!staged.join(".git").exists());
  assert!(!staged.join(".travis.yml").exists());
}

#[test]
fn missing_dependency_fails() {
  let env = TestEnv::new();
  let app = env.go_package("example.com/app", "main", &["example.com/missing"]);

  env
    .stage_cmd("standard.yaml", &app)
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot find package \"example.com/missing\""));
}

// =============================================================================
// Flexible
// =============================================================================

#[test]
fn flex_app_vendors_dependencies() {
  let env = TestEnv::new();
  let app = env.go_package("example.com/app", "main", &["example.com/dep", "appengine"]);
  env.go_package("example.com/dep", "dep", &[]);
  env.go_package("appengine", "appengine", &[]);

  env
    .stage_cmd("flex.yaml", &app)
    .assert()
    .success()
    .stderr(predicate::str::contains("staging for go1.10"));

  let staged = env.staged_dir();
  assert!(staged.join("main.go").is_file());
  assert!(staged.join("_gopath/src/example.com/dep/dep.go").is_file());
  assert!(staged.join("_gopath/src/appengine/appengine.go").is_file());
  assert_eq!(
    fs::read_to_string(staged.join("_gopath/main-package-path")).unwrap(),
    "example.com/app"
  );
}

#[test]
fn flex_app_outside_workspace_has_no_side_file() {
  let env = TestEnv::new();
  env.go_package("example.com/dep", "dep", &[]);
  let main = env.write_file("elsewhere/app/main.go", &go_file("main", &["example.com/dep"]));
  let app = main.parent().unwrap();

  env.stage_cmd("flex.yaml", app).assert().success();

  let staged = env.staged_dir();
  assert!(staged.join("_gopath/src/example.com/dep/dep.go").is_file());
  assert!(!staged.join("_gopath/main-package-path").exists());
}

#[test]
fn flex_library_is_rejected() {
  let env = TestEnv::new();
  let app = env.go_package("example.com/lib", "lib", &[]);

  env
    .stage_cmd("flex.yaml", &app)
    .assert()
    .failure()
    .stderr(predicate::str::contains("needs to be package \"main\""));
}

#[test]
fn unpinned_flex_honors_version_override() {
  let env = TestEnv::new();
  let app = env.go_package("example.com/app", "main", &[]);

  env
    .stage_cmd("flex_unpinned.yaml", &app)
    .args(["--go-version", "1.11"])
    .assert()
    .success()
    .stderr(predicate::str::contains("staging for go1.11"));
}

#[test]
fn unreachable_runtime_catalog_suggests_bug_report() {
  let env = TestEnv::new();
  let app = env.go_package("example.com/app", "main", &[]);

  env
    .stage_cmd("flex_unpinned.yaml", &app)
    .args(["--flex-runtimes-url", "http://127.0.0.1:9/runtimes.yaml"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to download runtimes.yaml"))
    .stderr(predicate::str::contains("please file a report"));

  assert!(!env.staged_dir().exists());
}

// =============================================================================
// Standard second generation
// =============================================================================

#[test]
fn second_gen_module_is_copied_whole() {
  let env = TestEnv::new();
  env.write_file("svc/go.mod", "module example.com/svc\n");
  env.write_file("svc/internal/util/util.go", &go_file("util", &[]));
  let main = env.write_file(
    "svc/cmd/web/main.go",
    &go_file("main", &["example.com/svc/internal/util", "github.com/not/fetched"]),
  );

  env
    .stage_cmd("second_gen.yaml", main.parent().unwrap())
    .assert()
    .success()
    .stderr(predicate::str::contains("staging for go1.11"))
    .stderr(predicate::str::contains("building with dependencies from go.mod"));

  let staged = env.staged_dir();
  assert_eq!(fs::read_to_string(staged.join("_main-package-path")).unwrap(), "cmd/web");
  assert!(staged.join("go.mod").is_file());
  assert!(staged.join("internal/util/util.go").is_file());
  assert!(staged.join("cmd/web/main.go").is_file());
}

#[test]
fn second_gen_without_module_uses_workspace() {
  let env = TestEnv::new();
  let app = env.go_package("example.com/app", "main", &["example.com/dep"]);
  env.go_package("example.com/dep", "dep", &[]);

  env.stage_cmd("second_gen.yaml", &app).assert().success();

  let staged = env.staged_dir();
  assert!(staged.join("_gopath/src/example.com/dep/dep.go").is_file());
  assert!(!staged.join("_main-package-path").exists());
}

#[test]
fn second_gen_module_in_workspace_needs_modules_on() {
  let env = TestEnv::new();
  let app = env.go_package("example.com/app", "main", &["example.com/dep"]);
  env.write_file("gopath/src/example.com/app/go.mod", "module example.com/app\n");
  env.go_package("example.com/dep", "dep", &[]);

  env
    .stage_cmd("second_gen.yaml", &app)
    .env("GO111MODULE", "on")
    .assert()
    .success();

  let staged = env.staged_dir();
  assert_eq!(fs::read_to_string(staged.join("_main-package-path")).unwrap(), ".");
  assert!(!staged.join("_gopath").exists());
}

// =============================================================================
// Output and errors
// =============================================================================

#[test]
fn json_output_is_valid() {
  let env = TestEnv::new();
  let app = env.go_package("example.com/app", "main", &["example.com/dep"]);
  env.go_package("example.com/dep", "dep", &[]);

  let output = env
    .stage_cmd("flex.yaml", &app)
    .args(["-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["strategy"], "flex");
  assert_eq!(report["packages"], serde_json::json!(["example.com/dep"]));
  assert_eq!(report["files_copied"], 2);
}

#[test]
fn unrecognized_runtime_fixture_fails() {
  let env = TestEnv::new();
  let app = env.go_package("example.com/app", "main", &[]);

  env
    .stage_cmd("unknown_runtime.yaml", &app)
    .assert()
    .failure()
    .stderr(predicate::str::contains("unrecognized runtime"));

  assert!(!env.staged_dir().exists());
}

#[test]
fn staged_dir_inside_app_is_rejected() {
  let env = TestEnv::new();
  let app = env.go_package("example.com/app", "main", &[]);

  env
    .stager_cmd()
    .arg(super::common::fixture_path("standard.yaml"))
    .arg(&app)
    .arg(app.join("staged"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("is inside"));

  assert!(!app.join("staged").exists());
}
