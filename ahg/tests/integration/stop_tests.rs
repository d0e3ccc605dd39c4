use crate::common::fixtures::{exit_code, stderr_text};
use crate::common::{init_test_logging, TestProject};

fn repo_with_baseline() -> TestProject {
    let project = TestProject::new();
    project.init_repo();
    project.write_file("app.py", "a = 1\n");
    project.commit_all("baseline");
    project
}

#[test]
fn test_stop_allows_clean_tree() {
    init_test_logging();
    let project = repo_with_baseline();
    let output = project.run_hook("stop", "{}");
    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr_text(&output));
}

#[test]
fn test_stop_blocks_on_forbidden_token_with_line_number() {
    init_test_logging();
    crate::test_log!("TEST START: test_stop_blocks_on_forbidden_token_with_line_number");

    let project = repo_with_baseline();
    let body = "a = 1\n".repeat(11) + "# FIXME wire this up\n";
    project.write_file("app.py", &body);

    let output = project.run_hook("stop", "{}");
    assert_eq!(exit_code(&output), 2);
    let stderr = stderr_text(&output);
    assert!(stderr.contains("forbidden token"), "stderr was: {stderr}");
    assert!(stderr.contains("app.py"));
    assert!(stderr.contains("line(s) 12"));

    crate::test_log!("TEST PASS: test_stop_blocks_on_forbidden_token_with_line_number");
}

#[test]
fn test_stop_ignores_tokens_in_unchanged_files() {
    init_test_logging();
    let project = repo_with_baseline();
    // Marker committed before the session; only a marker-free file changes.
    project.write_file("legacy.py", "# FIXME inherited debt\n");
    project.commit_all("legacy");
    project.write_file("fresh.py", "b = 2\n");

    let output = project.run_hook("stop", "{}");
    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr_text(&output));
}

#[test]
fn test_stop_blocks_on_debug_artifact() {
    init_test_logging();
    let project = repo_with_baseline();
    project.write_file("wip.py", "def f():\n    breakpoint()\n");

    let output = project.run_hook("stop", "{}");
    assert_eq!(exit_code(&output), 2);
    let stderr = stderr_text(&output);
    assert!(stderr.contains("debug artifact"), "stderr was: {stderr}");
    assert!(stderr.contains("line(s) 2"));
}

#[test]
fn test_stop_outside_working_tree_allows() {
    init_test_logging();
    let project = TestProject::new();
    project.write_file("loose.py", "# FIXME not in a repo\n");
    let output = project.run_hook("stop", "{}");
    assert_eq!(exit_code(&output), 0);
}

#[test]
fn test_stop_aggregates_across_files() {
    init_test_logging();
    let project = repo_with_baseline();
    project.write_file("one.py", "# FIXME first\n");
    project.write_file("two.js", "debugger;\n");

    let output = project.run_hook("stop", "{}");
    assert_eq!(exit_code(&output), 2);
    let stderr = stderr_text(&output);
    assert!(stderr.contains("one.py"));
    assert!(stderr.contains("two.js"));
}
