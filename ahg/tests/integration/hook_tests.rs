use crate::common::fixtures::{exit_code, stderr_text};
use crate::common::{init_test_logging, TestProject};
use serde_json::json;

fn write_event(path: &str, content: &str) -> String {
    json!({
        "tool_name": "Write",
        "tool_input": { "file_path": path, "content": content }
    })
    .to_string()
}

fn edit_event(path: &str, old: &str, new: &str) -> String {
    json!({
        "tool_name": "Edit",
        "tool_input": { "file_path": path, "old_string": old, "new_string": new }
    })
    .to_string()
}

/// Policy for a synthetic extension with every tool pinned, so outcomes do
/// not depend on what happens to be installed.
fn pinned_config(linter_program: &str, runner_program: &str) -> String {
    format!(
        r#"
        [policy.qx]
        line_limit = 5
        formatter = "qx-fmt"
        linter = "qx-lint"
        test_runner = "qx-run"
        test_patterns = ["test_{{stem}}.qx"]
        family = "other"

        [tools.qx-fmt]
        program = "true"
        [tools.qx-lint]
        program = "{linter_program}"
        [tools.qx-run]
        program = "{runner_program}"
        "#
    )
}

#[test]
fn test_empty_input_allows() {
    init_test_logging();
    crate::test_log!("TEST START: test_empty_input_allows");

    let project = TestProject::new();
    let output = project.run_hook("pre", "");
    assert_eq!(exit_code(&output), 0);
    assert!(output.stdout.is_empty(), "stdout is reserved");

    crate::test_log!("TEST PASS: test_empty_input_allows");
}

#[test]
fn test_malformed_input_allows() {
    init_test_logging();
    let project = TestProject::new();
    let output = project.run_hook("pre", "{ not json at all");
    assert_eq!(exit_code(&output), 0);
}

#[test]
fn test_pre_allows_non_mutation_tool() {
    init_test_logging();
    let project = TestProject::new();
    let payload = json!({
        "tool_name": "Read",
        "tool_input": { "file_path": "whatever.py" }
    })
    .to_string();
    let output = project.run_hook("pre", &payload);
    assert_eq!(exit_code(&output), 0);
}

#[test]
fn test_pre_blocks_oversized_write() {
    init_test_logging();
    let project = TestProject::new();
    project.write_config("[limits]\nqx = 5\n");

    let output = project.run_hook("pre", &write_event("a.qx", "1\n2\n3\n4\n5\n6\n"));
    assert_eq!(exit_code(&output), 2);
    let stderr = stderr_text(&output);
    assert!(stderr.contains("size limit"), "stderr was: {stderr}");
    assert!(stderr.contains("a.qx"));
}

#[test]
fn test_pre_allows_write_at_limit() {
    init_test_logging();
    let project = TestProject::new();
    project.write_config("[limits]\nqx = 5\n");

    let output = project.run_hook("pre", &write_event("a.qx", "1\n2\n3\n4\n5\n"));
    assert_eq!(exit_code(&output), 0);
}

#[test]
fn test_pre_shrink_exemption_end_to_end() {
    init_test_logging();
    let project = TestProject::new();
    project.write_config("[limits]\nqx = 5\n");
    let body: String = (0..10).map(|i| format!("l{i}\n")).collect();
    project.write_file("big.qx", &body);

    // Replacing four lines with one leaves the file at 7 lines: still over
    // the limit of 5, but strictly below the current 10.
    let output = project.run_hook("pre", &edit_event("big.qx", "l2\nl3\nl4\nl5\n", "z\n"));
    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr_text(&output));

    // Growing the same oversized file still blocks.
    let grown: String = (0..4).map(|i| format!("g{i}\n")).collect();
    let output = project.run_hook("pre", &edit_event("big.qx", "l2\n", &grown));
    assert_eq!(exit_code(&output), 2);
}

#[test]
fn test_pre_allows_unmapped_extension() {
    init_test_logging();
    let project = TestProject::new();
    let long: String = (0..5000).map(|i| format!("row {i}\n")).collect();
    let output = project.run_hook("pre", &write_event("dump.dat", &long));
    assert_eq!(exit_code(&output), 0);
}

#[test]
fn test_post_skip_listed_file_never_reaches_tools() {
    init_test_logging();
    let project = TestProject::new();
    // The pinned linter would fail on any invocation; a skip-listed path
    // must exit clean, proving no tool ran.
    project.write_config(&pinned_config("false", "false"));
    project.write_file("vendor/lib.qx", "anything\n");

    let payload = json!({
        "tool_name": "Write",
        "tool_input": { "file_path": "vendor/lib.qx", "content": "anything\n" }
    })
    .to_string();
    let output = project.run_hook("post", &payload);
    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr_text(&output));
}

#[test]
fn test_post_lint_failure_blocks() {
    init_test_logging();
    let project = TestProject::new();
    project.write_config(&pinned_config("false", "true"));
    project.write_file("mod.qx", "body\n");
    project.write_file("tests/test_mod.qx", "check\n");

    let payload = json!({
        "tool_name": "Write",
        "tool_input": { "file_path": "mod.qx", "content": "body\n" }
    })
    .to_string();
    let output = project.run_hook("post", &payload);
    assert_eq!(exit_code(&output), 2);
    assert!(stderr_text(&output).contains("lint failed"));
}

#[test]
fn test_post_test_gating_end_to_end() {
    init_test_logging();
    crate::test_log!("TEST START: test_post_test_gating_end_to_end");

    let project = TestProject::new();
    project.write_config(&pinned_config("true", "true"));
    project.write_file("mod.qx", "body\n");

    let payload = json!({
        "tool_name": "Write",
        "tool_input": { "file_path": "mod.qx", "content": "body\n" }
    })
    .to_string();

    // No test file yet: the mutation does not survive.
    let output = project.run_hook("post", &payload);
    assert_eq!(exit_code(&output), 2);
    let stderr = stderr_text(&output);
    assert!(stderr.contains("test missing"), "stderr was: {stderr}");
    assert!(stderr.contains("tests/test_mod.qx"));

    // Adding the correctly named test file clears the gate.
    project.write_file("tests/test_mod.qx", "check\n");
    let output = project.run_hook("post", &payload);
    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr_text(&output));

    crate::test_log!("TEST PASS: test_post_test_gating_end_to_end");
}

#[test]
fn test_post_failing_test_blocks() {
    init_test_logging();
    let project = TestProject::new();
    project.write_config(&pinned_config("true", "false"));
    project.write_file("mod.qx", "body\n");
    project.write_file("tests/test_mod.qx", "check\n");

    let payload = json!({
        "tool_name": "Write",
        "tool_input": { "file_path": "mod.qx", "content": "body\n" }
    })
    .to_string();
    let output = project.run_hook("post", &payload);
    assert_eq!(exit_code(&output), 2);
    assert!(stderr_text(&output).contains("test failed"));
}

#[test]
fn test_post_is_idempotent() {
    init_test_logging();
    let project = TestProject::new();
    project.write_config(&pinned_config("true", "true"));
    project.write_file("mod.qx", "body\n");
    project.write_file("tests/test_mod.qx", "check\n");

    let payload = json!({
        "tool_name": "Write",
        "tool_input": { "file_path": "mod.qx", "content": "body\n" }
    })
    .to_string();

    assert_eq!(exit_code(&project.run_hook("post", &payload)), 0);
    let before = project.read_file("mod.qx");
    assert_eq!(exit_code(&project.run_hook("post", &payload)), 0);
    assert_eq!(project.read_file("mod.qx"), before);
}

#[test]
fn test_notify_always_allows() {
    init_test_logging();
    let project = TestProject::new();
    let payload = json!({ "notification_type": "idle" }).to_string();
    let output = project.run_hook("notify", &payload);
    assert_eq!(exit_code(&output), 0);
}

#[test]
fn test_notify_falls_back_across_announcers() {
    init_test_logging();
    let project = TestProject::new();
    let sink = project.path().join("sink.txt");
    project.write_config(&format!(
        r#"
        [[notify.announcers]]
        kind = "command"
        program = "ahg-no-such-announcer"

        [[notify.announcers]]
        kind = "command"
        program = "sh"
        args = ["-c", "printf %s \"$1\" > {}", "_", "{{message}}"]
        "#,
        sink.display()
    ));

    let payload = json!({ "notification_type": "permission_request" }).to_string();
    let output = project.run_hook("notify", &payload);
    assert_eq!(exit_code(&output), 0);
    assert!(project.read_file("sink.txt").contains("agent needs permission"));
}

#[test]
fn test_session_start_allows() {
    init_test_logging();
    let project = TestProject::new();
    let output = project.run_hook("start", "{}");
    assert_eq!(exit_code(&output), 0);
}

#[test]
fn test_disabled_config_allows_everything() {
    init_test_logging();
    let project = TestProject::new();
    project.write_config("[general]\nenabled = false\n\n[limits]\nqx = 1\n");
    let output = project.run_hook("pre", &write_event("a.qx", "1\n2\n3\n"));
    assert_eq!(exit_code(&output), 0);
}
