//! Specs for `spindle events query` and `spindle events since`.

use crate::prelude::*;

const SPEC: &str = "id: \"PRD-001\"\ntitle: \"Test Spec\"\nstatus: \"draft\"\nversion: 1\n";
const TASK: &str = "id: TASK-001\ntitle: Build\nstatus: in_progress\n";

fn seeded_project() -> Project {
    let project = Project::empty();
    project.file("specs/PRD-001.yaml", SPEC);
    project.file("tasks/TASK-001.yaml", TASK);
    project.reconcile();
    project
}

#[test]
fn query_prints_one_line_per_event() {
    let project = seeded_project();

    let out = project.spindle().args(&["events", "query"]).passes();
    let stdout = out.stdout();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "spec_revised + task_created + task_started");

    assert!(lines[0].contains("spec_revised"));
    assert!(lines[0].contains("spec/PRD-001"));
    assert!(lines[0].contains("gurgeh"));
    assert!(lines[1].contains("task_created"));
    assert!(lines[1].contains("task/TASK-001"));
    assert!(lines[1].contains("coldwine"));
    assert!(lines[2].contains("task_started"));
}

#[test]
fn query_line_fields_are_double_space_separated() {
    let project = seeded_project();

    let out = project
        .spindle()
        .args(&["events", "query", "--type", "spec_revised"])
        .passes();
    let stdout = out.stdout();
    let line = stdout.lines().next().unwrap();
    let fields: Vec<_> = line.split("  ").collect();
    assert_eq!(fields.len(), 4, "TS  type  entity/id  source: {line}");
    assert!(fields[0].ends_with('Z'), "timestamp is RFC 3339 UTC");
    assert_eq!(fields[1], "spec_revised");
    assert_eq!(fields[2], "spec/PRD-001");
    assert_eq!(fields[3], "gurgeh");
}

#[test]
fn query_filters_compose() {
    let project = seeded_project();

    project
        .spindle()
        .args(&["events", "query", "--source", "gurgeh"])
        .passes()
        .stdout_has("spec_revised")
        .stdout_lacks("task_created");

    project
        .spindle()
        .args(&["events", "query", "--entity", "task", "--type", "task_started"])
        .passes()
        .stdout_has("task_started")
        .stdout_lacks("task_created");
}

#[test]
fn query_limit_truncates() {
    let project = seeded_project();

    let out = project
        .spindle()
        .args(&["events", "query", "--limit", "1"])
        .passes();
    assert_eq!(out.stdout().lines().count(), 1);
}

#[test]
fn since_splits_history_by_timestamp() {
    let project = seeded_project();

    let all = project
        .spindle()
        .args(&["events", "since", "2000-01-01T00:00:00Z"])
        .passes();
    assert_eq!(all.stdout().lines().count(), 3);

    let none = project
        .spindle()
        .args(&["events", "since", "2200-01-01T00:00:00Z"])
        .passes();
    assert_eq!(none.stdout(), "");
}

#[test]
fn empty_database_queries_cleanly() {
    let project = Project::empty();
    project
        .spindle()
        .args(&["events", "query"])
        .passes()
        .stdout_eq("");
}

#[test]
fn unknown_event_type_is_an_error() {
    let project = Project::empty();
    project
        .spindle()
        .args(&["events", "query", "--type", "task_exploded"])
        .fails()
        .stderr_has("task_exploded");
}

#[test]
fn malformed_timestamp_is_an_error() {
    let project = Project::empty();
    project
        .spindle()
        .args(&["events", "since", "yesterday"])
        .fails()
        .stderr_has("yesterday");
}

#[test]
fn project_scope_filters_query() {
    let project = seeded_project();

    // Events were emitted scoped to the project root
    let scoped = project
        .spindle()
        .args(&[
            "events",
            "query",
            "--project",
            &project.path().to_string_lossy(),
        ])
        .passes();
    assert_eq!(scoped.stdout().lines().count(), 3);

    let other = project
        .spindle()
        .args(&["events", "query", "--project", "/no/such/project"])
        .passes();
    assert_eq!(other.stdout(), "");
}
