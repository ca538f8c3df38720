//! Specs for `spindle reconcile`: first observation, idempotence, version
//! bumps, and the conflict rules.

use crate::prelude::*;

const SPEC_V1: &str = "id: \"PRD-001\"\ntitle: \"Test Spec\"\nstatus: \"draft\"\nversion: 1\n";
const SPEC_V2: &str = "id: \"PRD-001\"\ntitle: \"Test Spec\"\nstatus: \"draft\"\nversion: 2\n";

fn query_lines(project: &Project) -> Vec<String> {
    project
        .spindle()
        .args(&["events", "query"])
        .passes()
        .stdout()
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn first_spec_observation_prints_full_summary() {
    let project = Project::empty();
    project.file("specs/PRD-001.yaml", SPEC_V1);

    project
        .reconcile()
        .stdout_eq("Specs: 1 seen, 1 events\nTasks: 0 seen, 0 events\nConflicts: 0\n");

    let lines = query_lines(&project);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("spec_revised"));
    assert!(lines[0].contains("spec/PRD-001"));
    assert!(lines[0].contains("gurgeh"));
}

#[test]
fn second_pass_is_idempotent() {
    let project = Project::empty();
    project.file("specs/PRD-001.yaml", SPEC_V1);

    project.reconcile();
    project
        .reconcile()
        .stdout_eq("Specs: 1 seen, 0 events\nTasks: 0 seen, 0 events\nConflicts: 0\n");
    assert_eq!(query_lines(&project).len(), 1);
}

#[test]
fn version_bump_emits_a_second_revision() {
    let project = Project::empty();
    project.file("specs/PRD-001.yaml", SPEC_V1);
    project.reconcile();

    project.file("specs/PRD-001.yaml", SPEC_V2);
    project
        .reconcile()
        .stdout_has("Specs: 1 seen, 1 events");
    assert_eq!(query_lines(&project).len(), 2);
}

#[test]
fn version_regression_is_recorded_not_emitted() {
    let project = Project::empty();
    project.file("specs/PRD-001.yaml", SPEC_V1);
    project.reconcile();
    project.file("specs/PRD-001.yaml", SPEC_V2);
    project.reconcile();

    project.file("specs/PRD-001.yaml", SPEC_V1);
    project
        .reconcile()
        .stdout_eq("Specs: 1 seen, 0 events\nTasks: 0 seen, 0 events\nConflicts: 1\n");

    // The regressed file produced no new event
    assert_eq!(query_lines(&project).len(), 2);
}

#[test]
fn task_lifecycle_emits_creation_then_transitions() {
    let project = Project::empty();
    project.file("tasks/TASK-001.yaml", "id: TASK-001\ntitle: Build\nstatus: pending\n");
    project
        .reconcile()
        .stdout_eq("Specs: 0 seen, 0 events\nTasks: 1 seen, 1 events\nConflicts: 0\n");

    project.file(
        "tasks/TASK-001.yaml",
        "id: TASK-001\ntitle: Build\nstatus: in_progress\n",
    );
    project.reconcile().stdout_has("Tasks: 1 seen, 1 events");

    project.file("tasks/TASK-001.yaml", "id: TASK-001\ntitle: Build\nstatus: done\n");
    project.reconcile().stdout_has("Tasks: 1 seen, 1 events");

    let lines = query_lines(&project);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("task_created"));
    assert!(lines[1].contains("task_started"));
    assert!(lines[2].contains("task_completed"));
    assert!(lines.iter().all(|l| l.contains("coldwine")));
}

#[test]
fn task_status_regression_is_a_conflict() {
    let project = Project::empty();
    project.file("tasks/TASK-001.yaml", "id: TASK-001\ntitle: Build\nstatus: done\n");
    project.reconcile();

    project.file(
        "tasks/TASK-001.yaml",
        "id: TASK-001\ntitle: Build\nstatus: in_progress\n",
    );
    project
        .reconcile()
        .stdout_eq("Specs: 0 seen, 0 events\nTasks: 1 seen, 0 events\nConflicts: 1\n");
}

#[test]
fn summary_prints_even_when_a_file_is_broken() {
    let project = Project::empty();
    project.file("specs/BAD.yaml", ": : definitely not yaml [ {\n");
    project.file("specs/PRD-001.yaml", SPEC_V1);

    project
        .reconcile()
        .stdout_eq("Specs: 1 seen, 1 events\nTasks: 0 seen, 0 events\nConflicts: 0\n");
}

#[test]
fn reconcile_defaults_to_the_current_directory() {
    let project = Project::empty();
    project.file("specs/PRD-001.yaml", SPEC_V1);

    // No positional path, no --project: the cwd is the project root
    project
        .spindle()
        .args(&["reconcile"])
        .passes()
        .stdout_has("Specs: 1 seen, 1 events");
}

#[test]
fn missing_database_directory_is_created() {
    let project = Project::empty();
    project.file("specs/PRD-001.yaml", SPEC_V1);

    let nested_db = project.db_path().parent().unwrap().join("deep/nested/events.db");
    cli()
        .pwd(project.path())
        .args(&["--events-db", &nested_db.to_string_lossy()])
        .args(&["reconcile", &project.path().to_string_lossy()])
        .passes()
        .stdout_has("Specs: 1 seen, 1 events");
    assert!(nested_db.exists());
}
