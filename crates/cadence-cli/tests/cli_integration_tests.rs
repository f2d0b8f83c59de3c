//! Black-box tests for the `cadence` binary.
//!
//! Every test pins its dates explicitly so the results do not depend on the
//! day the suite runs.

use predicates::prelude::*;

mod helpers;
use helpers::CliTestHarness;

#[test]
fn test_cli_help_and_version() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("recurring schedule"));
    harness
        .run_success(&["--version"])
        .stdout(predicate::str::contains("cadence"));
    harness
        .run_failure(&["invalid-command"])
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_add_one_off_and_show() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Dentist", "--at", "2025-03-04 15:30", "-d", "45", "-n", "bring card"]);
    assert_eq!(id.len(), 8);
    assert!(harness.db_path().exists());

    let shown = harness.stdout(&["show", &id]);
    assert!(shown.contains("Dentist"));
    assert!(shown.contains("2025-03-04 15:30 UTC"));
    assert!(shown.contains("45 min"));
    assert!(shown.contains("bring card"));
    assert!(!shown.contains("RRULE"));
}

#[test]
fn test_add_time_block_requires_duration() {
    let harness = CliTestHarness::new();
    harness
        .run_failure(&["add", "Focus", "--block", "--at", "2025-03-04 09:00"])
        .stderr(predicate::str::contains("duration"));
    harness
        .run_success(&["add", "Focus", "--block", "--at", "2025-03-04 09:00", "-d", "120"])
        .stdout(predicate::str::contains("Created time block"));
}

#[test]
fn test_recurrence_flags_are_validated() {
    let harness = CliTestHarness::new();
    harness
        .run_failure(&["add", "Orphan", "--interval", "2"])
        .stderr(predicate::str::contains("--every"));
    harness
        .run_failure(&["add", "Both", "--every", "daily", "--count", "3", "--until", "2025-05-01"])
        .stderr(predicate::str::contains("cannot be used with"));
    harness
        .run_failure(&["add", "Zero", "--every", "daily", "--interval", "0"])
        .stderr(predicate::str::contains("Invalid recurrence"));
    harness
        .run_failure(&["add", "Odd days", "--every", "weekly", "--on", "mon,funday"])
        .stderr(predicate::str::contains("funday"));
}

#[test]
fn test_recurring_show_exports_rrule() {
    let harness = CliTestHarness::new();
    let id = harness.add(&[
        "Standup", "--at", "2025-01-06 09:30", "--every", "weekly", "--on", "mon,thu", "--count", "6",
    ]);

    let shown = harness.stdout(&["show", &id]);
    assert!(shown.contains("every week on Mon, Thu, 6 times"));
    assert!(shown.contains("RRULE:FREQ=WEEKLY"));
    assert!(shown.contains("BYDAY=MO,TH"));
    assert!(shown.contains("COUNT=6"));
}

#[test]
fn test_preview_lists_upcoming_occurrences() {
    let harness = CliTestHarness::new();
    let id = harness.add(&[
        "Standup", "--at", "2025-01-06 09:30", "--every", "weekly", "--on", "mon,thu", "--count", "4",
    ]);

    let preview = harness.stdout(&["preview", &id, "--from", "2025-01-07", "-c", "10"]);
    assert!(!preview.contains("2025-01-06"));
    assert!(preview.contains("Thu 2025-01-09"));
    assert!(preview.contains("Mon 2025-01-13"));
    assert!(preview.contains("Thu 2025-01-16"));
    assert!(!preview.contains("2025-01-20"));

    let limited = harness.stdout(&["preview", &id, "--from", "2025-01-06", "-c", "1"]);
    assert!(limited.contains("2025-01-06"));
    assert!(!limited.contains("2025-01-09"));
}

#[test]
fn test_list_expands_series_into_the_week() {
    let harness = CliTestHarness::new();
    harness.add(&["Gym", "--at", "2025-01-06 07:00", "--every", "weekly", "--on", "mon,wed,fri"]);
    harness.add(&["Call mom", "--at", "2025-01-08 18:00"]);

    let week = harness.stdout(&["list", "--view", "week", "--date", "2025-01-08"]);
    assert!(week.contains("week (2025-01-06 to 2025-01-12)"));
    assert!(week.contains("Fri 2025-01-10"));
    assert!(week.contains("Gym"));
    assert!(week.contains("Call mom"));

    let next_week = harness.stdout(&["list", "--view", "week", "--date", "2025-01-08", "--offset", "1"]);
    assert!(next_week.contains("2025-01-13 to 2025-01-19"));
    assert!(next_week.contains("Gym"));
    assert!(!next_week.contains("Call mom"));

    let before = harness.stdout(&["list", "--view", "day", "--date", "2025-01-01"]);
    assert!(before.contains("Nothing scheduled."));
}

#[test]
fn test_overnight_block_spills_into_next_day() {
    let harness = CliTestHarness::new();
    harness.add(&["Night shift", "--block", "--at", "2025-02-03 22:00", "-d", "480"]);

    let next_day = harness.stdout(&["list", "--view", "day", "--date", "2025-02-04"]);
    assert!(next_day.contains("Night shift"));
    assert!(next_day.contains("… 22:00-06:00"));
}

#[test]
fn test_grid_counts_items_per_day() {
    let harness = CliTestHarness::new();
    harness.add(&["Water plants", "--at", "2025-02-01 08:00", "--every", "daily", "--count", "3"]);

    let grid = harness.stdout(&["grid", "--view", "month", "--date", "2025-02-10"]);
    assert!(grid.contains("February 2025"));
    assert!(grid.contains(" 1 (1)"));
    assert!(grid.contains(" 3 (1)"));
    assert!(!grid.contains(" 4 (1)"));
}

#[test]
fn test_edit_future_splits_series() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Standup", "--at", "2025-01-06 09:30", "--every", "weekly", "--on", "mon,thu"]);

    harness
        .run_success(&[
            "edit", &id, "--date", "2025-01-13", "--scope", "future", "--time", "10:00",
        ])
        .stdout(predicate::str::contains("new series"))
        .stdout(predicate::str::contains("from 2025-01-13"));

    let head = harness.stdout(&["preview", &id, "--from", "2025-01-01", "-c", "10"]);
    assert!(head.contains("2025-01-06"));
    assert!(head.contains("2025-01-09"));
    assert!(!head.contains("2025-01-13"));

    let week = harness.stdout(&["list", "--view", "week", "--date", "2025-01-13"]);
    assert!(week.contains("10:00"));
    assert!(!week.contains("09:30"));
}

#[test]
fn test_edit_this_detaches_one_occurrence() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Run", "--at", "2025-04-01 06:00", "--every", "daily", "--count", "5"]);

    harness
        .run_success(&[
            "edit", &id, "--date", "2025-04-03", "--scope", "this", "--title", "Long run",
        ])
        .stdout(predicate::str::contains("one-off entry"));

    let day = harness.stdout(&["list", "--view", "day", "--date", "2025-04-03"]);
    assert!(day.contains("Long run"));
    assert!(!day.contains("↻ Run"));

    let series = harness.stdout(&["preview", &id, "--from", "2025-04-01", "-c", "10"]);
    assert!(!series.contains("2025-04-03"));
    assert!(series.contains("2025-04-05"));
}

#[test]
fn test_edit_one_off_reschedules() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Haircut", "--at", "2025-05-02 11:00"]);

    harness
        .run_success(&["edit", &id, "--at", "2025-05-09 12:15", "--notes", "ask for Sam"])
        .stdout(predicate::str::contains("Updated 'Haircut'"));

    let shown = harness.stdout(&["show", &id]);
    assert!(shown.contains("2025-05-09 12:15"));
    assert!(shown.contains("ask for Sam"));
}

#[test]
fn test_edit_rejects_day_outside_series() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Gym", "--at", "2025-01-06 07:00", "--every", "weekly", "--on", "mon"]);

    harness
        .run_failure(&["edit", &id, "--date", "2025-01-07", "--scope", "this", "--title", "Swim"])
        .stderr(predicate::str::contains("2025-01-07"));
}

#[test]
fn test_delete_scopes() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Pills", "--at", "2025-06-01 08:00", "--every", "daily", "--count", "10"]);

    harness
        .run_success(&["delete", &id, "--date", "2025-06-03", "--scope", "this", "--force"])
        .stdout(predicate::str::contains("Deleted 'Pills'"));
    let after_skip = harness.stdout(&["preview", &id, "--from", "2025-06-01", "-c", "3"]);
    assert!(after_skip.contains("2025-06-02"));
    assert!(!after_skip.contains("2025-06-03"));
    assert!(after_skip.contains("2025-06-04"));

    harness.run_success(&["delete", &id, "--date", "2025-06-05", "--scope", "future", "--force"]);
    let truncated = harness.stdout(&["preview", &id, "--from", "2025-06-01", "-c", "10"]);
    assert!(truncated.contains("2025-06-04"));
    assert!(!truncated.contains("2025-06-05"));

    harness.run_success(&["delete", &id, "--scope", "all", "--force"]);
    harness
        .run_failure(&["show", &id])
        .stderr(predicate::str::contains("No entry found"));
}

#[test]
fn test_delete_one_off() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Temp", "--at", "2025-06-01 08:00"]);
    harness
        .run_success(&["delete", &id, "-f"])
        .stdout(predicate::str::contains("Deleted 'Temp'"));
    harness.run_failure(&["show", &id]);
}

#[test]
fn test_done_and_undone_one_off() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Pay rent", "--at", "2025-03-01 10:00"]);

    harness
        .run_success(&["done", &id])
        .stdout(predicate::str::contains("Completed 'Pay rent'"));
    harness
        .run_success(&["done", &id])
        .stdout(predicate::str::contains("already completed"));
    harness
        .run_success(&["undone", &id])
        .stdout(predicate::str::contains("Reopened 'Pay rent'"));
    harness
        .run_failure(&["done", &id, "--date", "2025-03-01"])
        .stderr(predicate::str::contains("does not repeat"));
}

#[test]
fn test_done_marks_single_instance_and_feeds_stats() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Stretch", "--at", "2025-01-01 07:00", "--every", "daily"]);

    for day in ["2025-01-01", "2025-01-02", "2025-01-04", "2025-01-05"] {
        harness
            .run_success(&["done", &id, "--date", day])
            .stdout(predicate::str::contains(format!("for {}", day)));
    }
    harness
        .run_success(&["done", &id, "--date", "2025-01-05"])
        .stdout(predicate::str::contains("already done"));
    harness
        .run_success(&["undone", &id, "--date", "2025-01-05"])
        .stdout(predicate::str::contains("Reopened"));

    let stats = harness.stdout(&["stats", &id, "--from", "2025-01-01", "--to", "2025-01-04"]);
    assert!(stats.contains("Stretch"));
    assert!(stats.contains("75%"));

    let preview = harness.stdout(&["preview", &id, "--from", "2025-01-01", "-c", "2"]);
    assert!(preview.contains("✓"));
}

#[test]
fn test_done_rejects_non_occurrence() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Gym", "--at", "2025-01-06 07:00", "--every", "weekly", "--on", "mon"]);
    harness
        .run_failure(&["done", &id, "--date", "2025-01-08"])
        .stderr(predicate::str::contains("not an occurrence"));
}

#[test]
fn test_unknown_and_short_ids() {
    let harness = CliTestHarness::new();
    harness.add(&["Something", "--at", "2025-01-01 10:00"]);

    harness
        .run_failure(&["show", "zzzzzzzz"])
        .stderr(predicate::str::contains("No entry found"));
    harness
        .run_failure(&["show", "a"])
        .stderr(predicate::str::contains("at least 2 characters"));
}

#[test]
fn test_stats_on_one_off_fails() {
    let harness = CliTestHarness::new();
    let id = harness.add(&["Once", "--at", "2025-01-01 10:00"]);
    harness.run_failure(&["stats", &id]).stderr(predicate::str::contains("Error"));
}
