//! E2E CLI tests covering the ticket lifecycle:
//! - `fxt init` project scaffolding
//! - intake, cost edits and the price history, status walk, cancellation
//! - `fxt log` and `fxt complete`
//!
//! Each test runs the `fxt` binary as a subprocess in an isolated temp
//! directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the fxt binary, rooted in `dir`.
fn fxt_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fxt"));
    cmd.current_dir(dir);
    cmd.env("FIXTRACK_ACTOR", "test-clerk");
    cmd.env("FIXTRACK_LOG", "error");
    cmd
}

/// Initialize a fixtrack project in `dir`.
fn init_project(dir: &Path) {
    fxt_cmd(dir).args(["init"]).assert().success();
}

/// Register a customer, return the `cu-` ID.
fn add_customer(dir: &Path, name: &str, phone: &str, email: &str) -> String {
    let output = fxt_cmd(dir)
        .args([
            "customer", "add", "--name", name, "--phone", phone, "--email", email, "--json",
        ])
        .output()
        .expect("customer add should not crash");
    assert!(
        output.status.success(),
        "customer add failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    json["customer_id"].as_str().expect("customer_id").to_string()
}

/// Open a ticket for `customer_id`, return the ticket number.
fn intake_ticket(dir: &Path, customer_id: &str) -> String {
    let output = fxt_cmd(dir)
        .args([
            "intake",
            "--customer",
            customer_id,
            "--device-type",
            "laptop",
            "--brand",
            "Lenovo",
            "--model",
            "T14",
            "--issue",
            "no display",
            "--json",
        ])
        .output()
        .expect("intake should not crash");
    assert!(
        output.status.success(),
        "intake failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    json["ticket_number"].as_str().expect("ticket_number").to_string()
}

/// Run `fxt show <number> --json` and return parsed JSON.
fn show_json(dir: &Path, number: &str) -> Value {
    let output = fxt_cmd(dir)
        .args(["show", number, "--json"])
        .output()
        .expect("show should not crash");
    assert!(
        output.status.success(),
        "show failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("show --json should produce valid JSON")
}

/// Walk a ticket through the given statuses, asserting each step succeeds.
fn walk(dir: &Path, number: &str, statuses: &[&str]) {
    for status in statuses {
        fxt_cmd(dir)
            .args(["status", number, status])
            .assert()
            .success();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn init_creates_store_and_config() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    assert!(dir.path().join(".fixtrack/tickets.db").exists());
    assert!(dir.path().join(".fixtrack/config.toml").exists());

    // A second plain init refuses; --force goes through.
    fxt_cmd(dir.path()).args(["init"]).assert().failure();
    fxt_cmd(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn commands_fail_politely_without_a_project() {
    let dir = TempDir::new().expect("tempdir");
    fxt_cmd(dir.path())
        .args(["show", "FT-ABCDEF"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fxt init"));
}

#[test]
fn intake_starts_received_with_no_price_history() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let customer = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let number = intake_ticket(dir.path(), &customer);

    assert!(number.starts_with("FT-"), "unexpected number: {number}");
    let ticket = show_json(dir.path(), &number);
    assert_eq!(ticket["status"], "received");
    assert_eq!(ticket["version"], 0);
    assert_eq!(ticket["costs"]["total_cost"], 0);
    assert_eq!(ticket["price_history"].as_array().map(Vec::len), Some(0));
}

#[test]
fn intake_rejects_negative_costs() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let customer = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");

    fxt_cmd(dir.path())
        .args([
            "intake",
            "--customer",
            &customer,
            "--device-type",
            "phone",
            "--brand",
            "Apple",
            "--model",
            "iPhone 13",
            "--issue",
            "cracked screen",
            "--repair",
            "-5",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn cost_edits_append_history_and_resaves_do_not() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let customer = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let number = intake_ticket(dir.path(), &customer);

    fxt_cmd(dir.path())
        .args(["cost", &number, "--repair", "700"])
        .assert()
        .success();
    fxt_cmd(dir.path())
        .args(["cost", &number, "--repair", "800"])
        .assert()
        .success();

    let ticket = show_json(dir.path(), &number);
    assert_eq!(ticket["costs"]["total_cost"], 80_000);
    let history = ticket["price_history"].as_array().expect("history array");
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["total_cost"], 80_000);
    assert_eq!(history[1]["updated_by"], "test-clerk");

    // Saving the same amount again records nothing.
    fxt_cmd(dir.path())
        .args(["cost", &number, "--repair", "800"])
        .assert()
        .success();
    let ticket = show_json(dir.path(), &number);
    assert_eq!(ticket["price_history"].as_array().map(Vec::len), Some(2));
}

#[test]
fn actor_flag_overrides_environment() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let customer = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let number = intake_ticket(dir.path(), &customer);

    fxt_cmd(dir.path())
        .args(["cost", &number, "--repair", "50", "--actor", "bench-2"])
        .assert()
        .success();

    let ticket = show_json(dir.path(), &number);
    assert_eq!(ticket["price_history"][0]["updated_by"], "bench-2");
}

#[test]
fn status_walk_enforces_the_forward_path() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let customer = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let number = intake_ticket(dir.path(), &customer);

    // Skipping diagnosis is rejected.
    fxt_cmd(dir.path())
        .args(["status", &number, "in_repair"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2003"));

    walk(dir.path(), &number, &["diagnosed", "in_repair", "ready_for_pickup"]);
    let ticket = show_json(dir.path(), &number);
    assert_eq!(ticket["status"], "ready_for_pickup");
}

#[test]
fn same_status_transition_is_a_quiet_no_op() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let customer = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let number = intake_ticket(dir.path(), &customer);

    walk(dir.path(), &number, &["diagnosed"]);
    let before = show_json(dir.path(), &number);
    fxt_cmd(dir.path())
        .args(["status", &number, "diagnosed"])
        .assert()
        .success();
    let after = show_json(dir.path(), &number);
    assert_eq!(before["version"], after["version"]);
}

#[test]
fn edit_records_diagnosis_and_keeps_other_fields() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let customer = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let number = intake_ticket(dir.path(), &customer);

    fxt_cmd(dir.path())
        .args([
            "edit",
            &number,
            "--diagnosis",
            "failed inverter board",
            "--technician",
            "ana",
        ])
        .assert()
        .success();

    let ticket = show_json(dir.path(), &number);
    assert_eq!(ticket["diagnosis"], "failed inverter board");
    assert_eq!(ticket["technician"], "ana");
    assert_eq!(ticket["issue_description"], "no display");
    assert_eq!(ticket["version"], 1);
}

#[test]
fn cancelled_tickets_are_frozen() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let customer = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let number = intake_ticket(dir.path(), &customer);

    walk(dir.path(), &number, &["diagnosed", "cancelled"]);

    fxt_cmd(dir.path())
        .args(["cost", &number, "--repair", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2002"));
    fxt_cmd(dir.path())
        .args(["status", &number, "in_repair"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2002"));
    fxt_cmd(dir.path())
        .args(["edit", &number, "--notes", "late note"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2002"));

    // The communication log still works on a closed ticket.
    fxt_cmd(dir.path())
        .args(["log", &number, "-m", "Cancelled at customer request"])
        .assert()
        .success();
}

#[test]
fn log_rejects_blank_messages_and_keeps_order() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let customer = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let number = intake_ticket(dir.path(), &customer);

    fxt_cmd(dir.path())
        .args(["log", &number, "-m", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2005"));

    fxt_cmd(dir.path())
        .args(["log", &number, "-m", "Diagnosing now", "--whatsapp"])
        .assert()
        .success();
    fxt_cmd(dir.path())
        .args(["log", &number, "-m", "Parts ordered", "--email"])
        .assert()
        .success();

    let ticket = show_json(dir.path(), &number);
    let updates = ticket["updates"].as_array().expect("updates array");
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0]["message"], "Diagnosing now");
    assert_eq!(updates[1]["message"], "Parts ordered");
}

#[test]
fn complete_requires_ready_for_pickup() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let customer = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let number = intake_ticket(dir.path(), &customer);

    fxt_cmd(dir.path())
        .args(["complete", &number])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2003"));
}

#[test]
fn complete_delivers_snapshots_and_logs_the_pickup_message() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let customer = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let number = intake_ticket(dir.path(), &customer);

    fxt_cmd(dir.path())
        .args(["cost", &number, "--repair", "120", "--parts", "80"])
        .assert()
        .success();
    walk(dir.path(), &number, &["diagnosed", "in_repair", "ready_for_pickup"]);

    let output = fxt_cmd(dir.path())
        .args(["complete", &number, "--whatsapp", "--json"])
        .output()
        .expect("complete should not crash");
    assert!(
        output.status.success(),
        "complete failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["ticket"]["status"], "delivered");
    assert_eq!(json["delivery"]["outcome"], "sent");

    let ticket = show_json(dir.path(), &number);
    assert_eq!(ticket["status"], "delivered");
    let updates = ticket["updates"].as_array().expect("updates array");
    assert!(
        updates
            .iter()
            .any(|u| u["message"].as_str().is_some_and(|m| m.contains("pickup"))),
        "pickup message should be logged"
    );

    // Delivered tickets take no further lifecycle changes.
    fxt_cmd(dir.path())
        .args(["status", &number, "received"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2002"));
}
