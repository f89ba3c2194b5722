//! E2E CLI tests covering lookup and reporting:
//! - `fxt find` by ticket number, phone, name, and email
//! - key validation before any query runs
//! - `fxt list` status/date filters and pagination

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn fxt_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fxt"));
    cmd.current_dir(dir);
    cmd.env("FIXTRACK_ACTOR", "test-clerk");
    cmd.env("FIXTRACK_LOG", "error");
    cmd
}

fn init_project(dir: &Path) {
    fxt_cmd(dir).args(["init"]).assert().success();
}

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

fn intake_ticket(dir: &Path, customer_id: &str, issue: &str) -> String {
    let output = fxt_cmd(dir)
        .args([
            "intake",
            "--customer",
            customer_id,
            "--device-type",
            "laptop",
            "--brand",
            "Dell",
            "--model",
            "XPS 13",
            "--issue",
            issue,
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

/// Run a `find` invocation and return the parsed hit array.
fn find_json(dir: &Path, args: &[&str]) -> Vec<Value> {
    let mut full = vec!["find"];
    full.extend_from_slice(args);
    full.push("--json");
    let output = fxt_cmd(dir)
        .args(&full)
        .output()
        .expect("find should not crash");
    assert!(
        output.status.success(),
        "find failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    json.as_array().expect("hit array").clone()
}

#[test]
fn finds_by_phone_ignoring_punctuation() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let customer = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let number = intake_ticket(dir.path(), &customer, "no display");

    let hits = find_json(dir.path(), &["--phone", "212.555.0140"]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["ticket_number"], number.as_str());
    assert_eq!(hits[0]["customer"]["name"], "Dana Reyes");
}

#[test]
fn short_phone_is_rejected_before_any_query() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    fxt_cmd(dir.path())
        .args(["find", "--phone", "555-0140"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2006"));
}

#[test]
fn malformed_email_is_rejected_before_any_query() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    fxt_cmd(dir.path())
        .args(["find", "--email", "not-an-email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2006"));
}

#[test]
fn finds_by_name_substring_case_insensitively() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let dana = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let omar = add_customer(dir.path(), "Omar Haddad", "(415) 555-0188", "omar@example.com");
    intake_ticket(dir.path(), &dana, "no display");
    intake_ticket(dir.path(), &omar, "battery drain");

    let hits = find_json(dir.path(), &["--name", "REYES"]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["customer"]["name"], "Dana Reyes");
}

#[test]
fn finds_by_exact_email_only() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let dana = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    intake_ticket(dir.path(), &dana, "no display");

    let hits = find_json(dir.path(), &["--email", "DANA@example.com"]);
    assert_eq!(hits.len(), 1);

    let hits = find_json(dir.path(), &["--email", "dan@example.com"]);
    assert!(hits.is_empty());
}

#[test]
fn unknown_ticket_number_is_an_empty_result_not_an_error() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    let hits = find_json(dir.path(), &["--number", "FT-ZZZZZZ"]);
    assert!(hits.is_empty());
}

#[test]
fn find_requires_exactly_one_key() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    fxt_cmd(dir.path()).args(["find"]).assert().failure();
    fxt_cmd(dir.path())
        .args(["find", "--name", "dana", "--email", "dana@example.com"])
        .assert()
        .failure();
}

#[test]
fn open_tickets_list_before_closed_ones() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let dana = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let first = intake_ticket(dir.path(), &dana, "no display");
    let second = intake_ticket(dir.path(), &dana, "battery drain");

    // Cancel the newer ticket; the older open one should now rank first.
    fxt_cmd(dir.path())
        .args(["status", &second, "cancelled"])
        .assert()
        .success();

    let hits = find_json(dir.path(), &["--name", "dana"]);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["ticket_number"], first.as_str());
    assert_eq!(hits[1]["ticket_number"], second.as_str());
}

#[test]
fn list_filters_by_status() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let dana = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    let first = intake_ticket(dir.path(), &dana, "no display");
    intake_ticket(dir.path(), &dana, "battery drain");

    fxt_cmd(dir.path())
        .args(["status", &first, "diagnosed"])
        .assert()
        .success();

    let output = fxt_cmd(dir.path())
        .args(["list", "--status", "diagnosed", "--json"])
        .output()
        .expect("list should not crash");
    assert!(output.status.success());
    let hits: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let hits = hits.as_array().expect("hit array");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["ticket_number"], first.as_str());
}

#[test]
fn pagination_windows_are_stable_and_disjoint() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let dana = add_customer(dir.path(), "Dana Reyes", "(212) 555-0140", "dana@example.com");
    for i in 0..5 {
        intake_ticket(dir.path(), &dana, &format!("issue {i}"));
    }

    let first_page = find_json(dir.path(), &["--name", "dana", "--limit", "3"]);
    let second_page = find_json(
        dir.path(),
        &["--name", "dana", "--limit", "3", "--offset", "3"],
    );
    assert_eq!(first_page.len(), 3);
    assert_eq!(second_page.len(), 2);

    let mut seen: Vec<&str> = first_page
        .iter()
        .chain(second_page.iter())
        .filter_map(|h| h["ticket_number"].as_str())
        .collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 5, "pages must not overlap or repeat tickets");
}
