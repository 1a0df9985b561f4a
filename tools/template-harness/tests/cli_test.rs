//! Command-line behaviour of the `template-harness` binary

use std::fs;
use std::path::Path;
use std::process::Command;
use templanator::samples;
use tempfile::TempDir;

fn harness(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_template-harness"));
    command.current_dir(dir);
    command
}

fn setup() -> TempDir {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("templates")).unwrap();
    fs::write(
        root.path().join("templates/cisco_ios_show_ip_interface_brief.textfsm"),
        samples::TEXTFSM_IP_INTERFACE_BRIEF,
    )
    .unwrap();
    fs::write(
        root.path().join("templates/cisco_ios_show_clock.textfsm"),
        "Value Time (\\S+)\n\nStart\n  ^${Time} -> Record\n",
    )
    .unwrap();

    let fixture_dir = root.path().join("tests/cisco_ios/show_ip_interface_brief");
    fs::create_dir_all(&fixture_dir).unwrap();
    fs::write(fixture_dir.join("brief.raw"), samples::IP_INTERFACE_BRIEF).unwrap();
    root
}

#[test]
fn test_run_prints_progress_and_summary() {
    let root = setup();
    let output = harness(root.path())
        .args(["run", "--output", "reports/summary.json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[SKIP] show_clock: No matching fixture file found"));
    assert!(stdout.contains("[PASS] show_ip_interface_brief: Parsed 3 records in "));
    assert!(stdout.contains("Total templates tested: 2"));
    assert!(stdout.contains("Successful: 1 (50.0%)"));
    assert!(stdout.contains("Several templates need attention."));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.path().join("reports/summary.json")).unwrap()).unwrap();
    assert_eq!(json["skipped"], 1);
    assert_eq!(json["mode"], "TextFSM_Table");
}

#[test]
fn test_run_reads_config_file() {
    let root = setup();
    fs::write(
        root.path().join("template-harness.toml"),
        "execution = \"pooled\"\nmax_workers = 2\n",
    )
    .unwrap();

    let output = harness(root.path()).arg("run").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Total templates tested: 2"));
}

#[test]
fn test_run_from_subdirectory_uses_config_location() {
    let root = setup();
    fs::write(root.path().join("template-harness.toml"), "template_dir = \"templates\"\nfixture_dir = \"tests\"\n").unwrap();
    let nested = root.path().join("sub");
    fs::create_dir_all(&nested).unwrap();

    let output = harness(&nested).arg("run").output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total templates tested: 2"));
    assert!(stdout.contains("[PASS] show_ip_interface_brief: Parsed 3 records in "));
}

#[test]
fn test_no_templates_exits_non_zero() {
    let root = TempDir::new().unwrap();
    let output = harness(root.path()).arg("run").output().unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No templates matching 'cisco_ios*'"));
}

#[test]
fn test_list_templates_and_locate() {
    let root = setup();

    let listed = harness(root.path()).arg("list-templates").output().unwrap();
    let stdout = String::from_utf8_lossy(&listed.stdout);
    assert!(stdout.contains("Found 2 templates"));
    assert!(stdout.contains("cisco_ios_show_clock.textfsm (show_clock)"));

    let located = harness(root.path())
        .args(["locate", "show_ip_interface_brief"])
        .output()
        .unwrap();
    assert!(String::from_utf8_lossy(&located.stdout).trim_end().ends_with("brief.raw"));
}

#[test]
fn test_inspect_shows_first_record() {
    let root = setup();
    let output = harness(root.path())
        .args(["inspect", "show_ip_interface_brief"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Records:  3"));
    assert!(stdout.contains("Fields:   Interface"));
    assert!(stdout.contains("First record:"));
}
