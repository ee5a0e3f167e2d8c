//! End-to-end tests driving the `wv` binary.
//!
//! Covers the full flow: register users → create plan → add events →
//! itinerary → invitations → inbox.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn wv_binary() -> String {
    env!("CARGO_BIN_EXE_wv").to_string()
}

/// Isolated home directory with a config file pointing at a fresh database.
struct Sandbox {
    temp: TempDir,
    config_file: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("data").join("wv.db");
        let config_file = temp.path().join("config.toml");
        std::fs::write(
            &config_file,
            format!(
                "database_path = \"{}\"\ndefault_time_zone = \"Europe/London\"\n",
                db_path.display()
            ),
        )
        .unwrap();
        Self { temp, config_file }
    }

    fn home(&self) -> &Path {
        self.temp.path()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(wv_binary())
            .env("HOME", self.home())
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("XDG_DATA_HOME")
            .env_remove("WV_USER")
            .env_remove("WV_DATABASE_PATH")
            .env_remove("WV_DEFAULT_TIME_ZONE")
            .arg("--config")
            .arg(&self.config_file)
            .args(args)
            .output()
            .expect("failed to run wv")
    }

    fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "wv {args:?} should succeed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn fails(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(!output.status.success(), "wv {args:?} should fail");
        String::from_utf8(output.stderr).unwrap()
    }
}

/// Pulls the trailing `(<id>)` out of a "Created ..." / "Added ..." line.
fn parenthesized_id(line: &str) -> String {
    let start = line.rfind('(').unwrap() + 1;
    let end = line[start..].find(')').unwrap() + start;
    line[start..end].to_string()
}

fn create_trip(sandbox: &Sandbox) -> String {
    sandbox.ok(&["user", "add", "--first", "Ana", "--last", "Lima", "--email", "ana@example.com"]);
    let created = sandbox.ok(&[
        "--as",
        "ana@example.com",
        "plan",
        "create",
        "--kind",
        "trip",
        "--name",
        "London calling",
        "--destination",
        "London",
    ]);
    parenthesized_id(created.lines().next().unwrap())
}

#[test]
fn test_empty_plan_itinerary_json() {
    let sandbox = Sandbox::new();
    let plan_id = create_trip(&sandbox);
    let plan = plan_id.as_str();

    let json = sandbox.ok(&["--as", "ana@example.com", "itinerary", plan, "--json"]);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value, serde_json::json!({"events": [], "grouped": {}}));
}

#[test]
fn test_flight_and_hotel_itinerary() {
    let sandbox = Sandbox::new();
    let plan_id = create_trip(&sandbox);
    let plan = plan_id.as_str();

    // Overnight flight from New York, landing in London on the 11th.
    sandbox.ok(&[
        "--as", "ana@example.com", "event", "add", plan, "--title", "BA 178",
        "--type", "flight", "--start", "2025-10-10 23:00", "--duration", "7h",
        "--origin-tz", "America/New_York", "--destination-tz", "Europe/London",
    ]);
    sandbox.ok(&[
        "--as", "ana@example.com", "event", "add", plan, "--title", "Check in",
        "--type", "hotel", "--start", "2025-10-11 15:00", "--end", "2025-10-14 11:00",
    ]);
    sandbox.ok(&[
        "--as", "ana@example.com", "event", "add", plan, "--title", "Dishoom",
        "--type", "dining", "--start", "2025-10-15 19:30", "--duration", "1h30m",
    ]);

    let json = sandbox.ok(&["--as", "ana@example.com", "itinerary", plan, "--json"]);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let days: Vec<u64> = value["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["dayNumber"].as_u64().unwrap())
        .collect();
    assert_eq!(days, vec![1, 1, 2]);
    assert_eq!(value["grouped"]["1"].as_array().unwrap().len(), 2);

    let shown = sandbox.ok(&["--as", "ana@example.com", "plan", "show", plan, "--json"]);
    let plan: serde_json::Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(plan["startDate"], "2025-10-11T03:00:00Z");
    assert_eq!(plan["endDate"], "2025-10-15T20:00:00Z");
}

#[test]
fn test_bad_zone_is_rejected() {
    let sandbox = Sandbox::new();
    let plan_id = create_trip(&sandbox);
    let plan = plan_id.as_str();

    let stderr = sandbox.fails(&[
        "--as", "ana@example.com", "event", "add", plan, "--title", "Ghost flight",
        "--type", "flight", "--start", "2025-10-11T03:00:00Z", "--duration", "60",
        "--origin-tz", "Atlantis/Capital", "--destination-tz", "Europe/London",
    ]);
    assert!(stderr.contains("unknown time zone"), "stderr: {stderr}");
}

#[test]
fn test_invitation_flow() {
    let sandbox = Sandbox::new();
    let plan_id = create_trip(&sandbox);
    let plan = plan_id.as_str();
    sandbox.ok(&["user", "add", "--first", "Bea", "--last", "Cruz", "--email", "bea@example.com"]);

    sandbox.ok(&["--as", "ana@example.com", "invite", plan, "bea@example.com", "wanderer"]);

    let invitations = sandbox.ok(&["--as", "bea@example.com", "invitations"]);
    let invitation_id = invitations.split_whitespace().next().unwrap().to_string();
    assert!(invitations.contains("pending"));

    // Not yet a participant.
    let stderr = sandbox.fails(&["--as", "bea@example.com", "itinerary", plan]);
    assert!(stderr.contains("not a plan participant"), "stderr: {stderr}");

    let joined = sandbox.ok(&["--as", "bea@example.com", "respond", invitation_id.as_str(), "accept"]);
    assert_eq!(joined, "Joined \"London calling\" as Wanderer\n");

    let users = sandbox.ok(&["--as", "bea@example.com", "plan", "users", plan]);
    assert_eq!(
        users,
        "VibeCoordinator\n  Ana Lima <ana@example.com>\nWanderer\n  Bea Cruz <bea@example.com>\n"
    );

    let inbox = sandbox.ok(&["--as", "bea@example.com", "inbox"]);
    assert!(inbox.contains("[email] Welcome to \"London calling\" as Wanderer!"));

    // Wanderers may not invite planners.
    let stderr = sandbox.fails(&[
        "--as", "bea@example.com", "invite", plan, "ana@example.com", "planner",
    ]);
    assert!(stderr.contains("only the VibeCoordinator can invite VibePlanners"), "stderr: {stderr}");
}

#[test]
fn test_no_acting_user() {
    let sandbox = Sandbox::new();
    let stderr = sandbox.fails(&["plan", "list"]);
    assert!(stderr.contains("no acting user"), "stderr: {stderr}");
}
