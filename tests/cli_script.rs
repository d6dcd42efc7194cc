use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::str::contains;

fn script(home: &assert_fs::TempDir, input: &str) -> assert_cmd::assert::Assert {
    Command::cargo_bin("wello_cli")
        .unwrap()
        .env("WELLO_CLI_SCRIPT", "1")
        .env("WELLO_HOME", home.path())
        .env("NO_COLOR", "1")
        .write_stdin(input.to_string())
        .assert()
}

#[test]
fn script_mode_completes_onboarding_and_exports_record() {
    let home = assert_fs::TempDir::new().unwrap();
    let input = "\
toggle Vegan
next
unit weight
weight 150
next
age 42
next
select Female
next
select 2
next
toggle IBS
next
next
exit
";

    script(&home, input)
        .success()
        .stdout(contains("Questionnaire submitted."))
        .stdout(contains("\"physicalActivity\": \"30-60 mins daily\""));

    let records: Vec<_> = std::fs::read_dir(home.path().join("records"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(records.len(), 1);

    let json = std::fs::read_to_string(&records[0]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["dietaryRestrictions"], serde_json::json!(["Vegan"]));
    assert_eq!(value["weight"], serde_json::json!(68.0));
    assert_eq!(value["height"], serde_json::Value::Null);
    assert_eq!(value["age"], serde_json::json!(42));
    assert_eq!(value["biologicalSex"], serde_json::json!("Female"));
    assert_eq!(value["healthConditions"], serde_json::json!(["IBS"]));
    assert!(value["id"].is_string());
}

#[test]
fn blocked_step_and_unknown_command_keep_running() {
    let home = assert_fs::TempDir::new().unwrap();
    script(&home, "route biological-sex\nnext\nnxt\nparams\nexit\n")
        .success()
        .stdout(contains("Make a selection to continue."))
        .stdout(contains("Suggestion: `next`?"))
        .stdout(contains("\"biologicalSex\":\"\""));
}

#[test]
fn invalid_input_reports_error_without_exiting() {
    let home = assert_fs::TempDir::new().unwrap();
    script(&home, "toggle Vegann\nroute age '{\"age\":\"7\"}'\nparams\n")
        .success()
        .stdout(contains("unknown dietary restriction: `Vegann`"))
        .stdout(contains("\"age\":\"7\""));
}

#[test]
fn config_set_is_persisted() {
    let home = assert_fs::TempDir::new().unwrap();
    script(&home, "config set terminal health-conditions\nconfig show\n")
        .success()
        .stdout(contains("Updated `terminal`."))
        .stdout(contains("health-conditions"));

    home.child("config.json")
        .assert(predicates::str::contains("\"terminal\": \"health-conditions\""));
}

#[test]
fn analyze_renders_saved_analysis() {
    let home = assert_fs::TempDir::new().unwrap();
    let file = home.child("oat_milk.txt");
    file.write_str(
        "**Pros of Oat Milk**\n1. **Fiber**: Contains beta-glucans.\n**Cons of Oat Milk**\n1. **Sugar**: Some brands add sugar.\n",
    )
    .unwrap();

    script(&home, &format!("analyze {}\n", file.path().display()))
        .success()
        .stdout(contains("Benefits:"))
        .stdout(contains("  - Fiber: Contains beta-glucans."))
        .stdout(contains("  - Sugar: Some brands add sugar."));
}

#[test]
fn convert_prints_rounded_value() {
    let home = assert_fs::TempDir::new().unwrap();
    script(&home, "convert 68 kg\nconvert 150 lbs\n")
        .success()
        .stdout(contains("68 kg = 150 lbs"))
        .stdout(contains("150 lbs = 68 kg"));
}
