// End-to-end tests for the `woodshu` binary.
//
// Every test runs with its own settings file and no API key in the
// environment, so nothing reaches the real completion service. Tests that
// need a model answer point `ai.baseUrl` at a local mock server.
//
// Run with: cargo test -p woodshu-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use httpmock::prelude::*;
use tempfile::TempDir;

const EXIT_AI_MISSING_KEY: i32 = 11;
const EXIT_AI_SERVICE: i32 = 13;
const EXIT_DATA_UNAVAILABLE: i32 = 20;
const EXIT_DATA_UNKNOWN_WOOD: i32 = 21;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Isolated config dir; `settings` is written verbatim when given.
struct Env {
    dir: TempDir,
}

impl Env {
    fn new(settings: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        if let Some(contents) = settings {
            std::fs::write(dir.path().join("settings.json"), contents).unwrap();
        }
        Self { dir }
    }

    fn with_endpoint(base_url: &str) -> Self {
        Self::new(Some(&format!(r#"{{ "ai": {{ "baseUrl": "{}" }} }}"#, base_url)))
    }

    fn woodshu(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_woodshu"));
        cmd.current_dir(env!("CARGO_MANIFEST_DIR"))
            .env("WOODSHU_CONFIG", self.dir.path().join("settings.json"))
            .env_remove("OPENAI_API_KEY")
            .env_remove("WOODSHU_OPENAI_KEY")
            .env_remove("WOODSHU_DATA")
            .env_remove("WOODSHU_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.woodshu()
            .arg("--data")
            .arg(fixture("woods.csv"))
            .args(args)
            .output()
            .expect("run woodshu")
    }

    fn run_with_key(&self, args: &[&str]) -> Output {
        self.woodshu()
            .env("OPENAI_API_KEY", "sk-test")
            .arg("--data")
            .arg(fixture("woods.csv"))
            .args(args)
            .output()
            .expect("run woodshu")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn json(output: &Output) -> serde_json::Value {
    let text = stdout(output);
    serde_json::from_str(text.trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {}\n{}", e, text))
}

fn chat_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }]
    })
}

// ===========================================================================
// woodshu woods
// ===========================================================================

#[test]
fn woods_lists_fixture_species_with_credit() {
    let env = Env::new(None);
    let output = env.run(&["woods"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    for name in ["Ash", "Basswood", "Black Walnut", "Butternut", "Hard Maple", "Red Oak"] {
        assert!(out.contains(name), "missing {} in:\n{}", name, out);
    }
    assert!(out.contains("Janka Index"));
    assert!(out.contains("wood-database.com"));
}

#[test]
fn woods_json_counts_rows() {
    let env = Env::new(None);
    let output = env.run(&["woods", "--json"]);
    assert!(output.status.success());

    let val = json(&output);
    assert_eq!(val["count"], 6);
    assert_eq!(val["woods"][1]["name"], "Basswood");
    assert_eq!(val["woods"][1]["janka"], 410.0);
}

#[test]
fn missing_dataset_exits_with_data_code() {
    let env = Env::new(None);
    let output = env
        .woodshu()
        .args(["woods", "--data", "tests/fixtures/nope.csv"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(EXIT_DATA_UNAVAILABLE));
    assert!(stderr(&output).contains("reference data unavailable"));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn settings_reference_path_is_used_without_flag() {
    let env = Env::new(Some(&format!(
        r#"{{ "data.referencePath": {} }}"#,
        serde_json::json!(fixture("woods.csv"))
    )));
    let output = env.woodshu().args(["woods", "--json"]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(json(&output)["count"], 6);
}

// ===========================================================================
// woodshu wood
// ===========================================================================

#[test]
fn wood_without_summary_needs_no_key() {
    let env = Env::new(None);
    let output = env.run(&["wood", "basswood", "--no-summary"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.starts_with("Wood: Basswood"));
    assert!(out.contains("Distribution of Janka Index (selected: 410)"));
    assert!(out.contains("Distribution of Crush Index"));
    assert!(out.lines().any(|l| l.ends_with(" <")));
}

#[test]
fn wood_no_chart_omits_histograms() {
    let env = Env::new(None);
    let output = env.run(&["wood", "Ash", "--no-summary", "--no-chart"]);
    assert!(output.status.success());
    assert!(!stdout(&output).contains("Distribution of"));
}

#[test]
fn unknown_wood_exits_with_hint() {
    let env = Env::new(None);
    let output = env.run(&["wood", "Teak", "--no-summary"]);
    assert_eq!(output.status.code(), Some(EXIT_DATA_UNKNOWN_WOOD));
    assert!(stderr(&output).contains("woodshu woods"));
}

#[test]
fn wood_summary_without_key_is_configuration_error() {
    let env = Env::new(None);
    let output = env.run(&["wood", "Ash"]);
    assert_eq!(output.status.code(), Some(EXIT_AI_MISSING_KEY));
    assert!(stderr(&output).contains("OPENAI_API_KEY"));
}

#[test]
fn wood_json_includes_rows_figure_and_parsed_summary() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(chat_response(
            "Wood being Summarized: Butternut\n\
             Wood Type: Hardwood\n\
             Carvability: Very easy\n\
             Recommended Carving Level: Beginner\n\
             Key Woodworking Uses: Relief carving\n\
             Possible Safety Concerns: None\n\
             History and Summary: Also called white walnut.\n\
             Next Steps: Try a relief panel.",
        ));
    });

    let env = Env::with_endpoint(&server.base_url());
    let output = env.run_with_key(&["wood", "Butternut", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    mock.assert_calls(1);

    let val = json(&output);
    assert_eq!(val["name"], "Butternut");
    assert_eq!(val["rows"][0]["Common Name"], "Butternut");
    assert_eq!(val["rows"][0]["Janka Index"], 490.0);
    assert_eq!(val["figure"]["subplots"].as_array().unwrap().len(), 5);
    assert_eq!(val["figure"]["highlight"], "Butternut");
    assert_eq!(val["summary"]["carvability"], "Very easy");
    assert!(val["summary"]["warnings"].as_array().unwrap().is_empty());
}

// ===========================================================================
// woodshu critique / project
// ===========================================================================

#[test]
fn critique_without_key_fails_before_network() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(chat_response("unreachable"));
    });

    let env = Env::with_endpoint(&server.base_url());
    let output = env.run(&["critique", "https://example.com/owl.jpg"]);
    assert_eq!(output.status.code(), Some(EXIT_AI_MISSING_KEY));
    mock.assert_calls(0);
}

#[test]
fn critique_json_reports_request_and_response() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(chat_response("Lovely owl. Deepen the eye sockets."));
    });

    let env = Env::with_endpoint(&server.base_url());
    let output = env.run_with_key(&[
        "critique",
        "https://example.com/owl.jpg",
        "--owner",
        "self",
        "--years",
        "3",
        "--skill",
        "beginner",
        "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    mock.assert();

    let val = json(&output);
    assert_eq!(val["request"]["image_url"], "https://example.com/owl.jpg");
    assert_eq!(val["request"]["ownership"], "Me");
    assert_eq!(val["request"]["years_experience"], 3);
    assert_eq!(val["response"], "Lovely owl. Deepen the eye sockets.");
    assert!(val["completed_at"].as_str().unwrap().contains('T'));
}

#[test]
fn critique_years_out_of_range_is_usage_error() {
    let env = Env::new(None);
    let output = env.run(&["critique", "https://example.com/owl.jpg", "--years", "21"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("between 0 and 20"));
}

#[test]
fn blank_image_url_is_usage_error_before_network() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(chat_response("unreachable"));
    });

    let env = Env::with_endpoint(&server.base_url());
    let output = env.run_with_key(&["critique", "   "]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("image URL is empty"));
    mock.assert_calls(0);
}

#[test]
fn project_service_error_is_reported_once() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(500)
            .json_body(serde_json::json!({ "error": { "message": "upstream exploded" } }));
    });

    let env = Env::with_endpoint(&server.base_url());
    let output = env.run_with_key(&["project", "--type", "woodburning", "--goal", "show-piece"]);
    assert_eq!(output.status.code(), Some(EXIT_AI_SERVICE));
    assert!(stderr(&output).contains("upstream exploded"));
    mock.assert_calls(1);
}

#[test]
fn project_plain_output_is_the_answer() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(chat_response("Carve a walnut watch box."));
    });

    let env = Env::with_endpoint(&server.base_url());
    let output = env.run_with_key(&["project", "--medium", "A Watch Box", "--hours", "12"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "Carve a walnut watch box.");
}

// ===========================================================================
// woodshu ai doctor
// ===========================================================================

#[test]
fn ai_doctor_json_reports_missing_key() {
    let env = Env::new(None);
    let output = env.woodshu().args(["ai", "doctor", "--json"]).output().unwrap();
    assert_eq!(output.status.code(), Some(EXIT_AI_MISSING_KEY));

    let val = json(&output);
    assert_eq!(val["schema_version"], 1);
    assert_eq!(val["status"], "missing_key");
    assert_eq!(val["key"], "missing");
    assert_eq!(val["models"]["project"]["temperature"], 0.2);
}

#[test]
fn ai_doctor_ready_with_env_key() {
    let env = Env::new(None);
    let output = env
        .woodshu()
        .env("WOODSHU_OPENAI_KEY", "sk-test")
        .args(["ai", "doctor"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("ready"));
    // The settings file is created on first run
    assert!(env.dir.path().join("settings.json").exists());
}
