// Woodshu CLI - woodcarving tutor, one-shot commands and terminal UI

mod exit_codes;
mod logging;
mod render;
mod tui;
mod util;

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use woodshu_completion::OpenAIClient;
use woodshu_config::ai::{AIDiagnostics, ResolvedAIConfig};
use woodshu_config::settings::Settings;
use woodshu_engine::chart::ChartMemo;
use woodshu_engine::pages::{CritiqueUseCase, MaterialUseCase, ProjectUseCase};
use woodshu_engine::prompt::{
    CritiqueRequest, MaterialRequest, MaterialSummary, Ownership, ProjectGoal, ProjectRequest,
    ProjectType, SkillLevel,
};
use woodshu_engine::session::Session;
use woodshu_engine::table::{IndexColumn, WoodTable, NAME_COLUMN};
use woodshu_engine::workflow::{Exchange, PageController, TriggerOutcome, UseCase};
use woodshu_engine::WorkflowError;

use exit_codes::{
    workflow_exit_code, EXIT_AI_MISSING_KEY, EXIT_DATA_UNKNOWN_WOOD, EXIT_ERROR, EXIT_SUCCESS,
    EXIT_USAGE,
};

/// Width of the text histogram bars.
const BAR_WIDTH: usize = 30;

/// Wrap width for completion text in plain output.
const TEXT_WIDTH: usize = 100;

#[derive(Parser)]
#[command(name = "woodshu")]
#[command(about = "Woodshu: your woodcarving tutor (critiques, project ideas, wood lookups)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Wood reference dataset (CSV). Overrides data.referencePath in settings.json
    #[arg(long, global = true, value_name = "PATH", env = "WOODSHU_DATA")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Get feedback on a carving from its image URL
    #[command(after_help = "\
Examples:
  woodshu critique https://example.com/owl.jpg
  woodshu critique https://example.com/bear.png --owner me --years 2 --skill beginner
  woodshu critique https://example.com/owl.jpg --json | jq -r .response")]
    Critique {
        /// Publicly reachable image URL
        url: String,

        /// Who made the carving: me or another
        #[arg(long, default_value = "another", value_parser = Ownership::parse_loose)]
        owner: Ownership,

        /// Carver's years of experience
        #[arg(long, default_value_t = 10, value_parser = bounded(CritiqueRequest::YEARS_RANGE))]
        years: u32,

        /// Carver's skill level
        #[arg(long, default_value_t = SkillLevel::Advanced)]
        skill: SkillLevel,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a project idea
    #[command(after_help = "\
Examples:
  woodshu project
  woodshu project --type woodburning --goal show-piece --medium 'Barn owl'
  woodshu project --skill intermediate --years 4 --hours 30 --json")]
    Project {
        /// Woodcarving, Woodburning or Woodworking
        #[arg(long = "type", default_value_t = ProjectType::Woodcarving)]
        project_type: ProjectType,

        /// Craft Enjoyment, Skillbuilding or Show Piece
        #[arg(long, default_value_t = ProjectGoal::CraftEnjoyment)]
        goal: ProjectGoal,

        /// What you want to make or work on
        #[arg(long, default_value = "A Watch Box")]
        medium: String,

        /// Your skill level
        #[arg(long, default_value_t = SkillLevel::Beginner)]
        skill: SkillLevel,

        /// Years of experience
        #[arg(long, default_value_t = 1, value_parser = bounded(ProjectRequest::YEARS_RANGE))]
        years: u32,

        /// Hours available for the project
        #[arg(long, default_value_t = 10, value_parser = bounded(ProjectRequest::HOURS_RANGE))]
        hours: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up a wood species: reference values, distributions and a summary
    #[command(after_help = "\
Examples:
  woodshu wood Basswood
  woodshu wood 'Black Walnut' --no-chart
  woodshu wood Butternut --no-summary
  woodshu wood 'Hard Maple' --json | jq .summary.carvability")]
    Wood {
        /// Common name, as listed by `woodshu woods`
        name: String,

        /// Skip the distribution charts
        #[arg(long)]
        no_chart: bool,

        /// Skip the model summary (no API key needed)
        #[arg(long)]
        no_summary: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the wood species in the reference dataset
    Woods {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive terminal tutor (default when no command is given)
    Tui,

    /// AI configuration commands
    #[command(subcommand)]
    Ai(AiCommands),
}

#[derive(Subcommand)]
enum AiCommands {
    /// Check API key, endpoint and model configuration
    Doctor {
        /// Output as JSON for machine parsing
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  woodshu-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  woodshu-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

/// Integer argument parser limited to `range`.
fn bounded(range: RangeInclusive<u32>) -> impl Fn(&str) -> Result<u32, String> + Clone + Send + Sync {
    move |s: &str| {
        let value: u32 = s.trim().parse().map_err(|_| format!("'{}' is not a whole number", s))?;
        if range.contains(&value) {
            Ok(value)
        } else {
            Err(format!("must be between {} and {}", range.start(), range.end()))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Tui);
    if !matches!(command, Commands::Tui) {
        logging::init_stderr();
    }

    let result = match command {
        Commands::Critique { url, owner, years, skill, json } => {
            let request = CritiqueRequest {
                image_url: url,
                ownership: owner,
                years_experience: years,
                skill_level: skill,
            };
            cmd_critique(request, json)
        }
        Commands::Project { project_type, goal, medium, skill, years, hours, json } => {
            let request = ProjectRequest {
                project_type,
                goal,
                medium,
                skill_level: skill,
                years_experience: years,
                available_hours: hours,
            };
            cmd_project(request, json)
        }
        Commands::Wood { name, no_chart, no_summary, json } => {
            cmd_wood(cli.data.as_deref(), &name, no_chart, no_summary, json)
        }
        Commands::Woods { json } => cmd_woods(cli.data.as_deref(), json),
        Commands::Tui => cmd_tui(cli.data.as_deref()),
        Commands::Ai(AiCommands::Doctor { json }) => cmd_ai_doctor(json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Bad argument value that clap cannot reject on its own.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Create error from a workflow error with the matching exit code.
    pub fn workflow(err: WorkflowError) -> Self {
        let code = workflow_exit_code(&err);
        let hint = match &err {
            WorkflowError::Configuration(_) => Some(
                "export OPENAI_API_KEY=... or store it in the system keychain; run `woodshu ai doctor`"
                    .to_string(),
            ),
            WorkflowError::DataUnavailable(_) => Some(
                "pass --data PATH or set data.referencePath in settings.json".to_string(),
            ),
            WorkflowError::Service(_) => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<WorkflowError> for CliError {
    fn from(err: WorkflowError) -> Self {
        Self::workflow(err)
    }
}

// ============================================================================
// Shared setup
// ============================================================================

/// Settings and credentials, resolved once per invocation.
struct Context {
    settings: Settings,
    ai: ResolvedAIConfig,
}

impl Context {
    fn load() -> Self {
        let settings = Settings::load();
        let ai = ResolvedAIConfig::from_settings(&settings.ai);
        Self { settings, ai }
    }

    /// `--data` wins over settings, which win over the bundled default.
    fn reference_path(&self, data: Option<&Path>) -> PathBuf {
        data.map(Path::to_path_buf)
            .or_else(|| self.settings.reference_path.clone())
            .unwrap_or_else(|| PathBuf::from(woodshu_io::DEFAULT_REFERENCE_PATH))
    }

    fn load_table(&self, data: Option<&Path>) -> Result<Arc<WoodTable>, WorkflowError> {
        let path = self.reference_path(data);
        log::debug!("reference table: {}", path.display());
        woodshu_io::load(&path).map_err(WorkflowError::from)
    }

    /// Fails with the startup configuration error before any request is built.
    fn client(&self) -> Result<OpenAIClient, CliError> {
        if let Some(err) = self.ai.config_error() {
            return Err(CliError::workflow(err));
        }
        OpenAIClient::new(self.ai.base_url.clone(), self.ai.api_key.clone())
            .map_err(|e| CliError::workflow(e.into()))
    }
}

/// Run one page to completion and hand back its exchange.
fn run_once<U: UseCase>(
    use_case: U,
    request: U::Request,
    client: &OpenAIClient,
) -> Result<Exchange<U::Request, U::Output>, CliError> {
    let mut page = PageController::new(use_case);
    match page.trigger(request, client) {
        TriggerOutcome::Completed => page
            .exchange()
            .cloned()
            .ok_or_else(|| CliError::general("completed page has no result")),
        TriggerOutcome::Failed(err) => Err(CliError::workflow(err)),
        TriggerOutcome::Ignored => Err(CliError::general("request was not started")),
    }
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("failed to serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn print_wrapped(text: &str) {
    for line in util::wrap(text, TEXT_WIDTH) {
        println!("{}", line);
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_critique(request: CritiqueRequest, json: bool) -> Result<(), CliError> {
    if request.image_url.trim().is_empty() {
        return Err(CliError::usage("image URL is empty").with_hint("pass a public image URL"));
    }
    let ctx = Context::load();
    let client = ctx.client()?;
    let exchange = run_once(
        CritiqueUseCase { params: ctx.ai.params.critique.clone() },
        request,
        &client,
    )?;

    if json {
        print_json(&serde_json::json!({
            "request": exchange.request,
            "response": exchange.output,
            "completed_at": exchange.completed_at.to_rfc3339(),
        }))
    } else {
        println!("Your Submission: {}", exchange.request.image_url);
        println!();
        print_wrapped(&exchange.output);
        Ok(())
    }
}

fn cmd_project(request: ProjectRequest, json: bool) -> Result<(), CliError> {
    let ctx = Context::load();
    let client = ctx.client()?;
    let exchange = run_once(
        ProjectUseCase { params: ctx.ai.params.project.clone() },
        request,
        &client,
    )?;

    if json {
        print_json(&serde_json::json!({
            "request": exchange.request,
            "response": exchange.output,
            "completed_at": exchange.completed_at.to_rfc3339(),
        }))
    } else {
        print_wrapped(&exchange.output);
        Ok(())
    }
}

/// Exact name, else a case-insensitive match.
fn resolve_wood<'a>(table: &'a WoodTable, name: &str) -> Option<&'a str> {
    let name = name.trim();
    table
        .find(name)
        .or_else(|| table.rows().iter().find(|r| r.common_name.eq_ignore_ascii_case(name)))
        .map(|r| r.common_name.as_str())
}

fn cmd_wood(
    data: Option<&Path>,
    name: &str,
    no_chart: bool,
    no_summary: bool,
    json: bool,
) -> Result<(), CliError> {
    let ctx = Context::load();
    let table = ctx.load_table(data)?;
    let name = resolve_wood(&table, name)
        .ok_or_else(|| CliError {
            code: EXIT_DATA_UNKNOWN_WOOD,
            message: format!("'{}' is not in the reference dataset", name),
            hint: Some("run `woodshu woods` to list known species".to_string()),
        })?
        .to_string();

    let use_case = MaterialUseCase { table: Arc::clone(&table), params: ctx.ai.params.material.clone() };
    let figure = (!no_chart).then(|| ChartMemo::new().get_or_render(&table, &name, &IndexColumn::ALL));

    let (subset, text) = if no_summary {
        (table.subset(&name), None)
    } else {
        let client = ctx.client()?;
        let exchange = run_once(use_case, MaterialRequest::new(name.as_str()), &client)?;
        (exchange.output.subset, Some(exchange.output.text))
    };
    let summary = text.as_deref().map(MaterialSummary::parse);
    for warning in summary.iter().flat_map(|s| s.warnings.iter()) {
        log::warn!("summary for {}: {}", name, warning);
    }

    if json {
        let rows: Vec<serde_json::Value> = subset
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                obj.insert(NAME_COLUMN.to_string(), serde_json::json!(row.common_name));
                for column in IndexColumn::ALL {
                    obj.insert(column.header().to_string(), serde_json::json!(row.value(column)));
                }
                serde_json::Value::Object(obj)
            })
            .collect();
        return print_json(&serde_json::json!({
            "name": name,
            "rows": rows,
            "figure": figure.as_deref(),
            "response": text,
            "summary": summary,
            "credit": render::DATA_CREDIT,
        }));
    }

    println!("Wood: {}", name);
    println!();
    for line in render::reference_rows(&subset) {
        println!("{}", line);
    }
    println!();
    println!("{}", render::DATA_CREDIT);

    if let Some(figure) = &figure {
        println!();
        for line in render::figure(figure, BAR_WIDTH) {
            println!("{}", line);
        }
    }

    if let Some(text) = &text {
        println!();
        print_wrapped(text);
        if let Some(safety) = summary.as_ref().and_then(MaterialSummary::safety) {
            println!();
            println!("Safety: {}", safety);
        }
    }
    Ok(())
}

fn cmd_woods(data: Option<&Path>, json: bool) -> Result<(), CliError> {
    let ctx = Context::load();
    let table = ctx.load_table(data)?;

    if json {
        let woods: Vec<serde_json::Value> = table
            .rows()
            .iter()
            .map(|row| {
                serde_json::json!({
                    "name": row.common_name,
                    "janka": row.value(IndexColumn::Janka),
                })
            })
            .collect();
        return print_json(&serde_json::json!({ "count": table.len(), "woods": woods }));
    }

    let width = table
        .names()
        .iter()
        .map(|n| util::display_width(n))
        .max()
        .unwrap_or(0)
        .max(NAME_COLUMN.len());
    println!("{}  {}", util::pad_right(NAME_COLUMN, width), IndexColumn::Janka.header());
    for row in table.rows() {
        println!(
            "{}  {}",
            util::pad_right(&row.common_name, width),
            render::format_value(row.value(IndexColumn::Janka))
        );
    }
    println!();
    println!("{}", render::DATA_CREDIT);
    Ok(())
}

fn cmd_tui(data: Option<&Path>) -> Result<(), CliError> {
    let log_path = woodshu_config::config_dir().join("woodshu.log");
    if let Err(e) = logging::init_file(&log_path) {
        eprintln!("warning: {}", e);
    }

    let ctx = Context::load();
    let table = ctx.load_table(data);
    let config_error = ctx.ai.config_error();
    if let Some(err) = &config_error {
        log::warn!("{}", err);
    }
    let client = OpenAIClient::new(ctx.ai.base_url.clone(), ctx.ai.api_key.clone())
        .map_err(|e| CliError::workflow(e.into()))?;

    let session = Session::new(ctx.ai.params.clone(), table, config_error);
    tui::run(session, client).map_err(CliError::general)
}

fn cmd_ai_doctor(json: bool) -> Result<(), CliError> {
    let ctx = Context::load();
    let diag = AIDiagnostics::from_resolved(&ctx.ai);

    if json {
        print_json(&diag.to_json())?;
    } else {
        print!("{}", diag);

        // Actionable fix suggestions
        if !diag.status.is_ready() {
            println!();
            println!("To configure an API key, either:");
            println!("  export OPENAI_API_KEY=sk-...");
            println!("  or store it in the system keychain (service \"woodshu\", account \"ai/openai\")");
        }
    }

    if diag.status.is_ready() {
        Ok(())
    } else {
        Err(CliError { code: EXIT_AI_MISSING_KEY, message: String::new(), hint: None })
    }
}
