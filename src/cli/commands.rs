//! CLI command definitions for variant-forge.
//!
//! `generate` runs one generate-then-export cycle; `export` rewrites saved
//! results to CSV or XLSX; `prompt` prints the prompt that would be sent for
//! a message and parameter text.

use crate::config::{GeneratorConfig, API_KEY_ENV};
use crate::error::InputError;
use crate::export::{self, ExportFormat, CSV_FILE_NAME, XLSX_FILE_NAME};
use crate::generation::{Dispatcher, ExportRow, FailurePolicy, VariantClient, Variation};
use crate::prompts::build_prompt;
use crate::session::Session;
use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Generate variations of a message with an LLM and export them.
#[derive(Parser)]
#[command(name = "variant-forge")]
#[command(about = "Generate message variations with an LLM and export them to CSV or XLSX")]
#[command(version)]
#[command(
    long_about = "variant-forge rewrites one base message once per named variation, each with its own free-text instructions.\n\nAll variations are generated concurrently and can be exported as CSV or XLSX.\n\nExample usage:\n  variant-forge generate -m \"Spring sale: 20% off\" -v \"Playful=add an emoji\" -v \"Formal=no slang\" --csv"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate one variant message per variation.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Export results saved by `generate --json` to CSV or XLSX.
    Export(ExportArgs),

    /// Print the prompt built for a message and parameters without calling the API.
    Prompt(PromptArgs),
}

/// Arguments for `variant-forge generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// The original message to rewrite.
    #[arg(short = 'm', long, conflicts_with = "message_file")]
    pub message: Option<String>,

    /// Read the original message from a file.
    #[arg(long)]
    pub message_file: Option<PathBuf>,

    /// A variation as NAME=PARAMETERS. Repeat for more variations.
    #[arg(short = 'v', long = "variation")]
    pub variations: Vec<String>,

    /// JSON or YAML file with a list of {name, parameters} variations.
    #[arg(long)]
    pub variations_file: Option<PathBuf>,

    /// Export results as CSV (default path: variations_export.csv).
    #[arg(long, num_args = 0..=1, default_missing_value = CSV_FILE_NAME)]
    pub csv: Option<PathBuf>,

    /// Export results as XLSX (default path: variations_export.xlsx).
    #[arg(long, num_args = 0..=1, default_missing_value = XLSX_FILE_NAME)]
    pub xlsx: Option<PathBuf>,

    /// Keep successful variations when others fail; failures get an [error] marker.
    #[arg(long)]
    pub keep_going: bool,

    /// API key (can also be set via GROQ_API_KEY env var).
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completion API.
    #[arg(long)]
    pub api_base: Option<String>,

    /// Model identifier.
    #[arg(long)]
    pub model: Option<String>,

    /// Attempts per variation before giving up.
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Output JSON to stdout instead of plain text.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `variant-forge export`.
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// JSON results from `generate --json`, or a JSON list of {variation_name, message} rows.
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Destination file; the format follows its extension (.csv or .xlsx).
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Format to write to its default file name when no --output is given.
    #[arg(short = 'f', long, default_value = "csv")]
    pub format: ExportFormat,
}

/// Arguments for `variant-forge prompt`.
#[derive(Parser, Debug)]
pub struct PromptArgs {
    /// The original message.
    #[arg(short = 'm', long, conflicts_with = "message_file")]
    pub message: Option<String>,

    /// Read the original message from a file.
    #[arg(long)]
    pub message_file: Option<PathBuf>,

    /// Free-text variation parameters.
    #[arg(short = 'p', long, default_value = "")]
    pub parameters: String,
}

/// JSON output for the generate command.
#[derive(Debug, Serialize)]
struct GenerationOutput {
    model: String,
    failed: usize,
    rows: Vec<ExportRow>,
    exported: Vec<String>,
}

/// Accepted input for the export command.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SavedResults {
    Generation { rows: Vec<ExportRow> },
    Rows(Vec<ExportRow>),
}

impl SavedResults {
    fn into_rows(self) -> Vec<ExportRow> {
        match self {
            SavedResults::Generation { rows } | SavedResults::Rows(rows) => rows,
        }
    }
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => run_generate_command(args).await,
        Commands::Export(args) => run_export_command(args),
        Commands::Prompt(args) => run_prompt_command(args),
    }
}

// ============================================================================
// Generate
// ============================================================================

async fn run_generate_command(args: GenerateArgs) -> anyhow::Result<()> {
    let mut session = match build_session(&args)? {
        Ok(session) => session,
        Err(err) => {
            warn!("{}", err);
            return Ok(());
        }
    };

    // Input problems are reported before any credential is needed
    if let Err(err) = session.batch_request() {
        warn!("{}", err);
        return Ok(());
    }

    let config = build_config(&args)?;
    let model = config.model.clone();
    let client = VariantClient::from_config(config)
        .context("Failed to initialize completion client")?;
    let dispatcher = Dispatcher::new(client);

    let policy = if args.keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::AbortBatch
    };

    let start = std::time::Instant::now();
    if let Err(err) = session.generate(&dispatcher, policy).await {
        if err.is_user_input() {
            warn!("{}", err);
            return Ok(());
        }
        return Err(err).context("Variation generation failed");
    }
    info!(
        rows = session.rows().len(),
        failed = session.failed_count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Variations ready"
    );

    let mut exported = Vec::new();
    for (format, path) in export_targets(&args) {
        match session.export(format, &path) {
            Ok(()) => exported.push(path.display().to_string()),
            Err(err) if err.is_user_input() => warn!("{}", err),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to export {}", path.display()))
            }
        }
    }

    if args.json {
        let output = GenerationOutput {
            model,
            failed: session.failed_count(),
            rows: session.rows().to_vec(),
            exported,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for row in session.rows() {
            println!("[{}]\n{}\n", row.variation_name, row.message);
        }
        for path in &exported {
            println!("Exported: {}", path);
        }
    }

    Ok(())
}

/// Assemble the session from the message and variation arguments.
///
/// The outer error is fatal (unreadable files); the inner one is a user-input
/// warning.
fn build_session(args: &GenerateArgs) -> anyhow::Result<Result<Session, InputError>> {
    let message = read_message(args.message.as_deref(), args.message_file.as_deref())?;

    let mut variations = Vec::new();
    if let Some(path) = &args.variations_file {
        variations.extend(load_variations_file(path)?);
    }
    for raw in &args.variations {
        match parse_variation(raw) {
            Ok(variation) => variations.push(variation),
            Err(err) => return Ok(Err(err)),
        }
    }

    let mut session = if variations.is_empty() && args.variations_file.is_none() {
        Session::new()
    } else {
        Session::with_variations(variations)
    };
    session.set_message(message);
    Ok(Ok(session))
}

/// Build the generator configuration: environment first, flags on top.
fn build_config(args: &GenerateArgs) -> anyhow::Result<GeneratorConfig> {
    let api_key = args.api_key.clone();
    let mut config = GeneratorConfig::from_lookup(|key| {
        if key == API_KEY_ENV {
            api_key.clone()
        } else {
            std::env::var(key).ok()
        }
    })
    .with_context(|| format!("Provide --api-key or set the {} env var", API_KEY_ENV))?;

    if let Some(base) = &args.api_base {
        config = config.with_api_base(base.clone());
    }
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }
    if let Some(retries) = args.max_retries {
        config = config.with_max_retries(retries);
    }
    config.validate()?;
    Ok(config)
}

fn export_targets(args: &GenerateArgs) -> Vec<(ExportFormat, PathBuf)> {
    let mut targets = Vec::new();
    if let Some(path) = &args.csv {
        targets.push((ExportFormat::Csv, path.clone()));
    }
    if let Some(path) = &args.xlsx {
        targets.push((ExportFormat::Xlsx, path.clone()));
    }
    targets
}

/// Parse a `NAME=PARAMETERS` variation argument.
///
/// Only the first `=` separates; the parameters may be empty.
pub fn parse_variation(raw: &str) -> Result<Variation, InputError> {
    let (name, parameters) = raw
        .split_once('=')
        .ok_or_else(|| InputError::InvalidVariation(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(InputError::InvalidVariation(raw.to_string()));
    }
    Ok(Variation::new(name, parameters.trim()))
}

/// Load variations from a JSON or YAML file (by extension; JSON otherwise).
pub fn load_variations_file(path: &Path) -> anyhow::Result<Vec<Variation>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read variations file {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    let variations = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?
    };
    Ok(variations)
}

fn read_message(message: Option<&str>, file: Option<&Path>) -> anyhow::Result<String> {
    match (message, file) {
        (Some(text), _) => Ok(text.to_string()),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read message file {}", path.display())),
        (None, None) => Ok(String::new()),
    }
}

// ============================================================================
// Export
// ============================================================================

fn run_export_command(args: ExportArgs) -> anyhow::Result<()> {
    let rows = load_saved_rows(&args.input)?;
    if rows.is_empty() {
        warn!("{}", InputError::NothingToExport);
        return Ok(());
    }

    let (format, path) = export_destination(&args)?;
    export::export(format, &rows, &path)
        .with_context(|| format!("Failed to export {}", path.display()))?;
    println!("Exported: {}", path.display());
    Ok(())
}

/// Load rows saved by `generate --json` (or a bare row list).
pub fn load_saved_rows(path: &Path) -> anyhow::Result<Vec<ExportRow>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file {}", path.display()))?;
    let saved: SavedResults = serde_json::from_str(&content)
        .with_context(|| format!("Invalid results JSON in {}", path.display()))?;
    Ok(saved.into_rows())
}

/// Format from the output extension, or the default path for `--format`.
fn export_destination(args: &ExportArgs) -> anyhow::Result<(ExportFormat, PathBuf)> {
    match &args.output {
        Some(path) => Ok((ExportFormat::from_path(path)?, path.clone())),
        None => Ok((args.format, args.format.default_path()?)),
    }
}

// ============================================================================
// Prompt
// ============================================================================

fn run_prompt_command(args: PromptArgs) -> anyhow::Result<()> {
    match render_prompt(&args)? {
        Some(prompt) => println!("{}", prompt),
        None => warn!("{}", InputError::EmptyMessage),
    }
    Ok(())
}

fn render_prompt(args: &PromptArgs) -> anyhow::Result<Option<String>> {
    let message = read_message(args.message.as_deref(), args.message_file.as_deref())?;
    if message.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(build_prompt(&message, &args.parameters)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn generate_args(argv: &[&str]) -> GenerateArgs {
        let mut full = vec!["variant-forge", "generate"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).expect("should parse").command {
            Commands::Generate(args) => args,
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_command_defaults() {
        let args = generate_args(&[]);
        assert!(args.message.is_none());
        assert!(args.variations.is_empty());
        assert!(args.csv.is_none());
        assert!(args.xlsx.is_none());
        assert!(!args.keep_going);
        assert!(!args.json);
        assert!(args.model.is_none());
    }

    #[test]
    fn test_generate_command_with_all_options() {
        let args = generate_args(&[
            "-m",
            "Spring sale",
            "-v",
            "Playful=add an emoji",
            "--variation",
            "Formal=no slang",
            "--csv",
            "out/report.csv",
            "--xlsx",
            "--keep-going",
            "--api-key",
            "gsk-test",
            "--api-base",
            "http://localhost:9999/v1",
            "--model",
            "llama-3.1-8b-instant",
            "--max-retries",
            "5",
            "-j",
        ]);

        assert_eq!(args.message.as_deref(), Some("Spring sale"));
        assert_eq!(args.variations, vec!["Playful=add an emoji", "Formal=no slang"]);
        assert_eq!(args.csv, Some(PathBuf::from("out/report.csv")));
        assert_eq!(args.xlsx, Some(PathBuf::from(XLSX_FILE_NAME)));
        assert!(args.keep_going);
        assert_eq!(args.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(args.model.as_deref(), Some("llama-3.1-8b-instant"));
        assert_eq!(args.max_retries, Some(5));
        assert!(args.json);
    }

    #[test]
    fn test_generate_alias_and_bare_csv() {
        let cli = Cli::try_parse_from(["variant-forge", "gen", "--csv"]).expect("should parse");
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.csv, Some(PathBuf::from(CSV_FILE_NAME)));
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_message_sources_conflict() {
        let result = Cli::try_parse_from([
            "variant-forge",
            "generate",
            "-m",
            "hi",
            "--message-file",
            "msg.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_variation() {
        assert_eq!(
            parse_variation("Playful=add an emoji").expect("valid"),
            Variation::new("Playful", "add an emoji")
        );
        assert_eq!(
            parse_variation("Math=use a=b notation").expect("valid"),
            Variation::new("Math", "use a=b notation")
        );
        assert_eq!(
            parse_variation("Plain=").expect("valid"),
            Variation::new("Plain", "")
        );
        assert_eq!(
            parse_variation("no separator"),
            Err(InputError::InvalidVariation("no separator".to_string()))
        );
        assert!(parse_variation(" =params").is_err());
    }

    #[test]
    fn test_load_variations_file_json_and_yaml() {
        let dir = TempDir::new().expect("temp dir");

        let json_path = dir.path().join("variations.json");
        fs::write(
            &json_path,
            r#"[{"name": "A", "parameters": "short"}, {"name": "B", "params": "long"}]"#,
        )
        .expect("write json");
        let loaded = load_variations_file(&json_path).expect("valid json");
        assert_eq!(
            loaded,
            vec![Variation::new("A", "short"), Variation::new("B", "long")]
        );

        let yaml_path = dir.path().join("variations.yml");
        fs::write(&yaml_path, "- name: Formal\n  parameters: no slang\n- name: Bare\n")
            .expect("write yaml");
        let loaded = load_variations_file(&yaml_path).expect("valid yaml");
        assert_eq!(
            loaded,
            vec![Variation::new("Formal", "no slang"), Variation::new("Bare", "")]
        );

        let bad_path = dir.path().join("bad.json");
        fs::write(&bad_path, "{not json").expect("write bad");
        assert!(load_variations_file(&bad_path).is_err());
        assert!(load_variations_file(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_build_session_defaults_and_overrides() {
        let session = build_session(&generate_args(&["-m", "Hello"]))
            .expect("no io error")
            .expect("valid input");
        let names: Vec<&str> = session.variations().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["V1", "V2"]);
        assert_eq!(session.message(), "Hello");

        let session = build_session(&generate_args(&["-m", "Hello", "-v", "Short=tiny"]))
            .expect("no io error")
            .expect("valid input");
        assert_eq!(session.variations(), &[Variation::new("Short", "tiny")]);

        let err = build_session(&generate_args(&["-v", "broken"]))
            .expect("no io error")
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidVariation(_)));
    }

    #[test]
    fn test_empty_variations_file_yields_no_variations() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("empty.json");
        fs::write(&path, "[]").expect("write");

        let path_arg = path.display().to_string();
        let session = build_session(&generate_args(&["-m", "Hi", "--variations-file", &path_arg]))
            .expect("no io error")
            .expect("valid input");
        assert_eq!(session.batch_request(), Err(InputError::NoVariations));
    }

    #[test]
    fn test_build_config_applies_flags() {
        let args = generate_args(&[
            "--api-key",
            "gsk-test",
            "--model",
            "custom-model",
            "--max-retries",
            "7",
        ]);
        let config = build_config(&args).expect("valid config");
        assert_eq!(config.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.model, "custom-model");
        assert_eq!(config.max_retries, 7);
    }

    #[test]
    fn test_export_targets() {
        let args = generate_args(&["--xlsx", "a.xlsx", "--csv"]);
        let targets = export_targets(&args);
        assert_eq!(
            targets,
            vec![
                (ExportFormat::Csv, PathBuf::from(CSV_FILE_NAME)),
                (ExportFormat::Xlsx, PathBuf::from("a.xlsx")),
            ]
        );
    }

    #[test]
    fn test_render_prompt() {
        let args = PromptArgs {
            message: Some("Big sale".to_string()),
            message_file: None,
            parameters: "Shorter".to_string(),
        };
        let prompt = render_prompt(&args).expect("no io error").expect("prompt");
        assert!(prompt.contains("Big sale"));
        assert!(prompt.contains("Shorter"));

        let empty = PromptArgs {
            message: Some("  ".to_string()),
            message_file: None,
            parameters: String::new(),
        };
        assert!(render_prompt(&empty).expect("no io error").is_none());
    }

    fn export_args(argv: &[&str]) -> ExportArgs {
        let mut full = vec!["variant-forge", "export"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).expect("should parse").command {
            Commands::Export(args) => args,
            _ => panic!("Expected Export command"),
        }
    }

    #[test]
    fn test_export_command_parses() {
        let args = export_args(&["-i", "results.json"]);
        assert_eq!(args.input, PathBuf::from("results.json"));
        assert!(args.output.is_none());
        assert_eq!(args.format, ExportFormat::Csv);

        let args = export_args(&["-i", "results.json", "-f", "xlsx", "-o", "out/a.csv"]);
        assert_eq!(args.format, ExportFormat::Xlsx);
        assert_eq!(args.output, Some(PathBuf::from("out/a.csv")));

        assert!(Cli::try_parse_from(["variant-forge", "export", "-i", "r.json", "-f", "ods"]).is_err());
        assert!(Cli::try_parse_from(["variant-forge", "export"]).is_err());
    }

    #[test]
    fn test_export_destination() {
        // An explicit path decides the format
        let (format, path) =
            export_destination(&export_args(&["-i", "r.json", "-f", "csv", "-o", "a.XLSX"]))
                .expect("known extension");
        assert_eq!(format, ExportFormat::Xlsx);
        assert_eq!(path, PathBuf::from("a.XLSX"));

        let (format, path) = export_destination(&export_args(&["-i", "r.json", "-f", "xlsx"]))
            .expect("cwd available");
        assert_eq!(format, ExportFormat::Xlsx);
        assert!(path.ends_with(XLSX_FILE_NAME));

        let err = export_destination(&export_args(&["-i", "r.json", "-o", "a.txt"])).unwrap_err();
        assert!(err.to_string().contains("a.txt"));
    }

    #[test]
    fn test_load_saved_rows_shapes() {
        let dir = TempDir::new().expect("temp dir");

        let generation = dir.path().join("generation.json");
        fs::write(
            &generation,
            r#"{"model": "m", "failed": 0, "exported": [], "rows": [{"variation_name": "A", "message": "Hi"}]}"#,
        )
        .expect("write");
        assert_eq!(
            load_saved_rows(&generation).expect("valid"),
            vec![ExportRow::new("A", "Hi")]
        );

        let bare = dir.path().join("rows.json");
        fs::write(&bare, r#"[{"variation_name": "B", "message": "Yo"}]"#).expect("write");
        assert_eq!(load_saved_rows(&bare).expect("valid"), vec![ExportRow::new("B", "Yo")]);

        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"rows": 3}"#).expect("write");
        assert!(load_saved_rows(&bad).is_err());
    }

    #[tokio::test]
    async fn test_export_command_writes_file() {
        let dir = TempDir::new().expect("temp dir");
        let input = dir.path().join("results.json");
        fs::write(
            &input,
            r#"{"rows": [{"variation_name": "Promo, v2", "message": "Buy now"}]}"#,
        )
        .expect("write");
        let output = dir.path().join("out.csv");

        let input_arg = input.display().to_string();
        let output_arg = output.display().to_string();
        let cli = Cli::try_parse_from(["variant-forge", "export", "-i", &input_arg, "-o", &output_arg])
            .expect("should parse");
        run_with_cli(cli).await.expect("export succeeds");

        let content = fs::read_to_string(&output).expect("read back");
        assert_eq!(content, "Variation,Message\n\"Promo, v2\",Buy now\n");
    }

    #[tokio::test]
    async fn test_export_command_empty_rows_is_non_fatal() {
        let dir = TempDir::new().expect("temp dir");
        let input = dir.path().join("results.json");
        fs::write(&input, "[]").expect("write");
        let output = dir.path().join("out.xlsx");

        let input_arg = input.display().to_string();
        let output_arg = output.display().to_string();
        let cli = Cli::try_parse_from(["variant-forge", "export", "-i", &input_arg, "-o", &output_arg])
            .expect("should parse");
        run_with_cli(cli).await.expect("nothing to export is a warning");
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_generate_without_message_is_non_fatal() {
        let cli = Cli::try_parse_from(["variant-forge", "generate", "-v", "A=short"])
            .expect("should parse");
        run_with_cli(cli).await.expect("input warnings do not fail");
    }
}
