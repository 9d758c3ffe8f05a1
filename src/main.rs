use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use research_integrity::config::{find_config_file, get_config, load_config, save_config, LoggingConfig};
use research_integrity::engine::export::render_text;
use research_integrity::mcp::server::McpServer;
use research_integrity::models::{
    AcademicLevel, CheckStatus, CheckType, Citation, CitationStyle, Document, ExternalSources,
    IntegrityCheck, Paradigm, QuickScore, ValidationContext, ValidationResult,
};
use research_integrity::{ui, Config, IntegrityEngine, ReportFormat};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Research Integrity - Validate academic documents for plagiarism, citation and data problems
#[derive(Parser, Debug)]
#[command(name = "research-integrity")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate academic documents for plagiarism, citation and data integrity", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of .txt/.md known texts for plagiarism checks
    #[arg(long, global = true, value_name = "DIR")]
    known_sources: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CheckTypeArg {
    Full,
    Plagiarism,
    Citations,
    Data,
    Quick,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ReportArg {
    Json,
    Html,
    Pdf,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StyleArg {
    Apa,
    Mla,
    Chicago,
    Ieee,
    Harvard,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ParadigmArg {
    Quantitative,
    Qualitative,
    Mixed,
    Theoretical,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LevelArg {
    Undergraduate,
    Masters,
    Doctoral,
    Faculty,
}

/// Validation context options shared by the document commands
#[derive(Args, Debug, Clone)]
struct ContextArgs {
    /// Read the full validation context from a JSON file (other context flags are ignored)
    #[arg(long)]
    context: Option<PathBuf>,

    /// Document identifier (defaults to the file name)
    #[arg(long)]
    document_id: Option<String>,

    /// Academic discipline (e.g., "psychology")
    #[arg(long, default_value = "")]
    discipline: String,

    /// Citation style
    #[arg(long, value_enum, default_value_t = StyleArg::Apa)]
    style: StyleArg,

    /// Research paradigm
    #[arg(long, value_enum, default_value_t = ParadigmArg::Quantitative)]
    paradigm: ParadigmArg,

    /// Academic level of the author
    #[arg(long, value_enum, default_value_t = LevelArg::Doctoral)]
    level: LevelArg,

    /// Allow external lookups (DOI registry, CrossRef, remote source index)
    #[arg(long)]
    external: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an integrity check on a document
    #[command(alias = "v")]
    Validate {
        /// Document file (JSON document, or plain text / markdown content)
        file: PathBuf,

        /// Which rules to run
        #[arg(long, value_enum, default_value_t = CheckTypeArg::Full)]
        check_type: CheckTypeArg,

        /// Print the rendered report in this format instead of the summary
        #[arg(long, value_enum)]
        report: Option<ReportArg>,

        /// Exit with a non-zero status when the document does not pass
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Check a document's text against known sources
    Plagiarism {
        /// Document file
        file: PathBuf,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Validate a reference list
    Citations {
        /// JSON file holding a document or an array of citations
        file: PathBuf,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Validate a document's data record against its schema
    Data {
        /// JSON document with `data` and `data_schema`
        file: PathBuf,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Cheap local integrity estimate
    #[command(alias = "q")]
    Quick {
        /// Document file
        file: PathBuf,
    },

    /// List validation rules
    Rules,

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run the MCP server
    Serve {
        /// Use streamable HTTP instead of stdio
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, default_value_t = 3000)]
        port: u16,

        /// Host for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write the default configuration to a file
    Init {
        /// Destination path
        #[arg(default_value = "research-integrity.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl From<CheckTypeArg> for CheckType {
    fn from(arg: CheckTypeArg) -> Self {
        match arg {
            CheckTypeArg::Full => CheckType::Full,
            CheckTypeArg::Plagiarism => CheckType::Plagiarism,
            CheckTypeArg::Citations => CheckType::Citations,
            CheckTypeArg::Data => CheckType::Data,
            CheckTypeArg::Quick => CheckType::Quick,
        }
    }
}

impl From<ReportArg> for ReportFormat {
    fn from(arg: ReportArg) -> Self {
        match arg {
            ReportArg::Json => ReportFormat::Json,
            ReportArg::Html => ReportFormat::Html,
            ReportArg::Pdf => ReportFormat::Pdf,
        }
    }
}

impl ContextArgs {
    /// Build the validation context for `file`
    fn resolve(&self, file: &Path) -> Result<ValidationContext> {
        if let Some(path) = &self.context {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read context file {}", path.display()))?;
            return serde_json::from_str(&text)
                .with_context(|| format!("Invalid context file {}", path.display()));
        }

        let document_id = self.document_id.clone().unwrap_or_else(|| {
            file.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string())
        });

        let style = match self.style {
            StyleArg::Apa => CitationStyle::Apa,
            StyleArg::Mla => CitationStyle::Mla,
            StyleArg::Chicago => CitationStyle::Chicago,
            StyleArg::Ieee => CitationStyle::Ieee,
            StyleArg::Harvard => CitationStyle::Harvard,
        };
        let paradigm = match self.paradigm {
            ParadigmArg::Quantitative => Paradigm::Quantitative,
            ParadigmArg::Qualitative => Paradigm::Qualitative,
            ParadigmArg::Mixed => Paradigm::Mixed,
            ParadigmArg::Theoretical => Paradigm::Theoretical,
        };
        let level = match self.level {
            LevelArg::Undergraduate => AcademicLevel::Undergraduate,
            LevelArg::Masters => AcademicLevel::Masters,
            LevelArg::Doctoral => AcademicLevel::Doctoral,
            LevelArg::Faculty => AcademicLevel::Faculty,
        };
        let external = if self.external {
            ExternalSources::all()
        } else {
            ExternalSources::default()
        };

        Ok(ValidationContext::new(document_id)
            .discipline(self.discipline.clone())
            .citation_style(style)
            .paradigm(paradigm)
            .academic_level(level)
            .external_sources(external))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load a document: JSON files are parsed as documents, anything else is content
fn load_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if is_json(path) {
        serde_json::from_str(&text).with_context(|| format!("Invalid document file {}", path.display()))
    } else {
        Ok(Document::new(text))
    }
}

/// Load citations from a JSON array or from a document's reference list
fn load_citations(path: &Path) -> Result<Vec<Citation>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))?;

    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else {
        let document: Document = serde_json::from_value(value)?;
        Ok(document.citations)
    }
}

/// Print all available environment variables
fn print_env_vars() {
    println!("Research Integrity - Environment Variables");
    println!();
    println!("External Sources:");
    println!("  RESEARCH_INTEGRITY_MAILTO   Contact email for CrossRef's polite pool");
    println!();
    println!("Configuration Overrides (prefix RESEARCH_INTEGRITY_, sections joined with __):");
    println!("  RESEARCH_INTEGRITY_SCORING__PASS_THRESHOLD        Overall pass threshold (default: 70)");
    println!("  RESEARCH_INTEGRITY_SCORING__RULE_TIMEOUT_SECS     Per-rule timeout in seconds (default: 60)");
    println!("  RESEARCH_INTEGRITY_GOVERNOR__DEFAULT_QUOTA        External calls per window (default: 30)");
    println!("  RESEARCH_INTEGRITY_GOVERNOR__FAILURE_THRESHOLD    Failures before a circuit opens (default: 5)");
    println!("  RESEARCH_INTEGRITY_GOVERNOR__COOLDOWN_SECS        Circuit cooldown in seconds (default: 60)");
    println!("  RESEARCH_INTEGRITY_SOURCES__DOI_RESOLVER_URL      DOI resolver base URL");
    println!("  RESEARCH_INTEGRITY_SOURCES__CROSSREF_API_URL      CrossRef API base URL");
    println!("  RESEARCH_INTEGRITY_SOURCES__KNOWN_SOURCES_DIR     Directory of known texts for plagiarism checks");
    println!("  RESEARCH_INTEGRITY_LOGGING__FORMAT                Set to \"json\" for structured logs");
    println!();
    println!("Global Proxy Settings:");
    println!("  HTTP_PROXY                  HTTP proxy URL (e.g., http://proxy:8080)");
    println!("  HTTPS_PROXY                 HTTPS proxy URL (e.g., https://proxy:8080)");
    println!("  NO_PROXY                    Comma-separated list of hosts to bypass proxy");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                    Rust logging level (e.g., debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export RESEARCH_INTEGRITY_MAILTO=\"you@example.org\"");
    println!("  export RESEARCH_INTEGRITY_SCORING__PASS_THRESHOLD=\"80\"");
    std::process::exit(0);
}

/// Initialize tracing; logs go to stderr so stdout stays clean for output and stdio MCP
fn init_tracing(verbose: u8, quiet: bool, logging: &LoggingConfig) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let json = logging.format.as_deref() == Some("json");

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("research_integrity={}", level)),
        ))
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
    }

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = match &config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => get_config(),
    };
    if let Some(dir) = &cli.known_sources {
        config.sources.known_sources_dir = Some(dir.clone());
    }

    init_tracing(cli.verbose, cli.quiet, &config.logging);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let format = resolve_format(cli.output);

    match cli.command {
        Some(Commands::Validate {
            file,
            check_type,
            report,
            strict,
            context,
        }) => {
            let document = load_document(&file)?;
            let ctx = context.resolve(&file)?;
            let engine = IntegrityEngine::new(config)?;

            let check_id = engine.submit_check(document, ctx, check_type.into())?;
            tracing::debug!("Submitted check {}", check_id);

            let spinner = (format == OutputFormat::Table && !cli.quiet)
                .then(|| ui::Spinner::new("Running integrity check..."));
            let check = engine.wait_for_completion(&check_id).await?;
            if let Some(spinner) = &spinner {
                if check.status == CheckStatus::Completed {
                    spinner.finish_with_success("Check completed");
                } else {
                    spinner.finish_with_error("Check failed");
                }
            }

            match report {
                Some(report_format) => {
                    let exported = engine.generate_integrity_report(&check_id, report_format.into())?;
                    println!("{}", exported.content);
                }
                None => output_check(&check, format)?,
            }

            let passed = check.report.as_ref().is_some_and(|r| r.passed);
            if strict && !passed {
                std::process::exit(1);
            }
        }

        Some(Commands::Plagiarism { file, context }) => {
            let document = load_document(&file)?;
            let ctx = context.resolve(&file)?;
            let engine = IntegrityEngine::new(config)?;

            let result = engine.detect_plagiarism(&document.content, &ctx).await?;
            output_result(&result, format)?;
        }

        Some(Commands::Citations { file, context }) => {
            let citations = load_citations(&file)?;
            let ctx = context.resolve(&file)?;
            let engine = IntegrityEngine::new(config)?;

            if !cli.quiet {
                eprintln!("Validating {} citations", citations.len());
            }
            let result = engine.validate_citations(citations, &ctx).await?;
            output_result(&result, format)?;
        }

        Some(Commands::Data { file, context }) => {
            let document = load_document(&file)?;
            if document.data_schema.is_empty() {
                anyhow::bail!("{} has no data_schema to check against", file.display());
            }
            let ctx = context.resolve(&file)?;
            let engine = IntegrityEngine::new(config)?;

            let result = engine
                .validate_data_consistency(document.data, document.data_schema, &ctx)
                .await?;
            output_result(&result, format)?;
        }

        Some(Commands::Quick { file }) => {
            let document = load_document(&file)?;
            let engine = IntegrityEngine::new(config)?;

            let quick = engine.get_quick_integrity_score(&document.content);
            output_quick(&quick, format)?;
        }

        Some(Commands::Rules) => {
            let engine = IntegrityEngine::new(config)?;
            let rules = engine.list_rules();

            match format {
                OutputFormat::Json => print_json(&rules)?,
                OutputFormat::Plain => {
                    for rule in &rules {
                        let state = if rule.enabled { "enabled" } else { "disabled" };
                        println!("{} - {} ({:.2}, {})", rule.id, rule.name, rule.weight, state);
                    }
                }
                _ => println!("{}", ui::rules_table(&rules)),
            }
        }

        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Init { path, force } => {
                if path.exists() && !force {
                    anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
                }
                save_config(&Config::default(), &path)?;
                if !cli.quiet {
                    ui::print_status(
                        ui::Status::Success,
                        &format!("Wrote default configuration to {}", path.display()),
                    );
                }
            }
        },

        Some(Commands::Serve { http, port, host }) => {
            let engine = Arc::new(IntegrityEngine::new(config)?);
            let server = McpServer::new(engine)?;

            if http {
                let addr = format!("{}:{}", host, port);
                tracing::info!("Running MCP server in HTTP mode on {}", addr);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                // Wait for the server to finish
                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                tracing::info!("Running MCP server in stdio mode");
                server.run().await?;
            }
        }

        None => {
            // No command provided - show help
            println!("No command provided. Use --help for usage information.");
            println!("Common commands:");
            println!("  validate <file>    - Run a full integrity check");
            println!("  quick <file>       - Cheap local integrity estimate");
            println!("  citations <file>   - Validate a reference list");
            println!("  rules              - List validation rules");
            println!("  serve              - Run MCP server");
        }
    }

    Ok(())
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn output_check(check: &IntegrityCheck, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(check)?,
        OutputFormat::Plain => print!("{}", render_text(check)),
        _ => ui::print_check(check),
    }
    Ok(())
}

fn output_result(result: &ValidationResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(result)?,
        OutputFormat::Plain => {
            println!(
                "{}: score {:.1}, confidence {:.0}",
                result.rule_id, result.score, result.confidence
            );
            for issue in &result.issues {
                println!(
                    "  [{}] {} {}: {}",
                    issue.severity.id(),
                    issue.id,
                    issue.code.id(),
                    issue.description
                );
            }
            for suggestion in &result.suggestions {
                println!("  - {}", suggestion);
            }
        }
        _ => ui::print_result(result),
    }
    Ok(())
}

fn output_quick(quick: &QuickScore, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(quick)?,
        OutputFormat::Plain => {
            println!("score {:.1}, risk {:?}", quick.score, quick.risk_level);
            for issue in &quick.quick_issues {
                println!("  - {}", issue);
            }
        }
        _ => ui::print_quick_score(quick),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["research-integrity"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert!(cli.config.is_none());
        assert!(cli.known_sources.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_known_sources_is_global() {
        let cli = Cli::parse_from(["research-integrity", "plagiarism", "essay.txt", "--known-sources", "corpus"]);
        assert_eq!(cli.known_sources, Some(PathBuf::from("corpus")));
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["research-integrity", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["research-integrity", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["research-integrity", "-o", "json"]);
        assert_eq!(cli.output, OutputFormat::Json);

        let cli = Cli::parse_from(["research-integrity", "rules", "--output", "plain"]);
        assert_eq!(cli.output, OutputFormat::Plain);
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from([
            "research-integrity",
            "validate",
            "paper.json",
            "--check-type",
            "citations",
            "--report",
            "html",
            "--style",
            "ieee",
            "--external",
            "--strict",
        ]);

        match cli.command {
            Some(Commands::Validate {
                file,
                check_type,
                report,
                strict,
                context,
            }) => {
                assert_eq!(file, PathBuf::from("paper.json"));
                assert_eq!(check_type, CheckTypeArg::Citations);
                assert_eq!(report, Some(ReportArg::Html));
                assert!(strict);
                assert_eq!(context.style, StyleArg::Ieee);
                assert!(context.external);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_command_defaults() {
        let cli = Cli::parse_from(["research-integrity", "serve"]);
        match cli.command {
            Some(Commands::Serve { http, port, host }) => {
                assert!(!http);
                assert_eq!(port, 3000);
                assert_eq!(host, "127.0.0.1");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_report_format_rejected() {
        let result = Cli::try_parse_from(["research-integrity", "validate", "a.txt", "--report", "docx"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_context_from_flags() {
        let cli = Cli::parse_from([
            "research-integrity",
            "plagiarism",
            "/tmp/thesis.md",
            "--discipline",
            "psychology",
            "--paradigm",
            "mixed",
            "--level",
            "masters",
        ]);
        let Some(Commands::Plagiarism { file, context }) = cli.command else {
            panic!("expected plagiarism command");
        };

        let ctx = context.resolve(&file).unwrap();
        assert_eq!(ctx.document_id, "thesis.md");
        assert_eq!(ctx.discipline, "psychology");
        assert_eq!(ctx.paradigm, Paradigm::Mixed);
        assert_eq!(ctx.academic_level, AcademicLevel::Masters);
        assert_eq!(ctx.citation_style, CitationStyle::Apa);
        assert!(!ctx.external_sources.doi);
    }

    #[test]
    fn test_load_document_text_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let text_path = dir.path().join("paper.md");
        std::fs::write(&text_path, "Plain body text").unwrap();
        let doc = load_document(&text_path).unwrap();
        assert_eq!(doc.content, "Plain body text");

        let json_path = dir.path().join("paper.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(
            file,
            r#"{{"title": "T", "content": "Body", "citations": [{{"id": "r1", "type": "journal", "title": "X"}}]}}"#
        )
        .unwrap();
        let doc = load_document(&json_path).unwrap();
        assert_eq!(doc.title.as_deref(), Some("T"));
        assert_eq!(doc.citations.len(), 1);

        let citations = load_citations(&json_path).unwrap();
        assert_eq!(citations[0].id, "r1");
    }

    #[test]
    fn test_load_citations_from_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refs.json");
        std::fs::write(
            &path,
            r#"[{"id": "a", "type": "book"}, {"id": "b", "type": "website"}]"#,
        )
        .unwrap();

        let citations = load_citations(&path).unwrap();
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[1].id, "b");
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_document(Path::new("/nonexistent/paper.txt")).is_err());
    }
}
