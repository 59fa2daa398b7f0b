use clap::{Args, Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use swiftpm_consultant::{
    validate::{normalize_output_path, validate_package},
    Config, ConsultError, Consultant, OllamaClient, Reporter, ReviewOptions,
};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "swiftpm-consultant")]
#[command(about = "AI powered tool to review swift package info")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    review: ReviewArgs,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct ReviewArgs {
    /// Mandatory. Location of the Package.swift to review
    #[arg(short, long)]
    package: Option<PathBuf>,

    /// Location of where to save the report in a .txt file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name of model [default: llama3]
    #[arg(short, long)]
    model: Option<String>,

    /// Suppress all output
    #[arg(short = 'q', long = "quiet-mode")]
    quiet_mode: bool,

    /// Only display the health score
    #[arg(short, long)]
    score_only: bool,

    /// Ollama server URL (overrides OLLAMA_HOST and the config file)
    #[arg(long)]
    host: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a default configuration file
    Config {
        /// Output path for the config file (defaults to ~/.swiftpm-consultant.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("{err:?}");
            eprintln!("{} {}", style("ERROR:").for_stderr().red().bold(), err);
            if let Some(hint) = err.hint() {
                eprintln!("{} {}", style("Hint:").for_stderr().yellow().bold(), hint);
            }
            ExitCode::from(err.exit_code())
        }
    }
}

// --verbose forces DEBUG; otherwise RUST_LOG decides, falling back to WARN.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

async fn run(cli: Cli) -> Result<(), ConsultError> {
    match cli.command {
        Some(Commands::Config { output }) => generate_config(output),
        None => review_package(cli.review).await,
    }
}

async fn review_package(args: ReviewArgs) -> Result<(), ConsultError> {
    let options = ReviewOptions {
        package: args.package,
        output: args.output.as_deref().map(normalize_output_path),
        quiet: args.quiet_mode,
        score_only: args.score_only,
    };

    let package = validate_package(options.package.as_deref())?;

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    }
    .with_cli_overrides(args.host.as_deref(), args.model.as_deref());
    tracing::debug!("Using model {} at {}", config.llm.model, config.llm.base_url);

    let client = OllamaClient::new(config.llm.clone())?;
    let consultant = Consultant::new(client, &config).with_progress(options.is_interactive());
    let review = consultant.review(&package).await?;

    let reporter = Reporter::new();
    if !options.quiet {
        if options.score_only {
            println!("{}", reporter.render_score(&review));
        } else {
            println!("{}", reporter.render_review(&review));
        }
    }

    let saved_to = match &options.output {
        Some(path) => Some(reporter.export_report(&review, path)?),
        None => None,
    };

    if options.is_interactive() {
        println!("{}", reporter.render_footer(saved_to.as_deref()));
    }

    Ok(())
}

fn generate_config(output_path: Option<PathBuf>) -> Result<(), ConsultError> {
    let config_path = match output_path {
        Some(path) => path,
        None => Config::default_config_path().unwrap_or_else(|_| PathBuf::from("swiftpm-consultant.toml")),
    };

    println!("📝 Generating configuration file: {}", config_path.display());

    std::fs::write(&config_path, Config::create_documented_config())
        .map_err(|e| ConsultError::io(&config_path, e))?;

    println!("✅ Configuration file created successfully!");
    println!("💡 Edit the file to change the Ollama host, model or retry budget.");

    Ok(())
}
