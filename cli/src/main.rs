use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use compdb_core::{CompileRecord, NormalizeOptions, NormalizeReport, Normalizer, Platform};
use compdb_loader::{
    CONFIG_FILE_NAME, Config, FileSource, NinjaSource, PlatformSetting, RecordSource, SourceChain,
    read_records_from, save_records, write_records,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// CLI-specific platform enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliPlatform {
    Auto,
    Windows,
    Other,
}

impl From<CliPlatform> for PlatformSetting {
    fn from(platform: CliPlatform) -> Self {
        match platform {
            CliPlatform::Auto => Self::Auto,
            CliPlatform::Windows => Self::Windows,
            CliPlatform::Other => Self::Other,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "compdb")]
#[command(about = "Normalize compile databases for clang tooling")]
#[command(version)]
struct Cli {
    /// Report per-entry problems and enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a compile database, normalize it and write it out.
    Normalize(NormalizeArgs),
    /// Normalize a single command line and print the result.
    Rewrite(RewriteArgs),
}

#[derive(Debug, Args)]
struct NormalizeArgs {
    /// Build directory containing compile_commands.json.
    #[arg(long, conflicts_with = "input")]
    build_dir: Option<PathBuf>,
    /// Compile database JSON file, or `-` for stdin.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Generate the database with `ninja -t compdb` instead of reading it.
    #[arg(long, requires = "build_dir")]
    generate: bool,
    /// When generation fails, read compile_commands.json instead.
    #[arg(long, requires = "generate")]
    fallback: bool,
    /// Ninja executable used with --generate.
    #[arg(long)]
    ninja: Option<PathBuf>,
    /// Extra ninja target (repeatable).
    #[arg(long = "target")]
    targets: Vec<String>,
    /// Platform to normalize for (default: from config, else the host).
    #[arg(long)]
    platform: Option<CliPlatform>,
    /// YAML configuration file (default: ./compdb.yml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output path (default: stdout).
    #[arg(long)]
    output: Option<PathBuf>,
    /// Print a summary of the run to stderr.
    #[arg(long)]
    report: bool,
}

#[derive(Debug, Args)]
struct RewriteArgs {
    /// Command line to normalize.
    #[arg(long)]
    command: String,
    /// Directory response files are resolved against.
    #[arg(long, default_value = ".")]
    directory: PathBuf,
    /// Source file the command compiles (used in diagnostics).
    #[arg(long, default_value = "")]
    file: String,
    /// Platform to normalize for (default: from config, else the host).
    #[arg(long)]
    platform: Option<CliPlatform>,
    /// YAML configuration file (default: ./compdb.yml when present).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Normalize(args) => run_normalize(args, cli.verbose),
        Command::Rewrite(args) => run_rewrite(args, cli.verbose),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ---------------------------------------------------------------------------
// normalize command
// ---------------------------------------------------------------------------

fn run_normalize(args: NormalizeArgs, verbose: bool) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let options = resolve_options(&config, args.platform, verbose);

    let records = match (&args.input, &args.build_dir) {
        (Some(input), _) if input.as_os_str() == "-" => {
            read_records_from(std::io::stdin().lock())
                .map_err(|e| format!("Failed to read compile database from stdin: {e}"))?
        }
        (Some(input), _) => FileSource::new(input)
            .load()
            .map_err(|e| format!("Failed to load '{}': {e}", input.display()))?,
        (None, Some(build_dir)) => {
            let source = build_source(build_dir, &args, &config);
            source
                .load()
                .map_err(|e| format!("Failed to load compile database: {e}"))?
        }
        (None, None) => {
            return Err("Specify a compile database: --build-dir or --input".to_string());
        }
    };

    let normalized = Normalizer::new(options).normalize(records);

    match &args.output {
        Some(path) => save_records(path, &normalized.records)
            .map_err(|e| format!("Failed to write '{}': {e}", path.display()))?,
        None => write_records(std::io::stdout().lock(), &normalized.records)
            .map_err(|e| format!("Failed to write compile database: {e}"))?,
    }

    if args.report {
        print_report(&normalized.report);
    }

    Ok(())
}

fn build_source(build_dir: &Path, args: &NormalizeArgs, config: &Config) -> SourceChain {
    let file = FileSource::in_build_dir(build_dir);
    if !args.generate {
        return SourceChain::new().with(file);
    }

    let mut ninja = NinjaSource::from_config(build_dir, &config.generator)
        .with_targets(args.targets.iter().cloned());
    if let Some(path) = &args.ninja {
        ninja = ninja.with_ninja(path);
    }

    let chain = SourceChain::new().with(ninja);
    if args.fallback {
        chain.with(file)
    } else {
        chain
    }
}

fn print_report(report: &NormalizeReport) {
    let platform = report.platform.unwrap_or_else(Platform::host);
    eprintln!("Normalize Summary ({platform}):");
    eprintln!("  Entries read: {}", report.records_read);
    eprintln!("  Rewritten: {}", report.rewritten);
    eprintln!("  Unmatched: {}", report.unmatched);
    eprintln!(
        "  Response files: {} expanded, {} unreadable",
        report.rsp_expanded, report.rsp_unreadable
    );
    eprintln!("  Filtered: {}", report.filtered);
    eprintln!("  Entries written: {}", report.records_written);
}

// ---------------------------------------------------------------------------
// rewrite command
// ---------------------------------------------------------------------------

fn run_rewrite(args: RewriteArgs, verbose: bool) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let options = resolve_options(&config, args.platform, verbose);

    let record = CompileRecord::new(args.directory.to_string_lossy(), args.command, args.file);
    let normalized = Normalizer::new(options).normalize(vec![record]);

    match normalized.records.first() {
        Some(record) => {
            println!("{}", record.command);
            Ok(())
        }
        None => Err(
            "Command references an excluded build artifact and was filtered out".to_string(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Loads `explicit`, or `./compdb.yml` when it exists, or the defaults.
fn load_config(explicit: Option<&Path>) -> Result<Config, String> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let implicit = PathBuf::from(CONFIG_FILE_NAME);
            if !implicit.is_file() {
                return Ok(Config::default());
            }
            implicit
        }
    };
    debug!(path = %path.display(), "Loading configuration");
    Config::load(&path).map_err(|e| format!("Failed to load config '{}': {e}", path.display()))
}

/// Command-line flags take precedence over the configuration file.
fn resolve_options(
    config: &Config,
    platform: Option<CliPlatform>,
    verbose: bool,
) -> NormalizeOptions {
    let platform = platform
        .map(PlatformSetting::from)
        .unwrap_or(config.platform)
        .resolve();
    NormalizeOptions::for_platform(platform).with_diagnostics(config.diagnostics || verbose)
}
