//! rawdroid command-line entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use rawdroid::build::BuildError;
use rawdroid::commands::{self, Options, Step};
use rawdroid::core::RawdroidError;

#[derive(Debug, Parser)]
#[command(name = "rawdroid", version, about = "Build native C Android apps without Gradle")]
struct Cli {
    /// Steps to run in order; defaults to `build`, or `build push` when signed
    #[arg(value_enum)]
    steps: Vec<Step>,

    /// Project directory
    #[arg(short = 'C', long, default_value = ".")]
    project_dir: PathBuf,

    /// Configuration file [default: <project-dir>/rawdroid.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Re-pack, sign and align the package
    #[arg(long)]
    signed: bool,

    /// Print tool invocations without running them
    #[arg(long)]
    dry_run: bool,

    /// Device serial passed to adb
    #[arg(short, long)]
    device: Option<String>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Exit status of a failed run, the failing tool's own code when known
fn exit_code(err: &anyhow::Error) -> u8 {
    let code = if let Some(e) = err.downcast_ref::<BuildError>() {
        e.exit_code()
    } else if let Some(e) = err.downcast_ref::<RawdroidError>() {
        e.exit_code()
    } else {
        1
    };
    u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = Options {
        project_dir: cli.project_dir,
        config: cli.config,
        signed: cli.signed,
        dry_run: cli.dry_run,
        device: cli.device,
    };

    match commands::execute(&cli.steps, &options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}
