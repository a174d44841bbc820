mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use appstager_lib::consts::DEFAULT_RUNTIMES_URL;
use cmd::{StageArgs, cmd_stage};
use output::{OutputFormat, print_error};

/// Stage a Go app and the packages it imports for deployment
#[derive(Parser)]
#[command(name = "go-app-stager")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Deployment descriptor of the service (commonly app.yaml)
  service_yaml: PathBuf,

  /// Directory holding the app's main package
  app_dir: PathBuf,

  /// Directory the staged tree is written to
  staged_dir: PathBuf,

  /// Go version to stage for, as 1.N (overrides the descriptor)
  #[arg(long, value_name = "X.Y")]
  go_version: Option<String>,

  /// Runtime catalog consulted for unpinned flexible apps
  #[arg(long, value_name = "URL", default_value = DEFAULT_RUNTIMES_URL)]
  flex_runtimes_url: String,

  /// Enable verbose output
  #[arg(short, long)]
  verbose: bool,

  /// Output format
  #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let args = StageArgs {
    service_yaml: cli.service_yaml,
    app_dir: cli.app_dir,
    staged_dir: cli.staged_dir,
    go_version: cli.go_version,
    flex_runtimes_url: cli.flex_runtimes_url,
  };

  match cmd_stage(&args, cli.output) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{err:#}"));
      ExitCode::FAILURE
    }
  }
}
