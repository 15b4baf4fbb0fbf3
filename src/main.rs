use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Load the dog breed catalogue into the configured warehouse.
#[derive(Debug, Parser)]
#[command(name = "breedflow", version, about)]
struct Cli {
    /// Path of the .env file [default: <project-root>/.env]
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Directory relative paths are resolved against [default: current directory]
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    breedflow::core::logging::init(&cli.log_level);

    let project_root = match cli.project_root {
        Some(root) => root,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::error!(error = %e, "cannot determine the current directory");
                return ExitCode::FAILURE;
            }
        },
    };

    match breedflow::run_from_environment(cli.env_file.as_deref(), &project_root).await {
        Ok(result) => {
            tracing::info!(status = %result.status, dataset = %result.dataset, "done");
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let cli = Cli::parse_from(["breedflow", "--env-file", "/tmp/x.env", "--log-level", "debug"]);
        assert_eq!(cli.env_file, Some(PathBuf::from("/tmp/x.env")));
        assert_eq!(cli.project_root, None);
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn defaults_to_info() {
        let cli = Cli::parse_from(["breedflow"]);
        assert_eq!(cli.log_level, "info");
    }
}
