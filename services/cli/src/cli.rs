use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pet_adoption::adoption::{AdoptionRepository, FileStore};
use pet_adoption::config::AppConfig;
use pet_adoption::error::AppError;
use pet_adoption::telemetry;
use tracing::info;

use crate::console::{Console, Prompter};
use crate::report::{run_report, ReportArgs};

#[derive(Parser, Debug)]
#[command(
    name = "pet-adoption",
    about = "Manage pets, adopters, and adoption applications from the terminal",
    version
)]
struct Cli {
    /// Directory holding users.dat, pets.dat, and applications.dat (overrides ADOPTION_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the interactive session (default command)
    Run,
    /// Print pet, user, and application counts
    Report(ReportArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }
    telemetry::init(&config.telemetry)?;

    info!(
        environment = ?config.environment,
        data_dir = %config.storage.data_dir.display(),
        "starting pet adoption registry"
    );
    let store = FileStore::new(&config.storage.data_dir);
    let mut repository = AdoptionRepository::open(store, config.policy)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            let prompter = Prompter::new(stdin.lock(), stdout.lock(), config.session.max_attempts);
            Console::new(&mut repository, prompter).run()?;
            Ok(())
        }
        Command::Report(args) => run_report(&repository, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportFormat;

    #[test]
    fn defaults_to_interactive_session() {
        let cli = Cli::try_parse_from(["pet-adoption"]).expect("parses");
        assert!(cli.command.is_none());
        assert!(cli.data_dir.is_none());
    }

    #[test]
    fn report_accepts_format_date_and_data_dir() {
        let cli = Cli::try_parse_from([
            "pet-adoption",
            "report",
            "--format",
            "json",
            "--today",
            "2025-03-01",
            "--data-dir",
            "/tmp/shelter",
        ])
        .expect("parses");

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/shelter")));
        match cli.command {
            Some(Command::Report(args)) => {
                assert_eq!(args.format, ReportFormat::Json);
                assert_eq!(
                    args.today,
                    chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
                );
            }
            other => panic!("expected report command, got {other:?}"),
        }
    }

    #[test]
    fn report_rejects_malformed_date() {
        assert!(Cli::try_parse_from(["pet-adoption", "report", "--today", "03/01/2025"]).is_err());
    }
}
