use clap::Parser;
use filetimes_lib::codec::DocumentFormat;
use filetimes_lib::{run, HistoryBackend, Mode, RunSettings};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Sync file modification times with git history, or document them.
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = None,
    after_help = "Examples:\n  filetimes . document file_times.json\n  filetimes . document file_times.csv\n  filetimes . adjust\n  filetimes . restore file_times.json"
)]
struct Cli {
    /// Directory to scan or restore into.
    directory: PathBuf,
    #[arg(value_enum)]
    mode: Mode,
    /// Output document for `document`, input document for `restore`.
    document: Option<PathBuf>,
    /// Force a document format instead of guessing from the extension.
    #[arg(long, value_enum)]
    format: Option<DocumentFormat>,
    /// How to query git history.
    #[arg(long, value_enum, default_value_t = HistoryBackend::GitCli)]
    backend: HistoryBackend,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .format_level(false)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let outcome = RunSettings::resolve(
        &cli.directory,
        cli.mode,
        cli.document.as_deref(),
        cli.format,
        cli.backend,
    )
    .and_then(|settings| run(&settings));

    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
