use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vault_relink::{Cli, Command, Overrides, Settings};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> vault_relink::Result<()> {
    let stages = match &cli.command {
        Command::Run { stages, .. } if !stages.is_empty() => Some(stages.clone()),
        _ => None,
    };
    let overrides = Overrides {
        root: cli.root,
        new_files_folder: cli.new_files,
        log_file: cli.log,
        stages,
        skip_hidden: cli.skip_hidden.then_some(true),
    };
    let settings = Settings::load(cli.config.as_deref(), overrides)?;

    match cli.command {
        Command::Run { interactive, .. } => cmd::run::run(settings, interactive, cli.json),
        Command::Check => cmd::check::run(&settings, cli.json),
        Command::Index => cmd::index::run(&settings, cli.json),
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vault_relink={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

mod cmd {
    pub mod check;
    pub mod index;
    pub mod run;
}
