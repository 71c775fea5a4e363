//! Tacboard CLI entry point.

use clap::Parser;
use std::process::ExitCode;
use tacboard::cli::commands;
use tacboard::cli::{Cli, Commands};
use tacboard::error::Error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.silent {
        tacboard::SILENT.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let board = cli.board.as_ref();
    let actor = cli.actor.as_deref();

    match &cli.command {
        Commands::Init {
            block_start,
            mission,
            callsign,
            force,
        } => commands::init::execute(board, actor, *block_start, mission, callsign, *force, json),
        Commands::Export { dir } => commands::export::execute(dir.as_ref(), board, actor, json),
        Commands::Status => commands::status::execute(board, actor, json),
        Commands::Live => commands::live::execute(board, actor, json),
        Commands::Completions { shell } => commands::completions::execute(shell),
        Commands::Version => commands::version::execute(json),

        // Everything else edits the board
        command => commands::run_on_board(command, board, actor, json),
    }
}
