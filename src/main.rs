mod cli;
mod commands;
mod engine;
mod paths;
mod schema;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use declarative::CancelToken;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Explicit `--config` path
    pub config: Option<PathBuf>,
    /// Explicit `--state` path
    pub state: Option<PathBuf>,
    /// Tripped by Ctrl-C
    pub cancel: CancelToken,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if handler_token.is_cancelled() {
            std::process::exit(130);
        }
        eprintln!("\nInterrupted, finishing in-flight requests (Ctrl-C again to abort)");
        handler_token.cancel();
    }) {
        log::warn!("Could not install Ctrl-C handler: {e}");
    }

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
        state: cli.state,
        cancel,
    };

    match cli.command {
        Command::Validate => commands::validate::run(&ctx),
        Command::Plan(args) => commands::plan::run(&ctx, args.target.as_deref()),
        Command::Apply(args) => commands::apply::run(
            &ctx,
            args.target.as_deref(),
            args.yes,
            args.dry_run,
            args.jobs as usize,
        ),
        Command::Destroy(args) => {
            commands::apply::destroy(&ctx, args.target.as_deref(), args.yes, args.jobs as usize)
        }
        Command::Refresh(args) => {
            commands::refresh::run(&ctx, args.target.as_deref(), args.jobs as usize)
        }
        Command::Show(args) => commands::show::run(&ctx, args.target.as_deref()),
        Command::Schema => commands::schema::run(&ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "modvar", &mut io::stdout());
            Ok(())
        }
    }
}
