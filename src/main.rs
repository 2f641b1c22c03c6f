mod cli;
mod commands;
mod config;
mod engine;
mod resource;
mod runner;
mod schema;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use declarative::{EXIT_INTERNAL, EXIT_INTERRUPTED, EXIT_OK};
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: Option<String>,
}

fn main() -> ExitCode {
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

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
    };

    match dispatch(&ctx, cli.command) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            ui::error(&format!("{e:#}"));
            ExitCode::from(EXIT_INTERNAL)
        }
    }
}

fn dispatch(ctx: &Context, command: Command) -> Result<u8> {
    match command {
        Command::Run(args) => commands::run::run(ctx, &args, interrupt_flag()),
        Command::Plan(args) => commands::plan::run(ctx, &args),
        Command::List(args) => commands::list::run(ctx, &args),
        Command::Check => commands::check::run(ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "onboard", &mut io::stdout());
            Ok(EXIT_OK)
        }
    }
}

/// Install the Ctrl-C handler.
///
/// The first interrupt asks the run to stop after the current declaration;
/// a second one exits at once.
fn interrupt_flag() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    let installed = ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            std::process::exit(i32::from(EXIT_INTERRUPTED));
        }
        log::warn!("Interrupted, stopping after the current declaration");
    });
    if let Err(e) = installed {
        log::warn!("Could not install the interrupt handler: {e}");
    }
    cancel
}
