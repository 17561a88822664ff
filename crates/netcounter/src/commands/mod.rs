//! Command handlers and the context they share.

pub mod config_cmd;
pub mod replay;

use std::path::PathBuf;

use clap::{CommandFactory, ValueEnum};

use crate::cli::{Cli, ColorMode, Command, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Global options resolved against the config file's `[defaults]`.
#[derive(Debug)]
pub struct Ctx {
    pub config_path: Option<PathBuf>,
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Ctx {
    /// Flags win over `[defaults]`; an unreadable config falls back to
    /// built-in defaults here and is reported by the command that needs it.
    pub fn resolve(global: &GlobalOpts) -> Self {
        let cfg = netcounter_config::load_config_or_default(global.config.as_deref());

        let output = global
            .output
            .or_else(|| OutputFormat::from_str(&cfg.defaults.output, true).ok())
            .unwrap_or(OutputFormat::Table);
        let color = global
            .color
            .or_else(|| ColorMode::from_str(&cfg.defaults.color, true).ok())
            .unwrap_or(ColorMode::Auto);

        Self {
            config_path: global.config.clone(),
            output,
            color: output::should_color(color),
            quiet: global.quiet,
        }
    }
}

pub fn dispatch(cmd: Command, ctx: &Ctx) -> Result<(), CliError> {
    match cmd {
        Command::Replay(args) => replay::handle(&args, ctx),
        Command::Config(args) => config_cmd::handle(&args, ctx),
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "netcounter", &mut std::io::stdout());
            Ok(())
        }
    }
}
