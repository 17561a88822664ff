//! Config subcommand handlers.

use netcounter_config::{self as config, Config};

use super::Ctx;
use crate::cli::{ConfigArgs, ConfigCommand};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, ctx: &Ctx) -> Result<(), CliError> {
    let path = ctx.config_path.clone().unwrap_or_else(config::config_path);

    match args.command {
        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), ctx.quiet);
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config(Some(&path))?;
            let text = toml::to_string_pretty(&cfg)?;
            let text = text.trim_end();
            let out = output::render(ctx.output, &cfg, |_| text.to_owned(), |_| text.to_owned())?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            let written = config::save_config(&Config::default(), Some(&path))?;
            tracing::info!(path = %written.display(), "config written");
            output::print_output(
                &format!("Wrote default config to {}", written.display()),
                ctx.quiet,
            );
            Ok(())
        }
    }
}
