///! Local configuration commands

use super::Context;
use crate::output;
use anyhow::Result;
use clap::Subcommand;
use sxtln_common::config::set_config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show one config value (token, apikey, output)
    Get {
        #[arg(short, long)]
        key: String,
    },
    /// Set a config value; omitting the value clears it
    Set {
        #[arg(short, long)]
        key: String,
        value: Option<String>,
    },
    /// Show the whole config
    View,
}

pub fn handle_config_command(command: ConfigCommands, ctx: &mut Context) -> Result<()> {
    match command {
        ConfigCommands::Get { key } => {
            let result = ctx.config.get(&key);
            output::print_single(&result, ctx.output_format())?;
        }
        ConfigCommands::Set { key, value } => {
            let result = set_config(&mut ctx.config, &ctx.store, &key, value.as_deref())?;
            output::print_single(&result, ctx.output_format())?;
        }
        ConfigCommands::View => {
            let result = ctx.config.to_document()?;
            output::print_single(&result, ctx.output_format())?;
        }
    }
    Ok(())
}
