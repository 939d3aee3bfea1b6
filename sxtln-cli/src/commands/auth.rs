///! Authentication commands

use super::Context;
use crate::output;
use anyhow::Result;
use clap::Subcommand;
use sxtln_common::auth;

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Verify the active token or API key
    Check,

    /// Login to sextillion and store the session token
    Login {
        /// User name
        #[arg(short, long)]
        user: String,

        /// Password (will be prompted if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Store an API key for future calls
    SetApikey {
        /// API key
        #[arg(short = 'k', long = "key")]
        key: String,
    },

    /// Logout (clear the stored session token)
    Logout,
}

pub async fn handle_auth_command(command: AuthCommands, ctx: &mut Context) -> Result<()> {
    let format = ctx.output_format();

    match command {
        AuthCommands::Check => {
            let api = ctx.api()?;
            let result = auth::check(&api).await?;
            output::print_single(&result, format)?;
        }

        AuthCommands::Login { user, password } => {
            let password = if let Some(pwd) = password {
                pwd
            } else {
                use dialoguer::Password;
                Password::new().with_prompt("Password").interact()?
            };

            let api = ctx.api()?;
            let response = auth::login(&api, &mut ctx.config, &ctx.store, &user, &password).await?;
            output::print_single(&response, format)?;
            output::print_success("Login successful");
        }

        AuthCommands::SetApikey { key } => {
            let result = auth::set_api_key(&mut ctx.config, &ctx.store, &key)?;
            output::print_single(&result, format)?;
        }

        AuthCommands::Logout => {
            let result = auth::logout(&mut ctx.config, &ctx.store)?;
            output::print_single(&result, format)?;
        }
    }

    Ok(())
}
