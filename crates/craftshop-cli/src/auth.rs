//! Session command handlers.

use clap::Subcommand;
use craftshop_api::{Credentials, SignupRequest};

use crate::App;

/// Sub-commands available under `auth`.
#[derive(Debug, Subcommand)]
pub enum AuthCommands {
    /// Log in and remember the tokens
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CRAFTSHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CRAFTSHOP_PASSWORD", hide_env_values = true)]
        password: String,
        /// Must match --password
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the user remembered locally
    Whoami,
    /// Fetch the profile from the API
    Profile,
}

pub(crate) async fn run(app: &App, command: AuthCommands) -> anyhow::Result<()> {
    let session = app.catalog.session();
    match command {
        AuthCommands::Login { email, password } => {
            let user = session.login(&Credentials { email, password }).await?;
            println!("logged in as {} <{}>", user.full_name, user.email);
        }
        AuthCommands::Signup {
            email,
            password,
            confirm_password,
            first_name,
            last_name,
        } => {
            let request = SignupRequest {
                email,
                password,
                confirm_password,
                first_name,
                last_name,
            };
            let user = session.signup(&request).await?;
            println!("account created for {} <{}>", user.full_name, user.email);
        }
        AuthCommands::Logout => {
            session.logout()?;
            println!("logged out");
        }
        AuthCommands::Whoami => match session.user() {
            Some(user) => {
                println!("{} <{}>", user.full_name, user.email);
                if let Some(joined) = user.date_joined {
                    println!("joined {joined}");
                }
            }
            None => println!("not logged in"),
        },
        AuthCommands::Profile => {
            let profile = session.profile().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }
    Ok(())
}
