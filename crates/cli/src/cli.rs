//! Argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "chefbot", version, about = "Photograph your fridge, get recipes")]
pub struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and sign in
    Signup(Credentials),
    /// Sign in with email and password
    Login(Credentials),
    /// End the current session
    Logout,
    /// Fetch the signed-in user's profile
    Whoami,
    /// Show configuration and session state
    Status,
    /// Detect ingredients in a photo and suggest recipes
    Analyze {
        /// Image file (JPEG, PNG, ...)
        image: PathBuf,
        /// Extra instructions, e.g. "vegetarian"
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Check that the backend is reachable
    Health,
}

#[derive(Debug, Clone, Args)]
pub struct Credentials {
    #[arg(long, env = "CHEFBOT_EMAIL")]
    pub email: String,
    #[arg(long, env = "CHEFBOT_PASSWORD", hide_env_values = true)]
    pub password: String,
}
