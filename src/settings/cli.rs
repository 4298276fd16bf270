use super::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(name = "tokenward", about = "Manage an authenticated API session")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and persist the issued credentials.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "TOKENWARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Notify the server and drop local credentials.
    Logout,
    /// Report whether the stored session is usable.
    Status,
    /// Print a valid access token, refreshing it if needed.
    Token,
    /// GET a URL with the session's authorization header.
    Fetch { url: String },
}
