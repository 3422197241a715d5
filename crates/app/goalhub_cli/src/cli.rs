use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// GoalHub command-line client.
#[derive(Parser, Debug)]
#[command(name = "goalhub", about = "GoalHub command-line client", version)]
pub struct Cli {
    /// API base URL (defaults to GOALHUB_API_URL or http://localhost:8000/api/v1/).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory holding the persisted session (defaults to GOALHUB_DATA_DIR).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Session(SessionCommand),

    /// Print the version.
    Version,
}

/// Commands that run against the persisted session.
#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Log in and persist the session token.
    Login {
        #[arg(long, short)]
        username: String,

        #[arg(long, short, env = "GOALHUB_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log out; the local session is cleared even if the backend call fails.
    Logout,

    /// Show the logged-in user. Requires a session.
    Whoami,

    /// Show whether a persisted session was restored.
    Status,

    /// Send a raw API request through the pipeline. Requires a session.
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE).
        method: String,

        /// Path relative to the API base URL, e.g. `groups/`.
        path: String,

        /// JSON body, camelCase keys.
        #[arg(long, short)]
        data: Option<String>,
    },
}
