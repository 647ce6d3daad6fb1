//! Command-line interface for the GCM server binary.

use clap::{Args, Parser, Subcommand};

use gcm_entity::user::UserRole;

/// GCM server: city maps catalog with login lockout and approval workflows.
#[derive(Debug, Parser)]
#[command(name = "gcm-server", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.toml` and environment overlays
    #[arg(short, long, default_value = "config")]
    pub config_dir: String,

    /// Environment overlay to load (`config/{env}.toml`)
    #[arg(short, long, env = "GCM_ENV", default_value = "development")]
    pub env: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands. Without one the server starts.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run migrations and start the TCP server
    Serve(ServeArgs),
    /// Apply pending database migrations and exit
    Migrate,
    /// Create an account
    CreateUser(CreateUserArgs),
}

/// Arguments for `serve`.
#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Override `server.port`
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Skip running migrations on startup
    #[arg(long)]
    pub skip_migrations: bool,
}

/// Arguments for `create-user`.
#[derive(Debug, Args)]
pub struct CreateUserArgs {
    /// Login name (case-insensitive)
    #[arg(short, long)]
    pub username: String,

    /// Initial password
    #[arg(short, long)]
    pub password: String,

    /// Name shown to other users; defaults to the username
    #[arg(short, long)]
    pub display_name: Option<String>,

    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// One of customer, employee, content_manager, company_manager
    #[arg(short, long, default_value = "customer", value_parser = parse_role)]
    pub role: UserRole,
}

fn parse_role(value: &str) -> Result<UserRole, String> {
    value.parse::<UserRole>().map_err(|e| e.message)
}
