//! ssoadm - Admin CLI for an SSO identity provider
//!
//! Usage:
//!   ssoadm create-user --first Jane --last Doe   - Create an account
//!   ssoadm recovery <username>                   - Issue a recovery link
//!   ssoadm invite --label newcomer               - Create an invitation
//!   ssoadm list [search]                         - List accounts
//!   ssoadm refresh                               - Rebuild the local cache

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ssoadm::{
    admin::{AdminService, CreateUserRequest},
    config::Config,
    crypto::CacheKey,
    provider::HttpDirectoryClient,
};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "ssoadm")]
#[command(author = "ssoadm Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Admin CLI for an SSO identity provider")]
struct Cli {
    /// Configuration file path (falls back to environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user account with a collision-free username
    CreateUser {
        /// First name
        #[arg(long, default_value = "")]
        first: String,

        /// Last name
        #[arg(long, default_value = "")]
        last: String,

        /// Explicit username (derived from the name when omitted)
        #[arg(long)]
        username: Option<String>,

        /// Email address (defaults to username@base-domain)
        #[arg(long)]
        email: Option<String>,
    },

    /// Generate a password-recovery link for a user
    Recovery {
        /// Username
        username: String,
    },

    /// Create a single-use enrollment invitation
    Invite {
        /// Invite label
        #[arg(long)]
        label: Option<String>,

        /// Expiry as RFC 3339 (defaults to 2 hours from now)
        #[arg(long)]
        expires: Option<String>,
    },

    /// List accounts, optionally filtered by a search term
    List {
        /// Search term
        search: Option<String>,
    },

    /// Rebuild the encrypted directory cache from the provider
    Refresh,

    /// Re-enable a user account
    Activate {
        /// Provider user id
        user_id: String,
    },

    /// Disable a user account
    Deactivate {
        /// Provider user id
        user_id: String,
    },

    /// Delete a user account
    Delete {
        /// Provider user id
        user_id: String,
    },

    /// Set a user's password
    SetPassword {
        /// Provider user id
        user_id: String,

        /// New password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to initialize logging")?;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env().context(
            "No --config given and environment is incomplete \
             (SSOADM_API_URL, SSOADM_API_TOKEN, SSOADM_BASE_DOMAIN)",
        )?,
    };

    let key = cache_key()?;
    let client = HttpDirectoryClient::new(&config.provider)?;
    let service = AdminService::new(client, key, config);

    run(&cli.command, &service)
}

fn run(command: &Commands, service: &AdminService<HttpDirectoryClient>) -> anyhow::Result<()> {
    match command {
        Commands::CreateUser {
            first,
            last,
            username,
            email,
        } => {
            let account = service.create_user(&CreateUserRequest {
                first_name: first.clone(),
                last_name: last.clone(),
                username: username.clone(),
                email: email.clone(),
            })?;
            println!("Created {} (id {})", account.username, account.id);
            println!("  name:  {}", account.name);
            println!("  email: {}", account.email);
        }

        Commands::Recovery { username } => {
            let link = service.recovery_link(username)?;
            println!("{}", link);
        }

        Commands::Invite { label, expires } => {
            let expires = expires
                .as_deref()
                .map(parse_expiry)
                .transpose()?;
            let invite = service.create_invite(label.as_deref(), expires)?;
            println!("{}", invite.link);
            println!("Expires: {}", invite.expires.to_rfc3339());
        }

        Commands::List { search } => {
            let users = service.list_users(search.as_deref())?;
            for user in &users {
                let status = if user.is_active { "active" } else { "disabled" };
                println!("{}\t{}\t{}\t{}", user.id, user.username, user.email, status);
            }
            println!("{} user(s)", users.len());
        }

        Commands::Refresh => {
            let snapshot = service.refresh()?;
            println!("Cached {} user(s)", snapshot.len());
        }

        Commands::Activate { user_id } => {
            service.set_user_active(user_id, true)?;
            println!("Activated {}", user_id);
        }

        Commands::Deactivate { user_id } => {
            service.set_user_active(user_id, false)?;
            println!("Deactivated {}", user_id);
        }

        Commands::Delete { user_id } => {
            if service.delete_user(user_id)? {
                println!("Deleted {}", user_id);
            } else {
                bail!("Provider did not confirm deletion of {}", user_id);
            }
        }

        Commands::SetPassword { user_id, password } => {
            let password = match password {
                Some(p) => p.clone(),
                None => rpassword::prompt_password("New password: ")
                    .context("Failed to read password")?,
            };
            service.reset_password(user_id, &password)?;
            println!("Password updated for {}", user_id);
        }
    }

    Ok(())
}

/// Derive the cache key from SSOADM_PASSPHRASE, prompting when unset
fn cache_key() -> anyhow::Result<CacheKey> {
    let passphrase = match std::env::var("SSOADM_PASSPHRASE") {
        Ok(p) if !p.is_empty() => p,
        _ => rpassword::prompt_password("Cache passphrase: ")
            .context("Failed to read cache passphrase")?,
    };

    if passphrase.is_empty() {
        bail!("Cache passphrase must not be empty");
    }

    Ok(CacheKey::derive(&passphrase))
}

fn parse_expiry(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid expiry '{}': expected RFC 3339", s))?;
    Ok(parsed.with_timezone(&Utc))
}
