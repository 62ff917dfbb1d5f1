//! ovhsync CLI — the orchestration caller for the reconciliation core
//!
//! Each subcommand maps to one reconciliation (or one read-only lookup)
//! against the OVH control plane. Credentials come from the environment:
//! `OVHSYNC_TOKEN` (required) and `OVHSYNC_ENDPOINT` (defaults to the EU
//! API base).

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ovhsync_api::{ApiClient, RestClient, RestConfig};
use ovhsync_cloud::{
    Ensured, Mode, Presence, PublicCloudUsers, S3Credentials, User, UserSpec, ValkeyUserSpec,
    ValkeyUsers,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ovhsync")]
#[command(about = "Reconcile OVH public cloud users, S3 credentials and Valkey users", long_about = None)]
#[command(version)]
struct Cli {
    /// Print results as JSON instead of a summary line
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage public cloud users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage S3 credentials of a public cloud user
    S3Credentials {
        #[command(subcommand)]
        action: S3Action,
    },
    /// Manage Valkey database users
    ValkeyUser {
        #[command(subcommand)]
        action: ValkeyAction,
    },
}

/// Desired state of the resource
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StateArg {
    Present,
    Absent,
}

impl From<StateArg> for Presence {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Present => Presence::Present,
            StateArg::Absent => Presence::Absent,
        }
    }
}

#[derive(Subcommand)]
enum UserAction {
    /// Ensure a user is present (creates one) or absent
    Ensure {
        /// Public cloud project id
        #[arg(long, env = "OVHSYNC_SERVICE_NAME")]
        service_name: String,
        /// Role to assign to the user
        #[arg(long)]
        role: Option<String>,
        /// Roles to assign to the user (comma separated)
        #[arg(long, value_delimiter = ',')]
        roles: Option<Vec<String>>,
        #[arg(long)]
        description: Option<String>,
        /// User id, required with --state absent
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long, value_enum, default_value_t = StateArg::Present)]
        state: StateArg,
        /// Report the would-be change without applying it
        #[arg(long)]
        dry_run: bool,
        /// After creation, poll until the user status turns ok
        #[arg(long)]
        wait: bool,
    },
    /// Fetch one user (status included)
    Get {
        #[arg(long, env = "OVHSYNC_SERVICE_NAME")]
        service_name: String,
        #[arg(long)]
        user_id: String,
    },
}

#[derive(Subcommand)]
enum S3Action {
    /// Ensure a credential pair is present (mints one) or absent
    Ensure {
        #[arg(long, env = "OVHSYNC_SERVICE_NAME")]
        service_name: String,
        /// Owning public cloud user id
        #[arg(long)]
        user_id: String,
        /// Access key, required with --state absent
        #[arg(long)]
        access: Option<String>,
        #[arg(long, value_enum, default_value_t = StateArg::Present)]
        state: StateArg,
        #[arg(long)]
        dry_run: bool,
    },
    /// List the user's credentials (secrets are not included)
    List {
        #[arg(long, env = "OVHSYNC_SERVICE_NAME")]
        service_name: String,
        #[arg(long)]
        user_id: String,
    },
}

#[derive(Subcommand)]
enum ValkeyAction {
    /// Ensure a Valkey user is present (username match counts) or absent
    Ensure {
        #[arg(long, env = "OVHSYNC_SERVICE_NAME")]
        service_name: String,
        /// Valkey cluster id
        #[arg(long)]
        cluster_id: String,
        /// Username; existing users are matched on it before creating
        #[arg(long)]
        name: String,
        /// ACL categories (comma separated)
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
        /// ACL commands (comma separated)
        #[arg(long, value_delimiter = ',')]
        commands: Vec<String>,
        /// ACL key patterns (comma separated)
        #[arg(long, value_delimiter = ',')]
        keys: Vec<String>,
        /// ACL channel patterns (comma separated)
        #[arg(long, value_delimiter = ',')]
        channels: Vec<String>,
        /// User id, required with --state absent
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long, value_enum, default_value_t = StateArg::Present)]
        state: StateArg,
        #[arg(long)]
        dry_run: bool,
    },
    /// List the ids of every user attached to a cluster
    List {
        #[arg(long, env = "OVHSYNC_SERVICE_NAME")]
        service_name: String,
        #[arg(long)]
        cluster_id: String,
    },
    /// Fetch one Valkey user by id
    Get {
        #[arg(long, env = "OVHSYNC_SERVICE_NAME")]
        service_name: String,
        #[arg(long)]
        cluster_id: String,
        #[arg(long)]
        user_id: String,
    },
}

fn mode(dry_run: bool) -> Mode {
    if dry_run { Mode::DryRun } else { Mode::Apply }
}

fn print_ensured(result: &Ensured, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let status = if !result.changed {
        "unchanged".green()
    } else if result.simulated {
        "would change".yellow()
    } else {
        "changed".yellow()
    };

    match &result.message {
        Some(message) => println!("{status}: {message}"),
        None => println!("{status}"),
    }
    Ok(())
}

fn print_value<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Poll a freshly created user until provider-side creation completes.
///
/// This is the caller-side loop the reconciliation core deliberately does
/// not own: six attempts, five seconds apart, matching the documented
/// orchestration recipe for user creation.
async fn wait_until_ready(users: &PublicCloudUsers, user_id: &str) -> anyhow::Result<User> {
    const ATTEMPTS: u32 = 6;
    const DELAY: Duration = Duration::from_secs(5);

    for attempt in 1..=ATTEMPTS {
        let user = users.get(user_id).await?;
        if user.status.is_ready() {
            return Ok(user);
        }
        if attempt < ATTEMPTS {
            tracing::info!(
                "user {} not ready yet (attempt {}/{})",
                user_id,
                attempt,
                ATTEMPTS
            );
            tokio::time::sleep(DELAY).await;
        }
    }

    anyhow::bail!("user {user_id} did not reach status ok after {ATTEMPTS} attempts")
}

/// Extract the provider-assigned id from a creation payload.
fn created_user_id(payload: Option<&serde_json::Value>) -> Option<String> {
    let id = payload?.get("id")?;
    match id.as_str() {
        Some(s) => Some(s.to_string()),
        None if id.is_null() => None,
        None => Some(id.to_string()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = RestConfig::from_env().context("loading OVH API configuration")?;
    let client: Arc<dyn ApiClient> = Arc::new(RestClient::new(config));

    match cli.command {
        Commands::User { action } => match action {
            UserAction::Ensure {
                service_name,
                role,
                roles,
                description,
                user_id,
                state,
                dry_run,
                wait,
            } => {
                let users = PublicCloudUsers::new(client, &service_name);
                let spec = UserSpec {
                    role,
                    roles,
                    description,
                    user_id,
                };
                let result = users.ensure(&spec, state.into(), mode(dry_run)).await?;
                print_ensured(&result, cli.json)?;

                if wait && !result.simulated {
                    match created_user_id(result.payload.as_ref()) {
                        Some(id) => {
                            let user = wait_until_ready(&users, &id).await?;
                            print_value(&user)?;
                        }
                        None => tracing::warn!(
                            "creation response carried no user id, skipping --wait polling"
                        ),
                    }
                }
            }
            UserAction::Get {
                service_name,
                user_id,
            } => {
                let users = PublicCloudUsers::new(client, &service_name);
                print_value(&users.get(&user_id).await?)?;
            }
        },
        Commands::S3Credentials { action } => match action {
            S3Action::Ensure {
                service_name,
                user_id,
                access,
                state,
                dry_run,
            } => {
                let credentials = S3Credentials::new(client, &service_name, &user_id);
                let result = credentials
                    .ensure(access.as_deref(), state.into(), mode(dry_run))
                    .await?;
                print_ensured(&result, cli.json)?;
            }
            S3Action::List {
                service_name,
                user_id,
            } => {
                let credentials = S3Credentials::new(client, &service_name, &user_id);
                print_value(&credentials.list().await?)?;
            }
        },
        Commands::ValkeyUser { action } => match action {
            ValkeyAction::Ensure {
                service_name,
                cluster_id,
                name,
                categories,
                commands,
                keys,
                channels,
                user_id,
                state,
                dry_run,
            } => {
                let users = ValkeyUsers::new(client, &service_name, &cluster_id);
                let spec = ValkeyUserSpec {
                    name,
                    categories,
                    commands,
                    keys,
                    channels,
                    user_id,
                };
                let result = users.ensure(&spec, state.into(), mode(dry_run)).await?;
                print_ensured(&result, cli.json)?;
            }
            ValkeyAction::List {
                service_name,
                cluster_id,
            } => {
                let users = ValkeyUsers::new(client, &service_name, &cluster_id);
                print_value(&users.list_ids().await?)?;
            }
            ValkeyAction::Get {
                service_name,
                cluster_id,
                user_id,
            } => {
                let users = ValkeyUsers::new(client, &service_name, &cluster_id);
                print_value(&users.get(&user_id).await?)?;
            }
        },
    }

    Ok(())
}
