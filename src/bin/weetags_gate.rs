//! Weetags Gate CLI
//!
//! Operator tooling around the gate: log in against a config, check a token,
//! compile conditions and hash passwords for config files.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use weetags_gate::core::credentials::{generate_salt, password_digest};
use weetags_gate::{ConditionCompiler, EngineOperation, GateConfig, Gatekeeper};

#[derive(Parser, Debug)]
#[command(name = "weetags-gate")]
#[command(about = "Token authorization and condition tooling for Weetags")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authenticate and print a bearer token
    Login {
        /// Path to the TOML config
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// Check a token for an action on a resource
    Authorize {
        /// Path to the TOML config
        #[arg(short, long)]
        config: PathBuf,

        /// Bearer token (with or without the `Bearer ` prefix)
        #[arg(short, long)]
        token: String,

        /// Resource (tree) name
        #[arg(short, long)]
        resource: String,

        /// Action (blueprint) name
        #[arg(short, long, required_unless_present = "operation")]
        action: Option<String>,

        /// Engine operation, authorized under its blueprint
        #[arg(long, conflicts_with = "action")]
        operation: Option<String>,
    },

    /// Compile a condition expression and print its canonical form
    Conditions {
        /// Condition literal, e.g. "[[['depth', '>', 1]]]"
        expr: String,
    },

    /// Print a salt and digest for a plaintext password
    HashPassword {
        password: String,

        /// Use this salt instead of a random one
        #[arg(long)]
        salt: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Login {
            config,
            username,
            password,
        } => {
            let gate = load(&config)?;
            let issued = gate.login(Some(&username), Some(&password))?;
            info!("Token valid until {}", issued.expires_at);
            println!("{}", issued.bearer());
        }
        Command::Authorize {
            config,
            token,
            resource,
            action,
            operation,
        } => {
            let gate = load(&config)?;
            let token = weetags_gate::bearer_token(&token).unwrap_or(&token);
            match (operation, action) {
                (Some(operation), _) => {
                    let operation: EngineOperation = operation.parse()?;
                    gate.authorize_operation(Some(token), &resource, operation)?;
                }
                (None, Some(action)) => {
                    gate.authorize(Some(token), &resource, &action)?;
                }
                (None, None) => bail!("either --action or --operation is required"),
            }
            println!("allowed");
        }
        Command::Conditions { expr } => {
            let compiled = ConditionCompiler::parse_str(&expr)?;
            println!("{compiled}");
            for field in compiled.fields() {
                info!("references field '{}'", field);
            }
        }
        Command::HashPassword { password, salt } => {
            if password.is_empty() {
                bail!("password must not be empty");
            }
            let salt = salt.unwrap_or_else(generate_salt);
            println!("salt = \"{salt}\"");
            println!("password_sha256 = \"{}\"", password_digest(&salt, &password));
        }
    }

    Ok(())
}

fn load(path: &Path) -> anyhow::Result<Gatekeeper> {
    let config = GateConfig::from_path(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    if !config.is_enabled() {
        bail!("config at {} has no [auth] table", path.display());
    }
    Ok(Gatekeeper::from_config(config)?)
}
