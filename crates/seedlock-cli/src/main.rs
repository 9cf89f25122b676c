//! seedlock: command-line wallet seed vault
//!
//! Commands:
//!   init        - create a new wallet (generates a 12-word recovery phrase)
//!   restore     - provision the vault from an existing recovery phrase
//!   status      - show whether a seed exists and how it is protected
//!   show        - decrypt and display the recovery phrase
//!   change-pin  - re-encrypt the seed under a new PIN
//!   backup      - create/restore encrypted backup blobs under seed-derived keys
//!   reset       - wallet reset: delete the seed and all local secret state

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use seedlock_core::config::SeedlockConfig;

#[derive(Parser, Debug)]
#[command(
    name = "seedlock",
    version,
    about = "Encrypted wallet seed vault",
    long_about = "seedlock: password-protected at-rest storage for wallet seeds and backups"
)]
struct Cli {
    /// Path to seedlock.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "SEEDLOCK_CONFIG",
        default_value = "~/.config/seedlock/config.toml"
    )]
    config: PathBuf,

    /// Data directory override (defaults to the configured vault.data_dir)
    #[arg(long, env = "SEEDLOCK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SEEDLOCK_LOG", default_value = "warn")]
    log: String,

    /// Log format (json, text)
    #[arg(long, env = "SEEDLOCK_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new wallet: generate a recovery phrase and store the seed
    Init {
        /// Store the seed unencrypted (no PIN). Strongly discouraged.
        #[arg(long)]
        no_pin: bool,
        /// Cache the PIN in the platform keychain
        #[arg(long)]
        keychain: bool,
    },

    /// Provision the vault from an existing recovery phrase
    Restore {
        /// Store the seed unencrypted (no PIN). Strongly discouraged.
        #[arg(long)]
        no_pin: bool,
    },

    /// Show whether a seed exists and how it is protected
    Status,

    /// Decrypt and display the recovery phrase
    Show {
        /// Try the platform keychain for the PIN before prompting
        #[arg(long)]
        keychain: bool,
    },

    /// Re-encrypt the seed under a new PIN
    #[command(name = "change-pin")]
    ChangePin {
        /// Update the cached PIN in the platform keychain
        #[arg(long)]
        keychain: bool,
    },

    /// Encrypted backups keyed off the wallet seed
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Delete the seed and all local secret state
    Reset {
        /// Required: resets are irreversible
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum BackupAction {
    /// Encrypt a payload file into the vault's backup directory
    Create {
        /// File to back up
        payload: PathBuf,
        /// Backup name (e.g. channels.bak)
        name: String,
    },
    /// Decrypt a stored backup to a file
    Restore {
        /// Backup name (e.g. channels.bak)
        name: String,
        /// Destination path for the decrypted payload
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log, &cli.log_format);

    let config = SeedlockConfig::load(&expand_tilde(&cli.config))?;
    let data_dir = cli
        .data_dir
        .map(|d| expand_tilde(&d))
        .unwrap_or_else(|| expand_tilde(&config.vault.data_dir));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        chain = %config.vault.chain,
        data_dir = %data_dir.display(),
        "seedlock starting"
    );

    let ctx = commands::Context {
        data_dir,
        chain: config.vault.chain,
    };

    match cli.command {
        Commands::Init { no_pin, keychain } => commands::cmd_init(&ctx, no_pin, keychain),
        Commands::Restore { no_pin } => commands::cmd_restore(&ctx, no_pin),
        Commands::Status => commands::cmd_status(&ctx),
        Commands::Show { keychain } => commands::cmd_show(&ctx, keychain),
        Commands::ChangePin { keychain } => commands::cmd_change_pin(&ctx, keychain),
        Commands::Backup { action } => match action {
            BackupAction::Create { payload, name } => {
                commands::cmd_backup_create(&ctx, &payload, &name)
            }
            BackupAction::Restore { name, out } => commands::cmd_backup_restore(&ctx, &name, &out),
        },
        Commands::Reset { force } => commands::cmd_reset(&ctx, force),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    let s = path.to_string_lossy();
    if s.starts_with("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(format!("{}/{}", home, &s[2..]))
    } else {
        path.to_path_buf()
    }
}
