use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Command line arguments for the DBApi plugin host driver.
#[derive(Parser, Debug)]
#[clap(
    name = "syncml-cli",
    about = "Drives SyncML DBApi datastore plugins through their Module/Session/Datastore lifecycle"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the module configuration file (JSON/YAML/TOML). Defaults
    /// to the platform config dir's `syncml-dbapi/modules.toml`.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured modules and the capabilities each negotiated.
    Modules,
    /// Print the raw capability string and resolved method-group
    /// wiring for one configured module.
    Capabilities {
        /// Module name as it appears in the configuration file.
        module: String,
    },
    /// Run a write cycle against a datastore: open it, insert one item
    /// per `--insert` file, end the write, and print the resulting
    /// item ids and anchor token.
    Write(SyncTarget),
    /// Run a read cycle against a datastore: open it, iterate every
    /// item the plugin reports, and print id/status/size for each.
    Read(ReadArgs),
    /// Validate a module configuration file without loading any
    /// plugins.
    CheckConfig {
        /// Path to the configuration file to validate.
        path: String,
    },
    /// Generate shell completions for this CLI.
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Debug)]
pub struct SyncTarget {
    /// Module name as it appears in the configuration file.
    #[arg(short = 'm', long)]
    pub module: String,
    /// Datastore name to open within the module (e.g. "contacts").
    #[arg(short = 'd', long)]
    pub datastore: String,
    /// Device key selecting the backing (device, user, datastore)
    /// triple the plugin's admin/map storage is keyed on.
    #[arg(long, default_value = "cli-device")]
    pub device: String,
    /// User key, same triple as `device`.
    #[arg(long, default_value = "cli-user")]
    pub user: String,
    /// Request admin-suffixed datastore naming if the plugin offers
    /// `ADMIN_Info`.
    #[arg(long)]
    pub admin: bool,
    /// Path to a file whose contents become one inserted item. Can be
    /// repeated to insert several items in the same write cycle.
    #[arg(long = "insert", action = clap::ArgAction::Append)]
    pub inserts: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub target: SyncTarget,
    /// Anchor token from the previous session's successful write
    /// (empty for a first-ever sync).
    #[arg(long, default_value = "")]
    pub last_token: String,
    /// Resume token from a previously aborted session (empty if none).
    #[arg(long, default_value = "")]
    pub resume_token: String,
}
