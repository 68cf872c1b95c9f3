use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use layout_core::remote::DEFAULT_HISTORY_LIMIT;

#[derive(Parser)]
#[command(name = "layout")]
#[command(about = "Track machine construct changes and carry their history between devices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Optional path to the preferences file holding the device identity
    #[arg(long, global = true, value_name = "PATH")]
    pub preferences: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the canonical history to an export file
    Export {
        /// Directory for the export file (current directory when omitted)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    /// Load an export file into the local history store
    Import {
        /// Export file to read
        file: PathBuf,
        /// Also merge the file's entries into the canonical history
        #[arg(long)]
        merge: bool,
    },
    /// Merge an export file straight into the canonical history
    Merge {
        /// Export file to read
        file: PathBuf,
    },
    /// Merge the local history store into the canonical history
    Reconcile,
    /// Show recent history
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Read the local history store instead of the canonical history
        #[arg(long)]
        store: bool,
    },
    /// Record a construct change on a machine
    Record {
        /// Machine number
        machine: i64,
        /// Previous construct id
        #[arg(long, value_name = "CONSTRUCT")]
        from: Option<String>,
        /// New construct id
        #[arg(long, value_name = "CONSTRUCT")]
        to: Option<String>,
    },
    /// Show device and sync status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or rename this device
    Device {
        #[command(subcommand)]
        command: DeviceCommands,
    },
    /// Sign operators in and out
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Work with the remote backend
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },
    /// Manage constructs on the remote backend
    Construction {
        #[command(subcommand)]
        command: ConstructionCommands,
    },
    /// Show the layout block of a machine number
    Block {
        /// Machine number
        machine: i64,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum DeviceCommands {
    /// Print the device id and name
    Show,
    /// Change the device name
    Rename {
        /// New device name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with a configured operator account
    Login {
        /// Operator email
        #[arg(long)]
        email: String,
        /// Operator password
        #[arg(long)]
        password: String,
    },
    /// Show the signed-in operator
    Status,
    /// Sign the current operator out
    Logout,
}

#[derive(Subcommand)]
pub enum ConstructionCommands {
    /// List every construct
    List,
    /// Create or update a construct
    Save {
        /// Construct id
        id: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Display color
        #[arg(long, default_value = "#808080")]
        color: String,
        /// Record the signed-in operator as the creator
        #[arg(long)]
        new: bool,
    },
    /// Delete a construct
    Delete {
        /// Construct id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum RemoteCommands {
    /// Merge remote history into the canonical history
    Pull {
        /// Maximum number of remote rows to load
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },
    /// Print remote changes as they happen
    Watch,
}
