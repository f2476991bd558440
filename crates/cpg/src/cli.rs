//! Clap derive structures for the `cpg` CLI.
//!
//! Only clap types live here; `build.rs` includes this file to render man
//! pages and completions.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// cpg -- legal hold, audit log, and device queries against a CrashPlan console
#[derive(Debug, Parser)]
#[command(
    name = "cpg",
    version,
    about = "Query and manage a CrashPlan console from the command line",
    long_about = "Command-line client for the CrashPlan console APIs.\n\n\
        Covers legal hold matters and custodians, audit log search, and\n\
        device listings. Credentials come from a named profile, the\n\
        environment, the OS keyring, or an interactive prompt.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Console profile to use
    #[arg(long, short = 'p', env = "CPG_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Console address (overrides profile)
    #[arg(long, env = "CPG_HOST", global = true)]
    pub host: Option<String>,

    /// Username to log in with (overrides profile)
    #[arg(long, short = 'u', env = "CPG_USERNAME", global = true)]
    pub username: Option<String>,

    /// TOTP code for accounts with two-factor login
    #[arg(long, env = "CPG_TOTP", global = true, hide_env_values = true)]
    pub totp: Option<String>,

    /// Output format (falls back to `defaults.output` in the config, then table)
    #[arg(long = "output", short = 'o', env = "CPG_OUTPUT", global = true)]
    pub output_flag: Option<OutputFormat>,

    /// Effective output format, filled in after the config is read.
    #[arg(skip)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "CPG_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CPG_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Items per page for list requests (overrides profile)
    #[arg(long, env = "CPG_PAGE_SIZE", global = true)]
    pub page_size: Option<u32>,
}

// ── Output ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show how a user is expected to log in (no credentials needed)
    LoginConfig {
        /// Username to look up
        username: String,
    },

    /// Show the tenant the current login belongs to
    Tenant,

    /// Manage legal hold matters
    #[command(alias = "m")]
    Matters(MattersArgs),

    /// Manage matter custodians
    #[command(alias = "cust")]
    Custodians(CustodiansArgs),

    /// List legal hold events
    Events(EventsArgs),

    /// Search the audit log
    #[command(alias = "audit")]
    AuditLogs(AuditLogsArgs),

    /// List devices
    #[command(alias = "dev")]
    Devices(DevicesArgs),

    /// Look up users
    Users(UsersArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Matters ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MattersArgs {
    #[command(subcommand)]
    pub command: MattersCommand,
}

#[derive(Debug, Subcommand)]
pub enum MattersCommand {
    /// List matters (active only by default)
    #[command(alias = "ls")]
    List {
        /// Only deactivated matters
        #[arg(long, conflicts_with = "all")]
        inactive: bool,

        /// Active and deactivated matters
        #[arg(long)]
        all: bool,

        /// Matters whose name contains this text
        #[arg(long)]
        name: Option<String>,
    },

    /// Show a single matter
    Show {
        /// Matter UID
        uid: String,
    },

    /// Deactivate a matter
    Deactivate {
        /// Matter UID
        uid: String,
    },

    /// Reactivate a deactivated matter
    Reactivate {
        /// Matter UID
        uid: String,
    },
}

// ── Custodians ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CustodiansArgs {
    #[command(subcommand)]
    pub command: CustodiansCommand,
}

#[derive(Debug, Subcommand)]
pub enum CustodiansCommand {
    /// List a matter's custodians
    #[command(alias = "ls")]
    List {
        /// Matter UID
        #[arg(long)]
        matter: String,

        /// Include released custodians
        #[arg(long)]
        all: bool,
    },

    /// Place a user on a matter
    Add {
        /// Matter UID
        #[arg(long)]
        matter: String,

        /// User UID
        #[arg(long)]
        user: String,
    },

    /// Release a custodian (by membership UID)
    Remove {
        /// Membership UID
        membership: String,
    },
}

// ── Events ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// List legal hold events
    #[command(alias = "ls")]
    List {
        /// Restrict to one matter
        #[arg(long)]
        matter: Option<String>,

        /// Earliest event time, "yyyy-MM-dd HH:MM:SS" (UTC)
        #[arg(long)]
        since: Option<String>,

        /// Latest event time, "yyyy-MM-dd HH:MM:SS" (UTC)
        #[arg(long)]
        until: Option<String>,
    },
}

// ── Audit logs ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuditLogsArgs {
    #[command(subcommand)]
    pub command: AuditLogsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuditLogsCommand {
    /// Search audit log events
    Search {
        /// Earliest event time, "yyyy-MM-dd HH:MM:SS" (UTC)
        #[arg(long)]
        since: Option<String>,

        /// Latest event time, "yyyy-MM-dd HH:MM:SS" (UTC)
        #[arg(long)]
        until: Option<String>,

        /// Event type to match (repeatable)
        #[arg(long = "event-type")]
        event_types: Vec<String>,

        /// Actor username to match (repeatable)
        #[arg(long = "actor")]
        actors: Vec<String>,

        /// Raw export format; overrides --output
        #[arg(long)]
        format: Option<AuditExportFormat>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuditExportFormat {
    Csv,
    Cef,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List {
        /// Only active devices
        #[arg(long)]
        active: bool,

        /// Restrict to one organization
        #[arg(long)]
        org: Option<String>,

        /// Loose match on GUID, hostname, or computer name
        #[arg(long, short = 'q')]
        query: Option<String>,
    },
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List users
    #[command(alias = "ls")]
    List {
        /// Only deactivated users
        #[arg(long)]
        inactive: bool,

        /// Restrict to one organization
        #[arg(long)]
        org: Option<String>,

        /// Exact email address
        #[arg(long)]
        email: Option<String>,

        /// Loose match on name, username, or email
        #[arg(long, short = 'q')]
        query: Option<String>,
    },

    /// Show a user by username
    Show {
        /// Username (usually an email address)
        username: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Print the resolved configuration
    Show,

    /// Store a profile's password in the OS keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
