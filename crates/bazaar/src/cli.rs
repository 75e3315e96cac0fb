//! Clap derive structures for the `bazaar` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bazaar -- back-office CLI for the marketplace
#[derive(Debug, Parser)]
#[command(
    name = "bazaar",
    version,
    about = "Run the marketplace back office from the command line",
    long_about = "Moderate users, listings, vendors, KYC requests, reports and\n\
        categories of the marketplace, and watch live dashboards.",
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
    /// Profile to use
    #[arg(long, short = 'p', env = "BAZAAR_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, short = 'u', env = "BAZAAR_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BAZAAR_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "BAZAAR_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "BAZAAR_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one identifier per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in as an administrator
    Login(LoginArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in administrator
    Whoami,

    /// Show dashboard totals
    #[command(alias = "dash")]
    Dashboard,

    /// Manage users
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Inspect riders and delivery statistics
    Riders(RidersArgs),

    /// Review vendor applications
    Vendors(VendorsArgs),

    /// Moderate product listings
    #[command(alias = "ls")]
    Listings(ListingsArgs),

    /// Review KYC requests
    Kyc(KycArgs),

    /// Handle user reports
    Reports(ReportsArgs),

    /// Manage product categories
    #[command(alias = "cat")]
    Categories(CategoriesArgs),

    /// Follow a resource and print every update
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Admin email (defaults to the profile's email, then a prompt)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Read the password from this variable instead of prompting
    #[arg(long, default_value = "BAZAAR_PASSWORD", hide_default_value = true)]
    pub password_env: String,
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
        /// Only these roles (repeatable); administrators are never listed
        #[arg(long, short = 'r')]
        role: Vec<String>,
    },

    /// Show one user
    Show { id: String },

    /// Ban a user
    Ban { id: String },

    /// Lift a ban
    Unban { id: String },

    /// Change a user's role
    Role { id: String, role: String },
}

// ── Riders ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RidersArgs {
    #[command(subcommand)]
    pub command: RidersCommand,
}

#[derive(Debug, Subcommand)]
pub enum RidersCommand {
    /// List riders
    #[command(alias = "ls")]
    List,

    /// Show one rider
    Show { id: String },

    /// Delivery totals
    Stats,

    /// Deliveries per month
    Monthly,
}

// ── Vendors ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VendorsArgs {
    #[command(subcommand)]
    pub command: VendorsCommand,
}

#[derive(Debug, Subcommand)]
pub enum VendorsCommand {
    /// List vendor applications
    #[command(alias = "apps")]
    Applications,

    /// Show one vendor
    Show { id: String },

    /// Approve a vendor application
    Approve { id: String },

    /// Reject a vendor application
    Reject {
        id: String,
        /// Reason shown to the applicant
        #[arg(long, short = 'n')]
        note: String,
    },
}

// ── Listings ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListingsArgs {
    #[command(subcommand)]
    pub command: ListingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ListingsCommand {
    /// List all products
    #[command(alias = "ls")]
    List,

    /// Show one listing
    Show { id: String },

    /// Approve a listing
    Approve { id: String },

    /// Reject a listing
    Reject {
        id: String,
        /// Reason shown to the seller
        #[arg(long, short = 'n')]
        note: String,
    },

    /// Take a listing down
    Remove { id: String },
}

// ── KYC ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct KycArgs {
    #[command(subcommand)]
    pub command: KycCommand,
}

#[derive(Debug, Subcommand)]
pub enum KycCommand {
    /// List KYC requests
    #[command(alias = "ls")]
    List,

    /// Approve a KYC request
    Approve { id: String },

    /// Reject a KYC request
    Reject { id: String },
}

// ── Reports ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReportsArgs {
    #[command(subcommand)]
    pub command: ReportsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportsCommand {
    /// List reports
    #[command(alias = "ls")]
    List,

    /// Mark a report resolved
    Resolve { id: String },
}

// ── Categories ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    pub command: CategoriesCommand,
}

#[derive(Debug, Subcommand)]
pub enum CategoriesCommand {
    /// List categories
    #[command(alias = "ls")]
    List,

    /// Create a category
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, short = 'd')]
        description: String,
        /// Image file to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Edit a category
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, short = 'd')]
        description: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Delete a category
    #[command(alias = "rm")]
    Delete { id: String },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// What to follow
    pub resource: WatchTarget,

    /// Poll interval in seconds (defaults to the resource's usual cadence)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WatchTarget {
    Dashboard,
    Users,
    Riders,
    RiderStats,
    RiderMonthly,
    VendorApplications,
    Listings,
    Kyc,
    Reports,
    Categories,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a profile with guided setup
    Init,

    /// Display the current configuration
    Show,

    /// Set a profile value
    Set {
        /// Profile key (e.g. "api_url", "email", "timeout", "session_store")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Print the config file location
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
