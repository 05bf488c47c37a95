//! Clap derive structures for the `patchbay` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// patchbay -- inventory of sites hosted across cloud providers
#[derive(Debug, Parser)]
#[command(
    name = "patchbay",
    version,
    about = "Track hosted sites and their environments across providers",
    long_about = "Queries hosting provider APIs for the sites an account owns,\n\
        caches what it learns in a local SQLite database, and only goes back\n\
        to the network for fields the cache does not have yet.",
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
    /// Hosting provider to operate on
    #[arg(long, short = 'p', env = "PATCHBAY_PROVIDER", global = true)]
    pub provider: Option<String>,

    /// Output format (defaults to the config file's setting, else table)
    #[arg(long, short = 'o', env = "PATCHBAY_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Bypass the cache and re-fetch fields from the provider
    #[arg(long, short = 'r', global = true)]
    pub refresh: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "PATCHBAY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
}

// ── Command Tree ─────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the registered hosting providers
    Providers,

    /// Sync and list the sites of a provider
    Sites,

    /// Show every known field of one site
    Site {
        /// Site name as the provider reports it
        name: String,
    },

    /// List a site's environments, or show one environment's details
    Envs {
        /// Site name
        name: String,

        /// Environment name (dev, test, live, ...)
        environment: Option<String>,
    },

    /// Print the clone URL of a site's code repository
    Vcs {
        /// Site name
        name: String,
    },

    /// Manage provider credentials
    Auth(AuthArgs),
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Log in to a provider (or store API credentials)
    Login {
        /// Account email; prompted for when omitted
        #[arg(long)]
        email: Option<String>,
    },

    /// Forget all cached credentials for a provider
    Logout,

    /// Show which providers have cached credentials
    Status,
}
