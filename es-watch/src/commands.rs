use es_core::{ScanType, TargetType};

use clap::Subcommand;
use uuid::Uuid;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List the most recent scans, newest first
    Scans {
        /// How many scans to keep in view
        #[arg(long)]
        limit: Option<usize>,

        /// Keep running and print every change
        #[arg(long)]
        follow: bool,
    },

    /// Follow one scan and its log until it finishes
    Scan { id: Uuid },

    /// Request a new scan (checks the monthly quota first)
    Start {
        target: String,

        #[arg(long, default_value = "url")]
        target_type: TargetType,

        #[arg(long, default_value = "quick")]
        scan_type: ScanType,
    },

    /// Cancel a pending or running scan
    Cancel { id: Uuid },

    /// Dashboard figures over the recent scans
    Stats,

    /// This month's usage against the plan allowance
    Usage,

    /// Show or edit the signed-in profile
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },

    /// GitHub account linking and repositories
    Github {
        #[command(subcommand)]
        action: GithubCommands,
    },
}

#[derive(Subcommand)]
pub(crate) enum ProfileCommands {
    /// Print the signed-in profile
    Show,

    /// Change the display name or avatar
    Set {
        #[arg(long, required_unless_present = "avatar_url")]
        name: Option<String>,

        #[arg(long)]
        avatar_url: Option<String>,
    },
}

#[derive(Subcommand)]
pub(crate) enum GithubCommands {
    /// Print the URL that starts linking a GitHub account
    Link,

    /// Finish linking with the redirect GitHub sent the browser to
    Callback {
        /// Full redirect URL, as shown in the browser address bar
        #[arg(long, conflicts_with_all = ["code", "state"])]
        url: Option<String>,

        #[arg(long, requires = "state")]
        code: Option<String>,

        #[arg(long, requires = "code")]
        state: Option<String>,
    },

    /// Unlink the GitHub account and every linked repository
    Disconnect,

    /// List linked repositories, or with --remote those GitHub offers
    Repos {
        #[arg(long)]
        remote: bool,
    },

    /// Link a repository by its full name (owner/name)
    LinkRepo { full_name: String },

    /// Unlink a repository by id
    UnlinkRepo { id: Uuid },
}
