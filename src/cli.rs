use clap::{Parser, Subcommand};

/// featured-sync - mirror your most-favourited deviations into a gallery
#[derive(Parser, Debug)]
#[command(name = "featured-sync")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Credentials come from DA_CLIENT_ID / DA_CLIENT_SECRET / DA_REFRESH_TOKEN \
(environment or .env). Run 'featured-sync authorize' once to obtain a refresh token.")]
pub struct Cli {
    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank deviations by favourites and converge the destination folder
    Sync {
        /// Source folder to rank (default: scan every folder)
        #[arg(long)]
        source_gallery: Option<String>,

        /// Destination folder to converge
        #[arg(long)]
        dest_gallery: Option<String>,

        /// Ranking size
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// Compute and show the plan without applying it
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Preview the operation plan without writing
    Diff {
        /// Source folder to rank (default: scan every folder)
        #[arg(long)]
        source_gallery: Option<String>,

        /// Destination folder to converge
        #[arg(long)]
        dest_gallery: Option<String>,

        /// Ranking size
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
    },

    /// List gallery folders on the account
    Folders,

    /// One-time OAuth setup: obtain and store a refresh token
    Authorize {
        /// Redirect URI registered with the application
        #[arg(long)]
        redirect_uri: Option<String>,
    },
}
