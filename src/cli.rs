//! Command line interface for blogsync.
//!
//! All the decisions about what gets pushed live in `blogsync-core`; this
//! module parses arguments, builds the Hugo site and DEV client, runs the
//! sync and prints the report.
//!
//! Entry point for `main` and integration tests: [`run`].

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use blogsync_core::content::HugoSite;
use blogsync_core::reconcile::Mode;
use blogsync_core::synchronise::{list_all, synchronise, SyncOptions, SyncReport};
use clap::{Parser, Subcommand};

use crate::devto::DevtoClient;
use crate::load_config::resolve_config;
use crate::report::{print_list, print_report};

/// Push Hugo posts to DEV.
#[derive(Parser, Debug)]
#[clap(
    name = "blogsync",
    version,
    about = "Push Hugo blog posts to DEV, rewriting images, shortcodes and heading anchors"
)]
pub struct Cli {
    /// Root of the Hugo site
    #[clap(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// DEV API key
    #[clap(long, global = true, env = "DEVTO_APIKEY", hide_env_values = true)]
    pub apikey: Option<String>,

    /// YAML config file, defaults to <root>/.blogsync.yaml when present
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug information, including every HTTP request as a curl command
    #[clap(long, global = true)]
    pub debug: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show what a push would do, without changing anything
    Status {
        /// A single post, as a file path or URL path
        post: Option<String>,
    },
    /// Print the DEV document composed for a post
    Preview {
        /// The post, as a file path or URL path
        post: String,
    },
    /// Show how each post differs from its DEV article
    Diff {
        /// A single post, as a file path or URL path
        post: Option<String>,
    },
    /// Update the DEV articles that changed
    Push {
        /// A single post, as a file path or URL path
        post: Option<String>,
    },
    /// List the articles of the DEV account
    List,
}

impl Commands {
    fn mode_and_post(self) -> Option<(Mode, Option<String>)> {
        match self {
            Commands::Status { post } => Some((Mode::Status, post)),
            Commands::Preview { post } => Some((Mode::Preview, Some(post))),
            Commands::Diff { post } => Some((Mode::Diff, post)),
            Commands::Push { post } => Some((Mode::Push, post)),
            Commands::List => None,
        }
    }
}

/// Async CLI entrypoint for main() and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    let Some(api_key) = cli.apikey.filter(|k| !k.is_empty()) else {
        bail!("missing API key, set DEVTO_APIKEY or pass --apikey");
    };
    let config = resolve_config(cli.config.as_deref(), &cli.root)?;
    let client = DevtoClient::new(&config.api_base_url, api_key)?;

    let Some((mode, only)) = cli.command.mode_and_post() else {
        tracing::info!(command = "list", "Listing articles");
        let articles = list_all(&client, config.per_page)
            .await
            .context("listing the account's articles")?;
        print_list(&articles);
        return Ok(());
    };

    let site = HugoSite::load(&cli.root)
        .with_context(|| format!("loading Hugo site at {}", cli.root.display()))?;
    let options = SyncOptions {
        mode,
        fields: config.fields.clone(),
        backoff: config.backoff(),
        per_page: config.per_page,
        only,
    };
    tracing::info!(?mode, "Starting synchronisation");

    let report = synchronise(&client, &site, &options).await?;
    print_report(&report, &options.fields);

    ensure_synchronised(&report)
}

/// Fail when any post ended in an error, after the report was printed.
pub fn ensure_synchronised(report: &SyncReport) -> Result<()> {
    let errors = report.error_count();
    if errors > 0 {
        bail!("{errors} post(s) could not be synchronised");
    }
    Ok(())
}
