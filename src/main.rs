//! featured-sync CLI
//!
//! Usage: featured-sync <COMMAND>
//!
//! Commands:
//!   sync       Rank deviations by favourites and converge the destination
//!   diff       Preview the operation plan without writing
//!   folders    List gallery folders on the account
//!   authorize  One-time OAuth setup

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;

use featured_sync::api::{build_authorize_url, DaClient, GalleryService, TokenProvider};
use featured_sync::config::{Config, ConfigOverrides};
use featured_sync::error::SyncError;
use featured_sync::sync::{SyncEngine, SyncReport, SyncSettings};
use featured_sync::token::TokenStore;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            source_gallery,
            dest_gallery,
            top_n,
            dry_run,
            yes,
        } => cmd_sync(
            source_gallery,
            dest_gallery,
            top_n,
            dry_run,
            yes,
            cli.json,
            cli.verbose,
        ),
        Commands::Diff {
            source_gallery,
            dest_gallery,
            top_n,
        } => cmd_sync(
            source_gallery,
            dest_gallery,
            top_n,
            true,
            true,
            cli.json,
            cli.verbose,
        ),
        Commands::Folders => cmd_folders(cli.json, cli.verbose),
        Commands::Authorize { redirect_uri } => cmd_authorize(redirect_uri, cli.json),
    }
}

/// Wire the HTTP gallery collaborator from resolved configuration.
fn build_gallery(config: &Config) -> Result<GalleryService> {
    let store = TokenStore::new()?;
    let refresh_token = match config.refresh_token.clone() {
        Some(token) => token,
        None => store.load()?.ok_or(SyncError::MissingCredential {
            name: "DA_REFRESH_TOKEN",
        })?,
    };
    let client = DaClient::new(config, refresh_token, Some(store))?;
    Ok(GalleryService::new(client, config))
}

fn cmd_sync(
    source_gallery: Option<String>,
    dest_gallery: Option<String>,
    top_n: Option<usize>,
    dry_run: bool,
    yes: bool,
    json: bool,
    verbose: u8,
) -> Result<()> {
    let overrides = ConfigOverrides {
        source_gallery,
        dest_gallery,
        top_n,
    };
    let config = Config::resolve(&overrides)?;

    if !json {
        println!("🎨 featured-sync");
        println!("Source: {}", config.source_selection());
        println!("Destination: {}", config.dest_gallery);
        println!("Top-N: {}", config.top_n);
        if dry_run {
            println!("Mode: Dry run");
        }
    }

    let mut gallery = build_gallery(&config)?;
    let engine = SyncEngine::new(SyncSettings {
        source: config.source_selection(),
        dest_gallery: config.dest_gallery.clone(),
        top_n: config.top_n,
    });

    if !json {
        println!("\nScanning galleries...");
    }
    let mut report = engine.plan(&mut gallery).context("planning sync")?;

    if !json {
        println!("✓ Scanned {} deviations", report.scanned);
        println!("✓ Selected top {}", report.selection.len());
        if verbose >= 1 {
            for (rank, dev) in report.selection.iter().enumerate() {
                let title = dev.title.as_deref().unwrap_or("(untitled)");
                println!("  {:>2}. {} ({} favourites)", rank + 1, title, dev.favourites);
            }
        }
    }

    if report.is_converged() {
        if json {
            print_json_report(&report, "converged");
        } else {
            println!("\nAlready converged. Nothing to do.");
        }
        return Ok(());
    }

    if !json {
        println!(
            "\nPlan: {} to add, {} to remove",
            report.plan.to_add.len(),
            report.plan.to_remove.len()
        );
        if verbose >= 1 {
            for op in report.plan.operations() {
                println!("  - {op}");
            }
        }
    }

    if dry_run {
        if json {
            print_json_report(&report, "planned");
        } else {
            println!("\nDry run - no operations applied.");
        }
        return Ok(());
    }

    if !yes {
        if !std::io::stdin().is_terminal() {
            anyhow::bail!(
                "refusing to apply {} operations without confirmation in a non-interactive session (pass --yes)",
                report.plan.len()
            );
        }
        let proceed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Apply {} operations to '{}'?",
                report.plan.len(),
                config.dest_gallery
            ))
            .default(false)
            .interact()?;
        if !proceed {
            println!("Aborted.");
            return Ok(());
        }
    }

    report.stats = engine
        .apply(&mut gallery, &report.plan)
        .context("applying operations")?;

    if json {
        print_json_report(&report, "applied");
    } else {
        println!("\n📊 Sync Results:");
        println!("  ✓ Added: {}", report.stats.added);
        println!("  ✓ Removed: {}", report.stats.removed);
        if report.stats.noops > 0 {
            println!("  ⚠ Already satisfied: {}", report.stats.noops);
        }
    }
    Ok(())
}

fn print_json_report(report: &SyncReport, status: &str) {
    let output = serde_json::json!({
        "event": "sync",
        "status": status,
        "scanned": report.scanned,
        "selected": report.selection.len(),
        "to_add": report.plan.to_add.len(),
        "to_remove": report.plan.to_remove.len(),
        "added": report.stats.added,
        "removed": report.stats.removed,
        "noops": report.stats.noops,
    });
    println!("{output}");
}

fn cmd_folders(json: bool, verbose: u8) -> Result<()> {
    let config = Config::resolve(&ConfigOverrides::default())?;
    let mut gallery = build_gallery(&config)?;
    let folders = gallery.folders().context("listing folders")?;

    if json {
        let entries: Vec<serde_json::Value> = folders
            .iter()
            .map(|f| {
                serde_json::json!({
                    "folderid": f.folderid,
                    "name": f.name,
                    "parent": f.parent,
                    "size": f.size,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({"event": "folders", "folders": entries})
        );
    } else {
        println!("🎨 Gallery folders ({}):", folders.len());
        for f in folders {
            let size = f
                .size
                .map(|s| s.to_string())
                .unwrap_or_else(|| "?".to_string());
            if verbose >= 1 {
                println!("  - {} ({} deviations) [{}]", f.name, size, f.folderid);
            } else {
                println!("  - {} ({} deviations)", f.name, size);
            }
        }
    }
    Ok(())
}

fn cmd_authorize(redirect_uri: Option<String>, json: bool) -> Result<()> {
    let config = Config::resolve(&ConfigOverrides::default())?;
    let redirect_uri = redirect_uri.unwrap_or_else(|| config.redirect_uri.clone());

    let url = build_authorize_url(&config.client_id, &redirect_uri, &config.scopes)?;

    println!("🔑 featured-sync authorize");
    println!("\nOpen this URL in your browser and approve access:");
    println!("\n  {url}\n");
    println!("After approving, the browser lands on {redirect_uri}.");
    println!("Copy the 'code' query parameter from that address.");

    if !std::io::stdin().is_terminal() {
        anyhow::bail!("authorize requires an interactive terminal");
    }
    let code: String = dialoguer::Input::new()
        .with_prompt("Authorization code")
        .interact_text()?;

    let http = reqwest::blocking::Client::builder()
        .build()
        .context("creating HTTP client")?;
    let grant = TokenProvider::exchange_code(
        &http,
        &config.client_id,
        &config.client_secret,
        code.trim(),
        &redirect_uri,
    )
    .context("exchanging authorization code")?;

    let refresh_token = grant
        .refresh_token
        .ok_or_else(|| anyhow::anyhow!("token response carried no refresh token"))?;
    let store = TokenStore::new()?;
    store.save(&refresh_token)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "event": "authorize",
                "status": "stored",
                "path": store.path(),
            })
        );
    } else {
        println!("\n✓ Refresh token stored at {}", store.path().display());
        println!("You can now run 'featured-sync sync'.");
    }
    Ok(())
}
