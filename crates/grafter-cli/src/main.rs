//! Grafter CLI - Grafana dashboard updater for the Checkmk connector.
//!
//! This binary migrates dashboards from the legacy v1 connector query schema
//! to the v2 schema, either across a whole Grafana SQLite database or for a
//! single exported dashboard JSON file.

use anyhow::{bail, Result};
use clap::Parser;
use grafter_core::store::file;
use grafter_core::{
    migrate_dashboard, Dashboard, GrafanaDb, MigrationConfig, WebApiResolver,
};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "grafter")]
#[command(about = "Grafana dashboard updater for the Checkmk connector")]
struct Args {
    /// Grafana SQLite database to migrate in place
    #[arg(short = 'd', long, conflicts_with = "dashboard_file")]
    db_file: Option<PathBuf>,

    /// Single exported dashboard JSON file to migrate
    #[arg(long, required_unless_present = "db_file")]
    dashboard_file: Option<PathBuf>,

    /// Name of the old connector datasource (version 1.x)
    #[arg(short = 'o', long)]
    datasource_old: String,

    /// Name of the new connector datasource (version 2.x)
    #[arg(short = 'n', long)]
    datasource_new: String,

    /// Replacement dashboard title
    #[arg(long)]
    new_title: Option<String>,

    /// Checkmk site URL (file mode; db mode reads it from the datasource)
    #[arg(long)]
    url: Option<String>,

    /// Automation user name (file mode)
    #[arg(long)]
    username: Option<String>,

    /// Automation user secret (file mode)
    #[arg(long)]
    secret: Option<String>,

    /// Where to write the migrated dashboard (file mode; default stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Migrate without writing anything back
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn migration_config(&self) -> MigrationConfig {
        let config = MigrationConfig::new(&self.datasource_old, &self.datasource_new);
        match &self.new_title {
            Some(title) => config.with_title(title),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match &args.db_file {
        Some(db_file) => migrate_database(&args, db_file).await,
        None => migrate_file(&args).await,
    }
}

/// Migrate every dashboard in a Grafana database, resolver credentials
/// taken from the stored legacy datasource.
async fn migrate_database(args: &Args, db_file: &PathBuf) -> Result<()> {
    let db = GrafanaDb::open(db_file)?;
    let datasource = db.datasource_config(&args.datasource_old)?;
    let resolver = WebApiResolver::for_datasource(&datasource)?;
    let config = args.migration_config();

    let rows = db.dashboards()?;
    info!("Checking {} dashboards in {}", rows.len(), db_file.display());

    let mut touched = 0;
    for row in rows {
        let mut dashboard: Dashboard = match serde_json::from_str(&row.data) {
            Ok(dashboard) => dashboard,
            Err(e) => {
                warn!("Skipping dashboard {} with unreadable JSON: {}", row.id, e);
                continue;
            }
        };

        let migrated = migrate_dashboard(&mut dashboard, &config, &resolver).await?;
        if migrated == 0 {
            continue;
        }
        touched += 1;
        if args.dry_run {
            info!(
                "Would save dashboard {} ({} targets migrated)",
                row.id, migrated
            );
        } else {
            db.save_dashboard(&row, &mut dashboard)?;
        }
    }

    info!("Done, {} dashboards migrated", touched);
    Ok(())
}

/// Migrate one exported dashboard JSON file.
async fn migrate_file(args: &Args) -> Result<()> {
    let Some(dashboard_file) = &args.dashboard_file else {
        bail!("either --db-file or --dashboard-file is required");
    };
    let (Some(url), Some(username), Some(secret)) = (&args.url, &args.username, &args.secret)
    else {
        bail!("file mode needs --url, --username and --secret for the graph resolver");
    };

    let resolver = WebApiResolver::new(url, username, secret)?;
    let mut dashboard = file::load_dashboard(dashboard_file)?;
    let migrated = migrate_dashboard(&mut dashboard, &args.migration_config(), &resolver).await?;
    info!(
        "Migrated {} targets in {}",
        migrated,
        dashboard_file.display()
    );

    if args.dry_run {
        return Ok(());
    }
    match &args.output {
        Some(output) => file::save_dashboard(output, &dashboard)?,
        None => println!("{}", serde_json::to_string_pretty(&dashboard)?),
    }
    Ok(())
}
