mod ai;
mod analytics;
mod categorize;
mod config;
mod db;
mod error;
mod events;
mod import;
mod logging;
mod models;
mod receipt;
mod run;
mod state;
mod ui;

use anyhow::{Context, Result};
use std::path::Path;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let proj_dirs = directories::ProjectDirs::from("com", "budgetrack", "Budgetrack")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    let config_dir = proj_dirs.config_dir();
    ensure_dir(data_dir)?;

    let config = config::Config::load(config_dir)?;
    logging::init(data_dir, config.log_level.as_deref())?;

    let db_path = config
        .db_path
        .clone()
        .unwrap_or_else(|| data_dir.join("budgetrack.db"));
    let mut db = db::Database::open(&db_path)?;
    tracing::info!(db = %db_path.display(), ai = ?config.ai.base_url, "Budgetrack starting");

    let state = db
        .load_state()?
        .unwrap_or_else(|| state::AppState::new(models::MonthKey::current()));
    let suggester = categorize::CategorySuggester::new().with_learned(db.learned_categories()?);

    match args.len() {
        1 => run::as_tui(&mut db, &config, state, suggester),
        2.. => run::as_cli(
            &args,
            run::CliContext {
                db: &mut db,
                config: &config,
                state,
                suggester,
            },
        ),
        _ => {
            eprintln!("Usage: budgetrack [command]");
            Ok(())
        }
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory: {}", dir.display()))
}
