use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::app::fixtures::Fixtures;
use crate::app::status::render_status;
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::core::router::EventRouter;
use crate::core::storage::{SqliteStorage, Storage, create_storage};
use crate::core::types::GamificationState;
use crate::llm::create_backend;
use crate::observability::{Observer, create_observer};

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Process { event, fixtures } => {
            run_process(&config, event.as_deref(), fixtures.as_deref()).await
        }

        Commands::Import { file } => {
            let fixtures = Fixtures::load(&file).await?;
            let path = config.storage.resolved_path();
            let storage = SqliteStorage::open(&path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let summary = fixtures.import_into(&storage).await?;
            info!(
                users = summary.users,
                tasks = summary.tasks,
                "imported fixtures into {}",
                path.display()
            );
            println!(
                "Imported {} task(s) for {} user(s) into {}",
                summary.tasks,
                summary.users,
                path.display()
            );
            Ok(())
        }

        Commands::Status { user } => {
            let storage = create_storage(&config.storage).await?;
            let state = storage
                .get_gamification_state(&user)
                .await?
                .unwrap_or_else(|| GamificationState::new(&user));
            println!("{}", render_status(&config, &config.level_table()?, &state));
            Ok(())
        }

        Commands::Config => {
            let mut shown = config.clone();
            if shown.generation.api_key.is_some() {
                shown.generation.api_key = Some("***".into());
            }
            println!("# {}", config.config_path.display());
            println!(
                "{}",
                toml::to_string_pretty(&shown).context("Failed to serialize config")?
            );
            Ok(())
        }
    }
}

async fn run_process(config: &Config, event: Option<&Path>, fixtures: Option<&Path>) -> Result<()> {
    let raw = match event {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read event {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read event from stdin")?;
            buf
        }
    };
    let value: serde_json::Value = serde_json::from_str(&raw).context("Event is not valid JSON")?;

    let storage: Arc<dyn Storage> = match fixtures {
        Some(path) => Arc::new(Fixtures::load(path).await?.into_memory()),
        None => create_storage(&config.storage).await?,
    };
    let observer: Arc<dyn Observer> = Arc::from(create_observer(&config.observability));
    let router = EventRouter::new(
        storage,
        create_backend(&config.generation),
        Arc::clone(&observer),
        config,
    )?;

    let response = router.process_value(value).await;
    observer.flush();
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
