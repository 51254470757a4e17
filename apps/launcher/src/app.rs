//! Command dispatch. This task is the owner of the catalog: it loads it,
//! submits jobs, and drains their events.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use opengames_catalog::{CatalogStore, GameRecord};
use opengames_jobs::{JobEvent, JobRunner, Submission};
use opengames_launch::{LaunchDispatcher, ProcessLauncher};
use tokio::runtime::Handle;

use crate::cli::Command;
use crate::config::Config;

/// Runs one command to completion.
pub async fn run(config: Config, command: Command) -> anyhow::Result<()> {
    let store = CatalogStore::new(&config.catalog_dir);
    let catalog = store
        .load()
        .with_context(|| format!("loading catalog from {}", config.catalog_dir))?;
    tracing::debug!(games = catalog.len(), "catalog loaded");

    let dispatcher = LaunchDispatcher::system().with_protocols(config.extra_protocols.clone());
    let mut runner = JobRunner::new(Handle::current(), dispatcher, &config.http())?
        .with_news_limit(config.news_max_chars);

    match command {
        Command::List => print_catalog(&catalog),
        Command::Add { executable } => {
            let record = store.quick_add(&executable)?;
            println!("Added {} ({})", record.label(), record.id);
        }
        Command::Play { id } => {
            let record = find_record(&catalog, &id)?;
            let outcome = runner.launch(record);
            println!("{outcome}");
            if !outcome.success {
                bail!("could not launch {}", record.label());
            }
        }
        Command::News { id } => {
            let record = find_record(&catalog, &id)?;
            let submission = runner.fetch_bulletin(record);
            let text = finish(&mut runner, submission).await?;
            println!("{text}");
            println!("News loaded.");
        }
        Command::Update { id } => {
            let record = find_record(&catalog, &id)?;
            let submission = runner.run_update(record);
            let message = finish(&mut runner, submission).await?;
            println!("{message}");
        }
        Command::Open { id } => {
            let record = find_record(&catalog, &id)?;
            println!("{}", runner.dispatcher().reveal(&folder_for(record)));
        }
        Command::Edit { id } => {
            let record = id.as_deref().map(|id| find_record(&catalog, id)).transpose()?;
            println!("{}", runner.dispatcher().reveal(&edit_target(record, store.dir())));
        }
    }
    Ok(())
}

fn print_catalog(catalog: &[GameRecord]) {
    let width = catalog.iter().map(|r| r.id.len()).max().unwrap_or(0);
    for record in catalog {
        println!("{:width$}  {}  {}", record.id, record.label(), record.game_path);
    }
}

fn find_record<'a>(catalog: &'a [GameRecord], id: &str) -> anyhow::Result<&'a GameRecord> {
    match catalog.iter().find(|r| r.id == id) {
        Some(record) => Ok(record),
        None => bail!("no game with id '{id}'"),
    }
}

/// Folder opened for a record: its working directory, else the folder of
/// its launch target, else the current directory.
fn folder_for(record: &GameRecord) -> PathBuf {
    if !record.work_dir.is_empty() {
        return PathBuf::from(&record.work_dir);
    }
    Path::new(&record.game_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// The record's backing file if it exists, otherwise the catalog folder.
fn edit_target(record: Option<&GameRecord>, catalog_dir: &Path) -> PathBuf {
    record
        .and_then(|r| r.meta_path.as_ref())
        .filter(|p| p.exists())
        .cloned()
        .unwrap_or_else(|| catalog_dir.to_path_buf())
}

/// Waits for a submitted job, printing its progress, and returns the
/// message of its final event.
async fn finish<L: ProcessLauncher>(
    runner: &mut JobRunner<L>,
    submission: Submission,
) -> anyhow::Result<String> {
    let job = match submission {
        Submission::Started(handle) => handle.id,
        Submission::Skipped(reason) => bail!("{reason}"),
    };

    let mut last_decile = None;
    while let Some(event) = runner.recv().await {
        if event.job() != job {
            continue;
        }
        match event {
            JobEvent::Progress { fraction, .. } => {
                let decile = progress_decile(fraction);
                if last_decile != Some(decile) {
                    last_decile = Some(decile);
                    println!("{:>3}%", decile * 10);
                }
            }
            JobEvent::Status { message, .. } => println!("{message}"),
            JobEvent::Done {
                success, message, ..
            } => {
                if success {
                    return Ok(message);
                }
                bail!("{message}");
            }
        }
    }
    bail!("job {job} ended without a result")
}

fn progress_decile(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 10.0).floor() as u8
}
