use super::{load_project, save_project, write_document};
use crate::cli::ReplayArgs;
use crate::config::PartialEngineConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use fieldlines::core::io::lines::LinesDocument;
use fieldlines::engine::interaction::Action;
use fieldlines::engine::progress::ProgressReporter;
use fieldlines::workflows::replay;
use std::path::Path;
use tracing::info;

pub async fn run(args: ReplayArgs) -> Result<()> {
    let config = PartialEngineConfig::resolve(&args.engine)?;
    let mut project = load_project(&args.input)?;
    let actions = load_actions(&args.actions)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Replaying {} action(s)...", actions.len());
    let summary = replay::run(&mut project, &actions, &config, &reporter).await?;
    info!(?summary, "Replay workflow finished.");

    let document = LinesDocument::from_project(&project, |index, _| {
        project.id_at(index).is_some_and(|id| project.is_active(id))
    });
    write_document(&document, &args.output)?;
    if let Some(path) = &args.save {
        save_project(&project, path)?;
        println!("✓ Project saved to: {}", path.display());
    }

    println!(
        "✓ {} action(s) replayed ({} ignored, {} recompute(s) issued); lines written to: {}",
        summary.actions,
        summary.ignored,
        summary.requests,
        args.output.display()
    );
    Ok(())
}

fn load_actions(path: &Path) -> Result<Vec<Action>> {
    info!("Loading actions from {:?}", path);
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}
