use super::{load_project, write_document};
use crate::cli::{ComputeArgs, TargetSelection};
use crate::config::PartialEngineConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use fieldlines::core::io::lines::LinesDocument;
use fieldlines::engine::progress::ProgressReporter;
use fieldlines::workflows::recompute::{self, Selection};
use tracing::info;

pub async fn run(args: ComputeArgs) -> Result<()> {
    let config = PartialEngineConfig::resolve(&args.engine)?;
    let mut project = load_project(&args.input)?;
    let selection = selection_from(args.target);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Tracing field lines...");
    info!(?selection, "Invoking the recompute workflow...");
    let summary = tokio::task::block_in_place(|| {
        recompute::run(&mut project, selection, &config, &reporter)
    })?;

    let active_index = project.active_id().and_then(|id| project.index_of(id));
    let document = LinesDocument::from_project(&project, |index, _| match selection {
        Selection::All => true,
        Selection::Index(target) => index == target,
        Selection::Active => Some(index) == active_index,
    });
    write_document(&document, &args.output)?;

    println!(
        "✓ Traced {} line(s) in {} simulation(s); written to: {}",
        summary.lines,
        summary.simulations,
        args.output.display()
    );
    Ok(())
}

fn selection_from(target: TargetSelection) -> Selection {
    match (target.all, target.simulation) {
        (true, _) => Selection::All,
        (false, Some(index)) => Selection::Index(index),
        (false, None) => Selection::Active,
    }
}
