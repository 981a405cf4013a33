pub mod compute;
pub mod inspect;
pub mod replay;

use crate::error::{CliError, Result};
use fieldlines::core::io::project::ProjectDocument;
use fieldlines::core::io::traits::JsonDocument;
use fieldlines::core::models::project::Project;
use std::path::Path;
use tracing::info;

pub(crate) fn load_project(path: &Path) -> Result<Project> {
    info!("Loading project from {:?}", path);
    ProjectDocument::read_from_path(path)
        .and_then(ProjectDocument::into_project)
        .map_err(|source| CliError::Document {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn write_document<D: JsonDocument>(document: &D, path: &Path) -> Result<()> {
    info!("Writing {:?}", path);
    document.write_to_path(path).map_err(|source| CliError::Document {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn save_project(project: &Project, path: &Path) -> Result<()> {
    let document = ProjectDocument::from_project(project).map_err(|source| CliError::Document {
        path: path.to_path_buf(),
        source,
    })?;
    write_document(&document, path)
}
