//! Writing finished roadmaps to disk

use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Errors while saving a roadmap
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Invalid output file name: '{0}'")]
    InvalidName(String),

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Save `text` as `dir/file_name`, creating `dir` if needed
///
/// `file_name` may contain subdirectories but must stay inside `dir`.
pub fn save_roadmap(dir: &Path, file_name: &str, text: &str) -> Result<PathBuf, OutputError> {
    debug!(?dir, %file_name, "save_roadmap: called");
    let name = Path::new(file_name);
    let inside = name.components().all(|c| matches!(c, Component::Normal(_)));
    if file_name.trim().is_empty() || !inside || name.file_name().is_none() {
        debug!("save_roadmap: rejected file name");
        return Err(OutputError::InvalidName(file_name.to_string()));
    }
    write_roadmap(&dir.join(name), text)
}

/// Write `text` to `path`, creating parent directories
pub fn write_roadmap(path: &Path, text: &str) -> Result<PathBuf, OutputError> {
    debug!(?path, len = text.len(), "write_roadmap: called");
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut contents = text.to_string();
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    fs::write(path, contents).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Roadmap saved to {}", path.display());
    Ok(path.to_path_buf())
}
