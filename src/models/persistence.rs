//! Model persistence: a trained generation as an opaque bincode blob

use crate::error::Result;
use crate::models::snapshot::TrainedModel;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Write a model to `path`.
///
/// The blob is written to a temporary file in the same directory and renamed
/// into place, so readers never see a half-written file.
pub fn save_model<P: AsRef<Path>>(model: &TrainedModel, path: P) -> Result<()> {
    let path = path.as_ref();
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        bincode::serialize_into(&mut writer, model)?;
        writer.flush()?;
    }
    temp_file.persist(path).map_err(|e| e.error)?;

    info!(
        generation = %model.generation,
        path = %path.display(),
        "Model saved"
    );
    Ok(())
}

/// Read a model written by [`save_model`].
///
/// Only decoding is checked; integrity of the stored blob is the caller's
/// concern.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<TrainedModel> {
    let path = path.as_ref();
    // decode from memory so a corrupt length prefix fails instead of allocating
    let bytes = fs::read(path)?;
    let model: TrainedModel = bincode::deserialize(&bytes)?;

    info!(
        generation = %model.generation,
        path = %path.display(),
        accuracy = model.accuracy,
        categories = model.categories.len(),
        "Model loaded"
    );
    Ok(model)
}
