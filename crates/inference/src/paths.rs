use std::path::{Path, PathBuf};

pub const MODEL_DIR_ENV: &str = "ABSA_MODEL_DIR";
pub const MODELS_DIR_NAME: &str = "models";
pub const ASPECT_MODEL_DIR: &str = "aspect";
pub const SENTIMENT_MODEL_DIR: &str = "sentiment";

/// Model root: `ABSA_MODEL_DIR`, else the nearest `models/` with an `aspect/` subdirectory found
/// walking up from the current directory, else `./models`.
pub fn model_dir() -> PathBuf {
    if let Ok(path) = std::env::var(MODEL_DIR_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if let Some(found) = find_models_upwards(&cwd) {
            return found;
        }
    }

    PathBuf::from(MODELS_DIR_NAME)
}

pub fn find_models_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(MODELS_DIR_NAME);
        if candidate.join(ASPECT_MODEL_DIR).is_dir() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}
