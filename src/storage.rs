use crate::errors::AppError;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::error;

/// Reads a JSON document, falling back to `T::default()` when the file is
/// missing or unreadable.
pub async fn load_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse {}: {err}", path.display());
                T::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => T::default(),
        Err(err) => {
            error!("failed to read {}: {err}", path.display());
            T::default()
        }
    }
}

pub async fn persist_json<T: Serialize>(path: &Path, data: &T) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
