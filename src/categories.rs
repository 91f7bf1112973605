use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::{fs, sync::RwLock};

use crate::domain::normalize_categories;

/// User interest categories persisted as a JSON array on disk.
pub struct CategoryStore {
    path: PathBuf,
    categories: RwLock<Vec<String>>,
}

impl CategoryStore {
    /// Loads the file if present. A missing or unreadable file yields an
    /// empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let categories = match read_file(&path).await {
            Ok(Some(categories)) => categories,
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(
                    target: "categories",
                    path = %path.display(),
                    error = %err,
                    "failed to load categories; starting empty"
                );
                Vec::new()
            }
        };
        tracing::info!(
            target: "categories",
            count = categories.len(),
            "loaded categories"
        );
        Self {
            path,
            categories: RwLock::new(categories),
        }
    }

    pub async fn list(&self) -> Vec<String> {
        self.categories.read().await.clone()
    }

    /// Normalizes, persists and swaps in the new set. Writers are serialized
    /// by the lock; memory is left untouched when the write fails.
    pub async fn replace<I, S>(&self, raw: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let categories = normalize_categories(raw);
        let mut guard = self.categories.write().await;
        write_file(&self.path, &categories).await?;
        *guard = categories.clone();
        tracing::info!(
            target: "categories",
            categories = ?categories,
            "categories updated"
        );
        Ok(categories)
    }
}

async fn read_file(path: &Path) -> Result<Option<Vec<String>>> {
    let data = match fs::read_to_string(path).await {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    let raw: Vec<String> = serde_json::from_str(&data)
        .with_context(|| format!("invalid categories file {}", path.display()))?;
    Ok(Some(normalize_categories(raw)))
}

async fn write_file(path: &Path, categories: &[String]) -> Result<()> {
    let data = serde_json::to_string_pretty(categories)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)
        .await
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
