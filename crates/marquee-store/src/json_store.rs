//! JSON file store: one pretty-printed file per collection.
//!
//! Collections are read and written whole. A save serializes the document to
//! `<name>.tmp` next to the target and renames it over the target, so a crash
//! mid-write leaves the previous version intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use marquee_core::error::AppError;
use marquee_core::traits::DocumentStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::PrettyFormatter;

/// Indentation of stored files.
const INDENT: &[u8] = b"    ";

/// Document store backed by a directory of JSON files.
///
/// # Examples
///
/// ```no_run
/// use marquee_core::traits::DocumentStore;
/// use marquee_store::JsonFileStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = JsonFileStore::new("data");
/// let movies: Vec<serde_json::Value> = store.load("movies.json", Vec::new()).await?;
/// println!("{} movies stored", movies.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a collection name to its file path.
    ///
    /// Names are plain file names; anything that would escape the root is
    /// rejected.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, AppError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\');
        if !valid {
            return Err(AppError::ConfigError(format!(
                "Invalid collection name: '{}'",
                name
            )));
        }
        Ok(self.root.join(name))
    }
}

/// Serializes `document` as JSON indented with four spaces.
fn to_pretty_json<T: Serialize>(document: &T) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    document.serialize(&mut ser)?;
    Ok(buf)
}

impl DocumentStore for JsonFileStore {
    async fn load<T>(&self, name: &str, default: T) -> Result<T, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let path = self.path_for(name)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Collection not found, using default");
                return Ok(default);
            }
            Err(e) => return Err(AppError::StoreError(e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| AppError::CorruptDocument {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    async fn save<T>(&self, name: &str, document: &T) -> Result<(), AppError>
    where
        T: Serialize + Sync,
    {
        let path = self.path_for(name)?;
        let bytes = to_pretty_json(document)?;

        tokio::fs::create_dir_all(&self.root).await?;

        let tmp_path = self.root.join(format!("{}.tmp", name));
        tokio::fs::write(&tmp_path, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(AppError::StoreError(e));
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Collection saved");
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool, AppError> {
        let path = self.path_for(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}
