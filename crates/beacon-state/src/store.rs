//! DocumentStore: one JSON document at a fixed path.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use beacon_core::{MappingDocument, StatusReport, StatusSource};

use crate::error::{StateError, StateResult};

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Store for the last computed status report (`status.json`).
pub type ReportStore = DocumentStore<StatusReport>;

/// Store for the component mapping document (`statuspage.json`).
pub type MappingStore = DocumentStore<MappingDocument>;

/// Store for the generated status-source document (`checks.json`).
pub type SourceStore = DocumentStore<StatusSource>;

/// Typed access to a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct DocumentStore<T> {
    path: PathBuf,
    _doc: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> DocumentStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. A missing file is `Ok(None)`.
    pub fn load(&self) -> StateResult<Option<T>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StateError::Read(format!("{}: {e}", self.path.display()))),
        };
        let doc = serde_json::from_slice(&bytes).map_err(map_err!(Deserialize))?;
        debug!(path = %self.path.display(), "document loaded");
        Ok(Some(doc))
    }

    /// Load the document, treating unreadable or malformed content as absent.
    pub fn load_lenient(&self) -> Option<T> {
        match self.load() {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable document");
                None
            }
        }
    }

    /// Overwrite the document, creating parent directories as needed.
    pub fn save(&self, doc: &T) -> StateResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(map_err!(Write))?;
        }

        let mut body = serde_json::to_string_pretty(doc).map_err(map_err!(Serialize))?;
        body.push('\n');

        let tmp = self.tmp_path();
        std::fs::write(&tmp, body).map_err(map_err!(Write))?;
        std::fs::rename(&tmp, &self.path).map_err(map_err!(Write))?;
        debug!(path = %self.path.display(), "document written");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
