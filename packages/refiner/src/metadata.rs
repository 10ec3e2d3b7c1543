//! Document and project metadata from the Baserow JSON dumps.
//!
//! Two dumps are published alongside the entity database:
//! - **document dump**: one row per edition, keyed by row id, each carrying
//!   the edition identifier (`bv_id`) and the Transkribus collection and
//!   document ids of its transcription
//! - **project dump**: project-wide descriptors; the entry under key `"1"` is
//!   handed to every rendered document
//!
//! Both are cached in the METS directory. The document dump is fetched only
//! when its cached copy is absent and is removed again at the end of a run,
//! so the next run picks up edits made in the meantime.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config::{RefineConfig, PROJECT_DUMP_KEY};
use crate::error::{RefineError, Result};
use crate::http::download_json;
use crate::output::write_atomic;

/// One row of the document dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Edition identifier, also the output file stem.
    #[serde(deserialize_with = "string_or_number")]
    pub bv_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub transkribus_col_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub transkribus_doc_id: String,
    /// Every other column, passed through to the template.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Project-wide descriptor shared by all documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectMetadata(pub Value);

impl ProjectMetadata {
    /// Pick the project entry out of a project dump.
    pub fn from_dump(dump: &Value) -> Result<Self> {
        dump.get(PROJECT_DUMP_KEY)
            .cloned()
            .map(Self)
            .ok_or_else(|| RefineError::MissingProjectMetadata(PROJECT_DUMP_KEY.to_string()))
    }
}

/// Document metadata grouped by Transkribus collection, then document id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataStore {
    collections: BTreeMap<String, BTreeMap<String, DocumentMetadata>>,
}

impl MetadataStore {
    /// Group the rows of a document dump.
    ///
    /// Rows without usable ids are skipped with a warning.
    pub fn from_dump(dump: &Value) -> Result<Self> {
        let rows = dump.as_object().ok_or_else(|| RefineError::MissingElement {
            element: "rows object".to_string(),
            context: "document dump".to_string(),
        })?;

        let mut store = Self::default();
        for (row_id, row) in rows {
            match DocumentMetadata::deserialize(row) {
                Ok(metadata) => store.insert(metadata),
                Err(e) => {
                    tracing::warn!(row_id = %row_id, error = %e, "Skipping unusable metadata row");
                }
            }
        }
        Ok(store)
    }

    pub fn insert(&mut self, metadata: DocumentMetadata) {
        self.collections
            .entry(metadata.transkribus_col_id.clone())
            .or_default()
            .insert(metadata.transkribus_doc_id.clone(), metadata);
    }

    /// Metadata of one Transkribus document.
    pub fn get(&self, collection: &str, document: &str) -> Result<&DocumentMetadata> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(document))
            .ok_or_else(|| RefineError::MissingMetadata {
                collection: collection.to_string(),
                document: document.to_string(),
            })
    }

    /// Collection ids, sorted.
    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Number of documents over all collections.
    pub fn len(&self) -> usize {
        self.collections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Local copies of the two dumps and where to fetch them from.
#[derive(Debug, Clone)]
pub struct MetadataCache {
    pub document_path: PathBuf,
    pub project_path: PathBuf,
    pub document_url: String,
    pub project_url: String,
}

impl MetadataCache {
    pub fn from_config(config: &RefineConfig) -> Self {
        Self {
            document_path: config.document_dump_path(),
            project_path: config.project_dump_path(),
            document_url: config.document_dump_url.clone(),
            project_url: config.project_dump_url.clone(),
        }
    }

    /// Download whichever dump has no local copy yet.
    ///
    /// A missing document dump refreshes the project dump as well.
    pub fn prime(&self, client: &Client) -> Result<()> {
        let refresh_documents = !self.document_path.exists();
        if refresh_documents || !self.project_path.exists() {
            fetch_dump(client, &self.project_url, &self.project_path)?;
        }
        if refresh_documents {
            fetch_dump(client, &self.document_url, &self.document_path)?;
        }
        Ok(())
    }

    /// Prime the cache and read both dumps.
    pub fn load(&self, client: &Client) -> Result<(ProjectMetadata, MetadataStore)> {
        self.prime(client)?;
        let project = ProjectMetadata::from_dump(&read_json(&self.project_path)?)?;
        let store = MetadataStore::from_dump(&read_json(&self.document_path)?)?;
        tracing::info!(documents = store.len(), "Loaded document metadata");
        Ok((project, store))
    }

    /// Drop the cached document dump. Absent files are fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.document_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn fetch_dump(client: &Client, url: &str, path: &Path) -> Result<Value> {
    tracing::info!(%url, path = %path.display(), "Downloading metadata dump");
    let dump = download_json(client, url)?;
    write_atomic(path, &serde_json::to_vec(&dump)?)?;
    Ok(dump)
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

/// Accept ids exported either as JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}
