//! Configuration constants, validation functions and run configuration.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{RefineError, Result};

/// Remote JSON dump with one row per edited document.
pub const DOCUMENT_DUMP_URL: &str =
    "https://raw.githubusercontent.com/bundesverfassung-oesterreich/bv-entities/main/json_dumps/document.json";

/// Remote JSON dump with the project-level metadata.
pub const PROJECT_DUMP_URL: &str =
    "https://raw.githubusercontent.com/bundesverfassung-oesterreich/bv-entities/main/json_dumps/project_data.json";

/// Key of the project descriptor inside the project dump.
pub const PROJECT_DUMP_KEY: &str = "1";

/// File name of the cached document dump inside the METS directory.
pub const DOCUMENT_DUMP_FILE: &str = "document.json";

/// File name of the cached project dump inside the METS directory.
pub const PROJECT_DUMP_FILE: &str = "project_data.json";

/// Default output directory for refined editions.
pub const DEFAULT_EDITIONS_DIR: &str = "./editions";

/// Default directory holding Transkribus exports (METS + TEI per collection).
pub const DEFAULT_METS_DIR: &str = "./mets";

/// Default location of the malformed-document report.
pub const DEFAULT_MALFORMED_LOG: &str = "./logs/malformed_files.csv";

/// Default TEI template.
pub const DEFAULT_TEMPLATE: &str = "./templates/tei_template.xml";

/// Suffix of Transkribus TEI exports inside a collection directory.
pub const TEI_FILE_SUFFIX: &str = "_tei.xml";

/// Suffix of Transkribus METS files inside a collection directory.
pub const METS_FILE_SUFFIX: &str = "_mets.xml";

/// `ana` value of article divisions.
pub const ARTICLE_CLASS: &str = "article";

/// Substring a text run must contain before the marker pattern is tried.
pub const ARTICLE_MARKER_HINT: &str = "Art.";

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Article label: "Art", optional period, then nothing or a short label.
pub const ARTICLE_MARKER_REGEX: &str = r"^Art\.?( *$| .{0,10}$)";

/// Compiled article marker pattern.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub static ARTICLE_MARKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ARTICLE_MARKER_REGEX).expect("valid regex"));

/// Transkribus ids are plain decimal numbers.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TRANSKRIBUS_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));

/// Document identifiers end up as file names.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("valid regex"));

/// Validate a Transkribus collection or document id.
///
/// # Examples
/// ```
/// use bv_refiner::config::validate_transkribus_id;
///
/// assert!(validate_transkribus_id("182376").is_ok());
/// assert!(validate_transkribus_id("../etc").is_err());
/// ```
pub fn validate_transkribus_id(id: &str) -> Result<()> {
    if TRANSKRIBUS_ID_PATTERN.is_match(id) {
        Ok(())
    } else {
        Err(RefineError::InvalidIdentifier(id.to_string()))
    }
}

/// Validate a document identifier used for output naming.
///
/// # Examples
/// ```
/// use bv_refiner::config::validate_identifier;
///
/// assert!(validate_identifier("bv_doc__1").is_ok());
/// assert!(validate_identifier("a/b").is_err());
/// assert!(validate_identifier("..").is_err());
/// ```
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if IDENTIFIER_PATTERN.is_match(identifier) {
        Ok(())
    } else {
        Err(RefineError::InvalidIdentifier(identifier.to_string()))
    }
}

/// Settings for one refinement run.
#[derive(Debug, Clone)]
pub struct RefineConfig {
    /// Output directory; cleared at the start of a run.
    pub editions_dir: PathBuf,
    /// Transkribus export root, also home of the cached dumps.
    pub mets_dir: PathBuf,
    /// Malformed-document report.
    pub malformed_log: PathBuf,
    /// Template used to render each document.
    pub template: PathBuf,
    pub document_dump_url: String,
    pub project_dump_url: String,
    /// `ana` value given to created divisions.
    pub article_class: String,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            editions_dir: DEFAULT_EDITIONS_DIR.into(),
            mets_dir: DEFAULT_METS_DIR.into(),
            malformed_log: DEFAULT_MALFORMED_LOG.into(),
            template: DEFAULT_TEMPLATE.into(),
            document_dump_url: DOCUMENT_DUMP_URL.to_string(),
            project_dump_url: PROJECT_DUMP_URL.to_string(),
            article_class: ARTICLE_CLASS.to_string(),
        }
    }
}

impl RefineConfig {
    /// Defaults overridden by `BV_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("BV_EDITIONS_DIR") {
            config.editions_dir = dir.into();
        }
        if let Ok(dir) = std::env::var("BV_METS_DIR") {
            config.mets_dir = dir.into();
        }
        if let Ok(path) = std::env::var("BV_MALFORMED_LOG") {
            config.malformed_log = path.into();
        }
        if let Ok(path) = std::env::var("BV_TEMPLATE") {
            config.template = path.into();
        }
        if let Ok(url) = std::env::var("BV_DOCUMENT_DUMP_URL") {
            config.document_dump_url = url;
        }
        if let Ok(url) = std::env::var("BV_PROJECT_DUMP_URL") {
            config.project_dump_url = url;
        }

        config
    }

    #[must_use]
    pub fn with_editions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.editions_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_mets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mets_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_malformed_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.malformed_log = path.into();
        self
    }

    #[must_use]
    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template = path.into();
        self
    }

    #[must_use]
    pub fn with_dump_urls(
        mut self,
        document_dump_url: impl Into<String>,
        project_dump_url: impl Into<String>,
    ) -> Self {
        self.document_dump_url = document_dump_url.into();
        self.project_dump_url = project_dump_url.into();
        self
    }

    /// Local copy of the document dump.
    pub fn document_dump_path(&self) -> PathBuf {
        self.mets_dir.join(DOCUMENT_DUMP_FILE)
    }

    /// Local copy of the project dump.
    pub fn project_dump_path(&self) -> PathBuf {
        self.mets_dir.join(PROJECT_DUMP_FILE)
    }

    /// METS file of a Transkribus document.
    ///
    /// Both ids should be validated with [`validate_transkribus_id`] first.
    pub fn mets_file(&self, collection_id: &str, doc_id: &str) -> PathBuf {
        self.mets_dir
            .join(collection_id)
            .join(format!("{doc_id}{METS_FILE_SUFFIX}"))
    }
}
