//! Full refinement run over a Transkribus export.
//!
//! Layout of the inputs:
//!
//! ```text
//! mets/
//!   document.json              cached document dump
//!   project_data.json          cached project dump
//!   <collection>/
//!     <doc_id>_tei.xml         transcription
//!     <doc_id>_mets.xml        page images
//! ```
//!
//! Every collection named in the document dump is visited; each
//! transcription found there is refined into `<editions>/<bv_id>.xml`.
//! Inputs that do not parse go to the malformed-document report, every other
//! per-document failure is logged and counted, and the run moves on.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{validate_transkribus_id, RefineConfig, TEI_FILE_SUFFIX};
use crate::document::refine_document;
use crate::error::{RefineError, Result};
use crate::http::create_client;
use crate::metadata::{MetadataCache, MetadataStore, ProjectMetadata};
use crate::mets::{read_mets, transkribus_doc_id};
use crate::output::{reset_dir, write_atomic};
use crate::report::{write_report, MalformedDocument};
use crate::segment::SectionSpec;
use crate::template::{PlaceholderTemplate, TemplateRenderer};
use crate::tree::Tree;

/// A transcription that parsed but could not be refined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDocument {
    pub file_name: String,
    pub error: String,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Written edition files, in processing order.
    pub written: Vec<PathBuf>,
    pub failed: Vec<FailedDocument>,
    pub malformed: Vec<MalformedDocument>,
    /// Divisions created over all written documents.
    pub articles: usize,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.written.len() + self.failed.len() + self.malformed.len()
    }
}

/// Progress notifications for front ends.
#[derive(Debug, Clone, Copy)]
pub enum RunEvent<'a> {
    /// Number of transcriptions about to be processed.
    Started { total: usize },
    /// A transcription is being processed.
    Document { path: &'a Path },
}

/// Everything that stays fixed over one run.
pub struct RunContext<'a> {
    pub config: &'a RefineConfig,
    pub project: &'a ProjectMetadata,
    pub store: &'a MetadataStore,
    pub renderer: &'a dyn TemplateRenderer,
    pub spec: &'a SectionSpec,
}

/// Load metadata and template, refine everything, write the report and drop
/// the cached document dump.
pub fn refine_all<F>(config: &RefineConfig, progress: F) -> Result<RunSummary>
where
    F: FnMut(RunEvent<'_>),
{
    let client = create_client()?;
    let cache = MetadataCache::from_config(config);
    let (project, store) = cache.load(&client)?;
    let template = PlaceholderTemplate::load(&config.template)?;
    let spec = SectionSpec::articles().with_class(config.article_class.as_str());

    let context = RunContext {
        config,
        project: &project,
        store: &store,
        renderer: &template,
        spec: &spec,
    };
    let summary = process_collections(&context, progress)?;

    write_report(&config.malformed_log, &summary.malformed)?;
    cache.clear()?;
    Ok(summary)
}

/// Clear the editions directory and refine every transcription of every
/// collection in the metadata store.
pub fn process_collections<F>(context: &RunContext<'_>, mut progress: F) -> Result<RunSummary>
where
    F: FnMut(RunEvent<'_>),
{
    reset_dir(&context.config.editions_dir)?;

    let mut work = Vec::new();
    for collection in context.store.collections() {
        if let Err(e) = validate_transkribus_id(collection) {
            tracing::warn!(collection, error = %e, "Skipping collection");
            continue;
        }
        let dir = context.config.mets_dir.join(collection);
        for path in source_files(&dir)? {
            work.push((collection, path));
        }
    }

    progress(RunEvent::Started { total: work.len() });

    let mut summary = RunSummary::default();
    let mut identifiers = HashSet::new();
    for (collection, path) in &work {
        progress(RunEvent::Document {
            path: path.as_path(),
        });
        let file_name = path.display().to_string();

        let tree = match read_tree(path) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "Malformed input");
                summary.malformed.push(MalformedDocument::new(file_name, e));
                continue;
            }
        };

        match process_document(context, collection, path, tree) {
            Ok((output, articles)) => {
                if !identifiers.insert(output.clone()) {
                    tracing::warn!(path = %output.display(), "Edition written more than once");
                }
                summary.articles += articles;
                summary.written.push(output);
            }
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "Document skipped");
                summary.failed.push(FailedDocument {
                    file_name,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        written = summary.written.len(),
        failed = summary.failed.len(),
        malformed = summary.malformed.len(),
        "Run finished"
    );
    Ok(summary)
}

/// Transcriptions (`*_tei.xml`) in a collection directory, sorted.
///
/// A missing directory has no transcriptions.
pub fn source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "Collection directory missing");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_source = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(TEI_FILE_SUFFIX));
        if is_source && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_tree(path: &Path) -> Result<Tree> {
    let xml = fs::read_to_string(path)?;
    Tree::parse(&xml)
}

/// Refine one parsed transcription and write it. Returns the output path and
/// the number of created divisions.
fn process_document(
    context: &RunContext<'_>,
    collection: &str,
    path: &Path,
    tree: Tree,
) -> Result<(PathBuf, usize)> {
    let doc_id = transkribus_doc_id(path)
        .ok_or_else(|| RefineError::InvalidIdentifier(path.display().to_string()))?;
    validate_transkribus_id(&doc_id)?;

    let metadata = context.store.get(collection, &doc_id)?;
    let mets = read_mets(&context.config.mets_file(collection, &doc_id))?;
    if let Some(mets_id) = mets.collection_id.as_deref() {
        tracing::debug!(doc_id = %doc_id, mets_id, "Read METS file");
    }

    let refined = refine_document(
        tree,
        metadata,
        context.project,
        &mets.image_urls,
        context.renderer,
        context.spec,
    )?;

    let output = context
        .config
        .editions_dir
        .join(format!("{}.xml", refined.identifier));
    write_atomic(&output, refined.xml.as_bytes())?;
    Ok((output, refined.segments.divisions.len()))
}
