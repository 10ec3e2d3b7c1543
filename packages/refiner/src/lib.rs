//! BV Refiner - Turn Transkribus TEI exports into article-segmented editions.
//!
//! Transcriptions of the drafts of the Austrian federal constitution arrive
//! as flat TEI: article labels such as "Art. 12" are plain text after line
//! breaks, buried at arbitrary depth. This crate restructures each body into
//! `<div ana="article">` sections, wires the page images into the facsimile
//! and renders the result into the edition template.
//!
//! # Example
//!
//! ```
//! use bv_refiner::segment::{segment_sections, SectionSpec};
//! use bv_refiner::tree::{NamespaceMode, Tree};
//!
//! let mut tree = Tree::parse("<body><p>Art. 0<lb/>Art. 1<lb/>Text</p></body>").unwrap();
//! let body = tree.root();
//! let report = segment_sections(&mut tree, body, &SectionSpec::articles());
//!
//! assert_eq!(report.divisions.len(), 1);
//! assert!(tree
//!     .to_fragment(body, NamespaceMode::Keep)
//!     .contains("<head>Art. 1</head>"));
//! ```
//!
//! # Architecture
//!
//! - [`tree`]: arena tree with the text/tail model
//! - [`segment`]: article segmentation passes and cleanup
//! - [`facsimile`]: image URLs and zone removal
//! - [`mets`]: METS image lists and file-name ids
//! - [`metadata`]: JSON metadata dumps and their local cache
//! - [`template`]: edition template rendering
//! - [`document`]: refinement of one document
//! - [`batch`]: a full run over an export directory
//! - [`report`]: malformed-document report
//! - [`config`], [`error`], [`http`], [`output`], [`cli`]

pub mod batch;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod facsimile;
pub mod http;
pub mod metadata;
pub mod mets;
pub mod output;
pub mod report;
pub mod segment;
pub mod template;
pub mod tree;

pub use batch::{refine_all, RunSummary};
pub use config::{validate_identifier, validate_transkribus_id, RefineConfig};
pub use document::{refine_document, segment_body, RefinedDocument};
pub use error::{RefineError, Result};
pub use segment::{prepare_body, segment_sections, SectionSpec};
