//! Article segmentation of a TEI body.
//!
//! Transkribus exports carry article labels ("Art. 12") as plain text after
//! line breaks, at whatever depth the transcription put them. The passes in
//! this module turn each label into a `<div ana="article">` that sits directly
//! below `body` (or below an existing `div`) and owns everything up to the
//! next label:
//!
//! 1. [`scan_markers`]: select candidate text runs and test them against the
//!    label pattern (no mutation)
//! 2. [`seed_divisions`]: wrap each label in `head` inside a new division,
//!    back to front so earlier positions stay valid
//! 3. [`raise_division`]: split ancestors until the division reaches
//!    division depth
//! 4. [`expand_division`]: absorb following siblings up to the next division
//!
//! [`prepare_body`] runs these followed by the cleanup passes.

mod cleanup;
mod expand;
mod raise;
mod scanner;
mod seed;

use regex::Regex;

pub use cleanup::{
    collapse_leading_breaks, strip_attributes, ATTRIBUTE_FREE_TAGS, BREAK_COLLAPSING_TAGS,
};
pub use expand::{expand_division, is_not_division};
pub use raise::raise_division;
pub use scanner::{scan_markers, MarkerSelector, TailSelector};
pub use seed::seed_divisions;

use crate::config::{ARTICLE_CLASS, ARTICLE_MARKER_HINT, ARTICLE_MARKER_PATTERN};
use crate::tree::{NodeId, Tree};

/// Tag of created divisions.
pub const DIV_TAG: &str = "div";

/// Tag of the element holding a promoted label.
pub const HEAD_TAG: &str = "head";

/// Attribute carrying the semantic class of a division.
pub const CLASS_ATTRIBUTE: &str = "ana";

/// What to look for and how to label the resulting divisions.
pub struct SectionSpec {
    pub selector: Box<dyn MarkerSelector>,
    /// Tested against the trimmed text of each selected run.
    pub pattern: Regex,
    /// `ana` value of created divisions.
    pub class: String,
}

impl SectionSpec {
    pub fn new(
        selector: impl MarkerSelector + 'static,
        pattern: Regex,
        class: impl Into<String>,
    ) -> Self {
        Self {
            selector: Box::new(selector),
            pattern,
            class: class.into(),
        }
    }

    /// Article labels following line breaks inside `body`.
    pub fn articles() -> Self {
        Self::new(
            TailSelector::new("body", "lb").containing(ARTICLE_MARKER_HINT),
            ARTICLE_MARKER_PATTERN.clone(),
            ARTICLE_CLASS,
        )
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }
}

impl std::fmt::Debug for SectionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionSpec")
            .field("pattern", &self.pattern.as_str())
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}

/// Counters from one segmentation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentReport {
    pub markers: usize,
    /// Created divisions, most-recent-match-first.
    pub divisions: Vec<NodeId>,
    pub levels_raised: usize,
    pub nodes_absorbed: usize,
    pub attributes_stripped: usize,
    pub breaks_collapsed: usize,
}

/// Seed, raise and expand divisions for every marker below `container`.
pub fn segment_sections(tree: &mut Tree, container: NodeId, spec: &SectionSpec) -> SegmentReport {
    let markers = scan_markers(tree, spec);
    let divisions = seed_divisions(tree, &markers, &spec.class);

    let mut levels_raised = 0;
    for &division in &divisions {
        levels_raised += raise_division(tree, division, container);
    }

    let mut nodes_absorbed = 0;
    for &division in &divisions {
        nodes_absorbed += expand_division(tree, division, is_not_division);
    }

    tracing::debug!(
        markers = markers.len(),
        divisions = divisions.len(),
        levels_raised,
        nodes_absorbed,
        "Segmented sections"
    );

    SegmentReport {
        markers: markers.len(),
        divisions,
        levels_raised,
        nodes_absorbed,
        ..SegmentReport::default()
    }
}

/// Segment the body and normalize it for embedding in the edition template.
pub fn prepare_body(tree: &mut Tree, body: NodeId, spec: &SectionSpec) -> SegmentReport {
    let mut report = segment_sections(tree, body, spec);
    report.attributes_stripped = strip_attributes(tree, body);
    report.breaks_collapsed = collapse_leading_breaks(tree, body);
    report
}
