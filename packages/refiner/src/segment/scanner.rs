//! Locating article-boundary markers.

use crate::tree::{NodeId, TextRole, TextRun, Tree};

use super::SectionSpec;

/// A structural query producing candidate marker text runs.
///
/// Implementations must return runs in document order and must not mutate
/// the tree.
pub trait MarkerSelector: Send + Sync {
    fn select(&self, tree: &Tree) -> Vec<TextRun>;
}

/// Selects tail text following an anchor element inside a scope element.
///
/// For scope `body` and anchor `lb` this is every text run that is the tail
/// of an `lb` below `body`, or the tail of any later sibling of such an `lb`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailSelector {
    pub scope: String,
    pub anchor: String,
    /// Substring a run must contain to be selected.
    pub contains: Option<String>,
}

impl TailSelector {
    #[must_use]
    pub fn new(scope: impl Into<String>, anchor: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            anchor: anchor.into(),
            contains: None,
        }
    }

    #[must_use]
    pub fn containing(mut self, needle: impl Into<String>) -> Self {
        self.contains = Some(needle.into());
        self
    }

    fn walk(&self, tree: &Tree, parent: NodeId, runs: &mut Vec<TextRun>) {
        let mut after_anchor = false;
        for &child in tree.children(parent) {
            after_anchor |= tree.has_tag(child, &self.anchor);
            self.walk(tree, child, runs);

            let tail = &tree.node(child).tail;
            if after_anchor && !tail.is_empty() && self.accepts(tail) {
                runs.push(TextRun {
                    owner: child,
                    role: TextRole::Tail,
                    content: tail.clone(),
                });
            }
        }
    }

    fn accepts(&self, text: &str) -> bool {
        self.contains
            .as_deref()
            .is_none_or(|needle| text.contains(needle))
    }
}

impl MarkerSelector for TailSelector {
    fn select(&self, tree: &Tree) -> Vec<TextRun> {
        let mut runs = Vec::new();
        for scope in tree.descendants_named(tree.root(), &self.scope) {
            let nested = tree
                .descendants_named(tree.root(), &self.scope)
                .any(|other| tree.is_ancestor(other, scope));
            if !nested {
                self.walk(tree, scope, &mut runs);
            }
        }
        runs
    }
}

/// Candidate runs whose trimmed content matches the marker pattern.
///
/// Runs are returned in document order; nothing is mutated.
pub fn scan_markers(tree: &Tree, spec: &SectionSpec) -> Vec<TextRun> {
    spec.selector
        .select(tree)
        .into_iter()
        .filter(|run| spec.pattern.is_match(run.content.trim()))
        .collect()
}
