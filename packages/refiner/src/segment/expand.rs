//! Filling raised divisions with the content that follows them.

use crate::tree::{NodeId, Tree};

use super::DIV_TAG;

/// Move following siblings into `division` while `absorb` accepts them.
///
/// Each absorbed sibling becomes the division's last child, tail included.
/// Returns the number of absorbed nodes.
pub fn expand_division<F>(tree: &mut Tree, division: NodeId, mut absorb: F) -> usize
where
    F: FnMut(&Tree, NodeId) -> bool,
{
    let mut absorbed = 0;
    while let Some(next) = tree.next_sibling(division) {
        if !absorb(tree, next) {
            break;
        }
        tree.append(division, next);
        absorbed += 1;
    }
    absorbed
}

/// Default stopping rule: everything up to the next `div` is absorbed.
pub fn is_not_division(tree: &Tree, id: NodeId) -> bool {
    !tree.has_tag(id, DIV_TAG)
}
