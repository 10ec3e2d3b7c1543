//! Turning marker text into seeded divisions.

use crate::tree::{NodeId, TextRole, TextRun, Tree};

use super::{CLASS_ATTRIBUTE, DIV_TAG, HEAD_TAG};

/// Formatting text placed around created elements.
const NEWLINE: &str = "\n";

/// Seed one division per tail marker, walking the markers back to front.
///
/// Each division is inserted where its marker's owner sat and holds a single
/// `head` with the marker text. Leading-text markers are skipped. Returns the
/// divisions most-recent-match-first.
pub fn seed_divisions(tree: &mut Tree, markers: &[TextRun], class: &str) -> Vec<NodeId> {
    let mut divisions = Vec::with_capacity(markers.len());

    for marker in markers.iter().rev() {
        if !marker.is_tail() {
            tracing::debug!(
                owner = ?marker.owner,
                text = %marker.content.trim(),
                "Marker in leading text, not promoted"
            );
            continue;
        }
        if tree.text_slot(marker.owner, TextRole::Tail) != marker.content {
            tracing::debug!(owner = ?marker.owner, "Marker changed since selection, skipping");
            continue;
        }
        if tree.parent(marker.owner).is_none() {
            continue;
        }

        divisions.push(seed_division(tree, marker, class));
    }

    divisions
}

fn seed_division(tree: &mut Tree, marker: &TextRun, class: &str) -> NodeId {
    let owner = marker.owner;
    let head = if is_blank_element(tree, owner) {
        // The usual case: a line break whose tail is the label.
        owner
    } else {
        // Retagging would overwrite the owner's content; give the label its own head.
        let head = tree.clone_shallow(owner);
        tree.insert_after(owner, head);
        head
    };

    {
        let node = tree.node_mut(head);
        node.tag = HEAD_TAG.to_string();
        node.attributes.clear();
        node.text = marker.content.clone();
        node.tail = NEWLINE.to_string();
    }
    if head != owner {
        tree.node_mut(owner).tail.clear();
    }

    let division = tree.clone_shallow(head);
    {
        let node = tree.node_mut(division);
        node.tag = DIV_TAG.to_string();
        node.set_attribute(CLASS_ATTRIBUTE, class);
        node.text = NEWLINE.to_string();
        node.tail = NEWLINE.to_string();
    }
    tree.insert_before(head, division);
    tree.append(division, head);

    division
}

fn is_blank_element(tree: &Tree, id: NodeId) -> bool {
    tree.children(id).is_empty() && tree.node(id).text.is_empty()
}
