//! Text-run selection on a live tree.

use super::{NodeId, Tree};

/// Which slot of its owner a text run occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextRole {
    /// Text before the owner's first child.
    Leading,
    /// Text after the owner, before its next sibling.
    Tail,
}

/// A snapshot of one text slot together with its attachment point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub owner: NodeId,
    pub role: TextRole,
    pub content: String,
}

impl TextRun {
    pub fn is_tail(&self) -> bool {
        self.role == TextRole::Tail
    }
}

impl Tree {
    /// Current content of a text slot.
    pub fn text_slot(&self, owner: NodeId, role: TextRole) -> &str {
        let node = self.node(owner);
        match role {
            TextRole::Leading => &node.text,
            TextRole::Tail => &node.tail,
        }
    }

    /// Non-empty text runs below `id` in document order.
    ///
    /// The tail of `id` itself is not part of its subtree and is skipped.
    pub fn text_runs(&self, id: NodeId) -> Vec<TextRun> {
        let mut runs = Vec::new();
        self.collect_runs(id, &mut runs);
        runs
    }

    fn collect_runs(&self, id: NodeId, runs: &mut Vec<TextRun>) {
        let node = self.node(id);
        if !node.text.is_empty() {
            runs.push(TextRun {
                owner: id,
                role: TextRole::Leading,
                content: node.text.clone(),
            });
        }
        for &child in node.children() {
            self.collect_runs(child, runs);
            let tail = &self.node(child).tail;
            if !tail.is_empty() {
                runs.push(TextRun {
                    owner: child,
                    role: TextRole::Tail,
                    content: tail.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_runs_document_order() {
        let tree = Tree::parse("<body>a<p>b<lb/>c</p>d</body>").unwrap();
        let runs = tree.text_runs(tree.root());
        let contents: Vec<_> = runs.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "c", "d"]);

        let roles: Vec<_> = runs.iter().map(|r| r.role).collect();
        assert_eq!(
            roles,
            vec![
                TextRole::Leading,
                TextRole::Leading,
                TextRole::Tail,
                TextRole::Tail
            ]
        );
    }

    #[test]
    fn test_text_slot() {
        let tree = Tree::parse("<p>x<lb/>y</p>").unwrap();
        let lb = tree.children(tree.root())[0];
        assert_eq!(tree.text_slot(tree.root(), TextRole::Leading), "x");
        assert_eq!(tree.text_slot(lb, TextRole::Tail), "y");
        assert_eq!(tree.text_slot(lb, TextRole::Leading), "");
    }
}
