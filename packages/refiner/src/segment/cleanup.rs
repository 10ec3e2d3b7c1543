//! Normalization passes run after segmentation.

use crate::tree::{NodeId, Tree};

/// Elements whose presentational attributes are dropped.
pub const ATTRIBUTE_FREE_TAGS: [&str; 3] = ["lb", "p", "head"];

/// Blocks that may start with a redundant line break.
pub const BREAK_COLLAPSING_TAGS: [&str; 2] = ["p", "ab"];

const LINE_BREAK_TAG: &str = "lb";

/// Clear all attributes of `lb`, `p` and `head` elements below `root`.
///
/// Returns the number of elements that lost attributes.
pub fn strip_attributes(tree: &mut Tree, root: NodeId) -> usize {
    let targets: Vec<NodeId> = tree
        .descendants(root)
        .filter(|&id| {
            ATTRIBUTE_FREE_TAGS.contains(&tree.tag(id)) && !tree.node(id).attributes.is_empty()
        })
        .collect();

    for &id in &targets {
        tree.node_mut(id).attributes.clear();
    }
    targets.len()
}

/// Drop line breaks that open a `p`/`ab` with blank leading text.
///
/// The break's tail becomes the block's leading text. Repeated until the
/// block no longer starts that way, so a second run finds nothing to do.
/// Returns the number of removed breaks.
pub fn collapse_leading_breaks(tree: &mut Tree, root: NodeId) -> usize {
    let blocks: Vec<NodeId> = tree
        .descendants(root)
        .filter(|&id| BREAK_COLLAPSING_TAGS.contains(&tree.tag(id)))
        .collect();

    let mut removed = 0;
    for block in blocks {
        while let Some(first) = leading_break(tree, block) {
            let tail = std::mem::take(&mut tree.node_mut(first).tail);
            tree.node_mut(block).text = tail;
            tree.detach(first);
            removed += 1;
        }
    }
    removed
}

/// The first child of `block` if it is a break preceded by blank content only.
fn leading_break(tree: &Tree, block: NodeId) -> Option<NodeId> {
    let first = *tree.children(block).first()?;
    if !tree.has_tag(first, LINE_BREAK_TAG) {
        return None;
    }

    let leading = &tree.node(block).text;
    let blank = if leading.is_empty() {
        tree.text_content(first).trim().is_empty()
    } else {
        leading.trim().is_empty()
    };
    blank.then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NamespaceMode;
    use pretty_assertions::assert_eq;

    fn render(tree: &Tree) -> String {
        tree.to_fragment(tree.root(), NamespaceMode::Keep)
    }

    #[test]
    fn test_strip_attributes() {
        let mut tree = Tree::parse(
            r##"<body><p rend="x"><lb n="1" facs="#f1"/>a<hi rend="b">c</hi></p><head type="t">h</head></body>"##,
        )
        .unwrap();
        let root = tree.root();
        assert_eq!(strip_attributes(&mut tree, root), 3);
        assert_eq!(
            render(&tree),
            r#"<body><p><lb/>a<hi rend="b">c</hi></p><head>h</head></body>"#
        );
    }

    #[test]
    fn test_collapse_leading_break() {
        let mut tree = Tree::parse("<body><p><lb/>first line<lb/>second</p><ab>\n  <lb/>x</ab></body>").unwrap();
        let root = tree.root();
        assert_eq!(collapse_leading_breaks(&mut tree, root), 2);
        assert_eq!(
            render(&tree),
            "<body><p>first line<lb/>second</p><ab>x</ab></body>"
        );
    }

    #[test]
    fn test_collapse_ignores_text_before_break() {
        let mut tree = Tree::parse("<body><p>lead<lb/>x</p><p><hi/><lb/>y</p></body>").unwrap();
        let root = tree.root();
        assert_eq!(collapse_leading_breaks(&mut tree, root), 0);
    }

    #[test]
    fn test_collapse_repeated_breaks() {
        let mut tree = Tree::parse("<body><p><lb/><lb/>\n<lb/>text</p></body>").unwrap();
        let root = tree.root();
        assert_eq!(collapse_leading_breaks(&mut tree, root), 3);
        assert_eq!(render(&tree), "<body><p>text</p></body>");
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let xml = r#"<body><p rend="i"><lb n="2"/><lb/>a<lb n="3"/>b</p><ab> <lb/></ab><head n="1">h</head></body>"#;
        let mut once = Tree::parse(xml).unwrap();
        let root = once.root();
        strip_attributes(&mut once, root);
        collapse_leading_breaks(&mut once, root);
        let after_once = render(&once);

        let mut twice = once.clone();
        assert_eq!(strip_attributes(&mut twice, root), 0);
        assert_eq!(collapse_leading_breaks(&mut twice, root), 0);
        assert_eq!(render(&twice), after_once);
    }
}
