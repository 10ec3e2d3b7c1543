//! Moving seeded divisions up to division depth.

use crate::tree::{NodeId, Tree};

use super::DIV_TAG;

/// Raise `division` until its parent is a division or `container`.
///
/// Every ancestor passed on the way is split around the division: the
/// ancestor keeps what came before, a clone of it takes what came after.
/// When the division is the first child, a non-blank leading text of the
/// ancestor moves into a clone placed in front. Reaching the tree root ends
/// the walk as well. Returns the number of levels climbed.
pub fn raise_division(tree: &mut Tree, division: NodeId, container: NodeId) -> usize {
    let mut levels = 0;

    while let Some(parent) = tree.parent(division) {
        if parent == container || tree.has_tag(parent, DIV_TAG) || tree.parent(parent).is_none() {
            break;
        }

        if tree.previous_sibling(division).is_some() {
            if let Some(clone) = tree.split_after(division) {
                tree.node_mut(clone).text = "\n".to_string();
            }
            tree.insert_after(parent, division);
        } else {
            if !tree.node(parent).text.trim().is_empty() {
                let clone = tree.clone_shallow(parent);
                let leading = std::mem::take(&mut tree.node_mut(parent).text);
                tree.node_mut(clone).text = leading;
                tree.insert_before(parent, clone);
            }
            tree.insert_before(parent, division);
        }

        levels += 1;
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{scan_markers, seed_divisions, SectionSpec};
    use crate::tree::NamespaceMode;
    use pretty_assertions::assert_eq;

    fn seed_and_raise(xml: &str) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::parse(xml).unwrap();
        let markers = scan_markers(&tree, &SectionSpec::articles());
        let divisions = seed_divisions(&mut tree, &markers, "article");
        let body = tree.find_first(tree.root(), "body").unwrap();
        for &division in &divisions {
            raise_division(&mut tree, division, body);
        }
        (tree, divisions)
    }

    fn compact(tree: &Tree) -> String {
        tree.to_fragment(tree.root(), NamespaceMode::Keep)
            .replace('\n', "")
    }

    #[test]
    fn test_raise_splits_parent() {
        let (tree, _) = seed_and_raise("<body><p>a<lb/>Art. 1<lb/>b</p></body>");
        assert_eq!(
            compact(&tree),
            "<body><p>a</p><div ana=\"article\"><head>Art. 1</head></div><p><lb/>b</p></body>"
        );
    }

    #[test]
    fn test_raise_first_child_moves_leading_text() {
        let mut tree = Tree::parse("<body><p>lead<hi>x</hi></p></body>").unwrap();
        let hi = tree.find_first(tree.root(), "hi").unwrap();
        let division = tree.create_element("div");
        tree.insert_before(hi, division);
        let body = tree.root();

        assert_eq!(raise_division(&mut tree, division, body), 1);
        assert_eq!(
            compact(&tree),
            "<body><p>lead</p><div/><p><hi>x</hi></p></body>"
        );
    }

    #[test]
    fn test_raise_first_child_blank_leading_text() {
        let mut tree = Tree::parse("<body><p>  <hi>x</hi></p></body>").unwrap();
        let hi = tree.find_first(tree.root(), "hi").unwrap();
        let division = tree.create_element("div");
        tree.insert_before(hi, division);
        let body = tree.root();

        raise_division(&mut tree, division, body);
        assert_eq!(compact(&tree), "<body><div/><p>  <hi>x</hi></p></body>");
    }

    #[test]
    fn test_raise_through_several_levels() {
        let (tree, divisions) =
            seed_and_raise("<body><ab><p><hi>t<lb/>Art. 2</hi>after</p>end</ab></body>");
        let body = tree.root();
        assert_eq!(tree.parent(divisions[0]), Some(body));
        assert_eq!(
            compact(&tree),
            "<body><ab><p><hi>t</hi></p></ab><div ana=\"article\"><head>Art. 2</head></div><ab><p><hi/>after</p>end</ab></body>"
        );
    }

    #[test]
    fn test_raise_stops_at_division() {
        let (tree, divisions) =
            seed_and_raise("<body><div type=\"part\"><p>x<lb/>Art. 3</p></div></body>");
        let parent = tree.parent(divisions[0]).unwrap();
        assert_eq!(tree.tag(parent), "div");
        assert_eq!(tree.node(parent).attribute("type"), Some("part"));
    }

    #[test]
    fn test_raise_stops_at_tree_root() {
        let mut tree = Tree::parse("<TEI><p>x<lb/>y</p></TEI>").unwrap();
        let lb = tree.find_first(tree.root(), "lb").unwrap();
        let division = tree.create_element("div");
        tree.insert_after(lb, division);
        let container = tree.create_element("body");

        assert_eq!(raise_division(&mut tree, division, container), 1);
        assert_eq!(tree.parent(division), Some(tree.root()));
    }
}
