//! Mutable markup tree with the text/tail model.
//!
//! Nodes live in an arena owned by [`Tree`] and are addressed by [`NodeId`]
//! handles that stay valid for the lifetime of the tree, even when a node is
//! moved or detached. Every element carries:
//! - **text**: content before its first child element
//! - **tail**: content after its closing tag, before the next sibling
//!
//! ```text
//! <p>TEXT<lb/>TAIL OF LB<hi>inner</hi>TAIL OF HI</p>
//! ```
//!
//! Moving an element always moves its tail with it.

mod parse;
mod query;
mod serialize;

pub use parse::parsing_options;
pub use query::{TextRole, TextRun};
pub use serialize::NamespaceMode;

/// Handle of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A namespace declaration, `(prefix, uri)`; `None` is the default namespace.
pub type Namespace = (Option<String>, String);

/// An attribute with its qualified name (`xml:id`, `ana`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    /// Namespace URI of a prefixed name.
    pub namespace: Option<String>,
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Local name.
    pub tag: String,
    /// Namespace prefix as written in the source, `None` for the default namespace.
    pub prefix: Option<String>,
    /// Namespace URI; `None` takes whatever default namespace is in scope.
    pub namespace: Option<String>,
    /// Declarations made on this element in the source.
    pub namespaces: Vec<Namespace>,
    pub attributes: Vec<Attribute>,
    /// Leading text, before the first child element.
    pub text: String,
    /// Trailing text, after the element and before its next sibling.
    pub tail: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            prefix: None,
            namespace: None,
            namespaces: Vec::new(),
            attributes: Vec::new(),
            text: String::new(),
            tail: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Qualified name, as serialized.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.tag),
            None => self.tag.clone(),
        }
    }

    /// Attribute value by qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                name,
                value,
                namespace: None,
            }),
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Arena-backed element tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Create a tree holding a single root element.
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::new(root_tag)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    /// Check the local name of a node.
    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.node(id).tag == tag
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Allocate a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(tag));
        id
    }

    /// Allocate a detached, empty element with the name and namespace
    /// declarations of `template`.
    pub fn clone_shallow(&mut self, template: NodeId) -> NodeId {
        let source = self.node(template);
        let (tag, prefix, namespace, namespaces) = (
            source.tag.clone(),
            source.prefix.clone(),
            source.namespace.clone(),
            source.namespaces.clone(),
        );
        let id = self.create_element(tag);
        let node = self.node_mut(id);
        node.prefix = prefix;
        node.namespace = namespace;
        node.namespaces = namespaces;
        id
    }

    /// Position of a node among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Preceding sibling element.
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .map(|i| self.children(parent)[i])
    }

    /// Following sibling element.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// All sibling elements after `id`, in order.
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        match (self.parent(id), self.index_in_parent(id)) {
            (Some(parent), Some(index)) => self.children(parent)[index + 1..].to_vec(),
            _ => Vec::new(),
        }
    }

    /// Whether `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Remove a node (with its subtree and tail) from its parent.
    ///
    /// The node stays allocated and can be re-inserted.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
        self.node_mut(id).parent = None;
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            parent != child && !self.is_ancestor(child, parent),
            "append would create a cycle"
        );
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Insert `node` right before `sibling`, moving it if attached.
    ///
    /// Does nothing when `sibling` has no parent.
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) {
        self.insert_relative(sibling, node, 0);
    }

    /// Insert `node` right after `sibling`, moving it if attached.
    ///
    /// Does nothing when `sibling` has no parent.
    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) {
        self.insert_relative(sibling, node, 1);
    }

    fn insert_relative(&mut self, sibling: NodeId, node: NodeId, offset: usize) {
        if sibling == node {
            return;
        }
        let Some(parent) = self.parent(sibling) else {
            tracing::debug!(?sibling, "insert relative to detached node ignored");
            return;
        };
        debug_assert!(!self.is_ancestor(node, parent), "insert would create a cycle");
        self.detach(node);
        let Some(index) = self.index_in_parent(sibling) else {
            return;
        };
        self.node_mut(parent).children.insert(index + offset, node);
        self.node_mut(node).parent = Some(parent);
    }

    /// Split the parent of `node` after `node`.
    ///
    /// An empty clone of the parent receives every sibling following `node`
    /// together with the parent's tail, and is inserted right after the
    /// parent. Returns the clone, or `None` when `node` has no parent or the
    /// parent is the tree root.
    pub fn split_after(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        self.parent(parent)?;
        let clone = self.clone_shallow(parent);
        for sibling in self.following_siblings(node) {
            self.append(clone, sibling);
        }
        let tail = std::mem::take(&mut self.node_mut(parent).tail);
        self.node_mut(clone).tail = tail;
        self.insert_after(parent, clone);
        Some(clone)
    }

    /// Pre-order iterator over `id` and all its descendants.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// Descendants (including `id` itself) with the given local name.
    pub fn descendants_named<'a>(
        &'a self,
        id: NodeId,
        tag: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(id).filter(move |&n| self.has_tag(n, tag))
    }

    /// First descendant (or `id` itself) with the given local name.
    pub fn find_first(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(id).find(|&n| self.has_tag(n, tag))
    }

    /// Concatenated text of a subtree, excluding the tail of `id` itself.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        out.push_str(&node.text);
        for &child in &node.children {
            self.collect_text(child, out);
            out.push_str(&self.node(child).tail);
        }
    }
}

/// Pre-order traversal over a subtree.
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new("body");
        let p = tree.create_element("p");
        let a = tree.create_element("lb");
        let b = tree.create_element("lb");
        let root = tree.root();
        tree.append(root, p);
        tree.append(p, a);
        tree.append(p, b);
        (tree, p, a, b)
    }

    #[test]
    fn test_append_and_navigate() {
        let (tree, p, a, b) = sample();
        assert_eq!(tree.children(p), &[a, b]);
        assert_eq!(tree.parent(a), Some(p));
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.previous_sibling(b), Some(a));
        assert_eq!(tree.previous_sibling(a), None);
        assert_eq!(tree.index_in_parent(b), Some(1));
    }

    #[test]
    fn test_append_moves_node() {
        let (mut tree, p, a, _b) = sample();
        let root = tree.root();
        tree.append(root, a);
        assert_eq!(tree.children(p).len(), 1);
        assert_eq!(tree.children(root), &[p, a]);
    }

    #[test]
    fn test_insert_before_and_after() {
        let (mut tree, p, a, b) = sample();
        let c = tree.create_element("hi");
        tree.insert_before(b, c);
        assert_eq!(tree.children(p), &[a, c, b]);
        tree.insert_after(b, c);
        assert_eq!(tree.children(p), &[a, b, c]);
    }

    #[test]
    fn test_tail_moves_with_node() {
        let (mut tree, p, a, _b) = sample();
        tree.node_mut(a).tail = "after a".to_string();
        let root = tree.root();
        tree.append(root, a);
        assert_eq!(tree.node(a).tail, "after a");
        assert_eq!(tree.text_content(p), "");
        assert_eq!(tree.text_content(root), "after a");
    }

    #[test]
    fn test_split_after() {
        let (mut tree, p, a, b) = sample();
        let c = tree.create_element("hi");
        tree.append(p, c);
        tree.node_mut(p).tail = "after p".to_string();
        let clone = tree.split_after(a).unwrap();
        let root = tree.root();
        assert_eq!(tree.children(root), &[p, clone]);
        assert_eq!(tree.node(p).tail, "");
        assert_eq!(tree.node(clone).tail, "after p");
        assert_eq!(tree.children(p), &[a]);
        assert_eq!(tree.children(clone), &[b, c]);
        assert_eq!(tree.tag(clone), "p");
    }

    #[test]
    fn test_split_after_refuses_root() {
        let mut tree = Tree::new("body");
        let p = tree.create_element("p");
        let root = tree.root();
        tree.append(root, p);
        assert!(tree.split_after(p).is_none());
    }

    #[test]
    fn test_descendants_preorder() {
        let (mut tree, p, a, b) = sample();
        let hi = tree.create_element("hi");
        tree.append(a, hi);
        let order: Vec<_> = tree.descendants(tree.root()).collect();
        assert_eq!(order, vec![tree.root(), p, a, hi, b]);
        let lbs: Vec<_> = tree.descendants_named(tree.root(), "lb").collect();
        assert_eq!(lbs, vec![a, b]);
    }

    #[test]
    fn test_set_attribute_replaces() {
        let (mut tree, p, _, _) = sample();
        tree.node_mut(p).set_attribute("rend", "indent");
        tree.node_mut(p).set_attribute("rend", "center");
        assert_eq!(tree.node(p).attribute("rend"), Some("center"));
        assert_eq!(tree.node(p).attributes.len(), 1);
    }

    #[test]
    fn test_is_ancestor() {
        let (tree, p, a, _) = sample();
        assert!(tree.is_ancestor(tree.root(), a));
        assert!(tree.is_ancestor(p, a));
        assert!(!tree.is_ancestor(a, p));
        assert!(!tree.is_ancestor(a, a));
    }
}
