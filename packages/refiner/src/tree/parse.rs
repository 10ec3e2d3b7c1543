//! Building a [`Tree`] from serialized XML.

use roxmltree::{Document, Node as XmlNode, NodeType, ParsingOptions};

use super::{Attribute, Namespace, NodeId, Tree};
use crate::error::Result;

/// Namespace bound to the reserved `xml` prefix.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Parser settings for TEI input. Transkribus exports may carry a DTD.
pub fn parsing_options<'a>() -> ParsingOptions<'a> {
    ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    }
}

impl Tree {
    /// Parse an XML document into a mutable tree.
    ///
    /// Comments and processing instructions are dropped; the text around them
    /// is joined so no character content is lost.
    ///
    /// # Examples
    /// ```
    /// use bv_refiner::tree::Tree;
    ///
    /// let tree = Tree::parse("<p>a<lb/>b</p>").unwrap();
    /// let lb = tree.children(tree.root())[0];
    /// assert_eq!(tree.node(tree.root()).text, "a");
    /// assert_eq!(tree.node(lb).tail, "b");
    /// ```
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = Document::parse_with_options(xml, parsing_options())?;
        Ok(Self::from_document(&doc))
    }

    /// Copy a parsed `roxmltree` document into a mutable tree.
    pub fn from_document(doc: &Document<'_>) -> Self {
        let source_root = doc.root_element();
        let mut tree = Tree::new(source_root.tag_name().name());
        let root = tree.root();
        copy_element(&mut tree, root, source_root);
        tree
    }
}

/// Copy name details, attributes, text and children of `source` into `target`.
fn copy_element(tree: &mut Tree, target: NodeId, source: XmlNode<'_, '_>) {
    let prefix = element_prefix(source);
    let attributes = source
        .attributes()
        .map(|attr| Attribute {
            name: qualified_attribute_name(source, attr.namespace(), attr.name()),
            value: attr.value().to_string(),
            namespace: attr.namespace().map(str::to_string),
        })
        .collect();

    {
        let node = tree.node_mut(target);
        node.prefix = prefix;
        node.namespace = source.tag_name().namespace().map(str::to_string);
        node.namespaces = own_declarations(source);
        node.attributes = attributes;
    }

    let mut last_child: Option<NodeId> = None;
    for child in source.children() {
        match child.node_type() {
            NodeType::Element => {
                let id = tree.create_element(child.tag_name().name());
                tree.append(target, id);
                copy_element(tree, id, child);
                last_child = Some(id);
            }
            NodeType::Text => {
                let text = child.text().unwrap_or_default();
                match last_child {
                    Some(previous) => tree.node_mut(previous).tail.push_str(text),
                    None => tree.node_mut(target).text.push_str(text),
                }
            }
            NodeType::Comment | NodeType::PI | NodeType::Root => {}
        }
    }
}

/// Declarations that `node` adds to the scope of its parent.
fn own_declarations(node: XmlNode<'_, '_>) -> Vec<Namespace> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
        .collect()
}

fn element_prefix(node: XmlNode<'_, '_>) -> Option<String> {
    let uri = node.tag_name().namespace()?;
    node.lookup_prefix(uri).map(str::to_string)
}

fn qualified_attribute_name(
    node: XmlNode<'_, '_>,
    namespace: Option<&str>,
    local: &str,
) -> String {
    let prefix = match namespace {
        Some(XML_NAMESPACE) => Some("xml"),
        Some(uri) => node.lookup_prefix(uri),
        None => None,
    };
    match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}
