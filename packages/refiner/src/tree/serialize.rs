//! Writing a [`Tree`] (or a subtree of it) back to XML.

use quick_xml::escape::{escape, partial_escape};

use super::{Namespace, NodeId, Tree};

/// Handling of the default namespace on the serialized root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceMode {
    /// Re-declare every namespace in scope of the serialized element.
    Keep,
    /// Drop the default namespace so the fragment can be embedded in a
    /// document that already declares it. Prefixed namespaces are kept.
    Strip,
}

impl Tree {
    /// Serialize one element and its subtree, without its tail.
    ///
    /// Declarations made below the element are written where they were made.
    /// An element moved away from the ancestor declaring its prefix gets the
    /// declaration repeated on itself.
    ///
    /// # Examples
    /// ```
    /// use bv_refiner::tree::{NamespaceMode, Tree};
    ///
    /// let tree = Tree::parse(r#"<body xmlns="http://www.tei-c.org/ns/1.0"><p>a &amp; b</p></body>"#).unwrap();
    /// assert_eq!(
    ///     tree.to_fragment(tree.root(), NamespaceMode::Strip),
    ///     "<body><p>a &amp; b</p></body>"
    /// );
    /// ```
    pub fn to_fragment(&self, id: NodeId, mode: NamespaceMode) -> String {
        let mut scope = Vec::new();
        let mut declare = Vec::new();
        for binding in self.bindings_in_scope(id) {
            if binding.0.is_none() && mode == NamespaceMode::Strip {
                // Bound by the embedding document
                scope.push(binding);
            } else {
                declare.push(binding);
            }
        }

        let mut out = String::new();
        self.write_element(id, &mut out, &mut scope, declare);
        out
    }

    /// Declarations of `id` and its ancestors, innermost winning.
    fn bindings_in_scope(&self, id: NodeId) -> Vec<Namespace> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }

        let mut bindings: Vec<Namespace> = Vec::new();
        for &node in chain.iter().rev() {
            for (prefix, uri) in &self.node(node).namespaces {
                bindings.retain(|(p, _)| p != prefix);
                bindings.push((prefix.clone(), uri.clone()));
            }
        }
        bindings
    }

    fn write_element(
        &self,
        id: NodeId,
        out: &mut String,
        scope: &mut Vec<Namespace>,
        declare: Vec<Namespace>,
    ) {
        let node = self.node(id);
        let name = node.qualified_name();
        let depth = scope.len();

        out.push('<');
        out.push_str(&name);
        for (prefix, uri) in declare {
            write_declaration(out, prefix.as_deref(), &uri);
            scope.push((prefix, uri));
        }

        let element = node
            .namespace
            .as_deref()
            .map(|uri| (node.prefix.as_deref(), uri));
        let attributes = node.attributes.iter().filter_map(|attr| {
            let (prefix, _) = attr.name.split_once(':')?;
            Some((Some(prefix), attr.namespace.as_deref()?))
        });
        for (prefix, uri) in element.into_iter().chain(attributes) {
            if prefix == Some("xml") || lookup(scope, prefix) == Some(uri) {
                continue;
            }
            write_declaration(out, prefix, uri);
            scope.push((prefix.map(str::to_string), uri.to_string()));
        }

        for attr in &node.attributes {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            out.push_str(&escape(attr.value.as_str()));
            out.push('"');
        }

        if node.text.is_empty() && node.children().is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            out.push_str(&partial_escape(node.text.as_str()));
            for &child in node.children() {
                let child_node = self.node(child);
                self.write_element(child, out, scope, child_node.namespaces.clone());
                out.push_str(&partial_escape(child_node.tail.as_str()));
            }
            out.push_str("</");
            out.push_str(&name);
            out.push('>');
        }

        scope.truncate(depth);
    }
}

fn lookup<'a>(scope: &'a [Namespace], prefix: Option<&str>) -> Option<&'a str> {
    scope
        .iter()
        .rev()
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.as_str())
}

fn write_declaration(out: &mut String, prefix: Option<&str>, uri: &str) {
    match prefix {
        Some(prefix) => {
            out.push_str(" xmlns:");
            out.push_str(prefix);
        }
        None => out.push_str(" xmlns"),
    }
    out.push_str("=\"");
    out.push_str(&escape(uri));
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_preserves_mixed_content() {
        let xml = r#"<p rend="x">lead<lb/>one<hi>in</hi>two</p>"#;
        let tree = Tree::parse(xml).unwrap();
        assert_eq!(tree.to_fragment(tree.root(), NamespaceMode::Keep), xml);
    }

    #[test]
    fn test_serialize_escapes() {
        let mut tree = Tree::new("p");
        let root = tree.root();
        tree.node_mut(root).text = "a < b & c".to_string();
        tree.node_mut(root).set_attribute("n", "\"q\"");
        assert_eq!(
            tree.to_fragment(root, NamespaceMode::Keep),
            r#"<p n="&quot;q&quot;">a &lt; b &amp; c</p>"#
        );
    }

    #[test]
    fn test_namespace_modes() {
        let xml = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0" xmlns:x="urn:x"><x:a/></TEI>"#;
        let tree = Tree::parse(xml).unwrap();
        assert_eq!(tree.to_fragment(tree.root(), NamespaceMode::Keep), xml);
        assert_eq!(
            tree.to_fragment(tree.root(), NamespaceMode::Strip),
            r#"<TEI xmlns:x="urn:x"><x:a/></TEI>"#
        );
    }

    #[test]
    fn test_fragment_of_inner_element() {
        let xml = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><text><body><p>x</p></body></text></TEI>"#;
        let tree = Tree::parse(xml).unwrap();
        let body = tree.find_first(tree.root(), "body").unwrap();
        assert_eq!(
            tree.to_fragment(body, NamespaceMode::Strip),
            "<body><p>x</p></body>"
        );
        assert_eq!(
            tree.to_fragment(body, NamespaceMode::Keep),
            r#"<body xmlns="http://www.tei-c.org/ns/1.0"><p>x</p></body>"#
        );
    }

    const NESTED: &str = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><body><p><m:math xmlns:m="http://www.w3.org/1998/Math/MathML"><m:mi>x</m:mi></m:math><svg xmlns="http://www.w3.org/2000/svg"><g/></svg></p></body></TEI>"#;

    #[test]
    fn test_nested_declarations_are_kept() {
        let tree = Tree::parse(NESTED).unwrap();
        assert_eq!(tree.to_fragment(tree.root(), NamespaceMode::Keep), NESTED);

        let body = tree.find_first(tree.root(), "body").unwrap();
        assert_eq!(
            tree.to_fragment(body, NamespaceMode::Strip),
            r#"<body><p><m:math xmlns:m="http://www.w3.org/1998/Math/MathML"><m:mi>x</m:mi></m:math><svg xmlns="http://www.w3.org/2000/svg"><g/></svg></p></body>"#
        );
    }

    #[test]
    fn test_moved_element_redeclares_namespace() {
        let mut tree = Tree::parse(NESTED).unwrap();
        let p = tree.find_first(tree.root(), "p").unwrap();
        let mi = tree.find_first(tree.root(), "mi").unwrap();
        let g = tree.find_first(tree.root(), "g").unwrap();
        tree.append(p, mi);
        tree.append(p, g);

        let fragment = tree.to_fragment(p, NamespaceMode::Strip);
        assert_eq!(
            fragment,
            r#"<p><m:math xmlns:m="http://www.w3.org/1998/Math/MathML"/><svg xmlns="http://www.w3.org/2000/svg"/><m:mi xmlns:m="http://www.w3.org/1998/Math/MathML">x</m:mi><g xmlns="http://www.w3.org/2000/svg"/></p>"#
        );
        assert!(roxmltree::Document::parse(&fragment).is_ok());
    }

    #[test]
    fn test_fragment_declares_ancestor_prefixes() {
        let xml = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0" xmlns:x="urn:x"><text><x:a x:n="1"/></text></TEI>"#;
        let tree = Tree::parse(xml).unwrap();
        let text = tree.children(tree.root())[0];
        assert_eq!(
            tree.to_fragment(text, NamespaceMode::Strip),
            r#"<text xmlns:x="urn:x"><x:a x:n="1"/></text>"#
        );
    }
}
