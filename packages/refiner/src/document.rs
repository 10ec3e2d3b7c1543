//! Refining a single TEI document.

use roxmltree::Document;

use crate::config::validate_identifier;
use crate::error::{RefineError, Result};
use crate::facsimile::facsimile_fragment;
use crate::metadata::{DocumentMetadata, ProjectMetadata};
use crate::segment::{prepare_body, SectionSpec, SegmentReport};
use crate::template::{RenderContext, TemplateRenderer};
use crate::tree::{parsing_options, NamespaceMode, Tree};

const BODY_TAG: &str = "body";

/// A rendered edition, ready to be written.
#[derive(Debug, Clone)]
pub struct RefinedDocument {
    /// Output file stem (`bv_id`).
    pub identifier: String,
    pub xml: String,
    pub segments: SegmentReport,
}

/// Segment the `body` of a TEI tree and serialize it for embedding.
///
/// The default namespace declaration is left off the fragment.
pub fn segment_body(tree: &mut Tree, spec: &SectionSpec) -> Result<(String, SegmentReport)> {
    let body = tree
        .find_first(tree.root(), BODY_TAG)
        .ok_or_else(|| RefineError::MissingElement {
            element: BODY_TAG.to_string(),
            context: "TEI document".to_string(),
        })?;

    let report = prepare_body(tree, body, spec);
    Ok((tree.to_fragment(body, NamespaceMode::Strip), report))
}

/// Turn a parsed transcription into a finished edition.
///
/// The facsimile is prepared first, so a document lacking image references
/// fails before its body is touched. The rendered result must be well-formed
/// XML.
pub fn refine_document(
    mut tree: Tree,
    metadata: &DocumentMetadata,
    project: &ProjectMetadata,
    image_urls: &[String],
    renderer: &dyn TemplateRenderer,
    spec: &SectionSpec,
) -> Result<RefinedDocument> {
    validate_identifier(&metadata.bv_id)?;

    let faksimile = facsimile_fragment(&mut tree, image_urls)?;
    let (body, segments) = segment_body(&mut tree, spec)?;

    let context = RenderContext {
        project_md: project.clone(),
        doc_metadata: metadata.clone(),
        body,
        faksimile,
    };
    let xml = renderer.render(&context)?;

    if let Err(source) = Document::parse_with_options(&xml, parsing_options()) {
        return Err(RefineError::InvalidOutput {
            identifier: metadata.bv_id.clone(),
            source,
        });
    }

    tracing::info!(
        bv_id = %metadata.bv_id,
        articles = segments.divisions.len(),
        "Refined document"
    );

    Ok(RefinedDocument {
        identifier: metadata.bv_id.clone(),
        xml,
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::PlaceholderTemplate;
    use serde_json::json;

    const TEI: &str = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0">
<facsimile><surface><graphic url="p1.jpg"/><zone/></surface></facsimile>
<text><body><p><lb/>Präambel<lb/>Art. 1<lb/>Text eins<lb/>Art. 2<lb/>Text zwei</p></body></text>
</TEI>"#;

    fn metadata(bv_id: &str) -> DocumentMetadata {
        DocumentMetadata {
            bv_id: bv_id.to_string(),
            transkribus_col_id: "187".to_string(),
            transkribus_doc_id: "42".to_string(),
            extra: serde_json::Map::new(),
        }
    }

    fn template() -> PlaceholderTemplate {
        PlaceholderTemplate::new(
            "t.xml",
            r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><teiHeader><title>{{ project_md.title | e }}</title><idno>{{ doc_metadata.bv_id }}</idno></teiHeader>{{ faksimile }}<text>{{ body }}</text></TEI>"#,
        )
    }

    fn refine(bv_id: &str, urls: &[String]) -> Result<RefinedDocument> {
        let tree = Tree::parse(TEI).unwrap();
        let project = ProjectMetadata(json!({"title": "B-VG & Entwürfe"}));
        refine_document(
            tree,
            &metadata(bv_id),
            &project,
            urls,
            &template(),
            &SectionSpec::articles(),
        )
    }

    #[test]
    fn test_refine_document() {
        let doc = refine("bv_doc_1", &["https://img/1".to_string()]).unwrap();
        assert_eq!(doc.identifier, "bv_doc_1");
        assert_eq!(doc.segments.divisions.len(), 2);
        assert!(doc.xml.contains("<title>B-VG &amp; Entwürfe</title>"));
        assert!(doc.xml.contains(r#"<graphic url="https://img/1"/>"#));
        assert!(!doc.xml.contains("<zone"));
        assert!(doc.xml.contains("<head>Art. 1</head>"));
        assert_eq!(doc.xml.matches("xmlns=").count(), 1);
    }

    #[test]
    fn test_missing_image_leaves_error() {
        let err = refine("bv_doc_1", &[]).unwrap_err();
        assert!(matches!(
            err,
            RefineError::MissingImageReference {
                needed: 1,
                available: 0
            }
        ));
    }

    #[test]
    fn test_invalid_identifier() {
        let err = refine("../escape", &["u".to_string()]).unwrap_err();
        assert!(matches!(err, RefineError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_malformed_render_is_rejected() {
        let tree = Tree::parse(TEI).unwrap();
        let broken = PlaceholderTemplate::new("broken.xml", "<TEI>{{ body }}");
        let err = refine_document(
            tree,
            &metadata("bv_doc_1"),
            &ProjectMetadata::default(),
            &["u".to_string()],
            &broken,
            &SectionSpec::articles(),
        )
        .unwrap_err();
        assert!(matches!(err, RefineError::InvalidOutput { .. }));
    }

    #[test]
    fn test_segment_body_requires_body() {
        let mut tree = Tree::parse("<TEI><text/></TEI>").unwrap();
        let err = segment_body(&mut tree, &SectionSpec::articles()).unwrap_err();
        assert!(matches!(err, RefineError::MissingElement { .. }));
    }

    #[test]
    fn test_nested_namespaces_survive_refinement() {
        let xml = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0">
<facsimile><surface><graphic url="p1.jpg"/></surface></facsimile>
<text><body><p><lb/>Art. 1<lb/>Es gilt <m:math xmlns:m="http://www.w3.org/1998/Math/MathML"><m:mi>x</m:mi></m:math><svg xmlns="http://www.w3.org/2000/svg"><g/></svg></p></body></text>
</TEI>"#;
        let doc = refine_document(
            Tree::parse(xml).unwrap(),
            &metadata("bv_doc_1"),
            &ProjectMetadata::default(),
            &["u".to_string()],
            &template(),
            &SectionSpec::articles(),
        )
        .unwrap();
        assert_eq!(doc.segments.divisions.len(), 1);

        let parsed = Document::parse(&doc.xml).unwrap();
        let mi = parsed
            .descendants()
            .find(|n| n.has_tag_name("mi"))
            .unwrap();
        assert_eq!(
            mi.tag_name().namespace(),
            Some("http://www.w3.org/1998/Math/MathML")
        );
        let g = parsed.descendants().find(|n| n.has_tag_name("g")).unwrap();
        assert_eq!(g.tag_name().namespace(), Some("http://www.w3.org/2000/svg"));
        let head = parsed
            .descendants()
            .find(|n| n.has_tag_name("head"))
            .unwrap();
        assert_eq!(head.tag_name().namespace(), Some("http://www.tei-c.org/ns/1.0"));
    }
}
