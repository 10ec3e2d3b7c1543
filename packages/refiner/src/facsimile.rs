//! Wiring page images into the TEI facsimile section.

use crate::error::{RefineError, Result};
use crate::tree::{NamespaceMode, NodeId, Tree};

const FACSIMILE_TAG: &str = "facsimile";
const SURFACE_TAG: &str = "surface";
const GRAPHIC_TAG: &str = "graphic";
const ZONE_TAG: &str = "zone";

/// Point every `graphic` at the next image URL, in document order.
///
/// Fails before touching the tree when there are fewer URLs than graphics.
/// Surplus URLs are ignored. Returns the number of updated graphics.
pub fn assign_image_urls(tree: &mut Tree, urls: &[String]) -> Result<usize> {
    let graphics: Vec<NodeId> = tree.descendants_named(tree.root(), GRAPHIC_TAG).collect();
    if graphics.len() > urls.len() {
        return Err(RefineError::MissingImageReference {
            needed: graphics.len(),
            available: urls.len(),
        });
    }
    if urls.len() > graphics.len() {
        tracing::debug!(
            graphics = graphics.len(),
            urls = urls.len(),
            "More image references than graphics"
        );
    }

    for (&graphic, url) in graphics.iter().zip(urls) {
        tree.node_mut(graphic).set_attribute("url", url.as_str());
    }
    Ok(graphics.len())
}

/// Remove all `zone` elements below `facsimile/surface`.
pub fn remove_zones(tree: &mut Tree) -> usize {
    let zones: Vec<NodeId> = tree
        .descendants_named(tree.root(), FACSIMILE_TAG)
        .flat_map(|facsimile| tree.children(facsimile).to_vec())
        .filter(|&surface| tree.has_tag(surface, SURFACE_TAG))
        .flat_map(|surface| {
            tree.descendants_named(surface, ZONE_TAG)
                .collect::<Vec<_>>()
        })
        .collect();

    for &zone in &zones {
        tree.detach(zone);
    }
    zones.len()
}

/// Wire images, drop zones and serialize the first `facsimile` element.
pub fn facsimile_fragment(tree: &mut Tree, urls: &[String]) -> Result<String> {
    let facsimile = tree
        .find_first(tree.root(), FACSIMILE_TAG)
        .ok_or_else(|| RefineError::MissingElement {
            element: FACSIMILE_TAG.to_string(),
            context: "TEI document".to_string(),
        })?;

    let graphics = assign_image_urls(tree, urls)?;
    let zones = remove_zones(tree);
    tracing::debug!(graphics, zones, "Prepared facsimile");

    Ok(tree.to_fragment(facsimile, NamespaceMode::Strip))
}
