//! Transkribus METS export reading.
//!
//! Each exported document comes with a `<doc_id>_mets.xml` file listing the
//! page images in reading order:
//!
//! ```text
//! mets:fileSec/mets:fileGrp[@ID='MASTER']/mets:fileGrp[@ID='IMG']
//!     /mets:file/mets:FLocat/@xlink:href
//! ```

use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};

use crate::error::Result;

pub const METS_NS: &str = "http://www.loc.gov/METS/";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// `ID` of the file group holding page images.
const IMAGE_GROUP_ID: &str = "IMG";

/// What the refiner needs from a METS file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetsInfo {
    /// Page image URLs in document order.
    pub image_urls: Vec<String>,
    /// `trpDocMetadata/docId`, when present.
    pub collection_id: Option<String>,
}

/// Read and parse a METS file.
pub fn read_mets(path: &Path) -> Result<MetsInfo> {
    let xml = fs::read_to_string(path)?;
    parse_mets(&xml)
}

/// Parse METS content.
pub fn parse_mets(xml: &str) -> Result<MetsInfo> {
    let doc = Document::parse(xml)?;
    Ok(MetsInfo {
        image_urls: image_urls(&doc),
        collection_id: collection_id(&doc),
    })
}

/// Image references of the `IMG` file group, in document order.
pub fn image_urls(doc: &Document<'_>) -> Vec<String> {
    doc.descendants()
        .filter(|n| {
            n.has_tag_name((METS_NS, "fileGrp")) && n.attribute("ID") == Some(IMAGE_GROUP_ID)
        })
        .flat_map(|group| mets_children(group, "file"))
        .flat_map(|file| mets_children(file, "FLocat"))
        .filter_map(|locat| locat.attribute((XLINK_NS, "href")))
        .map(str::to_string)
        .collect()
}

/// Text of the first `trpDocMetadata/docId`, or `None` if missing or blank.
pub fn collection_id(doc: &Document<'_>) -> Option<String> {
    doc.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "trpDocMetadata")
        .flat_map(|meta| meta.children())
        .find(|n| n.is_element() && n.tag_name().name() == "docId")
        .and_then(|id| id.text())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Transkribus document id encoded in an export file name.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use bv_refiner::mets::transkribus_doc_id;
///
/// assert_eq!(
///     transkribus_doc_id(Path::new("mets/187/1234567_tei.xml")).as_deref(),
///     Some("1234567")
/// );
/// assert_eq!(transkribus_doc_id(Path::new("mets/187/_tei.xml")), None);
/// ```
pub fn transkribus_doc_id(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let prefix = file_name.split('_').next()?;
    (!prefix.is_empty()).then(|| prefix.to_string())
}

fn mets_children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.has_tag_name((METS_NS, name)))
}
