use std::collections::{BTreeMap, HashSet};

use lopdf::content::Content;

use crate::PdfError;

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// US-Letter, used when a page tree declares no MediaBox at all.
pub const DEFAULT_MEDIA_BOX: PageBounds = PageBounds {
    llx: 0.0,
    lly: 0.0,
    urx: 612.0,
    ury: 792.0,
};

/// A page's MediaBox in PDF user space (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBounds {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

/// A font entry from a page's `/Resources /Font` dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFont {
    /// Resource key used by `Tf`, e.g. `b"F1"`.
    pub key: Vec<u8>,
    /// `/BaseFont`, or the resource key when absent.
    pub base_font: String,
    /// `/Encoding` when given as a name.
    pub encoding: Option<String>,
}

/// Content-stream operand, reduced to what the text state machine reads.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<Operand>),
    Other,
}

impl Operand {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Operand::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&lopdf::Object> for Operand {
    fn from(obj: &lopdf::Object) -> Self {
        match obj {
            lopdf::Object::Integer(i) => Operand::Number(*i as f32),
            lopdf::Object::Real(f) => Operand::Number(*f),
            lopdf::Object::Name(n) => Operand::Name(n.clone()),
            lopdf::Object::String(s, _) => Operand::Str(s.clone()),
            lopdf::Object::Array(items) => Operand::Array(items.iter().map(Operand::from).collect()),
            _ => Operand::Other,
        }
    }
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<Operand>,
}

impl ContentOp {
    pub fn number(&self, index: usize) -> Option<f32> {
        self.operands.get(index).and_then(Operand::as_number)
    }
}

/// Decode the bytes of a shown string.
///
/// `Identity-*` encoded fonts are tried as 2-byte big-endian code units
/// first. Otherwise a UTF-16BE BOM selects UTF-16, valid UTF-8 is kept, and
/// anything else is read as Latin-1.
pub fn decode_pdf_string(bytes: &[u8], encoding: Option<&str>) -> String {
    if encoding.is_some_and(|enc| enc.starts_with("Identity"))
        && !bytes.is_empty()
        && bytes.len() % 2 == 0
    {
        let decoded = decode_utf16be(bytes);
        if decoded.chars().any(|c| c != '\u{FFFD}' && c != '\0') {
            return decoded;
        }
    }

    if let Some(payload) = bytes.strip_prefix(&[0xFE_u8, 0xFF]) {
        return decode_utf16be(payload);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn decode_utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// What the fragment extractor needs from a parsed document.
///
/// Implemented by [`LopdfBackend`]; tests substitute a mock that serves
/// pre-built operations.
pub trait PdfBackend {
    /// 1-based page number to [`PageId`], in page order.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Fonts referenced by the page's resources.
    fn page_fonts(&self, page: PageId) -> Result<Vec<PageFont>, PdfError>;

    /// The page's content stream, decoded into operations.
    fn page_operations(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError>;

    /// The page's MediaBox, inherited from ancestors when needed.
    fn page_bounds(&self, page: PageId) -> PageBounds;
}

/// [`PdfBackend`] over an in-memory [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from bytes. Encrypted documents are refused.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    /// Walk from the page up through `/Parent` links until a MediaBox is
    /// found. A chain that revisits a node ends the search.
    fn find_media_box(&self, page: PageId) -> Option<PageBounds> {
        let mut visited = HashSet::new();
        let mut current = page;
        loop {
            if !visited.insert(current) {
                log::debug!("page tree loops back to {:?}", current);
                return None;
            }
            let dict = self.doc.get_object(current).ok()?.as_dict().ok()?;
            if let Ok(obj) = dict.get(b"MediaBox") {
                if let Some(bounds) = self.bounds_from_object(obj) {
                    return Some(bounds);
                }
            }
            current = dict.get(b"Parent").ok()?.as_reference().ok()?;
        }
    }

    fn bounds_from_object(&self, obj: &lopdf::Object) -> Option<PageBounds> {
        let array = match obj {
            lopdf::Object::Reference(id) => self.doc.get_object(*id).ok()?.as_array().ok()?,
            other => other.as_array().ok()?,
        };
        let nums: Vec<f32> = array
            .iter()
            .filter_map(|item| match self.resolve(item) {
                lopdf::Object::Integer(i) => Some(*i as f32),
                lopdf::Object::Real(f) => Some(*f),
                _ => None,
            })
            .collect();
        match nums.as_slice() {
            [llx, lly, urx, ury] => Some(PageBounds {
                llx: llx.min(*urx),
                lly: lly.min(*ury),
                urx: llx.max(*urx),
                ury: lly.max(*ury),
            }),
            _ => None,
        }
    }

    fn resolve<'a>(&'a self, obj: &'a lopdf::Object) -> &'a lopdf::Object {
        match obj {
            lopdf::Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<PageFont>, PdfError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;

        let name_of = |dict: &lopdf::Dictionary, key: &[u8]| {
            dict.get(key)
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).into_owned())
        };

        Ok(fonts
            .iter()
            .map(|(key, dict)| PageFont {
                key: key.clone(),
                base_font: name_of(dict, b"BaseFont")
                    .unwrap_or_else(|| String::from_utf8_lossy(key).into_owned()),
                encoding: name_of(dict, b"Encoding"),
            })
            .collect())
    }

    fn page_operations(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError> {
        let data = self
            .doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))?;
        let content = Content::decode(&data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .iter()
            .map(|op| ContentOp {
                operator: op.operator.clone(),
                operands: op.operands.iter().map(Operand::from).collect(),
            })
            .collect())
    }

    fn page_bounds(&self, page: PageId) -> PageBounds {
        self.find_media_box(page).unwrap_or_else(|| {
            log::debug!("page {:?} has no usable MediaBox, assuming US-Letter", page);
            DEFAULT_MEDIA_BOX
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    // -- decode_pdf_string --------------------------------------------------

    #[test]
    fn decode_utf8() {
        assert_eq!(decode_pdf_string("Overview".as_bytes(), None), "Overview");
        assert_eq!(decode_pdf_string("caf\u{00E9}".as_bytes(), None), "caf\u{00E9}");
    }

    #[test]
    fn decode_latin1_fallback() {
        assert_eq!(decode_pdf_string(&[0x63, 0x61, 0x66, 0xE9], None), "caf\u{00E9}");
    }

    #[test]
    fn decode_utf16_bom() {
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42], None), "AB");
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF], None), "");
    }

    #[test]
    fn decode_identity_encoding() {
        let bytes = [0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes, Some("Identity-H")), "Hi");
        // Without the encoding hint the same bytes are plain UTF-8 with NULs.
        assert_eq!(decode_pdf_string(&bytes, None), "\0H\0i");
    }

    #[test]
    fn decode_empty() {
        assert_eq!(decode_pdf_string(&[], Some("Identity-H")), "");
    }

    // -- Operand ------------------------------------------------------------

    #[test]
    fn operand_from_objects() {
        assert_eq!(Operand::from(&Object::Integer(12)), Operand::Number(12.0));
        assert_eq!(Operand::from(&Object::Real(1.5)), Operand::Number(1.5));
        assert_eq!(
            Operand::from(&Object::Name(b"F1".to_vec())),
            Operand::Name(b"F1".to_vec())
        );
        assert_eq!(
            Operand::from(&Object::string_literal("Hello")),
            Operand::Str(b"Hello".to_vec())
        );
        assert_eq!(
            Operand::from(&Object::Array(vec![Object::Integer(-250), Object::Null])),
            Operand::Array(vec![Operand::Number(-250.0), Operand::Other])
        );
        assert_eq!(Operand::from(&Object::Boolean(true)), Operand::Other);
    }

    #[test]
    fn content_op_number_accessor() {
        let op = ContentOp {
            operator: "Td".to_string(),
            operands: vec![Operand::Number(72.0), Operand::Name(b"X".to_vec())],
        };
        assert_eq!(op.number(0), Some(72.0));
        assert_eq!(op.number(1), None);
        assert_eq!(op.number(2), None);
    }

    // -- LopdfBackend -------------------------------------------------------

    fn document_with_inherited_media_box() -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"BT /F1 18 Tf 72 700 Td (Hello) Tj ET".to_vec(),
        ));
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn load_rejects_garbage() {
        assert!(matches!(
            LopdfBackend::load_bytes(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
        assert!(LopdfBackend::load_bytes(&[]).is_err());
    }

    #[test]
    fn backend_reads_pages_fonts_and_operations() {
        let backend = LopdfBackend::load_bytes(&document_with_inherited_media_box()).unwrap();
        let pages = backend.pages();
        assert_eq!(pages.len(), 1);

        let (&number, &page) = pages.iter().next().unwrap();
        assert_eq!(number, 1);

        let fonts = backend.page_fonts(page).unwrap();
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts[0].key, b"F1");
        assert_eq!(fonts[0].base_font, "Helvetica-Bold");
        assert_eq!(fonts[0].encoding, None);

        let operators: Vec<String> = backend
            .page_operations(page)
            .unwrap()
            .into_iter()
            .map(|op| op.operator)
            .collect();
        assert_eq!(operators, vec!["BT", "Tf", "Td", "Tj", "ET"]);
    }

    #[test]
    fn backend_inherits_media_box() {
        let backend = LopdfBackend::load_bytes(&document_with_inherited_media_box()).unwrap();
        let page = *backend.pages().values().next().unwrap();
        let bounds = backend.page_bounds(page);
        assert_eq!(bounds.urx, 595.0);
        assert_eq!(bounds.ury, 842.0);
    }

    /// One page without a MediaBox whose `/Parent` points back at itself.
    fn document_with_parent_cycle() -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"BT /F1 12 Tf 72 700 Td (Looped) Tj ET".to_vec(),
        ));
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();
        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(page_id),
                "Contents" => Object::Reference(content_id),
            }),
        );
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn backend_parent_cycle_falls_back_to_letter() {
        let backend = LopdfBackend::load_bytes(&document_with_parent_cycle()).unwrap();
        let page = *backend.pages().values().next().unwrap();
        assert_eq!(backend.page_bounds(page), DEFAULT_MEDIA_BOX);

        let fragments = crate::collect_fragments(&backend, &crate::DecodeOptions::default()).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "Looped");
        assert!((fragments[0].y - 80.0).abs() < 0.01);
    }
}
