//! Synthetic PDFs for tests.

use lopdf::{dictionary, Object, Stream};

/// A line of text to place on a fixture page.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub text: &'a str,
    pub size: f32,
    /// Baseline, measured from the bottom of a 792pt-high page.
    pub baseline: f32,
}

pub const fn line(text: &str, size: f32, baseline: f32) -> Line<'_> {
    Line {
        text,
        size,
        baseline,
    }
}

/// Build a US-Letter document with one entry in `pages` per page. Text is
/// shown in Helvetica; parentheses and backslashes in it must be avoided.
pub fn document(pages: &[&[Line<'_>]]) -> Vec<u8> {
    let streams: Vec<String> = pages
        .iter()
        .map(|lines| {
            lines
                .iter()
                .map(|l| format!("BT /F1 {} Tf 72 {} Td ({}) Tj ET\n", l.size, l.baseline, l.text))
                .collect::<String>()
        })
        .collect();
    document_from_content(&streams)
}

/// Build a US-Letter document from raw content streams, one per page, with
/// Helvetica available as `/F1`.
pub fn document_from_content(pages: &[String]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages.len());
    for content in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .expect("writing a PDF into memory cannot fail");
    buf
}
