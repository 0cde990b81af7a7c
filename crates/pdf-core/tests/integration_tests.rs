//! Integration tests for pdf-core
//!
//! These tests build documents end to end and re-parse the output with lopdf.

use image::{Rgb, RgbImage};
use lopdf::{Document, Object, ObjectId};
use pdf_core::{ImageXObject, PageSize, PdfDocument};
use pretty_assertions::assert_eq;

fn test_bitmap(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |_, y| {
        if y % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Collect the XObject references of every page, in page order
fn page_xobjects(doc: &Document) -> Vec<Vec<ObjectId>> {
    doc.get_pages()
        .values()
        .map(|page_id| {
            let page = doc.get_object(*page_id).unwrap().as_dict().unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
            xobjects
                .iter()
                .map(|(_, obj)| obj.as_reference().unwrap())
                .collect()
        })
        .collect()
}

fn media_box(doc: &Document, page_id: ObjectId) -> Vec<f32> {
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    page.get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|v| match v {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r as f32,
            _ => panic!("unexpected MediaBox entry"),
        })
        .collect()
}

#[test]
fn test_empty_document_roundtrip() {
    let mut doc = PdfDocument::new(PageSize::A4);
    doc.add_blank_page().unwrap();

    let bytes = doc.to_bytes().unwrap();
    let parsed = Document::load_mem(&bytes).unwrap();
    assert_eq!(parsed.get_pages().len(), 1);
}

#[test]
fn test_one_image_shared_by_pages() {
    let mut doc = PdfDocument::new(PageSize::LETTER);
    let image = doc
        .embed_image(ImageXObject::from_rgb8(&test_bitmap(20, 60)).unwrap())
        .unwrap();

    for n in 0..3 {
        let page = doc.add_blank_page().unwrap();
        doc.place_image(image, page, 0.0, -792.0 * n as f64, 612.0, 1836.0)
            .unwrap();
    }

    let bytes = doc.to_bytes().unwrap();
    let parsed = Document::load_mem(&bytes).unwrap();
    assert_eq!(parsed.get_pages().len(), 3);

    let refs = page_xobjects(&parsed);
    assert_eq!(refs.len(), 3);
    assert_eq!(refs[0].len(), 1);
    assert_eq!(refs[0], refs[1]);
    assert_eq!(refs[1], refs[2]);
}

#[test]
fn test_pages_use_document_page_size() {
    let mut doc = PdfDocument::new(PageSize::LETTER);
    doc.add_blank_page().unwrap();
    doc.add_blank_page().unwrap();

    let bytes = doc.to_bytes().unwrap();
    let parsed = Document::load_mem(&bytes).unwrap();
    for page_id in parsed.get_pages().values() {
        assert_eq!(media_box(&parsed, *page_id), vec![0.0, 0.0, 612.0, 792.0]);
    }
}

#[test]
fn test_page_content_offsets_image() {
    let mut doc = PdfDocument::new(PageSize::LETTER);
    let image = doc
        .embed_image(ImageXObject::from_rgb8(&test_bitmap(10, 10)).unwrap())
        .unwrap();
    let page = doc.add_blank_page().unwrap();
    // Second window of a 1000pt tall image: top edge 792pt above the page top
    doc.place_image(image, page, 0.0, -792.0, 612.0, 1000.0)
        .unwrap();

    let bytes = doc.to_bytes().unwrap();
    let parsed = Document::load_mem(&bytes).unwrap();
    let page_id = *parsed.get_pages().values().next().unwrap();
    let content = parsed.get_page_content(page_id).unwrap();
    let content = String::from_utf8(content).unwrap();

    // pdf_y = 792 - (-792) - 1000 = 584
    assert!(content.contains("612 0 0 1000 0 584 cm"), "{content}");
    assert!(content.contains("0 0 612 792 re W n"), "{content}");
}

#[test]
fn test_title_written_to_info() {
    let mut doc = PdfDocument::new(PageSize::A4);
    doc.set_title("Lease Addendum");
    doc.add_blank_page().unwrap();

    let bytes = doc.to_bytes().unwrap();
    let parsed = Document::load_mem(&bytes).unwrap();
    let info_id = parsed.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = parsed.get_object(info_id).unwrap().as_dict().unwrap();
    let title = info.get(b"Title").unwrap().as_str().unwrap();
    assert_eq!(title, b"Lease Addendum");
}

#[test]
fn test_jpeg_image_embeds() {
    let mut doc = PdfDocument::new(PageSize::A4);
    let image = doc
        .embed_image(ImageXObject::from_rgb8_jpeg(&test_bitmap(16, 16), 80).unwrap())
        .unwrap();
    let page = doc.add_blank_page().unwrap();
    doc.place_image(image, page, 0.0, 0.0, 595.28, 595.28).unwrap();

    let bytes = doc.to_bytes().unwrap();
    let parsed = Document::load_mem(&bytes).unwrap();
    let refs = page_xobjects(&parsed);
    let stream = parsed.get_object(refs[0][0]).unwrap().as_stream().unwrap();
    assert_eq!(
        stream.dict.get(b"Filter").unwrap().as_name().unwrap(),
        b"DCTDecode"
    );
}

#[test]
fn test_save_to_file() {
    let path = std::env::temp_dir().join("pdf_core_save_to_file.pdf");
    let mut doc = PdfDocument::new(PageSize::A4);
    doc.add_blank_page().unwrap();
    doc.save(&path).unwrap();

    let parsed = Document::load(&path).unwrap();
    assert_eq!(parsed.get_pages().len(), 1);
    let _ = std::fs::remove_file(&path);
}
