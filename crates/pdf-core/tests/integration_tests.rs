//! Integration tests for pdf-core
//!
//! These tests build documents from scratch, serialize them and read them
//! back through lopdf.

use image::{DynamicImage, Rgb, RgbImage};
use pdf_core::{fit_box_scale, PageSize, PdfDocument, PdfError};
use pretty_assertions::assert_eq;

fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

fn xobject_names(doc: &lopdf::Document, page: u32) -> Vec<String> {
    let page_id = doc.get_pages()[&page];
    let page_dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let resources = match page_dict.get(b"Resources").unwrap() {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap().as_dict().unwrap(),
        obj => obj.as_dict().unwrap(),
    };
    let mut names = resources
        .get(b"XObject")
        .and_then(lopdf::Object::as_dict)
        .map(|dict| {
            dict.iter()
                .map(|(k, _)| String::from_utf8_lossy(k).to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    names.sort();
    names
}

fn page_content(doc: &lopdf::Document, page: u32) -> String {
    let page_id = doc.get_pages()[&page];
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).to_string()
}

#[test]
fn test_blank_document_round_trip() {
    let mut doc = PdfDocument::new();
    doc.add_blank_page(PageSize::A4).unwrap();
    doc.add_blank_page(PageSize::A4).unwrap();

    let bytes = doc.to_bytes().unwrap();
    assert!(bytes.starts_with(b"%PDF-"));

    let reopened = PdfDocument::open_from_bytes(&bytes).unwrap();
    assert_eq!(reopened.page_count(), 2);

    let size = reopened.page_size(2).unwrap();
    assert!((size.width - 595.28).abs() < 0.01);
    assert!((size.height - 841.89).abs() < 0.01);
}

#[test]
fn test_images_survive_serialization() {
    let mut doc = PdfDocument::new();
    let page = doc.add_blank_page(PageSize::A4).unwrap();

    let top = solid(40, 30, [255, 0, 0]);
    let bottom = solid(40, 30, [0, 0, 255]);
    doc.insert_image(&top, page, 0.0, 10.0, 400.0, 300.0).unwrap();
    doc.insert_image(&bottom, page, 0.0, 500.0, 400.0, 300.0)
        .unwrap();

    let bytes = doc.to_bytes().unwrap();
    let loaded = lopdf::Document::load_mem(&bytes).unwrap();

    assert_eq!(xobject_names(&loaded, 1), vec!["Im1", "Im2"]);

    let content = page_content(&loaded, 1);
    // Top-origin y=10 with height 300 on an 841.89pt page
    assert!(content.contains("/Im1 Do"));
    assert!(content.contains("/Im2 Do"));
    assert!(content.contains("400 0 0 300 0 531.89"));
    assert!(content.contains("400 0 0 300 0 41.89"));
}

#[test]
fn test_same_image_on_two_pages_is_embedded_once() {
    let mut doc = PdfDocument::new();
    let first = doc.add_blank_page(PageSize::A4).unwrap();
    let second = doc.add_blank_page(PageSize::A4).unwrap();

    let img = solid(8, 8, [0, 128, 0]);
    doc.insert_image(&img, first, 0.0, 0.0, 10.0, 10.0).unwrap();
    doc.insert_image(&img, second, 0.0, 0.0, 10.0, 10.0).unwrap();

    let bytes = doc.to_bytes().unwrap();
    let loaded = lopdf::Document::load_mem(&bytes).unwrap();

    let image_objects = loaded
        .objects
        .values()
        .filter(|obj| match obj {
            lopdf::Object::Stream(stream) => stream
                .dict
                .get(b"Subtype")
                .and_then(lopdf::Object::as_name)
                .map(|name| name == b"Image")
                .unwrap_or(false),
            _ => false,
        })
        .count();
    assert_eq!(image_objects, 1);
}

#[test]
fn test_fit_box_keeps_aspect_ratio() {
    let mut doc = PdfDocument::new();
    let page = doc.add_blank_page(PageSize::A4).unwrap();

    // 2:1 image into a 100x100 box ends up 100x50
    let img = solid(20, 10, [0, 0, 0]);
    let scale = fit_box_scale(20, 10, 100.0, 100.0);
    doc.insert_image(&img, page, 0.0, 0.0, 20.0 * scale, 10.0 * scale)
        .unwrap();

    let bytes = doc.to_bytes().unwrap();
    let loaded = lopdf::Document::load_mem(&bytes).unwrap();
    assert!(page_content(&loaded, 1).contains("100 0 0 50 0 791.89"));
}

#[test]
fn test_insert_image_rejects_missing_page() {
    let mut doc = PdfDocument::new();
    doc.add_blank_page(PageSize::A5).unwrap();

    let result = doc.insert_image(&solid(1, 1, [0, 0, 0]), 2, 0.0, 0.0, 1.0, 1.0);
    assert!(matches!(result, Err(PdfError::InvalidPage(2, 1))));
}

#[test]
fn test_open_invalid_bytes() {
    let result = PdfDocument::open_from_bytes(b"not a pdf");
    assert!(matches!(result, Err(PdfError::OpenError(_))));
}
