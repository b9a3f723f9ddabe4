//! Tests for canonical conversion.

mod common;

use common::{
    FailingRenderer, HEIGHT, StubRenderer, WIDTH, jpeg_payload, minimal_pdf, one_page_pdf,
    png_payload, png_sized, test_config, transparent_png,
};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;
use std::sync::Arc;
use vitrine_core::UploadFormat;
use vitrine_error::StoreErrorKind;
use vitrine_storage::{
    Converter, PageRenderer, UnavailableRenderer, fit_to_canvas, flatten_onto_white,
};

fn converter(renderer: Arc<dyn PageRenderer>) -> Converter {
    Converter::new(&test_config(Path::new("unused")), renderer)
}

fn decode(bytes: &[u8]) -> DynamicImage {
    image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg).unwrap()
}

#[test]
fn test_png_becomes_jpeg_at_target() {
    let output = converter(Arc::new(UnavailableRenderer))
        .convert(&png_payload(1), UploadFormat::Png)
        .unwrap();

    assert_eq!(UploadFormat::sniff(&output), Some(UploadFormat::Jpeg));
    let decoded = decode(&output);
    assert_eq!((decoded.width(), decoded.height()), (WIDTH, HEIGHT));
}

#[test]
fn test_conversion_is_deterministic() {
    let converter = converter(Arc::new(UnavailableRenderer));

    let first = converter.convert(&jpeg_payload(4), UploadFormat::Jpeg).unwrap();
    let second = converter.convert(&jpeg_payload(4), UploadFormat::Jpeg).unwrap();
    assert_eq!(first, second);

    let other = converter.convert(&jpeg_payload(5), UploadFormat::Jpeg).unwrap();
    assert_ne!(first, other);
}

#[test]
fn test_transparency_flattens_to_white() {
    let output = converter(Arc::new(UnavailableRenderer))
        .convert(&transparent_png(), UploadFormat::Png)
        .unwrap();

    let pixel = decode(&output).to_rgb8().get_pixel(WIDTH / 2, HEIGHT / 2).0;
    assert!(pixel.iter().all(|&c| c >= 250), "expected white, got {:?}", pixel);
}

#[test]
fn test_undecodable_image_fails_conversion() {
    let mut payload = png_payload(1);
    payload.truncate(payload.len() / 2);

    let err = converter(Arc::new(UnavailableRenderer))
        .convert(&payload, UploadFormat::Png)
        .unwrap_err();
    assert!(matches!(
        err.store_kind(),
        Some(StoreErrorKind::ConversionFailed(_))
    ));
}

#[test]
fn test_decoded_size_mismatch_fails_conversion() {
    let err = converter(Arc::new(UnavailableRenderer))
        .convert(&png_sized(1, 8, 8), UploadFormat::Png)
        .unwrap_err();
    assert!(matches!(
        err.store_kind(),
        Some(StoreErrorKind::ConversionFailed(_))
    ));
}

#[test]
fn test_pdf_rendered_onto_canvas() {
    let output = converter(Arc::new(StubRenderer::default()))
        .convert(&minimal_pdf("page"), UploadFormat::Pdf)
        .unwrap();

    let decoded = decode(&output);
    assert_eq!((decoded.width(), decoded.height()), (WIDTH, HEIGHT));
}

#[test]
fn test_pdf_without_trailer_fails() {
    let err = converter(Arc::new(StubRenderer::default()))
        .convert(b"%PDF-1.4\n1 0 obj\n<<>>\n", UploadFormat::Pdf)
        .unwrap_err();
    assert!(matches!(
        err.store_kind(),
        Some(StoreErrorKind::ConversionFailed(_))
    ));
}

#[test]
fn test_renderer_failure_is_conversion_failure() {
    for renderer in [
        Arc::new(FailingRenderer) as Arc<dyn PageRenderer>,
        Arc::new(UnavailableRenderer),
    ] {
        let err = converter(renderer)
            .convert(&minimal_pdf("page"), UploadFormat::Pdf)
            .unwrap_err();
        assert!(matches!(
            err.store_kind(),
            Some(StoreErrorKind::ConversionFailed(_))
        ));
    }
}

#[test]
fn test_empty_render_fails() {
    let renderer = StubRenderer {
        width: 0,
        height: 0,
    };
    let err = converter(Arc::new(renderer))
        .convert(&minimal_pdf("page"), UploadFormat::Pdf)
        .unwrap_err();
    assert!(matches!(
        err.store_kind(),
        Some(StoreErrorKind::ConversionFailed(_))
    ));
}

#[test]
fn test_flatten_blends_partial_alpha() {
    let image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 128]));
    let flat = flatten_onto_white(&DynamicImage::ImageRgba8(image));

    let Rgb([r, g, b]) = *flat.get_pixel(0, 0);
    assert_eq!((r, g, b), (127, 127, 127));
}

#[test]
fn test_fit_letterboxes_wide_page() {
    let page = RgbImage::from_pixel(200, 50, Rgb([0, 0, 0]));
    let canvas = fit_to_canvas(&page, 100, 100);

    assert_eq!(canvas.dimensions(), (100, 100));
    assert_eq!(*canvas.get_pixel(50, 0), Rgb([255, 255, 255]));
    assert_eq!(*canvas.get_pixel(50, 50), Rgb([0, 0, 0]));
    assert_eq!(*canvas.get_pixel(50, 99), Rgb([255, 255, 255]));
}

#[test]
fn test_fit_keeps_exact_size() {
    let page = RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([9, 9, 9]));
    assert_eq!(fit_to_canvas(&page, WIDTH, HEIGHT), page);
}

#[cfg(feature = "pdf")]
#[test]
fn test_real_pdf_first_page_rendered() {
    let output = converter(Arc::new(vitrine_storage::HayroRenderer))
        .convert(&one_page_pdf(), UploadFormat::Pdf)
        .unwrap();

    let decoded = decode(&output).to_rgb8();
    assert_eq!(decoded.dimensions(), (WIDTH, HEIGHT));
    let middle = decoded.get_pixel(WIDTH / 2, HEIGHT / 2);
    assert!(middle.0.iter().all(|&c| c < 60), "middle pixel {:?}", middle);
    let corner = decoded.get_pixel(0, 0);
    assert!(corner.0.iter().all(|&c| c > 200), "corner pixel {:?}", corner);
}

#[cfg(feature = "pdf")]
#[test]
fn test_real_renderer_rejects_pageless_document() {
    let err = converter(Arc::new(vitrine_storage::HayroRenderer))
        .convert(&minimal_pdf("empty"), UploadFormat::Pdf)
        .unwrap_err();
    assert!(matches!(
        err.store_kind(),
        Some(StoreErrorKind::ConversionFailed(_))
    ));
}
