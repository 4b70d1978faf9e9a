//! Integration tests for complete editing workflows
//!
//! These run without network access: no API key is configured, so the local
//! brightness filter does all background removal.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba};
use quickcut::{
    edit_bytes, BackgroundRemovalProcessor, EditSession, EditorConfig, EditorError,
    FilterThresholds, ImageIOService, OutputFormat, RemovalMethod, ResizeRequest,
};
use std::path::Path;
use tempfile::TempDir;

/// 200x100 product shot on a white backdrop with a dark box in the middle
fn product_shot() -> RgbImage {
    RgbImage::from_fn(200, 100, |x, y| {
        if (50..150).contains(&x) && (25..75).contains(&y) {
            Rgb([60, 80, 100])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

fn product_png() -> Vec<u8> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(product_shot())
        .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

fn write_image(dir: &Path, name: &str, format: ImageFormat) -> std::path::PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgb8(product_shot())
        .save_with_format(&path, format)
        .unwrap();
    path
}

#[tokio::test]
async fn test_file_to_png_with_resize() {
    let dir = TempDir::new().unwrap();
    let input = write_image(dir.path(), "shot.png", ImageFormat::Png);

    let config = EditorConfig::builder().resize_width(100.0).build().unwrap();
    let processor = BackgroundRemovalProcessor::new(config).unwrap();

    let mut result = processor.process_file(&input).await.unwrap();
    assert_eq!(result.method, RemovalMethod::Local);
    assert_eq!(result.original_dimensions, (200, 100));
    assert_eq!(result.dimensions(), (100, 50));
    assert_eq!(result.input_path.as_deref(), Some(input.display().to_string().as_str()));

    let output = ImageIOService::default_output_path(&input, OutputFormat::Png);
    assert_eq!(output, dir.path().join("shot-background-removed.png"));
    result.save(&output, OutputFormat::Png, 100).unwrap();
    assert!(result.timings.encode_ms.is_some());

    let saved = image::open(&output).unwrap().to_rgba8();
    assert_eq!(saved.dimensions(), (100, 50));
    // Corners were white backdrop, centre was the subject
    assert_eq!(saved.get_pixel(0, 0)[3], 0);
    assert_eq!(saved.get_pixel(99, 49)[3], 0);
    assert_eq!(saved.get_pixel(50, 25)[3], 255);
}

#[tokio::test]
async fn test_jpeg_input_fit_within_box() {
    let dir = TempDir::new().unwrap();
    let input = write_image(dir.path(), "shot.jpg", ImageFormat::Jpeg);

    let config = EditorConfig::builder()
        .resize_width(50.0)
        .resize_height(50.0)
        .build()
        .unwrap();
    let processor = BackgroundRemovalProcessor::new(config).unwrap();

    let result = processor.process_file(&input).await.unwrap();
    // min(50/200, 50/100) wins
    assert_eq!(result.dimensions(), (50, 25));
}

#[tokio::test]
async fn test_working_size_box() {
    let config = EditorConfig::builder()
        .max_working_size(Some((40, 40)))
        .build()
        .unwrap();
    let png = product_png();
    let result = edit_bytes(&png, &config).await.unwrap();
    assert_eq!(result.original_dimensions, (200, 100));
    assert_eq!(result.dimensions(), (40, 20));
}

#[tokio::test]
async fn test_non_image_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("notes.png");
    std::fs::write(&input, b"these are not pixels").unwrap();

    let processor = BackgroundRemovalProcessor::new(EditorConfig::default()).unwrap();
    let err = processor.process_file(&input).await.unwrap_err();
    assert!(matches!(err, EditorError::InvalidInput(_)));
    assert!(err.to_string().contains("Please select an image file!"));
}

#[tokio::test]
async fn test_plain_text_file_is_not_an_image() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("notes.txt");
    std::fs::write(&input, b"these are not pixels").unwrap();

    let processor = BackgroundRemovalProcessor::new(EditorConfig::default()).unwrap();
    let err = processor.process_file(&input).await.unwrap_err();
    assert!(matches!(err, EditorError::InvalidInput(_)));
    assert!(err.to_string().contains("Please select an image file!"));
}

#[tokio::test]
async fn test_oversized_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_image(dir.path(), "shot.png", ImageFormat::Png);
    let size = std::fs::metadata(&input).unwrap().len();

    let config = EditorConfig::builder().max_input_bytes(size - 1).build().unwrap();
    let processor = BackgroundRemovalProcessor::new(config).unwrap();
    let err = processor.process_file(&input).await.unwrap_err();
    assert!(err.to_string().contains("File size should be less than"));

    // Exactly at the limit is fine
    let config = EditorConfig::builder().max_input_bytes(size).build().unwrap();
    let processor = BackgroundRemovalProcessor::new(config).unwrap();
    assert!(processor.process_file(&input).await.is_ok());
}

#[tokio::test]
async fn test_jpeg_output_drops_alpha() {
    let png = product_png();
    let config = EditorConfig::builder()
        .output_format(OutputFormat::Jpeg)
        .build()
        .unwrap();

    let result = edit_bytes(&png, &config).await.unwrap();
    let jpeg = result.to_bytes(config.output_format, config.jpeg_quality).unwrap();
    assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
    assert!(!image::load_from_memory(&jpeg).unwrap().color().has_alpha());
}

#[test]
fn test_session_round_trip() {
    let image = DynamicImage::ImageRgb8(product_shot());
    let session = EditSession::load(&image, None, image::imageops::FilterType::Triangle).unwrap();
    assert!(!session.is_processed());

    let session = session
        .remove_background_local(FilterThresholds {
            brightness: 240,
            near_white: 250,
        })
        .resize(
            &ResizeRequest::default().with_height(25.0),
            image::imageops::FilterType::Nearest,
        )
        .unwrap();
    assert_eq!(session.current().dimensions(), (50, 25));
    assert!(session.is_processed());

    let png = session.export_png().unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0), &Rgba([255, 255, 255, 0]));

    let session = session.reset();
    assert_eq!(session.current().dimensions(), (200, 100));
    assert_eq!(session.current(), &DynamicImage::ImageRgb8(product_shot()).to_rgba8());
}
