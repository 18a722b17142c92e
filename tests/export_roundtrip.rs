// End-to-end tests: load an encoded image, rasterize, export to ICO and decode it back
use base64::{Engine as _, engine::general_purpose};
use icon_converter::icon_handler::{
    CANONICAL_SIZES, EntryEncoding, IconConfig, IconError, IconRasterizer, ImageSource,
    RasterizedIcon, decode_icon, export_set, export_set_with, export_single, rasterize,
};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use std::io::Cursor;

fn create_image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        let alpha = if (x + y) % 7 == 0 { 0 } else { 255 };
        Rgba([(x % 255) as u8, (y % 255) as u8, ((x * y) % 255) as u8, alpha])
    });

    let dyn_img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8()),
        _ => DynamicImage::ImageRgba8(img),
    };
    let mut cursor = Cursor::new(Vec::new());
    dyn_img
        .write_to(&mut cursor, format)
        .expect("failed to encode test image");
    cursor.into_inner()
}

#[test]
fn single_size_round_trip_is_pixel_exact() {
    let rasterizer = IconRasterizer::new(IconConfig::default());
    let source = rasterizer
        .load(ImageSource::Bytes(create_image_bytes(120, 80, ImageFormat::Png)))
        .expect("png should load");

    let icon = rasterize(&source, 32).unwrap();
    let entries = decode_icon(&export_single(&icon).unwrap()).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(&entries[0].rgba, icon.rgba());
}

#[test]
fn canonical_set_round_trips_in_order() {
    let rasterizer = IconRasterizer::new(IconConfig::default());
    let source = rasterizer
        .load(ImageSource::Bytes(create_image_bytes(300, 300, ImageFormat::Png)))
        .unwrap();

    let icons = rasterizer.rasterize_many(&source, &CANONICAL_SIZES).unwrap();
    let entries = decode_icon(&export_set(&icons).unwrap()).unwrap();

    assert_eq!(entries.len(), CANONICAL_SIZES.len());
    for ((entry, icon), size) in entries.iter().zip(&icons).zip(CANONICAL_SIZES) {
        assert_eq!(entry.width, size);
        assert_eq!(entry.height, size);
        assert_eq!(&entry.rgba, icon.rgba());
    }
}

#[test]
fn jpeg_and_bmp_sources_are_accepted() {
    let rasterizer = IconRasterizer::new(IconConfig::default());

    for format in [ImageFormat::Jpeg, ImageFormat::Bmp] {
        let source = rasterizer
            .load(ImageSource::Bytes(create_image_bytes(64, 48, format)))
            .unwrap_or_else(|e| panic!("{:?} should load: {}", format, e));
        assert_eq!(source.format(), Some(format));
        assert_eq!((source.width(), source.height()), (64, 48));
    }
}

#[test]
fn base64_source_matches_byte_source() {
    let bytes = create_image_bytes(40, 40, ImageFormat::Png);
    let rasterizer = IconRasterizer::new(IconConfig::default());

    let from_bytes = rasterizer.load(ImageSource::Bytes(bytes.clone())).unwrap();
    let from_base64 = rasterizer
        .load(ImageSource::Base64(format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&bytes)
        )))
        .unwrap();

    assert_eq!(from_bytes.pixels(), from_base64.pixels());
    assert_eq!(from_base64.source_hint(), "base64");
}

#[test]
fn existing_icon_file_can_be_used_as_source() {
    let source = IconRasterizer::new(IconConfig::default())
        .load(ImageSource::Bytes(create_image_bytes(50, 50, ImageFormat::Png)))
        .unwrap();
    let ico = export_single(&rasterize(&source, 48).unwrap()).unwrap();

    let reloaded = IconRasterizer::new(IconConfig::default())
        .load(ImageSource::Bytes(ico))
        .expect("ico should be accepted as input");
    assert_eq!((reloaded.width(), reloaded.height()), (48, 48));
}

#[test]
fn corrupt_input_fails_with_decode_category() {
    let rasterizer = IconRasterizer::new(IconConfig::default());

    let mut truncated = create_image_bytes(64, 64, ImageFormat::Png);
    truncated.truncate(60);

    for bytes in [truncated, b"plain text".to_vec()] {
        let err = rasterizer.load(ImageSource::Bytes(bytes)).unwrap_err();
        assert!(err.is_decode_failure(), "unexpected error: {err}");
    }
}

#[test]
fn encode_errors_for_invalid_sets() {
    assert!(matches!(export_set(&[]), Err(IconError::Encode(_))));

    let source = IconRasterizer::new(IconConfig::default())
        .load(ImageSource::Bytes(create_image_bytes(10, 10, ImageFormat::Png)))
        .unwrap();
    let big = rasterize(&source, 257).unwrap();
    assert_eq!(big.rgba().dimensions(), (257, 257));
    assert!(matches!(export_single(&big), Err(IconError::Encode(_))));
}

#[test]
fn auto_encoding_still_decodes_every_entry() {
    let icons: Vec<RasterizedIcon> = [16u32, 256]
        .into_iter()
        .map(|size| {
            let canvas = image::RgbaImage::from_pixel(size, size, Rgba([7, 8, 9, 255]));
            RasterizedIcon::from_canvas(canvas).unwrap()
        })
        .collect();

    let entries = decode_icon(&export_set_with(&icons, EntryEncoding::Auto).unwrap()).unwrap();
    assert_eq!(entries.len(), 2);
    for entry in &entries {
        assert_eq!(entry.rgba.get_pixel(0, 0).0, [7, 8, 9, 255]);
    }
}
