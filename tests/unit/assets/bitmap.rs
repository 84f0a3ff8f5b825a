use std::io::Cursor;

use super::*;

#[test]
fn from_rgba8_premultiplies_and_detects_alpha() {
    let bm = Bitmap::from_rgba8(1, 1, vec![100, 50, 200, 128]).unwrap();
    assert!(bm.has_alpha());
    assert_eq!(
        bm.premul_bytes(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128
        ]
    );

    let opaque = Bitmap::solid(2, 2, [1, 2, 3, 255]).unwrap();
    assert!(!opaque.has_alpha());
    assert_eq!(opaque.pixel(1, 1), Some([1, 2, 3, 255]));
    assert_eq!(opaque.pixel(2, 0), None);
}

#[test]
fn rejects_mismatched_buffers() {
    assert!(Bitmap::from_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(Bitmap::from_rgba8(0, 2, Vec::new()).is_err());
}

#[test]
fn decode_png_keeps_alpha_flag_from_format() {
    let img = image::RgbImage::from_raw(1, 1, vec![10, 20, 30]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let bm = Bitmap::decode(&buf).unwrap();
    assert_eq!((bm.width(), bm.height()), (1, 1));
    assert!(!bm.has_alpha());
    assert_eq!(bm.pixel(0, 0), Some([10, 20, 30, 255]));
}

#[test]
fn decode_garbage_is_wrapped_error() {
    let err = Bitmap::decode(b"definitely not an image").unwrap_err();
    assert!(matches!(err, FxError::Other(_)));
}

#[test]
fn export_unpremultiplies() {
    let bm = Bitmap::from_rgba8(1, 1, vec![255, 0, 0, 128]).unwrap();
    let img = bm.to_rgba_image().unwrap();
    assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 128]);
}

#[test]
fn transform_is_carried() {
    let bm = Bitmap::solid(1, 1, [0, 0, 0, 255])
        .unwrap()
        .with_transform(Affine::translate((5.0, 6.0)));
    assert_eq!(bm.screen_transform(), Affine::translate((5.0, 6.0)));
    assert_eq!(bm.bounds(), Rect::new(0.0, 0.0, 1.0, 1.0));
}
