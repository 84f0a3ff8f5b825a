use super::*;

fn px(n: usize, p: [u8; 4]) -> Vec<u8> {
    p.iter().copied().cycle().take(n * 4).collect()
}

#[test]
fn normal_over_transparent_copies_source() {
    let mut dst = px(2, [0, 0, 0, 0]);
    let src = px(2, [10, 20, 30, 255]);
    composite_layer(&mut dst, &src, 1.0, BlendMode::Normal, None).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn half_opacity_halves_coverage() {
    let mut dst = px(1, [0, 0, 0, 0]);
    composite_layer(&mut dst, &px(1, [255, 0, 0, 255]), 0.5, BlendMode::Normal, None).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 128]);
}

#[test]
fn multiply_of_opaque_colors_is_channel_product() {
    let mut dst = px(1, [255, 128, 0, 255]);
    composite_layer(&mut dst, &px(1, [128, 255, 255, 255]), 1.0, BlendMode::Multiply, None)
        .unwrap();
    assert_eq!(dst, vec![128, 128, 0, 255]);
}

#[test]
fn screen_and_difference_on_opaque_pixels() {
    let mut dst = px(1, [0, 255, 100, 255]);
    composite_layer(&mut dst, &px(1, [255, 0, 100, 255]), 1.0, BlendMode::Screen, None).unwrap();
    assert_eq!(&dst[0..2], &[255, 255]);

    let mut dst = px(1, [200, 50, 0, 255]);
    composite_layer(&mut dst, &px(1, [50, 50, 0, 255]), 1.0, BlendMode::Difference, None)
        .unwrap();
    assert_eq!(dst, vec![150, 0, 0, 255]);
}

#[test]
fn clip_coverage_limits_the_write() {
    let mut dst = px(3, [0, 0, 0, 255]);
    let clip = [0u8, 255, 128];
    composite_layer(&mut dst, &px(3, [255, 255, 255, 255]), 1.0, BlendMode::Normal, Some(&clip))
        .unwrap();
    assert_eq!(&dst[0..4], &[0, 0, 0, 255]);
    assert_eq!(&dst[4..8], &[255, 255, 255, 255]);
    assert_eq!(&dst[8..12], &[128, 128, 128, 255]);
}

#[test]
fn porter_duff_modes() {
    let red = px(1, [255, 0, 0, 255]);
    let blue = px(1, [0, 0, 255, 255]);
    let clear = px(1, [0, 0, 0, 0]);

    let mut d = blue.clone();
    composite_layer(&mut d, &red, 1.0, BlendMode::Clear, None).unwrap();
    assert_eq!(d, clear);

    let mut d = blue.clone();
    composite_layer(&mut d, &red, 1.0, BlendMode::DestinationOver, None).unwrap();
    assert_eq!(d, blue);

    let mut d = clear.clone();
    composite_layer(&mut d, &red, 1.0, BlendMode::SourceIn, None).unwrap();
    assert_eq!(d, clear);

    let mut d = blue.clone();
    composite_layer(&mut d, &red, 1.0, BlendMode::DestinationOut, None).unwrap();
    assert_eq!(d, clear);

    let mut d = blue.clone();
    composite_layer(&mut d, &red, 1.0, BlendMode::Xor, None).unwrap();
    assert_eq!(d, clear);

    let mut d = blue;
    composite_layer(&mut d, &red, 1.0, BlendMode::PlusLighter, None).unwrap();
    assert_eq!(d, vec![255, 0, 255, 255]);
}

#[test]
fn luminosity_takes_source_lightness() {
    let mut dst = px(1, [255, 0, 0, 255]);
    composite_layer(&mut dst, &px(1, [255, 255, 255, 255]), 1.0, BlendMode::Luminosity, None)
        .unwrap();
    assert_eq!(dst, vec![255, 255, 255, 255]);

    let mut dst = px(1, [0, 0, 0, 255]);
    composite_layer(&mut dst, &px(1, [0, 255, 0, 255]), 1.0, BlendMode::Color, None).unwrap();
    assert_eq!(dst, vec![0, 0, 0, 255]);
}

#[test]
fn mismatched_buffers_are_rejected() {
    let mut dst = vec![0u8; 8];
    assert!(composite_layer(&mut dst, &[0u8; 4], 1.0, BlendMode::Normal, None).is_err());
    assert!(composite_layer(&mut dst, &[0u8; 8], 1.0, BlendMode::Normal, Some(&[0u8; 1])).is_err());
}

#[test]
fn hsl_helpers_preserve_luminosity() {
    let c = set_lum([1.0, 0.0, 0.0], 0.5);
    assert!((lum(c) - 0.5).abs() < 1e-4);
    assert!(c.iter().all(|v| (0.0..=1.0).contains(v)));
    assert_eq!(set_sat([0.2, 0.2, 0.2], 0.5), [0.0, 0.0, 0.0]);
}
