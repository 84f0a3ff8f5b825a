use super::*;
use crate::effects::shadow::ShadowSpec;

#[test]
fn kernel_weights_sum_to_one_q16() {
    for (r, s) in [(1, 0.5), (3, 1.5), (10, 5.0)] {
        let k = gaussian_kernel_q16(r, s).unwrap();
        assert_eq!(k.len(), (2 * r + 1) as usize);
        assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 1 << 16);
    }
    assert!(gaussian_kernel_q16(2, 0.0).is_err());
}

#[test]
fn blur_radius_0_is_identity() {
    let src: Vec<u8> = (0..4 * 3 * 4).map(|i| (i as u8).wrapping_mul(31)).collect();
    let mut dst = vec![0u8; src.len()];
    let k = gaussian_kernel_q16(0, 1.0).unwrap();
    blur_rgba8_premul_q16(&src, &mut dst, 4, 3, &k);
    assert_eq!(dst, src);
}

#[test]
fn blur_spreads_a_single_pixel() {
    let (w, h) = (5u32, 5u32);
    let mut src = vec![0u8; 5 * 5 * 4];
    let centre = (2 * 5 + 2) * 4;
    src[centre..centre + 4].copy_from_slice(&[255, 255, 255, 255]);
    let mut dst = vec![0u8; src.len()];
    let k = gaussian_kernel_q16(2, 1.0).unwrap();
    blur_rgba8_premul_q16(&src, &mut dst, w, h, &k);
    assert!(dst[centre + 3] < 255);
    assert!(dst[(2 * 5 + 3) * 4 + 3] > 0);
}

#[test]
fn unblurred_shadow_moves_down_for_positive_y() {
    let (w, h) = (4u32, 4u32);
    let mut src = vec![0u8; 4 * 4 * 4];
    src[0..4].copy_from_slice(&[255, 0, 0, 255]);
    let shadow = Shadow::new(
        ShadowSpec::default()
            .color("#000000")
            .blur(0.0)
            .offset((1.0, 2.0)),
    )
    .unwrap();
    let out = shadow_layer(&src, w, h, &shadow, 256).unwrap();
    let at = |x: usize, y: usize| &out[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
    assert_eq!(at(1, 2), &[0, 0, 0, 255]);
    assert_eq!(at(0, 0), &[0, 0, 0, 0]);
}

#[test]
fn shadow_radius_is_capped() {
    let k = shadow_kernel(1000.0, 8).unwrap();
    assert_eq!(k.len(), 17);
}
