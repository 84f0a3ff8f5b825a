use kurbo::Shape as _;

use super::*;
use crate::effects::shadow::ShadowSpec;

fn surface(w: u32, h: u32) -> CpuSurface {
    CpuSurface::new(Canvas::new(w, h), CpuSurfaceOpts::default()).unwrap()
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
    Rect::new(x0, y0, x1, y1).to_path(0.1)
}

fn px(s: &CpuSurface, x: u32, y: u32) -> [u8; 4] {
    s.snapshot().unwrap().pixel(x, y).unwrap()
}

#[test]
fn fills_land_inside_the_path_only() {
    let mut s = surface(8, 8);
    s.fill_path(&rect(2.0, 2.0, 6.0, 6.0), Color::rgba(1.0, 0.0, 0.0, 1.0))
        .unwrap();
    assert_eq!(px(&s, 4, 4), [255, 0, 0, 255]);
    assert_eq!(px(&s, 0, 0), [0, 0, 0, 0]);
}

#[test]
fn half_alpha_group_halves_coverage() {
    let mut s = surface(4, 4);
    s.set_alpha(0.5);
    s.begin_transparency_group().unwrap();
    s.fill_path(&rect(0.0, 0.0, 4.0, 4.0), Color::WHITE).unwrap();
    s.end_transparency_group().unwrap();
    let [r, _, _, a] = px(&s, 1, 1);
    assert!((127..=128).contains(&a), "alpha was {a}");
    assert_eq!(r, a);
}

#[test]
fn multiply_of_opaque_colors_is_channel_product() {
    let mut s = surface(4, 4);
    let full = rect(0.0, 0.0, 4.0, 4.0);
    s.fill_path(&full, Color::rgba(1.0, 128.0 / 255.0, 0.0, 1.0))
        .unwrap();
    s.set_blend_mode(BlendMode::Multiply);
    s.fill_path(&full, Color::rgba(128.0 / 255.0, 1.0, 1.0, 1.0))
        .unwrap();
    assert_eq!(px(&s, 2, 2), [128, 128, 0, 255]);
}

#[test]
fn even_odd_knockout_leaves_path_interior_untouched() {
    let mut s = surface(10, 10);
    let mut knockout = rect(0.0, 0.0, 10.0, 10.0);
    knockout.extend(rect(3.0, 3.0, 7.0, 7.0).elements().iter().copied());
    s.push_state().unwrap();
    s.clip(&knockout, FillRule::EvenOdd).unwrap();
    s.fill_path(&rect(0.0, 0.0, 10.0, 10.0), Color::BLACK).unwrap();
    s.pop_state().unwrap();
    assert_eq!(px(&s, 5, 5), [0, 0, 0, 0]);
    assert_eq!(px(&s, 1, 1), [0, 0, 0, 255]);

    // The clip was scoped to the state bracket.
    s.fill_path(&rect(0.0, 0.0, 10.0, 10.0), Color::WHITE).unwrap();
    assert_eq!(px(&s, 5, 5), [255, 255, 255, 255]);
}

#[test]
fn clip_to_mask_stretches_over_bounds() {
    let mut s = surface(8, 4);
    let mask = CoverageMask {
        width: 2,
        height: 1,
        data: vec![255, 0],
    };
    s.clip_to_mask(&mask, Rect::new(0.0, 0.0, 8.0, 4.0)).unwrap();
    s.fill_path(&rect(0.0, 0.0, 8.0, 4.0), Color::BLACK).unwrap();
    assert_eq!(px(&s, 0, 2)[3], 255);
    assert_eq!(px(&s, 7, 2)[3], 0);
}

#[test]
fn shadow_is_cast_below_for_positive_y() {
    let mut s = surface(8, 8);
    let shadow = Shadow::new(
        ShadowSpec::default()
            .color("#000000")
            .blur(0.0)
            .offset((0.0, 4.0)),
    )
    .unwrap();
    s.apply_shadow(Some(&shadow));
    s.fill_path(&rect(0.0, 0.0, 3.0, 3.0), Color::WHITE).unwrap();
    assert_eq!(px(&s, 1, 1), [255, 255, 255, 255]);
    assert_eq!(px(&s, 1, 5), [0, 0, 0, 255]);
    assert_eq!(px(&s, 6, 1), [0, 0, 0, 0]);
}

#[test]
fn images_follow_their_transform() {
    let mut s = surface(6, 6);
    let bm = Bitmap::solid(2, 2, [0, 0, 255, 255])
        .unwrap()
        .with_transform(Affine::translate((3.0, 3.0)));
    s.draw_image(&bm).unwrap();
    assert_eq!(px(&s, 4, 4), [0, 0, 255, 255]);
    assert_eq!(px(&s, 1, 1), [0, 0, 0, 0]);
}

#[test]
fn raster_buffer_composites_back() {
    let mut s = surface(4, 4);
    s.begin_raster().unwrap();
    assert!(s.snapshot().is_err());
    s.fill_path(&rect(0.0, 0.0, 4.0, 4.0), Color::WHITE).unwrap();
    assert!(s.end_transparency_group().is_err());
    s.end_raster().unwrap();
    assert_eq!(px(&s, 2, 2), [255, 255, 255, 255]);
}

#[test]
fn unbalanced_nesting_is_a_surface_error() {
    let mut s = surface(2, 2);
    assert!(matches!(s.pop_state(), Err(FxError::Surface(_))));
    assert!(s.end_transparency_group().is_err());
    s.begin_transparency_group().unwrap();
    assert!(s.pop_state().is_err());
    assert_eq!(s.depth(), 1);
}

#[test]
fn clear_color_and_size_checks() {
    let s = CpuSurface::new(
        Canvas::new(2, 2),
        CpuSurfaceOpts::default().with_clear_rgba(Some([255, 255, 255, 255])),
    )
    .unwrap();
    assert_eq!(px(&s, 0, 0), [255, 255, 255, 255]);
    assert!(CpuSurface::new(Canvas::new(0, 2), CpuSurfaceOpts::default()).is_err());
    assert!(CpuSurface::new(Canvas::new(70_000, 2), CpuSurfaceOpts::default()).is_err());
    let img = s.to_rgba_image().unwrap();
    assert_eq!(img.dimensions(), (2, 2));
}

#[test]
fn blur_radius_option_overrides_default() {
    let opts = CpuSurfaceOpts::default().with_max_blur_radius(4);
    assert_eq!(opts.max_blur_radius(), 4);
}
