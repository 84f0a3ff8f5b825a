use super::*;
use crate::foundation::core::{Canvas, FillRule, Rect};
use crate::foundation::error::FxError;
use crate::render::recording::{RecordingSurface, SurfaceCommand};

fn ctx() -> CompositingContext<RecordingSurface> {
    CompositingContext::new(RecordingSurface::new(Canvas::new(32, 32)))
}

fn square() -> Grob {
    Grob::fill(Shape::rect(Rect::new(0.0, 0.0, 8.0, 8.0)), Color::WHITE)
}

#[test]
fn plain_leaf_is_drawn_inside_a_state_bracket() {
    let mut ctx = ctx();
    ctx.draw(&square()).unwrap();
    let cmds = ctx.surface().commands();
    assert_eq!(cmds.first(), Some(&SurfaceCommand::PushState));
    assert_eq!(cmds.get(1), Some(&SurfaceCommand::ConcatTransform(Affine::IDENTITY)));
    assert!(matches!(cmds.get(2), Some(SurfaceCommand::FillPath { .. })));
    assert_eq!(cmds.last(), Some(&SurfaceCommand::PopState));
    assert_eq!(cmds.len(), 4);
}

#[test]
fn ambient_effect_wraps_each_leaf() {
    let mut ctx = ctx();
    let _ = ctx.set_alpha(0.5).unwrap();
    ctx.draw_all(&[square(), square()]).unwrap();
    assert_eq!(ctx.surface().count(&SurfaceCommand::SetAlpha(0.5)), 2);
    assert_eq!(ctx.surface().count(&SurfaceCommand::BeginTransparencyGroup), 2);
    assert_eq!(ctx.surface().depth(), 0);
}

#[test]
fn setter_effect_rolls_back_on_exit() {
    let mut ctx = ctx();
    let shadow = Shadow::default();
    let _ = ctx.set_shadow(Some(&shadow));

    let mut off = ctx.set_shadow(None);
    assert!(ctx.ambient().shadow.is_none());
    off.scoped(&mut ctx, |ctx| ctx.draw(&square())).unwrap();
    assert_eq!(ctx.ambient().shadow.as_ref(), Some(&shadow));
    assert_eq!(ctx.surface().count(&SurfaceCommand::BeginTransparencyGroup), 0);
}

#[test]
fn setters_validate_before_mutating() {
    let mut ctx = ctx();
    assert!(matches!(ctx.set_alpha(3.0), Err(FxError::InvalidEffectValue(_))));
    assert!(ctx.set_blend("sparkle").is_err());
    assert!(ctx.ambient().is_empty());

    let _ = ctx.set_blend_mode(BlendMode::Overlay);
    let _ = ctx.set_raster(true);
    assert_eq!(ctx.ambient().blend, Some(BlendMode::Overlay));
    assert_eq!(ctx.ambient().raster, Some(true));
}

#[test]
fn masked_contents_sit_inside_the_clip_bracket() {
    let stencil = Stencil::new(&Shape::circle((16.0, 16.0), 8.0), false, None).unwrap();
    let mut ctx = ctx();
    ctx.draw(&Grob::masked(stencil, [square()])).unwrap();
    let cmds = ctx.surface().commands();
    assert_eq!(cmds[0], SurfaceCommand::PushState);
    assert!(matches!(
        cmds[1],
        SurfaceCommand::Clip {
            rule: FillRule::NonZero,
            ..
        }
    ));
    assert_eq!(cmds.last(), Some(&SurfaceCommand::PopState));
    assert_eq!(ctx.surface().depth(), 0);
}

#[test]
fn saved_pops_even_when_the_body_fails() {
    let mut ctx = ctx();
    let res: FxResult<()> = ctx.saved(|ctx| {
        ctx.surface_mut().concat_transform(Affine::scale(2.0));
        Err(FxError::invalid_effect("body"))
    });
    assert!(matches!(res, Err(FxError::InvalidEffectValue(_))));
    assert_eq!(ctx.surface().depth(), 0);
    assert_eq!(ctx.surface().transform(), Affine::IDENTITY);
}

#[test]
fn contexts_are_independent() {
    let mut a = ctx();
    let b = ctx();
    let _ = a.set_alpha(0.1).unwrap();
    assert!(b.ambient().is_empty());
}

#[test]
fn grobs_expose_mask_geometry() {
    let shape = Shape::rect(Rect::new(0.0, 0.0, 2.0, 2.0)).with_transform(Affine::scale(3.0));
    let fill = Grob::fill(shape.clone(), Color::BLACK);
    assert_eq!(fill.fill_path(), Some(shape.path.clone()));
    assert_eq!(fill.screen_transform(), Affine::scale(3.0));

    let image = Grob::from(Bitmap::solid(2, 2, [0, 0, 0, 255]).unwrap());
    assert!(image.fill_path().is_none());
    assert!(image.bitmap().is_some());

    let group = Grob::from(Effect::default());
    assert!(group.fill_path().is_none() && group.bitmap().is_none());
}
