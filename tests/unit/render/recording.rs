use super::*;

fn surface() -> RecordingSurface {
    RecordingSurface::new(Canvas::new(10, 10))
}

#[test]
fn groups_reset_and_restore_state() {
    let mut s = surface();
    s.set_alpha(0.5);
    s.set_blend_mode(BlendMode::Multiply);
    s.begin_transparency_group().unwrap();
    assert_eq!(s.alpha(), 1.0);
    assert_eq!(s.blend_mode(), BlendMode::Normal);
    s.end_transparency_group().unwrap();
    assert_eq!(s.alpha(), 0.5);
    assert_eq!(s.blend_mode(), BlendMode::Multiply);
    assert_eq!(s.depth(), 0);
}

#[test]
fn unbalanced_pops_are_errors() {
    let mut s = surface();
    assert!(matches!(s.pop_state(), Err(FxError::Surface(_))));
    assert!(s.end_transparency_group().is_err());

    s.begin_transparency_group().unwrap();
    assert!(s.pop_state().is_err());
    assert!(s.end_raster().is_err());
    s.end_transparency_group().unwrap();
}

#[test]
fn state_bracket_restores_transform() {
    let mut s = surface();
    s.push_state().unwrap();
    s.concat_transform(Affine::translate((3.0, 0.0)));
    assert_eq!(s.transform(), Affine::translate((3.0, 0.0)));
    s.pop_state().unwrap();
    assert_eq!(s.transform(), Affine::IDENTITY);
}

#[test]
fn group_depth_limit_fails_without_recording() {
    let mut s = surface().with_max_group_depth(1);
    s.begin_transparency_group().unwrap();
    assert!(s.begin_transparency_group().is_err());
    assert_eq!(s.count(&SurfaceCommand::BeginTransparencyGroup), 1);
    assert_eq!(s.group_depth(), 1);
}

#[test]
fn commands_are_logged_in_order() {
    let mut s = surface();
    s.push_state().unwrap();
    s.begin_raster().unwrap();
    s.end_raster().unwrap();
    s.pop_state().unwrap();
    assert_eq!(
        s.take_commands(),
        vec![
            SurfaceCommand::PushState,
            SurfaceCommand::BeginRaster,
            SurfaceCommand::EndRaster,
            SurfaceCommand::PopState,
        ]
    );
    assert!(s.commands().is_empty());
}
