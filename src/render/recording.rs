use crate::assets::bitmap::Bitmap;
use crate::assets::color::Color;
use crate::effects::blend::BlendMode;
use crate::effects::shadow::Shadow;
use crate::foundation::core::{Affine, BezPath, Canvas, CoverageMask, FillRule, Rect};
use crate::foundation::error::{FxError, FxResult};
use crate::render::surface::DrawingSurface;

/// One call made against a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCommand {
    PushState,
    PopState,
    ConcatTransform(Affine),
    SetAlpha(f32),
    SetBlendMode(BlendMode),
    ApplyShadow(Option<Shadow>),
    BeginTransparencyGroup,
    EndTransparencyGroup,
    BeginRaster,
    EndRaster,
    Clip { path: BezPath, rule: FillRule },
    ClipToMask { width: u32, height: u32, bounds: Rect },
    FillPath { path: BezPath, color: Color },
    DrawImage { width: u32, height: u32, transform: Affine },
}

#[derive(Clone, Debug)]
struct RecState {
    transform: Affine,
    alpha: f32,
    blend: BlendMode,
    shadow: Option<Shadow>,
}

impl Default for RecState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            alpha: 1.0,
            blend: BlendMode::Normal,
            shadow: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Saved {
    State,
    Group,
    Raster,
}

/// Surface that draws nothing and logs every call.
///
/// Nesting is checked: ending a group that was never begun, or popping state across an open
/// group, fails with a surface error. A maximum group depth can be configured to make
/// `begin_transparency_group` fail on demand.
#[derive(Debug)]
pub struct RecordingSurface {
    canvas: Canvas,
    commands: Vec<SurfaceCommand>,
    state: RecState,
    stack: Vec<(Saved, RecState)>,
    max_group_depth: Option<usize>,
}

impl RecordingSurface {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            commands: Vec::new(),
            state: RecState::default(),
            stack: Vec::new(),
            max_group_depth: None,
        }
    }

    /// Fail any `begin_transparency_group` that would exceed `depth` open groups.
    pub fn with_max_group_depth(mut self, depth: usize) -> Self {
        self.max_group_depth = Some(depth);
        self
    }

    pub fn commands(&self) -> &[SurfaceCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<SurfaceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Open state brackets, groups and raster buffers.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn group_depth(&self) -> usize {
        self.stack.iter().filter(|(s, _)| *s == Saved::Group).count()
    }

    pub fn alpha(&self) -> f32 {
        self.state.alpha
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.state.blend
    }

    pub fn shadow(&self) -> Option<&Shadow> {
        self.state.shadow.as_ref()
    }

    /// Number of recorded commands equal to `cmd`.
    pub fn count(&self, cmd: &SurfaceCommand) -> usize {
        self.commands.iter().filter(|c| *c == cmd).count()
    }

    fn pop(&mut self, want: Saved) -> FxResult<()> {
        match self.stack.last() {
            Some((kind, _)) if *kind == want => {
                if let Some((_, st)) = self.stack.pop() {
                    self.state = st;
                }
                Ok(())
            }
            Some((kind, _)) => Err(FxError::surface(format!(
                "unbalanced nesting: expected to close {want:?}, innermost open is {kind:?}"
            ))),
            None => Err(FxError::surface(format!(
                "unbalanced nesting: no open {want:?} to close"
            ))),
        }
    }

    fn push_layer(&mut self, kind: Saved) {
        self.stack.push((kind, self.state.clone()));
        self.state.alpha = 1.0;
        self.state.blend = BlendMode::Normal;
        self.state.shadow = None;
    }
}

impl DrawingSurface for RecordingSurface {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn push_state(&mut self) -> FxResult<()> {
        self.commands.push(SurfaceCommand::PushState);
        self.stack.push((Saved::State, self.state.clone()));
        Ok(())
    }

    fn pop_state(&mut self) -> FxResult<()> {
        self.commands.push(SurfaceCommand::PopState);
        self.pop(Saved::State)
    }

    fn transform(&self) -> Affine {
        self.state.transform
    }

    fn concat_transform(&mut self, transform: Affine) {
        self.commands.push(SurfaceCommand::ConcatTransform(transform));
        self.state.transform *= transform;
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.commands.push(SurfaceCommand::SetAlpha(alpha));
        self.state.alpha = alpha;
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.commands.push(SurfaceCommand::SetBlendMode(mode));
        self.state.blend = mode;
    }

    fn apply_shadow(&mut self, shadow: Option<&Shadow>) {
        self.commands.push(SurfaceCommand::ApplyShadow(shadow.cloned()));
        self.state.shadow = shadow.cloned();
    }

    fn begin_transparency_group(&mut self) -> FxResult<()> {
        if let Some(max) = self.max_group_depth
            && self.group_depth() >= max
        {
            return Err(FxError::surface(format!(
                "transparency group depth limit ({max}) reached"
            )));
        }
        self.commands.push(SurfaceCommand::BeginTransparencyGroup);
        self.push_layer(Saved::Group);
        Ok(())
    }

    fn end_transparency_group(&mut self) -> FxResult<()> {
        self.commands.push(SurfaceCommand::EndTransparencyGroup);
        self.pop(Saved::Group)
    }

    fn begin_raster(&mut self) -> FxResult<()> {
        self.commands.push(SurfaceCommand::BeginRaster);
        self.push_layer(Saved::Raster);
        Ok(())
    }

    fn end_raster(&mut self) -> FxResult<()> {
        self.commands.push(SurfaceCommand::EndRaster);
        self.pop(Saved::Raster)
    }

    fn clip(&mut self, path: &BezPath, rule: FillRule) -> FxResult<()> {
        self.commands.push(SurfaceCommand::Clip {
            path: path.clone(),
            rule,
        });
        Ok(())
    }

    fn clip_to_mask(&mut self, mask: &CoverageMask, bounds: Rect) -> FxResult<()> {
        self.commands.push(SurfaceCommand::ClipToMask {
            width: mask.width,
            height: mask.height,
            bounds,
        });
        Ok(())
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) -> FxResult<()> {
        self.commands.push(SurfaceCommand::FillPath {
            path: path.clone(),
            color,
        });
        Ok(())
    }

    fn draw_image(&mut self, bitmap: &Bitmap) -> FxResult<()> {
        self.commands.push(SurfaceCommand::DrawImage {
            width: bitmap.width(),
            height: bitmap.height(),
            transform: bitmap.screen_transform(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/recording.rs"]
mod tests;
