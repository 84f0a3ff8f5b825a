//! canvasfx is the compositing-effects layer of a 2D creative-coding environment.
//!
//! Drawing is wrapped in effect scopes that realize blend mode, alpha, drop shadow and
//! rasterization as nested transparency groups, and can be clipped by stencils cut from vector
//! shapes or from one channel of a bitmap. All state lives in an explicit [`CompositingContext`]
//! over a [`DrawingSurface`]:
//!
//! - Build an [`Effect`] from an [`EffectSpec`] and open it with [`Effect::enter`] or
//!   [`Effect::scoped`]
//! - Cut a [`Stencil`] from a [`Shape`] or [`Bitmap`] and draw under it with [`Stencil::clipped`]
//! - Render with [`CpuSurface`], or inspect the call sequence with [`RecordingSurface`]
//!
//! The [`ParameterTable`] holds a script's dashboard [`Variable`]s across reloads.
#![forbid(unsafe_code)]

mod assets;
mod dashboard;
mod effects;
mod foundation;
mod render;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, CoverageMask, FillRule, FrameRGBA, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{FxError, FxResult};

pub use crate::assets::bitmap::Bitmap;
pub use crate::assets::color::{Color, ColorSpec};
pub use crate::assets::shape::{MaskSource, Shape};

pub use crate::effects::blend::{BlendCategory, BlendMode};
pub use crate::effects::channel::{
    Channel, ColorMatrix, MaskFilter, image_mask_coverage, invert_polarity, isolate_channel,
};
pub use crate::effects::effect::{
    Effect, EffectKind, EffectScope, EffectSettings, EffectSpec, KindSet, Layer,
};
pub use crate::effects::raster::{Raster, RasterGuard};
pub use crate::effects::shadow::{Offset, Shadow, ShadowSpec};
pub use crate::effects::stencil::{Stencil, StencilSource};

pub use crate::render::context::{CompositingContext, Grob};
pub use crate::render::cpu::{CpuSurface, CpuSurfaceOpts};
pub use crate::render::recording::{RecordingSurface, SurfaceCommand};
pub use crate::render::surface::DrawingSurface;

pub use crate::dashboard::table::ParameterTable;
pub use crate::dashboard::variable::{
    Variable, VariableDef, VariableKind, VariableType, VariableValue,
};
