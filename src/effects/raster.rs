use std::ops::{Deref, DerefMut};

use crate::foundation::error::{FxResult, prefer_primary};
use crate::render::surface::DrawingSurface;

/// Offscreen buffering: drawing is redirected into a dedicated pixel buffer and composited back
/// when the scope ends.
pub struct Raster;

impl Raster {
    /// Begin a raster buffer. The buffer is composited when the guard is dropped or finished.
    pub fn enter<S: DrawingSurface + ?Sized>(surface: &mut S) -> FxResult<RasterGuard<'_, S>> {
        surface.begin_raster()?;
        Ok(RasterGuard {
            surface,
            open: true,
        })
    }

    pub fn scoped<S: DrawingSurface + ?Sized, R>(
        surface: &mut S,
        body: impl FnOnce(&mut S) -> FxResult<R>,
    ) -> FxResult<R> {
        let mut guard = Self::enter(surface)?;
        let out = body(&mut *guard);
        let cleanup = guard.finish();
        prefer_primary(out, cleanup)
    }
}

pub struct RasterGuard<'a, S: DrawingSurface + ?Sized> {
    surface: &'a mut S,
    open: bool,
}

impl<S: DrawingSurface + ?Sized> RasterGuard<'_, S> {
    /// End the buffer now and report a compositing failure.
    pub fn finish(mut self) -> FxResult<()> {
        self.close()
    }

    fn close(&mut self) -> FxResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.surface.end_raster()
    }
}

impl<S: DrawingSurface + ?Sized> Drop for RasterGuard<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "raster buffer cleanup failed");
        }
    }
}

impl<S: DrawingSurface + ?Sized> Deref for RasterGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: DrawingSurface + ?Sized> DerefMut for RasterGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/raster.rs"]
mod tests;
