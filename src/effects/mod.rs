pub(crate) mod blend;
pub(crate) mod channel;
pub(crate) mod effect;
pub(crate) mod raster;
pub(crate) mod shadow;
pub(crate) mod stencil;
