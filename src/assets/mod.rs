pub(crate) mod bitmap;
pub(crate) mod color;
pub(crate) mod shape;
