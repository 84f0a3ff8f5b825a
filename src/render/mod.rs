pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod context;
pub(crate) mod cpu;
pub(crate) mod recording;
pub(crate) mod surface;
