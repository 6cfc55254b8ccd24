pub(crate) mod apply;
pub(crate) mod palette;
pub(crate) mod svg;
