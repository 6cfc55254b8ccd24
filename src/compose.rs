pub(crate) mod direction;
pub(crate) mod layers;
pub(crate) mod variant;
