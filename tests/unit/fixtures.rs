use std::collections::BTreeMap;

use crate::{
    assets::source::FsAssetSource,
    catalog::model::{Catalog, CategoryId, ExpressionId, PoseId},
    foundation::core::PartTransform,
};

pub(crate) const DEMO_CATALOG: &str = include_str!("../../demos/catalog.json");

pub(crate) fn demo_catalog() -> Catalog {
    Catalog::from_json_str(DEMO_CATALOG).unwrap()
}

pub(crate) fn demo_assets() -> FsAssetSource {
    FsAssetSource::new(concat!(env!("CARGO_MANIFEST_DIR"), "/demos"))
}

/// body, face, eyes, mouth, nose and ears, all part "01".
pub(crate) fn basic_selections() -> BTreeMap<CategoryId, String> {
    ["body", "face", "eyes", "mouth", "nose", "ears"]
        .into_iter()
        .map(|c| (CategoryId::from(c), "01".to_owned()))
        .collect()
}

pub(crate) fn pose(id: &str) -> PoseId {
    PoseId::from(id)
}

pub(crate) fn expression(id: &str) -> ExpressionId {
    ExpressionId::from(id)
}

pub(crate) fn transforms(entries: &[(&str, PartTransform)]) -> BTreeMap<CategoryId, PartTransform> {
    entries
        .iter()
        .map(|(c, t)| (CategoryId::from(*c), *t))
        .collect()
}
