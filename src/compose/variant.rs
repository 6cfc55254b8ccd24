use crate::catalog::model::{
    Catalog, ExpressionId, ExpressionSlot, PartDefinition, PoseId, PoseSlot, VariantEntry,
    VariantKey,
};

/// Pick the variant key to draw for `part` under `pose` and `expression`.
///
/// Fallback order, first hit wins:
/// 1. the exact key;
/// 2. the catalog default pose with the same expression (pose-varying parts only);
/// 3. the same pose with the neutral expression (expression-varying parts only);
/// 4. default pose with neutral expression;
/// 5. the first key the part defines.
///
/// Only a part with no variants at all yields `None`.
pub fn resolve_variant_key(
    catalog: &Catalog,
    part: &PartDefinition,
    pose: &PoseId,
    expression: &ExpressionId,
) -> Option<VariantKey> {
    resolve_variant(catalog, part, pose, expression).map(|(key, _)| key.clone())
}

/// Like [`resolve_variant_key`], also returning the entry.
pub fn resolve_variant<'p>(
    catalog: &Catalog,
    part: &'p PartDefinition,
    pose: &PoseId,
    expression: &ExpressionId,
) -> Option<(&'p VariantKey, &'p VariantEntry)> {
    let default_pose = &catalog.default_pose;
    let neutral = &catalog.neutral_expression;

    let pose_slot = |p: &PoseId| {
        if part.varies_by_pose {
            PoseSlot::Pose(p.clone())
        } else {
            PoseSlot::Any
        }
    };
    let expression_slot = |e: &ExpressionId| {
        if part.varies_by_expression {
            ExpressionSlot::Expression(e.clone())
        } else {
            ExpressionSlot::Default
        }
    };

    let mut candidates = vec![VariantKey::new(pose_slot(pose), expression_slot(expression))];
    if part.varies_by_pose && pose != default_pose {
        candidates.push(VariantKey::new(
            pose_slot(default_pose),
            expression_slot(expression),
        ));
    }
    if part.varies_by_expression && expression != neutral {
        candidates.push(VariantKey::new(pose_slot(pose), expression_slot(neutral)));
    }
    candidates.push(VariantKey::new(
        pose_slot(default_pose),
        expression_slot(neutral),
    ));

    candidates
        .iter()
        .find_map(|key| part.variants.get_key_value(key))
        .or_else(|| part.variants.iter().next())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/variant.rs"]
mod tests;
