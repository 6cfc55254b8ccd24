use std::collections::BTreeMap;

use crate::{
    assets::source::ImageRef,
    catalog::model::{Catalog, CategoryId, ExpressionId, PartDefinition, PartPosition, PoseId},
    compose::layers::{CompositionInput, ResolvedLayer, compose_layers},
    compose::variant::resolve_variant_key,
    foundation::core::{Direction, PartTransform, Vec2},
};

/// Resolve layers as seen from `direction`.
///
/// Equivalent to [`resolve_layers`](crate::resolve_layers) followed by the direction rules:
/// hidden categories, sides and extras are dropped, then each remaining non-front layer either
/// swaps to its part's direction art or receives the part's positional correction.
pub fn resolve_layers_for_direction(
    catalog: &Catalog,
    selections: &BTreeMap<CategoryId, String>,
    pose: &PoseId,
    expression: &ExpressionId,
    transforms: &BTreeMap<CategoryId, PartTransform>,
    direction: Direction,
) -> Vec<ResolvedLayer> {
    compose_for_direction(
        catalog,
        &CompositionInput::new(selections, pose, expression, transforms),
        direction,
    )
}

/// Full composition for one direction: layers, direction rules, then the face offset.
#[tracing::instrument(skip(catalog, input))]
pub fn compose_for_direction(
    catalog: &Catalog,
    input: &CompositionInput<'_>,
    direction: Direction,
) -> Vec<ResolvedLayer> {
    let layers = compose_layers(catalog, input);
    let mut layers = adapt_for_direction(catalog, input, layers, direction);
    apply_face_offset(catalog, &mut layers, input.face_offset);
    layers
}

/// Apply the direction rules to already composed layers.
pub fn adapt_for_direction(
    catalog: &Catalog,
    input: &CompositionInput<'_>,
    layers: Vec<ResolvedLayer>,
    direction: Direction,
) -> Vec<ResolvedLayer> {
    let rules = &catalog.directions;
    let mut out: Vec<ResolvedLayer> = layers
        .into_iter()
        .filter(|l| !rules.hides_category(direction, l.category.as_str()))
        .filter(|l| !l.side.is_some_and(|side| rules.hides_side(direction, side)))
        .filter(|l| !(l.is_extra && rules.hides_extras(direction, l.category.as_str())))
        .collect();

    if direction == Direction::Front {
        return out;
    }

    for layer in &mut out {
        let Some(part) = input
            .selections
            .get(&layer.category)
            .and_then(|id| catalog.part(layer.category.as_str(), id))
        else {
            continue;
        };

        // Swapped art is already drawn for the angle; corrections would double-move it.
        if let Some(image) = part.direction_variants.get(&direction) {
            if !layer.is_extra {
                layer.image = ImageRef::path(image.as_str());
            }
            continue;
        }

        if let Some(fix) = correction_for(catalog, input, part, layer, direction) {
            layer.set_transform(PartTransform::new(
                layer.offset_x + fix.offset_x,
                layer.offset_y + fix.offset_y,
                layer.rotate + fix.rotate,
            ));
        }
    }
    out
}

fn correction_for(
    catalog: &Catalog,
    input: &CompositionInput<'_>,
    part: &PartDefinition,
    layer: &ResolvedLayer,
    direction: Direction,
) -> Option<PartPosition> {
    if let Some(side) = layer.side {
        return part
            .side_offsets
            .get(&direction)
            .and_then(|sides| sides.get(&side))
            .copied();
    }
    if let Some(fix) = part.position_overrides.get(direction.as_str()) {
        return Some(*fix);
    }
    let expression = input.expression_for(catalog, &layer.category);
    let key = resolve_variant_key(catalog, part, input.pose, expression)?;
    part.position_overrides
        .get(&format!("{direction}-{key}"))
        .copied()
}

/// Move every face-group layer by the drag offset (same direction on both sides).
pub fn apply_face_offset(catalog: &Catalog, layers: &mut [ResolvedLayer], offset: Vec2) {
    if offset == Vec2::ZERO {
        return;
    }
    for layer in layers
        .iter_mut()
        .filter(|l| catalog.face_group.contains(&l.category))
    {
        layer.translate(offset);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/direction.rs"]
mod tests;
