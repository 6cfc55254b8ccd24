use std::collections::{BTreeMap, BTreeSet};

use crate::{
    assets::source::ImageRef,
    catalog::model::{Catalog, Category, CategoryId, ExpressionEffect, ExpressionId, PoseId},
    color::palette::PartColor,
    compose::variant::resolve_variant,
    foundation::core::{Affine, Canvas, PartTransform, Side, Vec2},
};

/// One drawable layer: what to draw, at which z, and how it is moved, clipped and mirrored.
///
/// Offsets are in canonical canvas pixels; scaling belongs to the renderers.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedLayer {
    /// Category the layer belongs to.
    pub category: CategoryId,
    /// Z-order; lower draws first.
    pub layer_index: u32,
    /// Image to draw.
    pub image: ImageRef,
    /// Horizontal offset.
    pub offset_x: f64,
    /// Vertical offset.
    pub offset_y: f64,
    /// Rotation in degrees about the canvas center.
    pub rotate: f64,
    /// Canvas half the layer is clipped to (bilateral parts only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    /// Mirror horizontally so left-authored art reads as the right side.
    #[serde(default)]
    pub flip_x: bool,
    /// Layer comes from a variant's extra layers.
    #[serde(default)]
    pub is_extra: bool,
    /// Color that wins over every color rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_color: Option<PartColor>,
}

impl ResolvedLayer {
    /// Offset and rotation as a transform value.
    pub fn transform(&self) -> PartTransform {
        PartTransform::new(self.offset_x, self.offset_y, self.rotate)
    }

    /// Canonical-space placement: rotate about the canvas center, offset, and mirror about the
    /// vertical center line when `flip_x` is set (the mirror is applied first, in layer space).
    pub fn canvas_affine(&self, canvas: Canvas) -> Affine {
        let center = canvas.center();
        let placed = self.transform().to_affine_about(center);
        if self.flip_x {
            let c = center.to_vec2();
            placed
                * Affine::translate(c)
                * Affine::scale_non_uniform(-1.0, 1.0)
                * Affine::translate(-c)
        } else {
            placed
        }
    }

    pub(crate) fn set_transform(&mut self, t: PartTransform) {
        self.offset_x = t.x;
        self.offset_y = t.y;
        self.rotate = t.rotate;
    }

    pub(crate) fn translate(&mut self, by: Vec2) {
        self.offset_x += by.x;
        self.offset_y += by.y;
    }
}

/// Borrowed view of everything composition reads from a selection state.
#[derive(Clone, Copy, Debug)]
pub struct CompositionInput<'a> {
    /// Selected part id per category.
    pub selections: &'a BTreeMap<CategoryId, String>,
    /// Active pose.
    pub pose: &'a PoseId,
    /// Active expression.
    pub expression: &'a ExpressionId,
    /// User transform per category.
    pub transforms: &'a BTreeMap<CategoryId, PartTransform>,
    /// Categories that keep the neutral expression whatever the active one is.
    pub expression_locks: Option<&'a BTreeSet<CategoryId>>,
    /// Drag offset applied to the face group.
    pub face_offset: Vec2,
}

impl<'a> CompositionInput<'a> {
    /// Input with no expression locks and no face offset.
    pub fn new(
        selections: &'a BTreeMap<CategoryId, String>,
        pose: &'a PoseId,
        expression: &'a ExpressionId,
        transforms: &'a BTreeMap<CategoryId, PartTransform>,
    ) -> Self {
        Self {
            selections,
            pose,
            expression,
            transforms,
            expression_locks: None,
            face_offset: Vec2::ZERO,
        }
    }

    /// Expression a category resolves with: neutral when locked, else the active one.
    pub(crate) fn expression_for<'c>(
        &self,
        catalog: &'c Catalog,
        category: &CategoryId,
    ) -> &'c ExpressionId
    where
        'a: 'c,
    {
        if self
            .expression_locks
            .is_some_and(|locks| locks.contains(category))
        {
            &catalog.neutral_expression
        } else {
            self.expression
        }
    }

    /// The category's own transform, else its parent's.
    pub(crate) fn effective_transform(&self, category: &Category) -> PartTransform {
        self.transforms
            .get(&category.id)
            .or_else(|| {
                category
                    .parent
                    .as_ref()
                    .and_then(|parent| self.transforms.get(parent))
            })
            .copied()
            .unwrap_or(PartTransform::ZERO)
    }
}

/// Resolve the selected parts into z-ordered layers.
///
/// Categories are visited in catalog order and the final sort is stable, so equal z-orders keep
/// catalog order. Unselected categories, unknown part ids and parts without variants are
/// skipped.
pub fn resolve_layers(
    catalog: &Catalog,
    selections: &BTreeMap<CategoryId, String>,
    pose: &PoseId,
    expression: &ExpressionId,
    transforms: &BTreeMap<CategoryId, PartTransform>,
) -> Vec<ResolvedLayer> {
    compose_layers(
        catalog,
        &CompositionInput::new(selections, pose, expression, transforms),
    )
}

/// [`resolve_layers`] over a full [`CompositionInput`], honoring expression locks.
///
/// Category expression effects apply after variant resolution: a replacement swaps the primary
/// image, an overlay adds extra layers after the variant's own. A locked category resolves with
/// the neutral expression, so it also takes the neutral effect (usually none).
///
/// The face offset is a direction-stage concern and is not applied here.
#[tracing::instrument(skip(catalog, input), fields(selected = input.selections.len()))]
pub fn compose_layers(catalog: &Catalog, input: &CompositionInput<'_>) -> Vec<ResolvedLayer> {
    let mut layers = Vec::new();

    for category in &catalog.categories {
        let Some(part_id) = input.selections.get(&category.id) else {
            continue;
        };
        let Some(part) = catalog.part(category.id.as_str(), part_id) else {
            tracing::debug!(category = %category.id, part = %part_id, "unknown part; skipped");
            continue;
        };
        let expression = input.expression_for(catalog, &category.id);
        let Some((_, entry)) = resolve_variant(catalog, part, input.pose, expression) else {
            tracing::debug!(category = %category.id, part = %part_id, "part has no variants; skipped");
            continue;
        };

        let effect = catalog.expression_effect(category.id.as_str(), expression.as_str());
        let image = match effect {
            Some(ExpressionEffect::Replace { image }) => image.as_str(),
            _ => entry.image(),
        };

        let transform = input.effective_transform(category);
        let template = ResolvedLayer {
            category: category.id.clone(),
            layer_index: category.layer_index,
            image: ImageRef::path(image),
            offset_x: 0.0,
            offset_y: 0.0,
            rotate: 0.0,
            side: None,
            flip_x: false,
            is_extra: false,
            fixed_color: None,
        };
        emit(&mut layers, category, transform, template.clone());

        let effect_extras = effect.map_or(&[][..], ExpressionEffect::extra_layers);
        for extra in entry.extra_layers().iter().chain(effect_extras) {
            let layer = ResolvedLayer {
                layer_index: extra.layer_index,
                image: ImageRef::path(extra.image.as_str()),
                is_extra: true,
                fixed_color: extra.fixed_color.clone(),
                ..template.clone()
            };
            emit(&mut layers, category, transform, layer);
        }
    }

    layers.sort_by_key(|l| l.layer_index);
    layers
}

/// Push one layer, or a mirrored left/right pair for symmetric categories.
fn emit(
    out: &mut Vec<ResolvedLayer>,
    category: &Category,
    transform: PartTransform,
    mut layer: ResolvedLayer,
) {
    if category.symmetric {
        let mut right = layer.clone();
        layer.side = Some(Side::Left);
        layer.set_transform(transform);
        right.side = Some(Side::Right);
        right.flip_x = true;
        right.set_transform(transform.mirrored());
        out.push(layer);
        out.push(right);
    } else {
        if category.editable {
            layer.set_transform(transform);
        }
        out.push(layer);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/layers.rs"]
mod tests;
