use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::Context;

use crate::{
    catalog::model::{Catalog, CategoryId, ExpressionId, PoseId},
    color::palette::{PartColor, StrokeSettings},
    compose::direction::compose_for_direction,
    compose::layers::{CompositionInput, ResolvedLayer},
    foundation::core::{Direction, OFFSET_LIMIT, PartTransform, ROTATION_LIMIT, Vec2},
    foundation::error::{MascotError, MascotResult},
    foundation::math::Rng64,
};

fn default_pose() -> PoseId {
    PoseId::from("standing")
}

fn neutral_expression() -> ExpressionId {
    ExpressionId::from("neutral")
}

/// Everything the user has chosen for one character.
///
/// Operations never mutate in place: each returns the next state, so callers can keep the
/// previous value for undo or discard stale renders.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SelectionState {
    /// Selected part id per category.
    #[serde(default)]
    pub selections: BTreeMap<CategoryId, String>,
    /// Active pose.
    #[serde(default = "default_pose")]
    pub pose: PoseId,
    /// Active expression.
    #[serde(default = "neutral_expression")]
    pub expression: ExpressionId,
    /// View direction.
    #[serde(default)]
    pub direction: Direction,
    /// User fine-tuning per category.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub transforms: BTreeMap<CategoryId, PartTransform>,
    /// User colors per category.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub part_colors: BTreeMap<CategoryId, PartColor>,
    /// Global stroke styling.
    #[serde(default)]
    pub stroke: StrokeSettings,
    /// Categories pinned to the neutral expression.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub expression_locks: BTreeSet<CategoryId>,
    /// Drag offset of the whole face group.
    #[serde(default)]
    pub face_offset: Vec2,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            selections: BTreeMap::new(),
            pose: default_pose(),
            expression: neutral_expression(),
            direction: Direction::Front,
            transforms: BTreeMap::new(),
            part_colors: BTreeMap::new(),
            stroke: StrokeSettings::default(),
            expression_locks: BTreeSet::new(),
            face_offset: Vec2::ZERO,
        }
    }
}

impl SelectionState {
    /// Empty selection in the catalog's default pose and neutral expression.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            pose: catalog.default_pose.clone(),
            expression: catalog.neutral_expression.clone(),
            ..Self::default()
        }
    }

    /// Read a state JSON document.
    ///
    /// Stored transforms are clamped to the default limits.
    pub fn from_path(path: &Path) -> MascotResult<Self> {
        let f = File::open(path).with_context(|| format!("open state '{}'", path.display()))?;
        let state: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| MascotError::serde(format!("parse state '{}': {e}", path.display())))?;
        Ok(state.clamp_transforms(OFFSET_LIMIT, ROTATION_LIMIT))
    }

    /// Check every reference against `catalog`.
    pub fn validate(&self, catalog: &Catalog) -> MascotResult<()> {
        for (category, part_id) in &self.selections {
            if catalog.part(category.as_str(), part_id).is_none() {
                return Err(MascotError::validation(format!(
                    "unknown part '{part_id}' for category '{category}'"
                )));
            }
        }
        if !catalog.has_pose(self.pose.as_str()) {
            return Err(MascotError::validation(format!("unknown pose '{}'", self.pose)));
        }
        if !catalog.has_expression(self.expression.as_str()) {
            return Err(MascotError::validation(format!(
                "unknown expression '{}'",
                self.expression
            )));
        }
        for category in self
            .transforms
            .keys()
            .chain(self.part_colors.keys())
            .chain(self.expression_locks.iter())
        {
            if catalog.category(category.as_str()).is_none() {
                return Err(MascotError::validation(format!(
                    "unknown category '{category}'"
                )));
            }
        }
        for color in self.part_colors.values() {
            color.validate()?;
        }
        Ok(())
    }

    /// Select a part, clearing any mutually exclusive sibling categories.
    pub fn select_part(&self, catalog: &Catalog, category: &str, part_id: &str) -> MascotResult<Self> {
        if catalog.part(category, part_id).is_none() {
            return Err(MascotError::validation(format!(
                "unknown part '{part_id}' for category '{category}'"
            )));
        }
        let mut next = self.clone();
        if let Some(group) = catalog.exclusive_group_of(category) {
            for sibling in group.iter().filter(|c| c.as_str() != category) {
                next.selections.remove(sibling);
            }
        }
        next.selections
            .insert(CategoryId::from(category), part_id.to_owned());
        Ok(next)
    }

    /// Deselect a category.
    pub fn clear_part(&self, category: &str) -> Self {
        let mut next = self.clone();
        next.selections.remove(category);
        next
    }

    /// Set a category's fine-tuning, clamped to the default limits.
    pub fn set_transform(&self, category: &str, transform: PartTransform) -> Self {
        let mut next = self.clone();
        next.transforms.insert(
            CategoryId::from(category),
            transform.clamped(OFFSET_LIMIT, ROTATION_LIMIT),
        );
        next
    }

    /// Drop a category's fine-tuning.
    pub fn reset_transform(&self, category: &str) -> Self {
        let mut next = self.clone();
        next.transforms.remove(category);
        next
    }

    /// Clamp every stored transform to the given limits.
    pub fn clamp_transforms(mut self, offset_limit: f64, rotation_limit: f64) -> Self {
        for t in self.transforms.values_mut() {
            *t = t.clamped(offset_limit, rotation_limit);
        }
        self
    }

    /// Store a category color.
    pub fn set_part_color(&self, category: &str, color: PartColor) -> MascotResult<Self> {
        color.validate()?;
        let mut next = self.clone();
        next.part_colors.insert(CategoryId::from(category), color);
        Ok(next)
    }

    /// Store `color` for every user-colorable category.
    pub fn apply_color_to_all(&self, catalog: &Catalog, color: PartColor) -> MascotResult<Self> {
        color.validate()?;
        let mut next = self.clone();
        for category in &catalog.colors.colorable {
            next.part_colors.insert(category.clone(), color.clone());
        }
        Ok(next)
    }

    /// Forget a category color so the default applies again.
    pub fn reset_part_color(&self, category: &str) -> Self {
        let mut next = self.clone();
        next.part_colors.remove(category);
        next
    }

    /// Replace the stroke styling.
    pub fn set_stroke(&self, stroke: StrokeSettings) -> Self {
        Self {
            stroke,
            ..self.clone()
        }
    }

    /// Switch pose.
    pub fn set_pose(&self, catalog: &Catalog, pose: &str) -> MascotResult<Self> {
        if !catalog.has_pose(pose) {
            return Err(MascotError::validation(format!("unknown pose '{pose}'")));
        }
        Ok(Self {
            pose: PoseId::from(pose),
            ..self.clone()
        })
    }

    /// Switch expression.
    pub fn set_expression(&self, catalog: &Catalog, expression: &str) -> MascotResult<Self> {
        if !catalog.has_expression(expression) {
            return Err(MascotError::validation(format!(
                "unknown expression '{expression}'"
            )));
        }
        Ok(Self {
            expression: ExpressionId::from(expression),
            ..self.clone()
        })
    }

    /// Switch view direction.
    pub fn set_direction(&self, direction: Direction) -> Self {
        Self {
            direction,
            ..self.clone()
        }
    }

    /// Apply an action preset's pose and expression together.
    pub fn apply_action(&self, catalog: &Catalog, action_id: &str) -> MascotResult<Self> {
        let action = catalog
            .action(action_id)
            .ok_or_else(|| MascotError::validation(format!("unknown action '{action_id}'")))?;
        Ok(Self {
            pose: action.pose.clone(),
            expression: action.expression.clone(),
            ..self.clone()
        })
    }

    /// Flip whether `category` is pinned to the neutral expression.
    pub fn toggle_expression_lock(&self, category: &str) -> Self {
        let mut next = self.clone();
        if !next.expression_locks.remove(category) {
            next.expression_locks.insert(CategoryId::from(category));
        }
        next
    }

    /// Set the face-group drag offset. Non-finite components become zero.
    pub fn set_face_offset(&self, x: f64, y: f64) -> Self {
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            face_offset: Vec2::new(finite(x), finite(y)),
            ..self.clone()
        }
    }

    /// Back to an empty character.
    pub fn reset(&self, catalog: &Catalog) -> Self {
        Self::new(catalog)
    }

    /// Pick one part per category from a seeded generator.
    ///
    /// Each exclusive group contributes exactly one of its members. Pose, expression, colors and
    /// the rest of the state are kept.
    pub fn randomize(&self, catalog: &Catalog, seed: u64) -> Self {
        let mut rng = Rng64::new(seed);
        let mut selections = BTreeMap::new();
        let mut decided = BTreeSet::new();

        for category in &catalog.categories {
            if decided.contains(&category.id) {
                continue;
            }
            let candidates: Vec<&CategoryId> = match catalog.exclusive_group_of(category.id.as_str()) {
                Some(group) => {
                    decided.extend(group.iter().cloned());
                    group
                        .iter()
                        .filter(|c| !catalog.parts_for(c.as_str()).is_empty())
                        .collect()
                }
                None => {
                    decided.insert(category.id.clone());
                    if catalog.parts_for(category.id.as_str()).is_empty() {
                        Vec::new()
                    } else {
                        vec![&category.id]
                    }
                }
            };
            if candidates.is_empty() {
                continue;
            }
            let chosen = candidates[rng.next_index(candidates.len())];
            let parts = catalog.parts_for(chosen.as_str());
            let part = &parts[rng.next_index(parts.len())];
            selections.insert(chosen.clone(), part.id.clone());
        }

        Self {
            selections,
            ..self.clone()
        }
    }

    /// Required categories not yet satisfied, in catalog order.
    ///
    /// A required category that belongs to an exclusive group is satisfied by a selection in any
    /// member of the group.
    pub fn missing_required(&self, catalog: &Catalog) -> Vec<CategoryId> {
        let selected = |c: &CategoryId| {
            self.selections
                .get(c)
                .is_some_and(|id| catalog.part(c.as_str(), id).is_some())
        };
        catalog
            .categories
            .iter()
            .filter(|c| c.is_required)
            .filter(|c| match catalog.exclusive_group_of(c.id.as_str()) {
                Some(group) => !group.iter().any(|g| selected(g)),
                None => !selected(&c.id),
            })
            .map(|c| c.id.clone())
            .collect()
    }

    /// Whether every required category is satisfied.
    pub fn is_complete(&self, catalog: &Catalog) -> bool {
        self.missing_required(catalog).is_empty()
    }

    /// Borrow the composition inputs, including locks and face offset.
    pub fn composition_input(&self) -> CompositionInput<'_> {
        CompositionInput {
            selections: &self.selections,
            pose: &self.pose,
            expression: &self.expression,
            transforms: &self.transforms,
            expression_locks: Some(&self.expression_locks),
            face_offset: self.face_offset,
        }
    }

    /// Layers for the state's own direction.
    pub fn layers(&self, catalog: &Catalog) -> Vec<ResolvedLayer> {
        self.layers_for(catalog, self.direction)
    }

    /// Layers for any direction (e.g. a four-angle overview).
    pub fn layers_for(&self, catalog: &Catalog, direction: Direction) -> Vec<ResolvedLayer> {
        compose_for_direction(catalog, &self.composition_input(), direction)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/selection/state.rs"]
mod tests;
