use std::collections::BTreeMap;

use crate::{
    catalog::model::{Category, CategoryId},
    color::palette::{DEFAULT_FILL_COLOR, DEFAULT_STROKE_COLOR, PartColor},
    foundation::core::{Direction, Side},
    foundation::error::MascotResult,
};

/// What each view direction hides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DirectionRules {
    /// Categories dropped entirely for a direction.
    #[serde(default)]
    pub hidden_categories: BTreeMap<Direction, Vec<CategoryId>>,
    /// Bilateral sides dropped for a direction.
    #[serde(default)]
    pub hidden_sides: BTreeMap<Direction, Vec<Side>>,
    /// Categories whose extra layers are dropped for a direction.
    #[serde(default)]
    pub hidden_extras: BTreeMap<Direction, Vec<CategoryId>>,
}

impl Default for DirectionRules {
    /// No rear facial art exists, a profile shows one side only, and expression-style ear
    /// overlays do not apply from behind.
    fn default() -> Self {
        let ids = |names: &[&str]| -> Vec<CategoryId> {
            names.iter().map(|&n| CategoryId::from(n)).collect()
        };

        let mut hidden_categories = BTreeMap::new();
        hidden_categories.insert(Direction::Back, ids(&["eyes", "nose", "mouth", "face2"]));

        let mut hidden_sides = BTreeMap::new();
        hidden_sides.insert(Direction::Side, vec![Side::Left]);

        let mut hidden_extras = BTreeMap::new();
        hidden_extras.insert(Direction::Back, ids(&["ears"]));

        Self {
            hidden_categories,
            hidden_sides,
            hidden_extras,
        }
    }
}

impl DirectionRules {
    /// Rules that hide nothing in any direction.
    pub fn none() -> Self {
        Self {
            hidden_categories: BTreeMap::new(),
            hidden_sides: BTreeMap::new(),
            hidden_extras: BTreeMap::new(),
        }
    }

    /// Whether `category` is dropped for `direction`.
    pub fn hides_category(&self, direction: Direction, category: &str) -> bool {
        contains_id(self.hidden_categories.get(&direction), category)
    }

    /// Whether bilateral layers on `side` are dropped for `direction`.
    pub fn hides_side(&self, direction: Direction, side: Side) -> bool {
        self.hidden_sides
            .get(&direction)
            .is_some_and(|sides| sides.contains(&side))
    }

    /// Whether extra layers of `category` are dropped for `direction`.
    pub fn hides_extras(&self, direction: Direction, category: &str) -> bool {
        contains_id(self.hidden_extras.get(&direction), category)
    }

    pub(crate) fn referenced_categories(&self) -> impl Iterator<Item = &CategoryId> {
        self.hidden_categories
            .values()
            .chain(self.hidden_extras.values())
            .flatten()
    }
}

/// How layer colors are chosen when a layer has no fixed color.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorRules {
    /// Color for every category without a more specific rule, and the fallback for
    /// user-colorable categories without a stored color.
    #[serde(default = "default_part_color")]
    pub default_color: PartColor,
    /// Categories rendered in a non-editable tone.
    #[serde(default)]
    pub fixed: BTreeMap<CategoryId, PartColor>,
    /// Categories that take another category's resolved color.
    #[serde(default)]
    pub follows: BTreeMap<CategoryId, CategoryId>,
    /// Categories whose stored per-category color is honored.
    #[serde(default)]
    pub colorable: Vec<CategoryId>,
    /// Categories whose art uses `fill: none` for stroke-only paths that must stay unfilled.
    #[serde(default)]
    pub stroke_only: Vec<CategoryId>,
}

fn default_part_color() -> PartColor {
    PartColor::new(DEFAULT_FILL_COLOR, DEFAULT_STROKE_COLOR)
}

impl Default for ColorRules {
    fn default() -> Self {
        let ids = |names: &[&str]| -> Vec<CategoryId> {
            names.iter().map(|&n| CategoryId::from(n)).collect()
        };

        let mut fixed = BTreeMap::new();
        fixed.insert(
            CategoryId::from("eyes"),
            PartColor::new(DEFAULT_STROKE_COLOR, DEFAULT_STROKE_COLOR),
        );
        let mut follows = BTreeMap::new();
        follows.insert(CategoryId::from("mouth"), CategoryId::from("face"));

        Self {
            default_color: default_part_color(),
            fixed,
            follows,
            colorable: ids(&["body", "body2", "face", "face2", "ears", "ear2"]),
            stroke_only: ids(&["body", "body2"]),
        }
    }
}

impl ColorRules {
    /// Whether the stored color of `category` is honored.
    pub fn is_colorable(&self, category: &str) -> bool {
        self.colorable.iter().any(|c| c.as_str() == category)
    }

    /// Whether fill replacement must keep `fill: none` for `category`.
    pub fn is_stroke_only(&self, category: &str) -> bool {
        self.stroke_only.iter().any(|c| c.as_str() == category)
    }

    pub(crate) fn referenced_categories(&self) -> impl Iterator<Item = &CategoryId> {
        self.fixed
            .keys()
            .chain(self.follows.keys())
            .chain(self.follows.values())
            .chain(self.colorable.iter())
            .chain(self.stroke_only.iter())
    }

    pub(crate) fn validate(&self) -> MascotResult<()> {
        self.default_color.validate()?;
        for color in self.fixed.values() {
            color.validate()?;
        }
        Ok(())
    }
}

fn contains_id(ids: Option<&Vec<CategoryId>>, category: &str) -> bool {
    ids.is_some_and(|ids| ids.iter().any(|c| c.as_str() == category))
}

/// The canonical category table: z-order, required flags, symmetry, editability and parents.
///
/// `body` and `face` are not editable, yet `body2` and `face2` name them as parents. A stored
/// transform for `body` or `face` therefore leaves the base layer in place and moves only the
/// child category.
pub fn standard_categories() -> Vec<Category> {
    fn cat(
        id: &str,
        name: &str,
        layer_index: u32,
        is_required: bool,
        symmetric: bool,
        editable: bool,
        parent: Option<&str>,
    ) -> Category {
        Category {
            id: CategoryId::from(id),
            name: name.to_owned(),
            layer_index,
            is_required,
            symmetric,
            editable,
            parent: parent.map(CategoryId::from),
        }
    }

    vec![
        cat("body", "Body", 0, true, false, false, None),
        cat("body2", "Body 2", 1, false, false, false, Some("body")),
        cat("ears", "Ears", 2, true, true, true, None),
        cat("face", "Face", 3, true, false, false, None),
        cat("ear2", "Ears 2", 4, false, true, true, Some("ears")),
        cat("face2", "Face 2", 5, false, true, false, Some("face")),
        cat("eyes", "Eyes", 6, true, true, true, None),
        cat("mouth", "Mouth", 7, true, true, true, None),
        cat("nose", "Nose", 8, true, false, true, None),
    ]
}

/// Categories moved together by the face drag offset.
pub fn standard_face_group() -> Vec<CategoryId> {
    ["face", "face2", "eyes", "nose", "mouth"]
        .into_iter()
        .map(CategoryId::from)
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/rules.rs"]
mod tests;
