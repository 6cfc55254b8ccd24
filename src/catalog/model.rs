use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet},
    fmt,
    fs::File,
    io::BufReader,
    path::Path,
    str::FromStr,
};

use anyhow::Context;

use crate::{
    catalog::rules::{self, ColorRules, DirectionRules},
    color::palette::PartColor,
    foundation::core::{Direction, Side},
    foundation::error::{MascotError, MascotResult},
};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Build an id from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw id.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Anatomical slot id (`body`, `ears`, `mouth`, ...).
    CategoryId
);
string_id!(
    /// Pose id (`standing`, `sitting`, ...).
    PoseId
);
string_id!(
    /// Expression id (`neutral`, `happy`, ...).
    ExpressionId
);

/// Pose axis of a [`VariantKey`]; `Any` when the part does not vary by pose.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PoseSlot {
    /// Pose-independent art.
    Any,
    /// Art for one specific pose.
    Pose(PoseId),
}

/// Expression axis of a [`VariantKey`]; `Default` when the part does not vary by expression.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExpressionSlot {
    /// Expression-independent art.
    Default,
    /// Art for one specific expression.
    Expression(ExpressionId),
}

/// Composite lookup key over the pose and expression axes.
///
/// Catalog files spell it as `"{pose|any}/{expression|default}"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariantKey {
    /// Pose axis.
    pub pose: PoseSlot,
    /// Expression axis.
    pub expression: ExpressionSlot,
}

impl VariantKey {
    const ANY_POSE: &'static str = "any";
    const DEFAULT_EXPRESSION: &'static str = "default";

    /// Build a key from its two slots.
    pub fn new(pose: PoseSlot, expression: ExpressionSlot) -> Self {
        Self { pose, expression }
    }

    /// The `any/default` key used by parts that vary along neither axis.
    pub fn any_default() -> Self {
        Self::new(PoseSlot::Any, ExpressionSlot::Default)
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pose = match &self.pose {
            PoseSlot::Any => Self::ANY_POSE,
            PoseSlot::Pose(p) => p.as_str(),
        };
        let expression = match &self.expression {
            ExpressionSlot::Default => Self::DEFAULT_EXPRESSION,
            ExpressionSlot::Expression(e) => e.as_str(),
        };
        write!(f, "{pose}/{expression}")
    }
}

impl FromStr for VariantKey {
    type Err = MascotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pose, expression) = s.split_once('/').ok_or_else(|| {
            MascotError::catalog(format!("variant key '{s}' must look like 'pose/expression'"))
        })?;
        if pose.is_empty() || expression.is_empty() || expression.contains('/') {
            return Err(MascotError::catalog(format!(
                "variant key '{s}' must have exactly two non-empty segments"
            )));
        }
        let pose = if pose == Self::ANY_POSE {
            PoseSlot::Any
        } else {
            PoseSlot::Pose(PoseId::from(pose))
        };
        let expression = if expression == Self::DEFAULT_EXPRESSION {
            ExpressionSlot::Default
        } else {
            ExpressionSlot::Expression(ExpressionId::from(expression))
        };
        Ok(Self { pose, expression })
    }
}

impl TryFrom<String> for VariantKey {
    type Error = MascotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VariantKey> for String {
    fn from(key: VariantKey) -> Self {
        key.to_string()
    }
}

/// Additional z-ordered overlay bundled with a variant.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExtraLayer {
    /// Image path of the overlay.
    pub image: String,
    /// Z-order of the overlay (independent of the category's own z-order).
    pub layer_index: u32,
    /// Color that overrides any user color choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_color: Option<PartColor>,
}

/// Art for one variant key: a bare image path, or an image plus overlays.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum VariantEntry {
    /// Plain image path.
    Image(String),
    /// Image with extra overlay layers.
    Layered {
        /// Primary image path.
        image: String,
        /// Overlays drawn at their own z-order.
        #[serde(default)]
        extra_layers: Vec<ExtraLayer>,
    },
}

impl VariantEntry {
    /// Primary image path.
    pub fn image(&self) -> &str {
        match self {
            Self::Image(image) | Self::Layered { image, .. } => image,
        }
    }

    /// Overlay layers (empty for plain entries).
    pub fn extra_layers(&self) -> &[ExtraLayer] {
        match self {
            Self::Image(_) => &[],
            Self::Layered { extra_layers, .. } => extra_layers,
        }
    }
}

/// Expression-driven change shared by every part of a category.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExpressionEffect {
    /// Draw extra layers on top of the resolved part.
    Overlay {
        /// Overlays drawn at their own z-order.
        extra_layers: Vec<ExtraLayer>,
    },
    /// Draw this image instead of the resolved part's primary image.
    Replace {
        /// Replacement image path.
        image: String,
    },
}

impl ExpressionEffect {
    /// Overlay layers the effect adds (empty for replacements).
    pub fn extra_layers(&self) -> &[ExtraLayer] {
        match self {
            Self::Overlay { extra_layers } => extra_layers,
            Self::Replace { .. } => &[],
        }
    }
}

/// Design-time positional correction, added on top of user transforms.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PartPosition {
    /// Horizontal correction in canonical pixels.
    #[serde(default)]
    pub offset_x: f64,
    /// Vertical correction in canonical pixels.
    #[serde(default)]
    pub offset_y: f64,
    /// Rotation correction in degrees.
    #[serde(default)]
    pub rotate: f64,
}

/// One selectable visual option within a category.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PartDefinition {
    /// Part id, unique within its category.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Thumbnail image path.
    #[serde(default)]
    pub thumbnail: String,
    /// Whether the pose slot of the variant key varies.
    #[serde(default)]
    pub varies_by_pose: bool,
    /// Whether the expression slot of the variant key varies.
    #[serde(default)]
    pub varies_by_expression: bool,
    /// Art per variant key.
    pub variants: BTreeMap<VariantKey, VariantEntry>,
    /// Lets the user recolor this part even if its category follows another color.
    #[serde(default)]
    pub colorable: bool,
    /// Alternate-angle art that replaces the image outright.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub direction_variants: BTreeMap<Direction, String>,
    /// Corrections for non-bilateral parts, keyed by direction name (`side`) or by direction
    /// and variant key (`side-standing/default`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub position_overrides: BTreeMap<String, PartPosition>,
    /// Corrections for bilateral parts, keyed by direction then side.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub side_offsets: BTreeMap<Direction, BTreeMap<Side, PartPosition>>,
}

impl PartDefinition {
    /// Part with a single `any/default` image and no axes.
    pub fn simple(id: impl Into<String>, image: impl Into<String>) -> Self {
        let id = id.into();
        let mut variants = BTreeMap::new();
        variants.insert(VariantKey::any_default(), VariantEntry::Image(image.into()));
        Self {
            name: id.clone(),
            id,
            thumbnail: String::new(),
            varies_by_pose: false,
            varies_by_expression: false,
            variants,
            colorable: false,
            direction_variants: BTreeMap::new(),
            position_overrides: BTreeMap::new(),
            side_offsets: BTreeMap::new(),
        }
    }
}

/// A named anatomical slot.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Category {
    /// Unique id.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Z-order of the category's primary layers.
    pub layer_index: u32,
    /// Whether a complete character needs this category (or an exclusive sibling).
    #[serde(default)]
    pub is_required: bool,
    /// Always rendered as mirrored left/right halves of a left-authored asset.
    #[serde(default)]
    pub symmetric: bool,
    /// Exposed to positional fine-tuning; non-symmetric categories only move when editable.
    #[serde(default)]
    pub editable: bool,
    /// Category whose user transform is inherited when this one has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<CategoryId>,
}

/// A selectable pose.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Pose {
    /// Pose id.
    pub id: PoseId,
    /// Display name.
    pub name: String,
}

/// A selectable expression.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Expression {
    /// Expression id.
    pub id: ExpressionId,
    /// Display name.
    pub name: String,
}

/// Grouping of action presets for display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    /// Everyday poses.
    #[default]
    Basic,
    /// Emotional poses.
    Emotion,
    /// Special poses.
    Special,
}

/// Named shortcut that sets pose and expression at once.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActionPreset {
    /// Action id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display grouping.
    #[serde(default)]
    pub category: ActionCategory,
    /// Pose the action selects.
    pub pose: PoseId,
    /// Expression the action selects.
    pub expression: ExpressionId,
}

fn default_pose_id() -> PoseId {
    PoseId::from("standing")
}

fn neutral_expression_id() -> ExpressionId {
    ExpressionId::from("neutral")
}

/// Static reference data the engine queries: categories, parts, poses, expressions and rules.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Catalog {
    /// Categories in catalog order (emission order for equal z).
    pub categories: Vec<Category>,
    /// Parts per category.
    #[serde(default)]
    pub parts: BTreeMap<CategoryId, Vec<PartDefinition>>,
    /// Available poses.
    #[serde(default)]
    pub poses: Vec<Pose>,
    /// Available expressions.
    #[serde(default)]
    pub expressions: Vec<Expression>,
    /// Pose + expression shortcuts.
    #[serde(default)]
    pub actions: Vec<ActionPreset>,
    /// Canonical default pose used by the variant fallback chain.
    #[serde(default = "default_pose_id")]
    pub default_pose: PoseId,
    /// Canonical neutral expression used by the variant fallback chain.
    #[serde(default = "neutral_expression_id")]
    pub neutral_expression: ExpressionId,
    /// Mutually exclusive category groups (selecting one clears the others).
    #[serde(default)]
    pub exclusive_groups: Vec<Vec<CategoryId>>,
    /// Categories moved together by the face drag offset.
    #[serde(default)]
    pub face_group: Vec<CategoryId>,
    /// Category-level effects per expression, applied on top of whichever part is selected.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_effects: BTreeMap<CategoryId, BTreeMap<ExpressionId, ExpressionEffect>>,
    /// Per-direction visibility rules.
    #[serde(default)]
    pub directions: DirectionRules,
    /// Color resolution rules.
    #[serde(default)]
    pub colors: ColorRules,
}

impl Catalog {
    /// Empty catalog over `categories` with canonical rules and a single default pose/expression.
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories,
            parts: BTreeMap::new(),
            poses: vec![Pose {
                id: default_pose_id(),
                name: "Standing".to_owned(),
            }],
            expressions: vec![Expression {
                id: neutral_expression_id(),
                name: "Neutral".to_owned(),
            }],
            actions: Vec::new(),
            default_pose: default_pose_id(),
            neutral_expression: neutral_expression_id(),
            exclusive_groups: Vec::new(),
            face_group: Vec::new(),
            expression_effects: BTreeMap::new(),
            directions: DirectionRules::default(),
            colors: ColorRules::default(),
        }
    }

    /// Catalog over the canonical category table, with the alternate ear styles mutually
    /// exclusive and the canonical face group. Parts, poses and expressions are added by the caller.
    pub fn standard() -> Self {
        let mut catalog = Self::new(rules::standard_categories());
        catalog.exclusive_groups = vec![vec![CategoryId::from("ears"), CategoryId::from("ear2")]];
        catalog.face_group = rules::standard_face_group();
        catalog
    }

    /// Read and validate a catalog JSON document.
    pub fn from_path(path: &Path) -> MascotResult<Self> {
        let f = File::open(path).with_context(|| format!("open catalog '{}'", path.display()))?;
        let catalog: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| MascotError::serde(format!("parse catalog '{}': {e}", path.display())))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a catalog from a JSON string.
    pub fn from_json_str(json: &str) -> MascotResult<Self> {
        let catalog: Self =
            serde_json::from_str(json).map_err(|e| MascotError::serde(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Add parts for a category (builder style).
    pub fn with_parts(mut self, category: &str, parts: Vec<PartDefinition>) -> Self {
        self.parts.insert(CategoryId::from(category), parts);
        self
    }

    /// Look up a category.
    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id.as_str() == id)
    }

    /// Parts offered for a category (empty if none).
    pub fn parts_for(&self, category: &str) -> &[PartDefinition] {
        self.parts.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up a part within a category.
    pub fn part(&self, category: &str, part_id: &str) -> Option<&PartDefinition> {
        self.parts_for(category).iter().find(|p| p.id == part_id)
    }

    /// Look up an action preset.
    pub fn action(&self, id: &str) -> Option<&ActionPreset> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// The exclusive group containing `category`, if any.
    pub fn exclusive_group_of(&self, category: &str) -> Option<&[CategoryId]> {
        self.exclusive_groups
            .iter()
            .find(|g| g.iter().any(|c| c.as_str() == category))
            .map(Vec::as_slice)
    }

    /// The effect `expression` has on `category`, if any.
    pub fn expression_effect(
        &self,
        category: &str,
        expression: &str,
    ) -> Option<&ExpressionEffect> {
        self.expression_effects.get(category)?.get(expression)
    }

    /// Whether a pose id is known.
    pub fn has_pose(&self, id: &str) -> bool {
        self.poses.iter().any(|p| p.id.as_str() == id)
    }

    /// Whether an expression id is known.
    pub fn has_expression(&self, id: &str) -> bool {
        self.expressions.iter().any(|e| e.id.as_str() == id)
    }

    /// Check cross references and reserved ids.
    ///
    /// Parts without variants are allowed (they are skipped at composition time) but logged.
    pub fn validate(&self) -> MascotResult<()> {
        let mut seen = BTreeSet::new();
        for c in &self.categories {
            if c.id.as_str().is_empty() {
                return Err(MascotError::catalog("category id must be non-empty"));
            }
            if !seen.insert(c.id.as_str()) {
                return Err(MascotError::catalog(format!(
                    "duplicate category id '{}'",
                    c.id
                )));
            }
        }
        let known = |id: &CategoryId| seen.contains(id.as_str());

        for c in &self.categories {
            if let Some(parent) = &c.parent {
                if !known(parent) || parent == &c.id {
                    return Err(MascotError::catalog(format!(
                        "category '{}' has invalid parent '{parent}'",
                        c.id
                    )));
                }
            }
        }

        for (category, parts) in &self.parts {
            if !known(category) {
                return Err(MascotError::catalog(format!(
                    "parts listed for unknown category '{category}'"
                )));
            }
            let mut ids = BTreeSet::new();
            for part in parts {
                if !ids.insert(part.id.as_str()) {
                    return Err(MascotError::catalog(format!(
                        "duplicate part id '{}' in category '{category}'",
                        part.id
                    )));
                }
                if part.variants.is_empty() {
                    tracing::warn!(category = %category, part = %part.id, "part has no variants");
                }
                let fixed = part
                    .variants
                    .values()
                    .flat_map(VariantEntry::extra_layers)
                    .filter_map(|x| x.fixed_color.as_ref());
                for color in fixed {
                    color.validate()?;
                }
            }
        }

        if self.poses.iter().any(|p| p.id.as_str() == VariantKey::ANY_POSE) {
            return Err(MascotError::catalog("pose id 'any' is reserved"));
        }
        if self
            .expressions
            .iter()
            .any(|e| e.id.as_str() == VariantKey::DEFAULT_EXPRESSION)
        {
            return Err(MascotError::catalog("expression id 'default' is reserved"));
        }
        if !self.has_pose(self.default_pose.as_str()) {
            return Err(MascotError::catalog(format!(
                "default pose '{}' is not a known pose",
                self.default_pose
            )));
        }
        if !self.has_expression(self.neutral_expression.as_str()) {
            return Err(MascotError::catalog(format!(
                "neutral expression '{}' is not a known expression",
                self.neutral_expression
            )));
        }
        for action in &self.actions {
            if !self.has_pose(action.pose.as_str())
                || !self.has_expression(action.expression.as_str())
            {
                return Err(MascotError::catalog(format!(
                    "action '{}' references an unknown pose or expression",
                    action.id
                )));
            }
        }

        for (category, effects) in &self.expression_effects {
            if !known(category) {
                return Err(MascotError::catalog(format!(
                    "expression effects listed for unknown category '{category}'"
                )));
            }
            for (expression, effect) in effects {
                if !self.has_expression(expression.as_str()) {
                    return Err(MascotError::catalog(format!(
                        "expression effect for '{category}' references unknown expression '{expression}'"
                    )));
                }
                for color in effect.extra_layers().iter().filter_map(|x| x.fixed_color.as_ref()) {
                    color.validate()?;
                }
            }
        }

        let mut grouped = BTreeSet::new();
        for group in &self.exclusive_groups {
            for c in group {
                if !known(c) {
                    return Err(MascotError::catalog(format!(
                        "exclusive group references unknown category '{c}'"
                    )));
                }
                if !grouped.insert(c.as_str()) {
                    return Err(MascotError::catalog(format!(
                        "category '{c}' appears in more than one exclusive group"
                    )));
                }
            }
        }

        for c in self
            .face_group
            .iter()
            .chain(self.directions.referenced_categories())
            .chain(self.colors.referenced_categories())
        {
            if !known(c) {
                return Err(MascotError::catalog(format!(
                    "rules reference unknown category '{c}'"
                )));
            }
        }
        self.colors.validate()?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/model.rs"]
mod tests;
