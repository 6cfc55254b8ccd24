//! `mascot` composes layered 2D character avatars.
//!
//! A character is a set of part selections (body, ears, eyes, mouth, ...) plus pose, expression,
//! view direction, fine-tuning transforms, colors and stroke styling. The engine turns that state
//! into z-ordered image layers and renders them:
//!
//! - Resolve each part's art for the active pose/expression ([`resolve_variant_key`])
//! - Compose z-ordered layers, splitting symmetric parts into mirrored halves
//!   ([`resolve_layers`])
//! - Adapt the layers to a view direction ([`resolve_layers_for_direction`])
//! - Recolor SVG art ([`Colorizer::apply_colors_to_layers`])
//! - Describe a CSS preview ([`preview_frame`]) or export a PNG ([`render_to_png`])
//!
//! Composition is pure and synchronous. Colorize and export load layer art in parallel and
//! wait for every layer before returning.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod catalog;
mod color;
mod compose;
mod foundation;
mod pipeline;
mod render;
mod selection;

#[cfg(test)]
#[path = "../tests/unit/fixtures.rs"]
pub(crate) mod fixtures;

pub use crate::foundation::core::{
    Affine, CANVAS_EXPORT_SCALE, CANVAS_HEIGHT, CANVAS_WIDTH, Canvas, Direction, OFFSET_LIMIT,
    PartTransform, Point, ROTATION_LIMIT, Rect, Side, Vec2,
};
pub use crate::foundation::error::{MascotError, MascotResult};

pub use crate::assets::source::{AssetSource, FsAssetSource, ImageRef, MemoryAssetSource};
pub use crate::catalog::model::{
    ActionCategory, ActionPreset, Catalog, Category, CategoryId, Expression, ExpressionEffect,
    ExpressionId, ExpressionSlot, ExtraLayer, PartDefinition, PartPosition, Pose, PoseId, PoseSlot,
    VariantEntry, VariantKey,
};
pub use crate::catalog::rules::{
    ColorRules, DirectionRules, standard_categories, standard_face_group,
};
pub use crate::color::apply::{
    ColorizeCache, Colorizer, DEFAULT_COLORIZE_CACHE_CAPACITY, resolve_layer_color,
};
pub use crate::color::palette::{
    ColorPreset, DEFAULT_FILL_COLOR, DEFAULT_STROKE_COLOR, FILL_PRESETS, PartColor,
    STROKE_PRESETS, StrokeSettings, StrokeTexture, StrokeWidth, parse_hex,
};
pub use crate::color::svg::{
    ROUGH_FILTER_ID, apply_stroke_texture, colorize_svg, replace_fill_color,
    replace_stroke_color, replace_stroke_width, svg_to_data_uri,
};
pub use crate::compose::direction::{
    adapt_for_direction, apply_face_offset, compose_for_direction, resolve_layers_for_direction,
};
pub use crate::compose::layers::{
    CompositionInput, ResolvedLayer, compose_layers, resolve_layers,
};
pub use crate::compose::variant::{resolve_variant, resolve_variant_key};
pub use crate::pipeline::{COLORIZE_CACHE_CAPACITY_ENV, Engine, EngineConfig, ExportPreset};
pub use crate::render::export::{render_to_png, render_to_rgba};
pub use crate::render::preview::{
    PreviewFrame, PreviewLayer, layer_css_transform, preview_frame, preview_scale,
};
pub use crate::selection::state::SelectionState;
