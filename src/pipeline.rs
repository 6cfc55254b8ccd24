use std::{fmt, str::FromStr};

use crate::{
    assets::source::AssetSource,
    catalog::model::Catalog,
    color::apply::{ColorizeCache, Colorizer, DEFAULT_COLORIZE_CACHE_CAPACITY},
    compose::layers::ResolvedLayer,
    foundation::core::{CANVAS_EXPORT_SCALE, Canvas, OFFSET_LIMIT, ROTATION_LIMIT},
    foundation::error::{MascotError, MascotResult},
    render::export::render_to_png,
    render::preview::{PreviewFrame, preview_frame},
    selection::state::SelectionState,
};

/// Environment variable that overrides [`EngineConfig::colorize_cache_capacity`].
pub const COLORIZE_CACHE_CAPACITY_ENV: &str = "MASCOT_COLORIZE_CACHE_CAPACITY";

/// Engine-wide settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Canonical canvas all offsets are expressed in.
    pub canvas: Canvas,
    /// Export multiplier used when none is given.
    pub export_scale: f64,
    /// Maximum absolute user offset.
    pub offset_limit: f64,
    /// Maximum absolute user rotation in degrees.
    pub rotation_limit: f64,
    /// Colorized documents kept in memory.
    pub colorize_cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::CANONICAL,
            export_scale: CANVAS_EXPORT_SCALE,
            offset_limit: OFFSET_LIMIT,
            rotation_limit: ROTATION_LIMIT,
            colorize_cache_capacity: DEFAULT_COLORIZE_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Defaults, with the cache capacity read from `MASCOT_COLORIZE_CACHE_CAPACITY` when it holds
    /// a positive integer.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(n) = std::env::var(COLORIZE_CACHE_CAPACITY_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
        {
            cfg.colorize_cache_capacity = n;
        }
        cfg
    }

    /// Reject non-positive or non-finite limits and scales.
    pub fn validate(&self) -> MascotResult<()> {
        Canvas::new(self.canvas.width, self.canvas.height)?;
        self.canvas.scaled_size(self.export_scale)?;
        for (name, v) in [
            ("offset_limit", self.offset_limit),
            ("rotation_limit", self.rotation_limit),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(MascotError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }
}

/// Named export resolutions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportPreset {
    /// Canonical resolution.
    #[default]
    Standard,
    /// Double resolution.
    Hires,
    /// Half resolution.
    Web,
    /// Small preview image.
    Thumbnail,
}

impl ExportPreset {
    /// Every preset in display order.
    pub const ALL: [Self; 4] = [Self::Standard, Self::Hires, Self::Web, Self::Thumbnail];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Hires => "hires",
            Self::Web => "web",
            Self::Thumbnail => "thumbnail",
        }
    }

    /// Resolution multiplier.
    pub fn scale(self) -> f64 {
        match self {
            Self::Standard => 1.0,
            Self::Hires => 2.0,
            Self::Web => 0.5,
            Self::Thumbnail => 0.15,
        }
    }

    /// Output size label such as `1080×1080`.
    pub fn size_label(self, canvas: Canvas) -> MascotResult<String> {
        let (w, h) = canvas.scaled_size(self.scale())?;
        Ok(format!("{w}×{h}"))
    }
}

impl fmt::Display for ExportPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportPreset {
    type Err = MascotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| MascotError::validation(format!("unknown export preset '{s}'")))
    }
}

/// Catalog, settings and colorize cache bundled for repeated renders of changing states.
///
/// Every call takes the state by reference and returns fresh values; overlapping calls from
/// several threads are fine.
#[derive(Debug)]
pub struct Engine {
    catalog: Catalog,
    config: EngineConfig,
    cache: ColorizeCache,
}

impl Engine {
    /// Validate the catalog and settings and build an engine.
    pub fn new(catalog: Catalog, config: EngineConfig) -> MascotResult<Self> {
        catalog.validate()?;
        config.validate()?;
        let cache = ColorizeCache::new(config.colorize_cache_capacity);
        Ok(Self {
            catalog,
            config,
            cache,
        })
    }

    /// The catalog in use.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The settings in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The colorize cache (for inspection).
    pub fn cache(&self) -> &ColorizeCache {
        &self.cache
    }

    fn clamped(&self, state: &SelectionState) -> SelectionState {
        state
            .clone()
            .clamp_transforms(self.config.offset_limit, self.config.rotation_limit)
    }

    /// Uncolored layers for the state's direction.
    pub fn layers(&self, state: &SelectionState) -> Vec<ResolvedLayer> {
        self.clamped(state).layers(&self.catalog)
    }

    /// Colored layers for the state's direction, art embedded inline.
    pub fn colored_layers(
        &self,
        state: &SelectionState,
        source: &dyn AssetSource,
    ) -> Vec<ResolvedLayer> {
        let layers = self.layers(state);
        Colorizer::new(&self.catalog, source, &self.cache).apply_colors_to_layers(
            &layers,
            &state.part_colors,
            state.stroke,
            &state.selections,
        )
    }

    /// Preview description for a container `container_width` pixels wide.
    pub fn preview(
        &self,
        state: &SelectionState,
        source: &dyn AssetSource,
        container_width: f64,
    ) -> MascotResult<PreviewFrame> {
        let layers = self.colored_layers(state, source);
        preview_frame(&layers, self.config.canvas, container_width, state.direction)
    }

    /// Colorize and export as PNG at `scale` (default export scale when `None`).
    ///
    /// Completeness is not checked here; callers decide whether to export partial characters.
    pub fn export_png(
        &self,
        state: &SelectionState,
        source: &dyn AssetSource,
        scale: Option<f64>,
    ) -> MascotResult<Vec<u8>> {
        let layers = self.colored_layers(state, source);
        render_to_png(
            &layers,
            self.config.canvas,
            scale.unwrap_or(self.config.export_scale),
            state.direction,
            source,
        )
    }

    /// [`Engine::export_png`] at a named preset.
    pub fn export_preset(
        &self,
        state: &SelectionState,
        source: &dyn AssetSource,
        preset: ExportPreset,
    ) -> MascotResult<Vec<u8>> {
        self.export_png(state, source, Some(preset.scale()))
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
