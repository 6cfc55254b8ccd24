use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use rayon::prelude::*;

use crate::{
    assets::source::{AssetSource, ImageRef},
    catalog::model::{Catalog, CategoryId},
    color::palette::{PartColor, StrokeSettings, StrokeTexture},
    color::svg::colorize_svg,
    compose::layers::ResolvedLayer,
    foundation::error::{MascotError, MascotResult},
    foundation::math::Fnv1a64,
};

/// Default number of colorized documents kept by [`ColorizeCache`].
pub const DEFAULT_COLORIZE_CACHE_CAPACITY: usize = 256;

/// Color a layer is drawn with.
///
/// A fixed layer color wins. Otherwise, in order: the category's fixed tone; the stored color
/// of a part that opts into coloring; the color of the category this one follows; the stored
/// color of a user-colorable category; the catalog default. Stored colors fall back to the
/// catalog default when absent.
pub fn resolve_layer_color(
    catalog: &Catalog,
    layer: &ResolvedLayer,
    part_colors: &BTreeMap<CategoryId, PartColor>,
    selections: &BTreeMap<CategoryId, String>,
) -> PartColor {
    if let Some(fixed) = &layer.fixed_color {
        return fixed.clone();
    }
    let rules = &catalog.colors;
    let stored = |category: &CategoryId| {
        part_colors
            .get(category)
            .cloned()
            .unwrap_or_else(|| rules.default_color.clone())
    };

    let category = &layer.category;
    if let Some(fixed) = rules.fixed.get(category) {
        return fixed.clone();
    }
    let part_colorable = selections
        .get(category)
        .and_then(|id| catalog.part(category.as_str(), id))
        .is_some_and(|p| p.colorable);
    if part_colorable {
        return stored(category);
    }
    if let Some(target) = rules.follows.get(category) {
        return if rules.is_colorable(target.as_str()) {
            stored(target)
        } else {
            rules.default_color.clone()
        };
    }
    if rules.is_colorable(category.as_str()) {
        return stored(category);
    }
    rules.default_color.clone()
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<u64, Arc<str>>,
    lru: VecDeque<u64>,
}

impl CacheInner {
    fn touch(&mut self, key: u64) {
        if let Some(pos) = self.lru.iter().position(|x| *x == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }
}

/// Bounded LRU of colorized SVG documents, keyed by source identity and color configuration.
///
/// Safe to share between overlapping colorize calls.
pub struct ColorizeCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl ColorizeCache {
    /// Cache holding at most `capacity` documents (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.entries.len()).unwrap_or(0)
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: u64) -> Option<Arc<str>> {
        let mut inner = self.inner.lock().ok()?;
        let hit = inner.entries.get(&key).cloned()?;
        inner.touch(key);
        Some(hit)
    }

    fn insert(&self, key: u64, doc: Arc<str>) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        inner.entries.insert(key, doc);
        inner.touch(key);
        while inner.lru.len() > self.capacity {
            if let Some(old) = inner.lru.pop_front() {
                inner.entries.remove(&old);
            }
        }
    }
}

impl Default for ColorizeCache {
    fn default() -> Self {
        Self::new(DEFAULT_COLORIZE_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for ColorizeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorizeCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

fn cache_key(image: &ImageRef, color: &PartColor, stroke: StrokeSettings, preserve_none: bool) -> u64 {
    let mut h = Fnv1a64::new_default();
    match image {
        ImageRef::Path(p) => {
            h.write_u8(0);
            h.write_str(p);
        }
        ImageRef::Svg(text) => {
            h.write_u8(1);
            h.write_str(text);
        }
    }
    h.write_str(&color.fill.to_ascii_lowercase());
    h.write_str(&color.stroke.to_ascii_lowercase());
    h.write_u8(stroke.width.px().map_or(0, |px| px.min(255) as u8));
    h.write_u8(match stroke.texture {
        StrokeTexture::Default => 0,
        StrokeTexture::Rough => 1,
    });
    h.write_u8(u8::from(preserve_none));
    h.finish()
}

/// The colorize stage: recolors layer art and embeds the result in the layer.
pub struct Colorizer<'a> {
    catalog: &'a Catalog,
    source: &'a dyn AssetSource,
    cache: &'a ColorizeCache,
}

impl<'a> Colorizer<'a> {
    /// Colorizer reading art from `source` and memoizing into `cache`.
    pub fn new(catalog: &'a Catalog, source: &'a dyn AssetSource, cache: &'a ColorizeCache) -> Self {
        Self {
            catalog,
            source,
            cache,
        }
    }

    /// Recolor every layer in parallel and wait for all of them.
    ///
    /// Each returned layer carries its colorized SVG inline. Layers whose art cannot be read or
    /// rewritten are logged and returned unchanged; non-SVG art passes through as is. Order and
    /// every other field are preserved.
    #[tracing::instrument(skip_all, fields(layers = layers.len()))]
    pub fn apply_colors_to_layers(
        &self,
        layers: &[ResolvedLayer],
        part_colors: &BTreeMap<CategoryId, PartColor>,
        stroke: StrokeSettings,
        selections: &BTreeMap<CategoryId, String>,
    ) -> Vec<ResolvedLayer> {
        layers
            .par_iter()
            .map(|layer| {
                if !layer.image.is_svg() {
                    return layer.clone();
                }
                let color = resolve_layer_color(self.catalog, layer, part_colors, selections);
                match self.colorize_layer(layer, &color, stroke) {
                    Ok(doc) => ResolvedLayer {
                        image: ImageRef::Svg(doc),
                        ..layer.clone()
                    },
                    Err(err) => {
                        tracing::warn!(
                            category = %layer.category,
                            image = layer.image.label(),
                            error = %err,
                            "colorize failed; layer passed through"
                        );
                        layer.clone()
                    }
                }
            })
            .collect()
    }

    fn colorize_layer(
        &self,
        layer: &ResolvedLayer,
        color: &PartColor,
        stroke: StrokeSettings,
    ) -> MascotResult<Arc<str>> {
        let preserve_none = self.catalog.colors.is_stroke_only(layer.category.as_str());
        let key = cache_key(&layer.image, color, stroke, preserve_none);
        if let Some(hit) = self.cache.get(key) {
            tracing::debug!(category = %layer.category, "colorize cache hit");
            return Ok(hit);
        }

        let text: Cow<'_, str> = match &layer.image {
            ImageRef::Svg(text) => Cow::Borrowed(&**text),
            ImageRef::Path(path) => {
                let bytes = self.source.read(path)?;
                let text = String::from_utf8(bytes)
                    .map_err(|_| MascotError::asset(format!("svg '{path}' is not UTF-8")))?;
                Cow::Owned(text)
            }
        };

        let doc: Arc<str> = Arc::from(colorize_svg(&text, color, stroke, preserve_none)?);
        self.cache.insert(key, doc.clone());
        Ok(doc)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/color/apply.rs"]
mod tests;
