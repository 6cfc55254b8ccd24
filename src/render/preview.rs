//! Browser-facing preview description.
//!
//! The preview is a stack of absolutely positioned images over a container with the canvas'
//! aspect ratio. Each layer is an outer element carrying the static half clip and an inner
//! element carrying the transform, so clipping stays in canvas space while the art moves.

use crate::{
    assets::source::ImageRef,
    catalog::model::CategoryId,
    color::svg::svg_to_data_uri,
    compose::layers::ResolvedLayer,
    foundation::core::{Canvas, Direction, Side},
    foundation::error::{MascotError, MascotResult},
};

/// CSS for one preview layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PreviewLayer {
    /// Category the layer belongs to.
    pub category: CategoryId,
    /// Stacking order.
    pub z_index: u32,
    /// `src` attribute: a catalog path or a `data:` URI.
    pub src: String,
    /// `clip-path` of the outer element, for bilateral layers.
    pub clip_path: Option<String>,
    /// `transform` of the inner element (origin at its center).
    pub transform: String,
}

/// A full preview: container transform plus layers in paint order.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PreviewFrame {
    /// Container width in CSS pixels.
    pub width: f64,
    /// Container height in CSS pixels.
    pub height: f64,
    /// Canonical-to-container scale.
    pub scale: f64,
    /// `transform` of the container (mirrors the back view).
    pub container_transform: Option<String>,
    /// Layers, lowest z first.
    pub layers: Vec<PreviewLayer>,
}

/// Canonical-to-container scale for a container `container_width` pixels wide.
pub fn preview_scale(canvas: Canvas, container_width: f64) -> MascotResult<f64> {
    if !container_width.is_finite() || container_width <= 0.0 {
        return Err(MascotError::validation(
            "preview container width must be finite and > 0",
        ));
    }
    Ok(container_width / f64::from(canvas.width))
}

fn clip_for(side: Side) -> &'static str {
    match side {
        Side::Left => "inset(0 50% 0 0)",
        Side::Right => "inset(0 0 0 50%)",
    }
}

fn css_number(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        "0".to_owned()
    } else {
        format!("{rounded}")
    }
}

/// Inner-element transform: `translate(offset·scale) rotate(deg)`, plus a horizontal flip for
/// mirrored layers.
pub fn layer_css_transform(layer: &ResolvedLayer, scale: f64) -> String {
    let mut css = format!(
        "translate({}px, {}px) rotate({}deg)",
        css_number(layer.offset_x * scale),
        css_number(layer.offset_y * scale),
        css_number(layer.rotate)
    );
    if layer.flip_x {
        css.push_str(" scaleX(-1)");
    }
    css
}

fn image_src(image: &ImageRef) -> String {
    match image {
        ImageRef::Path(p) => p.clone(),
        ImageRef::Svg(doc) => svg_to_data_uri(doc),
    }
}

/// Describe `layers` for a container `container_width` pixels wide.
pub fn preview_frame(
    layers: &[ResolvedLayer],
    canvas: Canvas,
    container_width: f64,
    direction: Direction,
) -> MascotResult<PreviewFrame> {
    let scale = preview_scale(canvas, container_width)?;
    let mut ordered: Vec<&ResolvedLayer> = layers.iter().collect();
    ordered.sort_by_key(|l| l.layer_index);

    Ok(PreviewFrame {
        width: container_width,
        height: f64::from(canvas.height) * scale,
        scale,
        container_transform: direction
            .mirrors_raster()
            .then(|| "scaleX(-1)".to_owned()),
        layers: ordered
            .into_iter()
            .map(|l| PreviewLayer {
                category: l.category.clone(),
                z_index: l.layer_index,
                src: image_src(&l.image),
                clip_path: l.side.map(|s| clip_for(s).to_owned()),
                transform: layer_css_transform(l, scale),
            })
            .collect(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/preview.rs"]
mod tests;
