use std::io::Cursor;

use rayon::prelude::*;
use resvg::tiny_skia::{
    FillRule, FilterQuality, IntSize, Mask, PathBuilder, Pixmap, PixmapPaint, Rect as SkRect,
    Transform,
};

use crate::{
    assets::decode::{LoadedImage, load_image},
    assets::source::AssetSource,
    compose::layers::ResolvedLayer,
    foundation::core::{Affine, Canvas, Direction, Side, Vec2},
    foundation::error::{MascotError, MascotResult},
    foundation::math::unpremultiply_rgba8_in_place,
};

fn to_skia(a: Affine) -> Transform {
    let [sx, ky, kx, sy, tx, ty] = a.as_coeffs();
    Transform::from_row(
        sx as f32, ky as f32, kx as f32, sy as f32, tx as f32, ty as f32,
    )
}

/// Scale an image of `size` to fit inside the canvas, centered, preserving aspect ratio.
pub(crate) fn contain_fit(size: (f64, f64), canvas: Canvas) -> Affine {
    let (iw, ih) = size;
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let s = (cw / iw).min(ch / ih);
    let offset = Vec2::new((cw - iw * s) / 2.0, (ch - ih * s) / 2.0);
    Affine::translate(offset) * Affine::scale(s)
}

fn half_mask(canvas: Canvas, side: Side, scale: f64, w: u32, h: u32) -> MascotResult<Mask> {
    let mut mask =
        Mask::new(w, h).ok_or_else(|| MascotError::render("failed to allocate clip mask"))?;
    let r = canvas.half_rect(side);
    let rect = SkRect::from_xywh(
        (r.x0 * scale) as f32,
        (r.y0 * scale) as f32,
        (r.width() * scale) as f32,
        (r.height() * scale) as f32,
    )
    .ok_or_else(|| MascotError::render("invalid clip rectangle"))?;
    mask.fill_path(
        &PathBuilder::from_rect(rect),
        FillRule::Winding,
        true,
        Transform::identity(),
    );
    Ok(mask)
}

fn draw_layer(
    target: &mut Pixmap,
    image: &LoadedImage,
    layer: &ResolvedLayer,
    canvas: Canvas,
    scale: f64,
) -> MascotResult<()> {
    let (w, h) = (target.width(), target.height());
    let placement =
        Affine::scale(scale) * layer.canvas_affine(canvas) * contain_fit(image.size(), canvas);
    let mask = match layer.side {
        Some(side) => Some(half_mask(canvas, side, scale, w, h)?),
        None => None,
    };

    let paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };
    match image {
        LoadedImage::Raster(img) => {
            let size = IntSize::from_wh(img.width, img.height)
                .ok_or_else(|| MascotError::render("image has zero size"))?;
            let src = Pixmap::from_vec(img.rgba8_premul.as_ref().clone(), size)
                .ok_or_else(|| MascotError::render("image buffer does not match its size"))?;
            target.draw_pixmap(0, 0, src.as_ref(), &paint, to_skia(placement), mask.as_ref());
        }
        LoadedImage::Svg(svg) => {
            // Rasterize at output resolution, then composite through the clip.
            let mut layer_px = Pixmap::new(w, h)
                .ok_or_else(|| MascotError::render("failed to allocate layer pixmap"))?;
            resvg::render(&svg.tree, to_skia(placement), &mut layer_px.as_mut());
            target.draw_pixmap(
                0,
                0,
                layer_px.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                mask.as_ref(),
            );
        }
    }
    Ok(())
}

/// Render layers onto an offscreen surface and return straight-alpha RGBA8.
///
/// The surface is `ceil(width·scale) × ceil(height·scale)`; geometry stays in canonical canvas
/// units. Images are loaded in parallel and all loads finish before drawing starts. Layers whose
/// image cannot be loaded are logged and omitted. Only surface failures are errors.
#[tracing::instrument(skip(layers, source), fields(layers = layers.len()))]
pub fn render_to_rgba(
    layers: &[ResolvedLayer],
    canvas: Canvas,
    scale: f64,
    direction: Direction,
    source: &dyn AssetSource,
) -> MascotResult<image::RgbaImage> {
    let (w, h) = canvas.scaled_size(scale)?;
    let mut pixmap = Pixmap::new(w, h)
        .ok_or_else(|| MascotError::render(format!("failed to allocate {w}x{h} surface")))?;

    let loaded: Vec<Option<LoadedImage>> = layers
        .par_iter()
        .map(|layer| match load_image(&layer.image, source) {
            Ok(img) => Some(img),
            Err(err) => {
                tracing::warn!(
                    category = %layer.category,
                    image = layer.image.label(),
                    error = %err,
                    "layer image failed to load; omitted"
                );
                None
            }
        })
        .collect();

    let mut order: Vec<usize> = (0..layers.len()).collect();
    order.sort_by_key(|&i| layers[i].layer_index);
    for i in order {
        let Some(image) = &loaded[i] else {
            continue;
        };
        draw_layer(&mut pixmap, image, &layers[i], canvas, scale)?;
    }

    let mut data = pixmap.take();
    unpremultiply_rgba8_in_place(&mut data);
    let mut img = image::RgbaImage::from_raw(w, h, data)
        .ok_or_else(|| MascotError::render("surface buffer does not match its size"))?;
    if direction.mirrors_raster() {
        image::imageops::flip_horizontal_in_place(&mut img);
    }
    Ok(img)
}

/// Render layers and encode the result as PNG bytes.
///
/// The back direction's raster is mirrored horizontally in a second pass.
pub fn render_to_png(
    layers: &[ResolvedLayer],
    canvas: Canvas,
    scale: f64,
    direction: Direction,
    source: &dyn AssetSource,
) -> MascotResult<Vec<u8>> {
    let img = render_to_rgba(layers, canvas, scale, direction, source)?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| MascotError::render(format!("png encode failed: {e}")))?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/export.rs"]
mod tests;
