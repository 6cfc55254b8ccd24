use std::sync::Arc;

use anyhow::Context;

use crate::{
    assets::source::{AssetSource, ImageRef},
    foundation::error::{MascotError, MascotResult},
    foundation::math::premultiply_rgba8_in_place,
};

#[derive(Clone, Debug)]
/// Decoded raster image in premultiplied RGBA8 form.
pub(crate) struct PreparedImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Row-major premultiplied RGBA8.
    pub(crate) rgba8_premul: Arc<Vec<u8>>,
}

#[derive(Clone, Debug)]
/// Parsed SVG document.
pub(crate) struct PreparedSvg {
    pub(crate) tree: Arc<usvg::Tree>,
}

/// A layer image ready to draw.
#[derive(Clone, Debug)]
pub(crate) enum LoadedImage {
    Raster(PreparedImage),
    Svg(PreparedSvg),
}

impl LoadedImage {
    /// Intrinsic size in image units.
    pub(crate) fn size(&self) -> (f64, f64) {
        match self {
            Self::Raster(img) => (f64::from(img.width), f64::from(img.height)),
            Self::Svg(svg) => {
                let s = svg.tree.size();
                (f64::from(s.width()), f64::from(s.height()))
            }
        }
    }
}

pub(crate) fn decode_image(bytes: &[u8]) -> MascotResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub(crate) fn parse_svg(bytes: &[u8]) -> MascotResult<PreparedSvg> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    let size = tree.size();
    if !(size.width() > 0.0 && size.height() > 0.0) {
        return Err(MascotError::asset("svg has invalid width/height"));
    }
    Ok(PreparedSvg {
        tree: Arc::new(tree),
    })
}

/// Fetch (for paths) and decode a layer image.
pub(crate) fn load_image(image: &ImageRef, source: &dyn AssetSource) -> MascotResult<LoadedImage> {
    match image {
        ImageRef::Svg(text) => Ok(LoadedImage::Svg(parse_svg(text.as_bytes())?)),
        ImageRef::Path(path) => {
            let bytes = source.read(path)?;
            if image.is_svg() {
                Ok(LoadedImage::Svg(parse_svg(&bytes)?))
            } else {
                Ok(LoadedImage::Raster(decode_image(&bytes)?))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
