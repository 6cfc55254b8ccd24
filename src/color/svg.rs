//! Text-level SVG recoloring.
//!
//! Part art keeps its colors in CSS declarations (`fill: #fff; stroke: #231815;
//! stroke-width: 4px`), so recoloring is a rewrite of those declarations rather than a DOM edit.

use std::sync::OnceLock;

use anyhow::Context;
use base64::Engine;
use regex::{Captures, Regex};

use crate::{
    color::palette::{PartColor, StrokeSettings, StrokeTexture},
    foundation::error::MascotResult,
};

/// Id of the injected rough-outline filter.
pub const ROUGH_FILTER_ID: &str = "rough-stroke";

const ROUGH_FILTER_DEF: &str = r#"<filter id="rough-stroke" x="-5%" y="-5%" width="110%" height="110%">
  <feTurbulence type="turbulence" baseFrequency="0.02" numOctaves="3" seed="42" result="noise"/>
  <feDisplacementMap in="SourceGraphic" in2="noise" scale="3" xChannelSelector="R" yChannelSelector="G"/>
</filter>"#;

const ROUGH_FILTER_RULE: &str = "\nsvg { filter: url(#rough-stroke); }\n";

fn cached_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> MascotResult<&'static Regex> {
    if let Some(re) = cell.get() {
        return Ok(re);
    }
    let re = Regex::new(pattern).with_context(|| format!("compile pattern '{pattern}'"))?;
    Ok(cell.get_or_init(|| re))
}

fn replace_value(re: &Regex, svg: &str, value: &str) -> String {
    re.replace_all(svg, |caps: &Captures<'_>| format!("{}{value}", &caps[1]))
        .into_owned()
}

/// Replace every `fill:` color. With `preserve_none`, `fill: none` declarations are kept so
/// stroke-only paths stay unfilled.
pub fn replace_fill_color(svg: &str, fill: &str, preserve_none: bool) -> MascotResult<String> {
    static ANY: OnceLock<Regex> = OnceLock::new();
    static HEX_ONLY: OnceLock<Regex> = OnceLock::new();
    let re = if preserve_none {
        cached_regex(&HEX_ONLY, r"(?i)(fill:\s*)(#[0-9a-f]{3,8})")?
    } else {
        cached_regex(&ANY, r"(?i)(fill:\s*)(none|#[0-9a-f]{3,8})")?
    };
    Ok(replace_value(re, svg, fill))
}

/// Replace every hex `stroke:` color.
pub fn replace_stroke_color(svg: &str, stroke: &str) -> MascotResult<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = cached_regex(&RE, r"(?i)(stroke:\s*)(#[0-9a-f]{3,8})")?;
    Ok(replace_value(re, svg, stroke))
}

/// Replace every pixel `stroke-width:` value.
pub fn replace_stroke_width(svg: &str, width_px: u32) -> MascotResult<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = cached_regex(&RE, r"(?i)(stroke-width:\s*)(\d+(?:\.\d+)?px)")?;
    Ok(replace_value(re, svg, &format!("{width_px}px")))
}

/// Inject the outline texture filter. `Default` returns the text unchanged, as does a document
/// that already carries the filter.
pub fn apply_stroke_texture(svg: &str, texture: StrokeTexture) -> String {
    if texture == StrokeTexture::Default || svg.contains(&format!("id=\"{ROUGH_FILTER_ID}\"")) {
        return svg.to_owned();
    }

    let mut out = if let Some(i) = svg.find("</defs>") {
        format!("{}{ROUGH_FILTER_DEF}{}", &svg[..i], &svg[i..])
    } else if let Some(i) = svg.find("<svg").and_then(|s| svg[s..].find('>').map(|e| s + e)) {
        format!(
            "{}<defs>{ROUGH_FILTER_DEF}</defs>{}",
            &svg[..=i],
            &svg[i + 1..]
        )
    } else {
        svg.to_owned()
    };

    if let Some(i) = out.find("</style>") {
        out.insert_str(i, ROUGH_FILTER_RULE);
    }
    out
}

/// Apply fill, stroke, width and texture in one pass over the document.
///
/// The color is validated first so only well-formed hex reaches the output.
pub fn colorize_svg(
    svg: &str,
    color: &PartColor,
    stroke: StrokeSettings,
    preserve_none: bool,
) -> MascotResult<String> {
    color.validate()?;
    let mut out = replace_fill_color(svg, &color.fill, preserve_none)?;
    out = replace_stroke_color(&out, &color.stroke)?;
    if let Some(px) = stroke.width.px() {
        out = replace_stroke_width(&out, px)?;
    }
    Ok(apply_stroke_texture(&out, stroke.texture))
}

/// Encode SVG text as a base64 `data:` URI.
pub fn svg_to_data_uri(svg: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(svg.as_bytes());
    format!("data:image/svg+xml;base64,{encoded}")
}

#[cfg(test)]
#[path = "../../tests/unit/color/svg.rs"]
mod tests;
