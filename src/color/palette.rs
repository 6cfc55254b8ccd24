use crate::foundation::error::{MascotError, MascotResult};

/// Fill used when nothing more specific applies.
pub const DEFAULT_FILL_COLOR: &str = "#ffffff";
/// Outline color used when nothing more specific applies.
pub const DEFAULT_STROKE_COLOR: &str = "#231815";

/// Fill and stroke colors of one part, as CSS hex strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PartColor {
    /// Interior color.
    pub fill: String,
    /// Outline color.
    pub stroke: String,
}

impl PartColor {
    /// Build a color pair.
    pub fn new(fill: impl Into<String>, stroke: impl Into<String>) -> Self {
        Self {
            fill: fill.into(),
            stroke: stroke.into(),
        }
    }

    /// Both colors must be `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
    pub fn validate(&self) -> MascotResult<()> {
        parse_hex(&self.fill).map_err(MascotError::validation)?;
        parse_hex(&self.stroke).map_err(MascotError::validation)?;
        Ok(())
    }
}

impl Default for PartColor {
    fn default() -> Self {
        Self::new(DEFAULT_FILL_COLOR, DEFAULT_STROKE_COLOR)
    }
}

/// Parse a CSS hex color into straight RGBA8.
pub fn parse_hex(s: &str) -> Result<[u8; 4], String> {
    let digits = s
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| format!("color \"{s}\" must start with '#'"))?;
    if !digits.is_ascii() {
        return Err(format!("color \"{s}\" is not hex"));
    }

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    match digits.len() {
        3 => {
            let mut out = [255u8; 4];
            for (i, c) in digits.char_indices() {
                let nibble = hex_byte(&c.to_string())?;
                out[i] = nibble * 17;
            }
            Ok(out)
        }
        6 => Ok([
            hex_byte(&digits[0..2])?,
            hex_byte(&digits[2..4])?,
            hex_byte(&digits[4..6])?,
            255,
        ]),
        8 => Ok([
            hex_byte(&digits[0..2])?,
            hex_byte(&digits[2..4])?,
            hex_byte(&digits[4..6])?,
            hex_byte(&digits[6..8])?,
        ]),
        _ => Err(format!(
            "color \"{s}\" must be #RGB, #RRGGBB or #RRGGBBAA (case-insensitive)"
        )),
    }
}

/// A named swatch in a preset palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorPreset {
    /// Stable id.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Hex color.
    pub color: &'static str,
}

const fn preset(id: &'static str, name: &'static str, color: &'static str) -> ColorPreset {
    ColorPreset { id, name, color }
}

/// Fill swatches offered to the user.
pub const FILL_PRESETS: &[ColorPreset] = &[
    preset("white", "White", "#ffffff"),
    preset("cream", "Cream", "#fff8e7"),
    preset("peach", "Peach", "#ffdab9"),
    preset("pink", "Pink", "#ffb6c1"),
    preset("lavender", "Lavender", "#e6e6fa"),
    preset("skyblue", "Sky blue", "#87ceeb"),
    preset("mint", "Mint", "#98fb98"),
    preset("yellow", "Yellow", "#fff44f"),
    preset("orange", "Orange", "#ffa500"),
    preset("gray", "Gray", "#d3d3d3"),
    preset("brown", "Brown", "#deb887"),
    preset("black", "Black", "#333333"),
];

/// Outline swatches offered to the user.
pub const STROKE_PRESETS: &[ColorPreset] = &[
    preset("default", "Default", DEFAULT_STROKE_COLOR),
    preset("black", "Black", "#000000"),
    preset("dark-brown", "Dark brown", "#3e2723"),
    preset("brown", "Brown", "#795548"),
    preset("dark-gray", "Dark gray", "#424242"),
    preset("gray", "Gray", "#757575"),
    preset("navy", "Navy", "#1a237e"),
    preset("dark-red", "Dark red", "#b71c1c"),
    preset("dark-green", "Dark green", "#1b5e20"),
    preset("purple", "Purple", "#4a148c"),
];

/// Global outline width preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrokeWidth {
    /// 2px outlines.
    Thin,
    /// Leave the authored width alone.
    #[default]
    Default,
    /// 6px outlines.
    Thick,
    /// 8px outlines.
    ExtraThick,
}

impl StrokeWidth {
    /// Every preset in display order.
    pub const ALL: [Self; 4] = [Self::Thin, Self::Default, Self::Thick, Self::ExtraThick];

    /// Replacement `stroke-width` in pixels, or `None` for the authored width.
    pub fn px(self) -> Option<u32> {
        match self {
            Self::Thin => Some(2),
            Self::Default => None,
            Self::Thick => Some(6),
            Self::ExtraThick => Some(8),
        }
    }
}

/// Global outline texture preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrokeTexture {
    /// Clean vector outlines.
    #[default]
    Default,
    /// Hand-drawn look via a turbulence displacement filter.
    Rough,
}

/// Stroke styling applied to every colorized layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StrokeSettings {
    /// Width preset.
    #[serde(default)]
    pub width: StrokeWidth,
    /// Texture preset.
    #[serde(default)]
    pub texture: StrokeTexture,
}

impl StrokeSettings {
    /// Whether these settings leave the art untouched.
    pub fn is_default(self) -> bool {
        self == Self::default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/color/palette.rs"]
mod tests;
