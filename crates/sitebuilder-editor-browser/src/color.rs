//! Color and size conversions for toolbar panel initial values.

use sitebuilder_editor_core::{FontSizeToken, parse_hex_color};

/// Convert a computed CSS color (`rgb()`, `rgba()` or hex) to `#rrggbb`.
///
/// Fully transparent colors have no meaningful swatch and yield None.
pub fn css_color_to_hex(value: &str) -> Option<String> {
    let value = value.trim();
    if value.starts_with('#') {
        let hex = parse_hex_color(value).ok()?;
        if hex.len() == 4 {
            return Some(hex.chars().skip(1).fold(String::from("#"), |mut out, c| {
                out.push(c);
                out.push(c);
                out
            }));
        }
        return Some(hex);
    }
    let inner = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() < 3 {
        return None;
    }
    if let Some(alpha) = parts.get(3) {
        if alpha.parse::<f32>().ok()? == 0.0 {
            return None;
        }
    }
    let channel = |part: &str| part.parse::<f32>().ok().map(|v| v.round().clamp(0.0, 255.0) as u8);
    let (r, g, b) = (channel(parts[0])?, channel(parts[1])?, channel(parts[2])?);
    Some(format!("#{r:02x}{g:02x}{b:02x}"))
}

/// Pixel size a browser renders for each legacy `<font size>` step.
fn native_px(token: FontSizeToken) -> f64 {
    match token.native_size() {
        1 => 10.0,
        2 => 13.0,
        3 => 16.0,
        4 => 18.0,
        5 => 24.0,
        6 => 32.0,
        _ => 48.0,
    }
}

/// Closest menu entry for a computed `font-size` such as `"24px"`.
pub fn font_size_token(value: &str) -> Option<FontSizeToken> {
    let px: f64 = value.trim().strip_suffix("px")?.trim().parse().ok()?;
    FontSizeToken::ALL.iter().copied().min_by(|a, b| {
        let da = (native_px(*a) - px).abs();
        let db = (native_px(*b) - px).abs();
        da.total_cmp(&db)
    })
}
