//! Normalization of canvas style strings to packed 0xRRGGBB values.

/// Parses `#rrggbb`, `#rgb`, `rgb(r, g, b)` and `rgba(r, g, b, a)` (alpha ignored).
/// Matching is case-insensitive and tolerates surrounding whitespace.
pub fn parse_css_color(input: &str) -> Option<u32> {
    let s = input.trim().to_ascii_lowercase();

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    let body = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let mut rgb = 0u32;
    for part in &parts[..3] {
        let channel: u8 = part.parse().ok()?;
        rgb = (rgb << 8) | channel as u32;
    }
    Some(rgb)
}

fn parse_hex(hex: &str) -> Option<u32> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => u32::from_str_radix(hex, 16).ok(),
        3 => {
            let short = u32::from_str_radix(hex, 16).ok()?;
            let (r, g, b) = ((short >> 8) & 0xf, (short >> 4) & 0xf, short & 0xf);
            Some(((r * 0x11) << 16) | ((g * 0x11) << 8) | (b * 0x11))
        },
        _ => None,
    }
}

pub fn format_hex(rgb: u32) -> String {
    format!("#{:06x}", rgb & 0x00ff_ffff)
}
