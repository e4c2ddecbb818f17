//! Display formatting shared by the views and exports.

/// Format an integer with thousands separators (e.g., 1234567 -> "1,234,567").
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a byte size for display (e.g., 1536 -> "1.5 KB").
pub fn format_bytes(n: u64) -> String {
    const KB: f64 = 1024.0;
    let n_f = n as f64;
    if n_f >= KB * KB * KB {
        format!("{:.1} GB", n_f / (KB * KB * KB))
    } else if n_f >= KB * KB {
        format!("{:.1} MB", n_f / (KB * KB))
    } else if n_f >= KB {
        format!("{:.1} KB", n_f / KB)
    } else {
        format!("{} B", n)
    }
}

/// Thai name with the English name in parentheses: "น่าน (Nan)".
pub fn bilingual(name: Option<&str>, name_en: Option<&str>) -> String {
    let name = name.filter(|s| !s.is_empty());
    let name_en = name_en.filter(|s| !s.is_empty());
    match (name, name_en) {
        (Some(n), Some(en)) if n != en => format!("{} ({})", n, en),
        (Some(n), _) => n.to_string(),
        (None, Some(en)) => en.to_string(),
        (None, None) => "-".to_string(),
    }
}

/// Label for a pre-assigned risk level. Anything above 2 reads as high.
pub fn risk_level_label(level: u8) -> &'static str {
    match level {
        1 => "Low risk",
        2 => "Medium risk",
        _ => "High risk",
    }
}

/// Rainfall in millimeters, or "-" when unknown.
pub fn format_rain(rain: Option<f64>) -> String {
    match rain {
        Some(r) if r.is_finite() => format!("{:.2}", r),
        _ => "-".to_string(),
    }
}

/// Horizontal bar for a 0-100 score using eighth-block characters.
pub fn probability_bar(probability: f64, width: usize) -> String {
    const PARTIALS: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];

    let fraction = (probability / 100.0).clamp(0.0, 1.0);
    let eighths = (fraction * width as f64 * 8.0).round() as usize;
    let full = eighths / 8;
    let rest = eighths % 8;

    let mut bar: String = "█".repeat(full);
    if full < width {
        bar.push(PARTIALS[rest]);
        bar.push_str(&" ".repeat(width - full - 1));
    }
    bar
}
