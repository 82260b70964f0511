//! Open Graph card renderer: builds a 1200x630 SVG and rasterizes it with
//! resvg.

use std::sync::{Arc, OnceLock};

use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use serde::Deserialize;

use crate::error::OgError;

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 630;

const BACKGROUND: &str = "#FFFDF9";
const PRIMARY: &str = "#D97706";
const SECONDARY: &str = "#DA7756";
const FOREGROUND: &str = "#1F1F1E";
const ACCENT: &str = "#6B5B4F";
const MUTED: &str = "#E5DDD0";

const PADDING: u32 = 80;
const FONT_FAMILY: &str = "Inter, Helvetica, Arial, sans-serif";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OgParams {
    pub title: String,
    pub subtitle: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub criterion: String,
    pub level: String,
}

impl Default for OgParams {
    fn default() -> Self {
        Self {
            title: "TheWCAG".into(),
            subtitle: "Complete WCAG 2.2 Accessibility Guidelines".into(),
            kind: "website".into(),
            criterion: String::new(),
            level: String::new(),
        }
    }
}

impl OgParams {
    /// Empty query values fall back to the defaults.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        let or_default = |value: String, fallback: String| if value.is_empty() { fallback } else { value };
        Self {
            title: or_default(self.title, defaults.title),
            subtitle: or_default(self.subtitle, defaults.subtitle),
            kind: or_default(self.kind, defaults.kind),
            criterion: self.criterion,
            level: self.level,
        }
    }

    fn title_size(&self) -> u32 {
        if self.kind == "criterion" { 56 } else { 72 }
    }
}

pub fn level_color(level: &str) -> &'static str {
    match level {
        "AAA" => "#DC2626",
        "AA" => PRIMARY,
        _ => "#059669",
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Greedy word wrap on an estimated glyph width. Overflowing text is cut on
/// the last line with an ellipsis.
fn wrap(text: &str, font_size: u32, max_width: u32, max_lines: usize) -> Vec<String> {
    let max_chars = ((max_width as f32) / (font_size as f32 * 0.55)).floor().max(1.0) as usize;
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let kept: String = last.chars().take(max_chars.saturating_sub(1)).collect();
            *last = format!("{}…", kept.trim_end());
        }
    }
    lines
}

fn text_block(lines: &[String], x: u32, first_baseline: u32, size: u32, line_height: f32, attrs: &str) -> String {
    let mut out = format!(r#"<text x="{x}" y="{first_baseline}" font-size="{size}" {attrs}>"#);
    for (index, line) in lines.iter().enumerate() {
        let dy = if index == 0 { 0.0 } else { size as f32 * line_height };
        out.push_str(&format!(r#"<tspan x="{x}" dy="{dy}">{}</tspan>"#, escape(line)));
    }
    out.push_str("</text>");
    out
}

pub fn build_svg(params: &OgParams) -> String {
    let title_size = params.title_size();
    let title_lines = wrap(&params.title, title_size, 900, 3);
    let subtitle_lines = wrap(&params.subtitle, 24, 800, 2);

    let title_height = title_lines.len() as f32 * title_size as f32 * 1.1;
    let subtitle_height = subtitle_lines.len() as f32 * 24.0 * 1.4;
    let badge_height = if params.criterion.is_empty() { 0.0 } else { 36.0 + 24.0 };
    // Main block is centered between the header (ends at 200) and the footer (starts at 470).
    let block = badge_height + title_height + 24.0 + subtitle_height;
    let top = (200.0 + (270.0 - block) / 2.0).max(190.0);

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="{FONT_FAMILY}">
<defs>
<pattern id="dots" width="100" height="100" patternUnits="userSpaceOnUse"><circle cx="25" cy="25" r="2" fill="{MUTED}"/><circle cx="75" cy="75" r="2" fill="{MUTED}"/></pattern>
<linearGradient id="glow" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="{PRIMARY}"/><stop offset="0.7" stop-color="{PRIMARY}" stop-opacity="0"/></linearGradient>
</defs>
<rect width="{WIDTH}" height="{HEIGHT}" fill="{BACKGROUND}"/>
<rect width="{WIDTH}" height="{HEIGHT}" fill="url(#dots)"/>
<path d="M800 0 H1200 V400 H1000 A200 200 0 0 1 800 200 Z" fill="url(#glow)" opacity="0.05"/>
<rect x="{PADDING}" y="{PADDING}" width="80" height="80" rx="20" fill="{PRIMARY}"/>
<text x="120" y="131" font-size="32" font-weight="700" fill="{BACKGROUND}" text-anchor="middle">W</text>
<text x="184" y="114" font-size="32" font-weight="600" fill="{FOREGROUND}">TheWCAG.com</text>
<text x="184" y="144" font-size="18" fill="{ACCENT}">An Accessibility Guide</text>
"#
    );

    let mut cursor = top;
    if !params.criterion.is_empty() {
        let level_label = format!("Level {}", params.level);
        let level_width = 32 + (level_label.chars().count() as u32 * 9);
        let criterion_width = 32 + (params.criterion.chars().count() as u32 * 9);
        let y = cursor as u32;
        svg.push_str(&format!(
            r#"<rect x="{PADDING}" y="{y}" width="{level_width}" height="36" rx="8" fill="{}"/>
<text x="{}" y="{}" font-size="16" font-weight="600" fill="{BACKGROUND}">{}</text>
<rect x="{}" y="{y}" width="{criterion_width}" height="36" rx="8" fill="{MUTED}"/>
<text x="{}" y="{}" font-size="16" font-weight="500" fill="{ACCENT}">{}</text>
"#,
            level_color(&params.level),
            PADDING + 16,
            y + 24,
            escape(&level_label),
            PADDING + level_width + 12,
            PADDING + level_width + 12 + 16,
            y + 24,
            escape(&params.criterion),
        ));
        cursor += badge_height;
    }

    let title_baseline = (cursor + title_size as f32) as u32;
    svg.push_str(&text_block(
        &title_lines,
        PADDING,
        title_baseline,
        title_size,
        1.1,
        &format!(r#"font-weight="600" fill="{FOREGROUND}" letter-spacing="-1""#),
    ));
    cursor += title_height + 24.0;
    svg.push_str(&text_block(
        &subtitle_lines,
        PADDING,
        (cursor + 24.0) as u32,
        24,
        1.4,
        &format!(r#"fill="{ACCENT}""#),
    ));

    let footer = HEIGHT - PADDING - 40;
    svg.push_str(&format!(
        r#"
<circle cx="{}" cy="{}" r="20" fill="{PRIMARY}" opacity="0.8"/>
<circle cx="{}" cy="{}" r="16" fill="{SECONDARY}" opacity="0.6"/>
<circle cx="{}" cy="{}" r="12" fill="{ACCENT}" opacity="0.4"/>
<rect x="{}" y="{}" width="150" height="48" rx="12" fill="{PRIMARY}"/>
<text x="{}" y="{}" font-size="18" font-weight="600" fill="{BACKGROUND}" text-anchor="middle">WCAG 2.2</text>
</svg>"#,
        PADDING + 20,
        footer + 20,
        PADDING + 40 + 16 + 16,
        footer + 20,
        PADDING + 40 + 16 + 32 + 16 + 12,
        footer + 20,
        WIDTH - PADDING - 150,
        footer - 4,
        WIDTH - PADDING - 75,
        footer + 26,
    ));
    svg
}

fn font_database() -> Arc<fontdb::Database> {
    static DB: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Arc::new(db)
    })
    .clone()
}

pub fn render_png(svg: &str) -> Result<Vec<u8>, OgError> {
    let options = usvg::Options {
        fontdb: font_database(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &options)?;
    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());
    let mut pixmap = Pixmap::new(width, height).ok_or(OgError::Canvas { width, height })?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());
    pixmap.encode_png().map_err(|err| OgError::Encode(err.to_string()))
}

pub fn render_card(params: &OgParams) -> Result<Vec<u8>, OgError> {
    render_png(&build_svg(params))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_size(png: &[u8]) -> (u32, u32) {
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        (width, height)
    }

    #[test]
    fn renders_default_card_at_og_size() {
        let png = render_card(&OgParams::default()).expect("png");
        assert_eq!(png_size(&png), (WIDTH, HEIGHT));
    }

    #[test]
    fn criterion_cards_use_smaller_title_and_level_badge() {
        let params = OgParams {
            title: "Contrast (Minimum)".into(),
            kind: "criterion".into(),
            criterion: "1.4.3".into(),
            level: "AAA".into(),
            ..OgParams::default()
        };
        let svg = build_svg(&params);
        assert!(svg.contains(r#"font-size="56""#));
        assert!(svg.contains("#DC2626"));
        assert!(svg.contains("Level AAA"));
        assert!(svg.contains(">1.4.3<"));
        let png = render_card(&params).expect("png");
        assert_eq!(png_size(&png), (WIDTH, HEIGHT));
    }

    #[test]
    fn badge_is_omitted_without_criterion() {
        let svg = build_svg(&OgParams::default());
        assert!(svg.contains(r#"font-size="72""#));
        assert!(!svg.contains("Level "));
    }

    #[test]
    fn level_colors() {
        assert_eq!(level_color("AAA"), "#DC2626");
        assert_eq!(level_color("AA"), "#D97706");
        assert_eq!(level_color("A"), "#059669");
        assert_eq!(level_color(""), "#059669");
    }

    #[test]
    fn text_is_escaped() {
        let params = OgParams {
            title: "<script> & \"quotes\"".into(),
            ..OgParams::default()
        };
        let svg = build_svg(&params);
        assert!(svg.contains("&lt;script&gt; &amp; &quot;quotes&quot;"));
        assert!(render_png(&svg).is_ok());
    }

    #[test]
    fn long_titles_wrap_and_truncate() {
        let lines = wrap(&"word ".repeat(60), 72, 900, 3);
        assert_eq!(lines.len(), 3);
        assert!(lines[2].ends_with('…'));
        assert_eq!(wrap("short", 72, 900, 3), ["short"]);
    }

    #[test]
    fn empty_query_values_use_defaults() {
        let params = OgParams {
            title: String::new(),
            subtitle: String::new(),
            ..OgParams::default()
        }
        .normalized();
        assert_eq!(params.title, "TheWCAG");
        assert_eq!(params.subtitle, "Complete WCAG 2.2 Accessibility Guidelines");
    }
}
