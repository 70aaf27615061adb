//! HTML/SVG view of a layout's matrix.
//!
//! One rectangle per matrix cell, drawn in matrix order (drive rows down,
//! sense columns across) with the RESTORE row last. Special keys show both
//! branches: unshifted on top, shifted below.

use c64key_core::{Key, Layout, ModDelta, COLS, ROWS};

/// Key unit size in SVG pixels.
const U: f64 = 64.0;
/// Gap between keys.
const GAP: f64 = 4.0;
/// Step: key + gap.
const S: f64 = U + GAP;
/// Key corner radius.
const R: f64 = 4.0;
/// Margin around the SVG content.
const MARGIN: f64 = 20.0;
/// Room for the column numbers and the title.
const HEADER: f64 = 50.0;
/// Room for the row numbers.
const GUTTER: f64 = 40.0;

fn key_label(key: Key) -> &'static str {
    match key {
        Key::None => "",
        Key::Code(code) => code.display_name(),
        Key::Mod(modifier) => modifier.display_name(),
        Key::Special(_) => "?",
    }
}

/// Label for one branch of a special key. A trailing `*` marks a branch
/// that also adjusts the modifier byte.
fn branch_label((key, delta): (Key, ModDelta)) -> String {
    let mut label = key_label(key).to_string();
    if !delta.is_empty() {
        label.push('*');
    }
    label
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn text(x: f64, y: f64, class: &str, label: &str) -> String {
    format!(
        r#"<text x="{x}" y="{y}" class="{class}">{}</text>"#,
        html_escape(label)
    )
}

fn render_cell(layout: &Layout<'_>, row: usize, col: usize) -> String {
    let x = GUTTER + col as f64 * S;
    let y = HEADER + row as f64 * S;
    let key = layout.key(row, col);

    let key_class = match key {
        Key::None => "key unused",
        Key::Mod(_) => "key modifier",
        Key::Special(_) => "key special",
        Key::Code(_) => "key",
    };

    let mut svg = format!(
        r#"<rect x="{x}" y="{y}" width="{U}" height="{U}" rx="{R}" class="{key_class}"><title>({row}, {col})</title></rect>"#
    );

    let cx = x + U / 2.0;
    match key {
        Key::None => {}
        Key::Special(index) => {
            let special = &layout.specials()[index as usize];
            svg.push_str(&text(cx, y + U * 0.3, "label shifted", &branch_label(special.shifted)));
            svg.push_str(&text(cx, y + U * 0.7, "label", &branch_label(special.unshifted)));
        }
        key => {
            let label = key_label(key);
            let font_class = if label.len() > 4 { "label small" } else { "label" };
            svg.push_str(&text(cx, y + U / 2.0 + 1.0, font_class, label));
        }
    }
    svg
}

fn render_matrix(layout: &Layout<'_>) -> String {
    let mut svg = format!(r#"<g transform="translate({MARGIN}, {MARGIN})">"#);

    svg.push_str(&text(0.0, 16.0, "title", &format!("Layout {}", layout.name())));

    for col in 0..COLS {
        let cx = GUTTER + col as f64 * S + U / 2.0;
        svg.push_str(&text(cx, HEADER - 10.0, "index", &col.to_string()));
    }
    for row in 0..ROWS {
        let cy = HEADER + row as f64 * S + U / 2.0;
        let label = if row == ROWS - 1 {
            "R".to_string()
        } else {
            row.to_string()
        };
        svg.push_str(&text(GUTTER / 2.0, cy, "index", &label));
        for col in 0..COLS {
            svg.push_str(&render_cell(layout, row, col));
        }
    }

    svg.push_str("</g>");
    svg
}

/// Generate the complete HTML document with inline SVG.
pub fn generate_html(layout: &Layout<'_>) -> String {
    let total_width = GUTTER + COLS as f64 * S + 2.0 * MARGIN;
    let total_height = HEADER + ROWS as f64 * S + 2.0 * MARGIN;
    let name = html_escape(layout.name());

    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>c64key layout {name}</title>
<style>
  body {{
    background: #1a1a2e;
    color: #eee;
    font-family: system-ui, -apple-system, sans-serif;
    display: flex;
    justify-content: center;
    padding: 2em;
  }}
  .key {{
    fill: #3b3024;
    stroke: #6b5a44;
    stroke-width: 1.5;
  }}
  .key.unused {{
    fill: #0d1117;
    stroke: #21262d;
    stroke-dasharray: 3 3;
  }}
  .key.special {{
    fill: #2d1b4e;
    stroke: #e94560;
    stroke-width: 2;
  }}
  .key.modifier {{
    fill: #1b2e4e;
    stroke: #53a8b6;
  }}
  .label {{
    fill: #eee;
    font-family: "JetBrains Mono", "Fira Code", monospace;
    font-size: 13px;
    text-anchor: middle;
    dominant-baseline: middle;
    pointer-events: none;
  }}
  .label.small {{
    font-size: 10px;
  }}
  .label.shifted {{
    fill: #e9a045;
    font-size: 11px;
  }}
  .index {{
    fill: #777;
    font-size: 12px;
    text-anchor: middle;
    dominant-baseline: middle;
  }}
  .title {{
    fill: #e94560;
    font-size: 16px;
    font-weight: bold;
  }}
</style>
</head>
<body>
<svg width="{total_width}" height="{total_height}" xmlns="http://www.w3.org/2000/svg">
"#
    );

    html.push_str(&render_matrix(layout));
    html.push_str("\n</svg>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use c64key_core::layouts;

    #[test]
    fn draws_every_cell() {
        let layout = Layout::new(layouts::C64_US).unwrap();
        let html = generate_html(&layout);
        assert_eq!(html.matches("<rect").count(), ROWS * COLS);
        assert!(html.contains("Layout c64-us"));
    }

    #[test]
    fn special_keys_show_both_branches() {
        let layout = Layout::new(layouts::C64_US).unwrap();
        let html = generate_html(&layout);
        // INST/DEL: backspace unshifted, delete (clearing shift) shifted.
        assert!(html.contains(r#"class="label shifted">Del*</text>"#));
        assert!(html.contains(r#"class="label">Bksp</text>"#));
    }

    #[test]
    fn escapes_labels() {
        assert_eq!(html_escape("<&>"), "&lt;&amp;&gt;");
    }
}
