use crate::config::{LayoutConfig, RenderConfig};
use crate::layout::{EdgeLayout, Layout, NodeLayout, TreeLayout};
use crate::theme::{Rgb, Theme};
use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;

pub fn render_svg(
    layout: &Layout,
    theme: &Theme,
    config: &LayoutConfig,
    render: &RenderConfig,
) -> String {
    let mut svg = String::new();
    let pad = render.padding;
    let width = (layout.width + pad * 2.0).max(200.0);
    let height = (layout.height + pad * 2.0).max(200.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&render.background)
    ));

    let arrow_colors: BTreeSet<String> = layout.edges.iter().map(|edge| edge.color.to_hex()).collect();
    svg.push_str("<defs>");
    for hex in &arrow_colors {
        svg.push_str(&format!(
            "<marker id=\"{}\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{hex}\"/></marker>",
            marker_id(hex)
        ));
    }
    svg.push_str("</defs>");

    if render.show_bands {
        for tree in &layout.trees {
            svg.push_str(&band_svg(tree, theme, config, pad, width));
        }
    }

    for edge in &layout.edges {
        svg.push_str(&edge_svg(edge, theme, config, pad));
    }

    for node in &layout.nodes {
        svg.push_str(&node_svg(node, theme, pad));
    }

    svg.push_str("</svg>");
    svg
}

fn marker_id(hex: &str) -> String {
    format!("arrow-{}", hex.trim_start_matches('#'))
}

fn band_svg(tree: &TreeLayout, theme: &Theme, config: &LayoutConfig, pad: f32, width: f32) -> String {
    if tree.width == 0 {
        return String::new();
    }
    let y = pad + tree.start_y as f32 * config.lane_step() - config.margin_y / 2.0;
    let height = tree.width as f32 * config.lane_step();
    let mut out = format!(
        "<rect x=\"0\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{}\" fill-opacity=\"{:.3}\"/>",
        tree.color.to_hex(),
        theme.band_opacity
    );
    if !tree.is_orphans {
        out.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\" fill-opacity=\"0.5\">{}</text>",
            pad / 2.0,
            y + theme.font_size,
            escape_xml(&theme.font_family),
            theme.font_size * 0.85,
            tree.color.to_hex(),
            escape_xml(&tree.name)
        ));
    }
    out
}

fn edge_svg(edge: &EdgeLayout, theme: &Theme, config: &LayoutConfig, pad: f32) -> String {
    let start = (edge.start.0 + pad, edge.start.1 + pad);
    let end = (edge.end.0 + pad, edge.end.1 + pad);
    let hex = edge.color.to_hex();
    format!(
        "<path d=\"{}\" fill=\"none\" stroke=\"{hex}\" stroke-width=\"{}\" marker-end=\"url(#{})\"/>",
        connector_path(start, end, config.margin_x),
        theme.connector_width,
        marker_id(&hex)
    )
}

fn node_svg(node: &NodeLayout, theme: &Theme, pad: f32) -> String {
    let x = node.x + pad;
    let y = node.y + pad;
    let fill_opacity = if node.finished {
        (theme.node_fill_opacity * 2.0).min(1.0)
    } else {
        theme.node_fill_opacity
    };
    let mut out = format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"6\" ry=\"6\" fill=\"{}\" fill-opacity=\"{fill_opacity:.3}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        node.width,
        node.height,
        node.color.to_hex(),
        stroke_color(node.color, node.finished).to_hex(),
        theme.node_stroke_width
    );
    out.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        x + node.width / 2.0,
        y + node.height / 2.0,
        escape_xml(&theme.font_family),
        theme.font_size,
        theme.text_color,
        escape_xml(&node.label)
    ));
    out
}

fn stroke_color(color: Rgb, finished: bool) -> Rgb {
    if finished { color } else { color.greyed() }
}

/// SVG path between two anchors. Anchors on the same row (within 0.1) get a
/// straight line; otherwise the path runs a quarter of `margin_x` to the
/// right, turns through two quarter circles joined by a vertical run, and
/// leads out horizontally into the right-hand anchor.
pub fn connector_path(a: (f32, f32), b: (f32, f32), margin_x: f32) -> String {
    let (left, right) = if a.0 <= b.0 { (a, b) } else { (b, a) };
    let dy = right.1 - left.1;
    if dy.abs() < 0.1 {
        return format!(
            "M {:.2} {:.2} L {:.2} {:.2}",
            left.0, left.1, right.0, right.1
        );
    }

    let r = (margin_x / 4.0).min(dy.abs() / 2.0).max(0.0);
    let dir = dy.signum();
    let (first_sweep, second_sweep) = if dy > 0.0 { (1, 0) } else { (0, 1) };
    let bend_x = left.0 + r * 2.0;

    let mut d = format!("M {:.2} {:.2}", left.0, left.1);
    d.push_str(&format!(" L {:.2} {:.2}", left.0 + r, left.1));
    d.push_str(&format!(
        " A {r:.2} {r:.2} 0 0 {first_sweep} {:.2} {:.2}",
        bend_x,
        left.1 + dir * r
    ));
    d.push_str(&format!(" L {:.2} {:.2}", bend_x, right.1 - dir * r));
    d.push_str(&format!(
        " A {r:.2} {r:.2} 0 0 {second_sweep} {:.2} {:.2}",
        bend_x + r,
        right.1
    ));
    d.push_str(&format!(" L {:.2} {:.2}", right.0, right.1));
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|family| family.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| "sans-serif".to_string());
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
