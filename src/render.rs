use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::ir::{Diagram, EdgeOffset, NodeContent, Position, SclEdge, SclNode};
use crate::theme::Theme;
use log::debug;
use std::path::Path;

const CANVAS_PADDING: f32 = 40.0;
const ACTION_GAP: f32 = 20.0;
const ACTION_ROW_HEIGHT: f32 = 24.0;
const ACTION_MIN_WIDTH: f32 = 120.0;
const CONDITION_GAP: f32 = 12.0;
const TRANSITION_BAR_HEIGHT: f32 = 6.0;
const EDGE_CLEARANCE: f32 = 20.0;
const ALIGN_TOLERANCE: f32 = 5.0;

pub fn render_svg(diagram: &Diagram, theme: &Theme) -> String {
    let (min_x, min_y, max_x, max_y) = diagram_bounds(diagram, theme);
    let width = (max_x - min_x).max(200.0);
    let height = (max_y - min_y).max(200.0);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"{min_x:.2} {min_y:.2} {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect x=\"{min_x:.2}\" y=\"{min_y:.2}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrowclosed\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"8\" markerHeight=\"8\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.line_color
    ));
    svg.push_str("</defs>");

    for edge in &diagram.edges {
        let (Some(source), Some(target)) = (diagram.node(&edge.source), diagram.node(&edge.target)) else {
            debug!(edge = edge.id.as_str(); "skipping edge with undeclared endpoint");
            continue;
        };
        svg.push_str(&edge_svg(edge, source, target, theme));
    }

    for node in &diagram.nodes {
        match &node.content {
            NodeContent::Step { label, actions } => {
                svg.push_str(&step_svg(node, label, actions, theme));
            }
            NodeContent::Transition { label, condition } => {
                svg.push_str(&transition_svg(node, label, condition, theme));
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Polyline of an edge from the source's bottom-center to the target's
/// top-center. Misaligned endpoints route orthogonally through two
/// horizontal runs and one vertical run, each shifted by the stored offsets.
pub fn edge_path_points(source: (f32, f32), target: (f32, f32), offset: &EdgeOffset) -> Vec<(f32, f32)> {
    let (sx, sy) = source;
    let (tx, ty) = target;
    if (sx - tx).abs() <= ALIGN_TOLERANCE {
        return vec![source, target];
    }
    let y1 = sy + EDGE_CLEARANCE + offset.offset_y1;
    let y2 = ty - EDGE_CLEARANCE + offset.offset_y2;
    let vx = sx + offset.offset_x;
    vec![(sx, sy), (sx, y1), (vx, y1), (vx, y2), (tx, y2), (tx, ty)]
}

fn edge_svg(edge: &SclEdge, source: &SclNode, target: &SclNode, theme: &Theme) -> String {
    let start = (source.position.x + source.width / 2.0, source.position.y + source.height);
    let end = (target.position.x + target.width / 2.0, target.position.y);
    let d = points_to_path(&edge_path_points(start, end, &edge.offset));
    let dash = edge
        .style
        .stroke_dasharray
        .as_deref()
        .map(|value| format!(" stroke-dasharray=\"{}\"", escape_xml(value)))
        .unwrap_or_default();
    format!(
        "<path id=\"{}\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"{} marker-end=\"url(#arrowclosed)\"/>",
        escape_xml(&edge.id),
        d,
        theme.line_color,
        dash
    )
}

fn step_svg(node: &SclNode, label: &str, actions: &[String], theme: &Theme) -> String {
    let Position { x, y } = node.position;
    let mut out = format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\"/>",
        node.width, node.height, theme.step_fill, theme.step_border
    );
    out.push_str(&text_svg(
        x + node.width / 2.0,
        y + node.height / 2.0,
        "middle",
        label,
        theme,
    ));

    if actions.is_empty() {
        return out;
    }
    let box_x = x + node.width + ACTION_GAP;
    let box_width = action_box_width(actions, theme);
    let box_height = actions.len() as f32 * ACTION_ROW_HEIGHT + 8.0;
    let connector_y = y + ACTION_ROW_HEIGHT / 2.0 + 4.0;
    out.push_str(&format!(
        "<line x1=\"{:.2}\" y1=\"{connector_y:.2}\" x2=\"{box_x:.2}\" y2=\"{connector_y:.2}\" stroke=\"{}\" stroke-width=\"1.5\"/>",
        x + node.width,
        theme.action_border
    ));
    out.push_str(&format!(
        "<rect x=\"{box_x:.2}\" y=\"{y:.2}\" width=\"{box_width:.2}\" height=\"{box_height:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.5\"/>",
        theme.action_fill, theme.action_border
    ));
    for (idx, action) in actions.iter().enumerate() {
        let row_y = y + 4.0 + ACTION_ROW_HEIGHT * (idx as f32 + 0.5);
        out.push_str(&text_svg(box_x + 8.0, row_y, "start", action, theme));
    }
    out
}

fn transition_svg(node: &SclNode, label: &str, condition: &str, theme: &Theme) -> String {
    let Position { x, y } = node.position;
    let center_y = y + node.height / 2.0;
    let mut out = format!(
        "<line x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"1.5\"/>",
        x + node.width / 2.0,
        x + node.width / 2.0,
        y + node.height,
        theme.line_color
    );
    out.push_str(&format!(
        "<rect x=\"{x:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{TRANSITION_BAR_HEIGHT:.2}\" fill=\"{}\"/>",
        center_y - TRANSITION_BAR_HEIGHT / 2.0,
        node.width,
        theme.transition_fill
    ));
    if condition.is_empty() {
        return out;
    }
    out.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{center_y:.2}\" text-anchor=\"start\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\"><tspan opacity=\"{}\">({})</tspan> {}</text>",
        x + node.width + CONDITION_GAP,
        theme.font_family,
        theme.font_size,
        theme.condition_color,
        theme.label_muted_opacity,
        escape_xml(label),
        escape_xml(condition)
    ));
    out
}

fn text_svg(x: f32, y: f32, anchor: &str, text: &str, theme: &Theme) -> String {
    format!(
        "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{anchor}\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        theme.font_family,
        theme.font_size,
        theme.text_color,
        escape_xml(text)
    )
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    let mut d = String::new();
    for (idx, (x, y)) in points.iter().enumerate() {
        if idx > 0 {
            d.push(' ');
        }
        let command = if idx == 0 { 'M' } else { 'L' };
        d.push_str(&format!("{command} {x:.2} {y:.2}"));
    }
    d
}

fn approx_text_width(text: &str, theme: &Theme) -> f32 {
    text.chars().count() as f32 * theme.font_size * 0.6
}

fn action_box_width(actions: &[String], theme: &Theme) -> f32 {
    actions
        .iter()
        .map(|action| approx_text_width(action, theme) + 16.0)
        .fold(ACTION_MIN_WIDTH, f32::max)
}

fn diagram_bounds(diagram: &Diagram, theme: &Theme) -> (f32, f32, f32, f32) {
    if diagram.nodes.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for node in &diagram.nodes {
        let Position { x, y } = node.position;
        let mut right = x + node.width;
        let mut bottom = y + node.height;
        match &node.content {
            NodeContent::Step { actions, .. } if !actions.is_empty() => {
                right += ACTION_GAP + action_box_width(actions, theme);
                bottom = bottom.max(y + actions.len() as f32 * ACTION_ROW_HEIGHT + 8.0);
            }
            NodeContent::Transition { label, condition } if !condition.is_empty() => {
                let text = format!("({label}) {condition}");
                right += CONDITION_GAP + approx_text_width(&text, theme);
            }
            _ => {}
        }
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(right);
        max_y = max_y.max(bottom);
    }
    (
        min_x - CANVAS_PADDING,
        min_y - CANVAS_PADDING,
        max_x + CANVAS_PADDING,
        max_y + CANVAS_PADDING,
    )
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
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|err| Error::Png(err.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| Error::Png("failed to allocate pixmap".to_string()))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output).map_err(|err| Error::Png(err.to_string()))?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    Err(Error::Png("built without the `png` feature".to_string()))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
