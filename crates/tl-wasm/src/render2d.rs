//! Canvas2D software renderer.
//!
//! Draws the layer graph to an HTML `<canvas>` via `CanvasRenderingContext2d`.
//! Connection geometry comes from `tl_render::curve`, so the browser and the
//! Vello painter agree on every curve, arrowhead, and delete target.

use kurbo::{BezPath, PathEl};
use tl_core::graph::Graph;
use tl_core::model::{Connection, LayerNode, PointKind};
use tl_core::viewport::Transform;
use tl_render::curve::{ConnectionCurve, DELETE_HOVER_GROWTH, DELETE_RADIUS};
use tl_render::paint::Overlay;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

/// Colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub node_fill: &'static str,
    pub node_border: &'static str,
    pub node_selected: &'static str,
    pub node_label: &'static str,
    pub node_shape: &'static str,
    pub input_dot: &'static str,
    pub output_dot: &'static str,
    pub line: &'static str,
    pub line_hover: &'static str,
    pub line_deleting: &'static str,
    pub flow: &'static str,
    pub indicator_bg: &'static str,
    pub indicator_text: &'static str,
}

impl Default for CanvasTheme {
    fn default() -> Self {
        Self {
            bg: "#F9FAFB",
            grid: "#D1D5DB",
            node_fill: "#FFFFFF",
            node_border: "#E5E7EB",
            node_selected: "#3B82F6",
            node_label: "#111827",
            node_shape: "#6B7280",
            input_dot: "#3B82F6",
            output_dot: "#22C55E",
            line: "#6B7280",
            line_hover: "#EF4444",
            line_deleting: "#DFD1D1",
            flow: "#3B82F6",
            indicator_bg: "rgba(255, 255, 255, 0.9)",
            indicator_text: "#374151",
        }
    }
}

const GRID_SPACING: f64 = 20.0;
const NODE_RADIUS: f64 = 8.0;
const DOT_RADIUS: f64 = 6.0;

/// Render the whole canvas.
#[allow(clippy::too_many_arguments)]
pub fn render_canvas(
    ctx: &CanvasRenderingContext2d,
    graph: &Graph,
    transform: Transform,
    overlay: &Overlay,
    canvas_width: f64,
    canvas_height: f64,
    show_grid: bool,
    theme: &CanvasTheme,
) {
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);
    if show_grid {
        draw_grid(ctx, transform, canvas_width, canvas_height, theme);
    }

    ctx.save();
    let (s, ox, oy) = (
        transform.scale as f64,
        transform.offset_x as f64,
        transform.offset_y as f64,
    );
    let _ = ctx.set_transform(s, 0.0, 0.0, s, ox, oy);

    for conn in graph.connections() {
        let hovered = overlay.hovered_connection == Some(conn.id);
        draw_connection(ctx, conn, hovered, theme);
    }
    for node in graph.nodes() {
        draw_node(ctx, node, overlay.selected == Some(node.id), theme);
    }
    if let Some((from, to)) = overlay.temp_connection {
        let curve = ConnectionCurve::between(from, to);
        ctx.set_stroke_style_str(theme.node_selected);
        ctx.set_line_width(2.0);
        set_dash(ctx, &[8.0, 4.0]);
        trace(ctx, &curve.to_path());
        ctx.stroke();
        set_dash(ctx, &[]);
    }

    ctx.restore();
    if let Some(label) = zoom_label(transform) {
        draw_zoom_indicator(ctx, &label, canvas_width, canvas_height, theme);
    }
}

// ─── Background ──────────────────────────────────────────────────────────

/// Dot grid that pans and scales with the canvas.
fn draw_grid(
    ctx: &CanvasRenderingContext2d,
    t: Transform,
    width: f64,
    height: f64,
    theme: &CanvasTheme,
) {
    let spacing = GRID_SPACING * t.scale as f64;
    if spacing < 4.0 {
        return;
    }
    ctx.set_fill_style_str(theme.grid);
    let mut x = (t.offset_x as f64).rem_euclid(spacing);
    while x < width {
        let mut y = (t.offset_y as f64).rem_euclid(spacing);
        while y < height {
            ctx.fill_rect(x, y, 1.0, 1.0);
            y += spacing;
        }
        x += spacing;
    }
}

/// Zoom indicator text, or `None` at 100% where it is hidden.
fn zoom_label(t: Transform) -> Option<String> {
    let percent = (t.scale * 100.0).round() as u32;
    (percent != 100).then(|| format!("{percent}%"))
}

fn draw_zoom_indicator(
    ctx: &CanvasRenderingContext2d,
    label: &str,
    width: f64,
    height: f64,
    theme: &CanvasTheme,
) {
    let (w, h) = (56.0, 24.0);
    let (x, y) = (width - w - 12.0, height - h - 12.0);

    ctx.save();
    ctx.set_fill_style_str(theme.indicator_bg);
    rounded_rect_path(ctx, x, y, w, h, 6.0);
    ctx.fill();
    ctx.set_font("12px Inter, system-ui, sans-serif");
    ctx.set_fill_style_str(theme.indicator_text);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(label, x + w / 2.0, y + h / 2.0);
    ctx.restore();
}

// ─── Nodes ───────────────────────────────────────────────────────────────

fn draw_node(
    ctx: &CanvasRenderingContext2d,
    node: &LayerNode,
    selected: bool,
    theme: &CanvasTheme,
) {
    let (x, y, w, h) = (
        node.x as f64,
        node.y as f64,
        node.width as f64,
        node.height as f64,
    );

    ctx.save();
    ctx.set_shadow_color("rgba(0, 0, 0, 0.08)");
    ctx.set_shadow_blur(6.0);
    ctx.set_shadow_offset_y(2.0);
    rounded_rect_path(ctx, x, y, w, h, NODE_RADIUS);
    ctx.set_fill_style_str(theme.node_fill);
    ctx.fill();
    ctx.restore();

    if selected {
        ctx.set_stroke_style_str(theme.node_selected);
        ctx.set_line_width(2.0);
    } else {
        ctx.set_stroke_style_str(theme.node_border);
        ctx.set_line_width(1.0);
    }
    rounded_rect_path(ctx, x, y, w, h, NODE_RADIUS);
    ctx.stroke();

    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_font("600 13px Inter, system-ui, sans-serif");
    ctx.set_fill_style_str(theme.node_label);
    let _ = ctx.fill_text(&node.label, x + w / 2.0, y + h / 2.0 - 8.0);
    if !node.output_shape.is_empty() {
        ctx.set_font("10px ui-monospace, monospace");
        ctx.set_fill_style_str(theme.node_shape);
        let _ = ctx.fill_text(&node.output_shape, x + w / 2.0, y + h / 2.0 + 12.0);
    }

    for kind in [PointKind::Input, PointKind::Output] {
        let p = node.anchor(kind);
        ctx.begin_path();
        let _ = ctx.arc(p.x as f64, p.y as f64, DOT_RADIUS, 0.0, std::f64::consts::TAU);
        ctx.set_fill_style_str(match kind {
            PointKind::Input => theme.input_dot,
            PointKind::Output => theme.output_dot,
        });
        ctx.fill();
        ctx.set_stroke_style_str(theme.node_fill);
        ctx.set_line_width(2.0);
        ctx.stroke();
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

fn draw_connection(
    ctx: &CanvasRenderingContext2d,
    conn: &Connection,
    hovered: bool,
    theme: &CanvasTheme,
) {
    let curve = ConnectionCurve::for_connection(conn);
    let color = if conn.is_deleting {
        theme.line_deleting
    } else if hovered {
        theme.line_hover
    } else {
        theme.line
    };
    let path = curve.to_path();

    ctx.save();
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(if hovered { 3.0 } else { 2.0 });
    if conn.is_animating {
        set_dash(ctx, &[5.0, 5.0]);
    }
    trace(ctx, &path);
    ctx.stroke();
    set_dash(ctx, &[]);

    if !conn.is_deleting && curve.progress >= 1.0 {
        let grad = ctx.create_linear_gradient(curve.from.x, curve.from.y, curve.to.x, curve.to.y);
        let _ = grad.add_color_stop(0.0, "rgba(59, 130, 246, 0)");
        let _ = grad.add_color_stop(0.5, theme.flow);
        let _ = grad.add_color_stop(1.0, "rgba(59, 130, 246, 0)");
        ctx.set_stroke_style_canvas_gradient(&grad);
        ctx.set_global_alpha(0.6);
        trace(ctx, &path);
        ctx.stroke();
        ctx.set_global_alpha(1.0);
    }

    if curve.shows_arrowhead() {
        ctx.set_fill_style_str(color);
        trace(ctx, &curve.arrowhead());
        ctx.fill();
    }

    let radius = if hovered {
        DELETE_RADIUS + DELETE_HOVER_GROWTH
    } else {
        DELETE_RADIUS
    };
    if (hovered || conn.is_deleting) && let Some(target) = curve.delete_target(radius) {
        let c = target.center;
        ctx.begin_path();
        let _ = ctx.arc(c.x, c.y, target.radius, 0.0, std::f64::consts::TAU);
        ctx.set_fill_style_str(if conn.is_deleting {
            theme.line_deleting
        } else {
            theme.node_fill
        });
        ctx.fill();
        ctx.set_stroke_style_str(color);
        ctx.set_line_width(2.0);
        ctx.stroke();

        ctx.set_font("bold 12px Inter, system-ui, sans-serif");
        ctx.set_fill_style_str(color);
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        let _ = ctx.fill_text("×", c.x, c.y);
    }
    ctx.restore();
}

// ─── Helpers ─────────────────────────────────────────────────────────────

/// Replay a kurbo path onto the context as the current path.
fn trace(ctx: &CanvasRenderingContext2d, path: &BezPath) {
    ctx.begin_path();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathEl::LineTo(p) => ctx.line_to(p.x, p.y),
            PathEl::QuadTo(c, p) => ctx.quadratic_curve_to(c.x, c.y, p.x, p.y),
            PathEl::CurveTo(c1, c2, p) => ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathEl::ClosePath => ctx.close_path(),
        }
    }
}

fn set_dash(ctx: &CanvasRenderingContext2d, segments: &[f64]) {
    let array = js_sys::Array::new();
    for s in segments {
        array.push(&JsValue::from_f64(*s));
    }
    let _ = ctx.set_line_dash(&array);
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}
