//! Pan/zoom viewport transform.
//!
//! Screen space is the host element's pixel space; canvas space is where
//! nodes live. `screen = canvas * scale + offset`.
//!
//! Locking the viewport freezes pan and zoom only. Node dragging and
//! connection drawing keep working while locked.

use crate::config::CanvasConfig;
use crate::model::{LayerNode, Point};
use serde::{Deserialize, Serialize};

/// The current offset/scale pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        offset_x: 0.0,
        offset_y: 0.0,
        scale: 1.0,
    };
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Axis-aligned bounds of a node set, already padded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl ViewBounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    fn sign(self) -> f32 {
        match self {
            ZoomDirection::In => 1.0,
            ZoomDirection::Out => -1.0,
        }
    }
}

/// Anchor recorded by `start_pan`.
#[derive(Debug, Clone, Copy)]
struct PanAnchor {
    pointer: Point,
    offset_x: f32,
    offset_y: f32,
}

/// Owns the transform and all operations that mutate it.
#[derive(Debug, Clone)]
pub struct Viewport {
    transform: Transform,
    config: CanvasConfig,
    locked: bool,
    pan_anchor: Option<PanAnchor>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Viewport {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            transform: Transform::IDENTITY,
            config,
            locked: false,
            pan_anchor: None,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn scale(&self) -> f32 {
        self.transform.scale
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Zoom level as a rounded percentage, for the zoom indicator.
    pub fn zoom_percent(&self) -> u32 {
        (self.transform.scale * 100.0).round() as u32
    }

    // ─── Coordinate conversion ───────────────────────────────────────────

    pub fn screen_to_canvas(&self, sx: f32, sy: f32) -> Point {
        let t = &self.transform;
        Point::new((sx - t.offset_x) / t.scale, (sy - t.offset_y) / t.scale)
    }

    pub fn canvas_to_screen(&self, cx: f32, cy: f32) -> Point {
        let t = &self.transform;
        Point::new(cx * t.scale + t.offset_x, cy * t.scale + t.offset_y)
    }

    // ─── Lock ────────────────────────────────────────────────────────────

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
        if locked {
            self.pan_anchor = None;
        }
    }

    // ─── Mutations (all no-ops while locked) ─────────────────────────────

    // `max`/`min` rather than `clamp`: an unvalidated config must not panic.
    fn clamp_scale(&self, scale: f32) -> f32 {
        scale.max(self.config.min_scale).min(self.config.max_scale)
    }

    /// Replace the transform; the scale is clamped to the configured range.
    pub fn set_transform(&mut self, transform: Transform) {
        if self.locked {
            return;
        }
        self.transform = Transform {
            scale: self.clamp_scale(transform.scale),
            ..transform
        };
    }

    /// Step the scale in `direction`. With a `center` (screen space), the
    /// canvas point under it stays put. Returns whether anything changed.
    pub fn zoom(&mut self, direction: ZoomDirection, center: Option<Point>) -> bool {
        if self.locked {
            return false;
        }
        let old = self.transform.scale;
        let new = self.clamp_scale(old + direction.sign() * self.config.scale_step);
        if new == old {
            return false;
        }

        if let Some(c) = center {
            let ratio = new / old;
            self.transform.offset_x = c.x - (c.x - self.transform.offset_x) * ratio;
            self.transform.offset_y = c.y - (c.y - self.transform.offset_y) * ratio;
        }
        self.transform.scale = new;
        log::trace!("zoom {direction:?} -> {new}");
        true
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        if self.locked {
            return;
        }
        self.transform.offset_x += dx * self.config.pan_sensitivity;
        self.transform.offset_y += dy * self.config.pan_sensitivity;
    }

    pub fn reset_view(&mut self) {
        if self.locked {
            return;
        }
        self.transform = Transform::IDENTITY;
    }

    /// Padded bounds of `nodes`, or `None` for an empty set.
    pub fn bounds_of<'a>(
        &self,
        nodes: impl IntoIterator<Item = &'a LayerNode>,
    ) -> Option<ViewBounds> {
        let mut nodes = nodes.into_iter().peekable();
        nodes.peek()?;

        let mut b = ViewBounds {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        };
        for node in nodes {
            b.min_x = b.min_x.min(node.x);
            b.min_y = b.min_y.min(node.y);
            b.max_x = b.max_x.max(node.x + node.width);
            b.max_y = b.max_y.max(node.y + node.height);
        }

        let pad = self.config.fit_padding;
        b.min_x -= pad;
        b.min_y -= pad;
        b.max_x += pad;
        b.max_y += pad;
        Some(b)
    }

    /// Frame every node inside a `width`×`height` viewport.
    pub fn fit_view<'a>(
        &mut self,
        nodes: impl IntoIterator<Item = &'a LayerNode>,
        width: f32,
        height: f32,
    ) -> bool {
        if self.locked {
            return false;
        }
        let Some(bounds) = self.bounds_of(nodes) else {
            return false;
        };

        let fit = (width / bounds.width()).min(height / bounds.height());
        let scale = self.clamp_scale(fit * self.config.fit_margin);
        let center = bounds.center();
        self.transform = Transform {
            offset_x: width / 2.0 - center.x * scale,
            offset_y: height / 2.0 - center.y * scale,
            scale,
        };
        true
    }

    // ─── Pan gesture ─────────────────────────────────────────────────────

    /// Record the pan anchor. Returns `false` (and records nothing) when locked.
    pub fn start_pan(&mut self, x: f32, y: f32) -> bool {
        if self.locked {
            return false;
        }
        self.pan_anchor = Some(PanAnchor {
            pointer: Point::new(x, y),
            offset_x: self.transform.offset_x,
            offset_y: self.transform.offset_y,
        });
        true
    }

    /// Offset = anchor offset + total pointer delta, so repeated moves never drift.
    pub fn update_pan(&mut self, x: f32, y: f32) {
        if self.locked {
            return;
        }
        if let Some(anchor) = self.pan_anchor {
            self.transform.offset_x = anchor.offset_x + (x - anchor.pointer.x);
            self.transform.offset_y = anchor.offset_y + (y - anchor.pointer.y);
        }
    }

    pub fn end_pan(&mut self) {
        self.pan_anchor = None;
    }

    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use pretty_assertions::assert_eq;

    fn node_at(name: &str, x: f32, y: f32) -> LayerNode {
        LayerNode {
            id: NodeId::intern(name),
            layer_type: "Linear".into(),
            label: "Linear".into(),
            x,
            y,
            width: 100.0,
            height: 100.0,
            icon_name: String::new(),
            color: String::new(),
            params: Default::default(),
            input_shape: String::new(),
            output_shape: String::new(),
        }
    }

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn screen_canvas_roundtrip() {
        let mut vp = Viewport::default();
        vp.set_transform(Transform {
            offset_x: 37.5,
            offset_y: -120.0,
            scale: 1.7,
        });
        for &(x, y) in &[(0.0, 0.0), (13.0, -42.5), (1e4, 3e3), (-0.25, 999.0)] {
            let screen = vp.canvas_to_screen(x, y);
            let back = vp.screen_to_canvas(screen.x, screen.y);
            assert!(approx(back, Point::new(x, y)), "{x},{y} -> {back:?}");
        }
    }

    #[test]
    fn zoom_in_converges_to_max_scale() {
        let mut vp = Viewport::default();
        for _ in 0..40 {
            vp.zoom(ZoomDirection::In, None);
        }
        assert_eq!(vp.scale(), 3.0);
        assert!(!vp.zoom(ZoomDirection::In, None));
        assert_eq!(vp.scale(), 3.0);
    }

    #[test]
    fn zoom_out_stops_at_min_scale() {
        let mut vp = Viewport::default();
        for _ in 0..40 {
            vp.zoom(ZoomDirection::Out, None);
        }
        assert_eq!(vp.scale(), 0.1);
    }

    #[test]
    fn zoom_keeps_center_fixed() {
        let mut vp = Viewport::default();
        let center = Point::new(400.0, 300.0);
        let before = vp.screen_to_canvas(center.x, center.y);
        vp.zoom(ZoomDirection::In, Some(center));
        let after = vp.screen_to_canvas(center.x, center.y);
        assert!(approx(before, after));
        assert!((vp.scale() - 1.1).abs() < 1e-6);
    }

    #[test]
    fn locked_viewport_ignores_mutations() {
        let mut vp = Viewport::default();
        vp.set_locked(true);
        assert!(!vp.zoom(ZoomDirection::In, None));
        vp.pan(10.0, 10.0);
        assert!(!vp.start_pan(0.0, 0.0));
        vp.update_pan(50.0, 50.0);
        assert!(!vp.fit_view(&[node_at("locked", 0.0, 0.0)], 800.0, 600.0));
        assert_eq!(vp.transform(), Transform::IDENTITY);
    }

    #[test]
    fn pan_applies_sensitivity() {
        let mut vp = Viewport::new(CanvasConfig {
            pan_sensitivity: 2.0,
            ..CanvasConfig::default()
        });
        vp.pan(5.0, -3.0);
        assert_eq!(vp.transform().offset_x, 10.0);
        assert_eq!(vp.transform().offset_y, -6.0);
    }

    #[test]
    fn pan_gesture_is_anchored() {
        let mut vp = Viewport::default();
        vp.pan(10.0, 20.0);
        assert!(vp.start_pan(100.0, 100.0));
        vp.update_pan(150.0, 90.0);
        vp.update_pan(130.0, 130.0);
        assert_eq!(vp.transform().offset_x, 40.0);
        assert_eq!(vp.transform().offset_y, 50.0);
        vp.end_pan();
        assert!(!vp.is_panning());
        vp.update_pan(0.0, 0.0);
        assert_eq!(vp.transform().offset_x, 40.0);
    }

    #[test]
    fn fit_view_centers_content() {
        let mut vp = Viewport::default();
        let nodes = [node_at("fit_a", 0.0, 0.0), node_at("fit_b", 300.0, 100.0)];
        assert!(vp.fit_view(&nodes, 800.0, 600.0));

        // bounds: (-100,-100)..(500,300) → 600×400, center (200,100)
        let scale = (800.0_f32 / 600.0).min(600.0 / 400.0) * 0.9;
        assert!((vp.scale() - scale).abs() < 1e-5);
        let c = vp.canvas_to_screen(200.0, 100.0);
        assert!(approx(c, Point::new(400.0, 300.0)));
    }

    #[test]
    fn fit_view_on_empty_set_is_noop() {
        let mut vp = Viewport::default();
        vp.pan(3.0, 4.0);
        let before = vp.transform();
        assert!(!vp.fit_view(std::iter::empty(), 800.0, 600.0));
        assert_eq!(vp.transform(), before);
    }

    #[test]
    fn reset_view_restores_identity() {
        let mut vp = Viewport::default();
        vp.zoom(ZoomDirection::In, Some(Point::new(10.0, 10.0)));
        vp.reset_view();
        assert_eq!(vp.transform(), Transform::IDENTITY);
        assert_eq!(vp.zoom_percent(), 100);
    }
}
