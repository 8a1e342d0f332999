//! Connection curve geometry.
//!
//! Every connection is drawn as one quadratic Bézier. The control point sits
//! halfway along x and bulges downward by half the vertical distance, which
//! gives top-to-bottom flows their characteristic sag. While a connection
//! animates, its far end is pulled back toward the source by `progress`.

use kurbo::{BezPath, Circle, ParamCurve, Point as KPoint, QuadBez, Vec2};
use tl_core::model::{Connection, Point};

/// Progress past which the delete target appears.
pub const DELETE_TARGET_THRESHOLD: f32 = 0.5;
/// Progress past which the arrowhead is drawn.
pub const ARROWHEAD_THRESHOLD: f32 = 0.8;

/// Radius of a drawn delete target, and how much it grows while hovered.
pub const DELETE_RADIUS: f32 = 8.0;
pub const DELETE_HOVER_GROWTH: f32 = 2.0;

pub const ARROW_LENGTH: f64 = 10.0;
pub const ARROW_HALF_WIDTH: f64 = 3.5;

fn kp(p: Point) -> KPoint {
    KPoint::new(p.x as f64, p.y as f64)
}

/// Control point for a curve from `from` to `to`.
pub fn control_point(from: KPoint, to: KPoint) -> KPoint {
    KPoint::new((from.x + to.x) / 2.0, from.y + (to.y - from.y).abs() * 0.5)
}

/// Resolved geometry of one connection at its current progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionCurve {
    pub from: KPoint,
    pub control: KPoint,
    /// The animated end point (equal to the target anchor when settled).
    pub to: KPoint,
    pub progress: f32,
}

impl ConnectionCurve {
    /// A fully drawn curve, as used for the in-progress connection line.
    pub fn between(from: Point, to: Point) -> Self {
        let (from, to) = (kp(from), kp(to));
        Self {
            from,
            control: control_point(from, to),
            to,
            progress: 1.0,
        }
    }

    pub fn for_connection(conn: &Connection) -> Self {
        let p = conn.animation_progress.clamp(0.0, 1.0);
        let from = kp(conn.start());
        let target = kp(conn.end());
        let to = from.lerp(target, p as f64);
        Self {
            from,
            control: control_point(from, to),
            to,
            progress: p,
        }
    }

    pub fn quad(&self) -> QuadBez {
        QuadBez::new(self.from, self.control, self.to)
    }

    /// The curve point at t = 0.5: `0.25·from + 0.5·control + 0.25·to`.
    pub fn midpoint(&self) -> KPoint {
        self.quad().eval(0.5)
    }

    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.from);
        path.quad_to(self.control, self.to);
        path
    }

    pub fn shows_arrowhead(&self) -> bool {
        self.progress > ARROWHEAD_THRESHOLD
    }

    pub fn shows_delete_target(&self) -> bool {
        self.progress > DELETE_TARGET_THRESHOLD
    }

    /// Unit tangent at the end of the curve.
    pub fn end_direction(&self) -> Vec2 {
        let d = self.to - self.control;
        if d.hypot() > f64::EPSILON {
            d.normalize()
        } else {
            Vec2::new(0.0, 1.0)
        }
    }

    /// Closed triangle whose tip sits on the curve's end point.
    pub fn arrowhead(&self) -> BezPath {
        let dir = self.end_direction();
        let normal = Vec2::new(-dir.y, dir.x);
        let base = self.to - dir * ARROW_LENGTH;
        let mut path = BezPath::new();
        path.move_to(self.to);
        path.line_to(base + normal * ARROW_HALF_WIDTH);
        path.line_to(base - normal * ARROW_HALF_WIDTH);
        path.close_path();
        path
    }

    /// The circular delete target, once the connection is drawn far enough.
    pub fn delete_target(&self, radius: f32) -> Option<Circle> {
        self.shows_delete_target()
            .then(|| Circle::new(self.midpoint(), radius as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tl_core::id::{ConnectionId, NodeId};

    fn conn(from: Point, to: Point, progress: f32) -> Connection {
        let mut c = Connection::new(
            ConnectionId::intern("curve-test"),
            NodeId::intern("curve-a"),
            NodeId::intern("curve-b"),
            from,
            to,
        );
        c.animation_progress = progress;
        c
    }

    #[test]
    fn diagonal_midpoint() {
        let curve = ConnectionCurve::for_connection(&conn(
            Point::new(0.0, 0.0),
            Point::new(100.0, 100.0),
            1.0,
        ));
        assert_eq!(curve.control, KPoint::new(50.0, 50.0));
        assert_eq!(curve.midpoint(), KPoint::new(50.0, 50.0));
    }

    #[test]
    fn midpoint_is_on_the_curve_not_between_endpoints() {
        let curve = ConnectionCurve::between(Point::new(0.0, 0.0), Point::new(100.0, 40.0));
        assert_eq!(curve.control, KPoint::new(50.0, 20.0));
        assert_eq!(curve.midpoint(), KPoint::new(50.0, 20.0));

        let upward = ConnectionCurve::between(Point::new(0.0, 100.0), Point::new(60.0, 0.0));
        // Control bulges below the source even when the target is above it.
        assert_eq!(upward.control, KPoint::new(30.0, 150.0));
        assert_eq!(upward.midpoint(), KPoint::new(30.0, 100.0));
    }

    #[test]
    fn progress_pulls_the_end_back() {
        let curve = ConnectionCurve::for_connection(&conn(
            Point::new(0.0, 0.0),
            Point::new(100.0, 200.0),
            0.5,
        ));
        assert_eq!(curve.to, KPoint::new(50.0, 100.0));
        assert!(!curve.shows_arrowhead());
        assert!(!curve.shows_delete_target());
        assert!(curve.delete_target(8.0).is_none());
    }

    #[test]
    fn arrowhead_and_target_thresholds() {
        let c = |p| {
            ConnectionCurve::for_connection(&conn(Point::new(0.0, 0.0), Point::new(0.0, 100.0), p))
        };
        assert!(c(0.6).shows_delete_target());
        assert!(!c(0.6).shows_arrowhead());
        assert!(c(0.81).shows_arrowhead());
        let target = c(1.0).delete_target(8.0).unwrap();
        assert_eq!(target.radius, 8.0);
    }

    #[test]
    fn arrowhead_tip_is_the_end_point() {
        let curve = ConnectionCurve::between(Point::new(0.0, 0.0), Point::new(0.0, 100.0));
        let path = curve.arrowhead();
        let first = path.elements().first().copied();
        assert_eq!(first, Some(kurbo::PathEl::MoveTo(KPoint::new(0.0, 100.0))));
    }
}
