pub mod curve;
pub mod hit;
pub mod paint;

pub use curve::ConnectionCurve;
pub use hit::{Hit, hit_test};
