//! Geographic primitives and radius queries.

pub mod index;
pub mod point;

pub use index::{GeoIndex, IndexMode};
pub use point::{EARTH_RADIUS_KM, GeoPoint};
