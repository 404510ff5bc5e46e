pub mod controller;
pub mod geometry;
pub mod snap;

pub use controller::TimelineController;
pub use geometry::TimelineGeometry;
