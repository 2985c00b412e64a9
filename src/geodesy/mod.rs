mod geo_point;
mod great_circle;
mod local_frame;

pub use geo_point::GeoPoint;
pub use great_circle::{GreatCircle, Midpoint};
pub use local_frame::LocalFrame;
