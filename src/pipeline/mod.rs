pub mod mapping;
pub mod overlay;
pub mod sensor;
pub mod skeleton;
pub mod synthetic;

// Re-exports for convenience
pub use mapping::{CoordinateMapper, DepthIntrinsics};
pub use overlay::{OverlayError, OverlayScene};
pub use sensor::{
    BodySource, CompositedFrame, OverlayStream, SensorFrame, start_overlay_stream,
};
pub use synthetic::SyntheticSensor;
