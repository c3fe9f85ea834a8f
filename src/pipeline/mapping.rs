use crate::types::CameraPoint;

/// Joints the tracker only inferred can come back behind the sensor; they are
/// pulled to this depth before projection.
pub const INFERRED_Z_POSITION_CLAMP: f32 = 0.1;

/// Projects camera-space points into the 2D space the overlay is drawn in.
pub trait CoordinateMapper: Send {
    fn map_camera_to_depth(&self, point: CameraPoint) -> (f32, f32);
}

pub fn clamp_inferred_depth(mut point: CameraPoint) -> CameraPoint {
    if point.z < 0.0 {
        point.z = INFERRED_Z_POSITION_CLAMP;
    }
    point
}

/// Pinhole model of the depth camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthIntrinsics {
    pub focal_x: f32,
    pub focal_y: f32,
    pub center_x: f32,
    pub center_y: f32,
}

impl Default for DepthIntrinsics {
    fn default() -> Self {
        Self {
            focal_x: 365.456,
            focal_y: 365.456,
            center_x: 256.0,
            center_y: 212.0,
        }
    }
}

impl CoordinateMapper for DepthIntrinsics {
    fn map_camera_to_depth(&self, point: CameraPoint) -> (f32, f32) {
        if point.z == 0.0 {
            return (f32::NEG_INFINITY, f32::NEG_INFINITY);
        }
        // Camera space is y-up, image space is y-down.
        let x = self.center_x + self.focal_x * point.x / point.z;
        let y = self.center_y - self.focal_y * point.y / point.z;
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_depth_is_clamped() {
        let p = clamp_inferred_depth(CameraPoint {
            x: 0.2,
            y: 0.1,
            z: -0.5,
        });
        assert_eq!(p.z, INFERRED_Z_POSITION_CLAMP);
        assert_eq!(p.x, 0.2);

        let untouched = clamp_inferred_depth(CameraPoint {
            x: 0.0,
            y: 0.0,
            z: 2.0,
        });
        assert_eq!(untouched.z, 2.0);
    }

    #[test]
    fn optical_axis_maps_to_center() {
        let mapper = DepthIntrinsics::default();
        let (x, y) = mapper.map_camera_to_depth(CameraPoint {
            x: 0.0,
            y: 0.0,
            z: 1.5,
        });
        assert_eq!((x, y), (256.0, 212.0));
    }

    #[test]
    fn up_and_right_in_camera_space() {
        let mapper = DepthIntrinsics::default();
        let (x, y) = mapper.map_camera_to_depth(CameraPoint {
            x: 0.5,
            y: 0.5,
            z: 2.0,
        });
        assert!(x > 256.0);
        assert!(y < 212.0);
    }

    #[test]
    fn zero_depth_is_unmappable() {
        let mapper = DepthIntrinsics::default();
        let (x, y) = mapper.map_camera_to_depth(CameraPoint::default());
        assert!(x.is_infinite() && y.is_infinite());
    }
}
