use std::time::Instant;

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

impl Frame {
    pub fn blank(width: u32, height: u32) -> Self {
        let mut rgba = vec![0u8; (width as usize) * (height as usize) * 4];
        for px in rgba.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            rgba,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) as usize) * 4;
        let px = self.rgba.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JointType {
    SpineBase,
    SpineMid,
    Neck,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    SpineShoulder,
    HandTipLeft,
    ThumbLeft,
    HandTipRight,
    ThumbRight,
}

impl JointType {
    pub const COUNT: usize = 25;

    pub const ALL: [JointType; Self::COUNT] = [
        JointType::SpineBase,
        JointType::SpineMid,
        JointType::Neck,
        JointType::Head,
        JointType::ShoulderLeft,
        JointType::ElbowLeft,
        JointType::WristLeft,
        JointType::HandLeft,
        JointType::ShoulderRight,
        JointType::ElbowRight,
        JointType::WristRight,
        JointType::HandRight,
        JointType::HipLeft,
        JointType::KneeLeft,
        JointType::AnkleLeft,
        JointType::FootLeft,
        JointType::HipRight,
        JointType::KneeRight,
        JointType::AnkleRight,
        JointType::FootRight,
        JointType::SpineShoulder,
        JointType::HandTipLeft,
        JointType::ThumbLeft,
        JointType::HandTipRight,
        JointType::ThumbRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingState {
    NotTracked,
    Inferred,
    Tracked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandState {
    Unknown,
    NotTracked,
    Open,
    Closed,
    Lasso,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingConfidence {
    Low,
    High,
}

/// Camera-space position in metres.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Joint {
    pub joint_type: JointType,
    pub position: CameraPoint,
    pub tracking_state: TrackingState,
}

#[derive(Clone, Debug)]
pub struct TrackedBody {
    pub tracking_id: u64,
    pub is_tracked: bool,
    pub joints: Vec<Joint>,
    pub hand_left_state: HandState,
    pub hand_left_confidence: TrackingConfidence,
    pub hand_right_state: HandState,
    pub hand_right_confidence: TrackingConfidence,
}

impl TrackedBody {
    /// An empty slot as the sensor reports it when nobody occupies it.
    pub fn untracked() -> Self {
        Self {
            tracking_id: 0,
            is_tracked: false,
            joints: Vec::new(),
            hand_left_state: HandState::NotTracked,
            hand_left_confidence: TrackingConfidence::Low,
            hand_right_state: HandState::NotTracked,
            hand_right_confidence: TrackingConfidence::Low,
        }
    }

    pub fn joint(&self, joint_type: JointType) -> Option<&Joint> {
        self.joints.iter().find(|j| j.joint_type == joint_type)
    }
}

#[derive(Clone, Debug)]
pub struct BodyFrame {
    pub bodies: Vec<TrackedBody>,
    pub timestamp: Instant,
}

/// Face bounding box in colour-space pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl FaceBox {
    pub fn width(&self) -> f64 {
        f64::from(self.right) - f64::from(self.left)
    }

    pub fn height(&self) -> f64 {
        f64::from(self.bottom) - f64::from(self.top)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceResult {
    pub tracking_id: u64,
    pub bounding_box: FaceBox,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorStatus {
    Running,
    NoSensor,
    NotAvailable,
}

impl SensorStatus {
    pub fn status_text(&self) -> &'static str {
        match self {
            SensorStatus::Running => "Running",
            SensorStatus::NoSensor => "No ready Kinect found!",
            SensorStatus::NotAvailable => "Kinect not available!",
        }
    }
}
