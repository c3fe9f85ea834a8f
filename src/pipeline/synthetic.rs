//! Scripted stand-in for a depth sensor.
//!
//! Produces a few people standing side by side: the right arm waves and
//! cycles through the lasso pose, the face box jitters by a few pixels, and
//! each person periodically drops out and comes back under a new tracking id.

use std::time::{Duration, Instant};

use anyhow::Result;

use super::sensor::{BodySource, SensorFrame};
use crate::types::{
    BodyFrame, CameraPoint, FaceBox, FaceResult, HandState, Joint, JointType, SensorStatus,
    TrackedBody, TrackingConfidence, TrackingState,
};

pub const SENSOR_BODY_COUNT: usize = 6;

const LOSS_PERIOD: u64 = 300;
const LOSS_FRAMES: u64 = 30;
const LASSO_PERIOD: u64 = 60;
const CONFIDENCE_PERIOD: u64 = 45;
const FACE_JITTER_PX: f32 = 6.0;

// Standing pose relative to the spine base, in metres.
const POSE: &[(JointType, f32, f32)] = &[
    (JointType::SpineBase, 0.0, 0.0),
    (JointType::SpineMid, 0.0, 0.30),
    (JointType::SpineShoulder, 0.0, 0.55),
    (JointType::Neck, 0.0, 0.62),
    (JointType::Head, 0.0, 0.75),
    (JointType::ShoulderLeft, -0.18, 0.52),
    (JointType::ElbowLeft, -0.25, 0.28),
    (JointType::WristLeft, -0.28, 0.05),
    (JointType::HandLeft, -0.29, -0.02),
    (JointType::HandTipLeft, -0.30, -0.10),
    (JointType::ThumbLeft, -0.25, -0.03),
    (JointType::ShoulderRight, 0.18, 0.52),
    (JointType::ElbowRight, 0.32, 0.58),
    (JointType::HipLeft, -0.10, -0.05),
    (JointType::KneeLeft, -0.12, -0.45),
    (JointType::AnkleLeft, -0.12, -0.85),
    (JointType::FootLeft, -0.14, -0.90),
    (JointType::HipRight, 0.10, -0.05),
    (JointType::KneeRight, 0.12, -0.45),
    (JointType::AnkleRight, 0.12, -0.85),
    (JointType::FootRight, 0.14, -0.90),
];

/// Xorshift64, enough to make the jitter look like sensor noise.
struct Jitter {
    state: u64,
}

impl Jitter {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in [-1, 1).
    fn next_signed(&mut self) -> f32 {
        (self.next_u64() as f64 / (u64::MAX as f64 + 1.0) * 2.0 - 1.0) as f32
    }
}

pub struct SyntheticSensor {
    people: usize,
    tick: u64,
    interval: Duration,
    last_emit: Option<Instant>,
    jitter: Jitter,
}

impl SyntheticSensor {
    pub fn new(people: usize, interval: Duration) -> Self {
        Self {
            people: people.min(SENSOR_BODY_COUNT),
            tick: 0,
            interval,
            last_emit: None,
            jitter: Jitter::new(0x5eed),
        }
    }

    /// Builds the next frame regardless of pacing.
    pub fn next_frame(&mut self) -> SensorFrame {
        let tick = self.tick;
        self.tick += 1;

        let mut bodies = Vec::with_capacity(SENSOR_BODY_COUNT);
        let mut faces = Vec::with_capacity(SENSOR_BODY_COUNT);
        for slot in 0..SENSOR_BODY_COUNT {
            match self.person(slot, tick) {
                Some((body, face)) => {
                    bodies.push(body);
                    faces.push(Some(face));
                }
                None => {
                    bodies.push(TrackedBody::untracked());
                    faces.push(None);
                }
            }
        }

        SensorFrame {
            bodies: BodyFrame {
                bodies,
                timestamp: Instant::now(),
            },
            faces,
        }
    }

    fn person(&mut self, slot: usize, tick: u64) -> Option<(TrackedBody, FaceResult)> {
        if slot >= self.people {
            return None;
        }

        // Stagger the drop-outs so people do not all vanish together.
        let phase = tick + slot as u64 * (LOSS_PERIOD / SENSOR_BODY_COUNT as u64);
        if phase % LOSS_PERIOD < LOSS_FRAMES {
            return None;
        }
        let tracking_id = 72_057_594_037_900_000 + (slot as u64) * 1_000 + phase / LOSS_PERIOD;

        let t = tick as f32 / 30.0;
        let spread = if self.people > 1 {
            slot as f32 / (self.people - 1) as f32 - 0.5
        } else {
            0.0
        };
        let root = CameraPoint {
            x: spread * 1.6 + 0.05 * (t * 0.7 + slot as f32).sin(),
            y: -0.1,
            z: 2.5 + 0.3 * (slot % 2) as f32,
        };

        let mut joints: Vec<Joint> = POSE
            .iter()
            .map(|&(joint_type, dx, dy)| Joint {
                joint_type,
                position: CameraPoint {
                    x: root.x + dx,
                    y: root.y + dy,
                    z: root.z,
                },
                tracking_state: match joint_type {
                    // Feet come and go as the floor plane flickers.
                    JointType::FootLeft | JointType::FootRight if (tick / 20) % 3 == 0 => {
                        TrackingState::Inferred
                    }
                    _ => TrackingState::Tracked,
                },
            })
            .collect();

        let wave = (t * 4.0).sin();
        let elbow = (root.x + 0.32, root.y + 0.58);
        let wrist = (elbow.0 + 0.12 * wave, elbow.1 + 0.25);
        let hand = (wrist.0 + 0.02 * wave, wrist.1 + 0.07);
        for (joint_type, (x, y)) in [
            (JointType::WristRight, wrist),
            (JointType::HandRight, hand),
            (JointType::HandTipRight, (hand.0 + 0.02 * wave, hand.1 + 0.08)),
            (JointType::ThumbRight, (hand.0 - 0.05, hand.1 + 0.02)),
        ] {
            joints.push(Joint {
                joint_type,
                position: CameraPoint { x, y, z: root.z },
                tracking_state: TrackingState::Tracked,
            });
        }

        let hand_right_state = if (tick / LASSO_PERIOD) % 2 == 0 {
            HandState::Lasso
        } else {
            HandState::Open
        };
        let hand_right_confidence = if (tick / CONFIDENCE_PERIOD) % 2 == 0 {
            TrackingConfidence::High
        } else {
            TrackingConfidence::Low
        };

        let body = TrackedBody {
            tracking_id,
            is_tracked: true,
            joints,
            hand_left_state: HandState::Closed,
            hand_left_confidence: TrackingConfidence::High,
            hand_right_state,
            hand_right_confidence,
        };

        let width = 90.0 + FACE_JITTER_PX * self.jitter.next_signed();
        let height = 110.0 + FACE_JITTER_PX * self.jitter.next_signed();
        let left = 800 + slot as i32 * 150;
        let top = 300;
        let face = FaceResult {
            tracking_id,
            bounding_box: FaceBox {
                left,
                top,
                right: left + width.round() as i32,
                bottom: top + height.round() as i32,
            },
        };

        Some((body, face))
    }
}

impl BodySource for SyntheticSensor {
    fn body_count(&self) -> usize {
        SENSOR_BODY_COUNT
    }

    fn status(&self) -> SensorStatus {
        SensorStatus::Running
    }

    fn poll(&mut self) -> Result<Option<SensorFrame>> {
        let now = Instant::now();
        if let Some(last) = self.last_emit {
            if now.duration_since(last) < self.interval {
                return Ok(None);
            }
        }
        self.last_emit = Some(now);
        Ok(Some(self.next_frame()))
    }
}
