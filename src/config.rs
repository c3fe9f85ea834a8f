use std::{env, str::FromStr, time::Duration};

use crate::filter::{DEFAULT_MEASUREMENT_NOISE, DEFAULT_PROCESS_NOISE};

// Extents of the depth stream, which is the space joints are drawn in.
pub const DEFAULT_CANVAS_WIDTH: u32 = 512;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 424;
const DEFAULT_FPS: u32 = 30;

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayConfig {
    pub process_noise: f64,
    pub measurement_noise: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub tracked_bone_thickness: f32,
    pub inferred_bone_thickness: f32,
    pub high_confidence_hand_size: f32,
    pub low_confidence_hand_size: f32,
    pub face_offset_x: f32,
    pub default_face_size: f32,
    pub fps: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            process_noise: DEFAULT_PROCESS_NOISE,
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            tracked_bone_thickness: 4.0,
            inferred_bone_thickness: 1.0,
            high_confidence_hand_size: 40.0,
            low_confidence_hand_size: 20.0,
            face_offset_x: 20.0,
            default_face_size: 60.0,
            fps: DEFAULT_FPS,
        }
    }
}

impl OverlayConfig {
    /// Defaults overridden by `OVERLAY_PROCESS_NOISE`, `OVERLAY_MEASUREMENT_NOISE`
    /// and `OVERLAY_FPS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(q) = parse_noise(&lookup, "OVERLAY_PROCESS_NOISE") {
            config.process_noise = q;
        }
        if let Some(r) = parse_noise(&lookup, "OVERLAY_MEASUREMENT_NOISE") {
            config.measurement_noise = r;
        }
        if let Some(fps) = parse_var(&lookup, "OVERLAY_FPS", |fps: &u32| *fps > 0) {
            config.fps = fps;
        }

        config
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1_000 / u64::from(self.fps.max(1)))
    }
}

fn parse_noise<F>(lookup: &F, key: &str) -> Option<f64>
where
    F: Fn(&str) -> Option<String>,
{
    parse_var(lookup, key, |v: &f64| v.is_finite() && *v > 0.0)
}

fn parse_var<T, F, V>(lookup: &F, key: &str, valid: V) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
    V: Fn(&T) -> bool,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) if valid(&v) => Some(v),
        _ => {
            log::warn!("ignoring invalid {key}={raw:?}, keeping default");
            None
        }
    }
}
