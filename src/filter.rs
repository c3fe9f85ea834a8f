//! Scalar Kalman-style smoothing for per-frame measurements.
//!
//! One [`ScalarKalman`] tracks exactly one scalar quantity (a face box width,
//! a face box height, ...). Instances share no state, so each tracked entity
//! owns its own set and drops it when tracking is lost.

use thiserror::Error;

pub const DEFAULT_PROCESS_NOISE: f64 = 0.000001;
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 0.0001;

const INITIAL_COVARIANCE: f64 = 1.0;
const INITIAL_ESTIMATE: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SmoothingError {
    #[error("noise parameters must be finite and positive (process {process}, measurement {measurement})")]
    InvalidNoise { process: f64, measurement: f64 },
    #[error("measurement is not finite: {0}")]
    NonFiniteMeasurement(f64),
}

/// Fixed-noise recursive filter without a motion model.
///
/// Gain and covariance converge to fixed points that depend only on the
/// ratio of process to measurement noise, so after a few updates this acts
/// like an exponential moving average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarKalman {
    process_noise: f64,
    measurement_noise: f64,
    covariance: f64,
    estimate: f64,
    gain: f64,
}

impl ScalarKalman {
    /// Builds a filter without validating the noise parameters.
    ///
    /// Non-positive values break the positive-covariance invariant; use
    /// [`ScalarKalman::try_new`] for values that come from outside.
    pub fn new(process_noise: f64, measurement_noise: f64) -> Self {
        Self {
            process_noise,
            measurement_noise,
            covariance: INITIAL_COVARIANCE,
            estimate: INITIAL_ESTIMATE,
            gain: 0.0,
        }
    }

    pub fn try_new(process_noise: f64, measurement_noise: f64) -> Result<Self, SmoothingError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(process_noise) || !valid(measurement_noise) {
            return Err(SmoothingError::InvalidNoise {
                process: process_noise,
                measurement: measurement_noise,
            });
        }
        Ok(Self::new(process_noise, measurement_noise))
    }

    /// Folds one measurement into the estimate and returns the new estimate.
    ///
    /// NaN and infinities are not rejected here; they flow through the
    /// arithmetic and poison the estimate. See [`ScalarKalman::try_update`].
    pub fn update(&mut self, measurement: f64) -> f64 {
        self.measurement_update();
        let result = self.estimate + (measurement - self.estimate) * self.gain;
        self.estimate = result;
        result
    }

    /// Like [`ScalarKalman::update`] but refuses non-finite input, leaving the
    /// filter untouched.
    pub fn try_update(&mut self, measurement: f64) -> Result<f64, SmoothingError> {
        if !measurement.is_finite() {
            return Err(SmoothingError::NonFiniteMeasurement(measurement));
        }
        Ok(self.update(measurement))
    }

    fn measurement_update(&mut self) {
        let predicted = self.covariance + self.process_noise;
        self.gain = predicted / (predicted + self.measurement_noise);
        self.covariance =
            self.measurement_noise * predicted / (self.measurement_noise + predicted);
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn covariance(&self) -> f64 {
        self.covariance
    }

    pub fn process_noise(&self) -> f64 {
        self.process_noise
    }

    pub fn measurement_noise(&self) -> f64 {
        self.measurement_noise
    }
}

impl Default for ScalarKalman {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESS_NOISE, DEFAULT_MEASUREMENT_NOISE)
    }
}

/// Independent width and height filters for one tracked box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SizeSmoother {
    width: ScalarKalman,
    height: ScalarKalman,
}

impl SizeSmoother {
    pub fn new(process_noise: f64, measurement_noise: f64) -> Self {
        Self {
            width: ScalarKalman::new(process_noise, measurement_noise),
            height: ScalarKalman::new(process_noise, measurement_noise),
        }
    }

    pub fn update(&mut self, width: f64, height: f64) -> (f64, f64) {
        (self.width.update(width), self.height.update(height))
    }

    pub fn current(&self) -> (f64, f64) {
        (self.width.estimate(), self.height.estimate())
    }
}
