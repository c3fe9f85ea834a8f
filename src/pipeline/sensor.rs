use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Result, anyhow};
use crossbeam_channel::{Sender, TrySendError};

use super::{mapping::CoordinateMapper, overlay::OverlayScene};
use crate::{
    config::OverlayConfig,
    types::{BodyFrame, FaceResult, Frame, SensorStatus},
};

// How long the worker backs off when the source has nothing new.
const IDLE_BACKOFF: Duration = Duration::from_millis(5);

/// One sensor tick: the body slots plus the latest face frame per slot.
///
/// `faces[i]` is `None` when slot `i` had no face frame this tick or when the
/// face frame it had was invalid.
#[derive(Clone, Debug)]
pub struct SensorFrame {
    pub bodies: BodyFrame,
    pub faces: Vec<Option<FaceResult>>,
}

/// Anything that can hand over tracked bodies, typically a vendor SDK wrapper.
pub trait BodySource: Send + 'static {
    fn body_count(&self) -> usize;

    fn status(&self) -> SensorStatus;

    /// Returns the next frame, or `Ok(None)` when no new frame has arrived.
    fn poll(&mut self) -> Result<Option<SensorFrame>>;
}

#[derive(Clone, Debug)]
pub struct CompositedFrame {
    pub frame: Frame,
    pub status: SensorStatus,
    pub tracked_bodies: usize,
}

#[derive(Debug)]
pub struct OverlayStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl OverlayStream {
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for OverlayStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn start_overlay_stream<S, M>(
    source: S,
    mapper: M,
    config: OverlayConfig,
    tx: Sender<CompositedFrame>,
) -> Result<OverlayStream>
where
    S: BodySource,
    M: CoordinateMapper + 'static,
{
    // Fail fast before spawning the worker.
    if source.status() == SensorStatus::NoSensor {
        return Err(anyhow!(SensorStatus::NoSensor.status_text()));
    }

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || run_overlay_loop(source, mapper, config, tx, stop_flag));

    Ok(OverlayStream {
        stop,
        handle: Some(handle),
    })
}

fn run_overlay_loop<S, M>(
    mut source: S,
    mapper: M,
    config: OverlayConfig,
    tx: Sender<CompositedFrame>,
    stop_flag: Arc<AtomicBool>,
) where
    S: BodySource,
    M: CoordinateMapper,
{
    let (canvas_width, canvas_height) = (config.canvas_width, config.canvas_height);
    let mut scene = OverlayScene::new(source.body_count(), config);
    let mut last_status = source.status();
    log::info!(
        "overlay stream started: {} ({} body slots)",
        last_status.status_text(),
        scene.body_count()
    );

    while !stop_flag.load(Ordering::Relaxed) {
        let status = source.status();
        if status != last_status {
            log::info!("sensor status: {}", status.status_text());
            last_status = status;
        }

        let sensor_frame = match source.poll() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                thread::sleep(IDLE_BACKOFF);
                continue;
            }
            Err(err) => {
                log::warn!("body frame read failed: {err:?}");
                thread::sleep(IDLE_BACKOFF);
                continue;
            }
        };

        // Face frames land before the body frame that consumes them, so a newly
        // acquired body shows its first smoothed face box one tick later.
        for (slot, face) in sensor_frame.faces.into_iter().enumerate() {
            if let Err(err) = scene.submit_face_result(slot, face) {
                log::warn!("face frame ignored: {err}");
            }
        }
        scene.apply_body_frame(&sensor_frame.bodies, &mapper);

        let mut frame = Frame::blank(canvas_width, canvas_height);
        frame.timestamp = sensor_frame.bodies.timestamp;
        scene.render(&mut frame);

        let composited = CompositedFrame {
            frame,
            status,
            tracked_bodies: scene.tracked_bodies(),
        };

        // Drop the frame if the viewer is still busy with the previous one.
        if let Err(TrySendError::Disconnected(_)) = tx.try_send(composited) {
            log::info!("overlay consumer went away, stopping stream");
            break;
        }
    }
}
