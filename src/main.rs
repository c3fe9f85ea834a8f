#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod ui;

use anyhow::Result;
use crossbeam_channel::bounded;
use gpui::Application;
use skeleton_overlay::{
    config::OverlayConfig,
    pipeline::{DepthIntrinsics, SyntheticSensor, start_overlay_stream},
};

const SYNTHETIC_PEOPLE: usize = 2;

fn main() -> Result<()> {
    env_logger::init();

    let config = OverlayConfig::from_env();
    log::info!(
        "smoothing with process noise {} and measurement noise {}",
        config.process_noise,
        config.measurement_noise
    );

    let (frame_tx, frame_rx) = bounded(1);

    let sensor = SyntheticSensor::new(SYNTHETIC_PEOPLE, config.frame_interval());
    let stream = start_overlay_stream(sensor, DepthIntrinsics::default(), config, frame_tx)?;

    Application::new()
        .with_assets(gpui_component_assets::Assets)
        .run(move |app| {
            gpui_component::init(app);

            if let Err(err) = ui::launch_ui(app, frame_rx, stream) {
                log::error!("failed to launch ui: {err:?}");
            }
        });

    Ok(())
}
