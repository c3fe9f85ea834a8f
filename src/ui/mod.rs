use std::sync::Arc;

use crossbeam_channel::Receiver;
use gpui::{
    AnyElement, App, AppContext, Context, IntoElement, ObjectFit, ParentElement, Render,
    RenderImage, Styled, StyledImage, TitlebarOptions, Window, WindowOptions, div, img, px,
};
use gpui_component::{ActiveTheme, Root, h_flex, v_flex};
use image::{Frame as ImageFrame, ImageBuffer, Rgba};
use skeleton_overlay::{
    pipeline::{CompositedFrame, OverlayStream},
    types::SensorStatus,
};

mod main_view;
mod render_util;

const CANVAS_MIN_WIDTH: f32 = 320.0;
const CANVAS_MAX_WIDTH: f32 = 1024.0;
const STATUS_BAR_HEIGHT: f32 = 32.0;

pub fn launch_ui(
    app: &mut App,
    frame_rx: Receiver<CompositedFrame>,
    stream: OverlayStream,
) -> gpui::Result<()> {
    let window_options = WindowOptions {
        titlebar: Some(TitlebarOptions {
            title: Some("Skeleton Overlay".into()),
            appears_transparent: false,
            traffic_light_position: None,
        }),
        ..Default::default()
    };

    app.open_window(window_options, move |window, app| {
        let view = app.new(|_| AppView::new(frame_rx, stream));
        app.new(|cx| Root::new(view, window, cx))
    })?;

    Ok(())
}

struct AppView {
    frame_rx: Receiver<CompositedFrame>,
    // Keeps the worker alive for as long as the window is open.
    _stream: OverlayStream,
    latest_image: Option<Arc<RenderImage>>,
    frame_size: Option<(u32, u32)>,
    status: Option<SensorStatus>,
    tracked_bodies: usize,
}

impl AppView {
    fn new(frame_rx: Receiver<CompositedFrame>, stream: OverlayStream) -> Self {
        Self {
            frame_rx,
            _stream: stream,
            latest_image: None,
            frame_size: None,
            status: None,
            tracked_bodies: 0,
        }
    }
}

impl Render for AppView {
    fn render(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> impl gpui::IntoElement {
        cx.defer_in(window, |_, _, cx| {
            cx.notify();
        });

        self.render_main(window, cx)
    }
}
