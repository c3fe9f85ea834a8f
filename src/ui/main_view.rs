use super::render_util::frame_to_image;
use super::{
    ActiveTheme, AnyElement, AppView, Arc, CANVAS_MAX_WIDTH, CANVAS_MIN_WIDTH, Context,
    IntoElement, ObjectFit, ParentElement, RenderImage, STATUS_BAR_HEIGHT, Styled, StyledImage,
    Window, div, h_flex, img, px, v_flex,
};
use skeleton_overlay::types::SensorStatus;

impl AppView {
    pub(super) fn render_main(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        // Only the newest composited frame is worth uploading.
        let mut latest = None;
        while let Ok(frame) = self.frame_rx.try_recv() {
            latest = Some(frame);
        }
        if let Some(composited) = latest {
            self.status = Some(composited.status);
            self.tracked_bodies = composited.tracked_bodies;
            self.frame_size = Some((composited.frame.width, composited.frame.height));
            if let Some(image) = frame_to_image(&composited.frame) {
                self.replace_latest_image(image, window, cx);
            }
        }

        let theme = cx.theme();

        let status_text = self
            .status
            .map(|s| s.status_text().to_string())
            .unwrap_or_else(|| "Waiting for sensor...".to_string());
        let status_color = match self.status {
            Some(SensorStatus::Running) => gpui::rgb(0x34d399),
            Some(_) => gpui::rgb(0xf87171),
            None => gpui::rgb(0x8b95a5),
        };
        let bodies_text = format!("Bodies: {}", self.tracked_bodies);

        let (canvas_w, canvas_h) = self.frame_size.unwrap_or((512, 424));
        let ratio = canvas_w as f32 / canvas_h.max(1) as f32;
        let width = (canvas_w as f32).clamp(CANVAS_MIN_WIDTH, CANVAS_MAX_WIDTH);
        let height = width / ratio;

        let canvas: AnyElement = if let Some(image) = &self.latest_image {
            img(image.clone())
                .size_full()
                .object_fit(ObjectFit::Contain)
                .into_any_element()
        } else {
            div()
                .size_full()
                .flex()
                .items_center()
                .justify_center()
                .text_sm()
                .text_color(theme.muted_foreground)
                .child("Waiting for body frames...")
                .into_any_element()
        };

        let status_bar = h_flex()
            .h(px(STATUS_BAR_HEIGHT))
            .w(px(width))
            .px_3()
            .items_center()
            .justify_between()
            .bg(gpui::rgb(0x1a2332))
            .child(
                div()
                    .text_xs()
                    .text_color(status_color)
                    .child(format!("● {status_text}")),
            )
            .child(
                div()
                    .text_xs()
                    .text_color(gpui::rgb(0xcbd5e1))
                    .child(bodies_text),
            );

        v_flex()
            .size_full()
            .items_center()
            .justify_center()
            .bg(theme.background)
            .child(
                v_flex()
                    .rounded_lg()
                    .overflow_hidden()
                    .child(
                        div()
                            .w(px(width))
                            .h(px(height))
                            .bg(gpui::rgb(0x000000))
                            .child(canvas),
                    )
                    .child(status_bar),
            )
            .into_any_element()
    }

    fn replace_latest_image(
        &mut self,
        new_image: Arc<RenderImage>,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        if let Some(old_image) = self.latest_image.replace(new_image) {
            // Explicitly drop the previous GPU texture; otherwise the sprite atlas keeps
            // every frame and memory will climb rapidly while the stream is running.
            cx.drop_image(old_image, Some(window));
        }
    }
}
