//! Per-body overlay state: bones, the smoothed face box and the hand
//! indicators, one slot per body the sensor can report.

use thiserror::Error;

use super::{
    mapping::{CoordinateMapper, clamp_inferred_depth},
    skeleton::{self, BONES},
};
use crate::{
    config::OverlayConfig,
    filter::SizeSmoother,
    types::{
        BodyFrame, FaceResult, Frame, HandState, JointType, TrackedBody, TrackingConfidence,
    },
};

pub const BODY_COLORS: [[u8; 4]; 6] = [
    [255, 0, 0, 255],     // red
    [255, 165, 0, 255],   // orange
    [0, 128, 0, 255],     // green
    [0, 0, 255, 255],     // blue
    [75, 0, 130, 255],    // indigo
    [238, 130, 238, 255], // violet
];

const FACE_BOX_THICKNESS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OverlayError {
    #[error("body slot {slot} out of range (scene has {count} slots)")]
    SlotOutOfRange { slot: usize, count: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoneSegment {
    pub start: JointType,
    pub end: JointType,
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub thickness: f32,
    pub visible: bool,
}

impl BoneSegment {
    fn hidden(start: JointType, end: JointType) -> Self {
        Self {
            start,
            end,
            from: (0.0, 0.0),
            to: (0.0, 0.0),
            thickness: 0.0,
            visible: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceOverlay {
    pub visible: bool,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandIndicator {
    pub visible: bool,
    pub center: (f32, f32),
    pub size: f32,
}

impl HandIndicator {
    fn hidden() -> Self {
        Self {
            visible: false,
            center: (0.0, 0.0),
            size: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BodyOverlay {
    pub color: [u8; 4],
    pub tracking_id: Option<u64>,
    pub face: FaceOverlay,
    /// Driven by the right hand; the display is mirrored.
    pub left_indicator: HandIndicator,
    /// Driven by the left hand.
    pub right_indicator: HandIndicator,
    pub bones: Vec<BoneSegment>,
    face_tracking_id: Option<u64>,
    face_result: Option<FaceResult>,
    smoother: Option<SizeSmoother>,
}

impl BodyOverlay {
    fn new(color: [u8; 4], config: &OverlayConfig) -> Self {
        Self {
            color,
            tracking_id: None,
            face: FaceOverlay {
                visible: false,
                left: 0.0,
                top: 0.0,
                width: config.default_face_size,
                height: config.default_face_size,
            },
            left_indicator: HandIndicator::hidden(),
            right_indicator: HandIndicator::hidden(),
            bones: BONES
                .iter()
                .map(|&(a, b)| BoneSegment::hidden(a, b))
                .collect(),
            face_tracking_id: None,
            face_result: None,
            smoother: None,
        }
    }

    pub fn face_tracking_id(&self) -> Option<u64> {
        self.face_tracking_id
    }

    pub fn face_result(&self) -> Option<&FaceResult> {
        self.face_result.as_ref()
    }

    pub fn is_smoothing(&self) -> bool {
        self.smoother.is_some()
    }

    fn submit_face_result(&mut self, result: Option<FaceResult>) {
        match result {
            Some(result) if self.face_tracking_id == Some(result.tracking_id) => {
                self.face_result = Some(result);
            }
            Some(result) => {
                log::debug!(
                    "dropping face result for {} (face source follows {:?})",
                    result.tracking_id,
                    self.face_tracking_id
                );
            }
            None => self.face_result = None,
        }
    }

    fn adopt(&mut self, tracking_id: u64, config: &OverlayConfig) {
        log::debug!("slot now tracking body {tracking_id}");
        self.tracking_id = Some(tracking_id);
        self.face_tracking_id = None;
        self.face_result = None;
        self.smoother = Some(SizeSmoother::new(
            config.process_noise,
            config.measurement_noise,
        ));
        self.face.width = config.default_face_size;
        self.face.height = config.default_face_size;
    }

    fn update(&mut self, body: &TrackedBody, mapper: &dyn CoordinateMapper, config: &OverlayConfig) {
        if self.tracking_id != Some(body.tracking_id) {
            self.adopt(body.tracking_id, config);
        }

        let mut points = [None; JointType::COUNT];
        for joint in &body.joints {
            let position = clamp_inferred_depth(joint.position);
            points[joint.joint_type.index()] = Some(mapper.map_camera_to_depth(position));
        }
        let point_of = |joint: JointType| points[joint.index()];

        if let Some(head) = point_of(JointType::Head) {
            if self.face_tracking_id.is_none() {
                self.face_tracking_id = Some(body.tracking_id);
            }
            self.update_face(head, config);
        }

        if let Some(hand) = point_of(JointType::HandRight) {
            update_hand(
                &mut self.left_indicator,
                body.hand_right_state,
                body.hand_right_confidence,
                hand,
                config,
            );
        }
        if let Some(hand) = point_of(JointType::HandLeft) {
            update_hand(
                &mut self.right_indicator,
                body.hand_left_state,
                body.hand_left_confidence,
                hand,
                config,
            );
        }

        for bone in &mut self.bones {
            let (Some(start), Some(end)) = (body.joint(bone.start), body.joint(bone.end)) else {
                bone.visible = false;
                continue;
            };
            let (Some(from), Some(to)) = (point_of(bone.start), point_of(bone.end)) else {
                bone.visible = false;
                continue;
            };
            match skeleton::bone_thickness(
                start.tracking_state,
                end.tracking_state,
                config.tracked_bone_thickness,
                config.inferred_bone_thickness,
            ) {
                Some(thickness) => {
                    bone.visible = true;
                    bone.thickness = thickness;
                    bone.from = from;
                    bone.to = to;
                }
                None => bone.visible = false,
            }
        }
    }

    fn update_face(&mut self, head: (f32, f32), config: &OverlayConfig) {
        self.face.visible = true;

        if let Some(result) = &self.face_result {
            let smoother = self.smoother.get_or_insert_with(|| {
                SizeSmoother::new(config.process_noise, config.measurement_noise)
            });
            let (width, height) = smoother.update(
                result.bounding_box.width(),
                result.bounding_box.height(),
            );
            self.face.width = width as f32;
            self.face.height = height as f32;
        }

        if head.0.is_finite() && head.1.is_finite() {
            self.face.left = head.0 - self.face.width / 2.0 + config.face_offset_x;
            self.face.top = head.1 - self.face.height / 2.0;
        }
    }

    fn clear(&mut self) {
        if let Some(id) = self.tracking_id.take() {
            log::debug!("lost body {id}");
        }
        for bone in &mut self.bones {
            bone.visible = false;
        }
        self.face.visible = false;
        self.left_indicator.visible = false;
        self.right_indicator.visible = false;
        self.face_tracking_id = None;
        self.face_result = None;
        self.smoother = None;
    }

    fn render(&self, frame: &mut Frame) {
        let (width, height) = (frame.width, frame.height);
        let buffer = frame.rgba.as_mut_slice();

        for bone in self.bones.iter().filter(|b| b.visible) {
            skeleton::draw_line(
                buffer,
                width,
                height,
                &bone.from,
                &bone.to,
                self.color,
                bone.thickness.round() as i32,
            );
        }

        if self.face.visible {
            let top_left = (self.face.left, self.face.top);
            let bottom_right = (
                self.face.left + self.face.width,
                self.face.top + self.face.height,
            );
            skeleton::draw_rect(
                buffer,
                width,
                height,
                top_left,
                bottom_right,
                self.color,
                FACE_BOX_THICKNESS,
            );
        }

        for indicator in [&self.left_indicator, &self.right_indicator] {
            if indicator.visible {
                skeleton::draw_circle(
                    buffer,
                    width,
                    height,
                    indicator.center,
                    (indicator.size / 2.0).round() as i32,
                    self.color,
                );
            }
        }
    }
}

fn update_hand(
    indicator: &mut HandIndicator,
    state: HandState,
    confidence: TrackingConfidence,
    point: (f32, f32),
    config: &OverlayConfig,
) {
    indicator.visible = state == HandState::Lasso;
    indicator.size = match confidence {
        TrackingConfidence::High => config.high_confidence_hand_size,
        TrackingConfidence::Low => config.low_confidence_hand_size,
    };
    if point.0.is_finite() && point.1.is_finite() {
        indicator.center = point;
    }
}

fn slot_in(slots: &mut [BodyOverlay], slot: usize) -> Result<&mut BodyOverlay, OverlayError> {
    let count = slots.len();
    slots
        .get_mut(slot)
        .ok_or(OverlayError::SlotOutOfRange { slot, count })
}

pub struct OverlayScene {
    config: OverlayConfig,
    slots: Vec<BodyOverlay>,
}

impl OverlayScene {
    pub fn new(body_count: usize, config: OverlayConfig) -> Self {
        let mut scene = Self {
            config,
            slots: Vec::new(),
        };
        scene.resize(body_count);
        scene
    }

    fn resize(&mut self, body_count: usize) {
        self.slots = (0..body_count)
            .map(|i| BodyOverlay::new(BODY_COLORS[i % BODY_COLORS.len()], &self.config))
            .collect();
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn body_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[BodyOverlay] {
        &self.slots
    }

    pub fn slot(&self, slot: usize) -> Option<&BodyOverlay> {
        self.slots.get(slot)
    }

    pub fn tracked_bodies(&self) -> usize {
        self.slots.iter().filter(|s| s.tracking_id.is_some()).count()
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut BodyOverlay, OverlayError> {
        slot_in(&mut self.slots, slot)
    }

    /// Stores the newest face result for a slot; `None` marks the latest
    /// face frame as invalid.
    pub fn submit_face_result(
        &mut self,
        slot: usize,
        result: Option<FaceResult>,
    ) -> Result<(), OverlayError> {
        self.slot_mut(slot)?.submit_face_result(result);
        Ok(())
    }

    pub fn apply_body_frame(&mut self, frame: &BodyFrame, mapper: &dyn CoordinateMapper) {
        if frame.bodies.len() != self.slots.len() {
            log::info!(
                "body slot count changed from {} to {}",
                self.slots.len(),
                frame.bodies.len()
            );
            self.resize(frame.bodies.len());
        }

        for (slot, body) in self.slots.iter_mut().zip(&frame.bodies) {
            if body.is_tracked {
                slot.update(body, mapper, &self.config);
            } else {
                slot.clear();
            }
        }
    }

    pub fn update_body(
        &mut self,
        slot: usize,
        body: &TrackedBody,
        mapper: &dyn CoordinateMapper,
    ) -> Result<(), OverlayError> {
        // Borrows only `slots`, leaving `config` free for the update.
        slot_in(&mut self.slots, slot)?.update(body, mapper, &self.config);
        Ok(())
    }

    pub fn clear_body(&mut self, slot: usize) -> Result<(), OverlayError> {
        self.slot_mut(slot)?.clear();
        Ok(())
    }

    pub fn render(&self, frame: &mut Frame) {
        for slot in &self.slots {
            slot.render(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::{
        filter::ScalarKalman,
        types::{CameraPoint, FaceBox, Joint, TrackingState},
    };

    /// Maps metres straight to pixels, ignoring depth.
    struct FlatMapper;

    impl CoordinateMapper for FlatMapper {
        fn map_camera_to_depth(&self, point: CameraPoint) -> (f32, f32) {
            (point.x * 100.0, point.y * 100.0)
        }
    }

    fn joint(joint_type: JointType, x: f32, y: f32, state: TrackingState) -> Joint {
        Joint {
            joint_type,
            position: CameraPoint { x, y, z: 2.0 },
            tracking_state: state,
        }
    }

    fn body(tracking_id: u64) -> TrackedBody {
        let joints = JointType::ALL
            .iter()
            .enumerate()
            .map(|(i, &jt)| joint(jt, 1.0 + i as f32 * 0.1, 1.0, TrackingState::Tracked))
            .collect();
        TrackedBody {
            tracking_id,
            is_tracked: true,
            joints,
            hand_left_state: HandState::Open,
            hand_left_confidence: TrackingConfidence::High,
            hand_right_state: HandState::Lasso,
            hand_right_confidence: TrackingConfidence::Low,
        }
    }

    fn face(tracking_id: u64, width: i32, height: i32) -> FaceResult {
        FaceResult {
            tracking_id,
            bounding_box: FaceBox {
                left: 0,
                top: 0,
                right: width,
                bottom: height,
            },
        }
    }

    fn frame_of(bodies: Vec<TrackedBody>) -> BodyFrame {
        BodyFrame {
            bodies,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn slots_get_colors_in_order() {
        let scene = OverlayScene::new(6, OverlayConfig::default());
        for (slot, color) in scene.slots().iter().zip(BODY_COLORS) {
            assert_eq!(slot.color, color);
        }
        assert_eq!(OverlayScene::new(0, OverlayConfig::default()).body_count(), 0);
    }

    #[test]
    fn face_size_is_smoothed_per_dimension() {
        let mut scene = OverlayScene::new(1, OverlayConfig::default());
        scene.update_body(0, &body(7), &FlatMapper).unwrap();
        assert_eq!(scene.slot(0).unwrap().face_tracking_id(), Some(7));

        scene.submit_face_result(0, Some(face(7, 100, 140))).unwrap();
        scene.update_body(0, &body(7), &FlatMapper).unwrap();

        let mut width = ScalarKalman::default();
        let mut height = ScalarKalman::default();
        let slot = scene.slot(0).unwrap();
        assert_eq!(slot.face.width, width.update(100.0) as f32);
        assert_eq!(slot.face.height, height.update(140.0) as f32);

        // The stored result keeps feeding the filter until a new face frame.
        scene.update_body(0, &body(7), &FlatMapper).unwrap();
        let slot = scene.slot(0).unwrap();
        assert_eq!(slot.face.width, width.update(100.0) as f32);
    }

    #[test]
    fn face_box_is_placed_around_head() {
        let config = OverlayConfig::default();
        let mut scene = OverlayScene::new(1, config.clone());
        let b = body(3);
        scene.update_body(0, &b, &FlatMapper).unwrap();

        let head = b.joint(JointType::Head).unwrap().position;
        let face = scene.slot(0).unwrap().face;
        assert!(face.visible);
        let expected_left = head.x * 100.0 - config.default_face_size / 2.0 + config.face_offset_x;
        assert!((face.left - expected_left).abs() < 1e-4);
        assert!((face.top - (head.y * 100.0 - config.default_face_size / 2.0)).abs() < 1e-4);
    }

    #[test]
    fn unmappable_head_keeps_last_position() {
        struct Unmappable;
        impl CoordinateMapper for Unmappable {
            fn map_camera_to_depth(&self, _: CameraPoint) -> (f32, f32) {
                (f32::NEG_INFINITY, f32::NEG_INFINITY)
            }
        }

        let mut scene = OverlayScene::new(1, OverlayConfig::default());
        scene.update_body(0, &body(3), &FlatMapper).unwrap();
        let before = scene.slot(0).unwrap().face;
        scene.update_body(0, &body(3), &Unmappable).unwrap();
        let after = scene.slot(0).unwrap().face;
        assert_eq!((before.left, before.top), (after.left, after.top));
    }

    #[test]
    fn face_results_for_other_bodies_are_ignored() {
        let mut scene = OverlayScene::new(1, OverlayConfig::default());
        scene.update_body(0, &body(1), &FlatMapper).unwrap();
        scene.submit_face_result(0, Some(face(2, 50, 50))).unwrap();
        assert!(scene.slot(0).unwrap().face_result().is_none());

        scene.submit_face_result(0, Some(face(1, 50, 50))).unwrap();
        assert!(scene.slot(0).unwrap().face_result().is_some());
        scene.submit_face_result(0, None).unwrap();
        assert!(scene.slot(0).unwrap().face_result().is_none());
    }

    #[test]
    fn tracking_loss_discards_smoothing() {
        let mut scene = OverlayScene::new(2, OverlayConfig::default());
        let frame = frame_of(vec![body(9), TrackedBody::untracked()]);
        scene.apply_body_frame(&frame, &FlatMapper);
        scene.submit_face_result(0, Some(face(9, 80, 80))).unwrap();
        for _ in 0..50 {
            scene.apply_body_frame(&frame, &FlatMapper);
        }
        assert!(scene.slot(0).unwrap().face.width > 70.0);
        assert_eq!(scene.tracked_bodies(), 1);

        scene.apply_body_frame(
            &frame_of(vec![TrackedBody::untracked(), TrackedBody::untracked()]),
            &FlatMapper,
        );
        let slot = scene.slot(0).unwrap();
        assert!(!slot.is_smoothing());
        assert!(!slot.face.visible);
        assert!(slot.bones.iter().all(|b| !b.visible));
        assert!(!slot.left_indicator.visible);
        assert_eq!(scene.tracked_bodies(), 0);

        // Reacquired: the filter starts over from zero.
        scene.apply_body_frame(&frame, &FlatMapper);
        scene.submit_face_result(0, Some(face(9, 80, 80))).unwrap();
        scene.apply_body_frame(&frame, &FlatMapper);
        let fresh = ScalarKalman::default().update(80.0) as f32;
        assert_eq!(scene.slot(0).unwrap().face.width, fresh);
    }

    #[test]
    fn new_tracking_id_resets_slot() {
        let mut scene = OverlayScene::new(1, OverlayConfig::default());
        scene.update_body(0, &body(1), &FlatMapper).unwrap();
        scene.submit_face_result(0, Some(face(1, 90, 90))).unwrap();
        scene.update_body(0, &body(2), &FlatMapper).unwrap();
        let slot = scene.slot(0).unwrap();
        assert_eq!(slot.tracking_id, Some(2));
        assert_eq!(slot.face_tracking_id(), Some(2));
        assert!(slot.face_result().is_none());
    }

    #[test]
    fn hand_indicators_show_only_for_lasso() {
        let config = OverlayConfig::default();
        let mut scene = OverlayScene::new(1, config.clone());
        let b = body(4);
        scene.update_body(0, &b, &FlatMapper).unwrap();
        let slot = scene.slot(0).unwrap();

        // Right hand is in lasso with low confidence and drives the left indicator.
        assert!(slot.left_indicator.visible);
        assert_eq!(slot.left_indicator.size, config.low_confidence_hand_size);
        let hand = b.joint(JointType::HandRight).unwrap().position;
        assert_eq!(slot.left_indicator.center, (hand.x * 100.0, hand.y * 100.0));

        assert!(!slot.right_indicator.visible);
        assert_eq!(slot.right_indicator.size, config.high_confidence_hand_size);
    }

    #[test]
    fn bone_visibility_follows_joint_states() {
        let mut b = body(5);
        for j in &mut b.joints {
            match j.joint_type {
                JointType::Head => j.tracking_state = TrackingState::NotTracked,
                JointType::KneeLeft => j.tracking_state = TrackingState::Inferred,
                _ => {}
            }
        }
        let mut scene = OverlayScene::new(1, OverlayConfig::default());
        scene.update_body(0, &b, &FlatMapper).unwrap();

        let bones = &scene.slot(0).unwrap().bones;
        let find = |a, z| bones.iter().find(|s| s.start == a && s.end == z).unwrap();
        assert!(!find(JointType::Head, JointType::Neck).visible);
        assert_eq!(find(JointType::HipLeft, JointType::KneeLeft).thickness, 1.0);
        assert_eq!(find(JointType::HipRight, JointType::KneeRight).thickness, 4.0);
        assert!(find(JointType::HipRight, JointType::KneeRight).visible);
    }

    #[test]
    fn missing_joints_hide_their_bones() {
        let mut b = body(6);
        b.joints.retain(|j| j.joint_type != JointType::FootLeft);
        let mut scene = OverlayScene::new(1, OverlayConfig::default());
        scene.update_body(0, &b, &FlatMapper).unwrap();
        let bones = &scene.slot(0).unwrap().bones;
        let foot = bones
            .iter()
            .find(|s| s.end == JointType::FootLeft)
            .unwrap();
        assert!(!foot.visible);
    }

    #[test]
    fn body_count_change_rebuilds_slots() {
        let mut scene = OverlayScene::new(2, OverlayConfig::default());
        scene.apply_body_frame(
            &frame_of(vec![body(1), body(2), TrackedBody::untracked()]),
            &FlatMapper,
        );
        assert_eq!(scene.body_count(), 3);
        assert_eq!(scene.tracked_bodies(), 2);
    }

    #[test]
    fn out_of_range_slot_is_an_error() {
        let mut scene = OverlayScene::new(2, OverlayConfig::default());
        assert_eq!(
            scene.clear_body(5),
            Err(OverlayError::SlotOutOfRange { slot: 5, count: 2 })
        );
        assert!(scene.submit_face_result(2, None).is_err());
        assert_eq!(
            scene.update_body(2, &body(1), &FlatMapper),
            Err(OverlayError::SlotOutOfRange { slot: 2, count: 2 })
        );
    }

    #[test]
    fn render_draws_in_body_color() {
        let mut scene = OverlayScene::new(1, OverlayConfig::default());
        let b = body(8);
        scene.update_body(0, &b, &FlatMapper).unwrap();

        let mut frame = Frame::blank(512, 424);
        scene.render(&mut frame);

        let hand = scene.slot(0).unwrap().left_indicator.center;
        assert_eq!(
            frame.pixel(hand.0 as u32, hand.1 as u32),
            Some(BODY_COLORS[0])
        );
        assert_eq!(frame.pixel(0, 423), Some([0, 0, 0, 255]));
    }

    #[test]
    fn render_outlines_smoothed_face_box() {
        let mut scene = OverlayScene::new(1, OverlayConfig::default());
        scene.update_body(0, &body(8), &FlatMapper).unwrap();
        scene.submit_face_result(0, Some(face(8, 100, 140))).unwrap();
        scene.update_body(0, &body(8), &FlatMapper).unwrap();

        let mut frame = Frame::blank(512, 424);
        scene.render(&mut frame);

        let face = scene.slot(0).unwrap().face;
        assert!((face.width - 100.0).abs() < 0.1);
        let mid_x = (face.left + face.width / 2.0) as u32;
        assert_eq!(frame.pixel(mid_x, face.top as u32), Some(BODY_COLORS[0]));
        assert_eq!(
            frame.pixel(mid_x, (face.top + face.height) as u32),
            Some(BODY_COLORS[0])
        );
        // Where the unsmoothed 60 px default box would have its top edge.
        assert_eq!(frame.pixel(mid_x, 70), Some([0, 0, 0, 255]));
    }
}
