use crate::types::{JointType, TrackingState};

// Hand tips and thumbs are tracked but not drawn.
pub const BONES: &[(JointType, JointType)] = &[
    // Torso
    (JointType::Head, JointType::Neck),
    (JointType::Neck, JointType::SpineShoulder),
    (JointType::SpineShoulder, JointType::SpineMid),
    (JointType::SpineMid, JointType::SpineBase),
    (JointType::SpineShoulder, JointType::ShoulderRight),
    (JointType::SpineShoulder, JointType::ShoulderLeft),
    (JointType::SpineBase, JointType::HipRight),
    (JointType::SpineBase, JointType::HipLeft),
    // Right arm
    (JointType::ShoulderRight, JointType::ElbowRight),
    (JointType::ElbowRight, JointType::WristRight),
    (JointType::WristRight, JointType::HandRight),
    // Left arm
    (JointType::ShoulderLeft, JointType::ElbowLeft),
    (JointType::ElbowLeft, JointType::WristLeft),
    (JointType::WristLeft, JointType::HandLeft),
    // Right leg
    (JointType::HipRight, JointType::KneeRight),
    (JointType::KneeRight, JointType::AnkleRight),
    (JointType::AnkleRight, JointType::FootRight),
    // Left leg
    (JointType::HipLeft, JointType::KneeLeft),
    (JointType::KneeLeft, JointType::AnkleLeft),
    (JointType::AnkleLeft, JointType::FootLeft),
];

// Points further out than this are off any realistic canvas and would only
// make the line walk spin.
const MAX_DRAW_COORD: f32 = 16_384.0;

/// Stroke width for a bone, or `None` when it should be hidden.
pub fn bone_thickness(
    start: TrackingState,
    end: TrackingState,
    tracked_thickness: f32,
    inferred_thickness: f32,
) -> Option<f32> {
    match (start, end) {
        (TrackingState::NotTracked, _) | (_, TrackingState::NotTracked) => None,
        (TrackingState::Tracked, TrackingState::Tracked) => Some(tracked_thickness),
        _ => Some(inferred_thickness),
    }
}

pub fn is_drawable(point: (f32, f32)) -> bool {
    point.0.is_finite()
        && point.1.is_finite()
        && point.0.abs() <= MAX_DRAW_COORD
        && point.1.abs() <= MAX_DRAW_COORD
}

pub fn draw_rect(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    top_left: (f32, f32),
    bottom_right: (f32, f32),
    color: [u8; 4],
    thickness: i32,
) {
    let (x1, y1) = top_left;
    let (x2, y2) = bottom_right;
    let corners = [(x1, y1), (x2, y1), (x2, y2), (x1, y2)];
    for i in 0..corners.len() {
        let next = corners[(i + 1) % corners.len()];
        draw_line(buffer, width, height, &corners[i], &next, color, thickness);
    }
}

pub fn draw_line(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    p0: &(f32, f32),
    p1: &(f32, f32),
    color: [u8; 4],
    thickness: i32,
) {
    if !is_drawable(*p0) || !is_drawable(*p1) {
        return;
    }

    let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
    let (x1, y1) = (p1.0 as i32, p1.1 as i32);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = (thickness.max(1) - 1) / 2;

    loop {
        put_pixel_safe(buffer, width, height, x0, y0, color);
        if radius > 0 {
            for ox in -radius..=radius {
                for oy in -radius..=radius {
                    if ox == 0 && oy == 0 {
                        continue;
                    }
                    if ox.abs() + oy.abs() <= radius {
                        put_pixel_safe(buffer, width, height, x0 + ox, y0 + oy, color);
                    }
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

pub fn draw_circle(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center: (f32, f32),
    radius: i32,
    color: [u8; 4],
) {
    if !is_drawable(center) {
        return;
    }
    let (cx, cy) = (center.0 as i32, center.1 as i32);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel_safe(buffer, width, height, cx + dx, cy + dy, color);
            }
        }
    }
}

fn put_pixel_safe(buffer: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= width || uy >= height {
        return;
    }
    let idx = ((uy * width + ux) as usize) * 4;
    if idx + 3 < buffer.len() {
        buffer[idx..idx + 4].copy_from_slice(&color);
    }
}
