//! The avatar scene, drawn back to front on every frame.
//!
//! Every routine is a pure function of the frame pose and theme; the figure
//! is intentionally flat, so correct layering is the only z-ordering. The
//! one piece of per-frame randomness (circuit lines, data points) comes from
//! the caller's deterministic [`FrameRand`] stream.

use kurbo::Shape as _;

use crate::{
    core::{Affine, BezPath, Circle, Ellipse, FrameRand, Point, Rect, Rgba8, RoundedRect, Vec2},
    error::MascotResult,
    paint::{GradStop, Painter},
    session::FramePose,
    signals,
    theme::Theme,
};

/// Logical side of the square avatar surface.
pub const CANVAS_SIZE: f64 = 300.0;

const CX: f64 = 150.0;
const BODY_ANCHOR_Y: f64 = 150.0;
const GROUND_Y: f64 = CANVAS_SIZE - 50.0;

const ARM_LENGTH: f64 = 70.0;
const UPPER_ARM: f64 = ARM_LENGTH * 0.6;
const FOREARM: f64 = ARM_LENGTH * 0.4;
const HAND_RADIUS: f64 = 10.0;

const EYE_WIDTH: f64 = 10.0;
const EYE_OPEN_HEIGHT: f64 = 10.0;
const EYE_CLOSED_HEIGHT: f64 = 1.0;

const MOUTH_WIDTH: f64 = 30.0;
const MOUTH_MAX_HEIGHT: f64 = 15.0;

const CIRCUIT_LINES: usize = 5;
const DATA_POINTS: usize = 6;

/// Drawn eye height: a blink is a height animation, not a fade.
pub fn eye_height(eyes_closed: bool) -> f64 {
    if eyes_closed {
        EYE_CLOSED_HEIGHT
    } else {
        EYE_OPEN_HEIGHT
    }
}

/// Drawn mouth polygon height for a given opening.
pub fn mouth_height(mouth_openness: f64) -> f64 {
    mouth_openness.clamp(0.0, 1.0) * MOUTH_MAX_HEIGHT
}

fn polygon(pts: &[(f64, f64)]) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = pts.iter();
    if let Some(&(x, y)) = iter.next() {
        path.move_to(Point::new(x, y));
        for &(x, y) in iter {
            path.line_to(Point::new(x, y));
        }
        path.close_path();
    }
    path
}

fn polyline(pts: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = pts.iter();
    if let Some(&p) = iter.next() {
        path.move_to(p);
        for &p in iter {
            path.line_to(p);
        }
    }
    path
}

fn segment(a: Point, b: Point) -> BezPath {
    polyline(&[a, b])
}

fn emissive_stops(violet: Rgba8, deep: Rgba8) -> [GradStop; 3] {
    [
        (0.0, Rgba8::new(255, 255, 255, 230)),
        (0.5, violet.with_alpha_scaled(0.7)),
        (1.0, deep.with_alpha_scaled(0.0)),
    ]
}

/// Draw the full scene for one frame.
pub fn draw_scene(
    p: &mut Painter<'_>,
    pose: &FramePose,
    theme: &Theme,
    decorations: &mut FrameRand,
) -> MascotResult<()> {
    let t = pose.t_ms;
    let base_y = BODY_ANCHOR_Y + signals::float_offset(t);

    draw_background(p, theme)?;
    draw_ground_shadow(p, pose, theme);
    draw_particles(p, t, base_y, theme)?;
    draw_platform(p, theme)?;
    draw_torso(p, base_y, theme)?;
    draw_chest(p, pose, base_y, theme)?;
    draw_shoulders(p, base_y, theme)?;
    draw_arms(p, pose, base_y, theme)?;
    draw_head(p, base_y, theme)?;
    draw_eyes(p, pose, base_y, theme)?;
    draw_mouth(p, pose, base_y, theme)?;
    draw_circuits(p, base_y, theme, decorations);
    draw_data_points(p, t, base_y, theme, decorations)?;
    draw_cap(p, base_y, theme);
    draw_antennas(p, t, base_y, theme)?;
    Ok(())
}

/// Draw the emissive shapes that get blurred into the glow layer: the eye
/// cores every frame, plus the full-body outline while speaking.
pub fn draw_glow_sources(p: &mut Painter<'_>, pose: &FramePose, theme: &Theme) {
    let base_y = BODY_ANCHOR_Y + signals::float_offset(pose.t_ms);
    let h = eye_height(pose.eyes_closed);
    let eye_y = base_y - 60.0;

    let glow = theme.eye_glow.with_alpha_scaled(if pose.speaking { 0.9 } else { 0.6 });
    p.fill(&left_eye_shape(eye_y, h), glow);
    p.fill(&right_eye_shape(eye_y, h), glow);

    if pose.speaking {
        let silhouette = polygon(&[
            (CX - 55.0, base_y - 95.0),
            (CX - 60.0, base_y),
            (CX - 50.0, base_y + 100.0),
            (CX + 50.0, base_y + 100.0),
            (CX + 60.0, base_y),
            (CX + 55.0, base_y - 95.0),
        ]);
        p.stroke(&silhouette, 20.0, theme.accent.with_alpha_scaled(0.5));
    }
}

fn draw_background(p: &mut Painter<'_>, theme: &Theme) -> MascotResult<()> {
    let full = Rect::new(0.0, 0.0, CANVAS_SIZE, CANVAS_SIZE).to_path(0.1);
    p.fill_vgrad(&full, &[(0.0, theme.bg_top), (1.0, theme.bg_bottom)])
}

fn draw_ground_shadow(p: &mut Painter<'_>, pose: &FramePose, theme: &Theme) {
    let alpha = signals::shadow_glow_alpha(pose.t_ms, pose.speaking);
    let shadow = Ellipse::new(Point::new(CX, GROUND_Y), Vec2::new(60.0, 15.0), 0.0).to_path(0.1);
    p.fill(&shadow, theme.shadow.with_alpha_scaled(alpha));
}

fn draw_particles(p: &mut Painter<'_>, t: f64, base_y: f64, theme: &Theme) -> MascotResult<()> {
    for i in 0..signals::PARTICLE_COUNT {
        let part = signals::particle(i, t);
        let stops = [
            (0.0, theme.glow_violet.with_alpha_scaled(part.alpha)),
            (1.0, theme.glow_deep.with_alpha_scaled(0.0)),
        ];
        p.fill_glow(
            Point::new(CX + part.dx, base_y + part.dy),
            part.size * 2.0,
            &stops,
        )?;
    }
    Ok(())
}

fn draw_platform(p: &mut Painter<'_>, theme: &Theme) -> MascotResult<()> {
    // Elliptical radial glow: draw a circular glow in a squashed frame.
    p.set_transform(
        Affine::translate((CX, GROUND_Y)) * Affine::scale_non_uniform(1.0, 20.0 / 70.0),
    );
    let stops = [
        (0.0, theme.shadow.with_alpha_scaled(0.3)),
        (0.5, theme.glow_deep.with_alpha_scaled(0.2)),
        (1.0, Rgba8::new(30, 0, 50, 0)),
    ];
    p.fill_glow(Point::ZERO, 70.0, &stops)?;
    p.reset_transform();
    Ok(())
}

fn draw_torso(p: &mut Painter<'_>, base_y: f64, theme: &Theme) -> MascotResult<()> {
    let torso = polygon(&[
        (CX - 40.0, base_y),
        (CX - 48.0, base_y + 60.0),
        (CX - 30.0, base_y + 100.0),
        (CX + 30.0, base_y + 100.0),
        (CX + 48.0, base_y + 60.0),
        (CX + 40.0, base_y),
    ]);
    p.fill_vgrad(
        &torso,
        &[
            (0.0, theme.torso_top),
            (0.4, theme.torso_mid),
            (1.0, theme.torso_bottom),
        ],
    )
}

fn draw_chest(p: &mut Painter<'_>, pose: &FramePose, base_y: f64, theme: &Theme) -> MascotResult<()> {
    let plate = polygon(&[
        (CX - 30.0, base_y + 10.0),
        (CX - 25.0, base_y + 50.0),
        (CX + 25.0, base_y + 50.0),
        (CX + 30.0, base_y + 10.0),
    ]);
    p.fill_vgrad(&plate, &[(0.0, theme.chest_top), (1.0, theme.chest_bottom)])?;

    // Energy core: pulsing radial glow around a solid bright center.
    let core = Point::new(CX, base_y + 30.0);
    let radius = signals::core_pulse_radius(pose.t_ms, pose.speaking);
    let stops = [
        (0.0, Rgba8::new(255, 255, 255, 230)),
        (0.2, theme.glow_violet.with_alpha_scaled(0.8)),
        (1.0, theme.glow_deep.with_alpha_scaled(0.0)),
    ];
    p.fill_glow(core, radius, &stops)?;
    p.fill(&Circle::new(core, 6.0).to_path(0.1), Rgba8::opaque(255, 255, 255));
    Ok(())
}

fn draw_shoulders(p: &mut Painter<'_>, base_y: f64, theme: &Theme) -> MascotResult<()> {
    for x_offset in [-40.0, 40.0] {
        let x = CX + x_offset;
        let pad = polygon(&[
            (x - 10.0, base_y),
            (x - 15.0, base_y + 5.0),
            (x - 15.0, base_y + 20.0),
            (x + 15.0, base_y + 20.0),
            (x + 15.0, base_y + 5.0),
            (x + 10.0, base_y),
        ]);
        p.fill_vgrad(&pad, &[(0.0, theme.torso_mid), (1.0, theme.limb_bottom)])?;

        let edge = segment(
            Point::new(x - 15.0, base_y + 5.0),
            Point::new(x + 15.0, base_y + 5.0),
        );
        p.stroke(&edge, 1.0, theme.accent.with_alpha_scaled(0.7));
    }
    Ok(())
}

fn draw_arms(p: &mut Painter<'_>, pose: &FramePose, base_y: f64, theme: &Theme) -> MascotResult<()> {
    let (left, right) = signals::arm_angles(pose.t_ms);
    for (x_offset, angle) in [(-40.0, left), (40.0, right)] {
        draw_arm(p, pose, base_y, x_offset, angle, theme)?;
    }
    p.reset_transform();
    Ok(())
}

/// One arm, drawn in nested local frames: shoulder -> elbow -> hand.
fn draw_arm(
    p: &mut Painter<'_>,
    pose: &FramePose,
    base_y: f64,
    x_offset: f64,
    angle: f64,
    theme: &Theme,
) -> MascotResult<()> {
    let shoulder = Affine::translate((CX + x_offset, base_y + 20.0)) * Affine::rotate(angle);
    p.set_transform(shoulder);

    let upper = polygon(&[
        (-8.0, 0.0),
        (-10.0, UPPER_ARM),
        (10.0, UPPER_ARM),
        (8.0, 0.0),
    ]);
    p.fill_vgrad(&upper, &[(0.0, theme.limb_top), (1.0, theme.limb_bottom)])?;

    let elbow = Point::new(0.0, UPPER_ARM);
    p.fill(&Circle::new(elbow, 8.0).to_path(0.1), theme.forearm_top);
    p.fill(
        &Circle::new(elbow, 4.0).to_path(0.1),
        theme.accent.with_alpha_scaled(0.7),
    );

    // Forearm swings independently below the elbow.
    let sway = signals::forearm_sway(pose.t_ms);
    let elbow_frame = shoulder * Affine::translate((0.0, UPPER_ARM)) * Affine::rotate(sway);
    p.set_transform(elbow_frame);

    let forearm = polygon(&[(-7.0, 0.0), (-9.0, FOREARM), (9.0, FOREARM), (7.0, 0.0)]);
    p.fill_vgrad(
        &forearm,
        &[(0.0, theme.forearm_top), (1.0, theme.forearm_bottom)],
    )?;

    let hand = Point::new(0.0, FOREARM);
    p.fill(&Circle::new(hand, HAND_RADIUS).to_path(0.1), theme.hand);

    if pose.speaking {
        let radius = signals::hand_glow_radius(pose.t_ms);
        p.fill_glow(hand, radius, &emissive_stops(theme.glow_violet, theme.glow_deep))?;
    }
    Ok(())
}

fn draw_head(p: &mut Painter<'_>, base_y: f64, theme: &Theme) -> MascotResult<()> {
    let skull = polygon(&[
        (CX - 30.0, base_y - 80.0),
        (CX - 35.0, base_y - 50.0),
        (CX - 25.0, base_y - 20.0),
        (CX + 25.0, base_y - 20.0),
        (CX + 35.0, base_y - 50.0),
        (CX + 30.0, base_y - 80.0),
    ]);
    p.fill_vgrad(&skull, &[(0.0, theme.head_top), (1.0, theme.head_bottom)])?;

    let neck = polygon(&[
        (CX - 12.0, base_y - 25.0),
        (CX - 14.0, base_y - 5.0),
        (CX + 14.0, base_y - 5.0),
        (CX + 12.0, base_y - 25.0),
    ]);
    p.fill_vgrad(&neck, &[(0.0, theme.neck_top), (1.0, theme.head_bottom)])?;

    let panel = RoundedRect::new(CX - 22.0, base_y - 72.0, CX + 22.0, base_y - 37.0, 3.0)
        .to_path(0.1);
    p.fill_vgrad(&panel, &[(0.0, theme.panel_top), (1.0, theme.panel_bottom)])?;

    // Asymmetric hair wedge, covering part of the right eye.
    let hair = polygon(&[
        (CX + 5.0, base_y - 80.0),
        (CX + 35.0, base_y - 75.0),
        (CX + 25.0, base_y - 45.0),
        (CX + 15.0, base_y - 50.0),
    ]);
    p.fill_vgrad(&hair, &[(0.0, theme.hair_top), (1.0, theme.hair_bottom)])?;

    let fringe = segment(
        Point::new(CX + 5.0, base_y - 80.0),
        Point::new(CX + 35.0, base_y - 75.0),
    );
    p.stroke(&fringe, 1.0, theme.accent_dim.with_alpha_scaled(0.5));
    Ok(())
}

fn left_eye_shape(eye_y: f64, h: f64) -> BezPath {
    RoundedRect::new(
        CX - 20.0,
        eye_y - h / 2.0,
        CX - 20.0 + EYE_WIDTH,
        eye_y + h / 2.0,
        h / 2.0,
    )
    .to_path(0.1)
}

fn right_eye_shape(eye_y: f64, h: f64) -> BezPath {
    RoundedRect::new(
        CX + 10.0,
        eye_y - h / 2.0,
        CX + 10.0 + EYE_WIDTH,
        eye_y + h / 2.0,
        h / 2.0,
    )
    .to_path(0.1)
}

fn draw_eyes(p: &mut Painter<'_>, pose: &FramePose, base_y: f64, theme: &Theme) -> MascotResult<()> {
    let h = eye_height(pose.eyes_closed);
    let eye_y = base_y - 60.0;
    let stops = [(0.0, theme.eye_top), (1.0, theme.eye_bottom)];

    p.fill_vgrad(&left_eye_shape(eye_y, h), &stops)?;

    // The right eye shows only through a narrow slit beside the hair wedge.
    let slit = Rect::new(
        CX + 10.0,
        eye_y - h / 2.0 - 1.0,
        CX + 15.0,
        eye_y + h / 2.0 + 1.0,
    )
    .to_path(0.1);
    let mut result = Ok(());
    p.clipped(&slit, |p| {
        result = p.fill_vgrad(&right_eye_shape(eye_y, h), &stops);
    });
    result
}

fn draw_mouth(p: &mut Painter<'_>, pose: &FramePose, base_y: f64, theme: &Theme) -> MascotResult<()> {
    let mh = mouth_height(pose.mouth_openness);
    let top = base_y - 45.0;
    let half = MOUTH_WIDTH / 2.0;

    let shape = polygon(&[
        (CX - half, top),
        (CX - half + 5.0, top + mh + 2.0),
        (CX + half - 5.0, top + mh + 2.0),
        (CX + half, top),
    ]);
    p.fill(&shape, theme.mouth);

    if !pose.speaking || mh <= 2.0 {
        return Ok(());
    }

    let inner = polygon(&[
        (CX - half + 3.0, top + 1.0),
        (CX - half + 7.0, top + mh + 1.0),
        (CX + half - 7.0, top + mh + 1.0),
        (CX + half - 3.0, top + 1.0),
    ]);
    p.fill_vgrad(
        &inner,
        &[
            (0.0, theme.glow_violet.with_alpha_scaled(0.9)),
            (1.0, theme.glow_deep.with_alpha_scaled(0.3)),
        ],
    )?;

    if mh > 5.0 {
        draw_mouth_waves(p, pose, top, mh, theme);
    }
    Ok(())
}

/// Decorative stacked sine traces inside the open mouth; amplitude shrinks
/// per line and the phase runs faster on each successive trace. Synthetic,
/// not derived from any audio samples.
fn draw_mouth_waves(p: &mut Painter<'_>, pose: &FramePose, top: f64, mh: f64, theme: &Theme) {
    let wave_count = (mh / 3.0).floor() as usize;
    let wave_width = MOUTH_WIDTH - 10.0;

    for i in 0..wave_count {
        let wave_y = top + 3.0 + (i as f64) * 3.0;
        let amplitude = (mh - (i as f64) * 2.0) / 8.0;
        let phase = signals::wave_phase(pose.t_ms, i);

        let steps = wave_width as usize;
        let mut pts = Vec::with_capacity(steps + 1);
        for xi in 0..=steps {
            let x = xi as f64;
            let wx = CX - wave_width / 2.0 + x;
            let wy = wave_y
                + ((x / wave_width) * std::f64::consts::PI * 4.0 + phase).sin() * amplitude;
            pts.push(Point::new(wx, wy));
        }
        p.stroke(&polyline(&pts), 1.0, theme.wave);
    }
}

/// Decorative circuit polylines across the face. Reseeded every frame from
/// the deterministic stream: they flicker frame to frame, yet a given
/// (seed, timestamp) always draws the same lines.
fn draw_circuits(p: &mut Painter<'_>, base_y: f64, theme: &Theme, rand: &mut FrameRand) {
    let color = theme.accent.with_alpha_scaled(0.5);
    for i in 0..CIRCUIT_LINES {
        let start = Point::new(
            CX - 20.0 + rand.range_f64(0.0, 10.0),
            base_y - 70.0 + (i as f64) * 7.0,
        );
        let end = Point::new(
            CX + 10.0 + rand.range_f64(0.0, 10.0),
            start.y + rand.range_f64(-5.0, 5.0),
        );

        let segments = rand.range_u32(2, 5) as usize;
        let mut pts = Vec::with_capacity(segments + 1);
        for s in 0..=segments {
            let f = s as f64 / segments as f64;
            pts.push(Point::new(
                start.x + (end.x - start.x) * f,
                start.y + (end.y - start.y) * f,
            ));
        }
        p.stroke(&polyline(&pts), 1.0, color);
    }
}

fn draw_data_points(
    p: &mut Painter<'_>,
    t: f64,
    base_y: f64,
    theme: &Theme,
    rand: &mut FrameRand,
) -> MascotResult<()> {
    for _ in 0..DATA_POINTS {
        let x = CX - 20.0 + rand.range_f64(0.0, 40.0);
        let y = base_y - 70.0 + rand.range_f64(0.0, 30.0);
        let size = 1.0 + rand.next_f64();
        let pulse = signals::data_point_pulse(t, x, y);
        let stops = [
            (0.0, theme.glow_violet.with_alpha_scaled(0.9)),
            (1.0, theme.glow_deep.with_alpha_scaled(0.0)),
        ];
        p.fill_glow(Point::new(x, y), size * pulse, &stops)?;
    }
    Ok(())
}

fn draw_cap(p: &mut Painter<'_>, base_y: f64, theme: &Theme) {
    let cap = polygon(&[
        (CX - 20.0, base_y - 95.0),
        (CX - 15.0, base_y - 80.0),
        (CX + 15.0, base_y - 80.0),
        (CX + 20.0, base_y - 95.0),
    ]);
    p.fill(&cap, theme.cap);

    let highlight = segment(
        Point::new(CX - 15.0, base_y - 85.0),
        Point::new(CX + 15.0, base_y - 85.0),
    );
    p.stroke(&highlight, 1.0, theme.accent.with_alpha_scaled(0.7));
}

fn draw_antennas(p: &mut Painter<'_>, t: f64, base_y: f64, theme: &Theme) -> MascotResult<()> {
    const RODS: [(f64, f64, f64); 3] = [
        // (x offset, height, wobble multiplier)
        (-10.0, 25.0, 1.0),
        (0.0, 30.0, 0.8),
        (10.0, 23.0, 1.2),
    ];

    let root_y = base_y - 95.0;
    let wobble = signals::antenna_wobble(t);
    for (x_offset, height, mult) in RODS {
        let sway = wobble * mult;
        let root = Point::new(CX + x_offset, root_y);
        let tip = Point::new(CX + x_offset + sway, root_y - height);
        p.stroke(&segment(root, tip), 2.0, theme.torso_mid);

        let radius = signals::antenna_tip_glow_radius(t, x_offset);
        p.fill_glow(tip, radius, &emissive_stops(theme.glow_violet, theme.glow_deep))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_height_is_exact() {
        assert_eq!(eye_height(true), 1.0);
        assert_eq!(eye_height(false), 10.0);
    }

    #[test]
    fn mouth_height_is_linear_in_openness() {
        assert_eq!(mouth_height(0.0), 0.0);
        assert_eq!(mouth_height(0.5), 7.5);
        assert_eq!(mouth_height(1.0), 15.0);
        // Defensive clamp for out-of-range callers.
        assert_eq!(mouth_height(2.0), 15.0);
        assert_eq!(mouth_height(-1.0), 0.0);
    }

    #[test]
    fn polygon_closes_and_polyline_does_not() {
        let poly = polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        assert!(matches!(poly.elements().last(), Some(kurbo::PathEl::ClosePath)));

        let line = polyline(&[Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        assert!(!matches!(line.elements().last(), Some(kurbo::PathEl::ClosePath)));
    }
}
