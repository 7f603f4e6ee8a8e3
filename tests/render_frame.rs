use mascot::{
    Avatar, AvatarRenderer, BlinkConfig, Canvas, FramePose, RenderSettings, Theme,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut h = 0xcbf2_9ce4_8422_2325u64;
    for &b in bytes {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01B3);
    }
    h
}

fn render_one(settings: RenderSettings, pose: &FramePose) -> mascot::FrameRGBA {
    let mut renderer = AvatarRenderer::new(settings).unwrap();
    renderer.render(pose).unwrap()
}

#[test]
fn frame_is_300x300_premultiplied_rgba() {
    init_tracing();
    let frame = render_one(
        RenderSettings::default(),
        &FramePose::new(0.0, false, false, 0.0),
    );
    assert_eq!((frame.width, frame.height), (300, 300));
    assert_eq!(frame.data.len(), 300 * 300 * 4);
    assert!(frame.premultiplied);

    // Premultiplied invariant: no channel exceeds its alpha.
    for px in frame.data.chunks_exact(4) {
        let a = px[3];
        assert!(px[0] <= a && px[1] <= a && px[2] <= a);
    }
}

#[test]
fn identical_inputs_produce_identical_bytes() {
    init_tracing();
    let pose = FramePose::new(0.6, false, true, 2718.0);
    let a = render_one(RenderSettings::default(), &pose);
    let b = render_one(RenderSettings::default(), &pose);
    assert_eq!(digest_u64(&a.data), digest_u64(&b.data));
}

#[test]
fn speaking_and_idle_frames_differ() {
    init_tracing();
    let t = 1500.0;
    let idle = render_one(RenderSettings::default(), &FramePose::new(0.0, false, false, t));
    let speaking = render_one(
        RenderSettings::default(),
        &FramePose::new(0.8, false, true, t),
    );
    assert_ne!(digest_u64(&idle.data), digest_u64(&speaking.data));
}

#[test]
fn blink_changes_the_frame() {
    init_tracing();
    let t = 1500.0;
    let open = render_one(RenderSettings::default(), &FramePose::new(0.0, false, false, t));
    let closed = render_one(RenderSettings::default(), &FramePose::new(0.0, true, false, t));
    assert_ne!(digest_u64(&open.data), digest_u64(&closed.data));
}

#[test]
fn theme_override_changes_the_frame() {
    init_tracing();
    let pose = FramePose::new(0.0, false, false, 300.0);
    let default_frame = render_one(RenderSettings::default(), &pose);

    let theme: Theme =
        serde_json::from_str(r#"{ "bg_top": { "r": 255, "g": 0, "b": 0, "a": 255 } }"#).unwrap();
    let red_frame = render_one(
        RenderSettings {
            theme,
            ..Default::default()
        },
        &pose,
    );
    assert_ne!(digest_u64(&default_frame.data), digest_u64(&red_frame.data));
}

#[test]
fn oversized_canvas_is_rejected() {
    init_tracing();
    let settings = RenderSettings {
        canvas: Canvas {
            width: 70_000,
            height: 300,
        },
        ..Default::default()
    };
    assert!(AvatarRenderer::new(settings).is_err());
}

#[test]
fn avatar_renders_through_the_session() {
    init_tracing();
    let mut avatar =
        Avatar::start(BlinkConfig::default(), RenderSettings::default(), 0.0).unwrap();
    avatar.set_speaking(true);

    let frame = avatar.on_frame(16.0).unwrap().expect("running session");
    assert_eq!((frame.width, frame.height), (300, 300));

    avatar.detach_surface();
    assert!(avatar.on_frame(32.0).unwrap().is_none());

    avatar.attach_surface(RenderSettings::default()).unwrap();
    assert!(avatar.on_frame(48.0).unwrap().is_some());

    avatar.stop();
    assert!(avatar.on_frame(64.0).unwrap().is_none());
}
