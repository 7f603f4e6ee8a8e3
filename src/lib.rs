#![forbid(unsafe_code)]

//! Procedural avatar animation: a deterministic clock/behavior layer that
//! synthesizes mouth, blink, and idle motion signals, and a CPU compositor
//! that rasterizes the resulting pose into premultiplied RGBA8 frames.

pub mod avatar;
pub mod clock;
pub mod core;
pub mod error;
pub mod glow;
pub mod paint;
pub mod render;
pub mod scene;
pub mod session;
pub mod signals;
pub mod theme;

pub use avatar::Avatar;
pub use clock::{ManualClock, MonotonicClock, TimeSource};
pub use core::{Canvas, FrameRand, Rgba8};
pub use error::{MascotError, MascotResult};
pub use render::{AvatarRenderer, FrameRGBA, RenderSettings};
pub use session::{AnimationState, AvatarSession, FramePose, PlaybackEvent};
pub use signals::{BlinkConfig, BlinkSchedule};
pub use theme::Theme;
