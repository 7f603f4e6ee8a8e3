use crate::{
    error::MascotResult,
    render::{AvatarRenderer, FrameRGBA, RenderSettings},
    session::{AvatarSession, PlaybackEvent},
    signals::BlinkConfig,
};

/// A complete avatar: one animation session plus an optional render surface.
///
/// The host calls [`Avatar::on_frame`] once per display refresh. Detaching
/// the surface keeps the session ticking (blink deadlines keep advancing) but
/// skips rasterization entirely.
#[derive(Debug)]
pub struct Avatar {
    session: AvatarSession,
    renderer: Option<AvatarRenderer>,
}

impl Avatar {
    pub fn start(cfg: BlinkConfig, settings: RenderSettings, now_ms: f64) -> MascotResult<Self> {
        let session = AvatarSession::start(cfg, settings.seed, now_ms)?;
        let renderer = AvatarRenderer::new(settings)?;
        Ok(Self {
            session,
            renderer: Some(renderer),
        })
    }

    /// Start without a surface; attach one later with [`Avatar::attach_surface`].
    pub fn start_detached(cfg: BlinkConfig, seed: u64, now_ms: f64) -> MascotResult<Self> {
        Ok(Self {
            session: AvatarSession::start(cfg, seed, now_ms)?,
            renderer: None,
        })
    }

    pub fn attach_surface(&mut self, settings: RenderSettings) -> MascotResult<()> {
        self.renderer = Some(AvatarRenderer::new(settings)?);
        Ok(())
    }

    pub fn detach_surface(&mut self) {
        self.renderer = None;
    }

    pub fn session(&self) -> &AvatarSession {
        &self.session
    }

    pub fn set_speaking(&mut self, speaking: bool) {
        self.session.set_speaking(speaking);
    }

    pub fn handle_playback(&mut self, event: PlaybackEvent) {
        self.session.handle_playback(event);
    }

    /// Advance the session to `now_ms` and render the resulting frame.
    ///
    /// Returns `Ok(None)` when the session has been stopped or no surface is
    /// attached.
    pub fn on_frame(&mut self, now_ms: f64) -> MascotResult<Option<FrameRGBA>> {
        let Some(pose) = self.session.tick(now_ms) else {
            return Ok(None);
        };
        let Some(renderer) = self.renderer.as_mut() else {
            tracing::debug!(t_ms = now_ms, "no surface attached, skipping render");
            return Ok(None);
        };
        renderer.render(&pose).map(Some)
    }

    pub fn stop(&mut self) {
        self.session.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_avatar_ticks_but_does_not_render() {
        let mut avatar = Avatar::start_detached(BlinkConfig::default(), 1, 0.0).unwrap();
        assert!(avatar.on_frame(16.0).unwrap().is_none());
        assert_eq!(avatar.session().tick_count(), 1);
    }

    #[test]
    fn stopped_avatar_returns_no_frames() {
        let mut avatar =
            Avatar::start(BlinkConfig::default(), RenderSettings::default(), 0.0).unwrap();
        avatar.stop();
        assert!(avatar.on_frame(16.0).unwrap().is_none());
    }
}
