use crate::error::{MascotError, MascotResult};

pub use kurbo::{Affine, BezPath, Circle, Ellipse, Point, Rect, RoundedRect, Vec2};

/// Logical raster size of the avatar surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// The fixed logical size the avatar scene is authored against.
    pub const AVATAR: Self = Self {
        width: 300,
        height: 300,
    };

    pub fn validate(self) -> MascotResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MascotError::validation("Canvas sides must be > 0"));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(MascotError::validation("Canvas sides must fit in u16"));
        }
        Ok(())
    }
}

/// Straight (non-premultiplied) RGBA8 color, the form theme files use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Same color with alpha scaled by `f` (clamped to [0,1]).
    pub fn with_alpha_scaled(self, f: f64) -> Self {
        let f = f.clamp(0.0, 1.0);
        Self {
            a: ((f64::from(self.a) * f).round().clamp(0.0, 255.0)) as u8,
            ..self
        }
    }

    /// Premultiplied r,g,b,a bytes, the form renderers store.
    pub fn premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new(seed: u64) -> Self {
        Self(seed ^ Self::OFFSET_BASIS)
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

/// Tiny splitmix64 stream for per-frame decorative jitter.
///
/// Decorations (circuit polylines, data points) are reseeded every frame, but
/// deterministically: the stream seed is a pure function of the global seed
/// and the frame timestamp, so a given frame always rasterizes identically.
#[derive(Clone, Copy, Debug)]
pub struct FrameRand(u64);

impl FrameRand {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform f64 in [0,1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform f64 in [lo,hi).
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Uniform u32 in [lo,hi).
    pub fn range_u32(&mut self, lo: u32, hi: u32) -> u32 {
        debug_assert!(lo < hi);
        lo + (self.next_u64() % u64::from(hi - lo)) as u32
    }
}

/// Derive the decoration stream seed for one frame.
pub(crate) fn frame_seed(seed: u64, t_ms: f64) -> u64 {
    let mut h = Fnv1a64::new(seed);
    h.write_u64(t_ms.to_bits());
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_validate_rejects_degenerate_sizes() {
        assert!(Canvas { width: 0, height: 1 }.validate().is_err());
        assert!(
            Canvas {
                width: 70_000,
                height: 1
            }
            .validate()
            .is_err()
        );
        assert!(Canvas::AVATAR.validate().is_ok());
    }

    #[test]
    fn premul_endpoints() {
        assert_eq!(Rgba8::opaque(10, 20, 30).premul(), [10, 20, 30, 255]);
        assert_eq!(Rgba8::new(10, 20, 30, 0).premul(), [0, 0, 0, 0]);
    }

    #[test]
    fn frame_rand_is_deterministic_per_seed() {
        let mut a = FrameRand::new(7);
        let mut b = FrameRand::new(7);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        let mut c = FrameRand::new(8);
        assert_ne!(FrameRand::new(7).next_u64(), c.next_u64());
    }

    #[test]
    fn frame_rand_ranges_stay_in_bounds() {
        let mut r = FrameRand::new(42);
        for _ in 0..1000 {
            let v = r.range_f64(2.0, 5.0);
            assert!((2.0..5.0).contains(&v));
            let n = r.range_u32(2, 5);
            assert!((2..5).contains(&n));
        }
    }

    #[test]
    fn frame_seed_differs_per_timestamp() {
        assert_ne!(frame_seed(1, 16.0), frame_seed(1, 32.0));
        assert_eq!(frame_seed(1, 16.0), frame_seed(1, 16.0));
    }
}
