use crate::core::Rgba8;

/// Scene palette. Defaults reproduce the dark purple-on-black look the
/// avatar was designed with; hosts can override any subset from JSON.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Theme {
    pub bg_top: Rgba8,
    pub bg_bottom: Rgba8,

    /// Bright emissive violet used by particles, the core, and data points.
    pub glow_violet: Rgba8,
    /// Deep violet the glows fade out into.
    pub glow_deep: Rgba8,
    /// Edge/circuit accent purple.
    pub accent: Rgba8,
    /// Muted accent for the hair highlight.
    pub accent_dim: Rgba8,
    /// Ground shadow tint.
    pub shadow: Rgba8,

    pub torso_top: Rgba8,
    pub torso_mid: Rgba8,
    pub torso_bottom: Rgba8,
    pub chest_top: Rgba8,
    pub chest_bottom: Rgba8,

    pub limb_top: Rgba8,
    pub limb_bottom: Rgba8,
    pub forearm_top: Rgba8,
    pub forearm_bottom: Rgba8,
    pub hand: Rgba8,

    pub head_top: Rgba8,
    pub head_bottom: Rgba8,
    pub neck_top: Rgba8,
    pub panel_top: Rgba8,
    pub panel_bottom: Rgba8,
    pub hair_top: Rgba8,
    pub hair_bottom: Rgba8,
    pub cap: Rgba8,

    pub eye_top: Rgba8,
    pub eye_bottom: Rgba8,
    pub eye_glow: Rgba8,

    pub mouth: Rgba8,
    pub wave: Rgba8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg_top: Rgba8::opaque(0x12, 0x12, 0x12),
            bg_bottom: Rgba8::opaque(0x08, 0x08, 0x08),

            glow_violet: Rgba8::opaque(180, 50, 220),
            glow_deep: Rgba8::opaque(60, 0, 120),
            accent: Rgba8::opaque(140, 30, 180),
            accent_dim: Rgba8::opaque(100, 20, 140),
            shadow: Rgba8::opaque(120, 0, 180),

            torso_top: Rgba8::opaque(0x12, 0x12, 0x12),
            torso_mid: Rgba8::opaque(0x22, 0x22, 0x22),
            torso_bottom: Rgba8::opaque(0x18, 0x18, 0x18),
            chest_top: Rgba8::opaque(0x28, 0x28, 0x28),
            chest_bottom: Rgba8::opaque(0x18, 0x18, 0x18),

            limb_top: Rgba8::opaque(0x20, 0x20, 0x20),
            limb_bottom: Rgba8::opaque(0x13, 0x13, 0x13),
            forearm_top: Rgba8::opaque(0x18, 0x18, 0x18),
            forearm_bottom: Rgba8::opaque(0x0f, 0x0f, 0x0f),
            hand: Rgba8::opaque(0x0f, 0x0f, 0x0f),

            head_top: Rgba8::opaque(0x18, 0x18, 0x18),
            head_bottom: Rgba8::opaque(0x0a, 0x0a, 0x0a),
            neck_top: Rgba8::opaque(0x15, 0x15, 0x15),
            panel_top: Rgba8::opaque(0x0f, 0x0f, 0x0f),
            panel_bottom: Rgba8::opaque(0x15, 0x15, 0x15),
            hair_top: Rgba8::opaque(0x00, 0x00, 0x00),
            hair_bottom: Rgba8::opaque(0x15, 0x15, 0x15),
            cap: Rgba8::opaque(0x0a, 0x0a, 0x0a),

            eye_top: Rgba8::opaque(0xc0, 0x30, 0xff),
            eye_bottom: Rgba8::opaque(0x70, 0x10, 0xaa),
            eye_glow: Rgba8::opaque(0xaa, 0x20, 0xff),

            mouth: Rgba8::opaque(0x08, 0x08, 0x08),
            wave: Rgba8::new(200, 100, 240, 178),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_json_roundtrip_with_partial_override() {
        let json = r#"{ "eye_top": { "r": 1, "g": 2, "b": 3, "a": 255 } }"#;
        let theme: Theme = serde_json::from_str(json).unwrap();
        assert_eq!(theme.eye_top, Rgba8::opaque(1, 2, 3));
        // Untouched fields keep their defaults.
        assert_eq!(theme.bg_top, Theme::default().bg_top);

        let back = serde_json::to_string(&theme).unwrap();
        let again: Theme = serde_json::from_str(&back).unwrap();
        assert_eq!(again.eye_top, theme.eye_top);
    }
}
