use crate::error::{MascotError, MascotResult};

/// Separable Gaussian blur over premultiplied RGBA8, used to soften the
/// emissive layer (eye glow, speaking outline) before compositing.
///
/// Fixed-point Q16 kernel weights; edge pixels clamp.
pub fn blur_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> MascotResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| MascotError::render("glow buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(MascotError::render(
            "blur_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];
    blur_pass(src, &mut tmp, width, height, &kernel, Axis::X);
    blur_pass(&tmp, &mut out, width, height, &kernel, Axis::Y);
    Ok(out)
}

/// Source-over the blurred glow onto the scene, both premultiplied RGBA8.
///
/// The scene is opaque underneath, so this is plain premultiplied `over`
/// with no extra opacity knob.
pub fn composite_over(scene: &mut [u8], glow: &[u8]) -> MascotResult<()> {
    if scene.len() != glow.len() || !scene.len().is_multiple_of(4) {
        return Err(MascotError::render(
            "glow composite expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in scene.chunks_exact_mut(4).zip(glow.chunks_exact(4)) {
        match s[3] {
            0 => {}
            255 => d.copy_from_slice(s),
            sa => {
                let inv = u16::from(255 - sa);
                for c in 0..4 {
                    let kept = (u16::from(d[c]) * inv + 127) / 255;
                    d[c] = s[c].saturating_add(kept as u8);
                }
            }
        }
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> MascotResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(MascotError::validation("glow sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(MascotError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|&w| (((w / sum) * 65536.0).round() as i64).clamp(0, 65536) as u32)
        .collect();

    // Push rounding error into the center tap so the kernel sums to one.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn blur_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let offset = ki as i32 - radius;
                let (sx, sy) = match axis {
                    Axis::X => ((x + offset).clamp(0, w - 1), y),
                    Axis::Y => (x, (y + offset).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px_index(w: u32, x: u32, y: u32) -> usize {
        ((y * w + x) * 4) as usize
    }

    #[test]
    fn zero_radius_returns_input_unchanged() {
        let src: Vec<u8> = (0u8..32).collect();
        assert_eq!(blur_premul(&src, 4, 2, 0, 2.0).unwrap(), src);
    }

    #[test]
    fn flat_field_survives_blur() {
        // A clamped-edge kernel that sums to one maps a constant image to
        // itself, whatever the radius.
        let px = [60u8, 0, 120, 200];
        let src: Vec<u8> = std::iter::repeat(px).take(36).flatten().collect();
        for radius in [1, 2, 4] {
            let out = blur_premul(&src, 6, 6, radius, radius as f32 / 2.0).unwrap();
            assert_eq!(out, src, "radius {radius}");
        }
    }

    #[test]
    fn point_glow_spreads_without_gaining_energy() {
        let (w, h) = (9u32, 9u32);
        let mut src = vec![0u8; (w * h * 4) as usize];
        let center = px_index(w, 4, 4);
        src[center..center + 4].copy_from_slice(&[200, 100, 240, 255]);

        let out = blur_premul(&src, w, h, 3, 1.5).unwrap();

        // The spike attenuates in place and leaks into its neighbors.
        assert!(out[center + 3] < 255);
        assert!(out[px_index(w, 3, 4) + 3] > 0);
        assert!(out[px_index(w, 4, 3) + 3] > 0);

        // Total alpha is redistributed, not created, up to rounding.
        let total: i64 = out.chunks_exact(4).map(|p| i64::from(p[3])).sum();
        assert!((total - 255).abs() <= 4, "total alpha drifted to {total}");
    }

    #[test]
    fn composite_leaves_scene_where_glow_is_transparent() {
        let mut scene = vec![10u8, 20, 30, 255, 40, 50, 60, 255];
        let snapshot = scene.clone();
        composite_over(&mut scene, &[0u8; 8]).unwrap();
        assert_eq!(scene, snapshot);
    }

    #[test]
    fn composite_replaces_scene_under_opaque_glow() {
        let mut scene = vec![10u8, 20, 30, 255];
        composite_over(&mut scene, &[170, 34, 255, 255]).unwrap();
        assert_eq!(scene, vec![170, 34, 255, 255]);
    }

    #[test]
    fn composite_blend_stays_premultiplied() {
        // Half-covered glow over an opaque pixel: result alpha stays 255 and
        // every channel stays at or below it.
        let mut scene = vec![100u8, 100, 100, 255];
        composite_over(&mut scene, &[64, 32, 128, 128]).unwrap();
        assert_eq!(scene[3], 255);
        assert!(scene[..3].iter().all(|&c| c <= scene[3]));
        // Glow contribution plus attenuated scene, channel by channel.
        assert_eq!(scene[0], 64 + ((100u16 * 127 + 127) / 255) as u8);
    }

    #[test]
    fn composite_rejects_mismatched_buffers() {
        let mut scene = vec![0u8; 8];
        assert!(composite_over(&mut scene, &[0u8; 4]).is_err());
        let mut ragged = vec![0u8; 6];
        assert!(composite_over(&mut ragged, &[0u8; 6]).is_err());
    }

    #[test]
    fn bad_sigma_is_rejected() {
        let src = vec![0u8; 16];
        assert!(blur_premul(&src, 2, 2, 1, 0.0).is_err());
        assert!(blur_premul(&src, 2, 2, 1, f32::NAN).is_err());
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let src = vec![0u8; 15];
        assert!(blur_premul(&src, 2, 2, 1, 1.0).is_err());
    }
}
