use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    core::{Affine, BezPath, Circle, Fnv1a64, Point, Rgba8},
    error::{MascotError, MascotResult},
};

/// Rasterized gradient paints, cached across frames.
///
/// `vello_cpu` paints with solid colors and images; gradients are baked into
/// small images keyed by their geometry and stops. Glow radii are quantized
/// to whole pixels so
/// pulsing glows reuse a handful of images instead of thrashing the cache.
#[derive(Debug, Default)]
pub struct PaintCache {
    images: HashMap<u64, vello_cpu::Image>,
}

impl PaintCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.images.len()
    }
}

/// Color stop on a gradient ramp: offset in [0,1] plus a straight RGBA color.
pub type GradStop = (f64, Rgba8);

/// Immediate-mode painter over a `vello_cpu::RenderContext`.
///
/// Geometry is authored in canvas coordinates with `kurbo` and converted at
/// the boundary; local frames (arm joints) are entered via `set_transform`.
pub struct Painter<'a> {
    ctx: vello_cpu::RenderContext,
    cache: &'a mut PaintCache,
}

impl<'a> Painter<'a> {
    pub fn new(width: u16, height: u16, cache: &'a mut PaintCache) -> Self {
        let mut ctx = vello_cpu::RenderContext::new(width, height);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Self { ctx, cache }
    }

    /// Enter a local coordinate frame; composes with nothing (absolute set).
    pub fn set_transform(&mut self, a: Affine) {
        self.ctx.set_transform(affine_to_cpu(a));
    }

    pub fn reset_transform(&mut self) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    /// Fill a path with a solid straight-alpha color.
    pub fn fill(&mut self, path: &BezPath, color: Rgba8) {
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    /// Fill a path with a vertical gradient spanning its bounding box.
    pub fn fill_vgrad(&mut self, path: &BezPath, stops: &[GradStop]) -> MascotResult<()> {
        use kurbo::Shape as _;

        let bbox = path.bounding_box();
        let w = bbox.width().ceil().max(1.0) as u32;
        let h = bbox.height().ceil().max(1.0) as u32;
        let img = linear_image(self.cache, w, h, stops)?;

        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::translate((bbox.x0, bbox.y0)));
        self.ctx.set_paint(img);
        self.ctx.fill_path(&bezpath_to_cpu(path));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }

    /// Fill a radial glow disc: `stops` run from the center out to `radius`.
    pub fn fill_glow(
        &mut self,
        center: Point,
        radius: f64,
        stops: &[GradStop],
    ) -> MascotResult<()> {
        use kurbo::Shape as _;

        if !(radius > 0.0) {
            return Ok(());
        }
        // Quantize so pulsing radii share cache entries.
        let r_px = radius.ceil().max(1.0);
        let d = (r_px * 2.0) as u32;
        let img = radial_image(self.cache, d, stops)?;

        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::translate((
            center.x - r_px,
            center.y - r_px,
        )));
        self.ctx.set_paint(img);
        let disc = Circle::new(center, r_px).to_path(0.1);
        self.ctx.fill_path(&bezpath_to_cpu(&disc));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }

    /// Stroke a path with a solid color at the given width.
    pub fn stroke(&mut self, path: &BezPath, width: f64, color: Rgba8) {
        self.ctx
            .set_stroke(vello_cpu::kurbo::Stroke::new(width));
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.stroke_path(&bezpath_to_cpu(path));
    }

    /// Run `f` with drawing clipped to `clip`.
    pub fn clipped(&mut self, clip: &BezPath, f: impl FnOnce(&mut Self)) {
        self.ctx.push_clip_layer(&bezpath_to_cpu(clip));
        f(self);
        self.ctx.pop_layer();
    }

    /// Flush and rasterize everything drawn so far into `pixmap`.
    pub fn render_into(mut self, pixmap: &mut vello_cpu::Pixmap) {
        self.ctx.flush();
        self.ctx.render_to_pixmap(pixmap);
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn stops_key(kind: u8, w: u32, h: u32, stops: &[GradStop]) -> u64 {
    let mut hash = Fnv1a64::new(u64::from(kind));
    hash.write_u32(w);
    hash.write_u32(h);
    for &(offset, c) in stops {
        hash.write_u64(offset.to_bits());
        hash.write_bytes(&[c.r, c.g, c.b, c.a]);
    }
    hash.finish()
}

/// Straight-alpha interpolation along the ramp, premultiplied at the end,
/// matching how a 2D canvas resolves gradient stops.
fn ramp_color(stops: &[GradStop], t: f64) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    let Some(&(first_off, first)) = stops.first() else {
        return [0, 0, 0, 0];
    };
    if t <= first_off {
        return first.premul();
    }
    for pair in stops.windows(2) {
        let (o0, c0) = pair[0];
        let (o1, c1) = pair[1];
        if t <= o1 {
            let span = (o1 - o0).max(f64::EPSILON);
            let f = (t - o0) / span;
            let lerp = |a: u8, b: u8| -> u8 {
                (f64::from(a) + (f64::from(b) - f64::from(a)) * f)
                    .round()
                    .clamp(0.0, 255.0) as u8
            };
            return Rgba8::new(
                lerp(c0.r, c1.r),
                lerp(c0.g, c1.g),
                lerp(c0.b, c1.b),
                lerp(c0.a, c1.a),
            )
            .premul();
        }
    }
    stops[stops.len() - 1].1.premul()
}

fn pixels_to_image(
    pixels: Vec<vello_cpu::peniko::color::PremulRgba8>,
    w: u32,
    h: u32,
) -> MascotResult<vello_cpu::Image> {
    let w16: u16 = w
        .try_into()
        .map_err(|_| MascotError::render("gradient image width exceeds u16"))?;
    let h16: u16 = h
        .try_into()
        .map_err(|_| MascotError::render("gradient image height exceeds u16"))?;
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w16, h16, true);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn linear_image(
    cache: &mut PaintCache,
    w: u32,
    h: u32,
    stops: &[GradStop],
) -> MascotResult<vello_cpu::Image> {
    let key = stops_key(0, w, h, stops);
    if let Some(img) = cache.images.get(&key) {
        return Ok(img.clone());
    }

    let h1 = (h.max(1) - 1) as f64;
    let mut pixels = Vec::with_capacity(w as usize * h as usize);
    for y in 0..h {
        let t = if h1 <= 0.0 { 0.0 } else { f64::from(y) / h1 };
        let [r, g, b, a] = ramp_color(stops, t);
        let px = vello_cpu::peniko::color::PremulRgba8 { r, g, b, a };
        for _ in 0..w {
            pixels.push(px);
        }
    }

    let img = pixels_to_image(pixels, w, h)?;
    cache.images.insert(key, img.clone());
    Ok(img)
}

fn radial_image(
    cache: &mut PaintCache,
    d: u32,
    stops: &[GradStop],
) -> MascotResult<vello_cpu::Image> {
    let key = stops_key(1, d, d, stops);
    if let Some(img) = cache.images.get(&key) {
        return Ok(img.clone());
    }

    let r = f64::from(d) / 2.0;
    let mut pixels = Vec::with_capacity(d as usize * d as usize);
    for y in 0..d {
        for x in 0..d {
            let dx = f64::from(x) + 0.5 - r;
            let dy = f64::from(y) + 0.5 - r;
            let t = (dx * dx + dy * dy).sqrt() / r;
            let [pr, pg, pb, pa] = ramp_color(stops, t);
            pixels.push(vello_cpu::peniko::color::PremulRgba8 {
                r: pr,
                g: pg,
                b: pb,
                a: pa,
            });
        }
    }

    let img = pixels_to_image(pixels, d, d)?;
    cache.images.insert(key, img.clone());
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops() -> Vec<GradStop> {
        vec![
            (0.0, Rgba8::opaque(255, 0, 0)),
            (1.0, Rgba8::new(0, 0, 255, 0)),
        ]
    }

    #[test]
    fn ramp_endpoints_match_stops() {
        let s = stops();
        assert_eq!(ramp_color(&s, 0.0), [255, 0, 0, 255]);
        assert_eq!(ramp_color(&s, 1.0), [0, 0, 0, 0]);
        // Clamped outside the ramp.
        assert_eq!(ramp_color(&s, -1.0), [255, 0, 0, 255]);
        assert_eq!(ramp_color(&s, 2.0), [0, 0, 0, 0]);
    }

    #[test]
    fn ramp_midpoint_is_premultiplied() {
        let s = stops();
        let [r, _, b, a] = ramp_color(&s, 0.5);
        assert_eq!(a, 128);
        // Straight color at t=0.5 is (128, 0, 128); premultiplied by a=128.
        assert_eq!(r, 64);
        assert_eq!(b, 64);
    }

    #[test]
    fn gradient_images_are_cached_by_key() {
        let mut cache = PaintCache::new();
        let s = stops();
        let _ = linear_image(&mut cache, 10, 20, &s).unwrap();
        let _ = linear_image(&mut cache, 10, 20, &s).unwrap();
        assert_eq!(cache.len(), 1);
        let _ = radial_image(&mut cache, 10, &s).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn glow_with_nonpositive_radius_is_a_noop() {
        let mut cache = PaintCache::new();
        let mut painter = Painter::new(8, 8, &mut cache);
        painter
            .fill_glow(Point::new(4.0, 4.0), 0.0, &stops())
            .unwrap();
        let mut pixmap = vello_cpu::Pixmap::new(8, 8);
        painter.render_into(&mut pixmap);
        assert!(pixmap.data_as_u8_slice().iter().all(|&b| b == 0));
    }
}
