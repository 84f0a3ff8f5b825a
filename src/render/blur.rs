use crate::effects::shadow::Shadow;
use crate::foundation::error::{FxError, FxResult};
use crate::foundation::math::mul_div255_u8;

/// Normalized gaussian weights in Q16 fixed point; they sum to exactly `1 << 16`.
pub(crate) fn gaussian_kernel_q16(radius: u32, sigma: f32) -> FxResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(FxError::invalid_effect("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(FxError::surface("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

/// Separable two-pass blur of a premultiplied RGBA8 buffer. Edges are clamped.
pub(crate) fn blur_rgba8_premul_q16(
    src: &[u8],
    dst: &mut [u8],
    width: u32,
    height: u32,
    kernel_q16: &[u32],
) {
    if kernel_q16.len() == 1 {
        dst.copy_from_slice(src);
        return;
    }
    let mut tmp = vec![0u8; src.len()];
    blur_pass_q16(src, &mut tmp, width, height, kernel_q16, Axis::X);
    blur_pass_q16(&tmp, dst, width, height, kernel_q16, Axis::Y);
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

fn blur_pass_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i32;
    let (w, h) = (width as i32, height as i32);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let off = ki as i32 - radius;
                let (sx, sy) = match axis {
                    Axis::X => ((x + off).clamp(0, w - 1), y),
                    Axis::Y => (x, (y + off).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for (c, a) in acc.iter().enumerate() {
                dst[out_idx + c] = q16_to_u8(*a);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

/// Kernel radius and sigma for a shadow blur, capped at `max_radius`.
pub(crate) fn shadow_kernel(blur: f64, max_radius: u32) -> FxResult<Vec<u32>> {
    if blur <= 0.0 {
        return gaussian_kernel_q16(0, 1.0);
    }
    let radius = (blur.ceil() as u32).min(max_radius);
    let sigma = (blur / 2.0) as f32;
    gaussian_kernel_q16(radius, sigma.max(f32::EPSILON))
}

/// Render the shadow cast by a premultiplied layer: the layer's alpha tinted with the shadow
/// color, blurred, then shifted by the shadow's device offset (rounded to whole pixels).
pub(crate) fn shadow_layer(
    src: &[u8],
    width: u32,
    height: u32,
    shadow: &Shadow,
    max_radius: u32,
) -> FxResult<Vec<u8>> {
    let tint = shadow.color().to_rgba8_premul().to_array();
    let mut tinted = vec![0u8; src.len()];
    for (t, s) in tinted.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        for c in 0..4 {
            t[c] = mul_div255_u8(u16::from(tint[c]), a);
        }
    }

    let kernel = shadow_kernel(shadow.blur(), max_radius)?;
    let mut blurred = vec![0u8; src.len()];
    blur_rgba8_premul_q16(&tinted, &mut blurred, width, height, &kernel);

    let off = shadow.device_offset();
    let (dx, dy) = (off.x.round() as i64, off.y.round() as i64);
    if dx == 0 && dy == 0 {
        return Ok(blurred);
    }
    let mut out = vec![0u8; src.len()];
    let (w, h) = (i64::from(width), i64::from(height));
    for y in 0..h {
        let sy = y - dy;
        if sy < 0 || sy >= h {
            continue;
        }
        for x in 0..w {
            let sx = x - dx;
            if sx < 0 || sx >= w {
                continue;
            }
            let di = ((y * w + x) as usize) * 4;
            let si = ((sy * w + sx) as usize) * 4;
            out[di..di + 4].copy_from_slice(&blurred[si..si + 4]);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
