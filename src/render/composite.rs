//! Per-pixel compositing of premultiplied RGBA8 layers.

use crate::effects::blend::BlendMode;
use crate::foundation::error::{FxError, FxResult};

/// Premultiplied pixel in `0.0..=1.0`.
type Px = [f32; 4];

/// Composite `src` onto `dst` with a blend mode and opacity, limited by an optional per-pixel
/// clip coverage (one byte per pixel). Outside the clip `dst` is untouched; partial coverage
/// interpolates between `dst` and the composited result.
///
/// Porter-Duff modes (`clear`, `copy`, `sourcein`, ...) act over the whole layer, so transparent
/// areas of `src` participate as well.
pub(crate) fn composite_layer(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    mode: BlendMode,
    clip: Option<&[u8]>,
) -> FxResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(FxError::surface(
            "composite_layer expects equal-length rgba8 buffers",
        ));
    }
    if let Some(c) = clip
        && c.len() != dst.len() / 4
    {
        return Err(FxError::surface("clip coverage does not match layer size"));
    }
    let op = opacity.clamp(0.0, 1.0);

    // Dispatch once per layer; each arm monomorphizes its own kernel.
    match mode {
        BlendMode::Normal => run(dst, src, op, clip, |s, d| separable(s, d, |cs, _| cs)),
        BlendMode::Multiply => run(dst, src, op, clip, |s, d| separable(s, d, |cs, cb| cs * cb)),
        BlendMode::Screen => run(dst, src, op, clip, |s, d| {
            separable(s, d, |cs, cb| cs + cb - cs * cb)
        }),
        BlendMode::Overlay => run(dst, src, op, clip, |s, d| {
            separable(s, d, |cs, cb| hard_light(cb, cs))
        }),
        BlendMode::Darken => run(dst, src, op, clip, |s, d| separable(s, d, f32::min)),
        BlendMode::Lighten => run(dst, src, op, clip, |s, d| separable(s, d, f32::max)),
        BlendMode::ColorDodge => run(dst, src, op, clip, |s, d| {
            separable(s, d, |cs, cb| {
                if cb <= 0.0 {
                    0.0
                } else if cs >= 1.0 {
                    1.0
                } else {
                    (cb / (1.0 - cs)).min(1.0)
                }
            })
        }),
        BlendMode::ColorBurn => run(dst, src, op, clip, |s, d| {
            separable(s, d, |cs, cb| {
                if cb >= 1.0 {
                    1.0
                } else if cs <= 0.0 {
                    0.0
                } else {
                    1.0 - ((1.0 - cb) / cs).min(1.0)
                }
            })
        }),
        BlendMode::SoftLight => run(dst, src, op, clip, |s, d| separable(s, d, soft_light)),
        BlendMode::HardLight => run(dst, src, op, clip, |s, d| separable(s, d, hard_light)),
        BlendMode::Difference => run(dst, src, op, clip, |s, d| {
            separable(s, d, |cs, cb| (cb - cs).abs())
        }),
        BlendMode::Exclusion => run(dst, src, op, clip, |s, d| {
            separable(s, d, |cs, cb| cb + cs - 2.0 * cb * cs)
        }),

        BlendMode::Hue => run(dst, src, op, clip, |s, d| {
            non_separable(s, d, |cs, cb| set_lum(set_sat(cs, sat(cb)), lum(cb)))
        }),
        BlendMode::Saturation => run(dst, src, op, clip, |s, d| {
            non_separable(s, d, |cs, cb| set_lum(set_sat(cb, sat(cs)), lum(cb)))
        }),
        BlendMode::Color => run(dst, src, op, clip, |s, d| {
            non_separable(s, d, |cs, cb| set_lum(cs, lum(cb)))
        }),
        BlendMode::Luminosity => run(dst, src, op, clip, |s, d| {
            non_separable(s, d, |cs, cb| set_lum(cb, lum(cs)))
        }),

        BlendMode::Clear => run(dst, src, op, clip, |s, d| porter_duff(s, d, 0.0, 0.0)),
        BlendMode::Copy => run(dst, src, op, clip, |s, d| porter_duff(s, d, 1.0, 0.0)),
        BlendMode::SourceIn => run(dst, src, op, clip, |s, d| porter_duff(s, d, d[3], 0.0)),
        BlendMode::SourceOut => run(dst, src, op, clip, |s, d| {
            porter_duff(s, d, 1.0 - d[3], 0.0)
        }),
        BlendMode::SourceAtop => run(dst, src, op, clip, |s, d| {
            porter_duff(s, d, d[3], 1.0 - s[3])
        }),
        BlendMode::DestinationOver => run(dst, src, op, clip, |s, d| {
            porter_duff(s, d, 1.0 - d[3], 1.0)
        }),
        BlendMode::DestinationIn => run(dst, src, op, clip, |s, d| porter_duff(s, d, 0.0, s[3])),
        BlendMode::DestinationOut => run(dst, src, op, clip, |s, d| {
            porter_duff(s, d, 0.0, 1.0 - s[3])
        }),
        BlendMode::DestinationAtop => run(dst, src, op, clip, |s, d| {
            porter_duff(s, d, 1.0 - d[3], s[3])
        }),
        BlendMode::Xor => run(dst, src, op, clip, |s, d| {
            porter_duff(s, d, 1.0 - d[3], 1.0 - s[3])
        }),
        BlendMode::PlusDarker => run(dst, src, op, clip, |s, d| {
            let a = (s[3] + d[3]).min(1.0);
            let mut out = [0.0; 4];
            for c in 0..3 {
                out[c] = (a - ((d[3] - d[c]) + (s[3] - s[c]))).max(0.0);
            }
            out[3] = a;
            out
        }),
        BlendMode::PlusLighter => run(dst, src, op, clip, |s, d| {
            [
                (s[0] + d[0]).min(1.0),
                (s[1] + d[1]).min(1.0),
                (s[2] + d[2]).min(1.0),
                (s[3] + d[3]).min(1.0),
            ]
        }),
    }
    Ok(())
}

#[inline(always)]
fn run<F>(dst: &mut [u8], src: &[u8], opacity: f32, clip: Option<&[u8]>, kernel: F)
where
    F: Fn(Px, Px) -> Px,
{
    for (i, (d, s)) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)).enumerate() {
        let cov = clip.map_or(1.0, |c| f32::from(c[i]) / 255.0);
        if cov <= 0.0 {
            continue;
        }
        let sp = [
            unit(s[0]) * opacity,
            unit(s[1]) * opacity,
            unit(s[2]) * opacity,
            unit(s[3]) * opacity,
        ];
        let dp = [unit(d[0]), unit(d[1]), unit(d[2]), unit(d[3])];
        let out = kernel(sp, dp);
        let a = out[3].clamp(0.0, 1.0);
        for c in 0..4 {
            let v = if c == 3 { a } else { out[c].clamp(0.0, a) };
            d[c] = to_u8(dp[c] + (v - dp[c]) * cov);
        }
    }
}

fn unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

fn unpremul(p: Px) -> [f32; 3] {
    if p[3] <= 0.0 {
        return [0.0; 3];
    }
    [
        (p[0] / p[3]).clamp(0.0, 1.0),
        (p[1] / p[3]).clamp(0.0, 1.0),
        (p[2] / p[3]).clamp(0.0, 1.0),
    ]
}

#[inline(always)]
fn separable(s: Px, d: Px, blend: impl Fn(f32, f32) -> f32) -> Px {
    non_separable(s, d, |cs, cb| {
        [
            blend(cs[0], cb[0]),
            blend(cs[1], cb[1]),
            blend(cs[2], cb[2]),
        ]
    })
}

/// Source-over with the blend result mixed in where both layers overlap:
/// `out = s * (1 - da) + d * (1 - sa) + B(cs, cb) * sa * da`.
#[inline(always)]
fn non_separable(s: Px, d: Px, blend: impl Fn([f32; 3], [f32; 3]) -> [f32; 3]) -> Px {
    let (sa, da) = (s[3], d[3]);
    let b = blend(unpremul(s), unpremul(d));
    let mut out = [0.0; 4];
    for c in 0..3 {
        out[c] = s[c] * (1.0 - da) + d[c] * (1.0 - sa) + b[c].clamp(0.0, 1.0) * sa * da;
    }
    out[3] = sa + da * (1.0 - sa);
    out
}

#[inline(always)]
fn porter_duff(s: Px, d: Px, fa: f32, fb: f32) -> Px {
    [
        s[0] * fa + d[0] * fb,
        s[1] * fa + d[1] * fb,
        s[2] * fa + d[2] * fb,
        s[3] * fa + d[3] * fb,
    ]
}

fn hard_light(cs: f32, cb: f32) -> f32 {
    if cs <= 0.5 {
        2.0 * cs * cb
    } else {
        1.0 - 2.0 * (1.0 - cs) * (1.0 - cb)
    }
}

fn soft_light(cs: f32, cb: f32) -> f32 {
    if cs <= 0.5 {
        cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
    } else {
        let g = if cb <= 0.25 {
            ((16.0 * cb - 12.0) * cb + 4.0) * cb
        } else {
            cb.sqrt()
        };
        cb + (2.0 * cs - 1.0) * (g - cb)
    }
}

fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 && l - n > f32::EPSILON {
        for v in &mut out {
            *v = l + (*v - l) * l / (l - n);
        }
    }
    if x > 1.0 && x - l > f32::EPSILON {
        for v in &mut out {
            *v = l + (*v - l) * (1.0 - l) / (x - l);
        }
    }
    out
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|&a, &b| c[a].total_cmp(&c[b]));
    let [lo, mid, hi] = idx;
    let mut out = [0.0; 3];
    if c[hi] > c[lo] {
        out[mid] = (c[mid] - c[lo]) * s / (c[hi] - c[lo]);
        out[hi] = s;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
