use crate::foundation::error::{BenchError, BenchResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// Source-over of one premultiplied pixel onto another, scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Source-over of `src` onto the `dst` row span that starts at pixel column `dst_x`.
///
/// Pixels of `src` falling left or right of `dst` are dropped.
pub fn over_row_at(dst: &mut [u8], src: &[u8], dst_x: i64, opacity: f32) -> BenchResult<()> {
    if !dst.len().is_multiple_of(4) || !src.len().is_multiple_of(4) {
        return Err(BenchError::validation(
            "over_row_at expects rgba8 rows (length multiple of 4)",
        ));
    }
    let dst_w = (dst.len() / 4) as i64;
    for (sx, s) in src.chunks_exact(4).enumerate() {
        let x = dst_x + sx as i64;
        if x < 0 {
            continue;
        }
        if x >= dst_w {
            break;
        }
        let idx = (x as usize) * 4;
        let d = &mut dst[idx..idx + 4];
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/composite/blend.rs"]
mod tests;
