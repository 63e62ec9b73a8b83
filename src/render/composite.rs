use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{PinError, PinResult};
use crate::foundation::math::{add_sat_u8, mul_div255_u8};

pub type PremulRgba8 = [u8; 4];

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
    out[3] = add_sat_u8(sa, mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> PinResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(PinError::layout(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Source-over `src` (`sw x sh`) onto `dst` (`dst_w` wide) with its top-left at (`x0`, `y0`).
/// The region must lie inside `dst`.
#[allow(clippy::too_many_arguments)]
pub fn over_region_in_place(
    dst: &mut [u8],
    dst_w: u32,
    src: &[u8],
    sw: u32,
    sh: u32,
    x0: u32,
    y0: u32,
) -> PinResult<()> {
    let row_bytes = (dst_w as usize) * 4;
    let src_row_bytes = (sw as usize) * 4;
    if src.len() != src_row_bytes * (sh as usize) {
        return Err(PinError::layout("region buffer does not match its size"));
    }
    if row_bytes == 0
        || !dst.len().is_multiple_of(row_bytes)
        || u64::from(x0) + u64::from(sw) > u64::from(dst_w)
        || (y0 as usize + sh as usize) * row_bytes > dst.len()
    {
        return Err(PinError::layout("region lies outside the destination"));
    }
    for (row, s) in src.chunks_exact(src_row_bytes.max(4)).enumerate() {
        let start = (y0 as usize + row) * row_bytes + (x0 as usize) * 4;
        over_in_place(&mut dst[start..start + src_row_bytes], s, 1.0)?;
    }
    Ok(())
}

/// Source-over a constant color across the whole buffer.
pub fn fill_over_in_place(dst: &mut [u8], color: Rgba8Premul) {
    let src = color.to_array();
    if src[3] == 0 {
        return;
    }
    for d in dst.chunks_exact_mut(4) {
        let out = over([d[0], d[1], d[2], d[3]], src, 1.0);
        d.copy_from_slice(&out);
    }
}

/// `saturation` blend of an opaque black source: keeps the backdrop's luminance
/// (0.3/0.59/0.11 weights) and drops its chroma. The result is opaque.
pub fn desaturate_with_black_in_place(dst: &mut [u8]) {
    for d in dst.chunks_exact_mut(4) {
        let lum = (30 * u32::from(d[0]) + 59 * u32::from(d[1]) + 11 * u32::from(d[2]) + 50) / 100;
        let lum = lum.min(255) as u8;
        d.copy_from_slice(&[lum, lum, lum, 255]);
    }
}

/// Composite `coverage` (one alpha byte per pixel, `cw x ch`) tinted by `color` onto `dst`,
/// with its top-left corner at (`x0`, `y0`) in destination space. Out-of-range parts are dropped.
#[allow(clippy::too_many_arguments)]
pub fn tint_coverage_over(
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    coverage: &[u8],
    cw: u32,
    ch: u32,
    x0: i64,
    y0: i64,
    color: Rgba8Premul,
) -> PinResult<()> {
    if coverage.len() != (cw as usize) * (ch as usize) {
        return Err(PinError::layout("coverage buffer does not match its size"));
    }
    if dst.len() != (dst_w as usize) * (dst_h as usize) * 4 {
        return Err(PinError::layout("destination buffer does not match its size"));
    }
    let c = color.to_array();
    if c[3] == 0 {
        return Ok(());
    }
    for cy in 0..ch as i64 {
        let dy = y0 + cy;
        if dy < 0 || dy >= i64::from(dst_h) {
            continue;
        }
        for cx in 0..cw as i64 {
            let dx = x0 + cx;
            if dx < 0 || dx >= i64::from(dst_w) {
                continue;
            }
            let cov = coverage[(cy as usize) * (cw as usize) + cx as usize];
            if cov == 0 {
                continue;
            }
            let cov = u16::from(cov);
            let src = [
                mul_div255_u8(u16::from(c[0]), cov),
                mul_div255_u8(u16::from(c[1]), cov),
                mul_div255_u8(u16::from(c[2]), cov),
                mul_div255_u8(u16::from(c[3]), cov),
            ];
            let i = ((dy as usize) * (dst_w as usize) + dx as usize) * 4;
            let out = over([dst[i], dst[i + 1], dst[i + 2], dst[i + 3]], src, 1.0);
            dst[i..i + 4].copy_from_slice(&out);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
