use crate::foundation::error::{PinError, PinResult};

/// Gaussian radius covering 3 sigma.
pub fn radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil() as u32
}

/// Integer downscale factor that keeps the reduced sigma at 2.5 px or more.
pub fn downscale_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma < 5.0 {
        return 1;
    }
    (sigma / 2.5).floor() as u32
}

/// Separable gaussian blur over a single 8-bit channel (shadow coverage).
pub fn blur_alpha(src: &[u8], width: u32, height: u32, radius: u32, sigma: f32) -> PinResult<Vec<u8>> {
    let expected_len = checked_len(width, height)?;
    if src.len() != expected_len {
        return Err(PinError::layout("blur expects src matching width*height"));
    }
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

/// Gaussian blur with radius `3 * sigma`, computed at reduced resolution for wide kernels.
///
/// Coverage is box-averaged down by [`downscale_for_sigma`], blurred with the matching smaller
/// sigma and bilinearly upsampled back to `width x height`.
pub fn blur_alpha_scaled(src: &[u8], width: u32, height: u32, sigma: f32) -> PinResult<Vec<u8>> {
    let factor = downscale_for_sigma(sigma);
    if factor <= 1 {
        return blur_alpha(src, width, height, radius_for_sigma(sigma), sigma);
    }
    if src.len() != checked_len(width, height)? {
        return Err(PinError::layout("blur expects src matching width*height"));
    }
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let (sw, sh) = (width.div_ceil(factor), height.div_ceil(factor));
    let small = downsample(src, width, height, factor, sw, sh);
    let small_sigma = sigma / factor as f32;
    let blurred = blur_alpha(&small, sw, sh, radius_for_sigma(small_sigma), small_sigma)?;
    Ok(upsample(&blurred, sw, sh, width, height, factor))
}

fn checked_len(width: u32, height: u32) -> PinResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| PinError::layout("blur buffer size overflow"))
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> PinResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(PinError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        let row = (y * w) as usize;
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                acc += u64::from(kw) * u64::from(src[row + sx as usize]);
            }
            dst[row + x as usize] = q16_to_u8(acc);
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                acc += u64::from(kw) * u64::from(src[(sy * w + x) as usize]);
            }
            dst[(y * w + x) as usize] = q16_to_u8(acc);
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

/// Box average of `factor x factor` blocks; edge blocks average only the pixels they hold.
fn downsample(src: &[u8], width: u32, height: u32, factor: u32, sw: u32, sh: u32) -> Vec<u8> {
    let mut out = vec![0u8; (sw as usize) * (sh as usize)];
    for by in 0..sh {
        let y0 = by * factor;
        let y1 = (y0 + factor).min(height);
        for bx in 0..sw {
            let x0 = bx * factor;
            let x1 = (x0 + factor).min(width);
            let mut sum = 0u32;
            for y in y0..y1 {
                let row = (y as usize) * (width as usize);
                sum += src[row + x0 as usize..row + x1 as usize]
                    .iter()
                    .map(|&a| u32::from(a))
                    .sum::<u32>();
            }
            let n = (y1 - y0) * (x1 - x0);
            out[(by as usize) * (sw as usize) + bx as usize] = ((sum + n / 2) / n).min(255) as u8;
        }
    }
    out
}

/// Bilinear upsample with sample centers at block centers, clamped at the edges.
fn upsample(small: &[u8], sw: u32, sh: u32, width: u32, height: u32, factor: u32) -> Vec<u8> {
    let f = factor as f32;
    let taps = |i: u32, n: u32| -> (usize, usize, f32) {
        let u = ((i as f32 + 0.5) / f - 0.5).clamp(0.0, (n - 1) as f32);
        let i0 = u.floor() as u32;
        let i1 = (i0 + 1).min(n - 1);
        (i0 as usize, i1 as usize, u - i0 as f32)
    };
    let cols: Vec<(usize, usize, f32)> = (0..width).map(|x| taps(x, sw)).collect();

    let mut out = vec![0u8; (width as usize) * (height as usize)];
    let sw = sw as usize;
    for (y, row) in out.chunks_exact_mut(width as usize).enumerate() {
        let (r0, r1, ty) = taps(y as u32, sh);
        let (top, bottom) = (&small[r0 * sw..(r0 + 1) * sw], &small[r1 * sw..(r1 + 1) * sw]);
        for (px, &(c0, c1, tx)) in row.iter_mut().zip(&cols) {
            let t = f32::from(top[c0]) + (f32::from(top[c1]) - f32::from(top[c0])) * tx;
            let b = f32::from(bottom[c0]) + (f32::from(bottom[c1]) - f32::from(bottom[c0])) * tx;
            *px = (t + (b - t) * ty).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
