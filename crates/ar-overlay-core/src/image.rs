/// Borrowed view over a packed RGB buffer (row-major, 3 bytes per pixel).
#[derive(Clone, Copy, Debug)]
pub struct RgbFrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // len = 3 * w * h
}

/// Owned packed RGB buffer.
#[derive(Clone, Debug)]
pub struct RgbFrame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbFrame {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; 3 * width * height],
        }
    }

    pub fn view(&self) -> RgbFrameView<'_> {
        RgbFrameView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

#[inline]
fn get_rgb(src: &RgbFrameView<'_>, x: i32, y: i32) -> [u8; 3] {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return [0, 0, 0];
    }
    let i = 3 * (y as usize * src.width + x as usize);
    [src.data[i], src.data[i + 1], src.data[i + 2]]
}

#[inline]
pub fn sample_bilinear_rgb(src: &RgbFrameView<'_>, x: f32, y: f32) -> [f32; 3] {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_rgb(src, x0, y0);
    let p10 = get_rgb(src, x0 + 1, y0);
    let p01 = get_rgb(src, x0, y0 + 1);
    let p11 = get_rgb(src, x0 + 1, y0 + 1);

    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let a = p00[c] as f32 + fx * (p10[c] as f32 - p00[c] as f32);
        let b = p01[c] as f32 + fx * (p11[c] as f32 - p01[c] as f32);
        out[c] = a + fy * (b - a);
    }
    out
}

#[inline]
pub fn sample_bilinear_rgb_u8(src: &RgbFrameView<'_>, x: f32, y: f32) -> [u8; 3] {
    let v = sample_bilinear_rgb(src, x, y);
    [
        v[0].clamp(0.0, 255.0) as u8,
        v[1].clamp(0.0, 255.0) as u8,
        v[2].clamp(0.0, 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> RgbFrame {
        // (0,0) red, (1,0) green, (0,1) blue, (1,1) white
        RgbFrame {
            width: 2,
            height: 2,
            data: vec![
                255, 0, 0, 0, 255, 0, //
                0, 0, 255, 255, 255, 255,
            ],
        }
    }

    #[test]
    fn sampling_at_pixel_centers_is_exact() {
        let img = two_by_two();
        let v = img.view();
        assert_eq!(sample_bilinear_rgb_u8(&v, 0.0, 0.0), [255, 0, 0]);
        assert_eq!(sample_bilinear_rgb_u8(&v, 1.0, 0.0), [0, 255, 0]);
        assert_eq!(sample_bilinear_rgb_u8(&v, 0.0, 1.0), [0, 0, 255]);
        assert_eq!(sample_bilinear_rgb_u8(&v, 1.0, 1.0), [255, 255, 255]);
    }

    #[test]
    fn sampling_between_pixels_interpolates() {
        let img = two_by_two();
        let v = img.view();
        let mid = sample_bilinear_rgb(&v, 0.5, 0.0);
        approx::assert_abs_diff_eq!(mid[0], 127.5, epsilon = 1e-3);
        approx::assert_abs_diff_eq!(mid[1], 127.5, epsilon = 1e-3);
        approx::assert_abs_diff_eq!(mid[2], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn sampling_outside_reads_black() {
        let img = two_by_two();
        let v = img.view();
        assert_eq!(sample_bilinear_rgb_u8(&v, -5.0, -5.0), [0, 0, 0]);
        assert_eq!(sample_bilinear_rgb_u8(&v, 10.0, 0.0), [0, 0, 0]);
    }
}
