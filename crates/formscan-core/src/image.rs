use crate::PixelRect;

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Interleaved 8-bit RGB view.
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h*3
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl RgbImage {
    pub fn view(&self) -> RgbImageView<'_> {
        RgbImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl GrayImageView<'_> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Arithmetic mean intensity over `rect`, clipped to the image bounds.
    ///
    /// Returns `None` when nothing of `rect` lies inside the image.
    pub fn mean_in_rect(&self, rect: PixelRect) -> Option<f64> {
        let clipped = rect.clip(self.width, self.height)?;
        let mut sum = 0u64;
        for y in clipped.y..clipped.bottom() {
            let row = &self.data[y as usize * self.width..][..self.width];
            sum += row[clipped.x as usize..clipped.right() as usize]
                .iter()
                .map(|&v| v as u64)
                .sum::<u64>();
        }
        Some(sum as f64 / clipped.area() as f64)
    }
}

/// Luma conversion with the ITU-R BT.601 weights used by most capture pipelines.
pub fn rgb_to_gray(src: &RgbImageView<'_>) -> GrayImage {
    let data = src
        .data
        .chunks_exact(3)
        .map(|px| {
            let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
            y.round().clamp(0.0, 255.0) as u8
        })
        .collect();
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}

#[inline]
fn get_channel(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    c: usize,
    x: i32,
    y: i32,
) -> u8 {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return 0;
    }
    data[(y as usize * width + x as usize) * channels + c]
}

/// Bilinear sample of channel `c` in an interleaved buffer; outside pixels read as 0.
#[inline]
pub(crate) fn sample_channel(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    c: usize,
    x: f32,
    y: f32,
) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_channel(data, width, height, channels, c, x0, y0) as f32;
    let p10 = get_channel(data, width, height, channels, c, x0 + 1, y0) as f32;
    let p01 = get_channel(data, width, height, channels, c, x0, y0 + 1) as f32;
    let p11 = get_channel(data, width, height, channels, c, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    sample_channel(src.data, src.width, src.height, 1, 0, x, y)
}

#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    sample_bilinear(src, x, y).round().clamp(0.0, 255.0) as u8
}
