use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle; `x..x+w` by `y..y+h`, exclusive of the far edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    #[inline]
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Smallest rectangle containing every point, so a single pixel has size 1x1.
    pub fn bounding<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for (x, y) in iter {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Intersection with a `width x height` image, `None` if empty.
    pub fn clip(&self, width: usize, height: usize) -> Option<Self> {
        let right = (self.right() as usize).min(width);
        let bottom = (self.bottom() as usize).min(height);
        let x = self.x as usize;
        let y = self.y as usize;
        if x >= right || y >= bottom {
            return None;
        }
        Some(Self::new(
            self.x,
            self.y,
            (right - x) as u32,
            (bottom - y) as u32,
        ))
    }
}

/// Canonical output size of the rectified form, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Destination quad `[(0,0), (W-1,0), (W-1,H-1), (0,H-1)]`.
    pub fn quad(&self) -> [Point2<f32>; 4] {
        let r = self.width as f32 - 1.0;
        let b = self.height as f32 - 1.0;
        [
            Point2::new(0.0, 0.0),
            Point2::new(r, 0.0),
            Point2::new(r, b),
            Point2::new(0.0, b),
        ]
    }
}

impl std::fmt::Display for TargetSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Unsigned polygon area by the shoelace formula over the closed vertex loop.
pub fn polygon_area(points: &[Point2<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice += p.x * q.y - q.x * p.y;
    }
    twice.abs() * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bounding_rect_counts_inclusive_pixels() {
        let r = PixelRect::bounding([(10, 20), (14, 20), (14, 29), (10, 29)]).expect("non-empty");
        assert_eq!(r, PixelRect::new(10, 20, 5, 10));
        assert!(PixelRect::bounding(std::iter::empty()).is_none());
    }

    #[test]
    fn clip_trims_to_image() {
        let r = PixelRect::new(90, 5, 20, 10);
        assert_eq!(r.clip(100, 100), Some(PixelRect::new(90, 5, 10, 10)));
        assert_eq!(r.clip(50, 100), None);
    }

    #[test]
    fn far_edges_saturate_instead_of_wrapping() {
        let wide = PixelRect::new(5, 0, u32::MAX, 10);
        assert_eq!(wide.right(), u32::MAX);
        assert_eq!(wide.clip(10, 10), Some(PixelRect::new(5, 0, 5, 10)));
        let far = PixelRect::new(u32::MAX - 5, 0, 10, 10);
        assert_eq!(far.clip(10, 10), None);
    }

    #[test]
    fn shoelace_matches_rectangle_area_in_either_winding() {
        let cw = [
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 30.0),
            Point2::new(40.0, 30.0),
            Point2::new(40.0, 0.0),
        ];
        let mut ccw = cw;
        ccw.reverse();
        assert_relative_eq!(polygon_area(&cw), 1200.0);
        assert_relative_eq!(polygon_area(&ccw), 1200.0);
        assert_relative_eq!(polygon_area(&cw[..2]), 0.0);
    }
}
