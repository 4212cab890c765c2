use crate::image::sample_channel;
use crate::{GrayImage, GrayImageView, RgbImage, RgbImageView};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector2, Vector3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

/// Similarity that moves four points to their centroid and scales them so the
/// mean distance from it is sqrt(2).
struct Conditioning {
    t: Matrix3<f64>,
}

impl Conditioning {
    fn for_quad(pts: &[Point2<f32>; 4]) -> Self {
        let pts = pts.map(|p| Point2::new(p.x as f64, p.y as f64));
        let centroid = pts.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / 4.0;
        let spread = pts.iter().map(|p| (p.coords - centroid).norm()).sum::<f64>() / 4.0;
        let s = if spread > 1e-12 {
            std::f64::consts::SQRT_2 / spread
        } else {
            1.0
        };
        Self {
            t: Matrix3::new(
                s, 0.0, -s * centroid.x, //
                0.0, s, -s * centroid.y, //
                0.0, 0.0, 1.0,
            ),
        }
    }

    fn apply(&self, p: Point2<f32>) -> (f64, f64) {
        let v = self.t * Vector3::new(p.x as f64, p.y as f64, 1.0);
        (v.x, v.y)
    }
}

/// Compute H such that: dst ~ H * src (projective), using 4 point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// for degenerate configurations (three collinear points, repeated points).
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    let c_src = Conditioning::for_quad(src);
    let c_dst = Conditioning::for_quad(dst);

    // h33 fixed to 1; two rows per correspondence (x, y) -> (u, v)
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for (k, (&ps, &pd)) in src.iter().zip(dst).enumerate() {
        let (x, y) = c_src.apply(ps);
        let (u, v) = c_dst.apply(pd);
        let (ru, rv) = (2 * k, 2 * k + 1);
        for (col, val) in [(0, x), (1, y), (2, 1.0), (6, -u * x), (7, -u * y)] {
            a[(ru, col)] = val;
        }
        for (col, val) in [(3, x), (4, y), (5, 1.0), (6, -v * x), (7, -v * y)] {
            a[(rv, col)] = val;
        }
        b[ru] = u;
        b[rv] = v;
    }

    let sol = a.lu().solve(&b)?;
    let h_norm = Matrix3::new(
        sol[0], sol[1], sol[2], //
        sol[3], sol[4], sol[5], //
        sol[6], sol[7], 1.0,
    );
    let h = c_dst.t.try_inverse()? * h_norm * c_src.t;
    let scale = h[(2, 2)];
    if scale.abs() < 1e-12 {
        return None;
    }
    let h = h / scale;
    h.iter().all(|v| v.is_finite()).then(|| Homography::new(h))
}

/// Inverse-map every output pixel `(x, y)` through `h_img_from_rect` and sample all channels.
fn warp_channels(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    h_img_from_rect: Homography,
    out_w: usize,
    out_h: usize,
) -> Vec<u8> {
    let mut out = vec![0u8; out_w * out_h * channels];

    for y in 0..out_h {
        for x in 0..out_w {
            // integer pixel coordinates, same convention as the destination quad
            let pi = h_img_from_rect.apply(Point2::new(x as f32, y as f32));
            let base = (y * out_w + x) * channels;
            for c in 0..channels {
                let v = sample_channel(data, width, height, channels, c, pi.x, pi.y);
                out[base + c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}

/// Warp into rectified image: for each dst pixel, map to src via H_img_from_rect and sample.
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_img_from_rect: Homography,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    GrayImage {
        width: out_w,
        height: out_h,
        data: warp_channels(
            src.data,
            src.width,
            src.height,
            1,
            h_img_from_rect,
            out_w,
            out_h,
        ),
    }
}

/// RGB counterpart of [`warp_perspective_gray`].
pub fn warp_perspective_rgb(
    src: &RgbImageView<'_>,
    h_img_from_rect: Homography,
    out_w: usize,
    out_h: usize,
) -> RgbImage {
    RgbImage {
        width: out_w,
        height: out_h,
        data: warp_channels(
            src.data,
            src.width,
            src.height,
            3,
            h_img_from_rect,
            out_w,
            out_h,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f32>, b: Point2<f32>, tol: f32) {
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        assert!(
            dx < tol && dy < tol,
            "expected ({:.6},{:.6}) ~ ({:.6},{:.6}) within {}",
            a.x,
            a.y,
            b.x,
            b.y,
            tol
        );
    }

    #[test]
    fn inverse_round_trips_points() {
        let h = Homography::new(Matrix3::new(
            1.2, 0.1, 5.0, //
            -0.05, 0.9, 3.0, //
            0.001, 0.0005, 1.0,
        ));
        let inv = h.inverse().expect("invertible");

        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(50.0_f32, -20.0),
            Point2::new(320.0_f32, 200.0),
        ] {
            let q = h.apply(p);
            let back = inv.apply(q);
            assert_close(back, p, 1e-3);
        }
    }

    #[test]
    fn four_point_solve_recovers_h() {
        let ground_truth = Homography::new(Matrix3::new(
            0.8, 0.05, 120.0, //
            -0.02, 1.1, 80.0, //
            0.0009, -0.0004, 1.0,
        ));

        let rect = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(180.0_f32, 0.0),
            Point2::new(180.0_f32, 130.0),
            Point2::new(0.0_f32, 130.0),
        ];
        let dst = rect.map(|p| ground_truth.apply(p));

        let recovered = homography_from_4pt(&rect, &dst).expect("recoverable");

        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(60.0, 40.0),
            Point2::new(150.0, 120.0),
        ] {
            assert_close(recovered.apply(p), ground_truth.apply(p), 1e-3);
        }
    }

    #[test]
    fn collinear_points_are_rejected() {
        let src = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(20.0, 0.0),
            Point2::new(30.0, 0.0),
        ];
        let dst = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(homography_from_4pt(&src, &dst).is_none());
    }

    #[test]
    fn identity_warp_copies_pixels() {
        let src = GrayImage {
            width: 5,
            height: 3,
            data: (0..15).map(|v| v * 10).collect(),
        };
        let out = warp_perspective_gray(&src.view(), Homography::identity(), 5, 3);
        assert_eq!(out, src);
    }

    #[test]
    fn translation_warp_reads_black_outside_source() {
        let src = RgbImage {
            width: 2,
            height: 1,
            data: vec![10, 20, 30, 40, 50, 60],
        };
        let shift = Homography::new(Matrix3::new(
            1.0, 0.0, 1.0, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0,
        ));
        let out = warp_perspective_rgb(&src.view(), shift, 2, 1);
        assert_eq!(out.data, vec![40, 50, 60, 0, 0, 0]);
    }
}
