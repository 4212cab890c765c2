use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::MarkerPoint;

/// Strategy for assigning four marker centroids to the form corners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerOrder {
    /// Fixed swap-and-compare on OCR output positions.
    ///
    /// Compatible with existing templates, but it only works when OCR reports
    /// the markers so that indices 0/1 and 2/3 form the left and right
    /// columns (up to the single 0<->2 swap).
    #[default]
    IndexHeuristic,
    /// Assign each marker to the closest corner of the source image, choosing
    /// the one-to-one assignment with the smallest total squared distance.
    NearestCorner,
}

/// Four marker centroids with their roles on the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CornerSet {
    pub top_left: MarkerPoint,
    pub top_right: MarkerPoint,
    pub bottom_right: MarkerPoint,
    pub bottom_left: MarkerPoint,
}

impl CornerSet {
    /// Order four raw OCR centroids with the index heuristic.
    pub fn from_index_heuristic(points: [MarkerPoint; 4]) -> Self {
        let mut p = points;
        if p[0].x > p[2].x {
            p.swap(0, 2);
        }
        let (top_left, bottom_left) = if p[0].y > p[1].y {
            (p[1], p[0])
        } else {
            (p[0], p[1])
        };
        let (top_right, bottom_right) = if p[2].y > p[3].y {
            (p[3], p[2])
        } else {
            (p[2], p[3])
        };
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// Order four centroids by proximity to the corners of a `width x height` image.
    pub fn from_nearest_corner(points: [MarkerPoint; 4], width: usize, height: usize) -> Self {
        let max_x = width.saturating_sub(1) as i64;
        let max_y = height.saturating_sub(1) as i64;
        // tl, tr, br, bl
        let reference = [(0, 0), (max_x, 0), (max_x, max_y), (0, max_y)];
        let cost = |p: MarkerPoint, c: (i64, i64)| {
            let dx = p.x as i64 - c.0;
            let dy = p.y as i64 - c.1;
            dx * dx + dy * dy
        };

        let mut best: Option<(i64, [usize; 4])> = None;
        for a in 0..4 {
            for b in (0..4).filter(|&b| b != a) {
                for c in (0..4).filter(|&c| c != a && c != b) {
                    let d = 6 - a - b - c;
                    let perm = [a, b, c, d];
                    let total: i64 = perm
                        .iter()
                        .zip(reference)
                        .map(|(&i, corner)| cost(points[i], corner))
                        .sum();
                    if best.is_none_or(|(best_cost, _)| total < best_cost) {
                        best = Some((total, perm));
                    }
                }
            }
        }

        let [tl, tr, br, bl] = best.map(|(_, perm)| perm).unwrap_or([0, 1, 2, 3]);
        Self {
            top_left: points[tl],
            top_right: points[tr],
            bottom_right: points[br],
            bottom_left: points[bl],
        }
    }

    pub fn order(points: [MarkerPoint; 4], order: CornerOrder, width: usize, height: usize) -> Self {
        match order {
            CornerOrder::IndexHeuristic => Self::from_index_heuristic(points),
            CornerOrder::NearestCorner => Self::from_nearest_corner(points, width, height),
        }
    }

    /// Source quad in `[tl, tr, br, bl]` order.
    pub fn quad(&self) -> [Point2<f32>; 4] {
        [
            self.top_left.to_point(),
            self.top_right.to_point(),
            self.bottom_right.to_point(),
            self.bottom_left.to_point(),
        ]
    }
}
