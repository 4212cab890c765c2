use formscan_core::{GrayImage, Homography};
use formscan_markers::{
    CornerOrder, MarkerLocator, MarkerPoint, OcrToken, Rectifier, RectifyError, StaticOcr,
    TargetSize,
};
use nalgebra::{Matrix3, Point2};

const CANON_W: u32 = 240;
const CANON_H: u32 = 160;

/// White canonical form with one dark box at x 60..120, y 40..100.
fn canonical_value(x: f32, y: f32) -> u8 {
    if (60.0..120.0).contains(&x) && (40.0..100.0).contains(&y) {
        20
    } else {
        235
    }
}

/// Photograph the canonical form through `h_img_from_rect`, nearest-neighbour.
fn render_capture(h_img_from_rect: &Homography, width: usize, height: usize) -> GrayImage {
    let h_rect_from_img = h_img_from_rect.inverse().expect("invertible");
    let mut img = GrayImage::new(width, height);
    for v in 0..height {
        for u in 0..width {
            let p = h_rect_from_img.apply(Point2::new(u as f32, v as f32));
            let inside =
                p.x >= 0.0 && p.y >= 0.0 && p.x < CANON_W as f32 && p.y < CANON_H as f32;
            img.data[v * width + u] = if inside { canonical_value(p.x, p.y) } else { 90 };
        }
    }
    img
}

fn marker_token(p: MarkerPoint) -> OcrToken {
    OcrToken::new("QZKL", p.x - 12, p.y - 8, 24, 16)
}

fn to_marker(p: Point2<f32>) -> MarkerPoint {
    MarkerPoint::new(p.x.round() as i32, p.y.round() as i32)
}

#[test]
fn scaled_capture_matches_reference_warp() {
    // markers exactly at 2x scale plus offset, so the reference is a pixel lookup
    let src_w = 600;
    let src_h = 420;
    let data: Vec<u8> = (0..src_h)
        .flat_map(|y| (0..src_w).map(move |x| ((x * 3 + y * 5) % 251) as u8))
        .collect();
    let src = GrayImage {
        width: src_w,
        height: src_h,
        data,
    };
    let (ox, oy) = (50, 40);
    let size = TargetSize::new(200, 150);
    let markers = [
        MarkerPoint::new(ox, oy),
        MarkerPoint::new(ox, oy + 2 * 149),
        MarkerPoint::new(ox + 2 * 199, oy),
        MarkerPoint::new(ox + 2 * 199, oy + 2 * 149),
    ];

    let rectifier = Rectifier::new(size, CornerOrder::IndexHeuristic).expect("size");
    let out = rectifier
        .rectify_gray(&src.view(), &markers)
        .expect("four markers");

    assert_eq!(out.image.width, 200);
    assert_eq!(out.image.height, 150);
    let view = src.view();
    for y in 0..150 {
        for x in 0..200 {
            let expected = view.get(ox as usize + 2 * x, oy as usize + 2 * y) as i32;
            let got = out.image.data[y * 200 + x] as i32;
            assert!(
                (expected - got).abs() <= 1,
                "pixel ({x},{y}): expected {expected}, got {got}"
            );
        }
    }
}

#[test]
fn locate_and_rectify_reconstruct_layout() {
    let truth = Homography::new(Matrix3::new(
        1.9, 0.25, 70.0, //
        -0.12, 2.1, 55.0, //
        0.0004, 0.0007, 1.0,
    ));
    let capture = render_capture(&truth, 800, 620);

    let size = TargetSize::new(CANON_W, CANON_H);
    let [tl, tr, br, bl] = size.quad().map(|p| to_marker(truth.apply(p)));
    // column order (tl, bl, tr, br) is what the index heuristic expects
    let ocr = StaticOcr::new(vec![
        marker_token(tl),
        OcrToken::new("Signature", 300, 500, 90, 20),
        marker_token(bl),
        marker_token(tr),
        marker_token(br),
    ]);

    let markers = MarkerLocator::default()
        .locate(&ocr, &capture.view())
        .expect("static OCR");
    assert_eq!(markers, vec![tl, bl, tr, br]);

    let rectifier = Rectifier::new(size, CornerOrder::IndexHeuristic).expect("size");
    let out = rectifier
        .rectify_gray(&capture.view(), &markers)
        .expect("four markers");
    assert_eq!(out.corners.top_left, tl);
    assert_eq!(out.corners.bottom_right, br);

    let total = (CANON_W * CANON_H) as usize;
    let mut mismatched = 0;
    for y in 0..CANON_H as usize {
        for x in 0..CANON_W as usize {
            let expected = canonical_value(x as f32, y as f32) as i32;
            let got = out.image.data[y * CANON_W as usize + x] as i32;
            if (expected - got).abs() > 60 {
                mismatched += 1;
            }
        }
    }
    assert!(
        mismatched * 20 < total,
        "{mismatched} of {total} pixels deviate from the canonical layout"
    );

    // the dark box interior survives intact
    let box_mean = out
        .image
        .view()
        .mean_in_rect(formscan_core::PixelRect::new(66, 46, 48, 48))
        .expect("inside");
    assert!(box_mean < 40.0, "box mean {box_mean}");
}

#[test]
fn nearest_corner_handles_reading_order_markers() {
    let truth = Homography::new(Matrix3::new(
        2.0, 0.1, 60.0, //
        0.05, 2.0, 50.0, //
        0.0002, 0.0003, 1.0,
    ));
    let capture = render_capture(&truth, 700, 560);
    let size = TargetSize::new(CANON_W, CANON_H);
    let [tl, tr, br, bl] = size.quad().map(|p| to_marker(truth.apply(p)));
    let reading_order = [tl, tr, bl, br];

    let rectifier = Rectifier::new(size, CornerOrder::NearestCorner).expect("size");
    let out = rectifier
        .rectify_gray(&capture.view(), &reading_order)
        .expect("four markers");
    assert_eq!(out.corners.top_left, tl);
    assert_eq!(out.corners.top_right, tr);
    assert_eq!(out.corners.bottom_right, br);
    assert_eq!(out.corners.bottom_left, bl);
}

#[test]
fn missing_marker_reports_count() {
    let capture = GrayImage::new(50, 50);
    let ocr = StaticOcr::new(vec![
        OcrToken::new("QZKL", 0, 0, 10, 10),
        OcrToken::new("QZKL", 40, 0, 10, 10),
        OcrToken::new("QZKI", 0, 40, 10, 10),
    ]);
    let markers = MarkerLocator::default()
        .locate(&ocr, &capture.view())
        .expect("static OCR");
    let rectifier =
        Rectifier::new(TargetSize::new(20, 20), CornerOrder::IndexHeuristic).expect("size");
    assert_eq!(
        rectifier.rectify_gray(&capture.view(), &markers).unwrap_err(),
        RectifyError::MarkerCount { found: 2 }
    );
}
