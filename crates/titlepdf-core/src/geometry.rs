//! Point-space rectangles and aspect-ratio fitting

use serde::{Deserialize, Serialize};

/// Rectangle in PDF user space, origin bottom-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PdfRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// From normalized `[x0, y0, x1, y1]` corners
    pub fn from_corners(c: [f64; 4]) -> Self {
        Self::new(c[0], c[1], c[2] - c[0], c[3] - c[1])
    }

    /// Convert a box measured from the top of the page into user space.
    ///
    /// `page_box` is the page MediaBox as `[x0, y0, x1, y1]`.
    pub fn from_top_left(page_box: [f64; 4], x: f64, y_from_top: f64, width: f64, height: f64) -> Self {
        let page_height = page_box[3] - page_box[1];
        let draw_y = page_height - y_from_top - height;
        Self::new(page_box[0] + x, page_box[1] + draw_y, width, height)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Largest rectangle with the image's aspect ratio that fits `bounds`,
/// centered on both axes.
///
/// Width-first: take the full box width, and only when the resulting
/// height overflows switch to the full box height.
pub fn fit_within(image_width: f64, image_height: f64, bounds: PdfRect) -> PdfRect {
    if image_width <= 0.0 || image_height <= 0.0 {
        return bounds;
    }
    let aspect = image_width / image_height;

    let mut width = bounds.width;
    let mut height = bounds.width / aspect;
    if height > bounds.height {
        height = bounds.height;
        width = bounds.height * aspect;
    }

    PdfRect::new(
        bounds.x + (bounds.width - width) / 2.0,
        bounds.y + (bounds.height - height) / 2.0,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_wide_image_in_short_box() {
        let bounds = PdfRect::new(50.0, 100.0, 200.0, 15.0);
        let fitted = fit_within(100.0, 50.0, bounds);
        assert!((fitted.height - 15.0).abs() < EPSILON);
        assert!((fitted.width - 30.0).abs() < EPSILON);
        assert!((fitted.width / fitted.height - 2.0).abs() < EPSILON);
        assert_eq!(fitted.center(), bounds.center());
    }

    #[test]
    fn test_width_limited_fit() {
        let bounds = PdfRect::new(0.0, 0.0, 100.0, 100.0);
        let fitted = fit_within(400.0, 100.0, bounds);
        assert_eq!(fitted, PdfRect::new(0.0, 37.5, 100.0, 25.0));
    }

    #[test]
    fn test_top_left_conversion() {
        let page = [0.0, 0.0, 612.0, 792.0];
        let rect = PdfRect::from_top_left(page, 72.0, 100.0, 200.0, 30.0);
        assert_eq!(rect, PdfRect::new(72.0, 662.0, 200.0, 30.0));
    }

    proptest! {
        /// Fitted box stays inside the bounds, keeps the aspect and stays centered
        #[test]
        fn fit_preserves_aspect_and_bounds(
            iw in 1.0f64..4000.0,
            ih in 1.0f64..4000.0,
            bw in 1.0f64..600.0,
            bh in 1.0f64..600.0,
            bx in -100.0f64..600.0,
            by in -100.0f64..800.0,
        ) {
            let bounds = PdfRect::new(bx, by, bw, bh);
            let fitted = fit_within(iw, ih, bounds);
            let tol = 1e-6 * (1.0 + bw.max(bh));

            prop_assert!(fitted.width <= bw + tol);
            prop_assert!(fitted.height <= bh + tol);
            prop_assert!(((fitted.width / fitted.height) - (iw / ih)).abs() < 1e-6 * (iw / ih).max(1.0));
            let (cx, cy) = fitted.center();
            let (bcx, bcy) = bounds.center();
            prop_assert!((cx - bcx).abs() < tol);
            prop_assert!((cy - bcy).abs() < tol);
            // One side always touches the box
            prop_assert!((fitted.width - bw).abs() < tol || (fitted.height - bh).abs() < tol);
        }
    }
}
