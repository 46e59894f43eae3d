//! Page-to-device projection matching the renderer's viewport

use serde::Serialize;

use crate::objects::normalize_rotation;

/// Axis-aligned device rectangle in pixels, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DeviceRect {
    /// Build from two arbitrary corners
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }
}

/// The transform a page was rendered with.
///
/// `view_box` is the page MediaBox in PDF user space, `scale` is device
/// pixels per point and `rotation` is the clockwise page rotation. The
/// resulting transform flips the y axis so device y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub view_box: [f64; 4],
    pub scale: f64,
    pub rotation: i64,
    pub transform: [f64; 6],
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(view_box: [f64; 4], scale: f64, rotation: i64) -> Self {
        let rotation = normalize_rotation(rotation);
        let center_x = (view_box[2] + view_box[0]) / 2.0;
        let center_y = (view_box[3] + view_box[1]) / 2.0;

        let (a, b, c, d) = match rotation {
            90 => (0.0, 1.0, 1.0, 0.0),
            180 => (-1.0, 0.0, 0.0, 1.0),
            270 => (0.0, -1.0, -1.0, 0.0),
            _ => (1.0, 0.0, 0.0, -1.0),
        };

        let (offset_x, offset_y, width, height) = if c == 0.0 {
            (
                (center_x - view_box[0]).abs() * scale,
                (center_y - view_box[1]).abs() * scale,
                (view_box[2] - view_box[0]).abs() * scale,
                (view_box[3] - view_box[1]).abs() * scale,
            )
        } else {
            (
                (center_y - view_box[1]).abs() * scale,
                (center_x - view_box[0]).abs() * scale,
                (view_box[3] - view_box[1]).abs() * scale,
                (view_box[2] - view_box[0]).abs() * scale,
            )
        };

        let transform = [
            a * scale,
            b * scale,
            c * scale,
            d * scale,
            offset_x - a * scale * center_x - c * scale * center_y,
            offset_y - b * scale * center_x - d * scale * center_y,
        ];

        Self {
            view_box,
            scale,
            rotation,
            transform,
            width,
            height,
        }
    }

    pub fn convert_to_viewport_point(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.transform;
        (x * a + y * c + e, x * b + y * d + f)
    }

    /// Project a PDF-space `[x0, y0, x1, y1]` rectangle into device space
    pub fn convert_to_viewport_rectangle(&self, rect: [f64; 4]) -> DeviceRect {
        let (x0, y0) = self.convert_to_viewport_point(rect[0], rect[1]);
        let (x1, y1) = self.convert_to_viewport_point(rect[2], rect[3]);
        DeviceRect::from_corners(x0, y0, x1, y1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_unrotated_flips_y() {
        let vp = Viewport::new(LETTER, 1.0, 0);
        assert_eq!(vp.transform, [1.0, 0.0, 0.0, -1.0, 0.0, 792.0]);
        assert_eq!(vp.convert_to_viewport_point(0.0, 792.0), (0.0, 0.0));
        assert_eq!(vp.convert_to_viewport_point(0.0, 0.0), (0.0, 792.0));

        let rect = vp.convert_to_viewport_rectangle([72.0, 700.0, 300.0, 718.0]);
        assert_eq!(
            rect,
            DeviceRect {
                x: 72.0,
                y: 74.0,
                width: 228.0,
                height: 18.0
            }
        );
    }

    #[test]
    fn test_scale_applies_to_size_and_position() {
        let vp = Viewport::new(LETTER, 1.5, 0);
        assert!(close(vp.width, 918.0));
        assert!(close(vp.height, 1188.0));
        let rect = vp.convert_to_viewport_rectangle([72.0, 700.0, 300.0, 718.0]);
        assert!(close(rect.x, 108.0));
        assert!(close(rect.y, 111.0));
        assert!(close(rect.width, 342.0));
        assert!(close(rect.height, 27.0));
    }

    #[test]
    fn test_quarter_turn_swaps_dimensions() {
        let vp = Viewport::new(LETTER, 1.0, 90);
        assert!(close(vp.width, 792.0));
        assert!(close(vp.height, 612.0));
        // bottom-left of the page lands at the top-left corner
        let (x, y) = vp.convert_to_viewport_point(0.0, 0.0);
        assert!(close(x, 0.0) && close(y, 0.0));
        let (x, y) = vp.convert_to_viewport_point(612.0, 792.0);
        assert!(close(x, 792.0) && close(y, 612.0));
    }

    #[test]
    fn test_half_turn_and_offset_view_box() {
        let vp = Viewport::new([10.0, 20.0, 110.0, 220.0], 1.0, 180);
        let (x, y) = vp.convert_to_viewport_point(10.0, 20.0);
        assert!(close(x, 100.0) && close(y, 0.0));
        let (x, y) = vp.convert_to_viewport_point(110.0, 220.0);
        assert!(close(x, 0.0) && close(y, 200.0));
    }

    #[test]
    fn test_negative_rotation_normalizes() {
        assert_eq!(Viewport::new(LETTER, 1.0, -90).rotation, 270);
    }

    proptest! {
        #[test]
        fn prop_rect_stays_inside_viewport(
            x0 in 0.0f64..612.0, x1 in 0.0f64..612.0,
            y0 in 0.0f64..792.0, y1 in 0.0f64..792.0,
            scale in 0.25f64..4.0,
            quarter in 0i64..4,
        ) {
            let vp = Viewport::new(LETTER, scale, quarter * 90);
            let r = vp.convert_to_viewport_rectangle([x0, y0, x1, y1]);
            prop_assert!(r.width >= 0.0 && r.height >= 0.0);
            prop_assert!(r.x >= -1e-6 && r.y >= -1e-6);
            prop_assert!(r.x + r.width <= vp.width + 1e-6);
            prop_assert!(r.y + r.height <= vp.height + 1e-6);
        }
    }
}
