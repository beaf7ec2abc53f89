use fog_proto::BoundingBox;
use serde::Serialize;
use tracing::debug;

/// Natural pixel size of the uploaded image, probed once before inference.
/// Both dimensions must be > 0; a zero dimension is treated as an image load
/// failure upstream and never reaches `normalize_box`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Percentage-based layout rectangle for overlay rendering.
///
/// Always satisfies `0 <= left`, `0 <= top`, `left + width <= 100`,
/// `top + height <= 100`. Recomputed on every render, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Minimum visible footprint of an overlay box, in source-image pixels.
pub const MIN_VISIBLE_PX: f64 = 5.0;

/// Converts a detector-reported pixel rectangle into a clamped percentage
/// rectangle that cannot overflow the image container.
///
/// The remote model is untrusted: any non-finite coordinate degrades to 0
/// rather than aborting the render. Size is clamped before position, position
/// is clamped against the remaining space, and the size is re-clamped against
/// the clamped position. Finally the minimum footprint is enforced and the
/// position pulled back so the grown box still fits.
pub fn normalize_box(bb: &BoundingBox, dims: ImageDimensions) -> NormalizedBox {
    let img_w = f64::from(dims.width);
    let img_h = f64::from(dims.height);

    let x = finite_or_zero(bb.x);
    let y = finite_or_zero(bb.y);
    let w = finite_or_zero(bb.width);
    let h = finite_or_zero(bb.height);
    if x != bb.x || y != bb.y || w != bb.width || h != bb.height {
        debug!("overlay: non-finite bounding box coordinate replaced with 0");
    }

    let left_pct = x / img_w * 100.0;
    let top_pct = y / img_h * 100.0;
    let width_pct = w / img_w * 100.0;
    let height_pct = h / img_h * 100.0;

    let safe_w = width_pct.clamp(0.0, 100.0);
    let safe_h = height_pct.clamp(0.0, 100.0);

    let clamped_left = left_pct.clamp(0.0, 100.0 - safe_w);
    let clamped_top = top_pct.clamp(0.0, 100.0 - safe_h);

    let clamped_w = safe_w.clamp(0.0, 100.0 - clamped_left);
    let clamped_h = safe_h.clamp(0.0, 100.0 - clamped_top);

    // Minimum footprint capped at 100 so an image narrower than the minimum
    // cannot grow the box past full size.
    let min_w_pct = (MIN_VISIBLE_PX / img_w * 100.0).min(100.0);
    let min_h_pct = (MIN_VISIBLE_PX / img_h * 100.0).min(100.0);

    let final_w = clamped_w.max(min_w_pct);
    let final_h = clamped_h.max(min_h_pct);

    let final_left = clamped_left.min(100.0 - final_w).max(0.0);
    let final_top = clamped_top.min(100.0 - final_h).max(0.0);

    NormalizedBox {
        left: final_left,
        top: final_top,
        width: final_w,
        height: final_h,
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS: ImageDimensions = ImageDimensions { width: 800, height: 600 };

    fn bb(x: f64, y: f64, w: f64, h: f64) -> BoundingBox {
        BoundingBox { x, y, width: w, height: h }
    }

    fn assert_inside(nb: &NormalizedBox) {
        assert!(nb.left >= 0.0, "left={}", nb.left);
        assert!(nb.top >= 0.0, "top={}", nb.top);
        assert!(nb.left + nb.width <= 100.0 + 1e-9, "right={}", nb.left + nb.width);
        assert!(nb.top + nb.height <= 100.0 + 1e-9, "bottom={}", nb.top + nb.height);
    }

    #[test]
    fn full_image_rect_maps_to_full_container() {
        let nb = normalize_box(&bb(0.0, 0.0, 800.0, 600.0), DIMS);
        assert_eq!(nb, NormalizedBox { left: 0.0, top: 0.0, width: 100.0, height: 100.0 });
    }

    #[test]
    fn interior_rect_converts_to_percent() {
        let nb = normalize_box(&bb(80.0, 60.0, 400.0, 300.0), DIMS);
        assert!((nb.left - 10.0).abs() < 1e-9);
        assert!((nb.top - 10.0).abs() < 1e-9);
        assert!((nb.width - 50.0).abs() < 1e-9);
        assert!((nb.height - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rect_entirely_right_of_image_clamps_to_edge() {
        let nb = normalize_box(&bb(1600.0, 0.0, 80.0, 60.0), DIMS);
        assert_inside(&nb);
        assert!(nb.width > 0.0 && nb.height > 0.0);
        assert!((nb.left + nb.width - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rect_below_image_clamps_to_bottom_edge() {
        let nb = normalize_box(&bb(0.0, 1200.0, 80.0, 60.0), DIMS);
        assert_inside(&nb);
        assert!((nb.top + nb.height - 100.0).abs() < 1e-9);
    }

    #[test]
    fn negative_origin_clamps_to_zero() {
        let nb = normalize_box(&bb(-50.0, -50.0, 100.0, 100.0), DIMS);
        assert_inside(&nb);
        assert_eq!(nb.left, 0.0);
        assert_eq!(nb.top, 0.0);
    }

    #[test]
    fn non_finite_coordinates_degrade_to_zero() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let nb = normalize_box(&bb(bad, bad, bad, bad), DIMS);
            assert_inside(&nb);
            assert_eq!(nb.left, 0.0);
            assert_eq!(nb.top, 0.0);
            // zero-size box grows to the minimum footprint
            assert!(nb.width > 0.0 && nb.height > 0.0);
        }
    }

    #[test]
    fn tiny_box_grows_to_minimum_footprint() {
        let nb = normalize_box(&bb(400.0, 300.0, 1.0, 1.0), DIMS);
        assert_inside(&nb);
        assert!((nb.width - MIN_VISIBLE_PX / 800.0 * 100.0).abs() < 1e-9);
        assert!((nb.height - MIN_VISIBLE_PX / 600.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn minimum_footprint_near_far_edge_pulls_position_back() {
        let nb = normalize_box(&bb(799.0, 599.0, 1.0, 1.0), DIMS);
        assert_inside(&nb);
        assert!(nb.width > 0.0 && nb.height > 0.0);
    }

    #[test]
    fn image_smaller_than_minimum_still_fits() {
        let dims = ImageDimensions { width: 3, height: 2 };
        let nb = normalize_box(&bb(1.0, 1.0, 1.0, 1.0), dims);
        assert_inside(&nb);
        assert_eq!(nb.width, 100.0);
        assert_eq!(nb.height, 100.0);
        assert_eq!(nb.left, 0.0);
        assert_eq!(nb.top, 0.0);
    }

    #[test]
    fn oversized_rect_covers_container_exactly() {
        let nb = normalize_box(&bb(-100.0, -100.0, 5000.0, 5000.0), DIMS);
        assert_eq!(nb, NormalizedBox { left: 0.0, top: 0.0, width: 100.0, height: 100.0 });
    }

    #[test]
    fn sweep_of_finite_inputs_never_overflows() {
        let vals = [-1e6, -800.0, -1.0, 0.0, 0.5, 1.0, 400.0, 800.0, 1e6];
        for &x in &vals {
            for &y in &vals {
                for &w in &vals {
                    for &h in &vals {
                        let nb = normalize_box(&bb(x, y, w, h), DIMS);
                        assert_inside(&nb);
                    }
                }
            }
        }
    }
}
