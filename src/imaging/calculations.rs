//! Pure resize planning math.
//!
//! All functions here are pure and testable without any I/O or images.

use super::validate::ValidationError;

/// Decide whether an image needs resizing to fit the configured bounding box,
/// and compute the target dimensions if so.
///
/// Returns `None` when no resize is needed: either no bound is configured, or
/// the image already fits both bounds. Otherwise the smaller scale factor is
/// applied uniformly to both axes, preserving aspect ratio exactly up to
/// rounding, and guaranteeing the result fits every configured bound.
///
/// Rounding rule: **round half up** (`f64::round`), pinned by the tests
/// below. A dimension that would round to zero is clamped to one pixel.
///
/// # Errors
/// A configured bound of 0 or a source dimension of 0 is invalid input and
/// fails with [`ValidationError::InvalidDimensions`].
///
/// # Examples
/// ```
/// # use photovault::imaging::plan_resize;
/// // 3000x2000 into a 1920x1080 box: scale = min(0.64, 0.54) = 0.54
/// assert_eq!(
///     plan_resize(3000, 2000, Some(1920), Some(1080)).unwrap(),
///     Some((1620, 1080))
/// );
///
/// // Already fits: no resize
/// assert_eq!(plan_resize(800, 600, Some(1920), Some(1080)).unwrap(), None);
/// ```
pub fn plan_resize(
    width: u32,
    height: u32,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> Result<Option<(u32, u32)>, ValidationError> {
    if width == 0 || height == 0 {
        return Err(ValidationError::InvalidDimensions(format!(
            "source dimensions {width}x{height} must be positive"
        )));
    }
    if max_width == Some(0) || max_height == Some(0) {
        return Err(ValidationError::InvalidDimensions(
            "configured resize bound must be positive".into(),
        ));
    }

    if max_width.is_none() && max_height.is_none() {
        return Ok(None);
    }

    let scale_w = max_width.map_or(f64::INFINITY, |m| f64::from(m) / f64::from(width));
    let scale_h = max_height.map_or(f64::INFINITY, |m| f64::from(m) / f64::from(height));

    if scale_w >= 1.0 && scale_h >= 1.0 {
        return Ok(None);
    }

    let scale = scale_w.min(scale_h);
    let new_width = ((f64::from(width) * scale).round() as u32).max(1);
    let new_height = ((f64::from(height) * scale).round() as u32).max(1);
    Ok(Some((new_width, new_height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_bounds_means_no_resize() {
        assert_eq!(plan_resize(4000, 3000, None, None).unwrap(), None);
    }

    #[test]
    fn image_within_bounds_is_untouched() {
        assert_eq!(
            plan_resize(800, 600, Some(1920), Some(1080)).unwrap(),
            None
        );
        // Exactly at the bounds still fits
        assert_eq!(
            plan_resize(1920, 1080, Some(1920), Some(1080)).unwrap(),
            None
        );
    }

    #[test]
    fn landscape_photo_into_smaller_box() {
        // scale = min(1920/3000, 1080/2000) = 0.54
        assert_eq!(
            plan_resize(3000, 2000, Some(1920), Some(1080)).unwrap(),
            Some((1620, 1080))
        );
    }

    #[test]
    fn portrait_photo_into_landscape_box() {
        // scale = min(1920/2000, 1080/3000) = 0.36
        assert_eq!(
            plan_resize(2000, 3000, Some(1920), Some(1080)).unwrap(),
            Some((720, 1080))
        );
    }

    #[test]
    fn single_width_bound() {
        // 4000x1000 with max width 2000: scale 0.5
        assert_eq!(
            plan_resize(4000, 1000, Some(2000), None).unwrap(),
            Some((2000, 500))
        );
        // Height bound absent never constrains
        assert_eq!(plan_resize(100, 9000, Some(2000), None).unwrap(), None);
    }

    #[test]
    fn single_height_bound() {
        assert_eq!(
            plan_resize(1000, 4000, None, Some(2000)).unwrap(),
            Some((500, 2000))
        );
    }

    #[test]
    fn result_always_fits_configured_bounds() {
        for (w, h) in [(3001, 1999), (5000, 5000), (1921, 1081), (9999, 17)] {
            if let Some((nw, nh)) = plan_resize(w, h, Some(1920), Some(1080)).unwrap() {
                assert!(nw <= 1920, "{w}x{h} -> {nw}x{nh}");
                assert!(nh <= 1080, "{w}x{h} -> {nw}x{nh}");
            }
        }
    }

    #[test]
    fn aspect_ratio_preserved_within_one_pixel() {
        let (w, h) = (3217u32, 2411u32);
        let (nw, nh) = plan_resize(w, h, Some(1000), Some(1000)).unwrap().unwrap();
        let expected_nh = f64::from(nw) * f64::from(h) / f64::from(w);
        assert!((f64::from(nh) - expected_nh).abs() <= 1.0);
    }

    #[test]
    fn rounding_is_half_up() {
        // 1000x999 with max width 500: height = 999 * 0.5 = 499.5 -> 500
        assert_eq!(
            plan_resize(1000, 999, Some(500), None).unwrap(),
            Some((500, 500))
        );
        // 1000x997: 498.5 -> 499
        assert_eq!(
            plan_resize(1000, 997, Some(500), None).unwrap(),
            Some((500, 499))
        );
    }

    #[test]
    fn extreme_narrow_image_never_rounds_to_zero() {
        // 10000x3 into a 100-wide box: height 0.03 rounds to 0, clamped to 1
        assert_eq!(
            plan_resize(10000, 3, Some(100), None).unwrap(),
            Some((100, 1))
        );
    }

    #[test]
    fn zero_source_dimension_is_rejected() {
        assert!(matches!(
            plan_resize(0, 600, Some(1920), Some(1080)),
            Err(ValidationError::InvalidDimensions(_))
        ));
        assert!(matches!(
            plan_resize(800, 0, Some(1920), Some(1080)),
            Err(ValidationError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn zero_bound_is_rejected() {
        assert!(matches!(
            plan_resize(800, 600, Some(0), None),
            Err(ValidationError::InvalidDimensions(_))
        ));
        assert!(matches!(
            plan_resize(800, 600, None, Some(0)),
            Err(ValidationError::InvalidDimensions(_))
        ));
    }
}
