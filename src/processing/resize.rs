//! Fit geometry and canvas compositing

use image::{imageops, DynamicImage, GenericImageView, RgbImage};
use serde::Serialize;
use tracing::debug;

use crate::config::{Background, Config, FilterType, TargetBox};
use crate::error::{CardFitError, Result};

/// Resized dimensions and where the resized image lands on the canvas.
///
/// Offsets are signed: a negative offset means the resized image overhangs
/// the canvas on that axis and is clipped equally on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FitPlan {
    pub new_width: u32,
    pub new_height: u32,
    pub offset_x: i64,
    pub offset_y: i64,
}

impl FitPlan {
    /// True when the resized image already has the canvas size
    pub fn is_exact(&self, target: TargetBox) -> bool {
        self.new_width == target.width && self.new_height == target.height
    }
}

/// Compute the fit of a `width` x `height` source against `target`.
///
/// Sources wider than the target ratio are scaled to the target height,
/// everything else to the target width. Equal ratios take the width branch.
pub fn calculate_fit(width: u32, height: u32, target: TargetBox) -> Result<FitPlan> {
    if width == 0 || height == 0 {
        return Err(CardFitError::invalid_parameters(format!(
            "Source image has no pixels ({}x{})", width, height
        )));
    }
    if target.width == 0 || target.height == 0 {
        return Err(CardFitError::invalid_parameters(format!(
            "Target box must be non-empty, got {}", target
        )));
    }

    let aspect_ratio = f64::from(width) / f64::from(height);

    let (new_width, new_height) = if aspect_ratio > target.ratio() {
        let new_width = (f64::from(target.height) * aspect_ratio).round() as u32;
        (new_width.max(1), target.height)
    } else {
        let new_height = (f64::from(target.width) / aspect_ratio).round() as u32;
        (target.width, new_height.max(1))
    };

    Ok(FitPlan {
        new_width,
        new_height,
        offset_x: centered_offset(target.width, new_width),
        offset_y: centered_offset(target.height, new_height),
    })
}

/// Floor of `(outer - inner) / 2`
fn centered_offset(outer: u32, inner: u32) -> i64 {
    (i64::from(outer) - i64::from(inner)).div_euclid(2)
}

/// Paste `image` at the given offsets onto a `target`-sized canvas filled
/// with `background`. Anything outside the canvas is clipped.
pub fn composite(
    image: &RgbImage,
    target: TargetBox,
    background: Background,
    offset_x: i64,
    offset_y: i64,
) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(target.width, target.height, background.into());
    imageops::replace(&mut canvas, image, offset_x, offset_y);
    canvas
}

/// Resamples images and letterboxes them onto the target canvas
#[derive(Debug, Clone, Copy)]
pub struct CanvasFitter {
    target: TargetBox,
    background: Background,
    filter: FilterType,
}

impl CanvasFitter {
    pub fn new(target: TargetBox, background: Background, filter: FilterType) -> Self {
        Self {
            target,
            background,
            filter,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.target, config.background, config.filter)
    }

    pub fn target(&self) -> TargetBox {
        self.target
    }

    /// Fit `image` onto an opaque canvas of exactly the target size.
    ///
    /// Only the source region that stays visible after clipping is
    /// resampled, so extreme aspect ratios never allocate the full
    /// resized image.
    pub fn fit(&self, image: &DynamicImage) -> Result<(RgbImage, FitPlan)> {
        let (width, height) = image.dimensions();
        let plan = calculate_fit(width, height, self.target)?;

        debug!(
            "Fitting {}x{} -> {}x{} at ({}, {}) using {:?}",
            width, height, plan.new_width, plan.new_height,
            plan.offset_x, plan.offset_y, self.filter
        );

        let (src_x, src_w, out_w, canvas_x) =
            visible_axis(width, plan.new_width, self.target.width, plan.offset_x);
        let (src_y, src_h, out_h, canvas_y) =
            visible_axis(height, plan.new_height, self.target.height, plan.offset_y);

        let visible = image.crop_imm(src_x, src_y, src_w, src_h);
        let resized = if (src_w, src_h) == (out_w, out_h) {
            visible.into_rgb8()
        } else {
            visible.resize_exact(out_w, out_h, self.filter.into()).into_rgb8()
        };

        let canvas = composite(&resized, self.target, self.background, canvas_x, canvas_y);
        Ok((canvas, plan))
    }
}

/// Map the on-canvas part of one axis back to source pixels.
///
/// Returns `(source start, source span, output length, canvas position)`
/// for a source of `src_len` resized to `new_len` and placed at `offset`
/// on a canvas `target_len` long.
fn visible_axis(src_len: u32, new_len: u32, target_len: u32, offset: i64) -> (u32, u32, u32, i64) {
    let skip = (-offset).max(0) as f64;
    let out_len = new_len.min(target_len);
    let scale = f64::from(src_len) / f64::from(new_len);

    let src_start = ((skip * scale).round() as u32).min(src_len - 1);
    let src_span = ((f64::from(out_len) * scale).round() as u32)
        .max(1)
        .min(src_len - src_start);

    (src_start, src_span, out_len, offset.max(0))
}

impl Default for CanvasFitter {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};

    const CREAM: Rgb<u8> = Rgb([245, 237, 224]);

    fn solid_image(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(color)))
    }

    fn close_to(pixel: &Rgb<u8>, color: [u8; 3]) -> bool {
        pixel.0.iter().zip(color).all(|(a, b)| a.abs_diff(b) <= 2)
    }

    #[test]
    fn test_wide_source_scales_to_height() {
        let plan = calculate_fit(1000, 500, TargetBox::default()).unwrap();
        assert_eq!(plan, FitPlan { new_width: 520, new_height: 260, offset_x: -65, offset_y: 0 });
    }

    #[test]
    fn test_tall_source_scales_to_width() {
        let plan = calculate_fit(500, 1000, TargetBox::default()).unwrap();
        assert_eq!(plan.new_width, 390);
        assert_eq!(plan.new_height, 780);
        assert_eq!(plan.offset_x, 0);
        assert_eq!(plan.offset_y, -260);
    }

    #[test]
    fn test_equal_ratio_is_exact() {
        let target = TargetBox::default();
        let plan = calculate_fit(780, 520, target).unwrap();
        assert!(plan.is_exact(target));
        assert_eq!((plan.offset_x, plan.offset_y), (0, 0));

        let plan = calculate_fit(390, 260, target).unwrap();
        assert!(plan.is_exact(target));
    }

    #[test]
    fn test_rounding_and_floor_offsets() {
        // 1001 / 500 * 260 = 520.52 -> 521, (390 - 521) // 2 = -66
        let plan = calculate_fit(1001, 500, TargetBox::default()).unwrap();
        assert_eq!(plan.new_width, 521);
        assert_eq!(plan.offset_x, -66);
    }

    #[test]
    fn test_fit_covers_target_on_one_axis() {
        let target = TargetBox::default();
        for (w, h) in [(1, 1), (4000, 3000), (3000, 4000), (10_000, 10), (10, 10_000), (391, 260)] {
            let plan = calculate_fit(w, h, target).unwrap();
            if f64::from(w) / f64::from(h) > target.ratio() {
                assert_eq!(plan.new_height, target.height, "{}x{}", w, h);
                assert!(plan.new_width >= target.width, "{}x{}", w, h);
            } else {
                assert_eq!(plan.new_width, target.width, "{}x{}", w, h);
                assert!(plan.new_height >= target.height, "{}x{}", w, h);
            }
        }
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(calculate_fit(0, 100, TargetBox::default()).is_err());
        assert!(calculate_fit(100, 0, TargetBox::default()).is_err());
        assert!(calculate_fit(100, 100, TargetBox::new(0, 10)).is_err());
    }

    #[test]
    fn test_fit_output_is_target_size() {
        let fitter = CanvasFitter::default();
        for (w, h) in [(1000, 500), (500, 1000), (390, 260), (37, 91)] {
            let (canvas, _) = fitter.fit(&solid_image(w, h, [200, 10, 10])).unwrap();
            assert_eq!(canvas.dimensions(), (390, 260));
        }
    }

    #[test]
    fn test_fit_crops_overhang_symmetrically() {
        // Left half red, right half blue: after cropping the centre column
        // sits on the seam, so both edges keep their own colour.
        let img = ImageBuffer::from_fn(1000, 500, |x, _| {
            if x < 500 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        let fitter = CanvasFitter::default();
        let (canvas, plan) = fitter.fit(&DynamicImage::ImageRgb8(img)).unwrap();

        assert_eq!(plan.offset_x, -65);
        assert!(close_to(canvas.get_pixel(0, 130), [255, 0, 0]));
        assert!(close_to(canvas.get_pixel(389, 130), [0, 0, 255]));
    }

    #[test]
    fn test_visible_axis_maps_clipped_region() {
        assert_eq!(visible_axis(1000, 520, 390, -65), (125, 750, 390, 0));
        assert_eq!(visible_axis(500, 260, 260, 0), (0, 500, 260, 0));
        assert_eq!(visible_axis(101, 101, 390, 144), (0, 101, 101, 144));
    }

    #[test]
    fn test_thin_strip_only_resamples_visible_rows() {
        let plan = calculate_fit(1, 4000, TargetBox::default()).unwrap();
        assert_eq!(plan.new_height, 1_560_000);
        assert_eq!(plan.offset_y, -779_870);
        assert_eq!(visible_axis(4000, 1_560_000, 260, -779_870), (2000, 1, 260, 0));

        let strip = ImageBuffer::from_fn(1, 4000, |_, y| {
            if y == 2000 { Rgb([10, 200, 30]) } else { Rgb([0, 0, 0]) }
        });
        let (canvas, _) = CanvasFitter::default()
            .fit(&DynamicImage::ImageRgb8(strip))
            .unwrap();

        assert_eq!(canvas.dimensions(), (390, 260));
        assert!(close_to(canvas.get_pixel(0, 0), [10, 200, 30]));
        assert!(close_to(canvas.get_pixel(389, 259), [10, 200, 30]));
    }

    #[test]
    fn test_exact_size_is_untouched() {
        let img = ImageBuffer::from_fn(390, 260, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 7]));
        let fitter = CanvasFitter::default();
        let (canvas, plan) = fitter.fit(&DynamicImage::ImageRgb8(img.clone())).unwrap();

        assert!(plan.is_exact(TargetBox::default()));
        assert_eq!(canvas, img);
    }

    #[test]
    fn test_alpha_is_discarded() {
        let img = ImageBuffer::from_pixel(390, 260, Rgba([10, 20, 30, 0]));
        let fitter = CanvasFitter::default();
        let (canvas, _) = fitter.fit(&DynamicImage::ImageRgba8(img)).unwrap();
        assert_eq!(*canvas.get_pixel(5, 5), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_composite_centers_smaller_image() {
        let target = TargetBox::default();
        let small = ImageBuffer::from_pixel(101, 50, Rgb([0, 0, 0]));
        let x = centered_offset(target.width, 101);
        let y = centered_offset(target.height, 50);
        let canvas = composite(&small, target, Background::default(), x, y);

        assert_eq!(*canvas.get_pixel(0, 0), CREAM);
        assert_eq!(*canvas.get_pixel(389, 259), CREAM);

        let left = (0..390).take_while(|&i| *canvas.get_pixel(i, 130) == CREAM).count();
        let right = (0..390).rev().take_while(|&i| *canvas.get_pixel(i, 130) == CREAM).count();
        let top = (0..260).take_while(|&j| *canvas.get_pixel(195, j) == CREAM).count();
        let bottom = (0..260).rev().take_while(|&j| *canvas.get_pixel(195, j) == CREAM).count();

        assert!(left.abs_diff(right) <= 1, "left {} right {}", left, right);
        assert!(top.abs_diff(bottom) <= 1, "top {} bottom {}", top, bottom);
        assert_eq!(left + right + 101, 390);
        assert_eq!(top + bottom + 50, 260);
    }
}
