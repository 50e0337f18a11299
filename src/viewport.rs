// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Viewport struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at the
//! top-left, and a rectangle on the complex plane.  Screen row 0 is
//! the *top* of the image, which is the maximum imaginary value, so
//! the imaginary axis runs against the row order.

use error::RenderError;
use num::Complex;

/// Describes the x, y of a pixel on the screen, with 0,0 at the top
/// left.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The amount by which a single zoom step moves every bound.
pub const ZOOM_STEP: f64 = 0.1;

/// A region of the complex plane, the resolution of the image it
/// maps to, and the number of iterations to run per point.  Build one
/// per render; the engine only ever reads it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Left edge of the region.
    pub real_min: f64,
    /// Right edge of the region.
    pub real_max: f64,
    /// Bottom edge of the region.
    pub imag_min: f64,
    /// Top edge of the region.
    pub imag_max: f64,
    /// Width of the image in pixels.
    pub width: usize,
    /// Height of the image in pixels.
    pub height: usize,
    /// The iteration bound; points that survive this many iterations
    /// are treated as members of the set.
    pub max_iterations: u32,
}

impl Default for Viewport {
    /// The whole set at 800x400, 400 iterations deep.
    fn default() -> Self {
        Viewport {
            real_min: -2.0,
            real_max: 1.3,
            imag_min: -1.2,
            imag_max: 1.2,
            width: 800,
            height: 400,
            max_iterations: 400,
        }
    }
}

impl Viewport {
    /// Constructor.  Takes the width and height of the image, the
    /// left-lower and right-upper corners of the complex plane, and
    /// the iteration bound.  Fails if the result would not be
    /// renderable.
    pub fn new(
        width: usize,
        height: usize,
        leftlower: Complex<f64>,
        rightupper: Complex<f64>,
        max_iterations: u32,
    ) -> Result<Viewport, RenderError> {
        let viewport = Viewport {
            real_min: leftlower.re,
            real_max: rightupper.re,
            imag_min: leftlower.im,
            imag_max: rightupper.im,
            width,
            height,
            max_iterations,
        };
        viewport.validate()?;
        Ok(viewport)
    }

    /// Checks every invariant the engine relies upon.  The fields are
    /// public so callers can edit a viewport between renders; the
    /// engine calls this again before doing any work.
    pub fn validate(&self) -> Result<(), RenderError> {
        let invalid = |reason: &str| Err(RenderError::InvalidViewport(reason.to_string()));

        if self.width == 0 || self.height == 0 {
            return invalid("the image must be at least one pixel wide and tall");
        }

        if self.max_iterations == 0 {
            return invalid("the iteration bound must be at least 1");
        }

        let bounds = [self.real_min, self.real_max, self.imag_min, self.imag_max];
        if bounds.iter().any(|b| !b.is_finite()) {
            return invalid("every bound must be a finite number");
        }

        if self.real_max <= self.real_min {
            return invalid("the left lower corner is not to the left of the right upper corner");
        }

        if self.imag_max <= self.imag_min {
            return invalid("the left lower corner is not lower than the right upper corner");
        }

        Ok(())
    }

    /// The total number of pixels in the image, or None if that
    /// count does not fit in a `usize`.
    pub fn len(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }

    /// Describes that the image has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The distance along each axis between neighbouring pixels.  The
    /// first and last pixel of each axis land exactly on the bounds;
    /// an axis only one pixel long collapses onto its starting edge.
    fn steps(&self) -> (f64, f64) {
        let step = |span: f64, count: usize| {
            if count > 1 {
                span / ((count - 1) as f64)
            } else {
                0.0
            }
        };
        (
            step(self.real_max - self.real_min, self.width),
            step(self.imag_max - self.imag_min, self.height),
        )
    }

    /// Given a pixel on the screen, return the complex number it
    /// samples.  Every worker calls this with the same viewport, so
    /// the same pixel always produces the same bits.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        let (re_step, im_step) = self.steps();
        Complex::new(
            self.real_min + re_step * (pixel.0 as f64),
            self.imag_max - im_step * (pixel.1 as f64),
        )
    }

    /// Given a complex number, return the nearest pixel, or None if
    /// the point falls outside the viewport.
    pub fn point_to_pixel(&self, point: &Complex<f64>) -> Option<Pixel> {
        if self.is_empty() {
            return None;
        }
        let (re_step, im_step) = self.steps();
        let left = if re_step > 0.0 {
            ((point.re - self.real_min) / re_step).round()
        } else {
            0.0
        };
        let top = if im_step > 0.0 {
            ((self.imag_max - point.im) / im_step).round()
        } else {
            0.0
        };
        if left < 0.0
            || top < 0.0
            || left > ((self.width - 1) as f64)
            || top > ((self.height - 1) as f64)
        {
            return None;
        }
        Some(Pixel(left as usize, top as usize))
    }

    /// Moves every bound `steps * ZOOM_STEP` towards the centre.  A
    /// negative count moves them outwards.  Fails rather than produce
    /// an inverted region.
    pub fn zoom(&self, steps: i32) -> Result<Viewport, RenderError> {
        let delta = ZOOM_STEP * f64::from(steps);
        let zoomed = Viewport {
            real_min: self.real_min + delta,
            real_max: self.real_max - delta,
            imag_min: self.imag_min + delta,
            imag_max: self.imag_max - delta,
            ..*self
        };
        zoomed.validate()?;
        Ok(zoomed)
    }

    /// Raises or lowers the iteration bound, never letting it drop
    /// below one.
    pub fn adjust_iterations(&self, delta: i64) -> Viewport {
        let bound = (i64::from(self.max_iterations) + delta).max(1);
        Viewport {
            max_iterations: bound.min(i64::from(u32::max_value())) as u32,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: usize) -> Viewport {
        Viewport::new(size, size, Complex::new(-2.0, -2.0), Complex::new(2.0, 2.0), 100).unwrap()
    }

    #[test]
    fn viewport_fails_on_bad_shape() {
        let vp = Viewport::new(4, 4, Complex::new(-1.0, 1.0), Complex::new(1.0, -1.0), 10);
        assert!(vp.is_err());
        let vp = Viewport::new(4, 4, Complex::new(1.0, -1.0), Complex::new(-1.0, 1.0), 10);
        assert!(vp.is_err());
    }

    #[test]
    fn viewport_fails_on_flat_region() {
        let vp = Viewport::new(4, 4, Complex::new(1.0, -1.0), Complex::new(1.0, 1.0), 10);
        assert!(vp.is_err());
    }

    #[test]
    fn viewport_fails_on_empty_image_or_bound() {
        let ll = Complex::new(-1.0, -1.0);
        let ru = Complex::new(1.0, 1.0);
        assert!(Viewport::new(0, 4, ll, ru, 10).is_err());
        assert!(Viewport::new(4, 0, ll, ru, 10).is_err());
        assert!(Viewport::new(4, 4, ll, ru, 0).is_err());
    }

    #[test]
    fn viewport_fails_on_non_finite_bounds() {
        let vp = Viewport::new(4, 4, Complex::new(std::f64::NAN, -1.0), Complex::new(1.0, 1.0), 10);
        assert!(vp.is_err());
        let vp = Viewport::new(4, 4, Complex::new(-1.0, -1.0), Complex::new(std::f64::INFINITY, 1.0), 10);
        assert!(vp.is_err());
    }

    #[test]
    fn viewport_passes_on_good_shape() {
        let vp = Viewport::new(4, 4, Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0), 10);
        assert!(vp.is_ok());
        assert!(Viewport::default().validate().is_ok());
    }

    #[test]
    fn pixel_to_point_hits_the_corners() {
        let vp = square(5);
        assert_eq!(vp.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, 2.0));
        assert_eq!(vp.pixel_to_point(&Pixel(4, 0)), Complex::new(2.0, 2.0));
        assert_eq!(vp.pixel_to_point(&Pixel(0, 4)), Complex::new(-2.0, -2.0));
        assert_eq!(vp.pixel_to_point(&Pixel(4, 4)), Complex::new(2.0, -2.0));
        assert_eq!(vp.pixel_to_point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
    }

    #[test]
    fn pixel_to_point_inverts_the_imaginary_axis() {
        let vp = square(5);
        let top = vp.pixel_to_point(&Pixel(1, 0));
        let bottom = vp.pixel_to_point(&Pixel(1, 4));
        assert!(top.im > bottom.im);
    }

    #[test]
    fn single_pixel_axes_collapse_onto_the_edge() {
        let vp = Viewport::new(1, 1, Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0), 10).unwrap();
        assert_eq!(vp.pixel_to_point(&Pixel(0, 0)), Complex::new(-1.0, 1.0));
    }

    #[test]
    fn point_to_pixel_round_trips_grid_points() {
        let vp = square(5);
        assert_eq!(vp.point_to_pixel(&Complex::new(0.0, 0.0)), Some(Pixel(2, 2)));
        assert_eq!(vp.point_to_pixel(&Complex::new(-2.0, 2.0)), Some(Pixel(0, 0)));
        assert_eq!(vp.point_to_pixel(&Complex::new(1.0, -2.0)), Some(Pixel(3, 4)));
        assert_eq!(vp.point_to_pixel(&Complex::new(3.0, 0.0)), None);
    }

    #[test]
    fn zoom_shrinks_and_grows_symmetrically() {
        let vp = square(5);
        let closer = vp.zoom(2).unwrap();
        assert!((closer.real_min + 1.8).abs() < 1e-12);
        assert!((closer.imag_max - 1.8).abs() < 1e-12);
        let further = vp.zoom(-1).unwrap();
        assert!((further.real_max - 2.1).abs() < 1e-12);
        assert!((further.imag_min + 2.1).abs() < 1e-12);
    }

    #[test]
    fn zoom_refuses_to_invert_the_region() {
        assert!(square(5).zoom(20).is_err());
    }

    #[test]
    fn pixel_count_reports_overflow_instead_of_panicking() {
        assert_eq!(square(5).len(), Some(25));
        let huge = Viewport {
            width: usize::max_value() / 2,
            height: 4,
            ..Viewport::default()
        };
        assert_eq!(huge.len(), None);
    }

    #[test]
    fn iteration_bound_never_drops_below_one() {
        let vp = square(5);
        assert_eq!(vp.adjust_iterations(5).max_iterations, 105);
        assert_eq!(vp.adjust_iterations(-500).max_iterations, 1);
    }
}
