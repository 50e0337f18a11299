// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time engine.  Takes a viewport, breaks the image into
//! horizontal bands, and hands each band to its own scoped thread.
//! Each thread owns a disjoint slice of the output buffer, so the
//! pixels themselves need no locking; the only synchronization is the
//! join at the end of the scope.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam::thread::ScopedJoinHandle;
use num::Complex;

use bands::{partition, WorkBand};
use buffer::{PixelBuffer, CHANNELS};
use error::RenderError;
use palette::{ColorParams, Palette};
use viewport::{Pixel, Viewport};

/// A flag shared between a caller and a running render.  Workers look
/// at it before each row; once it is set they stop, and the render
/// fails with `Cancelled`.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    /// Asks every render holding this token to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A finished render: the image, plus the number of workers that
/// actually produced it, which is less than requested when the image
/// had fewer rows than that.
#[derive(Debug)]
pub struct Rendering {
    /// The image.
    pub pixels: PixelBuffer,
    /// How many workers ran.
    pub parallelism: usize,
}

/// This is our classic iterator function.  Returns the number of
/// iterations `c` survived before its orbit left the radius-2 disc, or
/// `max_iterations` if it never did.
#[inline]
pub fn escape_time(c: Complex<f64>, max_iterations: u32) -> u32 {
    let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
    let mut iteration = 0;
    while iteration < max_iterations && z.norm_sqr() <= 4.0 {
        z = z * z + c;
        iteration += 1;
    }
    iteration
}

/// Holds everything a render reads: the viewport, the palette and its
/// parameters, and a cancellation flag.  Once built it is never
/// mutated, and every worker reads it through a shared reference.
pub struct Renderer<'a, P: Palette + ?Sized + 'a> {
    viewport: Viewport,
    palette: &'a P,
    params: ColorParams,
    cancel: CancelToken,
}

impl<'a, P: Palette + ?Sized + 'a> Renderer<'a, P> {
    /// Requires the viewport, an optional replacement for the
    /// viewport's iteration bound, the palette, and the palette's
    /// parameters.  Fails if the resulting viewport is not renderable.
    pub fn new(
        viewport: &Viewport,
        max_iterations: Option<u32>,
        palette: &'a P,
        params: &ColorParams,
    ) -> Result<Self, RenderError> {
        let viewport = Viewport {
            max_iterations: max_iterations.unwrap_or(viewport.max_iterations),
            ..*viewport
        };
        viewport.validate()?;
        Ok(Renderer {
            viewport,
            palette,
            params: *params,
            cancel: CancelToken::new(),
        })
    }

    /// Lets a caller stop this render from another thread.
    pub fn with_cancel(mut self, cancel: &CancelToken) -> Self {
        self.cancel = cancel.clone();
        self
    }

    /// The viewport this renderer will draw, with any iteration
    /// override already applied.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Fills one band.  `slab` holds exactly the band's rows, each
    /// `stride` bytes long.
    fn render_band(&self, band: &WorkBand, slab: &mut [u8], stride: usize) -> Result<(), RenderError> {
        debug_assert!(!band.is_empty());
        let limit = self.viewport.max_iterations;
        trace!("Band {}..{} starting", band.start_y, band.end_y);

        for (y, row) in band.rows().zip(slab.chunks_mut(stride)) {
            if self.cancel.is_cancelled() {
                return Err(RenderError::Cancelled);
            }
            for (x, cell) in row.chunks_mut(CHANNELS).enumerate() {
                let point = self.viewport.pixel_to_point(&Pixel(x, y));
                let iteration = escape_time(point, limit);
                cell.copy_from_slice(&self.palette.color(iteration, limit, &self.params).bytes());
            }
        }

        trace!("Band {}..{} finished", band.start_y, band.end_y);
        Ok(())
    }

    /// Renders the whole image with up to `parallelism` threads, one
    /// per band.  Blocks until every band is done.
    pub fn render(&self, parallelism: usize) -> Result<Rendering, RenderError> {
        if parallelism == 0 {
            return Err(RenderError::InvalidParallelism);
        }

        let (width, height) = (self.viewport.width, self.viewport.height);
        let mut pixels = PixelBuffer::allocate(&self.viewport)?;
        let stride = pixels.stride();

        let bands = partition(height, parallelism);
        if bands.len() < parallelism {
            info!("Reducing thread count from {} to {}", parallelism, bands.len());
        }
        debug!(
            "Rendering {}x{} to {} iterations on {} threads",
            width,
            height,
            self.viewport.max_iterations,
            bands.len()
        );

        let slabs = split_bands(pixels.as_bytes_mut(), &bands, stride);
        let results = crossbeam::scope(|spawner| {
            let handles: Vec<ScopedJoinHandle<Result<(), RenderError>>> = bands
                .iter()
                .zip(slabs)
                .map(|(band, slab)| spawner.spawn(move |_| self.render_band(band, slab, stride)))
                .collect();

            handles
                .into_iter()
                .enumerate()
                .map(|(i, handle)| match handle.join() {
                    Ok(result) => result,
                    Err(_) => Err(RenderError::WorkerPanic { band: Some(i) }),
                })
                .collect::<Vec<_>>()
        })
        .map_err(|_| RenderError::WorkerPanic { band: None })?;

        // A panic outranks a cancellation: the caller should hear
        // about the fault even if it also asked the render to stop.
        let mut first_error = None;
        for result in results {
            match result {
                Err(RenderError::WorkerPanic { band }) => {
                    warn!("Render failed: worker for band {:?} panicked", band);
                    return Err(RenderError::WorkerPanic { band });
                }
                Err(e) => first_error = first_error.or(Some(e)),
                Ok(()) => {}
            }
        }
        if let Some(e) = first_error {
            warn!("Render abandoned: {}", e);
            return Err(e);
        }

        Ok(Rendering {
            pixels,
            parallelism: bands.len(),
        })
    }
}

/// Cuts the buffer into one mutable slab per band, top to bottom.
/// The bands partition the rows, so the slabs partition the bytes.
fn split_bands<'b>(mut rest: &'b mut [u8], bands: &[WorkBand], stride: usize) -> Vec<&'b mut [u8]> {
    bands
        .iter()
        .map(|band| {
            let (slab, tail) = mem::replace(&mut rest, &mut []).split_at_mut(band.len() * stride);
            rest = tail;
            slab
        })
        .collect()
}

/// The main function, and primary entry point.  Renders `viewport`
/// (with its iteration bound optionally replaced) through `palette`
/// on up to `parallelism` threads.
pub fn render<P: Palette + ?Sized>(
    viewport: &Viewport,
    max_iterations: Option<u32>,
    palette: &P,
    params: &ColorParams,
    parallelism: usize,
) -> Result<Rendering, RenderError> {
    Renderer::new(viewport, max_iterations, palette, params)?.render(parallelism)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::{Monochrome, Polynomial, Rgb};
    use std::sync::atomic::AtomicUsize;

    fn scenario() -> Viewport {
        Viewport::new(80, 40, Complex::new(-2.0, -1.2), Complex::new(1.3, 1.2), 100).unwrap()
    }

    #[test]
    fn origin_never_escapes() {
        assert_eq!(escape_time(Complex::new(0.0, 0.0), 1), 1);
        assert_eq!(escape_time(Complex::new(0.0, 0.0), 5000), 5000);
        assert_eq!(escape_time(Complex::new(-1.0, 0.0), 5000), 5000);
    }

    #[test]
    fn distant_points_escape_after_one_step() {
        assert_eq!(escape_time(Complex::new(2.0, 2.0), 2), 1);
        assert_eq!(escape_time(Complex::new(-2.0, 1.2), 100), 1);
    }

    #[test]
    fn the_edge_of_the_disc_still_counts_as_inside() {
        // c = -2 stays at 2 forever, which is exactly |z|^2 == 4.
        assert_eq!(escape_time(Complex::new(-2.0, 0.0), 50), 50);
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let err = render(&scenario(), None, &Polynomial, &ColorParams::default(), 0).unwrap_err();
        assert_eq!(err, RenderError::InvalidParallelism);
    }

    #[test]
    fn zero_iteration_override_is_rejected() {
        let err = render(&scenario(), Some(0), &Polynomial, &ColorParams::default(), 2).unwrap_err();
        match err {
            RenderError::InvalidViewport(_) => {}
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn override_replaces_the_iteration_bound() {
        let renderer = Renderer::new(&scenario(), Some(7), &Polynomial, &ColorParams::default()).unwrap();
        assert_eq!(renderer.viewport().max_iterations, 7);
    }

    #[test]
    fn effective_parallelism_is_reported() {
        let vp = Viewport { height: 3, ..scenario() };
        let rendering = render(&vp, None, &Polynomial, &ColorParams::default(), 4000).unwrap();
        assert_eq!(rendering.parallelism, 3);
        assert_eq!(rendering.pixels.as_bytes().len(), 80 * 3 * 3);
    }

    #[test]
    fn single_pixel_image_renders() {
        let vp = Viewport::new(1, 1, Complex::new(-0.5, -0.5), Complex::new(0.5, 0.5), 20).unwrap();
        let rendering = render(&vp, None, &Monochrome, &ColorParams::default(), 8).unwrap();
        // The lone pixel samples -0.5 + 0.5i, which is inside the set.
        assert_eq!(rendering.pixels.pixel(0, 0), Some(Rgb::WHITE));
        assert_eq!(rendering.parallelism, 1);
    }

    #[test]
    fn a_panicking_palette_fails_the_whole_render() {
        let explosive = |i: u32, max: u32, _p: &ColorParams| {
            if i == max {
                panic!("palette fault");
            }
            Rgb::BLACK
        };
        let err = render(&scenario(), None, &explosive, &ColorParams::default(), 4).unwrap_err();
        match err {
            RenderError::WorkerPanic { band: Some(_) } => {}
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn a_cancelled_render_returns_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let params = ColorParams::default();
        let renderer = Renderer::new(&scenario(), None, &Polynomial, &params)
            .unwrap()
            .with_cancel(&cancel);
        assert_eq!(renderer.render(4).unwrap_err(), RenderError::Cancelled);
    }

    #[test]
    fn cancelling_a_running_render_returns_nothing() {
        let cancel = CancelToken::new();
        let calls = AtomicUsize::new(0);
        // Every band has ten rows, so whichever worker colors the
        // first pixel is guaranteed to look at the token again.
        let cancelling = |i: u32, max: u32, p: &ColorParams| {
            calls.fetch_add(1, Ordering::SeqCst);
            cancel.cancel();
            Polynomial.color(i, max, p)
        };
        let params = ColorParams::default();
        let renderer = Renderer::new(&scenario(), None, &cancelling, &params)
            .unwrap()
            .with_cancel(&cancel);
        assert_eq!(renderer.render(4).unwrap_err(), RenderError::Cancelled);
        assert!(cancel.is_cancelled());
        // The worker that cancelled stopped before its second row.
        assert!(calls.load(Ordering::SeqCst) < 80 * 40);
    }

    #[test]
    fn an_untouched_token_does_not_cancel() {
        let cancel = CancelToken::new();
        let params = ColorParams::default();
        let renderer = Renderer::new(&scenario(), None, &Polynomial, &params)
            .unwrap()
            .with_cancel(&cancel);
        assert!(renderer.render(4).is_ok());
        assert!(!cancel.is_cancelled());
    }
}
