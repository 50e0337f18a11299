// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The finished image: tightly packed RGB, three bytes per pixel,
//! row-major, top row first.  This is the layout display textures and
//! image encoders expect, so it must not change.

use error::RenderError;
use itertools::iproduct;
use palette::Rgb;
use viewport::Viewport;

/// Bytes per pixel.
pub const CHANNELS: usize = 3;

/// A rendered image.  Owned outright by whoever asked for the render.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Allocates a zeroed buffer for the viewport's image.  Reports
    /// an allocation failure, rather than aborting, if the size
    /// overflows or the memory is not available.
    pub fn allocate(viewport: &Viewport) -> Result<PixelBuffer, RenderError> {
        let (width, height) = (viewport.width, viewport.height);
        let bytes = viewport
            .len()
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or(RenderError::AllocationFailure {
                bytes: usize::max_value(),
            })?;

        let mut pixels: Vec<u8> = Vec::new();
        pixels
            .try_reserve_exact(bytes)
            .map_err(|_| RenderError::AllocationFailure { bytes })?;
        pixels.resize(bytes, 0);

        Ok(PixelBuffer {
            width,
            height,
            pixels,
        })
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The number of bytes in one row.
    pub fn stride(&self) -> usize {
        self.width * CHANNELS
    }

    /// The color at column `x`, row `y`, or None if that is outside
    /// the image.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.width + x) * CHANNELS;
        let p = &self.pixels[offset..offset + CHANNELS];
        Some(Rgb(p[0], p[1], p[2]))
    }

    /// Every pixel with its coordinates, in buffer order.
    pub fn enumerate_pixels<'a>(&'a self) -> impl Iterator<Item = (usize, usize, Rgb)> + 'a {
        iproduct!(0..self.height, 0..self.width).zip(self.pixels.chunks(CHANNELS)).map(
            |((y, x), p)| (x, y, Rgb(p[0], p[1], p[2])),
        )
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Gives up the raw bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.pixels
    }
}
