#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which repeatedly squaring `z` and adding `c`, starting from
//! zero, never sends `z` off to infinity.  Once `|z|` passes 2 it is
//! guaranteed to escape, so we iterate each point up to some bound and
//! record how many steps it survived.  That count, the "escape time,"
//! is what gets turned into a color.  Points that survive the whole
//! bound are treated as members of the set and drawn black.
//!
//! Every pixel is independent of every other, so the image is split
//! into horizontal bands and each band is computed on its own thread,
//! writing straight into its own slice of the output buffer.
//!
//! ```no_run
//! use mandelbrot::{render, ColorParams, Polynomial, Viewport};
//!
//! let rendering = render(&Viewport::default(), None, &Polynomial, &ColorParams::default(), 8)
//!     .expect("render failed");
//! assert_eq!(rendering.pixels.as_bytes().len(), 800 * 400 * 3);
//! ```

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;

pub mod bands;
pub mod buffer;
pub mod engine;
pub mod error;
pub mod palette;
pub mod viewport;

pub use bands::WorkBand;
pub use buffer::PixelBuffer;
pub use engine::{escape_time, render, CancelToken, Renderer, Rendering};
pub use error::RenderError;
pub use palette::{Channel, ChannelScale, ColorParams, Monochrome, Palette, Polynomial, Rgb};
pub use viewport::{Pixel, Viewport};
