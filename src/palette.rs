// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Palettes turn an escape count into a color.  A palette must be a
//! pure function of its inputs: the engine calls it from many threads
//! at once and expects the same answer for the same pixel every time.

use num::clamp;

/// A packed red, green, blue triple.  This is exactly three bytes, in
/// that order, which is the layout of every pixel in a PixelBuffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Points inside the set.
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    /// Full intensity on every channel.
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// The three bytes as they appear in the buffer.
    pub fn bytes(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

/// Auxiliary values handed, untouched, to the palette on every call.
/// The default palette ignores them; `ChannelScale` reads them as the
/// brightest value each channel may reach.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColorParams {
    /// Cap for the red channel.
    pub red: u32,
    /// Cap for the green channel.
    pub green: u32,
    /// Cap for the blue channel.
    pub blue: u32,
}

impl Default for ColorParams {
    fn default() -> Self {
        ColorParams {
            red: 100,
            green: 100,
            blue: 100,
        }
    }
}

/// Names one of the three color channels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Channel {
    /// Red
    Red,
    /// Green
    Green,
    /// Blue
    Blue,
}

impl ColorParams {
    /// Raises or lowers one channel cap, flooring it at zero.
    pub fn adjust(&self, channel: Channel, delta: i64) -> ColorParams {
        let shift = |v: u32| clamp(i64::from(v) + delta, 0, i64::from(u32::max_value())) as u32;
        let mut params = *self;
        match channel {
            Channel::Red => params.red = shift(params.red),
            Channel::Green => params.green = shift(params.green),
            Channel::Blue => params.blue = shift(params.blue),
        }
        params
    }
}

/// Anything that can color a pixel from its escape count.  Closures
/// with the matching signature are palettes too.
pub trait Palette: Sync {
    /// Given the number of iterations a point survived and the bound
    /// it was iterated to, return its color.
    fn color(&self, iteration: u32, max_iteration: u32, params: &ColorParams) -> Rgb;
}

impl<F> Palette for F
where
    F: Fn(u32, u32, &ColorParams) -> Rgb + Sync,
{
    fn color(&self, iteration: u32, max_iteration: u32, params: &ColorParams) -> Rgb {
        self(iteration, max_iteration, params)
    }
}

/// Truncates towards zero after clamping into the byte range.
#[inline]
fn clamp_u8(v: f64) -> u8 {
    clamp(v, 0.0, 255.0) as u8
}

/// The default palette: a fixed set of Bernstein-like polynomials in
/// the normalized escape count, giving a dark blue rim that fades
/// through green to orange near the boundary of the set.
#[derive(Copy, Clone, Debug, Default)]
pub struct Polynomial;

impl Palette for Polynomial {
    fn color(&self, iteration: u32, max_iteration: u32, _params: &ColorParams) -> Rgb {
        if iteration >= max_iteration {
            return Rgb::BLACK;
        }

        // Red and green are computed in single precision; blue is
        // widened by its fractional coefficient.  The output is
        // pinned to that arithmetic.
        let t = iteration as f32 / max_iteration as f32;
        let u = 1.0 - t;
        let r = 9.0_f32 * u * t * t * t * 255.0;
        let g = 15.0_f32 * u * u * t * t * 255.0;
        let b = 8.5_f64 * f64::from(u) * f64::from(u) * f64::from(u) * f64::from(t) * 255.0;

        Rgb(clamp_u8(f64::from(r)), clamp_u8(f64::from(g)), clamp_u8(b))
    }
}

/// A linear ramp on every channel, from black at zero iterations up
/// to the channel's cap just short of the bound.  Points in the set
/// are white.
#[derive(Copy, Clone, Debug, Default)]
pub struct ChannelScale;

impl Palette for ChannelScale {
    fn color(&self, iteration: u32, max_iteration: u32, params: &ColorParams) -> Rgb {
        if iteration >= max_iteration {
            return Rgb::WHITE;
        }
        let ramp = |cap: u32| {
            let v = (cap.min(255) as f32) / (max_iteration as f32) * (iteration as f32);
            clamp_u8(f64::from(v))
        };
        Rgb(ramp(params.red), ramp(params.green), ramp(params.blue))
    }
}

/// In or out: white for members of the set, black for everything
/// that escaped.
#[derive(Copy, Clone, Debug, Default)]
pub struct Monochrome;

impl Palette for Monochrome {
    fn color(&self, iteration: u32, max_iteration: u32, _params: &ColorParams) -> Rgb {
        if iteration >= max_iteration {
            Rgb::WHITE
        } else {
            Rgb::BLACK
        }
    }
}
