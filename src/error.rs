// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The failure modes of a render.  None of them carry a partial
//! buffer: a render either produces a complete image or nothing.

/// Everything that can go wrong between handing the engine a viewport
/// and getting a finished buffer back.
#[derive(Debug, Fail, PartialEq)]
pub enum RenderError {
    /// The viewport has an empty dimension, a zero iteration bound, or
    /// bounds that are inverted or not finite.
    #[fail(display = "Invalid viewport: {}", _0)]
    InvalidViewport(String),

    /// Zero workers were requested.
    #[fail(display = "Parallelism must be at least 1")]
    InvalidParallelism,

    /// The pixel buffer could not be sized or allocated.
    #[fail(display = "Could not allocate a pixel buffer of {} bytes", bytes)]
    AllocationFailure {
        /// The number of bytes requested; saturates at `usize::MAX`
        /// when the size itself overflowed.
        bytes: usize,
    },

    /// A worker panicked while computing its band.
    #[fail(display = "A render worker panicked")]
    WorkerPanic {
        /// The index of the failed band, when it is known.
        band: Option<usize>,
    },

    /// The render was cancelled before every band completed.
    #[fail(display = "Render cancelled")]
    Cancelled,
}
