// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Divides the rows of an image among workers.
//!
//! ```text
//!              ----------------
//! band 0 -->  |                |
//!             |                |
//! band 1 -->  |     pixels     |
//!             |                |
//! band 2 -->  |                |
//!              ----------------
//! ```
//!
//! Every band but the last gets `height / workers` rows; the last one
//! picks up whatever is left over.  When the height does not divide
//! evenly the last band is the largest, and the last worker finishes
//! last.  That imbalance is accepted in exchange for a trivially
//! checkable partition.

use std::ops::Range;

/// A contiguous, half-open run of rows `[start_y, end_y)` owned by
/// exactly one worker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WorkBand {
    /// First row of the band.
    pub start_y: usize,
    /// One past the last row of the band.
    pub end_y: usize,
}

impl WorkBand {
    /// The number of rows in the band.
    pub fn len(&self) -> usize {
        self.end_y - self.start_y
    }

    /// A band with no rows.  `partition` never produces one.
    pub fn is_empty(&self) -> bool {
        self.end_y <= self.start_y
    }

    /// The rows of the band, top to bottom.
    pub fn rows(&self) -> Range<usize> {
        self.start_y..self.end_y
    }
}

/// Clamps a requested worker count so that every worker owns at least
/// one row.  A request for zero workers stays zero; the engine
/// rejects it before getting here.
pub fn effective_parallelism(height: usize, requested: usize) -> usize {
    if requested > height {
        height
    } else {
        requested
    }
}

/// Splits `height` rows into bands, one per worker, after clamping
/// the worker count to the height.  Returns no bands if either count
/// is zero.
pub fn partition(height: usize, requested: usize) -> Vec<WorkBand> {
    let workers = effective_parallelism(height, requested);
    if workers == 0 {
        return vec![];
    }

    let step = height / workers;
    (0..workers)
        .map(|i| WorkBand {
            start_y: i * step,
            end_y: if i == workers - 1 { height } else { (i + 1) * step },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(height: usize, bands: &[WorkBand]) {
        let mut next = 0;
        for band in bands {
            assert_eq!(band.start_y, next, "gap or overlap at row {}", next);
            assert!(!band.is_empty(), "empty band {:?}", band);
            next = band.end_y;
        }
        assert_eq!(next, height);
    }

    #[test]
    fn bands_cover_every_row_exactly_once() {
        for height in 1..64 {
            for workers in 1..80 {
                let bands = partition(height, workers);
                assert_eq!(bands.len(), effective_parallelism(height, workers));
                assert!(bands.len() <= height);
                assert_exact_cover(height, &bands);
            }
        }
    }

    #[test]
    fn even_division_gives_equal_bands() {
        let bands = partition(40, 8);
        assert_eq!(bands.len(), 8);
        assert!(bands.iter().all(|b| b.len() == 5));
    }

    #[test]
    fn last_band_absorbs_the_remainder() {
        let bands = partition(10, 4);
        let lens: Vec<usize> = bands.iter().map(WorkBand::len).collect();
        assert_eq!(lens, vec![2, 2, 2, 4]);
    }

    #[test]
    fn too_many_workers_are_clamped_to_the_height() {
        assert_eq!(effective_parallelism(3, 4000), 3);
        let bands = partition(3, 4000);
        assert_eq!(
            bands,
            vec![
                WorkBand { start_y: 0, end_y: 1 },
                WorkBand { start_y: 1, end_y: 2 },
                WorkBand { start_y: 2, end_y: 3 },
            ]
        );
    }

    #[test]
    fn a_single_worker_takes_everything() {
        assert_eq!(partition(17, 1), vec![WorkBand { start_y: 0, end_y: 17 }]);
    }

    #[test]
    fn nothing_to_partition() {
        assert!(partition(0, 4).is_empty());
        assert!(partition(4, 0).is_empty());
    }
}
