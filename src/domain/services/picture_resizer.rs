//! Bounded thumbnail sizing.

use std::sync::Arc;

use image::imageops::FilterType;
use tracing::{debug, trace};

use crate::domain::entities::{Bound, Picture};

/// Computes and applies thumbnail sizes that fit a bound.
pub struct PictureResizer;

impl PictureResizer {
    /// Returns the size `(width, height)` fits into within `bound`.
    ///
    /// Width is fitted first, then height using the already-fitted size. Each
    /// derived side is floored to an even number so the result never exceeds
    /// the bound and stays encodable. An unbounded `bound` returns the input.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn fit_dimensions(width: u32, height: u32, bound: Bound) -> (u32, u32) {
        if bound.is_unbounded() {
            return (width, height);
        }

        let (mut w, mut h) = (u64::from(width), u64::from(height));
        let (bw, bh) = (u64::from(bound.width), u64::from(bound.height));

        if w > bw {
            h = floor_even(h * bw / w);
            w = bw;
        }

        if h > bh {
            w = floor_even(w * bh / h);
            h = bh;
        }

        // Both sides only shrink, so they still fit in u32.
        (w as u32, h as u32)
    }

    /// Scales `picture` to fit within `bound`.
    ///
    /// Returns the same `Arc` when no scaling is needed, including the
    /// degenerate case where fitting would collapse a side to zero.
    #[must_use]
    pub fn resize(picture: &Picture, bound: Bound) -> Picture {
        let (width, height) = (picture.width(), picture.height());
        let (new_width, new_height) = Self::fit_dimensions(width, height, bound);

        if (new_width, new_height) == (width, height) {
            trace!(width, height, bound = %bound, "Picture already fits bound");
            return Arc::clone(picture);
        }

        if new_width == 0 || new_height == 0 {
            debug!(width, height, bound = %bound, "Fitted size collapses, keeping original");
            return Arc::clone(picture);
        }

        debug!(width, height, new_width, new_height, "Resizing picture");
        Arc::new(picture.resize_exact(new_width, new_height, FilterType::Lanczos3))
    }
}

const fn floor_even(value: u64) -> u64 {
    value & !1
}
