//! Time alignment of block boundaries.

use crate::{Error, Result};

/// Width of a raw (level 1) block as cut by the storage compactor: two hours in milliseconds.
pub const RAW_BLOCK_WIDTH_MS: i64 = 2 * 60 * 60 * 1000;

/// Returns the end of the `width` wide bucket containing `timestamp`, i.e. the smallest multiple
/// of `width` strictly greater than `timestamp`.
///
/// Compactors cut block boundaries on this grid.
///
/// ```
/// # use blockgen::align_forward;
/// assert_eq!(align_forward(0, 7_200_000).unwrap(), 7_200_000);
/// assert_eq!(align_forward(7_200_000, 7_200_000).unwrap(), 14_400_000);
/// assert_eq!(align_forward(-1, 10).unwrap(), 0);
/// ```
pub fn align_forward(timestamp: i64, width: i64) -> Result<i64> {
    if width <= 0 {
        return Err(Error::invalid_configuration(format!(
            "alignment width must be positive, got {width}"
        )));
    }

    timestamp
        .div_euclid(width)
        .checked_mul(width)
        .and_then(|floor| floor.checked_add(width))
        .ok_or(Error::TimestampOutOfRange { millis: timestamp })
}
