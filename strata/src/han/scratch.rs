//! Call-scoped scratch allocation.
//!
//! Every temporary the hierarchical path needs (count arrays, bounce
//! buffers, leader staging) goes through here, so exhaustion surfaces as
//! `OutOfResource` instead of aborting the process. The optional
//! `max_scratch_bytes` limit is checked first.

use crate::error::{Result, StrataError};

/// Fail with `OutOfResource` if `bytes` exceeds `limit`.
pub(crate) fn ensure_within(bytes: usize, what: &'static str, limit: Option<usize>) -> Result<()> {
    match limit {
        Some(max) if bytes > max => {
            tracing::debug!(what, bytes, max, "scratch allocation over limit");
            Err(StrataError::out_of_resource(what, bytes))
        }
        _ => Ok(()),
    }
}

/// A zero-filled byte buffer of `len` bytes.
pub(crate) fn zeroed(len: usize, what: &'static str, limit: Option<usize>) -> Result<Vec<u8>> {
    array(len, 0u8, what, limit)
}

/// A `len`-element array filled with `fill`.
pub(crate) fn array<T: Clone>(
    len: usize,
    fill: T,
    what: &'static str,
    limit: Option<usize>,
) -> Result<Vec<T>> {
    let bytes = len
        .checked_mul(std::mem::size_of::<T>())
        .ok_or(StrataError::out_of_resource(what, usize::MAX))?;
    ensure_within(bytes, what, limit)?;
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| StrataError::out_of_resource(what, bytes))?;
    v.resize(len, fill);
    Ok(v)
}
