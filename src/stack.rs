//! Trees built from long or deeply parenthesized input can be far deeper
//! than the thread stack allows to recurse over. Every recursive step over
//! a tree goes through [`guarded`], which switches to a fresh heap-allocated
//! stack segment once the current one runs low.

const RED_ZONE: usize = 64 * 1024;
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

pub(crate) fn guarded<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}
