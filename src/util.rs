//! Branch hints for hot decode paths.

#[inline(always)]
#[cold]
fn cold() {}

/// Marks `b` as usually true.
#[inline(always)]
pub(crate) fn likely(b: bool) -> bool {
    if !b {
        cold();
    }
    b
}

/// Marks `b` as usually false.
#[inline(always)]
pub(crate) fn unlikely(b: bool) -> bool {
    if b {
        cold();
    }
    b
}
