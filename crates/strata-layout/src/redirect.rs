//! Pointer redirection.

use strata_core::LayoutError;

use crate::raw;

/// Replace `*ptr` with the pointer value stored at `*ptr`.
///
/// A NULL result is accepted only when `allow_null` is set; otherwise the
/// call fails with [`LayoutError::BadPointer`] and `*ptr` is unchanged. A
/// NULL `*ptr` (nothing to read) is always rejected.
///
/// # Safety
///
/// A non-NULL `*ptr` must be readable for one pointer.
pub unsafe fn redirect_p(ptr: &mut *const u8, allow_null: bool) -> Result<(), LayoutError> {
    let location = *ptr;
    if location.is_null() {
        return Err(LayoutError::BadPointer {
            pointer: 0,
            location: 0,
        });
    }
    // SAFETY: non-NULL, readable per the caller contract.
    let target = unsafe { raw::read_pointer(location) };
    if target.is_null() && !allow_null {
        log::warn!("[redirect_p] NULL pointer read at {location:p}");
        return Err(LayoutError::BadPointer {
            pointer: 0,
            location: location as usize,
        });
    }
    *ptr = target;
    Ok(())
}
