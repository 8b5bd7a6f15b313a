//! Memory footprint of nested data.

use strata_core::{DimensionSize, LayoutError};

use crate::dimension::Layer;
use crate::raw;

/// Bytes a variable instance occupies, split into payload and
/// bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Footprint {
    /// Every byte reachable from the instance, headers and strings
    /// included.
    pub data: u64,
    /// The part of `data` spent on headers, pointers, terminators, and
    /// string pointer arrays.
    pub aux: u64,
}

/// Measure the instance of `layer` at `ptr`.
///
/// The bytes of the instance itself (the outermost header or pointer) are
/// counted; the memory holding it is the caller's and is not.
///
/// # Safety
///
/// `ptr` must address a readable instance of `layer`, as for
/// [`Layer::update_pointer_and_size`].
pub unsafe fn measure(layer: Layer<'_>, ptr: *const u8) -> Result<Footprint, LayoutError> {
    let mut data = DimensionSize::ZERO;
    let mut aux = DimensionSize::ZERO;
    // SAFETY: forwarded caller contract.
    unsafe { accumulate(layer, ptr, &mut data, &mut aux)? };
    Ok(Footprint {
        data: data.to_number("footprint data")?,
        aux: aux.to_number("footprint aux")?,
    })
}

/// # Safety
///
/// As for [`measure`].
unsafe fn accumulate(
    mut layer: Layer<'_>,
    mut ptr: *const u8,
    data: &mut DimensionSize,
    aux: &mut DimensionSize,
) -> Result<(), LayoutError> {
    let mut multiplier = DimensionSize::ONE;
    if !layer.is_final() {
        // SAFETY: ptr addresses an instance of `layer`.
        let extent = unsafe { layer.update_pointer_and_size(&mut ptr)? };
        multiplier = multiplier * extent.elements();
        let overhead = layer.overhead()?;
        *aux = *aux + overhead;
        *data = *data + overhead;
        layer = step(layer)?;
        while !layer.is_break() {
            // SAFETY: inline layers never dereference.
            let extent = unsafe { layer.update_pointer_and_size(&mut ptr)? };
            multiplier = multiplier * extent.elements();
            layer = step(layer)?;
        }
    }

    let elements = multiplier.to_u32("footprint multiplier")?;
    let stride = layer.type_size() as usize;

    if let Some(td) = layer.dimension().type_descriptor() {
        let full = DimensionSize::new(td.storage_size()) * elements;
        if !td.is_char_string() {
            *data = *data + full;
            return Ok(());
        }
        *aux = *aux + full;
        *data = *data + full;
        for i in 0..elements as usize {
            // SAFETY: `elements` string pointers follow ptr.
            let s = unsafe { raw::read_pointer(ptr.add(i * stride)) };
            if !s.is_null() {
                // SAFETY: non-NULL leaf strings are NUL-terminated.
                let len = unsafe { raw::c_str_len(s) };
                *data = *data + DimensionSize::from(len) + 1u32;
            }
        }
        return Ok(());
    }

    for i in 0..elements as usize {
        // SAFETY: `elements` instances of the break layer follow ptr.
        unsafe { accumulate(layer, ptr.add(i * stride), data, aux)? };
    }
    Ok(())
}

fn step(layer: Layer<'_>) -> Result<Layer<'_>, LayoutError> {
    layer.next().ok_or_else(|| {
        LayoutError::fatal(format!(
            "layer {} ('{}') has no successor",
            layer.index(),
            layer.type_char()
        ))
    })
}
