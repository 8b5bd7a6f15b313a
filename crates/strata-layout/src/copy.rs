//! Element-wise copy between two differently shaped variables.
//!
//! Both shapes are walked layer by layer. At each level the runtime
//! extents must agree, unless the destination is a resizable vector or
//! matrix and resizing is allowed. When one side is 2-D and the other is
//! not, the 1-D side joins its next inline layer to supply the missing
//! dimension. Leaf elements pass through a [`ConversionOp`].

use strata_arena::Heap;
use strata_core::{DimensionSize, LayoutError, TypeDescriptor};

use crate::dimension::Layer;
use crate::raw;

/// Converts a run of leaf elements from one type to another.
pub trait ConversionOp {
    /// Convert `count` elements from `src` into `dst`.
    ///
    /// # Safety
    ///
    /// `src` must hold `count` readable source elements and `dst` must
    /// have room for `count` destination elements.
    unsafe fn convert(&self, dst: *mut u8, src: *const u8, count: u32) -> Result<(), LayoutError>;
}

/// Bitwise copy between identical leaf types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteCopy {
    element_size: u32,
}

impl ByteCopy {
    /// Copy elements of `td`.
    pub fn new(td: &TypeDescriptor) -> Self {
        Self {
            element_size: td.storage_size(),
        }
    }

    /// A copy between two leaf types, if they are the same apart from
    /// constness.
    pub fn between(source: &TypeDescriptor, dest: &TypeDescriptor) -> Result<Self, LayoutError> {
        if !source.same_as(dest) {
            return Err(LayoutError::unsupported(format!(
                "no conversion from {source} to {dest}"
            )));
        }
        Ok(Self::new(source))
    }
}

impl ConversionOp for ByteCopy {
    unsafe fn convert(&self, dst: *mut u8, src: *const u8, count: u32) -> Result<(), LayoutError> {
        let bytes = (DimensionSize::new(count) * self.element_size).to_usize("copy size")?;
        // SAFETY: forwarded caller contract.
        unsafe { raw::copy_bytes(dst, src, bytes) }
    }
}

/// Whether a destination vector or matrix may be reallocated to fit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizePolicy {
    /// Resize dynamic destinations whose extent differs.
    Allow,
    /// Fail on any extent mismatch.
    #[default]
    Forbid,
}

/// Copy the instance of `source` at `src` into the instance of `dest` at
/// `dst`.
///
/// # Safety
///
/// `src` must address a readable instance of `source`; `dst` a writable
/// instance of `dest` whose owned payloads came from `heap`.
pub unsafe fn copy_to(
    source: Layer<'_>,
    src: *const u8,
    dest: Layer<'_>,
    dst: *mut u8,
    op: &dyn ConversionOp,
    policy: ResizePolicy,
    heap: &dyn Heap,
) -> Result<(), LayoutError> {
    let source_dims = source.n_of_dimensions();
    let dest_dims = dest.n_of_dimensions();

    let mut source = source;
    let mut src = src;
    // SAFETY: src addresses an instance of `source`.
    let extent = unsafe { source.update_pointer_and_size(&mut src)? };
    let (source_cols, mut source_rows) = (extent.columns, extent.rows);
    if dest_dims > source_dims {
        // SAFETY: joined layers are inline.
        source_rows = unsafe { join(&mut source, &mut src)? };
    }
    let elements = (DimensionSize::new(source_cols) * source_rows).to_u32("copy element count")?;

    let mut dest = dest;
    let mut target = dst.cast_const();
    // SAFETY: dst addresses an instance of `dest`.
    let extent = unsafe { dest.update_pointer_and_size(&mut target)? };
    let (dest_cols, mut dest_rows) = (extent.columns, extent.rows);
    if source_dims > dest_dims {
        // SAFETY: joined layers are inline.
        dest_rows = unsafe { join(&mut dest, &mut target)? };
    }

    if (dest_cols, dest_rows) != (source_cols, source_rows) {
        let resizable = policy == ResizePolicy::Allow && dest_dims >= source_dims && dest.is_dynamic();
        if !resizable {
            return Err(LayoutError::unsupported(format!(
                "extent mismatch D({dest_cols}x{dest_rows}) != S({source_cols}x{source_rows})"
            )));
        }
        let mut header = dst;
        // SAFETY: dst is the writable header of a dynamic layer.
        unsafe { dest.resize(&mut header, source_cols, source_rows, heap)? };
        target = header.cast_const();
    }

    if source.is_final_layer() && dest.is_final_layer() {
        // SAFETY: both sides hold `elements` leaves.
        return unsafe { op.convert(target.cast_mut(), src, elements) };
    }

    let source_step = source.next_layer_element_size()? as usize;
    let dest_step = dest.next_layer_element_size()? as usize;
    let (Some(source_next), Some(dest_next)) = (source.next(), dest.next()) else {
        return Err(LayoutError::internal_setup("copy ran past the end of a chain"));
    };
    for i in 0..elements as usize {
        // SAFETY: element i lies within both runs.
        unsafe {
            copy_to(
                source_next,
                src.add(i * source_step),
                dest_next,
                target.cast_mut().add(i * dest_step),
                op,
                policy,
                heap,
            )
        }
        .map_err(|e| e.context(format!("element {i} of layer {}", source.index())))?;
    }
    Ok(())
}

/// Absorb the inline layer below `layer` as a row count.
///
/// # Safety
///
/// The joined layer must be inline, which this checks before touching
/// `ptr`.
unsafe fn join<'a>(layer: &mut Layer<'a>, ptr: &mut *const u8) -> Result<u32, LayoutError> {
    let joined = layer
        .next()
        .ok_or_else(|| LayoutError::unsupported("no more layers available to join"))?;
    if joined.is_break() || joined.n_of_dimensions() > 1 {
        return Err(LayoutError::unsupported(format!(
            "cannot join a layer of type '{}'",
            joined.type_char()
        )));
    }
    // SAFETY: inline layers never dereference.
    let extent = unsafe { joined.update_pointer_and_size(ptr)? };
    *layer = joined;
    Ok(extent.columns)
}
