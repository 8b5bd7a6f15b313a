//! Deep copies of nested data into a page arena.
//!
//! The clone has the same logical contents as the source but a simpler
//! shape: every indirect layer becomes a non-owning vector header (or a
//! matrix header for matrices), inline arrays stay inline, and
//! pointer-to-array layers keep their pointer. In string mode each
//! character string is duplicated into the arena too.
//!
//! [`VariableCloner::output_modifiers`] spells the clone's shape so it can
//! be traversed, measured, or cloned again.

use std::ptr::NonNull;

use strata_arena::PageArena;
use strata_core::{DimensionSize, LayoutError};

use crate::dimension::{DimensionKind, Layer};
use crate::header::{MatrixHeader, VectorHeader, MATRIX_HEADER_SIZE, VECTOR_HEADER_SIZE};
use crate::raw::{self, POINTER_SIZE};
use crate::redirect::redirect_p;
use crate::variable::Variable;

/// Clones data shaped by a [`Variable`] into a [`PageArena`].
pub struct VariableCloner<'a> {
    variable: &'a Variable,
    arena: &'a mut PageArena,
    string_mode: bool,
}

impl<'a> VariableCloner<'a> {
    /// A cloner for `variable`. String mode is on when the leaf type is a
    /// character string.
    pub fn new(variable: &'a Variable, arena: &'a mut PageArena) -> Self {
        let string_mode = variable.type_descriptor().is_char_string();
        Self {
            variable,
            arena,
            string_mode,
        }
    }

    /// Override string mode.
    pub fn with_string_mode(mut self, on: bool) -> Self {
        self.string_mode = on;
        self
    }

    /// Whether leaf strings are duplicated.
    pub fn is_string_mode(&self) -> bool {
        self.string_mode
    }

    /// Clone one instance of the variable found at `source`.
    ///
    /// Returns the start of the clone in the arena. On failure the arena
    /// may hold partial output, which stays until the arena is reset.
    ///
    /// # Safety
    ///
    /// `source` must address one readable instance of the variable's
    /// shape, with every pointer and header in it valid for the extent it
    /// declares.
    pub unsafe fn clone_from(&mut self, source: *const u8) -> Result<NonNull<u8>, LayoutError> {
        let variable = self.variable;
        let root = variable.root();
        // SAFETY: forwarded caller contract.
        let out = unsafe { self.do_create(root, source, DimensionSize::ONE) };
        match &out {
            Ok(ptr) => log::debug!(
                "[VariableCloner::clone_from] {:?} cloned to {ptr:p}",
                variable.modifiers()
            ),
            Err(e) => log::warn!(
                "[VariableCloner::clone_from] {:?} failed: {e}",
                variable.modifiers()
            ),
        }
        out
    }

    /// Modifier string of the clone's shape.
    pub fn output_modifiers(&self) -> String {
        let mut out = String::new();
        for layer in self.variable.layers() {
            match layer.kind() {
                DimensionKind::Data(_) => {}
                DimensionKind::Array { count } => out.push_str(&format!("A{count}")),
                DimensionKind::PointerToArray { count } => out.push_str(&format!("f{count}")),
                DimensionKind::Vector | DimensionKind::ZeroTerminated => out.push('v'),
                DimensionKind::Matrix => out.push('m'),
            }
        }
        out
    }

    fn reserve(
        &mut self,
        count: DimensionSize,
        element_size: usize,
        what: &'static str,
    ) -> Result<NonNull<u8>, LayoutError> {
        let bytes = (count * DimensionSize::from(element_size)).to_usize(what)?;
        Ok(self.arena.write_reserve_atomic(bytes)?)
    }

    /// Clone `count` consecutive elements of `layer` from `input`.
    ///
    /// # Safety
    ///
    /// `input` must hold `count` readable elements of `layer`.
    unsafe fn do_create(
        &mut self,
        layer: Layer<'_>,
        input: *const u8,
        count: DimensionSize,
    ) -> Result<NonNull<u8>, LayoutError> {
        match layer.kind() {
            DimensionKind::Data(td) => {
                let size = td.storage_size() as usize;
                let out = self.reserve(count, size, "leaf storage")?;
                if !self.string_mode {
                    let bytes = (count * td.storage_size()).to_usize("leaf storage")?;
                    // SAFETY: both sides hold `count` leaves.
                    unsafe { raw::copy_bytes(out.as_ptr(), input, bytes)? };
                    return Ok(out);
                }
                if size != POINTER_SIZE {
                    return Err(LayoutError::parameters(format!(
                        "string mode over {td}, which is not pointer sized"
                    )));
                }
                for i in 0..count.to_usize("string count")? {
                    // SAFETY: entry i is one of the `count` string pointers.
                    let s = unsafe { raw::read_pointer(input.add(i * POINTER_SIZE)) };
                    let copy = if s.is_null() {
                        std::ptr::null_mut()
                    } else {
                        // SAFETY: non-NULL leaf strings are NUL-terminated.
                        let len = unsafe { raw::c_str_len(s) } + 1;
                        let dup = self.reserve(DimensionSize::ONE, len, "string copy")?;
                        // SAFETY: `len` bytes on both sides.
                        unsafe { raw::copy_bytes(dup.as_ptr(), s, len)? };
                        dup.as_ptr()
                    };
                    // SAFETY: `out` holds `count` pointers.
                    unsafe { raw::write_pointer(out.as_ptr().add(i * POINTER_SIZE), copy) };
                }
                Ok(out)
            }
            DimensionKind::Array { count: per } => {
                let next = next_of(layer)?;
                // SAFETY: `count` arrays of `per` are `count * per` elements.
                unsafe { self.do_create(next, input, count * per) }
            }
            DimensionKind::PointerToArray { count: per } => {
                let next = next_of(layer)?;
                let out = self.reserve(count, POINTER_SIZE, "pointer array")?;
                for i in 0..count.to_usize("pointer count")? {
                    // SAFETY: entry i is one of `count` pointers.
                    let mut p = unsafe { input.add(i * POINTER_SIZE) };
                    // SAFETY: as above.
                    unsafe { redirect_p(&mut p, true)? };
                    let copy = if p.is_null() {
                        std::ptr::null_mut()
                    } else {
                        // SAFETY: a non-NULL pointer addresses `per` elements.
                        unsafe { self.do_create(next, p, DimensionSize::new(per)) }
                            .map_err(|e| e.context(format!("pointer {i} of layer {}", layer.index())))?
                            .as_ptr()
                    };
                    // SAFETY: `out` holds `count` pointers.
                    unsafe { raw::write_pointer(out.as_ptr().add(i * POINTER_SIZE), copy) };
                }
                Ok(out)
            }
            DimensionKind::Vector => {
                let next = next_of(layer)?;
                let out = self.reserve(count, VECTOR_HEADER_SIZE, "vector headers")?;
                for i in 0..count.to_usize("vector count")? {
                    // SAFETY: header i is one of `count`.
                    let h = unsafe { VectorHeader::read_from(input.add(i * VECTOR_HEADER_SIZE)) };
                    let cloned = if h.data.is_null() {
                        if h.count != 0 {
                            return Err(LayoutError::internal_setup(format!(
                                "vector {i} of layer {} has {} elements and a NULL pointer",
                                layer.index(),
                                h.count
                            )));
                        }
                        VectorHeader::EMPTY
                    } else {
                        // SAFETY: the header declares `h.count` elements.
                        let data = unsafe { self.do_create(next, h.data, DimensionSize::new(h.count)) }
                            .map_err(|e| e.context(format!("vector {i} of layer {}", layer.index())))?;
                        VectorHeader::new(data.as_ptr(), h.count)
                    };
                    // SAFETY: `out` holds `count` headers.
                    unsafe { cloned.write_to(out.as_ptr().add(i * VECTOR_HEADER_SIZE)) };
                }
                Ok(out)
            }
            DimensionKind::Matrix => {
                let next = next_of(layer)?;
                let out = self.reserve(count, MATRIX_HEADER_SIZE, "matrix headers")?;
                for i in 0..count.to_usize("matrix count")? {
                    // SAFETY: header i is one of `count`.
                    let h = unsafe { MatrixHeader::read_from(input.add(i * MATRIX_HEADER_SIZE)) };
                    let cloned = if h.data.is_null() {
                        if h.element_count() != DimensionSize::ZERO {
                            return Err(LayoutError::internal_setup(format!(
                                "matrix {i} of layer {} is {}x{} with a NULL pointer",
                                layer.index(),
                                h.rows,
                                h.cols
                            )));
                        }
                        MatrixHeader::EMPTY
                    } else {
                        // SAFETY: the header declares rows * cols elements.
                        let data = unsafe { self.do_create(next, h.data, h.element_count()) }
                            .map_err(|e| e.context(format!("matrix {i} of layer {}", layer.index())))?;
                        MatrixHeader::new(data.as_ptr(), h.rows, h.cols)
                    };
                    // SAFETY: `out` holds `count` headers.
                    unsafe { cloned.write_to(out.as_ptr().add(i * MATRIX_HEADER_SIZE)) };
                }
                Ok(out)
            }
            DimensionKind::ZeroTerminated => {
                let next = next_of(layer)?;
                let out = self.reserve(count, VECTOR_HEADER_SIZE, "vector headers")?;
                for i in 0..count.to_usize("array count")? {
                    // SAFETY: pointer i is one of `count`.
                    let mut p = unsafe { input.add(i * POINTER_SIZE) };
                    // SAFETY: p addresses a zero-terminated array pointer.
                    let extent = unsafe { layer.update_pointer_and_size(&mut p) }
                        .map_err(|e| e.context(format!("array {i} of layer {}", layer.index())))?;
                    // SAFETY: the array holds `columns` elements before its
                    // terminator.
                    let data = unsafe { self.do_create(next, p, DimensionSize::new(extent.columns)) }
                        .map_err(|e| e.context(format!("array {i} of layer {}", layer.index())))?;
                    let cloned = VectorHeader::new(data.as_ptr(), extent.columns);
                    // SAFETY: `out` holds `count` headers.
                    unsafe { cloned.write_to(out.as_ptr().add(i * VECTOR_HEADER_SIZE)) };
                }
                Ok(out)
            }
        }
    }
}

fn next_of(layer: Layer<'_>) -> Result<Layer<'_>, LayoutError> {
    layer.next().ok_or_else(|| {
        LayoutError::internal_setup(format!(
            "layer {} ('{}') has no successor",
            layer.index(),
            layer.type_char()
        ))
    })
}
