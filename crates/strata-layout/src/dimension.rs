//! Dimension layers and the cursor that walks a chain of them.
//!
//! A shape is a chain of [`Dimension`]s, outermost first, always ending in
//! a [`DimensionKind::Data`] leaf. Layers come in two flavours:
//!
//! - **inline** layers ([`DimensionKind::Array`]) multiply the element
//!   count of the layer below without adding indirection;
//! - **break** layers (pointer-to-array, vector, matrix, zero-terminated
//!   array, and the leaf) start a new run of memory.
//!
//! The run of layers from one break layer to the next forms a *stack*:
//! one contiguous block whose size is the product of the inline counts
//! times the element size of the next break. [`Layer::end_stack`] finds
//! that next break.
//!
//! A [`Layer`] is a borrowed cursor into the chain. Every operation that
//! needs the layer below reaches it through the cursor, so there are no
//! owning or back pointers between layers.

use std::fmt;
use std::ops::BitOr;

use strata_arena::Heap;
use strata_core::{DimensionSize, LayoutError, TypeDescriptor};

use crate::header::{MatrixHeader, VectorHeader, MATRIX_HEADER_SIZE, VECTOR_HEADER_SIZE};
use crate::raw::{self, POINTER_SIZE};
use crate::redirect::redirect_p;

/// Behaviour flags of a layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerFlags(u8);

impl LayerFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// The layer's memory is read-only.
    pub const CONSTANT: Self = Self(1 << 0);
    /// The layer can be resized.
    pub const DYNAMIC: Self = Self(1 << 1);
    /// The layer has rows and columns.
    pub const TWO_D: Self = Self(1 << 2);
    /// The layer starts a new run of memory.
    pub const BREAK: Self = Self(1 << 3);
    /// The layer is the leaf.
    pub const FINAL: Self = Self(1 << 4);

    /// Both sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    const fn when(self, on: bool) -> Self {
        if on {
            self
        } else {
            Self::NONE
        }
    }
}

impl BitOr for LayerFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// What a layer is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DimensionKind {
    /// The leaf element.
    Data(TypeDescriptor),
    /// `count` inline elements of the layer below.
    Array {
        /// Elements per array.
        count: u32,
    },
    /// A pointer to `count` elements of the layer below; may be NULL.
    PointerToArray {
        /// Elements behind the pointer.
        count: u32,
    },
    /// A [`VectorHeader`].
    Vector,
    /// A [`MatrixHeader`].
    Matrix,
    /// A pointer to elements of the layer below, terminated by an
    /// all-zero element. Never NULL.
    ZeroTerminated,
}

/// One layer of a shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimension {
    kind: DimensionKind,
    flags: LayerFlags,
}

impl Dimension {
    /// Leaf layer holding elements of `td`.
    pub const fn data(td: TypeDescriptor) -> Self {
        Self {
            kind: DimensionKind::Data(td),
            flags: LayerFlags::BREAK
                .union(LayerFlags::FINAL)
                .union(LayerFlags::CONSTANT.when(td.is_constant())),
        }
    }

    /// Inline array of `count` elements.
    pub const fn array(count: u32) -> Self {
        Self {
            kind: DimensionKind::Array { count },
            flags: LayerFlags::NONE,
        }
    }

    /// Pointer to an array of `count` elements.
    pub const fn pointer_to_array(count: u32, constant: bool) -> Self {
        Self {
            kind: DimensionKind::PointerToArray { count },
            flags: LayerFlags::BREAK.union(LayerFlags::CONSTANT.when(constant)),
        }
    }

    /// Vector; resizable unless constant.
    pub const fn vector(constant: bool) -> Self {
        Self {
            kind: DimensionKind::Vector,
            flags: LayerFlags::BREAK
                .union(LayerFlags::CONSTANT.when(constant))
                .union(LayerFlags::DYNAMIC.when(!constant)),
        }
    }

    /// Matrix; resizable unless constant.
    pub const fn matrix(constant: bool) -> Self {
        Self {
            kind: DimensionKind::Matrix,
            flags: LayerFlags::BREAK
                .union(LayerFlags::TWO_D)
                .union(LayerFlags::CONSTANT.when(constant))
                .union(LayerFlags::DYNAMIC.when(!constant)),
        }
    }

    /// Zero-terminated array. The two flags are independent.
    pub const fn zero_terminated(dynamic: bool, constant: bool) -> Self {
        Self {
            kind: DimensionKind::ZeroTerminated,
            flags: LayerFlags::BREAK
                .union(LayerFlags::CONSTANT.when(constant))
                .union(LayerFlags::DYNAMIC.when(dynamic)),
        }
    }

    /// What this layer is.
    pub fn kind(&self) -> DimensionKind {
        self.kind
    }

    /// All flags.
    pub fn flags(&self) -> LayerFlags {
        self.flags
    }

    /// Whether the layer starts a new run of memory.
    pub fn is_break(&self) -> bool {
        self.flags.contains(LayerFlags::BREAK)
    }

    /// Whether the layer is the leaf.
    pub fn is_final(&self) -> bool {
        self.flags.contains(LayerFlags::FINAL)
    }

    /// Whether the layer is read-only.
    pub fn is_constant(&self) -> bool {
        self.flags.contains(LayerFlags::CONSTANT)
    }

    /// Whether the layer can be resized.
    pub fn is_dynamic(&self) -> bool {
        self.flags.contains(LayerFlags::DYNAMIC)
    }

    /// Whether the layer has rows and columns.
    pub fn is_2d(&self) -> bool {
        self.flags.contains(LayerFlags::TWO_D)
    }

    /// The leaf type, for data layers.
    pub fn type_descriptor(&self) -> Option<TypeDescriptor> {
        match self.kind {
            DimensionKind::Data(td) => Some(td),
            _ => None,
        }
    }

    /// Layer code letter.
    pub fn type_char(&self) -> char {
        let constant = self.is_constant();
        match self.kind {
            DimensionKind::Data(_) => 'O',
            DimensionKind::Array { .. } => 'A',
            DimensionKind::PointerToArray { .. } => pick(constant, 'f', 'F'),
            DimensionKind::Vector => pick(constant, 'v', 'V'),
            DimensionKind::Matrix => pick(constant, 'm', 'M'),
            DimensionKind::ZeroTerminated => match (constant, self.is_dynamic()) {
                (true, true) => 'd',
                (true, false) => 'z',
                (false, true) => 'D',
                (false, false) => 'Z',
            },
        }
    }

    /// Bytes one element of this layer occupies in the enclosing memory.
    /// Zero for inline arrays, which occupy nothing themselves.
    pub fn type_size(&self) -> u32 {
        let bytes = match self.kind {
            DimensionKind::Data(td) => return td.storage_size(),
            DimensionKind::Array { .. } => return 0,
            DimensionKind::PointerToArray { .. } | DimensionKind::ZeroTerminated => POINTER_SIZE,
            DimensionKind::Vector => VECTOR_HEADER_SIZE,
            DimensionKind::Matrix => MATRIX_HEADER_SIZE,
        };
        bytes as u32
    }

    /// 2 for matrices, 1 otherwise.
    pub fn n_of_dimensions(&self) -> u32 {
        if self.is_2d() {
            2
        } else {
            1
        }
    }

    /// Static element count of an inline or pointed-to array.
    pub fn number_of_elements(&self) -> Result<u32, LayoutError> {
        match self.kind {
            DimensionKind::Array { count } | DimensionKind::PointerToArray { count } => Ok(count),
            _ => Err(LayoutError::unsupported(format!(
                "layer '{}' has no static element count",
                self.type_char()
            ))),
        }
    }
}

fn pick(constant: bool, on: char, off: char) -> char {
    if constant {
        on
    } else {
        off
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DimensionKind::Data(td) => write!(f, "O({td})"),
            DimensionKind::Array { count } | DimensionKind::PointerToArray { count } => {
                write!(f, "{}{count}", self.type_char())
            }
            _ => write!(f, "{}", self.type_char()),
        }
    }
}

/// Columns and rows of one layer instance, as found at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    /// Number of columns (elements for 1-D layers).
    pub columns: u32,
    /// Number of rows; 1 for 1-D layers.
    pub rows: u32,
}

impl Extent {
    /// A 1-D extent.
    pub const fn flat(columns: u32) -> Self {
        Self { columns, rows: 1 }
    }

    /// `columns * rows`, saturating.
    pub fn elements(&self) -> DimensionSize {
        DimensionSize::new(self.columns) * self.rows
    }
}

/// A cursor at one layer of a dimension chain.
#[derive(Clone, Copy)]
pub struct Layer<'a> {
    chain: &'a [Dimension],
    index: usize,
}

impl<'a> Layer<'a> {
    /// Cursor at `index`, or `None` past the end.
    pub fn at(chain: &'a [Dimension], index: usize) -> Option<Self> {
        (index < chain.len()).then_some(Self { chain, index })
    }

    /// The layer under the cursor.
    pub fn dimension(&self) -> &'a Dimension {
        &self.chain[self.index]
    }

    /// Position in the chain, 0 being outermost.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The layer below, if any.
    pub fn next(&self) -> Option<Layer<'a>> {
        Self::at(self.chain, self.index + 1)
    }

    fn require_next(&self) -> Result<Layer<'a>, LayoutError> {
        self.next().ok_or_else(|| {
            log::error!(
                "[Layer::require_next] layer {} ('{}') has no successor",
                self.index,
                self.type_char()
            );
            LayoutError::fatal(format!(
                "layer {} ('{}') has no successor",
                self.index,
                self.type_char()
            ))
        })
    }

    /// The first break layer strictly below this one; the leaf is its
    /// own end.
    pub fn end_stack(&self) -> Layer<'a> {
        if self.is_final() {
            return *self;
        }
        let end = self.chain[self.index + 1..]
            .iter()
            .position(Dimension::is_break)
            .map_or(self.chain.len() - 1, |p| self.index + 1 + p);
        Self {
            chain: self.chain,
            index: end,
        }
    }

    /// See [`Dimension::kind`].
    pub fn kind(&self) -> DimensionKind {
        self.dimension().kind()
    }

    /// See [`Dimension::type_char`].
    pub fn type_char(&self) -> char {
        self.dimension().type_char()
    }

    /// See [`Dimension::type_size`].
    pub fn type_size(&self) -> u32 {
        self.dimension().type_size()
    }

    /// See [`Dimension::is_break`].
    pub fn is_break(&self) -> bool {
        self.dimension().is_break()
    }

    /// See [`Dimension::is_final`].
    pub fn is_final(&self) -> bool {
        self.dimension().is_final()
    }

    /// See [`Dimension::is_constant`].
    pub fn is_constant(&self) -> bool {
        self.dimension().is_constant()
    }

    /// See [`Dimension::is_dynamic`].
    pub fn is_dynamic(&self) -> bool {
        self.dimension().is_dynamic()
    }

    /// See [`Dimension::n_of_dimensions`].
    pub fn n_of_dimensions(&self) -> u32 {
        self.dimension().n_of_dimensions()
    }

    /// See [`Dimension::number_of_elements`].
    pub fn number_of_elements(&self) -> Result<u32, LayoutError> {
        self.dimension().number_of_elements()
    }

    /// Whether the layer below is the leaf, i.e. this layer's elements
    /// are stored directly.
    pub fn is_final_layer(&self) -> bool {
        match self.next() {
            Some(next) => next.is_final(),
            None => true,
        }
    }

    /// Bookkeeping bytes an instance of this layer adds beyond its
    /// payload: headers, pointers, and zero terminators.
    ///
    /// Fails if a zero terminator's size does not fit a `u32`.
    pub fn overhead(&self) -> Result<u32, LayoutError> {
        match self.kind() {
            DimensionKind::Data(_) | DimensionKind::Array { .. } => Ok(0),
            DimensionKind::ZeroTerminated => {
                let terminator = self.next_layer_element_size()?;
                self.type_size()
                    .checked_add(terminator)
                    .ok_or(LayoutError::Overflow { what: "zero terminated overhead" })
            }
            _ => Ok(self.type_size()),
        }
    }

    /// Bytes one element of this layer occupies in the enclosing memory,
    /// with inline arrays expanded.
    pub fn combined_element_size(&self) -> Result<DimensionSize, LayoutError> {
        match self.kind() {
            DimensionKind::Array { count } => {
                Ok(self.require_next()?.combined_element_size()? * count)
            }
            _ => Ok(DimensionSize::new(self.type_size())),
        }
    }

    /// Combined element size of the layer below.
    pub fn next_layer_element_size(&self) -> Result<u32, LayoutError> {
        let next = self.require_next()?;
        next.combined_element_size()?
            .to_u32("next layer element size")
    }

    /// Locate the payload of the layer instance at `*ptr` and report its
    /// extent.
    ///
    /// Inline layers leave `*ptr` alone. Indirect layers replace it with
    /// the payload address; a NULL payload is accepted where the layer
    /// permits one and reported as an empty extent.
    ///
    /// # Safety
    ///
    /// `*ptr` must address a readable instance of this layer.
    pub unsafe fn update_pointer_and_size(&self, ptr: &mut *const u8) -> Result<Extent, LayoutError> {
        match self.kind() {
            DimensionKind::Data(_) => Ok(Extent::flat(1)),
            DimensionKind::Array { count } => Ok(Extent::flat(count)),
            DimensionKind::PointerToArray { count } => {
                // SAFETY: *ptr addresses a pointer per the caller contract.
                unsafe { redirect_p(ptr, true)? };
                Ok(Extent::flat(if ptr.is_null() { 0 } else { count }))
            }
            DimensionKind::Vector => {
                // SAFETY: *ptr addresses a vector header.
                let header = unsafe { VectorHeader::read_from(*ptr) };
                // SAFETY: the data pointer is the header's first field.
                unsafe { redirect_p(ptr, header.count == 0)? };
                Ok(Extent::flat(if ptr.is_null() { 0 } else { header.count }))
            }
            DimensionKind::Matrix => {
                // SAFETY: *ptr addresses a matrix header.
                let header = unsafe { MatrixHeader::read_from(*ptr) };
                let empty = header.element_count() == DimensionSize::ZERO;
                // SAFETY: the data pointer is the header's first field.
                unsafe { redirect_p(ptr, empty)? };
                if ptr.is_null() {
                    return Ok(Extent { columns: 0, rows: 0 });
                }
                Ok(Extent {
                    columns: header.cols,
                    rows: header.rows,
                })
            }
            DimensionKind::ZeroTerminated => {
                let element = self.next_layer_element_size()?;
                // SAFETY: *ptr addresses a pointer.
                unsafe { redirect_p(ptr, false)? };
                // SAFETY: a non-NULL zero-terminated array is readable up
                // to and including its terminator.
                let columns = unsafe { raw::zero_terminated_len(*ptr, element as usize) };
                Ok(Extent::flat(columns))
            }
        }
    }

    /// Put `count` fresh elements of this layer at `ptr` into their empty
    /// state.
    ///
    /// Basic leaves are zeroed and string leaves get NULL pointers.
    /// Indirect layers get NULL pointers or empty headers. Structured,
    /// opaque, and invalid leaves cannot be initialised.
    ///
    /// # Safety
    ///
    /// `ptr` must be writable for `count` elements of this layer.
    pub unsafe fn init_stack(&self, ptr: *mut u8, count: DimensionSize) -> Result<(), LayoutError> {
        match self.kind() {
            DimensionKind::Data(td) => {
                if !(td.is_basic() || td.is_char_string()) {
                    return Err(LayoutError::unsupported(format!(
                        "cannot initialise elements of type {td}"
                    )));
                }
                let bytes = (count * td.storage_size()).to_usize("leaf storage")?;
                // SAFETY: ptr is writable for `count` leaves.
                unsafe { raw::set_bytes(ptr, 0, bytes) }
            }
            DimensionKind::Array { count: per } => {
                // SAFETY: `count` arrays are `count * per` elements below.
                unsafe { self.require_next()?.init_stack(ptr, count * per) }
            }
            DimensionKind::PointerToArray { .. } | DimensionKind::ZeroTerminated => {
                let bytes = (count * POINTER_SIZE as u32).to_usize("pointer storage")?;
                // SAFETY: ptr is writable for `count` pointers.
                unsafe { raw::set_bytes(ptr, 0, bytes) }
            }
            DimensionKind::Vector => {
                let n = count.to_usize("vector count")?;
                for i in 0..n {
                    // SAFETY: header `i` lies within the writable range.
                    unsafe { VectorHeader::EMPTY.write_to(ptr.add(i * VECTOR_HEADER_SIZE)) };
                }
                Ok(())
            }
            DimensionKind::Matrix => {
                let n = count.to_usize("matrix count")?;
                for i in 0..n {
                    // SAFETY: header `i` lies within the writable range.
                    unsafe { MatrixHeader::EMPTY.write_to(ptr.add(i * MATRIX_HEADER_SIZE)) };
                }
                Ok(())
            }
        }
    }

    /// Replace the payload of the vector or matrix header at `*ptr` with
    /// a fresh heap block of `columns * rows` initialised elements.
    ///
    /// The previous payload is freed if the header owns it. On success
    /// `*ptr` points at the new payload (NULL for an empty resize); on
    /// failure the header is unchanged.
    ///
    /// # Safety
    ///
    /// `*ptr` must address a writable header of this layer whose owned
    /// payload, if any, came from `heap`.
    pub unsafe fn resize(
        &self,
        ptr: &mut *mut u8,
        columns: u32,
        rows: u32,
        heap: &dyn Heap,
    ) -> Result<(), LayoutError> {
        let two_d = match self.kind() {
            DimensionKind::Vector => false,
            DimensionKind::Matrix => true,
            _ => {
                return Err(LayoutError::unsupported(format!(
                    "layer '{}' cannot be resized",
                    self.type_char()
                )))
            }
        };
        let next = self.require_next()?;
        let elements = Extent { columns, rows }.elements();
        let element_size = self.next_layer_element_size()?;
        let bytes = (elements * element_size).to_usize("resize allocation")?;
        let count = elements.to_u32("resize element count")?;
        let header_at = *ptr;

        // SAFETY: header_at addresses a header of this layer.
        let (old_data, old_owned) = unsafe {
            if two_d {
                let h = MatrixHeader::read_from(header_at);
                (h.data, h.owned)
            } else {
                let h = VectorHeader::read_from(header_at);
                (h.data, h.owned)
            }
        };

        let data = if count == 0 {
            std::ptr::null_mut()
        } else {
            let block = heap
                .malloc(bytes)
                .ok_or(LayoutError::OutOfMemory { requested: bytes })?;
            // SAFETY: block holds `count` elements of the layer below.
            if let Err(e) = unsafe { next.init_stack(block.as_ptr(), elements) } {
                // SAFETY: block came from heap and was never published.
                unsafe { heap.free(block) };
                return Err(e);
            }
            block.as_ptr()
        };

        if old_owned {
            if let Some(old) = std::ptr::NonNull::new(old_data) {
                // SAFETY: the header owned this block and no longer will.
                unsafe { heap.free(old) };
            }
        }

        let owned = !data.is_null();
        // SAFETY: header_at is writable per the caller contract.
        unsafe {
            if two_d {
                let (rows, cols) = if owned { (rows, columns) } else { (0, 0) };
                MatrixHeader {
                    data,
                    rows,
                    cols,
                    owned,
                }
                .write_to(header_at);
            } else {
                VectorHeader { data, count, owned }.write_to(header_at);
            }
        }
        log::debug!(
            "[Layer::resize] layer {} ('{}') now {columns}x{rows} ({bytes} bytes)",
            self.index,
            self.type_char()
        );
        *ptr = data;
        Ok(())
    }
}

impl fmt::Debug for Layer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("index", &self.index)
            .field("dimension", self.dimension())
            .finish()
    }
}
