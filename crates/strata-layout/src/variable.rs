//! Parsed variable shapes.

use std::ops::Index;

use smallvec::SmallVec;
use strata_arena::Heap;
use strata_core::{LayoutError, TypeDescriptor};

use crate::copy::{self, ConversionOp, ResizePolicy};
use crate::dimension::{Dimension, Layer};
use crate::footprint::{self, Footprint};
use crate::modifier::{self, END};
use crate::type_name;

/// Returned by indexing past the end of a chain.
static DUMMY_LEAF: Dimension = Dimension::data(TypeDescriptor::invalid());

/// A dimension chain parsed from a modifier string and a leaf type.
///
/// The chain always has at least one layer and always ends in a data
/// leaf. Modifier strings ending in a raw pointer (`P`/`p`) get a
/// synthesised pointer leaf in place of the declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    layers: SmallVec<[Dimension; 8]>,
    modifiers: String,
    declared: TypeDescriptor,
}

impl Variable {
    /// Parse `modifiers` over leaf type `td`.
    ///
    /// Fails with [`LayoutError::Fatal`] on an unknown code, a count that
    /// overflows, or any code after the terminal `O`/`P`/`p`.
    pub fn new(modifiers: &str, td: TypeDescriptor) -> Result<Self, LayoutError> {
        let layers = parse(modifiers, td).inspect_err(|e| {
            log::error!("[Variable::new] cannot parse {modifiers:?}: {e}");
        })?;
        log::debug!(
            "[Variable::new] {modifiers:?} over {td}: {} layers",
            layers.len()
        );
        Ok(Self {
            layers,
            modifiers: modifiers.to_owned(),
            declared: td,
        })
    }

    /// Number of layers, the leaf included.
    pub fn n_dimensions(&self) -> usize {
        self.layers.len()
    }

    /// All layers, outermost first.
    pub fn layers(&self) -> &[Dimension] {
        &self.layers
    }

    /// Cursor at layer `index`.
    pub fn layer(&self, index: usize) -> Option<Layer<'_>> {
        Layer::at(&self.layers, index)
    }

    /// Cursor at the outermost layer.
    pub fn root(&self) -> Layer<'_> {
        Layer::at(&self.layers, 0).unwrap_or_else(|| unreachable!("chain is never empty"))
    }

    /// The leaf type as stored, pointer synthesis applied.
    pub fn type_descriptor(&self) -> TypeDescriptor {
        self.layers
            .last()
            .and_then(Dimension::type_descriptor)
            .unwrap_or(self.declared)
    }

    /// The leaf type the variable was declared with.
    pub fn declared_type(&self) -> TypeDescriptor {
        self.declared
    }

    /// The modifier string this variable was parsed from.
    pub fn modifiers(&self) -> &str {
        &self.modifiers
    }

    /// Declarator-style name, e.g. `Vector<int32[3]>`.
    pub fn type_name(&self) -> Result<String, LayoutError> {
        type_name::render(&self.modifiers, &self.declared)
    }

    /// Bytes reachable from the instance at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must address a readable instance of this shape.
    pub unsafe fn footprint(&self, ptr: *const u8) -> Result<Footprint, LayoutError> {
        // SAFETY: forwarded caller contract.
        unsafe { footprint::measure(self.root(), ptr) }
    }

    /// Copy the instance at `src` into the instance of `dest` at `dst`.
    ///
    /// # Safety
    ///
    /// As for [`copy::copy_to`].
    pub unsafe fn copy_to(
        &self,
        src: *const u8,
        dest: &Variable,
        dst: *mut u8,
        op: &dyn ConversionOp,
        policy: ResizePolicy,
        heap: &dyn Heap,
    ) -> Result<(), LayoutError> {
        // SAFETY: forwarded caller contract.
        unsafe { copy::copy_to(self.root(), src, dest.root(), dst, op, policy, heap) }
    }
}

impl Index<usize> for Variable {
    type Output = Dimension;

    /// Out-of-range indices yield an invalid-typed leaf rather than
    /// panicking.
    fn index(&self, index: usize) -> &Dimension {
        self.layers.get(index).unwrap_or(&DUMMY_LEAF)
    }
}

fn parse(modifiers: &str, td: TypeDescriptor) -> Result<SmallVec<[Dimension; 8]>, LayoutError> {
    let mut cursor = modifiers;
    let mut layers = SmallVec::new();
    loop {
        let token = modifier::next_layer(&mut cursor)?;
        let layer = match token.code {
            END => Dimension::data(td),
            'P' | 'p' => Dimension::data(TypeDescriptor::pointer(token.code == 'p')),
            'A' => Dimension::array(token.size),
            'F' | 'f' => Dimension::pointer_to_array(token.size, token.code == 'f'),
            'V' | 'v' => Dimension::vector(token.code == 'v'),
            'M' | 'm' => Dimension::matrix(token.code == 'm'),
            'Z' | 'S' => Dimension::zero_terminated(false, false),
            'z' | 's' => Dimension::zero_terminated(false, true),
            'D' => Dimension::zero_terminated(true, false),
            'd' => Dimension::zero_terminated(true, true),
            other => {
                return Err(LayoutError::fatal(format!(
                    "unmapped layer code '{other}'"
                )))
            }
        };
        let terminal = layer.is_final();
        layers.push(layer);
        if terminal {
            break;
        }
    }
    if !cursor.is_empty() {
        return Err(LayoutError::fatal(format!(
            "codes after the leaf: {cursor:?}"
        )));
    }
    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::DimensionKind;
    use strata_core::{ErrorKind, TypeKind};

    #[test]
    fn implicit_terminal() {
        let v = Variable::new("A3", TypeDescriptor::int32()).unwrap();
        assert_eq!(v.n_dimensions(), 2);
        assert_eq!(v[0].kind(), DimensionKind::Array { count: 3 });
        assert_eq!(v[1].kind(), DimensionKind::Data(TypeDescriptor::int32()));
        let empty = Variable::new("", TypeDescriptor::int8()).unwrap();
        assert_eq!(empty.n_dimensions(), 1);
    }

    #[test]
    fn pointer_terminal_synthesises_leaf() {
        let v = Variable::new("Vp", TypeDescriptor::float64()).unwrap();
        assert_eq!(v.n_dimensions(), 2);
        let td = v.type_descriptor();
        assert_eq!(td.kind(), TypeKind::Pointer);
        assert!(td.is_constant());
        assert_eq!(v.declared_type(), TypeDescriptor::float64());
    }

    #[test]
    fn codes_after_terminal_are_fatal() {
        for m in ["PA3", "OV", "pO"] {
            let err = Variable::new(m, TypeDescriptor::int32()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Fatal, "{m}");
        }
    }

    #[test]
    fn unknown_code_is_fatal() {
        let err = Variable::new("AQ", TypeDescriptor::int32()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fatal);
    }

    #[test]
    fn static_zero_terminated_aliases() {
        let v = Variable::new("S4s2O", TypeDescriptor::int8()).unwrap();
        assert_eq!(v[0].type_char(), 'Z');
        assert_eq!(v[1].type_char(), 'z');
        assert_eq!(v.modifiers(), "S4s2O");
    }

    #[test]
    fn index_past_end_yields_dummy() {
        let v = Variable::new("O", TypeDescriptor::int32()).unwrap();
        let dummy = &v[7];
        assert!(dummy.is_final());
        assert_eq!(dummy.type_descriptor(), Some(TypeDescriptor::invalid()));
        assert!(v.layer(7).is_none());
    }

    #[test]
    fn root_is_outermost() {
        let v = Variable::new("MA2O", TypeDescriptor::uint16()).unwrap();
        assert_eq!(v.root().type_char(), 'M');
        assert_eq!(v.root().end_stack().index(), 2);
    }
}
