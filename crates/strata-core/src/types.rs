//! Leaf type descriptors.
//!
//! A [`TypeDescriptor`] describes the terminal element of a nested shape:
//! what kind of value it is, how many bytes one element occupies, and
//! whether it is read-only. Layers above the leaf never look inside it
//! beyond these three facts.

use std::fmt;

const POINTER_SIZE: u32 = std::mem::size_of::<usize>() as u32;

/// Classification of a leaf element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Two's-complement signed integer.
    Signed,
    /// Unsigned integer.
    Unsigned,
    /// IEEE-754 floating point.
    Float,
    /// Single-byte character.
    Char,
    /// Pointer to a NUL-terminated, separately allocated character string.
    CString,
    /// Untyped pointer, synthesised when a shape ends in a raw pointer.
    Pointer,
    /// A record type with members, identified by name.
    Structured {
        /// Registered name of the record.
        name: &'static str,
    },
    /// A foreign type the engine may size but not construct.
    Opaque {
        /// Name used in diagnostics and rendered type names.
        name: &'static str,
    },
    /// Placeholder for "no type".
    Invalid,
}

/// Leaf type of a nested shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    kind: TypeKind,
    storage_size: u32,
    constant: bool,
}

impl TypeDescriptor {
    /// A descriptor from its parts.
    pub const fn new(kind: TypeKind, storage_size: u32, constant: bool) -> Self {
        Self {
            kind,
            storage_size,
            constant,
        }
    }

    /// Signed integer of `bytes` width.
    pub const fn signed(bytes: u32) -> Self {
        Self::new(TypeKind::Signed, bytes, false)
    }

    /// Unsigned integer of `bytes` width.
    pub const fn unsigned(bytes: u32) -> Self {
        Self::new(TypeKind::Unsigned, bytes, false)
    }

    /// Floating point of `bytes` width.
    pub const fn float(bytes: u32) -> Self {
        Self::new(TypeKind::Float, bytes, false)
    }

    /// `int8`.
    pub const fn int8() -> Self {
        Self::signed(1)
    }

    /// `int16`.
    pub const fn int16() -> Self {
        Self::signed(2)
    }

    /// `int32`.
    pub const fn int32() -> Self {
        Self::signed(4)
    }

    /// `int64`.
    pub const fn int64() -> Self {
        Self::signed(8)
    }

    /// `uint8`.
    pub const fn uint8() -> Self {
        Self::unsigned(1)
    }

    /// `uint16`.
    pub const fn uint16() -> Self {
        Self::unsigned(2)
    }

    /// `uint32`.
    pub const fn uint32() -> Self {
        Self::unsigned(4)
    }

    /// `uint64`.
    pub const fn uint64() -> Self {
        Self::unsigned(8)
    }

    /// `float32`.
    pub const fn float32() -> Self {
        Self::float(4)
    }

    /// `float64`.
    pub const fn float64() -> Self {
        Self::float(8)
    }

    /// `char8`.
    pub const fn char8() -> Self {
        Self::new(TypeKind::Char, 1, false)
    }

    /// A pointer to a NUL-terminated string; stored as one pointer.
    pub const fn c_string() -> Self {
        Self::new(TypeKind::CString, POINTER_SIZE, false)
    }

    /// An untyped pointer.
    pub const fn pointer(constant: bool) -> Self {
        Self::new(TypeKind::Pointer, POINTER_SIZE, constant)
    }

    /// A named record of `storage_size` bytes.
    pub const fn structured(name: &'static str, storage_size: u32) -> Self {
        Self::new(TypeKind::Structured { name }, storage_size, false)
    }

    /// A named foreign type of `storage_size` bytes.
    pub const fn opaque(name: &'static str, storage_size: u32) -> Self {
        Self::new(TypeKind::Opaque { name }, storage_size, false)
    }

    /// The "no type" placeholder, zero-sized.
    pub const fn invalid() -> Self {
        Self::new(TypeKind::Invalid, 0, false)
    }

    /// The same type with its constant flag replaced.
    pub const fn with_constant(self, constant: bool) -> Self {
        Self { constant, ..self }
    }

    /// Leaf classification.
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Bytes occupied by one element.
    pub const fn storage_size(&self) -> u32 {
        self.storage_size
    }

    /// Whether the data is read-only.
    pub const fn is_constant(&self) -> bool {
        self.constant
    }

    /// Integers, floats, characters, and raw pointers.
    pub fn is_basic(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Signed
                | TypeKind::Unsigned
                | TypeKind::Float
                | TypeKind::Char
                | TypeKind::Pointer
        )
    }

    /// Record types.
    pub fn is_structured(&self) -> bool {
        matches!(self.kind, TypeKind::Structured { .. })
    }

    /// Pointer-to-string leaves whose payload lives outside the element.
    pub fn is_char_string(&self) -> bool {
        self.kind == TypeKind::CString
    }

    /// Same kind and size, ignoring the constant flag.
    pub fn same_as(&self, other: &TypeDescriptor) -> bool {
        self.kind == other.kind && self.storage_size == other.storage_size
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constant {
            f.write_str("const ")?;
        }
        let bits = self.storage_size * 8;
        match self.kind {
            TypeKind::Signed => write!(f, "int{bits}"),
            TypeKind::Unsigned => write!(f, "uint{bits}"),
            TypeKind::Float => write!(f, "float{bits}"),
            TypeKind::Char => write!(f, "char{bits}"),
            TypeKind::CString => f.write_str("CString"),
            TypeKind::Pointer => f.write_str("void *"),
            TypeKind::Structured { name } | TypeKind::Opaque { name } => f.write_str(name),
            TypeKind::Invalid => f.write_str("invalid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_sizes() {
        assert_eq!(TypeDescriptor::int32().storage_size(), 4);
        assert_eq!(TypeDescriptor::float64().storage_size(), 8);
        assert_eq!(TypeDescriptor::char8().storage_size(), 1);
        assert_eq!(TypeDescriptor::c_string().storage_size(), POINTER_SIZE);
    }

    #[test]
    fn predicates() {
        assert!(TypeDescriptor::uint16().is_basic());
        assert!(TypeDescriptor::pointer(true).is_basic());
        assert!(!TypeDescriptor::c_string().is_basic());
        assert!(TypeDescriptor::c_string().is_char_string());
        let rec = TypeDescriptor::structured("Pid", 24);
        assert!(rec.is_structured());
        assert!(!rec.is_basic());
        let foreign = TypeDescriptor::opaque("Handle", 16);
        assert!(!foreign.is_basic() && !foreign.is_structured());
    }

    #[test]
    fn same_as_ignores_constness() {
        let a = TypeDescriptor::int32();
        let b = TypeDescriptor::int32().with_constant(true);
        assert!(a.same_as(&b));
        assert_ne!(a, b);
        assert!(!a.same_as(&TypeDescriptor::uint32()));
    }

    #[test]
    fn display_names() {
        assert_eq!(TypeDescriptor::int32().to_string(), "int32");
        assert_eq!(TypeDescriptor::uint8().to_string(), "uint8");
        assert_eq!(TypeDescriptor::float32().to_string(), "float32");
        assert_eq!(TypeDescriptor::char8().to_string(), "char8");
        assert_eq!(TypeDescriptor::pointer(true).to_string(), "const void *");
        assert_eq!(TypeDescriptor::structured("Pid", 24).to_string(), "Pid");
    }
}
