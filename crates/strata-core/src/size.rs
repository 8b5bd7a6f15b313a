//! Saturating element counts and byte sizes.
//!
//! Layer sizes are products of many per-layer counts. [`DimensionSize`]
//! clamps to an indefinite state on overflow instead of wrapping, and
//! stays there: every later multiply or add of an indefinite value is
//! indefinite too. Conversion back to a concrete integer is the only
//! place the overflow surfaces, as [`LayoutError::Overflow`].

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul};

use crate::error::LayoutError;

/// A `u32` count that saturates to "indefinite" on overflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DimensionSize(Option<u32>);

impl DimensionSize {
    /// The saturated state.
    pub const INDEFINITE: Self = Self(None);

    /// Zero elements.
    pub const ZERO: Self = Self(Some(0));

    /// One element.
    pub const ONE: Self = Self(Some(1));

    /// A definite size.
    pub const fn new(value: u32) -> Self {
        Self(Some(value))
    }

    /// Whether an earlier operation overflowed.
    pub fn is_indefinite(&self) -> bool {
        self.0.is_none()
    }

    /// The raw value, or `u32::MAX` when indefinite.
    ///
    /// Only for places that have already proven the value definite, e.g.
    /// loop bounds after a successful byte-size conversion.
    pub fn get(&self) -> u32 {
        self.0.unwrap_or(u32::MAX)
    }

    /// Convert to a concrete integer type.
    ///
    /// Fails with [`LayoutError::Overflow`] if the value is indefinite or
    /// does not fit in `T`.
    pub fn to_number<T: TryFrom<u32>>(&self, what: &'static str) -> Result<T, LayoutError> {
        let value = self.0.ok_or(LayoutError::Overflow { what })?;
        T::try_from(value).map_err(|_| LayoutError::Overflow { what })
    }

    /// Convert to `u32`.
    pub fn to_u32(&self, what: &'static str) -> Result<u32, LayoutError> {
        self.to_number(what)
    }

    /// Convert to `usize`.
    pub fn to_usize(&self, what: &'static str) -> Result<usize, LayoutError> {
        self.to_number(what)
    }
}

impl Default for DimensionSize {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<u32> for DimensionSize {
    fn from(v: u32) -> Self {
        Self::new(v)
    }
}

impl From<usize> for DimensionSize {
    fn from(v: usize) -> Self {
        Self(u32::try_from(v).ok())
    }
}

impl Mul for DimensionSize {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        match (self.0, rhs.0) {
            (Some(a), Some(b)) => Self(a.checked_mul(b)),
            _ => Self::INDEFINITE,
        }
    }
}

impl Mul<u32> for DimensionSize {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        self * Self::new(rhs)
    }
}

impl Add for DimensionSize {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        match (self.0, rhs.0) {
            (Some(a), Some(b)) => Self(a.checked_add(b)),
            _ => Self::INDEFINITE,
        }
    }
}

impl Add<u32> for DimensionSize {
    type Output = Self;

    fn add(self, rhs: u32) -> Self {
        self + Self::new(rhs)
    }
}

/// Indefinite sorts above every definite value and equal to itself.
impl PartialOrd for DimensionSize {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DimensionSize {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.cmp(&b),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
        }
    }
}

impl fmt::Display for DimensionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("indefinite"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn small_products_are_exact() {
        let size = DimensionSize::new(3) * 4u32;
        assert_eq!(size, DimensionSize::new(12));
        assert_eq!(size.to_u32("test").unwrap(), 12);
    }

    #[test]
    fn overflow_saturates() {
        let size = DimensionSize::new(0x1_0000) * DimensionSize::new(0x1_0000);
        assert!(size.is_indefinite());
        assert_eq!(size.get(), u32::MAX);
        let err = size.to_u32("product").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
    }

    #[test]
    fn add_overflow_saturates() {
        let size = DimensionSize::new(u32::MAX) + 1u32;
        assert!(size.is_indefinite());
    }

    #[test]
    fn indefinite_is_sticky() {
        let size = DimensionSize::INDEFINITE * 0u32;
        assert!(size.is_indefinite());
        let size = DimensionSize::INDEFINITE + DimensionSize::ZERO;
        assert!(size.is_indefinite());
    }

    #[test]
    fn narrowing_conversion_fails_out_of_range() {
        let size = DimensionSize::new(300);
        let err = size.to_number::<u8>("byte").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert_eq!(size.to_number::<u16>("short").unwrap(), 300);
    }

    #[test]
    fn usize_above_u32_is_indefinite() {
        #[cfg(target_pointer_width = "64")]
        assert!(DimensionSize::from(usize::MAX).is_indefinite());
        assert_eq!(DimensionSize::from(7usize), DimensionSize::new(7));
    }

    #[test]
    fn indefinite_orders_last() {
        assert!(DimensionSize::INDEFINITE > DimensionSize::new(u32::MAX));
        assert!(DimensionSize::new(1) < DimensionSize::new(2));
        assert_eq!(DimensionSize::INDEFINITE.to_string(), "indefinite");
    }

    proptest! {
        #[test]
        fn mul_never_wraps(a in any::<u32>(), b in any::<u32>()) {
            let product = DimensionSize::new(a) * DimensionSize::new(b);
            match a.checked_mul(b) {
                Some(exact) => prop_assert_eq!(product.to_u32("p").unwrap(), exact),
                None => {
                    prop_assert!(product.is_indefinite());
                    prop_assert_eq!(product.to_u32("p").unwrap_err().kind(), ErrorKind::Overflow);
                }
            }
        }

        #[test]
        fn add_never_wraps(a in any::<u32>(), b in any::<u32>()) {
            let sum = DimensionSize::new(a) + DimensionSize::new(b);
            prop_assert_eq!(sum.is_indefinite(), a.checked_add(b).is_none());
        }

        #[test]
        fn saturation_is_absorbing(a in any::<u32>()) {
            let s = DimensionSize::INDEFINITE;
            prop_assert!((s * a).is_indefinite());
            prop_assert!((s + a).is_indefinite());
        }
    }
}
