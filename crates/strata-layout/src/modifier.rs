//! Modifier strings.
//!
//! A modifier string spells a shape outermost layer first, one letter per
//! layer with an optional decimal count, ending in `O` (implicit at the
//! end of the string):
//!
//! | code  | layer                                         |
//! |-------|-----------------------------------------------|
//! | `A n` | inline array of `n` elements                  |
//! | `F n` | pointer to an array of `n` (`f`: const)       |
//! | `V`   | vector header (`v`: const)                    |
//! | `M`   | matrix header (`m`: const)                    |
//! | `Z`   | zero-terminated array (`z`: const; `S n`/`s n` static variants) |
//! | `D`   | dynamic zero-terminated array (`d`: const)    |
//! | `P`   | raw pointer, terminal (`p`: const)            |
//! | `O`   | the leaf element                              |

use strata_core::{DimensionSize, LayoutError, TypeDescriptor};

use crate::header::{MATRIX_HEADER_SIZE, VECTOR_HEADER_SIZE};
use crate::raw::POINTER_SIZE;

/// Code that terminates every modifier string.
pub const END: char = 'O';

/// One layer code and its count (0 when absent).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerToken {
    /// Layer letter.
    pub code: char,
    /// Decimal count following the letter.
    pub size: u32,
}

/// Split the next token off the front of `modifiers`.
///
/// Returns `('O', 0)` once the string is exhausted. Fails with
/// [`LayoutError::Fatal`] if a count does not fit in `u32`.
pub fn next_layer(modifiers: &mut &str) -> Result<LayerToken, LayoutError> {
    let Some(code) = modifiers.chars().next() else {
        return Ok(LayerToken { code: END, size: 0 });
    };
    let rest = &modifiers[code.len_utf8()..];
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let mut size: u32 = 0;
    for d in rest[..digits].bytes() {
        size = size
            .checked_mul(10)
            .and_then(|s| s.checked_add(u32::from(d - b'0')))
            .ok_or_else(|| {
                LayoutError::fatal(format!("count after '{code}' does not fit in 32 bits"))
            })?;
    }
    *modifiers = &rest[digits..];
    Ok(LayerToken { code, size })
}

/// Bytes one element of a layer with this code occupies in its parent.
///
/// Inline codes (`A`, `O`, and anything unknown) occupy the leaf size.
pub fn code_size(code: char, td: &TypeDescriptor) -> u32 {
    let bytes = match code {
        'F' | 'f' | 'S' | 's' | 'D' | 'd' | 'Z' | 'z' | 'P' | 'p' => POINTER_SIZE,
        'M' | 'm' => MATRIX_HEADER_SIZE,
        'V' | 'v' => VECTOR_HEADER_SIZE,
        _ => return td.storage_size(),
    };
    bytes as u32
}

/// Bytes occupied by the outermost layer of `modifiers`: the product of
/// leading array counts times the size of the first non-array element.
pub fn layer_size(modifiers: &str, td: &TypeDescriptor) -> Result<DimensionSize, LayoutError> {
    let mut cursor = modifiers;
    let mut size = DimensionSize::ONE;
    loop {
        let token = next_layer(&mut cursor)?;
        if token.code != 'A' {
            return Ok(size * code_size(token.code, td));
        }
        size = size * token.size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strata_core::ErrorKind;

    #[test]
    fn tokenizes_codes_and_counts() {
        let mut m = "A12VF3";
        assert_eq!(next_layer(&mut m).unwrap(), LayerToken { code: 'A', size: 12 });
        assert_eq!(next_layer(&mut m).unwrap(), LayerToken { code: 'V', size: 0 });
        assert_eq!(next_layer(&mut m).unwrap(), LayerToken { code: 'F', size: 3 });
        assert_eq!(next_layer(&mut m).unwrap(), LayerToken { code: 'O', size: 0 });
        assert_eq!(next_layer(&mut m).unwrap(), LayerToken { code: 'O', size: 0 });
    }

    #[test]
    fn oversized_count_is_fatal() {
        let mut m = "A99999999999O";
        let err = next_layer(&mut m).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fatal);
    }

    #[test]
    fn layer_sizes() {
        let td = TypeDescriptor::int32();
        assert_eq!(layer_size("O", &td).unwrap(), DimensionSize::new(4));
        assert_eq!(layer_size("A2A3O", &td).unwrap(), DimensionSize::new(24));
        assert_eq!(
            layer_size("A2VO", &td).unwrap(),
            DimensionSize::new(2 * VECTOR_HEADER_SIZE as u32)
        );
        assert_eq!(
            layer_size("mO", &td).unwrap(),
            DimensionSize::new(MATRIX_HEADER_SIZE as u32)
        );
        assert!(layer_size("A65536A65536A2O", &td).unwrap().is_indefinite());
    }

    #[test]
    fn code_sizes() {
        let td = TypeDescriptor::float64();
        assert_eq!(code_size('O', &td), 8);
        assert_eq!(code_size('A', &td), 8);
        assert_eq!(code_size('d', &td), POINTER_SIZE as u32);
        assert_eq!(code_size('P', &td), POINTER_SIZE as u32);
    }

    proptest! {
        #[test]
        fn counts_parse_exactly(n in any::<u32>()) {
            let text = format!("F{n}O");
            let mut m = text.as_str();
            let token = next_layer(&mut m).unwrap();
            prop_assert_eq!(token, LayerToken { code: 'F', size: n });
            prop_assert_eq!(m, "O");
        }
    }
}
