//! Human-readable type names for modifier strings.
//!
//! Arrays and pointers render in declarator style (`int32( *)[3]`),
//! headers as templates (`Vector<int32>`).

use strata_core::{LayoutError, TypeDescriptor};

use crate::modifier::{next_layer, LayerToken};

/// Render `modifiers` over leaf type `td`.
pub fn render(modifiers: &str, td: &TypeDescriptor) -> Result<String, LayoutError> {
    let mut out = String::new();
    render_layer(modifiers, td, &mut out, true)?;
    Ok(out)
}

fn template(code: char) -> Option<&'static str> {
    Some(match code {
        'V' => "Vector<",
        'v' => "const Vector<",
        'M' => "Matrix<",
        'm' => "const Matrix<",
        'Z' => "ZeroTerminatedArray<",
        'z' => "const ZeroTerminatedArray<",
        'D' => "DynamicZeroTerminatedArray<",
        'd' => "const DynamicZeroTerminatedArray<",
        'S' => "StaticZeroTerminatedArray<",
        's' => "const StaticZeroTerminatedArray<",
        _ => return None,
    })
}

fn render_layer(
    mut cursor: &str,
    td: &TypeDescriptor,
    out: &mut String,
    start: bool,
) -> Result<(), LayoutError> {
    let token = next_layer(&mut cursor)?;
    match token.code {
        'A' | 'F' | 'f' | 'P' | 'p' => {
            render_layer(cursor, td, out, false)?;
            out.push_str(match token.code {
                'P' => " *",
                'p' => " * const",
                'F' => "( *",
                'f' => "( * const",
                _ => "",
            });
            if start {
                close_declarators(token, cursor, out)?;
            }
            Ok(())
        }
        'O' => {
            out.push_str(&td.to_string());
            Ok(())
        }
        code => {
            let Some(name) = template(code) else {
                return Err(LayoutError::unsupported(format!(
                    "no type name for layer code '{code}'"
                )));
            };
            out.push_str(name);
            render_layer(cursor, td, out, true)?;
            if matches!(code, 'S' | 's') {
                out.push_str(&format!(",{}", token.size));
            }
            out.push('>');
            Ok(())
        }
    }
}

/// Append the array suffixes of the declarator run starting at `token`.
fn close_declarators(mut token: LayerToken, mut cursor: &str, out: &mut String) -> Result<(), LayoutError> {
    loop {
        match token.code {
            'F' | 'f' => {
                out.push_str(&format!(")[{}]", token.size));
            }
            'A' => {
                out.push_str(&format!("[{}]", token.size));
            }
            'P' | 'p' => {}
            c if c == 'O' || template(c).is_some() => return Ok(()),
            other => {
                return Err(LayoutError::fatal(format!(
                    "unmapped layer code '{other}'"
                )))
            }
        }
        token = next_layer(&mut cursor)?;
    }
}
