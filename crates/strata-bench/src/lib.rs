//! Benchmark workloads for the Strata layout engine.
//!
//! - [`vector_table`]: `k` vectors of `n` int32 each, shape `A{k}VO`
//! - [`string_table`]: `n` C strings behind a pointer, shape `F{n}O`

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use strata_core::TypeDescriptor;
use strata_layout::Variable;
use strata_test_utils::{variable, Fixture};

/// A prepared clone source: its shape, backing memory, and root address.
pub struct Workload {
    /// Shape of the data at `root`.
    pub variable: Variable,
    /// Keeps `root` alive.
    pub fixture: Fixture,
    /// Address of the instance to clone.
    pub root: *const u8,
}

/// `k` vectors of `n` consecutive int32.
pub fn vector_table(k: u32, n: u32) -> Workload {
    let mut fixture = Fixture::new();
    let values: Vec<i32> = (0..n as i32).collect();
    let headers: Vec<(*const u8, u32)> = (0..k)
        .map(|_| (fixture.i32s(&values).cast_const(), n))
        .collect();
    let root = fixture.vectors(&headers).cast_const();
    Workload {
        variable: variable(&format!("A{k}VO"), TypeDescriptor::int32()),
        fixture,
        root,
    }
}

/// `n` strings of `len` characters behind one pointer-to-array.
pub fn string_table(n: u32, len: usize) -> Workload {
    let mut fixture = Fixture::new();
    let text = "x".repeat(len);
    let strings: Vec<*const u8> = (0..n).map(|_| fixture.c_string(&text).cast_const()).collect();
    let table = fixture.pointers(&strings).cast_const();
    let root = fixture.pointers(&[table]).cast_const();
    Workload {
        variable: variable(&format!("F{n}O"), TypeDescriptor::c_string()),
        fixture,
        root,
    }
}
