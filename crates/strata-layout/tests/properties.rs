//! Property tests over generated shapes and contents.

use proptest::prelude::*;
use strata_arena::PageArena;
use strata_core::TypeDescriptor;
use strata_layout::{
    MatrixHeader, Variable, VariableCloner, VectorHeader, MATRIX_HEADER_SIZE, POINTER_SIZE,
    VECTOR_HEADER_SIZE,
};
use strata_test_utils::{variable, Fixture};

fn leaf() -> impl Strategy<Value = TypeDescriptor> {
    prop_oneof![
        Just(TypeDescriptor::int8()),
        Just(TypeDescriptor::uint16()),
        Just(TypeDescriptor::float32()),
        Just(TypeDescriptor::int64()),
    ]
}

/// Contents of `count` consecutive vectors of int32.
fn vectors_at(ptr: *const u8, count: usize) -> Vec<Vec<i32>> {
    (0..count)
        .map(|i| {
            // SAFETY: callers pass `count` readable vector headers.
            let h = unsafe { VectorHeader::read_from(ptr.add(i * VECTOR_HEADER_SIZE)) };
            if h.data.is_null() {
                return Vec::new();
            }
            // SAFETY: a non-NULL header addresses `count` int32.
            unsafe { std::slice::from_raw_parts(h.data.cast::<i32>(), h.count as usize) }.to_vec()
        })
        .collect()
}

/// One layer of a generated int32 shape.
#[derive(Clone, Copy, Debug)]
enum Code {
    A(u32),
    F(u32),
    V,
    M,
    Z,
}

fn code() -> impl Strategy<Value = Code> {
    prop_oneof![
        (1u32..4).prop_map(Code::A),
        (1u32..4).prop_map(Code::F),
        Just(Code::V),
        Just(Code::M),
        Just(Code::Z),
    ]
}

fn source_modifiers(codes: &[Code]) -> String {
    codes
        .iter()
        .map(|c| match c {
            Code::A(n) => format!("A{n}"),
            Code::F(n) => format!("F{n}"),
            Code::V => "V".to_owned(),
            Code::M => "M".to_owned(),
            Code::Z => "Z".to_owned(),
        })
        .collect::<String>()
        + "O"
}

fn clone_modifiers(codes: &[Code]) -> String {
    codes
        .iter()
        .map(|c| match c {
            Code::A(n) => format!("A{n}"),
            Code::F(n) => format!("f{n}"),
            Code::V | Code::Z => "v".to_owned(),
            Code::M => "m".to_owned(),
        })
        .collect()
}

/// Clone-side codes: zero-terminated arrays come back as vectors.
fn flattened(codes: &[Code]) -> Vec<Code> {
    codes
        .iter()
        .map(|&c| if matches!(c, Code::Z) { Code::V } else { c })
        .collect()
}

/// Bytes one element of `codes` occupies inline.
fn element_size(codes: &[Code]) -> usize {
    match codes.split_first() {
        None => 4,
        Some((Code::A(n), rest)) => *n as usize * element_size(rest),
        Some((Code::F(_) | Code::Z, _)) => POINTER_SIZE,
        Some((Code::V, _)) => VECTOR_HEADER_SIZE,
        Some((Code::M, _)) => MATRIX_HEADER_SIZE,
    }
}

/// Deterministic extents and values from a seed.
struct Lcg(u64);

impl Lcg {
    fn below(&mut self, bound: u32) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) % u64::from(bound)) as u32
    }
}

/// Inline bytes of `count` elements of `codes`, with indirect payloads
/// placed in `fx`. With `nonzero` no element is all zero bytes, so it
/// cannot be mistaken for a terminator.
fn build(fx: &mut Fixture, codes: &[Code], count: usize, nonzero: bool, rng: &mut Lcg) -> Vec<u8> {
    let Some((&first, rest)) = codes.split_first() else {
        return (0..count)
            .flat_map(|_| (rng.below(1000) as i32 + 1).to_ne_bytes())
            .collect();
    };
    let mut bytes = Vec::new();
    for _ in 0..count {
        match first {
            Code::A(n) => bytes.extend(build(fx, rest, n as usize, nonzero, rng)),
            Code::F(n) => {
                let p = if !nonzero && rng.below(4) == 0 {
                    std::ptr::null()
                } else {
                    let payload = build(fx, rest, n as usize, false, rng);
                    fx.bytes(&payload).cast_const()
                };
                bytes.extend((p as usize).to_ne_bytes());
            }
            Code::V => {
                let len = rng.below(3) + u32::from(nonzero);
                let header = if len == 0 {
                    VectorHeader::EMPTY
                } else {
                    let payload = build(fx, rest, len as usize, false, rng);
                    VectorHeader::new(fx.bytes(&payload), len)
                };
                bytes.extend(header.encode());
            }
            Code::M => {
                let rows = rng.below(3) + u32::from(nonzero);
                let cols = rng.below(3) + u32::from(nonzero);
                let header = if rows * cols == 0 {
                    MatrixHeader::EMPTY
                } else {
                    let payload = build(fx, rest, (rows * cols) as usize, false, rng);
                    MatrixHeader::new(fx.bytes(&payload), rows, cols)
                };
                bytes.extend(header.encode());
            }
            Code::Z => {
                let len = rng.below(3) as usize;
                let mut payload = build(fx, rest, len, true, rng);
                payload.extend(vec![0u8; element_size(rest)]);
                bytes.extend((fx.bytes(&payload) as usize).to_ne_bytes());
            }
        }
    }
    bytes
}

/// Logical contents of `count` elements of `codes` at `ptr`: extents,
/// NULL markers, and leaf values in traversal order.
fn contents(codes: &[Code], ptr: *const u8, count: usize, out: &mut Vec<i64>) {
    let Some((&first, rest)) = codes.split_first() else {
        for i in 0..count {
            // SAFETY: `count` int32 leaves follow ptr.
            out.push(i64::from(unsafe { ptr.add(i * 4).cast::<i32>().read_unaligned() }));
        }
        return;
    };
    let stride = element_size(codes);
    for i in 0..count {
        // SAFETY: element i of `count`.
        let at = unsafe { ptr.add(i * stride) };
        match first {
            Code::A(n) => contents(rest, at, n as usize, out),
            Code::F(n) => {
                // SAFETY: at holds a pointer.
                let p = unsafe { at.cast::<*const u8>().read_unaligned() };
                if p.is_null() {
                    out.push(-1);
                } else {
                    out.push(1);
                    contents(rest, p, n as usize, out);
                }
            }
            Code::V => {
                // SAFETY: at holds a vector header.
                let h = unsafe { VectorHeader::read_from(at) };
                out.push(i64::from(h.count));
                if h.count > 0 {
                    contents(rest, h.data, h.count as usize, out);
                }
            }
            Code::M => {
                // SAFETY: at holds a matrix header.
                let h = unsafe { MatrixHeader::read_from(at) };
                out.extend([i64::from(h.rows), i64::from(h.cols)]);
                let n = (h.rows * h.cols) as usize;
                if n > 0 {
                    contents(rest, h.data, n, out);
                }
            }
            Code::Z => {
                // SAFETY: at holds a non-NULL pointer to a terminated run.
                let p = unsafe { at.cast::<*const u8>().read_unaligned() };
                let size = element_size(rest);
                let mut len = 0;
                // SAFETY: the run is readable up to its terminator.
                while unsafe { std::slice::from_raw_parts(p.add(len * size), size) }
                    .iter()
                    .any(|&b| b != 0)
                {
                    len += 1;
                }
                out.push(len as i64);
                contents(rest, p, len, out);
            }
        }
    }
}

fn contents_of(codes: &[Code], ptr: *const u8) -> Vec<i64> {
    let mut out = Vec::new();
    contents(codes, ptr, 1, &mut out);
    out
}

proptest! {
    #[test]
    fn static_shapes_clone_byte_identical(
        rows in 1u32..6,
        cols in 1u32..6,
        td in leaf(),
        seed in any::<u8>(),
    ) {
        let v = variable(&format!("A{rows}A{cols}O"), td);
        let len = (rows * cols * td.storage_size()) as usize;
        let bytes: Vec<u8> = (0..len).map(|i| seed.wrapping_add(i as u8)).collect();
        let mut fx = Fixture::new();
        let src = fx.bytes(&bytes);
        let mut arena = PageArena::with_defaults().unwrap();
        // SAFETY: src holds one instance of the static shape.
        let out = unsafe { VariableCloner::new(&v, &mut arena).clone_from(src) }.unwrap();
        // SAFETY: the clone is `len` bytes.
        let copy = unsafe { std::slice::from_raw_parts(out.as_ptr(), len) };
        prop_assert_eq!(copy, bytes.as_slice());
        prop_assert_eq!(arena.used_bytes(), len);
    }

    #[test]
    fn recloning_is_structurally_stable(
        contents in proptest::collection::vec(proptest::collection::vec(any::<i32>(), 0..5), 1..5),
        zero_terminated in any::<bool>(),
    ) {
        let td = TypeDescriptor::int32();
        let k = contents.len();
        let mut fx = Fixture::new();
        let (modifiers, src) = if zero_terminated {
            let slots: Vec<*const u8> = contents
                .iter()
                .map(|c| {
                    let mut run: Vec<i32> = c.iter().map(|&x| if x == 0 { 1 } else { x }).collect();
                    run.push(0);
                    fx.i32s(&run).cast_const()
                })
                .collect();
            (format!("A{k}ZO"), fx.pointers(&slots))
        } else {
            let headers: Vec<(*const u8, u32)> = contents
                .iter()
                .map(|c| {
                    if c.is_empty() {
                        (std::ptr::null(), 0)
                    } else {
                        (fx.i32s(c).cast_const(), c.len() as u32)
                    }
                })
                .collect();
            (format!("A{k}VO"), fx.vectors(&headers))
        };

        let source = variable(&modifiers, td);
        let mut arena = PageArena::with_defaults().unwrap();
        let mut cloner = VariableCloner::new(&source, &mut arena);
        // SAFETY: src matches `modifiers`.
        let first = unsafe { cloner.clone_from(src) }.unwrap();
        let normalized = cloner.output_modifiers();
        prop_assert_eq!(&normalized, &format!("A{k}v"));

        let clone_shape = Variable::new(&normalized, td).unwrap();
        // SAFETY: the first clone matches the normalized shape.
        let first_size = unsafe { clone_shape.footprint(first.as_ptr()) }.unwrap();
        let mut second_arena = PageArena::with_defaults().unwrap();
        let mut recloner = VariableCloner::new(&clone_shape, &mut second_arena);
        // SAFETY: as above.
        let second = unsafe { recloner.clone_from(first.as_ptr()) }.unwrap();
        prop_assert_eq!(recloner.output_modifiers(), normalized);

        prop_assert_eq!(vectors_at(first.as_ptr(), k), vectors_at(second.as_ptr(), k));
        // SAFETY: the second clone matches the normalized shape.
        let second_size = unsafe { clone_shape.footprint(second.as_ptr()) }.unwrap();
        prop_assert_eq!(first_size, second_size);
    }

    #[test]
    fn mixed_chains_reclone_to_the_same_shape_and_contents(
        codes in proptest::collection::vec(code(), 1..5),
        seed in any::<u64>(),
    ) {
        let td = TypeDescriptor::int32();
        let mut fx = Fixture::new();
        let mut rng = Lcg(seed);
        let root = build(&mut fx, &codes, 1, false, &mut rng);
        let src = fx.bytes(&root);
        let source = variable(&source_modifiers(&codes), td);

        let mut arena = PageArena::with_defaults().unwrap();
        let mut cloner = VariableCloner::new(&source, &mut arena);
        // SAFETY: src was built for `codes`.
        let first = unsafe { cloner.clone_from(src) }.unwrap();
        let normalized = cloner.output_modifiers();
        prop_assert_eq!(&normalized, &clone_modifiers(&codes));

        let clone_shape = Variable::new(&normalized, td).unwrap();
        let mut second_arena = PageArena::with_defaults().unwrap();
        let mut recloner = VariableCloner::new(&clone_shape, &mut second_arena);
        // SAFETY: the first clone matches the normalized shape.
        let second = unsafe { recloner.clone_from(first.as_ptr()) }.unwrap();
        prop_assert_eq!(recloner.output_modifiers(), normalized);

        let flat = flattened(&codes);
        let expected = contents_of(&codes, src);
        prop_assert_eq!(&contents_of(&flat, first.as_ptr()), &expected);
        prop_assert_eq!(&contents_of(&flat, second.as_ptr()), &expected);

        // SAFETY: both clones match the normalized shape.
        let (a, b) = unsafe {
            (
                clone_shape.footprint(first.as_ptr()).unwrap(),
                clone_shape.footprint(second.as_ptr()).unwrap(),
            )
        };
        prop_assert_eq!(a, b);
    }
}
