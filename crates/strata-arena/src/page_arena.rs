//! The page arena: contiguous reservations for flattened clones.

use std::ptr::NonNull;

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::page::PageList;

/// Bump-style arena handing out contiguous, zeroed reservations.
///
/// Reservations stay valid until [`reset`](PageArena::reset) or drop; the
/// arena never moves memory it has handed out. A reservation that does
/// not fit the current page opens a new one, so callers see one
/// contiguous block per request regardless of page boundaries.
///
/// There is no internal locking: one clone operation at a time may
/// reserve from a given arena. Independent arenas are independent.
pub struct PageArena {
    pages: PageList,
    config: ArenaConfig,
    reservations: u64,
}

impl PageArena {
    /// Create an arena from a validated config.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let pages = PageList::new(
            config.page_size as usize,
            config.max_pages as usize,
            config.alignment as usize,
        )?;
        log::debug!(
            "[PageArena::new] page_size={} max_pages={} alignment={}",
            config.page_size,
            config.max_pages,
            config.alignment
        );
        Ok(Self {
            pages,
            config,
            reservations: 0,
        })
    }

    /// Create an arena with [`ArenaConfig::default`].
    pub fn with_defaults() -> Result<Self, ArenaError> {
        Self::new(ArenaConfig::default())
    }

    /// Reserve `size` contiguous zeroed bytes.
    ///
    /// The returned pointer is aligned to `config.alignment` and valid for
    /// writes of `size` bytes until the arena is reset or dropped.
    pub fn write_reserve_atomic(&mut self, size: usize) -> Result<NonNull<u8>, ArenaError> {
        match self.pages.reserve(size) {
            Ok(ptr) => {
                self.reservations += 1;
                log::trace!("[PageArena::write_reserve_atomic] {size} bytes at {ptr:p}");
                Ok(ptr)
            }
            Err(err) => {
                log::warn!("[PageArena::write_reserve_atomic] {err}");
                Err(err)
            }
        }
    }

    /// Invalidate every reservation and start again from the first page.
    pub fn reset(&mut self) {
        self.pages.reset();
        self.reservations = 0;
    }

    /// Bytes reserved so far, including alignment padding.
    pub fn used_bytes(&self) -> usize {
        self.pages.total_used()
    }

    /// Number of pages allocated.
    pub fn page_count(&self) -> usize {
        self.pages.page_count()
    }

    /// Bytes of backing storage held.
    pub fn memory_bytes(&self) -> usize {
        self.pages.memory_bytes()
    }

    /// Successful reservations since creation or the last reset.
    pub fn reservation_count(&self) -> u64 {
        self.reservations
    }

    /// The config this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_arena(max_pages: u16) -> PageArena {
        PageArena::new(ArenaConfig {
            page_size: 128,
            max_pages,
            alignment: 8,
        })
        .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let result = PageArena::new(ArenaConfig::new(0));
        assert!(matches!(result, Err(ArenaError::InvalidConfig { .. })));
    }

    #[test]
    fn reservations_are_aligned() {
        let mut arena = small_arena(4);
        for size in [1usize, 3, 7, 12, 16] {
            let ptr = arena.write_reserve_atomic(size).unwrap();
            assert_eq!(ptr.as_ptr() as usize % 8, 0);
        }
        assert_eq!(arena.reservation_count(), 5);
    }

    #[test]
    fn large_reservation_spans_into_dedicated_page() {
        let mut arena = small_arena(4);
        arena.write_reserve_atomic(100).unwrap();
        arena.write_reserve_atomic(500).unwrap();
        assert_eq!(arena.page_count(), 2);
        assert!(arena.used_bytes() >= 600);
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut arena = small_arena(1);
        arena.write_reserve_atomic(128).unwrap();
        let err = arena.write_reserve_atomic(8).unwrap_err();
        assert!(matches!(err, ArenaError::CapacityExceeded { requested: 8, .. }));
    }

    #[test]
    fn reset_clears_usage() {
        let mut arena = small_arena(2);
        arena.write_reserve_atomic(64).unwrap();
        arena.reset();
        assert_eq!(arena.used_bytes(), 0);
        assert_eq!(arena.reservation_count(), 0);
    }

    #[test]
    fn arena_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<PageArena>();
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_config() -> impl Strategy<Value = ArenaConfig> {
            (0u32..7, 1u32..16, 1u16..6).prop_map(|(shift, units, max_pages)| {
                let alignment = 1u32 << shift;
                ArenaConfig {
                    page_size: alignment * units * 8,
                    max_pages,
                    alignment,
                }
            })
        }

        /// Reserve every size (clamped to one page) and return the
        /// successful `(address, len)` pairs.
        fn fill(arena: &mut PageArena, sizes: &[usize]) -> Vec<(usize, usize)> {
            let page_size = arena.config().page_size as usize;
            let mut spans = Vec::new();
            for &size in sizes {
                let len = size.min(page_size);
                match arena.write_reserve_atomic(len) {
                    Ok(ptr) => spans.push((ptr.as_ptr() as usize, len)),
                    Err(e) => assert!(
                        matches!(e, ArenaError::CapacityExceeded { .. }),
                        "unexpected {e}"
                    ),
                }
            }
            spans
        }

        proptest! {
            #[test]
            fn reservations_are_aligned_and_disjoint(
                config in arb_config(),
                sizes in proptest::collection::vec(0usize..600, 1..48),
            ) {
                let alignment = config.alignment as usize;
                let capacity = config.capacity_bytes();
                let mut arena = PageArena::new(config).unwrap();
                let mut spans = fill(&mut arena, &sizes);
                prop_assert_eq!(arena.reservation_count(), spans.len() as u64);

                for &(addr, _) in &spans {
                    prop_assert_eq!(addr % alignment, 0);
                }
                spans.retain(|&(_, len)| len > 0);
                spans.sort_unstable();
                for pair in spans.windows(2) {
                    prop_assert!(pair[0].0 + pair[0].1 <= pair[1].0);
                }
                prop_assert!(arena.used_bytes() <= arena.memory_bytes());
                prop_assert!(arena.memory_bytes() <= capacity);
            }

            #[test]
            fn reset_reuses_pages_within_capacity(
                config in arb_config(),
                first in proptest::collection::vec(0usize..600, 1..32),
                second in proptest::collection::vec(0usize..600, 1..32),
            ) {
                let max_pages = config.max_pages as usize;
                let capacity = config.capacity_bytes();
                let mut arena = PageArena::new(config).unwrap();
                fill(&mut arena, &first);
                let pages = arena.page_count();
                arena.reset();
                prop_assert_eq!(arena.used_bytes(), 0);
                prop_assert_eq!(arena.page_count(), pages);

                fill(&mut arena, &second);
                prop_assert!(arena.page_count() <= max_pages);
                prop_assert!(arena.memory_bytes() <= capacity);
            }
        }
    }
}
