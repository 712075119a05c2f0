#![feature(portable_simd)]
// A high-throughput CSV parsing engine: a strict RFC 4180 scalar parser, a
// SIMD fast-path observably identical to it, a quote-aware parallel
// parser, a packed binary serializer for zero-copy FFI handoff, and a
// stable C-ABI facade.
//
// Safety: no unwrap/expect in production code. Fallible paths use match +
// early return.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod chunker;
pub mod config;
pub mod error;
pub mod ffi;
pub mod packed;
pub mod parallel;
pub mod parser;
pub mod scanner;
mod simd_parser;
pub mod state;

pub use config::Config;
pub use error::{ErrorInfo, ErrorKind, RecoveryPolicy};
pub use parser::Parser;
pub use state::ParseState;

// ============================================================================
// Allocator Configuration
// ============================================================================

// When memory_tracking is enabled, wrap the allocator to track usage.
#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                let mut peak = PEAK_ALLOCATED.load(Ordering::Relaxed);
                while current > peak {
                    match PEAK_ALLOCATED.compare_exchange_weak(
                        peak,
                        current,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => break,
                        Err(p) => peak = p,
                    }
                }
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Current Rust heap allocation in bytes. Returns 0 when `memory_tracking`
/// is disabled.
pub fn rust_memory_allocated() -> usize {
    #[cfg(feature = "memory_tracking")]
    {
        use std::sync::atomic::Ordering;
        tracking::ALLOCATED.load(Ordering::SeqCst)
    }
    #[cfg(not(feature = "memory_tracking"))]
    {
        0
    }
}

/// Peak Rust heap allocation observed since the last reset. Returns 0 when
/// `memory_tracking` is disabled.
pub fn rust_memory_peak() -> usize {
    #[cfg(feature = "memory_tracking")]
    {
        use std::sync::atomic::Ordering;
        tracking::PEAK_ALLOCATED.load(Ordering::SeqCst)
    }
    #[cfg(not(feature = "memory_tracking"))]
    {
        0
    }
}

/// Resets peak tracking to the current allocation, returning `(current, previous_peak)`.
/// A no-op pair of zeros when `memory_tracking` is disabled.
pub fn reset_memory_stats() -> (usize, usize) {
    #[cfg(feature = "memory_tracking")]
    {
        use std::sync::atomic::Ordering;
        let current = tracking::ALLOCATED.load(Ordering::SeqCst);
        let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
        (current, peak)
    }
    #[cfg(not(feature = "memory_tracking"))]
    {
        (0, 0)
    }
}

/// Parses `input` with a fresh default-config `Parser`, auto-selecting
/// between the scalar and SIMD code paths. Convenience entry point for
/// Rust callers who don't need to reuse a `Parser` across calls.
pub fn parse(input: &[u8]) -> Parser {
    let mut parser = Parser::new();
    parser.parse_auto(input);
    parser
}

/// Parses `input` using the parallel strategy (falling back to sequential
/// scalar parsing below `parallel::MIN_FILE_SIZE`), with the given config.
pub fn parse_parallel(input: &[u8], config: Config) -> (Parser, bool) {
    parallel::parse_parallel(input, config)
}
