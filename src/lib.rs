//! Copyright © 2025 Peter Garfield Bower. All rights reserved.
//!
//! # largearray
//!
//! Fixed-length arrays of primitive elements that switch from a dense `Vec`
//! to an explicitly allocated raw block once their element count crosses a
//! runtime-adjustable threshold.
//!
//! ## Layout
//! - [`ElementKind`]: the closed set of storable kinds.
//! - [`LargeArray`]: kind-tagged array returned by [`create`], wrapping
//!   [`BitLargeArray`], [`NumericLargeArray`] and [`StringLargeArray`].
//! - [`LargeAccess`] / [`PrimitiveAccess`]: shared accessor contract; every
//!   scalar read or write is cast through one rule, see [`Primitive`].
//! - [`arraycopy`], [`copy_from_slice`], [`convert`]: fork-join bulk operations.
//! - [`ArrayContext`]: threshold, raw-allocation tracker and worker count.
//!   The free functions use the process-wide [`global`] context.
//!
//! ## Example
//! ```rust
//! use largearray::{ElementKind, LargeAccess, PrimitiveAccess};
//!
//! let mut arr = largearray::create(ElementKind::Int, 10).unwrap();
//! arr.set_checked::<f64>(3, 3.9).unwrap();
//! assert_eq!(arr.get_checked::<i32>(3).unwrap(), 3);
//! assert!(arr.get_checked::<bool>(3).unwrap());
//! assert!(!arr.is_raw_backed());
//! ```

pub mod enums {
    pub mod element_kind;
    pub mod error;
    pub mod large_array;
    pub mod value;
}

pub mod structs {
    pub mod variants {
        pub mod bit;
        pub mod numeric;
        pub mod string;
    }
    pub mod buffer;
    pub mod context;
    pub mod raw_block;
}

pub mod kernels {
    pub mod convert;
    pub mod copy;
    pub mod parallel;
}

pub mod traits {
    pub mod large_access;
    pub mod type_unions;
}

pub mod utils;

pub use enums::element_kind::{DEFAULT_STRING_WIDTH, ElementKind};
pub use enums::error::{LargeArrayError, Result};
pub use enums::large_array::{LargeArray, NumericVariant};
pub use enums::value::Value;

pub use structs::buffer::Buffer;
pub use structs::context::{
    AllocationTracker, ArrayContext, ArrayContextConfig, DEFAULT_THRESHOLD, MAX_THRESHOLD,
    ThresholdPolicy, create, create_string, create_uninit, current_raw_bytes_allocated, global,
    set_threshold, set_workers, threshold,
};
pub use structs::raw_block::RawBlock;
pub use structs::variants::bit::BitLargeArray;
pub use structs::variants::numeric::NumericLargeArray;
pub use structs::variants::string::StringLargeArray;

pub use kernels::convert::convert;
pub use kernels::copy::{SliceSource, arraycopy, copy_from_slice};
pub use kernels::parallel::ForkJoin;

pub use traits::large_access::{LargeAccess, PrimitiveAccess};
pub use traits::type_unions::{NativeNumeric, Primitive};
