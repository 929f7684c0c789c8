//! Hash maps used for measurement and endpoint tables.
//!
//! Keys are small integers (block indices, endpoint ids), so the fast
//! non-cryptographic `FxHash` is the default. The `std-hash` feature switches
//! back to the standard SipHash maps.

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
    pub use std::collections::hash_map::Entry;
}

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::hash_map::Entry;
    pub use std::collections::{HashMap, HashSet};
}
