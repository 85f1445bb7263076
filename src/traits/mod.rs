//! Public extension traits for store types.

mod dispose;

pub use dispose::{AsyncDispose, Dispose};
