//! Request handlers.

mod product;

pub use product::*;
