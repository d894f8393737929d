//! Route handlers.

pub mod analyse;
pub mod status;
