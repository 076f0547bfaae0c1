//! Collections
//!
//! Both collections here are keyed on 32-bit character numbers.

pub mod charmap;
pub mod rangeset;
