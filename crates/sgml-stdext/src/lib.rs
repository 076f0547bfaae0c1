//! Data structures and algorithms used by the sgmlcore crates that are not specific to SGML.

pub mod algorithms;
pub mod collections;
pub mod color;
