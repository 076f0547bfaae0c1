//! Algorithms used by the sgmlcore crates.

pub mod spellcheck;
