//! Pure utility functions.
//!
//! Helpers shared by the library and the `journal-query` binary.

pub mod bootstrap;
