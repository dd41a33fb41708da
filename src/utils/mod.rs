//! Utility functions.

pub mod date;
pub mod species_list;
