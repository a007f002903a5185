//! Per-poster approval flow and the marketplace seam it commits through.

pub mod board;
pub mod item;
pub mod marketplace;
