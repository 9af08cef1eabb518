// src/toc/mod.rs
pub mod cleanup;
pub mod locate;
pub mod model;
pub mod parse;
pub mod patterns;
pub mod strategy;

// Re-export key TOC types for convenience
pub use model::{TocEntry, TocOrigin, TocResult};
pub use strategy::{
    locate_and_parse_toc, LineScanStrategy, StrategySelector, TableCaptionStrategy,
    TableRowStrategy, TocStrategy,
};
