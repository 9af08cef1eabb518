// src/extractors/mod.rs
pub mod pipeline;
pub mod section;

// Re-export key extraction types for convenience
pub use pipeline::{FilingExtraction, FilingExtractor};
pub use section::{
    segment_sections,
    SectionMap,
    FULL_DOCUMENT_SECTION,
    INTRODUCTION_SECTION,
    UNASSIGNED_SECTION,
};
