//! Collaborators at the edge of the pipeline
//!
//! File discovery and content type classification. Both sit behind traits so
//! the pipeline can be driven by stand-ins in tests.

pub mod glob;
pub mod mime;

pub use glob::{FileEnumerator, GlobEnumerator};
pub use mime::{ContentTypeClassifier, ExtensionClassifier};
