//! Project descriptor collaborators: discovery, loading and in-place editing.

pub mod discovery;
pub mod document;
pub mod loader;

pub use discovery::{discover_descriptors, DescriptorWalker, DESCRIPTOR_EXTENSION};
pub use document::{DescriptorDocument, Element};
pub use loader::{DescriptorLoader, ProjectFileLoader};
