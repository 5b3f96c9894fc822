//! rejar
//!
//! Rewrites compiled JVM class files inside an archive according to an
//! external renaming table, and repairs structural information that
//! aggressive minifiers discard: local variable names, lambda-captured
//! variable identity, and stripped constructors.
//!
//! ## Architecture
//!
//! - **classfile**: class file data model (constant pool, reader, writer,
//!   attributes, descriptors)
//! - **mapping** / **provider**: the two input capabilities, a renaming
//!   table and a class byte lookup over the working archive
//! - **summary** / **hierarchy** / **resolver**: lazily-populated
//!   cross-class knowledge base and the hierarchy-walking name resolver
//! - **fix**: the repair stages (locals, stripped constructors, ctor
//!   annotations, record parameters, source attribute, deprecation)
//! - **rename**: applies the resolver to a parsed class
//! - **pipeline** / **archive**: per-class stage composition and the
//!   whole-archive run
//!
//! ## Transformation flow
//!
//! ```text
//! archive entry -> parse -> summary -> [locals -> fixers -> ctor synth
//!   -> source -> deprecated -> rename] -> serialize -> output entry
//! ```

pub mod archive;
pub mod classfile;
pub mod config;
pub mod context;
pub mod error;
pub mod fix;
pub mod hierarchy;
pub mod mapping;
pub mod pipeline;
pub mod provider;
pub mod rename;
pub mod resolver;
pub mod summary;

pub use config::RemapConfig;
pub use context::RemapRun;
pub use error::{Error, Result};
pub use mapping::{MappingSet, RenamingTable};
pub use provider::ClassByteProvider;
