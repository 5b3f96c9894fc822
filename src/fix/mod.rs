//! Structural repair stages
//!
//! Each stage is a single-pass transformation over one parsed class,
//! applied by the pipeline in a fixed order. Stages run before symbol
//! renaming, except where noted in the pipeline.

pub mod ctor;
pub mod ctor_annotations;
pub mod deprecated;
pub mod locals;
pub mod record_params;
pub mod source_attr;
