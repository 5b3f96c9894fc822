//! Per-class transformation pipeline
//!
//! Stage order matters: local variable reconstruction runs before
//! constructor synthesis so the synthesized constructor's intentional
//! names are not overwritten, and renaming runs last so it rewrites
//! the references synthesis just emitted.

use crate::classfile::reader::ClassFile;
use crate::context::RemapRun;
use crate::error::{Error, Result};
use crate::fix::{ctor, ctor_annotations, deprecated, locals, record_params, source_attr};
use crate::rename;
use crate::summary::StructuralSummary;

/// Transform one class: returns the mapped internal name and the
/// rewritten bytes.
pub fn transform_class(bytes: &[u8], run: &mut RemapRun) -> Result<(String, Vec<u8>)> {
    let mut class = ClassFile::parse(bytes)?;
    let summary = StructuralSummary::extract(&class)?;
    let name = summary.name.clone();
    run.hierarchy.record(
        &name,
        summary.direct_supertypes().iter().map(|s| s.to_string()).collect(),
    );
    run_stages(&mut class, &summary, run).map_err(|e| Error::transform(&name, e))?;
    let mapped_name = run.map_class_name(&name);
    if run.config.verbose {
        log::info!("{name} -> {mapped_name}");
    }
    Ok((mapped_name, class.to_bytes()))
}

fn run_stages(class: &mut ClassFile, summary: &StructuralSummary, run: &mut RemapRun) -> Result<()> {
    let config = run.config;
    if config.fix_locals {
        locals::apply(class, run)?;
    }
    if config.fix_ctor_annotations {
        ctor_annotations::apply(class)?;
    }
    if config.fix_record_ctors {
        record_params::apply(class, summary)?;
    }
    if config.fix_ctors {
        ctor::apply(class, summary, run)?;
    }
    if config.fix_source {
        source_attr::apply(class)?;
    }
    if config.fix_deprecated {
        deprecated::apply(class, summary)?;
    }
    rename::apply(class, run)
}
