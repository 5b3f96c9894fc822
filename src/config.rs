//! Per-run configuration for the remapper

/// Feature toggles for a remap run.
///
/// The renaming pass always runs; each repair stage is opt-in. All
/// toggles default to off, which together with an empty renaming table
/// makes a run the identity transformation.
#[derive(Debug, Clone, Default)]
pub struct RemapConfig {
    /// Log every class mapping as it happens
    pub verbose: bool,
    /// Dotted name prefixes excluded from remapping (copied raw)
    pub excludes: Vec<String>,
    /// Regenerate local variable names and propagate lambda captures
    pub fix_locals: bool,
    /// Synthesize constructors stripped by a prior optimization pass
    pub fix_ctors: bool,
    /// Shift parameter-annotation indices on enum/inner class ctors
    pub fix_ctor_annotations: bool,
    /// Copy field names onto canonical record constructor parameters
    pub fix_record_ctors: bool,
    /// Synthesize a SourceFile attribute from the class name
    pub fix_source: bool,
    /// Re-apply Deprecated attributes recorded in the structural summary
    pub fix_deprecated: bool,
}

impl RemapConfig {
    /// Enable every repair stage.
    pub fn with_all_fixes(mut self) -> Self {
        self.fix_locals = true;
        self.fix_ctors = true;
        self.fix_ctor_annotations = true;
        self.fix_record_ctors = true;
        self.fix_source = true;
        self.fix_deprecated = true;
        self
    }
}
