use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use rejar::archive::{self, Archive};
use rejar::{MappingSet, RemapConfig};

/// Remap and repair compiled classes inside a jar or class directory.
#[derive(Parser)]
#[command(name = "rejar", version)]
struct Args {
    /// Input jar or class directory
    #[arg(short, long)]
    input: PathBuf,

    /// Output jar or directory
    #[arg(short, long)]
    output: PathBuf,

    /// Mappings file (SRG subset: CL:/FD:/MD: lines)
    #[arg(short, long)]
    mappings: PathBuf,

    /// Swap the mapping direction before remapping
    #[arg(long)]
    flip: bool,

    /// Comma-separated dotted package/class prefixes to copy unmapped
    #[arg(short, long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Log each class as it is mapped
    #[arg(short, long)]
    verbose: bool,

    /// Regenerate local variable names and lambda captures
    #[arg(long)]
    fix_locals: bool,

    /// Synthesize stripped constructors
    #[arg(long)]
    fix_ctors: bool,

    /// Realign constructor parameter annotations
    #[arg(long)]
    fix_ctor_annotations: bool,

    /// Name canonical constructor parameters after their fields
    #[arg(long)]
    fix_record_ctors: bool,

    /// Synthesize SourceFile attributes
    #[arg(long)]
    fix_source: bool,

    /// Re-apply Deprecated attributes
    #[arg(long)]
    fix_deprecated: bool,

    /// Enable every repair stage
    #[arg(long)]
    fix_all: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut table = MappingSet::load_srg(&args.mappings)
        .with_context(|| format!("failed to load mappings from {}", args.mappings.display()))?;
    if args.flip {
        table = table.reverse().context("failed to flip mappings")?;
    }

    let mut config = RemapConfig {
        verbose: args.verbose,
        excludes: args.exclude,
        fix_locals: args.fix_locals,
        fix_ctors: args.fix_ctors,
        fix_ctor_annotations: args.fix_ctor_annotations,
        fix_record_ctors: args.fix_record_ctors,
        fix_source: args.fix_source,
        fix_deprecated: args.fix_deprecated,
    };
    if args.fix_all {
        config = config.with_all_fixes();
    }

    let input = Archive::load(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let (output, stats) = archive::remap_archive(&input, &table, &config)
        .context("remap failed, no output written")?;

    let as_jar = matches!(
        args.output.extension().and_then(|e| e.to_str()),
        Some("jar") | Some("zip")
    );
    if as_jar {
        output
            .write_jar(&args.output)
            .with_context(|| format!("failed to write {}", args.output.display()))?;
    } else {
        output
            .write_dir(&args.output)
            .with_context(|| format!("failed to write {}", args.output.display()))?;
    }

    println!(
        "Remapped {} classes ({} entries copied) in {:.2?}",
        stats.classes_remapped, stats.entries_copied, stats.elapsed
    );
    Ok(())
}
