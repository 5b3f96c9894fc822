//! Archive handling and the whole-run orchestrator
//!
//! The input jar or directory is loaded fully into memory, every class
//! entry is transformed, and only then is the output written: a failed
//! run never leaves a partial artifact. Signing data cannot survive a
//! remap, so `.SF`/`.DSA`/`.RSA` entries are dropped and the manifest
//! loses its per-entry digest sections.

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::config::RemapConfig;
use crate::context::RemapRun;
use crate::error::Result;
use crate::mapping::RenamingTable;
use crate::pipeline;
use crate::provider::ClassByteProvider;

const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Ordered in-memory archive.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    pub entries: Vec<ArchiveEntry>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.entries.push(ArchiveEntry { name: name.into(), data });
    }

    pub fn entry(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn load_jar(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let mut zip = ZipArchive::new(file)?;
        let mut archive = Archive::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            archive.push(entry.name().to_string(), data);
        }
        Ok(archive)
    }

    pub fn load_dir(root: &Path) -> Result<Self> {
        let mut archive = Archive::new();
        for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            archive.push(relative, fs::read(entry.path())?);
        }
        Ok(archive)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if path.is_dir() {
            Self::load_dir(path)
        } else {
            Self::load_jar(path)
        }
    }

    pub fn write_jar(&self, path: &Path) -> Result<()> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buffer);
            let options: FileOptions = FileOptions::default();
            for entry in &self.entries {
                zip.start_file(entry.name.clone(), options)?;
                zip.write_all(&entry.data)?;
            }
            zip.finish()?;
        }
        fs::write(path, buffer.into_inner())?;
        Ok(())
    }

    pub fn write_dir(&self, root: &Path) -> Result<()> {
        for entry in &self.entries {
            let target = root.join(&entry.name);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(target, &entry.data)?;
        }
        Ok(())
    }
}

/// Class lookup over the input archive, keyed by internal name.
struct ClassIndex<'a> {
    classes: HashMap<&'a str, &'a [u8]>,
}

impl<'a> ClassIndex<'a> {
    fn new(archive: &'a Archive) -> Self {
        let mut classes = HashMap::new();
        for entry in &archive.entries {
            if let Some(name) = entry.name.strip_suffix(".class") {
                classes.insert(name, entry.data.as_slice());
            }
        }
        Self { classes }
    }
}

impl ClassByteProvider for ClassIndex<'_> {
    fn bytes_of(&self, internal_name: &str) -> Option<&[u8]> {
        self.classes.get(internal_name).copied()
    }
}

/// Signing data that a remap invalidates.
fn is_signing_entry(name: &str) -> bool {
    name.starts_with("META-INF/")
        && (name.ends_with(".SF") || name.ends_with(".DSA") || name.ends_with(".RSA"))
}

/// Keep the manifest's main section, drop the per-entry sections and
/// their digests.
fn strip_manifest_sections(data: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(data);
    let mut out = String::new();
    for line in text.lines() {
        if line.is_empty() {
            break;
        }
        out.push_str(line);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out.into_bytes()
}

fn is_excluded(internal_name: &str, excludes: &[String]) -> bool {
    if excludes.is_empty() {
        return false;
    }
    let dotted = internal_name.replace('/', ".");
    excludes.iter().any(|prefix| dotted.starts_with(prefix.as_str()))
}

/// Outcome counters of one run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub classes_remapped: usize,
    pub entries_copied: usize,
    pub elapsed: Duration,
}

/// Remap a whole archive. The output is only assembled if every class
/// transforms successfully.
pub fn remap_archive(
    input: &Archive,
    table: &dyn RenamingTable,
    config: &RemapConfig,
) -> Result<(Archive, RunStats)> {
    let start = Instant::now();
    let index = ClassIndex::new(input);
    let mut run = RemapRun::new(table, &index, config);
    let mut output = Archive::new();
    let mut classes_remapped = 0;
    let mut entries_copied = 0;

    for entry in &input.entries {
        if is_signing_entry(&entry.name) {
            log::debug!("dropping signing entry {}", entry.name);
            continue;
        }
        if entry.name == MANIFEST_PATH {
            output.push(MANIFEST_PATH, strip_manifest_sections(&entry.data));
            continue;
        }
        match entry.name.strip_suffix(".class") {
            Some(internal_name) if !is_excluded(internal_name, &config.excludes) => {
                let (mapped_name, bytes) = pipeline::transform_class(&entry.data, &mut run)?;
                output.push(format!("{mapped_name}.class"), bytes);
                classes_remapped += 1;
            }
            _ => {
                output.push(entry.name.clone(), entry.data.clone());
                entries_copied += 1;
            }
        }
    }

    let stats = RunStats { classes_remapped, entries_copied, elapsed: start.elapsed() };
    log::debug!(
        "remapped {} classes, copied {} entries in {:?}",
        stats.classes_remapped,
        stats.entries_copied,
        stats.elapsed
    );
    Ok((output, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_entries() {
        assert!(is_signing_entry("META-INF/SIGNER.SF"));
        assert!(is_signing_entry("META-INF/SIGNER.RSA"));
        assert!(!is_signing_entry("META-INF/MANIFEST.MF"));
        assert!(!is_signing_entry("com/example/A.class"));
    }

    #[test]
    fn test_manifest_strip() {
        let manifest = b"Manifest-Version: 1.0\r\nMain-Class: a.A\r\n\r\n\
Name: a/A.class\r\nSHA-256-Digest: xxxx\r\n\r\n";
        let stripped = strip_manifest_sections(manifest);
        let text = String::from_utf8(stripped).unwrap();
        assert!(text.contains("Manifest-Version: 1.0"));
        assert!(text.contains("Main-Class: a.A"));
        assert!(!text.contains("Digest"));
    }

    #[test]
    fn test_exclude_prefixes() {
        let excludes = vec!["com.vendor".to_string()];
        assert!(is_excluded("com/vendor/Thing", &excludes));
        assert!(!is_excluded("com/example/Thing", &excludes));
    }
}
