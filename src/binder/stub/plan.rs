//! Launch plan derived from a payload header.
//!
//! Planning is pure: it decides where every entry goes and how it is started,
//! without touching the filesystem.

use crate::binder::{payload::PayloadHeader, registry::validate_name};
use std::path::{Path, PathBuf};

/// Default file name that gets numbered at extraction time.
pub const PLACEHOLDER_NAME: &str = "Binded File";

/// Appended to the output base name to form the extraction directory name.
pub const EXTRACTION_DIR_SUFFIX: &str = " Binds";

/// How an extracted entry is started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchMode {
    /// Extracted only.
    Skip,
    Normal,
    /// Started with a request for elevated execution.
    Elevated,
}

/// One entry of the plan, in payload order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedEntry {
    /// Position in the payload.
    pub index: usize,
    /// Name after placeholder numbering.
    pub name: String,
    /// Extraction target, `None` when the name cannot be used safely.
    pub path: Option<PathBuf>,
    pub launch: LaunchMode,
}

/// What the stub does when it runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StubPlan {
    /// Relaunch elevated before extracting, if not elevated already.
    pub requires_elevation: bool,
    pub extraction_dir: PathBuf,
    pub entries: Vec<PlannedEntry>,
}

impl StubPlan {
    /// Builds the plan for `header`, extracting under `temp_root`.
    pub fn generate(header: &PayloadHeader, temp_root: &Path) -> Self {
        let extraction_dir = temp_root.join(extraction_dir_name(&header.label));

        let entries = header
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let name = resolve_name(&entry.name, index);
                let path = validate_name(&name)
                    .ok()
                    .map(|_| extraction_dir.join(&name));
                let launch = match (entry.is_executable, entry.is_administrator) {
                    (false, _) => LaunchMode::Skip,
                    (true, false) => LaunchMode::Normal,
                    (true, true) => LaunchMode::Elevated,
                };
                PlannedEntry {
                    index,
                    name,
                    path,
                    launch,
                }
            })
            .collect();

        Self {
            requires_elevation: header.requires_elevation(),
            extraction_dir,
            entries,
        }
    }

    /// Entries that get started, in launch order.
    pub fn launches(&self) -> impl Iterator<Item = &PlannedEntry> {
        self.entries
            .iter()
            .filter(|e| e.launch != LaunchMode::Skip)
    }
}

/// `"<label> Binds"`.
pub fn extraction_dir_name(label: &str) -> String {
    format!("{label}{EXTRACTION_DIR_SUFFIX}")
}

/// Numbers placeholder-named entries by their 1-based position so they do not
/// overwrite each other: `Binded File.exe` at index 0 becomes
/// `Binded File 1.exe`.
///
/// A name is a placeholder when the text before its first dot is the
/// placeholder; the kept extension is the text after its last dot, so
/// `Binded File.tar.gz` becomes `Binded File 1.gz`.
pub fn resolve_name(name: &str, index: usize) -> String {
    let prefix = name.split_once('.').map_or(name, |(prefix, _)| prefix);
    if prefix != PLACEHOLDER_NAME {
        return name.to_string();
    }

    match name.rsplit_once('.') {
        Some((_, ext)) => format!("{PLACEHOLDER_NAME} {}.{ext}", index + 1),
        None => format!("{PLACEHOLDER_NAME} {}", index + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::payload::EntryHeader;

    fn entry(name: &str, exec: bool, admin: bool) -> EntryHeader {
        EntryHeader {
            name: name.into(),
            is_executable: exec,
            is_administrator: admin,
            size: 0,
        }
    }

    #[test]
    fn placeholder_names_are_numbered_by_position() {
        assert_eq!(resolve_name("Binded File.exe", 0), "Binded File 1.exe");
        assert_eq!(resolve_name("Binded File.txt", 1), "Binded File 2.txt");
        assert_eq!(resolve_name("Binded File", 4), "Binded File 5");
        assert_eq!(resolve_name("setup.exe", 0), "setup.exe");
        assert_eq!(resolve_name("Binded Files.exe", 0), "Binded Files.exe");
    }

    #[test]
    fn multi_dot_placeholders_match_on_first_dot() {
        let first = resolve_name("Binded File.tar.gz", 0);
        let second = resolve_name("Binded File.tar.gz", 1);
        assert_eq!(first, "Binded File 1.gz");
        assert_eq!(second, "Binded File 2.gz");
        assert_ne!(first, second);

        assert_eq!(resolve_name("Binded File.v2.exe", 2), "Binded File 3.exe");
        assert_eq!(resolve_name("setup.Binded File.exe", 0), "setup.Binded File.exe");
    }

    #[test]
    fn multi_dot_placeholders_extract_to_distinct_paths() {
        let header = PayloadHeader {
            label: "Output".into(),
            entries: vec![
                entry("Binded File.tar.gz", false, false),
                entry("Binded File.tar.gz", true, false),
            ],
        };
        let plan = StubPlan::generate(&header, Path::new("/tmp"));
        let paths: Vec<_> = plan.entries.iter().map(|e| e.path.clone().unwrap()).collect();
        assert_eq!(paths[0], Path::new("/tmp/Output Binds/Binded File 1.gz"));
        assert_eq!(paths[1], Path::new("/tmp/Output Binds/Binded File 2.gz"));
    }

    #[test]
    fn plan_orders_entries_and_launch_modes() {
        let header = PayloadHeader {
            label: "Output".into(),
            entries: vec![
                entry("Binded File.exe", true, false),
                entry("Binded File.txt", false, false),
                entry("tool.exe", true, true),
                entry("notes.txt", false, true),
            ],
        };
        let plan = StubPlan::generate(&header, Path::new("/tmp"));

        assert!(plan.requires_elevation);
        assert_eq!(plan.extraction_dir, Path::new("/tmp").join("Output Binds"));

        let names: Vec<_> = plan.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["Binded File 1.exe", "Binded File 2.txt", "tool.exe", "notes.txt"]
        );
        assert_eq!(
            plan.entries[0].path,
            Some(plan.extraction_dir.join("Binded File 1.exe"))
        );

        let launches: Vec<_> = plan.launches().map(|e| (e.index, e.launch)).collect();
        assert_eq!(
            launches,
            [(0, LaunchMode::Normal), (2, LaunchMode::Elevated)]
        );
    }

    #[test]
    fn no_administrator_entry_means_no_elevation() {
        let header = PayloadHeader {
            label: "Out".into(),
            entries: vec![entry("a.exe", true, false), entry("b.txt", false, false)],
        };
        assert!(!StubPlan::generate(&header, Path::new("/tmp")).requires_elevation);
    }

    #[test]
    fn unsafe_names_get_no_target() {
        let header = PayloadHeader {
            label: "Out".into(),
            entries: vec![entry("../escape.exe", true, false)],
        };
        let plan = StubPlan::generate(&header, Path::new("/tmp"));
        assert!(plan.entries[0].path.is_none());
    }
}
