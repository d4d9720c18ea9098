//! Reading, filtering, and re-rendering LCOV tracefiles.

use super::PathFilter;
use crate::errors::TracefileError;
use lcov::{Reader, Record};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// One `SF:` … `end_of_record` block of a tracefile.
///
/// Records are kept verbatim (including the leading `SourceFile` and the
/// trailing `EndOfRecord`), so a section serializes back to exactly the
/// tracefile text it came from.
#[derive(Debug, Clone)]
pub struct Section {
    /// The source path this section covers.
    pub path: PathBuf,
    /// All records of the section, in file order.
    pub records: Vec<Record>,
}

impl Section {
    fn new(path: PathBuf) -> Self {
        let records = vec![Record::SourceFile { path: path.clone() }];
        Self { path, records }
    }

    fn close(mut self) -> Self {
        if !matches!(self.records.last(), Some(Record::EndOfRecord)) {
            self.records.push(Record::EndOfRecord);
        }
        self
    }
}

/// Counts from a filtering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    /// Sections kept.
    pub kept: usize,
    /// Sections dropped by the filter.
    pub dropped: usize,
}

impl FilterStats {
    /// Total sections seen.
    #[must_use]
    pub fn total(&self) -> usize {
        self.kept + self.dropped
    }
}

/// Loads a tracefile into per-source sections.
///
/// Records outside any section (such as a leading `TN:`) are dropped. A
/// final section without `end_of_record` is tolerated and closed.
pub fn load_sections(path: &Path) -> Result<Vec<Section>, TracefileError> {
    let reader = Reader::open_file(path).map_err(|source| TracefileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for record in reader {
        let record = record.map_err(|err| TracefileError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        match record {
            Record::SourceFile { path: source } => {
                if let Some(section) = current.take() {
                    sections.push(section.close());
                }
                current = Some(Section::new(source));
            }
            Record::EndOfRecord => {
                if let Some(section) = current.take() {
                    sections.push(section.close());
                }
            }
            other => {
                if let Some(section) = current.as_mut() {
                    section.records.push(other);
                }
            }
        }
    }

    if let Some(section) = current.take() {
        sections.push(section.close());
    }

    Ok(sections)
}

/// Splits sections into kept and dropped according to the filter.
#[must_use]
pub fn filter_sections(
    sections: Vec<Section>,
    filter: &PathFilter,
) -> (Vec<Section>, FilterStats) {
    let total = sections.len();
    let kept: Vec<Section> = sections
        .into_iter()
        .filter(|s| !filter.is_excluded(&s.path.to_string_lossy()))
        .collect();
    let stats = FilterStats {
        kept: kept.len(),
        dropped: total - kept.len(),
    };
    (kept, stats)
}

/// Renders sections back to tracefile text.
#[must_use]
pub fn render_sections(sections: &[Section]) -> String {
    let mut out = String::new();
    for section in sections {
        for record in &section.records {
            // Record's Display form is the tracefile line.
            let _ = writeln!(out, "{record}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    const TRACEFILE: &str = "TN:\n\
SF:src/lib.rs\n\
DA:1,5\n\
DA:2,0\n\
LF:2\n\
LH:1\n\
end_of_record\n\
SF:bench/foo.rs\n\
DA:10,3\n\
LF:1\n\
LH:1\n\
end_of_record\n\
SF:integration/bar.rs\n\
DA:4,0\n\
LF:1\n\
LH:0\n\
end_of_record\n";

    fn write_tracefile(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_sections() {
        let file = write_tracefile(TRACEFILE);
        let sections = load_sections(file.path()).unwrap();

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].path, PathBuf::from("src/lib.rs"));
        assert_eq!(sections[1].path, PathBuf::from("bench/foo.rs"));
        assert!(matches!(
            sections[0].records.first(),
            Some(Record::SourceFile { .. })
        ));
        assert!(matches!(
            sections[0].records.last(),
            Some(Record::EndOfRecord)
        ));
    }

    #[test]
    fn test_load_tolerates_missing_end_of_record() {
        let file = write_tracefile("SF:src/lib.rs\nDA:1,1\nLF:1\nLH:1\n");
        let sections = load_sections(file.path()).unwrap();

        assert_eq!(sections.len(), 1);
        assert!(matches!(
            sections[0].records.last(),
            Some(Record::EndOfRecord)
        ));
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err = load_sections(Path::new("/nonexistent/coverage.info")).unwrap_err();
        assert!(matches!(err, TracefileError::Read { .. }));
    }

    #[test]
    fn test_filtering_retains_only_source_sections() {
        let file = write_tracefile(TRACEFILE);
        let sections = load_sections(file.path()).unwrap();

        let (kept, stats) = filter_sections(sections, &PathFilter::default_excludes());

        assert_eq!(stats, FilterStats { kept: 1, dropped: 2 });
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].path, PathBuf::from("src/lib.rs"));
    }

    #[test]
    fn test_render_round_trips_through_the_parser() {
        let file = write_tracefile(TRACEFILE);
        let sections = load_sections(file.path()).unwrap();

        let rendered = render_sections(&sections);
        assert!(rendered.contains("SF:src/lib.rs"));
        assert!(rendered.contains("end_of_record"));

        let file2 = write_tracefile(&rendered);
        let reparsed = load_sections(file2.path()).unwrap();
        assert_eq!(reparsed.len(), sections.len());
        assert_eq!(reparsed[2].path, sections[2].path);
    }
}
