//! Path-based exclusion filtering for coverage sections.

use regex::Regex;

/// Default exclusion markers: benchmark code, integration tests, tooling,
/// and vendored registry sources.
pub const DEFAULT_EXCLUDES: [&str; 4] = ["bench", "integration", "tools", ".cargo"];

/// Decides which source paths are dropped from an uploaded report.
///
/// A path is excluded when any pattern matches anywhere in it.
#[derive(Debug, Clone)]
pub struct PathFilter {
    patterns: Vec<Regex>,
}

impl PathFilter {
    /// Builds a filter from literal path fragments.
    ///
    /// Fragments are escaped, so `.cargo` matches only the literal dotted
    /// directory name.
    #[must_use]
    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = fragments
            .into_iter()
            // Escaped literals always compile.
            .filter_map(|f| Regex::new(&regex::escape(f.as_ref())).ok())
            .collect();
        Self { patterns }
    }

    /// Builds a filter from regular expression patterns.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// The default exclusion set.
    #[must_use]
    pub fn default_excludes() -> Self {
        Self::from_fragments(DEFAULT_EXCLUDES)
    }

    /// A filter that excludes nothing.
    #[must_use]
    pub fn keep_all() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Returns true if the path matches an exclusion pattern.
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(path))
    }

    /// Returns the number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if the filter has no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::default_excludes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_excludes_cover_the_four_markers() {
        let filter = PathFilter::default_excludes();
        assert_eq!(filter.len(), 4);

        assert!(filter.is_excluded("bench/foo.rs"));
        assert!(filter.is_excluded("integration/bar.rs"));
        assert!(filter.is_excluded("tools/profiler/main.rs"));
        assert!(filter.is_excluded("/home/ci/.cargo/registry/src/lib.rs"));

        assert!(!filter.is_excluded("src/lib.rs"));
        assert!(!filter.is_excluded("server/src/http/mod.rs"));
    }

    #[test]
    fn test_fragments_are_escaped() {
        let filter = PathFilter::from_fragments([".cargo"]);
        assert!(filter.is_excluded("/root/.cargo/registry/lib.rs"));
        // An unescaped dot would match this too.
        assert!(!filter.is_excluded("/root/xcargo/lib.rs"));
    }

    #[test]
    fn test_patterns_are_raw_regexes() {
        let filter = PathFilter::from_patterns([r"^tests?/", r"_generated\.rs$"]).unwrap();
        assert!(filter.is_excluded("tests/smoke.rs"));
        assert!(filter.is_excluded("src/schema_generated.rs"));
        assert!(!filter.is_excluded("src/tests_util.rs"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(PathFilter::from_patterns(["["]).is_err());
    }

    #[test]
    fn test_keep_all() {
        let filter = PathFilter::keep_all();
        assert!(filter.is_empty());
        assert!(!filter.is_excluded("bench/foo.rs"));
    }
}
