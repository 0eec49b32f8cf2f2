//! Input/output locations for the converters.
//!
//! Defaults reproduce the site layout; every path is relative to the site
//! root unless the caller passes an absolute one. Use `rooted_at` to anchor
//! a config on a checkout directory.

use std::path::{Path, PathBuf};

/// Locations for the toponym gazetteer conversion.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ToponymConfig {
    /// Gazetteer export (comma, semicolon or tab separated).
    pub input: PathBuf,
    /// Output array for the d'Entrecasteaux expedition.
    pub entrecasteaux_out: PathBuf,
    /// Output array for the Baudin expedition.
    pub baudin_out: PathBuf,
}

impl Default for ToponymConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data").join("Toponymes1.csv"),
            entrecasteaux_out: PathBuf::from("data").join("entrecasteaux.json"),
            baudin_out: PathBuf::from("data").join("baudin.json"),
        }
    }
}

impl ToponymConfig {
    /// Resolve every relative path against `root`.
    #[must_use]
    pub fn rooted_at(mut self, root: &Path) -> Self {
        self.input = root.join(&self.input);
        self.entrecasteaux_out = root.join(&self.entrecasteaux_out);
        self.baudin_out = root.join(&self.baudin_out);
        self
    }
}

/// Locations for the Baudin timeline conversion.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct TimelineConfig {
    /// Tab-separated chronology export.
    pub input: PathBuf,
    /// Timeline array consumed by the map page.
    pub output: PathBuf,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("Parcours et Chronologie").join("Historique Baudin.tsv"),
            output: PathBuf::from("data").join("timeline_baudin.json"),
        }
    }
}

impl TimelineConfig {
    /// Resolve every relative path against `root`.
    #[must_use]
    pub fn rooted_at(mut self, root: &Path) -> Self {
        self.input = root.join(&self.input);
        self.output = root.join(&self.output);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_at_keeps_absolute_paths() {
        let mut cfg = TimelineConfig::default();
        cfg.output = PathBuf::from("/tmp/out.json");
        let cfg = cfg.rooted_at(Path::new("/site"));
        assert_eq!(
            cfg.input,
            Path::new("/site/Parcours et Chronologie/Historique Baudin.tsv")
        );
        assert_eq!(cfg.output, Path::new("/tmp/out.json"));
    }

    #[test]
    fn test_toponym_defaults_live_under_data() {
        let cfg = ToponymConfig::default().rooted_at(Path::new("site"));
        assert_eq!(cfg.input, Path::new("site/data/Toponymes1.csv"));
        assert_eq!(cfg.baudin_out, Path::new("site/data/baudin.json"));
    }
}
