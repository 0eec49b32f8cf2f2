//! Survey of the FR/EN resource page pairs ahead of merging them into
//! bilingual pages. Nothing is written.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::PageError;
use crate::report::{FileFailure, MergeReport, PairSummary};

/// One FR/EN pair and the bilingual page it becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePair {
    pub fr: &'static str,
    pub en: &'static str,
    pub output: &'static str,
    pub key: &'static str,
}

pub const PAGE_PAIRS: &[PagePair] = &[
    PagePair {
        fr: "glossaryF.html",
        en: "glossaryE.html",
        output: "glossary.html",
        key: "glossary",
    },
    PagePair {
        fr: "acteursF.html",
        en: "acteursE.html",
        output: "actors.html",
        key: "actors",
    },
    PagePair {
        fr: "cartesF.html",
        en: "cartesE.html",
        output: "maps.html",
        key: "maps",
    },
    PagePair {
        fr: "SourcesF.html",
        en: "SourcesE.html",
        output: "sources.html",
        key: "sources",
    },
];

static TITLE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"<title>([^<]+)</title>") {
    Ok(regex) => regex,
    Err(err) => panic!("Invalid title regex: {err}"),
});

static NAV: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"(?s)<nav>.*?</nav>") {
    Ok(regex) => regex,
    Err(err) => panic!("Invalid nav regex: {err}"),
});

static MAIN: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"(?s)<main[^>]*>(.*?)</main>") {
    Ok(regex) => regex,
    Err(err) => panic!("Invalid main regex: {err}"),
});

/// Text of the first `<title>`, or an empty string.
#[must_use]
pub fn extract_title(html: &str) -> &str {
    TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str())
}

/// The first `<nav>...</nav>` block, tags included.
#[must_use]
pub fn extract_nav(html: &str) -> &str {
    NAV.find(html).map_or("", |m| m.as_str())
}

/// Trimmed content of the first `<main>` element.
#[must_use]
pub fn extract_main(html: &str) -> &str {
    MAIN.captures(html)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str().trim())
}

fn read_page(path: &Path) -> Result<Option<String>, PageError> {
    match fs::read_to_string(path) {
        Ok(html) => Ok(Some(html)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PageError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn summarize(pair: &PagePair, fr_html: &str, en_html: &str) -> PairSummary {
    PairSummary {
        key: pair.key.to_owned(),
        fr_file: PathBuf::from(pair.fr),
        en_file: PathBuf::from(pair.en),
        output: PathBuf::from(pair.output),
        fr_title: extract_title(fr_html).to_owned(),
        en_title: extract_title(en_html).to_owned(),
        fr_nav_length: extract_nav(fr_html).chars().count(),
        en_nav_length: extract_nav(en_html).chars().count(),
        fr_main_length: extract_main(fr_html).chars().count(),
        en_main_length: extract_main(en_html).chars().count(),
    }
}

/// Summarize every known page pair under `root`.
///
/// Missing pages mark their pair as missing. A page that exists but cannot
/// be read is recorded as a failure and the survey goes on.
#[must_use]
pub fn merge_report(root: &Path) -> MergeReport {
    let mut report = MergeReport::default();
    for pair in PAGE_PAIRS {
        let fr = read_page(&root.join(pair.fr));
        let en = read_page(&root.join(pair.en));
        let (fr, en) = match (fr, en) {
            (Ok(fr), Ok(en)) => (fr, en),
            (fr, en) => {
                for (name, err) in [(pair.fr, fr.err()), (pair.en, en.err())] {
                    if let Some(err) = err {
                        warn!(key = pair.key, file = name, error = %err, "cannot read page");
                        report
                            .failures
                            .push(FileFailure::new(PathBuf::from(name), err.to_string()));
                    }
                }
                continue;
            }
        };
        let (Some(fr_html), Some(en_html)) = (fr, en) else {
            warn!(key = pair.key, fr = pair.fr, en = pair.en, "missing files for pair");
            report.missing.push(pair.key.to_owned());
            continue;
        };
        let summary = summarize(pair, &fr_html, &en_html);
        debug!(
            key = pair.key,
            fr_main = summary.fr_main_length,
            en_main = summary.en_main_length,
            "pair surveyed"
        );
        report.pairs.push(summary);
    }
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const PAGE: &str = "<html><head><title>Glossaire</title></head><body>\n\
                        <nav><ul><li>a</li></ul></nav>\n\
                        <main class=\"content\">\n  <p>\u{e9}t\u{e9}</p>\n</main>\n</body></html>";

    #[test]
    fn test_extractors() {
        assert_eq!(extract_title(PAGE), "Glossaire");
        assert_eq!(extract_nav(PAGE), "<nav><ul><li>a</li></ul></nav>");
        assert_eq!(extract_main(PAGE), "<p>\u{e9}t\u{e9}</p>");
    }

    #[test]
    fn test_extractors_on_bare_page() {
        assert_eq!(extract_title("<p>x</p>"), "");
        assert_eq!(extract_nav("<p>x</p>"), "");
        assert_eq!(extract_main("<p>x</p>"), "");
    }

    #[test]
    fn test_lengths_count_characters() {
        let summary = summarize(&PAGE_PAIRS[0], PAGE, PAGE);
        assert_eq!(summary.fr_main_length, 10);
        assert_eq!(summary.en_nav_length, 30);
        assert_eq!(summary.output, PathBuf::from("glossary.html"));
    }
}
