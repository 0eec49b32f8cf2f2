//! Text patches applied to the navigation menu of the site pages.
//!
//! These are plain string/regex rewrites: the pages are hand-written HTML
//! and must come out byte-identical outside the patched spans.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use tracing::{info, warn};

use crate::error::PageError;
use crate::report::{BatchReport, FileFailure};

/// Menu item after which the "about" item goes.
pub const RESOURCES_ITEM: &str =
    r#"<li><a href="resources.html" id="nav-resources" data-i18n="nav-resources">Ressources</a></li>"#;

/// The "about" menu item.
pub const ABOUT_ITEM: &str = "<li><a href=\"presentation.html\" id=\"nav-about\" \
                              data-i18n=\"nav-about\">\u{c0} propos</a></li>";

/// Placeholder filled client-side (or by [`inject_nav`]) with the shared menu.
pub const INCLUDE_PLACEHOLDER: &str = "<div data-include-nav></div>";

/// Shared menu markup, relative to the site root.
pub const NAV_PARTIAL: &str = "partials/nav.html";

/// Pages that each carried their own copy of the menu.
pub const MENU_PAGES: &[&str] = &[
    "index.html",
    "map_dentrecasteaux.html",
    "map_baudin.html",
    "resources.html",
    "expert.html",
    "glossaryF.html",
    "glossaryE.html",
    "acteursF.html",
    "acteursE.html",
    "cartesF.html",
    "cartesE.html",
    "SourcesF.html",
    "SourcesE.html",
];

/// Resource pages whose inline styles still hold menu rules.
pub const STYLED_PAGES: &[&str] = &[
    "glossaryF.html",
    "glossaryE.html",
    "acteursF.html",
    "acteursE.html",
    "cartesF.html",
    "cartesE.html",
    "SourcesF.html",
    "SourcesE.html",
    "resources.html",
];

/// Bilingual pages that load the menu through the include placeholder.
pub const INCLUDE_PAGES: &[&str] = &[
    "index.html",
    "expert.html",
    "resources.html",
    "glossary.html",
    "actors.html",
    "maps.html",
    "sources.html",
];

fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid navigation regex `{pattern}`: {err}"),
    }
}

/// Menu rules as they appear in page-level `<style>` blocks.
const NAV_RULES: &[&str] = &[
    r"nav\s*\{[^}]+\}",
    r"nav\s+ul\s*\{[^}]+\}",
    r"nav\s+ul\s+li\s+a\s*\{[^}]+\}",
    r"nav\s+ul\s+li\s+a\.active[^}]+\}",
    r"nav\s+ul\s+li\s+a:hover[^}]+\}",
    r"nav\s+ul\s+li\s+a\.active,\s*nav\s+ul\s+li\s+a:hover\s*\{[^}]+\}",
    r"\.lang-switcher\s*\{[^}]+\}",
    r"\.lang-switcher\s+button\s*\{[^}]+\}",
    r"\.lang-switcher\s+button:hover\s*\{[^}]+\}",
    r"\.lang-switcher\s+button\.active\s*\{[^}]+\}",
    r"\.lang-switcher\s+button\.active:hover\s*\{[^}]+\}",
    r"\.lang-switcher\s+button:focus-visible\s*\{[^}]+\}",
    r"\.lang-switcher\s+button\s+img\s*\{[^}]+\}",
];

const NAV_HEIGHT_RULE: &str = r":root\s*\{\s*--nav-height:\s*[^}]+\}";

/// Rules removed from inside `@media` blocks.
const MEDIA_RULES: &[&str] = &[
    r":root\s*\{\s*--nav-height:[^}]+\}",
    r"nav\s*\{[^}]+\}",
    r"nav\s+ul\s*\{[^}]+\}",
    r"nav\s+ul\s+li\s+a\s*\{[^}]+\}",
    r"\.lang-switcher\s*\{[^}]+\}",
    r"\.lang-switcher\s+button\s*\{[^}]+\}",
    r"\.lang-switcher\s+button\s+img\s*\{[^}]+\}",
    r"body\s*\{\s*padding-top:\s*var\(--nav-height\)[^}]*\}",
];

/// Rules and their trailing whitespace, for [`remove_nav_styles`].
static STRIP_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    std::iter::once(NAV_HEIGHT_RULE)
        .chain(NAV_RULES.iter().copied())
        .map(|rule| compile(&format!(r"{rule}\s*")))
        .collect()
});

/// Rules with surrounding whitespace, for [`clean_nav_styles`].
static CLEAN_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    NAV_RULES
        .iter()
        .map(|rule| compile(&format!(r"\s*{rule}\s*")))
        .collect()
});

static MEDIA_RULE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    MEDIA_RULES
        .iter()
        .map(|rule| compile(&format!(r"\s*{rule}\s*")))
        .collect()
});

/// An `@media (...) { ... }` block with one level of nested rules.
static MEDIA_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"@media\s*\([^)]+\)\s*\{([^{}]*(?:\{[^{}]*\}[^{}]*)*)\}")
});

static EXTRA_BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| compile(r"\n\s*\n\s*\n+"));

static DUPLICATE_ABOUT: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"\s*{}", regex::escape(ABOUT_ITEM))));

static NAV_BLOCK: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)<nav>.*?</nav>"));

static NAV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)<div\s+data-include-nav[^>]*>\s*</div>"));

/// Insert the "about" item after every resources item.
#[must_use]
pub fn add_about_menu(content: &str) -> String {
    content.replace(
        RESOURCES_ITEM,
        &format!("{RESOURCES_ITEM}\n        {ABOUT_ITEM}"),
    )
}

/// Keep only the first "about" item, dropping later copies together with
/// the whitespace before them.
#[must_use]
pub fn remove_duplicate_about(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for m in DUPLICATE_ABOUT.find_iter(content).skip(1) {
        out.push_str(&content[last..m.start()]);
        last = m.end();
    }
    out.push_str(&content[last..]);
    out
}

fn collapse_blank_lines(content: &str) -> String {
    EXTRA_BLANK_LINES.replace_all(content, "\n\n").into_owned()
}

/// Remove inline menu and language-switcher rules.
#[must_use]
pub fn remove_nav_styles(content: &str) -> String {
    let stripped = STRIP_RULES.iter().fold(content.to_owned(), |acc, rule| {
        rule.replace_all(&acc, "").into_owned()
    });
    collapse_blank_lines(&stripped)
}

fn clean_media_block(caps: &regex::Captures<'_>) -> String {
    let inner = caps.get(1).map_or("", |m| m.as_str());
    let cleaned = MEDIA_RULE_PATTERNS.iter().fold(inner.to_owned(), |acc, rule| {
        rule.replace_all(&acc, "").into_owned()
    });
    if cleaned.trim().is_empty() {
        return String::new();
    }
    let whole = caps.get(0).map_or("", |m| m.as_str());
    let query = whole
        .split('{')
        .next()
        .and_then(|head| head.split("@media").nth(1))
        .unwrap_or_default();
    format!("@media {} {{{cleaned}}}", query.trim())
}

/// Remove menu rules, each replaced by a newline, and clean them out of
/// `@media` blocks too; media blocks left empty disappear.
#[must_use]
pub fn clean_nav_styles(content: &str) -> String {
    let stripped = CLEAN_RULES.iter().fold(content.to_owned(), |acc, rule| {
        rule.replace_all(&acc, "\n").into_owned()
    });
    let media_cleaned = MEDIA_BLOCK.replace_all(&stripped, clean_media_block);
    collapse_blank_lines(&media_cleaned)
}

/// Replace every `<nav>...</nav>` block with the include placeholder.
#[must_use]
pub fn replace_nav_with_include(content: &str) -> String {
    NAV_BLOCK
        .replace_all(content, NoExpand(INCLUDE_PLACEHOLDER))
        .into_owned()
}

/// Replace the first include placeholder with the menu markup.
#[must_use]
pub fn inject_nav(content: &str, nav_html: &str) -> String {
    NAV_PLACEHOLDER
        .replace(content, NoExpand(nav_html))
        .into_owned()
}

/// Read the shared menu, trimmed.
///
/// # Errors
///
/// Returns [`PageError::NavPartialNotFound`] when the partial is missing.
pub fn load_nav_partial(root: &Path) -> Result<String, PageError> {
    let path = root.join(NAV_PARTIAL);
    match fs::read_to_string(&path) {
        Ok(html) => Ok(html.trim().to_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PageError::NavPartialNotFound(path))
        }
        Err(source) => Err(PageError::Io { path, source }),
    }
}

/// One of the navigation patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPatch {
    AddAbout,
    DedupeAbout,
    StripStyles,
    CleanStyles,
    UseInclude,
    Inject,
}

impl NavPatch {
    /// Command-line name of the patch.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AddAbout => "add-about",
            Self::DedupeAbout => "dedupe-about",
            Self::StripStyles => "strip-styles",
            Self::CleanStyles => "clean-styles",
            Self::UseInclude => "use-include",
            Self::Inject => "inject",
        }
    }

    /// Pages patched when none are given.
    #[must_use]
    pub fn default_pages(self) -> &'static [&'static str] {
        match self {
            Self::AddAbout | Self::DedupeAbout | Self::StripStyles | Self::Inject => MENU_PAGES,
            Self::CleanStyles => STYLED_PAGES,
            Self::UseInclude => INCLUDE_PAGES,
        }
    }
}

impl fmt::Display for NavPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn transform(patch: NavPatch, content: &str, nav_html: &str) -> String {
    match patch {
        NavPatch::AddAbout => add_about_menu(content),
        NavPatch::DedupeAbout => remove_duplicate_about(content),
        NavPatch::StripStyles => remove_nav_styles(content),
        NavPatch::CleanStyles => clean_nav_styles(content),
        NavPatch::UseInclude => replace_nav_with_include(content),
        NavPatch::Inject => inject_nav(content, nav_html),
    }
}

fn patch_file(patch: NavPatch, path: &Path, nav_html: &str) -> Result<bool, PageError> {
    let io_err = |source| PageError::Io {
        path: path.to_path_buf(),
        source,
    };
    let content = fs::read_to_string(path).map_err(io_err)?;
    let patched = transform(patch, &content, nav_html);
    if patched == content {
        return Ok(false);
    }
    fs::write(path, patched).map_err(io_err)?;
    Ok(true)
}

/// Apply `patch` to `pages` (relative to `root`), or to the patch's
/// default pages when `pages` is empty.
///
/// # Errors
///
/// Only [`NavPatch::Inject`] fails as a whole, when the menu partial is
/// missing. Missing or unreadable pages are recorded in the report.
pub fn apply_patch(
    patch: NavPatch,
    root: &Path,
    pages: &[PathBuf],
) -> Result<BatchReport, PageError> {
    let nav_html = if patch == NavPatch::Inject {
        load_nav_partial(root)?
    } else {
        String::new()
    };
    let pages: Vec<PathBuf> = if pages.is_empty() {
        patch.default_pages().iter().map(PathBuf::from).collect()
    } else {
        pages.to_vec()
    };

    let mut report = BatchReport::new(&format!("nav {patch}"));
    for page in pages {
        let path = root.join(&page);
        if !path.exists() {
            warn!(file = %page.display(), "page not found, skipped");
            report.missing.push(page);
            continue;
        }
        match patch_file(patch, &path, &nav_html) {
            Ok(true) => {
                info!(file = %page.display(), patch = %patch, "patched");
                report.modified.push(page);
            }
            Ok(false) => {
                info!(file = %page.display(), patch = %patch, "no change");
                report.unchanged.push(page);
            }
            Err(e) => {
                warn!(file = %page.display(), error = %e, "patch failed");
                report.failures.push(FileFailure::new(page, e.to_string()));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn menu() -> String {
        format!("<ul>\n        {RESOURCES_ITEM}\n      </ul>")
    }

    #[test]
    fn test_add_about_after_resources() {
        let patched = add_about_menu(&menu());
        assert_eq!(
            patched,
            format!("<ul>\n        {RESOURCES_ITEM}\n        {ABOUT_ITEM}\n      </ul>")
        );
    }

    #[test]
    fn test_add_then_dedupe_is_stable() {
        let once = add_about_menu(&menu());
        let twice = add_about_menu(&once);
        assert_eq!(twice.matches(ABOUT_ITEM).count(), 2);
        assert_eq!(remove_duplicate_about(&twice), once);
        assert_eq!(remove_duplicate_about(&once), once);
    }

    #[test]
    fn test_remove_duplicate_about_keeps_first() {
        let content = format!("<ul>\n  {ABOUT_ITEM}\n  {ABOUT_ITEM}\n  {ABOUT_ITEM}\n</ul>");
        assert_eq!(
            remove_duplicate_about(&content),
            format!("<ul>\n  {ABOUT_ITEM}\n</ul>")
        );
    }

    #[test]
    fn test_remove_nav_styles() {
        let style = "<style>\n:root { --nav-height: 60px; }\nnav { position: fixed; }\n\
                     nav ul { display: flex; }\n.lang-switcher { gap: 4px; }\n\n\n\
                     h1 { color: red; }\n</style>";
        let cleaned = remove_nav_styles(style);
        assert_eq!(cleaned, "<style>\nh1 { color: red; }\n</style>");
    }

    #[test]
    fn test_clean_nav_styles_drops_empty_media_block() {
        let style = "<style>\n  h1 { color: red; }\n  nav { top: 0; }\n  \
                     @media (max-width: 600px) {\n    nav ul { display: block; }\n  }\n</style>";
        let cleaned = clean_nav_styles(style);
        assert!(!cleaned.contains("nav"));
        assert!(!cleaned.contains("@media"));
        assert!(cleaned.contains("h1 { color: red; }"));
    }

    #[test]
    fn test_clean_nav_styles_keeps_other_media_rules() {
        let style = "@media (max-width: 600px) {\n  h1 { font-size: 1em; }\n  \
                     .lang-switcher button img { width: 20px; }\n}";
        let cleaned = clean_nav_styles(style);
        assert!(cleaned.contains("h1 { font-size: 1em; }"));
        assert!(cleaned.contains("@media"));
        assert!(!cleaned.contains("lang-switcher"));
    }

    #[test]
    fn test_clean_nav_styles_normalizes_media_query_spacing() {
        let style = "@media  (max-width: 600px)   {\n  h1 { font-size: 1em; }\n}";
        let cleaned = clean_nav_styles(style);
        assert!(cleaned.starts_with("@media (max-width: 600px) {\n  h1"));
    }

    #[test]
    fn test_replace_nav_with_include() {
        let page = "<body>\n<nav>\n  <ul><li>a</li></ul>\n</nav>\n<main></main>\n</body>";
        let replaced = replace_nav_with_include(page);
        assert_eq!(
            replaced,
            "<body>\n<div data-include-nav></div>\n<main></main>\n</body>"
        );
        assert_eq!(replace_nav_with_include(&replaced), replaced);
    }

    #[test]
    fn test_inject_nav_first_placeholder_only() {
        let page = "<DIV data-include-nav class=\"x\">  </DIV>\n<div data-include-nav></div>";
        let injected = inject_nav(page, "<nav>$menu</nav>");
        assert_eq!(injected, "<nav>$menu</nav>\n<div data-include-nav></div>");
    }

    #[test]
    fn test_default_pages() {
        assert_eq!(NavPatch::AddAbout.default_pages().len(), 13);
        assert_eq!(NavPatch::CleanStyles.default_pages().len(), 9);
        assert!(NavPatch::UseInclude.default_pages().contains(&"glossary.html"));
        assert_eq!(NavPatch::UseInclude.to_string(), "use-include");
    }
}
