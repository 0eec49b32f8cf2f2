//! Reformatter for the legacy "fiche détaillée" pages under `details/`.
//!
//! The legacy pages are word-processor exports: a couple of centred
//! paragraphs for the names, images wrapped in paragraphs followed by caption
//! paragraphs, justified body text and a trailing references list. Each page
//! is rebuilt into figures, a `main-text` block and a `references-section`.

use std::fs;
use std::path::{Path, PathBuf};

use kuchikiki::NodeRef;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::dom::{
    attr, body, clear_attributes, html_attributes, is_element, next_paragraph, outer_html,
    parent_paragraph, parse, previous_paragraph, select_all, select_first, stripped_text,
};
use crate::error::PageError;
use crate::markup::{escape, render_container, render_document, render_figure, render_head};
use crate::report::{BatchReport, FileFailure};

/// Heading of the rebuilt references block.
const REFERENCES_HEADING: &str = "R\u{e9}f\u{e9}rences";

/// Options of a `details/` reformatting run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct DetailsConfig {
    /// Directory of detail pages.
    pub dir: PathBuf,
    /// Page whose first `<style>` is copied into every rebuilt page.
    pub template: PathBuf,
    /// File names left untouched.
    pub ignore: Vec<String>,
}

impl Default for DetailsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("details"),
            template: PathBuf::from("details/Entre08.html"),
            ignore: vec!["Entre03.html".to_owned(), "Entre08.html".to_owned()],
        }
    }
}

impl DetailsConfig {
    /// Resolve relative paths against `root`.
    #[must_use]
    pub fn rooted_at(mut self, root: &Path) -> Self {
        self.dir = root.join(&self.dir);
        self.template = root.join(&self.template);
        self
    }
}

/// First `<style>` element of the template page, as HTML.
///
/// # Errors
///
/// Returns [`PageError::TemplateNotFound`] if the template does not exist.
pub fn template_style(template: &Path) -> Result<Option<String>, PageError> {
    let html = fs::read_to_string(template).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            PageError::TemplateNotFound(template.to_path_buf())
        } else {
            PageError::Io {
                path: template.to_path_buf(),
                source,
            }
        }
    })?;
    Ok(select_first(&parse(&html), "style").map(|style| outer_html(&style)))
}

/// French and English names from the first centred paragraphs, which are
/// removed from the document.
fn take_names(body: &NodeRef) -> (String, String) {
    let centred: Vec<NodeRef> = select_all(body, "p[align=\"center\"]")
        .into_iter()
        .take(3)
        .collect();
    let Some((french_tag, rest)) = centred.split_first() else {
        return (String::new(), String::new());
    };
    let english_tag = rest
        .iter()
        .find(|p| p.text_contents().contains("name:"))
        .or_else(|| rest.first());

    let french = stripped_text(french_tag).replace('\n', " ");
    french_tag.detach();

    let english = english_tag.map_or_else(String::new, |tag| {
        let text = stripped_text(tag).replace('\n', " ");
        tag.detach();
        if text.contains("name:") {
            text.split("name:").nth(1).unwrap_or_default().trim().to_owned()
        } else {
            text
        }
    });
    (french, english)
}

/// Page title: `"<fr> / <en>"`, or the file name when a name is missing.
fn page_title(french: &str, english: &str, file_name: &str) -> String {
    if french.is_empty() || english.is_empty() {
        file_name.to_owned()
    } else {
        format!("{french} / {english}")
    }
}

/// Caption paragraphs after an image paragraph, up to a source link or the
/// first justified paragraph. Consumed paragraphs are detached.
fn take_caption(image_paragraph: &NodeRef) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut source: Option<(String, String)> = None;

    let mut next = next_paragraph(image_paragraph);
    while let Some(p) = next {
        let href = select_first(&p, "a").and_then(|a| attr(&a, "href"));
        if let Some(href) = href.filter(|h| h != "about:blank") {
            let mut text = "Source".to_owned();
            if let Some(label) = previous_paragraph(&p)
                && label.text_contents().contains("Source")
            {
                text = stripped_text(&label);
                label.detach();
            }
            source = Some((href, text));
            p.detach();
            break;
        }
        if attr(&p, "align").as_deref() == Some("justify") {
            break;
        }
        parts.push(stripped_text(&p));
        next = next_paragraph(&p);
        p.detach();
    }

    let mut caption = escape(&parts.join(" "));
    if let Some((href, text)) = &source {
        caption.push_str("<br><a href=\"");
        caption.push_str(&escape(href));
        caption.push_str("\">");
        caption.push_str(&escape(text));
        caption.push_str("</a>");
    }
    (!parts.is_empty() || source.is_some()).then_some(caption)
}

fn take_figures(body: &NodeRef) -> Vec<String> {
    let mut figures = Vec::new();
    for img in select_all(body, "img") {
        let Some(src) = attr(&img, "src") else {
            debug!("skipping image with no src attribute");
            continue;
        };
        let alt = attr(&img, "alt").unwrap_or_default();
        debug!(src = %src, "processing image");

        let caption = match parent_paragraph(&img) {
            Some(parent) if next_paragraph(&parent).is_some() => {
                let caption = take_caption(&parent);
                parent.detach();
                caption
            }
            _ => None,
        };
        figures.push(render_figure(&src, &alt, caption.as_deref()));
    }
    figures
}

fn take_main_text(body: &NodeRef) -> Vec<String> {
    select_all(body, "p[align=\"justify\"]")
        .into_iter()
        .map(|p| {
            p.detach();
            outer_html(&p)
        })
        .collect()
}

fn take_references(body: &NodeRef) -> Vec<String> {
    let Some(start) = select_all(body, "p")
        .into_iter()
        .find(|p| p.text_contents().contains("References"))
    else {
        return Vec::new();
    };
    let following: Vec<NodeRef> = start
        .following_siblings()
        .filter(|n| is_element(n, "p"))
        .collect();
    start.detach();
    following
        .into_iter()
        .map(|p| {
            clear_attributes(&p);
            p.detach();
            outer_html(&p)
        })
        .collect()
}

/// Rebuild one legacy detail page.
///
/// `style` is the template `<style>` element; `file_name` is the title
/// fallback.
#[must_use]
pub fn format_legacy_page(html: &str, file_name: &str, style: Option<&str>) -> String {
    let document = parse(html);
    let body = body(&document);

    let (french, english) = take_names(&body);
    let title = page_title(&french, &english, file_name);
    debug!(title = %title, "title set");

    let mut blocks = take_figures(&body);

    let main_text = take_main_text(&body);
    if !main_text.is_empty() {
        blocks.push(render_container("div", "main-text", &main_text));
    }

    let references = take_references(&body);
    if !references.is_empty() {
        let mut children = vec![format!("<h2>{REFERENCES_HEADING}</h2>")];
        children.extend(references);
        blocks.push(render_container("div", "references-section", &children));
    }

    render_document(
        &html_attributes(&document),
        &render_head(&title, style),
        &blocks,
    )
}

/// Detail pages to rebuild: `*.html` directly in `dir`, not ignored, sorted
/// by file name. Walk errors are returned alongside.
fn detail_pages(config: &DetailsConfig) -> (Vec<PathBuf>, Vec<FileFailure>) {
    let mut pages = Vec::new();
    let mut failures = Vec::new();
    for entry in WalkDir::new(&config.dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                let path = err
                    .path()
                    .map_or_else(|| config.dir.clone(), Path::to_path_buf);
                failures.push(FileFailure::new(path, err.to_string()));
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file()
            && name.ends_with(".html")
            && !config.ignore.iter().any(|i| *i == name)
        {
            pages.push(entry.into_path());
        }
    }
    (pages, failures)
}

fn format_file(path: &Path, style: Option<&str>) -> Result<bool, PageError> {
    let io_err = |source| PageError::Io {
        path: path.to_path_buf(),
        source,
    };
    let original = fs::read_to_string(path).map_err(io_err)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let formatted = format_legacy_page(&original, &file_name, style);
    if formatted == original {
        return Ok(false);
    }
    fs::write(path, formatted).map_err(io_err)?;
    Ok(true)
}

/// Rebuild every detail page in place.
///
/// # Errors
///
/// Fails before touching any page when the template is missing or the
/// directory does not exist. Per-page failures are reported, not returned.
pub fn format_details_dir(config: &DetailsConfig) -> Result<BatchReport, PageError> {
    let style = template_style(&config.template)?;
    if !config.dir.is_dir() {
        return Err(PageError::NotADirectory(config.dir.clone()));
    }

    let (pages, failures) = detail_pages(config);
    let mut report = BatchReport::new("format-details");
    report.failures = failures;

    for page in pages {
        info!(file = %page.display(), "formatting");
        match format_file(&page, style.as_deref()) {
            Ok(true) => report.modified.push(page),
            Ok(false) => report.unchanged.push(page),
            Err(e) => {
                warn!(file = %page.display(), error = %e, "formatting failed");
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

    const PAGE: &str = r#"<html lang="fr"><head><title>old</title><style>old{}</style></head><body>
<p align="center">Baie de la
Recherche</p>
<p align="center">Australian name: Recherche Bay</p>
<p align="center">Tasmanie</p>
<p><img src="img/e001.jpg" alt="Carte"></p>
<p>Fig. 1 Carte de la baie</p>
<p>Source : Trove</p>
<p><a href="https://trove.nla.gov.au/1">lien</a></p>
<p align="justify">La baie fut nomm&eacute;e en 1792.</p>
<p align="justify">Second paragraphe.</p>
<p>References</p>
<p class="ref" align="left">Duyker, 2003.</p>
<p>Horner, 1995.</p>
</body></html>"#;

    #[test]
    fn test_title_from_centred_paragraphs() {
        let out = format_legacy_page(PAGE, "Entre01.html", None);
        assert!(out.contains("<title>Baie de la Recherche / Recherche Bay</title>"));
        assert!(!out.contains("Australian name:"));
        assert!(out.starts_with("<!DOCTYPE html>\n<html lang=\"fr\">"));
    }

    #[test]
    fn test_title_falls_back_to_file_name() {
        let out = format_legacy_page("<body><p>text</p></body>", "Entre05.html", None);
        assert!(out.contains("<title>Entre05.html</title>"));
    }

    #[test]
    fn test_english_name_defaults_to_second_paragraph() {
        let html = r#"<body><p align="center">Cap</p><p align="center">Cape</p></body>"#;
        let out = format_legacy_page(html, "x.html", None);
        assert!(out.contains("<title>Cap / Cape</title>"));
    }

    #[test]
    fn test_figure_caption_and_source_link() {
        let out = format_legacy_page(PAGE, "Entre01.html", None);
        assert!(out.contains("<img src=\"img/e001.jpg\" alt=\"Carte\">"));
        // the "Source" label paragraph is consumed as caption text before
        // the link is reached, so the link keeps the default label
        assert!(out.contains(
            "<figcaption>Fig. 1 Carte de la baie Source : Trove<br>\
             <a href=\"https://trove.nla.gov.au/1\">Source</a></figcaption>"
        ));
        assert!(!out.contains(">lien<"));
    }

    #[test]
    fn test_main_text_and_references() {
        let out = format_legacy_page(PAGE, "Entre01.html", None);
        let main = out.find("<div class=\"main-text\">").unwrap();
        let refs = out.find("<div class=\"references-section\">").unwrap();
        assert!(main < refs);
        assert!(out.contains("<p align=\"justify\">La baie fut nomm\u{e9}e en 1792.</p>"));
        assert!(out.contains("<h2>R\u{e9}f\u{e9}rences</h2>"));
        assert!(out.contains("<p>Duyker, 2003.</p>"));
        assert!(out.contains("<p>Horner, 1995.</p>"));
        assert!(!out.contains("<p>References</p>"));
    }

    #[test]
    fn test_head_uses_template_style() {
        let out = format_legacy_page(PAGE, "Entre01.html", Some("<style>body{}</style>"));
        assert!(out.contains("<style>body{}</style>"));
        assert!(!out.contains("old{}"));
        assert!(out.contains("<meta charset=\"UTF-8\">"));
    }

    #[test]
    fn test_image_without_src_is_skipped() {
        let out = format_legacy_page("<body><p><img alt=\"x\"></p></body>", "a.html", None);
        assert!(!out.contains("<figure>"));
    }

    #[test]
    fn test_no_references_section_without_entries() {
        let out = format_legacy_page("<body><p>References</p></body>", "a.html", None);
        assert!(!out.contains("references-section"));
    }
}
