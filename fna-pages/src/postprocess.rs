//! Rebuild a detail page from the text of its source document.
//!
//! The HTML export of a word-processor document keeps the images but mangles
//! the text. The text is re-read from the source document through
//! `textutil`, classified line by line into titles, figure legends, body
//! paragraphs and references, and the page is rebuilt around the original
//! images.

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use fna_media::ToolRunner;
use tracing::{debug, info};

use crate::dom::{attr, body, html_attributes, parse, select_all};
use crate::error::PageError;
use crate::markup::{
    escape, linkify, render_container, render_document, render_figure, render_head, style_element,
};

/// Stylesheet embedded in every rebuilt page.
pub const DOCUMENT_CSS: &str = include_str!("document.css");

/// Text of a source document, split into its parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    /// Leading lines before the first blank line.
    pub titles: Vec<String>,
    /// Legend blocks, one per `Fig…`/`Source…` run.
    pub legends: Vec<Vec<String>>,
    /// Body paragraphs, lines joined by a space.
    pub body: Vec<String>,
    /// The `References` line followed by each reference.
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Titles,
    PreFigure,
    Legend,
    Body,
    References,
}

fn opens_legend(lower: &str) -> bool {
    lower.starts_with("fig") || lower.starts_with("source")
}

/// Classify the lines of a source document.
#[must_use]
pub fn extract_sections<S: AsRef<str>>(lines: &[S]) -> Sections {
    let mut sections = Sections::default();
    let mut state = State::Titles;
    let mut legend: Vec<String> = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();

    for raw in lines {
        let line = raw.as_ref().trim();
        let lower = line.to_lowercase();
        let starts_references = lower.starts_with("references");

        match state {
            State::Titles => {
                if !line.is_empty() {
                    sections.titles.push(line.to_owned());
                } else if !sections.titles.is_empty() {
                    state = State::PreFigure;
                }
            }
            State::PreFigure => {
                if line.is_empty() {
                    continue;
                }
                if opens_legend(&lower) {
                    legend = vec![line.to_owned()];
                    state = State::Legend;
                } else if starts_references {
                    sections.references.push(line.to_owned());
                    state = State::References;
                } else {
                    paragraph = vec![line.to_owned()];
                    state = State::Body;
                }
            }
            State::Legend => {
                if line.is_empty() {
                    flush_legend(&mut sections, &mut legend);
                    state = State::PreFigure;
                } else if starts_references {
                    flush_legend(&mut sections, &mut legend);
                    sections.references.push(line.to_owned());
                    state = State::References;
                } else if opens_legend(&lower) {
                    flush_legend(&mut sections, &mut legend);
                    legend.push(line.to_owned());
                } else {
                    legend.push(line.to_owned());
                }
            }
            State::Body => {
                if line.is_empty() {
                    flush_paragraph(&mut sections, &mut paragraph);
                } else if starts_references {
                    flush_paragraph(&mut sections, &mut paragraph);
                    sections.references.push(line.to_owned());
                    state = State::References;
                } else {
                    paragraph.push(line.to_owned());
                }
            }
            State::References => {
                if !line.is_empty() {
                    sections.references.push(line.to_owned());
                }
            }
        }
    }

    flush_legend(&mut sections, &mut legend);
    flush_paragraph(&mut sections, &mut paragraph);
    sections
}

fn flush_legend(sections: &mut Sections, legend: &mut Vec<String>) {
    if !legend.is_empty() {
        sections.legends.push(std::mem::take(legend));
    }
}

fn flush_paragraph(sections: &mut Sections, paragraph: &mut Vec<String>) {
    if !paragraph.is_empty() {
        sections.body.push(std::mem::take(paragraph).join(" "));
    }
}

/// Spread legend blocks over `n_images` images, in order.
///
/// Each image takes blocks until the remaining blocks are just enough to
/// give every remaining image one; the last image takes what is left.
/// Empty blocks are skipped.
#[must_use]
pub fn merge_legends(blocks: &[Vec<String>], n_images: usize) -> Vec<Vec<String>> {
    let mut merged: Vec<Vec<String>> = vec![Vec::new(); n_images];
    let mut next_block = 0;

    for (image, legend) in merged.iter_mut().enumerate() {
        while let Some(block) = blocks.get(next_block) {
            next_block += 1;
            if block.is_empty() {
                continue;
            }
            legend.extend(block.iter().cloned());

            let blocks_left = blocks.len() - next_block;
            let images_left = n_images - image - 1;
            if blocks_left <= images_left {
                break;
            }
        }
    }
    merged
}

/// `<title>` text: the first two titles joined by ` / `, the only title,
/// or the file name.
#[must_use]
pub fn document_title(titles: &[String], file_name: &str) -> String {
    match titles {
        [] => file_name.to_owned(),
        [only] => only.clone(),
        [first, second, ..] => format!("{first} / {second}"),
    }
}

/// Titles shown in the page header.
///
/// The first title is already in `<title>`. If the next one carries the
/// English name (`… name: …`) it is dropped as well.
#[must_use]
pub fn display_titles(titles: &[String]) -> Vec<String> {
    let rest = titles.get(1..).unwrap_or_default();
    match rest.split_first() {
        Some((first, tail)) if first.to_lowercase().contains("name") => tail.to_vec(),
        _ => rest.to_vec(),
    }
}

fn paragraphs(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|line| format!("<p>{}</p>", linkify(line)))
        .collect()
}

fn render_references(references: &[String]) -> Option<String> {
    let (first, items) = references.split_first()?;
    let heading = match first.trim_end_matches(':') {
        "" => "References",
        text => text,
    };
    let mut children = vec![format!("<h2>{}</h2>", escape(heading))];
    if !items.is_empty() {
        let mut list = vec!["<ul>".to_owned()];
        list.extend(
            items
                .iter()
                .filter(|item| !item.trim().is_empty())
                .map(|item| format!("  <li>{}</li>", linkify(item))),
        );
        list.push("</ul>".to_owned());
        children.push(list.join("\n"));
    }
    Some(render_container(
        "section",
        "references-section",
        &children,
    ))
}

/// Rebuild a page from its HTML (for the images) and the classified text.
#[must_use]
pub fn build_document(html: &str, file_name: &str, sections: &Sections) -> String {
    let document = parse(html);
    let title = document_title(&sections.titles, file_name);

    let mut blocks = Vec::new();

    let header = display_titles(&sections.titles);
    if !header.is_empty() {
        blocks.push(render_container(
            "header",
            "document-header",
            &paragraphs(&header),
        ));
    }

    let images = select_all(&body(&document), "img");
    let legends = merge_legends(&sections.legends, images.len());
    for (img, legend) in images.iter().zip(&legends) {
        let Some(src) = attr(img, "src") else {
            continue;
        };
        let alt = attr(img, "alt").unwrap_or_default();
        let caption = (!legend.is_empty()).then(|| paragraphs(legend).concat());
        blocks.push(render_figure(&src, &alt, caption.as_deref()));
    }

    let body_paragraphs: Vec<String> = sections
        .body
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("<p>{}</p>", linkify(p)))
        .collect();
    if !body_paragraphs.is_empty() {
        blocks.push(render_container("div", "main-text", &body_paragraphs));
    }

    if let Some(references) = render_references(&sections.references) {
        blocks.push(references);
    }

    render_document(
        &html_attributes(&document),
        &render_head(&title, Some(&style_element(DOCUMENT_CSS))),
        &blocks,
    )
}

/// Plain-text lines of a document, as converted by `textutil`.
///
/// # Errors
///
/// Returns an error if `textutil` is missing or fails.
pub fn textutil_lines(source: &Path, runner: &dyn ToolRunner) -> Result<Vec<String>, PageError> {
    let args = [
        OsString::from("-convert"),
        OsString::from("txt"),
        OsString::from("-stdout"),
        source.as_os_str().to_owned(),
    ];
    let output = runner.run("textutil", &args)?;
    Ok(split_lines(&output.stdout))
}

/// Characters that end a line of a text export, besides `\r\n`.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{b}', '\u{c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}',
    '\u{2029}',
];

/// Split text on every line boundary, including soft line breaks and page
/// breaks. `\r\n` counts as one break and a trailing break adds no line.
fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = text;
    while let Some((line, tail)) = rest.split_once(LINE_BREAKS) {
        lines.push(line.to_owned());
        let after_cr = rest.as_bytes().get(line.len()) == Some(&b'\r');
        rest = if after_cr {
            tail.strip_prefix('\n').unwrap_or(tail)
        } else {
            tail
        };
    }
    if !rest.is_empty() {
        lines.push(rest.to_owned());
    }
    lines
}

/// Rebuild `html_path` in place from the text of `source_doc`.
///
/// # Errors
///
/// Returns [`PageError::NotFound`] when either file is missing, and any
/// conversion or I/O failure.
pub fn postprocess(
    source_doc: &Path,
    html_path: &Path,
    runner: &dyn ToolRunner,
) -> Result<(), PageError> {
    for path in [source_doc, html_path] {
        if !path.exists() {
            return Err(PageError::NotFound(path.to_path_buf()));
        }
    }

    let lines = textutil_lines(source_doc, runner)?;
    let sections = extract_sections(&lines);
    debug!(
        titles = sections.titles.len(),
        legends = sections.legends.len(),
        paragraphs = sections.body.len(),
        references = sections.references.len(),
        "sections extracted"
    );

    let io_err = |source| PageError::Io {
        path: html_path.to_path_buf(),
        source,
    };
    let html = fs::read_to_string(html_path).map_err(io_err)?;
    let file_name = html_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    fs::write(html_path, build_document(&html, &file_name, &sections)).map_err(io_err)?;
    info!(file = %html_path.display(), "page rebuilt");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    const TEXT: &[&str] = &[
        "Baie de la Recherche",
        "Australian name: Recherche Bay",
        "Tasmanie",
        "",
        "Fig. 1 Carte de la baie",
        "Source: https://trove.nla.gov.au/1.",
        "",
        "La baie fut nomm\u{e9}e",
        "en 1792.",
        "",
        "Fig. 2 Vue",
        "Second paragraphe.",
        "",
        "References:",
        "Duyker, 2003.",
        "",
        "Horner, 1995.",
    ];

    #[test]
    fn test_split_lines_on_soft_and_page_breaks() {
        assert_eq!(
            split_lines("Fig. 1 Carte\u{2028}Source: Trove\u{c}Texte\n"),
            strings(&["Fig. 1 Carte", "Source: Trove", "Texte"])
        );
        assert_eq!(split_lines("a\r\nb\rc\n\nd"), strings(&["a", "b", "c", "", "d"]));
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_extract_sections() {
        let sections = extract_sections(TEXT);
        assert_eq!(
            sections.titles,
            strings(&[
                "Baie de la Recherche",
                "Australian name: Recherche Bay",
                "Tasmanie"
            ])
        );
        assert_eq!(
            sections.legends,
            vec![
                strings(&["Fig. 1 Carte de la baie"]),
                strings(&["Source: https://trove.nla.gov.au/1."]),
            ]
        );
        // once in the body, figure-like lines are plain text
        assert_eq!(
            sections.body,
            strings(&[
                "La baie fut nomm\u{e9}e en 1792.",
                "Fig. 2 Vue Second paragraphe."
            ])
        );
        assert_eq!(
            sections.references,
            strings(&["References:", "Duyker, 2003.", "Horner, 1995."])
        );
    }

    #[test]
    fn test_leading_blank_lines_before_titles() {
        let sections = extract_sections(&["", "  ", "Titre", "", "Texte"]);
        assert_eq!(sections.titles, strings(&["Titre"]));
        assert_eq!(sections.body, strings(&["Texte"]));
    }

    #[test]
    fn test_open_blocks_flushed_at_end() {
        let sections = extract_sections(&["T", "", "Fig. 1", "suite"]);
        assert_eq!(sections.legends, vec![strings(&["Fig. 1", "suite"])]);
        let sections = extract_sections(&["T", "", "Un", "deux"]);
        assert_eq!(sections.body, strings(&["Un deux"]));
    }

    #[test]
    fn test_merge_legends_greedy() {
        let blocks = vec![
            strings(&["a"]),
            strings(&["b"]),
            Vec::new(),
            strings(&["c"]),
            strings(&["d"]),
        ];
        let merged = merge_legends(&blocks, 2);
        assert_eq!(merged, vec![strings(&["a", "b", "c"]), strings(&["d"])]);
    }

    #[test]
    fn test_merge_legends_more_images_than_blocks() {
        let blocks = vec![strings(&["a"]), strings(&["b"])];
        let merged = merge_legends(&blocks, 3);
        assert_eq!(merged, vec![strings(&["a"]), strings(&["b"]), Vec::new()]);
    }

    #[test]
    fn test_merge_legends_never_more_groups_than_images() {
        let blocks = vec![strings(&["a"]), strings(&["b"]), strings(&["c"])];
        assert!(merge_legends(&blocks, 0).is_empty());
        assert_eq!(merge_legends(&blocks, 1), vec![strings(&["a", "b", "c"])]);
    }

    #[test]
    fn test_titles() {
        let titles = strings(&["Baie", "Australian name: Bay", "Tasmanie"]);
        assert_eq!(document_title(&titles, "x.html"), "Baie / Australian name: Bay");
        assert_eq!(display_titles(&titles), strings(&["Tasmanie"]));
        assert_eq!(document_title(&[], "x.html"), "x.html");
        assert_eq!(display_titles(&strings(&["Seul"])), Vec::<String>::new());
        assert_eq!(
            display_titles(&strings(&["Cap", "Tasmanie", "1802"])),
            strings(&["Tasmanie", "1802"])
        );
    }

    #[test]
    fn test_build_document() {
        let html = r#"<html lang="fr"><head><title>t</title></head><body>
<p><img src="a.jpg" alt="A"></p><p><img src="b.jpg"></p></body></html>"#;
        let sections = extract_sections(TEXT);
        let out = build_document(html, "Entre01.html", &sections);

        assert!(out.contains(
            "<title>Baie de la Recherche / Australian name: Recherche Bay</title>"
        ));
        assert!(out.contains("<header class=\"document-header\">\n  <p>Tasmanie</p>\n</header>"));
        assert!(out.contains("<figcaption><p>Fig. 1 Carte de la baie</p></figcaption>"));
        assert!(out.contains("<img src=\"b.jpg\" alt=\"\">"));
        assert!(out.contains(
            "<figcaption><p>Source: \
             <a href=\"https://trove.nla.gov.au/1\">https://trove.nla.gov.au/1</a>.</p></figcaption>"
        ));
        assert!(out.contains("<p>La baie fut nomm\u{e9}e en 1792.</p>"));
        assert!(out.contains("<h2>References</h2>"));
        assert!(out.contains("  <li>Duyker, 2003.</li>"));
        assert!(out.contains(".references-section ul"));
    }

    #[test]
    fn test_references_heading_fallback() {
        let section = render_references(&strings(&[":"])).unwrap();
        assert!(section.contains("<h2>References</h2>"));
        assert!(!section.contains("<ul>"));
        assert!(render_references(&[]).is_none());
    }
}
