//! Small HTML writer for the rebuilt detail pages.
//!
//! Rebuilt pages are written as plain strings: every page gets the same
//! `<head>` and a body made of already-rendered blocks.

use std::sync::LazyLock;

use regex::Regex;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"https?://\S+") {
    Ok(regex) => regex,
    Err(err) => panic!("Invalid URL regex: {err}"),
});

/// Characters left outside a link when they end a URL.
const URL_TRAILING: &[char] = &['.', ',', ')', ';'];

/// Escape text for use in element content or a double-quoted attribute.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a line of text, turning `http(s)://` URLs into links.
///
/// Trailing `.`, `,`, `)` and `;` are not part of the link.
#[must_use]
pub fn linkify(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for m in URL_PATTERN.find_iter(line) {
        out.push_str(&escape(&line[last..m.start()]));
        let url = m.as_str();
        let link = url.trim_end_matches(URL_TRAILING);
        let trailing = &url[link.len()..];
        let link = escape(link);
        out.push_str("<a href=\"");
        out.push_str(&link);
        out.push_str("\">");
        out.push_str(&link);
        out.push_str("</a>");
        out.push_str(&escape(trailing));
        last = m.end();
    }
    out.push_str(&escape(&line[last..]));
    out
}

/// `<head>` shared by every rebuilt detail page.
///
/// `style` is inserted verbatim and must be a complete `<style>` element.
#[must_use]
pub fn render_head(title: &str, style: Option<&str>) -> String {
    let mut lines = vec![
        "<head>".to_owned(),
        "  <meta charset=\"UTF-8\">".to_owned(),
        "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">".to_owned(),
        format!("  <title>{}</title>", escape(title)),
        "  <link rel=\"icon\" type=\"image/png\" sizes=\"32x32\" href=\"../img/favicon32.png\">"
            .to_owned(),
        "  <link rel=\"icon\" type=\"image/png\" sizes=\"16x16\" href=\"../img/favicon16.png\">"
            .to_owned(),
    ];
    if let Some(style) = style {
        lines.push(format!("  {}", style.trim()));
    }
    lines.push("</head>".to_owned());
    lines.join("\n")
}

/// `<style>` element wrapping `css`.
#[must_use]
pub fn style_element(css: &str) -> String {
    format!("<style>{css}</style>")
}

/// Full document: doctype, `<html>` with its original attributes, head and
/// the body blocks in order.
#[must_use]
pub fn render_document(html_attributes: &str, head: &str, body_blocks: &[String]) -> String {
    let mut lines = vec![
        "<!DOCTYPE html>".to_owned(),
        format!("<html{html_attributes}>"),
        head.to_owned(),
        "<body>".to_owned(),
    ];
    lines.extend(body_blocks.iter().cloned());
    lines.push("</body>".to_owned());
    lines.push("</html>".to_owned());
    let mut doc = lines.join("\n");
    doc.push('\n');
    doc
}

/// `<figure>` holding one image and an optional caption body.
#[must_use]
pub fn render_figure(src: &str, alt: &str, caption: Option<&str>) -> String {
    let mut lines = vec![
        "<figure>".to_owned(),
        format!("  <img src=\"{}\" alt=\"{}\">", escape(src), escape(alt)),
    ];
    if let Some(caption) = caption {
        lines.push(format!("  <figcaption>{caption}</figcaption>"));
    }
    lines.push("</figure>".to_owned());
    lines.join("\n")
}

/// `<tag class="class">` wrapping already-rendered children, one per line.
#[must_use]
pub fn render_container(tag: &str, class: &str, children: &[String]) -> String {
    let mut lines = vec![format!("<{tag} class=\"{class}\">")];
    lines.extend(children.iter().map(|c| format!("  {c}")));
    lines.push(format!("</{tag}>"));
    lines.join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(escape("d'Entrecasteaux"), "d&#x27;Entrecasteaux");
    }

    #[test]
    fn test_linkify_keeps_trailing_punctuation_outside() {
        assert_eq!(
            linkify("See https://trove.nla.gov.au/x)."),
            "See <a href=\"https://trove.nla.gov.au/x\">https://trove.nla.gov.au/x</a>)."
        );
    }

    #[test]
    fn test_linkify_escapes_around_links() {
        assert_eq!(
            linkify("A & B: http://a.org/?q=1&r=2, then"),
            "A &amp; B: <a href=\"http://a.org/?q=1&amp;r=2\">http://a.org/?q=1&amp;r=2</a>, then"
        );
    }

    #[test]
    fn test_linkify_without_url() {
        assert_eq!(linkify("Fig. 1 <b>"), "Fig. 1 &lt;b&gt;");
    }

    #[test]
    fn test_head_contains_favicons_and_style() {
        let head = render_head("Baie / Bay", Some("<style>p{}</style>"));
        assert!(head.contains("<title>Baie / Bay</title>"));
        assert!(head.contains("sizes=\"32x32\" href=\"../img/favicon32.png\""));
        assert!(head.contains("sizes=\"16x16\" href=\"../img/favicon16.png\""));
        assert!(head.contains("<style>p{}</style>"));
    }

    #[test]
    fn test_document_layout() {
        let doc = render_document(" lang=\"fr\"", "<head></head>", &["<p>x</p>".to_owned()]);
        assert_eq!(
            doc,
            "<!DOCTYPE html>\n<html lang=\"fr\">\n<head></head>\n<body>\n<p>x</p>\n</body>\n</html>\n"
        );
    }
}
