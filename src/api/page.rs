//! HTML rendering for the form page.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

use crate::comeback::{Intensity, Tone};

const TITLE: &str = "Chat Comeback Buddy Bot";

const INTRO: &str = "Paste a chat snippet, pick a style, and get back the same conversation \
with a clever, humor-filled reply and a GIF to go with it.";

/// Everything the page shows for one request.
#[derive(Debug, Default)]
pub(crate) struct PageView<'a> {
    pub chat_text: &'a str,
    pub tone: Tone,
    pub intensity: Intensity,
    pub error: Option<String>,
    pub markdown: Option<&'a str>,
}

const SAFE_SCHEMES: [&str; 3] = ["http://", "https://", "mailto:"];

fn is_safe_url(url: &str) -> bool {
    let url = url.trim_start();
    SAFE_SCHEMES.iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

fn safe_dest(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

/// Renders agent Markdown to HTML.
///
/// Raw HTML in the input is escaped, links and images outside http(s) and
/// mailto point at `#`, and soft line breaks become `<br />`.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_dest(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_dest(dest_url),
            title,
            id,
        }),
        // One chat message per line.
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, events);
    out
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn options<T: Copy + PartialEq>(
    all: &[T],
    selected: T,
    slug: impl Fn(&T) -> &'static str,
    label: impl Fn(&T) -> &'static str,
) -> String {
    all.iter()
        .map(|item| {
            format!(
                "<option value=\"{}\"{}>{}</option>",
                slug(item),
                if *item == selected { " selected" } else { "" },
                label(item)
            )
        })
        .collect::<Vec<_>>()
        .join("\n          ")
}

pub(crate) fn render_page(view: &PageView<'_>) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{TITLE}</title>\n"));
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("</head>\n<body>\n<main>\n");
    out.push_str(&format!("<h1>💬 {TITLE}</h1>\n<p>{INTRO}</p>\n<hr>\n"));

    out.push_str("<form method=\"post\" action=\"/comeback\">\n");
    out.push_str("  <h2>💬 Paste a Chat Snippet</h2>\n");
    out.push_str(&format!(
        "  <textarea name=\"chat_text\" rows=\"10\" cols=\"80\" \
         placeholder=\"e.g., 'Yeah sure, like that plan ever works 😏'\">{}</textarea>\n",
        escape_html(view.chat_text)
    ));
    out.push_str(&format!(
        "  <label>🎭 Comeback Style\n    <select name=\"tone\">\n          {}\n    </select>\n  </label>\n",
        options(&Tone::ALL, view.tone, Tone::slug, Tone::label)
    ));
    out.push_str(&format!(
        "  <label>📢 Intensity Level\n    <select name=\"intensity\">\n          {}\n    </select>\n  </label>\n",
        options(&Intensity::ALL, view.intensity, Intensity::slug, Intensity::label)
    ));
    out.push_str("  <button type=\"submit\">🎯 Generate Comeback</button>\n</form>\n");

    if let Some(error) = &view.error {
        out.push_str(&format!(
            "<p class=\"error\" role=\"alert\">{}</p>\n",
            escape_html(error)
        ));
    }

    if let Some(markdown) = view.markdown {
        out.push_str("<hr>\n<section id=\"updated-chat\">\n<h2>💬 Updated Chat</h2>\n");
        out.push_str(&render_markdown(markdown));
        out.push_str("<details>\n<summary>Markdown</summary>\n<pre>");
        out.push_str(&escape_html(markdown));
        out.push_str("</pre>\n</details>\n</section>\n");
    }

    out.push_str("</main>\n</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_chat_lines_and_gif() {
        let html = render_markdown(
            "**Alice**: Hello\n**Bob**: Nice try\n\n![gif](https://media.giphy.com/media/abc/giphy.gif)",
        );
        assert!(html.contains("<strong>Alice</strong>: Hello<br />"));
        assert!(html.contains("<img src=\"https://media.giphy.com/media/abc/giphy.gif\" alt=\"gif\""));
    }

    #[test]
    fn raw_html_is_escaped() {
        let html = render_markdown("<script>alert(1)</script>\n\n**Bob**: <b>hi</b>");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn script_links_are_neutralised() {
        let html = render_markdown(
            "**Bob**: [click](javascript:alert(document.cookie))\n\n\
             ![gif]( JAVASCRIPT:alert(1))\n\n[site](HTTPS://example.com) [mail](mailto:a@b.c)",
        );
        assert!(!html.to_lowercase().contains("javascript:"));
        assert!(html.contains("<a href=\"#\">click</a>"));
        assert!(html.contains("<img src=\"#\" alt=\"gif\""));
        assert!(html.contains("<a href=\"HTTPS://example.com\">site</a>"));
        assert!(html.contains("<a href=\"mailto:a@b.c\">mail</a>"));
    }

    #[test]
    fn page_preserves_inputs_and_selection() {
        let page = render_page(&PageView {
            chat_text: "<hey> & you",
            tone: Tone::Savage,
            intensity: Intensity::Balanced,
            error: Some("Please paste a chat snippet to respond to.".into()),
            markdown: None,
        });
        assert!(page.contains("&lt;hey&gt; &amp; you</textarea>"));
        assert!(page.contains("<option value=\"savage\" selected>Savage and bold</option>"));
        assert!(page.contains("<option value=\"balanced\" selected>Balanced and clever</option>"));
        assert!(page.contains("<option value=\"witty\">Witty and playful</option>"));
        assert!(page.contains("Please paste a chat snippet to respond to."));
        assert!(!page.contains("Updated Chat"));
    }

    #[test]
    fn page_shows_result_section() {
        let page = render_page(&PageView {
            markdown: Some("**Bob**: touché"),
            ..PageView::default()
        });
        assert!(page.contains("Updated Chat"));
        assert!(page.contains("<strong>Bob</strong>: touché"));
    }
}
