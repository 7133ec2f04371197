//! Markdown to HTML rendering for retrieved documents.
//!
//! CommonMark plus tables, strikethrough and footnotes. Headings get an `id`
//! slug so documents can be linked into, and fenced code is wrapped in the
//! highlight markup stylesheets expect:
//!
//! ```text
//! <div class="highlight"><pre><code class="language-rust" data-lang="rust">...</code></pre></div>
//! ```
//!
//! Code in a language syntect knows is tokenized into `<span class="...">`
//! runs (space-separated scope classes). Anything else is emitted as
//! escaped text.

use std::collections::HashMap;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, html};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const CODE_BLOCK_CLOSE: &str = "</code></pre></div>\n";

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Render `markdown` as an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);

    let events: Vec<Event<'_>> = Parser::new_ext(markdown, options).collect();
    let mut ids = HeadingIds::default();
    let mut rendered = Vec::with_capacity(events.len());
    let mut block: Option<CodeBlock> = None;

    for (i, event) in events.iter().enumerate() {
        if let (Some(block), Event::Text(text)) = (block.as_mut(), event) {
            block.code.push_str(text);
            continue;
        }
        match event {
            Event::Start(Tag::Heading(level, _, _)) => {
                let id = ids.next(&heading_text(&events[i + 1..]));
                rendered.push(Event::Html(format!("<{level} id=\"{id}\">").into()));
            }
            Event::End(Tag::Heading(level, _, _)) => {
                rendered.push(Event::Html(format!("</{level}>\n").into()));
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                block = Some(CodeBlock::new(kind));
            }
            Event::End(Tag::CodeBlock(_)) => {
                if let Some(block) = block.take() {
                    rendered.extend(block.into_events());
                }
            }
            other => rendered.push(other.clone()),
        }
    }

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, rendered.into_iter());
    out
}

/// Text of a code block collected between its start and end events.
struct CodeBlock {
    lang: String,
    code: String,
}

impl CodeBlock {
    fn new(kind: &CodeBlockKind<'_>) -> Self {
        let lang = match kind {
            CodeBlockKind::Fenced(info) => language_of(info),
            CodeBlockKind::Indented => String::new(),
        };
        Self { lang, code: String::new() }
    }

    fn open_tag(&self) -> String {
        if self.lang.is_empty() {
            "<div class=\"highlight\"><pre><code>".to_string()
        } else {
            let lang = &self.lang;
            format!("<div class=\"highlight\"><pre><code class=\"language-{lang}\" data-lang=\"{lang}\">")
        }
    }

    fn into_events<'a>(self) -> Vec<Event<'a>> {
        let open = self.open_tag();
        match highlight(&self.lang, &self.code) {
            Some(spans) => vec![Event::Html(format!("{open}{spans}{CODE_BLOCK_CLOSE}").into())],
            None => vec![
                Event::Html(open.into()),
                Event::Text(self.code.into()),
                Event::Html(CODE_BLOCK_CLOSE.into()),
            ],
        }
    }
}

/// Classed HTML for `code`, or `None` when `lang` has no known syntax.
fn highlight(lang: &str, code: &str) -> Option<String> {
    if lang.is_empty() {
        return None;
    }
    let syntax = SYNTAXES.find_syntax_by_token(lang)?;
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAXES, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::debug!(lang, error = %err, "highlighting failed, emitting plain code");
            return None;
        }
    }
    Some(generator.finalize())
}

/// First word of a fence info string, restricted to attribute-safe chars.
fn language_of(info: &str) -> String {
    info.split_whitespace()
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
        .collect()
}

/// Plain text of the heading starting right before `events`.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(Tag::Heading(..)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

/// Lowercase slug with every run of non-alphanumerics collapsed to `-`.
pub fn heading_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Hands out heading ids, suffixing repeats with `-1`, `-2`, ...
#[derive(Default)]
struct HeadingIds {
    seen: HashMap<String, usize>,
}

impl HeadingIds {
    fn next(&mut self, text: &str) -> String {
        let mut slug = heading_slug(text);
        if slug.is_empty() {
            slug.push_str("section");
        }
        let count = self.seen.entry(slug.clone()).or_insert(0);
        let id = if *count == 0 { slug } else { format!("{slug}-{count}") };
        *count += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_gets_id() {
        assert_eq!(markdown_to_html("# Hello World"), "<h1 id=\"hello-world\">Hello World</h1>\n");
    }

    #[test]
    fn test_heading_id_includes_inline_code() {
        let html = markdown_to_html("## The `retrieve` call!");
        assert!(html.starts_with("<h2 id=\"the-retrieve-call\">"), "{html}");
        assert!(html.contains("<code>retrieve</code>"));
    }

    #[test]
    fn test_duplicate_headings_are_numbered() {
        let html = markdown_to_html("# Intro\n\n# Intro\n\n# Intro\n");
        assert!(html.contains("<h1 id=\"intro\">"));
        assert!(html.contains("<h1 id=\"intro-1\">"));
        assert!(html.contains("<h1 id=\"intro-2\">"));
    }

    #[test]
    fn test_fenced_code_block_is_highlighted() {
        let html = markdown_to_html("```rust\nfn main() {}\n```\n");
        assert!(
            html.starts_with("<div class=\"highlight\"><pre><code class=\"language-rust\" data-lang=\"rust\">"),
            "{html}"
        );
        assert!(html.ends_with("</code></pre></div>\n"), "{html}");
        assert!(html.contains("<span class=\"source rust\">"), "{html}");
        assert!(html.contains("main"));
    }

    #[test]
    fn test_unknown_language_is_plain() {
        assert_eq!(
            markdown_to_html("```nosuchlang\n<b>&</b>\n```\n"),
            "<div class=\"highlight\"><pre><code class=\"language-nosuchlang\" data-lang=\"nosuchlang\">&lt;b&gt;&amp;&lt;/b&gt;\n</code></pre></div>\n"
        );
    }

    #[test]
    fn test_highlighted_code_is_escaped() {
        let html = markdown_to_html("```html\n<b>&</b>\n```\n");
        assert!(html.contains("<span class=\""), "{html}");
        assert!(html.contains("&lt;"), "{html}");
        assert!(html.contains("&amp;"), "{html}");
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_multiline_code_block() {
        let html = markdown_to_html("```\nline one\nline two\n```\n");
        assert_eq!(html, "<div class=\"highlight\"><pre><code>line one\nline two\n</code></pre></div>\n");
    }

    #[test]
    fn test_code_block_without_language() {
        let html = markdown_to_html("```\nplain\n```\n");
        assert_eq!(html, "<div class=\"highlight\"><pre><code>plain\n</code></pre></div>\n");
    }

    #[test]
    fn test_language_is_sanitized() {
        let html = markdown_to_html("```c\"onload=x\n1\n```\n");
        assert!(html.contains("class=\"language-conloadx\""), "{html}");
    }

    #[test]
    fn test_tables_and_strikethrough() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn test_paragraph() {
        assert_eq!(markdown_to_html("Any *text*"), "<p>Any <em>text</em></p>\n");
    }

    #[test]
    fn test_heading_slug() {
        assert_eq!(heading_slug("Hello, World!"), "hello-world");
        assert_eq!(heading_slug("  --Spaced  Out--  "), "spaced-out");
        assert_eq!(heading_slug("v1.2 Release"), "v1-2-release");
        assert_eq!(heading_slug("?!"), "");
    }
}
