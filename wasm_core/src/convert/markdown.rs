// Markdown ↔ HTML ↔ plain text helpers for the text converter tools.
use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use std::sync::OnceLock;

/// Renders CommonMark (plus tables, strikethrough and task lists) into HTML.
///
/// # Example
/// ```
/// use wcag_core::convert::markdown::markdown_to_html;
/// let html = markdown_to_html("# Title");
/// assert!(html.contains("<h1>Title</h1>"));
/// ```
pub fn markdown_to_html(input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(input, options);
    let mut out = String::with_capacity(input.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Escapes the five HTML-significant characters.
pub fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Decodes the common named entities plus decimal and hex character references.
pub fn decode_entities(input: &str) -> String {
    regex_entity()
        .replace_all(input, |caps: &regex::Captures| {
            let body = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(body)
            };
            match decoded {
                Some(ch) => ch.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        _ => return None,
    };
    Some(ch)
}

/// Converts HTML into Markdown with ATX headings and fenced code blocks.
///
/// # Example
/// ```
/// use wcag_core::convert::markdown::html_to_markdown;
/// let md = html_to_markdown("<h2>Intro</h2><ul><li>Item</li></ul>");
/// assert!(md.starts_with("## Intro"));
/// assert!(md.ends_with("- Item"));
/// ```
pub fn html_to_markdown(input: &str) -> String {
    let mut text = input.replace("\r\n", "\n");
    text = regex_script().replace_all(&text, "").into_owned();
    text = regex_style().replace_all(&text, "").into_owned();
    text = regex_comment().replace_all(&text, "").into_owned();
    text = regex_code_block()
        .replace_all(&text, |caps: &regex::Captures| {
            let inner = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let code = strip_tags_raw(inner);
            format!("\n\n```\n{}\n```\n\n", code.trim_matches('\n'))
        })
        .into_owned();
    text = regex_break().replace_all(&text, "  \n").into_owned();
    text = regex_heading()
        .replace_all(&text, |caps: &regex::Captures| {
            let level = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .unwrap_or(1)
                .clamp(1, 6);
            let content = collapse_inline(caps.get(2).map(|m| m.as_str()).unwrap_or(""));
            format!("\n\n{} {}\n\n", "#".repeat(level), content)
        })
        .into_owned();
    text = regex_hr().replace_all(&text, "\n\n* * *\n\n").into_owned();
    text = regex_strong().replace_all(&text, "**$1**").into_owned();
    text = regex_em().replace_all(&text, "_${1}_").into_owned();
    text = regex_inline_code().replace_all(&text, "`$1`").into_owned();
    text = regex_image()
        .replace_all(&text, |caps: &regex::Captures| {
            let tag = &caps[0];
            let src = attribute_value(tag, "src").unwrap_or_default();
            let alt = attribute_value(tag, "alt").unwrap_or_default();
            format!("![{alt}]({src})")
        })
        .into_owned();
    text = regex_link()
        .replace_all(&text, |caps: &regex::Captures| {
            let href = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let label = collapse_inline(caps.get(2).map(|m| m.as_str()).unwrap_or(""));
            format!("[{label}]({href})")
        })
        .into_owned();
    text = regex_ordered_list()
        .replace_all(&text, |caps: &regex::Captures| {
            let body = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let items: Vec<String> = regex_list_item()
                .captures_iter(body)
                .enumerate()
                .map(|(idx, item)| format!("{}. {}", idx + 1, collapse_inline(&item[1])))
                .collect();
            format!("\n\n{}\n\n", items.join("\n"))
        })
        .into_owned();
    text = regex_unordered_list()
        .replace_all(&text, |caps: &regex::Captures| {
            let body = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let items: Vec<String> = regex_list_item()
                .captures_iter(body)
                .map(|item| format!("- {}", collapse_inline(&item[1])))
                .collect();
            format!("\n\n{}\n\n", items.join("\n"))
        })
        .into_owned();
    text = regex_blockquote()
        .replace_all(&text, |caps: &regex::Captures| {
            let inner = collapse_block(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
            let quoted: Vec<String> = inner.lines().map(|line| format!("> {line}").trim_end().to_string()).collect();
            format!("\n\n{}\n\n", quoted.join("\n"))
        })
        .into_owned();
    text = regex_paragraph().replace_all(&text, "\n\n$1\n\n").into_owned();
    text = regex_block_container().replace_all(&text, "\n$1\n").into_owned();
    text = regex_tag().replace_all(&text, "").into_owned();
    compact_blank_lines(&decode_entities(&text))
}

/// Extracts readable text from HTML, keeping line structure from block elements.
///
/// # Example
/// ```
/// use wcag_core::convert::markdown::html_to_text;
/// let text = html_to_text("<p>Hello &amp; welcome</p><p>Line<br>two</p>");
/// assert_eq!(text, "Hello & welcome\n\nLine\ntwo");
/// ```
pub fn html_to_text(input: &str) -> String {
    let mut text = input.replace("\r\n", "\n");
    text = regex_script().replace_all(&text, "").into_owned();
    text = regex_style().replace_all(&text, "").into_owned();
    text = regex_comment().replace_all(&text, "").into_owned();
    text = regex_break().replace_all(&text, "\n").into_owned();
    text = regex_heading()
        .replace_all(&text, |caps: &regex::Captures| {
            let content = collapse_inline(caps.get(2).map(|m| m.as_str()).unwrap_or(""));
            format!("\n\n{}\n\n", content.to_uppercase())
        })
        .into_owned();
    text = regex_list_item().replace_all(&text, "\n * $1").into_owned();
    text = regex_paragraph().replace_all(&text, "\n\n$1\n\n").into_owned();
    text = regex_block_container().replace_all(&text, "\n$1\n").into_owned();
    text = regex_tag().replace_all(&text, "").into_owned();
    let decoded = decode_entities(&text);
    let lines: Vec<String> = decoded
        .lines()
        .map(|line| regex_spaces().replace_all(line.trim(), " ").into_owned())
        .collect();
    compact_blank_lines(&lines.join("\n"))
}

fn collapse_inline(fragment: &str) -> String {
    let stripped = strip_tags_raw(fragment);
    regex_whitespace().replace_all(stripped.trim(), " ").into_owned()
}

fn collapse_block(fragment: &str) -> String {
    let stripped = regex_paragraph().replace_all(fragment, "$1\n\n");
    compact_blank_lines(&strip_tags_raw(&stripped))
}

fn strip_tags_raw(fragment: &str) -> String {
    regex_tag().replace_all(fragment, "").into_owned()
}

fn attribute_value(tag: &str, name: &str) -> Option<String> {
    regex_attribute()
        .captures_iter(tag)
        .find(|caps| caps[1].eq_ignore_ascii_case(name))
        .and_then(|caps| caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str().to_string()))
}

fn compact_blank_lines(text: &str) -> String {
    let mut compact: Vec<&str> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_end_matches([' ', '\t']);
        let keep = if line.ends_with("  ") && !trimmed.is_empty() {
            line
        } else {
            trimmed
        };
        if keep.is_empty() {
            if compact.last().is_some_and(|l| l.is_empty()) {
                continue;
            }
            compact.push("");
        } else {
            compact.push(keep);
        }
    }
    compact.join("\n").trim().to_string()
}

fn regex_script() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap())
}

fn regex_style() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap())
}

fn regex_comment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").unwrap())
}

fn regex_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]>").unwrap())
}

fn regex_paragraph() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p>").unwrap())
}

fn regex_block_container() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(?:div|section|article|header|footer|main|nav|aside|tr)(?:\s[^>]*)?>(.*?)</(?:div|section|article|header|footer|main|nav|aside|tr)>").unwrap()
    })
}

fn regex_ordered_list() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<ol[^>]*>(.*?)</ol>").unwrap())
}

fn regex_unordered_list() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<ul[^>]*>(.*?)</ul>").unwrap())
}

fn regex_list_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<li(?:\s[^>]*)?>(.*?)</li>").unwrap())
}

fn regex_blockquote() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<blockquote[^>]*>(.*?)</blockquote>").unwrap())
}

fn regex_strong() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<(?:strong|b)(?:\s[^>]*)?>(.*?)</(?:strong|b)>").unwrap())
}

fn regex_em() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<(?:em|i)(?:\s[^>]*)?>(.*?)</(?:em|i)>").unwrap())
}

fn regex_code_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<pre[^>]*>(?:\s*<code[^>]*>)?(.*?)(?:</code>\s*)?</pre>").unwrap())
}

fn regex_inline_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<code[^>]*>(.*?)</code>").unwrap())
}

fn regex_image() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<img\b[^>]*>").unwrap())
}

fn regex_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?is)<a\b[^>]*href=["'](.*?)["'][^>]*>(.*?)</a>"#).unwrap())
}

fn regex_attribute() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"([a-zA-Z-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap())
}

fn regex_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<br\s*/?>").unwrap())
}

fn regex_hr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<hr\s*/?>").unwrap())
}

fn regex_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<[^>]+>").unwrap())
}

fn regex_entity() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap())
}

fn regex_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn regex_spaces() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").unwrap())
}
