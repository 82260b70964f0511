// Whitespace minifiers for HTML/CSS/JS and a keyword-driven SQL formatter.
use regex::Regex;
use std::sync::OnceLock;

/// Removes comments and inter-tag whitespace, then collapses remaining runs.
///
/// # Example
/// ```
/// use wcag_core::convert::code::minify_html;
/// let html = minify_html("<div>\n  <!-- note -->\n  <p>Hi   there</p>\n</div>");
/// assert_eq!(html, "<div><p>Hi there</p></div>");
/// ```
pub fn minify_html(input: &str) -> String {
    let without_comments = regex_html_comment().replace_all(input, "");
    let joined = regex_between_tags().replace_all(&without_comments, "><");
    regex_multi_space()
        .replace_all(joined.trim(), " ")
        .into_owned()
}

pub fn minify_css(input: &str) -> String {
    let mut css = regex_block_comment().replace_all(input, "").into_owned();
    css = regex_whitespace().replace_all(&css, " ").into_owned();
    css = regex_css_punctuation().replace_all(&css, "$1").into_owned();
    css = css.replace(";}", "}");
    css = regex_open_paren_space().replace_all(&css, "(").into_owned();
    css = regex_close_paren_space().replace_all(&css, ")").into_owned();
    css.trim().to_string()
}

/// Strips comments and redundant whitespace from JavaScript. String and
/// template literals are copied verbatim. This is not a parser: regex literals
/// containing `//` or quotes are not recognised.
pub fn minify_js(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for segment in split_js_segments(input) {
        match segment {
            JsSegment::Code(code) => {
                let collapsed = regex_whitespace().replace_all(&code, " ");
                out.push_str(&regex_js_punctuation().replace_all(&collapsed, "$1"));
            }
            JsSegment::Literal(literal) => out.push_str(&literal),
        }
    }
    out.trim().to_string()
}

enum JsSegment {
    Code(String),
    Literal(String),
}

fn split_js_segments(input: &str) -> Vec<JsSegment> {
    let chars: Vec<char> = input.chars().collect();
    let mut segments = Vec::new();
    let mut code = String::new();
    let mut idx = 0;
    while idx < chars.len() {
        let ch = chars[idx];
        let next = chars.get(idx + 1).copied();
        match (ch, next) {
            ('/', Some('/')) => {
                while idx < chars.len() && chars[idx] != '\n' {
                    idx += 1;
                }
                code.push('\n');
            }
            ('/', Some('*')) => {
                idx += 2;
                while idx < chars.len() && !(chars[idx] == '*' && chars.get(idx + 1) == Some(&'/')) {
                    idx += 1;
                }
                idx += 2;
                code.push(' ');
            }
            ('"' | '\'' | '`', _) => {
                if !code.is_empty() {
                    segments.push(JsSegment::Code(std::mem::take(&mut code)));
                }
                let mut literal = String::from(ch);
                idx += 1;
                while idx < chars.len() {
                    let current = chars[idx];
                    literal.push(current);
                    idx += 1;
                    if current == '\\' {
                        if let Some(escaped) = chars.get(idx) {
                            literal.push(*escaped);
                            idx += 1;
                        }
                    } else if current == ch {
                        break;
                    }
                }
                segments.push(JsSegment::Literal(literal));
            }
            _ => {
                code.push(ch);
                idx += 1;
            }
        }
    }
    if !code.is_empty() {
        segments.push(JsSegment::Code(code));
    }
    segments
}

const SQL_CLAUSES: &[&str] = &[
    "UNION ALL",
    "ORDER BY",
    "GROUP BY",
    "LEFT JOIN",
    "RIGHT JOIN",
    "INNER JOIN",
    "OUTER JOIN",
    "INSERT INTO",
    "DELETE FROM",
    "CREATE TABLE",
    "ALTER TABLE",
    "DROP TABLE",
    "SELECT",
    "FROM",
    "WHERE",
    "AND",
    "OR",
    "HAVING",
    "JOIN",
    "ON",
    "VALUES",
    "UPDATE",
    "SET",
    "LIMIT",
    "OFFSET",
    "UNION",
    "EXCEPT",
    "INTERSECT",
];

/// Puts each major SQL clause on its own line. JOIN lines get one indent,
/// AND/OR lines two.
///
/// # Example
/// ```
/// use wcag_core::convert::code::format_sql;
/// let sql = format_sql("select id from users u left join teams t on t.id = u.team where a = 1 and b = 2", true, 2);
/// assert_eq!(
///     sql,
///     "SELECT id\nFROM users u\n  LEFT JOIN teams t\nON t.id = u.team\nWHERE a = 1\n    AND b = 2"
/// );
/// ```
pub fn format_sql(input: &str, uppercase: bool, indent: usize) -> String {
    let indent_str = " ".repeat(indent);
    let normalized = regex_whitespace().replace_all(input.trim(), " ");
    let broken = regex_sql_clause().replace_all(&normalized, |caps: &regex::Captures| {
        let keyword = regex_whitespace().replace_all(&caps[1], " ");
        if uppercase {
            format!("\n{}", keyword.to_uppercase())
        } else {
            format!("\n{}", keyword.to_lowercase())
        }
    });
    broken
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let head = line
                .split(' ')
                .next()
                .unwrap_or("")
                .to_ascii_uppercase();
            match head.as_str() {
                "AND" | "OR" => format!("{indent_str}{indent_str}{line}"),
                "JOIN" | "LEFT" | "RIGHT" | "INNER" | "OUTER" => format!("{indent_str}{line}"),
                _ => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn regex_html_comment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").unwrap())
}

fn regex_between_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r">\s+<").unwrap())
}

fn regex_multi_space() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").unwrap())
}

fn regex_block_comment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").unwrap())
}

fn regex_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn regex_css_punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*([{};:,>+~])\s*").unwrap())
}

fn regex_open_paren_space() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(\s+").unwrap())
}

fn regex_close_paren_space() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+\)").unwrap())
}

fn regex_js_punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*([{}()\[\];:,=<>!&|?*])\s*").unwrap())
}

fn regex_sql_clause() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = SQL_CLAUSES
            .iter()
            .map(|kw| kw.replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b({alternation})\b")).unwrap()
    })
}
