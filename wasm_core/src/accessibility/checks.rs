use std::sync::OnceLock;

use scraper::{ElementRef, Html, Selector};

use super::{AXE_RULES_BASE_URL, AxeNode, AxeResults, AxeRuleResult, Impact, PageMetadata, StaticAnalysis};

struct Selectors {
    title: Selector,
    meta_description: Selector,
    og_description: Selector,
    html: Selector,
    img: Selector,
    img_with_alt: Selector,
    labelled_input: Selector,
    label_for: Selector,
    button: Selector,
    link: Selector,
    heading: Selector,
    link_content: Selector,
    main: Selector,
    table: Selector,
    table_headers: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |css: &str| Selector::parse(css).unwrap();
        Selectors {
            title: parse("title"),
            meta_description: parse(r#"meta[name="description"]"#),
            og_description: parse(r#"meta[property="og:description"]"#),
            html: parse("html"),
            img: parse("img"),
            img_with_alt: parse("img[alt]"),
            labelled_input: parse(
                r#"input:not([type="hidden"]):not([type="submit"]):not([type="button"]):not([type="reset"]):not([type="image"])"#,
            ),
            label_for: parse("label[for]"),
            button: parse(r#"button, [role="button"], input[type="submit"], input[type="button"]"#),
            link: parse("a[href]"),
            heading: parse("h1, h2, h3, h4, h5, h6"),
            link_content: parse(r#"img, svg, [aria-label]"#),
            main: parse(r#"main, [role="main"]"#),
            table: parse("table"),
            table_headers: parse("th, [scope], [headers]"),
        }
    })
}

/// Non-empty attribute value.
fn attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name).filter(|value| !value.is_empty())
}

fn trimmed_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn has_descendant(el: &ElementRef, selector: &Selector) -> bool {
    el.select(selector).any(|found| found.id() != el.id())
}

fn has_label_ancestor(el: &ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "label")
}

struct Rule {
    id: &'static str,
    impact: Impact,
    description: &'static str,
    help: &'static str,
    help_slug: &'static str,
    violation_tags: &'static [&'static str],
    pass_tags: &'static [&'static str],
}

impl Rule {
    fn result(&self, impact: Option<Impact>, tags: &[&str], nodes: Vec<AxeNode>) -> AxeRuleResult {
        AxeRuleResult {
            id: self.id.to_string(),
            impact,
            description: self.description.to_string(),
            help: self.help.to_string(),
            help_url: format!("{AXE_RULES_BASE_URL}/{}", self.help_slug),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            nodes,
        }
    }

    fn violation(&self, nodes: Vec<AxeNode>) -> AxeRuleResult {
        self.result(Some(self.impact), self.violation_tags, nodes)
    }

    fn pass(&self, nodes: Vec<AxeNode>) -> AxeRuleResult {
        self.result(None, self.pass_tags, nodes)
    }

    fn incomplete(&self, nodes: Vec<AxeNode>) -> AxeRuleResult {
        self.result(Some(self.impact), self.violation_tags, nodes)
    }
}

const IMAGE_ALT: Rule = Rule {
    id: "image-alt",
    impact: Impact::Critical,
    description: "Ensures <img> elements have alternate text or a role of none or presentation",
    help: "Images must have alternate text",
    help_slug: "image-alt",
    violation_tags: &["wcag2a", "wcag111", "section508", "ACT"],
    pass_tags: &["wcag2a", "wcag111"],
};

const LABEL: Rule = Rule {
    id: "label",
    impact: Impact::Critical,
    description: "Ensures every form element has a label",
    help: "Form elements must have labels",
    help_slug: "label",
    violation_tags: &["wcag2a", "wcag412", "section508"],
    pass_tags: &["wcag2a", "wcag412"],
};

const BUTTON_NAME: Rule = Rule {
    id: "button-name",
    impact: Impact::Critical,
    description: "Ensures buttons have discernible text",
    help: "Buttons must have discernible text",
    help_slug: "button-name",
    violation_tags: &["wcag2a", "wcag412", "section508"],
    pass_tags: &["wcag2a", "wcag412"],
};

const LINK_NAME: Rule = Rule {
    id: "link-name",
    impact: Impact::Serious,
    description: "Ensures links have discernible text",
    help: "Links must have discernible text",
    help_slug: "link-name",
    violation_tags: &["wcag2a", "wcag244", "wcag412", "section508"],
    pass_tags: &["wcag2a", "wcag244"],
};

const HTML_HAS_LANG: Rule = Rule {
    id: "html-has-lang",
    impact: Impact::Serious,
    description: "Ensures every HTML document has a lang attribute",
    help: "<html> element must have a lang attribute",
    help_slug: "html-has-lang",
    violation_tags: &["wcag2a", "wcag311"],
    pass_tags: &["wcag2a", "wcag311"],
};

const DOCUMENT_TITLE: Rule = Rule {
    id: "document-title",
    impact: Impact::Serious,
    description: "Ensures each HTML document contains a non-empty <title> element",
    help: "Documents must have <title> element",
    help_slug: "document-title",
    violation_tags: &["wcag2a", "wcag242"],
    pass_tags: &["wcag2a", "wcag242"],
};

const HEADING_ORDER: Rule = Rule {
    id: "heading-order",
    impact: Impact::Moderate,
    description: "Ensures the order of headings is semantically correct",
    help: "Heading levels should only increase by one",
    help_slug: "heading-order",
    violation_tags: &["wcag2a", "best-practice"],
    pass_tags: &["wcag2a", "best-practice"],
};

const EMPTY_LINKS: Rule = Rule {
    id: "empty-links",
    impact: Impact::Serious,
    description: "Ensures links are not empty",
    help: "Links must not be empty",
    help_slug: "link-name",
    violation_tags: &["wcag2a", "wcag244"],
    pass_tags: &["wcag2a", "wcag244"],
};

const MAIN_LANDMARK: Rule = Rule {
    id: "landmark-main-is-top-level",
    impact: Impact::Moderate,
    description: "Ensures the main landmark is at top level",
    help: "Page should contain a main landmark",
    help_slug: "landmark-main-is-top-level",
    violation_tags: &["wcag2a", "best-practice"],
    pass_tags: &["wcag2a", "best-practice"],
};

const TD_HAS_HEADER: Rule = Rule {
    id: "td-has-header",
    impact: Impact::Critical,
    description: "Ensures each cell in a data table is associated with a header",
    help: "All data cells must have table headers",
    help_slug: "td-has-header",
    violation_tags: &["wcag2a", "wcag131", "section508"],
    pass_tags: &["wcag2a", "wcag131", "section508"],
};

/// Runs every static check over `html`.
///
/// Rules with failing elements land in `violations`, rules whose elements all
/// passed land in `passes`; a rule with no matching elements is omitted.
/// The one check that cannot be decided statically (main landmark) is
/// reported as `incomplete`.
///
/// # Example
/// ```
/// use wcag_core::accessibility::analyze_html;
/// let report = analyze_html(r#"<html><head><title>Hi</title></head><body><img src="a.png"></body></html>"#);
/// assert_eq!(report.page_metadata.title.as_deref(), Some("Hi"));
/// assert!(report.results.violations.iter().any(|rule| rule.id == "image-alt"));
/// assert!(report.results.violations.iter().any(|rule| rule.id == "html-has-lang"));
/// ```
pub fn analyze_html(html: &str) -> StaticAnalysis {
    let document = Html::parse_document(html);
    let mut results = AxeResults::default();

    check_images(&document, &mut results);
    check_form_labels(&document, &mut results);
    check_buttons(&document, &mut results);
    check_link_names(&document, &mut results);
    check_language(&document, &mut results);
    check_title(&document, &mut results);
    check_heading_order(&document, &mut results);
    check_empty_links(&document, &mut results);
    check_main_landmark(&document, &mut results);
    check_table_headers(&document, &mut results);

    StaticAnalysis {
        page_metadata: page_metadata(&document),
        results,
    }
}

pub(crate) fn page_metadata(document: &Html) -> PageMetadata {
    let sel = selectors();
    let title = document
        .select(&sel.title)
        .map(|el| el.text().collect::<String>())
        .collect::<String>()
        .trim()
        .to_string();
    let description = document
        .select(&sel.meta_description)
        .next()
        .and_then(|el| attr(&el, "content"))
        .or_else(|| {
            document
                .select(&sel.og_description)
                .next()
                .and_then(|el| attr(&el, "content"))
        });
    let language = document.select(&sel.html).next().and_then(|el| attr(&el, "lang"));
    PageMetadata {
        title: (!title.is_empty()).then_some(title),
        description: description.map(str::to_string),
        language: language.map(str::to_string),
    }
}

fn record(results: &mut AxeResults, rule: &Rule, failing: Vec<AxeNode>, passing: Vec<AxeNode>) {
    if !failing.is_empty() {
        results.violations.push(rule.violation(failing));
    }
    if !passing.is_empty() {
        results.passes.push(rule.pass(passing));
    }
}

fn check_images(document: &Html, results: &mut AxeResults) {
    let (mut failing, mut passing) = (Vec::new(), Vec::new());
    for img in document.select(&selectors().img) {
        let target = format!(r#"img[src="{}"]"#, img.value().attr("src").unwrap_or_default());
        if img.value().attr("alt").is_none() {
            failing.push(AxeNode::failing(
                img.html(),
                target,
                "Element does not have an alt attribute",
            ));
        } else {
            passing.push(AxeNode::new(img.html(), target));
        }
    }
    record(results, &IMAGE_ALT, failing, passing);
}

fn check_form_labels(document: &Html, results: &mut AxeResults) {
    let sel = selectors();
    let (mut failing, mut passing) = (Vec::new(), Vec::new());
    for input in document.select(&sel.labelled_input) {
        let id = attr(&input, "id");
        let name = attr(&input, "name")
            .or_else(|| attr(&input, "type"))
            .unwrap_or("input");
        let has_label_for = id.is_some_and(|id| {
            document
                .select(&sel.label_for)
                .any(|label| label.value().attr("for") == Some(id))
        });
        let labelled = has_label_for
            || attr(&input, "aria-label").is_some()
            || attr(&input, "aria-labelledby").is_some()
            || attr(&input, "title").is_some()
            || has_label_ancestor(&input);
        let target = match id {
            Some(id) => format!("#{id}"),
            None => format!(r#"input[name="{name}"]"#),
        };
        if labelled {
            passing.push(AxeNode::new(input.html(), target));
        } else {
            failing.push(AxeNode::failing(
                input.html(),
                target,
                "Form element does not have an associated label",
            ));
        }
    }
    record(results, &LABEL, failing, passing);
}

fn check_buttons(document: &Html, results: &mut AxeResults) {
    let (mut failing, mut passing) = (Vec::new(), Vec::new());
    for button in document.select(&selectors().button) {
        let named = !trimmed_text(&button).is_empty()
            || attr(&button, "aria-label").is_some()
            || attr(&button, "aria-labelledby").is_some()
            || attr(&button, "title").is_some()
            || attr(&button, "value").is_some();
        let target = attr(&button, "id")
            .map(|id| format!("#{id}"))
            .unwrap_or_else(|| "button".to_string());
        if named {
            passing.push(AxeNode::new(button.html(), target));
        } else {
            failing.push(AxeNode::failing(
                button.html(),
                target,
                "Element does not have an accessible name",
            ));
        }
    }
    record(results, &BUTTON_NAME, failing, passing);
}

fn link_target(link: &ElementRef) -> String {
    format!(r#"a[href="{}"]"#, link.value().attr("href").unwrap_or_default())
}

fn check_link_names(document: &Html, results: &mut AxeResults) {
    let sel = selectors();
    let (mut failing, mut passing) = (Vec::new(), Vec::new());
    for link in document.select(&sel.link) {
        let named = !trimmed_text(&link).is_empty()
            || attr(&link, "aria-label").is_some()
            || attr(&link, "aria-labelledby").is_some()
            || attr(&link, "title").is_some()
            || has_descendant(&link, &sel.img_with_alt);
        if named {
            passing.push(AxeNode::new(link.html(), link_target(&link)));
        } else {
            failing.push(AxeNode::failing(
                link.html(),
                link_target(&link),
                "Element does not have an accessible name",
            ));
        }
    }
    record(results, &LINK_NAME, failing, passing);
}

fn check_language(document: &Html, results: &mut AxeResults) {
    let lang = document
        .select(&selectors().html)
        .next()
        .and_then(|el| attr(&el, "lang"));
    match lang {
        Some(lang) => results.passes.push(
            HTML_HAS_LANG.pass(vec![AxeNode::new(format!(r#"<html lang="{lang}">"#), "html")]),
        ),
        None => results.violations.push(HTML_HAS_LANG.violation(vec![AxeNode::failing(
            "<html>",
            "html",
            "The <html> element does not have a lang attribute",
        )])),
    }
}

fn check_title(document: &Html, results: &mut AxeResults) {
    match page_metadata(document).title {
        Some(title) => results
            .passes
            .push(DOCUMENT_TITLE.pass(vec![AxeNode::new(format!("<title>{title}</title>"), "title")])),
        None => results.violations.push(DOCUMENT_TITLE.violation(vec![AxeNode::failing(
            "<head>...</head>",
            "head",
            "Document does not have a non-empty <title> element",
        )])),
    }
}

fn check_heading_order(document: &Html, results: &mut AxeResults) {
    let mut failing = Vec::new();
    let mut previous = 0u32;
    let mut seen = false;
    for heading in document.select(&selectors().heading) {
        seen = true;
        let tag = heading.value().name();
        let level = tag[1..].parse::<u32>().unwrap_or(1);
        if previous > 0 && level > previous + 1 {
            failing.push(AxeNode::failing(
                heading.html(),
                tag,
                format!(
                    "Heading levels should only increase by one. Expected h{} or lower, found h{level}",
                    previous + 1
                ),
            ));
        }
        previous = level;
    }
    let passing = if seen && failing.is_empty() {
        vec![AxeNode::new("Headings are in correct order", "h1, h2, h3, h4, h5, h6")]
    } else {
        Vec::new()
    };
    record(results, &HEADING_ORDER, failing, passing);
}

fn check_empty_links(document: &Html, results: &mut AxeResults) {
    let sel = selectors();
    let failing: Vec<AxeNode> = document
        .select(&sel.link)
        .filter(|link| {
            let has_content = !trimmed_text(link).is_empty()
                || has_descendant(link, &sel.link_content)
                || attr(link, "aria-label").is_some();
            let has_children = link.children().any(|child| child.value().is_element());
            !has_content && !has_children
        })
        .map(|link| {
            AxeNode::failing(
                link.html(),
                link_target(&link),
                "Link is empty and has no accessible name",
            )
        })
        .collect();
    record(results, &EMPTY_LINKS, failing, Vec::new());
}

fn check_main_landmark(document: &Html, results: &mut AxeResults) {
    if document.select(&selectors().main).next().is_none() {
        results.incomplete.push(MAIN_LANDMARK.incomplete(vec![AxeNode::failing(
            "<body>",
            "body",
            "Document does not have a main landmark",
        )]));
    }
}

fn check_table_headers(document: &Html, results: &mut AxeResults) {
    let sel = selectors();
    let failing: Vec<AxeNode> = document
        .select(&sel.table)
        .filter(|table| !has_descendant(table, &sel.table_headers))
        .map(|table| {
            let markup: String = table.html().chars().take(200).collect();
            AxeNode::failing(
                format!("{markup}..."),
                "table",
                "Data table does not have header cells",
            )
        })
        .collect();
    record(results, &TD_HAS_HEADER, failing, Vec::new());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule<'a>(rules: &'a [AxeRuleResult], id: &str) -> Option<&'a AxeRuleResult> {
        rules.iter().find(|rule| rule.id == id)
    }

    const ACCESSIBLE_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <title> Accessible page </title>
  <meta name="description" content="A tidy page">
</head>
<body>
  <main>
    <h1>Welcome</h1>
    <h2>Section</h2>
    <img src="logo.png" alt="Logo">
    <label for="email">Email</label><input id="email" type="email">
    <label>Name <input name="name"></label>
    <button>Send</button>
    <a href="/about">About</a>
    <table><tr><th>Head</th></tr><tr><td>Cell</td></tr></table>
  </main>
</body>
</html>"#;

    #[test]
    fn accessible_page_has_no_violations() {
        let report = analyze_html(ACCESSIBLE_PAGE);
        assert!(report.results.violations.is_empty(), "{:?}", report.results.violations);
        assert!(report.results.incomplete.is_empty());
        let passed: Vec<&str> = report.results.passes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            passed,
            vec![
                "image-alt",
                "label",
                "button-name",
                "link-name",
                "html-has-lang",
                "document-title",
                "heading-order"
            ]
        );
        assert_eq!(report.page_metadata.title.as_deref(), Some("Accessible page"));
        assert_eq!(report.page_metadata.description.as_deref(), Some("A tidy page"));
        assert_eq!(report.page_metadata.language.as_deref(), Some("en"));
    }

    #[test]
    fn broken_page_reports_each_failure() {
        let html = r#"<html><head><meta property="og:description" content="OG"></head><body>
            <img src="hero.jpg">
            <input name="q" type="text">
            <input type="hidden" name="token">
            <button id="go"></button>
            <a href="/empty"></a>
            <h1>Top</h1><h3>Skipped</h3>
            <table><tr><td>1</td></tr></table>
        </body></html>"#;
        let report = analyze_html(html);
        let violations = &report.results.violations;

        let img = rule(violations, "image-alt").expect("image-alt");
        assert_eq!(img.impact, Some(Impact::Critical));
        assert_eq!(img.nodes[0].target, vec![r#"img[src="hero.jpg"]"#]);
        assert_eq!(img.tags, vec!["wcag2a", "wcag111", "section508", "ACT"]);

        let label = rule(violations, "label").expect("label");
        assert_eq!(label.nodes.len(), 1);
        assert_eq!(label.nodes[0].target, vec![r#"input[name="q"]"#]);

        let button = rule(violations, "button-name").expect("button-name");
        assert_eq!(button.nodes[0].target, vec!["#go"]);

        let link = rule(violations, "link-name").expect("link-name");
        assert_eq!(link.help_url, "https://dequeuniversity.com/rules/axe/4.10/link-name");
        let empty = rule(violations, "empty-links").expect("empty-links");
        assert_eq!(empty.help_url, link.help_url);
        assert_eq!(empty.nodes[0].target, vec![r#"a[href="/empty"]"#]);

        let headings = rule(violations, "heading-order").expect("heading-order");
        assert_eq!(
            headings.nodes[0].failure_summary.as_deref(),
            Some("Heading levels should only increase by one. Expected h2 or lower, found h3")
        );
        assert_eq!(headings.nodes[0].target, vec!["h3"]);

        let table = rule(violations, "td-has-header").expect("td-has-header");
        assert!(table.nodes[0].html.ends_with("..."));

        assert!(rule(violations, "html-has-lang").is_some());
        let title = rule(violations, "document-title").expect("document-title");
        assert_eq!(title.nodes[0].html, "<head>...</head>");

        let incomplete = rule(&report.results.incomplete, "landmark-main-is-top-level");
        assert!(incomplete.is_some());

        assert_eq!(report.page_metadata.description.as_deref(), Some("OG"));
        assert_eq!(report.page_metadata.title, None);
    }

    #[test]
    fn alternative_names_count_for_links_and_inputs() {
        let html = r#"<html lang="en"><head><title>T</title></head><body><main>
            <a href="/home"><img src="home.png" alt="Home"></a>
            <a href="/icon"><svg></svg></a>
            <input id="s" aria-label="Search">
            <input name="phone" title="Phone">
            <div role="button" aria-label="Close"></div>
            <input type="submit" value="Go">
        </main></body></html>"#;
        let report = analyze_html(html);
        let violations = &report.results.violations;
        assert!(rule(violations, "label").is_none());
        assert!(rule(violations, "button-name").is_none());
        assert!(rule(violations, "empty-links").is_none());
        // an svg without a title still leaves the link unnamed
        let link = rule(violations, "link-name").expect("link-name");
        assert_eq!(link.nodes[0].target, vec![r#"a[href="/icon"]"#]);
    }

    #[test]
    fn empty_alt_counts_as_present() {
        let report = analyze_html(r#"<img src="spacer.gif" alt="">"#);
        assert!(rule(&report.results.violations, "image-alt").is_none());
        assert!(rule(&report.results.passes, "image-alt").is_some());
    }

    #[test]
    fn heading_pass_only_when_headings_exist() {
        let report = analyze_html("<html lang=\"en\"><body><p>No headings</p></body></html>");
        assert!(rule(&report.results.passes, "heading-order").is_none());
        assert!(rule(&report.results.violations, "heading-order").is_none());
    }
}
