//! Static accessibility analysis.
//!
//! [`analyze_html`] runs pattern based checks over parsed HTML and reports them
//! in the same shape axe-core uses (`violations`, `passes`, `incomplete`), so
//! the browser can feed either source through [`process_results`].

mod checks;
mod processor;

use serde::{Deserialize, Serialize};

pub use checks::analyze_html;
pub use processor::{
    ElementContext, FixComplexity, FixTimeEstimate, ProcessedIncomplete, ProcessedPass,
    ProcessedResults, ProcessedViolation, TimeUnit, WcagCriterion, extract_element_context,
    format_rule_name, format_selector, process_results, wcag_criteria_for,
};

pub const AXE_RULES_BASE_URL: &str = "https://dequeuniversity.com/rules/axe/4.10";

pub const STATIC_ANALYSIS_NOTE: &str = "This test analyzed the static HTML of the page using pattern-based checks. JavaScript-rendered content was not executed. For comprehensive WCAG testing including dynamic content, use the \"Test Current Page\" feature or browser extensions like axe DevTools.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Critical,
    Serious,
    Moderate,
    Minor,
}

impl Impact {
    fn weight(self) -> u32 {
        match self {
            Self::Critical => 4,
            Self::Serious => 3,
            Self::Moderate => 2,
            Self::Minor => 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckMessage {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentInfo {
    pub tag_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeElementInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_info: Option<ParentInfo>,
}

/// One matched element. `any`/`all`/`none` are only present on results that
/// came from axe-core itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxeNode {
    pub html: String,
    pub target: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any: Vec<CheckMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<CheckMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub none: Vec<CheckMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<NodeElementInfo>,
}

impl AxeNode {
    fn new(html: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            target: vec![target.into()],
            ..Self::default()
        }
    }

    fn failing(html: impl Into<String>, target: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            failure_summary: Some(summary.into()),
            ..Self::new(html, target)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxeRuleResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    pub description: String,
    pub help: String,
    pub help_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<AxeNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxeResults {
    #[serde(default)]
    pub violations: Vec<AxeRuleResult>,
    #[serde(default)]
    pub passes: Vec<AxeRuleResult>,
    #[serde(default)]
    pub incomplete: Vec<AxeRuleResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticAnalysis {
    pub page_metadata: PageMetadata,
    #[serde(flatten)]
    pub results: AxeResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultCounts {
    pub violations: usize,
    pub passes: usize,
    pub incomplete: usize,
}

/// Payload of the server-side scan: raw rule results plus counts and the
/// static analysis disclaimer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticReport {
    pub url: String,
    pub timestamp: String,
    pub page_metadata: PageMetadata,
    #[serde(flatten)]
    pub results: AxeResults,
    pub summary: ResultCounts,
    pub static_analysis: bool,
    pub static_analysis_note: &'static str,
}

impl StaticReport {
    pub fn new(url: impl Into<String>, timestamp: impl Into<String>, analysis: StaticAnalysis) -> Self {
        let summary = ResultCounts {
            violations: analysis.results.violations.len(),
            passes: analysis.results.passes.len(),
            incomplete: analysis.results.incomplete.len(),
        };
        Self {
            url: url.into(),
            timestamp: timestamp.into(),
            page_metadata: analysis.page_metadata,
            results: analysis.results,
            summary,
            static_analysis: true,
            static_analysis_note: STATIC_ANALYSIS_NOTE,
        }
    }
}
