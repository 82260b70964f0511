use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::{AxeNode, AxeResults, AxeRuleResult, Impact, PageMetadata};

const RULE_NAMES: &[(&str, &str)] = &[
    ("color-contrast", "Color Contrast"),
    ("color-contrast-enhanced", "Enhanced Color Contrast"),
    ("link-in-text-block", "Link Distinguishable from Text"),
    ("image-alt", "Image Alternative Text"),
    ("image-redundant-alt", "Redundant Image Alternative Text"),
    ("input-image-alt", "Input Image Alternative Text"),
    ("object-alt", "Object Alternative Text"),
    ("svg-img-alt", "SVG Image Alternative Text"),
    ("area-alt", "Image Map Area Alternative Text"),
    ("label", "Form Input Labels"),
    ("input-button-name", "Input Button Name"),
    ("select-name", "Select Element Name"),
    ("autocomplete-valid", "Valid Autocomplete Attribute"),
    ("link-name", "Link Name"),
    ("button-name", "Button Accessible Name"),
    ("identical-links-same-purpose", "Identical Links Same Purpose"),
    ("heading-order", "Heading Order"),
    ("empty-heading", "Empty Heading"),
    ("page-has-heading-one", "Page Has Level One Heading"),
    ("table-duplicate-name", "Duplicate Table Name"),
    ("td-headers-attr", "Table Header Attributes"),
    ("th-has-data-cells", "Table Headers Have Data Cells"),
    ("table-fake-caption", "Table Fake Caption"),
    ("scope-attr-valid", "Valid Scope Attribute"),
    ("document-title", "Document Title"),
    ("html-has-lang", "HTML Language Attribute"),
    ("html-lang-valid", "Valid HTML Language"),
    ("html-xml-lang-mismatch", "HTML/XML Language Mismatch"),
    ("valid-lang", "Valid Language"),
    ("landmark-one-main", "Single Main Landmark"),
    ("landmark-unique", "Unique Landmarks"),
    ("landmark-no-duplicate-banner", "No Duplicate Banner Landmarks"),
    ("landmark-no-duplicate-contentinfo", "No Duplicate Contentinfo Landmarks"),
    ("landmark-no-duplicate-main", "No Duplicate Main Landmarks"),
    ("landmark-banner-is-top-level", "Banner Landmark Top Level"),
    ("landmark-contentinfo-is-top-level", "Contentinfo Landmark Top Level"),
    ("landmark-main-is-top-level", "Main Landmark Top Level"),
    ("landmark-complementary-is-top-level", "Complementary Landmark Top Level"),
    ("region", "Content Within Landmarks"),
    ("bypass", "Skip Navigation Link"),
    ("aria-allowed-attr", "Allowed ARIA Attributes"),
    ("aria-allowed-role", "Allowed ARIA Role"),
    ("aria-command-name", "ARIA Command Name"),
    ("aria-dialog-name", "ARIA Dialog Name"),
    ("aria-hidden-body", "ARIA Hidden Body"),
    ("aria-hidden-focus", "ARIA Hidden Focus"),
    ("aria-input-field-name", "ARIA Input Field Name"),
    ("aria-meter-name", "ARIA Meter Name"),
    ("aria-progressbar-name", "ARIA Progress Bar Name"),
    ("aria-required-attr", "Required ARIA Attributes"),
    ("aria-required-children", "Required ARIA Children"),
    ("aria-required-parent", "Required ARIA Parent"),
    ("aria-roledescription", "ARIA Role Description"),
    ("aria-roles", "Valid ARIA Roles"),
    ("aria-text", "ARIA Text"),
    ("aria-toggle-field-name", "ARIA Toggle Field Name"),
    ("aria-tooltip-name", "ARIA Tooltip Name"),
    ("aria-treeitem-name", "ARIA Tree Item Name"),
    ("aria-valid-attr", "Valid ARIA Attributes"),
    ("aria-valid-attr-value", "Valid ARIA Attribute Values"),
    ("focus-order-semantics", "Focus Order Semantics"),
    ("focusable-disabled", "Focusable Disabled Elements"),
    ("scrollable-region-focusable", "Scrollable Regions Focusable"),
    ("tabindex", "Valid Tabindex"),
    ("accesskeys", "Unique Access Keys"),
    ("focus-not-trapped", "Focus Not Trapped"),
    ("frame-title", "Frame Title"),
    ("frame-title-unique", "Unique Frame Titles"),
    ("frame-tested", "Frame Tested"),
    ("frame-focusable-content", "Frame Focusable Content"),
    ("list", "Proper List Structure"),
    ("listitem", "List Item Parent"),
    ("definition-list", "Definition List Structure"),
    ("dlitem", "Definition List Item"),
    ("audio-caption", "Audio Captions"),
    ("video-caption", "Video Captions"),
    ("video-description", "Video Description"),
    ("form-field-multiple-labels", "Multiple Form Labels"),
    ("hidden-content", "Hidden Content"),
    ("label-content-name-mismatch", "Label Content Name Mismatch"),
    ("label-title-only", "Label Title Only"),
    ("blink", "No Blinking Content"),
    ("marquee", "No Marquee Element"),
    ("meta-refresh", "No Meta Refresh"),
    ("meta-viewport", "Meta Viewport"),
    ("meta-viewport-large", "Meta Viewport Large"),
    ("no-autoplay-audio", "No Autoplay Audio"),
    ("server-side-image-map", "No Server-Side Image Map"),
    ("duplicate-id", "Unique Element IDs"),
    ("duplicate-id-active", "Unique Active Element IDs"),
    ("duplicate-id-aria", "Unique ARIA IDs"),
    ("nested-interactive", "No Nested Interactive Elements"),
    ("css-orientation-lock", "CSS Orientation Lock"),
    ("target-size", "Target Size"),
    ("p-as-heading", "Paragraph Used as Heading"),
    ("presentation-role-conflict", "Presentation Role Conflict"),
    ("role-img-alt", "Role Img Alternative Text"),
    ("summary-name", "Summary Name"),
];

/// A WCAG success criterion as shown next to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WcagCriterion {
    pub id: &'static str,
    pub number: &'static str,
    pub name: &'static str,
    pub level: &'static str,
    pub version: &'static str,
    pub url: &'static str,
}

const fn criterion(
    id: &'static str,
    number: &'static str,
    name: &'static str,
    level: &'static str,
    version: &'static str,
    url: &'static str,
) -> WcagCriterion {
    WcagCriterion {
        id,
        number,
        name,
        level,
        version,
        url,
    }
}

const CRITERIA: &[WcagCriterion] = &[
    criterion(
        "wcag111",
        "1.1.1",
        "Non-text Content",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/non-text-content",
    ),
    criterion(
        "wcag121",
        "1.2.1",
        "Audio-only and Video-only (Prerecorded)",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/audio-only-and-video-only-prerecorded",
    ),
    criterion(
        "wcag122",
        "1.2.2",
        "Captions (Prerecorded)",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/captions-prerecorded",
    ),
    criterion(
        "wcag123",
        "1.2.3",
        "Audio Description or Media Alternative",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/audio-description-or-media-alternative-prerecorded",
    ),
    criterion(
        "wcag131",
        "1.3.1",
        "Info and Relationships",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/info-and-relationships",
    ),
    criterion(
        "wcag132",
        "1.3.2",
        "Meaningful Sequence",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/meaningful-sequence",
    ),
    criterion(
        "wcag133",
        "1.3.3",
        "Sensory Characteristics",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/sensory-characteristics",
    ),
    criterion(
        "wcag141",
        "1.4.1",
        "Use of Color",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/use-of-color",
    ),
    criterion(
        "wcag142",
        "1.4.2",
        "Audio Control",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/audio-control",
    ),
    criterion(
        "wcag211",
        "2.1.1",
        "Keyboard",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/keyboard",
    ),
    criterion(
        "wcag212",
        "2.1.2",
        "No Keyboard Trap",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/no-keyboard-trap",
    ),
    criterion(
        "wcag221",
        "2.2.1",
        "Timing Adjustable",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/timing-adjustable",
    ),
    criterion(
        "wcag222",
        "2.2.2",
        "Pause, Stop, Hide",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/pause-stop-hide",
    ),
    criterion(
        "wcag231",
        "2.3.1",
        "Three Flashes or Below Threshold",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/three-flashes-or-below-threshold",
    ),
    criterion(
        "wcag241",
        "2.4.1",
        "Bypass Blocks",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/bypass-blocks",
    ),
    criterion(
        "wcag242",
        "2.4.2",
        "Page Titled",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/page-titled",
    ),
    criterion(
        "wcag243",
        "2.4.3",
        "Focus Order",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/focus-order",
    ),
    criterion(
        "wcag244",
        "2.4.4",
        "Link Purpose (In Context)",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/link-purpose-in-context",
    ),
    criterion(
        "wcag251",
        "2.5.1",
        "Pointer Gestures",
        "A",
        "2.1",
        "https://www.w3.org/WAI/WCAG21/Understanding/pointer-gestures",
    ),
    criterion(
        "wcag252",
        "2.5.2",
        "Pointer Cancellation",
        "A",
        "2.1",
        "https://www.w3.org/WAI/WCAG21/Understanding/pointer-cancellation",
    ),
    criterion(
        "wcag253",
        "2.5.3",
        "Label in Name",
        "A",
        "2.1",
        "https://www.w3.org/WAI/WCAG21/Understanding/label-in-name",
    ),
    criterion(
        "wcag254",
        "2.5.4",
        "Motion Actuation",
        "A",
        "2.1",
        "https://www.w3.org/WAI/WCAG21/Understanding/motion-actuation",
    ),
    criterion(
        "wcag311",
        "3.1.1",
        "Language of Page",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/language-of-page",
    ),
    criterion(
        "wcag321",
        "3.2.1",
        "On Focus",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/on-focus",
    ),
    criterion(
        "wcag322",
        "3.2.2",
        "On Input",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/on-input",
    ),
    criterion(
        "wcag331",
        "3.3.1",
        "Error Identification",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/error-identification",
    ),
    criterion(
        "wcag332",
        "3.3.2",
        "Labels or Instructions",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/labels-or-instructions",
    ),
    criterion(
        "wcag411",
        "4.1.1",
        "Parsing",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/parsing",
    ),
    criterion(
        "wcag412",
        "4.1.2",
        "Name, Role, Value",
        "A",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/name-role-value",
    ),
    criterion(
        "wcag124",
        "1.2.4",
        "Captions (Live)",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/captions-live",
    ),
    criterion(
        "wcag125",
        "1.2.5",
        "Audio Description (Prerecorded)",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/audio-description-prerecorded",
    ),
    criterion(
        "wcag134",
        "1.3.4",
        "Orientation",
        "AA",
        "2.1",
        "https://www.w3.org/WAI/WCAG21/Understanding/orientation",
    ),
    criterion(
        "wcag135",
        "1.3.5",
        "Identify Input Purpose",
        "AA",
        "2.1",
        "https://www.w3.org/WAI/WCAG21/Understanding/identify-input-purpose",
    ),
    criterion(
        "wcag143",
        "1.4.3",
        "Contrast (Minimum)",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/contrast-minimum",
    ),
    criterion(
        "wcag144",
        "1.4.4",
        "Resize Text",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/resize-text",
    ),
    criterion(
        "wcag145",
        "1.4.5",
        "Images of Text",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/images-of-text",
    ),
    criterion(
        "wcag1410",
        "1.4.10",
        "Reflow",
        "AA",
        "2.1",
        "https://www.w3.org/WAI/WCAG21/Understanding/reflow",
    ),
    criterion(
        "wcag1411",
        "1.4.11",
        "Non-text Contrast",
        "AA",
        "2.1",
        "https://www.w3.org/WAI/WCAG21/Understanding/non-text-contrast",
    ),
    criterion(
        "wcag1412",
        "1.4.12",
        "Text Spacing",
        "AA",
        "2.1",
        "https://www.w3.org/WAI/WCAG21/Understanding/text-spacing",
    ),
    criterion(
        "wcag1413",
        "1.4.13",
        "Content on Hover or Focus",
        "AA",
        "2.1",
        "https://www.w3.org/WAI/WCAG21/Understanding/content-on-hover-or-focus",
    ),
    criterion(
        "wcag245",
        "2.4.5",
        "Multiple Ways",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/multiple-ways",
    ),
    criterion(
        "wcag246",
        "2.4.6",
        "Headings and Labels",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/headings-and-labels",
    ),
    criterion(
        "wcag247",
        "2.4.7",
        "Focus Visible",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/focus-visible",
    ),
    criterion(
        "wcag312",
        "3.1.2",
        "Language of Parts",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/language-of-parts",
    ),
    criterion(
        "wcag323",
        "3.2.3",
        "Consistent Navigation",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/consistent-navigation",
    ),
    criterion(
        "wcag324",
        "3.2.4",
        "Consistent Identification",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/consistent-identification",
    ),
    criterion(
        "wcag333",
        "3.3.3",
        "Error Suggestion",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/error-suggestion",
    ),
    criterion(
        "wcag334",
        "3.3.4",
        "Error Prevention (Legal, Financial, Data)",
        "AA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/error-prevention-legal-financial-data",
    ),
    criterion(
        "wcag413",
        "4.1.3",
        "Status Messages",
        "AA",
        "2.1",
        "https://www.w3.org/WAI/WCAG21/Understanding/status-messages",
    ),
    criterion(
        "wcag2411",
        "2.4.11",
        "Focus Not Obscured (Minimum)",
        "AA",
        "2.2",
        "https://www.w3.org/WAI/WCAG22/Understanding/focus-not-obscured-minimum",
    ),
    criterion(
        "wcag257",
        "2.5.7",
        "Dragging Movements",
        "AA",
        "2.2",
        "https://www.w3.org/WAI/WCAG22/Understanding/dragging-movements",
    ),
    criterion(
        "wcag258",
        "2.5.8",
        "Target Size (Minimum)",
        "AA",
        "2.2",
        "https://www.w3.org/WAI/WCAG22/Understanding/target-size-minimum",
    ),
    criterion(
        "wcag326",
        "3.2.6",
        "Consistent Help",
        "A",
        "2.2",
        "https://www.w3.org/WAI/WCAG22/Understanding/consistent-help",
    ),
    criterion(
        "wcag337",
        "3.3.7",
        "Redundant Entry",
        "A",
        "2.2",
        "https://www.w3.org/WAI/WCAG22/Understanding/redundant-entry",
    ),
    criterion(
        "wcag338",
        "3.3.8",
        "Accessible Authentication (Minimum)",
        "AA",
        "2.2",
        "https://www.w3.org/WAI/WCAG22/Understanding/accessible-authentication-minimum",
    ),
    criterion(
        "wcag146",
        "1.4.6",
        "Contrast (Enhanced)",
        "AAA",
        "2.0",
        "https://www.w3.org/WAI/WCAG21/Understanding/contrast-enhanced",
    ),
];

fn lookup_criterion(id: &str) -> Option<WcagCriterion> {
    CRITERIA.iter().find(|c| c.id == id).copied()
}

const RULE_CRITERIA: &[(&str, &[&str])] = &[
    ("color-contrast", &["wcag143"]),
    ("color-contrast-enhanced", &["wcag146"]),
    ("image-alt", &["wcag111"]),
    ("input-image-alt", &["wcag111", "wcag412"]),
    ("object-alt", &["wcag111"]),
    ("svg-img-alt", &["wcag111"]),
    ("area-alt", &["wcag111", "wcag244"]),
    ("label", &["wcag111", "wcag131", "wcag412"]),
    ("input-button-name", &["wcag412"]),
    ("select-name", &["wcag412", "wcag131"]),
    ("autocomplete-valid", &["wcag135"]),
    ("link-name", &["wcag244", "wcag412"]),
    ("button-name", &["wcag412"]),
    ("heading-order", &["wcag131"]),
    ("empty-heading", &["wcag131"]),
    ("page-has-heading-one", &["wcag131"]),
    ("document-title", &["wcag242"]),
    ("html-has-lang", &["wcag311"]),
    ("html-lang-valid", &["wcag311"]),
    ("valid-lang", &["wcag312"]),
    ("landmark-one-main", &["wcag131"]),
    ("bypass", &["wcag241"]),
    ("frame-title", &["wcag241", "wcag412"]),
    ("aria-allowed-attr", &["wcag412"]),
    ("aria-hidden-focus", &["wcag412", "wcag211"]),
    ("aria-required-attr", &["wcag412"]),
    ("aria-required-children", &["wcag131"]),
    ("aria-required-parent", &["wcag131"]),
    ("aria-roles", &["wcag412"]),
    ("aria-valid-attr", &["wcag412"]),
    ("aria-valid-attr-value", &["wcag412"]),
    ("tabindex", &["wcag211"]),
    ("focus-not-trapped", &["wcag212"]),
    ("audio-caption", &["wcag122", "wcag124"]),
    ("video-caption", &["wcag122", "wcag124"]),
    ("video-description", &["wcag123", "wcag125"]),
    ("blink", &["wcag222"]),
    ("marquee", &["wcag222"]),
    ("meta-refresh", &["wcag221", "wcag222"]),
    ("meta-viewport", &["wcag144"]),
    ("duplicate-id", &["wcag411"]),
    ("duplicate-id-active", &["wcag411"]),
    ("duplicate-id-aria", &["wcag411"]),
    ("target-size", &["wcag258"]),
    ("css-orientation-lock", &["wcag134"]),
];

const QUICK_FIX_RULES: &[&str] = &[
    "image-alt",
    "button-name",
    "link-name",
    "document-title",
    "html-has-lang",
    "html-lang-valid",
    "frame-title",
    "aria-required-attr",
    "aria-valid-attr",
    "aria-valid-attr-value",
    "label",
    "empty-heading",
    "duplicate-id",
    "meta-viewport",
];

const COMPLEX_FIX_RULES: &[&str] = &[
    "color-contrast",
    "color-contrast-enhanced",
    "bypass",
    "focus-order-semantics",
    "landmark-one-main",
    "region",
    "focus-not-trapped",
    "nested-interactive",
    "aria-hidden-focus",
    "heading-order",
    "table-fake-caption",
];

const DEFAULT_FIX_GUIDANCE: &str =
    "Review the element and ensure it meets accessibility requirements.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixComplexity {
    Quick,
    Moderate,
    Complex,
}

impl FixComplexity {
    /// Minutes for a single batch of up to five elements.
    fn base_minutes(self) -> (u32, u32) {
        match self {
            Self::Quick => (1, 5),
            Self::Moderate => (5, 15),
            Self::Complex => (15, 45),
        }
    }

    fn for_rule(rule: &AxeRuleResult) -> Self {
        let nodes = rule.nodes.len();
        let id = rule.id.as_str();
        if QUICK_FIX_RULES.contains(&id) {
            return if nodes > 10 { Self::Moderate } else { Self::Quick };
        }
        if COMPLEX_FIX_RULES.contains(&id) {
            return Self::Complex;
        }
        if nodes > 20 || rule.impact == Some(Impact::Critical) {
            Self::Complex
        } else if nodes > 5 || rule.impact == Some(Impact::Serious) {
            Self::Moderate
        } else {
            Self::Quick
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minutes,
    Hours,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FixTimeEstimate {
    pub min: f64,
    pub max: f64,
    pub unit: TimeUnit,
}

impl FixTimeEstimate {
    fn for_nodes(complexity: FixComplexity, node_count: usize) -> Self {
        let (min, max) = complexity.base_minutes();
        let multiplier = node_count.div_ceil(5).max(1) as f64;
        Self {
            min: f64::from(min) * multiplier,
            max: f64::from(max) * multiplier,
            unit: TimeUnit::Minutes,
        }
    }

    /// Sum of per-rule minutes, switched to hours (one decimal) past two hours.
    fn total(violations: &[ProcessedViolation]) -> Self {
        let min: f64 = violations.iter().map(|v| v.estimated_fix_time.min).sum();
        let max: f64 = violations.iter().map(|v| v.estimated_fix_time.max).sum();
        if max > 120.0 {
            let hours = |minutes: f64| (minutes / 60.0 * 10.0).round() / 10.0;
            return Self {
                min: hours(min),
                max: hours(max),
                unit: TimeUnit::Hours,
            };
        }
        Self {
            min,
            max,
            unit: TimeUnit::Minutes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementContext {
    pub tag_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_tag_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_class_name: Option<String>,
    pub formatted_selector: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedElement {
    pub html: String,
    pub selector: String,
    pub formatted_selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_guidance: Option<String>,
    pub context: ElementContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedViolation {
    pub id: String,
    pub rule_name: String,
    pub human_readable_name: String,
    pub impact: Impact,
    pub description: String,
    pub help: String,
    pub help_url: String,
    pub wcag_criteria: Vec<WcagCriterion>,
    pub wcag_criteria_strings: Vec<String>,
    pub fix_complexity: FixComplexity,
    pub estimated_fix_time: FixTimeEstimate,
    pub priority_score: u32,
    pub affected_elements: Vec<AffectedElement>,
    pub fix_guidance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedPass {
    pub id: String,
    pub rule_name: String,
    pub human_readable_name: String,
    pub description: String,
    pub help: String,
    pub help_url: String,
    pub wcag_criteria: Vec<WcagCriterion>,
    pub wcag_criteria_strings: Vec<String>,
    pub checked_elements: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedIncomplete {
    pub id: String,
    pub rule_name: String,
    pub human_readable_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    pub description: String,
    pub help: String,
    pub help_url: String,
    pub wcag_criteria: Vec<WcagCriterion>,
    pub wcag_criteria_strings: Vec<String>,
    pub affected_elements: Vec<AffectedElement>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImpactBreakdown {
    pub critical: usize,
    pub serious: usize,
    pub moderate: usize,
    pub minor: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComplexityBreakdown {
    pub quick: usize,
    pub moderate: usize,
    pub complex: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub violations: usize,
    pub passes: usize,
    pub incomplete: usize,
    pub total_issues: usize,
    pub compliance_score: u32,
    pub impact_breakdown: ImpactBreakdown,
    pub fix_complexity_breakdown: ComplexityBreakdown,
    pub estimated_fix_time: FixTimeEstimate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResults {
    pub url: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_metadata: Option<PageMetadata>,
    pub violations: Vec<ProcessedViolation>,
    pub passes: Vec<ProcessedPass>,
    pub incomplete: Vec<ProcessedIncomplete>,
    pub summary: ResultSummary,
}

/// Display name for a rule id. Unknown ids are title-cased from kebab-case.
///
/// # Example
/// ```
/// use wcag_core::accessibility::format_rule_name;
/// assert_eq!(format_rule_name("image-alt"), "Image Alternative Text");
/// assert_eq!(format_rule_name("custom-widget-rule"), "Custom Widget Rule");
/// ```
pub fn format_rule_name(rule_id: &str) -> String {
    if let Some((_, name)) = RULE_NAMES.iter().find(|(id, _)| *id == rule_id) {
        return name.to_string();
    }
    rule_id
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn criterion_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^wcag\d{2,4}$").unwrap())
}

/// Criteria for a rule: its own mapping first, then any `wcagNNN` tags.
pub fn wcag_criteria_for(rule_id: &str, tags: &[String]) -> Vec<WcagCriterion> {
    let mapped = RULE_CRITERIA
        .iter()
        .find(|(id, _)| *id == rule_id)
        .map(|(_, ids)| *ids)
        .unwrap_or_default();
    let tagged = tags
        .iter()
        .map(String::as_str)
        .filter(|tag| criterion_tag_re().is_match(tag));

    let mut criteria: Vec<WcagCriterion> = Vec::new();
    for id in mapped.iter().copied().chain(tagged) {
        if criteria.iter().any(|c| c.id == id) {
            continue;
        }
        if let Some(found) = lookup_criterion(id) {
            criteria.push(found);
        }
    }
    criteria
}

fn conformance_levels(tags: &[String]) -> Vec<String> {
    let mut levels: Vec<String> = Vec::new();
    let mut push = |level: &str| {
        if !levels.iter().any(|seen| seen == level) {
            levels.push(level.to_string());
        }
    };
    for tag in tags.iter().filter(|tag| tag.starts_with("wcag")) {
        if tag.contains("2a") && !tag.contains("2aa") {
            push("WCAG 2.0 Level A");
        }
        if tag.contains("2aa") {
            push("WCAG 2.0 Level AA");
        }
        if tag.contains("21aa") {
            push("WCAG 2.1 Level AA");
        }
        if tag.contains("22aa") {
            push("WCAG 2.2 Level AA");
        }
    }
    levels
}

fn criteria_strings(criteria: &[WcagCriterion], tags: &[String]) -> Vec<String> {
    if criteria.is_empty() {
        return conformance_levels(tags);
    }
    criteria
        .iter()
        .map(|c| format!("{} {} (Level {})", c.number, c.name, c.level))
        .collect()
}

/// Joins the target path with ` > `, collapsing long paths to their ends.
pub fn format_selector(target: &[String]) -> String {
    let selector = target.join(" > ");
    if selector.len() > 100 && target.len() > 3 {
        return format!("{} > ... > {}", target[0], target[target.len() - 1]);
    }
    selector
}

struct ContextPatterns {
    target_tag: Regex,
    target_class: Regex,
    target_id: Regex,
    html_tag: Regex,
    html_id: Regex,
    html_class: Regex,
    aria_label: Regex,
    role: Regex,
    text: Regex,
}

fn context_patterns() -> &'static ContextPatterns {
    static PATTERNS: OnceLock<ContextPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ContextPatterns {
        target_tag: Regex::new(r"(?i)^([a-z][a-z0-9]*)").unwrap(),
        target_class: Regex::new(r"\.([a-zA-Z0-9_-]+)").unwrap(),
        target_id: Regex::new(r"#([a-zA-Z0-9_-]+)").unwrap(),
        html_tag: Regex::new(r"(?i)<([a-z][a-z0-9]*)").unwrap(),
        html_id: Regex::new(r#"(?i)id=["']([^"']+)["']"#).unwrap(),
        html_class: Regex::new(r#"(?i)class=["']([^"']+)["']"#).unwrap(),
        aria_label: Regex::new(r#"(?i)aria-label=["']([^"']+)["']"#).unwrap(),
        role: Regex::new(r#"(?i)role=["']([^"']+)["']"#).unwrap(),
        text: Regex::new(r">([^<]+)<").unwrap(),
    })
}

fn first_capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Best-effort description of the element behind a node, read from its
/// selector and markup.
///
/// # Example
/// ```
/// use wcag_core::accessibility::{AxeNode, extract_element_context};
/// let node = AxeNode {
///     html: r#"<button class="btn primary" aria-label="Save">Save</button>"#.into(),
///     target: vec!["button.btn.primary".into()],
///     ..AxeNode::default()
/// };
/// let context = extract_element_context(&node);
/// assert_eq!(context.tag_name, "BUTTON");
/// assert_eq!(context.class_name.as_deref(), Some("btn primary"));
/// assert_eq!(context.aria_label.as_deref(), Some("Save"));
/// ```
pub fn extract_element_context(node: &AxeNode) -> ElementContext {
    let patterns = context_patterns();
    let target = node.target.first().map(String::as_str).unwrap_or_default();
    let html = node.html.as_str();

    let target_classes: Vec<&str> = patterns
        .target_class
        .captures_iter(target)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    let class_name = if target_classes.is_empty() {
        first_capture(&patterns.html_class, html)
    } else {
        Some(target_classes.join(" "))
    };

    let text = patterns
        .text
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim()))
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let parent = node.element.as_ref().and_then(|el| el.parent_info.as_ref());

    ElementContext {
        tag_name: first_capture(&patterns.target_tag, target)
            .or_else(|| first_capture(&patterns.html_tag, html))
            .unwrap_or_else(|| "element".to_string())
            .to_uppercase(),
        class_name: class_name.map(|name| name.chars().take(50).collect()),
        id: first_capture(&patterns.target_id, target)
            .or_else(|| first_capture(&patterns.html_id, html)),
        text_content: (!text.is_empty()).then(|| text.chars().take(100).collect()),
        aria_label: first_capture(&patterns.aria_label, html),
        aria_role: first_capture(&patterns.role, html),
        parent_tag_name: parent.map(|p| p.tag_name.clone()),
        parent_class_name: parent.and_then(|p| p.class_name.clone()),
        formatted_selector: format_selector(&node.target),
    }
}

fn fix_guidance(node: &AxeNode) -> String {
    let messages = node
        .any
        .iter()
        .chain(&node.all)
        .chain(&node.none)
        .map(|check| check.message.as_str())
        .filter(|message| !message.is_empty());
    let guidance = node
        .failure_summary
        .as_deref()
        .filter(|summary| !summary.is_empty())
        .into_iter()
        .chain(messages)
        .collect::<Vec<_>>()
        .join(" ");
    if guidance.is_empty() {
        DEFAULT_FIX_GUIDANCE.to_string()
    } else {
        guidance
    }
}

fn affected_element(node: &AxeNode, with_guidance: bool) -> AffectedElement {
    AffectedElement {
        html: node.html.clone(),
        selector: node.target.join(" "),
        formatted_selector: format_selector(&node.target),
        failure_summary: node.failure_summary.clone(),
        fix_guidance: with_guidance.then(|| fix_guidance(node)),
        context: extract_element_context(node),
    }
}

fn priority_score(impact: Option<Impact>, node_count: usize, complexity: FixComplexity) -> u32 {
    let impact_weight = match impact {
        Some(Impact::Critical) => 40,
        Some(Impact::Serious) => 30,
        Some(Impact::Moderate) => 20,
        Some(Impact::Minor) => 10,
        None => 15,
    };
    let frequency = (node_count as u32).saturating_mul(3).min(30);
    let quick_win = match complexity {
        FixComplexity::Quick => 20,
        FixComplexity::Moderate => 10,
        FixComplexity::Complex => 0,
    };
    impact_weight + frequency + quick_win
}

fn process_violation(rule: &AxeRuleResult) -> ProcessedViolation {
    let complexity = FixComplexity::for_rule(rule);
    let criteria = wcag_criteria_for(&rule.id, &rule.tags);
    ProcessedViolation {
        id: rule.id.clone(),
        rule_name: rule.id.clone(),
        human_readable_name: format_rule_name(&rule.id),
        impact: rule.impact.unwrap_or(Impact::Moderate),
        description: rule.description.clone(),
        help: rule.help.clone(),
        help_url: rule.help_url.clone(),
        wcag_criteria_strings: criteria_strings(&criteria, &rule.tags),
        wcag_criteria: criteria,
        fix_complexity: complexity,
        estimated_fix_time: FixTimeEstimate::for_nodes(complexity, rule.nodes.len()),
        priority_score: priority_score(rule.impact, rule.nodes.len(), complexity),
        affected_elements: rule.nodes.iter().map(|node| affected_element(node, true)).collect(),
        fix_guidance: rule.help.clone(),
    }
}

fn process_pass(rule: &AxeRuleResult) -> ProcessedPass {
    let criteria = wcag_criteria_for(&rule.id, &rule.tags);
    ProcessedPass {
        id: rule.id.clone(),
        rule_name: rule.id.clone(),
        human_readable_name: format_rule_name(&rule.id),
        description: rule.description.clone(),
        help: rule.help.clone(),
        help_url: rule.help_url.clone(),
        wcag_criteria_strings: criteria_strings(&criteria, &rule.tags),
        wcag_criteria: criteria,
        checked_elements: rule.nodes.len(),
    }
}

fn process_incomplete(rule: &AxeRuleResult) -> ProcessedIncomplete {
    let criteria = wcag_criteria_for(&rule.id, &rule.tags);
    ProcessedIncomplete {
        id: rule.id.clone(),
        rule_name: rule.id.clone(),
        human_readable_name: format_rule_name(&rule.id),
        impact: rule.impact,
        description: rule.description.clone(),
        help: rule.help.clone(),
        help_url: rule.help_url.clone(),
        wcag_criteria_strings: criteria_strings(&criteria, &rule.tags),
        wcag_criteria: criteria,
        affected_elements: rule.nodes.iter().map(|node| affected_element(node, false)).collect(),
    }
}

/// Impact-weighted share of rules that passed, 0..=100. An empty run scores 100.
fn compliance_score(violations: &[ProcessedViolation], passes: usize) -> u32 {
    let total = violations.len() + passes;
    if total == 0 {
        return 100;
    }
    let max_weight = (total * 4) as f64;
    let weighted: u32 = violations.iter().map(|v| v.impact.weight()).sum();
    let score = ((max_weight - f64::from(weighted)) / max_weight * 100.0).round();
    score.clamp(0.0, 100.0) as u32
}

/// Turns raw rule results into the report the tester renders.
///
/// `timestamp` is stamped verbatim; callers pass an ISO-8601 string.
/// Violations come back sorted by priority, highest first.
pub fn process_results(
    url: &str,
    timestamp: &str,
    raw: &AxeResults,
    page_metadata: Option<PageMetadata>,
) -> ProcessedResults {
    let mut violations: Vec<ProcessedViolation> = raw.violations.iter().map(process_violation).collect();
    let passes: Vec<ProcessedPass> = raw.passes.iter().map(process_pass).collect();
    let incomplete: Vec<ProcessedIncomplete> = raw.incomplete.iter().map(process_incomplete).collect();

    violations.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));

    let mut impact_breakdown = ImpactBreakdown::default();
    let mut fix_complexity_breakdown = ComplexityBreakdown::default();
    for violation in &violations {
        match violation.impact {
            Impact::Critical => impact_breakdown.critical += 1,
            Impact::Serious => impact_breakdown.serious += 1,
            Impact::Moderate => impact_breakdown.moderate += 1,
            Impact::Minor => impact_breakdown.minor += 1,
        }
        match violation.fix_complexity {
            FixComplexity::Quick => fix_complexity_breakdown.quick += 1,
            FixComplexity::Moderate => fix_complexity_breakdown.moderate += 1,
            FixComplexity::Complex => fix_complexity_breakdown.complex += 1,
        }
    }

    let summary = ResultSummary {
        violations: violations.len(),
        passes: passes.len(),
        incomplete: incomplete.len(),
        total_issues: violations.len() + incomplete.len(),
        compliance_score: compliance_score(&violations, passes.len()),
        impact_breakdown,
        fix_complexity_breakdown,
        estimated_fix_time: FixTimeEstimate::total(&violations),
    };

    ProcessedResults {
        url: url.to_string(),
        timestamp: timestamp.to_string(),
        page_metadata,
        violations,
        passes,
        incomplete,
        summary,
    }
}
