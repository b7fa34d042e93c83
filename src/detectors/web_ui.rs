//! Browser end-to-end tests. These run on the system tier but are held to a
//! stricter rule: if a real user could not do it, the test must not do it
//! either. One navigation to the login page is allowed; everything after
//! that happens through user interaction primitives.

use regex::Regex;

use super::{compile, DetectorKind, Rule, TierDetector};
use crate::analysis::analyzer::{Finding, ValidationContext};
use crate::analysis::patterns::match_ranges;
use crate::analysis::types::{Detection, MockKind, Severity};

const AUTOMATION_IMPORT: &str = r#"(?im)(?:\bfrom\s+|\bimport\s+|\brequire\s*\(\s*)['"](?:@playwright/test|playwright(?:-core)?|puppeteer(?:-core)?|selenium-webdriver|webdriverio|@wdio/[\w-]+|cypress)['"]|^\s*(?:from|import)\s+(?:playwright|selenium)\b"#;
const INTERACTION_CALL: &str = r"\.(?:click|dblclick|hover|fill|type|press|selectOption|check|uncheck|tap|dragTo|dragAndDrop|sendKeys|setValue)\s*\(";
const NAVIGATION_CALL: &str = r"\.goto\s*\(|\bdriver\.get\s*\(|\.navigate\(\)\.to\s*\(|\bcy\.visit\s*\(|\bbrowser\.url\s*\(";
const LOGIN_MENTION: &str = r"(?i)login|auth|sign[-_]?in";

pub const ALLOWED_INTERACTIONS: [&str; 11] = [
    "click",
    "double-click",
    "hover",
    "drag-and-drop",
    "type/fill",
    "key-press",
    "select",
    "check/uncheck",
    "focus/blur",
    "tap",
    "right-click",
];

#[derive(Debug, Clone)]
pub struct WebUiDetector {
    automation_import: Regex,
    interaction_call: Regex,
    navigation_call: Regex,
    login_mention: Regex,
    forbidden: Vec<Rule>,
}

impl WebUiDetector {
    pub fn new() -> crate::Result<Self> {
        let forbidden = vec![
            Rule::new(
                "web-ui-script-evaluation",
                r"\.(?:evaluate|evaluateHandle|\$eval|\$\$eval)\s*\(|\bexecute(?:Script|_script|AsyncScript)\s*\(",
                MockKind::Function,
                Severity::High,
                "Direct script evaluation in the page",
                "Drive the page through user interactions instead of evaluating scripts",
            )?,
            Rule::new(
                "web-ui-script-injection",
                r"\.(?:addScriptTag|addStyleTag|addInitScript)\s*\(",
                MockKind::Function,
                Severity::High,
                "Script or style injected into the page",
                "Do not inject code; test the page as it is shipped",
            )?,
            Rule::new(
                "web-ui-dom-access",
                r"(?m)(?:^|[^.\w$])((?:document|window)\.\w+)",
                MockKind::Stub,
                Severity::High,
                "Direct document/window access",
                "Assert on what a user can see through locators instead of reading the DOM",
            )?,
            Rule::new(
                "web-ui-storage-access",
                r"(?m)(?:^|[^.\w$])((?:localStorage|sessionStorage)\.\w+)",
                MockKind::Stub,
                Severity::High,
                "Direct browser storage access",
                "Reach the desired state through the UI, not by writing storage",
            )?,
            Rule::new(
                "web-ui-inner-html",
                r"\.(?:innerHTML|outerHTML)\s*=[^=]",
                MockKind::Stub,
                Severity::High,
                "DOM mutated through innerHTML",
                "Never rewrite the page under test",
            )?,
            Rule::new(
                "web-ui-route-interception",
                r"\.route\s*\(|\bsetRequestInterception\s*\(|\bcy\.intercept\s*\(",
                MockKind::Network,
                Severity::High,
                "Network route interception",
                "Let the browser talk to the real backend",
            )?,
        ];
        Ok(Self {
            automation_import: compile("automation-import", AUTOMATION_IMPORT)?,
            interaction_call: compile("interaction-call", INTERACTION_CALL)?,
            navigation_call: compile("navigation-call", NAVIGATION_CALL)?,
            login_mention: compile("login-mention", LOGIN_MENTION)?,
            forbidden,
        })
    }

    fn navigation_findings(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        let source = ctx.source;
        let navigations: Vec<(usize, usize)> = match_ranges(&self.navigation_call, source.content())
            .into_iter()
            .filter(|range| !source.in_comment(range.start))
            .map(|range| (range.start, source.line_of(range.start)))
            .collect();

        let mut findings = Vec::new();
        if navigations.len() > 1 {
            findings.push(Finding {
                offset: navigations[1].0,
                mock_kind: MockKind::Network,
                severity: Severity::Critical,
                pattern: "web-ui-multiple-navigation".to_string(),
                description: format!(
                    "{} navigation calls; only a single login-page navigation is allowed",
                    navigations.len()
                ),
                recommendation: "Navigate once to the login page and reach every other page by clicking through the UI"
                    .to_string(),
            });
        }
        for &(offset, line) in &navigations {
            if !self.login_mention.is_match(source.line(line)) {
                findings.push(Finding {
                    offset,
                    mock_kind: MockKind::Network,
                    severity: Severity::Critical,
                    pattern: "web-ui-direct-navigation".to_string(),
                    description: format!("Direct navigation to a non-login page: `{}`", source.line(line).trim()),
                    recommendation: "Reach this page through links and buttons like a user would".to_string(),
                });
            }
        }
        findings
    }
}

impl TierDetector for WebUiDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::WebUi
    }

    fn custom_validation(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        let content = ctx.content();
        let has_import = self.automation_import.is_match(content);
        if !has_import && !self.interaction_call.is_match(content) {
            return Vec::new();
        }

        let mut findings = Vec::new();
        if !has_import {
            findings.push(Finding {
                offset: 0,
                mock_kind: MockKind::Module,
                severity: Severity::Critical,
                pattern: "web-ui-missing-automation-import".to_string(),
                description: "UI test without a browser automation library import".to_string(),
                recommendation: "Drive a real browser with Playwright, Puppeteer, Selenium, WebdriverIO or Cypress"
                    .to_string(),
            });
        }
        findings.extend(self.navigation_findings(ctx));
        for rule in &self.forbidden {
            findings.extend(rule.apply_outside_comments(ctx.source));
        }
        findings
    }

    fn add_type_specific_recommendations(&self, recommendations: &mut Vec<String>, detections: &[Detection]) {
        recommendations.push(format!(
            "UI tests may only use real user interactions: {}",
            ALLOWED_INTERACTIONS.join(", ")
        ));
        if detections.iter().any(|d| d.severity == Severity::High) {
            recommendations.push("If a real user could not do it, the test must not do it either".to_string());
        }
    }
}
