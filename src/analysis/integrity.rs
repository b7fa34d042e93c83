//! Test-integrity checks that hold on every tier: tests that never run,
//! tests that cannot fail and files that assert nothing. Opt-in through
//! [`AnalyzerOptions::test_integrity`](super::AnalyzerOptions).

use regex::Regex;

use super::analyzer::Finding;
use super::source::SourceText;
use super::types::{MockKind, Severity};
use crate::detectors::{compile, Rule};
use crate::error::Result;

const TEST_DECLARATION: &str = r"(?m)\b(?:it|test|specify)\s*\(|^[ \t]*def[ \t]+test_\w*\s*\(";
const ASSERTION: &str = r"\bexpect\s*[(.]|\bassert\w*\s*[(.]|\bassert[ \t]+\S|\.should\b|\.assert\w*\s*\(|\bt\.(?:is|deepEqual|true|truthy|throws)\s*\(";

#[derive(Debug, Clone)]
pub struct IntegrityChecker {
    rules: Vec<Rule>,
    focused: Rule,
    test_declaration: Regex,
    assertion: Regex,
}

impl IntegrityChecker {
    pub fn new() -> Result<Self> {
        let rules = vec![
            Rule::new(
                "test-skipped",
                r"\b(?:(?:it|test|describe|context|suite)\.skip|xit|xtest|xdescribe|xcontext)\s*\(|@(?:pytest\.mark\.skip\w*|unittest\.skip\w*)",
                MockKind::Stub,
                Severity::Medium,
                "Skipped test never runs",
                "Fix or delete the skipped test; disabled tests hide regressions",
            )?,
            Rule::new(
                "test-empty-body",
                r#"(?m)\b(?:it|test)\s*\(\s*(?:'[^'\n]*'|"[^"\n]*"|`[^`\n]*`)\s*,\s*(?:async\s+)?(?:(?:\([^)]*\)|\w+)\s*=>|function\s*\w*\s*\([^)]*\))\s*\{\s*\}\s*\)|^[ \t]*def[ \t]+test_\w*\s*\([^)]*\)\s*(?:->\s*\w+\s*)?:\s*(?:pass|\.\.\.)[ \t]*\r?$"#,
                MockKind::Fake,
                Severity::High,
                "Empty test with no assertions",
                "Give the test a body that exercises the code and asserts on the outcome",
            )?,
            Rule::new(
                "test-always-true",
                r"\bexpect\s*\(\s*(?:true\s*\)\s*\.\s*(?:toBe|toEqual|toStrictEqual)\s*\(\s*true|false\s*\)\s*\.\s*(?:toBe|toEqual|toStrictEqual)\s*\(\s*false|1\s*\)\s*\.\s*(?:toBe|toEqual|toStrictEqual)\s*\(\s*1|true\s*\)\s*\.\s*toBeTruthy\s*\()\s*\)|\bassert(?:\.ok)?\s*\(\s*true\s*\)|\bassert[ \t]+True\b|\bassertTrue\s*\(\s*True\s*\)",
                MockKind::Fake,
                Severity::Critical,
                "Assertion that can never fail",
                "Assert on a value produced by the code under test",
            )?,
        ];
        Ok(Self {
            rules,
            focused: Rule::new(
                "test-focused",
                r"(?m)(?:^|[^.\w$])((?:(?:it|test|describe|context|suite)\.only|fit|fdescribe)\s*\()",
                MockKind::Stub,
                Severity::High,
                "Focused test silently skips the rest of the suite",
                "Remove .only() before merging",
            )?,
            test_declaration: compile("test-declaration", TEST_DECLARATION)?,
            assertion: compile("assertion", ASSERTION)?,
        })
    }

    /// Findings for one file. `check_focused` is off where the tier detector
    /// already reports focused tests with its own severity.
    pub fn check(&self, source: &SourceText<'_>, check_focused: bool) -> Vec<Finding> {
        let mut findings: Vec<Finding> = self
            .rules
            .iter()
            .flat_map(|rule| rule.apply_outside_comments(source))
            .collect();
        if check_focused {
            findings.extend(self.focused.apply_outside_comments(source));
        }
        if let Some(first) = self.first_test(source) {
            if !self.has_assertion(source) {
                findings.push(Finding {
                    offset: first,
                    mock_kind: MockKind::Fake,
                    severity: Severity::High,
                    pattern: "test-no-assertions".to_string(),
                    description: "Test file contains no assertions".to_string(),
                    recommendation: "Every test must assert on observable behavior".to_string(),
                });
            }
        }
        findings
    }

    fn first_test(&self, source: &SourceText<'_>) -> Option<usize> {
        self.test_declaration
            .find_iter(source.content())
            .map(|m| m.start())
            .find(|&offset| !source.in_comment(offset))
    }

    fn has_assertion(&self, source: &SourceText<'_>) -> bool {
        self.assertion
            .find_iter(source.content())
            .any(|m| !source.in_comment(m.start()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn findings(content: &str) -> Vec<Finding> {
        let checker = IntegrityChecker::new().unwrap();
        checker.check(&SourceText::new(content), true)
    }

    fn only(found: &[Finding], pattern: &str) -> Vec<Severity> {
        found.iter().filter(|f| f.pattern == pattern).map(|f| f.severity).collect()
    }

    #[test]
    fn skipped_tests_are_medium() {
        let content = "it.skip('a', () => { expect(a).toBe(1); });\nxit('b', () => {});\ndescribe.skip('c', () => {});\n";
        let found = findings(content);
        assert_eq!(only(&found, "test-skipped"), vec![Severity::Medium; 3]);
    }

    #[test]
    fn empty_bodies_are_high() {
        let content = "test('does nothing', async () => {});\nit(\"x\", function () { })\nit('real', () => { expect(sum(1, 1)).toBe(2); });\n";
        let found = findings(content);
        assert_eq!(only(&found, "test-empty-body"), vec![Severity::High; 2]);
        assert!(only(&found, "test-no-assertions").is_empty());

        let python = "def test_nothing(self):\n    pass\n\ndef test_sum():\n    assert sum([1]) == 1\n";
        assert_eq!(only(&findings(python), "test-empty-body"), vec![Severity::High]);
    }

    #[test]
    fn always_true_assertions_are_critical() {
        let content = "it('a', () => {\n  expect(true).toBe(true);\n  expect(true).toBeTruthy();\n  assert.ok(true);\n  expect(result).toBe(true);\n});\n";
        let found = findings(content);
        assert_eq!(only(&found, "test-always-true"), vec![Severity::Critical; 3]);
    }

    #[test]
    fn file_without_assertions_is_flagged_once() {
        let content = "// expect(x) is commented out\nit('renders', () => {\n  render(<App />);\n});\nit('clicks', () => {\n  click();\n});\n";
        let found = findings(content);
        assert_eq!(only(&found, "test-no-assertions"), vec![Severity::High]);
        let source = SourceText::new(content);
        let finding = found.iter().find(|f| f.pattern == "test-no-assertions").unwrap();
        assert_eq!(source.line_of(finding.offset), 2);

        assert!(findings("export const helper = () => 1;\n").is_empty());
    }

    #[test]
    fn focused_tests_are_high_and_optional() {
        let content = "it.only('a', () => { expect(1 + 1).toBe(2); });\nfdescribe('b', () => {});\nmodel.fit(data);\n";
        let found = findings(content);
        assert_eq!(only(&found, "test-focused"), vec![Severity::High; 2]);

        let checker = IntegrityChecker::new().unwrap();
        let without = checker.check(&SourceText::new(content), false);
        assert!(only(&without, "test-focused").is_empty());
    }
}
