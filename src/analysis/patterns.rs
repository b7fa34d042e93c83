//! Catalog of named test-double patterns.
//!
//! Matchers with a capture group report the group's span instead of the whole
//! match, which lets a matcher require a non-identifier character before the
//! keyword without shifting the reported column.

use std::ops::Range;

use regex::Regex;

use super::types::MockKind;
use crate::error::{FraudCheckError, Result};

/// Uncompiled catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct PatternSpec {
    pub name: &'static str,
    pub mock_kind: MockKind,
    pub description: &'static str,
    pub frameworks: &'static [&'static str],
    pub matchers: &'static [&'static str],
}

pub const STANDARD_PATTERNS: &[PatternSpec] = &[
    PatternSpec {
        name: "framework-module-mock",
        mock_kind: MockKind::Module,
        description: "Module replaced through the test framework's module mocking",
        frameworks: &["jest", "vitest", "proxyquire", "mockery"],
        matchers: &[
            r"\b(?:jest|vi)\.(?:mock|doMock|unstable_mockModule)\s*\(",
            r"\bproxyquire\b",
            r"\bmockery\.registerMock\s*\(",
        ],
    },
    PatternSpec {
        name: "python-patch",
        mock_kind: MockKind::Module,
        description: "Attribute or module patched with unittest.mock",
        frameworks: &["unittest.mock", "pytest-mock"],
        matchers: &[
            r"@(?:mock\.)?patch(?:\.object|\.dict)?\s*\(",
            r"\bwith\s+(?:mock\.)?patch(?:\.object|\.dict)?\s*\(",
            r"\bmocker\.patch(?:\.object|\.dict)?\s*\(",
        ],
    },
    PatternSpec {
        name: "framework-function-mock",
        mock_kind: MockKind::Function,
        description: "Mock function created or programmed through the test framework",
        frameworks: &["jest", "vitest"],
        matchers: &[
            r"\b(?:jest|vi)\.fn\s*\(",
            r"\.mock(?:Implementation|ReturnValue|ResolvedValue|RejectedValue)(?:Once)?\s*\(",
        ],
    },
    PatternSpec {
        name: "generic-mock-call",
        mock_kind: MockKind::Function,
        description: "Generic test-double construction call",
        frameworks: &["generic", "unittest.mock", "ts-mockito"],
        matchers: &[
            r"(?m)(?:^|[^.\w$])(mock)\s*\(",
            r"\b(?:createMock|getMock)\s*\(",
            r"\b(?:Mock|MagicMock|AsyncMock)\s*\(",
        ],
    },
    PatternSpec {
        name: "mock-class-identifier",
        mock_kind: MockKind::Fake,
        description: "Hand-written mock type or instance",
        frameworks: &["generic"],
        matchers: &[r"\bMock[A-Z]\w+"],
    },
    PatternSpec {
        name: "stub-identifier",
        mock_kind: MockKind::Stub,
        description: "Hand-written stub identifier",
        frameworks: &["generic"],
        matchers: &[r"\bstub[A-Z]\w+"],
    },
    PatternSpec {
        name: "spy-api",
        mock_kind: MockKind::Spy,
        description: "Spy wrapped around a real function",
        frameworks: &["jest", "vitest", "jasmine", "sinon", "pytest-mock"],
        matchers: &[
            r"\b(?:jest|vi)\.spyOn\s*\(",
            r"(?m)(?:^|[^.\w$])(spyOn)\s*\(",
            r"\bsinon\.spy\s*\(",
            r"\bmocker\.spy\s*\(",
        ],
    },
    PatternSpec {
        name: "sinon-stub",
        mock_kind: MockKind::Stub,
        description: "Stub created with sinon",
        frameworks: &["sinon"],
        matchers: &[
            r"\bsinon\.(?:stub|createStubInstance)\s*\(",
            r"\bsandbox\.stub\s*\(",
        ],
    },
    PatternSpec {
        name: "sinon-fake",
        mock_kind: MockKind::Fake,
        description: "Fake function created with sinon",
        frameworks: &["sinon"],
        matchers: &[r"\bsinon\.fake\b"],
    },
    PatternSpec {
        name: "fake-timers",
        mock_kind: MockKind::Timer,
        description: "Clock frozen or timers faked",
        frameworks: &["jest", "vitest", "sinon", "freezegun", "timekeeper"],
        matchers: &[
            r"\b(?:jest|vi|sinon)\.useFakeTimers\s*\(",
            r"\b(?:jest|vi)\.(?:advanceTimersByTime|runAllTimers|setSystemTime)\s*\(",
            r"@sinonjs/fake-timers",
            r"\bfreeze_time\s*\(",
            r"\bfreezegun\b",
            r"\btimekeeper\.freeze\s*\(",
        ],
    },
    PatternSpec {
        name: "http-interception",
        mock_kind: MockKind::Api,
        description: "HTTP/API traffic intercepted by a mocking library",
        frameworks: &["nock", "msw", "fetch-mock", "axios-mock-adapter", "responses", "wiremock"],
        matchers: &[
            r"\bnock\s*\(",
            r"\bfetchMock\b",
            r"\bfetch-mock\b",
            r"\baxios-mock-adapter\b",
            r"\bsetupServer\s*\(",
            r"\brequests_mock\b",
            r"\bresponses\.activate\b",
            r"\bhttpretty\b",
            r"(?i)\bwiremock\b",
        ],
    },
    PatternSpec {
        name: "network-fake",
        mock_kind: MockKind::Network,
        description: "Network layer replaced or disabled",
        frameworks: &["sinon", "mock-socket", "jest-websocket-mock", "nock"],
        matchers: &[
            r"\bsinon\.(?:fakeServer|useFakeXMLHttpRequest)\b",
            r"\bmock-socket\b",
            r"\bjest-websocket-mock\b",
            r"\bnock\.disableNetConnect\s*\(",
        ],
    },
    PatternSpec {
        name: "database-mock",
        mock_kind: MockKind::Database,
        description: "Database replaced by a mock or in-memory engine",
        frameworks: &["generic", "mongodb-memory-server", "pg-mem", "sqlite"],
        matchers: &[
            r"\bmock(?:Db|DB|Database|Repository|Repo|Connection|Pool)\w*",
            r"\binMemoryDatabase\b",
            r"sqlite:/*:memory:",
            r"\bMongoMemoryServer\b",
            r"\bmongodb-memory-server\b",
            r"\bpg-mem\b",
        ],
    },
    PatternSpec {
        name: "filesystem-mock",
        mock_kind: MockKind::Filesystem,
        description: "File system replaced by an in-memory or mocked implementation",
        frameworks: &["mock-fs", "memfs", "pyfakefs"],
        matchers: &[
            r"\bmock-fs\b",
            r"\bmockFs\b",
            r"\bmemfs\b",
            r"\bvol\.fromJSON\s*\(",
            r"\bpyfakefs\b",
        ],
    },
];

#[derive(Debug, Clone)]
pub struct MockPattern {
    pub name: String,
    pub matchers: Vec<Regex>,
    pub mock_kind: MockKind,
    pub description: String,
    pub applicable_frameworks: Vec<String>,
}

impl MockPattern {
    pub fn compile(spec: &PatternSpec) -> Result<Self> {
        let mut matchers = Vec::with_capacity(spec.matchers.len());
        for source in spec.matchers {
            let regex = Regex::new(source).map_err(|e| FraudCheckError::InvalidPattern {
                name: spec.name.to_string(),
                matcher: (*source).to_string(),
                source: e,
            })?;
            // A matcher that accepts "" would flag every position of every file
            if regex.is_match("") {
                return Err(FraudCheckError::EmptyMatch {
                    name: spec.name.to_string(),
                    matcher: (*source).to_string(),
                });
            }
            matchers.push(regex);
        }
        Ok(Self {
            name: spec.name.to_string(),
            matchers,
            mock_kind: spec.mock_kind,
            description: spec.description.to_string(),
            applicable_frameworks: spec.frameworks.iter().map(|f| (*f).to_string()).collect(),
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matchers.iter().any(|m| m.is_match(text))
    }

    /// Byte ranges of every non-overlapping match, matcher by matcher.
    pub fn find_all(&self, content: &str) -> Vec<Range<usize>> {
        self.matchers
            .iter()
            .flat_map(|m| match_ranges(m, content))
            .collect()
    }
}

pub(crate) fn match_ranges(regex: &Regex, content: &str) -> Vec<Range<usize>> {
    regex
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
        .map(|m| m.range())
        .collect()
}

/// Immutable, ordered list of compiled patterns. Share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    patterns: Vec<MockPattern>,
}

impl PatternCatalog {
    pub fn standard() -> Result<Self> {
        Self::from_specs(STANDARD_PATTERNS)
    }

    pub fn from_specs(specs: &[PatternSpec]) -> Result<Self> {
        let patterns = specs.iter().map(MockPattern::compile).collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[MockPattern] {
        &self.patterns
    }

    pub fn get(&self, name: &str) -> Option<&MockPattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PatternCatalog {
        PatternCatalog::standard().expect("standard catalog compiles")
    }

    #[test]
    fn every_pattern_matches_its_sample() {
        let samples = [
            ("framework-module-mock", "jest.mock('../db');"),
            ("python-patch", "@patch('app.client.get')"),
            ("framework-function-mock", "const cb = jest.fn();"),
            ("generic-mock-call", "const repo = mock(UserRepo);"),
            ("mock-class-identifier", "const svc = new MockUserService();"),
            ("stub-identifier", "const stubMailer = {};"),
            ("spy-api", "jest.spyOn(console, 'log');"),
            ("sinon-stub", "sinon.stub(api, 'fetch');"),
            ("sinon-fake", "const f = sinon.fake.returns(1);"),
            ("fake-timers", "jest.useFakeTimers();"),
            ("http-interception", "nock('https://api.example.com').get('/x');"),
            ("network-fake", "import { Server } from 'mock-socket';"),
            ("database-mock", "const mockDb = createPool();"),
            ("filesystem-mock", "import mockFs from 'mock-fs';"),
        ];
        let catalog = catalog();
        assert_eq!(samples.len(), catalog.len());
        for (name, sample) in samples {
            let pattern = catalog.get(name).unwrap_or_else(|| panic!("missing pattern {name}"));
            assert!(pattern.is_match(sample), "{name} should match {sample:?}");
        }
    }

    #[test]
    fn unrelated_text_matches_nothing() {
        let text = "const total = items.reduce((a, b) => a + b, 0);\nawait page.click('#submit');\n";
        for pattern in catalog().patterns() {
            assert!(!pattern.is_match(text), "{} matched unrelated text", pattern.name);
        }
    }

    #[test]
    fn member_mock_call_is_not_a_generic_mock() {
        let catalog = catalog();
        let generic = catalog.get("generic-mock-call").unwrap();
        assert!(generic.find_all("jest.mock('database')").is_empty());
        assert_eq!(generic.find_all("  mock(Service)"), vec![2..6]);
    }

    #[test]
    fn in_memory_sqlite_uri_is_database_mock() {
        let catalog = catalog();
        let db = catalog.get("database-mock").unwrap();
        assert!(db.is_match("url: 'sqlite::memory:'"));
        assert!(db.is_match("DATABASE_URL=sqlite:///:memory:"));
    }

    #[test]
    fn invalid_matcher_is_rejected_at_load() {
        const BROKEN: &[PatternSpec] = &[PatternSpec {
            name: "broken",
            mock_kind: MockKind::Stub,
            description: "",
            frameworks: &[],
            matchers: &[r"stub("],
        }];
        let err = PatternCatalog::from_specs(BROKEN).unwrap_err();
        assert!(matches!(err, FraudCheckError::InvalidPattern { .. }));
    }

    #[test]
    fn empty_matching_matcher_is_rejected_at_load() {
        const EMPTY: &[PatternSpec] = &[PatternSpec {
            name: "empty",
            mock_kind: MockKind::Stub,
            description: "",
            frameworks: &[],
            matchers: &[r"(?:stub)?"],
        }];
        let err = PatternCatalog::from_specs(EMPTY).unwrap_err();
        assert!(matches!(err, FraudCheckError::EmptyMatch { .. }));
    }
}
