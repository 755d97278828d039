use std::{collections::BTreeMap, fmt, iter::Sum, time::Duration};

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Passed,
    Failed,
    Skipped,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Skipped => "skipped",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detail recovered from the indicator element of a non-passing test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestError {
    pub message: String,
    /// The indicator's `type` attribute, usually an exception class.
    pub kind: Option<String>,
    /// The indicator's text, usually a stack trace.
    pub body: Option<String>,
}

impl TestError {
    pub fn new<T: Into<String>>(message: T) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Test {
    pub name: String,
    pub classname: Option<String>,
    pub duration: Option<Duration>,
    pub status: Status,
    /// Every attribute of the originating test case element, `name` included.
    pub properties: BTreeMap<String, String>,
    pub error: Option<TestError>,
    pub system_out: Option<String>,
    pub system_err: Option<String>,
}

/// Outcome counts for a set of tests. `tests` is always the sum of the
/// four status counts.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub error: usize,
    pub duration: Duration,
}

impl Totals {
    pub fn from_tests(tests: &[Test]) -> Self {
        tests.iter().collect()
    }

    fn record(&mut self, test: &Test) {
        match test.status {
            Status::Passed => self.passed += 1,
            Status::Failed => self.failed += 1,
            Status::Skipped => self.skipped += 1,
            Status::Error => self.error += 1,
        }
        self.tests += 1;
        self.duration = self
            .duration
            .saturating_add(test.duration.unwrap_or_default());
    }

    /// True when no test failed or errored.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.error == 0
    }
}

impl<'a> FromIterator<&'a Test> for Totals {
    fn from_iter<I: IntoIterator<Item = &'a Test>>(iter: I) -> Self {
        iter.into_iter().fold(Totals::default(), |mut totals, test| {
            totals.record(test);
            totals
        })
    }
}

impl<'a> Sum<&'a Totals> for Totals {
    fn sum<I: Iterator<Item = &'a Totals>>(iter: I) -> Self {
        iter.fold(Totals::default(), |acc, totals| Totals {
            tests: acc.tests + totals.tests,
            passed: acc.passed + totals.passed,
            failed: acc.failed + totals.failed,
            skipped: acc.skipped + totals.skipped,
            error: acc.error + totals.error,
            duration: acc.duration.saturating_add(totals.duration),
        })
    }
}

impl fmt::Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tests, {} passed, {} failed, {} skipped, {} errors in {:.3}s",
            self.tests,
            self.passed,
            self.failed,
            self.skipped,
            self.error,
            self.duration.as_secs_f64()
        )
    }
}

/// A group of tests. The totals are derived from the tests whenever the
/// test list is set, so they cannot drift apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Suite {
    pub name: String,
    pub package: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub system_out: Option<String>,
    pub system_err: Option<String>,
    tests: Vec<Test>,
    totals: Totals,
}

impl Suite {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_tests(mut self, tests: Vec<Test>) -> Self {
        self.totals = Totals::from_tests(&tests);
        self.tests = tests;
        self
    }

    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn into_tests(self) -> Vec<Test> {
        self.tests
    }
}
