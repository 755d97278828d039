use std::{slice, time::Duration};

use super::model::{Status, Suite, Test, TestError};
use crate::xml::Node;

const TAG_TEST_SUITE: &str = "testsuite";
const TAG_TEST_CASE: &str = "testcase";
const TAG_TEST_CASE_STATUS_ERROR: &str = "error";
const TAG_TEST_CASE_STATUS_FAILURE: &str = "failure";
const TAG_TEST_CASE_STATUS_SKIPPED: &str = "skipped";
const TAG_PROPERTIES: &str = "properties";
const TAG_PROPERTY: &str = "property";
const TAG_SYSTEM_OUT: &str = "system-out";
const TAG_SYSTEM_ERR: &str = "system-err";

pub mod attrs {
    pub const NAME: &str = "name";
    pub const PACKAGE: &str = "package";
    pub const CLASSNAME: &str = "classname";
    pub const TIME: &str = "time";
    pub const MESSAGE: &str = "message";
    pub const TYPE: &str = "type";
    pub const VALUE: &str = "value";
    pub const ID: &str = "id";
    pub const FILE: &str = "file";
    pub const FILEPATH: &str = "filepath";
}

/// Attributes tried, in order, when a test case has no `name`.
const NAME_FALLBACK_ATTRS: &[&str] = &[attrs::CLASSNAME, attrs::ID, attrs::FILE, attrs::FILEPATH];

/// Collects every suite found in `forest`, in document order.
pub fn classify(forest: &[Node]) -> Vec<Suite> {
    suites(forest).collect()
}

/// Lazily walks `forest` depth-first and yields a [`Suite`] for each
/// `testsuite` element. Suites nested in other suites come out as separate
/// items right after their parent.
pub fn suites(forest: &[Node]) -> Suites<'_> {
    Suites {
        pending: vec![forest.iter()],
    }
}

#[derive(Debug, Clone)]
pub struct Suites<'a> {
    pending: Vec<slice::Iter<'a, Node>>,
}

impl Iterator for Suites<'_> {
    type Item = Suite;

    fn next(&mut self) -> Option<Suite> {
        loop {
            let siblings = self.pending.last_mut()?;
            let Some(node) = siblings.next() else {
                self.pending.pop();
                continue;
            };

            match node.name.as_str() {
                // Test cases never contain suites.
                TAG_TEST_CASE => (),
                TAG_TEST_SUITE => {
                    self.pending.push(node.children.iter());
                    return Some(ingest_suite(node));
                }
                _ => self.pending.push(node.children.iter()),
            }
        }
    }
}

fn ingest_suite(node: &Node) -> Suite {
    let mut suite = Suite::new(node.attr(attrs::NAME).unwrap_or_default());
    suite.package = node.attr(attrs::PACKAGE).map(String::from);
    suite.properties = node.attributes.clone();

    let mut tests = Vec::new();
    for child in &node.children {
        match child.name.as_str() {
            TAG_TEST_CASE => tests.push(ingest_test_case(child)),
            TAG_PROPERTIES => suite.properties.extend(ingest_properties(child)),
            TAG_SYSTEM_OUT => suite.system_out = child.text().map(String::from),
            TAG_SYSTEM_ERR => suite.system_err = child.text().map(String::from),
            _ => (),
        }
    }

    let suite = suite.with_tests(tests);
    log::debug!(
        "found test suite {:?} with {} test cases",
        suite.name,
        suite.tests().len()
    );
    suite
}

fn ingest_properties(node: &Node) -> impl Iterator<Item = (String, String)> + '_ {
    node.children_named(TAG_PROPERTY).filter_map(|property| {
        let name = property.attr(attrs::NAME)?;
        let value = property
            .attr(attrs::VALUE)
            .or_else(|| property.text())
            .unwrap_or_default();
        Some((String::from(name), String::from(value)))
    })
}

fn ingest_test_case(node: &Node) -> Test {
    let (status, error) = match outcome(node) {
        Some((indicator, child)) => (indicator.status(), Some(ingest_error(child))),
        None => (Status::Passed, None),
    };

    Test {
        name: test_case_name(node),
        classname: node.attr(attrs::CLASSNAME).map(String::from),
        duration: node.attr(attrs::TIME).and_then(parse_duration),
        status,
        properties: node.attributes.clone(),
        error,
        system_out: node.child(TAG_SYSTEM_OUT).and_then(Node::text).map(String::from),
        system_err: node.child(TAG_SYSTEM_ERR).and_then(Node::text).map(String::from),
    }
}

fn test_case_name(node: &Node) -> String {
    node.attr(attrs::NAME)
        .or_else(|| NAME_FALLBACK_ATTRS.iter().find_map(|attr| node.attr(attr)))
        .map(String::from)
        .unwrap_or_default()
}

/// A child element marking a test case as not passed. Variants are declared
/// in precedence order: when a case carries several, the smallest wins.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Indicator {
    Error,
    Failure,
    Skipped,
}

impl Indicator {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            TAG_TEST_CASE_STATUS_ERROR => Some(Indicator::Error),
            TAG_TEST_CASE_STATUS_FAILURE => Some(Indicator::Failure),
            TAG_TEST_CASE_STATUS_SKIPPED => Some(Indicator::Skipped),
            _ => None,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Indicator::Error => Status::Error,
            Indicator::Failure => Status::Failed,
            Indicator::Skipped => Status::Skipped,
        }
    }
}

/// Picks the highest-precedence indicator among the direct children of a
/// test case. Ties go to the first one in document order.
pub fn outcome(node: &Node) -> Option<(Indicator, &Node)> {
    let mut count = 0;
    let mut winner: Option<(Indicator, &Node)> = None;
    for child in &node.children {
        let Some(indicator) = Indicator::from_tag(&child.name) else {
            continue;
        };
        count += 1;
        if winner.map_or(true, |(best, _)| indicator < best) {
            winner = Some((indicator, child));
        }
    }

    if let (true, Some((_, child))) = (count > 1, winner) {
        log::debug!(
            "test case {:?} has {} status elements, using <{}>",
            node.attr(attrs::NAME).unwrap_or_default(),
            count,
            child.name
        );
    }
    winner
}

fn ingest_error(indicator: &Node) -> TestError {
    let body = indicator.text().map(String::from);
    TestError {
        message: indicator
            .attr(attrs::MESSAGE)
            .or(body.as_deref())
            .map(String::from)
            .unwrap_or_default(),
        kind: indicator.attr(attrs::TYPE).map(String::from),
        body,
    }
}

/// Reads a `time` attribute in seconds. Some producers format large values
/// with thousands separators.
fn parse_duration(value: &str) -> Option<Duration> {
    let seconds: f64 = value.trim().replace(',', "").parse().ok()?;
    Duration::try_from_secs_f64(seconds).ok()
}
