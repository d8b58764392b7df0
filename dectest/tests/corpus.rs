// Copyright Materialize, Inc. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository, or online at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runs the decTest files in the testdata directory.

use std::error::Error;
use std::path::Path;

use dectest::ast;
use dectest::parse;
use dectest::run::{self, Outcome, Report};

struct TestReporter {
    current: Option<String>,
    passes: usize,
    skips: usize,
    failures: Vec<String>,
}

impl TestReporter {
    fn new() -> TestReporter {
        TestReporter {
            current: None,
            passes: 0,
            skips: 0,
            failures: vec![],
        }
    }
}

impl Report for TestReporter {
    fn start_file(&mut self, _: &ast::File) {}

    fn finish_file(&mut self) {}

    fn start_test(&mut self, test: &ast::Test) {
        self.current = Some(test.id.clone());
    }

    fn finish_test(&mut self, outcome: Outcome) {
        let id = self.current.take().unwrap_or_default();
        match outcome {
            Outcome::Passed => self.passes += 1,
            Outcome::Skipped => self.skips += 1,
            Outcome::Failed { cause } => self.failures.push(format!("{}: {}", id, cause)),
        }
    }
}

fn run_corpus(name: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name);
    let file = parse::parse_file(&path)?;
    let mut reporter = TestReporter::new();
    run::run_file(&mut reporter, &file)?;
    assert!(reporter.passes > 0, "no tests ran in {}", name);
    if !reporter.failures.is_empty() {
        panic!(
            "{} failed in {}:\n{}",
            reporter.failures.len(),
            name,
            reporter.failures.join("\n"),
        );
    }
    Ok(())
}

#[test]
fn test_base() -> Result<(), Box<dyn Error>> {
    run_corpus("base.decTest")
}

#[test]
fn test_add() -> Result<(), Box<dyn Error>> {
    run_corpus("add.decTest")
}

#[test]
fn test_multiply() -> Result<(), Box<dyn Error>> {
    run_corpus("multiply.decTest")
}

#[test]
fn test_divide() -> Result<(), Box<dyn Error>> {
    run_corpus("divide.decTest")
}

#[test]
fn test_quantize() -> Result<(), Box<dyn Error>> {
    run_corpus("quantize.decTest")
}

#[test]
fn test_rounding() -> Result<(), Box<dyn Error>> {
    run_corpus("rounding.decTest")
}

#[test]
fn test_minmax() -> Result<(), Box<dyn Error>> {
    run_corpus("minmax.decTest")
}

#[test]
fn test_next() -> Result<(), Box<dyn Error>> {
    run_corpus("next.decTest")
}

#[test]
fn test_exp() -> Result<(), Box<dyn Error>> {
    run_corpus("exp.decTest")
}

#[test]
fn test_power() -> Result<(), Box<dyn Error>> {
    run_corpus("power.decTest")
}

#[test]
fn test_simple() -> Result<(), Box<dyn Error>> {
    run_corpus("simple.decTest")
}
