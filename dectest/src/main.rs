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

use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::process;

use dectest::ast;
use dectest::parse;
use dectest::run::{self, Outcome, Report};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut paths = vec![];
    let mut verbose = false;
    let mut args = env::args().into_iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" => verbose = true,
            _ => paths.push(PathBuf::from(arg)),
        }
    }
    if paths.is_empty() {
        return Err("usage: dectest [-v] <FILE>...".into());
    }

    let mut reporter = ConsoleReporter::new(verbose);

    for path in paths {
        let file = parse::parse_file(&path)?;
        run::run_file(&mut reporter, &file)?;
    }

    println!("PASS {}", reporter.passes);
    println!("FAIL {}", reporter.failures);
    println!("SKIP {}", reporter.skips);

    if reporter.failures > 0 {
        process::exit(1)
    }
    Ok(())
}

struct ConsoleReporter {
    failures: usize,
    passes: usize,
    skips: usize,
    verbose: bool,
}

impl ConsoleReporter {
    fn new(verbose: bool) -> ConsoleReporter {
        ConsoleReporter {
            failures: 0,
            passes: 0,
            skips: 0,
            verbose,
        }
    }
}

impl Report for ConsoleReporter {
    fn start_file(&mut self, file: &ast::File) {
        println!("==> {}", file.path.display())
    }

    fn finish_file(&mut self) {}

    fn start_test(&mut self, test: &ast::Test) {
        if self.verbose {
            print!("{} {} -> {}", test.id, test.operation, test.result);
            if !test.conditions.is_empty() {
                let conditions: Vec<_> = test.conditions.iter().map(|c| c.to_string()).collect();
                print!(" ({})", conditions.join(", "));
            }
            println!();
        } else {
            print!("{} ", test.id);
        }
    }

    fn finish_test(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Passed => self.passes += 1,
            Outcome::Failed { .. } => self.failures += 1,
            Outcome::Skipped => self.skips += 1,
        }
        match outcome {
            Outcome::Passed => println!("PASS"),
            Outcome::Failed { cause } => println!("FAIL: {}", cause),
            Outcome::Skipped => println!("SKIP"),
        }
        if self.verbose {
            println!()
        }
    }
}
