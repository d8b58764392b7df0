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

use std::cmp::Ordering;
use std::error::Error;

use bigdec::{Decimal, Status};

use crate::ast;
use crate::backend::{BackendError, BackendResult, DecimalBackend};

pub enum Outcome {
    Passed,
    Failed { cause: Box<dyn Error> },
    Skipped,
}

pub trait Report {
    fn start_file(&mut self, file: &ast::File);
    fn finish_file(&mut self);
    fn start_test(&mut self, test: &ast::Test);
    fn finish_test(&mut self, outcome: Outcome);
}

pub fn run_file<R>(reporter: &mut R, file: &ast::File) -> Result<(), Box<dyn Error>>
where
    R: Report,
{
    reporter.start_file(file);
    let mut backend = DecimalBackend::new();
    for line in &file.lines {
        match line {
            ast::Line::Directive(directive) => run_directive(&mut backend, reporter, directive)?,
            ast::Line::Test(test) => run_test(&mut backend, reporter, test),
        }
    }
    reporter.finish_file();
    Ok(())
}

fn run_directive<R>(
    backend: &mut DecimalBackend,
    reporter: &mut R,
    directive: &ast::Directive,
) -> Result<(), Box<dyn Error>>
where
    R: Report,
{
    let res = match directive {
        ast::Directive::Clamp(clamp) => backend.set_clamp(*clamp),
        ast::Directive::Extended(extended) => backend.set_extended(*extended),
        ast::Directive::MaxExponent(e) => backend.set_max_exponent(*e),
        ast::Directive::MinExponent(e) => backend.set_min_exponent(*e),
        ast::Directive::Precision(p) => backend.set_precision(*p),
        ast::Directive::Rounding(rounding) => backend.set_rounding(*rounding),
        ast::Directive::DecTest(file) => {
            run_file(reporter, file)?;
            Ok(())
        }
        ast::Directive::Version(_) => Ok(()),
    };
    res.map_err(|e| match e {
        BackendError::Failure { cause } => cause,
        BackendError::Unsupported => {
            format!("backend does not support directive \"{}\"", directive).into()
        }
    })
}

fn run_test<R>(backend: &mut DecimalBackend, reporter: &mut R, test: &ast::Test)
where
    R: Report,
{
    reporter.start_test(&test);
    let outcome = match run_test_inner(backend, test) {
        Ok(()) => Outcome::Passed,
        Err(BackendError::Failure { cause }) => Outcome::Failed { cause },
        Err(BackendError::Unsupported) => Outcome::Skipped,
    };
    reporter.finish_test(outcome);
}

fn run_test_inner(backend: &mut DecimalBackend, test: &ast::Test) -> BackendResult<()> {
    backend.clear_status();

    if !backend.is_valid() {
        return Err(BackendError::Unsupported);
    }

    match &test.operation {
        ast::Operation::Abs(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.abs(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Add(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.add(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::And(_, _) => return Err(BackendError::Unsupported),
        ast::Operation::Apply(n) => {
            let n = parse_operand(backend, n, false)?;
            check_result(&test.result, &n)?;
        }
        ast::Operation::Canonical(n) => {
            // Every representable number is already canonical.
            let n = parse_operand(backend, n, true)?;
            check_result(&test.result, &n)?;
        }
        ast::Operation::Class(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.class(&n)?.to_string();
            check_result_str(&test.result, &result)?;
        }
        ast::Operation::Compare(lhs, rhs) => {
            // Comparison returns Rust's `std::cmp::Ordering` enumeration, so
            // the sign and payload a propagated NaN result would carry are
            // lost. Skip any assertions about the exact encoding of the
            // returned number, and strip off any sign/payload from NaNs.
            if test.result.starts_with("#") {
                return Err(BackendError::Unsupported);
            }
            let test_result = if test.result.contains("NaN") {
                "NaN"
            } else {
                &test.result
            };
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = match backend.partial_cmp(&lhs, &rhs)? {
                None => DecimalBackend::nan(),
                Some(Ordering::Less) => Decimal::from(-1),
                Some(Ordering::Equal) => Decimal::zero(),
                Some(Ordering::Greater) => Decimal::one(),
            };
            check_result(test_result, &result)?;
        }
        ast::Operation::CompareSig(_, _) => return Err(BackendError::Unsupported),
        ast::Operation::CompareTotal(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = match lhs.total_cmp(&rhs) {
                Ordering::Less => Decimal::from(-1),
                Ordering::Equal => Decimal::zero(),
                Ordering::Greater => Decimal::one(),
            };
            check_result(&test.result, &result)?;
        }
        ast::Operation::CompareTotalMag(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = match lhs.total_cmp_mag(&rhs) {
                Ordering::Less => Decimal::from(-1),
                Ordering::Equal => Decimal::zero(),
                Ordering::Greater => Decimal::one(),
            };
            check_result(&test.result, &result)?;
        }
        ast::Operation::Copy(n) => {
            let n = parse_operand(backend, n, true)?;
            check_result(&test.result, &n)?;
        }
        ast::Operation::CopyAbs(n) => {
            let n = parse_operand(backend, n, true)?;
            check_result(&test.result, &n.copy_abs())?;
        }
        ast::Operation::CopyNegate(n) => {
            let n = parse_operand(backend, n, true)?;
            check_result(&test.result, &n.copy_negate())?;
        }
        ast::Operation::CopySign(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            check_result(&test.result, &lhs.copy_sign(&rhs))?;
        }
        ast::Operation::Divide(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.div(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::DivideInt(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.div_integer(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Exp(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.exp(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Fma(x, y, z) => {
            let x = parse_operand(backend, x, true)?;
            let y = parse_operand(backend, y, true)?;
            let z = parse_operand(backend, z, true)?;
            let result = backend.fma(&x, &y, &z)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Multiply(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.mul(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Invert(_) => return Err(BackendError::Unsupported),
        ast::Operation::Ln(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.ln(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Log10(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.log10(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Logb(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.logb(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Max(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.max(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::MaxMag(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.max_abs(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Min(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.min(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::MinMag(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.min_abs(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Minus(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.minus(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::NextMinus(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.next_minus(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::NextPlus(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.next_plus(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::NextToward(x, y) => {
            let x = parse_operand(backend, x, true)?;
            let y = parse_operand(backend, y, true)?;
            let result = backend.next_toward(&x, &y)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Or(_, _) => return Err(BackendError::Unsupported),
        ast::Operation::Plus(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.plus(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Power(x, y) => {
            let x = parse_operand(backend, x, true)?;
            let y = parse_operand(backend, y, true)?;
            let result = backend.pow(&x, &y)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Quantize(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.quantize(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Reduce(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.reduce(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Remainder(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.rem(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::RemainderNear(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.rem_near(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Rescale(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.rescale(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Rotate(_, _) => return Err(BackendError::Unsupported),
        ast::Operation::SameQuantum(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = match lhs.quantum_matches(&rhs) {
                false => "0",
                true => "1",
            };
            check_result_str(&test.result, &result)?;
        }
        ast::Operation::Scaleb(x, y) => {
            let x = parse_operand(backend, x, true)?;
            let y = parse_operand(backend, y, true)?;
            let result = backend.scaleb(&x, &y)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Shift(_, _) => return Err(BackendError::Unsupported),
        ast::Operation::SquareRoot(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.sqrt(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::Subtract(lhs, rhs) => {
            let lhs = parse_operand(backend, lhs, true)?;
            let rhs = parse_operand(backend, rhs, true)?;
            let result = backend.sub(&lhs, &rhs)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::ToEng(n) => {
            let n = parse_operand(backend, n, false)?;
            let result = format!("{:#}", n);
            check_result_str(&test.result, &result)?;
        }
        ast::Operation::ToIntegral(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.round_to_integral_value(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::ToIntegralX(n) => {
            let n = parse_operand(backend, n, true)?;
            let result = backend.round_to_integral_exact(&n)?;
            check_result(&test.result, &result)?;
        }
        ast::Operation::ToSci(n) => {
            let n = parse_operand(backend, n, false)?;
            let result = n.to_string();
            check_result_str(&test.result, &result)?;
        }
        ast::Operation::Trim(_) => return Err(BackendError::Unsupported),
        ast::Operation::Xor(_, _) => return Err(BackendError::Unsupported),
    }

    check_conditions(backend, &test.conditions)
}

fn parse_operand(
    backend: &mut DecimalBackend,
    operand: &str,
    precise: bool,
) -> BackendResult<Decimal> {
    if operand.starts_with('#')
        || operand.starts_with("32#")
        || operand.starts_with("64#")
        || operand.starts_with("128#")
    {
        // Interchange-format literals name encodings this library does not
        // have.
        Err(BackendError::Unsupported)
    } else {
        Ok(backend.parse(operand, precise))
    }
}

fn check_result(expected: &str, actual: &Decimal) -> BackendResult<()> {
    if expected.starts_with('#')
        || expected.starts_with("32#")
        || expected.starts_with("64#")
        || expected.starts_with("128#")
    {
        return Err(BackendError::Unsupported);
    }
    let expected: Decimal = expected.parse()?;
    check_result_str(&expected.to_string(), &actual.to_string())
}

fn check_result_str(expected: &str, actual: &str) -> Result<(), BackendError> {
    if expected == actual {
        Ok(())
    } else {
        Err(BackendError::failure(format!(
            "got {} but expected {}",
            actual, expected
        )))
    }
}

fn check_conditions(backend: &DecimalBackend, conditions: &[ast::Condition]) -> BackendResult<()> {
    let mut expected = Status::default();
    for condition in conditions {
        match condition {
            ast::Condition::Clamped => expected.set_clamped(true),
            // The extended arithmetic reports each of these as a form of the
            // invalid operation condition.
            ast::Condition::ConversionSyntax
            | ast::Condition::DivisionImpossible
            | ast::Condition::DivisionUndefined
            | ast::Condition::InvalidOperation => expected.set_invalid_operation(true),
            ast::Condition::DivisionByZero => expected.set_division_by_zero(true),
            ast::Condition::Inexact => expected.set_inexact(true),
            ast::Condition::InsufficientStorage
            | ast::Condition::InvalidContext
            | ast::Condition::LostDigits => return Err(BackendError::Unsupported),
            ast::Condition::Overflow => expected.set_overflow(true),
            ast::Condition::Rounded => expected.set_rounded(true),
            ast::Condition::Subnormal => expected.set_subnormal(true),
            ast::Condition::Underflow => expected.set_underflow(true),
        }
    }
    let actual = backend.status();
    if actual == expected {
        Ok(())
    } else {
        Err(BackendError::failure(format!(
            "raised conditions [{}] but expected [{}]",
            fmt_status(actual),
            fmt_status(expected),
        )))
    }
}

fn fmt_status(status: Status) -> String {
    let mut names = vec![];
    if status.invalid_operation() {
        names.push("Invalid_operation");
    }
    if status.division_by_zero() {
        names.push("Division_by_zero");
    }
    if status.overflow() {
        names.push("Overflow");
    }
    if status.underflow() {
        names.push("Underflow");
    }
    if status.inexact() {
        names.push("Inexact");
    }
    if status.rounded() {
        names.push("Rounded");
    }
    if status.clamped() {
        names.push("Clamped");
    }
    if status.subnormal() {
        names.push("Subnormal");
    }
    names.join(", ")
}
