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

use bigdec::{Class, Context, Decimal, Rounding, Status};

pub enum BackendError {
    Unsupported,
    Failure { cause: Box<dyn Error> },
}

impl BackendError {
    pub fn failure<S>(message: S) -> BackendError
    where
        S: Into<String>,
    {
        let message = message.into();
        BackendError::Failure {
            cause: message.into(),
        }
    }
}

impl<E> From<E> for BackendError
where
    E: Error + 'static,
{
    fn from(cause: E) -> BackendError {
        BackendError::Failure {
            cause: cause.into(),
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Drives a [`Context`] from decTest directives and operations.
///
/// Operands parse exactly, outside the context, so no test case needs to be
/// skipped for exceeding the working precision. A malformed operand becomes a
/// quiet NaN and is reported as the invalid operation condition, the way the
/// extended arithmetic treats a conversion syntax error.
pub struct DecimalBackend {
    cx: Context,
    syntax_error: bool,
    valid: bool,
}

impl DecimalBackend {
    pub fn new() -> DecimalBackend {
        DecimalBackend {
            cx: Context::default(),
            syntax_error: false,
            valid: true,
        }
    }

    pub fn nan() -> Decimal {
        Decimal::nan()
    }

    pub fn parse(&mut self, s: &str, precise: bool) -> Decimal {
        let res = if precise {
            s.parse()
        } else {
            self.cx.parse(s)
        };
        match res {
            Ok(n) => n,
            Err(_) => {
                self.syntax_error = true;
                Self::nan()
            }
        }
    }

    pub fn status(&self) -> Status {
        let mut status = self.cx.status();
        if self.syntax_error {
            status.set_invalid_operation(true);
        }
        status
    }

    pub fn clear_status(&mut self) {
        self.cx.clear_status();
        self.syntax_error = false;
    }

    pub fn set_clamp(&mut self, clamp: bool) -> BackendResult<()> {
        self.cx.set_clamp(clamp);
        Ok(())
    }

    pub fn set_extended(&mut self, extended: bool) -> BackendResult<()> {
        self.cx.set_simplified(!extended);
        Ok(())
    }

    pub fn set_max_exponent(&mut self, e: isize) -> BackendResult<()> {
        self.cx
            .set_max_exponent(e)
            .map_err(|_| BackendError::Unsupported)
    }

    pub fn set_min_exponent(&mut self, e: isize) -> BackendResult<()> {
        self.cx
            .set_min_exponent(e)
            .map_err(|_| BackendError::Unsupported)
    }

    pub fn set_precision(&mut self, p: usize) -> BackendResult<()> {
        self.valid = self.cx.set_precision(p).is_ok();
        Ok(())
    }

    pub fn set_rounding(&mut self, rounding: Rounding) -> BackendResult<()> {
        self.cx.set_rounding(rounding);
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn abs(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.abs(n)?)
    }

    pub fn add(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.add(lhs, rhs)?)
    }

    pub fn class(&mut self, n: &Decimal) -> BackendResult<Class> {
        Ok(self.cx.class(n))
    }

    pub fn div(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.div(lhs, rhs)?)
    }

    pub fn div_integer(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.div_integer(lhs, rhs)?)
    }

    pub fn exp(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.exp(n)?)
    }

    pub fn fma(&mut self, x: &Decimal, y: &Decimal, z: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.fma(x, y, z)?)
    }

    pub fn ln(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.ln(n)?)
    }

    pub fn log10(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.log10(n)?)
    }

    pub fn logb(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.logb(n)?)
    }

    pub fn max(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.max(lhs, rhs)?)
    }

    pub fn max_abs(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.max_abs(lhs, rhs)?)
    }

    pub fn min(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.min(lhs, rhs)?)
    }

    pub fn min_abs(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.min_abs(lhs, rhs)?)
    }

    pub fn minus(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.minus(n)?)
    }

    pub fn mul(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.mul(lhs, rhs)?)
    }

    pub fn next_minus(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.next_minus(n)?)
    }

    pub fn next_plus(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.next_plus(n)?)
    }

    pub fn next_toward(&mut self, x: &Decimal, y: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.next_toward(x, y)?)
    }

    pub fn partial_cmp(
        &mut self,
        lhs: &Decimal,
        rhs: &Decimal,
    ) -> BackendResult<Option<Ordering>> {
        Ok(self.cx.partial_cmp(lhs, rhs)?)
    }

    pub fn plus(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.plus(n)?)
    }

    pub fn pow(&mut self, x: &Decimal, y: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.pow(x, y)?)
    }

    pub fn quantize(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.quantize(lhs, rhs)?)
    }

    pub fn reduce(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.reduce(n)?)
    }

    pub fn rem(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.rem(lhs, rhs)?)
    }

    pub fn rem_near(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.rem_near(lhs, rhs)?)
    }

    pub fn rescale(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.rescale(lhs, rhs)?)
    }

    pub fn round_to_integral_exact(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.round_to_integral_exact(n)?)
    }

    pub fn round_to_integral_value(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.round_to_integral_value(n)?)
    }

    pub fn scaleb(&mut self, x: &Decimal, y: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.scaleb(x, y)?)
    }

    pub fn sqrt(&mut self, n: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.sqrt(n)?)
    }

    pub fn sub(&mut self, lhs: &Decimal, rhs: &Decimal) -> BackendResult<Decimal> {
        Ok(self.cx.sub(lhs, rhs)?)
    }
}
