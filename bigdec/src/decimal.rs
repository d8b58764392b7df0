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
use std::convert::TryFrom;
use std::fmt;
use std::iter::{Product, Sum};
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};
use std::str::FromStr;
use std::sync::OnceLock;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};

use crate::context::{Class, Context, Status};
use crate::conv;
use crate::error::{ParseDecimalError, TrapError, TryFromDecimalError};
use crate::math::{self, MATH};
use crate::simple::SIMPLE;

/// The number is negative.
pub(crate) const NEG: u8 = 0b0000_0001;
/// The number is an infinity.
pub(crate) const INF: u8 = 0b0000_0010;
/// The number is a quiet NaN.
pub(crate) const QNAN: u8 = 0b0000_0100;
/// The number is a signaling NaN.
pub(crate) const SNAN: u8 = 0b0000_1000;
/// The number is an infinity or a NaN.
pub(crate) const SPECIAL: u8 = INF | QNAN | SNAN;
/// The number is a NaN of either kind.
pub(crate) const ANY_NAN: u8 = QNAN | SNAN;

/// An arbitrary-precision decimal number.
///
/// A decimal number consists of a sign, an unsigned integer significand, and
/// an integer exponent. The numeric value of a finite number is
///
/// ```text
/// (-1)^sign * significand * 10^exponent
/// ```
///
/// The special values infinity, quiet NaN, and signaling NaN are also
/// representable, each in a positive and a negative form. NaNs additionally
/// carry a diagnostic payload.
///
/// Decimal numbers are not normalized. `1.2` and `1.20` are distinct
/// representations of the same value, and operations preserve the
/// distinction by following the exponent rules laid out in the General
/// Decimal Arithmetic specification. Equality via `==` compares
/// representations, not values, so `Decimal` deliberately does not implement
/// [`PartialOrd`]. Use [`Context::partial_cmp`] to compare values, or wrap
/// the number in an [`OrderedDecimal`](crate::OrderedDecimal) when a total
/// order and value-based equality are required.
///
/// The standard arithmetic operators on `Decimal` compute exact, unrounded
/// results. A quotient that does not terminate, or an operation whose
/// operands make it undefined, produces a quiet NaN. For rounded arithmetic
/// and for control over precision, rounding, and exponent range, use a
/// [`Context`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    pub(crate) flags: u8,
    pub(crate) significand: BigUint,
    pub(crate) exponent: BigInt,
}

static_assertions::assert_impl_all!(Decimal: Send, Sync);

impl Decimal {
    /// Constructs a decimal number from a significand and an exponent.
    ///
    /// The sign of the significand becomes the sign of the number. There is
    /// no way to construct a negative zero with this method, as `-0` and `0`
    /// are the same integer; use `-Decimal::zero()` instead.
    pub fn new<S, E>(significand: S, exponent: E) -> Decimal
    where
        S: Into<BigInt>,
        E: Into<BigInt>,
    {
        let (sign, significand) = significand.into().into_parts();
        let flags = match sign {
            Sign::Minus => NEG,
            Sign::NoSign | Sign::Plus => 0,
        };
        Decimal {
            flags,
            significand,
            exponent: exponent.into(),
        }
    }

    /// Constructs a zero with an exponent of zero.
    pub fn zero() -> Decimal {
        Decimal {
            flags: 0,
            significand: BigUint::zero(),
            exponent: BigInt::zero(),
        }
    }

    /// Constructs a one with an exponent of zero.
    pub fn one() -> Decimal {
        Decimal {
            flags: 0,
            significand: BigUint::one(),
            exponent: BigInt::zero(),
        }
    }

    /// Constructs a positive infinity.
    ///
    /// Negative infinity is `-Decimal::infinity()`.
    pub fn infinity() -> Decimal {
        Decimal {
            flags: INF,
            significand: BigUint::zero(),
            exponent: BigInt::zero(),
        }
    }

    /// Constructs a quiet NaN with an empty payload.
    pub fn nan() -> Decimal {
        Decimal {
            flags: QNAN,
            significand: BigUint::zero(),
            exponent: BigInt::zero(),
        }
    }

    /// Constructs a signaling NaN with an empty payload.
    pub fn signaling_nan() -> Decimal {
        Decimal {
            flags: SNAN,
            significand: BigUint::zero(),
            exponent: BigInt::zero(),
        }
    }

    pub(crate) fn make_inf(negative: bool) -> Decimal {
        Decimal {
            flags: INF | if negative { NEG } else { 0 },
            significand: BigUint::zero(),
            exponent: BigInt::zero(),
        }
    }

    pub(crate) fn make_nan(negative: bool, signaling: bool, payload: BigUint) -> Decimal {
        let mut flags = if signaling { SNAN } else { QNAN };
        if negative {
            flags |= NEG;
        }
        Decimal {
            flags,
            significand: payload,
            exponent: BigInt::zero(),
        }
    }

    pub(crate) fn make_zero(negative: bool, exponent: BigInt) -> Decimal {
        Decimal {
            flags: if negative { NEG } else { 0 },
            significand: BigUint::zero(),
            exponent,
        }
    }

    /// Returns the coefficient of the number as a signed integer.
    ///
    /// Infinities and NaNs do not have a coefficient, so this method reports
    /// zero for them. The payload of a NaN is available via
    /// [`payload`](Decimal::payload).
    pub fn coefficient(&self) -> BigInt {
        if self.is_special() {
            return BigInt::zero();
        }
        let sign = if self.significand.is_zero() {
            Sign::NoSign
        } else if self.is_negative() {
            Sign::Minus
        } else {
            Sign::Plus
        };
        BigInt::from_biguint(sign, self.significand.clone())
    }

    /// Returns the exponent of the number.
    ///
    /// The exponent of an infinity or a NaN is zero.
    pub fn exponent(&self) -> &BigInt {
        &self.exponent
    }

    /// Returns the diagnostic payload of a NaN.
    ///
    /// Returns `None` if the number is not a NaN.
    pub fn payload(&self) -> Option<&BigUint> {
        if self.is_nan() {
            Some(&self.significand)
        } else {
            None
        }
    }

    /// Returns the number of digits in the significand.
    ///
    /// Infinities and NaNs have no significand, so this method reports zero
    /// for them. A zero has one digit.
    pub fn digits(&self) -> usize {
        if self.is_special() {
            0
        } else {
            math::digit_count(&self.significand) as usize
        }
    }

    /// Reports whether the number is finite.
    ///
    /// A finite number is one that is neither infinite nor a NaN.
    pub fn is_finite(&self) -> bool {
        self.flags & SPECIAL == 0
    }

    /// Reports whether the number is positive or negative infinity.
    pub fn is_infinite(&self) -> bool {
        self.flags & INF != 0
    }

    /// Reports whether the number is a NaN, of either the quiet or the
    /// signaling kind.
    pub fn is_nan(&self) -> bool {
        self.flags & ANY_NAN != 0
    }

    /// Reports whether the number is a quiet NaN.
    pub fn is_quiet_nan(&self) -> bool {
        self.flags & QNAN != 0
    }

    /// Reports whether the number is a signaling NaN.
    pub fn is_signaling_nan(&self) -> bool {
        self.flags & SNAN != 0
    }

    /// Reports whether the number has a negative sign.
    ///
    /// Note that zeros and NaNs can carry a negative sign.
    pub fn is_negative(&self) -> bool {
        self.flags & NEG != 0
    }

    /// Reports whether the number is a zero of either sign.
    pub fn is_zero(&self) -> bool {
        self.is_finite() && self.significand.is_zero()
    }

    /// Reports whether the number is normal in the given context.
    ///
    /// A normal number is finite, non-zero, and not subnormal.
    pub fn is_normal(&self, cx: &Context) -> bool {
        self.is_finite() && !self.is_zero() && !self.is_subnormal(cx)
    }

    /// Reports whether the number is subnormal in the given context.
    ///
    /// A subnormal number is finite, non-zero, and has an adjusted exponent
    /// smaller than the context's minimum exponent. A context without an
    /// exponent range has no subnormal numbers.
    pub fn is_subnormal(&self, cx: &Context) -> bool {
        if !self.is_finite() || self.is_zero() {
            return false;
        }
        match cx.min_exponent() {
            None => false,
            Some(emin) => self.adjusted_exponent() < BigInt::from(emin as i64),
        }
    }

    /// Clears the sign of the number.
    pub fn copy_abs(mut self) -> Decimal {
        self.flags &= !NEG;
        self
    }

    /// Inverts the sign of the number.
    pub fn copy_negate(mut self) -> Decimal {
        self.flags ^= NEG;
        self
    }

    /// Replaces the sign of the number with the sign of `rhs`.
    pub fn copy_sign(mut self, rhs: &Decimal) -> Decimal {
        self.flags = (self.flags & !NEG) | (rhs.flags & NEG);
        self
    }

    /// Reports whether the quantum of the number matches the quantum of
    /// `rhs`.
    ///
    /// Quantums are considered to match if the numbers have the same
    /// exponent, are both NaNs, or both infinite.
    pub fn quantum_matches(&self, rhs: &Decimal) -> bool {
        if self.is_nan() || rhs.is_nan() {
            self.is_nan() && rhs.is_nan()
        } else if self.is_infinite() || rhs.is_infinite() {
            self.is_infinite() && rhs.is_infinite()
        } else {
            self.exponent == rhs.exponent
        }
    }

    /// Compares the number to `rhs` using the total ordering over all
    /// decimal numbers.
    ///
    /// Unlike numeric comparison, the total order distinguishes between
    /// redundant representations of the same value and gives NaNs a defined
    /// place relative to numbers. Negative NaNs sort below negative
    /// infinity, positive NaNs above positive infinity, and where two
    /// representations share a value the one with the smaller exponent sorts
    /// first.
    pub fn total_cmp(&self, rhs: &Decimal) -> Ordering {
        let ln = self.is_negative();
        let rn = rhs.is_negative();
        if ln != rn {
            return if ln { Ordering::Less } else { Ordering::Greater };
        }
        let ord = self.total_cmp_unsigned(rhs);
        if ln {
            ord.reverse()
        } else {
            ord
        }
    }

    /// Compares the absolute value of the number to the absolute value of
    /// `rhs` using the total ordering.
    pub fn total_cmp_mag(&self, rhs: &Decimal) -> Ordering {
        self.total_cmp_unsigned(rhs)
    }

    /// Total order of the positive cone. Signs are ignored.
    fn total_cmp_unsigned(&self, rhs: &Decimal) -> Ordering {
        fn rank(d: &Decimal) -> u8 {
            if d.is_quiet_nan() {
                3
            } else if d.is_signaling_nan() {
                2
            } else if d.is_infinite() {
                1
            } else {
                0
            }
        }
        let (lr, rr) = (rank(self), rank(rhs));
        if lr != rr {
            return lr.cmp(&rr);
        }
        match lr {
            // Finite against finite: numeric magnitude first, with the
            // exponent breaking ties between representations of one value.
            0 => match math::cmp_magnitude(self, rhs) {
                Ordering::Equal => self.exponent.cmp(&rhs.exponent),
                ord => ord,
            },
            1 => Ordering::Equal,
            _ => self.significand.cmp(&rhs.significand),
        }
    }

    /// Returns a string of the number in standard notation, i.e. guaranteed
    /// to not be scientific notation.
    ///
    /// Special values, and numbers whose exponent does not fit in an `i64`,
    /// format as they do via [`Display`](fmt::Display).
    pub fn to_standard_notation_string(&self) -> String {
        if !self.is_finite() {
            return self.to_string();
        }
        let e = match self.exponent.to_i64() {
            Some(e) => e,
            None => return self.to_string(),
        };
        let digits = self.significand.to_str_radix(10);
        let mut out = String::new();
        if self.is_negative() {
            out.push('-');
        }
        if e >= 0 {
            out.push_str(&digits);
            for _ in 0..e {
                out.push('0');
            }
        } else {
            let point = digits.len() as i64 + e;
            if point > 0 {
                out.push_str(&digits[..point as usize]);
                out.push('.');
                out.push_str(&digits[point as usize..]);
            } else {
                out.push_str("0.");
                for _ in 0..-point {
                    out.push('0');
                }
                out.push_str(&digits);
            }
        }
        out
    }

    /// Returns a string of the number in the to-engineering-string notation
    /// of the General Decimal Arithmetic specification, in which any exponent
    /// shown is a multiple of three.
    ///
    /// Equivalent to formatting with the alternate flag, `{:#}`.
    pub fn to_engineering_string(&self) -> String {
        format!("{:#}", self)
    }

    pub(crate) fn is_special(&self) -> bool {
        self.flags & SPECIAL != 0
    }

    /// The exponent of the most significant digit, `exponent + digits - 1`.
    ///
    /// Must not be called on special values. A zero is taken to have one
    /// digit, so its adjusted exponent is its exponent.
    pub(crate) fn adjusted_exponent(&self) -> BigInt {
        &self.exponent + BigInt::from(math::digit_count(&self.significand) as i64 - 1)
    }
}

impl Context {
    /// Merges `st` into the context's status and reports any trapped
    /// conditions.
    fn complete<T>(&mut self, st: Status, n: T) -> Result<T, TrapError> {
        self.status.merge(st);
        if st.intersects(self.traps) {
            Err(TrapError::new(Status {
                inner: st.inner & self.traps.inner,
            }))
        } else {
            Ok(n)
        }
    }

    /// Parses a number from its string representation.
    ///
    /// The result is rounded to the context's precision, and any conditions
    /// the rounding raises are merged into the context's status. Parsing
    /// never trips a trap; a malformed string is reported as an error
    /// instead.
    pub fn parse<S>(&mut self, s: S) -> Result<Decimal, ParseDecimalError>
    where
        S: AsRef<str>,
    {
        let mut st = Status::default();
        let n = crate::parse::parse(s.as_ref(), Some(&*self), &mut st)?;
        self.status.merge(st);
        Ok(n)
    }

    /// Classifies the number.
    pub fn class(&self, n: &Decimal) -> Class {
        if n.is_signaling_nan() {
            Class::SignalingNan
        } else if n.is_quiet_nan() {
            Class::QuietNan
        } else if n.is_infinite() {
            if n.is_negative() {
                Class::NegInfinity
            } else {
                Class::PosInfinity
            }
        } else if n.is_zero() {
            if n.is_negative() {
                Class::NegZero
            } else {
                Class::PosZero
            }
        } else if n.is_subnormal(self) {
            if n.is_negative() {
                Class::NegSubnormal
            } else {
                Class::PosSubnormal
            }
        } else if n.is_negative() {
            Class::NegNormal
        } else {
            Class::PosNormal
        }
    }

    /// Compares `lhs` and `rhs` numerically.
    ///
    /// Returns `None` if either operand is a NaN. Comparing a signaling NaN
    /// raises the invalid operation condition.
    pub fn partial_cmp(
        &mut self,
        lhs: &Decimal,
        rhs: &Decimal,
    ) -> Result<Option<Ordering>, TrapError> {
        let mut st = Status::default();
        let ord = if lhs.is_signaling_nan() || rhs.is_signaling_nan() {
            st.raise(Status::INVALID_OPERATION);
            None
        } else {
            math::cmp_value(lhs, rhs)
        };
        self.complete(st, ord)
    }

    /// Computes the absolute value of `n`.
    ///
    /// The result is rounded to the context's precision.
    pub fn abs(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.abs(n, self, &mut st)
        } else {
            MATH.abs(n, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Rounds `n` to the context's precision, retaining its sign.
    ///
    /// This is the unary plus operation, evaluated as the addition of `n` to
    /// a zero with the same exponent.
    pub fn plus(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.plus(n, self, &mut st)
        } else {
            MATH.plus(n, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Negates `n` and rounds the result to the context's precision.
    pub fn minus(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.minus(n, self, &mut st)
        } else {
            MATH.minus(n, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Adds `lhs` and `rhs`.
    pub fn add(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.add(lhs, rhs, self, &mut st)
        } else {
            MATH.add(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Subtracts `rhs` from `lhs`.
    pub fn sub(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.sub(lhs, rhs, self, &mut st)
        } else {
            MATH.sub(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Multiplies `lhs` and `rhs`.
    pub fn mul(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.mul(lhs, rhs, self, &mut st)
        } else {
            MATH.mul(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Divides `lhs` by `rhs`.
    ///
    /// In a context with no precision limit, a quotient that cannot be
    /// represented exactly raises the invalid operation condition rather
    /// than looping forever.
    pub fn div(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.div(lhs, rhs, self, &mut st)
        } else {
            MATH.div(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Divides `lhs` by `rhs` and truncates the quotient to an integer.
    ///
    /// The result has an exponent of zero. A quotient with more digits than
    /// the context's precision raises the invalid operation condition.
    pub fn div_integer(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.div_integer(lhs, rhs, self, &mut st)
        } else {
            MATH.div_integer(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the remainder of `lhs` divided by `rhs`.
    ///
    /// The remainder is what is left over after dividing `lhs` by `rhs` and
    /// truncating the quotient to an integer. A non-zero remainder has the
    /// sign of `lhs`.
    pub fn rem(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.rem(lhs, rhs, self, &mut st)
        } else {
            MATH.rem(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the remainder of `lhs` divided by `rhs`, with the quotient
    /// rounded to the nearest integer rather than truncated.
    ///
    /// Ties in the quotient round to even. The magnitude of the remainder is
    /// therefore at most half the magnitude of `rhs`.
    pub fn rem_near(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.rem_near(lhs, rhs, self, &mut st)
        } else {
            MATH.rem_near(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Calculates the fused multiply-add `(x * y) + z`.
    ///
    /// The multiplication is carried out first and is exact, so this
    /// operation has only the one, final rounding.
    pub fn fma(&mut self, x: &Decimal, y: &Decimal, z: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.fma(x, y, z, self, &mut st)
        } else {
            MATH.fma(x, y, z, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the square root of `n`.
    ///
    /// The result is correctly rounded. Taking the square root of a negative
    /// number raises the invalid operation condition, except that the square
    /// root of negative zero is negative zero.
    pub fn sqrt(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.sqrt(n, self, &mut st)
        } else {
            MATH.sqrt(n, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the exponential of `n`, that is, e raised to the power of
    /// `n`.
    ///
    /// The result is correctly rounded. This operation requires a context
    /// with a precision limit; in an unlimited context an inexact result
    /// raises the invalid operation condition.
    pub fn exp(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.exp(n, self, &mut st)
        } else {
            MATH.exp(n, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the natural logarithm of `n`.
    ///
    /// The result is correctly rounded. The logarithm of zero is negative
    /// infinity and raises the division by zero condition; the logarithm of
    /// a negative number is an invalid operation.
    pub fn ln(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.ln(n, self, &mut st)
        } else {
            MATH.ln(n, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the base-10 logarithm of `n`.
    ///
    /// An exact power of ten yields an exact integral result. Otherwise the
    /// result is correctly rounded, and the same operand restrictions apply
    /// as for [`ln`](Context::ln).
    pub fn log10(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.log10(n, self, &mut st)
        } else {
            MATH.log10(n, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Raises `x` to the power of `y`.
    ///
    /// An integral `y` is computed by repeated squaring and has at most one
    /// rounding. A fractional `y` is evaluated via the exponential of
    /// `y * ln(x)`, requires a context with a precision limit, and is
    /// correct to within one unit in the last place. Raising a negative
    /// number to a fractional power is an invalid operation.
    pub fn pow(&mut self, x: &Decimal, y: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.pow(x, y, self, &mut st)
        } else {
            MATH.pow(x, y, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Rounds or pads `lhs` so that it has the same exponent as `rhs`.
    ///
    /// A result that would have more digits than the context's precision, or
    /// a target exponent outside the context's exponent range, raises the
    /// invalid operation condition.
    pub fn quantize(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.quantize(lhs, rhs, self, &mut st)
        } else {
            MATH.quantize(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Rounds or pads `lhs` so that its exponent is the integral value of
    /// `rhs`.
    ///
    /// Where [`quantize`](Context::quantize) reads the target exponent off
    /// of `rhs`, this operation uses the value of `rhs` as the target
    /// exponent directly.
    pub fn rescale(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.rescale(lhs, rhs, self, &mut st)
        } else {
            MATH.rescale(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Reduces the number's coefficient to its shortest possible form
    /// without changing the value of the result.
    ///
    /// The result is rounded to the context's precision before trailing
    /// zeros are removed.
    pub fn reduce(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.reduce(n, self, &mut st)
        } else {
            MATH.reduce(n, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Rounds `n` to an integral value using the context's rounding mode.
    ///
    /// Raises the rounded condition, and additionally the inexact condition
    /// when a discarded digit was non-zero. The context's precision and
    /// exponent range do not apply.
    pub fn round_to_integral_exact(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.round_integral(n, true, self, &mut st)
        } else {
            MATH.round_integral(n, true, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Rounds `n` to an integral value using the context's rounding mode.
    ///
    /// Unlike [`round_to_integral_exact`](Context::round_to_integral_exact),
    /// this operation never raises the rounded or inexact conditions.
    pub fn round_to_integral_value(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.round_integral(n, false, self, &mut st)
        } else {
            MATH.round_integral(n, false, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the minimum of `lhs` and `rhs`.
    ///
    /// If exactly one operand is a quiet NaN, the other operand is the
    /// minimum. Operands that compare equal in value are distinguished by
    /// the total ordering.
    pub fn min(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.min(lhs, rhs, self, &mut st)
        } else {
            MATH.min(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the maximum of `lhs` and `rhs`.
    ///
    /// If exactly one operand is a quiet NaN, the other operand is the
    /// maximum. Operands that compare equal in value are distinguished by
    /// the total ordering.
    pub fn max(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.max(lhs, rhs, self, &mut st)
        } else {
            MATH.max(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the minimum of `lhs` and `rhs`, comparing their absolute
    /// values.
    ///
    /// The result is the original operand, not its absolute value.
    pub fn min_abs(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.min_abs(lhs, rhs, self, &mut st)
        } else {
            MATH.min_abs(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the maximum of `lhs` and `rhs`, comparing their absolute
    /// values.
    ///
    /// The result is the original operand, not its absolute value.
    pub fn max_abs(&mut self, lhs: &Decimal, rhs: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.max_abs(lhs, rhs, self, &mut st)
        } else {
            MATH.max_abs(lhs, rhs, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the smallest representable number that is larger than `n`.
    ///
    /// This operation requires a context with both a precision limit and an
    /// exponent range; otherwise it raises the invalid operation condition.
    pub fn next_plus(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.next_plus(n, self, &mut st)
        } else {
            MATH.next_plus(n, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the largest representable number that is smaller than `n`.
    ///
    /// This operation requires a context with both a precision limit and an
    /// exponent range; otherwise it raises the invalid operation condition.
    pub fn next_minus(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.next_minus(n, self, &mut st)
        } else {
            MATH.next_minus(n, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the closest representable number to `x` in the direction of
    /// `y`.
    ///
    /// If `x` and `y` are numerically equal, the result is `x` with the sign
    /// of `y`. The same context requirements apply as for
    /// [`next_plus`](Context::next_plus).
    pub fn next_toward(&mut self, x: &Decimal, y: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.next_toward(x, y, self, &mut st)
        } else {
            MATH.next_toward(x, y, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Computes the adjusted exponent of `n`, that is, the exponent of its
    /// most significant digit.
    ///
    /// The adjusted exponent of a zero is negative infinity, and computing
    /// it raises the division by zero condition. The adjusted exponent of an
    /// infinity is positive infinity.
    pub fn logb(&mut self, n: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.logb(n, self, &mut st)
        } else {
            MATH.logb(n, self, &mut st)
        };
        self.complete(st, n)
    }

    /// Scales `x` by ten raised to the integral value of `y`.
    ///
    /// The scaling is applied to the exponent, so no rounding occurs unless
    /// the result leaves the context's exponent range. A `y` that is not an
    /// integer, or whose magnitude exceeds twice the sum of the context's
    /// maximum exponent and precision, raises the invalid operation
    /// condition.
    pub fn scaleb(&mut self, x: &Decimal, y: &Decimal) -> Result<Decimal, TrapError> {
        let mut st = Status::default();
        let n = if self.simplified {
            SIMPLE.scaleb(x, y, self, &mut st)
        } else {
            MATH.scaleb(x, y, self, &mut st)
        };
        self.complete(st, n)
    }
}

impl Default for Decimal {
    fn default() -> Decimal {
        Decimal::zero()
    }
}

/// Formats as [`Display`](fmt::Display) does. The alternate form, `{:#?}`,
/// shows the raw flags, significand, and exponent instead.
impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            f.debug_struct("Decimal")
                .field("flags", &self.flags)
                .field("significand", &self.significand)
                .field("exponent", &self.exponent)
                .finish()
        } else {
            fmt::Display::fmt(self, f)
        }
    }
}

/// Displays the number in the to-scientific-string notation of the General
/// Decimal Arithmetic specification.
///
/// The alternate format flag, `{:#}`, selects engineering notation instead,
/// in which the displayed exponent is a multiple of three.
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_negative() {
            f.write_str("-")?;
        }
        if self.is_infinite() {
            return f.write_str("Infinity");
        }
        if self.is_nan() {
            if self.is_signaling_nan() {
                f.write_str("sNaN")?;
            } else {
                f.write_str("NaN")?;
            }
            if !self.significand.is_zero() {
                write!(f, "{}", self.significand)?;
            }
            return Ok(());
        }
        let digits = self.significand.to_str_radix(10);
        if f.alternate() {
            fmt_eng(f, &digits, &self.exponent)
        } else {
            fmt_sci(f, &digits, &self.exponent)
        }
    }
}

/// Writes `digits` with the decimal point `-e` places from the right. `e`
/// must not be positive.
fn fmt_plain(f: &mut fmt::Formatter, digits: &str, e: i64) -> fmt::Result {
    if e == 0 {
        return f.write_str(digits);
    }
    let point = digits.len() as i64 + e;
    if point > 0 {
        f.write_str(&digits[..point as usize])?;
        f.write_str(".")?;
        f.write_str(&digits[point as usize..])
    } else {
        f.write_str("0.")?;
        for _ in 0..-point {
            f.write_str("0")?;
        }
        f.write_str(digits)
    }
}

/// Writes an exponent with an explicit sign, per the to-scientific-string
/// grammar.
fn fmt_exponent(f: &mut fmt::Formatter, e: &BigInt) -> fmt::Result {
    if e.sign() == Sign::Minus {
        write!(f, "E{}", e)
    } else {
        write!(f, "E+{}", e)
    }
}

fn fmt_sci(f: &mut fmt::Formatter, digits: &str, exponent: &BigInt) -> fmt::Result {
    if let Some(e) = exponent.to_i64() {
        let adjusted = e + digits.len() as i64 - 1;
        if e <= 0 && adjusted >= -6 {
            return fmt_plain(f, digits, e);
        }
    }
    f.write_str(&digits[..1])?;
    if digits.len() > 1 {
        f.write_str(".")?;
        f.write_str(&digits[1..])?;
    }
    let adjusted = exponent + BigInt::from(digits.len() as i64 - 1);
    fmt_exponent(f, &adjusted)
}

fn fmt_eng(f: &mut fmt::Formatter, digits: &str, exponent: &BigInt) -> fmt::Result {
    if let Some(e) = exponent.to_i64() {
        let adjusted = e + digits.len() as i64 - 1;
        if e <= 0 && adjusted >= -6 {
            return fmt_plain(f, digits, e);
        }
    }
    let three = BigInt::from(3);
    if digits == "0" {
        // A zero keeps its exponent, raised to the next multiple of three,
        // with the difference shown as fractional zeros.
        let pad = (&three - exponent.mod_floor(&three)).mod_floor(&three);
        let shown = exponent + &pad;
        let pad = pad.to_usize().unwrap_or(0);
        f.write_str("0")?;
        if pad > 0 {
            f.write_str(".")?;
            for _ in 0..pad {
                f.write_str("0")?;
            }
        }
        return fmt_exponent(f, &shown);
    }
    let adjusted = exponent + BigInt::from(digits.len() as i64 - 1);
    let adj3 = adjusted.mod_floor(&three);
    let shown = &adjusted - &adj3;
    let int_digits = adj3.to_usize().unwrap_or(0) + 1;
    if digits.len() <= int_digits {
        f.write_str(digits)?;
        for _ in 0..int_digits - digits.len() {
            f.write_str("0")?;
        }
    } else {
        f.write_str(&digits[..int_digits])?;
        f.write_str(".")?;
        f.write_str(&digits[int_digits..])?;
    }
    if !shown.is_zero() {
        fmt_exponent(f, &shown)?;
    }
    Ok(())
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Decimal, ParseDecimalError> {
        crate::parse::parse(s, None, &mut Status::default())
    }
}

const CACHE_MIN: i64 = -24;
const CACHE_MAX: i64 = 128;

static CACHE: OnceLock<Vec<Decimal>> = OnceLock::new();

/// Small integers are requested constantly, so the common band is built once
/// and cloned out instead of re-derived.
fn cached(n: i64) -> Decimal {
    let table = CACHE.get_or_init(|| (CACHE_MIN..=CACHE_MAX).map(|n| Decimal::new(n, 0)).collect());
    table[(n - CACHE_MIN) as usize].clone()
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {$(
        impl From<$t> for Decimal {
            fn from(n: $t) -> Decimal {
                match n.to_i64() {
                    Some(n) if n >= CACHE_MIN && n <= CACHE_MAX => cached(n),
                    _ => Decimal::new(n, 0),
                }
            }
        }
    )*};
}

impl_from_integer!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// Converts the floating-point number to the decimal number with exactly the
/// same value.
impl From<f32> for Decimal {
    fn from(n: f32) -> Decimal {
        conv::from_f32(n)
    }
}

/// Converts the floating-point number to the decimal number with exactly the
/// same value.
impl From<f64> for Decimal {
    fn from(n: f64) -> Decimal {
        conv::from_f64(n)
    }
}

macro_rules! impl_try_from_decimal {
    ($($t:ty => $m:ident),* $(,)?) => {$(
        /// Converts the value of the decimal number, if it is integral and
        /// in range. The conversion is based on the value, so `1.00`
        /// converts where `1.5` does not.
        impl TryFrom<&Decimal> for $t {
            type Error = TryFromDecimalError;

            fn try_from(n: &Decimal) -> Result<$t, TryFromDecimalError> {
                match n.integer_exact() {
                    Some(i) => i.$m().ok_or(TryFromDecimalError),
                    None => Err(TryFromDecimalError),
                }
            }
        }

        /// Converts the value of the decimal number, if it is integral and
        /// in range. The conversion is based on the value, so `1.00`
        /// converts where `1.5` does not.
        impl TryFrom<Decimal> for $t {
            type Error = TryFromDecimalError;

            fn try_from(n: Decimal) -> Result<$t, TryFromDecimalError> {
                <$t>::try_from(&n)
            }
        }
    )*};
}

impl_try_from_decimal!(
    i32 => to_i32,
    i64 => to_i64,
    i128 => to_i128,
    u32 => to_u32,
    u64 => to_u64,
    u128 => to_u128,
);

impl Decimal {
    /// The value as an integer, if the value is integral and small enough to
    /// be worth materializing.
    fn integer_exact(&self) -> Option<BigInt> {
        if self.is_special() {
            return None;
        }
        if self.significand.is_zero() {
            return Some(BigInt::zero());
        }
        let digits = math::digit_count(&self.significand) as i64;
        match self.exponent.to_i64() {
            // No primitive integer has more than 39 decimal digits.
            Some(e) if e >= 0 => {
                if digits + e > 39 {
                    None
                } else {
                    let n = &self.significand * math::ten_pow(e as u64);
                    Some(BigInt::from_biguint(self.int_sign(), n))
                }
            }
            Some(e) => {
                if -e >= digits {
                    return None;
                }
                let (q, r) = self.significand.div_rem(&math::ten_pow(-e as u64));
                if r.is_zero() {
                    Some(BigInt::from_biguint(self.int_sign(), q))
                } else {
                    None
                }
            }
            None => None,
        }
    }

    /// The value truncated toward zero, if it is small enough to be worth
    /// materializing.
    fn integer_trunc(&self) -> Option<BigInt> {
        if self.is_special() {
            return None;
        }
        if self.significand.is_zero() {
            return Some(BigInt::zero());
        }
        let digits = math::digit_count(&self.significand) as i64;
        match self.exponent.to_i64() {
            Some(e) if e >= 0 => {
                if digits + e > 39 {
                    None
                } else {
                    let n = &self.significand * math::ten_pow(e as u64);
                    Some(BigInt::from_biguint(self.int_sign(), n))
                }
            }
            Some(e) => {
                if -e >= digits {
                    return Some(BigInt::zero());
                }
                let q = &self.significand / math::ten_pow(-e as u64);
                Some(BigInt::from_biguint(self.int_sign(), q))
            }
            // An exponent past i64 is either a fraction below one or a
            // number too large to be worth materializing.
            None => {
                if self.exponent.sign() == Sign::Minus {
                    Some(BigInt::zero())
                } else {
                    None
                }
            }
        }
    }

    fn int_sign(&self) -> Sign {
        if self.is_negative() {
            Sign::Minus
        } else {
            Sign::Plus
        }
    }
}

impl ToPrimitive for Decimal {
    fn to_i64(&self) -> Option<i64> {
        self.integer_trunc()?.to_i64()
    }

    fn to_u64(&self) -> Option<u64> {
        self.integer_trunc()?.to_u64()
    }

    fn to_i128(&self) -> Option<i128> {
        self.integer_trunc()?.to_i128()
    }

    fn to_u128(&self) -> Option<u128> {
        self.integer_trunc()?.to_u128()
    }

    fn to_f32(&self) -> Option<f32> {
        Some(conv::to_f32(self))
    }

    fn to_f64(&self) -> Option<f64> {
        Some(conv::to_f64(self))
    }
}

impl Zero for Decimal {
    fn zero() -> Decimal {
        Decimal::zero()
    }

    fn is_zero(&self) -> bool {
        Decimal::is_zero(self)
    }
}

impl One for Decimal {
    fn one() -> Decimal {
        Decimal::one()
    }
}

impl Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        self.copy_negate()
    }
}

impl Neg for &Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        self.clone().copy_negate()
    }
}

macro_rules! impl_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<Decimal> for Decimal {
            type Output = Decimal;

            fn $method(self, rhs: Decimal) -> Decimal {
                $trait::$method(&self, &rhs)
            }
        }

        impl $trait<&Decimal> for Decimal {
            type Output = Decimal;

            fn $method(self, rhs: &Decimal) -> Decimal {
                $trait::$method(&self, rhs)
            }
        }

        impl $trait<Decimal> for &Decimal {
            type Output = Decimal;

            fn $method(self, rhs: Decimal) -> Decimal {
                $trait::$method(self, &rhs)
            }
        }

        impl $trait<&Decimal> for &Decimal {
            type Output = Decimal;

            fn $method(self, rhs: &Decimal) -> Decimal {
                let mut st = Status::default();
                MATH.$method(self, rhs, &Context::unlimited(), &mut st)
            }
        }
    };
}

impl_binop!(Add, add);
impl_binop!(Sub, sub);
impl_binop!(Mul, mul);
impl_binop!(Div, div);
impl_binop!(Rem, rem);

macro_rules! impl_binop_assign {
    ($trait:ident, $method:ident, $base:ident, $base_method:ident) => {
        impl $trait<Decimal> for Decimal {
            fn $method(&mut self, rhs: Decimal) {
                *self = $base::$base_method(&*self, &rhs);
            }
        }

        impl $trait<&Decimal> for Decimal {
            fn $method(&mut self, rhs: &Decimal) {
                *self = $base::$base_method(&*self, rhs);
            }
        }
    };
}

impl_binop_assign!(AddAssign, add_assign, Add, add);
impl_binop_assign!(SubAssign, sub_assign, Sub, sub);
impl_binop_assign!(MulAssign, mul_assign, Mul, mul);
impl_binop_assign!(DivAssign, div_assign, Div, div);
impl_binop_assign!(RemAssign, rem_assign, Rem, rem);

impl Sum for Decimal {
    fn sum<I>(iter: I) -> Decimal
    where
        I: Iterator<Item = Decimal>,
    {
        iter.fold(Decimal::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Decimal> for Decimal {
    fn sum<I>(iter: I) -> Decimal
    where
        I: Iterator<Item = &'a Decimal>,
    {
        iter.fold(Decimal::zero(), Add::add)
    }
}

impl Product for Decimal {
    fn product<I>(iter: I) -> Decimal
    where
        I: Iterator<Item = Decimal>,
    {
        iter.fold(Decimal::one(), Mul::mul)
    }
}

impl<'a> Product<&'a Decimal> for Decimal {
    fn product<I>(iter: I) -> Decimal
    where
        I: Iterator<Item = &'a Decimal>,
    {
        iter.fold(Decimal::one(), Mul::mul)
    }
}

#[cfg(feature = "serde")]
mod impl_serde {
    use std::fmt;
    use std::str::FromStr;

    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::Decimal;

    /// Serializes the number as its string representation, which survives
    /// transport through formats whose native numbers are binary floats.
    impl Serialize for Decimal {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Decimal {
        fn deserialize<D>(deserializer: D) -> Result<Decimal, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(DecimalVisitor)
        }
    }

    struct DecimalVisitor;

    impl<'de> de::Visitor<'de> for DecimalVisitor {
        type Value = Decimal;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or a decimal string")
        }

        fn visit_i64<E>(self, n: i64) -> Result<Decimal, E>
        where
            E: de::Error,
        {
            Ok(Decimal::from(n))
        }

        fn visit_u64<E>(self, n: u64) -> Result<Decimal, E>
        where
            E: de::Error,
        {
            Ok(Decimal::from(n))
        }

        fn visit_i128<E>(self, n: i128) -> Result<Decimal, E>
        where
            E: de::Error,
        {
            Ok(Decimal::from(n))
        }

        fn visit_u128<E>(self, n: u128) -> Result<Decimal, E>
        where
            E: de::Error,
        {
            Ok(Decimal::from(n))
        }

        fn visit_f64<E>(self, n: f64) -> Result<Decimal, E>
        where
            E: de::Error,
        {
            Ok(Decimal::from(n))
        }

        fn visit_str<E>(self, s: &str) -> Result<Decimal, E>
        where
            E: de::Error,
        {
            Decimal::from_str(s).map_err(de::Error::custom)
        }
    }
}
