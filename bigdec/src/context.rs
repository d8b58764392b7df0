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

use std::fmt;

use crate::error::{InvalidExponentError, InvalidPrecisionError};

/// The maximum precision, in digits, that a context can be configured with.
pub const MAX_PRECISION: usize = 999_999_999;

/// The maximum value that a context's maximum exponent can be set to.
pub const MAX_EXPONENT: isize = 999_999_999;

/// The minimum value that a context's minimum exponent can be set to.
pub const MIN_EXPONENT: isize = -999_999_999;

/// A context for performing decimal operations.
///
/// Contexts serve two purposes:
///
///   * They configure various properties of decimal arithmetic, like the
///     precision to compute results to and the rounding algorithm to use.
///
///   * They accumulate any informational and exceptional conditions raised by
///     decimal operations. Multiple operations can be performed on a context
///     and the status need only be checked once at the end. This can improve
///     performance when performing many decimal operations.
///
/// The default context places no limit on precision or exponent range, uses
/// [half-even rounding](Rounding::HalfEven), and enables no traps. Operations
/// under the default context are exact wherever exactness is possible.
///
/// A context is a plain value: clone it to snapshot the configuration and
/// status, or construct a fresh one per operation sequence. Contexts are not
/// synchronized; confine each context to one thread or one call sequence, or
/// synchronize access externally.
#[derive(Clone)]
pub struct Context {
    pub(crate) precision: usize,
    pub(crate) rounding: Rounding,
    pub(crate) emax: Option<isize>,
    pub(crate) emin: Option<isize>,
    pub(crate) traps: Status,
    pub(crate) status: Status,
    pub(crate) clamp: bool,
    pub(crate) adjust_exponent: bool,
    pub(crate) simplified: bool,
    pub(crate) precision_in_bits: bool,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("adjust_exponent", &self.adjust_exponent)
            .field("clamp", &self.clamp)
            .field("precision", &self.precision)
            .field("precision_in_bits", &self.precision_in_bits)
            .field("emax", &self.emax)
            .field("emin", &self.emin)
            .field("rounding", &self.rounding)
            .field("simplified", &self.simplified)
            .field("traps", &self.traps)
            .finish()
    }
}

impl Default for Context {
    fn default() -> Context {
        Context::unlimited()
    }
}

impl Context {
    /// Constructs a context with unlimited precision, an unlimited exponent
    /// range, half-even rounding, and no traps.
    ///
    /// This is the context the decimal specification prescribes when no
    /// context is supplied. It is a `const fn`, so no shared global state is
    /// required for the common case.
    pub const fn unlimited() -> Context {
        Context {
            precision: 0,
            rounding: Rounding::HalfEven,
            emax: None,
            emin: None,
            traps: Status { inner: 0 },
            status: Status { inner: 0 },
            clamp: false,
            adjust_exponent: true,
            simplified: false,
            precision_in_bits: false,
        }
    }

    /// Constructs a context with the precision and exponent range of the
    /// 32-bit decimal interchange format: 7 digits, exponents in −95..=96.
    pub const fn decimal32() -> Context {
        Context {
            precision: 7,
            emax: Some(96),
            emin: Some(-95),
            clamp: true,
            ..Context::unlimited()
        }
    }

    /// Constructs a context with the precision and exponent range of the
    /// 64-bit decimal interchange format: 16 digits, exponents in −383..=384.
    pub const fn decimal64() -> Context {
        Context {
            precision: 16,
            emax: Some(384),
            emin: Some(-383),
            clamp: true,
            ..Context::unlimited()
        }
    }

    /// Constructs a context with the precision and exponent range of the
    /// 128-bit decimal interchange format: 34 digits, exponents in
    /// −6143..=6144.
    pub const fn decimal128() -> Context {
        Context {
            precision: 34,
            emax: Some(6144),
            emin: Some(-6143),
            clamp: true,
            ..Context::unlimited()
        }
    }

    /// Returns the context's precision.
    ///
    /// Operations that require rounding will round to this number of
    /// significant digits. A precision of zero means precision is unlimited
    /// and results are exact wherever exactness is possible.
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Sets the context's precision.
    ///
    /// The precision must be no greater than [`MAX_PRECISION`]. A precision
    /// of zero means unlimited.
    pub fn set_precision(&mut self, precision: usize) -> Result<(), InvalidPrecisionError> {
        if precision > MAX_PRECISION {
            return Err(InvalidPrecisionError);
        }
        self.precision = precision;
        Ok(())
    }

    /// Returns the context's rounding algorithm.
    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Sets the context's rounding algorithm.
    pub fn set_rounding(&mut self, rounding: Rounding) {
        self.rounding = rounding;
    }

    /// Returns the context's maximum adjusted exponent, if the context has an
    /// exponent range.
    pub fn max_exponent(&self) -> Option<isize> {
        self.emax
    }

    /// Sets the context's maximum adjusted exponent.
    ///
    /// The maximum exponent must be in the range 0..=[`MAX_EXPONENT`].
    pub fn set_max_exponent(&mut self, e: isize) -> Result<(), InvalidExponentError> {
        if !(0..=MAX_EXPONENT).contains(&e) {
            return Err(InvalidExponentError);
        }
        self.emax = Some(e);
        Ok(())
    }

    /// Returns the context's minimum adjusted exponent, if the context has an
    /// exponent range.
    pub fn min_exponent(&self) -> Option<isize> {
        self.emin
    }

    /// Sets the context's minimum adjusted exponent.
    ///
    /// The minimum exponent must be in the range [`MIN_EXPONENT`]..=0.
    pub fn set_min_exponent(&mut self, e: isize) -> Result<(), InvalidExponentError> {
        if !(MIN_EXPONENT..=0).contains(&e) {
            return Err(InvalidExponentError);
        }
        self.emin = Some(e);
        Ok(())
    }

    /// Removes the context's exponent range, so that any exponent is
    /// representable.
    ///
    /// With no exponent range, overflow, underflow, and subnormal conditions
    /// cannot occur.
    pub fn clear_exponent_range(&mut self) {
        self.emax = None;
        self.emin = None;
    }

    /// Reports whether the context clamps exponents.
    ///
    /// See [`Context::set_clamp`].
    pub fn clamp(&self) -> bool {
        self.clamp
    }

    /// Sets whether the context clamps exponents.
    ///
    /// When enabled, a result whose exponent lies above the largest exponent
    /// at which a full-precision value can be represented has its coefficient
    /// padded with trailing zeros and its exponent reduced to that largest
    /// exponent, raising the clamped condition. This mirrors the behavior of
    /// the fixed-size decimal interchange formats.
    pub fn set_clamp(&mut self, clamp: bool) {
        self.clamp = clamp;
    }

    /// Reports whether exponent range checks use the adjusted exponent.
    ///
    /// See [`Context::set_adjust_exponent`].
    pub fn adjust_exponent(&self) -> bool {
        self.adjust_exponent
    }

    /// Sets whether exponent range checks use the adjusted exponent.
    ///
    /// When enabled (the default), the minimum and maximum exponents bound the
    /// adjusted exponent of a result, i.e. the exponent as if the value were
    /// written with one digit before the decimal point. When disabled, the
    /// bounds apply to the literal exponent of the representation instead.
    pub fn set_adjust_exponent(&mut self, adjust_exponent: bool) {
        self.adjust_exponent = adjust_exponent;
    }

    /// Reports whether the context uses simplified arithmetic.
    ///
    /// See [`Context::set_simplified`].
    pub fn simplified(&self) -> bool {
        self.simplified
    }

    /// Sets whether the context uses simplified arithmetic.
    ///
    /// Simplified arithmetic rounds operands to the context's precision
    /// before each operation, canonicalizes zero results, and expands small
    /// positive exponents into integer form. It has no subnormal class.
    pub fn set_simplified(&mut self, simplified: bool) {
        self.simplified = simplified;
    }

    /// Reports whether the context's precision is measured in bits.
    ///
    /// See [`Context::set_precision_in_bits`].
    pub fn precision_in_bits(&self) -> bool {
        self.precision_in_bits
    }

    /// Sets whether the context's precision is measured in bits.
    ///
    /// When enabled, the precision limits the bit length of a result's
    /// coefficient rather than its decimal digit count. Rounding still
    /// discards decimal digits.
    pub fn set_precision_in_bits(&mut self, precision_in_bits: bool) {
        self.precision_in_bits = precision_in_bits;
    }

    /// Returns the conditions that are trapped.
    pub fn traps(&self) -> Status {
        self.traps
    }

    /// Sets the conditions that are trapped.
    ///
    /// An operation that raises a trapped condition returns an error
    /// identifying the condition instead of a substitute value. The condition
    /// is still recorded in the context's status.
    pub fn set_traps(&mut self, traps: Status) {
        self.traps = traps;
    }

    /// Returns the context's status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Clears the context's status.
    pub fn clear_status(&mut self) {
        self.status = Status::default();
    }

    /// The smallest exponent a subnormal result may take, as an `i64`, when
    /// the context has an exponent range.
    pub(crate) fn etiny(&self) -> Option<i64> {
        let emin = self.emin? as i64;
        if self.precision > 1 {
            Some(emin - (self.precision as i64 - 1))
        } else {
            Some(emin)
        }
    }

    /// The largest exponent a full-precision coefficient may carry, when the
    /// context has an exponent range.
    pub(crate) fn etop(&self) -> Option<i64> {
        let emax = self.emax? as i64;
        if self.precision > 1 {
            Some(emax - (self.precision as i64 - 1))
        } else {
            Some(emax)
        }
    }
}

/// Algorithms for rounding decimal numbers.
///
/// The rounding modes are precisely defined in [The Arithmetic Model][model]
/// chapter of the General Decimal Arithmetic specification.
///
/// [model]: http://speleotrove.com/decimal/damodel.html
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Rounding {
    /// Round towards positive infinity.
    Ceiling,
    /// Round towards zero (truncation).
    Down,
    /// Round towards negative infinity.
    Floor,
    /// Round to nearest; if equidistant, round down.
    HalfDown,
    /// Round to nearest; if equidistant, round so that the final digit is even.
    HalfEven,
    /// Round to nearest; if equidistant, round up.
    HalfUp,
    /// Do not round.
    ///
    /// An operation whose result would require discarding a nonzero digit
    /// raises the invalid operation condition and returns NaN instead.
    None,
    /// Round so that the final digit of the result is odd, whenever any
    /// digits are discarded.
    ///
    /// This mode exists to make an intermediate rounding harmless: a result
    /// rounded to odd can be re-rounded to a shorter coefficient under any
    /// round-to-nearest mode without double-rounding error.
    Odd,
    /// [`Rounding::Odd`] for binary coefficients, [`Rounding::ZeroFiveUp`]
    /// otherwise.
    OddOrZeroFiveUp,
    /// Round away from zero.
    Up,
    /// The same as [`Rounding::Up`], except that rounding up only occurs
    /// if the digit to be rounded up is 0 or 5.
    ///
    /// After overflow the result is the same as for [`Rounding::Down`].
    ZeroFiveUp,
}

impl Default for Rounding {
    fn default() -> Rounding {
        Rounding::HalfEven
    }
}

/// Represents exceptional conditions resulting from operations on decimal
/// numbers.
///
/// A default status has no conditions set. For details about the various
/// exceptional conditions, consult the [Exceptional Conditions][conditions]
/// chapter of the General Decimal Arithmetic specification.
///
/// [conditions]: http://speleotrove.com/decimal/daexcep.html
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Status {
    pub(crate) inner: u32,
}

impl Status {
    pub(crate) const INVALID_OPERATION: u32 = 1 << 0;
    pub(crate) const DIVISION_BY_ZERO: u32 = 1 << 1;
    pub(crate) const OVERFLOW: u32 = 1 << 2;
    pub(crate) const UNDERFLOW: u32 = 1 << 3;
    pub(crate) const INEXACT: u32 = 1 << 4;
    pub(crate) const ROUNDED: u32 = 1 << 5;
    pub(crate) const CLAMPED: u32 = 1 << 6;
    pub(crate) const SUBNORMAL: u32 = 1 << 7;

    /// Reports whether any of the condition flags are set.
    pub fn any(&self) -> bool {
        self.inner != 0
    }

    /// Reports whether the invalid operation flag is set.
    ///
    /// Various operations set this flag in response to invalid arguments:
    /// signaling NaN operands, indeterminate forms like 0×∞ and 0÷0, and
    /// results that cannot be represented under the context's constraints.
    pub fn invalid_operation(&self) -> bool {
        self.inner & Status::INVALID_OPERATION != 0
    }

    /// Sets or clears the invalid operation flag.
    pub fn set_invalid_operation(&mut self, set: bool) {
        self.assign(Status::INVALID_OPERATION, set);
    }

    /// Reports whether the division by zero flag is set.
    ///
    /// Operations set this flag when a nonzero dividend is divided by zero,
    /// and more generally when an exact infinite result arises from finite
    /// operands, as in `logb(0)`.
    pub fn division_by_zero(&self) -> bool {
        self.inner & Status::DIVISION_BY_ZERO != 0
    }

    /// Sets or clears the division by zero flag.
    pub fn set_division_by_zero(&mut self, set: bool) {
        self.assign(Status::DIVISION_BY_ZERO, set);
    }

    /// Reports whether the overflow flag is set.
    ///
    /// Operations set this flag when the adjusted exponent of a rounded
    /// result would exceed the context's maximum exponent.
    pub fn overflow(&self) -> bool {
        self.inner & Status::OVERFLOW != 0
    }

    /// Sets or clears the overflow flag.
    pub fn set_overflow(&mut self, set: bool) {
        self.assign(Status::OVERFLOW, set);
    }

    /// Reports whether the underflow flag is set.
    ///
    /// Operations set this flag when a result is both subnormal and inexact.
    pub fn underflow(&self) -> bool {
        self.inner & Status::UNDERFLOW != 0
    }

    /// Sets or clears the underflow flag.
    pub fn set_underflow(&mut self, set: bool) {
        self.assign(Status::UNDERFLOW, set);
    }

    /// Reports whether the inexact flag is set.
    ///
    /// Operations set this flag when one or more nonzero coefficient digits
    /// were discarded during rounding of a result.
    pub fn inexact(&self) -> bool {
        self.inner & Status::INEXACT != 0
    }

    /// Sets or clears the inexact flag.
    pub fn set_inexact(&mut self, set: bool) {
        self.assign(Status::INEXACT, set);
    }

    /// Reports whether the rounded flag is set.
    ///
    /// Operations set this flag when one or more zero or nonzero coefficient
    /// digits were discarded from a result.
    pub fn rounded(&self) -> bool {
        self.inner & Status::ROUNDED != 0
    }

    /// Sets or clears the rounded flag.
    pub fn set_rounded(&mut self, set: bool) {
        self.assign(Status::ROUNDED, set);
    }

    /// Reports whether the clamped flag is set.
    ///
    /// Operations set this flag when the exponent of a result has been
    /// altered or constrained in order to fit the constraints of the
    /// context's exponent range.
    pub fn clamped(&self) -> bool {
        self.inner & Status::CLAMPED != 0
    }

    /// Sets or clears the clamped flag.
    pub fn set_clamped(&mut self, set: bool) {
        self.assign(Status::CLAMPED, set);
    }

    /// Reports whether the subnormal flag is set.
    ///
    /// Operations set this flag when a result's adjusted exponent is less
    /// than E<sub>min</sub> before any rounding.
    pub fn subnormal(&self) -> bool {
        self.inner & Status::SUBNORMAL != 0
    }

    /// Sets or clears the subnormal flag.
    pub fn set_subnormal(&mut self, set: bool) {
        self.assign(Status::SUBNORMAL, set);
    }

    fn assign(&mut self, flag: u32, set: bool) {
        if set {
            self.inner |= flag;
        } else {
            self.inner &= !flag;
        }
    }

    pub(crate) fn raise(&mut self, flags: u32) {
        self.inner |= flags;
    }

    pub(crate) fn merge(&mut self, other: Status) {
        self.inner |= other.inner;
    }

    pub(crate) fn intersects(&self, other: Status) -> bool {
        self.inner & other.inner != 0
    }

    /// Names the most severe condition that is set.
    pub(crate) fn describe(&self) -> &'static str {
        if self.invalid_operation() {
            "invalid operation"
        } else if self.division_by_zero() {
            "division by zero"
        } else if self.overflow() {
            "overflow"
        } else if self.underflow() {
            "underflow"
        } else if self.inexact() {
            "inexact"
        } else if self.rounded() {
            "rounded"
        } else if self.clamped() {
            "clamped"
        } else if self.subnormal() {
            "subnormal"
        } else {
            "no condition"
        }
    }
}

/// The class of a decimal number.
///
/// These classes are precisely defined in [The Arithmetic Model][model]
/// chapter of the General Decimal Arithmetic specification.
///
/// [model]: http://speleotrove.com/decimal/damodel.html
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Class {
    /// Signaling NaN ("Not a Number").
    SignalingNan,
    /// Quiet NaN ("Not a Number").
    QuietNan,
    /// Negative infinity.
    NegInfinity,
    /// Negative normal.
    NegNormal,
    /// Negative subnormal.
    NegSubnormal,
    /// Negative zero.
    NegZero,
    /// Positive zero.
    PosZero,
    /// Positive subnormal.
    PosSubnormal,
    /// Positive normal.
    PosNormal,
    /// Positive infinity.
    PosInfinity,
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Class::SignalingNan => f.write_str("sNaN"),
            Class::QuietNan => f.write_str("NaN"),
            Class::NegInfinity => f.write_str("-Infinity"),
            Class::NegNormal => f.write_str("-Normal"),
            Class::NegSubnormal => f.write_str("-Subnormal"),
            Class::NegZero => f.write_str("-Zero"),
            Class::PosZero => f.write_str("+Zero"),
            Class::PosSubnormal => f.write_str("+Subnormal"),
            Class::PosNormal => f.write_str("+Normal"),
            Class::PosInfinity => f.write_str("+Infinity"),
        }
    }
}
