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

//! Arithmetic on arbitrary-precision decimals.
//!
//! The algorithms here are written against [`RadixHelper`], so they see only
//! a radix, unsigned significands, and exponents. Every operation takes a
//! [`Context`] for its settings and reports conditions into a caller-supplied
//! [`Status`]; merging that status and honoring traps is the public API's
//! concern.

use std::cmp::Ordering;
use std::marker::PhantomData;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::{Integer, Roots};
use num_traits::{One, Pow, ToPrimitive, Zero};

use crate::context::{Context, Rounding, Status};
use crate::decimal::{Decimal, ANY_NAN, INF, NEG, QNAN, SNAN, SPECIAL};

/// The longest shift the engine will materialize as a power of the radix.
///
/// Aligning operands across a wider gap than this is refused as an invalid
/// operation rather than attempted.
pub(crate) const MAX_SHIFT: u64 = 999_999_999;

const POW10: [u64; 20] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
    10_000_000_000,
    100_000_000_000,
    1_000_000_000_000,
    10_000_000_000_000,
    100_000_000_000_000,
    1_000_000_000_000_000,
    10_000_000_000_000_000,
    100_000_000_000_000_000,
    1_000_000_000_000_000_000,
    10_000_000_000_000_000_000,
];

/// `10^exp`.
pub(crate) fn ten_pow(exp: u64) -> BigUint {
    if exp < 20 {
        BigUint::from(POW10[exp as usize])
    } else {
        Pow::pow(BigUint::from(10u32), exp)
    }
}

/// The number of digits in the decimal expansion of `n`. Zero has one digit.
pub(crate) fn digit_count(n: &BigUint) -> u64 {
    if let Some(n) = n.to_u64() {
        let mut digits = 1;
        let mut n = n / 10;
        while n > 0 {
            digits += 1;
            n /= 10;
        }
        return digits;
    }
    // Estimate from the bit length, undershooting by at most a digit or two,
    // then correct upward.
    let bits = n.bits();
    let mut digits = ((bits - 1) as u128 * 301_029_995 / 1_000_000_000) as u64 + 1;
    while *n >= ten_pow(digits) {
        digits += 1;
    }
    digits
}

/// The primitives the arithmetic engine needs from a number representation.
///
/// The engine sees numbers as a flag byte, an unsigned significand, and an
/// exponent, all relative to a fixed radix. `Decimal` plugs in through
/// [`DecimalHelper`].
pub(crate) trait RadixHelper {
    type Value: Clone;

    /// The radix of the significand. Even, and at least 2.
    const RADIX: u32;

    fn flags(n: &Self::Value) -> u8;
    fn significand(n: &Self::Value) -> &BigUint;
    fn exponent(n: &Self::Value) -> &BigInt;
    fn build(flags: u8, significand: BigUint, exponent: BigInt) -> Self::Value;
    /// The number of digits in `n`, in this radix. Zero has one digit.
    fn digits(n: &BigUint) -> u64;
    /// `RADIX^exp`.
    fn pow(exp: u64) -> BigUint;
}

/// Base 10 significands as stored in [`Decimal`].
pub(crate) struct DecimalHelper;

impl RadixHelper for DecimalHelper {
    type Value = Decimal;

    const RADIX: u32 = 10;

    fn flags(n: &Decimal) -> u8 {
        n.flags
    }

    fn significand(n: &Decimal) -> &BigUint {
        &n.significand
    }

    fn exponent(n: &Decimal) -> &BigInt {
        &n.exponent
    }

    fn build(flags: u8, significand: BigUint, exponent: BigInt) -> Decimal {
        Decimal {
            flags,
            significand,
            exponent,
        }
    }

    fn digits(n: &BigUint) -> u64 {
        digit_count(n)
    }

    fn pow(exp: u64) -> BigUint {
        ten_pow(exp)
    }
}

/// Compares the magnitudes of two finite decimals.
pub(crate) fn cmp_magnitude(a: &Decimal, b: &Decimal) -> Ordering {
    magnitude_cmp::<DecimalHelper>(a, b)
}

/// Compares two decimals numerically, or `None` if either is a NaN.
pub(crate) fn cmp_value(a: &Decimal, b: &Decimal) -> Option<Ordering> {
    value_cmp::<DecimalHelper>(a, b)
}

fn adjusted<H: RadixHelper>(n: &H::Value) -> BigInt {
    H::exponent(n) + BigInt::from(H::digits(H::significand(n)) as i64 - 1)
}

/// Magnitude comparison of two finite values. Signs are ignored.
fn magnitude_cmp<H: RadixHelper>(a: &H::Value, b: &H::Value) -> Ordering {
    let (sa, sb) = (H::significand(a), H::significand(b));
    match (sa.is_zero(), sb.is_zero()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }
    match adjusted::<H>(a).cmp(&adjusted::<H>(b)) {
        Ordering::Equal => {}
        ord => return ord,
    }
    // Equal adjusted exponents: align the significands and compare. The
    // exponent gap is bounded by the digit count difference.
    let (ea, eb) = (H::exponent(a), H::exponent(b));
    match ea.cmp(eb) {
        Ordering::Equal => sa.cmp(sb),
        Ordering::Greater => {
            let shift = (ea - eb).to_u64().unwrap_or(0);
            (sa * H::pow(shift)).cmp(sb)
        }
        Ordering::Less => {
            let shift = (eb - ea).to_u64().unwrap_or(0);
            sa.cmp(&(sb * H::pow(shift)))
        }
    }
}

/// Numeric comparison. Zeros compare equal regardless of sign; NaNs do not
/// compare.
fn value_cmp<H: RadixHelper>(a: &H::Value, b: &H::Value) -> Option<Ordering> {
    let (fa, fb) = (H::flags(a), H::flags(b));
    if (fa | fb) & ANY_NAN != 0 {
        return None;
    }
    let (an, bn) = (fa & NEG != 0, fb & NEG != 0);
    if fa & INF != 0 && fb & INF != 0 {
        return Some(bn.cmp(&an));
    }
    if fa & INF != 0 {
        return Some(if an { Ordering::Less } else { Ordering::Greater });
    }
    if fb & INF != 0 {
        return Some(if bn { Ordering::Greater } else { Ordering::Less });
    }
    let (az, bz) = (H::significand(a).is_zero(), H::significand(b).is_zero());
    if az && bz {
        return Some(Ordering::Equal);
    }
    if az {
        return Some(if bn { Ordering::Greater } else { Ordering::Less });
    }
    if bz {
        return Some(if an { Ordering::Less } else { Ordering::Greater });
    }
    if an != bn {
        return Some(if an { Ordering::Less } else { Ordering::Greater });
    }
    let ord = magnitude_cmp::<H>(a, b);
    Some(if an { ord.reverse() } else { ord })
}

/// The total ordering over all values, NaNs included.
fn total_order<H: RadixHelper>(a: &H::Value, b: &H::Value) -> Ordering {
    let (an, bn) = (H::flags(a) & NEG != 0, H::flags(b) & NEG != 0);
    if an != bn {
        return if an { Ordering::Less } else { Ordering::Greater };
    }
    let ord = total_order_unsigned::<H>(a, b);
    if an {
        ord.reverse()
    } else {
        ord
    }
}

fn total_order_unsigned<H: RadixHelper>(a: &H::Value, b: &H::Value) -> Ordering {
    fn rank(f: u8) -> u8 {
        if f & QNAN != 0 {
            3
        } else if f & SNAN != 0 {
            2
        } else if f & INF != 0 {
            1
        } else {
            0
        }
    }
    let (ra, rb) = (rank(H::flags(a)), rank(H::flags(b)));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match ra {
        0 => match magnitude_cmp::<H>(a, b) {
            Ordering::Equal => H::exponent(a).cmp(H::exponent(b)),
            ord => ord,
        },
        1 => Ordering::Equal,
        _ => H::significand(a).cmp(H::significand(b)),
    }
}

/// Extracts the exact integer value of a finite number, if it has one and it
/// is small enough to materialize.
fn integral_value<H: RadixHelper>(n: &H::Value) -> Option<BigInt> {
    if H::flags(n) & SPECIAL != 0 {
        return None;
    }
    let sig = H::significand(n);
    if sig.is_zero() {
        return Some(BigInt::zero());
    }
    let neg = H::flags(n) & NEG != 0;
    let exp = H::exponent(n);
    let mag = match exp.sign() {
        Sign::NoSign => sig.clone(),
        Sign::Minus => {
            let k = (-exp).to_u64()?;
            if k >= H::digits(sig) {
                return None;
            }
            let (q, r) = sig.div_rem(&H::pow(k));
            if !r.is_zero() {
                return None;
            }
            q
        }
        Sign::Plus => {
            let k = exp.to_u64()?;
            if k > 40 || H::digits(sig) + k > 40 {
                return None;
            }
            sig * H::pow(k)
        }
    };
    Some(BigInt::from_biguint(
        if neg { Sign::Minus } else { Sign::Plus },
        mag,
    ))
}

/// Whether a finite value is an integer, and if so whether it is odd.
///
/// Unlike [`integral_value`] this never materializes the integer, so it
/// works for arbitrarily large magnitudes.
fn integral_odd<H: RadixHelper>(n: &H::Value) -> Option<bool> {
    if H::flags(n) & SPECIAL != 0 {
        return None;
    }
    let sig = H::significand(n);
    if sig.is_zero() {
        return Some(false);
    }
    let exp = H::exponent(n);
    match exp.sign() {
        Sign::NoSign => Some(sig.is_odd()),
        // A positive exponent scales by the even radix.
        Sign::Plus => Some(false),
        Sign::Minus => {
            let k = (-exp).to_u64()?;
            if k >= H::digits(sig) {
                return None;
            }
            let (q, r) = sig.div_rem(&H::pow(k));
            if r.is_zero() {
                Some(q.is_odd())
            } else {
                None
            }
        }
    }
}

/// If `|n|` is exactly `RADIX^m`, returns `m`.
fn power_of_radix<H: RadixHelper>(n: &H::Value) -> Option<BigInt> {
    if H::flags(n) & SPECIAL != 0 {
        return None;
    }
    let sig = H::significand(n);
    if sig.is_zero() {
        return None;
    }
    let (stripped, zeros) = strip_trailing_zeros::<H>(sig);
    if !stripped.is_one() {
        return None;
    }
    Some(H::exponent(n) + BigInt::from(zeros as i64))
}

/// Removes trailing zero digits, returning the stripped value and the count.
pub(crate) fn strip_trailing_zeros<H: RadixHelper>(n: &BigUint) -> (BigUint, u64) {
    let mut n = n.clone();
    let mut count = 0;
    if n.is_zero() {
        return (n, 0);
    }
    let chunk = H::pow(8);
    loop {
        let (q, r) = n.div_rem(&chunk);
        if !r.is_zero() {
            break;
        }
        n = q;
        count += 8;
    }
    let radix = BigUint::from(H::RADIX);
    loop {
        let (q, r) = n.div_rem(&radix);
        if !r.is_zero() {
            break;
        }
        n = q;
        count += 1;
    }
    (n, count)
}

/// artanh(u / scale) at the same fixed scale, by its power series.
fn artanh(u: &BigInt, scale: &BigInt) -> BigInt {
    let uu = u * u / scale;
    let mut sum = u.clone();
    let mut term = u.clone();
    let mut i = 3u64;
    loop {
        term = &term * &uu / scale;
        if term.is_zero() {
            break;
        }
        sum += &term / i;
        i += 2;
    }
    sum
}

/// A significand being shortened, with the discarded digits summarized for a
/// rounding decision.
///
/// `last` is the most significant discarded digit and `older` reports whether
/// any digit below it was nonzero. `discarded` reports whether any digits at
/// all have been dropped, zeros included.
pub(crate) struct Accumulator<H> {
    sig: BigUint,
    last: u8,
    older: bool,
    discarded: bool,
    _helper: PhantomData<H>,
}

impl<H: RadixHelper> Accumulator<H> {
    pub(crate) fn new(sig: BigUint) -> Accumulator<H> {
        Accumulator {
            sig,
            last: 0,
            older: false,
            discarded: false,
            _helper: PhantomData,
        }
    }

    /// Seeds the accumulator with digits discarded before it was built, as
    /// during parsing or division.
    pub(crate) fn with_discard(sig: BigUint, last: u8, older: bool) -> Accumulator<H> {
        Accumulator {
            sig,
            last,
            older,
            discarded: true,
            _helper: PhantomData,
        }
    }

    fn inexact(&self) -> bool {
        self.last != 0 || self.older
    }

    /// Discards the low `count` digits into the rounding summary.
    fn shift_right(&mut self, count: u64) {
        if count == 0 || self.sig.is_zero() {
            return;
        }
        self.discarded = true;
        let digits = H::digits(&self.sig);
        if count > digits {
            self.older = true;
            self.last = 0;
            self.sig = BigUint::zero();
            return;
        }
        let (q, r) = self.sig.div_rem(&H::pow(count));
        let (top, rest) = r.div_rem(&H::pow(count - 1));
        self.older = self.older || self.last != 0 || !rest.is_zero();
        self.last = top.to_u8().unwrap_or(0);
        self.sig = q;
    }

    /// Decides whether the kept digits must be incremented. `None` means
    /// rounding is forbidden and a nonzero discard occurred.
    fn plan(&self, rounding: Rounding, negative: bool) -> Option<bool> {
        if !self.inexact() {
            return Some(false);
        }
        let half = (H::RADIX / 2) as u8;
        let low = || (&self.sig % H::RADIX).to_u8().unwrap_or(0);
        Some(match rounding {
            Rounding::Down => false,
            Rounding::Up => true,
            Rounding::Ceiling => !negative,
            Rounding::Floor => negative,
            Rounding::HalfUp => self.last >= half,
            Rounding::HalfDown => self.last > half || (self.last == half && self.older),
            Rounding::HalfEven => {
                self.last > half || (self.last == half && (self.older || low() % 2 == 1))
            }
            Rounding::ZeroFiveUp => matches!(low(), 0 | 5),
            Rounding::Odd => low() % 2 == 0,
            Rounding::OddOrZeroFiveUp => {
                if H::RADIX == 2 {
                    low() % 2 == 0
                } else {
                    matches!(low(), 0 | 5)
                }
            }
            Rounding::None => return None,
        })
    }

    /// Applies a planned increment and retires the discard summary.
    fn apply(&mut self, up: bool) {
        if up {
            self.sig += 1u32;
        }
        self.last = 0;
        self.older = false;
    }
}

/// The arithmetic engine.
///
/// Operations take operands by reference and return fresh values; conditions
/// go into the scratch status, never directly into the context.
pub(crate) struct RadixMath<H>(pub(crate) PhantomData<H>);

pub(crate) const MATH: RadixMath<DecimalHelper> = RadixMath(PhantomData);

impl<H: RadixHelper> RadixMath<H> {
    fn nan(&self) -> H::Value {
        H::build(QNAN, BigUint::zero(), BigInt::zero())
    }

    fn invalid(&self, st: &mut Status) -> H::Value {
        st.raise(Status::INVALID_OPERATION);
        self.nan()
    }

    fn infinity(&self, negative: bool) -> H::Value {
        H::build(
            INF | if negative { NEG } else { 0 },
            BigUint::zero(),
            BigInt::zero(),
        )
    }

    fn zero_at(&self, negative: bool, exponent: BigInt) -> H::Value {
        H::build(
            if negative { NEG } else { 0 },
            BigUint::zero(),
            exponent,
        )
    }

    fn one(&self) -> H::Value {
        H::build(0, BigUint::one(), BigInt::zero())
    }

    /// Quiets a signaling NaN, keeping its payload and sign.
    fn quiet(&self, n: &H::Value) -> H::Value {
        H::build(
            (H::flags(n) & NEG) | QNAN,
            H::significand(n).clone(),
            BigInt::zero(),
        )
    }

    pub(crate) fn propagate_nan(&self, n: &H::Value, st: &mut Status) -> H::Value {
        if H::flags(n) & SNAN != 0 {
            st.raise(Status::INVALID_OPERATION);
            self.quiet(n)
        } else {
            n.clone()
        }
    }

    pub(crate) fn propagate_nan2(&self, a: &H::Value, b: &H::Value, st: &mut Status) -> H::Value {
        if H::flags(a) & SNAN != 0 {
            st.raise(Status::INVALID_OPERATION);
            self.quiet(a)
        } else if H::flags(b) & SNAN != 0 {
            st.raise(Status::INVALID_OPERATION);
            self.quiet(b)
        } else if H::flags(a) & QNAN != 0 {
            a.clone()
        } else {
            b.clone()
        }
    }

    pub(crate) fn propagate_nan3(
        &self,
        a: &H::Value,
        b: &H::Value,
        c: &H::Value,
        st: &mut Status,
    ) -> H::Value {
        for n in &[a, b, c] {
            if H::flags(n) & SNAN != 0 {
                st.raise(Status::INVALID_OPERATION);
                return self.quiet(n);
            }
        }
        if H::flags(a) & QNAN != 0 {
            a.clone()
        } else if H::flags(b) & QNAN != 0 {
            b.clone()
        } else {
            c.clone()
        }
    }

    /// Measures a coefficient against the precision, in digits or bits.
    pub(crate) fn width(&self, sig: &BigUint, ctx: &Context) -> u64 {
        if ctx.precision_in_bits {
            sig.bits()
        } else {
            H::digits(sig)
        }
    }

    /// How many digits to discard so `sig` fits the precision, never
    /// overshooting. With precision in bits the estimate can fall short, so
    /// callers loop.
    fn precision_drop(&self, sig: &BigUint, ctx: &Context) -> u64 {
        let p = ctx.precision as u64;
        if p == 0 {
            return 0;
        }
        if !ctx.precision_in_bits {
            return H::digits(sig).saturating_sub(p);
        }
        let bits = sig.bits();
        if bits <= p {
            return 0;
        }
        if H::RADIX == 2 {
            return bits - p;
        }
        ((bits - p - 1) / 4).max(1)
    }

    /// Folds a zero's exponent into the representable window.
    fn finish_zero(
        &self,
        negative: bool,
        mut exponent: BigInt,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        if let Some(etiny) = ctx.etiny() {
            let etiny = BigInt::from(etiny);
            if exponent < etiny {
                exponent = etiny;
                st.raise(Status::CLAMPED);
            }
        }
        let top = if ctx.clamp && ctx.precision > 0 {
            ctx.etop()
        } else {
            ctx.emax.map(|e| e as i64)
        };
        if let Some(top) = top {
            let top = BigInt::from(top);
            if exponent > top {
                exponent = top;
                st.raise(Status::CLAMPED);
            }
        }
        self.zero_at(negative, exponent)
    }

    /// The largest representable coefficient at the topmost exponent.
    fn largest_finite(&self, negative: bool, ctx: &Context) -> H::Value {
        let p = ctx.precision as u64;
        let sig = if ctx.precision_in_bits {
            (BigUint::one() << p) - 1u32
        } else {
            H::pow(p) - 1u32
        };
        let exp = ctx.etop().map(BigInt::from).unwrap_or_default();
        H::build(if negative { NEG } else { 0 }, sig, exp)
    }

    /// The result of an overflow, which depends on the rounding direction.
    fn overflow_result(&self, negative: bool, ctx: &Context, st: &mut Status) -> H::Value {
        let to_inf = match ctx.rounding {
            Rounding::HalfUp | Rounding::HalfDown | Rounding::HalfEven | Rounding::Up => true,
            Rounding::Down | Rounding::ZeroFiveUp | Rounding::Odd | Rounding::OddOrZeroFiveUp => {
                false
            }
            Rounding::Ceiling => !negative,
            Rounding::Floor => negative,
            Rounding::None => return self.invalid(st),
        };
        st.raise(Status::OVERFLOW | Status::INEXACT | Status::ROUNDED);
        if to_inf || ctx.precision == 0 {
            self.infinity(negative)
        } else {
            self.largest_finite(negative, ctx)
        }
    }

    /// Rounds a finished computation into the context: precision, exponent
    /// range, and clamping, in a single rounding step.
    pub(crate) fn finish(
        &self,
        negative: bool,
        mut acc: Accumulator<H>,
        mut exponent: BigInt,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        if acc.sig.is_zero() && !acc.inexact() {
            return self.finish_zero(negative, exponent, ctx, st);
        }

        // Tininess is judged before rounding.
        let emin = ctx.emin.map(|e| BigInt::from(e as i64));
        let tiny = match &emin {
            Some(emin) => {
                if ctx.adjust_exponent {
                    let digits = H::digits(&acc.sig) as i64;
                    (&exponent + BigInt::from(digits - 1)) < *emin
                } else {
                    exponent < *emin
                }
            }
            None => false,
        };
        // Subnormal results round at the bottom of the exponent range rather
        // than at their own length.
        let floor = if ctx.adjust_exponent {
            ctx.etiny().map(BigInt::from)
        } else {
            emin
        };

        loop {
            let mut shift = self.precision_drop(&acc.sig, ctx);
            if let Some(floor) = &floor {
                if *floor > exponent {
                    match (floor - &exponent).to_u64() {
                        Some(gap) => shift = shift.max(gap),
                        None => {
                            // The value sits far below the representable
                            // window.
                            acc.shift_right(u64::MAX);
                            exponent = floor.clone();
                            break;
                        }
                    }
                }
            }
            if shift == 0 {
                break;
            }
            acc.shift_right(shift);
            exponent += BigInt::from(shift);
        }

        let inexact = acc.inexact();
        let up = match acc.plan(ctx.rounding, negative) {
            Some(up) => up,
            None => return self.invalid(st),
        };
        if acc.discarded {
            st.raise(Status::ROUNDED);
        }
        if inexact {
            st.raise(Status::INEXACT);
        }
        if tiny {
            st.raise(Status::SUBNORMAL);
            if inexact {
                st.raise(Status::UNDERFLOW);
            }
        }
        acc.apply(up);

        if acc.sig.is_zero() {
            // The entire coefficient rounded away.
            st.raise(Status::CLAMPED);
            return self.zero_at(negative, exponent);
        }

        while ctx.precision > 0 && self.width(&acc.sig, ctx) > ctx.precision as u64 {
            // The increment carried out to a longer coefficient.
            acc.shift_right(1);
            exponent += 1;
        }

        if let Some(emax) = ctx.emax {
            let emax = BigInt::from(emax as i64);
            let over = if ctx.adjust_exponent {
                let digits = H::digits(&acc.sig) as i64;
                (&exponent + BigInt::from(digits - 1)) > emax
            } else {
                exponent > emax
            };
            if over {
                return self.overflow_result(negative, ctx, st);
            }
        }

        if ctx.clamp && ctx.precision > 0 {
            if let Some(etop) = ctx.etop() {
                let etop = BigInt::from(etop);
                if exponent > etop {
                    let pad = (&exponent - &etop).to_u64().unwrap_or(0);
                    acc.sig *= H::pow(pad);
                    exponent = etop;
                    st.raise(Status::CLAMPED);
                }
            }
        }

        H::build(if negative { NEG } else { 0 }, acc.sig, exponent)
    }

    pub(crate) fn abs(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & ANY_NAN != 0 {
            return self.propagate_nan(n, st);
        }
        self.plus_core(f & !NEG, n, ctx, st)
    }

    pub(crate) fn plus(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & ANY_NAN != 0 {
            return self.propagate_nan(n, st);
        }
        self.plus_core(f, n, ctx, st)
    }

    pub(crate) fn minus(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & ANY_NAN != 0 {
            return self.propagate_nan(n, st);
        }
        self.plus_core(f ^ NEG, n, ctx, st)
    }

    fn plus_core(&self, f: u8, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        if f & INF != 0 {
            return self.infinity(f & NEG != 0);
        }
        let sig = H::significand(n);
        if sig.is_zero() {
            // Adding zero to a zero keeps the sign only under floor
            // rounding.
            let negative = f & NEG != 0 && ctx.rounding == Rounding::Floor;
            return self.finish_zero(negative, H::exponent(n).clone(), ctx, st);
        }
        self.finish(
            f & NEG != 0,
            Accumulator::new(sig.clone()),
            H::exponent(n).clone(),
            ctx,
            st,
        )
    }

    /// Rounds an operand into the context with its sign untouched.
    fn round_kept(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & INF != 0 {
            return self.infinity(f & NEG != 0);
        }
        let sig = H::significand(n);
        if sig.is_zero() {
            return self.finish_zero(f & NEG != 0, H::exponent(n).clone(), ctx, st);
        }
        self.finish(
            f & NEG != 0,
            Accumulator::new(sig.clone()),
            H::exponent(n).clone(),
            ctx,
            st,
        )
    }

    pub(crate) fn add(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.add_core(lhs, rhs, false, ctx, st)
    }

    pub(crate) fn sub(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.add_core(lhs, rhs, true, ctx, st)
    }

    fn add_core(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        negate_rhs: bool,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        let fl = H::flags(lhs);
        let mut fr = H::flags(rhs);
        if (fl | fr) & ANY_NAN != 0 {
            // NaNs propagate with their original signs, before any
            // negation.
            return self.propagate_nan2(lhs, rhs, st);
        }
        if negate_rhs {
            fr ^= NEG;
        }
        match (fl & INF != 0, fr & INF != 0) {
            (true, true) => {
                if (fl ^ fr) & NEG != 0 {
                    return self.invalid(st);
                }
                return self.infinity(fl & NEG != 0);
            }
            (true, false) => return self.infinity(fl & NEG != 0),
            (false, true) => return self.infinity(fr & NEG != 0),
            (false, false) => {}
        }
        let (ls, rs) = (H::significand(lhs), H::significand(rhs));
        let (le, re) = (H::exponent(lhs), H::exponent(rhs));
        let (ln, rn) = (fl & NEG != 0, fr & NEG != 0);
        if ls.is_zero() && rs.is_zero() {
            let negative = if ln == rn {
                ln
            } else {
                ctx.rounding == Rounding::Floor
            };
            return self.finish_zero(negative, le.min(re).clone(), ctx, st);
        }
        if ls.is_zero() || rs.is_zero() {
            // x + 0: the exponent is drawn toward the zero's where precision
            // allows, without flags.
            let (sig, exp, neg, ze) = if ls.is_zero() {
                (rs, re, rn, le)
            } else {
                (ls, le, ln, re)
            };
            let mut sig = sig.clone();
            let mut exp = exp.clone();
            if *ze < exp {
                let gap = (&exp - ze).to_u64().unwrap_or(u64::MAX);
                let p = ctx.precision as u64;
                let pad = if p == 0 {
                    if gap > MAX_SHIFT {
                        return self.invalid(st);
                    }
                    gap
                } else {
                    gap.min(p.saturating_sub(H::digits(&sig)))
                };
                if pad > 0 {
                    sig *= H::pow(pad);
                    exp -= BigInt::from(pad);
                }
            }
            return self.finish(neg, Accumulator::new(sig), exp, ctx, st);
        }

        // Order the operands by exponent; the higher one is padded down for
        // alignment.
        let (hs, he, hn, mut low_s, mut low_e, low_n) = if le >= re {
            (ls, le, ln, rs.clone(), re.clone(), rn)
        } else {
            (rs, re, rn, ls.clone(), le.clone(), ln)
        };
        let p = ctx.precision as u64;
        if p > 0 {
            // When the operands cannot interact digit for digit, a one-unit
            // token below the kept window stands in for the smaller one.
            let adj_h = he + BigInt::from(H::digits(hs) as i64 - 1);
            let adj_l = &low_e + BigInt::from(H::digits(&low_s) as i64 - 1);
            if adj_l < &adj_h - BigInt::from(p + 2) {
                low_e = adj_h - BigInt::from(p + 3);
                low_s = BigUint::one();
            }
        } else {
            let gap = (he - &low_e).to_u64().unwrap_or(u64::MAX);
            if gap > MAX_SHIFT {
                return self.invalid(st);
            }
        }
        let target = if &low_e <= he { low_e.clone() } else { he.clone() };
        let gh = (he - &target).to_u64().unwrap_or(0);
        let gl = (&low_e - &target).to_u64().unwrap_or(0);
        let a = hs * H::pow(gh);
        let b = &low_s * H::pow(gl);
        if hn == low_n {
            return self.finish(hn, Accumulator::new(a + b), target, ctx, st);
        }
        match a.cmp(&b) {
            Ordering::Equal => {
                // Exact cancellation.
                let negative = ctx.rounding == Rounding::Floor;
                self.finish_zero(negative, target, ctx, st)
            }
            Ordering::Greater => self.finish(hn, Accumulator::new(a - b), target, ctx, st),
            Ordering::Less => self.finish(low_n, Accumulator::new(b - a), target, ctx, st),
        }
    }

    pub(crate) fn mul(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let (fl, fr) = (H::flags(lhs), H::flags(rhs));
        if (fl | fr) & ANY_NAN != 0 {
            return self.propagate_nan2(lhs, rhs, st);
        }
        let negative = (fl ^ fr) & NEG != 0;
        if (fl | fr) & INF != 0 {
            if (fl & INF == 0 && H::significand(lhs).is_zero())
                || (fr & INF == 0 && H::significand(rhs).is_zero())
            {
                return self.invalid(st);
            }
            return self.infinity(negative);
        }
        let sig = H::significand(lhs) * H::significand(rhs);
        let exp = H::exponent(lhs) + H::exponent(rhs);
        if sig.is_zero() {
            return self.finish_zero(negative, exp, ctx, st);
        }
        self.finish(negative, Accumulator::new(sig), exp, ctx, st)
    }

    pub(crate) fn div(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let (fl, fr) = (H::flags(lhs), H::flags(rhs));
        if (fl | fr) & ANY_NAN != 0 {
            return self.propagate_nan2(lhs, rhs, st);
        }
        let negative = (fl ^ fr) & NEG != 0;
        match (fl & INF != 0, fr & INF != 0) {
            (true, true) => return self.invalid(st),
            (true, false) => return self.infinity(negative),
            (false, true) => {
                // A finite dividend vanishes: an exact zero as far down the
                // exponent range as there is one.
                let exp = ctx.etiny().map(BigInt::from).unwrap_or_default();
                return self.zero_at(negative, exp);
            }
            (false, false) => {}
        }
        let (ls, rs) = (H::significand(lhs), H::significand(rhs));
        if rs.is_zero() {
            if ls.is_zero() {
                return self.invalid(st);
            }
            st.raise(Status::DIVISION_BY_ZERO);
            return self.infinity(negative);
        }
        let ideal = H::exponent(lhs) - H::exponent(rhs);
        if ls.is_zero() {
            return self.finish_zero(negative, ideal, ctx, st);
        }
        let p = ctx.precision as u64;
        if p == 0 {
            return self.div_exact(negative, ls, rs, ideal, ctx, st);
        }
        let (d1, d2) = (H::digits(ls), H::digits(rs));
        let shift = (d2 as i64) - (d1 as i64) + (p as i64) + 1;
        let (scaled, exp) = if shift > 0 {
            (ls * H::pow(shift as u64), &ideal - BigInt::from(shift))
        } else {
            (ls.clone(), ideal.clone())
        };
        let (q, r) = scaled.div_rem(rs);
        if r.is_zero() {
            let mut q = q;
            let mut exp = exp;
            self.trim_toward(&mut q, &mut exp, &ideal);
            return self.finish(negative, Accumulator::new(q), exp, ctx, st);
        }
        self.finish(negative, Accumulator::with_discard(q, 0, true), exp, ctx, st)
    }

    /// Unlimited-precision division: the quotient must terminate.
    fn div_exact(
        &self,
        negative: bool,
        ls: &BigUint,
        rs: &BigUint,
        ideal: BigInt,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        let g = ls.gcd(rs);
        let a = ls / &g;
        let b = rs / &g;
        // The quotient terminates only if the reduced divisor divides a
        // power of the radix; count the smallest such power.
        let radix = BigUint::from(H::RADIX);
        let mut rest = b.clone();
        let mut k = 0u64;
        while !rest.is_one() {
            let d = rest.gcd(&radix);
            if d.is_one() {
                return self.invalid(st);
            }
            rest /= &d;
            k += 1;
        }
        let mut q = a * H::pow(k) / &b;
        let mut exp = &ideal - BigInt::from(k as i64);
        self.trim_toward(&mut q, &mut exp, &ideal);
        self.finish(negative, Accumulator::new(q), exp, ctx, st)
    }

    /// Removes trailing zero digits, raising the exponent toward `ideal`.
    fn trim_toward(&self, sig: &mut BigUint, exponent: &mut BigInt, ideal: &BigInt) {
        let radix = BigUint::from(H::RADIX);
        while *exponent < *ideal && !sig.is_zero() {
            let (q, r) = sig.div_rem(&radix);
            if !r.is_zero() {
                break;
            }
            *sig = q;
            *exponent += 1;
        }
    }

    /// The integer quotient and remainder of two finite nonzero operands,
    /// aligned to their lesser exponent. `None` means the quotient cannot fit
    /// the precision, with invalid operation raised.
    fn integer_divide(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> Option<(BigUint, BigUint, BigUint, BigInt)> {
        let (ls, rs) = (H::significand(lhs), H::significand(rhs));
        let (le, re) = (H::exponent(lhs), H::exponent(rhs));
        let p = ctx.precision as u64;
        if p > 0 {
            // The quotient needs about the adjusted difference in digits.
            let diff = adjusted::<H>(lhs) - adjusted::<H>(rhs);
            if diff > BigInt::from(p) {
                st.raise(Status::INVALID_OPERATION);
                return None;
            }
        }
        let target = le.min(re);
        let gl = (le - target).to_u64().unwrap_or(u64::MAX);
        let gr = (re - target).to_u64().unwrap_or(u64::MAX);
        if gl.max(gr) > MAX_SHIFT {
            st.raise(Status::INVALID_OPERATION);
            return None;
        }
        let a = ls * H::pow(gl);
        let b = rs * H::pow(gr);
        let (q, r) = a.div_rem(&b);
        if p > 0 && H::digits(&q) > p {
            st.raise(Status::INVALID_OPERATION);
            return None;
        }
        Some((q, r, b, target.clone()))
    }

    pub(crate) fn div_integer(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        let (fl, fr) = (H::flags(lhs), H::flags(rhs));
        if (fl | fr) & ANY_NAN != 0 {
            return self.propagate_nan2(lhs, rhs, st);
        }
        let negative = (fl ^ fr) & NEG != 0;
        match (fl & INF != 0, fr & INF != 0) {
            (true, true) => return self.invalid(st),
            (true, false) => return self.infinity(negative),
            (false, true) => return self.zero_at(negative, BigInt::zero()),
            (false, false) => {}
        }
        let (ls, rs) = (H::significand(lhs), H::significand(rhs));
        if rs.is_zero() {
            if ls.is_zero() {
                return self.invalid(st);
            }
            st.raise(Status::DIVISION_BY_ZERO);
            return self.infinity(negative);
        }
        if ls.is_zero() {
            return self.zero_at(negative, BigInt::zero());
        }
        match self.integer_divide(lhs, rhs, ctx, st) {
            Some((q, _, _, _)) => H::build(if negative { NEG } else { 0 }, q, BigInt::zero()),
            None => self.nan(),
        }
    }

    pub(crate) fn rem(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.rem_core(lhs, rhs, false, ctx, st)
    }

    pub(crate) fn rem_near(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        self.rem_core(lhs, rhs, true, ctx, st)
    }

    fn rem_core(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        near: bool,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        let (fl, fr) = (H::flags(lhs), H::flags(rhs));
        if (fl | fr) & ANY_NAN != 0 {
            return self.propagate_nan2(lhs, rhs, st);
        }
        if fl & INF != 0 {
            return self.invalid(st);
        }
        let negative = fl & NEG != 0;
        if fr & INF != 0 {
            // The divisor dwarfs the dividend, which is left as is.
            return self.round_kept(lhs, ctx, st);
        }
        let (ls, rs) = (H::significand(lhs), H::significand(rhs));
        if rs.is_zero() {
            return self.invalid(st);
        }
        if ls.is_zero() {
            let exp = H::exponent(lhs).min(H::exponent(rhs)).clone();
            return self.finish_zero(negative, exp, ctx, st);
        }
        let (q, r, b, exp) = match self.integer_divide(lhs, rhs, ctx, st) {
            Some(parts) => parts,
            None => return self.nan(),
        };
        if near {
            // Fold to the nearest multiple, ties to even quotient.
            let twice = &r * 2u32;
            let flip = match twice.cmp(&b) {
                Ordering::Greater => true,
                Ordering::Equal => q.is_odd(),
                Ordering::Less => false,
            };
            if flip {
                return self.finish(!negative, Accumulator::new(b - r), exp, ctx, st);
            }
        }
        if r.is_zero() {
            return self.finish_zero(negative, exp, ctx, st);
        }
        self.finish(negative, Accumulator::new(r), exp, ctx, st)
    }

    pub(crate) fn fma(
        &self,
        x: &H::Value,
        y: &H::Value,
        z: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        let (fx, fy, fz) = (H::flags(x), H::flags(y), H::flags(z));
        if (fx | fy | fz) & ANY_NAN != 0 {
            return self.propagate_nan3(x, y, z, st);
        }
        let negative = (fx ^ fy) & NEG != 0;
        let product = if (fx | fy) & INF != 0 {
            if (fx & INF == 0 && H::significand(x).is_zero())
                || (fy & INF == 0 && H::significand(y).is_zero())
            {
                return self.invalid(st);
            }
            self.infinity(negative)
        } else {
            // The product is exact; only the final addition rounds.
            H::build(
                if negative { NEG } else { 0 },
                H::significand(x) * H::significand(y),
                H::exponent(x) + H::exponent(y),
            )
        };
        self.add_core(&product, z, false, ctx, st)
    }

    pub(crate) fn sqrt(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & ANY_NAN != 0 {
            return self.propagate_nan(n, st);
        }
        let negative = f & NEG != 0;
        if f & INF != 0 {
            if negative {
                return self.invalid(st);
            }
            return self.infinity(false);
        }
        let sig = H::significand(n);
        let exp = H::exponent(n);
        if sig.is_zero() {
            // The root of a zero keeps its sign, with the exponent halved.
            return self.finish_zero(negative, exp.div_floor(&BigInt::from(2)), ctx, st);
        }
        if negative {
            return self.invalid(st);
        }
        let ideal = exp.div_floor(&BigInt::from(2));
        let p = ctx.precision as u64;
        // Scale to an even exponent with enough digits that the integer root
        // carries a guard digit past the precision.
        let d = H::digits(sig);
        let want = if p == 0 { d } else { (2 * p + 2).max(d) };
        let mut k = want - d;
        if !(exp - BigInt::from(k)).is_even() {
            k += 1;
        }
        let scaled = sig * H::pow(k);
        let root = scaled.sqrt();
        let remainder = &scaled - &root * &root;
        let mut exp_r = (exp - BigInt::from(k)) / 2;
        if remainder.is_zero() {
            let mut root = root;
            self.trim_toward(&mut root, &mut exp_r, &ideal);
            return self.finish(false, Accumulator::new(root), exp_r, ctx, st);
        }
        if p == 0 {
            return self.invalid(st);
        }
        self.finish(
            false,
            Accumulator::with_discard(root, 0, true),
            exp_r,
            ctx,
            st,
        )
    }

    pub(crate) fn quantize(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        let (fl, fr) = (H::flags(lhs), H::flags(rhs));
        if (fl | fr) & ANY_NAN != 0 {
            return self.propagate_nan2(lhs, rhs, st);
        }
        match (fl & INF != 0, fr & INF != 0) {
            (true, true) => return self.infinity(fl & NEG != 0),
            (true, false) | (false, true) => return self.invalid(st),
            (false, false) => {}
        }
        self.quantize_core(lhs, H::exponent(rhs).clone(), ctx, st)
    }

    pub(crate) fn rescale(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        let (fl, fr) = (H::flags(lhs), H::flags(rhs));
        if (fl | fr) & ANY_NAN != 0 {
            return self.propagate_nan2(lhs, rhs, st);
        }
        if fr & INF != 0 || fl & INF != 0 {
            return self.invalid(st);
        }
        let target = match integral_value::<H>(rhs) {
            Some(target) => target,
            None => return self.invalid(st),
        };
        self.quantize_core(lhs, target, ctx, st)
    }

    fn quantize_core(
        &self,
        lhs: &H::Value,
        target: BigInt,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        if let Some(etiny) = ctx.etiny() {
            if target < BigInt::from(etiny) {
                return self.invalid(st);
            }
        }
        if let Some(emax) = ctx.emax {
            if target > BigInt::from(emax as i64) {
                return self.invalid(st);
            }
        }
        let negative = H::flags(lhs) & NEG != 0;
        let sig = H::significand(lhs);
        if sig.is_zero() {
            return self.zero_at(negative, target);
        }
        let p = ctx.precision as u64;
        let diff = H::exponent(lhs) - &target;
        let new_sig = match diff.sign() {
            Sign::NoSign => sig.clone(),
            Sign::Plus => {
                let k = match diff.to_u64() {
                    Some(k) if k <= MAX_SHIFT => k,
                    _ => return self.invalid(st),
                };
                if p > 0 && H::digits(sig) + k > p {
                    return self.invalid(st);
                }
                sig * H::pow(k)
            }
            Sign::Minus => {
                let k = (-diff).to_u64().unwrap_or(u64::MAX);
                let mut acc = Accumulator::<H>::new(sig.clone());
                acc.shift_right(k);
                let inexact = acc.inexact();
                let up = match acc.plan(ctx.rounding, negative) {
                    Some(up) => up,
                    None => return self.invalid(st),
                };
                acc.apply(up);
                if p > 0 && H::digits(&acc.sig) > p {
                    return self.invalid(st);
                }
                st.raise(Status::ROUNDED);
                if inexact {
                    st.raise(Status::INEXACT);
                }
                acc.sig
            }
        };
        if let Some(emax) = ctx.emax {
            if !new_sig.is_zero() {
                let adj = &target + BigInt::from(H::digits(&new_sig) as i64 - 1);
                if adj > BigInt::from(emax as i64) {
                    return self.invalid(st);
                }
            }
        }
        if p > 0 && H::digits(&new_sig) > p {
            return self.invalid(st);
        }
        H::build(if negative { NEG } else { 0 }, new_sig, target)
    }

    pub(crate) fn reduce(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & ANY_NAN != 0 {
            return self.propagate_nan(n, st);
        }
        if f & INF != 0 {
            return self.infinity(f & NEG != 0);
        }
        let negative = f & NEG != 0;
        if H::significand(n).is_zero() {
            // A zero reduces to exponent 0, sign intact.
            return self.finish_zero(negative, BigInt::zero(), ctx, st);
        }
        let rounded = self.finish(
            negative,
            Accumulator::new(H::significand(n).clone()),
            H::exponent(n).clone(),
            ctx,
            st,
        );
        if H::flags(&rounded) & SPECIAL != 0 {
            return rounded;
        }
        if H::significand(&rounded).is_zero() {
            return rounded;
        }
        let (mut sig, zeros) = strip_trailing_zeros::<H>(H::significand(&rounded));
        let mut exp = H::exponent(&rounded) + BigInt::from(zeros as i64);
        if ctx.clamp {
            if let Some(etop) = ctx.etop() {
                let etop = BigInt::from(etop);
                if exp > etop {
                    let pad = (&exp - &etop).to_u64().unwrap_or(0);
                    sig *= H::pow(pad);
                    exp = etop;
                    st.raise(Status::CLAMPED);
                }
            }
        }
        H::build(H::flags(&rounded), sig, exp)
    }

    pub(crate) fn round_integral(
        &self,
        n: &H::Value,
        exact: bool,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        let f = H::flags(n);
        if f & ANY_NAN != 0 {
            return self.propagate_nan(n, st);
        }
        if f & INF != 0 {
            return self.infinity(f & NEG != 0);
        }
        let exp = H::exponent(n);
        if exp.sign() != Sign::Minus {
            return n.clone();
        }
        let negative = f & NEG != 0;
        let k = (-exp).to_u64().unwrap_or(u64::MAX);
        let mut acc = Accumulator::<H>::new(H::significand(n).clone());
        acc.shift_right(k);
        let inexact = acc.inexact();
        let up = match acc.plan(ctx.rounding, negative) {
            Some(up) => up,
            None => return self.invalid(st),
        };
        acc.apply(up);
        if exact && acc.discarded {
            st.raise(Status::ROUNDED);
            if inexact {
                st.raise(Status::INEXACT);
            }
        }
        H::build(if negative { NEG } else { 0 }, acc.sig, BigInt::zero())
    }

    pub(crate) fn min(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.pick(lhs, rhs, false, false, ctx, st)
    }

    pub(crate) fn max(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.pick(lhs, rhs, true, false, ctx, st)
    }

    pub(crate) fn min_abs(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        self.pick(lhs, rhs, false, true, ctx, st)
    }

    pub(crate) fn max_abs(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        self.pick(lhs, rhs, true, true, ctx, st)
    }

    fn pick(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        want_greater: bool,
        magnitude: bool,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        let (fl, fr) = (H::flags(lhs), H::flags(rhs));
        if (fl | fr) & ANY_NAN != 0 {
            // One quiet NaN loses to a number; anything else propagates.
            if (fl | fr) & SNAN != 0 || (fl & ANY_NAN != 0 && fr & ANY_NAN != 0) {
                return self.propagate_nan2(lhs, rhs, st);
            }
            let keep = if fl & ANY_NAN != 0 { rhs } else { lhs };
            return self.round_kept(keep, ctx, st);
        }
        let ord = if magnitude {
            match (fl & INF != 0, fr & INF != 0) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => magnitude_cmp::<H>(lhs, rhs),
            }
        } else {
            value_cmp::<H>(lhs, rhs).unwrap_or(Ordering::Equal)
        };
        let ord = match ord {
            Ordering::Equal => {
                // Tied values fall back to the total order, signed
                // comparison first for the magnitude forms.
                let signed = if magnitude {
                    value_cmp::<H>(lhs, rhs).unwrap_or(Ordering::Equal)
                } else {
                    Ordering::Equal
                };
                match signed {
                    Ordering::Equal => total_order::<H>(lhs, rhs),
                    ord => ord,
                }
            }
            ord => ord,
        };
        let keep = match ord {
            Ordering::Equal => lhs,
            Ordering::Greater => {
                if want_greater {
                    lhs
                } else {
                    rhs
                }
            }
            Ordering::Less => {
                if want_greater {
                    rhs
                } else {
                    lhs
                }
            }
        };
        self.round_kept(keep, ctx, st)
    }

    pub(crate) fn next_plus(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & ANY_NAN != 0 {
            return self.propagate_nan(n, st);
        }
        self.step(n, false, ctx, st, 0)
    }

    pub(crate) fn next_minus(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & ANY_NAN != 0 {
            return self.propagate_nan(n, st);
        }
        self.step(n, true, ctx, st, 0)
    }

    pub(crate) fn next_toward(
        &self,
        x: &H::Value,
        y: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        let (fx, fy) = (H::flags(x), H::flags(y));
        if (fx | fy) & ANY_NAN != 0 {
            return self.propagate_nan2(x, y, st);
        }
        match value_cmp::<H>(x, y).unwrap_or(Ordering::Equal) {
            Ordering::Equal => {
                // Equal values: x with y's sign, rounded without conditions.
                let mut scratch = Status::default();
                let recast = H::build(
                    (fx & !NEG) | (fy & NEG),
                    H::significand(x).clone(),
                    H::exponent(x).clone(),
                );
                self.round_kept(&recast, ctx, &mut scratch)
            }
            Ordering::Less => self.step(x, false, ctx, st, !0),
            Ordering::Greater => self.step(x, true, ctx, st, !0),
        }
    }

    /// One step along the representable grid, by adding a token under the
    /// unit in the last place and rounding toward the step direction.
    ///
    /// Conditions other than those selected by `keep` are suppressed; inexact
    /// and rounded survive only alongside overflow or underflow.
    fn step(&self, n: &H::Value, down: bool, ctx: &Context, st: &mut Status, keep: u32) -> H::Value {
        let etiny = match (ctx.etiny(), ctx.emax, ctx.precision) {
            (Some(etiny), Some(_), p) if p > 0 => BigInt::from(etiny),
            _ => return self.invalid(st),
        };
        let f = H::flags(n);
        if f & INF != 0 {
            let negative = f & NEG != 0;
            return match (negative, down) {
                (false, false) => self.infinity(false),
                (true, true) => self.infinity(true),
                (false, true) => self.largest_finite(false, ctx),
                (true, false) => self.largest_finite(true, ctx),
            };
        }
        let sig = H::significand(n);
        let ulp_exp = if sig.is_zero() {
            etiny
        } else {
            let adj = H::exponent(n) + BigInt::from(H::digits(sig) as i64 - 1);
            let ulp: BigInt = adj - BigInt::from(ctx.precision as u64) + 1;
            ulp.max(etiny)
        };
        let eps = H::build(
            if down { NEG } else { 0 },
            BigUint::one(),
            ulp_exp - 2,
        );
        let mut cx = ctx.clone();
        cx.rounding = if down {
            Rounding::Floor
        } else {
            Rounding::Ceiling
        };
        let mut scratch = Status::default();
        let out = self.add_core(n, &eps, false, &cx, &mut scratch);
        let mut kept = scratch.inner & keep;
        if kept & (Status::OVERFLOW | Status::UNDERFLOW) == 0 {
            kept &= !(Status::INEXACT | Status::ROUNDED);
        }
        st.raise(kept);
        out
    }

    pub(crate) fn logb(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & ANY_NAN != 0 {
            return self.propagate_nan(n, st);
        }
        if f & INF != 0 {
            return self.infinity(false);
        }
        if H::significand(n).is_zero() {
            st.raise(Status::DIVISION_BY_ZERO);
            return self.infinity(true);
        }
        let (sign, mag) = adjusted::<H>(n).into_parts();
        if mag.is_zero() {
            return self.finish_zero(false, BigInt::zero(), ctx, st);
        }
        self.finish(
            sign == Sign::Minus,
            Accumulator::new(mag),
            BigInt::zero(),
            ctx,
            st,
        )
    }

    pub(crate) fn scaleb(&self, x: &H::Value, y: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let (fx, fy) = (H::flags(x), H::flags(y));
        if (fx | fy) & ANY_NAN != 0 {
            return self.propagate_nan2(x, y, st);
        }
        if fy & INF != 0 {
            return self.invalid(st);
        }
        let scale = match integral_value::<H>(y) {
            Some(scale) => scale,
            None => return self.invalid(st),
        };
        if let Some(emax) = ctx.emax {
            let bound: BigInt = (BigInt::from(emax as i64) + BigInt::from(ctx.precision as u64)) * 2;
            if scale.magnitude() > bound.magnitude() {
                return self.invalid(st);
            }
        }
        let negative = fx & NEG != 0;
        if fx & INF != 0 {
            return self.infinity(negative);
        }
        let exp = H::exponent(x) + scale;
        if H::significand(x).is_zero() {
            return self.finish_zero(negative, exp, ctx, st);
        }
        self.finish(
            negative,
            Accumulator::new(H::significand(x).clone()),
            exp,
            ctx,
            st,
        )
    }

    pub(crate) fn exp(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & ANY_NAN != 0 {
            return self.propagate_nan(n, st);
        }
        let negative = f & NEG != 0;
        if f & INF != 0 {
            return if negative {
                self.zero_at(false, BigInt::zero())
            } else {
                self.infinity(false)
            };
        }
        let sig = H::significand(n);
        if sig.is_zero() {
            return self.one();
        }
        let p = ctx.precision as u64;
        if p == 0 {
            // e^x is irrational for every nonzero finite x.
            return self.invalid(st);
        }
        let adj = adjusted::<H>(n);
        if adj > BigInt::from(18) {
            return self.exp_extreme(negative, false, ctx, st);
        }
        if adj < -BigInt::from(p + 5) {
            // e^x agrees with 1 + x past every kept digit.
            return self.add_core(&self.one(), n, false, ctx, st);
        }
        let e = match H::exponent(n).to_i64() {
            Some(e) => e,
            None => return self.invalid(st),
        };
        let mut wp = p + 36;
        loop {
            let mut t = BigInt::from(sig * H::pow(wp));
            if e >= 0 {
                t *= BigInt::from(H::pow(e as u64));
            } else {
                t /= BigInt::from(H::pow(e.unsigned_abs()));
            }
            if negative {
                t = -t;
            }
            let (m, c) = self.exp_fixed(&t, wp);
            if let Some(out) = self.round_approx(false, &m, &c, ctx, st) {
                return out;
            }
            wp += wp / 2 + 16;
        }
    }

    /// exp with an argument too extreme to evaluate: saturate into overflow
    /// or underflow by the argument's sign.
    fn exp_extreme(
        &self,
        arg_negative: bool,
        result_negative: bool,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        if ctx.emax.is_none() || ctx.emin.is_none() || ctx.precision == 0 {
            return self.invalid(st);
        }
        if arg_negative {
            let exp = ctx.etiny().map(BigInt::from).unwrap_or_default();
            let acc = Accumulator::<H>::with_discard(BigUint::zero(), 0, true);
            let up = match acc.plan(ctx.rounding, result_negative) {
                Some(up) => up,
                None => return self.invalid(st),
            };
            st.raise(
                Status::UNDERFLOW | Status::SUBNORMAL | Status::INEXACT | Status::ROUNDED,
            );
            if up {
                H::build(
                    if result_negative { NEG } else { 0 },
                    BigUint::one(),
                    exp,
                )
            } else {
                st.raise(Status::CLAMPED);
                self.zero_at(result_negative, exp)
            }
        } else {
            self.overflow_result(result_negative, ctx, st)
        }
    }

    /// e^(t / RADIX^wp) as an approximation `m × RADIX^c`, good to a few
    /// units in the last digit of `m`.
    fn exp_fixed(&self, t: &BigInt, wp: u64) -> (BigUint, BigInt) {
        let scale = H::pow(wp);
        let tneg = t.sign() == Sign::Minus;
        let tmag = t.magnitude();
        // Halve into [0, 1/4] so the series converges fast; squarings undo
        // the reduction.
        let halvings = if tmag.is_zero() {
            0
        } else {
            let per = if H::RADIX == 2 { 1 } else { 4 };
            H::digits(tmag).saturating_sub(wp) * per + 2
        };
        let tk = tmag >> halvings;
        let mut sum = &scale + &tk;
        let mut term = tk.clone();
        let mut i = 2u64;
        loop {
            term = &term * &tk / &scale / i;
            if term.is_zero() {
                break;
            }
            sum += &term;
            i += 1;
        }
        let mut m = sum;
        let mut c = -BigInt::from(wp as i64);
        for _ in 0..halvings {
            m = &m * &m;
            c *= 2;
            Self::cap_digits(&mut m, &mut c, wp);
        }
        if tneg {
            // e^{-|t|} = 1 / e^{|t|}.
            let k = H::digits(&m) + wp + 4;
            m = H::pow(k) / &m;
            c = -BigInt::from(k) - c;
        }
        (m, c)
    }

    /// Keeps a working value at `wp` digits plus guard, folding dropped
    /// digits into its exponent.
    fn cap_digits(m: &mut BigUint, c: &mut BigInt, wp: u64) {
        let d = H::digits(m);
        if d > wp + 4 {
            let drop = d - (wp + 4);
            *m /= H::pow(drop);
            *c += BigInt::from(drop);
        }
    }

    /// ln(sig × RADIX^exp) as a fixed-point value at scale RADIX^wp.
    fn ln_attempt(&self, sig: &BigUint, exp: &BigInt, wp: u64) -> BigInt {
        let scale = BigInt::from(H::pow(wp));
        let d = H::digits(sig);
        let adj = exp + BigInt::from(d as i64 - 1);
        // Normalize into [1, RADIX) at the working scale.
        let mut m = if wp >= d - 1 {
            BigInt::from(sig * H::pow(wp - (d - 1)))
        } else {
            BigInt::from(sig / H::pow(d - 1 - wp))
        };
        // Halve into [3/4, 3/2); each halving contributes ln 2.
        let bound = &scale + &scale / 2u32;
        let mut halvings = 0u64;
        while m >= bound {
            m = &m / 2u32;
            halvings += 1;
        }
        let u = (&m - &scale) * &scale / (&m + &scale);
        let mut total = artanh(&u, &scale) * 2;
        let ln2 = artanh(&(&scale / 3u32), &scale) * 2;
        if halvings > 0 {
            total += &ln2 * halvings;
        }
        if adj.sign() != Sign::NoSign {
            let ln_radix = match H::RADIX {
                2 => ln2,
                // 10 = 2^3 × 1.25, and ln 1.25 = 2 artanh(1/9).
                10 => &ln2 * 3u32 + artanh(&(&scale / 9u32), &scale) * 2,
                r => {
                    let twos = r.trailing_zeros();
                    let rest = r >> twos;
                    let mut v = &ln2 * twos;
                    if rest > 1 {
                        v += artanh(&(&scale * (rest - 1) / (rest + 1)), &scale) * 2;
                    }
                    v
                }
            };
            total += ln_radix * adj;
        }
        total
    }

    /// Rounds an approximation `m × RADIX^c`, accurate to a few dozen units
    /// in the last digit of `m`, into the context. `None` means the
    /// approximation cannot decide the rounding and the computation must be
    /// retried at a higher working precision.
    fn round_approx(
        &self,
        negative: bool,
        m: &BigUint,
        c: &BigInt,
        ctx: &Context,
        st: &mut Status,
    ) -> Option<H::Value> {
        let p = ctx.precision as u64;
        let digits = H::digits(m);
        let mut drop = digits.saturating_sub(p);
        let floor = if ctx.adjust_exponent {
            ctx.etiny().map(BigInt::from)
        } else {
            ctx.emin.map(|e| BigInt::from(e as i64))
        };
        if let Some(floor) = floor {
            if &floor > c {
                let gap = (&floor - c).to_u64().unwrap_or(u64::MAX);
                drop = drop.max(gap);
            }
        }
        if drop > 0 && drop <= digits {
            // The discarded tail must sit clear of the rounding boundaries.
            let window = H::pow(drop);
            let tail = m % &window;
            let slack = BigUint::from(64u32);
            let half = &window / 2u32;
            let distance = if tail > half {
                &tail - &half
            } else {
                &half - &tail
            };
            let safe = tail > slack && &tail + &slack < window && distance > slack;
            if !safe {
                return None;
            }
        }
        Some(self.finish(
            negative,
            Accumulator::with_discard(m.clone(), 0, true),
            c.clone(),
            ctx,
            st,
        ))
    }

    pub(crate) fn ln(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & ANY_NAN != 0 {
            return self.propagate_nan(n, st);
        }
        if f & INF != 0 {
            if f & NEG != 0 {
                return self.invalid(st);
            }
            return self.infinity(false);
        }
        let sig = H::significand(n);
        if sig.is_zero() {
            st.raise(Status::DIVISION_BY_ZERO);
            return self.infinity(true);
        }
        if f & NEG != 0 {
            return self.invalid(st);
        }
        if let Some(m) = power_of_radix::<H>(n) {
            if m.is_zero() {
                // ln 1 is exactly zero.
                return self.zero_at(false, BigInt::zero());
            }
        }
        if ctx.precision == 0 {
            return self.invalid(st);
        }
        let mut wp = ctx.precision as u64 + 14;
        loop {
            let total = self.ln_attempt(sig, H::exponent(n), wp);
            let (sign, mag) = total.into_parts();
            if !mag.is_zero() {
                let c = -BigInt::from(wp as i64);
                if let Some(out) = self.round_approx(sign == Sign::Minus, &mag, &c, ctx, st) {
                    return out;
                }
            }
            wp += wp / 2 + 16;
        }
    }

    pub(crate) fn log10(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & ANY_NAN != 0 {
            return self.propagate_nan(n, st);
        }
        if f & INF != 0 {
            if f & NEG != 0 {
                return self.invalid(st);
            }
            return self.infinity(false);
        }
        let sig = H::significand(n);
        if sig.is_zero() {
            st.raise(Status::DIVISION_BY_ZERO);
            return self.infinity(true);
        }
        if f & NEG != 0 {
            return self.invalid(st);
        }
        if H::RADIX == 10 {
            if let Some(m) = power_of_radix::<H>(n) {
                // Powers of ten have exact logarithms.
                let (sign, mag) = m.into_parts();
                if mag.is_zero() {
                    return self.zero_at(false, BigInt::zero());
                }
                return self.finish(
                    sign == Sign::Minus,
                    Accumulator::new(mag),
                    BigInt::zero(),
                    ctx,
                    st,
                );
            }
        }
        if ctx.precision == 0 {
            return self.invalid(st);
        }
        let mut wp = ctx.precision as u64 + 14;
        loop {
            let scale = BigInt::from(H::pow(wp));
            let lnx = self.ln_attempt(sig, H::exponent(n), wp);
            let ln_radix = {
                let ln2 = artanh(&(&scale / 3u32), &scale) * 2;
                match H::RADIX {
                    2 => ln2,
                    10 => &ln2 * 3u32 + artanh(&(&scale / 9u32), &scale) * 2,
                    r => {
                        let twos = r.trailing_zeros();
                        let rest = r >> twos;
                        let mut v = &ln2 * twos;
                        if rest > 1 {
                            v += artanh(&(&scale * (rest - 1) / (rest + 1)), &scale) * 2;
                        }
                        v
                    }
                }
            };
            let total: BigInt = lnx * &scale / ln_radix;
            let (sign, mag) = total.into_parts();
            if !mag.is_zero() {
                let c = -BigInt::from(wp as i64);
                if let Some(out) = self.round_approx(sign == Sign::Minus, &mag, &c, ctx, st) {
                    return out;
                }
            }
            wp += wp / 2 + 16;
        }
    }

    pub(crate) fn pow(&self, x: &H::Value, y: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let (fx, fy) = (H::flags(x), H::flags(y));
        if (fx | fy) & ANY_NAN != 0 {
            return self.propagate_nan2(x, y, st);
        }
        let x_zero = fx & INF == 0 && H::significand(x).is_zero();
        let y_zero = fy & INF == 0 && H::significand(y).is_zero();
        if y_zero {
            if x_zero {
                return self.invalid(st);
            }
            return self.one();
        }
        let xn = fx & NEG != 0;
        let yn = fy & NEG != 0;
        let y_odd = if fy & INF != 0 {
            None
        } else {
            integral_odd::<H>(y)
        };
        if x_zero {
            let negative = xn && y_odd == Some(true);
            if yn {
                st.raise(Status::DIVISION_BY_ZERO);
                return self.infinity(negative);
            }
            let exp = match integral_value::<H>(y) {
                Some(k) => H::exponent(x) * k,
                None => BigInt::zero(),
            };
            return self.finish_zero(negative, exp, ctx, st);
        }
        if fy & INF != 0 {
            if xn {
                return self.invalid(st);
            }
            let mag = if fx & INF != 0 {
                Ordering::Greater
            } else {
                magnitude_cmp::<H>(x, &self.one())
            };
            return match mag {
                Ordering::Equal => self.invalid(st),
                Ordering::Greater => {
                    if yn {
                        self.zero_at(false, BigInt::zero())
                    } else {
                        self.infinity(false)
                    }
                }
                Ordering::Less => {
                    if yn {
                        self.infinity(false)
                    } else {
                        self.zero_at(false, BigInt::zero())
                    }
                }
            };
        }
        if fx & INF != 0 {
            if xn && y_odd.is_none() {
                return self.invalid(st);
            }
            let negative = xn && y_odd == Some(true);
            return if yn {
                self.zero_at(negative, BigInt::zero())
            } else {
                self.infinity(negative)
            };
        }
        // Finite nonzero base from here on.
        if xn && y_odd.is_none() {
            return self.invalid(st);
        }
        let negative = xn && y_odd == Some(true);
        if let Some(base_exp) = power_of_radix::<H>(x) {
            if let Some(out) = self.pow_radix(&base_exp, y, negative, ctx, st) {
                return out;
            }
        }
        match integral_value::<H>(y) {
            Some(k) if k.magnitude().to_u64().map_or(false, |n| n <= MAX_SHIFT) => {
                self.pow_integer(x, negative, &k, ctx, st)
            }
            _ => {
                if ctx.precision == 0 {
                    return self.invalid(st);
                }
                self.pow_general(x, y, negative, ctx, st)
            }
        }
    }

    /// `(±RADIX^base_exp)^y`, which is exact whenever `base_exp × y` is an
    /// integer. `None` falls through to the general evaluation.
    fn pow_radix(
        &self,
        base_exp: &BigInt,
        y: &H::Value,
        negative: bool,
        ctx: &Context,
        st: &mut Status,
    ) -> Option<H::Value> {
        if base_exp.is_zero() {
            // ±1 to any finite power.
            return Some(H::build(
                if negative { NEG } else { 0 },
                BigUint::one(),
                BigInt::zero(),
            ));
        }
        let yn = H::flags(y) & NEG != 0;
        let ys = BigInt::from(H::significand(y).clone());
        let prod = base_exp * &ys;
        let ye = H::exponent(y);
        let k = match ye.sign() {
            Sign::NoSign => prod,
            Sign::Plus => match ye.to_u64() {
                Some(e) if H::digits(prod.magnitude()) + e <= 40 => {
                    prod * BigInt::from(H::pow(e))
                }
                _ => {
                    // The result exponent is astronomic either way.
                    let t_negative = (prod.sign() == Sign::Minus) != yn;
                    return Some(self.exp_extreme(t_negative, negative, ctx, st));
                }
            },
            Sign::Minus => {
                let e = match (-ye).to_u64() {
                    Some(e) => e,
                    None => return None,
                };
                if e > H::digits(prod.magnitude()) {
                    return None;
                }
                let (q, r) = prod.div_rem(&BigInt::from(H::pow(e)));
                if !r.is_zero() {
                    return None;
                }
                q
            }
        };
        let k = if yn { -k } else { k };
        Some(self.finish(
            negative,
            Accumulator::new(BigUint::one()),
            k,
            ctx,
            st,
        ))
    }

    /// An integer power small enough for the binary ladder.
    fn pow_integer(
        &self,
        x: &H::Value,
        negative: bool,
        k: &BigInt,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        let (stripped, zeros) = strip_trailing_zeros::<H>(H::significand(x));
        let exp0 = H::exponent(x) + BigInt::from(zeros as i64);
        let n = k.magnitude().to_u64().unwrap_or(0);
        let reciprocal = k.sign() == Sign::Minus;
        let p = ctx.precision as u64;
        let d = H::digits(&stripped);
        // Materialize exactly while the result stays manageable; this also
        // catches every case where the power is exactly representable.
        let budget = if p == 0 {
            MAX_SHIFT
        } else {
            (4 * p).max(64).min(MAX_SHIFT)
        };
        if d.checked_mul(n).map_or(false, |ed| ed <= budget) {
            let mag = Pow::pow(&stripped, n);
            let e_pow = exp0 * BigInt::from(n);
            if reciprocal {
                let pw = H::build(if negative { NEG } else { 0 }, mag, e_pow);
                return self.div(&self.one(), &pw, ctx, st);
            }
            return self.finish(negative, Accumulator::new(mag), e_pow, ctx, st);
        }
        if p == 0 {
            return self.invalid(st);
        }
        let mut wp = p + 24;
        loop {
            let (mut m, mut c) = self.pow_ladder(&stripped, &exp0, n, wp);
            if reciprocal {
                let shift = H::digits(&m) + wp + 4;
                m = H::pow(shift) / &m;
                c = -BigInt::from(shift) - c;
            }
            if let Some(out) = self.round_approx(negative, &m, &c, ctx, st) {
                return out;
            }
            wp += wp / 2 + 16;
        }
    }

    /// `base^n` by binary ladder, keeping `wp` digits plus guard throughout.
    fn pow_ladder(&self, base: &BigUint, base_exp: &BigInt, n: u64, wp: u64) -> (BigUint, BigInt) {
        let d = H::digits(base);
        let (mut bm, mut bc) = if d > wp + 4 {
            let drop = d - (wp + 4);
            (base / H::pow(drop), base_exp + BigInt::from(drop))
        } else {
            (base.clone(), base_exp.clone())
        };
        let mut rm = BigUint::one();
        let mut rc = BigInt::zero();
        let mut e = n;
        loop {
            if e & 1 == 1 {
                rm = &rm * &bm;
                rc += &bc;
                Self::cap_digits(&mut rm, &mut rc, wp);
            }
            e >>= 1;
            if e == 0 {
                break;
            }
            bm = &bm * &bm;
            bc *= 2;
            Self::cap_digits(&mut bm, &mut bc, wp);
        }
        (rm, rc)
    }

    /// The general power: e^(y ln x), correct to within a unit in the last
    /// place.
    fn pow_general(
        &self,
        x: &H::Value,
        y: &H::Value,
        negative: bool,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        let p = ctx.precision as u64;
        let sig = H::significand(x);
        let la = adjusted::<H>(x);
        let yn = H::flags(y) & NEG != 0;
        // Far from 1, the result's scale is readable off the adjusted
        // exponents alone.
        if la >= BigInt::one() || la <= BigInt::from(-2) {
            let ya = adjusted::<H>(y);
            let est = ya + BigInt::from(H::digits(la.magnitude()) as i64 - 2);
            if est > BigInt::from(19) {
                let t_negative = (la.sign() == Sign::Minus) != yn;
                return self.exp_extreme(t_negative, negative, ctx, st);
            }
        }
        let ye = match H::exponent(y).to_i64() {
            Some(e) => e,
            None => return self.invalid(st),
        };
        // Near 1 the logarithm cancels; widen the working precision by the
        // length of the cancellation.
        let mut cancel = 0u64;
        if la.sign() == Sign::NoSign || la == BigInt::from(-1) {
            let e = match H::exponent(x).to_i64() {
                Some(e) => e,
                None => return self.invalid(st),
            };
            if e < 0 {
                let one_aligned = H::pow(e.unsigned_abs());
                let diff = if *sig >= one_aligned {
                    sig - &one_aligned
                } else {
                    &one_aligned - sig
                };
                if !diff.is_zero() {
                    let dist_adj = e + H::digits(&diff) as i64 - 1;
                    if dist_adj < 0 {
                        cancel = dist_adj.unsigned_abs();
                    }
                    let ya = adjusted::<H>(y);
                    let t_est = ya + BigInt::from(dist_adj);
                    if t_est < -BigInt::from(p + 7) {
                        // x^y collapses to 1 ± epsilon.
                        let t_negative = (*sig < one_aligned) != yn;
                        let eps = H::build(
                            if t_negative { NEG } else { 0 },
                            BigUint::one(),
                            -BigInt::from(p as i64 + 9),
                        );
                        let out = self.add_core(&self.one(), &eps, false, ctx, st);
                        return if negative {
                            H::build(
                                H::flags(&out) ^ NEG,
                                H::significand(&out).clone(),
                                H::exponent(&out).clone(),
                            )
                        } else {
                            out
                        };
                    }
                }
            }
        }
        let wp = p + 48 + cancel;
        let lnx = self.ln_attempt(sig, H::exponent(x), wp);
        let ys = BigInt::from(H::significand(y).clone());
        let mut t = lnx * ys;
        if ye >= 0 {
            t *= BigInt::from(H::pow(ye as u64));
        } else {
            t /= BigInt::from(H::pow(ye.unsigned_abs()));
        }
        if yn {
            t = -t;
        }
        let dt = H::digits(t.magnitude());
        if dt > wp + 19 {
            return self.exp_extreme(t.sign() == Sign::Minus, negative, ctx, st);
        }
        let (m, c) = self.exp_fixed(&t, wp);
        self.finish(
            negative,
            Accumulator::with_discard(m, 0, true),
            c,
            ctx,
            st,
        )
    }
}
