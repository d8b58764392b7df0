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

//! Conversion from strings to arbitrary-precision decimals.
//!
//! The scanner validates the whole input before building a value, then takes
//! one of two routes. Significands of at most 19 digits and exponents of at
//! most 18 digits stay in native integer arithmetic; anything longer falls
//! back to big-integer parsing on the digit runs. When a bounded context is
//! supplied, digits past the precision are never materialized at all: the
//! scan records the first discarded digit and whether any nonzero digit
//! followed it, which is all any rounding mode needs.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use crate::context::{Context, Status};
use crate::decimal::{Decimal, INF, NEG, QNAN, SNAN};
use crate::error::ParseDecimalError;
use crate::math::{Accumulator, MATH};

/// Parses a decimal from its string representation.
///
/// With a context, the result is rounded to the context's precision and
/// exponent range and the conditions this raises go into `st`. Without one,
/// the result is exact and `st` is untouched.
pub(crate) fn parse(
    s: &str,
    ctx: Option<&Context>,
    st: &mut Status,
) -> Result<Decimal, ParseDecimalError> {
    let bytes = s.as_bytes();
    let (negative, rest) = match bytes.first() {
        Some(b'+') => (false, &bytes[1..]),
        Some(b'-') => (true, &bytes[1..]),
        _ => (false, bytes),
    };
    match rest.first() {
        Some(b) if b.is_ascii_digit() || *b == b'.' => number(rest, negative, ctx, st),
        Some(_) => special(rest, negative),
        None => Err(ParseDecimalError),
    }
}

/// Parses a numeric string, after the sign.
fn number(
    bytes: &[u8],
    negative: bool,
    ctx: Option<&Context>,
    st: &mut Status,
) -> Result<Decimal, ParseDecimalError> {
    let mut pos = 0;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int = 0..pos;
    let frac = if bytes.get(pos) == Some(&b'.') {
        let start = pos + 1;
        pos = start;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        start..pos
    } else {
        pos..pos
    };
    if int.len() + frac.len() == 0 {
        return Err(ParseDecimalError);
    }
    let mut exp_negative = false;
    let exp = if pos < bytes.len() {
        if bytes[pos] != b'e' && bytes[pos] != b'E' {
            return Err(ParseDecimalError);
        }
        pos += 1;
        match bytes.get(pos) {
            Some(b'+') => pos += 1,
            Some(b'-') => {
                exp_negative = true;
                pos += 1;
            }
            _ => {}
        }
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == start || pos != bytes.len() {
            return Err(ParseDecimalError);
        }
        start..pos
    } else {
        pos..pos
    };

    // The significant digits run from the first nonzero digit to the end of
    // the fraction, crossing the decimal point.
    let digit_run = || bytes[int.clone()].iter().chain(&bytes[frac.clone()]).copied();
    let total = int.len() + frac.len();
    let lead = digit_run().take_while(|&b| b == b'0').count();
    let significant = total - lead;

    let limit = match ctx {
        Some(ctx) if ctx.precision > 0 && !ctx.precision_in_bits => ctx.precision,
        _ => usize::MAX,
    };
    let kept = significant.min(limit);
    let mut digits = digit_run().skip(lead);
    let sig = if kept <= 19 {
        let mut n = 0u64;
        for b in (&mut digits).take(kept) {
            n = n * 10 + u64::from(b - b'0');
        }
        BigUint::from(n)
    } else {
        let buf: Vec<u8> = (&mut digits).take(kept).collect();
        BigUint::parse_bytes(&buf, 10).ok_or(ParseDecimalError)?
    };
    let mut last = 0;
    let mut older = false;
    for (i, b) in digits.enumerate() {
        let d = b - b'0';
        if i == 0 {
            last = d;
        } else if d != 0 {
            older = true;
        }
    }
    let dropped = significant - kept;

    // Digits dropped from the low end raise the scale; fraction digits
    // lower it.
    let shift = dropped as i128 - frac.len() as i128;
    let exp_digits = &bytes[exp];
    let exp_lead = exp_digits.iter().take_while(|&&b| b == b'0').count();
    let exponent = if exp_digits.len() - exp_lead <= 18 {
        let mut e: i64 = 0;
        for b in &exp_digits[exp_lead..] {
            e = e * 10 + i64::from(b - b'0');
        }
        if exp_negative {
            e = -e;
        }
        BigInt::from(i128::from(e) + shift)
    } else {
        // The exponent is too long to evaluate in native arithmetic. Under
        // an exponent range it can only overflow or underflow, and which of
        // the two depends on its sign alone, so it is pinned just past the
        // relevant bound and the range handling in `finish` does the rest.
        let pinned = ctx.and_then(|ctx| {
            if exp_negative {
                ctx.etiny()
                    .map(|etiny| BigInt::from(i128::from(etiny) - kept as i128 - 1))
            } else {
                ctx.emax.map(|emax| BigInt::from(emax) + 1)
            }
        });
        match pinned {
            Some(exponent) => exponent,
            None => {
                let mag = BigUint::parse_bytes(exp_digits, 10).ok_or(ParseDecimalError)?;
                let exact = if exp_negative {
                    BigInt::from_biguint(Sign::Minus, mag)
                } else {
                    BigInt::from(mag)
                };
                exact + shift
            }
        }
    };

    match ctx {
        Some(ctx) => {
            let acc = if dropped > 0 {
                Accumulator::with_discard(sig, last, older)
            } else {
                Accumulator::new(sig)
            };
            Ok(MATH.finish(negative, acc, exponent, ctx, st))
        }
        None => Ok(Decimal {
            flags: if negative { NEG } else { 0 },
            significand: sig,
            exponent,
        }),
    }
}

/// Parses the text of an infinity or NaN, after the sign.
fn special(bytes: &[u8], negative: bool) -> Result<Decimal, ParseDecimalError> {
    let flags = |kind| kind | if negative { NEG } else { 0 };
    if bytes.eq_ignore_ascii_case(b"inf") || bytes.eq_ignore_ascii_case(b"infinity") {
        return Ok(Decimal {
            flags: flags(INF),
            significand: BigUint::zero(),
            exponent: BigInt::zero(),
        });
    }
    let (kind, payload) = if bytes.len() >= 4 && bytes[..4].eq_ignore_ascii_case(b"snan") {
        (SNAN, &bytes[4..])
    } else if bytes.len() >= 3 && bytes[..3].eq_ignore_ascii_case(b"nan") {
        (QNAN, &bytes[3..])
    } else {
        return Err(ParseDecimalError);
    };
    if !payload.iter().all(u8::is_ascii_digit) {
        return Err(ParseDecimalError);
    }
    Ok(Decimal {
        flags: flags(kind),
        significand: payload_digits(payload)?,
        exponent: BigInt::zero(),
    })
}

/// Parses a validated run of ASCII digits.
fn payload_digits(digits: &[u8]) -> Result<BigUint, ParseDecimalError> {
    if digits.is_empty() {
        return Ok(BigUint::zero());
    }
    if digits.len() <= 19 {
        let mut n = 0u64;
        for b in digits {
            n = n * 10 + u64::from(b - b'0');
        }
        Ok(BigUint::from(n))
    } else {
        BigUint::parse_bytes(digits, 10).ok_or(ParseDecimalError)
    }
}
