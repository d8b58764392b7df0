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

//! Conversion between binary floating point and decimals.
//!
//! Binary to decimal is exact and total: every float is a sum of powers of
//! two, and `2^-k` is `5^k × 10^-k`, so any finite float has an exact finite
//! decimal form. Decimal to binary rounds to nearest, ties to even. Small
//! values convert with one native operation; everything else goes through a
//! big-integer quotient taken to a couple of bits past the target mantissa
//! and marked odd when inexact, which keeps the single final rounding free
//! of double-rounding error.

use std::cmp::Ordering;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Pow, ToPrimitive, Zero};

use crate::decimal::{Decimal, ANY_NAN, INF, NEG, QNAN, SNAN};
use crate::math::digit_count;

// Powers of ten with an exact binary representation, for the fast paths.
const TEN_F64: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];
const TEN_F32: [f32; 11] = [1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10];

/// Converts a double to an exactly equal decimal.
pub(crate) fn from_f64(n: f64) -> Decimal {
    let bits = n.to_bits();
    let negative = bits >> 63 == 1;
    let biased = (bits >> 52) & 0x7ff;
    let mantissa = bits & ((1 << 52) - 1);
    if biased == 0x7ff {
        return special_from_bits(negative, mantissa, 51);
    }
    let (m, e2) = if biased == 0 {
        (mantissa, -1074)
    } else {
        (mantissa | 1 << 52, biased as i64 - 1075)
    };
    binary(negative, m, e2)
}

/// Converts a single to an exactly equal decimal.
pub(crate) fn from_f32(n: f32) -> Decimal {
    let bits = n.to_bits();
    let negative = bits >> 31 == 1;
    let biased = (bits >> 23) & 0xff;
    let mantissa = u64::from(bits & ((1 << 23) - 1));
    if biased == 0xff {
        return special_from_bits(negative, mantissa, 22);
    }
    let (m, e2) = if biased == 0 {
        (mantissa, -149)
    } else {
        (mantissa | 1 << 23, i64::from(biased) - 150)
    };
    binary(negative, m, e2)
}

/// Builds the infinity or NaN encoded by an all-ones biased exponent.
/// `quiet` is the bit position that distinguishes quiet from signaling NaNs;
/// the bits below it are the payload.
fn special_from_bits(negative: bool, mantissa: u64, quiet: u32) -> Decimal {
    let sign = if negative { NEG } else { 0 };
    let flags = if mantissa == 0 {
        INF
    } else if mantissa >> quiet & 1 == 1 {
        QNAN
    } else {
        SNAN
    };
    Decimal {
        flags: sign | flags,
        significand: BigUint::from(mantissa & ((1 << quiet) - 1)),
        exponent: BigInt::zero(),
    }
}

/// Builds the exact decimal value of `m × 2^e2`.
fn binary(negative: bool, m: u64, e2: i64) -> Decimal {
    let flags = if negative { NEG } else { 0 };
    if m == 0 {
        return Decimal {
            flags,
            significand: BigUint::zero(),
            exponent: BigInt::zero(),
        };
    }
    let trailing = i64::from(m.trailing_zeros());
    let m = m >> trailing;
    let e2 = e2 + trailing;
    if e2 >= 0 {
        Decimal {
            flags,
            significand: BigUint::from(m) << (e2 as u64),
            exponent: BigInt::zero(),
        }
    } else {
        Decimal {
            flags,
            significand: BigUint::from(m) * pow5((-e2) as u64),
            exponent: BigInt::from(e2),
        }
    }
}

/// Converts to the nearest double, rounding ties to even.
pub(crate) fn to_f64(n: &Decimal) -> f64 {
    let magnitude = if n.flags & ANY_NAN != 0 {
        let payload = (&n.significand % (1u64 << 51)).to_u64().unwrap_or(0);
        f64::from_bits(0x7ffu64 << 52 | 1 << 51 | payload)
    } else if n.flags & INF != 0 {
        f64::INFINITY
    } else {
        magnitude_to_f64(&n.significand, &n.exponent)
    };
    if n.flags & NEG != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Converts to the nearest single, rounding ties to even.
pub(crate) fn to_f32(n: &Decimal) -> f32 {
    let magnitude = if n.flags & ANY_NAN != 0 {
        let payload = (&n.significand % (1u64 << 22)).to_u32().unwrap_or(0);
        f32::from_bits(0xffu32 << 23 | 1 << 22 | payload)
    } else if n.flags & INF != 0 {
        f32::INFINITY
    } else {
        magnitude_to_f32(&n.significand, &n.exponent)
    };
    if n.flags & NEG != 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn magnitude_to_f64(sig: &BigUint, exponent: &BigInt) -> f64 {
    if sig.is_zero() {
        return 0.0;
    }
    if let (Some(s), Some(e)) = (sig.to_u64(), exponent.to_i64()) {
        if s < 1 << 53 && (-22..=22).contains(&e) {
            return if e < 0 {
                s as f64 / TEN_F64[(-e) as usize]
            } else {
                s as f64 * TEN_F64[e as usize]
            };
        }
    }
    let adjusted: BigInt = exponent + BigInt::from(digit_count(sig)) - 1;
    let adjusted = match adjusted.to_i64() {
        Some(adjusted) => adjusted,
        None => {
            return if adjusted.sign() == Sign::Minus {
                0.0
            } else {
                f64::INFINITY
            }
        }
    };
    if adjusted >= 309 {
        return f64::INFINITY;
    }
    if adjusted <= -325 {
        return 0.0;
    }
    let e = match exponent.to_i64() {
        Some(e) => e,
        // An exponent past i64 whose adjusted form is in range must be
        // enormously negative, offset by an enormous digit count.
        None => return 0.0,
    };
    match round_binary(sig, e, 53, -1022, 1023) {
        Some((mantissa, scale)) => mantissa as f64 * pow2_f64(scale),
        None => f64::INFINITY,
    }
}

fn magnitude_to_f32(sig: &BigUint, exponent: &BigInt) -> f32 {
    if sig.is_zero() {
        return 0.0;
    }
    if let (Some(s), Some(e)) = (sig.to_u64(), exponent.to_i64()) {
        if s < 1 << 24 && (-10..=10).contains(&e) {
            return if e < 0 {
                s as f32 / TEN_F32[(-e) as usize]
            } else {
                s as f32 * TEN_F32[e as usize]
            };
        }
    }
    let adjusted: BigInt = exponent + BigInt::from(digit_count(sig)) - 1;
    let adjusted = match adjusted.to_i64() {
        Some(adjusted) => adjusted,
        None => {
            return if adjusted.sign() == Sign::Minus {
                0.0
            } else {
                f32::INFINITY
            }
        }
    };
    if adjusted >= 39 {
        return f32::INFINITY;
    }
    if adjusted <= -47 {
        return 0.0;
    }
    let e = match exponent.to_i64() {
        Some(e) => e,
        None => return 0.0,
    };
    match round_binary(sig, e, 24, -126, 127) {
        Some((mantissa, scale)) => mantissa as f32 * pow2_f32(scale),
        None => f32::INFINITY,
    }
}

/// Correctly rounds `sig × 10^e` to a mantissa of `bits` bits within the
/// normal binary exponent range `min_exp..=max_exp`, rounding at the clamped
/// position for subnormal results. Returns the mantissa and its power of
/// two, or `None` on overflow.
fn round_binary(
    sig: &BigUint,
    e: i64,
    bits: i64,
    min_exp: i64,
    max_exp: i64,
) -> Option<(u64, i64)> {
    // One bit past the mantissa, so the quotient always has at least one bit
    // to discard in the final rounding. The odd mark lives in that tail.
    let window = bits + 1;
    let (q, b) = if e >= 0 {
        let num = sig * pow5(e as u64);
        let n = num.bits() as i64;
        if n <= window {
            let shift = (window - n) as u64;
            (num << shift, e - shift as i64)
        } else {
            let shift = (n - window) as u64;
            let (mut q, tail) = num.div_rem(&(BigUint::one() << shift));
            if !tail.is_zero() {
                q |= BigUint::one();
            }
            (q, e + shift as i64)
        }
    } else {
        let den_pow = pow5((-e) as u64);
        let mut j = window + den_pow.bits() as i64 - sig.bits() as i64;
        loop {
            let (num, den) = if j >= 0 {
                (sig << (j as u64), den_pow.clone())
            } else {
                (sig.clone(), &den_pow << ((-j) as u64))
            };
            let (mut q, r) = num.div_rem(&den);
            let m = q.bits() as i64;
            if m < window {
                j += window - m;
            } else if m > window + 1 {
                j -= m - (window + 1);
            } else {
                if !r.is_zero() {
                    q |= BigUint::one();
                }
                break (q, e - j);
            }
        }
    };

    let m = q.bits() as i64;
    let top = b + m - 1;
    if top > max_exp {
        return None;
    }
    let keep = if top < min_exp {
        // The least bit is pinned at the subnormal ulp.
        let keep = top - (min_exp - bits + 1) + 1;
        if keep < 0 {
            return Some((0, 0));
        }
        keep
    } else {
        bits
    };
    let drop = (m - keep) as u64;
    let (kept, tail) = q.div_rem(&(BigUint::one() << drop));
    let mut mantissa = kept.to_u64().unwrap_or(0);
    let half = BigUint::one() << (drop - 1);
    let up = match tail.cmp(&half) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => mantissa & 1 == 1,
    };
    if up {
        mantissa += 1;
    }
    Some((mantissa, b + drop as i64))
}

fn pow5(k: u64) -> BigUint {
    Pow::pow(&BigUint::from(5u32), k)
}

/// An exact power of two, for scaling a rounded mantissa into place.
fn pow2_f64(k: i64) -> f64 {
    if k >= -1022 {
        f64::from_bits(((k + 1023) as u64) << 52)
    } else {
        f64::from_bits(1 << (k + 1074))
    }
}

fn pow2_f32(k: i64) -> f32 {
    if k >= -126 {
        f32::from_bits(((k + 127) as u32) << 23)
    } else {
        f32::from_bits(1 << (k + 149))
    }
}
