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
use std::error::Error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{Product, Sum};
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

use num_traits::ToPrimitive;

use bigdec::{Context, Decimal, OrderedDecimal, Status};

#[derive(Default)]
struct ValidatingHasher {
    bytes: Vec<u8>,
}

impl Hasher for ValidatingHasher {
    fn write(&mut self, bytes: &[u8]) {
        self.bytes.extend(bytes)
    }

    fn finish(&self) -> u64 {
        unimplemented!()
    }
}

fn hash_data<H>(h: H) -> Vec<u8>
where
    H: Hash,
{
    let mut hasher = ValidatingHasher::default();
    h.hash(&mut hasher);
    hasher.bytes
}

const ORDERING_TESTS: &[(&str, &str, Ordering)] = &[
    ("1.2", "1.2", Ordering::Equal),
    ("1.2", "1.200", Ordering::Equal),
    ("1", "2", Ordering::Less),
    ("2", "1", Ordering::Greater),
    ("1", "NaN", Ordering::Less),
    ("NaN", "1", Ordering::Greater),
    ("Inf", "NaN", Ordering::Less),
    ("NaN", "Inf", Ordering::Greater),
    ("-Inf", "NaN", Ordering::Less),
    ("NaN", "-Inf", Ordering::Greater),
    ("NaN", "NaN", Ordering::Equal),
    ("sNaN", "NaN", Ordering::Equal),
    ("NaN42", "NaN21", Ordering::Equal),
    ("-0", "+0", Ordering::Equal),
];

#[test]
fn test_ordered_decimal() -> Result<(), Box<dyn Error>> {
    for (lhs, rhs, expected) in ORDERING_TESTS {
        println!("cmp({}, {}): expected {:?}", lhs, rhs, expected);
        let lhs: OrderedDecimal<Decimal> = lhs.parse()?;
        let rhs: OrderedDecimal<Decimal> = rhs.parse()?;
        assert_eq!(lhs.cmp(&rhs), *expected);

        if lhs == rhs && hash_data(&lhs) != hash_data(&rhs) {
            panic!("{} and {} are equal but hashes are not equal", lhs, rhs);
        } else if lhs != rhs && hash_data(&lhs) == hash_data(&rhs) {
            panic!("{} and {} are not equal but hashes are equal", lhs, rhs);
        }
    }
    Ok(())
}

#[test]
fn test_constructors() {
    assert_eq!(Decimal::zero().to_string(), "0");
    assert_eq!(Decimal::one().to_string(), "1");
    assert_eq!(Decimal::infinity().to_string(), "Infinity");
    assert_eq!((-Decimal::infinity()).to_string(), "-Infinity");
    assert_eq!(Decimal::nan().to_string(), "NaN");
    assert_eq!(Decimal::signaling_nan().to_string(), "sNaN");
    assert_eq!(Decimal::new(15, -1).to_string(), "1.5");
    assert_eq!(Decimal::new(-15, -1).to_string(), "-1.5");

    assert!(Decimal::zero().is_zero());
    assert!(!Decimal::zero().is_negative());
    assert!((-Decimal::zero()).is_negative());
    assert!(Decimal::nan().is_quiet_nan());
    assert!(Decimal::signaling_nan().is_signaling_nan());
    assert!(!Decimal::infinity().is_finite());
}

#[test]
fn test_overloading() -> Result<(), Box<dyn Error>> {
    // The goal here is only to test that the traits are wired up correctly,
    // e.g., to protect against transcription errors. The correctness of the
    // actual arithmetic operations is checked extensively by dectest.

    fn inner<T1, T2>() -> Result<(), Box<dyn Error>>
    where
        T1: Neg<Output = T1>
            + Add<T2, Output = T1>
            + Sub<T2, Output = T1>
            + Mul<T2, Output = T1>
            + Div<T2, Output = T1>
            + Rem<T2, Output = T1>
            + AddAssign
            + SubAssign
            + MulAssign
            + DivAssign
            + RemAssign
            + Sum
            + for<'a> Sum<&'a T1>
            + Product
            + for<'a> Product<&'a T1>
            + PartialEq
            + From<i32>
            + fmt::Debug,
        T2: From<i32>,
    {
        let t1 = |t| T1::from(t);
        let t2 = |t| T2::from(t);

        assert_eq!(-t1(1), t1(-1));
        assert_eq!(t1(1) + t2(2), t1(3));
        assert_eq!(t1(3) - t2(2), t1(1));
        assert_eq!(t1(2) * t2(3), t1(6));
        assert_eq!(t1(10) / t2(2), t1(5));
        assert_eq!(t1(10) % t2(3), t1(1));

        let mut x = t1(1);
        x += t1(2);
        assert_eq!(x, t1(3));

        let mut x = t1(3);
        x -= t1(2);
        assert_eq!(x, t1(1));

        let mut x = t1(2);
        x *= t1(3);
        assert_eq!(x, t1(6));

        let mut x = t1(10);
        x /= t1(2);
        assert_eq!(x, t1(5));

        let mut x = t1(10);
        x %= t1(3);
        assert_eq!(x, t1(1));

        assert_eq!([t1(2), t1(2), t1(3)].iter().sum::<T1>(), t1(7));
        assert_eq!(vec![t1(2), t1(2), t1(3)].into_iter().sum::<T1>(), t1(7));

        assert_eq!([t1(2), t1(2), t1(3)].iter().product::<T1>(), t1(12));
        assert_eq!(
            vec![t1(2), t1(2), t1(3)].into_iter().product::<T1>(),
            t1(12)
        );

        Ok(())
    }

    inner::<Decimal, Decimal>()?;
    inner::<OrderedDecimal<Decimal>, OrderedDecimal<Decimal>>()?;
    inner::<OrderedDecimal<Decimal>, Decimal>()?;
    inner::<Decimal, OrderedDecimal<Decimal>>()?;

    Ok(())
}

#[test]
fn test_exact_operators() -> Result<(), Box<dyn Error>> {
    // Operator arithmetic is exact at any scale, with no context in play.
    assert_eq!(
        Decimal::new(5, -2) + Decimal::new(3, -2),
        Decimal::new(8, -2)
    );
    assert_eq!(
        "0.1".parse::<Decimal>()? + "0.2".parse::<Decimal>()?,
        "0.3".parse::<Decimal>()?
    );
    assert_eq!(
        ("1.2".parse::<Decimal>()? * "1.2".parse::<Decimal>()?).to_string(),
        "1.44"
    );
    assert_eq!((Decimal::one() / Decimal::from(8)).to_string(), "0.125");

    // A quotient that does not terminate has no exact representation.
    assert!((Decimal::one() / Decimal::from(3)).is_quiet_nan());
    Ok(())
}

#[test]
fn test_integer_to_decimal() -> Result<(), Box<dyn Error>> {
    // Integer conversions are exact at any width; nothing rounds.
    assert_eq!(Decimal::from(0u8).to_string(), "0");
    assert_eq!(Decimal::from(-1i8).to_string(), "-1");
    assert_eq!(Decimal::from(i64::MAX).to_string(), "9223372036854775807");
    assert_eq!(Decimal::from(i64::MIN).to_string(), "-9223372036854775808");
    assert_eq!(Decimal::from(u64::MAX).to_string(), "18446744073709551615");
    assert_eq!(
        Decimal::from(i128::MAX).to_string(),
        "170141183460469231731687303715884105727"
    );
    assert_eq!(
        Decimal::from(i128::MIN).to_string(),
        "-170141183460469231731687303715884105728"
    );
    assert_eq!(
        Decimal::from(u128::MAX).to_string(),
        "340282366920938463463374607431768211455"
    );
    Ok(())
}

#[test]
fn test_decimal_to_integer() -> Result<(), Box<dyn Error>> {
    // TryFrom converts by value, so a fractional representation of an
    // integer converts while a true fraction does not.
    assert_eq!(i32::try_from(Decimal::from(42))?, 42);
    assert_eq!(u64::try_from("1.00".parse::<Decimal>()?)?, 1);
    assert_eq!(i64::try_from("1E+3".parse::<Decimal>()?)?, 1000);
    assert_eq!(
        i64::try_from("-9223372036854775808".parse::<Decimal>()?)?,
        i64::MIN
    );
    assert!(i64::try_from("1.5".parse::<Decimal>()?).is_err());
    assert!(u64::try_from(Decimal::from(-1)).is_err());
    assert!(u128::try_from("1E+40".parse::<Decimal>()?).is_err());
    assert!(i32::try_from(Decimal::nan()).is_err());
    assert!(i32::try_from(Decimal::infinity()).is_err());

    // The ToPrimitive conversions truncate instead.
    assert_eq!("1.5".parse::<Decimal>()?.to_i64(), Some(1));
    assert_eq!("-1.5".parse::<Decimal>()?.to_i64(), Some(-1));
    assert_eq!("0.99".parse::<Decimal>()?.to_i64(), Some(0));
    assert_eq!("1E+100".parse::<Decimal>()?.to_i64(), None);
    assert_eq!(
        "1E-100000000000000000000".parse::<Decimal>()?.to_i64(),
        Some(0)
    );
    assert_eq!("1E+100000000000000000000".parse::<Decimal>()?.to_i64(), None);
    assert_eq!(Decimal::nan().to_i64(), None);
    Ok(())
}

#[test]
fn test_float_conversions() -> Result<(), Box<dyn Error>> {
    // Binary to decimal is exact, which makes the famous non-decimal
    // floats visible in full.
    assert_eq!(
        Decimal::from(0.1f64).to_string(),
        "0.1000000000000000055511151231257827021181583404541015625"
    );
    assert_eq!(
        Decimal::from(0.1f32).to_string(),
        "0.100000001490116119384765625"
    );
    assert_eq!(Decimal::from(0.5f64).to_string(), "0.5");
    assert_eq!(Decimal::from(2.5f64).to_string(), "2.5");
    assert_eq!(Decimal::from(-3.0f64).to_string(), "-3");
    assert_eq!(
        Decimal::from(f32::MAX).to_string(),
        "340282346638528859811704183484516925440"
    );

    let neg_zero = Decimal::from(-0.0f64);
    assert!(neg_zero.is_zero());
    assert!(neg_zero.is_negative());
    assert_eq!(Decimal::from(f64::INFINITY).to_string(), "Infinity");
    assert_eq!(Decimal::from(f64::NEG_INFINITY).to_string(), "-Infinity");
    assert!(Decimal::from(f64::NAN).is_quiet_nan());

    // Decimal to binary rounds to nearest.
    assert_eq!("0.1".parse::<Decimal>()?.to_f64(), Some(0.1));
    assert_eq!("1.5".parse::<Decimal>()?.to_f64(), Some(1.5));
    assert_eq!("0.1".parse::<Decimal>()?.to_f32(), Some(0.1f32));
    assert_eq!(
        "-0".parse::<Decimal>()?.to_f64().map(f64::is_sign_negative),
        Some(true)
    );
    assert_eq!("1E+400".parse::<Decimal>()?.to_f64(), Some(f64::INFINITY));
    assert_eq!(
        "-1E+400".parse::<Decimal>()?.to_f64(),
        Some(f64::NEG_INFINITY)
    );
    assert_eq!("1E-400".parse::<Decimal>()?.to_f64(), Some(0.0));
    assert_eq!("4E+38".parse::<Decimal>()?.to_f32(), Some(f32::INFINITY));
    assert_eq!(Decimal::infinity().to_f64(), Some(f64::INFINITY));
    assert!(Decimal::nan().to_f64().map_or(false, f64::is_nan));

    // Exact out, nearest back: the round trip is the identity for every
    // float, normal or subnormal.
    for &f in &[
        0.0f64,
        1.0,
        0.3,
        1.0 / 3.0,
        123.456e78,
        f64::MAX,
        f64::MIN_POSITIVE,
        5e-324,
    ] {
        assert_eq!(Decimal::from(f).to_f64(), Some(f));
        assert_eq!(Decimal::from(-f).to_f64(), Some(-f));
    }
    Ok(())
}

#[test]
fn test_decomposition() -> Result<(), Box<dyn Error>> {
    fn inner(input: &str, coefficient: &str, exponent: i64) {
        let d: Decimal = input.parse().unwrap();
        assert_eq!(d.coefficient().to_string(), coefficient);
        assert_eq!(d.exponent().to_string(), exponent.to_string());
    }
    inner("0", "0", 0);
    inner("1", "1", 0);
    inner("-1", "-1", 0);
    inner("1.20", "120", -2);
    inner("4294967295", "4294967295", 0);
    inner("42949.67295", "4294967295", -5);
    inner(".4294967295", "4294967295", -10);
    inner("-.4294967295", "-4294967295", -10);
    inner("1E+100", "1", 100);
    inner("18446744073709551615", "18446744073709551615", 0);
    inner(
        "340282366920938463463374607431768211455999",
        "340282366920938463463374607431768211455999",
        0,
    );

    // Specials have no coefficient; NaNs expose a payload instead.
    assert_eq!(Decimal::infinity().coefficient().to_string(), "0");
    assert_eq!(Decimal::infinity().digits(), 0);
    assert_eq!(
        "NaN123".parse::<Decimal>()?.payload().map(|p| p.to_string()),
        Some("123".into())
    );
    assert_eq!("1".parse::<Decimal>()?.payload(), None);

    assert_eq!("123.45".parse::<Decimal>()?.digits(), 5);
    assert_eq!(Decimal::zero().digits(), 1);
    Ok(())
}

#[test]
fn test_standard_notation() -> Result<(), Box<dyn Error>> {
    fn inner(input: &str, expected: &str) {
        let d: Decimal = input.parse().unwrap();
        assert_eq!(d.to_standard_notation_string(), expected);
    }
    inner("123.45", "123.45");
    inner("-1.5", "-1.5");
    inner("1.23E+4", "12300");
    inner("1E-8", "0.00000001");
    inner("-1E-8", "-0.00000001");
    inner("0E+3", "0000");
    inner("Infinity", "Infinity");
    inner("NaN", "NaN");

    // An exponent too large for an i64 falls back to scientific notation.
    let d: Decimal = "1E+77000000000000000000".parse()?;
    assert_eq!(d.to_standard_notation_string(), "1E+77000000000000000000");
    Ok(())
}

#[test]
fn test_engineering_notation() {
    fn inner(input: &str, expected: &str) {
        let d: Decimal = input.parse().unwrap();
        assert_eq!(d.to_engineering_string(), expected);
        assert_eq!(format!("{:#}", d), expected);
    }
    // Numbers in the plain range print as in scientific notation.
    inner("123.45", "123.45");
    inner("-0.000001", "-0.000001");
    // Outside it, the exponent is brought to a multiple of three.
    inner("1.23E+4", "12.3E+3");
    inner("1E-7", "100E-9");
    inner("-1E-8", "-10E-9");
    inner("-1E+6", "-1E+6");
    // A zero keeps its exponent information in the digits.
    inner("0E+1", "0.00E+3");
    inner("Infinity", "Infinity");
    inner("NaN123", "NaN123");
}

#[test]
fn test_context_arithmetic() -> Result<(), Box<dyn Error>> {
    let mut cx = Context::default();
    cx.set_precision(5)?;

    let x: Decimal = "1.000001".parse()?;
    let sum = cx.add(&x, &x)?;
    assert_eq!(sum.to_string(), "2.0000");
    assert!(cx.status().inexact());
    assert!(cx.status().rounded());

    cx.clear_status();
    let q = cx.div(&Decimal::one(), &"8".parse()?)?;
    assert_eq!(q.to_string(), "0.125");
    assert!(!cx.status().any());

    // Untrapped conditions accumulate in the status without erroring.
    let q = cx.div(&Decimal::one(), &Decimal::zero())?;
    assert!(q.is_infinite());
    assert!(cx.status().division_by_zero());

    let cx = Context::decimal64();
    assert_eq!(cx.precision(), 16);
    assert_eq!(cx.max_exponent(), Some(384));
    assert_eq!(cx.min_exponent(), Some(-383));

    Ok(())
}

#[test]
fn test_traps() -> Result<(), Box<dyn Error>> {
    let mut cx = Context::default();
    let mut traps = Status::default();
    traps.set_division_by_zero(true);
    cx.set_traps(traps);

    let err = cx.div(&Decimal::one(), &Decimal::zero()).unwrap_err();
    assert!(err.status().division_by_zero());
    // The condition is recorded in the status even when it traps.
    assert!(cx.status().division_by_zero());

    // Conditions outside the trap set pass through.
    cx.clear_status();
    cx.set_precision(9)?;
    let n = cx.log10(&Decimal::from(7))?;
    assert_eq!(n.to_string(), "0.845098040");
    assert!(cx.status().inexact());
    Ok(())
}

#[test]
fn test_exponent_range() -> Result<(), Box<dyn Error>> {
    let mut cx = Context::default();
    cx.set_precision(9)?;
    cx.set_max_exponent(999)?;
    cx.set_min_exponent(-999)?;

    let huge = cx.parse("9E+999")?;
    let product = cx.mul(&huge, &"10".parse()?)?;
    assert!(product.is_infinite());
    assert!(cx.status().overflow());

    let tiny = cx.parse("1E-1000")?;
    assert!(tiny.is_subnormal(&cx));
    assert!(!tiny.is_normal(&cx));
    assert!("1".parse::<Decimal>()?.is_normal(&cx));

    // Without an exponent range nothing is subnormal.
    cx.clear_exponent_range();
    assert!(!tiny.is_subnormal(&cx));
    Ok(())
}

#[test]
fn test_value_comparison() -> Result<(), Box<dyn Error>> {
    let a: Decimal = "1.2".parse()?;
    let b: Decimal = "1.20".parse()?;

    // `==` compares representations, not values.
    assert_ne!(a, b);
    assert_eq!(a, "1.2".parse()?);

    // The total order ranks representations of one value by exponent.
    assert_eq!(a.total_cmp(&b), Ordering::Greater);
    assert_eq!(b.total_cmp(&a), Ordering::Less);
    assert_eq!(a.total_cmp(&a), Ordering::Equal);
    assert_eq!(
        "-2".parse::<Decimal>()?.total_cmp(&"1".parse()?),
        Ordering::Less
    );
    assert_eq!(
        "-2".parse::<Decimal>()?.total_cmp_mag(&"1".parse()?),
        Ordering::Greater
    );
    assert_eq!(
        Decimal::nan().total_cmp(&Decimal::infinity()),
        Ordering::Greater
    );

    // The total order separates the zeros that value comparison equates.
    let neg_zero: Decimal = "-0".parse()?;
    assert_eq!(neg_zero.total_cmp(&Decimal::zero()), Ordering::Less);

    // OrderedDecimal compares values.
    assert_eq!(OrderedDecimal(a.clone()), OrderedDecimal(b.clone()));

    // As does a context comparison, which reports NaNs as unordered.
    let mut cx = Context::default();
    assert_eq!(cx.partial_cmp(&a, &b)?, Some(Ordering::Equal));
    assert_eq!(cx.partial_cmp(&a, &Decimal::nan())?, None);
    assert_eq!(
        cx.partial_cmp(&neg_zero, &Decimal::zero())?,
        Some(Ordering::Equal)
    );

    assert!(a.quantum_matches(&"9.9".parse()?));
    assert!(!a.quantum_matches(&b));
    assert!(Decimal::nan().quantum_matches(&Decimal::nan()));
    assert!(Decimal::infinity().quantum_matches(&(-Decimal::infinity())));
    assert!(!Decimal::nan().quantum_matches(&Decimal::infinity()));
    Ok(())
}

#[test]
fn test_class() -> Result<(), Box<dyn Error>> {
    let mut cx = Context::default();
    cx.set_precision(9)?;
    cx.set_max_exponent(999)?;
    cx.set_min_exponent(-999)?;
    for (input, expected) in &[
        ("1", "+Normal"),
        ("-1", "-Normal"),
        ("0", "+Zero"),
        ("-0", "-Zero"),
        ("1E-1000", "+Subnormal"),
        ("-1E-1000", "-Subnormal"),
        ("Infinity", "+Infinity"),
        ("-Infinity", "-Infinity"),
        ("NaN", "NaN"),
        ("sNaN", "sNaN"),
    ] {
        let d: Decimal = input.parse()?;
        assert_eq!(cx.class(&d).to_string(), *expected);
    }
    Ok(())
}
