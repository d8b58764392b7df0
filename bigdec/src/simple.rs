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

//! Simplified arithmetic on arbitrary-precision decimals.
//!
//! [`SimpleMath`] drives [`RadixMath`] with the operand and result
//! conventions of simplified arithmetic: operands are rounded to the working
//! precision before an operation sees them, results never carry a negative
//! zero or an idle positive exponent, and subnormal bookkeeping is
//! suppressed. The numeric core is untouched; only the edges of each call
//! change.

use std::marker::PhantomData;

use num_bigint::{BigInt, Sign};
use num_traits::{ToPrimitive, Zero};

use crate::context::{Context, Status};
use crate::decimal::{ANY_NAN, NEG, SPECIAL};
use crate::math::{
    strip_trailing_zeros, Accumulator, DecimalHelper, RadixHelper, RadixMath, MAX_SHIFT,
};

/// How a raw result is written back out.
#[derive(Clone, Copy)]
enum Form {
    /// Expand a positive exponent away when the digits fit, so integers read
    /// as integers.
    Plain,
    /// Like `Plain`, after stripping exact trailing zeros.
    Quotient,
    /// Keep the exponent the operation produced.
    Scaled,
}

/// The simplified arithmetic engine.
///
/// Wraps [`RadixMath`] and mirrors its call surface method for method.
pub(crate) struct SimpleMath<H> {
    raw: RadixMath<H>,
}

pub(crate) const SIMPLE: SimpleMath<DecimalHelper> = SimpleMath {
    raw: RadixMath(PhantomData),
};

impl<H: RadixHelper> SimpleMath<H> {
    /// Rounds an operand into the context before the operation proper.
    fn prepare(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        let f = H::flags(n);
        if f & SPECIAL == 0 && ctx.precision > 0 {
            let sig = H::significand(n);
            if self.raw.width(sig, ctx) > ctx.precision as u64 {
                return self.raw.finish(
                    f & NEG != 0,
                    Accumulator::new(sig.clone()),
                    H::exponent(n).clone(),
                    ctx,
                    st,
                );
            }
        }
        n.clone()
    }

    /// Rewrites a raw result in simplified form.
    fn settle(&self, n: H::Value, form: Form, ctx: &Context) -> H::Value {
        let f = H::flags(&n);
        if f & SPECIAL != 0 {
            return n;
        }
        let mut sig = H::significand(&n).clone();
        let mut exp = H::exponent(&n).clone();
        if sig.is_zero() {
            if exp.sign() == Sign::Plus {
                exp = BigInt::zero();
            }
            return H::build(0, sig, exp);
        }
        if let Form::Quotient = form {
            let (stripped, zeros) = strip_trailing_zeros::<H>(&sig);
            if zeros > 0 {
                sig = stripped;
                exp += zeros;
            }
        }
        if let Form::Scaled = form {
            return H::build(f & NEG, sig, exp);
        }
        if exp.sign() == Sign::Plus {
            if let Some(count) = exp.to_u64().filter(|&count| count <= MAX_SHIFT) {
                let p = ctx.precision as u64;
                let plausible = if p == 0 {
                    true
                } else if ctx.precision_in_bits {
                    // A radix-10 shift adds at least three bits per digit.
                    sig.bits().saturating_add(3 * count) <= p
                } else {
                    H::digits(&sig).saturating_add(count) <= p
                };
                if plausible {
                    let expanded = &sig * H::pow(count);
                    if p == 0 || self.raw.width(&expanded, ctx) <= p {
                        sig = expanded;
                        exp = BigInt::zero();
                    }
                }
            }
        }
        H::build(f & NEG, sig, exp)
    }

    fn unary<F>(&self, n: &H::Value, form: Form, ctx: &Context, st: &mut Status, op: F) -> H::Value
    where
        F: FnOnce(&RadixMath<H>, &H::Value, &Context, &mut Status) -> H::Value,
    {
        if H::flags(n) & ANY_NAN != 0 {
            return self.raw.propagate_nan(n, st);
        }
        let mut inner = Status::default();
        let n = self.prepare(n, ctx, &mut inner);
        let out = op(&self.raw, &n, ctx, &mut inner);
        st.raise(inner.inner & !Status::SUBNORMAL);
        self.settle(out, form, ctx)
    }

    fn binary<F>(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        form: Form,
        ctx: &Context,
        st: &mut Status,
        op: F,
    ) -> H::Value
    where
        F: FnOnce(&RadixMath<H>, &H::Value, &H::Value, &Context, &mut Status) -> H::Value,
    {
        if (H::flags(lhs) | H::flags(rhs)) & ANY_NAN != 0 {
            return self.raw.propagate_nan2(lhs, rhs, st);
        }
        let mut inner = Status::default();
        let lhs = self.prepare(lhs, ctx, &mut inner);
        let rhs = self.prepare(rhs, ctx, &mut inner);
        let out = op(&self.raw, &lhs, &rhs, ctx, &mut inner);
        st.raise(inner.inner & !Status::SUBNORMAL);
        self.settle(out, form, ctx)
    }

    /// Like [`SimpleMath::binary`], without the NaN short circuit. The
    /// minimum and maximum family drops a lone quiet NaN in favor of the
    /// numeric operand, so those operations keep their own NaN handling.
    fn selecting<F>(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
        op: F,
    ) -> H::Value
    where
        F: FnOnce(&RadixMath<H>, &H::Value, &H::Value, &Context, &mut Status) -> H::Value,
    {
        let mut inner = Status::default();
        let lhs = self.prepare(lhs, ctx, &mut inner);
        let rhs = self.prepare(rhs, ctx, &mut inner);
        let out = op(&self.raw, &lhs, &rhs, ctx, &mut inner);
        st.raise(inner.inner & !Status::SUBNORMAL);
        self.settle(out, Form::Plain, ctx)
    }

    pub(crate) fn abs(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.unary(n, Form::Plain, ctx, st, RadixMath::abs)
    }

    pub(crate) fn plus(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.unary(n, Form::Plain, ctx, st, RadixMath::plus)
    }

    pub(crate) fn minus(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.unary(n, Form::Plain, ctx, st, RadixMath::minus)
    }

    pub(crate) fn add(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.binary(lhs, rhs, Form::Plain, ctx, st, RadixMath::add)
    }

    pub(crate) fn sub(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.binary(lhs, rhs, Form::Plain, ctx, st, RadixMath::sub)
    }

    pub(crate) fn mul(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.binary(lhs, rhs, Form::Plain, ctx, st, RadixMath::mul)
    }

    pub(crate) fn div(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.binary(lhs, rhs, Form::Quotient, ctx, st, RadixMath::div)
    }

    pub(crate) fn div_integer(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        self.binary(lhs, rhs, Form::Plain, ctx, st, RadixMath::div_integer)
    }

    pub(crate) fn rem(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.binary(lhs, rhs, Form::Plain, ctx, st, RadixMath::rem)
    }

    pub(crate) fn rem_near(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        self.binary(lhs, rhs, Form::Plain, ctx, st, RadixMath::rem_near)
    }

    pub(crate) fn fma(
        &self,
        x: &H::Value,
        y: &H::Value,
        z: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        if (H::flags(x) | H::flags(y) | H::flags(z)) & ANY_NAN != 0 {
            return self.raw.propagate_nan3(x, y, z, st);
        }
        let mut inner = Status::default();
        let x = self.prepare(x, ctx, &mut inner);
        let y = self.prepare(y, ctx, &mut inner);
        let z = self.prepare(z, ctx, &mut inner);
        let out = self.raw.fma(&x, &y, &z, ctx, &mut inner);
        st.raise(inner.inner & !Status::SUBNORMAL);
        self.settle(out, Form::Plain, ctx)
    }

    pub(crate) fn sqrt(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.unary(n, Form::Quotient, ctx, st, RadixMath::sqrt)
    }

    pub(crate) fn quantize(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        self.binary(lhs, rhs, Form::Scaled, ctx, st, RadixMath::quantize)
    }

    pub(crate) fn rescale(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        self.binary(lhs, rhs, Form::Scaled, ctx, st, RadixMath::rescale)
    }

    pub(crate) fn reduce(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.unary(n, Form::Scaled, ctx, st, RadixMath::reduce)
    }

    pub(crate) fn round_integral(
        &self,
        n: &H::Value,
        exact: bool,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        self.unary(n, Form::Plain, ctx, st, |raw, n, ctx, st| {
            raw.round_integral(n, exact, ctx, st)
        })
    }

    pub(crate) fn min(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.selecting(lhs, rhs, ctx, st, RadixMath::min)
    }

    pub(crate) fn max(&self, lhs: &H::Value, rhs: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.selecting(lhs, rhs, ctx, st, RadixMath::max)
    }

    pub(crate) fn min_abs(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        self.selecting(lhs, rhs, ctx, st, RadixMath::min_abs)
    }

    pub(crate) fn max_abs(
        &self,
        lhs: &H::Value,
        rhs: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        self.selecting(lhs, rhs, ctx, st, RadixMath::max_abs)
    }

    pub(crate) fn next_plus(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.unary(n, Form::Plain, ctx, st, RadixMath::next_plus)
    }

    pub(crate) fn next_minus(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.unary(n, Form::Plain, ctx, st, RadixMath::next_minus)
    }

    pub(crate) fn next_toward(
        &self,
        x: &H::Value,
        y: &H::Value,
        ctx: &Context,
        st: &mut Status,
    ) -> H::Value {
        self.binary(x, y, Form::Plain, ctx, st, RadixMath::next_toward)
    }

    pub(crate) fn logb(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.unary(n, Form::Plain, ctx, st, RadixMath::logb)
    }

    pub(crate) fn scaleb(&self, x: &H::Value, y: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.binary(x, y, Form::Plain, ctx, st, RadixMath::scaleb)
    }

    pub(crate) fn exp(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.unary(n, Form::Plain, ctx, st, RadixMath::exp)
    }

    pub(crate) fn ln(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.unary(n, Form::Plain, ctx, st, RadixMath::ln)
    }

    pub(crate) fn log10(&self, n: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.unary(n, Form::Plain, ctx, st, RadixMath::log10)
    }

    pub(crate) fn pow(&self, x: &H::Value, y: &H::Value, ctx: &Context, st: &mut Status) -> H::Value {
        self.binary(x, y, Form::Plain, ctx, st, RadixMath::pow)
    }
}
