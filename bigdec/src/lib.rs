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

//! bigdec is a decimal arithmetic library for Rust.
//!
//! # Introduction
//!
//! From the [Decimal Arithmetic FAQ][faq]:
//!
//! > Most people in the world use decimal (base 10) arithmetic. When large or
//! > small values are needed, exponents which are powers of ten are used.
//! > However, most computers have only binary (base two) arithmetic, and when
//! > exponents are used (in floating-poing numbers) they are powers of two.
//! >
//! > Binary floating-point numbers can only approximate common decimal numbers.
//! > The value 0.1, for example, would need an infinitely recurring binary
//! > fraction. In contrast, a decimal number system can represent 0.1 exactly,
//! > as one tenth (that is, 10<sup>-1</sup>). Consequently, binary
//! > floating-point cannot be used for financial calculations, or indeed for
//! > any calculations where the results achieved are required to match those
//! > which might be calculated by hand.
//!
//! bigdec is a pure Rust implementation of the arbitrary-precision arithmetic
//! from the General Decimal Arithmetic standard, which precisely describes
//! both a limited-precision floating-point decimal arithmetic and an arbitrary
//! precision floating-point decimal arithmetic.
//!
//! The latest draft of the standard is available online at
//! <http://speleotrove.com/decimal/decarith.html>.
//!
//! # Details
//!
//! Numbers are stored as a sign, a significand of any size the heap permits,
//! and an exponent of any size the heap permits. There is no compressed
//! interchange format and no fixed-width storage type.
//!
//! The main types exposed by this library are as follows:
//!
//!  * [`Decimal`], the decimal floating-point representation. Operations via
//!    the standard operator traits are exact and infallible; all other
//!    operations live on [`Context`].
//!
//!  * [`Context`], which hosts most of the actual functions on [`Decimal`].
//!    A context configures the behavior of the various operations (e.g.,
//!    precision and rounding mode) and accumulates exceptional conditions
//!    (e.g., overflow).
//!
//!  * [`OrderedDecimal`], a wrapper for [`Decimal`] that provides
//!    implementations of [`Ord`] and [`Hash`].
//!
//! # Examples
//!
//! The following example demonstrates the basic usage of the library:
//!
//! ```
//! # use std::error::Error;
//! use bigdec::Decimal;
//!
//! let x: Decimal = ".1".parse()?;
//! let y: Decimal = ".2".parse()?;
//! let z: Decimal = ".3".parse()?;
//!
//! assert_eq!(&x + &y, z);
//! assert_eq!((&x + &y + &z).to_string(), "0.6");
//!
//! # Ok::<_, Box<dyn Error>>(())
//! ```
//!
//! Rounded arithmetic requires a [`Context`]:
//!
//! ```
//! # use std::error::Error;
//! use bigdec::{Context, Decimal};
//!
//! let mut cx = Context::default();
//! cx.set_precision(5)?;
//!
//! let x: Decimal = "1.000001".parse()?;
//! let sum = cx.add(&x, &x)?;
//! assert_eq!(sum.to_string(), "2.0000");
//!
//! # Ok::<_, Box<dyn Error>>(())
//! ```
//!
//! [faq]: http://speleotrove.com/decimal/decifaq.html

#![deny(missing_debug_implementations, missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod context;
mod conv;
mod decimal;
mod error;
mod macros;
mod math;
mod ordered;
mod parse;
mod simple;

pub use context::{Class, Context, Rounding, Status};
pub use decimal::Decimal;
pub use error::{
    InvalidExponentError, InvalidPrecisionError, ParseDecimalError, TrapError,
    TryFromDecimalError,
};
pub use ordered::OrderedDecimal;
