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

use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;

use bigdec::{Context, Decimal};

fn bench_decode(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let d = Decimal::from(rng.gen::<i64>());
    c.bench_function("decode", |b| {
        b.iter_with_setup(|| d.clone(), |d| (d.coefficient(), d.exponent().clone()))
    });
}

fn bench_arithmetic(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let x = Decimal::from(rng.gen::<i64>());
    let y = Decimal::from(rng.gen::<i64>());
    let mut cx = Context::decimal128();

    c.bench_function("parse", |b| {
        b.iter(|| "123456789.123456789".parse::<Decimal>().unwrap())
    });
    c.bench_function("display", |b| b.iter(|| x.to_string()));
    c.bench_function("add", |b| b.iter(|| cx.add(&x, &y).unwrap()));
    c.bench_function("mul", |b| b.iter(|| cx.mul(&x, &y).unwrap()));
    c.bench_function("div", |b| b.iter(|| cx.div(&x, &y).unwrap()));
}

criterion_group!(benches, bench_decode, bench_arithmetic);
criterion_main!(benches);
