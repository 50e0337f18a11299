#[macro_use]
extern crate criterion;
extern crate mandelbrot;

use criterion::Criterion;
use mandelbrot::{render, ColorParams, Polynomial, Viewport};

fn small_viewport() -> Viewport {
    Viewport {
        width: 320,
        height: 160,
        max_iterations: 200,
        ..Viewport::default()
    }
}

fn single_thread(c: &mut Criterion) {
    let vp = small_viewport();
    let params = ColorParams::default();
    c.bench_function("render 320x160 on 1 thread", move |b| {
        b.iter(|| render(&vp, None, &Polynomial, &params, 1))
    });
}

fn eight_threads(c: &mut Criterion) {
    let vp = small_viewport();
    let params = ColorParams::default();
    c.bench_function("render 320x160 on 8 threads", move |b| {
        b.iter(|| render(&vp, None, &Polynomial, &params, 8))
    });
}

criterion_group!(benches, single_thread, eight_threads);
criterion_main!(benches);
