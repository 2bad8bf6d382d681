//! Benchmark: reinterpreting a matrix with reshape vs reallocating with resize.

use std::time::Instant;

use kestrel::{DeviceContext, DeviceMatrix};

fn bench_reshape(m: &mut DeviceMatrix, rows: usize, cols: usize, beam: usize, iters: usize) -> f64 {
    let start = Instant::now();
    for _ in 0..iters {
        m.reshape(rows * beam, cols, 1, 1).unwrap();
        m.reshape(rows, cols, beam, 1).unwrap();
    }
    start.elapsed().as_secs_f64() / iters as f64
}

fn bench_resize(m: &mut DeviceMatrix, rows: usize, cols: usize, beam: usize, iters: usize) -> f64 {
    let start = Instant::now();
    for _ in 0..iters {
        m.resize(rows * beam, cols, 1, 1).unwrap();
        m.resize(rows, cols, beam - 1, 1).unwrap();
    }
    start.elapsed().as_secs_f64() / iters as f64
}

fn main() {
    let ctx = DeviceContext::host();
    println!("=== kestrel reshape vs resize ({}) ===\n", ctx);
    println!("{:>6} {:>6} {:>5} {:>14} {:>14} {:>9}", "rows", "cols", "beam", "reshape (us)", "resize (us)", "ratio");

    for &(rows, cols, beam) in &[(1, 512, 5), (8, 512, 5), (32, 1024, 12), (64, 2048, 12)] {
        let iters = 200;

        let mut m = DeviceMatrix::new(&ctx);
        m.resize(rows, cols, beam, 1).unwrap();
        let reshape_s = bench_reshape(&mut m, rows, cols, beam, iters);

        let mut m = DeviceMatrix::new(&ctx);
        let resize_s = bench_resize(&mut m, rows, cols, beam, iters);

        println!(
            "{:>6} {:>6} {:>5} {:>14.3} {:>14.3} {:>8.1}x",
            rows,
            cols,
            beam,
            reshape_s * 1e6,
            resize_s * 1e6,
            resize_s / reshape_s.max(1e-12),
        );
    }
}
