//! Shape and ownership properties of `DeviceMatrix`, checked over a grid of shapes.
//! Run with: cargo test -p kestrel-core

use std::sync::Arc;

use kestrel_core::prelude::*;
use kestrel_kernels::HostQueue;

const SHAPES: &[[usize; 4]] = &[
    [0, 0, 0, 0],
    [1, 1, 1, 1],
    [2, 3, 1, 1],
    [4, 5, 1, 2],
    [3, 7, 4, 2],
    [16, 8, 5, 3],
    [1, 512, 12, 1],
];

fn ramp(n: usize) -> Vec<f32> {
    (0..n).map(|i| i as f32 * 0.5 - 3.0).collect()
}

fn tracked() -> (Arc<HostQueue>, DeviceContext) {
    let queue = Arc::new(HostQueue::new());
    let ctx = DeviceContext::from_arc(queue.clone());
    (queue, ctx)
}

// ============================================================================
// Resize / reshape
// ============================================================================

#[test]
fn test_size_after_resize_is_product() {
    let ctx = DeviceContext::host();
    let mut m = DeviceMatrix::new(&ctx);
    for &[r, c, b, n] in SHAPES {
        m.resize(r, c, b, n).unwrap();
        assert_eq!(m.size(), r * c * b * n);
        assert_eq!(m.capacity(), m.size());
        assert_eq!(m.dims(), Dims::new(r, c, b, n));
    }
}

#[test]
fn test_reshape_to_capacity_keeps_allocation() {
    let (queue, ctx) = tracked();
    let mut m = DeviceMatrix::new(&ctx);
    m.resize(4, 6, 2, 1).unwrap();
    let handle = m.buffer().raw();

    for &[r, c, b, n] in &[[48, 1, 1, 1], [2, 6, 2, 2], [1, 1, 1, 48], [12, 4, 1, 1]] {
        m.reshape(r, c, b, n).unwrap();
        assert_eq!(m.size(), 48);
        assert_eq!(m.capacity(), 48);
        assert_eq!(m.buffer().raw(), handle);
    }
    assert_eq!(queue.live_allocations(), 1);
}

#[test]
fn test_reshape_over_capacity_is_rejected() {
    let ctx = DeviceContext::host();
    for &[r, c, b, n] in SHAPES {
        let mut m = DeviceMatrix::new(&ctx);
        m.resize(r, c, b, n).unwrap();
        let before = m.dims();
        let err = m.reshape(r + 1, c + 1, b.max(1), n.max(1)).unwrap_err();
        assert!(matches!(err, MatrixError::Capacity { .. }), "unexpected {err}");
        assert_eq!(m.dims(), before);
    }
}

#[test]
fn test_capacity_error_then_resize_retry() {
    let ctx = DeviceContext::host();
    let mut m = DeviceMatrix::with_shape(&ctx, 2, 2, true).unwrap();
    if let Err(e) = m.reshape(4, 4, 1, 1) {
        assert!(e.is_capacity());
        m.resize(4, 4, 1, 1).unwrap();
    }
    assert_eq!(m.dims(), Dims::matrix(4, 4));
}

#[test]
fn test_overflowing_shapes_are_rejected() {
    let (queue, ctx) = tracked();
    let huge = 1usize << (usize::BITS / 2);

    let mut m = DeviceMatrix::with_shape(&ctx, 2, 2, true).unwrap();
    let err = m.reshape(huge, huge, 1, 1).unwrap_err();
    assert!(err.is_capacity(), "unexpected {err}");
    assert!(matches!(err, MatrixError::Capacity { requested: usize::MAX, capacity: 4 }));
    assert_eq!(m.dims(), Dims::matrix(2, 2));
    assert_eq!(m.size(), 4);

    let mut e = DeviceMatrix::new(&ctx);
    let err = e.resize(huge, huge, 1, 1).unwrap_err();
    assert!(matches!(err, MatrixError::Device(DeviceError::Alloc { .. })), "unexpected {err}");
    assert_eq!(e.dims(), Dims::default());
    assert_eq!(e.capacity(), 0);

    assert!(DeviceMatrix::with_shape(&ctx, huge, huge, false).is_err());
    assert_eq!(queue.live_allocations(), 1);
}

#[test]
fn test_reshape_2d_is_idempotent() {
    let ctx = DeviceContext::host();
    for &[r, c, b, n] in SHAPES {
        let mut m = DeviceMatrix::new(&ctx);
        m.resize(r, c, b, n).unwrap();
        m.reshape_2d();
        assert_eq!(m.dims(), Dims::new(r * b * n, c, 1, 1));
        m.reshape_2d();
        assert_eq!(m.dims(), Dims::new(r * b * n, c, 1, 1));
        assert!(m.capacity() >= m.size());
    }
}

#[test]
fn test_resize_prefix_survives_growth() {
    let ctx = DeviceContext::host();
    let data = ramp(6);
    let mut m = DeviceMatrix::from_host(&ctx, 2, 3, &data).unwrap();
    m.resize(2, 3, 2, 1).unwrap();
    assert_eq!(&m.to_host().unwrap()[..6], data.as_slice());
}

// ============================================================================
// Transfers
// ============================================================================

#[test]
fn test_host_roundtrip() {
    let ctx = DeviceContext::host();
    for &(rows, cols) in &[(1usize, 1usize), (2, 3), (17, 9), (64, 33)] {
        let data = ramp(rows * cols);
        let m = DeviceMatrix::from_host(&ctx, rows, cols, &data).unwrap();
        assert_eq!(m.to_host().unwrap(), data);
    }
}

#[test]
fn test_set_after_reshape_writes_logical_size() {
    let ctx = DeviceContext::host();
    let mut m = DeviceMatrix::with_shape(&ctx, 4, 4, true).unwrap();
    m.reshape(2, 2, 2, 1).unwrap();
    m.set(&ramp(8)).unwrap();
    assert_eq!(m.to_host().unwrap(), ramp(8));

    m.reshape(4, 4, 1, 1).unwrap();
    let all = m.to_host().unwrap();
    assert_eq!(&all[8..], &[0.0; 8]);
}

// ============================================================================
// Ownership
// ============================================================================

#[test]
fn test_move_semantics() {
    let (queue, ctx) = tracked();
    let data = ramp(12);
    let mut src = DeviceMatrix::from_host(&ctx, 3, 4, &data).unwrap();

    let dst = src.take();
    assert_eq!(src.size(), 0);
    assert!(src.context().same_device(&ctx));
    assert_eq!(dst.size(), 12);
    assert_eq!(dst.to_host().unwrap(), data);
    assert_eq!(queue.live_allocations(), 1);

    drop(dst);
    assert_eq!(queue.live_allocations(), 0);
}

#[test]
fn test_copy_is_independent() {
    let (queue, ctx) = tracked();
    let data = ramp(10);
    let src = DeviceMatrix::from_host(&ctx, 5, 2, &data).unwrap();
    let mut copy = src.try_clone().unwrap();
    assert_eq!(copy.dims(), src.dims());
    assert_eq!(copy.to_host().unwrap(), data);
    assert_eq!(queue.live_allocations(), 2);

    copy.set(&[7.0; 10]).unwrap();
    assert_eq!(src.to_host().unwrap(), data);
}

#[test]
fn test_swap_is_involution() {
    let ctx = DeviceContext::host();
    let mut a = DeviceMatrix::from_host(&ctx, 2, 2, &ramp(4)).unwrap();
    let mut b = DeviceMatrix::new(&ctx);
    b.resize(3, 1, 2, 1).unwrap();
    b.set(&[1.0; 6]).unwrap();

    let (da, db) = (a.dims(), b.dims());
    a.swap(&mut b);
    assert_eq!((a.dims(), b.dims()), (db, da));
    a.swap(&mut b);
    assert_eq!((a.dims(), b.dims()), (da, db));
    assert_eq!(a.to_host().unwrap(), ramp(4));
    assert_eq!(b.to_host().unwrap(), vec![1.0; 6]);
}

#[test]
fn test_matrix_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<DeviceMatrix>();
}
