//! Free kernel functions over raw device handles.
//!
//! All of these block until the device work and any readback complete.

use crate::context::{DeviceContext, DevicePtr};
use crate::Result;

/// Sum of the first `count` elements at `ptr`.
pub fn sum_float(ctx: &DeviceContext, ptr: DevicePtr, count: usize) -> Result<f32> {
    if count == 0 {
        return Ok(0.0);
    }
    ctx.queue().sum(ptr, count)
}

/// Read back `count` elements at `ptr` and format them as `[a, b, ...]`.
pub fn output_array(ctx: &DeviceContext, ptr: DevicePtr, count: usize) -> Result<String> {
    let mut host = vec![0.0f32; count];
    if count > 0 {
        ctx.queue().read(ptr, 0, &mut host)?;
    }
    let items: Vec<String> = host.iter().map(|v| v.to_string()).collect();
    Ok(format!("[{}]", items.join(", ")))
}

/// Exponential smoothing: `avg = (1 - decay) * avg + decay * cur` over `count` elements.
pub fn smooth_into(
    ctx: &DeviceContext,
    avg: DevicePtr,
    cur: DevicePtr,
    count: usize,
    decay: f32,
) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    let queue = ctx.queue();
    let mut acc = vec![0.0f32; count];
    let mut next = vec![0.0f32; count];
    queue.read(avg, 0, &mut acc)?;
    queue.read(cur, 0, &mut next)?;
    for (a, &c) in acc.iter_mut().zip(next.iter()) {
        *a = (1.0 - decay) * *a + decay * c;
    }
    queue.write(avg, 0, &acc)
}
