//! Exponential smoothing of model parameters.

use kestrel_core::DeviceMatrix;
use kestrel_kernels::smooth_into;

use crate::Result;

/// Smoothing weight of the current parameters after `batches` updates.
///
/// Starts near 0.9 and decays towards `mv_decay`, so early averages follow
/// the live parameters closely.
pub fn smoothing_decay(mv_decay: f32, batches: usize) -> f32 {
    let b = batches as f32;
    mv_decay.max(1.0 - (b + 1.0) / (b + 10.0))
}

/// `avg = (1 - decay) * avg + decay * cur` with `decay = smoothing_decay(mv_decay, batches)`.
///
/// # Panics
///
/// Panics if the matrices live on different devices or differ in size.
pub fn update_avg_params(
    avg: &mut DeviceMatrix,
    cur: &DeviceMatrix,
    batches: usize,
    mv_decay: f32,
) -> Result<()> {
    assert!(
        avg.context().same_device(cur.context()),
        "averaged and current parameters must share a device"
    );
    assert_eq!(avg.size(), cur.size(), "parameter size mismatch");

    let (a, c) = match (avg.buffer().raw(), cur.buffer().raw()) {
        (Some(a), Some(c)) => (a, c),
        _ => return Ok(()),
    };
    let decay = smoothing_decay(mv_decay, batches);
    smooth_into(avg.context(), a, c, avg.size(), decay)?;
    Ok(())
}
