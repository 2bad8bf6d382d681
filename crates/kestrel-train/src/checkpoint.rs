//! Parameter checkpoints in the safetensors format.
//!
//! The flat parameter matrix is stored as a single F32 tensor whose shape
//! is `[rows, cols, beam, batches]`.

use std::path::Path;

use kestrel_core::{DeviceContext, DeviceMatrix, Dims};
use safetensors::tensor::{serialize, TensorView};
use safetensors::{Dtype, SafeTensors};

use crate::{Result, TrainError};

/// Read `params` back from the device and write them to `path` under `name`.
pub fn save_params(params: &DeviceMatrix, name: &str, path: &Path) -> Result<()> {
    let host = params.to_host()?;
    let bytes: Vec<u8> = host.iter().flat_map(|v| v.to_le_bytes()).collect();
    let shape = params.dims().as_array().to_vec();

    let view = TensorView::new(Dtype::F32, shape, &bytes)
        .map_err(|e| TrainError::Checkpoint(format!("safetensors view error: {}", e)))?;
    let serialized = serialize(vec![(name, view)], &None)
        .map_err(|e| TrainError::Checkpoint(format!("safetensors serialize error: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, &serialized)?;
    Ok(())
}

/// Load the tensor `name` from `path` into a new matrix on `ctx`.
///
/// Rank-4 tensors keep their full shape; rank-2 tensors become plain
/// matrices; rank-1 tensors become a single row.
pub fn load_params(ctx: &DeviceContext, name: &str, path: &Path) -> Result<DeviceMatrix> {
    let data = std::fs::read(path)?;
    let tensors = SafeTensors::deserialize(&data)
        .map_err(|e| TrainError::Checkpoint(format!("safetensors parse error: {}", e)))?;
    let view = tensors
        .tensor(name)
        .map_err(|e| TrainError::Checkpoint(format!("tensor '{}': {}", name, e)))?;

    if view.dtype() != Dtype::F32 {
        return Err(TrainError::Checkpoint(format!(
            "tensor '{}' has dtype {:?}, expected F32",
            name,
            view.dtype()
        )));
    }

    let dims = Dims::from(match *view.shape() {
        [r, c, b, n] => [r, c, b, n],
        [r, c] => [r, c, 1, 1],
        [c] => [1, c, 1, 1],
        ref other => {
            return Err(TrainError::Checkpoint(format!(
                "tensor '{}' has unsupported rank {}",
                name,
                other.len()
            )))
        }
    });

    let values: Vec<f32> = view
        .data()
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    if dims.checked_size() != Some(values.len()) {
        return Err(TrainError::Checkpoint(format!(
            "tensor '{}' has {} values, which does not match shape {}",
            name,
            values.len(),
            dims
        )));
    }

    let flat = dims.flatten_2d();
    let mut params = DeviceMatrix::from_host(ctx, flat.rows, flat.cols, &values)?;
    params.reshape(dims.rows, dims.cols, dims.beam, dims.batches)?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_roundtrip() {
        let ctx = DeviceContext::host();
        let mut params = DeviceMatrix::new(&ctx);
        params.resize(2, 3, 1, 2).unwrap();
        let data: Vec<f32> = (0..12).map(|i| i as f32 * 0.25).collect();
        params.set(&data).unwrap();

        let path = std::env::temp_dir().join("kestrel_test_checkpoint.safetensors");
        save_params(&params, "params", &path).unwrap();
        assert!(path.exists());

        let loaded = load_params(&ctx, "params", &path).unwrap();
        assert_eq!(loaded.dims(), Dims::new(2, 3, 1, 2));
        assert_eq!(loaded.to_host().unwrap(), data);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_tensor() {
        let ctx = DeviceContext::host();
        let params = DeviceMatrix::from_host(&ctx, 1, 2, &[1.0, 2.0]).unwrap();
        let path = std::env::temp_dir().join("kestrel_test_checkpoint_missing.safetensors");
        save_params(&params, "params", &path).unwrap();

        let err = load_params(&ctx, "other", &path).unwrap_err();
        assert!(matches!(err, TrainError::Checkpoint(_)));

        let _ = std::fs::remove_file(&path);
    }
}
