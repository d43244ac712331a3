//! Convolutional genre network (candle)
//!
//! Inference-only port of the pre-trained GTZAN MFCC classifier: three
//! conv / max-pool / batch-norm blocks, a 64-unit dense layer and a
//! 10-way softmax. Weights come from a safetensors file.

use super::traits::GenreModel;
use crate::error::ClassifyError;
use crate::model::GENRE_COUNT;
use anyhow::{Context, Result};
use candle::{DType, Device, Module, Tensor, D};
use candle_nn::{batch_norm, conv2d, linear, BatchNorm, Conv2d, Conv2dConfig, Linear, VarBuilder};
use ndarray::Array2;
use std::path::Path;

const FILTERS: usize = 32;
const DENSE_UNITS: usize = 64;
const BATCH_NORM_EPS: f64 = 1e-3;

/// Layout of one conv block: kernel, pool window, pool stride
const BLOCKS: [(usize, usize, usize); 3] = [(3, 3, 2), (3, 3, 2), (2, 2, 2)];

/// Conv (valid) -> ReLU -> max-pool (same) -> batch-norm
struct ConvBlock {
    conv: Conv2d,
    bn: BatchNorm,
    pool: usize,
    stride: usize,
}

impl ConvBlock {
    fn new(
        in_channels: usize,
        kernel: usize,
        pool: usize,
        stride: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        let conv = conv2d(
            in_channels,
            FILTERS,
            kernel,
            Conv2dConfig::default(),
            vb.pp("conv"),
        )?;
        let bn = batch_norm(FILTERS, BATCH_NORM_EPS, vb.pp("bn"))?;
        Ok(Self {
            conv,
            bn,
            pool,
            stride,
        })
    }

    fn forward(&self, xs: &Tensor) -> candle::Result<Tensor> {
        let xs = xs.apply(&self.conv)?.relu()?;
        // Zero padding is neutral for the max because ReLU output is >= 0
        let (_, _, h, w) = xs.dims4()?;
        let (top, bottom) = same_padding(h, self.pool, self.stride);
        let (left, right) = same_padding(w, self.pool, self.stride);
        let xs = xs
            .pad_with_zeros(2, top, bottom)?
            .pad_with_zeros(3, left, right)?
            .max_pool2d_with_stride(self.pool, self.stride)?;
        xs.apply_t(&self.bn, false)
    }
}

/// Padding (before, after) for a "same" pooling window
fn same_padding(len: usize, window: usize, stride: usize) -> (usize, usize) {
    let out = len.div_ceil(stride);
    let total = ((out.max(1) - 1) * stride + window).saturating_sub(len);
    (total / 2, total - total / 2)
}

/// Spatial size after all conv blocks, or `None` if the input is too small
fn output_size(frames: usize, coeffs: usize) -> Option<(usize, usize)> {
    BLOCKS
        .iter()
        .try_fold((frames, coeffs), |(h, w), &(kernel, _, stride)| {
            if h < kernel || w < kernel {
                return None;
            }
            let (h, w) = (h - kernel + 1, w - kernel + 1);
            Some((h.div_ceil(stride), w.div_ceil(stride)))
        })
}

/// Pre-trained genre CNN
pub struct GenreCnn {
    blocks: Vec<ConvBlock>,
    dense: Linear,
    output: Linear,
    input_shape: (usize, usize),
    device: Device,
}

impl GenreCnn {
    /// Build the network for inputs shaped (frames, coeffs)
    ///
    /// Expected tensor names: `block{1,2,3}.conv.{weight,bias}`,
    /// `block{1,2,3}.bn.{weight,bias,running_mean,running_var}`,
    /// `dense.{weight,bias}`, `output.{weight,bias}`.
    pub fn new(vb: VarBuilder, input_shape: (usize, usize)) -> Result<Self> {
        let (frames, coeffs) = input_shape;
        let (h, w) = output_size(frames, coeffs).with_context(|| {
            format!("Input shape {:?} is too small for the network", input_shape)
        })?;

        let mut blocks = Vec::with_capacity(BLOCKS.len());
        let mut in_channels = 1;
        for (i, &(kernel, pool, stride)) in BLOCKS.iter().enumerate() {
            blocks.push(ConvBlock::new(
                in_channels,
                kernel,
                pool,
                stride,
                vb.pp(format!("block{}", i + 1)),
            )?);
            in_channels = FILTERS;
        }

        let dense = linear(h * w * FILTERS, DENSE_UNITS, vb.pp("dense"))?;
        let output = linear(DENSE_UNITS, GENRE_COUNT, vb.pp("output"))?;

        Ok(Self {
            blocks,
            dense,
            output,
            input_shape,
            device: vb.device().clone(),
        })
    }

    /// Load weights from a safetensors file onto the CPU
    pub fn load(path: &Path, input_shape: (usize, usize)) -> Result<Self> {
        log::info!("Loading model from {:?}", path);
        let device = Device::Cpu;
        let tensors = candle::safetensors::load(path, &device)
            .with_context(|| format!("Failed to load model weights: {:?}", path))?;
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
        Self::new(vb, input_shape).with_context(|| format!("Invalid model file: {:?}", path))
    }

    pub fn input_shape(&self) -> (usize, usize) {
        self.input_shape
    }

    /// Softmax output for a (batch, 1, frames, coeffs) tensor
    fn forward(&self, xs: &Tensor) -> candle::Result<Tensor> {
        let mut xs = xs.clone();
        for block in &self.blocks {
            xs = block.forward(&xs)?;
        }
        // Flatten channels-last so dense weights keep their exported order
        let xs = xs.permute((0, 2, 3, 1))?.contiguous()?.flatten_from(1)?;
        let xs = self.dense.forward(&xs)?.relu()?;
        let logits = self.output.forward(&xs)?;
        candle_nn::ops::softmax(&logits, D::Minus1)
    }

    fn to_input(&self, segments: &[Array2<f32>]) -> Result<Tensor> {
        let (frames, coeffs) = self.input_shape;
        let mut data = Vec::with_capacity(segments.len() * frames * coeffs);
        for segment in segments {
            if segment.dim() != self.input_shape {
                return Err(ClassifyError::FeatureShape {
                    expected: self.input_shape,
                    actual: segment.dim(),
                }
                .into());
            }
            data.extend(segment.iter().copied());
        }
        Ok(Tensor::from_vec(
            data,
            (segments.len(), 1, frames, coeffs),
            &self.device,
        )?)
    }
}

impl GenreModel for GenreCnn {
    fn predict(&self, features: &Array2<f32>) -> Result<Vec<f32>> {
        let mut batch = self.predict_batch(std::slice::from_ref(features))?;
        Ok(batch.remove(0))
    }

    fn predict_batch(&self, segments: &[Array2<f32>]) -> Result<Vec<Vec<f32>>> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }
        let input = self.to_input(segments)?;
        let probabilities = self.forward(&input).context("Model forward pass failed")?;
        Ok(probabilities.to_vec2::<f32>()?)
    }
}
