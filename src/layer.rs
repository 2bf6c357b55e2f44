use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::error::{check_len, Error, Result};

/// A fully connected layer `y = xW + b`.
///
/// Weights are stored input-major: the weight between input `j` and output `i`
/// lives at `j * output_size + i`. Both buffers are sized once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    input_size: usize,
    output_size: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl DenseLayer {
    /// He-initialized layer: every weight is `(U(0,1) - 0.5) * 2 * sqrt(2 / input_size)`,
    /// biases start at zero. Both sizes are expected to be positive.
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        let scale = (2.0 / input_size as f32).sqrt();
        let uniform = Uniform::new(0.0f32, 1.0);
        let weights = (0..input_size * output_size)
            .map(|_| (uniform.sample(rng) - 0.5) * 2.0 * scale)
            .collect();

        DenseLayer {
            input_size,
            output_size,
            weights,
            biases: vec![0.0; output_size],
        }
    }

    /// All-zero layer; use [`DenseLayer::from_parts`] when the sizes are untrusted.
    pub fn zeros(input_size: usize, output_size: usize) -> Self {
        DenseLayer {
            input_size,
            output_size,
            weights: vec![0.0; input_size * output_size],
            biases: vec![0.0; output_size],
        }
    }

    pub fn from_parts(
        input_size: usize,
        output_size: usize,
        weights: Vec<f32>,
        biases: Vec<f32>,
    ) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(Error::ShapeMismatch(format!(
                "layer dimensions must be positive, got {}x{}",
                input_size, output_size
            )));
        }
        check_len("weights", weights.len(), input_size * output_size)?;
        check_len("biases", biases.len(), output_size)?;
        Ok(DenseLayer { input_size, output_size, weights, biases })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    /// Overwrites both parameter buffers, keeping the layer's dimensions.
    pub fn set_parameters(&mut self, weights: &[f32], biases: &[f32]) -> Result<()> {
        check_len("weights", weights.len(), self.weights.len())?;
        check_len("biases", biases.len(), self.biases.len())?;
        self.weights.copy_from_slice(weights);
        self.biases.copy_from_slice(biases);
        Ok(())
    }

    /// Writes `biases[i] + sum_j input[j] * W[j][i]` into `output[i]`.
    pub fn forward_into(&self, input: &[f32], output: &mut [f32]) -> Result<()> {
        check_len("layer input", input.len(), self.input_size)?;
        check_len("layer output", output.len(), self.output_size)?;

        output.copy_from_slice(&self.biases);
        for (j, x) in input.iter().enumerate() {
            let row = &self.weights[j * self.output_size..(j + 1) * self.output_size];
            for (out, w) in output.iter_mut().zip(row) {
                *out += x * w;
            }
        }
        Ok(())
    }

    pub fn forward(&self, input: &[f32]) -> Result<Vec<f32>> {
        let mut output = vec![0.0; self.output_size];
        self.forward_into(input, &mut output)?;
        Ok(output)
    }

    /// One SGD step on this layer's parameters.
    ///
    /// When `input_grad` is given, `output_grad[i] * W[j][i]` is added into
    /// `input_grad[j]` using the weight as it was before this call's update.
    /// All lengths are checked before anything is mutated.
    pub fn backward(
        &mut self,
        input: &[f32],
        output_grad: &[f32],
        mut input_grad: Option<&mut [f32]>,
        learning_rate: f32,
    ) -> Result<()> {
        check_len("layer input", input.len(), self.input_size)?;
        check_len("output gradient", output_grad.len(), self.output_size)?;
        if let Some(grad) = input_grad.as_deref() {
            check_len("input gradient", grad.len(), self.input_size)?;
        }

        for i in 0..self.output_size {
            let g = output_grad[i];
            for j in 0..self.input_size {
                let idx = j * self.output_size + i;
                let w = self.weights[idx];
                if let Some(grad) = input_grad.as_deref_mut() {
                    grad[j] += g * w;
                }
                let grad_w = g * input[j];
                self.weights[idx] = w - learning_rate * grad_w;
            }
            self.biases[i] -= learning_rate * g;
        }
        Ok(())
    }
}
