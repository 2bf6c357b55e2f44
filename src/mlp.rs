use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::activation::{relu, relu_mask_in_place, softmax_in_place};
use crate::error::{check_len, Error, Result};
use crate::helpers::argmax;
use crate::layer::DenseLayer;
use crate::loss::{check_label, cross_entropy, softmax_cross_entropy_grad};
use crate::{HIDDEN_SIZE, INPUT_SIZE, OUTPUT_SIZE};

/// Intermediate values of one forward pass, kept for the backward pass.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    /// Hidden layer output before ReLU.
    pub hidden_pre: Vec<f32>,
    /// Hidden layer output after ReLU; the output layer's input.
    pub hidden: Vec<f32>,
    pub logits: [f32; OUTPUT_SIZE],
    pub probs: [f32; OUTPUT_SIZE],
}

/// 784 -> 256 (ReLU) -> 10 (softmax) digit classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpClassifier {
    hidden: DenseLayer,
    output: DenseLayer,
}

impl MlpClassifier {
    /// He-initialized network seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(&mut Pcg64::from_entropy())
    }

    /// He-initialized network; the same seed always yields the same parameters.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(&mut Pcg64::seed_from_u64(seed))
    }

    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let hidden = DenseLayer::new(INPUT_SIZE, HIDDEN_SIZE, rng);
        let output = DenseLayer::new(HIDDEN_SIZE, OUTPUT_SIZE, rng);
        MlpClassifier { hidden, output }
    }

    /// All weights and biases zero; the usual target for `load_parameters`.
    pub fn zeroed() -> Self {
        MlpClassifier {
            hidden: DenseLayer::zeros(INPUT_SIZE, HIDDEN_SIZE),
            output: DenseLayer::zeros(HIDDEN_SIZE, OUTPUT_SIZE),
        }
    }

    pub fn from_layers(hidden: DenseLayer, output: DenseLayer) -> Result<Self> {
        let dims = (
            hidden.input_size(),
            hidden.output_size(),
            output.input_size(),
            output.output_size(),
        );
        if dims != (INPUT_SIZE, HIDDEN_SIZE, HIDDEN_SIZE, OUTPUT_SIZE) {
            return Err(Error::ShapeMismatch(format!(
                "layers are {}x{} and {}x{} (expected {}x{} and {}x{})",
                dims.0, dims.1, dims.2, dims.3, INPUT_SIZE, HIDDEN_SIZE, HIDDEN_SIZE, OUTPUT_SIZE
            )));
        }
        Ok(MlpClassifier { hidden, output })
    }

    pub fn hidden_layer(&self) -> &DenseLayer {
        &self.hidden
    }

    pub fn output_layer(&self) -> &DenseLayer {
        &self.output
    }

    pub(crate) fn layers_mut(&mut self) -> (&mut DenseLayer, &mut DenseLayer) {
        (&mut self.hidden, &mut self.output)
    }

    pub fn forward(&self, input: &[f32]) -> Result<ForwardPass> {
        check_len("network input", input.len(), INPUT_SIZE)?;

        let hidden_pre = self.hidden.forward(input)?;
        let hidden = relu(&hidden_pre);

        let mut logits = [0.0; OUTPUT_SIZE];
        self.output.forward_into(&hidden, &mut logits)?;
        let mut probs = logits;
        softmax_in_place(&mut probs);

        Ok(ForwardPass { hidden_pre, hidden, logits, probs })
    }

    /// Class probabilities for one normalized image.
    pub fn predict_proba(&self, input: &[f32]) -> Result<[f32; OUTPUT_SIZE]> {
        Ok(self.forward(input)?.probs)
    }

    /// Most probable class in `[0, OUTPUT_SIZE)`; ties go to the lower index.
    pub fn predict(&self, input: &[f32]) -> Result<usize> {
        Ok(argmax(&self.predict_proba(input)?))
    }

    /// Cross-entropy of `label` under the current parameters.
    pub fn loss(&self, input: &[f32], label: usize) -> Result<f32> {
        check_label(label, OUTPUT_SIZE)?;
        cross_entropy(&self.predict_proba(input)?, label)
    }

    /// One online SGD step on a single example. Both layers are updated in place.
    pub fn train_single(&mut self, input: &[f32], label: usize, learning_rate: f32) -> Result<()> {
        check_label(label, OUTPUT_SIZE)?;
        let pass = self.forward(input)?;

        let mut output_grad = [0.0; OUTPUT_SIZE];
        softmax_cross_entropy_grad(&pass.probs, label, &mut output_grad)?;

        let mut hidden_grad = [0.0; HIDDEN_SIZE];
        self.output
            .backward(&pass.hidden, &output_grad, Some(&mut hidden_grad[..]), learning_rate)?;

        relu_mask_in_place(&mut hidden_grad, &pass.hidden_pre)?;

        // input boundary: no gradient to propagate further
        self.hidden.backward(input, &hidden_grad, None, learning_rate)
    }
}

impl Default for MlpClassifier {
    fn default() -> Self {
        Self::new()
    }
}
