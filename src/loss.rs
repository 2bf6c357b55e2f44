use crate::error::{check_len, Error, Result};

/// Added to the true-class probability before taking the log.
pub const LOSS_EPSILON: f32 = 1e-10;

/// Cross-entropy of one example given softmax output `probs`.
pub fn cross_entropy(probs: &[f32], label: usize) -> Result<f32> {
    check_label(label, probs.len())?;
    Ok(-(probs[label] + LOSS_EPSILON).ln())
}

/// Gradient of the combined softmax + cross-entropy loss with respect to the
/// logits: `probs - one_hot(label)`, written into `grad`.
pub fn softmax_cross_entropy_grad(probs: &[f32], label: usize, grad: &mut [f32]) -> Result<()> {
    check_label(label, probs.len())?;
    check_len("output gradient", grad.len(), probs.len())?;
    for (i, (g, &p)) in grad.iter_mut().zip(probs).enumerate() {
        *g = if i == label { p - 1.0 } else { p };
    }
    Ok(())
}

pub(crate) fn check_label(label: usize, classes: usize) -> Result<()> {
    if label >= classes {
        return Err(Error::ShapeMismatch(format!(
            "label {} is outside [0, {})",
            label, classes
        )));
    }
    Ok(())
}
