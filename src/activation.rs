use crate::error::{check_len, Result};

pub fn relu(values: &[f32]) -> Vec<f32> {
    values.iter().map(|&x| if x > 0.0 { x } else { 0.0 }).collect()
}

pub fn relu_in_place(values: &mut [f32]) {
    for x in values.iter_mut() {
        *x = if *x > 0.0 { *x } else { 0.0 };
    }
}

/// ReLU derivative applied to an upstream gradient: zeroes `grad[i]` wherever
/// `activations[i]` is not positive. Raw or rectified activations give the same mask.
pub fn relu_mask_in_place(grad: &mut [f32], activations: &[f32]) -> Result<()> {
    check_len("ReLU activations", activations.len(), grad.len())?;
    for (g, &a) in grad.iter_mut().zip(activations) {
        *g = if a > 0.0 { *g } else { 0.0 };
    }
    Ok(())
}

/// Numerically stable softmax: the max logit is subtracted before exponentiating.
pub fn softmax_in_place(logits: &mut [f32]) {
    if logits.is_empty() {
        return;
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let mut sum = 0.0;
    for x in logits.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    for x in logits.iter_mut() {
        *x /= sum;
    }
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let mut probs = logits.to_vec();
    softmax_in_place(&mut probs);
    probs
}
