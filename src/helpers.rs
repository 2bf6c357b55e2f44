/// Maps raw grayscale bytes to `[0, 1]` floats (`b / 255`).
pub fn normalize_pixels(pixels: &[u8]) -> Vec<f32> {
    pixels.iter().map(|&p| p as f32 / 255.0).collect()
}

/// Index of the largest value; ties go to the lowest index. Returns 0 for an empty slice.
pub fn argmax(values: &[f32]) -> usize {
    let mut max_idx = 0;
    for (i, &val) in values.iter().enumerate().skip(1) {
        if val > values[max_idx] {
            max_idx = i;
        }
    }
    max_idx
}

/// Number of leading examples used for training: `floor(num_examples * fraction)`.
pub fn train_split(num_examples: usize, fraction: f64) -> usize {
    let train_size = (num_examples as f64 * fraction).floor() as usize;
    train_size.min(num_examples)
}

const ASCII_RAMP: &[u8] = b" .:-=+*#%@";

/// Text rendering of a square grayscale image, one line per row.
pub fn render_ascii(pixels: &[u8], width: usize) -> String {
    let mut out = String::with_capacity(pixels.len() + pixels.len() / width.max(1));
    for row in pixels.chunks(width.max(1)) {
        for &p in row {
            let level = p as usize * (ASCII_RAMP.len() - 1) / 255;
            out.push(ASCII_RAMP[level] as char);
        }
        out.push('\n');
    }
    out
}
