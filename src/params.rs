//! Fixed-layout parameter files.
//!
//! A file is `PARAM_COUNT` native-endian `f32` values with no header or padding:
//! hidden weights (784 x 256, input-major), hidden biases (256),
//! output weights (256 x 10, input-major), output biases (10).

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::mlp::MlpClassifier;
use crate::{HIDDEN_SIZE, INPUT_SIZE, OUTPUT_SIZE, PARAM_BYTES, PARAM_COUNT};

impl MlpClassifier {
    /// Serializes every parameter in file order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(PARAM_BYTES);
        let hidden = self.hidden_layer();
        let output = self.output_layer();
        for section in [hidden.weights(), hidden.biases(), output.weights(), output.biases()] {
            for value in section {
                bytes.extend_from_slice(&value.to_ne_bytes());
            }
        }
        bytes
    }

    /// Replaces every parameter from an exactly `PARAM_BYTES` long buffer.
    /// Nothing is modified unless the whole buffer is valid.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() != PARAM_BYTES {
            return Err(Error::ShapeMismatch(format!(
                "parameter data is {} bytes (expected {})",
                bytes.len(),
                PARAM_BYTES
            )));
        }

        let values: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        debug_assert_eq!(values.len(), PARAM_COUNT);

        let (hidden_w, rest) = values.split_at(INPUT_SIZE * HIDDEN_SIZE);
        let (hidden_b, rest) = rest.split_at(HIDDEN_SIZE);
        let (output_w, output_b) = rest.split_at(HIDDEN_SIZE * OUTPUT_SIZE);

        let (hidden, output) = self.layers_mut();
        hidden.set_parameters(hidden_w, hidden_b)?;
        output.set_parameters(output_w, output_b)
    }

    pub fn save_parameters(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes()).map_err(|e| Error::io(path, e))?;
        log::info!("Saved parameters to {}", path.display());
        Ok(())
    }

    pub fn load_parameters(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;

        // one byte past the expected size is enough to detect oversized files
        let mut bytes = Vec::with_capacity(PARAM_BYTES + 1);
        file.take(PARAM_BYTES as u64 + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| Error::io(path, e))?;

        self.load_bytes(&bytes)?;
        log::info!("Loaded parameters from {}", path.display());
        Ok(())
    }

    /// Builds a network straight from a parameter file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut net = MlpClassifier::zeroed();
        net.load_parameters(path)?;
        Ok(net)
    }
}
