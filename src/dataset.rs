use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{Error, Result};
use crate::helpers::normalize_pixels;
use crate::{IMAGE_SIZE, INPUT_SIZE, OUTPUT_SIZE};

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

/// Labeled grayscale digits stored as two flat buffers.
///
/// Example `i` occupies `images[i * INPUT_SIZE..(i + 1) * INPUT_SIZE]` and `labels[i]`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    images: Vec<u8>,
    labels: Vec<u8>,
}

impl Dataset {
    pub fn from_parts(images: Vec<u8>, labels: Vec<u8>) -> Result<Self> {
        if images.len() != labels.len() * INPUT_SIZE {
            return Err(Error::InvalidData(format!(
                "{} pixel bytes do not match {} labels of {} pixels each",
                images.len(),
                labels.len(),
                INPUT_SIZE
            )));
        }
        if let Some(i) = labels.iter().position(|&l| l as usize >= OUTPUT_SIZE) {
            return Err(Error::InvalidData(format!(
                "label {} at index {} is not a digit",
                labels[i], i
            )));
        }
        Ok(Dataset { images, labels })
    }

    /// Reads an IDX image file and its IDX label file. Paths ending in `.gz` are decompressed.
    pub fn load_from_files(images_path: impl AsRef<Path>, labels_path: impl AsRef<Path>) -> Result<Self> {
        let images_path = images_path.as_ref();
        let labels_path = labels_path.as_ref();

        let images = Self::load_images(images_path)?;
        let labels = Self::load_labels(labels_path)?;

        log::info!("Read {} images from {}", images.len() / INPUT_SIZE, images_path.display());
        log::info!("Read {} labels from {}", labels.len(), labels_path.display());

        Self::from_parts(images, labels)
    }

    pub fn load_images(path: &Path) -> Result<Vec<u8>> {
        let mut reader = open_idx(path)?;

        let magic = read_u32(&mut reader, path)?;
        if magic != IMAGES_MAGIC {
            return Err(Error::InvalidData(format!(
                "invalid magic number for images: {} (expected {})",
                magic, IMAGES_MAGIC
            )));
        }
        let num_images = read_u32(&mut reader, path)?;
        let rows = read_u32(&mut reader, path)? as usize;
        let cols = read_u32(&mut reader, path)? as usize;
        if rows != IMAGE_SIZE || cols != IMAGE_SIZE {
            return Err(Error::InvalidData(format!(
                "images are {}x{} (expected {}x{})",
                rows, cols, IMAGE_SIZE, IMAGE_SIZE
            )));
        }

        read_payload(&mut reader, num_images as u64 * INPUT_SIZE as u64, path)
    }

    pub fn load_labels(path: &Path) -> Result<Vec<u8>> {
        let mut reader = open_idx(path)?;

        let magic = read_u32(&mut reader, path)?;
        if magic != LABELS_MAGIC {
            return Err(Error::InvalidData(format!(
                "invalid magic number for labels: {} (expected {})",
                magic, LABELS_MAGIC
            )));
        }
        let num_labels = read_u32(&mut reader, path)?;

        read_payload(&mut reader, num_labels as u64, path)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn images(&self) -> &[u8] {
        &self.images
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Raw pixels of example `index`.
    pub fn image(&self, index: usize) -> &[u8] {
        let offset = index * INPUT_SIZE;
        &self.images[offset..offset + INPUT_SIZE]
    }

    pub fn label(&self, index: usize) -> usize {
        self.labels[index] as usize
    }

    /// Pixels of example `index` scaled to `[0, 1]`.
    pub fn normalized(&self, index: usize) -> Vec<f32> {
        normalize_pixels(self.image(index))
    }

    /// Keeps only the first `len` examples.
    pub fn truncate(&mut self, len: usize) {
        self.labels.truncate(len);
        self.images.truncate(self.labels.len() * INPUT_SIZE);
    }
}

fn open_idx(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

fn read_u32(reader: &mut dyn Read, path: &Path) -> Result<u32> {
    let mut bytes = [0u8; 4];
    read_exact(reader, &mut bytes, path)?;
    Ok(u32::from_be_bytes(bytes))
}

/// Reads exactly `len` bytes. The buffer only grows as data arrives, so a header
/// claiming more examples than the file holds fails as truncated.
fn read_payload(reader: &mut dyn Read, len: u64, path: &Path) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader
        .take(len)
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(path, e))?;
    if (bytes.len() as u64) < len {
        return Err(Error::InvalidData(format!("{} is truncated", path.display())));
    }
    Ok(bytes)
}

fn read_exact(reader: &mut dyn Read, buf: &mut [u8], path: &Path) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::InvalidData(format!("{} is truncated", path.display()))
        } else {
            Error::io(path, e)
        }
    })
}
