use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use digit_mlp::{Dataset, Error, INPUT_SIZE};
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::tempdir;

#[cfg(test)]
mod dataset_tests {
    use super::*;

    fn idx_images(count: usize, rows: u32, cols: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2051u32.to_be_bytes());
        bytes.extend_from_slice(&(count as u32).to_be_bytes());
        bytes.extend_from_slice(&rows.to_be_bytes());
        bytes.extend_from_slice(&cols.to_be_bytes());
        for i in 0..count * rows as usize * cols as usize {
            bytes.push((i % 256) as u8);
        }
        bytes
    }

    fn idx_labels(labels: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2049u32.to_be_bytes());
        bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        bytes.extend_from_slice(labels);
        bytes
    }

    fn write_gz(path: &Path, bytes: &[u8]) {
        let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_load_plain_files() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("images.idx3-ubyte");
        let labels = dir.path().join("labels.idx1-ubyte");
        fs::write(&images, idx_images(3, 28, 28)).unwrap();
        fs::write(&labels, idx_labels(&[7, 0, 9])).unwrap();

        let dataset = Dataset::load_from_files(&images, &labels).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.images().len(), 3 * INPUT_SIZE);
        assert_eq!(dataset.label(0), 7);
        assert_eq!(dataset.label(2), 9);
        assert_eq!(dataset.image(1)[0], (INPUT_SIZE % 256) as u8);

        let normalized = dataset.normalized(0);
        assert_eq!(normalized.len(), INPUT_SIZE);
        assert_eq!(normalized[0], 0.0);
        assert_eq!(normalized[255], 1.0);
    }

    #[test]
    fn test_load_gzip_files() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("images.idx3-ubyte.gz");
        let labels = dir.path().join("labels.idx1-ubyte.gz");
        write_gz(&images, &idx_images(2, 28, 28));
        write_gz(&labels, &idx_labels(&[1, 2]));

        let dataset = Dataset::load_from_files(&images, &labels).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.labels(), &[1, 2]);
        assert_eq!(dataset.image(0)[10], 10);
    }

    #[test]
    fn test_bad_magic() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");
        fs::write(&images, idx_labels(&[1, 2])).unwrap();
        fs::write(&labels, idx_labels(&[1, 2])).unwrap();

        let err = Dataset::load_from_files(&images, &labels).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_wrong_image_size() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");
        fs::write(&images, idx_images(1, 32, 32)).unwrap();
        fs::write(&labels, idx_labels(&[1])).unwrap();

        assert!(matches!(
            Dataset::load_from_files(&images, &labels),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_count_mismatch() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");
        fs::write(&images, idx_images(2, 28, 28)).unwrap();
        fs::write(&labels, idx_labels(&[1, 2, 3])).unwrap();

        assert!(matches!(
            Dataset::load_from_files(&images, &labels),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_truncated_file() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");
        let mut bytes = idx_images(2, 28, 28);
        bytes.truncate(bytes.len() - 100);
        fs::write(&images, bytes).unwrap();
        fs::write(&labels, idx_labels(&[1, 2])).unwrap();

        assert!(matches!(
            Dataset::load_from_files(&images, &labels),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_header_count_larger_than_file() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");

        let mut header = Vec::new();
        for value in [2051u32, u32::MAX, 28, 28] {
            header.extend_from_slice(&value.to_be_bytes());
        }
        fs::write(&images, &header).unwrap();
        fs::write(&labels, idx_labels(&[1])).unwrap();
        assert!(matches!(
            Dataset::load_from_files(&images, &labels),
            Err(Error::InvalidData(_))
        ));

        let mut label_header = Vec::new();
        label_header.extend_from_slice(&2049u32.to_be_bytes());
        label_header.extend_from_slice(&u32::MAX.to_be_bytes());
        label_header.push(3);
        fs::write(&images, idx_images(1, 28, 28)).unwrap();
        fs::write(&labels, &label_header).unwrap();
        assert!(matches!(
            Dataset::load_from_files(&images, &labels),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let images = dir.path().join("nope");
        let err = Dataset::load_from_files(&images, dir.path().join("labels")).unwrap_err();
        match err {
            Error::Io { path, .. } => assert_eq!(path, images),
            other => panic!("expected IO error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_parts_validation() {
        assert!(Dataset::from_parts(vec![0; INPUT_SIZE * 2], vec![1, 2]).is_ok());
        assert!(matches!(
            Dataset::from_parts(vec![0; INPUT_SIZE], vec![1, 2]),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            Dataset::from_parts(vec![0; INPUT_SIZE], vec![10]),
            Err(Error::InvalidData(_))
        ));

        let empty = Dataset::from_parts(Vec::new(), Vec::new()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_truncate() {
        let mut dataset = Dataset::from_parts(vec![5; INPUT_SIZE * 4], vec![0, 1, 2, 3]).unwrap();
        dataset.truncate(2);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.images().len(), 2 * INPUT_SIZE);

        dataset.truncate(10);
        assert_eq!(dataset.len(), 2);
    }
}
