use digit_mlp::{Dataset, Error, MlpClassifier, TrainConfig, INPUT_SIZE};

#[cfg(test)]
mod train_tests {
    use super::*;

    // Class c lights every pixel except the c-th band of 79 pixels.
    fn synthetic_dataset(count: usize) -> Dataset {
        let mut images = Vec::with_capacity(count * INPUT_SIZE);
        let mut labels = Vec::with_capacity(count);
        for i in 0..count {
            let class = i % 10;
            images.extend((0..INPUT_SIZE).map(|j| if j / 79 == class { 0u8 } else { 255u8 }));
            labels.push(class as u8);
        }
        Dataset::from_parts(images, labels).unwrap()
    }

    fn config(epochs: usize, batch_size: usize) -> TrainConfig {
        TrainConfig {
            learning_rate: 0.001,
            train_split: 0.8,
            epochs,
            batch_size,
        }
    }

    #[test]
    fn test_default_config() {
        let config = TrainConfig::default();
        assert_eq!(config.learning_rate, 0.001);
        assert_eq!(config.train_split, 0.8);
        assert_eq!(config.epochs, 20);
        assert_eq!(config.batch_size, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_one_epoch_end_to_end() {
        let dataset = synthetic_dataset(100);
        let mut net = MlpClassifier::with_seed(42);

        let initial_loss = net.mean_loss(&dataset, 0..80).unwrap();
        let report = net.train_network(&dataset, &config(1, 10)).unwrap();

        assert_eq!(report.train_size, 80);
        assert_eq!(report.test_size, 20);
        assert_eq!(report.epochs.len(), 1);

        let epoch = report.last().unwrap();
        assert_eq!(epoch.epoch, 0);
        let accuracy = epoch.accuracy.unwrap();
        assert!(accuracy > 10.0, "accuracy {}", accuracy);
        assert!(accuracy <= 100.0);
        assert!(epoch.avg_loss.is_finite());
        assert!(epoch.avg_loss > 0.0);
        assert!(epoch.avg_loss < initial_loss, "{} vs {}", epoch.avg_loss, initial_loss);
    }

    #[test]
    fn test_accuracy_matches_evaluate() {
        let dataset = synthetic_dataset(50);
        let mut net = MlpClassifier::with_seed(8);
        let report = net.train_network(&dataset, &config(2, 5)).unwrap();

        let correct = net.evaluate(&dataset, 40..50).unwrap();
        let accuracy = report.last().unwrap().accuracy.unwrap();
        assert!((accuracy - correct as f32 * 10.0).abs() < 1e-4);

        let manual = (40..50)
            .filter(|&i| net.predict(&dataset.normalized(i)).unwrap() == dataset.label(i))
            .count();
        assert_eq!(correct, manual);
    }

    #[test]
    fn test_batch_size_only_groups_examples() {
        let dataset = synthetic_dataset(30);
        let mut reports = Vec::new();
        let mut nets = Vec::new();

        for batch_size in [1, 7, 24, 100] {
            let mut net = MlpClassifier::with_seed(5);
            reports.push(net.train_network(&dataset, &config(1, batch_size)).unwrap());
            nets.push(net);
        }

        for (net, report) in nets.iter().zip(&reports).skip(1) {
            assert_eq!(net, &nets[0]);
            assert_eq!(report, &reports[0]);
        }
    }

    #[test]
    fn test_matches_manual_online_sgd() {
        let dataset = synthetic_dataset(20);
        let mut driven = MlpClassifier::with_seed(17);
        let mut manual = driven.clone();

        driven.train_network(&dataset, &config(1, 4)).unwrap();
        for i in 0..16 {
            manual.train_single(&dataset.normalized(i), dataset.label(i), 0.001).unwrap();
        }
        assert_eq!(driven, manual);
    }

    #[test]
    fn test_multiple_epochs_reported() {
        let dataset = synthetic_dataset(20);
        let mut net = MlpClassifier::with_seed(3);
        let report = net.train_network(&dataset, &config(3, 8)).unwrap();

        let indices: Vec<usize> = report.epochs.iter().map(|e| e.epoch).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(report.epochs[2].avg_loss < report.epochs[0].avg_loss);
    }

    #[test]
    fn test_zero_epochs_leaves_network_unchanged() {
        let dataset = synthetic_dataset(10);
        let mut net = MlpClassifier::with_seed(1);
        let report = net.train_network(&dataset, &config(0, 4)).unwrap();
        assert!(report.epochs.is_empty());
        assert_eq!(net, MlpClassifier::with_seed(1));
    }

    #[test]
    fn test_no_held_out_examples() {
        let dataset = synthetic_dataset(10);
        let mut net = MlpClassifier::with_seed(2);
        let mut config = config(1, 4);
        config.train_split = 1.0;

        let report = net.train_network(&dataset, &config).unwrap();
        assert_eq!(report.test_size, 0);
        assert_eq!(report.last().unwrap().accuracy, None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dataset = synthetic_dataset(10);
        let mut net = MlpClassifier::with_seed(2);
        let original = net.clone();

        let bad_configs = [
            TrainConfig { batch_size: 0, ..config(1, 4) },
            TrainConfig { train_split: 1.5, ..config(1, 4) },
            TrainConfig { train_split: -0.1, ..config(1, 4) },
            TrainConfig { train_split: f64::NAN, ..config(1, 4) },
            TrainConfig { learning_rate: 0.0, ..config(1, 4) },
            TrainConfig { learning_rate: f32::INFINITY, ..config(1, 4) },
            TrainConfig { train_split: 0.05, ..config(1, 4) },
        ];
        for bad in bad_configs {
            let err = net.train_network(&dataset, &bad).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)), "{:?}", bad);
        }
        assert_eq!(net, original);
    }

    #[test]
    fn test_evaluate_range_checked() {
        let dataset = synthetic_dataset(10);
        let net = MlpClassifier::with_seed(2);
        assert!(matches!(net.evaluate(&dataset, 5..11), Err(Error::ShapeMismatch(_))));
        assert_eq!(net.evaluate(&dataset, 4..4).unwrap(), 0);
        assert_eq!(net.mean_loss(&dataset, 4..4).unwrap(), 0.0);
    }
}
