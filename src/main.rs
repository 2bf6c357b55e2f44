use std::path::PathBuf;

use clap::{Parser, Subcommand};
use digit_mlp::helpers::render_ascii;
use digit_mlp::{Dataset, MlpClassifier, TrainConfig, IMAGE_SIZE};

const TRAIN_IMG_PATH: &str = "data/train-images.idx3-ubyte";
const TRAIN_LBL_PATH: &str = "data/train-labels.idx1-ubyte";
const MODEL_PATH: &str = "trained_network.bin";

#[derive(Parser)]
#[command(version, about = "Single hidden-layer MLP for 28x28 digit images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new network and save its parameters
    Train {
        #[arg(long, default_value = TRAIN_IMG_PATH)]
        images: PathBuf,
        #[arg(long, default_value = TRAIN_LBL_PATH)]
        labels: PathBuf,
        #[arg(long, default_value = MODEL_PATH)]
        output: PathBuf,
        #[arg(long, default_value_t = 0.001)]
        learning_rate: f32,
        #[arg(long, default_value_t = 20)]
        epochs: usize,
        #[arg(long, default_value_t = 64)]
        batch_size: usize,
        #[arg(long, default_value_t = 0.8)]
        train_split: f64,
        /// Seed for weight initialization; random when omitted
        #[arg(long)]
        seed: Option<u64>,
        /// Only use the first N examples
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Predict one example of a dataset with a saved network
    Predict {
        #[arg(long, default_value = MODEL_PATH)]
        model: PathBuf,
        #[arg(long, default_value = TRAIN_IMG_PATH)]
        images: PathBuf,
        #[arg(long, default_value = TRAIN_LBL_PATH)]
        labels: PathBuf,
        #[arg(long)]
        index: usize,
    },
    /// Accuracy of a saved network over a whole dataset
    Evaluate {
        #[arg(long, default_value = MODEL_PATH)]
        model: PathBuf,
        #[arg(long, default_value = TRAIN_IMG_PATH)]
        images: PathBuf,
        #[arg(long, default_value = TRAIN_LBL_PATH)]
        labels: PathBuf,
    },
    /// Print one example of a dataset
    Show {
        #[arg(long, default_value = TRAIN_IMG_PATH)]
        images: PathBuf,
        #[arg(long, default_value = TRAIN_LBL_PATH)]
        labels: PathBuf,
        #[arg(long)]
        index: usize,
    },
}

fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> digit_mlp::Result<()> {
    match command {
        Commands::Train {
            images,
            labels,
            output,
            learning_rate,
            epochs,
            batch_size,
            train_split,
            seed,
            limit,
        } => {
            let mut dataset = Dataset::load_from_files(&images, &labels)?;
            if let Some(limit) = limit {
                dataset.truncate(limit);
            }

            let mut net = match seed {
                Some(seed) => MlpClassifier::with_seed(seed),
                None => MlpClassifier::new(),
            };
            let config = TrainConfig { learning_rate, train_split, epochs, batch_size };
            let report = net.train_network(&dataset, &config)?;
            log::info!(
                "Trained on {} examples, held out {}",
                report.train_size,
                report.test_size
            );
            net.save_parameters(&output)
        }
        Commands::Predict { model, images, labels, index } => {
            let net = MlpClassifier::from_file(&model)?;
            let dataset = Dataset::load_from_files(&images, &labels)?;
            check_index(&dataset, index)?;

            let prediction = net.predict(&dataset.normalized(index))?;
            print!("{}", render_ascii(dataset.image(index), IMAGE_SIZE));
            println!("Label: {}", dataset.label(index));
            println!("Prediction: {}", prediction);
            Ok(())
        }
        Commands::Evaluate { model, images, labels } => {
            let net = MlpClassifier::from_file(&model)?;
            let dataset = Dataset::load_from_files(&images, &labels)?;
            let correct = net.evaluate(&dataset, 0..dataset.len())?;
            let accuracy = if dataset.is_empty() {
                0.0
            } else {
                correct as f32 / dataset.len() as f32 * 100.0
            };
            println!("Accuracy: {:.2}% ({}/{})", accuracy, correct, dataset.len());
            Ok(())
        }
        Commands::Show { images, labels, index } => {
            let dataset = Dataset::load_from_files(&images, &labels)?;
            check_index(&dataset, index)?;
            print!("{}", render_ascii(dataset.image(index), IMAGE_SIZE));
            println!("Label: {}", dataset.label(index));
            Ok(())
        }
    }
}

fn check_index(dataset: &Dataset, index: usize) -> digit_mlp::Result<()> {
    if index >= dataset.len() {
        return Err(digit_mlp::Error::InvalidConfig(format!(
            "index {} is out of range for {} examples",
            index,
            dataset.len()
        )));
    }
    Ok(())
}
