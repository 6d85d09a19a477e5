//! Command-line front end for the house price predictor.
//!
//! Without a subcommand the binary runs the documented example record and
//! prints the formatted price. Logs go to stderr; stdout carries results only.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use house_price_inference::{
    check_numeric, dataset, format_usd, read_csv, records_from_json, Category, CategoryPolicy,
    Evaluation, HousePricePredictor, HousingRecord, OceanProximity, PredictorConfig,
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "house-price",
    version,
    about = "Predict California median house values with a pre-trained Random Forest."
)]
pub struct Cli {
    /// TOML file with predictor settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model artifact (native forest JSON, or .onnx with the `onnx` feature)
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Preprocessing pipeline artifact
    #[arg(long, global = true)]
    pub pipeline: Option<PathBuf>,

    /// Zero-fill unknown ocean_proximity values instead of failing
    #[arg(long, global = true)]
    pub allow_unknown_category: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Predict one or more records given as JSON or as field flags
    Predict(PredictArgs),

    /// Predict every row of a CSV file
    Batch(BatchArgs),

    /// Score predictions against the median_house_value column of a CSV file
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// A JSON object or array of objects keyed by field name
    #[arg(
        long,
        conflicts_with_all = [
            "longitude",
            "latitude",
            "housing_median_age",
            "total_rooms",
            "total_bedrooms",
            "population",
            "households",
            "median_income",
            "ocean_proximity",
        ]
    )]
    pub json: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub longitude: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub latitude: Option<f64>,
    #[arg(long)]
    pub housing_median_age: Option<f64>,
    #[arg(long)]
    pub total_rooms: Option<f64>,
    #[arg(long)]
    pub total_bedrooms: Option<f64>,
    #[arg(long)]
    pub population: Option<f64>,
    #[arg(long)]
    pub households: Option<f64>,
    /// Median household income, in tens of thousands of dollars
    #[arg(long)]
    pub median_income: Option<f64>,
    /// One of: "<1H OCEAN", "INLAND", "NEAR OCEAN", "NEAR BAY", "ISLAND"
    #[arg(long)]
    pub ocean_proximity: Option<String>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// CSV file with a header row
    #[arg(long)]
    pub input: PathBuf,

    /// Write predictions here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// CSV file that includes the median_house_value column
    #[arg(long)]
    pub input: PathBuf,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config = self.predictor_config()?;
        let mut predictor =
            HousePricePredictor::load(config).context("failed to load model artifacts")?;

        match self.command {
            None => run_example(&mut predictor),
            Some(Commands::Predict(args)) => run_predict(&mut predictor, args),
            Some(Commands::Batch(args)) => run_batch(&mut predictor, args),
            Some(Commands::Evaluate(args)) => run_evaluate(&mut predictor, args),
        }
    }

    /// Defaults, then the config file, then flags.
    fn predictor_config(&self) -> Result<PredictorConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                PredictorConfig::from_toml_str(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => PredictorConfig::default(),
        };
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if let Some(pipeline) = &self.pipeline {
            config.pipeline_path = pipeline.clone();
        }
        if self.allow_unknown_category {
            config.unknown_category = CategoryPolicy::Ignore;
        }
        Ok(config)
    }
}

/// First row of the California housing dataset.
fn example_record() -> HousingRecord {
    HousingRecord::new(
        -122.23,
        37.88,
        41.0,
        880.0,
        129.0,
        322.0,
        126.0,
        8.3252,
        OceanProximity::NearBay,
    )
}

fn run_example(predictor: &mut HousePricePredictor) -> Result<()> {
    let record = example_record();
    tracing::info!(?record, "running example prediction");
    let price = predictor.predict_one(&record)?;
    println!("Predicted house price: {}", format_usd(price));
    Ok(())
}

fn run_predict(predictor: &mut HousePricePredictor, args: PredictArgs) -> Result<()> {
    let records = match &args.json {
        Some(text) => {
            let value: serde_json::Value =
                serde_json::from_str(text).context("--json is not valid JSON")?;
            records_from_json(&value)?
        }
        None => vec![record_from_flags(&args)?],
    };

    for price in predictor.predict_batch(&records)? {
        println!("{}", format_usd(price));
    }
    Ok(())
}

fn record_from_flags(args: &PredictArgs) -> Result<HousingRecord> {
    let fields = [
        ("longitude", args.longitude),
        ("latitude", args.latitude),
        ("housing_median_age", args.housing_median_age),
        ("total_rooms", args.total_rooms),
        ("total_bedrooms", args.total_bedrooms),
        ("population", args.population),
        ("households", args.households),
        ("median_income", args.median_income),
    ];
    let mut names: Vec<String> = fields
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| format!("--{}", name.replace('_', "-")))
        .collect();
    let Some(label) = args.ocean_proximity.as_deref() else {
        names.push("--ocean-proximity".to_string());
        bail!("missing required flags: {} (or pass --json)", names.join(", "));
    };
    if !names.is_empty() {
        bail!("missing required flags: {} (or pass --json)", names.join(", "));
    }

    let mut numeric = [f64::NAN; 8];
    for (slot, (name, value)) in numeric.iter_mut().zip(fields) {
        *slot = check_numeric(name, value.unwrap_or(f64::NAN))?;
    }
    Ok(HousingRecord::from_values(numeric, Category::parse_required(label)?))
}

fn open_dataset(path: &Path) -> Result<dataset::Dataset> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_csv(BufReader::new(file)).with_context(|| format!("failed to read {}", path.display()))
}

fn run_batch(predictor: &mut HousePricePredictor, args: BatchArgs) -> Result<()> {
    let data = open_dataset(&args.input)?;
    let predictions = predictor.predict_batch(&data.records)?;
    tracing::info!(rows = predictions.len(), "batch complete");

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            dataset::write_predictions(BufWriter::new(file), &predictions)?;
        }
        None => dataset::write_predictions(io::stdout().lock(), &predictions)?,
    }
    Ok(())
}

fn run_evaluate(predictor: &mut HousePricePredictor, args: EvaluateArgs) -> Result<()> {
    let data = open_dataset(&args.input)?;
    let Some(targets) = data.targets.as_deref() else {
        bail!("{} has no median_house_value column", args.input.display());
    };
    let predictions = predictor.predict_batch(&data.records)?;
    let eval = Evaluation::compute(&predictions, targets)?;

    println!("rows: {}", eval.rows);
    println!("rmse: {}", format_usd(eval.rmse));
    println!("mae:  {}", format_usd(eval.mae));
    println!("r2:   {:.4}", eval.r2);
    Ok(())
}
