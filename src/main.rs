use anyhow::Result;
use clap::{Parser, Subcommand};
use hasheval::dataset::Dataset;
use hasheval::eval::fixture::{reference_fixture, reference_map, REFERENCE_AP, REFERENCE_TOP_K};
use hasheval::eval::{per_query_average_precision, EvalReport, Evaluator};
use hasheval::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hasheval")]
#[command(about = "Score binary hash codes by Hamming-ranked mean average precision")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a gallery/query dataset file
    Eval {
        /// Path to dataset JSON (gallery + query embeddings and labels)
        #[arg(long)]
        dataset: PathBuf,

        /// Retrieval cutoff K (overrides eval.top_k from config)
        #[arg(long, allow_negative_numbers = true)]
        top_k: Option<i64>,

        /// Print AP for every query
        #[arg(long)]
        per_query: bool,

        /// Print the full report as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Run single-threaded
        #[arg(long)]
        serial: bool,
    },
    /// Check the scorer against the built-in 5x5 reference fixture
    Fixture,
}

fn main() -> Result<()> {
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.logging.log_level.as_str()),
    )
    .init();

    match &config.source {
        Some(path) => log::debug!("Configuration loaded from {}", path.display()),
        None => log::debug!("No config.toml found, using defaults"),
    }

    let args = Args::parse();

    match args.command {
        Command::Eval {
            dataset,
            top_k,
            per_query,
            json,
            serial,
        } => run_eval(config, dataset, top_k, per_query, json, serial),
        Command::Fixture => run_fixture(),
    }
}

fn run_eval(
    mut config: Config,
    dataset_path: PathBuf,
    top_k: Option<i64>,
    per_query: bool,
    json: bool,
    serial: bool,
) -> Result<()> {
    if let Some(k) = top_k {
        config.eval.top_k = k;
    }
    if serial {
        config.eval.parallel = false;
    }

    let dataset = Dataset::load(&dataset_path)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", dataset_path.display(), e))?;

    log::info!(
        "Evaluating {} queries against {} gallery items (top_k = {})",
        dataset.query.labels.len(),
        dataset.gallery.labels.len(),
        config.eval.top_k
    );

    let evaluator = Evaluator::from_config(&config);
    let report = evaluator.evaluate(&dataset.gallery, &dataset.query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &dataset, per_query || config.report.per_query);
    }

    if let Some(min_map) = config.report.min_map {
        if report.mean_ap < min_map {
            eprintln!("\nmAP {:.4} is below threshold {:.4}.", report.mean_ap, min_map);
            std::process::exit(1);
        }
        if !json {
            println!("\nmAP meets threshold (>= {:.4}).", min_map);
        }
    }

    Ok(())
}

fn print_report(report: &EvalReport, dataset: &Dataset, per_query: bool) {
    println!("\n=== Evaluation Results ===");
    println!("Gallery items:   {}", report.num_gallery);
    println!("Query items:     {}", report.num_query);
    println!("Hash bits:       {}", report.hash_dim);
    if report.top_k as i64 == report.requested_top_k {
        println!("Top-K:           {}", report.top_k);
    } else {
        println!("Top-K:           {} (requested {})", report.top_k, report.requested_top_k);
    }
    println!("{:-<40}", "");
    println!("mAP@{:<11} {:.4}", report.top_k, report.mean_ap);
    println!("Precision@{:<5} {:.2}%", report.top_k, report.mean_precision_at_k * 100.0);
    println!("Recall@{:<8} {:.2}%", report.top_k, report.mean_recall_at_k * 100.0);
    println!("MRR:            {:.4}", report.mean_reciprocal_rank);
    if report.zero_match_queries > 0 {
        println!("Zero-match queries: {}", report.zero_match_queries);
    }

    if per_query {
        println!("\n{:<8} {:<16} {:>8}", "Query", "Label", "AP");
        println!("{:-<34}", "");
        for (idx, (ap, label)) in report
            .per_query_ap
            .iter()
            .zip(dataset.query.labels.iter())
            .enumerate()
        {
            println!("{:<8} {:<16} {:>8.4}", idx, label.to_string(), ap);
        }
    }
}

fn run_fixture() -> Result<()> {
    let (matches, ranking) = reference_fixture()?;
    let expected_map = reference_map();

    let ap = per_query_average_precision(&matches, &ranking, REFERENCE_TOP_K)?;
    let map = ap.iter().sum::<f64>() / ap.len() as f64;

    for (t, (got, want)) in ap.iter().zip(REFERENCE_AP.iter()).enumerate() {
        println!("query {}: AP = {:.6} (expected {:.6})", t, got, want);
    }
    println!("mAP = {:.9} (expected {:.9})", map, expected_map);

    let per_query_ok = ap
        .iter()
        .zip(REFERENCE_AP.iter())
        .all(|(got, want)| (got - want).abs() < 1e-9);
    if per_query_ok && (map - expected_map).abs() < 1e-9 {
        println!("\nReference fixture passes.");
        Ok(())
    } else {
        eprintln!("\nReference fixture FAILED.");
        std::process::exit(1);
    }
}
