use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use review_topics::feed;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 4 {
        eprintln!("Usage: {} <input.json> <output.json> <sample_percentage>", args[0]);
        eprintln!("Example: sample_feed yelp_academic_dataset_review.json review_sample.json 10");
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let output_path = PathBuf::from(&args[2]);
    let sample_percentage: f32 = args[3]
        .parse()
        .context("Sample percentage must be a number")?;

    if sample_percentage <= 0.0 || sample_percentage > 100.0 {
        bail!("Sample percentage must be between 0 and 100");
    }

    println!(
        "Sampling {}% of records from {} to {}",
        sample_percentage,
        input_path.display(),
        output_path.display()
    );

    let total_records = feed::count_records(feed::open(&input_path)?)?;
    println!("Total records in source: {}", total_records);

    let step = feed::thinning_step(total_records, sample_percentage);
    println!("Taking every {}th record", step);

    let output_file = File::create(&output_path)
        .with_context(|| format!("cannot create {}", output_path.display()))?;
    let sampled_count = feed::thin(feed::open(&input_path)?, BufWriter::new(output_file), step)?;

    println!("Created sample file with {} records", sampled_count);
    println!("Sample file: {}", output_path.display());

    Ok(())
}
