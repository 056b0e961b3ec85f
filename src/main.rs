use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use review_topics::config::PipelineConfig;
use review_topics::pipeline;
use review_topics::topic_modeling::{Plsa, PlsaConfig};

#[derive(Parser, Debug)]
#[command(version, about = "Extract topics from reviews of businesses in one category and region", long_about = None)]
struct Args {
    #[clap(long, default_value = "../yelp_dataset/yelp_academic_dataset_business.json")]
    business_feed: PathBuf,
    #[clap(long, default_value = "../yelp_dataset/yelp_academic_dataset_review.json")]
    review_feed: PathBuf,
    #[clap(short, long, default_value = "Restaurants")]
    category: String,
    #[clap(short, long, default_value = "AZ", help = "State code businesses must be located in")]
    region: String,
    #[clap(long, default_value_t = 1000, help = "Stop sampling once more than this many reviews are kept")]
    max_reviews: usize,
    #[clap(long, value_delimiter = ',', default_value = "1,2,3,4,5")]
    stars: Vec<i64>,
    #[clap(long, default_value = "reviews.csv")]
    reviews_csv: PathBuf,
    #[clap(long, default_value_t = 1)]
    text_column: usize,
    #[clap(long, default_value = "latin_1")]
    encoding: String,
    #[clap(long, default_value_t = 1000, help = "Maximum documents handed to the topic model")]
    max_docs: usize,
    #[clap(short = 'k', long, default_value_t = 4)]
    topics: usize,
    #[clap(long, default_value_t = 5, help = "Independent fits; the most likely one is kept")]
    runs: usize,
    #[clap(long, default_value_t = 0)]
    seed: u64,
    #[clap(short, long, default_value = "topics.json")]
    output: PathBuf,
}

impl From<Args> for PipelineConfig {
    fn from(args: Args) -> Self {
        PipelineConfig {
            business_feed: args.business_feed,
            review_feed: args.review_feed,
            category: args.category,
            region: args.region,
            max_reviews: args.max_reviews,
            accepted_ratings: args.stars.into_iter().collect(),
            sample_path: args.reviews_csv,
            text_column: args.text_column,
            encoding: args.encoding,
            max_docs: args.max_docs,
            k_topics: args.topics,
            runs: args.runs,
            seed: args.seed,
            tree_path: args.output,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("review_topics=info")),
        )
        .init();

    let config = PipelineConfig::from(Args::parse());
    let modeler = Plsa::new(PlsaConfig {
        seed: config.seed,
        ..PlsaConfig::default()
    });

    let summary = pipeline::run(&config, &modeler)?;
    info!(
        businesses = summary.businesses,
        reviews_scanned = summary.reviews_scanned,
        reviews_written = summary.reviews_written,
        topics = summary.topics,
        output = %config.tree_path.display(),
        "Done"
    );
    Ok(())
}
