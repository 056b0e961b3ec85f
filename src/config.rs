use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::errors::{PipelineError, Result};
use crate::topic_modeling::TextEncoding;

/// Every knob of one extraction run. Passed explicitly to each stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub business_feed: PathBuf,
    pub review_feed: PathBuf,
    /// Category a business must list (alongside at least one other).
    pub category: String,
    /// State code a business must be located in.
    pub region: String,
    /// Sampling stops once more than this many reviews are held.
    pub max_reviews: usize,
    pub accepted_ratings: BTreeSet<i64>,
    pub sample_path: PathBuf,
    /// Zero-based CSV column holding the review text.
    pub text_column: usize,
    pub encoding: String,
    pub max_docs: usize,
    pub k_topics: usize,
    /// Independent fits; the best-scoring one wins.
    pub runs: usize,
    pub seed: u64,
    pub tree_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            business_feed: PathBuf::from("../yelp_dataset/yelp_academic_dataset_business.json"),
            review_feed: PathBuf::from("../yelp_dataset/yelp_academic_dataset_review.json"),
            category: "Restaurants".to_string(),
            region: "AZ".to_string(),
            max_reviews: 1000,
            accepted_ratings: (1..=5).collect(),
            sample_path: PathBuf::from("reviews.csv"),
            text_column: 1,
            encoding: "latin_1".to_string(),
            max_docs: 1000,
            k_topics: 4,
            runs: 5,
            seed: 0,
            tree_path: PathBuf::from("topics.json"),
        }
    }
}

impl PipelineConfig {
    /// Reject parameter combinations no stage can work with.
    pub fn validate(&self) -> Result<()> {
        if self.category.trim().is_empty() {
            return Err(PipelineError::Configuration("category must not be empty".into()));
        }
        if self.region.trim().is_empty() {
            return Err(PipelineError::Configuration("region must not be empty".into()));
        }
        if self.accepted_ratings.is_empty() {
            return Err(PipelineError::Configuration(
                "at least one accepted rating is required".into(),
            ));
        }
        if self.k_topics == 0 {
            return Err(PipelineError::Configuration("topic count must be positive".into()));
        }
        if self.runs == 0 {
            return Err(PipelineError::Configuration("at least one fitting run is required".into()));
        }
        if self.text_column > 2 {
            return Err(PipelineError::Configuration(format!(
                "text column {} is outside the three-column sample",
                self.text_column
            )));
        }
        self.encoding.parse::<TextEncoding>()?;
        Ok(())
    }
}
