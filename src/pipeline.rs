use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::errors::Result;
use crate::feed;
use crate::sampler::{persist_sample, sample_reviews};
use crate::selector::select_businesses;
use crate::topic_modeling::{FitRequest, TopicModeler};
use crate::transform::{persist_tree, to_cluster_tree};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub businesses: usize,
    pub reviews_scanned: usize,
    pub reviews_written: usize,
    pub topics: usize,
}

/// Run selection, sampling, modeling and tree export in order.
///
/// A failure in a later stage leaves the files written by earlier stages
/// in place.
pub fn run(config: &PipelineConfig, modeler: &dyn TopicModeler) -> Result<RunSummary> {
    config.validate()?;

    let ids = select_businesses(feed::open(&config.business_feed)?, &config.category, &config.region)?;
    let businesses = ids.len();

    let sample = sample_reviews(
        feed::open(&config.review_feed)?,
        &ids,
        config.max_reviews,
        &config.accepted_ratings,
    )?;
    if sample.is_empty() {
        warn!(scanned = sample.scanned, "No reviews matched; the topic model will see an empty sample");
    }
    let reviews_written = persist_sample(&sample, &config.sample_path)?;

    info!(k_topics = config.k_topics, runs = config.runs, "Running topic model");
    let model = modeler.fit(&FitRequest {
        path: config.sample_path.clone(),
        text_column: config.text_column,
        encoding: config.encoding.clone(),
        max_docs: config.max_docs,
        k_topics: config.k_topics,
        runs: config.runs,
    })?;

    let tree = to_cluster_tree(&model, config.k_topics)?;
    persist_tree(&tree, &config.tree_path)?;

    Ok(RunSummary {
        businesses,
        reviews_scanned: sample.scanned,
        reviews_written,
        topics: tree.children.len(),
    })
}
