// Reshape a fitted topic model into the name/children tree read by the
// visualization front end.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::errors::{PipelineError, Result};
use crate::models::{ClusterTree, TopicNode, WordLeaf};
use crate::topic_modeling::TopicModel;

/// Leaves kept per topic node.
pub const WORDS_PER_TOPIC: usize = 10;

pub const ROOT_NAME: &str = "Topics";

/// Build the tree for topics `0..k_topics`, keeping each topic's ten
/// highest-ranked words in the model's own order.
pub fn to_cluster_tree(model: &TopicModel, k_topics: usize) -> Result<ClusterTree> {
    let mut children = Vec::with_capacity(k_topics);

    for index in 0..k_topics {
        let words = model.topic(index).ok_or_else(|| {
            PipelineError::Modeling(format!(
                "model has {} topics, topic {index} was requested",
                model.num_topics()
            ))
        })?;

        children.push(TopicNode {
            name: format!("Topic {index}"),
            children: words
                .iter()
                .take(WORDS_PER_TOPIC)
                .map(|(word, weight)| WordLeaf {
                    name: word.clone(),
                    size: *weight,
                })
                .collect(),
        });
    }

    Ok(ClusterTree {
        name: ROOT_NAME.to_string(),
        children,
    })
}

pub fn persist_tree(tree: &ClusterTree, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| PipelineError::persist(path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, tree).map_err(|e| PipelineError::persist(path, e))?;
    writer.flush().map_err(|e| PipelineError::persist(path, e))?;

    info!(topics = tree.children.len(), path = %path.display(), "Wrote cluster tree");
    Ok(())
}
