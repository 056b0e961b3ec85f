// Review topics: pull a bounded sample of reviews for one category and
// region out of line-delimited business/review dumps, fit a topic model to
// it, and export the topics as a name/children tree.

pub mod config;
pub mod errors;
pub mod feed;
pub mod models;
pub mod pipeline;
pub mod sampler;
pub mod selector;
pub mod topic_modeling;
pub mod transform;
