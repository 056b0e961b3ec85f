// End-to-end runs of the extraction pipeline against small on-disk feeds.

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use review_topics::config::PipelineConfig;
use review_topics::errors::{PipelineError, Result};
use review_topics::models::ClusterTree;
use review_topics::pipeline;
use review_topics::sampler::load_sample;
use review_topics::topic_modeling::{FitRequest, Plsa, PlsaConfig, TopicModel, TopicModeler};

const BUSINESSES: &str = concat!(
    r#"{"business_id":"cafe-1","name":"Two Cups","categories":["Cafes","Coffee & Tea"],"state":"NV"}"#, "\n",
    r#"{"business_id":"cafe-2","name":"Solo","categories":["Cafes"],"state":"NV"}"#, "\n",
    r#"{"business_id":"cafe-3","name":"Far Away","categories":["Cafes","Bakeries"],"state":"AZ"}"#, "\n",
);

fn review(id: &str, text: &str, stars: i64) -> String {
    serde_json::json!({ "review_id": "r", "business_id": id, "text": text, "stars": stars }).to_string() + "\n"
}

fn scenario_reviews() -> String {
    [
        review("cafe-1", "first, with a comma", 1),
        review("cafe-1", "second \"quoted\"", 3),
        review("cafe-1", "out of range", 6),
        review("cafe-1", "third\nline two", 2),
        review("cafe-1", "never reached", 4),
    ]
    .concat()
}

/// Records the request it was given and returns a fixed model.
struct StubModeler {
    seen: RefCell<Option<FitRequest>>,
    model: TopicModel,
}

impl StubModeler {
    fn new(topics: Vec<Vec<(&str, f64)>>) -> Self {
        StubModeler {
            seen: RefCell::new(None),
            model: TopicModel {
                word_given_topic: topics
                    .into_iter()
                    .map(|t| t.into_iter().map(|(w, p)| (w.to_string(), p)).collect())
                    .collect(),
                log_likelihood: -1.0,
            },
        }
    }
}

impl TopicModeler for StubModeler {
    fn fit(&self, request: &FitRequest) -> Result<TopicModel> {
        *self.seen.borrow_mut() = Some(request.clone());
        Ok(self.model.clone())
    }
}

struct FailingModeler;

impl TopicModeler for FailingModeler {
    fn fit(&self, _request: &FitRequest) -> Result<TopicModel> {
        Err(PipelineError::Modeling("degenerate sample".into()))
    }
}

fn config_in(dir: &Path, reviews: &str) -> PipelineConfig {
    let business_feed = dir.join("business.json");
    let review_feed = dir.join("review.json");
    fs::write(&business_feed, BUSINESSES).unwrap();
    fs::write(&review_feed, reviews).unwrap();

    PipelineConfig {
        business_feed,
        review_feed,
        category: "Cafes".into(),
        region: "NV".into(),
        max_reviews: 2,
        accepted_ratings: (1..=5).collect(),
        sample_path: dir.join("reviews.csv"),
        k_topics: 1,
        runs: 1,
        tree_path: dir.join("topics.json"),
        ..PipelineConfig::default()
    }
}

#[test]
fn cafe_scenario_writes_sample_and_tree() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &scenario_reviews());
    let modeler = StubModeler::new(vec![vec![("food", 0.9), ("service", 0.5)]]);

    let summary = pipeline::run(&config, &modeler).unwrap();
    assert_eq!(summary.businesses, 1);
    assert_eq!(summary.reviews_written, 3);
    assert_eq!(summary.reviews_scanned, 4);
    assert_eq!(summary.topics, 1);

    let sample = load_sample(&config.sample_path).unwrap();
    let rows: Vec<(&str, &str, i64)> = sample
        .iter()
        .map(|r| (r.business_id.as_str(), r.text.as_str(), r.stars))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("cafe-1", "first, with a comma", 1),
            ("cafe-1", "second \"quoted\"", 3),
            ("cafe-1", "third\nline two", 2),
        ]
    );

    assert_eq!(
        fs::read_to_string(&config.tree_path).unwrap(),
        r#"{"name":"Topics","children":[{"name":"Topic 0","children":[{"name":"food","size":0.9},{"name":"service","size":0.5}]}]}"#
    );
}

#[test]
fn modeler_receives_configured_request() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        text_column: 1,
        encoding: "utf-8".into(),
        max_docs: 50,
        runs: 3,
        ..config_in(dir.path(), &scenario_reviews())
    };
    let modeler = StubModeler::new(vec![vec![("food", 0.9)]]);

    pipeline::run(&config, &modeler).unwrap();

    let seen = modeler.seen.borrow().clone().unwrap();
    assert_eq!(seen.path, config.sample_path);
    assert_eq!(seen.text_column, 1);
    assert_eq!(seen.encoding, "utf-8");
    assert_eq!(seen.max_docs, 50);
    assert_eq!(seen.k_topics, 1);
    assert_eq!(seen.runs, 3);
}

#[test]
fn modeling_failure_surfaces_and_keeps_the_sample() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), &scenario_reviews());

    let err = pipeline::run(&config, &FailingModeler).unwrap_err();
    assert!(matches!(err, PipelineError::Modeling(_)));
    assert!(config.sample_path.exists());
    assert!(!config.tree_path.exists());
}

#[test]
fn malformed_review_line_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let reviews = format!("{}{{\"business_id\":\n", review("cafe-1", "ok", 5));
    let config = config_in(dir.path(), &reviews);

    let err = pipeline::run(&config, &StubModeler::new(vec![vec![]])).unwrap_err();
    assert!(matches!(err, PipelineError::Decode { line: 2, .. }));
}

#[test]
fn invalid_config_is_rejected_before_reading_feeds() {
    let config = PipelineConfig {
        business_feed: "/nonexistent/business.json".into(),
        k_topics: 0,
        ..PipelineConfig::default()
    };
    let err = pipeline::run(&config, &FailingModeler).unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)));
}

#[test]
fn plsa_backend_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let texts = [
        "espresso latte espresso crema",
        "latte crema espresso beans",
        "barista rude slow counter",
        "slow barista counter rude",
        "beans espresso latte crema",
        "counter rude barista slow",
    ];
    let reviews: String = texts.iter().map(|t| review("cafe-1", t, 4)).collect();
    let config = PipelineConfig {
        max_reviews: 100,
        k_topics: 2,
        runs: 3,
        ..config_in(dir.path(), &reviews)
    };
    let modeler = Plsa::new(PlsaConfig {
        min_word_freq: 1,
        ..PlsaConfig::default()
    });

    let summary = pipeline::run(&config, &modeler).unwrap();
    assert_eq!(summary.reviews_written, 6);

    let tree: ClusterTree = serde_json::from_str(&fs::read_to_string(&config.tree_path).unwrap()).unwrap();
    assert_eq!(tree.name, "Topics");
    assert_eq!(tree.children.len(), 2);
    for (index, topic) in tree.children.iter().enumerate() {
        assert_eq!(topic.name, format!("Topic {index}"));
        assert_eq!(topic.children.len(), 8);
        assert!(topic.children.windows(2).all(|w| w[0].size >= w[1].size));
    }
}

#[test]
fn unmatched_reviews_still_reach_the_modeler() {
    let dir = tempfile::tempdir().unwrap();
    let reviews = review("cafe-3", "wrong state", 5);
    let config = config_in(dir.path(), &reviews);
    let modeler = StubModeler::new(vec![vec![("food", 0.9)]]);

    let summary = pipeline::run(&config, &modeler).unwrap();
    assert_eq!(summary.reviews_scanned, 1);
    assert_eq!(summary.reviews_written, 0);
    assert!(load_sample(&config.sample_path).unwrap().is_empty());
    assert!(modeler.seen.borrow().is_some());
}
