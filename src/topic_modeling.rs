use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::str::FromStr;

use counter::Counter;
use csv::ReaderBuilder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use tracing::{debug, info};

use crate::errors::{PipelineError, Result};

/// A fitted model: per topic, the vocabulary ranked by P(word | topic).
#[derive(Debug, Clone, PartialEq)]
pub struct TopicModel {
    pub word_given_topic: Vec<Vec<(String, f64)>>,
    pub log_likelihood: f64,
}

impl TopicModel {
    pub fn num_topics(&self) -> usize {
        self.word_given_topic.len()
    }

    pub fn topic(&self, index: usize) -> Option<&[(String, f64)]> {
        self.word_given_topic.get(index).map(Vec::as_slice)
    }
}

/// Everything a modeling backend needs to fit the persisted sample.
#[derive(Debug, Clone)]
pub struct FitRequest {
    pub path: PathBuf,
    pub text_column: usize,
    pub encoding: String,
    pub max_docs: usize,
    pub k_topics: usize,
    pub runs: usize,
}

/// Boundary to the topic-modeling procedure.
pub trait TopicModeler {
    /// Fit `request.k_topics` topics, keeping the best of `request.runs` fits.
    fn fit(&self, request: &FitRequest) -> Result<TopicModel>;
}

/// Text encodings accepted for the sample file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

impl TextEncoding {
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| PipelineError::Modeling(format!("sample is not valid UTF-8: {e}"))),
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "latin_1" | "latin-1" | "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            other => Err(PipelineError::Configuration(format!("unsupported encoding '{other}'"))),
        }
    }
}

/// Read up to `max_docs` texts from column `column` of a headerless CSV.
pub fn load_documents(path: &std::path::Path, column: usize, encoding: TextEncoding, max_docs: usize) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| PipelineError::Modeling(format!("cannot read '{}': {e}", path.display())))?;

    let mut texts = Vec::new();
    for row in reader.byte_records().take(max_docs) {
        let row = row.map_err(|e| PipelineError::Modeling(e.to_string()))?;
        let field = row.get(column).ok_or_else(|| {
            PipelineError::Modeling(format!("row {} has no column {column}", texts.len() + 1))
        })?;
        texts.push(encoding.decode(field)?);
    }
    Ok(texts)
}

pub struct PlsaConfig {
    pub max_iterations: usize,
    pub tolerance: f64, // Relative log-likelihood change that ends a fit
    pub min_word_freq: usize,
    pub max_vocab_size: usize,
    pub tf_idf: bool, // Weight the document-term matrix by TF-IDF
    pub seed: u64,
}

impl Default for PlsaConfig {
    fn default() -> Self {
        PlsaConfig {
            max_iterations: 100,
            tolerance: 1e-6,
            min_word_freq: 2,
            max_vocab_size: 5000,
            tf_idf: true,
            seed: 0,
        }
    }
}

/// Probabilistic latent semantic analysis fitted by expectation-maximisation.
pub struct Plsa {
    config: PlsaConfig,
}

// (word index, weight) pairs of one document
type SparseDoc = Vec<(usize, f64)>;

impl TopicModeler for Plsa {
    fn fit(&self, request: &FitRequest) -> Result<TopicModel> {
        let encoding = request
            .encoding
            .parse::<TextEncoding>()
            .map_err(|e| PipelineError::Modeling(e.to_string()))?;
        let texts = load_documents(&request.path, request.text_column, encoding, request.max_docs)?;
        self.fit_documents(texts, request.k_topics, request.runs)
    }
}

impl Plsa {
    pub fn new(config: PlsaConfig) -> Self {
        Plsa { config }
    }

    pub fn fit_documents(&self, texts: Vec<String>, k_topics: usize, runs: usize) -> Result<TopicModel> {
        if k_topics == 0 {
            return Err(PipelineError::Modeling("topic count must be positive".into()));
        }
        if runs == 0 {
            return Err(PipelineError::Modeling("at least one run is required".into()));
        }
        if texts.is_empty() {
            return Err(PipelineError::Modeling("no documents to model".into()));
        }

        let documents = self.preprocess_documents(texts)?;
        let vocabulary = self.build_vocabulary(&documents);
        if vocabulary.is_empty() {
            return Err(PipelineError::Modeling(format!(
                "no word occurs at least {} times across {} documents",
                self.config.min_word_freq,
                documents.len()
            )));
        }

        let matrix = self.vectorize_documents(&documents, &vocabulary);
        if matrix.iter().all(Vec::is_empty) {
            return Err(PipelineError::Modeling("document-term matrix is empty".into()));
        }

        let mut best: Option<(Vec<Vec<f64>>, f64)> = None;
        for run in 0..runs {
            let seed = self.config.seed.wrapping_add(run as u64);
            let (word_topic, log_likelihood) = self.run_plsa(&matrix, vocabulary.len(), k_topics, seed);
            debug!(run, seed, log_likelihood, "PLSA run finished");

            if best.as_ref().map_or(true, |(_, top)| log_likelihood > *top) {
                best = Some((word_topic, log_likelihood));
            }
        }
        let (word_topic, log_likelihood) =
            best.ok_or_else(|| PipelineError::Modeling("no fit produced".into()))?;

        info!(
            topics = k_topics,
            documents = documents.len(),
            vocabulary = vocabulary.len(),
            log_likelihood,
            "Fitted topic model"
        );

        Ok(TopicModel {
            word_given_topic: rank_words(&word_topic, &vocabulary),
            log_likelihood,
        })
    }

    fn preprocess_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<String>>> {
        let stop_words: HashSet<&str> = [
            // Common English stop words
            "the", "and", "for", "are", "but", "not", "you", "your", "all", "can", "had",
            "her", "was", "one", "our", "out", "get", "has", "him", "his", "how", "its",
            "may", "now", "see", "who", "did", "way", "what", "when", "where", "will",
            "with", "this", "that", "have", "from", "they", "been", "some", "very",
            "just", "than", "them", "well", "were", "there", "then", "which", "their",
            "would", "could", "should", "about", "into", "also", "too", "even", "still",
            "again", "only", "because", "here", "any", "each", "other", "more", "most",
            "she", "these", "those", "being", "does", "doing", "over", "such", "after",
            "before", "while", "both", "own", "same", "off", "why", "let", "got",
            // Review boilerplate
            "really", "place", "came", "went", "back", "definitely", "though", "always",
        ]
        .into_iter()
        .collect();

        let word_re = Regex::new(r"\b[a-zA-Z]{3,}\b")
            .map_err(|e| PipelineError::Modeling(e.to_string()))?;

        Ok(texts
            .into_iter()
            .map(|text| {
                word_re
                    .find_iter(&text.to_lowercase())
                    .map(|m| m.as_str())
                    .filter(|word| !stop_words.contains(word))
                    .map(|word| word.to_string())
                    .collect()
            })
            .collect())
    }

    fn build_vocabulary(&self, documents: &[Vec<String>]) -> Vec<String> {
        let mut word_counts: Counter<String> = Counter::new();

        for doc in documents {
            for word in doc {
                word_counts[word] += 1;
            }
        }

        // Filter by minimum frequency and take top words
        let mut vocab: Vec<(String, usize)> = word_counts
            .into_iter()
            .filter(|(_, count)| *count >= self.config.min_word_freq)
            .collect();

        vocab.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        vocab.truncate(self.config.max_vocab_size);

        vocab.into_iter().map(|(word, _)| word).collect()
    }

    fn vectorize_documents(&self, documents: &[Vec<String>], vocabulary: &[String]) -> Vec<SparseDoc> {
        let vocab_map: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, word)| (word.as_str(), i))
            .collect();

        let counts: Vec<HashMap<usize, usize>> = documents
            .iter()
            .map(|doc| {
                let mut counts = HashMap::new();
                for word_id in doc.iter().filter_map(|w| vocab_map.get(w.as_str())) {
                    *counts.entry(*word_id).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut doc_freq = vec![0usize; vocabulary.len()];
        for doc in &counts {
            for &word_id in doc.keys() {
                doc_freq[word_id] += 1;
            }
        }
        let total_docs = documents.len() as f64;

        counts
            .into_iter()
            .map(|doc| {
                let mut entries: SparseDoc = doc
                    .into_iter()
                    .map(|(word_id, count)| {
                        let weight = if self.config.tf_idf {
                            calculate_tf_idf(count, doc_freq[word_id], total_docs)
                        } else {
                            count as f64
                        };
                        (word_id, weight)
                    })
                    .filter(|(_, weight)| *weight > 0.0)
                    .collect();
                entries.sort_by_key(|(word_id, _)| *word_id);
                entries
            })
            .collect()
    }

    /// One EM fit from a seeded random start. Returns P(w|z) as a topics x
    /// words matrix and the final log-likelihood.
    fn run_plsa(&self, docs: &[SparseDoc], vocab_size: usize, num_topics: usize, seed: u64) -> (Vec<Vec<f64>>, f64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut topic_given_doc: Vec<Vec<f64>> =
            docs.iter().map(|_| random_distribution(&mut rng, num_topics)).collect();
        let mut word_given_topic: Vec<Vec<f64>> =
            (0..num_topics).map(|_| random_distribution(&mut rng, vocab_size)).collect();

        let mut posterior = vec![0.0; num_topics];
        let mut previous = f64::NEG_INFINITY;
        let mut log_likelihood = f64::NEG_INFINITY;

        for iteration in 0..self.config.max_iterations {
            let mut word_topic_acc = vec![vec![0.0; vocab_size]; num_topics];
            let mut topic_doc_acc = vec![vec![0.0; num_topics]; docs.len()];
            log_likelihood = 0.0;

            // E-step folded into the M-step accumulators
            for (doc_id, doc) in docs.iter().enumerate() {
                for &(word_id, weight) in doc {
                    let mut total = 0.0;
                    for topic in 0..num_topics {
                        posterior[topic] = topic_given_doc[doc_id][topic] * word_given_topic[topic][word_id];
                        total += posterior[topic];
                    }
                    if total <= 0.0 {
                        continue;
                    }
                    log_likelihood += weight * total.ln();

                    for topic in 0..num_topics {
                        let share = weight * posterior[topic] / total;
                        word_topic_acc[topic][word_id] += share;
                        topic_doc_acc[doc_id][topic] += share;
                    }
                }
            }

            word_given_topic = word_topic_acc.into_iter().map(normalize).collect();
            topic_given_doc = topic_doc_acc.into_iter().map(normalize).collect();

            if (log_likelihood - previous).abs() <= self.config.tolerance * log_likelihood.abs() {
                debug!(iteration, "PLSA converged");
                break;
            }
            previous = log_likelihood;
        }

        (word_given_topic, log_likelihood)
    }
}

fn calculate_tf_idf(term_freq: usize, doc_freq: usize, total_docs: f64) -> f64 {
    if doc_freq == 0 {
        return 0.0;
    }

    let tf = term_freq as f64;
    let idf = (total_docs / doc_freq as f64).ln();
    tf * idf
}

fn random_distribution(rng: &mut StdRng, len: usize) -> Vec<f64> {
    normalize((0..len).map(|_| rng.random::<f64>() + 1e-3).collect())
}

fn normalize(mut values: Vec<f64>) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter_mut().for_each(|v| *v /= total);
    } else if !values.is_empty() {
        let uniform = 1.0 / values.len() as f64;
        values.iter_mut().for_each(|v| *v = uniform);
    }
    values
}

// Stable sort keeps vocabulary order among equal weights.
fn rank_words(word_given_topic: &[Vec<f64>], vocabulary: &[String]) -> Vec<Vec<(String, f64)>> {
    word_given_topic
        .iter()
        .map(|weights| {
            let mut ranked: Vec<(String, f64)> = vocabulary.iter().cloned().zip(weights.iter().copied()).collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            ranked
        })
        .collect()
}
