// Bounded review sampling and the CSV hand-off to the modeling stage.

use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use tracing::info;

use crate::errors::{PipelineError, Result};
use crate::feed::JsonLines;
use crate::models::{BusinessIdSet, Review, ReviewRecord};

/// Reviews retained from one scan of the review feed, in feed order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewSample {
    pub reviews: Vec<Review>,
    /// Feed records decoded before the scan stopped.
    pub scanned: usize,
}

impl ReviewSample {
    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

/// Scan the review feed, keeping reviews of selected businesses that have
/// text and an accepted rating.
///
/// The bound is checked before each record is read, so the scan halts as
/// soon as the sample holds more than `cap` reviews (at most `cap + 1`) and
/// the rest of the feed is never touched.
pub fn sample_reviews<R: BufRead>(
    feed: R,
    ids: &BusinessIdSet,
    cap: usize,
    accepted_ratings: &BTreeSet<i64>,
) -> Result<ReviewSample> {
    let mut records = JsonLines::<_, ReviewRecord>::new(feed);
    let mut sample = ReviewSample::default();

    while sample.reviews.len() <= cap {
        let Some(record) = records.next() else {
            break;
        };
        let record = record?;
        sample.scanned += 1;

        if !ids.contains(&record.business_id) {
            continue;
        }
        let Some(stars) = record.rating().filter(|r| accepted_ratings.contains(r)) else {
            continue;
        };
        let Some(text) = record.non_empty_text() else {
            continue;
        };

        let text = text.to_string();
        sample.reviews.push(Review {
            business_id: record.business_id,
            text,
            stars,
        });
    }

    info!(
        lines = records.lines_read(),
        scanned = sample.scanned,
        collected = sample.len(),
        cap,
        "Sampled reviews"
    );
    Ok(sample)
}

/// Write the sample as headerless three-column CSV, quoting only where
/// needed. Returns the number of rows written.
pub fn persist_sample(sample: &ReviewSample, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .from_path(path)
        .map_err(|e| PipelineError::persist(path, e))?;

    for review in &sample.reviews {
        let stars = review.stars.to_string();
        writer
            .write_record([review.business_id.as_str(), review.text.as_str(), stars.as_str()])
            .map_err(|e| PipelineError::persist(path, e))?;
    }
    writer.flush().map_err(|e| PipelineError::persist(path, e))?;

    info!(rows = sample.len(), path = %path.display(), "Wrote review sample");
    Ok(sample.len())
}

/// Read a sample file written by [`persist_sample`].
pub fn load_sample(path: impl AsRef<Path>) -> Result<Vec<Review>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| PipelineError::Io(csv_to_io(e)))?;

    let mut reviews = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| PipelineError::Io(csv_to_io(e)))?;
        let [business_id, text, stars] = [0, 1, 2].map(|i| row.get(i));
        let (Some(business_id), Some(text), Some(stars)) = (business_id, text, stars) else {
            return Err(invalid_data(format!(
                "row {} of '{}' has {} columns, expected 3",
                index + 1,
                path.display(),
                row.len()
            )));
        };
        let stars = stars
            .parse::<i64>()
            .map_err(|e| invalid_data(format!("row {}: bad rating '{stars}': {e}", index + 1)))?;
        reviews.push(Review {
            business_id: business_id.to_string(),
            text: text.to_string(),
            stars,
        });
    }
    Ok(reviews)
}

fn csv_to_io(err: csv::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, err)
}

fn invalid_data(message: String) -> PipelineError {
    PipelineError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}
