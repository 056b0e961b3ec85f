// Line-delimited JSON feeds.
//
// Both upstream feeds are far too large to load at once, so records are
// decoded lazily one line at a time and the caller decides when to stop.

use std::fs::File;
use std::io::{BufRead, BufReader, Split, Write};
use std::marker::PhantomData;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::errors::{PipelineError, Result};

/// Lazy iterator decoding one `T` per non-blank line.
///
/// Lines are read as raw bytes so that invalid UTF-8 surfaces as a decode
/// error on its line rather than as a read failure.
pub struct JsonLines<R, T> {
    lines: Split<R>,
    line_no: usize,
    _record: PhantomData<fn() -> T>,
}

impl<R: BufRead, T: DeserializeOwned> JsonLines<R, T> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.split(b'\n'),
            line_no: 0,
            _record: PhantomData,
        }
    }

    /// Physical lines consumed so far, blank ones included.
    pub fn lines_read(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead, T: DeserializeOwned> Iterator for JsonLines<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };

            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }

            return Some(
                serde_json::from_slice(trimmed).map_err(|source| PipelineError::Decode {
                    line: self.line_no,
                    source,
                }),
            );
        }
    }
}

/// Open a feed file for buffered line-by-line reading.
pub fn open(path: impl AsRef<Path>) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

fn non_blank_lines(reader: impl BufRead) -> impl Iterator<Item = std::io::Result<Vec<u8>>> {
    reader
        .split(b'\n')
        .filter(|line| line.as_ref().map_or(true, |l| !l.trim_ascii().is_empty()))
}

/// Count the non-blank lines of a feed.
pub fn count_records(reader: impl BufRead) -> Result<usize> {
    let mut total = 0;
    for line in non_blank_lines(reader) {
        line?;
        total += 1;
    }
    Ok(total)
}

/// Distance between kept records so that roughly `percentage` percent of
/// `total` records survive. At least one record is always kept.
pub fn thinning_step(total: usize, percentage: f32) -> usize {
    let wanted = ((total as f64) * f64::from(percentage) / 100.0) as usize;
    (total / wanted.max(1)).max(1)
}

/// Copy every `step`-th non-blank line of `reader` to `writer`, starting
/// with the first. Returns the number of lines written.
pub fn thin(reader: impl BufRead, mut writer: impl Write, step: usize) -> Result<usize> {
    let step = step.max(1);
    let mut written = 0;

    for (i, line) in non_blank_lines(reader).enumerate() {
        let line = line?;
        if i % step != 0 {
            continue;
        }
        writer.write_all(&line)?;
        writer.write_all(b"\n")?;
        written += 1;
    }

    writer.flush()?;
    Ok(written)
}
