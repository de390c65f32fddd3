//! Multi-statement batches.
//!
//! Every file is extracted independently; a file that cannot be decoded
//! becomes a failure entry and never aborts the batch. Entries come back in
//! chronological order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{info, warn};

use super::engine::StatementEngine;
use super::rules::period_from_filename;
use crate::models::{BatchEntry, RiskscanConfig};

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct StatementFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl StatementFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// Callback invoked once per finished entry.
pub type ProgressHook = Arc<dyn Fn(&BatchEntry) + Send + Sync>;

/// Runs the extraction pipeline over a set of files.
#[derive(Debug, Clone)]
pub struct BatchAggregator {
    engine: Arc<StatementEngine>,
}

impl BatchAggregator {
    pub fn new(config: RiskscanConfig) -> Self {
        Self::with_engine(StatementEngine::new(config))
    }

    pub fn with_engine(engine: StatementEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Extract every file on the calling thread.
    pub fn run(&self, files: Vec<StatementFile>) -> Vec<BatchEntry> {
        info!("Processing batch of {} file(s)", files.len());

        let mut entries: Vec<BatchEntry> = files
            .into_iter()
            .map(|file| {
                let filename = file.filename.clone();
                catch_unwind(AssertUnwindSafe(|| build_entry(&self.engine, file)))
                    .unwrap_or_else(|_| panicked_entry(&filename))
            })
            .collect();

        sort_chronologically(&mut entries);
        entries
    }

    /// Extract files concurrently on the blocking pool, at most `batch.jobs`
    /// at a time, each bounded by `batch.timeout_secs`.
    #[cfg(feature = "native")]
    pub async fn run_parallel(
        &self,
        files: Vec<StatementFile>,
        progress: Option<ProgressHook>,
    ) -> Vec<BatchEntry> {
        use std::time::Duration;

        use tokio::sync::Semaphore;

        use crate::error::RiskscanError;

        let batch = &self.engine.config().batch;
        let semaphore = Arc::new(Semaphore::new(batch.jobs.max(1)));
        let secs = batch.timeout_secs;
        info!(
            "Processing batch of {} file(s), {} at a time",
            files.len(),
            batch.jobs.max(1)
        );

        let mut handles = Vec::with_capacity(files.len());
        let mut filenames = Vec::with_capacity(files.len());

        for file in files {
            filenames.push(file.filename.clone());
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&semaphore);
            let progress = progress.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let filename = file.filename.clone();
                let task = tokio::task::spawn_blocking(move || build_entry(&engine, file));

                let entry = match tokio::time::timeout(Duration::from_secs(secs), task).await {
                    Ok(Ok(entry)) => entry,
                    Ok(Err(e)) => {
                        warn!("{}: extraction task failed: {}", filename, e);
                        panicked_entry(&filename)
                    }
                    Err(_) => {
                        warn!("{}: timed out after {}s", filename, secs);
                        let error = RiskscanError::Timeout {
                            filename: filename.clone(),
                            secs,
                        };
                        BatchEntry::failure(&filename, error.to_string(), period_from_filename(&filename))
                    }
                };

                if let Some(hook) = &progress {
                    hook(&entry);
                }
                entry
            }));
        }

        let mut entries = Vec::with_capacity(handles.len());
        for (handle, filename) in handles.into_iter().zip(filenames) {
            match handle.await {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!("{}: batch task failed: {}", filename, e);
                    entries.push(panicked_entry(&filename));
                }
            }
        }

        sort_chronologically(&mut entries);
        entries
    }
}

impl Default for BatchAggregator {
    fn default() -> Self {
        Self::new(RiskscanConfig::default())
    }
}

fn build_entry(engine: &StatementEngine, file: StatementFile) -> BatchEntry {
    let guessed = period_from_filename(&file.filename);

    match engine.extract_file(&file.filename, &file.bytes) {
        Ok(mut outcome) => {
            let period = match outcome.fields.statement_period.clone() {
                Some(period) => Some(period),
                None => {
                    if guessed.is_some() {
                        outcome
                            .warnings
                            .push("Statement period taken from the file name".to_string());
                    }
                    guessed
                }
            };
            BatchEntry::success(file.filename, outcome, period)
        }
        Err(e) => {
            warn!("{}: {}", file.filename, e);
            BatchEntry::failure(file.filename, e.to_string(), guessed)
        }
    }
}

fn panicked_entry(filename: &str) -> BatchEntry {
    BatchEntry::failure(
        filename,
        "extraction failed unexpectedly while reading this file",
        period_from_filename(filename),
    )
}

/// Order entries by statement month. Entries without a period go last and
/// keep their upload order.
pub fn sort_chronologically(entries: &mut [BatchEntry]) {
    entries.sort_by_key(|entry| match entry.period() {
        Some(period) => (0, period.sort_key()),
        None => (1, (0, 0)),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn csv_file(name: &str, body: &str) -> StatementFile {
        StatementFile::new(name, body.as_bytes().to_vec())
    }

    fn names(entries: &[BatchEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.filename()).collect()
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let files = vec![
            csv_file("jan.csv", "total_sales_count,statement_period\n100,2024-01\n"),
            StatementFile::new("broken.pdf", b"%PDF-1.4 not really a pdf".to_vec()),
            csv_file("notes.txt", "hello"),
        ];

        let entries = BatchAggregator::default().run(files);

        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_success());
        assert!(entries.iter().filter(|e| !e.is_success()).count() == 2);
        let unsupported = entries.iter().find(|e| e.filename() == "notes.txt").unwrap();
        assert!(unsupported.parse_error().unwrap().contains("unsupported input type"));
        assert!(unsupported.fields().is_none());
    }

    #[test]
    fn test_chronological_sort_with_periodless_last() {
        let files = vec![
            csv_file("a.csv", "visa_txn_count\n5\n"),
            csv_file("march.csv", "visa_txn_count,statement_period\n5,2024-03\n"),
            csv_file("b.csv", "visa_txn_count\n5\n"),
            csv_file("statement_2024-01.csv", "visa_txn_count\n5\n"),
        ];

        let entries = BatchAggregator::default().run(files);

        assert_eq!(names(&entries), vec!["statement_2024-01.csv", "march.csv", "a.csv", "b.csv"]);
        assert!(entries[0]
            .warnings()
            .iter()
            .any(|w| w == "Statement period taken from the file name"));
    }

    #[test]
    fn test_extracted_period_beats_filename() {
        let files = vec![csv_file("2023-12.csv", "statement_period\n2024-02\n")];
        let entries = BatchAggregator::default().run(files);

        assert_eq!(entries[0].period().map(|p| p.sort_key()), Some((2024, 2)));
    }

    #[cfg(feature = "native")]
    #[tokio::test]
    async fn test_run_parallel_matches_sequential() {
        let files = vec![
            csv_file("feb.csv", "tc15_count,statement_period\n1,2024-02\n"),
            csv_file("jan.csv", "tc15_count,statement_period\n0,2024-01\n"),
            StatementFile::new("bad.pdf", b"garbage".to_vec()),
        ];

        let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let hook: ProgressHook = Arc::new(move |_: &BatchEntry| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        let entries = BatchAggregator::default()
            .run_parallel(files, Some(hook))
            .await;

        assert_eq!(names(&entries), vec!["jan.csv", "feb.csv", "bad.pdf"]);
        assert!(!entries[2].is_success());
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[cfg(feature = "native")]
    #[tokio::test]
    async fn test_run_parallel_timeout_becomes_failure() {
        let mut body = String::from("visa_txn_count,tc15_count,fraud_amount_usd\n");
        for _ in 0..5000 {
            body.push_str("12,1,$45.00\n");
        }
        let files = vec![csv_file("statement_2024-05.csv", &body)];

        let mut config = RiskscanConfig::default();
        config.batch.timeout_secs = 0;

        let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let hook: ProgressHook = Arc::new(move |_: &BatchEntry| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        let entries = BatchAggregator::new(config).run_parallel(files, Some(hook)).await;

        assert_eq!(entries.len(), 1);
        assert!(!entries[0].is_success());
        assert!(entries[0].parse_error().unwrap().contains("timed out after 0s"));
        assert_eq!(entries[0].period().map(|p| p.sort_key()), Some((2024, 5)));
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
