use std::ops::Range;
use std::sync::Arc;

use crate::{
    dataset::{FastaContent, FastaDataset},
    error::{Error, Result},
};

/// Trait for collections of FASTA files that can be processed in parallel
///
/// This is implemented by the **reader** not by the **processor**.
/// For the **processor**, see the [`ParallelProcessor`] trait.
pub trait ParallelReader {
    fn process_parallel<P: ParallelProcessor + Clone + 'static>(
        self,
        processor: P,
        num_threads: usize,
    ) -> Result<()>;

    fn process_parallel_range<P: ParallelProcessor + Clone + 'static>(
        self,
        processor: P,
        num_threads: usize,
        range: Range<usize>,
    ) -> Result<()>;
}

/// Trait for types that can process files in parallel.
///
/// This is implemented by the **processor** not by the **reader**.
/// For the **reader**, see the [`ParallelReader`] trait.
pub trait ParallelProcessor: Send + Clone {
    /// Process a single parsed file
    ///
    /// `index` is the position of the file in the whole collection, independent of the
    /// thread it runs on, so it can seed per-file random streams.
    fn process_file(&mut self, index: usize, content: FastaContent) -> Result<()>;

    /// Called when a thread finishes processing its batch
    /// Default implementation does nothing
    #[allow(unused_variables)]
    fn on_batch_complete(&mut self) -> Result<()> {
        Ok(())
    }

    /// Set the thread ID for this processor
    ///
    /// Each thread should call this method with its own unique ID.
    #[allow(unused_variables)]
    fn set_tid(&mut self, _tid: usize) {
        // Default implementation does nothing
    }

    /// Get the thread ID for this processor
    fn get_tid(&self) -> Option<usize> {
        None
    }
}

/// Resolves the requested thread count: zero means every CPU
fn thread_count(num_threads: usize) -> usize {
    if num_threads == 0 {
        num_cpus::get()
    } else {
        num_threads.min(num_cpus::get())
    }
}

impl ParallelReader for FastaDataset {
    fn process_parallel<P: ParallelProcessor + Clone + 'static>(
        self,
        processor: P,
        num_threads: usize,
    ) -> Result<()> {
        let num_files = self.len();
        self.process_parallel_range(processor, num_threads, 0..num_files)
    }

    /// Process files in parallel within a specified range
    ///
    /// The range is split into contiguous chunks, one per thread. Each file is parsed
    /// on the thread that processes it.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If all files were processed successfully
    /// * `Err(Error)` - The first error raised by a worker, or [`Error::WorkerPanic`]
    fn process_parallel_range<P: ParallelProcessor + Clone + 'static>(
        self,
        processor: P,
        num_threads: usize,
        range: Range<usize>,
    ) -> Result<()> {
        let num_threads = thread_count(num_threads);

        // Ranges running past the end are clamped to the dataset
        let range_end = range.end.min(self.len());
        let range_start = range.start;
        if range_start >= range_end {
            return Ok(()); // Nothing to process
        }

        // Calculate number of files for each thread within the range
        let range_size = range_end - range_start;
        let files_per_thread = range_size.div_ceil(num_threads);

        let dataset = Arc::new(self);

        // Build thread handles
        let mut handles = Vec::new();
        for tid in 0..num_threads {
            let mut processor = processor.clone();
            let dataset = Arc::clone(&dataset);
            processor.set_tid(tid);

            let handle = std::thread::spawn(move || -> Result<()> {
                let start_idx = range_start + tid * files_per_thread;
                let end_idx = (start_idx + files_per_thread).min(range_end);

                if start_idx >= end_idx {
                    return Ok(()); // No files for this thread
                }

                for (idx, path) in dataset.fasta_files()[start_idx..end_idx]
                    .iter()
                    .enumerate()
                {
                    let content = FastaContent::load(path)?;
                    processor.process_file(start_idx + idx, content)?;
                }
                processor.on_batch_complete()?;
                Ok(())
            });

            handles.push(handle);
        }

        for handle in handles {
            handle.join().map_err(|_| Error::WorkerPanic)??;
        }

        Ok(())
    }
}

#[cfg(test)]
mod testing {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use anyhow::Result;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct CountingProcessor {
        local_records: usize,
        records: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<(usize, String)>>>,
        tid: Option<usize>,
    }
    impl ParallelProcessor for CountingProcessor {
        fn process_file(&mut self, index: usize, content: FastaContent) -> crate::Result<()> {
            self.local_records += content.records().len();
            self.seen.lock().push((index, content.name()));
            Ok(())
        }
        fn on_batch_complete(&mut self) -> crate::Result<()> {
            self.records
                .fetch_add(self.local_records, Ordering::Relaxed);
            self.local_records = 0;
            Ok(())
        }
        fn set_tid(&mut self, tid: usize) {
            self.tid = Some(tid);
        }
        fn get_tid(&self) -> Option<usize> {
            self.tid
        }
    }

    #[derive(Clone)]
    struct FailingProcessor;
    impl ParallelProcessor for FailingProcessor {
        fn process_file(&mut self, _index: usize, _content: FastaContent) -> crate::Result<()> {
            Err(anyhow::anyhow!("refused").into())
        }
    }

    fn dataset(n: usize) -> Result<(tempfile::TempDir, FastaDataset)> {
        let dir = tempfile::tempdir()?;
        for i in 0..n {
            let records = ">a\nACGT\n".repeat(i + 1);
            fs::write(dir.path().join(format!("test{i}.fasta")), records)?;
        }
        let dataset = FastaDataset::new(dir.path())?;
        Ok((dir, dataset))
    }

    #[test]
    fn test_every_file_processed_once() -> Result<()> {
        let (_dir, dataset) = dataset(7)?;
        let processor = CountingProcessor::default();
        dataset.process_parallel(processor.clone(), 3)?;

        assert_eq!(processor.records.load(Ordering::Relaxed), 28);
        let mut seen = processor.seen.lock().clone();
        seen.sort();
        let expected: Vec<(usize, String)> =
            (0..7).map(|i| (i, format!("test{i}.fasta"))).collect();
        assert_eq!(seen, expected);
        Ok(())
    }

    #[test]
    fn test_range() -> Result<()> {
        let (_dir, dataset) = dataset(5)?;
        let processor = CountingProcessor::default();
        dataset.clone().process_parallel_range(processor.clone(), 0, 1..3)?;
        let mut indices: Vec<usize> = processor.seen.lock().iter().map(|(i, _)| *i).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![1, 2]);

        // ranges running past the end are clamped
        let tail = CountingProcessor::default();
        dataset.clone().process_parallel_range(tail.clone(), 2, 3..10)?;
        let mut indices: Vec<usize> = tail.seen.lock().iter().map(|(i, _)| *i).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![3, 4]);

        // empty or fully out-of-range ranges are a no-op
        let empty = CountingProcessor::default();
        dataset.clone().process_parallel_range(empty.clone(), 2, 5..10)?;
        dataset.process_parallel_range(empty.clone(), 2, 2..2)?;
        assert!(empty.seen.lock().is_empty());
        Ok(())
    }

    #[test]
    fn test_worker_error_propagates() -> Result<()> {
        let (_dir, dataset) = dataset(2)?;
        assert!(dataset.process_parallel(FailingProcessor, 2).is_err());
        Ok(())
    }

    #[test]
    fn test_thread_count() {
        assert_eq!(thread_count(0), num_cpus::get());
        assert_eq!(thread_count(1), 1);
        assert!(thread_count(usize::MAX) <= num_cpus::get());
    }
}
