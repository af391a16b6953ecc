//! Stress tests for siltkv.
//!
//! These tests verify behavior under heavy load and concurrent access.

use siltkv_core::Store;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations (conflicts included).
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Size of values in bytes.
    pub value_size: usize,
    /// Number of distinct keys.
    pub key_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            value_size: 256,
            key_count: 1_000,
        }
    }
}

fn key(i: usize, key_count: usize) -> Vec<u8> {
    format!("stress:{:06}", i % key_count.max(1)).into_bytes()
}

/// Run a sequential write stress test, one transaction per write.
pub fn stress_sequential_writes(store: &Store, config: &StressConfig) -> StressTestResult {
    let value = vec![0xABu8; config.value_size.max(1)];
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let result = store.begin().and_then(|mut txn| {
            txn.set(&key(i, config.key_count), &value)?;
            txn.commit()
        });
        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a mixed read/write/delete stress test.
pub fn stress_mixed_operations(store: &Store, config: &StressConfig) -> StressTestResult {
    let value = vec![0xCDu8; config.value_size.max(1)];
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let k = key(i, config.key_count);
        let result = store.begin().and_then(|mut txn| {
            match i % 3 {
                0 => txn.set(&k, &value)?,
                1 => match txn.get(&k) {
                    Ok(_) => {}
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e),
                },
                _ => txn.delete(&k)?,
            }
            txn.commit()
        });
        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run concurrent increments of one counter, retrying on conflict.
///
/// Successful operations are committed increments; failed operations are
/// conflicts that were retried. The counter must end at `operations`.
pub fn stress_concurrent_increments(
    store: &Store,
    counter: &[u8],
    config: &StressConfig,
) -> StressTestResult {
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let threads = config.threads.max(1);
    let per_thread = config.operations / threads;

    let start = Instant::now();
    thread::scope(|scope| {
        for _ in 0..threads {
            let store = store.clone();
            let successful = &successful;
            let failed = &failed;
            scope.spawn(move || {
                let mut done = 0;
                while done < per_thread {
                    let result = store.begin().and_then(|mut txn| {
                        txn.inc(counter, 1)?;
                        txn.commit()
                    });
                    match result {
                        Ok(()) => {
                            done += 1;
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) if e.is_retryable() => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => panic!("increment failed: {e}"),
                    }
                }
            });
        }
    });

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Run a large transaction stress test, 100 writes per transaction.
pub fn stress_large_transactions(store: &Store, config: &StressConfig) -> StressTestResult {
    let value = vec![0xEFu8; config.value_size.max(1)];
    let batch_size = 100;
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for batch in 0..(config.operations / batch_size) {
        let result = store.begin().and_then(|mut txn| {
            for i in 0..batch_size {
                txn.set(&key(batch * batch_size + i, config.key_count), &value)?;
            }
            txn.commit()
        });
        match result {
            Ok(()) => successful += batch_size,
            Err(_) => failed += batch_size,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> StressConfig {
        StressConfig {
            operations: 200,
            threads: 4,
            value_size: 16,
            key_count: 50,
        }
    }

    #[test]
    fn sequential_writes() {
        let store = Store::open_in_memory();
        let result = stress_sequential_writes(&store, &small());
        assert_eq!(result.successful_ops, 200);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(store.stats().transactions_committed, 200);
    }

    #[test]
    fn mixed_operations() {
        let store = Store::open_in_memory();
        let result = stress_mixed_operations(&store, &small());
        assert_eq!(result.failed_ops, 0);
    }

    #[test]
    fn concurrent_increments_lose_nothing() {
        let store = Store::open_in_memory();
        let result = stress_concurrent_increments(&store, b"counter", &small());
        assert_eq!(result.successful_ops, 200);
        assert_eq!(store.stats().conflicts as usize, result.failed_ops);

        let mut txn = store.begin().unwrap();
        assert_eq!(txn.get(b"counter").unwrap(), b"200");
    }

    #[test]
    fn large_transactions() {
        let store = Store::open_in_memory();
        let config = StressConfig {
            key_count: 1_000,
            ..small()
        };
        let result = stress_large_transactions(&store, &config);
        assert_eq!(result.successful_ops, 200);
        assert_eq!(store.stats().keys_written, 200);
    }
}
