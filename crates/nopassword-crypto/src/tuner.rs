//! Latency-driven Argon2 parameter search.
//!
//! [`ArgonAutoTuner`] fixes parallelism to the processor count and memory to
//! the free memory, then raises the time cost one pass at a time until a
//! candidate becomes too slow. The last candidate that stayed under the
//! target latency wins.

use crate::error::CryptoError;
use crate::hashing::Argon2Strategy;
use crate::memory::random_bytes;
use std::time::{Duration, Instant};

/// Trials averaged per candidate.
pub const DEFAULT_TRIALS: u32 = 10;

/// Length of the random probe password used in each trial.
pub const DEFAULT_PROBE_PASSWORD_LEN: usize = 16;

/// Argon2 requires at least 8 KiB of memory per lane.
const MIN_MEMORY_KB_PER_LANE: u32 = 8;

/// Searches for the slowest Argon2 time cost under a latency target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgonAutoTuner {
    /// Lanes, taken from the processor count.
    pub processor_count: u32,
    /// Memory available to a single hash, in bytes.
    pub free_memory_bytes: u64,
    /// Latency the average trial must stay under.
    pub target_latency: Duration,
    /// Trials averaged per candidate.
    pub trials: u32,
    /// Length of the random probe password.
    pub probe_password_len: usize,
}

/// Outcome of a tuning run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TunedArgon2 {
    /// The chosen parameters.
    pub strategy: Argon2Strategy,
    /// Average latency measured for `strategy`. When `within_target` is
    /// `false` this is the latency observed when the search stopped.
    pub average_latency: Duration,
    /// `false` when even a single pass exceeded the target and the first
    /// candidate was returned as a fallback.
    pub within_target: bool,
}

/// Result of timing one candidate.
enum Measurement {
    Within(Duration),
    Exceeded(Duration),
}

impl ArgonAutoTuner {
    /// Tuner over explicit hardware figures.
    #[must_use]
    pub const fn new(processor_count: u32, free_memory_bytes: u64, target_latency: Duration) -> Self {
        Self {
            processor_count,
            free_memory_bytes,
            target_latency,
            trials: DEFAULT_TRIALS,
            probe_password_len: DEFAULT_PROBE_PASSWORD_LEN,
        }
    }

    /// Tuner over the current machine's processor count and available memory.
    #[must_use]
    pub fn from_hardware(target_latency: Duration) -> Self {
        let processors = std::thread::available_parallelism()
            .ok()
            .and_then(|n| u32::try_from(n.get()).ok())
            .unwrap_or(1);

        let mut system = sysinfo::System::new();
        system.refresh_memory();
        let available = system.available_memory();

        tracing::debug!(processors, available_bytes = available, "probed hardware");
        Self::new(processors, available, target_latency)
    }

    /// Memory cost in KiB: free memory, capped at `u32::MAX` and raised to
    /// the Argon2 floor of 8 KiB per lane.
    #[must_use]
    pub fn memory_cost_kb(&self) -> u32 {
        let kib = u32::try_from(self.free_memory_bytes / 1024).unwrap_or(u32::MAX);
        kib.max(MIN_MEMORY_KB_PER_LANE.saturating_mul(self.parallelism()))
    }

    const fn parallelism(&self) -> u32 {
        if self.processor_count == 0 {
            1
        } else {
            self.processor_count
        }
    }

    fn candidate(&self, time_cost: u32) -> Argon2Strategy {
        Argon2Strategy {
            memory_cost_kb: self.memory_cost_kb(),
            time_cost,
            parallelism: self.parallelism(),
            ..Argon2Strategy::default()
        }
    }

    /// Run the search.
    ///
    /// Stops at the first candidate whose average latency reaches the target
    /// or whose single trial exceeds twice the target, and returns the
    /// candidate before it. If `time_cost = 1` already stops the search, that
    /// candidate is returned with `within_target = false`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Calibration`] if no trials are configured, or
    /// any error raised while hashing a candidate.
    pub fn tune(&self) -> Result<TunedArgon2, CryptoError> {
        if self.trials == 0 {
            return Err(CryptoError::Calibration("at least one trial is required".into()));
        }

        let mut previous: Option<TunedArgon2> = None;
        for time_cost in 1..=u32::MAX {
            let candidate = self.candidate(time_cost);
            match self.measure(&candidate)? {
                Measurement::Within(average_latency) => {
                    tracing::debug!(time_cost, ?average_latency, "candidate within target");
                    previous = Some(TunedArgon2 {
                        strategy: candidate,
                        average_latency,
                        within_target: true,
                    });
                }
                Measurement::Exceeded(latency) => {
                    tracing::debug!(time_cost, ?latency, "candidate exceeded target");
                    let tuned = previous.unwrap_or(TunedArgon2 {
                        strategy: candidate,
                        average_latency: latency,
                        within_target: false,
                    });
                    tracing::info!(
                        time_cost = tuned.strategy.time_cost,
                        memory_cost_kb = tuned.strategy.memory_cost_kb,
                        parallelism = tuned.strategy.parallelism,
                        within_target = tuned.within_target,
                        "argon2 parameters tuned"
                    );
                    return Ok(tuned);
                }
            }
        }

        Err(CryptoError::Calibration(
            "time cost exhausted without reaching the target latency".into(),
        ))
    }

    fn measure(&self, candidate: &Argon2Strategy) -> Result<Measurement, CryptoError> {
        let abort_after = self.target_latency.saturating_mul(2);
        let mut total = Duration::ZERO;

        for _ in 0..self.trials {
            let probe = random_bytes(self.probe_password_len)?;
            let start = Instant::now();
            candidate.generate_hash_with_new_salt(&probe)?;
            let elapsed = start.elapsed();

            if elapsed > abort_after {
                return Ok(Measurement::Exceeded(elapsed));
            }
            total = total.saturating_add(elapsed);
        }

        let average = total
            .checked_div(self.trials)
            .ok_or_else(|| CryptoError::Calibration("at least one trial is required".into()))?;
        if average >= self.target_latency {
            Ok(Measurement::Exceeded(average))
        } else {
            Ok(Measurement::Within(average))
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
