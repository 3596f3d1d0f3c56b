//! Response resolution strategies.
//!
//! A [`Resolver`] decides which [`MockResponse`] an endpoint emits on each
//! invocation. Three strategies cover the config surface:
//!
//! - [`StaticResolver`]: the same response, every call
//! - [`WeightedResolver`]: a random pick, biased by per-entry weights
//! - [`SequencedResolver`]: responses in declared order, then loop or
//!   repeat the last entry
//!
//! The sequenced cursor is the only mutable state in the crate's core; it
//! is guarded by a mutex held just long enough to read and advance the
//! index, never across a delay or a body write.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::response::MockResponse;

/// Strategy interface: produce the response for the next call.
///
/// Implementations are shared across concurrent request tasks, so `next`
/// takes `&self`; any per-call state lives behind interior mutability.
pub trait Resolver: Send + Sync {
    fn next(&self) -> MockResponse;
}

// ── Number source ────────────────────────────────────────────────────────────

/// Uniform integer source backing the weighted strategy.
///
/// Injected at construction so tests can script exact draws. The contract:
/// `draw(bound)` returns a value in `[0, bound)` for `bound >= 1`, and is
/// safe to call from concurrent requests.
pub trait NumberSource: Send + Sync {
    fn draw(&self, bound: u64) -> u64;
}

/// Process-default source over the thread-local rand generator: fresh
/// entropy per process, nothing persisted, safe from any thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSource;

impl NumberSource for ThreadRngSource {
    fn draw(&self, bound: u64) -> u64 {
        rand::thread_rng().gen_range(0..bound)
    }
}

// ── Static ───────────────────────────────────────────────────────────────────

/// Wraps exactly one response and returns it unchanged forever.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    response: MockResponse,
}

impl StaticResolver {
    pub fn new(response: MockResponse) -> Self {
        Self { response }
    }
}

impl Resolver for StaticResolver {
    fn next(&self) -> MockResponse {
        self.response.clone()
    }
}

// ── Weighted ─────────────────────────────────────────────────────────────────

/// Picks a response at random, with probability weight/total per entry.
///
/// Construction builds a cumulative-weight index once; a draw from
/// `[0, total)` then maps onto the first entry whose cumulative bound
/// exceeds it. Entry order is preserved, so a scripted source reproduces
/// the exact same picks run after run.
pub struct WeightedResolver {
    responses: Vec<MockResponse>,
    cumulative: Vec<u64>,
    total: u64,
    source: Box<dyn NumberSource>,
}

impl WeightedResolver {
    /// Build with the process-default random source.
    pub fn new(entries: Vec<(MockResponse, u32)>) -> Result<Self, ValidationError> {
        Self::with_source(entries, Box::new(ThreadRngSource))
    }

    /// Build with an explicit number source (deterministic in tests).
    pub fn with_source(
        entries: Vec<(MockResponse, u32)>,
        source: Box<dyn NumberSource>,
    ) -> Result<Self, ValidationError> {
        if entries.is_empty() {
            return Err(ValidationError::EmptyWeighted);
        }

        let mut responses = Vec::with_capacity(entries.len());
        let mut cumulative = Vec::with_capacity(entries.len());
        let mut total: u64 = 0;
        for (index, (response, weight)) in entries.into_iter().enumerate() {
            if weight == 0 {
                return Err(ValidationError::ZeroWeight { index });
            }
            total += u64::from(weight);
            cumulative.push(total);
            responses.push(response);
        }

        Ok(Self {
            responses,
            cumulative,
            total,
            source,
        })
    }
}

// The number source is a trait object with no Debug bound; format the
// weight table only.
impl fmt::Debug for WeightedResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedResolver")
            .field("responses", &self.responses)
            .field("cumulative", &self.cumulative)
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

impl Resolver for WeightedResolver {
    fn next(&self) -> MockResponse {
        let draw = self.source.draw(self.total);
        for (index, &bound) in self.cumulative.iter().enumerate() {
            if draw < bound {
                return self.responses[index].clone();
            }
        }
        // Unreachable for any draw in [0, total): the scan only exhausts
        // when the injected source broke its contract.
        panic!(
            "number source violated its contract: drew {draw} with bound {}",
            self.total
        );
    }
}

// ── Sequenced ────────────────────────────────────────────────────────────────

/// What a sequenced resolver does once the final entry has been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndBehavior {
    /// Restart from the first entry.
    #[default]
    Loop,
    /// Keep replaying the final entry.
    RepeatLast,
}

/// Emits responses in declared order, one per call.
///
/// The cursor always holds a valid index into `responses`; each call
/// captures the current index and advances it inside one critical
/// section, so concurrent callers each observe a distinct step of the
/// sequence.
#[derive(Debug)]
pub struct SequencedResolver {
    responses: Vec<MockResponse>,
    end_behavior: EndBehavior,
    cursor: Mutex<usize>,
}

impl SequencedResolver {
    pub fn new(
        responses: Vec<MockResponse>,
        end_behavior: EndBehavior,
    ) -> Result<Self, ValidationError> {
        if responses.is_empty() {
            return Err(ValidationError::EmptySequence);
        }
        Ok(Self {
            responses,
            end_behavior,
            cursor: Mutex::new(0),
        })
    }
}

impl Resolver for SequencedResolver {
    fn next(&self) -> MockResponse {
        let emitted = {
            // A poisoned lock still holds a valid index; recover it.
            let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
            let current = *cursor;
            *cursor = if current + 1 < self.responses.len() {
                current + 1
            } else {
                match self.end_behavior {
                    EndBehavior::Loop => 0,
                    EndBehavior::RepeatLast => current,
                }
            };
            current
        };
        // Clone outside the critical section: a large body must not
        // extend the time the cursor is held.
        self.responses[emitted].clone()
    }
}
