//! chainline decode metrics.
//!
//! Counters for host round trips, decoded descriptors, and scratch pool
//! churn. Exposed via Prometheus when registered with an admin server.

use metriken::{metric, Counter};

// ── Decode ───────────────────────────────────────────────────────

#[metric(
    name = "chainline/decode/round_trips",
    description = "Host round trips completed"
)]
pub static ROUND_TRIPS: Counter = Counter::new();

#[metric(
    name = "chainline/decode/descriptors_memory",
    description = "Memory-backed descriptors decoded"
)]
pub static DESCRIPTORS_MEMORY: Counter = Counter::new();

#[metric(
    name = "chainline/decode/descriptors_file",
    description = "File-backed descriptors decoded"
)]
pub static DESCRIPTORS_FILE: Counter = Counter::new();

#[metric(
    name = "chainline/decode/invalid_chain",
    description = "Decodes failed by a host protocol error"
)]
pub static INVALID_CHAIN: Counter = Counter::new();

// ── Scratch pool ─────────────────────────────────────────────────

#[metric(
    name = "chainline/scratch/reused",
    description = "Scratch buffers served from the free list"
)]
pub static SCRATCH_REUSED: Counter = Counter::new();

#[metric(
    name = "chainline/scratch/allocated",
    description = "Scratch buffers newly allocated"
)]
pub static SCRATCH_ALLOCATED: Counter = Counter::new();
