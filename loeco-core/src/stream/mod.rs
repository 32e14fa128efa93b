//! Stream processing for telemetry events
//!
//! Upstream telemetry arrives as a push-based event stream with no delivery
//! guarantees. This module turns the raw transport body into message
//! payloads; decoding them into observations is [`crate::extract`]'s job.
//!
//! ## Module Organization
//!
//! - `sse` - Server-Sent Events framing over any [`std::io::BufRead`]

pub mod sse;

pub use sse::{SseParser, SseStats};

use std::io::BufRead;

use crate::extract::extract_message;
use crate::observation::Observation;

/// Counters for one stream read, framing plus decoding
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    /// Framing counters
    pub stream: SseStats,
    /// Messages that decoded into an observation
    pub observations: usize,
    /// Messages dropped as malformed or irrelevant
    pub dropped: usize,
}

/// Drain an event stream into observations.
///
/// Malformed messages are counted and skipped. A transport error aborts the
/// read and is returned; nothing read so far is kept.
pub fn read_observations<R: BufRead>(reader: R) -> std::io::Result<(Vec<Observation>, IngestStats)> {
    let mut parser = SseParser::new(reader);
    let mut observations = Vec::new();
    let mut dropped = 0;

    for message in parser.by_ref() {
        match extract_message(&message?) {
            Some(obs) => observations.push(obs),
            None => dropped += 1,
        }
    }

    let stats = IngestStats {
        stream: parser.stats().clone(),
        observations: observations.len(),
        dropped,
    };
    log::info!(
        "event stream: {} lines, {} messages, {} observations, {} dropped",
        stats.stream.lines_read,
        stats.stream.messages_emitted,
        stats.observations,
        stats.dropped
    );
    Ok((observations, stats))
}
