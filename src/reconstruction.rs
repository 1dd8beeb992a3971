//! Ground-truth reconstruction for sparse lab measurements.
//!
//! Lab samples are taken on a handful of days; every other day in a
//! monitoring context gets an NPK estimate by linear interpolation between
//! the two nearest sampled days (anchors). Interpolation runs over the
//! record's position index in the ordered sequence, not wall-clock time, so
//! a missing day shifts nothing but its own slot.
//!
//! Days before the first anchor or after the last one are dropped: there is
//! no extrapolation and no default value. Anchor days are copied verbatim.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::EngineError;
use crate::models::{DailyRecord, LabSample, Npk, ReadingSource, ReconstructedReading};
use crate::validation::validate_npk;

// ---

/// Minimum number of anchors needed to interpolate anything.
pub const MIN_ANCHORS: usize = 2;

/// Reconstruction of one monitoring context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconstruction {
    // ---
    /// One entry per interpolatable record, in input order.
    pub readings: Vec<ReconstructedReading>,
    /// Number of records with a matching lab sample.
    pub anchor_count: usize,
}

impl Reconstruction {
    /// Reports [`EngineError::InsufficientAnchors`] when the context had
    /// too few lab samples to produce any readings.
    pub fn insufficient_anchors(&self) -> Option<EngineError> {
        // ---
        (self.anchor_count < MIN_ANCHORS).then_some(EngineError::InsufficientAnchors {
            found: self.anchor_count,
        })
    }
}

/// Result of reconstructing one context out of a mixed record set.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextReconstruction {
    pub context: String,
    pub result: Result<Reconstruction, EngineError>,
}

/// Index lab samples by label. The first sample wins on a duplicate label.
pub fn index_samples(samples: &[LabSample]) -> HashMap<String, Npk> {
    // ---
    let mut index = HashMap::with_capacity(samples.len());
    for sample in samples {
        if index.contains_key(&sample.sample_label) {
            warn!("Duplicate lab sample label '{}' ignored", sample.sample_label);
            continue;
        }
        index.insert(sample.sample_label.clone(), sample.npk());
    }
    index
}

/// Reconstruct NPK values for one context.
///
/// `records` must be strictly ascending by timestamp. `samples` maps sample
/// labels to measured values; labels with no matching record are ignored,
/// and records whose label has no sample are treated as unsampled days.
///
/// Returns `Ok` with an empty reading set when fewer than two anchors exist;
/// see [`Reconstruction::insufficient_anchors`].
pub fn reconstruct(
    records: &[DailyRecord],
    samples: &HashMap<String, Npk>,
) -> Result<Reconstruction, EngineError> {
    // ---
    check_order(records)?;

    let mut anchors: Vec<(usize, Npk)> = Vec::new();
    for (pos, record) in records.iter().enumerate() {
        let Some((label, npk)) = record
            .sample_label
            .as_ref()
            .and_then(|l| samples.get(l).map(|npk| (l, npk)))
        else {
            continue;
        };
        validate_npk(label, npk)?;
        anchors.push((pos, *npk));
    }

    if anchors.len() < MIN_ANCHORS {
        debug!(
            "Skipping reconstruction: {} anchor(s) across {} records",
            anchors.len(),
            records.len()
        );
        return Ok(Reconstruction {
            readings: Vec::new(),
            anchor_count: anchors.len(),
        });
    }

    let first = anchors[0].0;
    let last = anchors[anchors.len() - 1].0;
    let mut readings = Vec::with_capacity(last - first + 1);

    for pair in anchors.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        readings.push(anchor_reading(&records[start.0], &start.1));
        for pos in (start.0 + 1)..end.0 {
            let npk = Npk::new(
                lerp(pos, (start.0, start.1.n), (end.0, end.1.n)),
                lerp(pos, (start.0, start.1.p), (end.0, end.1.p)),
                lerp(pos, (start.0, start.1.k), (end.0, end.1.k)),
            );
            readings.push(ReconstructedReading {
                record_id: records[pos].id,
                timestamp: records[pos].timestamp,
                n: npk.n,
                p: npk.p,
                k: npk.k,
                source: ReadingSource::Interpolated,
            });
        }
    }
    readings.push(anchor_reading(&records[last], &anchors[anchors.len() - 1].1));

    debug!(
        "Reconstructed {} of {} records from {} anchors",
        readings.len(),
        records.len(),
        anchors.len()
    );

    Ok(Reconstruction {
        readings,
        anchor_count: anchors.len(),
    })
}

/// Group a mixed record set by context and reconstruct each one.
///
/// Records within a context are sorted by timestamp first. Contexts are
/// independent; results come back ordered by context label.
pub fn reconstruct_all(
    records: &[DailyRecord],
    samples: &HashMap<String, Npk>,
) -> Vec<ContextReconstruction> {
    // ---
    let mut contexts: BTreeMap<&str, Vec<DailyRecord>> = BTreeMap::new();
    for record in records {
        contexts
            .entry(record.context.as_str())
            .or_default()
            .push(record.clone());
    }

    contexts
        .into_iter()
        .map(|(context, mut group)| {
            group.sort_by_key(|r| r.timestamp);
            ContextReconstruction {
                context: context.to_string(),
                result: reconstruct(&group, samples),
            }
        })
        .collect()
}

fn check_order(records: &[DailyRecord]) -> Result<(), EngineError> {
    // ---
    match records
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        Some(i) => Err(EngineError::UnorderedRecords { index: i + 1 }),
        None => Ok(()),
    }
}

fn anchor_reading(record: &DailyRecord, npk: &Npk) -> ReconstructedReading {
    // ---
    ReconstructedReading {
        record_id: record.id,
        timestamp: record.timestamp,
        n: npk.n,
        p: npk.p,
        k: npk.k,
        source: ReadingSource::Anchor,
    }
}

/// Linear interpolation at `pos` between two (position, value) anchors.
///
/// Weighted form keeps integer-spaced inputs exact.
fn lerp(pos: usize, (x0, y0): (usize, f64), (x1, y1): (usize, f64)) -> f64 {
    // ---
    let span = (x1 - x0) as f64;
    let before = (x1 - pos) as f64;
    let after = (pos - x0) as f64;
    (y0 * before + y1 * after) / span
}
