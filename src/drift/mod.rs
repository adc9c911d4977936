//! Drift detection over stored glyph vectors.
//!
//! [`detect_drift`] stacks the vectors of a sigil into a matrix, clusters them
//! with [`dbscan`](dbscan::dbscan), smooths them with an [`ewma`](ewma::ewma),
//! and flags every glyph that is an outlier, moves fast, has no lineage, or
//! has not been touched in a while.

pub mod dbscan;
pub mod ewma;

use ndarray::{Array2, Axis};
use serde::Serialize;

use crate::config::DriftConfig;
use crate::error::{AlchemyError, AlchemyResult};
use crate::glyph::Glyph;
use crate::vault::VaultStore;

const SECONDS_PER_DAY: f64 = 24.0 * 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriftCategory {
    /// Noise point: belongs to no density cluster.
    Drifting,
    #[serde(rename = "Rapid Drift")]
    RapidDrift,
    /// Lineage depth of zero (never evolved from anything).
    Unlinked,
    Stale,
}

impl DriftCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drifting => "Drifting",
            Self::RapidDrift => "Rapid Drift",
            Self::Unlinked => "Unlinked",
            Self::Stale => "Stale",
        }
    }
}

impl std::fmt::Display for DriftCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftStatus {
    Ok,
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriftedGlyph {
    pub name: String,
    pub categories: Vec<DriftCategory>,
    pub drift_score: f64,
    pub cluster: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub status: DriftStatus,
    pub drifted: Vec<DriftedGlyph>,
    pub total: usize,
    /// Same entries as `drifted`; kept for dashboard clients.
    pub details: Vec<DriftedGlyph>,
}

impl DriftReport {
    pub fn empty() -> Self {
        Self {
            status: DriftStatus::Empty,
            drifted: Vec::new(),
            total: 0,
            details: Vec::new(),
        }
    }
}

/// Classify `glyphs` (in stored order) into drift categories.
///
/// `now` is in unix seconds. Glyphs without a timestamp are treated as fresh;
/// glyphs without a lineage depth count as unlinked.
pub fn detect_drift(glyphs: &[Glyph], now: f64, config: &DriftConfig) -> AlchemyResult<DriftReport> {
    if glyphs.is_empty() {
        return Ok(DriftReport::empty());
    }

    let x = stack_vectors(glyphs)?;
    let labels = dbscan::dbscan(&x, config.eps, config.min_samples);
    let smoothed = ewma::ewma(&x, config.ewma_alpha);
    let scores = (&x - &smoothed)
        .mapv(f64::abs)
        .mean_axis(Axis(1))
        .map(|m| m.to_vec())
        // zero-dimensional vectors cannot drift
        .unwrap_or_else(|| vec![0.0; glyphs.len()]);

    let stale_after = config.stale_after_days as f64 * SECONDS_PER_DAY;
    let mut drifted = Vec::new();
    for ((glyph, &cluster), &score) in glyphs.iter().zip(&labels).zip(&scores) {
        let mut categories = Vec::new();
        if cluster == dbscan::NOISE {
            categories.push(DriftCategory::Drifting);
        }
        if score > config.rapid_threshold {
            categories.push(DriftCategory::RapidDrift);
        }
        if glyph.lineage_depth.unwrap_or(0) == 0 {
            categories.push(DriftCategory::Unlinked);
        }
        if now - glyph.timestamp.unwrap_or(now) > stale_after {
            categories.push(DriftCategory::Stale);
        }
        if !categories.is_empty() {
            drifted.push(DriftedGlyph {
                name: glyph.name.clone(),
                categories,
                drift_score: score,
                cluster,
            });
        }
    }

    tracing::info!(total = glyphs.len(), drifted = drifted.len(), "drift detection complete");
    Ok(DriftReport {
        status: DriftStatus::Ok,
        details: drifted.clone(),
        drifted,
        total: glyphs.len(),
    })
}

/// Run [`detect_drift`] over a stored sigil. A missing or empty sigil yields
/// an empty report rather than an error.
pub fn detect_sigil_drift(
    store: &VaultStore,
    sigil: &str,
    now: f64,
    config: &DriftConfig,
) -> AlchemyResult<DriftReport> {
    let glyphs = store.restore_or_empty(sigil)?;
    detect_drift(&glyphs, now, config)
}

fn stack_vectors(glyphs: &[Glyph]) -> AlchemyResult<Array2<f64>> {
    let dims = glyphs[0].dims();
    let mut flat = Vec::with_capacity(glyphs.len() * dims);
    for glyph in glyphs {
        if glyph.dims() != dims {
            return Err(AlchemyError::DimensionMismatch {
                name: glyph.name.clone(),
                expected: dims,
                found: glyph.dims(),
            });
        }
        flat.extend_from_slice(&glyph.vector);
    }
    Array2::from_shape_vec((glyphs.len(), dims), flat)
        .map_err(|e| AlchemyError::Validation(format!("cannot stack glyph vectors: {e}")))
}
