//! # Best-Image Selector
//!
//! Decodes and scores every item of a batch, then folds the scores into a
//! single winner with the comparator *(higher `overall`, then lower index)*.
//!
//! Items are independent: a payload that fails to decode or score is recorded
//! as an [`ItemFailure`] and skipped. The request only fails when fewer than
//! two items remain usable.
//!
//! Scoring may run on the rayon pool. Scores are collected back in submission
//! order before the fold, so the winner never depends on scheduling.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use super::quality::{QualityScore, QualityScorer};
use crate::codec::{MediaBlob, MediaKind, decode_image};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Smallest batch the selector accepts.
pub const MIN_BATCH: usize = 2;

#[derive(Debug, Clone, Serialize)]
pub struct ScoredImage {
    pub index: usize,
    #[serde(flatten)]
    pub score: QualityScore,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub index: usize,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestImageResult {
    pub index: usize,
    pub overall_score: f64,
    /// Per-item scores, in submission order, for every usable item.
    pub scores: Vec<ScoredImage>,
    /// Items that could not be decoded or scored.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ItemFailure>,
}

/// True when `a` beats `b`: strictly higher score, or equal score and lower index.
pub fn ranks_before(a: &ScoredImage, b: &ScoredImage) -> bool {
    match a.score.overall.total_cmp(&b.score.overall) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => a.index < b.index,
    }
}

/// Fold scored items into the winner. `None` only for an empty slice.
pub fn select_best(scored: &[ScoredImage]) -> Option<&ScoredImage> {
    scored.iter().fold(None, |best, candidate| match best {
        Some(current) if !ranks_before(candidate, current) => Some(current),
        _ => Some(candidate),
    })
}

fn score_item(scorer: &mut QualityScorer, payload: &str, config: &EngineConfig) -> EngineResult<QualityScore> {
    let blob = MediaBlob::from_transport(MediaKind::Image, payload, config.image.max_input_bytes)?;
    let buffer = decode_image(&blob, &config.image)?;
    scorer.score(&buffer)
}

/// Score a batch of transport-encoded images and pick the best one.
pub fn find_best<S>(images: &[S], config: &EngineConfig) -> EngineResult<BestImageResult>
where
    S: AsRef<str> + Sync,
{
    if images.len() < MIN_BATCH {
        return Err(EngineError::invalid_argument(format!(
            "at least {} images are required, got {}",
            MIN_BATCH,
            images.len()
        )));
    }

    let outcomes: Vec<EngineResult<QualityScore>> = if config.scoring.parallel {
        images
            .par_iter()
            .map_init(QualityScorer::new, |scorer, payload| {
                score_item(scorer, payload.as_ref(), config)
            })
            .collect()
    } else {
        let mut scorer = QualityScorer::new();
        images
            .iter()
            .map(|payload| score_item(&mut scorer, payload.as_ref(), config))
            .collect()
    };

    let mut scores = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(score) => {
                debug!(index, ?score, "scored image");
                scores.push(ScoredImage { index, score });
            }
            Err(err) => {
                warn!(index, kind = err.kind().name(), %err, "skipping image");
                failures.push(ItemFailure {
                    index,
                    kind: err.kind().name(),
                    message: err.to_string(),
                });
            }
        }
    }

    if scores.len() < MIN_BATCH {
        let detail = failures
            .iter()
            .map(|f| format!("#{}: {}", f.index, f.message))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(EngineError::insufficient_input(format!(
            "only {} of {} images could be analysed ({})",
            scores.len(),
            images.len(),
            detail
        ))
        .with_recovery_suggestion("submit at least two decodable images of 3x3 pixels or more"));
    }

    let best = select_best(&scores).ok_or_else(|| EngineError::internal("no scored images"))?;
    let (index, overall_score) = (best.index, best.score.overall);
    Ok(BestImageResult { index, overall_score, scores, failures })
}
