//! Merge Events
//!
//! What a proximity scan or a merge resolution produced.

use serde::Serialize;

use super::surface::TokenHandle;
use crate::catalog::Item;
use crate::geometry::Point;

/// Broadcast once per successful merge
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeEvent {
    /// Item produced by the merge
    pub result: Item,
    /// The two tokens that were consumed
    pub consumed: [TokenHandle; 2],
    /// Token created for the result
    pub token: TokenHandle,
    /// Midpoint of the consumed tokens, where the result was placed
    pub position: Point,
    /// First time this item was produced
    pub newly_unlocked: bool,
}

/// Outcome of a merge resolution
#[derive(Debug, Clone)]
pub enum MergeOutcome {
    Merged(MergeEvent),
    /// A token was already consumed or locked by another merge, or the
    /// surface was cleared before the pair was swapped. Nothing changed.
    Aborted,
}

/// Outcome of a proximity scan
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// The scanned token was removed or locked before the scan ran
    Skipped,
    /// Nothing within reach
    NoCandidates,
    /// Tokens within reach, but no recipe combines them
    NoRecipe,
    Merged(MergeEvent),
    Aborted,
}

impl ScanOutcome {
    pub fn merged(&self) -> Option<&MergeEvent> {
        match self {
            ScanOutcome::Merged(event) => Some(event),
            _ => None,
        }
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ScanOutcome::Skipped => "skipped",
            ScanOutcome::NoCandidates => "no_candidates",
            ScanOutcome::NoRecipe => "no_recipe",
            ScanOutcome::Merged(_) => "merged",
            ScanOutcome::Aborted => "aborted",
        }
    }
}

impl From<MergeOutcome> for ScanOutcome {
    fn from(outcome: MergeOutcome) -> Self {
        match outcome {
            MergeOutcome::Merged(event) => ScanOutcome::Merged(event),
            MergeOutcome::Aborted => ScanOutcome::Aborted,
        }
    }
}
