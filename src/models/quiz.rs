//! Sorting-quiz model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A single "which bin does this go in" question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Quiz {
    /// Document ID
    pub id: String,
    /// Item to sort (e.g. "banana peel")
    pub item: String,
    /// Correct bin
    pub answer: String,
    /// Bins offered as choices
    pub bins: Vec<String>,
}
