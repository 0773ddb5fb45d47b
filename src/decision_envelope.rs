// =============================================================================
// Decision Envelope - Auditable record of every signal/no-signal evaluation
// =============================================================================
//
// Each evaluation that changes the published signal is captured with the
// gate that decided it, so the decision history can be replayed after the
// fact.  Envelopes are immutable once created.
// =============================================================================

use serde::Serialize;

use crate::engine::Evaluation;
use crate::types::SignalType;

/// Complete auditable record of one evaluation outcome.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionEnvelope {
    /// Unique identifier for this decision (UUID v4).
    pub id: String,

    /// Instrument the decision pertains to.
    pub asset: String,

    pub signal: SignalType,

    /// Confluence score at decision time.
    pub score: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<f64>,

    /// "SIGNAL" or "NO_SIGNAL".
    pub final_decision: String,

    /// Which gate blocked the signal (if blocked).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_gate: Option<String>,

    /// Human-readable reason for the decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// ISO 8601 timestamp of when this decision was created.
    pub created_at: String,
}

impl DecisionEnvelope {
    /// Record a signal that passed every gate.
    pub fn signal(asset: impl Into<String>, signal: SignalType, score: u32, entry: Option<f64>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            asset: asset.into(),
            signal,
            score,
            entry,
            final_decision: "SIGNAL".to_string(),
            blocking_gate: None,
            reason: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Record an evaluation that a gate held back.
    pub fn blocked(
        asset: impl Into<String>,
        score: u32,
        blocking_gate: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            asset: asset.into(),
            signal: SignalType::None,
            score,
            entry: None,
            final_decision: "NO_SIGNAL".to_string(),
            blocking_gate: Some(blocking_gate.into()),
            reason: Some(reason.into()),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Build the envelope matching an evaluation's verdict.
    pub fn from_evaluation(asset: &str, evaluation: &Evaluation) -> Self {
        let state = &evaluation.snapshot.confluence;
        if evaluation.verdict.passed() {
            Self::signal(asset, state.signal, state.score, state.entry)
        } else {
            Self::blocked(
                asset,
                state.score,
                evaluation.verdict.gate_name(),
                evaluation.verdict.to_string(),
            )
        }
    }
}
