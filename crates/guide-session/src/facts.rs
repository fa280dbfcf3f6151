//! Fun fact history and the bounded duplicate-avoidance loop.

use guide_gateway::{GatewayError, ModelGateway};

/// Facts already surfaced during this session, in the order accepted.
#[derive(Debug, Clone, Default)]
pub struct FactHistory {
    facts: Vec<String>,
}

impl FactHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact string match.
    pub fn contains(&self, fact: &str) -> bool {
        self.facts.iter().any(|f| f == fact)
    }

    /// Returns `false` if the fact was already present.
    pub fn insert(&mut self, fact: impl Into<String>) -> bool {
        let fact = fact.into();
        if self.contains(&fact) {
            return false;
        }
        self.facts.push(fact);
        true
    }

    pub fn facts(&self) -> &[String] {
        &self.facts
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// Result of one fact request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactOutcome {
    /// A fresh fact, already recorded in the history.
    Accepted { fact: String, attempts: u32 },
    /// Every attempt returned a fact that had been seen before.
    Exhausted { attempts: u32 },
}

/// Re-prompts the model until it produces a fact not yet in the history.
#[derive(Debug, Clone, Copy)]
pub struct FactDeduplicator {
    max_attempts: u32,
}

impl Default for FactDeduplicator {
    fn default() -> Self {
        Self::new(5)
    }
}

impl FactDeduplicator {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Ask for facts until one is new or the attempt bound is reached.
    ///
    /// A provider failure ends the loop immediately; the history is only
    /// changed when a fact is accepted.
    pub async fn next_fact(
        &self,
        gateway: &dyn ModelGateway,
        history: &mut FactHistory,
    ) -> Result<FactOutcome, GatewayError> {
        for attempt in 1..=self.max_attempts {
            let fact = gateway.generate_fact().await?;
            if history.insert(fact.clone()) {
                tracing::info!(attempt, known = history.len(), "Fresh fun fact accepted");
                return Ok(FactOutcome::Accepted {
                    fact,
                    attempts: attempt,
                });
            }
            tracing::debug!(attempt, "Duplicate fun fact discarded");
        }

        tracing::info!(
            attempts = self.max_attempts,
            "No fresh fun fact within the attempt limit"
        );
        Ok(FactOutcome::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
