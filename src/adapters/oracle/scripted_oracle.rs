//! Scripted Oracle - Deterministic extraction for tests and demos.
//!
//! Replays a queue of pre-built responses, one per call, then returns
//! empty responses once the script runs out. Lets turn-flow tests
//! exercise the full pipeline without a network or a model.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::ports::{ExtractionError, ExtractionRequest, FactExtractionOracle, OracleResponse};

/// Queue-driven oracle for tests.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Result<OracleResponse, ExtractionError>>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next response.
    pub fn push(&self, response: OracleResponse) {
        self.lock_script().push_back(Ok(response));
    }

    /// Queues a failure for the next call.
    pub fn push_error(&self, error: ExtractionError) {
        self.lock_script().push_back(Err(error));
    }

    /// Calls remaining in the script.
    pub fn remaining(&self) -> usize {
        self.lock_script().len()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<OracleResponse, ExtractionError>>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl FactExtractionOracle for ScriptedOracle {
    async fn extract(
        &self,
        _request: ExtractionRequest<'_>,
    ) -> Result<OracleResponse, ExtractionError> {
        self.lock_script()
            .pop_front()
            .unwrap_or_else(|| Ok(OracleResponse::empty()))
    }
}
