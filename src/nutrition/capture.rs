//! Scan lifecycle: one outstanding request at a time, and any failure drops
//! back to the ready state so the user can try again.

use super::client::{NutritionError, NutritionService, ScanPayload, ScanResponse, ScanResult};

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Ready,
    Pending { kind: &'static str },
    Complete(ScanResult),
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("a scan is already in progress")]
    Busy,
    #[error("no scan is in progress")]
    NotPending,
    #[error("scan failed: {0}")]
    Service(#[from] NutritionError),
}

#[derive(Debug)]
pub struct CaptureSession {
    state: CaptureState,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Ready,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, CaptureState::Pending { .. })
    }

    /// Marks a capture as issued. Refused while another one is pending.
    pub fn begin(&mut self, payload: &ScanPayload) -> Result<(), CaptureError> {
        if self.is_pending() {
            tracing::debug!("capture ignored while a scan is pending");
            return Err(CaptureError::Busy);
        }
        self.state = CaptureState::Pending {
            kind: payload.kind(),
        };
        Ok(())
    }

    /// Records the outcome of the pending request.
    pub fn finish(
        &mut self,
        outcome: Result<ScanResponse, NutritionError>,
    ) -> Result<ScanResult, CaptureError> {
        if !self.is_pending() {
            return Err(CaptureError::NotPending);
        }
        match outcome {
            Ok(response) => {
                let result = ScanResult::from(response);
                tracing::info!(title = %result.title, "scan analysed");
                self.state = CaptureState::Complete(result.clone());
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(%err, "scan failed, ready to scan again");
                self.state = CaptureState::Ready;
                Err(err.into())
            }
        }
    }

    pub async fn scan<S>(
        &mut self,
        service: &S,
        payload: ScanPayload,
    ) -> Result<ScanResult, CaptureError>
    where
        S: NutritionService + ?Sized,
    {
        self.begin(&payload)?;
        let outcome = service.analyze(&payload).await;
        self.finish(outcome)
    }

    pub fn reset(&mut self) {
        self.state = CaptureState::Ready;
    }
}
