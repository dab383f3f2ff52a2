//! Failure injection inside store transactions.
//!
//! Both backends consult their [`FailPoints`] at fixed points of
//! `create_product_with_stock`. An armed point fires once and disarms itself,
//! aborting the transaction exactly as a real write failure would.

use std::collections::HashSet;
use std::sync::Mutex;

use super::StoreError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// Product row written, inventory row not yet written.
    AfterProductInsert,
    /// Both rows written, commit not yet issued.
    BeforeCommit,
}

#[derive(Debug, Default)]
pub struct FailPoints {
    armed: Mutex<HashSet<FailPoint>>,
}

impl FailPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next pass through `point` fail.
    pub fn arm(&self, point: FailPoint) {
        if let Ok(mut armed) = self.armed.lock() {
            armed.insert(point);
        }
    }

    pub fn disarm_all(&self) {
        if let Ok(mut armed) = self.armed.lock() {
            armed.clear();
        }
    }

    pub(crate) fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        let fired = self
            .armed
            .lock()
            .map(|mut armed| armed.remove(&point))
            .unwrap_or(false);
        if fired {
            tracing::debug!(?point, "fail point fired");
            return Err(StoreError::FailPoint(point));
        }
        Ok(())
    }
}
