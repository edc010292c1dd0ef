//! Execution plan lifecycle
//!
//! A plan moves strictly forward: `Pending → Executing → Completed`.
//! There is no retry or cancel state; a failed leg is recorded on the
//! execution, not on the plan.

use crate::errors::PlanError;
use crate::ids::{OpportunityId, PlanId};
use crate::order::ExecutionOrder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Pending,
    Executing,
    Completed,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlanStatus::Pending => "PENDING",
            PlanStatus::Executing => "EXECUTING",
            PlanStatus::Completed => "COMPLETED",
        };
        f.write_str(label)
    }
}

/// An ordered set of order legs built for one opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub plan_id: PlanId,
    pub opportunity_id: Option<OpportunityId>,
    pub orders: Vec<ExecutionOrder>,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub completion_time: Option<DateTime<Utc>>,
}

impl ExecutionPlan {
    /// Create a new pending plan
    pub fn new(opportunity_id: Option<OpportunityId>, orders: Vec<ExecutionOrder>) -> Self {
        Self {
            plan_id: PlanId::new(),
            opportunity_id,
            orders,
            status: PlanStatus::Pending,
            created_at: Utc::now(),
            actual_start_time: None,
            completion_time: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Transition `Pending → Executing` and stamp the start time.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<(), PlanError> {
        self.transition(PlanStatus::Pending, PlanStatus::Executing)?;
        self.actual_start_time = Some(now);
        Ok(())
    }

    /// Transition `Executing → Completed` and stamp the completion time.
    ///
    /// The completion time never precedes the start time.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), PlanError> {
        self.transition(PlanStatus::Executing, PlanStatus::Completed)?;
        let completed = match self.actual_start_time {
            Some(start) if now < start => start,
            _ => now,
        };
        self.completion_time = Some(completed);
        Ok(())
    }

    fn transition(&mut self, expected: PlanStatus, next: PlanStatus) -> Result<(), PlanError> {
        if self.status != expected {
            return Err(PlanError::InvalidStateTransition {
                plan_id: self.plan_id.to_string(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Side;
    use chrono::Duration;

    fn test_plan() -> ExecutionPlan {
        ExecutionPlan::new(
            Some(OpportunityId::new()),
            vec![ExecutionOrder::new("ETH-USDT", "kraken", Side::BUY, 1.0, 3000.0)],
        )
    }

    #[test]
    fn test_plan_creation() {
        let plan = test_plan();
        assert_eq!(plan.status, PlanStatus::Pending);
        assert!(plan.actual_start_time.is_none());
        assert!(plan.completion_time.is_none());
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_plan_lifecycle() {
        let mut plan = test_plan();
        let t0 = Utc::now();
        plan.begin(t0).unwrap();
        assert_eq!(plan.status, PlanStatus::Executing);

        plan.complete(t0 + Duration::milliseconds(5)).unwrap();
        assert_eq!(plan.status, PlanStatus::Completed);
        assert!(plan.completion_time.unwrap() >= plan.actual_start_time.unwrap());
    }

    #[test]
    fn test_completion_never_precedes_start() {
        let mut plan = test_plan();
        let t0 = Utc::now();
        plan.begin(t0).unwrap();
        plan.complete(t0 - Duration::seconds(1)).unwrap();
        assert_eq!(plan.completion_time, Some(t0));
    }

    #[test]
    fn test_status_is_monotonic() {
        let mut plan = test_plan();
        assert!(plan.complete(Utc::now()).is_err());

        plan.begin(Utc::now()).unwrap();
        assert!(plan.begin(Utc::now()).is_err());

        plan.complete(Utc::now()).unwrap();
        let err = plan.begin(Utc::now()).unwrap_err();
        assert!(err.to_string().contains("COMPLETED"));
    }

    #[test]
    fn test_plan_serialization() {
        let plan = test_plan();
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"PENDING\""));
        let back: ExecutionPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.plan_id, plan.plan_id);
        assert_eq!(back.orders.len(), 1);
    }
}
