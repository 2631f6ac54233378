use serde::{Deserialize, Serialize};

use crate::ids::new_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl BillingCycle {
    /// Normalizes a per-cycle amount to its monthly-equivalent cost.
    pub fn monthly_equivalent(self, amount: f64) -> f64 {
        match self {
            BillingCycle::Daily => amount * 365.0 / 12.0,
            BillingCycle::Weekly => amount * 52.0 / 12.0,
            BillingCycle::Monthly => amount,
            BillingCycle::Yearly => amount / 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    /// Still billed, cancellation requested; stops at the next renewal.
    Cancelling,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn is_billed(self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::Cancelling
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub amount: f64,
    pub cycle: BillingCycle,
    pub renewal_date: String,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub auto_renew: bool,
    /// Days of lead time before the renewal date at which a reminder is due.
    #[serde(default)]
    pub reminder_days: u32,
}

impl Subscription {
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        cycle: BillingCycle,
        renewal_date: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            category: String::new(),
            amount,
            cycle,
            renewal_date: renewal_date.into(),
            status: SubscriptionStatus::Active,
            auto_renew: true,
            reminder_days: 3,
        }
    }

    pub fn monthly_cost(&self) -> f64 {
        self.cycle.monthly_equivalent(self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::{BillingCycle, Subscription, SubscriptionStatus};

    #[test]
    fn monthly_equivalents() {
        assert!((BillingCycle::Yearly.monthly_equivalent(120.0) - 10.0).abs() < 1e-9);
        assert!((BillingCycle::Monthly.monthly_equivalent(10.0) - 10.0).abs() < 1e-9);
        assert!((BillingCycle::Weekly.monthly_equivalent(12.0) - 52.0).abs() < 1e-9);
        assert!((BillingCycle::Daily.monthly_equivalent(1.2) - 36.5).abs() < 1e-9);
    }

    #[test]
    fn cancelling_subscriptions_are_still_billed() {
        assert!(SubscriptionStatus::Active.is_billed());
        assert!(SubscriptionStatus::Cancelling.is_billed());
        assert!(!SubscriptionStatus::Cancelled.is_billed());
    }

    #[test]
    fn monthly_cost_follows_the_cycle() {
        let sub = Subscription::new("News", 240.0, BillingCycle::Yearly, "2026-12-01T00:00:00Z");
        assert!((sub.monthly_cost() - 20.0).abs() < 1e-9);
    }
}
