use std::error::Error;
use std::fmt;

use time::{Duration, OffsetDateTime};

use crate::domain::{Subscription, SubscriptionStatus};
use crate::gateway::{GatewayError, SubscriptionGateway};
use crate::ids::parse_timestamp;

#[derive(Debug)]
pub enum SubscriptionError {
    NotFound(String),
    Gateway(GatewayError),
}

impl fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionError::NotFound(id) => write!(f, "subscription '{}' not found", id),
            SubscriptionError::Gateway(err) => write!(f, "persistence failure: {}", err),
        }
    }
}

impl Error for SubscriptionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SubscriptionError::Gateway(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GatewayError> for SubscriptionError {
    fn from(value: GatewayError) -> Self {
        SubscriptionError::Gateway(value)
    }
}

/// Recurring-cost tracker. Holds the full subscription list and answers the
/// two dashboard questions: what does this cost per month, and what renews
/// soon enough to warrant a reminder.
pub struct SubscriptionStore {
    gateway: Box<dyn SubscriptionGateway>,
    subscriptions: Vec<Subscription>,
}

impl SubscriptionStore {
    pub fn new(gateway: Box<dyn SubscriptionGateway>) -> Self {
        Self {
            gateway,
            subscriptions: Vec::new(),
        }
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn load(&mut self) -> Result<(), SubscriptionError> {
        self.subscriptions = self.gateway.fetch_subscriptions()?;
        Ok(())
    }

    pub fn add(&mut self, sub: Subscription) -> Result<(), SubscriptionError> {
        self.subscriptions.insert(0, sub.clone());
        if let Err(err) = self.gateway.upsert_subscription(&sub) {
            self.subscriptions.retain(|existing| existing.id != sub.id);
            return Err(err.into());
        }
        Ok(())
    }

    pub fn update(&mut self, sub: Subscription) -> Result<(), SubscriptionError> {
        let Some(position) = self
            .subscriptions
            .iter()
            .position(|existing| existing.id == sub.id)
        else {
            return Err(SubscriptionError::NotFound(sub.id));
        };
        self.subscriptions[position] = sub.clone();
        if let Err(err) = self.gateway.upsert_subscription(&sub) {
            log::error!("subscription '{}' update not persisted: {}", sub.id, err);
            return Err(err.into());
        }
        Ok(())
    }

    pub fn set_status(
        &mut self,
        id: &str,
        status: SubscriptionStatus,
    ) -> Result<(), SubscriptionError> {
        let Some(sub) = self.subscriptions.iter().find(|sub| sub.id == id) else {
            return Err(SubscriptionError::NotFound(id.to_string()));
        };
        let mut updated = sub.clone();
        updated.status = status;
        self.update(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), SubscriptionError> {
        let Some(position) = self
            .subscriptions
            .iter()
            .position(|existing| existing.id == id)
        else {
            return Ok(());
        };
        let removed = self.subscriptions.remove(position);
        if let Err(err) = self.gateway.delete_subscription(id) {
            self.subscriptions.insert(position, removed);
            return Err(err.into());
        }
        Ok(())
    }

    /// Sum of monthly-equivalent costs over subscriptions still being billed.
    pub fn monthly_total(&self) -> f64 {
        self.subscriptions
            .iter()
            .filter(|sub| sub.status.is_billed())
            .map(Subscription::monthly_cost)
            .sum()
    }

    /// Billed subscriptions whose next renewal falls inside that
    /// subscription's own reminder window. Past-due renewals stay listed
    /// until acted on.
    pub fn upcoming_renewals(&self, now: OffsetDateTime) -> Vec<&Subscription> {
        let mut due: Vec<&Subscription> = self
            .subscriptions
            .iter()
            .filter(|sub| sub.status.is_billed())
            .filter(|sub| {
                parse_timestamp(&sub.renewal_date)
                    .map(|renewal| renewal - now <= Duration::days(i64::from(sub.reminder_days)))
                    .unwrap_or(false)
            })
            .collect();
        due.sort_by(|a, b| a.renewal_date.cmp(&b.renewal_date));
        due
    }
}
