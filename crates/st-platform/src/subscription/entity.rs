//! Subscription Entity
//!
//! A recurring charge a user pays for some external service, active from a
//! start month until an optional end month.

use serde::{Deserialize, Serialize};
use st_common::MonthDate;

/// Subscription aggregate root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Store-generated, immutable
    pub id: String,
    pub service_name: String,
    /// Monthly price in minor currency units
    pub price: i64,
    pub user_id: String,
    pub start_date: MonthDate,
    /// `None` means still active
    pub end_date: Option<MonthDate>,
}

impl Subscription {
    /// Whether the active interval intersects `[window_start, window_end]`.
    ///
    /// An open-ended subscription extends indefinitely into the future. The
    /// stores evaluate the same predicate in SQL; this copy backs in-memory
    /// test doubles.
    #[cfg(test)]
    pub(crate) fn overlaps(&self, window_start: MonthDate, window_end: MonthDate) -> bool {
        self.start_date <= window_end
            && self.end_date.map_or(true, |end| end >= window_start)
    }
}

/// Creation payload. New subscriptions never carry an end date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub service_name: String,
    pub price: i64,
    pub user_id: String,
    pub start_date: MonthDate,
}

impl NewSubscription {
    pub fn new(
        service_name: impl Into<String>,
        price: i64,
        user_id: impl Into<String>,
        start_date: MonthDate,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            price,
            user_id: user_id.into(),
            start_date,
        }
    }

    pub fn into_subscription(self, id: impl Into<String>) -> Subscription {
        Subscription {
            id: id.into(),
            service_name: self.service_name,
            price: self.price,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: None,
        }
    }
}

/// Partial update. Only the present fields are written.
///
/// An absent `end_date` leaves the stored value untouched; there is no way to
/// clear an end date once set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionPatch {
    pub price: Option<i64>,
    pub end_date: Option<MonthDate>,
}

impl SubscriptionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, price: i64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_end_date(mut self, end_date: MonthDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.end_date.is_none()
    }

    /// Apply the present fields to an in-memory copy.
    #[cfg(test)]
    pub(crate) fn apply_to(&self, subscription: &mut Subscription) {
        if let Some(price) = self.price {
            subscription.price = price;
        }
        if let Some(end_date) = self.end_date {
            subscription.end_date = Some(end_date);
        }
    }
}

/// Aggregate cost query over a month window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostQuery {
    pub user_id: String,
    pub service_name: Option<String>,
    pub start_date: MonthDate,
    pub end_date: MonthDate,
}

impl CostQuery {
    pub fn new(user_id: impl Into<String>, start_date: MonthDate, end_date: MonthDate) -> Self {
        Self {
            user_id: user_id.into(),
            service_name: None,
            start_date,
            end_date,
        }
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// The service name to filter on; an empty name means no filter.
    pub fn service_filter(&self) -> Option<&str> {
        self.service_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Whether `subscription` contributes to this query's total.
    #[cfg(test)]
    pub(crate) fn matches(&self, subscription: &Subscription) -> bool {
        subscription.user_id == self.user_id
            && self
                .service_filter()
                .map_or(true, |name| subscription.service_name == name)
            && subscription.overlaps(self.start_date, self.end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(s: &str) -> MonthDate {
        MonthDate::parse(s).unwrap()
    }

    fn subscription(start: &str, end: Option<&str>) -> Subscription {
        NewSubscription::new("Netflix", 100, "user-1", month(start))
            .into_subscription("sub-1")
            .with_end(end.map(month))
    }

    impl Subscription {
        fn with_end(mut self, end: Option<MonthDate>) -> Self {
            self.end_date = end;
            self
        }
    }

    #[test]
    fn test_overlap_partial_and_open_ended() {
        let window = (month("03-2024"), month("05-2024"));

        assert!(subscription("01-2024", Some("06-2024")).overlaps(window.0, window.1));
        assert!(subscription("05-2024", None).overlaps(window.0, window.1));
        assert!(subscription("01-2020", None).overlaps(window.0, window.1));
    }

    #[test]
    fn test_overlap_boundaries_are_inclusive() {
        let window = (month("03-2024"), month("05-2024"));

        assert!(subscription("05-2024", Some("05-2024")).overlaps(window.0, window.1));
        assert!(subscription("01-2024", Some("03-2024")).overlaps(window.0, window.1));
    }

    #[test]
    fn test_no_overlap_outside_window() {
        let window = (month("01-2024"), month("06-2024"));

        assert!(!subscription("07-2024", None).overlaps(window.0, window.1));
        assert!(!subscription("01-2023", Some("12-2023")).overlaps(window.0, window.1));
    }

    #[test]
    fn test_cost_query_filters() {
        let sub = subscription("01-2024", None);
        let query = CostQuery::new("user-1", month("01-2024"), month("02-2024"));

        assert!(query.matches(&sub));
        assert!(query.clone().with_service_name("").matches(&sub));
        assert!(query.clone().with_service_name("Netflix").matches(&sub));
        assert!(!query.clone().with_service_name("Spotify").matches(&sub));
        assert!(!CostQuery::new("user-2", month("01-2024"), month("02-2024")).matches(&sub));
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut sub = subscription("01-2024", None);

        assert!(SubscriptionPatch::new().is_empty());

        SubscriptionPatch::new().with_price(250).apply_to(&mut sub);
        assert_eq!(sub.price, 250);
        assert_eq!(sub.end_date, None);

        SubscriptionPatch::new().with_end_date(month("09-2024")).apply_to(&mut sub);
        assert_eq!(sub.price, 250);
        assert_eq!(sub.end_date, Some(month("09-2024")));
    }
}
