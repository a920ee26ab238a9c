use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::service::{ServiceId, ServiceType};

const SECONDS_PER_DAY: i64 = 86_400;

/// Everything the engine knows about a booking request. Read-only for the
/// duration of a calculation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingContext {
    pub service_id: ServiceId,
    pub service_type: ServiceType,
    pub base_price: Decimal,
    pub currency: String,
    pub booking_date: DateTime<Utc>,
    pub service_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonal_factors: Option<SeasonalFactors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_factors: Option<DemandFactors>,
}

impl PricingContext {
    /// Whole days between booking and service, floored (a negative lead time
    /// rounds toward the past).
    pub fn advance_days(&self) -> i64 {
        (self.service_date - self.booking_date).num_seconds().div_euclid(SECONDS_PER_DAY)
    }
}

/// Hints supplied by the surrounding application; the evaluator derives the
/// season from the service date instead.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalFactors {
    #[serde(default)]
    pub is_peak_season: bool,
    #[serde(default)]
    pub is_holiday: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_events: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandFactors {
    pub current_bookings: u32,
    pub available_slots: u32,
    pub popularity_score: Decimal,
}

impl DemandFactors {
    /// `current_bookings / max(available_slots, 1)`.
    pub fn occupancy_rate(&self) -> Decimal {
        let slots = self.available_slots.max(1);
        Decimal::from(self.current_bookings) / Decimal::from(slots)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{DemandFactors, PricingContext};
    use crate::domain::service::{ServiceId, ServiceType};

    fn context(lead: Duration) -> PricingContext {
        let booking_date = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid");
        PricingContext {
            service_id: ServiceId("svc-halong-cruise".to_string()),
            service_type: ServiceType::Tour,
            base_price: Decimal::from(100),
            currency: "USD".to_string(),
            booking_date,
            service_date: booking_date + lead,
            duration: None,
            group_size: None,
            location: None,
            seasonal_factors: None,
            demand_factors: None,
        }
    }

    #[test]
    fn advance_days_floors_partial_days() {
        assert_eq!(context(Duration::hours(47)).advance_days(), 1);
        assert_eq!(context(Duration::days(35)).advance_days(), 35);
        assert_eq!(context(Duration::hours(-1)).advance_days(), -1);
    }

    #[test]
    fn occupancy_rate_guards_against_zero_slots() {
        let demand =
            DemandFactors { current_bookings: 3, available_slots: 0, popularity_score: Decimal::ZERO };
        assert_eq!(demand.occupancy_rate(), Decimal::from(3));

        let demand = DemandFactors {
            current_bookings: 45,
            available_slots: 50,
            popularity_score: Decimal::ZERO,
        };
        assert_eq!(demand.occupancy_rate(), Decimal::new(9, 1));
    }
}
