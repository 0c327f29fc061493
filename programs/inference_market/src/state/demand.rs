use anchor_lang::prelude::*;
use crate::constants::{DEMAND_HISTORY_DAYS, MIN_FORECAST_SAMPLES, SECONDS_PER_DAY};
use crate::errors::MarketErrorCode;
use crate::utils::{day_index, day_start, mul_div, weekday};

/// Rolling request counters for one model. Individual requests are never
/// stored, only the open UTC day's count and a bounded daily history.
#[account]
pub struct ModelDemand {
    pub model_id: [u8; 32],
    pub current_count: u64,
    pub window_started_at: i64, // start of the open UTC day
    pub total_requests: u64,
    pub average_demand: u64,
    pub history: Vec<DailyDemand>,
    pub bump: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailyDemand {
    pub day: i64, // days since epoch
    pub count: u64,
}

impl DailyDemand {
    pub const SIZE: usize = 8 + 8;
}

impl ModelDemand {
    pub const SIZE: usize = 8 + // discriminator
        32 + // model_id
        8 + // current_count
        8 + // window_started_at
        8 + // total_requests
        8 + // average_demand
        4 + (DEMAND_HISTORY_DAYS * DailyDemand::SIZE) + // history
        1; // bump

    /// Counts one request at `now`. Days that ended since the last
    /// request are archived first so every count lands on its own day.
    pub fn record(&mut self, now: i64) -> Result<u64> {
        if self.window_started_at == 0 {
            self.window_started_at = day_start(now);
        }
        self.roll_over(now)?;

        self.current_count = self
            .current_count
            .checked_add(1)
            .ok_or(MarketErrorCode::ArithmeticOverflow)?;
        self.total_requests = self
            .total_requests
            .checked_add(1)
            .ok_or(MarketErrorCode::ArithmeticOverflow)?;
        Ok(self.current_count)
    }

    /// Requests counted for the UTC day containing `now`.
    pub fn count_at(&self, now: i64) -> u64 {
        if day_index(now) > day_index(self.window_started_at) {
            0
        } else {
            self.current_count
        }
    }

    /// Closes the open day once it has ended. Returns the archived count.
    pub fn roll(&mut self, now: i64) -> Result<u64> {
        self.roll_over(now)?
            .ok_or_else(|| error!(MarketErrorCode::DemandWindowOpen))
    }

    /// Archives the open day and a zero sample for every later day that
    /// ended without traffic, then reopens counting on the day of `now`.
    /// `None` while the open day is still running.
    fn roll_over(&mut self, now: i64) -> Result<Option<u64>> {
        let open_day = day_index(self.window_started_at);
        let today = day_index(now);
        if today <= open_day {
            return Ok(None);
        }

        let closed = self.current_count;
        self.push_day(open_day, closed);
        let first_idle = (open_day + 1).max(today - DEMAND_HISTORY_DAYS as i64);
        for day in first_idle..today {
            self.push_day(day, 0);
        }

        let sum: u128 = self.history.iter().map(|d| d.count as u128).sum();
        self.average_demand = (sum / self.history.len() as u128) as u64;
        self.current_count = 0;
        self.window_started_at = day_start(now);
        Ok(Some(closed))
    }

    fn push_day(&mut self, day: i64, count: u64) {
        if self.history.len() >= DEMAND_HISTORY_DAYS {
            self.history.remove(0);
        }
        self.history.push(DailyDemand { day, count });
    }

    /// Predicts the request count for a window of `window_duration`
    /// seconds starting at `at_timestamp`, from the mean of the archived
    /// days that share its weekday. Integer math, truncating.
    pub fn forecast(&self, at_timestamp: i64, window_duration: i64) -> Result<u64> {
        require!(window_duration > 0, MarketErrorCode::InvalidDuration);
        require!(
            self.history.len() >= MIN_FORECAST_SAMPLES,
            MarketErrorCode::InsufficientDemandHistory
        );

        let target = weekday(day_index(at_timestamp));
        let (sum, samples) = self
            .history
            .iter()
            .filter(|d| weekday(d.day) == target)
            .fold((0u128, 0u128), |(s, n), d| (s + d.count as u128, n + 1));

        let daily = if samples > 0 {
            sum / samples
        } else {
            let all: u128 = self.history.iter().map(|d| d.count as u128).sum();
            all / self.history.len() as u128
        };
        let daily = u64::try_from(daily).map_err(|_| error!(MarketErrorCode::ArithmeticOverflow))?;

        mul_div(daily, window_duration as u64, SECONDS_PER_DAY as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-01 00:00:00 UTC, a Monday
    const MONDAY: i64 = 1_704_067_200;
    const NOON: i64 = 12 * 3_600;

    fn demand() -> ModelDemand {
        ModelDemand {
            model_id: [1u8; 32],
            current_count: 0,
            window_started_at: 0,
            total_requests: 0,
            average_demand: 0,
            history: Vec::new(),
            bump: 255,
        }
    }

    fn record_n(demand: &mut ModelDemand, now: i64, n: u64) {
        for _ in 0..n {
            demand.record(now).unwrap();
        }
    }

    /// One roll per day, weekdays at `weekday_count`, weekends at `weekend_count`.
    fn fill_weeks(demand: &mut ModelDemand, weeks: i64, weekday_count: u64, weekend_count: u64) {
        for day in 0..(weeks * 7) {
            let count = if day % 7 < 5 { weekday_count } else { weekend_count };
            let start = MONDAY + day * SECONDS_PER_DAY;
            demand.record(start + NOON).unwrap();
            record_n(demand, start + NOON, count - 1);
            demand.roll(start + SECONDS_PER_DAY).unwrap();
        }
    }

    #[test]
    fn record_counts_within_the_day() {
        let mut demand = demand();
        record_n(&mut demand, MONDAY + NOON, 100);
        assert_eq!(demand.current_count, 100);
        assert_eq!(demand.total_requests, 100);
        assert_eq!(demand.window_started_at, MONDAY);
        assert_eq!(demand.count_at(MONDAY + SECONDS_PER_DAY - 1), 100);
        assert_eq!(demand.count_at(MONDAY + SECONDS_PER_DAY), 0);
    }

    #[test]
    fn roll_requires_the_day_to_end() {
        let mut demand = demand();
        demand.record(MONDAY + NOON).unwrap();
        assert!(demand.roll(MONDAY + SECONDS_PER_DAY - 1).is_err());
        assert_eq!(demand.current_count, 1);

        let closed = demand.roll(MONDAY + SECONDS_PER_DAY).unwrap();
        assert_eq!(closed, 1);
        assert_eq!(demand.current_count, 0);
        assert_eq!(demand.average_demand, 1);
        assert_eq!(demand.history, vec![DailyDemand { day: day_index(MONDAY), count: 1 }]);
        assert_eq!(demand.window_started_at, MONDAY + SECONDS_PER_DAY);
    }

    #[test]
    fn requests_land_on_their_own_day() {
        let mut demand = demand();
        for day in 0..3 {
            record_n(&mut demand, MONDAY + day * SECONDS_PER_DAY + NOON, 100);
        }
        // single late roll on Thursday
        demand.roll(MONDAY + 3 * SECONDS_PER_DAY + NOON).unwrap();

        let counts: Vec<u64> = demand.history.iter().map(|d| d.count).collect();
        assert_eq!(counts, vec![100, 100, 100]);
        assert_eq!(demand.history[0].day, day_index(MONDAY));
        assert_eq!(demand.history[2].day, day_index(MONDAY) + 2);
        assert_eq!(demand.window_started_at, MONDAY + 3 * SECONDS_PER_DAY);
    }

    #[test]
    fn late_roll_zero_fills_idle_days() {
        let mut demand = demand();
        record_n(&mut demand, MONDAY + NOON, 300);
        assert_eq!(demand.roll(MONDAY + 3 * SECONDS_PER_DAY + 60).unwrap(), 300);

        let counts: Vec<u64> = demand.history.iter().map(|d| d.count).collect();
        assert_eq!(counts, vec![300, 0, 0]);
        assert_eq!(demand.average_demand, 100);
    }

    #[test]
    fn long_idle_gap_keeps_only_the_ring() {
        let mut demand = demand();
        record_n(&mut demand, MONDAY + NOON, 5);
        demand.roll(MONDAY + 400 * SECONDS_PER_DAY).unwrap();
        assert_eq!(demand.history.len(), DEMAND_HISTORY_DAYS);
        assert!(demand.history.iter().all(|d| d.count == 0));
        assert_eq!(demand.history.last().unwrap().day, day_index(MONDAY) + 399);
    }

    #[test]
    fn rolling_average_truncates() {
        let mut demand = demand();
        for (day, count) in [1u64, 2, 2].into_iter().enumerate() {
            record_n(&mut demand, MONDAY + day as i64 * SECONDS_PER_DAY + NOON, count);
        }
        demand.roll(MONDAY + 3 * SECONDS_PER_DAY).unwrap();
        assert_eq!(demand.average_demand, 1); // 5 / 3
    }

    #[test]
    fn history_is_bounded() {
        let mut demand = demand();
        fill_weeks(&mut demand, 5, 1, 1);
        assert_eq!(demand.history.len(), DEMAND_HISTORY_DAYS);
    }

    #[test]
    fn forecast_needs_a_week() {
        let mut demand = demand();
        demand.record(MONDAY + NOON).unwrap();
        demand.roll(MONDAY + 6 * SECONDS_PER_DAY).unwrap();
        assert_eq!(demand.history.len(), 6);
        assert_eq!(
            demand.forecast(MONDAY + 7 * SECONDS_PER_DAY, SECONDS_PER_DAY).unwrap_err(),
            MarketErrorCode::InsufficientDemandHistory.into()
        );
    }

    #[test]
    fn forecast_follows_weekday_seasonality() {
        let mut demand = demand();
        fill_weeks(&mut demand, 2, 100, 20);

        let next_monday = MONDAY + 14 * SECONDS_PER_DAY;
        let next_saturday = MONDAY + 19 * SECONDS_PER_DAY;
        assert_eq!(demand.forecast(next_monday, SECONDS_PER_DAY).unwrap(), 100);
        assert_eq!(demand.forecast(next_saturday, SECONDS_PER_DAY).unwrap(), 20);
        // half a day of Monday traffic
        assert_eq!(demand.forecast(next_monday, SECONDS_PER_DAY / 2).unwrap(), 50);
    }

    #[test]
    fn forecast_uses_daily_totals_of_hourly_traffic() {
        let mut demand = demand();
        for hour in 0..(14 * 24) {
            record_n(&mut demand, MONDAY + hour * 3_600 + 60, 10);
        }
        demand.roll(MONDAY + 14 * SECONDS_PER_DAY).unwrap();

        assert_eq!(demand.history.len(), 14);
        assert_eq!(demand.forecast(MONDAY + 14 * SECONDS_PER_DAY, SECONDS_PER_DAY).unwrap(), 240);
        assert_eq!(demand.forecast(MONDAY + 14 * SECONDS_PER_DAY, 3_600).unwrap(), 10);
    }

    #[test]
    fn forecast_averages_same_weekday_with_truncation() {
        let mut demand = demand();
        // two Mondays: 10 then 15, every other day 0
        record_n(&mut demand, MONDAY + NOON, 10);
        record_n(&mut demand, MONDAY + 7 * SECONDS_PER_DAY + NOON, 15);
        demand.roll(MONDAY + 14 * SECONDS_PER_DAY).unwrap();

        assert_eq!(demand.history.len(), 14);
        assert_eq!(demand.forecast(MONDAY + 21 * SECONDS_PER_DAY, SECONDS_PER_DAY).unwrap(), 12);
    }

    #[test]
    fn forecast_rejects_empty_window() {
        let mut demand = demand();
        fill_weeks(&mut demand, 1, 1, 1);
        assert!(demand.forecast(MONDAY, 0).is_err());
    }
}
