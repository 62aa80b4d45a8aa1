use chrono::TimeDelta;
use sasvend_core::time::{now, DateTime};
use std::time::Duration;

/// The longest lifetime the service accepts for a signed credential.
pub const MAX_SAS_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// The validity window of a credential.
///
/// `expiry` is `start + min(requested, MAX_SAS_LIFETIME)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryWindow {
    start: DateTime,
    expiry: DateTime,
}

impl ExpiryWindow {
    /// Compute the window for a credential requested at `now`.
    ///
    /// A zero `requested` yields `expiry == start`; callers that need a usable
    /// credential reject that before getting here.
    pub fn compute(requested: Duration, now: DateTime) -> Self {
        let lifetime = TimeDelta::from_std(requested.min(MAX_SAS_LIFETIME))
            .unwrap_or(TimeDelta::MAX);
        let expiry = now
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::MAX_UTC);

        Self { start: now, expiry }
    }

    /// Compute the window for a credential requested right now.
    pub fn starting_now(requested: Duration) -> Self {
        Self::compute(requested, now())
    }

    /// When the credential becomes valid.
    pub fn start(&self) -> DateTime {
        self.start
    }

    /// When the credential stops being valid.
    pub fn expiry(&self) -> DateTime {
        self.expiry
    }

    /// `expiry - start`.
    pub fn lifetime(&self) -> TimeDelta {
        self.expiry - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use test_case::test_case;

    fn test_time() -> DateTime {
        Utc.with_ymd_and_hms(2022, 3, 1, 8, 12, 34).unwrap()
    }

    #[test_case(Duration::from_secs(1); "one second")]
    #[test_case(Duration::from_secs(10 * 60 * 60); "ten hours")]
    #[test_case(Duration::from_secs(6 * 24 * 60 * 60); "six days")]
    #[test_case(MAX_SAS_LIFETIME; "exactly seven days")]
    fn test_within_ceiling(requested: Duration) {
        let w = ExpiryWindow::compute(requested, test_time());

        assert_eq!(w.start(), test_time());
        assert_eq!(w.lifetime().to_std().unwrap(), requested);
    }

    #[test_case(MAX_SAS_LIFETIME + Duration::from_secs(1); "one second over")]
    #[test_case(Duration::from_secs(10 * 24 * 60 * 60); "ten days")]
    #[test_case(Duration::MAX; "max duration")]
    fn test_clamped_to_ceiling(requested: Duration) {
        let w = ExpiryWindow::compute(requested, test_time());

        assert_eq!(w.start(), test_time());
        assert_eq!(
            w.expiry(),
            Utc.with_ymd_and_hms(2022, 3, 8, 8, 12, 34).unwrap()
        );
    }

    #[test]
    fn test_zero_duration() {
        let w = ExpiryWindow::compute(Duration::ZERO, test_time());
        assert_eq!(w.start(), w.expiry());
    }

    #[test]
    fn test_starting_now() {
        let before = now();
        let w = ExpiryWindow::starting_now(Duration::from_secs(3600));
        let after = now();

        assert!(w.start() >= before && w.start() <= after);
        assert_eq!(w.lifetime(), TimeDelta::try_hours(1).unwrap());
    }
}
