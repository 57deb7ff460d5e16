use time::{Date, OffsetDateTime};

/// Source of the "updated at" date written into the metadata grid.
pub trait Clock {
    fn today(&self) -> Date;

    /// `YYYY-MM-DD`
    fn iso_date(&self) -> String {
        let d = self.today();
        format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
    }
}

/// Wall-clock date, local when the offset is known and UTC otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn test_fixed_clock_iso() {
        let clock = FixedClock(Date::from_calendar_date(2025, Month::March, 7).unwrap());
        assert_eq!(clock.iso_date(), "2025-03-07");
    }

    #[test]
    fn test_system_clock_matches_wall_clock() {
        let utc = OffsetDateTime::now_utc().date();
        let today = SystemClock.today();
        // Local date is at most one day away from UTC
        assert!((today - utc).whole_days().abs() <= 1);
    }

    #[test]
    fn test_system_clock_shape() {
        let s = SystemClock.iso_date();
        assert_eq!(s.len(), 10);
        assert_eq!(&s[4..5], "-");
        assert_eq!(&s[7..8], "-");
    }
}
