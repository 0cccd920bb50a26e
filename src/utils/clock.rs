use time::{Date, OffsetDateTime};

/// Source of "today" for date-dependent lending rules.
pub trait Clock: Send + Sync {
    fn today(&self) -> Date;
}

/// Calendar date in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().date()
    }
}

/// Always reports the same date.
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
    use time::macros::date;

    #[test]
    fn fixed_clock_never_moves() {
        let clock = FixedClock(date!(2023 - 02 - 01));
        assert_eq!(clock.today(), date!(2023 - 02 - 01));
        assert_eq!(clock.today(), clock.today());
    }
}
