use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// The local calendar day as a UTC half-open interval `[start_utc, end_utc)`,
/// used to filter time-stamped upstream records.
#[derive(Debug, Clone)]
pub struct DayWindow {
    pub date_local: NaiveDate,
    pub now_local: DateTime<Tz>,
    pub start_local: DateTime<Tz>,
    pub end_local: DateTime<Tz>,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
}

impl DayWindow {
    /// Window of the current local day in `tz`.
    pub fn today(tz: Tz) -> Result<Self> {
        Self::for_instant(Utc::now().with_timezone(&tz))
    }

    /// Window of the local day containing `now_local`.
    pub fn for_instant(now_local: DateTime<Tz>) -> Result<Self> {
        let tz = now_local.timezone();
        let date_local = now_local.date_naive();

        let start_local = local_midnight(tz, date_local)?;
        let end_local = local_midnight(tz, date_local + Duration::days(1))?;

        Ok(Self {
            date_local,
            now_local,
            start_local,
            end_local,
            start_utc: start_local.with_timezone(&Utc),
            end_utc: end_local.with_timezone(&Utc),
        })
    }

    /// True if a UTC instant falls inside the window.
    pub fn contains_utc(&self, t: DateTime<Utc>) -> bool {
        t >= self.start_utc && t < self.end_utc
    }
}

fn local_midnight(tz: Tz, date: NaiveDate) -> Result<DateTime<Tz>> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .context("invalid midnight timestamp")?;
    tz.from_local_datetime(&naive)
        .earliest()
        .with_context(|| format!("midnight does not exist in {} on {}", tz, date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Shanghai;

    fn window_at(y: i32, m: u32, d: u32, h: u32) -> DayWindow {
        let now = Shanghai
            .with_ymd_and_hms(y, m, d, h, 30, 0)
            .single()
            .unwrap();
        DayWindow::for_instant(now).unwrap()
    }

    #[test]
    fn test_shanghai_midnight_is_utc_minus_eight() {
        let w = window_at(2026, 8, 29, 10);
        assert_eq!(w.date_local, NaiveDate::from_ymd_opt(2026, 8, 29).unwrap());
        assert_eq!(
            w.start_utc,
            Utc.with_ymd_and_hms(2026, 8, 28, 16, 0, 0).unwrap()
        );
        assert_eq!(
            w.end_utc,
            Utc.with_ymd_and_hms(2026, 8, 29, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_window_is_half_open() {
        let w = window_at(2026, 8, 29, 0);
        assert!(w.contains_utc(w.start_utc));
        assert!(!w.contains_utc(w.end_utc));
        assert!(w.contains_utc(w.end_utc - Duration::seconds(1)));
    }

    #[test]
    fn test_early_morning_stays_on_local_date() {
        // 00:30 Shanghai is still the previous day in UTC.
        let w = window_at(2026, 8, 29, 0);
        assert_eq!(w.date_local, NaiveDate::from_ymd_opt(2026, 8, 29).unwrap());
        assert!(w.now_local.with_timezone(&Utc) < w.start_utc + Duration::hours(9));
    }
}
