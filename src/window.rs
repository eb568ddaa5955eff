use anyhow::Context;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Observations are stored in UTC but the business day is an Indochina-time
/// calendar day, so the offset is applied once here, before any query runs.
/// ICT has no daylight saving; a fixed offset is exact.
const LOCAL_OFFSET_SECS: i32 = 7 * 3600;

/// The UTC bounds of one local calendar day. Both bounds are inclusive:
/// `start_utc` is local midnight, `end_utc` is local 23:59:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyWindow {
    pub local_date: NaiveDate,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
}

pub fn local_offset() -> anyhow::Result<FixedOffset> {
    FixedOffset::east_opt(LOCAL_OFFSET_SECS).context("local UTC offset out of range")
}

/// Window for yesterday's local calendar day, relative to `now_utc`.
///
/// Any failure here means no meaningful window exists and the caller must
/// not proceed to aggregation.
pub fn resolve_yesterday(now_utc: DateTime<Utc>) -> anyhow::Result<DailyWindow> {
    let local_now = now_utc.with_timezone(&local_offset()?);
    let local_date = local_now
        .date_naive()
        .pred_opt()
        .context("previous local date out of range")?;
    window_for(local_date)
}

/// Window for an arbitrary local calendar day.
pub fn window_for(local_date: NaiveDate) -> anyhow::Result<DailyWindow> {
    let offset = local_offset()?;
    let start_local = local_date
        .and_hms_opt(0, 0, 0)
        .context("invalid local start of day")?
        .and_local_timezone(offset)
        .single()
        .context("local start of day does not map to a unique instant")?;
    let end_local = local_date
        .and_hms_opt(23, 59, 59)
        .context("invalid local end of day")?
        .and_local_timezone(offset)
        .single()
        .context("local end of day does not map to a unique instant")?;

    Ok(DailyWindow {
        local_date,
        start_utc: start_local.with_timezone(&Utc),
        end_utc: end_local.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn resolves_previous_local_day() {
        // 2026-03-10 01:30 UTC is 08:30 local, so yesterday is 2026-03-09.
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 1, 30, 0).unwrap();
        let window = resolve_yesterday(now).unwrap();
        assert_eq!(
            window.local_date,
            NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
        );
    }

    #[test]
    fn local_day_can_differ_from_utc_day() {
        // 18:30 UTC is already 01:30 the next local day.
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 18, 30, 0).unwrap();
        let window = resolve_yesterday(now).unwrap();
        assert_eq!(
            window.local_date,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
        );
        assert_eq!(
            window.start_utc,
            Utc.with_ymd_and_hms(2025, 12, 31, 17, 0, 0).unwrap()
        );
        assert_eq!(
            window.end_utc,
            Utc.with_ymd_and_hms(2026, 1, 1, 16, 59, 59).unwrap()
        );
    }

    #[test]
    fn bounds_convert_back_to_the_same_local_date() {
        let offset = local_offset().unwrap();
        for date in [
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
            NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(),
        ] {
            let window = window_for(date).unwrap();
            assert_eq!(window.start_utc.with_timezone(&offset).date_naive(), date);
            assert_eq!(window.end_utc.with_timezone(&offset).date_naive(), date);
            assert!(window.start_utc < window.end_utc);
        }
    }

    #[test]
    fn window_spans_a_full_day_minus_one_second() {
        let window = window_for(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()).unwrap();
        let span = window.end_utc - window.start_utc;
        assert_eq!(span.num_seconds(), 24 * 3600 - 1);
    }
}
