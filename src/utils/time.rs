use anyhow::Result;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

/// Calendar day used to partition attendance records.
pub fn partition_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

pub fn current_date(offset: FixedOffset) -> NaiveDate {
    partition_date(Utc::now(), offset)
}

/// 0 = Sunday .. 6 = Saturday, in the given offset.
pub fn weekday_ordinal(instant: DateTime<Utc>, offset: FixedOffset) -> u32 {
    instant.with_timezone(&offset).weekday().num_days_from_sunday()
}

pub fn parse_time_string(time_str: &str) -> Result<NaiveTime> {
    let time_str = time_str.trim();

    if let Ok(time) = NaiveTime::parse_from_str(time_str, "%H:%M") {
        return Ok(time);
    }

    if let Ok(time) = NaiveTime::parse_from_str(time_str, "%H:%M:%S") {
        return Ok(time);
    }

    Err(anyhow::anyhow!("Formato de hora inválido. Usa HH:MM"))
}

pub fn parse_date_string(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Formato de fecha inválido. Usa AAAA-MM-DD"))
}

/// Instant of `time` (seconds zeroed) on `date`, interpreted in `offset`.
pub fn combine_date_time(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let time = time.with_second(0)?;
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.to_utc())
}

pub fn format_time(datetime: DateTime<Utc>, offset: FixedOffset) -> String {
    datetime.with_timezone(&offset).format("%H:%M").to_string()
}

pub fn format_datetime(datetime: DateTime<Utc>, offset: FixedOffset) -> String {
    datetime.with_timezone(&offset).format("%d/%m/%Y %H:%M").to_string()
}

pub fn format_hours(hours: f64) -> String {
    format!("{:.2} h", hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn partition_date_follows_offset() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 4, 23, 30, 0).unwrap();
        assert_eq!(partition_date(instant, utc()), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());

        let madrid = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(partition_date(instant, madrid), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn weekday_ordinal_starts_on_sunday() {
        let sunday = Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
        assert_eq!(weekday_ordinal(sunday, utc()), 0);
        assert_eq!(weekday_ordinal(monday, utc()), 1);
    }

    #[test]
    fn parses_hh_mm_and_rejects_garbage() {
        assert_eq!(parse_time_string(" 09:05 ").unwrap(), NaiveTime::from_hms_opt(9, 5, 0).unwrap());
        assert!(parse_time_string("9h").is_err());
        assert!(parse_date_string("2024-02-30").is_err());
    }

    #[test]
    fn combine_uses_local_wall_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let offset = FixedOffset::east_opt(-3 * 3600).unwrap();
        let instant = combine_date_time(date, time, offset).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap());
    }
}
