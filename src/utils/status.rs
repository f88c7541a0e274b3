use crate::database::models::{AttendanceRecord, ScheduleConfig, Site};
use crate::utils::time::{combine_date_time, weekday_ordinal};
use chrono::{DateTime, FixedOffset, Utc};

/// Grace period after the tolerance during which an arrival is still "late".
const LATE_WINDOW_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    OnTime,
    Late,
    Absent,
    NonWorkday,
    Justified,
}

impl AttendanceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::OnTime => "A tiempo",
            AttendanceStatus::Late => "Tarde",
            AttendanceStatus::Absent => "Ausente",
            AttendanceStatus::NonWorkday => "Día no laborable",
            AttendanceStatus::Justified => "Justificado",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AttendanceStatus::OnTime => "🟢",
            AttendanceStatus::Late => "🟡",
            AttendanceStatus::Absent => "🔴",
            AttendanceStatus::NonWorkday => "⚪",
            AttendanceStatus::Justified => "🔵",
        }
    }
}

/// Classifies an entry time against a schedule. `Justified` is never returned here.
pub fn classify(
    entry: Option<DateTime<Utc>>,
    schedule: Option<&ScheduleConfig>,
    offset: FixedOffset,
) -> AttendanceStatus {
    let (Some(entry), Some(schedule)) = (entry, schedule) else {
        return AttendanceStatus::Absent;
    };

    if !schedule.work_days.contains(&weekday_ordinal(entry, offset)) {
        return AttendanceStatus::NonWorkday;
    }

    let local_date = entry.with_timezone(&offset).date_naive();
    let Some(scheduled) = combine_date_time(local_date, schedule.entry_time, offset) else {
        return AttendanceStatus::Absent;
    };

    let diff_ms = entry.signed_duration_since(scheduled).num_milliseconds();
    let tolerance_ms = i64::from(schedule.tolerance_minutes) * 60_000;
    let late_threshold_ms = tolerance_ms + LATE_WINDOW_MS;

    if diff_ms <= tolerance_ms {
        AttendanceStatus::OnTime
    } else if diff_ms <= late_threshold_ms {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Absent
    }
}

/// Status shown to users: a justification overlays, never replaces, the computed class.
pub fn display_status(record: &AttendanceRecord, computed: AttendanceStatus) -> AttendanceStatus {
    if record.justification.is_some() {
        AttendanceStatus::Justified
    } else {
        computed
    }
}

/// Schedule in force at a site: its own override, otherwise the global one.
pub fn site_schedule<'a>(site: &'a Site, global: &'a ScheduleConfig) -> &'a ScheduleConfig {
    site.schedule_config.as_ref().unwrap_or(global)
}

/// Schedule in force at the record's site. Unknown sites use the global schedule.
pub fn resolve_schedule<'a>(
    record: &AttendanceRecord,
    sites: &'a [Site],
    global: &'a ScheduleConfig,
) -> &'a ScheduleConfig {
    sites
        .iter()
        .find(|s| s.id == record.location.nearest_site_id)
        .map_or(global, |s| site_schedule(s, global))
}

/// Computed and displayed status for an entrada record.
pub fn classify_record(
    record: &AttendanceRecord,
    sites: &[Site],
    global: &ScheduleConfig,
    offset: FixedOffset,
) -> (AttendanceStatus, AttendanceStatus) {
    let schedule = resolve_schedule(record, sites, global);
    let computed = classify(Some(record.timestamp), Some(schedule), offset);
    (computed, display_status(record, computed))
}
