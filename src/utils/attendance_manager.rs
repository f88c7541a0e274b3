use crate::database::models::{
    AttendanceRecord, NewAttendanceRecord, RecordLocation, RecordType, ScheduleConfig, Site,
};
use crate::database::queries;
use crate::error::{AttendanceError, AttendanceResult, SequenceViolation};
use crate::utils::geolocation::Position;
use crate::utils::record_validator::RecordValidator;
use crate::utils::shift_pairing::{Shift, UserShifts, group_by_user, pair_shifts};
use crate::utils::time::partition_date;
use crate::utils::validation::normalize_annotation;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct PunchReceipt {
    pub record: AttendanceRecord,
    pub accepted_distance: i64,
    pub site_name: String,
}

/// Sites and global schedule needed to classify records.
#[derive(Debug, Clone)]
pub struct ScheduleContext {
    pub sites: Vec<Site>,
    pub schedule: ScheduleConfig,
}

pub struct AttendanceManager {
    pool: SqlitePool,
    offset: FixedOffset,
}

impl AttendanceManager {
    pub fn new(pool: SqlitePool, offset: FixedOffset) -> Self {
        Self { pool, offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Validates a punch and persists it. Nothing is written on rejection.
    pub async fn register_attendance(
        &self,
        user_id: i64,
        record_type: RecordType,
        position: Position,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> AttendanceResult<PunchReceipt> {
        let sites = queries::list_sites(&self.pool).await?;
        if sites.is_empty() {
            tracing::warn!(user_id, "Punch rejected: no sites configured");
            return Err(AttendanceError::NoSitesConfigured);
        }

        let date = partition_date(now, self.offset);
        let existing = queries::get_user_records_by_date(&self.pool, user_id, date).await?;

        let nearest = match RecordValidator::validate_punch(&sites, &existing, record_type, &position) {
            Ok(nearest) => nearest,
            Err(e) => {
                tracing::info!(user_id, record_type = record_type.as_str(), %date, reason = %e, "Punch rejected");
                return Err(e);
            }
        };

        let accepted_distance = nearest.distance.round() as i64;
        let new_record = NewAttendanceRecord {
            user_id,
            record_type,
            timestamp: now,
            date,
            location: RecordLocation {
                latitude: position.latitude,
                longitude: position.longitude,
                accuracy: position.accuracy,
                nearest_site_id: nearest.site.id,
                nearest_site_name: nearest.site.name.clone(),
                distance_to_site_meters: accepted_distance,
            },
            note: normalize_annotation(note).map(str::to_string),
        };

        // The insert re-checks the sequence atomically; a concurrent punch may have won.
        let record = queries::insert_attendance_record_if_sequence_allows(&self.pool, &new_record)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id, record_type = record_type.as_str(), %date, "Punch lost a concurrent sequence race");
                AttendanceError::SequenceViolation(match record_type {
                    RecordType::Entrada => SequenceViolation::OpenShiftExists,
                    RecordType::Salida => SequenceViolation::NoOpenShift,
                })
            })?;

        tracing::info!(
            user_id,
            record_id = record.id,
            record_type = record_type.as_str(),
            site = %record.location.nearest_site_name,
            distance = accepted_distance,
            "Punch accepted"
        );

        Ok(PunchReceipt {
            site_name: record.location.nearest_site_name.clone(),
            accepted_distance,
            record,
        })
    }

    pub async fn list_for_user(&self, user_id: i64, date: NaiveDate) -> AttendanceResult<Vec<AttendanceRecord>> {
        Ok(queries::get_user_records_by_date(&self.pool, user_id, date).await?)
    }

    pub async fn list_for_day(&self, date: NaiveDate) -> AttendanceResult<Vec<AttendanceRecord>> {
        Ok(queries::get_records_by_date(&self.pool, date).await?)
    }

    pub async fn shifts_for_user(&self, user_id: i64, date: NaiveDate) -> AttendanceResult<Vec<Shift>> {
        let records = self.list_for_user(user_id, date).await?;
        Ok(pair_shifts(&records))
    }

    pub async fn shifts_for_day(&self, date: NaiveDate) -> AttendanceResult<Vec<UserShifts>> {
        let records = self.list_for_day(date).await?;
        Ok(group_by_user(&records))
    }

    /// Explicit load of classification inputs; creates the default schedule if missing.
    pub async fn load_schedule_context(&self) -> AttendanceResult<ScheduleContext> {
        let schedule = queries::load_or_create_schedule_config(&self.pool).await?;
        let sites = queries::list_sites(&self.pool).await?;
        Ok(ScheduleContext { sites, schedule })
    }

    /// Sets the owner's note on a record; blank text removes it.
    pub async fn update_note(
        &self,
        record_id: i64,
        user_id: i64,
        note: Option<&str>,
    ) -> AttendanceResult<AttendanceRecord> {
        let note = normalize_annotation(note);
        if !queries::update_record_note(&self.pool, record_id, user_id, note).await? {
            return Err(AttendanceError::RecordNotFound(record_id));
        }
        tracing::info!(record_id, user_id, cleared = note.is_none(), "Note updated");
        Ok(queries::get_attendance_record_by_id(&self.pool, record_id).await?)
    }

    /// Administrator justification; blank text removes it.
    pub async fn update_justification(
        &self,
        record_id: i64,
        justification: Option<&str>,
    ) -> AttendanceResult<AttendanceRecord> {
        let justification = normalize_annotation(justification);
        if !queries::update_record_justification(&self.pool, record_id, justification).await? {
            return Err(AttendanceError::RecordNotFound(record_id));
        }
        tracing::info!(record_id, cleared = justification.is_none(), "Justification updated");
        Ok(queries::get_attendance_record_by_id(&self.pool, record_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_test_pool;
    use crate::database::models::NewSite;
    use chrono::TimeZone;

    async fn setup() -> (AttendanceManager, SqlitePool, i64) {
        let pool = create_test_pool().await;
        let user = queries::create_or_get_user(&pool, "42", "ana").await.unwrap();
        let manager = AttendanceManager::new(pool.clone(), FixedOffset::east_opt(0).unwrap());
        (manager, pool, user.id)
    }

    async fn add_site(pool: &SqlitePool, name: &str, lat: f64, lon: f64, radius: f64) -> Site {
        queries::create_site(
            pool,
            &NewSite {
                name: name.to_string(),
                latitude: lat,
                longitude: lon,
                radius_meters: radius,
            },
        )
        .await
        .unwrap()
    }

    fn at(lat: f64, lon: f64) -> Position {
        Position {
            latitude: lat,
            longitude: lon,
            accuracy: Some(12.0),
        }
    }

    fn monday(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn no_sites_means_no_punch() {
        let (manager, pool, user_id) = setup().await;
        let result = manager
            .register_attendance(user_id, RecordType::Entrada, at(0.0, 0.0), None, monday(9, 0))
            .await;
        assert!(matches!(result, Err(AttendanceError::NoSitesConfigured)));
        assert!(queries::get_records_by_date(&pool, monday(9, 0).date_naive()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn entrada_is_stored_with_nearest_site() {
        let (manager, pool, user_id) = setup().await;
        let s1 = add_site(&pool, "S1", 0.0, 0.0, 100.0).await;
        add_site(&pool, "S2", 0.0, 1.0, 50.0).await;

        let receipt = manager
            .register_attendance(user_id, RecordType::Entrada, at(0.0, 0.0), Some(" hola "), monday(9, 0))
            .await
            .unwrap();

        assert_eq!(receipt.site_name, "S1");
        assert_eq!(receipt.accepted_distance, 0);
        assert_eq!(receipt.record.location.nearest_site_id, s1.id);
        assert_eq!(receipt.record.location.accuracy, Some(12.0));
        assert_eq!(receipt.record.date, monday(9, 0).date_naive());
        assert_eq!(receipt.record.note.as_deref(), Some("hola"));
    }

    #[tokio::test]
    async fn salida_first_thing_in_the_day_is_rejected() {
        let (manager, pool, user_id) = setup().await;
        add_site(&pool, "S1", 0.0, 0.0, 100.0).await;

        let result = manager
            .register_attendance(user_id, RecordType::Salida, at(0.0, 0.0), None, monday(9, 0))
            .await;
        assert!(matches!(
            result,
            Err(AttendanceError::SequenceViolation(SequenceViolation::NoOpenShift))
        ));
    }

    #[tokio::test]
    async fn open_shift_blocks_second_entrada_but_allows_distant_salida() {
        let (manager, pool, user_id) = setup().await;
        add_site(&pool, "S1", 0.0, 0.0, 100.0).await;

        manager
            .register_attendance(user_id, RecordType::Entrada, at(0.0, 0.0), None, monday(9, 0))
            .await
            .unwrap();

        let second = manager
            .register_attendance(user_id, RecordType::Entrada, at(0.0, 0.0), None, monday(9, 5))
            .await;
        assert!(matches!(
            second,
            Err(AttendanceError::SequenceViolation(SequenceViolation::OpenShiftExists))
        ));

        let salida = manager
            .register_attendance(user_id, RecordType::Salida, at(5.0, 5.0), None, monday(17, 0))
            .await
            .unwrap();
        assert!(salida.accepted_distance > 100_000);

        let records = manager.list_for_user(user_id, monday(0, 0).date_naive()).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn entrada_outside_radius_is_not_persisted() {
        let (manager, pool, user_id) = setup().await;
        add_site(&pool, "Oficina", 0.0, 0.0, 100.0).await;

        let result = manager
            .register_attendance(
                user_id,
                RecordType::Entrada,
                at(200.0 / 111_194.93, 0.0),
                None,
                monday(9, 0),
            )
            .await;
        match result {
            Err(AttendanceError::OutOfRange { distance, radius, .. }) => {
                assert!((distance - 200.0).abs() < 0.5);
                assert_eq!(radius, 100.0);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
        assert!(manager.list_for_user(user_id, monday(0, 0).date_naive()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn conditional_insert_refuses_out_of_sequence_write() {
        let (_manager, pool, user_id) = setup().await;
        let date = monday(0, 0).date_naive();
        let salida = NewAttendanceRecord {
            user_id,
            record_type: RecordType::Salida,
            timestamp: monday(9, 0),
            date,
            location: RecordLocation {
                latitude: 0.0,
                longitude: 0.0,
                accuracy: None,
                nearest_site_id: 1,
                nearest_site_name: "S1".to_string(),
                distance_to_site_meters: 0,
            },
            note: None,
        };

        let inserted = queries::insert_attendance_record_if_sequence_allows(&pool, &salida)
            .await
            .unwrap();
        assert!(inserted.is_none());

        let entrada = NewAttendanceRecord {
            record_type: RecordType::Entrada,
            ..salida.clone()
        };
        assert!(queries::insert_attendance_record_if_sequence_allows(&pool, &entrada).await.unwrap().is_some());
        assert!(queries::insert_attendance_record_if_sequence_allows(&pool, &entrada).await.unwrap().is_none());
        assert!(queries::insert_attendance_record_if_sequence_allows(&pool, &salida).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn shifts_for_day_group_users() {
        let (manager, pool, user_id) = setup().await;
        add_site(&pool, "S1", 0.0, 0.0, 100.0).await;
        let other = queries::create_or_get_user(&pool, "43", "luis").await.unwrap();

        for (uid, kind, h) in [
            (user_id, RecordType::Entrada, 9),
            (other.id, RecordType::Entrada, 10),
            (user_id, RecordType::Salida, 17),
        ] {
            manager
                .register_attendance(uid, kind, at(0.0, 0.0), None, monday(h, 0))
                .await
                .unwrap();
        }

        let groups = manager.shifts_for_day(monday(0, 0).date_naive()).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].user_id, user_id);
        assert_eq!(groups[0].shifts[0].duration_hours(), Some(8.0));
        assert!(groups[1].shifts[0].salida.is_none());
    }

    #[tokio::test]
    async fn note_round_trip_and_clear() {
        let (manager, pool, user_id) = setup().await;
        add_site(&pool, "S1", 0.0, 0.0, 100.0).await;
        let receipt = manager
            .register_attendance(user_id, RecordType::Entrada, at(0.0, 0.0), None, monday(9, 0))
            .await
            .unwrap();
        let id = receipt.record.id;
        let date = monday(0, 0).date_naive();

        manager.update_note(id, user_id, Some("Reunión externa")).await.unwrap();
        let listed = manager.list_for_user(user_id, date).await.unwrap();
        assert_eq!(listed[0].note.as_deref(), Some("Reunión externa"));

        manager.update_note(id, user_id, Some("")).await.unwrap();
        let listed = manager.list_for_user(user_id, date).await.unwrap();
        assert_eq!(listed[0].note, None);

        // Clearing again is a no-op, not an error.
        manager.update_note(id, user_id, None).await.unwrap();
    }

    #[tokio::test]
    async fn note_on_foreign_record_is_not_found() {
        let (manager, pool, user_id) = setup().await;
        add_site(&pool, "S1", 0.0, 0.0, 100.0).await;
        let receipt = manager
            .register_attendance(user_id, RecordType::Entrada, at(0.0, 0.0), None, monday(9, 0))
            .await
            .unwrap();

        let result = manager.update_note(receipt.record.id, user_id + 1, Some("x")).await;
        assert!(matches!(result, Err(AttendanceError::RecordNotFound(_))));
    }

    #[tokio::test]
    async fn justification_keeps_record_history() {
        let (manager, pool, user_id) = setup().await;
        add_site(&pool, "S1", 0.0, 0.0, 100.0).await;
        let receipt = manager
            .register_attendance(user_id, RecordType::Entrada, at(0.0, 0.0), None, monday(11, 0))
            .await
            .unwrap();

        let updated = manager
            .update_justification(receipt.record.id, Some("Cita médica"))
            .await
            .unwrap();
        assert_eq!(updated.justification.as_deref(), Some("Cita médica"));
        assert_eq!(updated.timestamp, receipt.record.timestamp);

        assert!(matches!(
            manager.update_justification(9999, Some("x")).await,
            Err(AttendanceError::RecordNotFound(9999))
        ));
    }

    #[tokio::test]
    async fn schedule_context_creates_default() {
        let (manager, pool, _) = setup().await;
        add_site(&pool, "S1", 0.0, 0.0, 100.0).await;
        let context = manager.load_schedule_context().await.unwrap();
        assert_eq!(context.schedule, ScheduleConfig::default());
        assert_eq!(context.sites.len(), 1);
    }
}
