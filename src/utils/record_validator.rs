use crate::database::models::{AttendanceRecord, RecordType, Site};
use crate::error::{AttendanceError, AttendanceResult, SequenceViolation};
use crate::utils::geo;
use crate::utils::geolocation::Position;

#[derive(Debug, Clone, Copy)]
pub struct NearestSite<'a> {
    pub site: &'a Site,
    pub distance: f64,
}

pub struct RecordValidator;

impl RecordValidator {
    /// Entrada needs every earlier shift closed; salida needs one open.
    pub fn validate_sequence(
        existing_records: &[AttendanceRecord],
        new_record_type: RecordType,
    ) -> AttendanceResult<()> {
        let entradas = existing_records
            .iter()
            .filter(|r| r.record_type == RecordType::Entrada)
            .count();
        let salidas = existing_records.len() - entradas;

        Self::check_counts(entradas, salidas, new_record_type)
    }

    fn check_counts(entradas: usize, salidas: usize, new_record_type: RecordType) -> AttendanceResult<()> {
        match new_record_type {
            RecordType::Entrada if entradas > salidas => Err(AttendanceError::SequenceViolation(
                SequenceViolation::OpenShiftExists,
            )),
            RecordType::Salida if entradas <= salidas => Err(AttendanceError::SequenceViolation(
                SequenceViolation::NoOpenShift,
            )),
            _ => Ok(()),
        }
    }

    /// Closest site to `position`; on equal distances the earlier site wins.
    pub fn find_nearest_site<'a>(sites: &'a [Site], position: &Position) -> Option<NearestSite<'a>> {
        let mut nearest: Option<NearestSite<'a>> = None;

        for site in sites {
            let distance = geo::distance(
                position.latitude,
                position.longitude,
                site.latitude,
                site.longitude,
            );
            match nearest {
                Some(current) if distance >= current.distance => {}
                _ => nearest = Some(NearestSite { site, distance }),
            }
        }

        nearest
    }

    /// Only entradas are geofenced.
    pub fn validate_geofence(record_type: RecordType, nearest: &NearestSite<'_>) -> AttendanceResult<()> {
        if record_type == RecordType::Entrada && nearest.distance > nearest.site.radius_meters {
            return Err(AttendanceError::OutOfRange {
                distance: nearest.distance,
                site_name: nearest.site.name.clone(),
                radius: nearest.site.radius_meters,
            });
        }
        Ok(())
    }

    /// Full punch validation, in the order the rules are applied.
    pub fn validate_punch<'a>(
        sites: &'a [Site],
        existing_records: &[AttendanceRecord],
        record_type: RecordType,
        position: &Position,
    ) -> AttendanceResult<NearestSite<'a>> {
        if sites.is_empty() {
            return Err(AttendanceError::NoSitesConfigured);
        }

        Self::validate_sequence(existing_records, record_type)?;

        let nearest = Self::find_nearest_site(sites, position).ok_or(AttendanceError::NoSitesConfigured)?;

        Self::validate_geofence(record_type, &nearest)?;

        Ok(nearest)
    }
}
