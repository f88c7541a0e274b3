use crate::database::models::{NewSite, ScheduleConfig};
use crate::utils::time::parse_time_string;
use anyhow::Result;

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(anyhow::anyhow!("Las coordenadas deben ser números válidos"));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(anyhow::anyhow!("La latitud debe estar entre -90 y 90"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(anyhow::anyhow!("La longitud debe estar entre -180 y 180"));
    }
    Ok(())
}

pub fn validate_site(site: &NewSite) -> Result<()> {
    if site.name.trim().is_empty() {
        return Err(anyhow::anyhow!("El nombre de la ubicación no puede estar vacío"));
    }
    validate_coordinates(site.latitude, site.longitude)?;
    if !site.radius_meters.is_finite() || site.radius_meters <= 0.0 {
        return Err(anyhow::anyhow!("El radio debe ser mayor que 0 metros"));
    }
    Ok(())
}

/// Builds a schedule from admin-entered text fields.
pub fn parse_schedule(
    work_days: &str,
    entry_time: &str,
    exit_time: &str,
    tolerance_minutes: i64,
) -> Result<ScheduleConfig> {
    let work_days = ScheduleConfig::parse_work_days(work_days)?;
    if work_days.is_empty() {
        return Err(anyhow::anyhow!("Indica al menos un día laborable"));
    }
    let entry_time = parse_time_string(entry_time)?;
    let exit_time = parse_time_string(exit_time)?;

    if exit_time <= entry_time {
        return Err(anyhow::anyhow!(
            "La hora de salida debe ser posterior a la hora de entrada"
        ));
    }

    let tolerance_minutes = u32::try_from(tolerance_minutes)
        .map_err(|_| anyhow::anyhow!("La tolerancia no puede ser negativa"))?;

    Ok(ScheduleConfig {
        work_days,
        entry_time,
        exit_time,
        tolerance_minutes,
    })
}

/// Empty or whitespace-only text clears the field.
pub fn normalize_annotation(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_out_of_range_are_rejected() {
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, -181.0).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
        assert!(validate_coordinates(-90.0, 180.0).is_ok());
    }

    #[test]
    fn site_radius_must_be_positive() {
        let mut site = NewSite {
            name: "Oficina".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            radius_meters: 0.0,
        };
        assert!(validate_site(&site).is_err());
        site.radius_meters = 50.0;
        assert!(validate_site(&site).is_ok());
        site.name = "  ".to_string();
        assert!(validate_site(&site).is_err());
    }

    #[test]
    fn schedule_requires_exit_after_entry() {
        assert!(parse_schedule("1,2,3", "18:00", "09:00", 10).is_err());
        assert!(parse_schedule("1,2,3", "09:00", "18:00", -1).is_err());
        assert!(parse_schedule("", "09:00", "18:00", 10).is_err());
        assert!(parse_schedule(" , ", "09:00", "18:00", 10).is_err());

        let schedule = parse_schedule("1,2,3", "08:30", "17:00", 10).unwrap();
        assert_eq!(schedule.work_days_to_string(), "1,2,3");
        assert_eq!(schedule.tolerance_minutes, 10);
    }

    #[test]
    fn blank_annotation_clears() {
        assert_eq!(normalize_annotation(Some("   ")), None);
        assert_eq!(normalize_annotation(None), None);
        assert_eq!(normalize_annotation(Some(" tráfico ")), Some("tráfico"));
    }
}
