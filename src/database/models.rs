use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub discord_id: String,
    pub username: String,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        match (&self.name, &self.last_name) {
            (Some(name), Some(last_name)) => format!("{} {}", name, last_name),
            (Some(name), None) => name.clone(),
            _ => self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Employee,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Employee => "employee",
            UserRole::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employee" => Ok(UserRole::Employee),
            "admin" => Ok(UserRole::Admin),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub schedule_config: Option<ScheduleConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an administrator supplies when creating or editing a site.
#[derive(Debug, Clone)]
pub struct NewSite {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    /// Weekday ordinals, 0 = Sunday .. 6 = Saturday.
    pub work_days: BTreeSet<u32>,
    #[serde(with = "hhmm")]
    pub entry_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub exit_time: NaiveTime,
    pub tolerance_minutes: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            work_days: (1..=5).collect(),
            entry_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            exit_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            tolerance_minutes: 15,
        }
    }
}

impl ScheduleConfig {
    pub fn work_days_to_string(&self) -> String {
        self.work_days
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn parse_work_days(s: &str) -> anyhow::Result<BTreeSet<u32>> {
        let mut days = BTreeSet::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let day: u32 = part
                .parse()
                .map_err(|_| anyhow::anyhow!("Día laborable inválido: {}", part))?;
            if day > 6 {
                return Err(anyhow::anyhow!("Día laborable fuera de rango (0-6): {}", day));
            }
            days.insert(day);
        }
        Ok(days)
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        crate::utils::time::parse_time_string(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub user_id: i64,
    pub record_type: RecordType,
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
    pub location: RecordLocation,
    pub note: Option<String>,
    pub justification: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub nearest_site_id: i64,
    pub nearest_site_name: String,
    pub distance_to_site_meters: i64,
}

/// A punch that passed validation and is about to be written.
#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
    pub user_id: i64,
    pub record_type: RecordType,
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
    pub location: RecordLocation,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Entrada,
    Salida,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Entrada => "entrada",
            RecordType::Salida => "salida",
        }
    }
}

impl FromStr for RecordType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entrada" => Ok(RecordType::Entrada),
            "salida" => Ok(RecordType::Salida),
            _ => Err(anyhow::anyhow!("Invalid record type: {}", s)),
        }
    }
}
