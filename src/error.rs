use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceViolation {
    /// An entrada was attempted while a shift is still open.
    OpenShiftExists,
    /// A salida was attempted with no shift open.
    NoOpenShift,
}

impl std::fmt::Display for SequenceViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceViolation::OpenShiftExists => write!(f, "open shift exists"),
            SequenceViolation::NoOpenShift => write!(f, "no open shift"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationFailure {
    #[error("permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("timeout")]
    Timeout,
    #[error("unsupported")]
    Unsupported,
}

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("no sites configured")]
    NoSitesConfigured,

    #[error("sequence violation: {0}")]
    SequenceViolation(SequenceViolation),

    #[error("out of range: {distance:.0}m from {site_name} (allowed {radius:.0}m)")]
    OutOfRange {
        distance: f64,
        site_name: String,
        radius: f64,
    },

    #[error("backend unavailable")]
    BackendUnavailable(#[from] sqlx::Error),

    #[error("geolocation failure: {0}")]
    GeolocationFailure(#[from] GeolocationFailure),

    #[error("attendance record {0} not found")]
    RecordNotFound(i64),
}

impl AttendanceError {
    /// Message shown to the user in the Discord reply.
    pub fn user_message(&self) -> String {
        match self {
            AttendanceError::NoSitesConfigured => {
                "No hay ubicaciones configuradas. Contacta con un administrador.".to_string()
            }
            AttendanceError::SequenceViolation(SequenceViolation::OpenShiftExists) => {
                "Ya tienes una entrada abierta. Registra primero tu salida.".to_string()
            }
            AttendanceError::SequenceViolation(SequenceViolation::NoOpenShift) => {
                "No tienes una entrada abierta. Registra primero tu entrada.".to_string()
            }
            AttendanceError::OutOfRange {
                distance,
                site_name,
                radius,
            } => format!(
                "Estás a {:.0}m de {}. El radio permitido es de {:.0}m.",
                distance, site_name, radius
            ),
            AttendanceError::BackendUnavailable(_) => {
                "No se pudo acceder a la base de datos. Inténtalo de nuevo.".to_string()
            }
            AttendanceError::GeolocationFailure(failure) => match failure {
                GeolocationFailure::PermissionDenied => {
                    "Usuario denegó la solicitud de geolocalización.".to_string()
                }
                GeolocationFailure::PositionUnavailable => {
                    "Información de ubicación no disponible.".to_string()
                }
                GeolocationFailure::Timeout => {
                    "Se agotó el tiempo de espera para obtener la ubicación.".to_string()
                }
                GeolocationFailure::Unsupported => {
                    "Geolocalización no disponible: indica latitud y longitud.".to_string()
                }
            },
            AttendanceError::RecordNotFound(id) => {
                format!("No se encontró el registro {}.", id)
            }
        }
    }
}

pub type AttendanceResult<T> = std::result::Result<T, AttendanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_carries_distance_and_radius() {
        let err = AttendanceError::OutOfRange {
            distance: 200.4,
            site_name: "Oficina".to_string(),
            radius: 100.0,
        };
        assert_eq!(
            err.user_message(),
            "Estás a 200m de Oficina. El radio permitido es de 100m."
        );
    }

    #[test]
    fn geolocation_failures_have_distinct_messages() {
        let messages: Vec<String> = [
            GeolocationFailure::PermissionDenied,
            GeolocationFailure::PositionUnavailable,
            GeolocationFailure::Timeout,
            GeolocationFailure::Unsupported,
        ]
        .into_iter()
        .map(|f| AttendanceError::from(f).user_message())
        .collect();

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
