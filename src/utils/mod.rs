pub mod attendance_manager;
pub mod format;
pub mod geo;
pub mod geolocation;
pub mod record_validator;
pub mod shift_pairing;
pub mod status;
pub mod time;
pub mod validation;
