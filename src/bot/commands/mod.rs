pub mod attendance;
pub mod notes;
pub mod profile;
pub mod reports;
pub mod schedule;
pub mod sites;
pub mod status;
