pub mod accounts;
pub mod attendance;
pub mod auth;
pub mod clock;
pub mod dashboard;
pub mod devices;
pub mod freshness;
pub mod mailer;
pub mod pending;
pub mod presence;
pub mod rfid_relay;
pub mod schedules;
pub mod students;
