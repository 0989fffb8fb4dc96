// ABOUTME: Entity repositories for aircraft and user records
// ABOUTME: Each operation opens and releases its own connection

pub mod aircraft;
pub mod users;

pub use aircraft::AircraftRepository;
pub use users::{NewUser, UserRepository, UserUpdate};
