// ABOUTME: PostgreSQL access for the fleet record store
// ABOUTME: Connection provider, result materialization and query session

pub mod connection;
pub mod materialize;
pub mod session;

pub use connection::connect;
pub use materialize::Record;
pub use session::{Params, Session};
