//! Infrastructure layer - database, locking, state wiring and error mapping.

pub mod cell_lock;
pub mod db;
pub mod db_errors;
pub mod state;
