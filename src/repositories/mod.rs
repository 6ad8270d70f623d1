//! Repositorios
//!
//! Acceso a datos de reservas: el trait `OperationsStore` y sus
//! implementaciones sobre PostgreSQL y en memoria.

pub mod booking_repository;
pub mod in_memory_store;
pub mod operations_store;

pub use booking_repository::BookingRepository;
pub use in_memory_store::InMemoryOperationsStore;
pub use operations_store::{OperationsStore, ReturnStageUpdate, StatusUpdate};
