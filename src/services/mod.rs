//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación: la proyección
//! del ciclo de vida de las reservas, el flujo de devolución y el servicio que
//! los combina con el almacén de datos.

pub mod booking_operations_service;
pub mod lifecycle_projector;
pub mod return_workflow;

pub use booking_operations_service::BookingOperationsService;
pub use lifecycle_projector::{project, LifecycleProjection, ProjectionInput};
