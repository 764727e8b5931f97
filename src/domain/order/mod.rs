// ============================================================================
// Order Domain - Business Logic for the Order Board
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (Order, OrderStatus)
// - Events (Initial, OrderCreated, OrderUpdated push frames)
// - Commands (Create, UpdateStatus)
// - Errors (OrderError enum)
// - Service (OrderService, the only mutation path)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod service;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use service::*;
