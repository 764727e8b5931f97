// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Domain types and the service that validates and commits mutations.
// Persistence lives in `store`, fan-out lives in `actors`.
//
// ============================================================================

pub mod order;
