// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure for the push channel.
//
// Structure:
// - registry       - ConnectionRegistry and the Connection write handle
// - broadcast_hub  - BroadcastHub actor, owner of the registry and fan-out
//
// Note: Domain logic (OrderService) does NOT live in actors.
//       Actors are reserved for infrastructure concerns only.
//
// ============================================================================

mod broadcast_hub;
mod registry;

pub use broadcast_hub::{BroadcastHub, GetActiveConnections, Join, Leave, Publish};
pub use registry::{Connection, ConnectionId};
