// ============================================================================
// Event Scheduling - Deferred Delivery
// ============================================================================
//
// Durable timer semantics: persist first, arm bounded in-memory timers,
// reconcile periodically so long delays and restarts are covered.
//
// ============================================================================

pub mod scheduler;
pub mod storage;

pub use scheduler::{ScheduleToken, SimpleEventScheduler, TimeUnit};
pub use storage::{MemoryScheduleStorage, ScheduleStorage, ScheduledEvent};
