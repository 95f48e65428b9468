/// Default number of messages a node's inbox holds before dispatch waits
pub const DEFAULT_INBOX_CAPACITY: usize = 1024;
/// Minimum inbox capacity (a node must be able to queue its Start)
pub const MIN_INBOX_CAPACITY: usize = 1;
/// Maximum inbox capacity - bounds per-node memory
pub const MAX_INBOX_CAPACITY: usize = 1_048_576;
/// Default tracing filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "info";
