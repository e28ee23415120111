// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "querydeck";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".querydeck";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "querydeck.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "QUERYDECK_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "QUERYDECK_LOG";

// =============================================================================
// Batch Execution
// =============================================================================

/// Environment variable for maximum in-flight batch operations
pub const ENV_BATCH_CONCURRENCY: &str = "QUERYDECK_BATCH_CONCURRENCY";

/// Environment variable for maximum batch operations started per second
pub const ENV_BATCH_RATE: &str = "QUERYDECK_BATCH_RATE";

/// Environment variable for progress callback interval
pub const ENV_PROGRESS_INTERVAL: &str = "QUERYDECK_PROGRESS_INTERVAL";

/// Default number of simultaneously in-flight write operations
pub const DEFAULT_BATCH_CONCURRENCY: usize = 10;

/// Highest accepted start rate; the pacing period is one second divided by it
pub const MAX_BATCH_RATE: u32 = 1_000_000_000;

/// Default number of completed operations between progress callbacks
pub const DEFAULT_PROGRESS_INTERVAL: usize = 25;

// =============================================================================
// Bulk Workflow
// =============================================================================

/// Title passed to the confirmation collaborator
pub const BULK_CONFIRM_TITLE: &str = "Confirm bulk operation";

/// Warning produced when a bulk filter matches nothing
pub const NO_RECORDS_MATCH: &str = "No records match the filter";

/// Info produced when the user declines a bulk run
pub const BULK_CANCELLED: &str = "Bulk operation cancelled";

// =============================================================================
// Event Bus
// =============================================================================

/// Broadcast channel capacity for engine events
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;
