//! Constants used throughout the engine
//!
//! This module centralizes magic strings and default values to improve
//! maintainability and consistency.

/// Prefix of locally-generated record identifiers
pub const LOCAL_ID_PREFIX: &str = "local-";

// Default debounce delays per field-group class, in milliseconds
/// Keystroke-driven name edits
pub const DEFAULT_NAME_DEBOUNCE_MS: u64 = 300;
/// Keystroke-driven description edits
pub const DEFAULT_DESCRIPTION_DEBOUNCE_MS: u64 = 400;
/// Spinner-driven allocated-hours edits
pub const DEFAULT_ALLOCATED_HOURS_DEBOUNCE_MS: u64 = 1000;
/// Upper bound accepted from configuration for any debounce delay
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

// Log Messages
pub const LOG_CREATE_OK: &str = "✅ Created task on remote store";
pub const LOG_CREATE_FAILED: &str = "❌ Failed to create task on remote store";
pub const LOG_COMMIT_OK: &str = "✅ Committed field group";
pub const LOG_COMMIT_FAILED: &str = "❌ Failed to commit field group";
pub const LOG_DELETE_OK: &str = "✅ Deleted task on remote store";
pub const LOG_DELETE_FAILED: &str = "❌ Failed to delete task on remote store";

// Config Messages
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";

/// Name of the log file written next to the configuration
pub const LOG_FILE_NAME: &str = "recurrist.log";
