//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 10-19   | ai               | API key and completion service codes     |
//! | 20-29   | data             | Reference dataset codes                  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `workflow_exit_code` or the relevant command

use woodshu_engine::WorkflowError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// AI (10-19)
// =============================================================================

/// No API key in the keychain or the environment.
pub const EXIT_AI_MISSING_KEY: u8 = 11;

/// The completion service (or the network on the way) failed the request.
pub const EXIT_AI_SERVICE: u8 = 13;

// =============================================================================
// Data (20-29)
// =============================================================================

/// Reference dataset missing, unreadable, or lacking required columns.
pub const EXIT_DATA_UNAVAILABLE: u8 = 20;

/// Wood species not present in the reference dataset.
pub const EXIT_DATA_UNKNOWN_WOOD: u8 = 21;

/// Map a workflow error to its exit code.
pub fn workflow_exit_code(err: &WorkflowError) -> u8 {
    match err {
        WorkflowError::Configuration(_) => EXIT_AI_MISSING_KEY,
        WorkflowError::DataUnavailable(_) => EXIT_DATA_UNAVAILABLE,
        WorkflowError::Service(_) => EXIT_AI_SERVICE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_do_not_collide() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_AI_MISSING_KEY,
            EXIT_AI_SERVICE,
            EXIT_DATA_UNAVAILABLE,
            EXIT_DATA_UNKNOWN_WOOD,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn workflow_errors_map_by_kind() {
        assert_eq!(
            workflow_exit_code(&WorkflowError::Configuration("no key".into())),
            EXIT_AI_MISSING_KEY
        );
        assert_eq!(
            workflow_exit_code(&WorkflowError::DataUnavailable("gone".into())),
            EXIT_DATA_UNAVAILABLE
        );
        assert_eq!(workflow_exit_code(&WorkflowError::Service("503".into())), EXIT_AI_SERVICE);
    }
}
