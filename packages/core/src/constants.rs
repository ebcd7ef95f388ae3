use std::env;
use std::path::PathBuf;

/// Get the path to the Taskboard directory (~/.taskboard)
pub fn taskboard_dir() -> PathBuf {
    // First try HOME environment variable (useful for tests)
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".taskboard")
    } else {
        // Fall back to dirs crate for normal usage
        dirs::home_dir()
            .expect("Unable to get home directory")
            .join(".taskboard")
    }
}

/// Get the path to the default board database (~/.taskboard/board.db)
pub fn board_db_file() -> PathBuf {
    taskboard_dir().join("board.db")
}
