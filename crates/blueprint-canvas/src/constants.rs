//! Canvas-wide constants

/// Undo/redo history configuration
pub mod history {
    /// Maximum number of snapshots kept in the timeline
    pub const MAX_HISTORY: usize = 50;
    /// zstd compression level for snapshots
    pub const COMPRESSION_LEVEL: i32 = 3;
}

/// Default values for a fresh canvas
pub mod defaults {
    /// Project name used until the user renames the project
    pub const PROJECT_NAME: &str = "Untitled Project";
}
