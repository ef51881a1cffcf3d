//! Layout and history configuration

use serde::{Deserialize, Serialize};

use crate::graph::Position;

/// Default values
pub mod defaults {
    use crate::graph::Position;

    /// Width of a node and of a function's boundary nodes
    pub const NODE_WIDTH: f64 = 150.0;
    /// Side length of the square editing area
    pub const EDITOR_SIDE_LENGTH: f64 = 2000.0;
    /// Where nodes land when the caller gives no position
    pub const NODE_POSITION: Position = (EDITOR_SIDE_LENGTH / 2.0, EDITOR_SIDE_LENGTH / 2.0);
    pub const INPUT_NODE_POSITION: Position =
        (EDITOR_SIDE_LENGTH / 2.0 - 300.0, EDITOR_SIDE_LENGTH / 2.0 + 50.0);
    pub const OUTPUT_NODE_POSITION: Position =
        (EDITOR_SIDE_LENGTH / 2.0 + 300.0, EDITOR_SIDE_LENGTH / 2.0 - 50.0);
    /// Undo history depth
    pub const MAX_SNAPSHOTS: usize = 100;
    /// zstd level for history snapshots
    pub const COMPRESSION_LEVEL: i32 = 3;
}

/// Geometry used when creating functions and nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub editor_side_length: f64,
    pub input_node_position: Position,
    pub output_node_position: Position,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: defaults::NODE_WIDTH,
            editor_side_length: defaults::EDITOR_SIDE_LENGTH,
            input_node_position: defaults::INPUT_NODE_POSITION,
            output_node_position: defaults::OUTPUT_NODE_POSITION,
        }
    }
}

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// Maximum number of snapshots to keep (at least 1)
    pub max_snapshots: usize,
    pub compression_level: i32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_snapshots: defaults::MAX_SNAPSHOTS,
            compression_level: defaults::COMPRESSION_LEVEL,
        }
    }
}
