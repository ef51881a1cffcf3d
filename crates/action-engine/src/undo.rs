//! Undo/redo history for composite functions
//!
//! Each snapshot is the function's persisted record (with its own parameter
//! lists), serialized to JSON and compressed with zstd. Restoring a snapshot
//! decodes it through a [`FunctionCodec`], so the host's registry and roster
//! are reattached on the way back.

use std::collections::VecDeque;

use crate::codec::{EncodedFunction, FunctionCodec, SchemaVariant};
use crate::config::HistoryConfig;
use crate::error::{ActionError, Result};
use crate::function::Function;

/// Undo/redo stack using compressed snapshots
pub struct UndoStack {
    /// Compressed records (zstd)
    snapshots: VecDeque<Vec<u8>>,
    /// Current position in the stack
    current: usize,
    /// Maximum number of snapshots to keep
    max_snapshots: usize,
    compression_level: i32,
}

impl UndoStack {
    /// Create a new undo stack with the specified maximum size
    pub fn new(max_snapshots: usize) -> Self {
        Self::from_config(&HistoryConfig {
            max_snapshots,
            ..HistoryConfig::default()
        })
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self {
            snapshots: VecDeque::new(),
            current: 0,
            max_snapshots: config.max_snapshots.max(1),
            compression_level: config.compression_level,
        }
    }

    /// Record the current state of a composite
    ///
    /// This truncates any redo history (snapshots after current position).
    pub fn push(&mut self, function: &Function, codec: &FunctionCodec<'_>) -> Result<()> {
        let record = codec.encode(function, SchemaVariant::WithSignature)?;
        let json = serde_json::to_vec(&record)?;
        let compressed =
            zstd::encode_all(&json[..], self.compression_level).map_err(ActionError::compression)?;

        while self.snapshots.len() > self.current + 1 {
            self.snapshots.pop_back();
        }

        self.snapshots.push_back(compressed);
        self.current = self.snapshots.len() - 1;

        while self.snapshots.len() > self.max_snapshots {
            self.snapshots.pop_front();
            if self.current > 0 {
                self.current -= 1;
            }
        }

        log::trace!(
            "History of '{}': {} snapshot(s), {} byte(s)",
            function.id,
            self.snapshots.len(),
            self.compressed_size()
        );
        Ok(())
    }

    /// Step back one snapshot
    ///
    /// Returns the previous state, or None if at the beginning.
    pub fn undo(&mut self, codec: &FunctionCodec<'_>) -> Option<Result<Function>> {
        if self.current > 0 {
            self.current -= 1;
            Some(self.restore(self.current, codec))
        } else {
            None
        }
    }

    /// Step forward one snapshot
    ///
    /// Returns the next state, or None if at the end.
    pub fn redo(&mut self, codec: &FunctionCodec<'_>) -> Option<Result<Function>> {
        if self.current + 1 < self.snapshots.len() {
            self.current += 1;
            Some(self.restore(self.current, codec))
        } else {
            None
        }
    }

    /// The current state without moving
    pub fn current(&self, codec: &FunctionCodec<'_>) -> Option<Result<Function>> {
        if self.snapshots.is_empty() {
            None
        } else {
            Some(self.restore(self.current, codec))
        }
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.current = 0;
    }

    /// Total compressed size of all snapshots
    pub fn compressed_size(&self) -> usize {
        self.snapshots.iter().map(|s| s.len()).sum()
    }

    fn restore(&self, index: usize, codec: &FunctionCodec<'_>) -> Result<Function> {
        let compressed = &self.snapshots[index];
        let json = zstd::decode_all(&compressed[..]).map_err(ActionError::compression)?;
        let record: EncodedFunction = serde_json::from_slice(&json)?;
        Ok(codec.decode(&record).function)
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::from_config(&HistoryConfig::default())
    }
}
