//! Event types for observing execution
//!
//! The interpreter reports each run, pass and node step to an [`EventSink`]
//! passed in by the caller. Nested composite runs report to the same sink
//! with a larger `depth`.

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;

/// Trait for receiving execution events
///
/// Sinks observe only; a failed send is logged and never alters scheduling.
pub trait EventSink: Send + Sync {
    fn send(&self, event: ExecutionEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Events emitted while a composite runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExecutionEvent {
    /// A composite started running
    #[serde(rename_all = "camelCase")]
    RunStarted { function_id: String, depth: usize },

    /// A node is about to execute
    ///
    /// `function_id` is the function the node calls.
    #[serde(rename_all = "camelCase")]
    StepStarted {
        function_id: String,
        node_index: usize,
        node_id: NodeId,
        depth: usize,
    },

    /// A pass over the pending nodes finished
    #[serde(rename_all = "camelCase")]
    PassCompleted {
        function_id: String,
        pass: usize,
        progressed: bool,
        depth: usize,
    },

    /// A composite produced its outputs
    #[serde(rename_all = "camelCase")]
    RunCompleted {
        function_id: String,
        passes: usize,
        depth: usize,
    },

    /// A composite stalled
    #[serde(rename_all = "camelCase")]
    RunFailed {
        function_id: String,
        error: String,
        depth: usize,
    },
}

impl ExecutionEvent {
    pub fn depth(&self) -> usize {
        match self {
            Self::RunStarted { depth, .. }
            | Self::StepStarted { depth, .. }
            | Self::PassCompleted { depth, .. }
            | Self::RunCompleted { depth, .. }
            | Self::RunFailed { depth, .. } => *depth,
        }
    }
}

/// Send an event, logging instead of failing
pub(crate) fn emit(sink: &dyn EventSink, event: ExecutionEvent) {
    if let Err(e) = sink.send(event) {
        log::warn!("Dropped execution event: {}", e);
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: ExecutionEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<ExecutionEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Node indices of top-level steps, in execution order
    pub fn steps(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ExecutionEvent::StepStarted {
                    node_index,
                    depth: 0,
                    ..
                } => Some(node_index),
                _ => None,
            })
            .collect()
    }

    /// Number of passes the top-level run took, if it completed
    pub fn passes(&self) -> Option<usize> {
        self.events().into_iter().find_map(|event| match event {
            ExecutionEvent::RunCompleted {
                passes, depth: 0, ..
            } => Some(passes),
            _ => None,
        })
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: ExecutionEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError::new("event buffer poisoned"))?
            .push(event);
        Ok(())
    }
}

/// Adapter delivering top-level node indices to a callback
///
/// Fires before each node of the outermost graph executes, in pass order.
pub struct StepCallback<F> {
    callback: F,
}

impl<F> StepCallback<F>
where
    F: Fn(usize) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> EventSink for StepCallback<F>
where
    F: Fn(usize) + Send + Sync,
{
    fn send(&self, event: ExecutionEvent) -> Result<(), EventError> {
        if let ExecutionEvent::StepStarted {
            node_index,
            depth: 0,
            ..
        } = event
        {
            (self.callback)(node_index);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn step(node_index: usize, depth: usize) -> ExecutionEvent {
        ExecutionEvent::StepStarted {
            function_id: "f".to_string(),
            node_index,
            node_id: NodeId::new(),
            depth,
        }
    }

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();
        sink.send(step(1, 0)).unwrap();
        sink.send(step(4, 1)).unwrap();
        sink.send(ExecutionEvent::RunCompleted {
            function_id: "f".to_string(),
            passes: 2,
            depth: 0,
        })
        .unwrap();

        assert_eq!(sink.events().len(), 3);
        assert_eq!(sink.steps(), vec![1]);
        assert_eq!(sink.passes(), Some(2));

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_event_sink() {
        let sink = NullEventSink;
        sink.send(step(0, 0)).unwrap();
    }

    #[test]
    fn test_step_callback_ignores_nested_steps() {
        let total = AtomicUsize::new(0);
        let sink = StepCallback::new(|index| {
            total.fetch_add(index + 1, Ordering::SeqCst);
        });
        sink.send(step(2, 0)).unwrap();
        sink.send(step(7, 1)).unwrap();
        assert_eq!(total.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(step(3, 0)).unwrap();
        assert_eq!(json["type"], "stepStarted");
        assert_eq!(json["nodeIndex"], 3);
    }
}
