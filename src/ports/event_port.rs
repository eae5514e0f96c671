//! Notification sink port trait.

/// Receives engine notifications after each committed closure so that linked
/// drawings and any trade-journal log can be synchronized. Implementations
/// must not call back into the engine from inside these hooks.
pub trait EventSink {
    /// A position closed, manually or by trigger. The closing details are
    /// available from the engine via `closed_position_result`.
    fn on_position_closed(&mut self, position_id: &str);

    /// An active tool's linked position is gone; the drawing layer should
    /// run its own `closed` transition or drop the tool.
    fn on_tool_should_be_removed(&mut self, tool_id: &str);
}

/// Sink that ignores every notification.
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn on_position_closed(&mut self, _position_id: &str) {}
    fn on_tool_should_be_removed(&mut self, _tool_id: &str) {}
}
