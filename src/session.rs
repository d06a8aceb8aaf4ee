//! Communication with the presentation layer
//!
//! The games never render anything themselves. They push updates through a
//! tunnel implemented by whatever draws the screen, and answer full state
//! snapshots when the screen needs to redraw from scratch.

use super::{SyncMessage, UpdateMessage};

/// Trait for sending messages to the presentation layer
pub trait Tunnel {
    /// Sends an incremental update
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a full state snapshot
    ///
    /// # Arguments
    ///
    /// * `state` - The synchronization message to send
    fn send_state(&self, state: &SyncMessage);
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Records everything sent through it
    #[derive(Default)]
    pub(crate) struct RecordingTunnel {
        pub(crate) messages: RefCell<Vec<UpdateMessage>>,
        pub(crate) states: RefCell<Vec<SyncMessage>>,
    }

    impl RecordingTunnel {
        pub(crate) fn last_message(&self) -> Option<UpdateMessage> {
            self.messages.borrow().last().cloned()
        }

        pub(crate) fn message_count(&self) -> usize {
            self.messages.borrow().len()
        }
    }

    impl Tunnel for RecordingTunnel {
        fn send_message(&self, message: &UpdateMessage) {
            self.messages.borrow_mut().push(message.clone());
        }

        fn send_state(&self, state: &SyncMessage) {
            self.states.borrow_mut().push(state.clone());
        }
    }
}
