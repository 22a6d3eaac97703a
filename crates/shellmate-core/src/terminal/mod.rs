//! Contracts the host application implements so the assistant can observe
//! terminals and write into them.

pub mod prompt;
pub mod session;
pub mod sink;

pub use prompt::{ConfirmationPrompt, ConfirmationRequest, NotificationLevel, Notifier};
pub use session::{
    SessionSource, Subscription, TerminalEvent, TerminalEventSender, TerminalSessionInfo,
};
pub use sink::{ActiveTerminalResolver, SinkCapability, SinkError, TerminalSink};
