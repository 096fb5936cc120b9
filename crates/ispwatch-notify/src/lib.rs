// # ispwatch Notifications
//
// This crate provides the `Notifier` implementation used by the daemon.
//
// ## Architecture
//
// ```text
// CheckEngine ──▶ MessageNotifier ──render──▶ Message ──▶ Transport
//                                                          ├── LogTransport
//                                                          └── WebhookTransport
// ```
//
// Rendering is pure and lives in `render`. Transports deliver exactly one
// message per call and never retry; the engine logs delivery failures and
// moves on.

pub mod message;
pub mod notifier;
pub mod render;
pub mod transport;

pub use message::{EventKind, Message};
pub use notifier::MessageNotifier;
pub use render::{DnsProviderLink, RenderContext};
pub use transport::{LogTransport, Transport, WebhookTransport};
