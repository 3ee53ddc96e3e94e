//! Notification formatting and delivery.
//!
//! [`Formatter`] maps one new [`hookwatch_core::Item`] plus its source into a
//! sink-agnostic [`NotificationPayload`]; [`WebhookSink`] serializes that
//! payload to the webhook wire shape and posts it.

pub mod error;
pub mod format;
pub mod links;
pub mod payload;
pub mod sink;
pub mod transform;

pub use error::DeliveryError;
pub use format::Formatter;
pub use payload::{Embed, EmbedAuthor, NotificationPayload, WebhookMessage};
pub use sink::{Ack, DeliverySink, WebhookSink};
pub use transform::{Chain, Identity, StripMarkup, TextTransform};
