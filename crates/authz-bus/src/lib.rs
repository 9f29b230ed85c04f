//! Request/reply dispatch for the authorization-record service.
//!
//! A [`Bus`] routes messages by subject to a single subscriber and carries
//! the reply back to the requester. [`register_all`] subscribes one task per
//! [`Operation`] subject; each inbound message is decoded, handed to the
//! [`authz_core::RecordEngine`] through a [`Handler`], and answered with
//! exactly one reply: the result as JSON, or an [`ErrorReply`] envelope.
//!
//! # Wiring
//!
//! ```rust,ignore
//! let bus = Bus::new();
//! let handler = Arc::new(Handler::new(RecordEngine::new(store)));
//! authz_bus::register_all(&bus, handler, "authorization", Operation::ALL);
//! let reply = bus.request("authorization.find", "{}", timeout).await?;
//! ```

pub mod bus;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod reply;
pub mod subjects;

pub use bus::{Bus, Message, Subscription};
pub use dispatch::{Registration, register_all};
pub use error::{BusError, Result};
pub use handler::Handler;
pub use reply::{ErrorKind, ErrorReply};
pub use subjects::Operation;
