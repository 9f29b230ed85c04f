//! [`Bus`]: an in-process, subject-addressed request/reply transport.
//!
//! Each subject has at most one live subscriber. Every request carries a
//! one-shot reply channel. A closed subscriber queue surfaces as
//! [`BusError::NoResponders`].

use std::{
  collections::HashMap,
  sync::{Arc, PoisonError, RwLock},
  time::Duration,
};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use crate::{BusError, Result};

/// Per-subscription queue depth.
const QUEUE_CAPACITY: usize = 256;

// ─── Message ─────────────────────────────────────────────────────────────────

/// An inbound message as seen by a subscriber.
#[derive(Debug)]
pub struct Message {
  pub subject: String,
  pub payload: Bytes,
  reply:       oneshot::Sender<Bytes>,
}

impl Message {
  /// Send the reply. Returns `false` if the requester has already gone away
  /// (e.g. timed out).
  pub fn respond(self, payload: Bytes) -> bool { self.reply.send(payload).is_ok() }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// The receiving end of a subject. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
  subject: String,
  rx:      mpsc::Receiver<Message>,
}

impl Subscription {
  pub fn subject(&self) -> &str { &self.subject }

  /// The next message, or `None` once the bus is gone.
  pub async fn next(&mut self) -> Option<Message> { self.rx.recv().await }
}

// ─── Bus ─────────────────────────────────────────────────────────────────────

/// Cloning is cheap: all clones share one subject table.
#[derive(Clone, Default)]
pub struct Bus {
  routes: Arc<RwLock<HashMap<String, mpsc::Sender<Message>>>>,
}

impl Bus {
  pub fn new() -> Self { Self::default() }

  /// Claim `subject`. Fails if the subject is malformed or another live
  /// subscription holds it.
  pub fn subscribe(&self, subject: &str) -> Result<Subscription> {
    validate_subject(subject)?;

    let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
    if routes.get(subject).is_some_and(|tx| !tx.is_closed()) {
      return Err(BusError::AlreadySubscribed(subject.to_owned()));
    }

    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    routes.insert(subject.to_owned(), tx);
    Ok(Subscription { subject: subject.to_owned(), rx })
  }

  /// Subjects that currently have a live subscriber, sorted.
  pub fn subjects(&self) -> Vec<String> {
    let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
    let mut subjects: Vec<String> = routes
      .iter()
      .filter(|(_, tx)| !tx.is_closed())
      .map(|(subject, _)| subject.clone())
      .collect();
    subjects.sort();
    subjects
  }

  fn route(&self, subject: &str) -> Result<mpsc::Sender<Message>> {
    let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
    routes
      .get(subject)
      .filter(|tx| !tx.is_closed())
      .cloned()
      .ok_or_else(|| BusError::NoResponders(subject.to_owned()))
  }

  /// Deliver `payload` and wait up to `timeout` for the subscriber's reply.
  pub async fn request(
    &self,
    subject: &str,
    payload: impl Into<Bytes>,
    timeout: Duration,
  ) -> Result<Bytes> {
    let tx = self.route(subject)?;
    let (reply_tx, reply_rx) = oneshot::channel();
    let message = Message {
      subject: subject.to_owned(),
      payload: payload.into(),
      reply:   reply_tx,
    };

    let exchange = async {
      tx.send(message)
        .await
        .map_err(|_| BusError::NoResponders(subject.to_owned()))?;
      reply_rx.await.map_err(|_| BusError::Dropped(subject.to_owned()))
    };

    tokio::time::timeout(timeout, exchange)
      .await
      .map_err(|_| BusError::Timeout(subject.to_owned()))?
  }
}

/// Dot-separated, non-empty tokens without whitespace.
fn validate_subject(subject: &str) -> Result<()> {
  let valid = !subject.is_empty()
    && subject
      .split('.')
      .all(|token| !token.is_empty() && !token.chars().any(char::is_whitespace));
  if valid {
    Ok(())
  } else {
    Err(BusError::InvalidSubject(subject.to_owned()))
  }
}
