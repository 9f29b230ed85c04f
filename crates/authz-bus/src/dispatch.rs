//! Subject registration and the per-subscription serve loop.

use std::sync::Arc;

use authz_core::store::AuthorizationStore;
use tokio::task::JoinHandle;
use tracing::{Instrument as _, debug, error, info, info_span};
use uuid::Uuid;

use crate::{
  bus::{Bus, Subscription},
  handler::Handler,
  subjects::Operation,
};

/// A subject that was successfully claimed, with the task serving it.
#[derive(Debug)]
pub struct Registration {
  pub operation: Operation,
  pub subject:   String,
  pub task:      JoinHandle<()>,
}

/// Subscribe every operation in `operations` under `prefix`.
///
/// Subjects are registered independently: a failure is logged and skipped,
/// and the remaining subjects still serve traffic. Returns the registrations
/// that succeeded.
pub fn register_all<S>(
  bus: &Bus,
  handler: Arc<Handler<S>>,
  prefix: &str,
  operations: &[Operation],
) -> Vec<Registration>
where
  S: AuthorizationStore + 'static,
{
  let mut registrations = Vec::with_capacity(operations.len());
  for &operation in operations {
    let subject = operation.subject(prefix);
    match bus.subscribe(&subject) {
      Ok(subscription) => {
        info!(%subject, "subscribed");
        let task = tokio::spawn(serve(subscription, operation, Arc::clone(&handler)));
        registrations.push(Registration { operation, subject, task });
      }
      Err(e) => error!(%subject, error = %e, "error subscribing"),
    }
  }
  registrations
}

/// Answer every message on `subscription`, each on its own task.
async fn serve<S>(mut subscription: Subscription, operation: Operation, handler: Arc<Handler<S>>)
where
  S: AuthorizationStore + 'static,
{
  while let Some(message) = subscription.next().await {
    let handler = Arc::clone(&handler);
    let span = info_span!(
      "request",
      request_id = %Uuid::new_v4(),
      subject = %message.subject,
    );
    tokio::spawn(
      async move {
        let reply = handler.handle(operation, &message.payload).await;
        if !message.respond(reply) {
          debug!("requester went away before the reply");
        }
      }
      .instrument(span),
    );
  }
  debug!(subject = subscription.subject(), "subscription closed");
}
