//! [`Handler`]: turns one inbound payload into exactly one reply.

use authz_core::{Error, RecordEngine, input::RecordInput, store::AuthorizationStore};
use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::{
  reply::{self, ErrorKind},
  subjects::Operation,
};

pub struct Handler<S> {
  engine: RecordEngine<S>,
}

impl<S: AuthorizationStore> Handler<S> {
  pub fn new(engine: RecordEngine<S>) -> Self { Self { engine } }

  /// Decode `payload`, run `op`, and encode the outcome. Never fails: every
  /// error is classified into an envelope.
  pub async fn handle(&self, op: Operation, payload: &[u8]) -> Bytes {
    let outcome = match RecordInput::decode(payload) {
      Ok(input) => self.dispatch(op, &input).await,
      Err(e) => Err(e),
    };

    match outcome {
      Ok(body) => {
        debug!(%op, "request succeeded");
        body
      }
      Err(e) => {
        match ErrorKind::of(&e) {
          ErrorKind::Unexpected => error!(%op, error = %e, "request failed"),
          kind => warn!(%op, %kind, error = %e, "request rejected"),
        }
        reply::failure(&e)
      }
    }
  }

  async fn dispatch(&self, op: Operation, input: &RecordInput) -> Result<Bytes, Error> {
    let body = match op {
      Operation::Get => reply::success(&self.engine.get(input).await?),
      Operation::Find => reply::success(&self.engine.find(input).await?),
      Operation::Set => reply::success(&self.engine.set(input).await?),
      Operation::Del => {
        self.engine.delete(input).await?;
        Bytes::from_static(reply::DELETED)
      }
      Operation::Restore => reply::success(&self.engine.restore(input).await?),
      Operation::Purge => {
        self.engine.purge(input).await?;
        Bytes::from_static(reply::PURGED)
      }
    };
    Ok(body)
  }
}
