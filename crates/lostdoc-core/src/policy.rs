//! Owner-or-admin access rule for documents.
//!
//! One rule serves every path that touches a single document: read, update,
//! delete and print preview. A refusal is [`Error::AccessDenied`], never
//! `NotFound`, so callers can pick between 403 and 404.

use uuid::Uuid;

use crate::{
  Error, Result,
  document::LostDocument,
  user::{Actor, Role},
};

/// Whether `actor` may access a document recorded by `operator_id`.
pub fn can_access(operator_id: Uuid, actor: &Actor) -> bool {
  match actor.role {
    Role::Admin => true,
    Role::Operator => actor.user_id == operator_id,
  }
}

/// [`can_access`] as a `Result`, for use with `?`.
pub fn authorize(document: &LostDocument, actor: &Actor) -> Result<()> {
  if can_access(document.operator.user_id, actor) {
    Ok(())
  } else {
    Err(Error::AccessDenied {
      actor:    actor.user_id,
      resource: format!("document {}", document.document_id),
    })
  }
}

/// Administrative endpoints (settings, users, audit log).
pub fn require_admin(actor: &Actor) -> Result<()> {
  match actor.role {
    Role::Admin => Ok(()),
    Role::Operator => Err(Error::AccessDenied {
      actor:    actor.user_id,
      resource: "administrative functions".to_owned(),
    }),
  }
}
