//! Authorization rules for company records.
//!
//! Every predicate is pure: it looks only at the acting user and, for
//! instance actions, at who created the record. Handlers call [`authorize`]
//! before touching the store so a denial has no side effects.

use crate::entity::company;
use crate::error::AppError;

/// The authenticated user performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub is_admin: bool,
}

/// Anything with a single creating user.
pub trait Owned {
    fn owner_id(&self) -> i32;
}

impl Owned for company::Model {
    fn owner_id(&self) -> i32 {
        self.created_by
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyAction {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    /// Reserved: there is no soft-delete, so nothing calls this yet.
    Restore,
    /// Reserved, see [`CompanyAction::Restore`].
    ForceDelete,
}

fn is_admin_or_owner(actor: &Actor, company: &impl Owned) -> bool {
    actor.is_admin || company.owner_id() == actor.id
}

pub fn view_any(_actor: &Actor) -> bool {
    true
}

pub fn view(actor: &Actor, company: &impl Owned) -> bool {
    is_admin_or_owner(actor, company)
}

pub fn create(_actor: &Actor) -> bool {
    true
}

pub fn update(actor: &Actor, company: &impl Owned) -> bool {
    is_admin_or_owner(actor, company)
}

pub fn delete(actor: &Actor, company: &impl Owned) -> bool {
    is_admin_or_owner(actor, company)
}

pub fn restore(actor: &Actor, _company: &impl Owned) -> bool {
    actor.is_admin
}

pub fn force_delete(actor: &Actor, _company: &impl Owned) -> bool {
    actor.is_admin
}

/// Evaluate `action` for `actor`. Instance actions without a record are denied.
pub fn allows<T: Owned>(actor: &Actor, action: CompanyAction, company: Option<&T>) -> bool {
    match (action, company) {
        (CompanyAction::ViewAny, _) => view_any(actor),
        (CompanyAction::Create, _) => create(actor),
        (CompanyAction::View, Some(c)) => view(actor, c),
        (CompanyAction::Update, Some(c)) => update(actor, c),
        (CompanyAction::Delete, Some(c)) => delete(actor, c),
        (CompanyAction::Restore, Some(c)) => restore(actor, c),
        (CompanyAction::ForceDelete, Some(c)) => force_delete(actor, c),
        (_, None) => false,
    }
}

/// Like [`allows`], but a denial becomes [`AppError::PermissionDenied`].
pub fn authorize<T: Owned>(
    actor: &Actor,
    action: CompanyAction,
    company: Option<&T>,
) -> Result<(), AppError> {
    if allows(actor, action, company) {
        Ok(())
    } else {
        tracing::debug!(actor = actor.id, ?action, "Authorization denied");
        Err(AppError::PermissionDenied)
    }
}
