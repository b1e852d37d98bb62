use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{
    ticket,
    user::{self, Role},
    Desk,
};

sequential_id!(
    /// `NOTIF-NNN`, increasing in creation order.
    Id,
    "NOTIF"
);

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub title: String,
    pub message: String,
    pub ticket_id: ticket::Id,
    pub for_role: Option<Role>,
    pub for_user_id: Option<user::Id>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub read: bool,
}

impl Notification {
    pub fn is_for(&self, user: &user::Id, role: Role) -> bool {
        self.for_user_id.as_ref() == Some(user) || self.for_role == Some(role)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    NewTicket,
    Assigned,
    ReassignRequest,
    Reassigned,
    SeverityHigh,
    Resolved,
    #[serde(other)]
    Other,
}

/// Who a notification is addressed to. Exactly one of a role or a single
/// user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Audience {
    Role(Role),
    User(user::Id),
}

/// Content of a notification before the store stamps it.
#[derive(Clone, Debug)]
pub struct Draft {
    pub kind: Kind,
    pub title: String,
    pub message: String,
    pub ticket_id: ticket::Id,
    pub audience: Audience,
}

/// Notifications, most recent first.
#[derive(Debug, Default)]
pub struct Store {
    items: VecDeque<Notification>,
    last_id: u64,
}

impl Store {
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Id) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    pub fn add(&mut self, draft: Draft, now: OffsetDateTime) -> &Notification {
        self.last_id += 1;
        let (for_role, for_user_id) = match draft.audience {
            Audience::Role(role) => (Some(role), None),
            Audience::User(user) => (None, Some(user)),
        };
        self.items.push_front(Notification {
            id: Id::from(self.last_id),
            kind: draft.kind,
            title: draft.title,
            message: draft.message,
            ticket_id: draft.ticket_id,
            for_role,
            for_user_id,
            timestamp: now,
            read: false,
        });
        &self.items[0]
    }

    /// Appends an already stamped notification behind the existing ones.
    pub(super) fn insert(&mut self, notification: Notification) {
        self.last_id = self.last_id.max(notification.id.number());
        self.items.push_back(notification);
    }

    /// Notifications addressed either to `user` directly or to `role`.
    pub fn for_recipient(
        &self,
        user: &user::Id,
        role: Role,
    ) -> Vec<&Notification> {
        self.items.iter().filter(|n| n.is_for(user, role)).collect()
    }

    /// Returns whether a notification with `id` exists.
    pub fn mark_read(&mut self, id: Id) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    /// Drops everything addressed to `user` together with every
    /// admin-addressed notification, whoever clears. Returns how many were
    /// removed.
    pub fn clear(&mut self, user: &user::Id) -> usize {
        let before = self.items.len();
        self.items.retain(|n| {
            n.for_user_id.as_ref() != Some(user)
                && n.for_role != Some(Role::Admin)
        });
        before - self.items.len()
    }

    pub fn unread_count(&self, user: &user::Id, role: Role) -> usize {
        self.items
            .iter()
            .filter(|n| n.is_for(user, role) && !n.read)
            .count()
    }
}

impl Desk {
    pub fn add_notification(&mut self, draft: Draft) -> &Notification {
        self.notifications.add(draft, OffsetDateTime::now_utc())
    }

    pub fn notifications_for(
        &self,
        user: &user::Id,
        role: Role,
    ) -> Vec<&Notification> {
        self.notifications.for_recipient(user, role)
    }

    pub fn mark_notification_read(&mut self, id: Id) -> bool {
        let found = self.notifications.mark_read(id);
        if !found {
            tracing::debug!(
                notification = %id,
                "no such notification to mark read"
            );
        }
        found
    }

    pub fn clear_notifications(&mut self, user: &user::Id) -> usize {
        let removed = self.notifications.clear(user);
        tracing::info!(user = %user, removed, "notifications cleared");
        removed
    }

    pub fn unread_count(&self, user: &user::Id, role: Role) -> usize {
        self.notifications.unread_count(user, role)
    }
}
