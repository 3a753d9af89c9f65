//! Action menu items for a session row.

use crate::model::SessionStatus;

use super::{is_legal, SessionAction};

/// One entry of a session's action menu, resolved once from its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Separator,
    Action {
        label: &'static str,
        action: SessionAction,
        enabled: bool,
    },
}

impl MenuItem {
    fn action(label: &'static str, action: SessionAction, status: SessionStatus) -> Self {
        MenuItem::Action {
            label,
            action,
            enabled: is_legal(status, action),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, MenuItem::Action { enabled: true, .. })
    }
}

/// Build the action menu for a session in `status`.
///
/// Every action is listed; those the legal-action table forbids are
/// disabled. The destructive delete sits below a separator.
pub fn action_menu(status: SessionStatus) -> Vec<MenuItem> {
    vec![
        MenuItem::action("Edit", SessionAction::Edit, status),
        MenuItem::action("Start session", SessionAction::Activate, status),
        MenuItem::action("End session", SessionAction::Complete, status),
        MenuItem::action("Cancel session", SessionAction::Cancel, status),
        MenuItem::Separator,
        MenuItem::action("Delete", SessionAction::Delete, status),
    ]
}
