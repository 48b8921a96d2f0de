use crate::models::{Booking, BookingStatus, Role};

/// Everything a booking party can do to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingAction {
    Revoke,
    Accept,
    Reject,
    Complete,
    Rate,
}

impl BookingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::Revoke => "revoke",
            BookingAction::Accept => "accept",
            BookingAction::Reject => "reject",
            BookingAction::Complete => "complete",
            BookingAction::Rate => "rate",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revoke" => Some(BookingAction::Revoke),
            "accept" => Some(BookingAction::Accept),
            "reject" => Some(BookingAction::Reject),
            "complete" => Some(BookingAction::Complete),
            "rate" => Some(BookingAction::Rate),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingAction::Revoke => "Revoke",
            BookingAction::Accept => "Accept",
            BookingAction::Reject => "Reject",
            BookingAction::Complete => "Mark complete",
            BookingAction::Rate => "Rate",
        }
    }
}

impl std::fmt::Display for BookingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionError {
    NotAllowed {
        action: BookingAction,
        status: BookingStatus,
        role: Role,
    },
    AlreadyRated,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::NotAllowed {
                action,
                status,
                role,
            } => {
                write!(
                    f,
                    "A {role} cannot {action} a booking that is {}.",
                    status.as_str().to_lowercase()
                )
            }
            TransitionError::AlreadyRated => {
                write!(f, "You have already rated this booking.")
            }
        }
    }
}

impl std::error::Error for TransitionError {}

// (from, actor, action) -> to
const TRANSITIONS: &[(BookingStatus, Role, BookingAction, BookingStatus)] = &[
    (BookingStatus::Requested, Role::Customer, BookingAction::Revoke, BookingStatus::Revoked),
    (BookingStatus::Requested, Role::Provider, BookingAction::Accept, BookingStatus::Booked),
    (BookingStatus::Requested, Role::Provider, BookingAction::Reject, BookingStatus::Rejected),
    (BookingStatus::Booked, Role::Customer, BookingAction::Complete, BookingStatus::Completed),
    (BookingStatus::Booked, Role::Provider, BookingAction::Complete, BookingStatus::Completed),
    (BookingStatus::Completed, Role::Customer, BookingAction::Rate, BookingStatus::Completed),
    (BookingStatus::Completed, Role::Provider, BookingAction::Rate, BookingStatus::Completed),
];

/// Resulting status of `action` taken by `role` on a booking in `status`.
pub fn transition(
    status: BookingStatus,
    role: Role,
    action: BookingAction,
) -> Result<BookingStatus, TransitionError> {
    TRANSITIONS
        .iter()
        .find(|(from, actor, act, _)| *from == status && *actor == role && *act == action)
        .map(|(_, _, _, to)| *to)
        .ok_or(TransitionError::NotAllowed {
            action,
            status,
            role,
        })
}

/// Checks `action` against a fetched booking, including the one-rating rule.
pub fn check_action(
    booking: &Booking,
    role: Role,
    action: BookingAction,
) -> Result<BookingStatus, TransitionError> {
    let to = transition(booking.status, role, action)?;
    if action == BookingAction::Rate && booking.is_rated_by(role) {
        return Err(TransitionError::AlreadyRated);
    }
    Ok(to)
}

/// Actions to render for a booking row, in table order.
pub fn available_actions(booking: &Booking, role: Role) -> Vec<BookingAction> {
    TRANSITIONS
        .iter()
        .filter(|(from, actor, _, _)| *from == booking.status && *actor == role)
        .map(|(_, _, action, _)| *action)
        .filter(|action| *action != BookingAction::Rate || !booking.is_rated_by(role))
        .collect()
}

/// What a row shows in its action column.
#[derive(Debug, Clone, PartialEq)]
pub enum RowControls {
    Actions(Vec<BookingAction>),
    Rated(u8),
    None,
}

pub fn row_controls(booking: &Booking, role: Role) -> RowControls {
    if booking.is_rated_by(role) {
        let value = booking.rating_by(role).map(|r| r.value).unwrap_or_default();
        return RowControls::Rated(value);
    }
    let actions = available_actions(booking, role);
    if actions.is_empty() {
        RowControls::None
    } else {
        RowControls::Actions(actions)
    }
}
