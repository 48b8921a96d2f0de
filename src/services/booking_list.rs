use crate::errors::ClientError;
use crate::models::{Actor, Booking, Role, StatusFilter};
use crate::services::api::{MarketplaceApi, StatusChange};
use crate::services::workflow::{self, BookingAction, RowControls};

/// Which dashboard the list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Customer,
    Provider,
}

impl ListScope {
    pub fn required_role(&self) -> Role {
        match self {
            ListScope::Customer => Role::Customer,
            ListScope::Provider => Role::Provider,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListPhase {
    Idle,
    Loading,
    Ready,
    /// Terminal until the user logs in again; nothing is fetched.
    LoginRequired(String),
    /// Transient; rows from the last good fetch are kept.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingRow {
    pub booking: Booking,
    pub controls: RowControls,
}

/// A role- and status-scoped booking list. Every successful action is
/// followed by one refetch; the rows are never patched locally.
pub struct BookingListView {
    scope: ListScope,
    filter: StatusFilter,
    rows: Vec<BookingRow>,
    phase: ListPhase,
    action_error: Option<String>,
}

pub(crate) fn authorize(actor: Option<&Actor>, required: Role) -> Result<&Actor, ClientError> {
    let actor = actor.ok_or(ClientError::NotLoggedIn)?;
    if actor.token.trim().is_empty() {
        return Err(ClientError::NotLoggedIn);
    }
    if actor.role != required {
        return Err(ClientError::WrongRole {
            required,
            actual: actor.role,
        });
    }
    Ok(actor)
}

impl BookingListView {
    pub fn new(scope: ListScope, filter: StatusFilter) -> Self {
        Self {
            scope,
            filter,
            rows: vec![],
            phase: ListPhase::Idle,
            action_error: None,
        }
    }

    pub fn scope(&self) -> ListScope {
        self.scope
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    /// Takes effect on the next refresh.
    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn rows(&self) -> &[BookingRow] {
        &self.rows
    }

    pub fn phase(&self) -> &ListPhase {
        &self.phase
    }

    pub fn action_error(&self) -> Option<&str> {
        self.action_error.as_deref()
    }

    pub fn find(&self, booking_id: &str) -> Option<&BookingRow> {
        self.rows.iter().find(|r| r.booking.booking_id == booking_id)
    }

    fn require_login(&mut self, err: &ClientError) {
        self.rows.clear();
        self.phase = ListPhase::LoginRequired(err.user_message());
    }

    /// Fetches the list for `actor`. Without a matching session the view
    /// moves to `LoginRequired` and no request is made.
    pub async fn refresh(
        &mut self,
        api: &dyn MarketplaceApi,
        actor: Option<&Actor>,
    ) -> Result<(), ClientError> {
        let actor = match authorize(actor, self.scope.required_role()) {
            Ok(actor) => actor,
            Err(e) => {
                self.require_login(&e);
                return Err(e);
            }
        };

        self.phase = ListPhase::Loading;
        let fetched = match self.scope {
            ListScope::Customer => api.customer_bookings(actor, self.filter.status()).await,
            ListScope::Provider => api.provider_bookings(actor).await.map(|bookings| {
                // This endpoint takes no status filter.
                bookings
                    .into_iter()
                    .filter(|b| self.filter.matches(b.status))
                    .collect()
            }),
        };

        match fetched {
            Ok(bookings) => {
                self.rows = self.build_rows(actor, bookings);
                self.phase = ListPhase::Ready;
                tracing::debug!("loaded {} bookings for {}", self.rows.len(), actor.username);
                Ok(())
            }
            Err(e) if e.requires_login() => {
                self.require_login(&e);
                Err(e)
            }
            Err(e) => {
                self.phase = ListPhase::Failed(e.user_message());
                Err(e)
            }
        }
    }

    fn build_rows(&self, actor: &Actor, bookings: Vec<Booking>) -> Vec<BookingRow> {
        bookings
            .into_iter()
            .filter(|b| {
                let own = b.party_username(actor.role) == Some(actor.username.as_str());
                if !own {
                    tracing::warn!("dropping booking {} not addressed to {}", b.booking_id, actor.username);
                }
                own
            })
            .map(|booking| {
                if booking.has_stray_rating() {
                    tracing::warn!(
                        "booking {} is {} but carries a rating",
                        booking.booking_id,
                        booking.status
                    );
                }
                let controls = workflow::row_controls(&booking, actor.role);
                BookingRow { booking, controls }
            })
            .collect()
    }

    /// Runs a status-changing action on one row, then refetches. Once the
    /// backend has accepted the change the action counts as done; a failed
    /// refetch only leaves the list in `ListPhase::Failed`.
    pub async fn perform(
        &mut self,
        api: &dyn MarketplaceApi,
        actor: Option<&Actor>,
        booking_id: &str,
        action: BookingAction,
    ) -> Result<(), ClientError> {
        if let Err(e) = self.try_perform(api, actor, booking_id, action).await {
            self.action_error = Some(e.user_message());
            if e.requires_login() {
                self.require_login(&e);
            }
            return Err(e);
        }

        if let Err(e) = self.refresh(api, actor).await {
            tracing::warn!("refetch after {action} on booking {booking_id} failed: {e}");
        }
        Ok(())
    }

    async fn try_perform(
        &mut self,
        api: &dyn MarketplaceApi,
        actor: Option<&Actor>,
        booking_id: &str,
        action: BookingAction,
    ) -> Result<(), ClientError> {
        let actor = authorize(actor, self.scope.required_role())?;
        let change = StatusChange::for_action(action).ok_or_else(|| {
            ClientError::Validation("Ratings are submitted from the rating dialog.".to_string())
        })?;

        let row = self.find(booking_id).ok_or_else(|| {
            ClientError::Validation(format!("Booking {booking_id} is not in this list."))
        })?;
        let to = workflow::check_action(&row.booking, actor.role, action)?;

        self.action_error = None;
        api.change_status(actor, booking_id, change).await?;

        tracing::info!("{} {} booking {booking_id} (now {to})", actor.username, action);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{BookingStatus, PartyRef, ServiceRef};
    use crate::services::api::mock::MockApi;

    pub(crate) fn booking(id: &str, status: BookingStatus) -> Booking {
        Booking {
            booking_id: id.to_string(),
            status,
            customer: PartyRef {
                username: "alice".to_string(),
                name: Some("Alice".to_string()),
            },
            provider: PartyRef {
                username: "bob".to_string(),
                name: Some("Bob".to_string()),
            },
            service: ServiceRef {
                service_id: "1".to_string(),
                name: "Plumbing".to_string(),
            },
            location: Some("Pune".to_string()),
            date_time: Some("12-05-2025 10:30".to_string()),
            amount_paid: Some(500.0),
            type_of_job: Some("Plumbing".to_string()),
            description: None,
            customer_rating: None,
            provider_rating: None,
        }
    }

    pub(crate) fn actor(username: &str, role: Role) -> Actor {
        Actor {
            username: username.to_string(),
            role,
            token: "token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unauthenticated_list_makes_no_calls() {
        let api = MockApi::new(vec![booking("B1", BookingStatus::Requested)]);
        let mut view = BookingListView::new(ListScope::Customer, StatusFilter::All);

        let err = view.refresh(&api, None).await.unwrap_err();
        assert!(matches!(err, ClientError::NotLoggedIn));
        assert_eq!(
            view.phase(),
            &ListPhase::LoginRequired("Please log in to continue.".to_string())
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_role_list_makes_no_calls() {
        let api = MockApi::new(vec![]);
        let provider = actor("bob", Role::Provider);
        let mut view = BookingListView::new(ListScope::Customer, StatusFilter::All);

        assert!(view.refresh(&api, Some(&provider)).await.is_err());
        assert!(matches!(view.phase(), ListPhase::LoginRequired(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let api = MockApi::new(vec![
            booking("B1", BookingStatus::Requested),
            booking("B2", BookingStatus::Booked),
            booking("B3", BookingStatus::Completed),
        ]);
        let alice = actor("alice", Role::Customer);
        let mut view = BookingListView::new(ListScope::Customer, StatusFilter::All);

        view.refresh(&api, Some(&alice)).await.unwrap();
        let first = view.rows().to_vec();
        view.refresh(&api, Some(&alice)).await.unwrap();
        assert_eq!(view.rows(), first.as_slice());
        assert_eq!(first.len(), 3);
    }

    #[tokio::test]
    async fn test_successful_action_refetches_once() {
        let api = MockApi::new(vec![booking("B1", BookingStatus::Requested)]);
        let alice = actor("alice", Role::Customer);
        let mut view = BookingListView::new(ListScope::Customer, StatusFilter::All);
        view.refresh(&api, Some(&alice)).await.unwrap();

        view.perform(&api, Some(&alice), "B1", BookingAction::Revoke)
            .await
            .unwrap();

        assert_eq!(
            api.calls(),
            vec![
                "customer_bookings:alice",
                "change_status:revoke-booking:B1",
                "customer_bookings:alice",
            ]
        );
        let row = view.find("B1").unwrap();
        assert_eq!(row.booking.status, BookingStatus::Revoked);
        assert_eq!(row.controls, RowControls::None);
        assert!(view.action_error().is_none());
    }

    #[tokio::test]
    async fn test_failed_action_keeps_stale_rows() {
        let api = MockApi::new(vec![booking("B1", BookingStatus::Requested)]);
        let bob = actor("bob", Role::Provider);
        let mut view = BookingListView::new(ListScope::Provider, StatusFilter::All);
        view.refresh(&api, Some(&bob)).await.unwrap();

        api.fail_next(409, Some("Provider is fully booked"));
        let err = view
            .perform(&api, Some(&bob), "B1", BookingAction::Accept)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Backend { status: 409, .. }));
        assert_eq!(view.action_error(), Some("Provider is fully booked"));
        assert_eq!(api.count("provider_bookings"), 1);
        assert_eq!(view.find("B1").unwrap().booking.status, BookingStatus::Requested);
        assert_eq!(view.phase(), &ListPhase::Ready);
    }

    #[tokio::test]
    async fn test_illegal_action_never_reaches_backend() {
        let api = MockApi::new(vec![booking("B1", BookingStatus::Requested)]);
        let alice = actor("alice", Role::Customer);
        let mut view = BookingListView::new(ListScope::Customer, StatusFilter::All);
        view.refresh(&api, Some(&alice)).await.unwrap();

        let err = view
            .perform(&api, Some(&alice), "B1", BookingAction::Complete)
            .await
            .unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(api.count("change_status"), 0);

        let err = view
            .perform(&api, Some(&alice), "B1", BookingAction::Rate)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_requested_filter_drops_revoked_booking() {
        let api = MockApi::new(vec![
            booking("B1", BookingStatus::Requested),
            booking("B2", BookingStatus::Requested),
        ]);
        let alice = actor("alice", Role::Customer);
        let mut view = BookingListView::new(
            ListScope::Customer,
            StatusFilter::Only(BookingStatus::Requested),
        );
        view.refresh(&api, Some(&alice)).await.unwrap();

        view.perform(&api, Some(&alice), "B1", BookingAction::Revoke)
            .await
            .unwrap();
        assert!(view.find("B1").is_none());
        assert_eq!(view.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_provider_list_filters_client_side() {
        let mut other = booking("B9", BookingStatus::Booked);
        other.provider.username = "carol".to_string();
        let api = MockApi::new(vec![
            booking("B1", BookingStatus::Requested),
            booking("B2", BookingStatus::Booked),
            other,
        ]);
        let bob = actor("bob", Role::Provider);
        let mut view = BookingListView::new(
            ListScope::Provider,
            StatusFilter::Only(BookingStatus::Booked),
        );
        view.refresh(&api, Some(&bob)).await.unwrap();

        let ids: Vec<_> = view.rows().iter().map(|r| r.booking.booking_id.as_str()).collect();
        assert_eq!(ids, vec!["B2"]);
    }

    #[tokio::test]
    async fn test_unauthorized_fetch_requires_login() {
        let api = MockApi::new(vec![booking("B1", BookingStatus::Requested)]);
        let alice = actor("alice", Role::Customer);
        let mut view = BookingListView::new(ListScope::Customer, StatusFilter::All);
        view.refresh(&api, Some(&alice)).await.unwrap();

        api.fail_next(401, None);
        assert!(view.refresh(&api, Some(&alice)).await.is_err());
        assert!(matches!(view.phase(), ListPhase::LoginRequired(_)));
        assert!(view.rows().is_empty());
    }

    #[tokio::test]
    async fn test_transient_fetch_failure_keeps_rows() {
        let api = MockApi::new(vec![booking("B1", BookingStatus::Requested)]);
        let alice = actor("alice", Role::Customer);
        let mut view = BookingListView::new(ListScope::Customer, StatusFilter::All);
        view.refresh(&api, Some(&alice)).await.unwrap();

        api.fail_next(503, None);
        assert!(view.refresh(&api, Some(&alice)).await.is_err());
        assert_eq!(
            view.phase(),
            &ListPhase::Failed(crate::errors::FALLBACK_MESSAGE.to_string())
        );
        assert_eq!(view.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_action_counts_as_done_when_refetch_fails() {
        let api = MockApi::new(vec![booking("B1", BookingStatus::Requested)]);
        let alice = actor("alice", Role::Customer);
        let mut view = BookingListView::new(ListScope::Customer, StatusFilter::All);
        view.refresh(&api, Some(&alice)).await.unwrap();

        api.fail_next_matching("customer_bookings", 503, None);
        view.perform(&api, Some(&alice), "B1", BookingAction::Revoke)
            .await
            .unwrap();

        assert!(view.action_error().is_none());
        assert_eq!(
            view.phase(),
            &ListPhase::Failed(crate::errors::FALLBACK_MESSAGE.to_string())
        );
        assert_eq!(api.count("change_status"), 1);
        assert_eq!(api.bookings.lock().unwrap()[0].status, BookingStatus::Revoked);
    }

    #[tokio::test]
    async fn test_cancelled_action_does_not_block_the_next_one() {
        let api = MockApi::new(vec![booking("B1", BookingStatus::Requested)]);
        let bob = actor("bob", Role::Provider);
        let mut view = BookingListView::new(ListScope::Provider, StatusFilter::All);
        view.refresh(&api, Some(&bob)).await.unwrap();

        api.stall_next();
        let pending = view.perform(&api, Some(&bob), "B1", BookingAction::Accept);
        assert!(tokio::time::timeout(std::time::Duration::from_millis(20), pending)
            .await
            .is_err());

        view.perform(&api, Some(&bob), "B1", BookingAction::Accept)
            .await
            .unwrap();
        assert_eq!(view.find("B1").unwrap().booking.status, BookingStatus::Booked);
        assert_eq!(api.count("change_status"), 2);
    }
}
