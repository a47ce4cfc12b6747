use log::warn;
use model::spot::SpotDraft;

use crate::{auth::AuthGate, client::Client, database::Database};

/// Shortest address text worth geocoding. Anything shorter is ignored so a
/// request is not fired per keystroke.
pub const MIN_GEOCODE_QUERY_LEN: usize = 3;

/// What the caller should do after a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Created. The form is cleared; navigate to the new spot's detail page
    /// and re-list the map.
    Navigate(String),
    /// No session; send the user to the sign-in route.
    RedirectToSignIn,
    /// Submit failed or was not ready. The draft is kept so the user can
    /// retry without re-entering anything.
    Rejected(String),
}

/// Collects the draft for a new spot and drives the geocoder through the
/// caller. Coordinates stay at the `(0, 0)` sentinel until an address
/// resolves or a device location seeds them.
#[derive(Debug, Default)]
pub struct SpotForm {
    draft: SpotDraft,
    error: Option<String>,
}

impl SpotForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &SpotDraft {
        &self.draft
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    /// Updates the address text. Previously resolved coordinates are kept;
    /// they are overwritten by the next geocoder hit.
    pub fn set_address(&mut self, address: impl Into<String>) {
        self.draft.address = address.into();
    }

    /// Length gate for geocoding the current address text.
    pub fn wants_geocode(&self) -> bool {
        self.draft.address.trim().len() >= MIN_GEOCODE_QUERY_LEN
    }

    /// Seeds coordinates from the device location. Optional; a denied
    /// permission simply never calls this.
    pub fn seed_location(&mut self, latitude: f64, longitude: f64) {
        if !self.draft.has_location() {
            self.draft.latitude = latitude;
            self.draft.longitude = longitude;
        }
    }

    /// Applies a geocoder hit for the typed address.
    pub fn apply_geocode_hit(
        &mut self,
        latitude: f64,
        longitude: f64,
        city: impl Into<String>,
        country: impl Into<String>,
    ) {
        self.draft.latitude = latitude;
        self.draft.longitude = longitude;
        self.draft.city = city.into();
        self.draft.country = country.into();
        self.error = None;
    }

    /// Transport failure while geocoding. Surfaced as a transient message
    /// without blocking further input.
    pub fn geocode_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("geocoding failed: {}", message);
        self.error = Some(message);
    }

    /// Submission gate: name and address present, coordinates resolved.
    pub fn can_submit(&self) -> bool {
        !self.draft.name.trim().is_empty()
            && !self.draft.address.trim().is_empty()
            && self.draft.has_location()
    }

    /// Submits the draft. On success the form is cleared and the caller is
    /// expected to re-list the map and navigate to the returned path.
    pub async fn submit<D: Database>(
        &mut self,
        client: &Client<D>,
        gate: &AuthGate,
    ) -> SubmitOutcome {
        let identity = match gate.require() {
            Ok(identity) => identity.clone(),
            Err(_) => return SubmitOutcome::RedirectToSignIn,
        };

        if !self.can_submit() {
            let message = "Name, address and a resolved location are required.";
            self.error = Some(message.to_owned());
            return SubmitOutcome::Rejected(message.to_owned());
        }

        match client.create(&self.draft, &identity).await {
            Ok(created) => {
                self.draft = SpotDraft::default();
                self.error = None;
                SubmitOutcome::Navigate(created.content.detail_path())
            }
            Err(why) => {
                let message = why.to_string();
                warn!("failed to add prayer spot: {}", message);
                self.error = Some(message.clone());
                SubmitOutcome::Rejected(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::Identity, memory::MemoryDatabase};

    fn filled_form() -> SpotForm {
        let mut form = SpotForm::new();
        form.set_name("Quiet Room");
        form.set_address("1 Main St, NYC");
        form.set_description("calm corner");
        form.apply_geocode_hit(40.0, -73.0, "NYC", "USA");
        form
    }

    #[test]
    fn test_short_addresses_are_not_geocoded() {
        let mut form = SpotForm::new();
        form.set_address("1");
        assert!(!form.wants_geocode());
        form.set_address("1 Main St");
        assert!(form.wants_geocode());
    }

    #[test]
    fn test_submission_stays_blocked_until_location_resolves() {
        let mut form = SpotForm::new();
        form.set_name("Quiet Room");
        form.set_address("1 Main St");
        assert!(!form.can_submit());

        form.apply_geocode_hit(40.0, -73.0, "NYC", "USA");
        assert!(form.can_submit());
    }

    #[test]
    fn test_zero_zero_coordinates_block_submission() {
        let mut form = filled_form();
        form.draft.latitude = 0.0;
        form.draft.longitude = 0.0;
        assert!(!form.can_submit());
    }

    #[test]
    fn test_seed_location_never_overrides_a_resolved_address() {
        let mut form = filled_form();
        form.seed_location(1.0, 2.0);
        assert_eq!(form.draft().latitude, 40.0);

        let mut fresh = SpotForm::new();
        fresh.seed_location(1.0, 2.0);
        assert_eq!(fresh.draft().latitude, 1.0);
    }

    #[test]
    fn test_geocode_failure_does_not_block_typing() {
        let mut form = SpotForm::new();
        form.set_address("1 Main St");
        form.geocode_failed("network down");
        assert!(form.error().is_some());

        form.set_address("1 Main Street");
        assert!(form.wants_geocode());
    }

    #[tokio::test]
    async fn test_submit_without_session_redirects_to_sign_in() {
        let client = Client::new(MemoryDatabase::new());
        let mut form = filled_form();

        let outcome = form.submit(&client, &AuthGate::signed_out()).await;
        assert_eq!(outcome, SubmitOutcome::RedirectToSignIn);
        // nothing was lost
        assert_eq!(form.draft().name, "Quiet Room");
    }

    #[tokio::test]
    async fn test_successful_submit_clears_and_navigates() {
        let client = Client::new(MemoryDatabase::new());
        let gate = AuthGate::signed_in(Identity::new("user-1"));
        let mut form = filled_form();

        let outcome = form.submit(&client, &gate).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Navigate("/usa/nyc/quiet-room".to_owned())
        );
        assert!(form.draft().name.is_empty());
        assert!(form.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_the_draft() {
        let database = MemoryDatabase::new();
        let client = Client::new(database.clone());
        let gate = AuthGate::signed_in(Identity::new("user-1"));
        let mut form = filled_form();

        database.set_fail_requests(true);
        let outcome = form.submit(&client, &gate).await;

        assert!(matches!(outcome, SubmitOutcome::Rejected(_)));
        assert_eq!(form.draft().name, "Quiet Room");
        assert!(form.error().is_some());
    }
}
