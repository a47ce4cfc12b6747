use itertools::Itertools;
use log::{debug, warn};
use model::{spot::PrayerSpot, WithId};

use crate::{
    client::Client,
    database::Database,
    RequestResult,
};

/// Load state of the browsing surface. The record list is kept outside the
/// phase so a failed refresh can fall back to stale-but-present data instead
/// of blanking the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    Loading,
    Ready,
    Error(String),
}

/// Ticket handed out per refresh. Completions are applied in generation
/// order; a ticket older than the last applied one is discarded, so when an
/// old request resolves after a newer one, the newer result stays.
#[derive(Debug)]
#[must_use = "apply the ticket once the list call completes"]
pub struct RefreshTicket {
    generation: u64,
}

/// Owns the fetched record list and the search filter, and derives the
/// visible marker set from both. All mutation flows re-list through the
/// client rather than patching this copy.
#[derive(Debug)]
pub struct MapViewModel {
    records: Vec<WithId<PrayerSpot>>,
    filter: String,
    phase: LoadPhase,
    loaded_once: bool,
    issued: u64,
    applied: u64,
}

impl Default for MapViewModel {
    fn default() -> Self {
        Self {
            records: vec![],
            filter: String::new(),
            phase: LoadPhase::Loading,
            loaded_once: false,
            issued: 0,
            applied: 0,
        }
    }
}

impl MapViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn records(&self) -> &[WithId<PrayerSpot>] {
        &self.records
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Whether an initial load ever succeeded. Lets the surface distinguish
    /// "nothing to show yet" from "refresh failed, data is stale".
    pub fn has_loaded(&self) -> bool {
        self.loaded_once
    }

    /// Starts a refresh. The previously fetched records stay visible while
    /// the new list call is in flight.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        self.phase = LoadPhase::Loading;
        RefreshTicket {
            generation: self.issued,
        }
    }

    /// Applies a completed list call. Failures keep the previous records;
    /// retrying is just another `begin_refresh`.
    pub fn apply_refresh(
        &mut self,
        ticket: RefreshTicket,
        outcome: RequestResult<Vec<WithId<PrayerSpot>>>,
    ) {
        if ticket.generation <= self.applied {
            debug!(
                "discarding superseded refresh (generation {})",
                ticket.generation
            );
            return;
        }
        self.applied = ticket.generation;
        match outcome {
            Ok(records) => {
                self.records = records;
                self.loaded_once = true;
                self.phase = LoadPhase::Ready;
            }
            Err(why) => {
                warn!("failed to refresh prayer spots: {}", why);
                self.phase = LoadPhase::Error(why.to_string());
            }
        }
    }

    /// One full refresh round trip. Triggered on mount and after every
    /// confirmed mutation.
    pub async fn refresh<D: Database>(&mut self, client: &Client<D>) {
        let ticket = self.begin_refresh();
        let outcome = client.list().await;
        self.apply_refresh(ticket, outcome);
    }

    /// Updates the search filter. Purely local: no list call is issued and
    /// none in flight is disturbed.
    pub fn set_filter(&mut self, term: impl Into<String>) {
        self.filter = term.into();
    }

    /// The records the marker layer should currently show.
    pub fn visible_markers(&self) -> Vec<&WithId<PrayerSpot>> {
        self.records
            .iter()
            .filter(|spot| spot.content.matches(&self.filter))
            .collect()
    }

    /// Distinct countries of the fetched records, for a browse index.
    pub fn countries(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|spot| spot.content.country.as_str())
            .unique()
            .sorted()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::Identity,
        memory::MemoryDatabase,
    };
    use model::spot::SpotDraft;

    fn draft(name: &str) -> SpotDraft {
        SpotDraft {
            name: name.to_owned(),
            address: "1 Main St".to_owned(),
            description: "a calm corner".to_owned(),
            latitude: 40.0,
            longitude: -73.0,
            city: "NYC".to_owned(),
            country: "USA".to_owned(),
        }
    }

    async fn seeded_client() -> Client<MemoryDatabase> {
        let client = Client::new(MemoryDatabase::new());
        let actor = Identity::new("user-1");
        client.create(&draft("Quiet Room"), &actor).await.unwrap();
        client.create(&draft("Al-Noor Mosque"), &actor).await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_initial_state_is_loading() {
        let vm = MapViewModel::new();
        assert_eq!(*vm.phase(), LoadPhase::Loading);
        assert!(vm.visible_markers().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_reaches_ready() {
        let client = seeded_client().await;
        let mut vm = MapViewModel::new();
        vm.refresh(&client).await;

        assert_eq!(*vm.phase(), LoadPhase::Ready);
        assert_eq!(vm.records().len(), 2);
        // newest first
        assert_eq!(vm.records()[0].content.name, "Al-Noor Mosque");
    }

    #[tokio::test]
    async fn test_filter_narrows_visible_markers_without_refetching() {
        let client = seeded_client().await;
        let mut vm = MapViewModel::new();
        vm.refresh(&client).await;

        vm.set_filter("quiet");
        let visible = vm.visible_markers();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].content.name, "Quiet Room");

        vm.set_filter("MAIN ST");
        assert_eq!(vm.visible_markers().len(), 2);

        vm.set_filter("");
        assert_eq!(vm.visible_markers().len(), 2);

        vm.set_filter("no such spot");
        assert!(vm.visible_markers().is_empty());
    }

    #[tokio::test]
    async fn test_failed_initial_load_is_an_error_with_no_records() {
        let database = MemoryDatabase::new();
        database.set_fail_requests(true);
        let client = Client::new(database);

        let mut vm = MapViewModel::new();
        vm.refresh(&client).await;

        assert!(matches!(vm.phase(), LoadPhase::Error(_)));
        assert!(!vm.has_loaded());
        assert!(vm.records().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_records() {
        let database = MemoryDatabase::new();
        let client = Client::new(database.clone());
        let actor = Identity::new("user-1");
        client.create(&draft("Quiet Room"), &actor).await.unwrap();

        let mut vm = MapViewModel::new();
        vm.refresh(&client).await;
        assert_eq!(vm.records().len(), 1);

        database.set_fail_requests(true);
        vm.refresh(&client).await;

        assert!(matches!(vm.phase(), LoadPhase::Error(_)));
        assert!(vm.has_loaded());
        assert_eq!(vm.records().len(), 1, "stale data must survive");
    }

    #[tokio::test]
    async fn test_error_state_can_retry() {
        let database = MemoryDatabase::new();
        database.set_fail_requests(true);
        let client = Client::new(database.clone());

        let mut vm = MapViewModel::new();
        vm.refresh(&client).await;
        assert!(matches!(vm.phase(), LoadPhase::Error(_)));

        database.set_fail_requests(false);
        vm.refresh(&client).await;
        assert_eq!(*vm.phase(), LoadPhase::Ready);
    }

    #[tokio::test]
    async fn test_superseded_refresh_is_discarded() {
        let client = seeded_client().await;
        let mut vm = MapViewModel::new();

        // two overlapping refreshes; the older one completes last
        let old_ticket = vm.begin_refresh();
        let new_ticket = vm.begin_refresh();

        let fresh = client.list().await;
        vm.apply_refresh(new_ticket, fresh);
        assert_eq!(vm.records().len(), 2);

        // the stale completion carries an outdated single-element list
        let stale = client.list().await.map(|mut spots| {
            spots.truncate(1);
            spots
        });
        vm.apply_refresh(old_ticket, stale);

        assert_eq!(vm.records().len(), 2, "newer completion must win");
        assert_eq!(*vm.phase(), LoadPhase::Ready);
    }

    #[tokio::test]
    async fn test_mutation_flow_relist_shows_deleted_state() {
        let database = MemoryDatabase::new();
        let client = Client::new(database);
        let actor = Identity::new("user-1");
        let created = client.create(&draft("Quiet Room"), &actor).await.unwrap();

        let mut vm = MapViewModel::new();
        vm.refresh(&client).await;
        assert!(!vm.records()[0].content.is_deleted());

        // no optimistic update: the view only changes after the re-list
        client.soft_delete(&created.id, &actor).await.unwrap();
        assert!(!vm.records()[0].content.is_deleted());

        vm.refresh(&client).await;
        assert!(vm.records()[0].content.is_deleted());
    }

    #[tokio::test]
    async fn test_countries_are_distinct_and_sorted() {
        let client = seeded_client().await;
        let actor = Identity::new("user-1");
        let mut abroad = draft("Blue Mosque");
        abroad.city = "Istanbul".to_owned();
        abroad.country = "Turkey".to_owned();
        client.create(&abroad, &actor).await.unwrap();

        let mut vm = MapViewModel::new();
        vm.refresh(&client).await;

        assert_eq!(vm.countries(), vec!["Turkey", "USA"]);
    }
}
