//! A client's live view of the registries, and the write paths.
//!
//! A [`Desk`] holds one subscription per collection and keeps the latest
//! snapshot of each, replacing it wholesale whenever the store publishes.
//! Guests and alerts are kept newest-first, wanted persons in store order.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::AlertConfig;
use crate::error::Result;
use crate::matching::{assess, Assessment};
use crate::records::{Guest, GuestForm, Notification, WantedForm, WantedPerson};
use crate::session::LocalState;
use crate::store::{Collection, Record, RecordStore, Snapshot, Subscription};
use crate::visibility::{visible_alerts, visible_guests, Viewer};

/// Live registries over a [`RecordStore`].
#[derive(Debug)]
pub struct Desk<S> {
    store: S,
    alerts: AlertConfig,
    guest_feed: Subscription,
    wanted_feed: Subscription,
    alert_feed: Subscription,
    guests: Vec<Guest>,
    wanted: Vec<WantedPerson>,
    notifications: Vec<Notification>,
}

impl<S: RecordStore> Desk<S> {
    /// Subscribe to all three collections and load their current snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if any subscription cannot be opened.
    pub async fn connect(store: S, alerts: AlertConfig) -> Result<Self> {
        let guest_feed = store.subscribe(Collection::Guests).await?;
        let wanted_feed = store.subscribe(Collection::Wanted).await?;
        let alert_feed = store.subscribe(Collection::Notifications).await?;

        let mut desk = Self {
            store,
            alerts,
            guest_feed,
            wanted_feed,
            alert_feed,
            guests: Vec::new(),
            wanted: Vec::new(),
            notifications: Vec::new(),
        };
        desk.refresh();
        Ok(desk)
    }

    /// Pull the latest snapshot of every collection.
    pub fn refresh(&mut self) {
        let guests = self.guest_feed.latest();
        self.apply(guests);
        let wanted = self.wanted_feed.latest();
        self.apply(wanted);
        let alerts = self.alert_feed.latest();
        self.apply(alerts);
    }

    fn apply(&mut self, snapshot: Snapshot) {
        match snapshot {
            Snapshot::Guests(mut guests) => {
                guests.reverse();
                self.guests = guests;
            }
            Snapshot::Wanted(wanted) => self.wanted = wanted,
            Snapshot::Notifications(mut alerts) => {
                alerts.reverse();
                self.notifications = alerts;
            }
        }
    }

    /// Wait for the store to publish any collection, then refresh.
    ///
    /// Returns which collection changed.
    ///
    /// # Errors
    ///
    /// Returns an error once the store has closed a subscription.
    pub async fn changed(&mut self) -> Result<Collection> {
        let collection = tokio::select! {
            r = self.guest_feed.changed() => { r?; Collection::Guests }
            r = self.wanted_feed.changed() => { r?; Collection::Wanted }
            r = self.alert_feed.changed() => { r?; Collection::Notifications }
        };
        self.refresh();
        debug!(%collection, "registry updated");
        Ok(collection)
    }

    /// Register a guest at the session's hotel.
    ///
    /// The wanted check runs against the latest wanted snapshot and is frozen
    /// on the guest. The guest is appended first, then the alert for a hit. If
    /// the alert write fails the guest stays registered.
    ///
    /// # Errors
    ///
    /// Fails without writing anything if the session may not check guests in
    /// or the form is incomplete. Store write failures are returned as is.
    pub async fn check_in(&mut self, state: &LocalState, form: GuestForm) -> Result<Assessment> {
        let hotel = state.check_in_desk()?;
        let form = form.validate()?;

        self.refresh();
        let assessment = assess(form, hotel, &self.wanted, &self.alerts, Utc::now());

        self.store
            .append(Record::Guest(assessment.guest.clone()))
            .await?;
        info!(
            id = %assessment.guest.id,
            hotel = %assessment.guest.hotel_name,
            "Guest checked in"
        );

        if let Some(alert) = &assessment.alert {
            if let Err(e) = self.store.append(Record::Notification(alert.clone())).await {
                warn!(error = %e, guest = %assessment.guest.id, "Guest saved but alert was not");
                self.refresh();
                return Err(e);
            }
            warn!(zone = %alert.target_zone, "Wanted person checked in");
        }

        self.refresh();
        Ok(assessment)
    }

    /// Post a wanted person. Only police accounts may do this.
    ///
    /// Guests already registered keep their wanted flag.
    ///
    /// # Errors
    ///
    /// Fails on permission, validation or store write errors.
    pub async fn post_wanted(
        &mut self,
        state: &LocalState,
        form: WantedForm,
    ) -> Result<WantedPerson> {
        let session = state.require_police()?;
        let person = form.validate()?.into_record(Utc::now());

        self.store.append(Record::Wanted(person.clone())).await?;
        info!(id = %person.id, by = %session.username, "Wanted person posted");

        self.refresh();
        Ok(person)
    }

    /// Guests `viewer` may see whose names contain `term`, newest first.
    #[must_use]
    pub fn guests(&self, viewer: &Viewer, term: &str) -> Vec<&Guest> {
        visible_guests(&self.guests, viewer, term)
    }

    /// Alerts `viewer` may see, newest first.
    #[must_use]
    pub fn alerts(&self, viewer: &Viewer) -> Vec<&Notification> {
        visible_alerts(&self.notifications, viewer)
    }

    /// The wanted registry in store order.
    #[must_use]
    pub fn wanted(&self) -> &[WantedPerson] {
        &self.wanted
    }

    /// The store this desk writes to.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}
