//! Role-scoped views over the registries.
//!
//! Both filters are pure and keep the input order.

use crate::records::{Guest, Notification};

/// Who is looking, reduced to what decides visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    /// Local police, scoped to one zone.
    Police {
        /// Zone the account is assigned to.
        zone: String,
    },
    /// Hotel reception, scoped to its own hotel.
    Reception {
        /// Name of the hotel.
        hotel: String,
    },
    /// Sees everything.
    Unscoped,
    /// A scoped role that has no profile yet. Sees nothing.
    Unassigned,
}

impl Viewer {
    fn can_see(&self, guest: &Guest) -> bool {
        match self {
            Self::Police { zone } => guest.hotel_zone == *zone,
            Self::Reception { hotel } => guest.hotel_name == *hotel,
            Self::Unscoped => true,
            Self::Unassigned => false,
        }
    }
}

/// Narrow the guest registry to what `viewer` may see, then to names
/// containing `term` (case-insensitive). An empty term keeps everything.
#[must_use]
pub fn visible_guests<'a>(guests: &'a [Guest], viewer: &Viewer, term: &str) -> Vec<&'a Guest> {
    let term = term.to_lowercase();
    guests
        .iter()
        .filter(|guest| viewer.can_see(guest))
        .filter(|guest| term.is_empty() || guest.full_name.to_lowercase().contains(&term))
        .collect()
}

/// Alerts shown to `viewer`.
///
/// Local police see alerts for their zone, reception and unassigned
/// viewers see none.
#[must_use]
pub fn visible_alerts<'a>(alerts: &'a [Notification], viewer: &Viewer) -> Vec<&'a Notification> {
    match viewer {
        Viewer::Police { zone } => alerts.iter().filter(|a| a.target_zone == *zone).collect(),
        Viewer::Reception { .. } | Viewer::Unassigned => Vec::new(),
        Viewer::Unscoped => alerts.iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;

    use super::*;
    use crate::records::Severity;

    fn guest(name: &str, hotel: &str, zone: &str) -> Guest {
        Guest {
            id: crate::records::new_id(),
            full_name: name.to_string(),
            nationality: "Ethiopian".to_string(),
            room_number: "1".to_string(),
            photo: None,
            hotel_name: hotel.to_string(),
            hotel_zone: zone.to_string(),
            checked_in_at: Utc::now(),
            is_wanted: false,
        }
    }

    fn registry() -> Vec<Guest> {
        vec![
            guest("Abebe Kebede", "Blue Nile Hotel", "Zone A"),
            guest("Chala Tesfaye", "Blue Nile Hotel", "Zone A"),
            guest("Almaz Ayana", "Asosa Inn", "Zone B"),
            guest("Kebede Alemu", "Asosa Inn", "Zone B"),
            guest("Sara Bekele", "Menelik Lodge", "Zone A"),
        ]
    }

    fn police(zone: &str) -> Viewer {
        Viewer::Police {
            zone: zone.to_string(),
        }
    }

    fn names(guests: &[&Guest]) -> Vec<String> {
        guests.iter().map(|g| g.full_name.clone()).collect()
    }

    #[test]
    fn test_police_sees_only_own_zone() {
        let guests = registry();
        let visible = visible_guests(&guests, &police("Zone A"), "");
        assert_eq!(
            names(&visible),
            vec!["Abebe Kebede", "Chala Tesfaye", "Sara Bekele"]
        );
        assert!(visible.iter().all(|g| g.hotel_zone == "Zone A"));
    }

    #[test]
    fn test_reception_sees_only_own_hotel() {
        let guests = registry();
        let viewer = Viewer::Reception {
            hotel: "Asosa Inn".to_string(),
        };
        let visible = visible_guests(&guests, &viewer, "");
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|g| g.hotel_name == "Asosa Inn"));
    }

    #[test]
    fn test_unscoped_sees_everything_in_order() {
        let guests = registry();
        let visible = visible_guests(&guests, &Viewer::Unscoped, "");
        let expected: Vec<&Guest> = guests.iter().collect();
        assert_eq!(visible, expected);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let guests = registry();
        let visible = visible_guests(&guests, &Viewer::Unscoped, "KEBE");
        assert_eq!(names(&visible), vec!["Abebe Kebede", "Kebede Alemu"]);
    }

    #[test]
    fn test_search_narrows_role_view() {
        let guests = registry();
        for term in ["", "a", "kebede", "zzz"] {
            let narrowed = visible_guests(&guests, &police("Zone B"), term);
            let all = visible_guests(&guests, &police("Zone B"), "");
            assert!(narrowed.iter().all(|g| all.contains(g)));
        }
        let visible = visible_guests(&guests, &police("Zone B"), "kebede");
        assert_eq!(names(&visible), vec!["Kebede Alemu"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let guests = registry();
        let viewer = police("Zone A");
        assert_eq!(
            visible_guests(&guests, &viewer, "e"),
            visible_guests(&guests, &viewer, "e")
        );
    }

    #[test]
    fn test_unknown_zone_sees_nothing() {
        let guests = registry();
        assert!(visible_guests(&guests, &police("Zone C"), "").is_empty());
    }

    #[test]
    fn test_unassigned_sees_nothing() {
        let mut guests = registry();
        guests.push(guest("Chala Tesfaye", "", ""));
        assert!(visible_guests(&guests, &Viewer::Unassigned, "").is_empty());
    }

    #[test]
    fn test_visible_alerts_by_role() {
        let alert = |zone: &str| Notification {
            id: crate::records::new_id(),
            title: "Wanted person checked in".to_string(),
            message: String::new(),
            severity: Severity::Danger,
            created_at: Utc::now(),
            target_zone: zone.to_string(),
        };
        let alerts = vec![alert("Zone A"), alert("Zone B"), alert("Zone A")];

        assert_eq!(visible_alerts(&alerts, &police("Zone A")).len(), 2);
        assert_eq!(visible_alerts(&alerts, &Viewer::Unscoped).len(), 3);
        let reception = Viewer::Reception {
            hotel: "Blue Nile Hotel".to_string(),
        };
        assert!(visible_alerts(&alerts, &reception).is_empty());
        assert!(visible_alerts(&alerts, &Viewer::Unassigned).is_empty());
    }

    fn arb_place() -> impl Strategy<Value = String> {
        prop_oneof![
            prop::sample::select(vec!["Zone A", "Zone B", "አሶሳ ዞን", "Blue Nile Hotel", ""])
                .prop_map(str::to_string),
            "\\PC{0,8}",
        ]
    }

    fn arb_guests() -> impl Strategy<Value = Vec<Guest>> {
        prop::collection::vec(("\\PC{0,16}", arb_place(), arb_place()), 0..24).prop_map(|rows| {
            rows.iter()
                .map(|(name, hotel, zone)| guest(name, hotel, zone))
                .collect()
        })
    }

    fn arb_viewer() -> impl Strategy<Value = Viewer> {
        prop_oneof![
            arb_place().prop_map(|zone| Viewer::Police { zone }),
            arb_place().prop_map(|hotel| Viewer::Reception { hotel }),
            Just(Viewer::Unscoped),
            Just(Viewer::Unassigned),
        ]
    }

    fn arb_term() -> impl Strategy<Value = String> {
        prop_oneof![
            prop::sample::select(vec!["", "a", "KE", "ዞ", " "]).prop_map(str::to_string),
            "\\PC{0,3}",
        ]
    }

    proptest! {
        #[test]
        fn test_police_view_is_exactly_their_zone(guests in arb_guests(), zone in arb_place()) {
            let viewer = Viewer::Police { zone: zone.clone() };
            let visible = visible_guests(&guests, &viewer, "");
            prop_assert!(visible.iter().all(|g| g.hotel_zone == zone));
            let in_zone = guests.iter().filter(|g| g.hotel_zone == zone).count();
            prop_assert_eq!(visible.len(), in_zone);
        }

        #[test]
        fn test_reception_view_is_exactly_their_hotel(guests in arb_guests(), hotel in arb_place()) {
            let viewer = Viewer::Reception { hotel: hotel.clone() };
            let visible = visible_guests(&guests, &viewer, "");
            prop_assert!(visible.iter().all(|g| g.hotel_name == hotel));
            let at_hotel = guests.iter().filter(|g| g.hotel_name == hotel).count();
            prop_assert_eq!(visible.len(), at_hotel);
        }

        #[test]
        fn test_search_stays_within_role_view(
            guests in arb_guests(),
            viewer in arb_viewer(),
            term in arb_term()
        ) {
            let all = visible_guests(&guests, &viewer, "");
            let narrowed = visible_guests(&guests, &viewer, &term);
            prop_assert!(narrowed.len() <= all.len());
            for g in &narrowed {
                prop_assert!(all.iter().any(|a| std::ptr::eq(*a, *g)));
                prop_assert!(g.full_name.to_lowercase().contains(&term.to_lowercase()));
            }
        }

        #[test]
        fn test_filter_keeps_registry_order(
            guests in arb_guests(),
            viewer in arb_viewer(),
            term in arb_term()
        ) {
            let positions: Vec<usize> = visible_guests(&guests, &viewer, &term)
                .iter()
                .filter_map(|v| guests.iter().position(|g| std::ptr::eq(g, *v)))
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn test_filter_is_pure(guests in arb_guests(), viewer in arb_viewer(), term in arb_term()) {
            prop_assert_eq!(
                visible_guests(&guests, &viewer, &term),
                visible_guests(&guests, &viewer, &term)
            );
        }

        #[test]
        fn test_unassigned_never_sees_guests(guests in arb_guests(), term in arb_term()) {
            prop_assert!(visible_guests(&guests, &Viewer::Unassigned, &term).is_empty());
        }
    }
}
