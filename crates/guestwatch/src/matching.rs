//! Wanted-person matching at check-in time.
//!
//! A guest is a wanted hit when their full name equals some wanted person's
//! full name after lower-casing both. There is no fuzzy or partial matching.
//! The outcome is decided once, before anything is written, and frozen on the
//! guest record.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::AlertConfig;
use crate::records::{new_id, Guest, GuestForm, Notification, Severity, WantedPerson};
use crate::session::HotelProfile;

/// Check a name against the wanted registry.
#[must_use]
pub fn is_wanted(name: &str, wanted: &[WantedPerson]) -> bool {
    let needle = name.to_lowercase();
    wanted
        .iter()
        .any(|person| person.full_name.to_lowercase() == needle)
}

/// Build the alert raised for a wanted hit.
///
/// The alert targets the zone of the hotel that registered the guest.
#[must_use]
pub fn wanted_alert(guest: &Guest, alerts: &AlertConfig) -> Notification {
    Notification {
        id: new_id(),
        title: alerts.title.clone(),
        message: alerts.render_message(&guest.full_name, &guest.hotel_name),
        severity: Severity::Danger,
        created_at: guest.checked_in_at,
        target_zone: guest.hotel_zone.clone(),
    }
}

/// Everything a check-in will write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    /// The guest record, wanted flag already decided.
    pub guest: Guest,
    /// The alert to append, present only for a wanted hit.
    pub alert: Option<Notification>,
}

/// Turn a validated form into the records a check-in appends.
#[must_use]
pub fn assess(
    form: GuestForm,
    hotel: &HotelProfile,
    wanted: &[WantedPerson],
    alerts: &AlertConfig,
    now: DateTime<Utc>,
) -> Assessment {
    let hit = is_wanted(&form.full_name, wanted);
    let guest = Guest {
        id: new_id(),
        full_name: form.full_name,
        nationality: form.nationality,
        room_number: form.room_number,
        photo: form.photo,
        hotel_name: hotel.name.clone(),
        hotel_zone: hotel.zone.clone(),
        checked_in_at: now,
        is_wanted: hit,
    };

    let alert = if hit {
        info!(guest = %guest.full_name, zone = %guest.hotel_zone, "wanted hit");
        Some(wanted_alert(&guest, alerts))
    } else {
        debug!(guest = %guest.full_name, "no wanted match");
        None
    };

    Assessment { guest, alert }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn wanted(name: &str) -> WantedPerson {
        WantedPerson {
            id: new_id(),
            full_name: name.to_string(),
            photo: None,
            description: String::new(),
            crime: "Theft".to_string(),
            posted_at: Utc::now(),
        }
    }

    fn blue_nile() -> HotelProfile {
        HotelProfile {
            name: "Blue Nile Hotel".to_string(),
            zone: "አሶሳ ዞን".to_string(),
        }
    }

    fn form(name: &str) -> GuestForm {
        GuestForm {
            full_name: name.to_string(),
            nationality: "Ethiopian".to_string(),
            room_number: "7".to_string(),
            photo: None,
        }
    }

    #[test]
    fn test_empty_registry_never_matches() {
        assert!(!is_wanted("Abebe Kebede", &[]));
        assert!(!is_wanted("", &[]));
    }

    #[test]
    fn test_match_ignores_case() {
        let registry = vec![wanted("Abebe Kebede")];
        assert!(is_wanted("abebe kebede", &registry));
        assert!(is_wanted("ABEBE KEBEDE", &registry));
    }

    #[test]
    fn test_match_is_full_string() {
        let registry = vec![wanted("Abebe Kebede")];
        assert!(!is_wanted("Abebe", &registry));
        assert!(!is_wanted("Abebe Kebede Jr", &registry));
        assert!(!is_wanted("Abebe  Kebede", &registry));
    }

    #[test]
    fn test_match_any_entry() {
        let registry = vec![wanted("Almaz Ayana"), wanted("Abebe Kebede")];
        assert!(is_wanted("abebe kebede", &registry));
        assert!(!is_wanted("Chala Tesfaye", &registry));
    }

    #[test]
    fn test_match_non_ascii_case() {
        let registry = vec![wanted("ÉLODIE Durand")];
        assert!(is_wanted("élodie durand", &registry));
    }

    #[test]
    fn test_assess_hit_builds_alert() {
        let registry = vec![wanted("Abebe Kebede")];
        let now = Utc::now();
        let outcome = assess(
            form("abebe kebede"),
            &blue_nile(),
            &registry,
            &AlertConfig::default(),
            now,
        );

        assert!(outcome.guest.is_wanted);
        assert_eq!(outcome.guest.hotel_name, "Blue Nile Hotel");
        let alert = outcome.alert.expect("wanted hit raises an alert");
        assert_eq!(alert.severity, Severity::Danger);
        assert_eq!(alert.target_zone, "አሶሳ ዞን");
        assert_eq!(alert.created_at, now);
        assert!(alert.message.contains("abebe kebede"));
        assert!(alert.message.contains("Blue Nile Hotel"));
    }

    #[test]
    fn test_assess_miss_has_no_alert() {
        let registry = vec![wanted("Abebe Kebede")];
        let outcome = assess(
            form("Chala Tesfaye"),
            &blue_nile(),
            &registry,
            &AlertConfig::default(),
            Utc::now(),
        );

        assert!(!outcome.guest.is_wanted);
        assert!(outcome.alert.is_none());
    }

    #[test]
    fn test_wanted_alert_uses_configured_title() {
        let alerts = AlertConfig {
            title: "Wanted!".to_string(),
            message_template: "{guest} at {hotel}".to_string(),
        };
        let outcome = assess(
            form("Abebe Kebede"),
            &blue_nile(),
            &[wanted("abebe kebede")],
            &alerts,
            Utc::now(),
        );
        let alert = outcome.alert.unwrap();
        assert_eq!(alert.title, "Wanted!");
        assert_eq!(alert.message, "Abebe Kebede at Blue Nile Hotel");
    }

    #[test]
    fn test_alert_message_keeps_braces_in_names() {
        let hotel = blue_nile();
        let outcome = assess(
            form("{hotel}"),
            &hotel,
            &[wanted("{HOTEL}")],
            &AlertConfig::default(),
            Utc::now(),
        );
        let alert = outcome.alert.unwrap();
        assert_eq!(alert.message, "{hotel} has checked in at Blue Nile Hotel.");
    }

    /// Flip the case of the characters selected by `flips` where doing so
    /// keeps the lower-case form unchanged.
    fn recase(name: &str, flips: &[bool]) -> String {
        name.chars()
            .zip(flips.iter().cycle())
            .map(|(c, &flip)| {
                if !flip || matches!(c, 'Σ' | 'σ' | 'ς') {
                    return c;
                }
                let swapped: String = if c.is_lowercase() {
                    c.to_uppercase().collect()
                } else {
                    c.to_lowercase().collect()
                };
                let mut chars = swapped.chars();
                match (chars.next(), chars.next()) {
                    (Some(s), None) if s.to_lowercase().eq(c.to_lowercase()) => s,
                    _ => c,
                }
            })
            .collect()
    }

    fn arb_name() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z ]{1,16}",
            "[a-zA-Zà-öø-ÿÀ-ÖØ-ÞА-яЁё ]{1,16}",
            "[\u{1200}-\u{137F} ]{1,12}",
            "\\PC{1,16}",
        ]
    }

    proptest! {
        #[test]
        fn test_empty_registry_never_matches_any_name(name in "\\PC{0,24}") {
            prop_assert!(!is_wanted(&name, &[]));
        }

        #[test]
        fn test_match_iff_lowercase_equal(
            name in arb_name(),
            registry in prop::collection::vec(arb_name(), 0..8)
        ) {
            let people: Vec<WantedPerson> = registry.iter().map(|n| wanted(n)).collect();
            let expected = registry.iter().any(|n| n.to_lowercase() == name.to_lowercase());
            prop_assert_eq!(is_wanted(&name, &people), expected);
        }

        #[test]
        fn test_differently_cased_name_matches(
            name in arb_name(),
            flips in prop::collection::vec(any::<bool>(), 1..8),
            others in prop::collection::vec(arb_name(), 0..6),
            slot in 0usize..7
        ) {
            let mut people: Vec<WantedPerson> = others.iter().map(|n| wanted(n)).collect();
            people.insert(slot.min(people.len()), wanted(&name));
            prop_assert!(is_wanted(&recase(&name, &flips), &people));
        }

        #[test]
        fn test_hit_alert_targets_hotel_zone(name in arb_name(), zone in "\\PC{1,12}") {
            let hotel = HotelProfile {
                name: "Blue Nile Hotel".to_string(),
                zone: zone.clone(),
            };
            let registry = [wanted(&name)];
            let outcome = assess(form(&name), &hotel, &registry, &AlertConfig::default(), Utc::now());
            prop_assert!(outcome.guest.is_wanted);
            let alert = outcome.alert.unwrap();
            prop_assert_eq!(alert.target_zone, zone);
            prop_assert_eq!(alert.severity, Severity::Danger);
        }
    }
}
