//! Event catalog: registers categories, and events together with their initial seat
//! counts.
//!
//! A category's slug is derived from its name. When the slug is already taken the first
//! free `-1`, `-2`, ... suffix is appended, so two names that slugify alike still get
//! distinct addresses.

use crate::aggregates::environment::TicketingEnvironment;
use crate::aggregates::inventory::EventInventory;
use crate::error::TicketingError;
use crate::types::{Category, Event, EventId, TicketingState, Tier};
use std::collections::HashMap;
use chrono::{NaiveDate, NaiveTime};
use momenta_core::{effect::Effect, reducer::Reducer, SmallVec};
use serde::{Deserialize, Serialize};

/// Longest category name accepted.
pub const MAX_CATEGORY_NAME: usize = 150;

/// Details of an event to register.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Slug of an existing category
    pub category: String,
    /// Title
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Date
    pub date: NaiveDate,
    /// Start time
    #[serde(default)]
    pub time: Option<NaiveTime>,
    /// Venue
    pub location: String,
    /// Organizer name
    pub organizer_name: String,
    /// Organizer phone
    pub organizer_phone: String,
    /// Initial VIP seats
    pub vip_seats: u32,
    /// Initial Gold seats
    pub gold_seats: u32,
    /// Initial Standard seats
    pub standard_seats: u32,
}

/// Actions for the catalog
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogAction {
    /// Register a category under a slug derived from its name
    RegisterCategory {
        /// Display name
        name: String,
    },
    /// Register a new event
    RegisterEvent {
        /// ID for the new event
        event_id: EventId,
        /// Event details and capacity
        event: NewEvent,
    },
}

/// Reducer for event registration
#[derive(Clone, Debug, Default)]
pub struct CatalogReducer;

impl CatalogReducer {
    /// Creates a new `CatalogReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn validate_category(state: &TicketingState, name: &str) -> Result<String, TicketingError> {
        if name.is_empty() {
            return Err(TicketingError::InvalidCategory {
                reason: "name must not be empty".to_string(),
            });
        }
        if name.chars().count() > MAX_CATEGORY_NAME {
            return Err(TicketingError::InvalidCategory {
                reason: format!("name must be at most {MAX_CATEGORY_NAME} characters"),
            });
        }
        if state.categories.values().any(|category| category.name == name) {
            return Err(TicketingError::InvalidCategory {
                reason: format!("{name} already exists"),
            });
        }
        let base = slugify(name);
        if base.is_empty() {
            return Err(TicketingError::InvalidCategory {
                reason: format!("{name} has no letters or digits to build a slug from"),
            });
        }
        Ok(unique_slug(&state.categories, &base))
    }

    fn validate(state: &TicketingState, event_id: EventId, event: &NewEvent) -> Result<(), TicketingError> {
        if state.category(&event.category).is_none() {
            return Err(TicketingError::CategoryNotFound(event.category.clone()));
        }
        if state.events.contains_key(&event_id) {
            return Err(TicketingError::InvalidEvent {
                reason: format!("event {event_id} already exists"),
            });
        }
        if event.title.trim().is_empty() {
            return Err(TicketingError::InvalidEvent {
                reason: "title must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Reducer for CatalogReducer {
    type State = TicketingState;
    type Action = CatalogAction;
    type Environment = TicketingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CatalogAction::RegisterCategory { name } => {
                let name = name.trim();
                match Self::validate_category(state, name) {
                    Ok(slug) => {
                        tracing::info!(slug = %slug, name = %name, "Category registered");
                        state.categories.insert(
                            slug.clone(),
                            Category {
                                slug,
                                name: name.to_string(),
                            },
                        );
                    },
                    Err(error) => state.fail(error),
                }
                SmallVec::new()
            },
            CatalogAction::RegisterEvent { event_id, event } => {
                if let Err(error) = Self::validate(state, event_id, &event) {
                    state.fail(error);
                    return SmallVec::new();
                }

                let inventory =
                    EventInventory::new(event.vip_seats, event.gold_seats, event.standard_seats);
                let event_label = event_id.to_string();
                for tier in Tier::ALL {
                    metrics::gauge!(
                        "momenta_seats_remaining",
                        "event" => event_label.clone(),
                        "tier" => tier.as_str()
                    )
                    .set(f64::from(inventory.remaining(tier)));
                }

                tracing::info!(
                    event_id = %event_id,
                    title = %event.title.trim(),
                    seats = inventory.total_remaining(),
                    "Event registered"
                );

                state.events.insert(
                    event_id,
                    Event {
                        id: event_id,
                        category: event.category,
                        title: event.title.trim().to_string(),
                        description: event.description,
                        date: event.date,
                        time: event.time,
                        location: event.location,
                        organizer_name: event.organizer_name,
                        organizer_phone: event.organizer_phone,
                        inventory,
                    },
                );
                SmallVec::new()
            },
        }
    }
}

/// Lowercase ASCII slug: letters, digits and underscores kept, runs of spaces and
/// hyphens collapsed to one hyphen, everything else dropped.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut separator = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if separator && !slug.is_empty() {
                slug.push('-');
            }
            separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            separator = true;
        }
    }
    slug.trim_matches('_').to_string()
}

/// `base`, or `base-N` with the smallest `N >= 1` not yet taken.
#[must_use]
pub fn unique_slug(categories: &HashMap<String, Category>, base: &str) -> String {
    if !categories.contains_key(base) {
        return base.to_string();
    }
    (1u32..)
        .map(|counter| format!("{base}-{counter}"))
        .find(|slug| !categories.contains_key(slug))
        .unwrap_or_else(|| format!("{base}-{}", categories.len()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::aggregates::test_support::{new_event, state_with_category, test_env};
    use momenta_testing::{assertions, ReducerTest};

    #[test]
    fn slugs_follow_the_name() {
        assert_eq!(slugify("Music & Concerts"), "music-concerts");
        assert_eq!(slugify("  Tech -- Innovation "), "tech-innovation");
        assert_eq!(slugify("Jazz_Night!"), "jazz_night");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn colliding_slugs_get_a_counter() {
        ReducerTest::new(CatalogReducer::new())
            .with_env(test_env().0)
            .given_state(TicketingState::new())
            .given_actions([
                CatalogAction::RegisterCategory { name: "Music".to_string() },
                CatalogAction::RegisterCategory { name: "music!".to_string() },
            ])
            .when_action(CatalogAction::RegisterCategory { name: "MUSIC".to_string() })
            .then_state(|state| {
                assert!(state.last_error.is_none());
                assert_eq!(state.category("music").unwrap().name, "Music");
                assert_eq!(state.category("music-1").unwrap().name, "music!");
                assert_eq!(state.category("music-2").unwrap().name, "MUSIC");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn category_names_are_unique() {
        ReducerTest::new(CatalogReducer::new())
            .with_env(test_env().0)
            .given_state(TicketingState::new())
            .given_actions([CatalogAction::RegisterCategory { name: "Sports".to_string() }])
            .when_action(CatalogAction::RegisterCategory { name: " Sports ".to_string() })
            .then_state(|state| {
                assert_eq!(state.categories.len(), 1);
                assert!(matches!(
                    state.last_error,
                    Some(TicketingError::InvalidCategory { .. })
                ));
            })
            .run();
    }

    #[test]
    fn events_need_a_known_category() {
        let mut event = new_event("Lusaka Jazz Night", 5, 5, 5);
        event.category = "opera".to_string();

        ReducerTest::new(CatalogReducer::new())
            .with_env(test_env().0)
            .given_state(state_with_category())
            .when_action(CatalogAction::RegisterEvent {
                event_id: EventId::new(),
                event,
            })
            .then_state(|state| {
                assert!(state.events.is_empty());
                assert_eq!(
                    state.last_error,
                    Some(TicketingError::CategoryNotFound("opera".to_string()))
                );
            })
            .run();
    }

    #[test]
    fn registers_event_with_initial_inventory() {
        let event_id = EventId::new();

        ReducerTest::new(CatalogReducer::new())
            .with_env(test_env().0)
            .given_state(state_with_category())
            .when_action(CatalogAction::RegisterEvent {
                event_id,
                event: new_event("Lusaka Jazz Night", 5, 20, 100),
            })
            .then_state(move |state| {
                let event = state.event(&event_id).unwrap();
                assert_eq!(event.title, "Lusaka Jazz Night");
                assert_eq!(event.category, "music");
                assert_eq!(event.inventory.remaining(Tier::Vip), 5);
                assert_eq!(event.inventory.remaining(Tier::Standard), 100);
                assert!(state.last_error.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn rejects_blank_title() {
        ReducerTest::new(CatalogReducer::new())
            .with_env(test_env().0)
            .given_state(state_with_category())
            .when_action(CatalogAction::RegisterEvent {
                event_id: EventId::new(),
                event: new_event("   ", 1, 1, 1),
            })
            .then_state(|state| {
                assert!(state.events.is_empty());
                assert!(matches!(
                    state.last_error,
                    Some(TicketingError::InvalidEvent { .. })
                ));
            })
            .run();
    }

    #[test]
    fn rejects_duplicate_id_without_touching_inventory() {
        let event_id = EventId::new();

        ReducerTest::new(CatalogReducer::new())
            .with_env(test_env().0)
            .given_state(state_with_category())
            .given_actions([CatalogAction::RegisterEvent {
                event_id,
                event: new_event("First", 5, 5, 5),
            }])
            .when_action(CatalogAction::RegisterEvent {
                event_id,
                event: new_event("Second", 50, 50, 50),
            })
            .then_state(move |state| {
                let event = state.event(&event_id).unwrap();
                assert_eq!(event.title, "First");
                assert_eq!(event.inventory.remaining(Tier::Vip), 5);
                assert!(state.last_error.is_some());
            })
            .run();
    }
}
