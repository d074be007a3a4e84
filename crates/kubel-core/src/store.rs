//! # People Store
//!
//! Operations on the persisted `Data` container and the people list
//! settings of `Config`.

use crate::age::parse_birthday;
use crate::primitives::{DATA_FORMAT_VERSION, MAX_NAME_LENGTH};
use crate::reconcile::{SyncReport, empty_person, sync_person_with_category_definition, timestamp};
use crate::{
    CategoryData, Config, Data, KubelError, OrderDirection, People, Person, PersonListSettings,
    PersonOrder,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

impl Default for Data {
    fn default() -> Self {
        Self::new()
    }
}

impl Data {
    /// Empty store in the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: DATA_FORMAT_VERSION.to_string(),
            people: People::new(),
        }
    }

    /// Create an empty person and return its generated id.
    pub fn add_person(
        &mut self,
        name: &str,
        schema: &CategoryData,
        now: DateTime<Utc>,
    ) -> Result<String, KubelError> {
        let name = validate_name(name)?;
        let id = Uuid::new_v4().to_string();
        self.people
            .insert(id.clone(), empty_person(name, schema, now));
        Ok(id)
    }

    pub fn person(&self, id: &str) -> Result<&Person, KubelError> {
        self.people
            .get(id)
            .ok_or_else(|| KubelError::PersonNotFound(id.to_string()))
    }

    pub fn rename_person(
        &mut self,
        id: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), KubelError> {
        let name = validate_name(name)?;
        let person = self
            .people
            .get_mut(id)
            .ok_or_else(|| KubelError::PersonNotFound(id.to_string()))?;
        person.name = name.to_string();
        person.last_changed = timestamp(now);
        Ok(())
    }

    /// Store `person` under `id` (insert or replace), refreshing `lastChanged`.
    pub fn save_person(&mut self, id: &str, mut person: Person, now: DateTime<Utc>) {
        person.last_changed = timestamp(now);
        self.people.insert(id.to_string(), person);
    }

    /// Remove a person; missing ids are ignored.
    pub fn delete_person(&mut self, id: &str) -> Option<Person> {
        self.people.shift_remove(id)
    }

    /// Reconcile every person against the definitions.
    pub fn sync_all(&mut self, schema: &CategoryData) -> SyncReport {
        let mut total = SyncReport::default();
        for person in self.people.values_mut() {
            total.merge(&sync_person_with_category_definition(person, schema));
        }
        total
    }

    /// People with their ids, sorted for the people list.
    ///
    /// Names compare case-insensitively. Birthdays compare as dates; people
    /// without a (valid) birthday come first in ascending order.
    #[must_use]
    pub fn people_sorted(
        &self,
        order: PersonOrder,
        direction: OrderDirection,
    ) -> Vec<(&str, &Person)> {
        let mut people: Vec<(&str, &Person)> = self
            .people
            .iter()
            .map(|(id, person)| (id.as_str(), person))
            .collect();

        people.sort_by(|(_, a), (_, b)| {
            let ordering = match order {
                PersonOrder::Name => compare_names(a, b),
                PersonOrder::Birthday => birthday_key(a)
                    .cmp(&birthday_key(b))
                    .then_with(|| compare_names(a, b)),
            };
            match direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            }
        });
        people
    }
}

fn validate_name(name: &str) -> Result<&str, KubelError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(KubelError::InvalidName("name must not be empty".to_string()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(KubelError::InvalidName(format!(
            "name length {} exceeds maximum {}",
            name.len(),
            MAX_NAME_LENGTH
        )));
    }
    Ok(name)
}

fn compare_names(a: &Person, b: &Person) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

fn birthday_key(person: &Person) -> Option<NaiveDate> {
    person
        .birthday
        .as_deref()
        .and_then(|birthday| parse_birthday(birthday).ok())
}

// =============================================================================
// CONFIG
// =============================================================================

impl Config {
    /// Update the people list order; `None` leaves a setting unchanged.
    pub fn set_person_list_order(
        &mut self,
        order: Option<&str>,
        direction: Option<&str>,
    ) -> Result<(), KubelError> {
        let order = order.map(str::parse::<PersonOrder>).transpose()?;
        let direction = direction.map(str::parse::<OrderDirection>).transpose()?;

        let settings = self
            .personlist
            .get_or_insert_with(PersonListSettings::default);
        if let Some(order) = order {
            settings.order = Some(order);
        }
        if let Some(direction) = direction {
            settings.orderdir = Some(direction);
        }
        Ok(())
    }

    /// Effective people list order, with defaults for missing settings.
    #[must_use]
    pub fn person_order(&self) -> (PersonOrder, OrderDirection) {
        let settings = self.personlist.unwrap_or_default();
        (
            settings.order.unwrap_or_default(),
            settings.orderdir.unwrap_or_default(),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
