use crate::calendar::CalendarDate;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// Event descriptions per day, keyed by [`CalendarDate::key`].
///
/// A key never maps to an empty list: deleting the last event of a day
/// removes the day.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct EventStore {
    days: HashMap<String, Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct NoteList {
    notes: Vec<String>,
}

/// Written with keys in sorted order so the stored file is stable between saves.
impl Serialize for EventStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.days.iter().collect::<BTreeMap<_, _>>().serialize(serializer)
    }
}

impl EventStore {
    /// Returns `false` without touching the store when there is no date or no text.
    pub fn add_event(&mut self, date: Option<CalendarDate>, text: &str) -> bool {
        let date = match date {
            Some(d) => d,
            None => return false,
        };
        if text.is_empty() {
            return false;
        }
        self.days
            .entry(date.key())
            .or_default()
            .push(text.to_string());
        true
    }

    pub fn delete_event(&mut self, date: CalendarDate, index: usize) -> bool {
        let key = date.key();
        let events = match self.days.get_mut(&key) {
            Some(events) if index < events.len() => events,
            _ => return false,
        };
        events.remove(index);
        if events.is_empty() {
            self.days.remove(&key);
        }
        true
    }

    pub fn has_events(&self, date: CalendarDate) -> bool {
        self.days.contains_key(&date.key())
    }

    pub fn events_on(&self, date: CalendarDate) -> &[String] {
        self.days
            .get(&date.key())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Days in calendar order; keys that do not parse as dates are skipped.
    pub fn days(&self) -> Vec<(CalendarDate, &[String])> {
        let mut days = self
            .days
            .iter()
            .filter_map(|(key, events)| {
                CalendarDate::from_key(key).map(|date| (date, events.as_slice()))
            })
            .collect::<Vec<_>>();
        days.sort_by_key(|(date, _)| *date);
        days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Drops days whose list is empty, as may appear in hand-edited data.
    pub fn normalized(mut self) -> Self {
        self.days.retain(|_, events| !events.is_empty());
        self
    }
}

impl NoteList {
    pub fn add_note(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.notes.push(text.to_string());
        true
    }

    pub fn delete_note(&mut self, index: usize) -> bool {
        if index >= self.notes.len() {
            return false;
        }
        self.notes.remove(index);
        true
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.notes.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.notes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
