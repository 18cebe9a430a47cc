//! Free-text notes attached to calendar days.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::{DayOfMonth, MonthIndex, NOTE_KEY_SEPARATOR, ParseError, month_by_name};

/// Identifies one day of the custom year, independent of the epoch year.
///
/// The text form is `"{month index}-{day}"`, e.g. `"0-1"` for the first of
/// Ramhat. Parsing also accepts a month name in place of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteKey {
    month: MonthIndex,
    day: DayOfMonth,
}

impl NoteKey {
    pub const fn new(month: MonthIndex, day: DayOfMonth) -> Self {
        Self { month, day }
    }

    pub const fn month(&self) -> MonthIndex {
        self.month
    }

    pub const fn day(&self) -> DayOfMonth {
        self.day
    }
}

impl fmt::Display for NoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{NOTE_KEY_SEPARATOR}{}", self.month, self.day)
    }
}

impl FromStr for NoteKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyInput);
        }
        let (month, day) = trimmed
            .rsplit_once(NOTE_KEY_SEPARATOR)
            .ok_or_else(|| ParseError::InvalidFormat(trimmed.to_owned()))?;

        let month = match month.parse::<u8>() {
            Ok(index) => MonthIndex::new(index)?,
            Err(_) => month_by_name(month)
                .ok_or_else(|| ParseError::UnknownMonth(month.to_owned()))?,
        };
        let day = day
            .parse::<u8>()
            .map_err(|_| ParseError::InvalidFormat(day.to_owned()))?;

        Ok(Self::new(month, DayOfMonth::new(day, month)?))
    }
}

impl serde::Serialize for NoteKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for NoteKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for note persistence.
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("note store I/O failed for {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed note store")]
    Json(#[from] serde_json::Error),
}

/// Storage for per-day notes.
///
/// Setting a blank note removes the entry.
pub trait NoteStore {
    fn get(&self, key: NoteKey) -> Option<&str>;

    /// # Errors
    /// Returns `NoteError` if the change cannot be persisted.
    fn set(&mut self, key: NoteKey, text: &str) -> Result<(), NoteError>;

    /// # Errors
    /// Returns `NoteError` if the change cannot be persisted.
    fn remove(&mut self, key: NoteKey) -> Result<Option<String>, NoteError>;

    /// All notes in calendar order
    fn notes(&self) -> Box<dyn Iterator<Item = (NoteKey, &str)> + '_>;

    fn len(&self) -> usize {
        self.notes().count()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Notes held in memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryNoteStore {
    notes: BTreeMap<NoteKey, String>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NoteStore for MemoryNoteStore {
    fn get(&self, key: NoteKey) -> Option<&str> {
        self.notes.get(&key).map(String::as_str)
    }

    fn set(&mut self, key: NoteKey, text: &str) -> Result<(), NoteError> {
        if text.trim().is_empty() {
            self.notes.remove(&key);
        } else {
            self.notes.insert(key, text.to_owned());
        }
        Ok(())
    }

    fn remove(&mut self, key: NoteKey) -> Result<Option<String>, NoteError> {
        Ok(self.notes.remove(&key))
    }

    fn notes(&self) -> Box<dyn Iterator<Item = (NoteKey, &str)> + '_> {
        Box::new(self.notes.iter().map(|(k, v)| (*k, v.as_str())))
    }

    fn len(&self) -> usize {
        self.notes.len()
    }
}

/// Notes persisted as one JSON object, `{"0-1": "text", ...}`.
///
/// The whole file is rewritten after every change.
#[derive(Debug)]
pub struct JsonNoteStore {
    path: PathBuf,
    inner: MemoryNoteStore,
}

impl JsonNoteStore {
    /// Opens the store at `path`. A missing file is an empty store.
    ///
    /// Keys written with month names (`"Ajlet-3"`) are accepted and are
    /// rewritten in index form on the next save.
    ///
    /// # Errors
    /// Returns `NoteError::Io` if the file exists but cannot be read, and
    /// `NoteError::Json` if its contents are not a map of valid keys to strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, NoteError> {
        let path = path.into();
        let notes = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str::<BTreeMap<NoteKey, String>>(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "note store missing, starting empty");
                BTreeMap::new()
            }
            Err(source) => return Err(io_error(&path, source)),
        };
        debug!(path = %path.display(), n = notes.len(), "loaded notes");
        Ok(Self {
            path,
            inner: MemoryNoteStore { notes },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `next` to disk and adopts it only once the write succeeded.
    fn commit(&mut self, next: MemoryNoteStore) -> Result<(), NoteError> {
        self.save(&next)?;
        self.inner = next;
        Ok(())
    }

    fn save(&self, store: &MemoryNoteStore) -> Result<(), NoteError> {
        let json = serde_json::to_string_pretty(&store.notes)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|source| io_error(&tmp, source))?;
        fs::rename(&tmp, &self.path).map_err(|source| {
            warn!(path = %self.path.display(), "failed to replace note store");
            io_error(&self.path, source)
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> NoteError {
    NoteError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl NoteStore for JsonNoteStore {
    fn get(&self, key: NoteKey) -> Option<&str> {
        self.inner.get(key)
    }

    fn set(&mut self, key: NoteKey, text: &str) -> Result<(), NoteError> {
        let mut next = self.inner.clone();
        next.set(key, text)?;
        self.commit(next)
    }

    fn remove(&mut self, key: NoteKey) -> Result<Option<String>, NoteError> {
        let mut next = self.inner.clone();
        let removed = next.remove(key)?;
        if removed.is_some() {
            self.commit(next)?;
        }
        Ok(removed)
    }

    fn notes(&self) -> Box<dyn Iterator<Item = (NoteKey, &str)> + '_> {
        self.inner.notes()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(month: u8, day: u8) -> NoteKey {
        let month = MonthIndex::new(month).unwrap();
        NoteKey::new(month, DayOfMonth::new(day, month).unwrap())
    }

    #[test]
    fn test_key_display() {
        assert_eq!(key(0, 1).to_string(), "0-1");
        assert_eq!(key(8, 41).to_string(), "8-41");
    }

    #[test]
    fn test_key_parse_index_form() {
        assert_eq!("3-17".parse::<NoteKey>().unwrap(), key(3, 17));
        assert_eq!(" 0-41 ".parse::<NoteKey>().unwrap(), key(0, 41));
    }

    #[test]
    fn test_key_parse_name_form() {
        assert_eq!("Gejlet-17".parse::<NoteKey>().unwrap(), key(3, 17));
        assert_eq!("tajlet-41".parse::<NoteKey>().unwrap(), key(8, 41));
    }

    #[test]
    fn test_key_parse_errors() {
        assert_eq!("".parse::<NoteKey>(), Err(ParseError::EmptyInput));
        assert!(matches!(
            "17".parse::<NoteKey>(),
            Err(ParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            "9-1".parse::<NoteKey>(),
            Err(ParseError::InvalidMonthIndex(9))
        ));
        assert!(matches!(
            "Smarch-1".parse::<NoteKey>(),
            Err(ParseError::UnknownMonth(_))
        ));
        assert!(matches!(
            "1-41".parse::<NoteKey>(),
            Err(ParseError::InvalidDay { .. })
        ));
        assert!(matches!(
            "1-x".parse::<NoteKey>(),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_memory_store_set_get_remove() {
        let mut store = MemoryNoteStore::new();
        assert!(store.is_empty());

        store.set(key(2, 5), "first snow").unwrap();
        assert_eq!(store.get(key(2, 5)), Some("first snow"));
        assert_eq!(store.len(), 1);

        store.set(key(2, 5), "heavy snow").unwrap();
        assert_eq!(store.get(key(2, 5)), Some("heavy snow"));

        assert_eq!(store.remove(key(2, 5)).unwrap().as_deref(), Some("heavy snow"));
        assert_eq!(store.get(key(2, 5)), None);
        assert_eq!(store.remove(key(2, 5)).unwrap(), None);
    }

    #[test]
    fn test_memory_store_blank_removes() {
        let mut store = MemoryNoteStore::new();
        store.set(key(0, 1), "new year").unwrap();
        store.set(key(0, 1), "   ").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_calendar_order() {
        let mut store = MemoryNoteStore::new();
        store.set(key(4, 2), "b").unwrap();
        store.set(key(0, 30), "a").unwrap();
        store.set(key(4, 1), "c").unwrap();
        let keys: Vec<String> = store.notes().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["0-30", "4-1", "4-2"]);
    }

    #[test]
    fn test_key_serde_as_map_key() {
        let mut map = BTreeMap::new();
        map.insert(key(1, 2), "x".to_owned());
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"1-2":"x"}"#);
        let parsed: BTreeMap<NoteKey, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }
}
