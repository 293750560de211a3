//! Timestamped resource names.
//!
//! Names double as correlation keys: Metrc's create endpoints return no id,
//! so a new record is found again by its name in the active listing. The
//! timestamp keeps names unique across runs.

use chrono::{Local, NaiveDateTime};
#[cfg(test)]
use chrono::NaiveDate;

/// Layout of the timestamp embedded in names, e.g. `2021.01.01 12:00:00`.
pub const NAME_TIME_LAYOUT: &str = "%Y.%m.%d %H:%M:%S";

/// Source of the wall time embedded in resource names.
pub trait NameClock {
    fn now(&self) -> NaiveDateTime;

    fn stamp(&self) -> String {
        self.now().format(NAME_TIME_LAYOUT).to_string()
    }
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl NameClock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

#[cfg(test)]
impl FixedClock {
    /// `2021.01.01 12:00:00`.
    pub fn new_year_noon() -> Self {
        let noon = NaiveDate::from_ymd_opt(2021, 1, 1)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .unwrap_or_default();
        Self(noon)
    }
}

#[cfg(test)]
impl NameClock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Names used by one verification cycle, all sharing one timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    stamp: String,
}

impl ResourceNames {
    pub fn at(clock: &impl NameClock) -> Self {
        Self {
            stamp: clock.stamp(),
        }
    }

    pub fn location(&self) -> String {
        format!("Metrc Eval Location {}", self.stamp)
    }

    pub fn updated_location(&self) -> String {
        format!("Metrc Eval Location {} Updated", self.stamp)
    }

    pub fn strain(&self) -> String {
        format!("Metrc Strain Name {}", self.stamp)
    }

    pub fn item(&self) -> String {
        format!("Metrc Item Name {}", self.stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_uses_dotted_layout() {
        assert_eq!(FixedClock::new_year_noon().stamp(), "2021.01.01 12:00:00");
    }

    #[test]
    fn names_share_the_stamp() {
        let names = ResourceNames::at(&FixedClock::new_year_noon());
        assert_eq!(names.location(), "Metrc Eval Location 2021.01.01 12:00:00");
        assert_eq!(
            names.updated_location(),
            "Metrc Eval Location 2021.01.01 12:00:00 Updated"
        );
        assert_eq!(names.strain(), "Metrc Strain Name 2021.01.01 12:00:00");
        assert_eq!(names.item(), "Metrc Item Name 2021.01.01 12:00:00");
    }

    #[test]
    fn system_clock_stamp_has_layout_shape() {
        let stamp = SystemClock.stamp();
        assert_eq!(stamp.len(), "2021.01.01 12:00:00".len());
        assert_eq!(&stamp[4..5], ".");
        assert_eq!(&stamp[10..11], " ");
    }
}
