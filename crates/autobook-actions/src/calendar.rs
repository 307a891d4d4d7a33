//! Calendar backends.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use autobook_contracts::error::{AutobookError, AutobookResult};

/// A booked event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub date: NaiveDate,
    pub time: String,
    pub title: String,
    #[serde(default)]
    pub participants: Vec<String>,
}

/// Where availability comes from and invites go to.
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    /// Free slots on `date`, in display form ("10:00 AM"). Empty when the
    /// day is fully booked or closed.
    async fn open_slots(&self, date: NaiveDate) -> AutobookResult<Vec<String>>;

    /// Book `invite`. Fails with `HandlerFailure` when the slot is taken.
    async fn create_invite(&self, invite: Invite) -> AutobookResult<()>;
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// A calendar with fixed weekday slots, closed on weekends. Created
/// invites are kept in memory and take their slot.
#[derive(Debug)]
pub struct SimulatedCalendar {
    slots: Vec<String>,
    invites: Mutex<Vec<Invite>>,
}

impl Default for SimulatedCalendar {
    fn default() -> Self {
        Self::new(vec!["10:00 AM".to_string(), "2:00 PM".to_string(), "4:00 PM".to_string()])
    }
}

impl SimulatedCalendar {
    pub fn new(slots: Vec<String>) -> Self {
        Self { slots, invites: Mutex::new(Vec::new()) }
    }

    /// Invites created so far, in booking order.
    pub fn invites(&self) -> Vec<Invite> {
        self.invites.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl CalendarBackend for SimulatedCalendar {
    async fn open_slots(&self, date: NaiveDate) -> AutobookResult<Vec<String>> {
        if is_weekend(date) {
            return Ok(Vec::new());
        }
        let invites = self.invites.lock().unwrap_or_else(|p| p.into_inner());
        Ok(self
            .slots
            .iter()
            .filter(|slot| !invites.iter().any(|i| i.date == date && &i.time == *slot))
            .cloned()
            .collect())
    }

    async fn create_invite(&self, invite: Invite) -> AutobookResult<()> {
        let mut invites = self.invites.lock().unwrap_or_else(|p| p.into_inner());
        if invites.iter().any(|i| i.date == invite.date && i.time == invite.time) {
            return Err(AutobookError::HandlerFailure {
                action: "create_calendar_invite".to_string(),
                reason: format!("the {} slot on {} is already booked", invite.time, invite.date),
            });
        }
        debug!(date = %invite.date, time = %invite.time, title = %invite.title, "invite created");
        invites.push(invite);
        Ok(())
    }
}
