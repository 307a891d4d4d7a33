//! Handlers behind the built-in actions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use autobook_contracts::{
    action::ActionArguments,
    error::{AutobookError, AutobookResult},
};
use autobook_core::traits::{ActionHandler, Retriever};

use crate::{
    builtin::BuiltinAction,
    calendar::{is_weekend, CalendarBackend, Invite},
};

const DATE_FORMAT_HINT: &str = "Error: Please provide the date in YYYY-MM-DD format.";

/// Runs one built-in action against shared backends.
pub struct BuiltinHandler {
    action: BuiltinAction,
    retriever: Arc<dyn Retriever>,
    calendar: Arc<dyn CalendarBackend>,
}

impl BuiltinHandler {
    pub fn new(action: BuiltinAction, retriever: Arc<dyn Retriever>, calendar: Arc<dyn CalendarBackend>) -> Self {
        Self { action, retriever, calendar }
    }

    async fn search(&self, arguments: &ActionArguments) -> AutobookResult<String> {
        let query = self.text(arguments, "query")?;
        self.retriever.search(query).await
    }

    async fn check_availability(&self, arguments: &ActionArguments) -> AutobookResult<String> {
        let raw = self.text(arguments, "date")?;
        let Some(date) = parse_date(raw) else {
            return Ok(DATE_FORMAT_HINT.to_string());
        };
        if is_weekend(date) {
            return Ok(format!("No availability on {raw} as it is a weekend. Please suggest a weekday."));
        }

        let slots = self.calendar.open_slots(date).await?;
        if slots.is_empty() {
            return Ok(format!("The calendar has no open slots left on {raw}. Please suggest another day."));
        }
        Ok(format!("The calendar shows open slots at {} on {raw}.", join_with_and(&slots)))
    }

    async fn create_invite(&self, arguments: &ActionArguments) -> AutobookResult<String> {
        let raw = self.text(arguments, "date")?;
        let Some(date) = parse_date(raw) else {
            return Ok(DATE_FORMAT_HINT.to_string());
        };
        let time = self.text(arguments, "time")?.to_string();
        let title = self.text(arguments, "title")?.to_string();
        let participants = match arguments.get("participants") {
            Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
            _ => Vec::new(),
        };

        self.calendar
            .create_invite(Invite { date, time: time.clone(), title: title.clone(), participants })
            .await?;
        Ok(format!("Success: The calendar invite '{title}' has been created for {raw} at {time}."))
    }

    fn text<'a>(&self, arguments: &'a ActionArguments, name: &str) -> AutobookResult<&'a str> {
        arguments
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| AutobookError::InvalidArguments {
                action: self.action.name().to_string(),
                reason: format!("missing required argument '{name}'"),
            })
    }
}

#[async_trait]
impl ActionHandler for BuiltinHandler {
    async fn invoke(&self, arguments: &ActionArguments) -> AutobookResult<String> {
        match self.action {
            BuiltinAction::SearchKnowledgeBase => self.search(arguments).await,
            BuiltinAction::CheckCalendarAvailability => self.check_availability(arguments).await,
            BuiltinAction::CreateCalendarInvite => self.create_invite(arguments).await,
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// "a", "a and b", "a, b, and c".
fn join_with_and(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}
