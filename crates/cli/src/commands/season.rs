use chrono::NaiveDate;
use serde::Serialize;
use tourfare_core::pricing::SeasonalCalendar;

use crate::commands::CommandResult;

const COMMAND: &str = "season";

#[derive(Debug, Serialize)]
struct SeasonReport {
    date: NaiveDate,
    season: &'static str,
    base_season: &'static str,
    is_holiday: bool,
}

pub fn run(date: &str) -> CommandResult {
    let date = match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(date) => date,
        Err(error) => {
            return CommandResult::input_failure(
                COMMAND,
                format!("date must be formatted YYYY-MM-DD: {error}"),
            );
        }
    };

    let season = SeasonalCalendar.season_of(date);
    CommandResult::document(
        COMMAND,
        &SeasonReport {
            date,
            season: season.label(),
            base_season: season.base().label(),
            is_holiday: season.is_holiday(),
        },
    )
}
