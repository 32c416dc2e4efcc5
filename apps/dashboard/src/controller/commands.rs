//! Parsing of interactive dashboard commands typed on stdin.

use client_core::{FilterAction, QuickFilter, TextFilter};
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  search <text>     free-text search (empty clears)
  name <text>       filter by customer name
  company <text>    filter by company name
  rep <text>        filter by sales representative
  week | month      toggle the birthday quick filters
  sort <column>     name, company, birthday or a raw field; repeat to reverse
  clear             reset every filter
  page <n> | next | prev
  refresh           reload the current page
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Apply(FilterAction),
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`; type `help` for the list")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`{0}` is not a page number")]
    InvalidPage(String),
}

/// Sort columns shown in the table map onto API ordering fields; anything
/// else is passed through as the raw field name.
pub fn sort_field_for(column: &str) -> &str {
    match column {
        "name" => "first_name",
        "company" => "company__name",
        "birthday" => "date_of_birth",
        other => other,
    }
}

/// Blank input yields `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<UserCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let argument = (!rest.is_empty()).then(|| rest.to_string());

    let command = match word.to_ascii_lowercase().as_str() {
        "search" | "s" => UserCommand::Apply(FilterAction::SetSearchText(rest.to_string())),
        "name" => text_filter(TextFilter::Name, argument),
        "company" => text_filter(TextFilter::Company, argument),
        "rep" => text_filter(TextFilter::SalesRep, argument),
        "week" => UserCommand::Apply(FilterAction::ToggleQuickFilter(
            QuickFilter::BirthdayThisWeek,
        )),
        "month" => UserCommand::Apply(FilterAction::ToggleQuickFilter(
            QuickFilter::BirthdayThisMonth,
        )),
        "sort" => {
            let column = argument.ok_or(CommandError::MissingArgument("sort"))?;
            UserCommand::Apply(FilterAction::SetSort(sort_field_for(&column).to_string()))
        }
        "clear" => UserCommand::Apply(FilterAction::ClearFilters),
        "page" => {
            let raw = argument.ok_or(CommandError::MissingArgument("page"))?;
            let page = raw
                .parse::<u32>()
                .map_err(|_| CommandError::InvalidPage(raw.clone()))?;
            UserCommand::Apply(FilterAction::SetPage(page))
        }
        "next" | "n" => UserCommand::Apply(FilterAction::NextPage),
        "prev" | "p" => UserCommand::Apply(FilterAction::PreviousPage),
        "refresh" | "r" => UserCommand::Refresh,
        "help" | "?" => UserCommand::Help,
        "quit" | "q" | "exit" => UserCommand::Quit,
        _ => return Err(CommandError::Unknown(word.to_string())),
    };
    Ok(Some(command))
}

fn text_filter(key: TextFilter, value: Option<String>) -> UserCommand {
    UserCommand::Apply(FilterAction::SetTextFilter { key, value })
}
