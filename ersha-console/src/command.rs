use std::str::FromStr;

use ersha_core::{DeviceId, DeviceStatus, DeviceType, DraftField, ParseEnumError, SortColumn};
use thiserror::Error;

use crate::query::Filter;

pub const HELP: &str = "\
commands:
  sort <column>            sort by name|type|status|address|location|updated (again to flip)
  status <value|any>       filter by status
  type <value|any>         filter by type
  search <text>            free-text search, empty to clear
  page <n> | next | prev   move between pages
  refresh | reset          reload, or reset sort and filters
  new | edit <id>          open the create or edit dialog
  set <field> <value>      fill in a dialog field
  save | cancel            submit or close the dialog
  delete <id> | confirm    delete a device after confirmation
  audit <id>               show a device's audit log
  help | quit";

/// One operator command, typed as a line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Sort(SortColumn),
    Filter(Filter),
    Search(String),
    /// Zero-based page index.
    Page(usize),
    Next,
    Prev,
    Refresh,
    Reset,
    New,
    Edit(DeviceId),
    Delete(DeviceId),
    Confirm,
    Cancel,
    Set(DraftField, String),
    Save,
    Audit(DeviceId),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?}, type `help`")]
    Unknown(String),
    #[error("`{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
    #[error(transparent)]
    InvalidValue(#[from] ParseEnumError),
    #[error("page numbers start at 1, got {0:?}")]
    InvalidPage(String),
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    what: &'static str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument { command, what })
    } else {
        Ok(rest)
    }
}

fn any_or<T: FromStr<Err = ParseEnumError>>(value: &str) -> Result<Option<T>, CommandError> {
    if value.eq_ignore_ascii_case("any") {
        Ok(None)
    } else {
        Ok(Some(value.parse()?))
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match word.to_ascii_lowercase().as_str() {
            "" => return Err(CommandError::Empty),
            "sort" => Command::Sort(required(rest, "sort", "a column")?.parse()?),
            "status" => Command::Filter(Filter::Status(any_or::<DeviceStatus>(required(
                rest, "status", "a status or `any`",
            )?)?)),
            "type" => Command::Filter(Filter::Type(any_or::<DeviceType>(required(
                rest, "type", "a type or `any`",
            )?)?)),
            "search" => Command::Search(rest.to_string()),
            "page" => {
                let raw = required(rest, "page", "a page number")?;
                let number: usize = raw
                    .parse()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| CommandError::InvalidPage(raw.to_string()))?;
                Command::Page(number - 1)
            }
            "next" => Command::Next,
            "prev" | "previous" => Command::Prev,
            "refresh" => Command::Refresh,
            "reset" => Command::Reset,
            "new" | "create" => Command::New,
            "edit" => Command::Edit(DeviceId::from(required(rest, "edit", "a device id")?)),
            "delete" => Command::Delete(DeviceId::from(required(rest, "delete", "a device id")?)),
            "confirm" | "yes" => Command::Confirm,
            "cancel" | "close" => Command::Cancel,
            "set" => {
                let args = required(rest, "set", "a field and a value")?;
                let (field, value) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
                Command::Set(field.parse()?, value.trim().to_string())
            }
            "save" => Command::Save,
            "audit" => Command::Audit(DeviceId::from(required(rest, "audit", "a device id")?)),
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(word.to_string())),
        };

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, CommandError> {
        line.parse()
    }

    #[test]
    fn parses_list_commands() {
        assert_eq!(parse("sort name"), Ok(Command::Sort(SortColumn::Name)));
        assert_eq!(parse("  SORT updated "), Ok(Command::Sort(SortColumn::UpdatedAt)));
        assert_eq!(
            parse("status decommissioned"),
            Ok(Command::Filter(Filter::Status(Some(DeviceStatus::Decommissioned))))
        );
        assert_eq!(parse("type any"), Ok(Command::Filter(Filter::Type(None))));
        assert_eq!(parse("page 3"), Ok(Command::Page(2)));
        assert_eq!(parse("next"), Ok(Command::Next));
    }

    #[test]
    fn search_keeps_inner_spaces_and_may_be_empty() {
        assert_eq!(
            parse("search  branch  nairobi "),
            Ok(Command::Search("branch  nairobi".to_string()))
        );
        assert_eq!(parse("search"), Ok(Command::Search(String::new())));
    }

    #[test]
    fn parses_dialog_commands() {
        assert_eq!(parse("edit 01HX"), Ok(Command::Edit(DeviceId::from("01HX"))));
        assert_eq!(
            parse("set description spare unit, rack 4"),
            Ok(Command::Set(
                DraftField::Description,
                "spare unit, rack 4".to_string()
            ))
        );
        assert_eq!(
            parse("set serial"),
            Ok(Command::Set(DraftField::SerialNumber, String::new()))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse("   "), Err(CommandError::Empty));
        assert!(matches!(parse("launch"), Err(CommandError::Unknown(_))));
        assert!(matches!(
            parse("edit"),
            Err(CommandError::MissingArgument { command: "edit", .. })
        ));
        assert!(matches!(parse("page 0"), Err(CommandError::InvalidPage(_))));
        assert!(matches!(parse("sort colour"), Err(CommandError::InvalidValue(_))));
    }
}
