//! Interactive form session
//!
//! Each input line is one `ReplCommand`. A `Session` owns the form and the
//! mock API and turns commands into rendered output.

use crate::system_config::SystemConfig;
use crate::util;
use anyhow::{Context, Result};
use form::{FormError, MockApi, NameForm, NameStatus};
use owo_colors::OwoColorize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Replace the name field in one step
    Name(String),
    /// Type text one keystroke at a time
    Type(String),
    Location(String),
    Add,
    Clear,
    Status,
    /// Wait for the current name to be validated
    Wait,
    Table,
    /// Print records as JSON
    Export,
    Locations,
    /// Change the debounce delay (milliseconds, negatives clamp to 0)
    Delay(i64),
    Help,
    Quit,
}

/// REPL parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid delay '{0}': expected milliseconds")]
    InvalidDelay(String),
}

impl FromStr for ReplCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let required = |name: &'static str| {
            if rest.is_empty() {
                Err(ParseError::MissingArgument(name))
            } else {
                Ok(rest.to_string())
            }
        };

        match word.to_ascii_lowercase().as_str() {
            // Empty argument erases the name
            "name" => Ok(Self::Name(rest.to_string())),
            "type" => required("type").map(Self::Type),
            "location" | "loc" => required("location").map(Self::Location),
            "add" => Ok(Self::Add),
            "clear" => Ok(Self::Clear),
            "status" | "" => Ok(Self::Status),
            "wait" => Ok(Self::Wait),
            "table" | "list" => Ok(Self::Table),
            "export" => Ok(Self::Export),
            "locations" => Ok(Self::Locations),
            "delay" => {
                let raw = required("delay")?;
                raw.parse::<i64>()
                    .map(Self::Delay)
                    .map_err(|_| ParseError::InvalidDelay(raw))
            }
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Result of executing one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Text to print; keep reading
    Continue(String),
    Quit,
}

/// A running form backed by the mock API
pub struct Session {
    form: NameForm,
    api: Arc<MockApi>,
    keystroke: Duration,
}

impl Session {
    /// Build a session from configuration
    ///
    /// Locations are not loaded yet; call `load_locations`.
    pub fn new(config: &SystemConfig) -> Result<Self> {
        let api = Arc::new(MockApi::new(&config.api));
        let form = NameForm::new(api.clone(), config.debounce.delay())
            .context("Failed to create form")?;

        Ok(Self {
            form,
            api,
            keystroke: Duration::from_millis(config.repl.keystroke_ms),
        })
    }

    /// Fetch the location list
    pub async fn load_locations(&self) -> Result<Vec<String>> {
        self.form
            .load_locations()
            .await
            .context("Failed to load locations")
    }

    pub fn form(&self) -> &NameForm {
        &self.form
    }

    pub fn api(&self) -> &MockApi {
        &self.api
    }

    /// Execute one command
    ///
    /// Rejected form actions are reported in the output; only
    /// infrastructure failures are returned as errors.
    pub async fn execute(&self, command: ReplCommand) -> Result<Outcome> {
        let text = match command {
            ReplCommand::Name(name) => {
                self.form.set_name(&name)?;
                util::render_form(&self.form.snapshot())
            }
            ReplCommand::Type(text) => {
                let mut typed = String::new();
                for ch in text.chars() {
                    typed.push(ch);
                    self.form.set_name(&typed)?;
                    tokio::time::sleep(self.keystroke).await;
                }
                self.form.wait_validated().await;
                util::render_form(&self.form.snapshot())
            }
            ReplCommand::Location(location) => match self.form.select_location(&location) {
                Ok(()) => util::render_form(&self.form.snapshot()),
                Err(e @ FormError::UnknownLocation(_)) => rejected(&e),
                Err(e) => return Err(e.into()),
            },
            ReplCommand::Add => match self.form.add() {
                Ok(record) => format!(
                    "{} Added {} ({})\n",
                    "✓".green(),
                    record.name.bold(),
                    record.location
                ),
                Err(
                    e @ (FormError::EmptyName | FormError::NoLocation | FormError::NameTaken(_)),
                ) => rejected(&e),
                Err(e) => return Err(e.into()),
            },
            ReplCommand::Clear => {
                self.form.clear()?;
                util::render_form(&self.form.snapshot())
            }
            ReplCommand::Status => util::render_form(&self.form.snapshot()),
            ReplCommand::Wait => {
                let status = self.form.wait_validated().await;
                format!("{}\n", util::status_label(status))
            }
            ReplCommand::Table => {
                let mut out = util::render_table(&self.form.records());
                let count = self.form.record_count();
                if count > 0 {
                    out.push_str(&util::record_count_footer(count));
                }
                out
            }
            ReplCommand::Export => {
                let json = serde_json::to_string_pretty(&self.form.records())
                    .context("Failed to serialize records")?;
                format!("{}\n", json)
            }
            ReplCommand::Locations => {
                let snapshot = self.form.snapshot();
                util::render_locations(&snapshot.locations, snapshot.selected_location.as_deref())
            }
            ReplCommand::Delay(ms) => {
                let delay = debounce::delay_from_millis(ms);
                self.form.set_delay(delay)?;
                format!("Debounce delay: {}ms\n", delay.as_millis())
            }
            ReplCommand::Help => help_text().to_string(),
            ReplCommand::Quit => return Ok(Outcome::Quit),
        };

        Ok(Outcome::Continue(text))
    }

    /// Current name status
    pub fn name_status(&self) -> NameStatus {
        self.form.name_status()
    }

    /// Stop timers and background work
    pub fn shutdown(&self) {
        self.form.shutdown();
    }
}

fn rejected(err: &FormError) -> String {
    format!("{} {}\n", "✗".red(), err)
}

/// Command reference
pub fn help_text() -> &'static str {
    "Commands:
  name <text>       set the name field (empty erases it)
  type <text>       type the name one keystroke at a time
  location <loc>    select a location
  add               add the current name/location to the table
  clear             reset the form
  status            show the form
  wait              wait for the name check to finish
  table             show submitted records
  export            print submitted records as JSON
  locations         list selectable locations
  delay <ms>        change the debounce delay
  help              show this help
  quit              exit
"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("name alice".parse::<ReplCommand>(), Ok(ReplCommand::Name("alice".to_string())));
        assert_eq!("name".parse::<ReplCommand>(), Ok(ReplCommand::Name(String::new())));
        assert_eq!(
            "type  invalid name ".parse::<ReplCommand>(),
            Ok(ReplCommand::Type("invalid name".to_string()))
        );
        assert_eq!("LOC Canada".parse::<ReplCommand>(), Ok(ReplCommand::Location("Canada".to_string())));
        assert_eq!("add".parse::<ReplCommand>(), Ok(ReplCommand::Add));
        assert_eq!("".parse::<ReplCommand>(), Ok(ReplCommand::Status));
        assert_eq!("delay -20".parse::<ReplCommand>(), Ok(ReplCommand::Delay(-20)));
        assert_eq!("exit".parse::<ReplCommand>(), Ok(ReplCommand::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "type".parse::<ReplCommand>(),
            Err(ParseError::MissingArgument("type"))
        );
        assert_eq!(
            "location".parse::<ReplCommand>(),
            Err(ParseError::MissingArgument("location"))
        );
        assert_eq!(
            "delay soon".parse::<ReplCommand>(),
            Err(ParseError::InvalidDelay("soon".to_string()))
        );
        assert_eq!(
            "frobnicate".parse::<ReplCommand>(),
            Err(ParseError::Unknown("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_help_lists_every_command() {
        for cmd in ["name", "type", "location", "add", "clear", "wait", "table", "export", "delay"] {
            assert!(help_text().contains(cmd), "help is missing {}", cmd);
        }
    }
}
