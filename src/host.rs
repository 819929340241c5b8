//! Host collaborators
//!
//! The browse flow never talks to a terminal or a player directly. It asks a
//! [`Host`] to prompt, to pick from a list, to render a listing and to play a
//! URL. [`TerminalHost`] is the interactive implementation used by the CLI.

use crate::action::Action;
use crate::config::PlayerConfig;
use dialoguer::{Input, Select};
use std::io;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors that can occur while interacting with the host
#[derive(Debug, Error)]
pub enum HostError {
    /// Terminal prompt failed
    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// Failed to start the player
    #[error("Failed to start player {command}: {source}")]
    PlayerSpawn { command: String, source: io::Error },

    /// The player exited unsuccessfully
    #[error("Player {command} failed with exit code {code:?}")]
    PlayerFailed { command: String, code: Option<i32> },
}

/// Severity of a notice shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// One entry of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub label: String,
    /// Secondary line with details such as year, rating or episode count
    pub info: Option<String>,
    pub thumbnail: Option<String>,
    /// What to run when this entry is chosen
    pub action: Action,
    /// Whether choosing this entry leads to playback rather than a sub-listing
    pub playable: bool,
}

impl ListItem {
    /// Creates an item that opens a further listing or prompt
    pub fn folder(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            info: None,
            thumbnail: None,
            action,
            playable: false,
        }
    }

    /// Creates an item that ends in playback
    pub fn playable(label: impl Into<String>, action: Action) -> Self {
        Self {
            playable: true,
            ..Self::folder(label, action)
        }
    }

    pub fn with_info(mut self, info: Option<String>) -> Self {
        self.info = info;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    /// Label with the playable marker and the info line, as shown in a terminal
    pub fn display_label(&self) -> String {
        let marker = if self.playable { "▶ " } else { "" };
        match &self.info {
            Some(info) => format!("{}{}  ({})", marker, self.label, info),
            None => format!("{}{}", marker, self.label),
        }
    }
}

/// Trait for user interfaces that can drive the browse flow
///
/// Every interactive method returns `None` when the user cancels.
pub trait Host {
    /// Asks for a line of free text
    fn prompt_text(&mut self, title: &str) -> Result<Option<String>, HostError>;

    /// Asks the user to pick one of `options`, returning its index
    fn select(&mut self, title: &str, options: &[String]) -> Result<Option<usize>, HostError>;

    /// Shows a listing and returns the action of the chosen item
    fn render(&mut self, title: &str, items: &[ListItem]) -> Result<Option<Action>, HostError>;

    /// Hands a resolved URL and its subtitle URLs to the player
    fn play(&mut self, url: &str, subtitles: &[String]) -> Result<(), HostError>;

    /// Shows a short notice
    fn notify(&mut self, level: NoticeLevel, message: &str);
}

/// Interactive terminal host
///
/// Prompts are drawn on stderr by `dialoguer`. Playback spawns the configured
/// player with the URL as its last argument, or prints the URL to stdout when
/// no player is configured.
pub struct TerminalHost {
    player: PlayerConfig,
}

impl TerminalHost {
    pub fn new(player: PlayerConfig) -> Self {
        Self { player }
    }
}

impl Host for TerminalHost {
    fn prompt_text(&mut self, title: &str) -> Result<Option<String>, HostError> {
        let text: String = Input::new()
            .with_prompt(title)
            .allow_empty(true)
            .interact_text()?;

        let text = text.trim();
        Ok(if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        })
    }

    fn select(&mut self, title: &str, options: &[String]) -> Result<Option<usize>, HostError> {
        if options.is_empty() {
            return Ok(None);
        }
        Ok(Select::new()
            .with_prompt(title)
            .items(options)
            .default(0)
            .interact_opt()?)
    }

    fn render(&mut self, title: &str, items: &[ListItem]) -> Result<Option<Action>, HostError> {
        let labels: Vec<String> = items.iter().map(ListItem::display_label).collect();

        let choice = self.select(title, &labels)?;
        Ok(choice.and_then(|index| items.get(index)).map(|item| item.action.clone()))
    }

    fn play(&mut self, url: &str, subtitles: &[String]) -> Result<(), HostError> {
        let Some(command) = self.player.command.as_deref() else {
            println!("{}", url);
            for subtitle in subtitles {
                eprintln!("Subtitle: {}", subtitle);
            }
            return Ok(());
        };

        let mut player = Command::new(command);
        player.args(&self.player.args);
        if let Some(option) = self.player.subtitle_option.as_deref() {
            for subtitle in subtitles {
                player.arg(format!("{}{}", option, subtitle));
            }
        }

        let status = player
            .arg(url)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| HostError::PlayerSpawn {
                command: command.to_string(),
                source: e,
            })?;

        if !status.success() {
            return Err(HostError::PlayerFailed {
                command: command.to_string(),
                code: status.code(),
            });
        }
        Ok(())
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => eprintln!("{}", message),
            NoticeLevel::Warning => eprintln!("Warning: {}", message),
            NoticeLevel::Error => eprintln!("Error: {}", message),
        }
    }
}
