// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Interactive prompting.

use crate::session::Result;

use inquire::{Confirm, Password, Text};
use tracing::instrument;

/// Ask the user for information git2jss cannot find anywhere else.
pub trait Prompter {
    /// Ask for a line of plain text.
    fn text(&mut self, message: &str) -> Result<String>;

    /// Ask for a secret without echoing it.
    fn password(&mut self, message: &str) -> Result<String>;

    /// Ask a yes or no question, defaulting to no.
    fn confirm(&mut self, message: &str) -> Result<bool>;
}

/// Prompt through the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    #[instrument(skip(self), level = "debug")]
    fn text(&mut self, message: &str) -> Result<String> {
        Ok(Text::new(message).prompt()?.trim().to_owned())
    }

    #[instrument(skip(self), level = "debug")]
    fn password(&mut self, message: &str) -> Result<String> {
        Ok(Password::new(message).without_confirmation().prompt()?)
    }

    #[instrument(skip(self), level = "debug")]
    fn confirm(&mut self, message: &str) -> Result<bool> {
        Ok(Confirm::new(message).with_default(false).prompt()?)
    }
}
