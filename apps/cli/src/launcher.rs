//! Desktop hand-off: browser for WhatsApp links, `arboard` for the clipboard.
//!
//! The clipboard is created fresh on each copy so nothing is held between
//! commands.

use arboard::Clipboard;
use leadscout_core::{HandoffError, MessageLauncher};

pub struct SystemLauncher;

impl MessageLauncher for SystemLauncher {
    fn open_url(&mut self, url: &str) -> Result<(), HandoffError> {
        log::info!("opening {url}");
        open::that(url).map_err(|error| HandoffError {
            action: "opening the browser",
            reason: error.to_string(),
        })
    }

    fn copy_text(&mut self, text: &str) -> Result<(), HandoffError> {
        let mut clipboard = Clipboard::new().map_err(|error| HandoffError {
            action: "accessing the clipboard",
            reason: error.to_string(),
        })?;
        clipboard.set_text(text).map_err(|error| HandoffError {
            action: "copying to the clipboard",
            reason: error.to_string(),
        })
    }
}
