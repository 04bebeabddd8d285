use crate::error::HandoffError;

const WHATSAPP_BASE: &str = "https://wa.me";

/// Outbound side of the pitch flow: open a link, or put text on the clipboard.
pub trait MessageLauncher {
    fn open_url(&mut self, url: &str) -> Result<(), HandoffError>;
    fn copy_text(&mut self, text: &str) -> Result<(), HandoffError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Launched(String),
    Copied,
}

/// Builds a WhatsApp deep link with `text` pre-filled. Returns `None` when the
/// handle holds no digits.
pub fn whatsapp_link(handle: &str, text: &str) -> Option<String> {
    let digits: String = handle.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!(
        "{WHATSAPP_BASE}/{digits}?text={}",
        urlencoding::encode(text)
    ))
}

pub fn dispatch(
    launcher: &mut dyn MessageLauncher,
    handle: Option<&str>,
    message: &str,
) -> Result<Dispatch, HandoffError> {
    match handle.and_then(|handle| whatsapp_link(handle, message)) {
        Some(url) => {
            launcher.open_url(&url)?;
            Ok(Dispatch::Launched(url))
        }
        None => {
            launcher.copy_text(message)?;
            Ok(Dispatch::Copied)
        }
    }
}
