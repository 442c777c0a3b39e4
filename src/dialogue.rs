//! Login dialogue module: per-chat conversation state and input classification.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

lazy_static! {
    static ref VERIFICATION_CODE_REGEX: Regex = Regex::new(r"^\d{5}$").expect("Code pattern should be valid");
    static ref PHONE_NUMBER_REGEX: Regex = Regex::new(r"^\d{10,14}$").expect("Phone pattern should be valid");
    static ref GROUP_COMMAND_REGEX: Regex =
        Regex::new(r"(?s)^/group(?:@\w+)?(?:\s+(.*))?$").expect("Group pattern should be valid");
    static ref BOT_MENTION_REGEX: Regex = Regex::new(r"^(/\w+)@\w+").expect("Mention pattern should be valid");
}

/// Represents where a chat is in the login flow
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginState {
    #[default]
    Idle,
    AwaitingPhoneNumber,
    CodeRequested {
        phone_number: String,
    },
    AwaitingCode {
        phone_number: String,
    },
    SigningIn {
        phone_number: String,
    },
    SignedIn,
    Failed,
}

impl LoginState {
    pub fn expects_phone_number(&self) -> bool {
        matches!(self, LoginState::AwaitingPhoneNumber)
    }

    pub fn expects_code(&self) -> bool {
        matches!(self, LoginState::AwaitingCode { .. })
    }

    /// A login is underway and can be cancelled
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            LoginState::AwaitingPhoneNumber
                | LoginState::CodeRequested { .. }
                | LoginState::AwaitingCode { .. }
        )
    }
}

/// Type alias for the login dialogue
pub type LoginDialogue = Dialogue<LoginState, InMemStorage<LoginState>>;

/// What an inbound text means for a chat in a given state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Login,
    VerificationCode(String),
    PhoneNumber(String),
    Group { title: Option<String> },
    Start,
    Help,
    Cancel,
    Invalid,
}

pub fn is_verification_code(text: &str) -> bool {
    VERIFICATION_CODE_REGEX.is_match(text)
}

pub fn is_phone_number(text: &str) -> bool {
    PHONE_NUMBER_REGEX.is_match(text)
}

/// Parse `/group [title]`; `Some(None)` when no title was given
pub fn parse_group_command(text: &str) -> Option<Option<String>> {
    let caps = GROUP_COMMAND_REGEX.captures(text)?;
    let title = caps
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());
    Some(title)
}

/// Drop the `@botname` Telegram appends to commands sent from a group's menu
pub fn strip_bot_mention(text: &str) -> Cow<'_, str> {
    BOT_MENTION_REGEX.replace(text, "$1")
}

/// Classify `text` against the chat's current state
pub fn classify(text: &str, state: &LoginState) -> Input {
    let stripped = strip_bot_mention(text.trim());
    let text: &str = &stripped;

    if text == "/login" {
        return Input::Login;
    }
    if state.expects_code() && is_verification_code(text) {
        return Input::VerificationCode(text.to_string());
    }
    if state.expects_phone_number() && is_phone_number(text) {
        return Input::PhoneNumber(text.to_string());
    }
    if let Some(title) = parse_group_command(text) {
        return Input::Group { title };
    }

    match text {
        "/start" => Input::Start,
        "/help" => Input::Help,
        "/cancel" => Input::Cancel,
        _ => Input::Invalid,
    }
}
