// TUI widget modules, one per screen plus shared chrome.

pub mod chat;
pub mod hint;
pub mod login;
pub mod quit_confirm;
pub mod scoreboard;
pub mod status_bar;
pub mod welcome;
