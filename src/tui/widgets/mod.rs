// TUI widget modules for each panel and overlay.

pub mod chat;
pub mod clear_confirm;
pub mod dashboard;
pub mod login_modal;
pub mod public_board;
pub mod status_bar;
