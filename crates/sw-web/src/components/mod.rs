pub mod layout;
pub mod modal;
pub mod section;
pub mod status_badge;
pub mod toast;
