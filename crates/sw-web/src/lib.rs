//! Server-side HTML for the admin console.
//!
//! Pages and fragments are leptos views rendered straight to strings, so
//! the router stays thin and the display rules are unit tested without a
//! browser.

use leptos::prelude::*;

pub mod components;
pub mod html;
pub mod i18n;
pub mod pages;
pub mod utils;

pub use components::layout::{Nav, PageContext};
pub use components::toast::{Flash, FlashKind};
pub use i18n::Lang;
pub use pages::error_fragment;

/// Render a view tree to HTML under a fresh reactive owner.
pub fn render<V: IntoView>(view: impl FnOnce() -> V) -> String {
    Owner::new().with(|| view().to_html())
}
