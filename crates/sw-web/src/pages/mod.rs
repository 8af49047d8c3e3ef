use leptos::prelude::*;

use crate::i18n::{Key, Lang, t};
use crate::render;

pub mod dashboard;
pub mod login;
pub mod manage;
pub mod security;

pub use dashboard::render_dashboard;
pub use login::render_login;
pub use manage::{ManageData, ManageModal, ManageTab, ManageView, render_manage};
pub use security::{SecurityData, SecurityModal, render_security};

/// Inline error in place of a region whose backend call failed.
pub fn error_fragment(lang: Lang, detail: &str) -> String {
    let text = format!("{}: {}", t(lang, Key::ConnectionError), detail);
    render(move || {
        view! {
            <div class="mx-6 my-2 px-3 py-2 bg-red-500/20 border border-red-500/50 text-red-300 text-sm">
                {text}
            </div>
        }
    })
}
