use leptos::prelude::*;

use crate::components::layout::Shell;
use crate::components::section::{BUTTON_PRIMARY, INPUT, LABEL};
use crate::i18n::{Key, Lang, t};
use crate::render;

#[component]
fn LoginPage(lang: Lang, error: Option<String>, username: String) -> impl IntoView {
    view! {
        <div class="min-h-screen flex items-center justify-center px-4">
            <div class="w-full max-w-sm">
                <div class="bg-gray-800 border border-gray-700 p-8">
                    <h1 class="text-xl font-semibold text-white text-center mb-6">"SIP Wrapper Admin"</h1>
                    {error.map(|e| view! {
                        <div id="error-alert" class="mb-4 px-4 py-3 bg-red-500/20 border border-red-500/50 text-red-300 text-sm">
                            {e}
                        </div>
                    })}
                    <form id="login-form" method="post" action="/login" class="space-y-4">
                        <div>
                            <label for="username" class=LABEL>{t(lang, Key::Username)}</label>
                            <input id="username" name="username" type="text" required autofocus class=INPUT value=username/>
                        </div>
                        <div>
                            <label for="password" class=LABEL>{t(lang, Key::Password)}</label>
                            <input id="password" name="password" type="password" required class=INPUT/>
                        </div>
                        <button type="submit" class=format!("w-full {BUTTON_PRIMARY}")>{t(lang, Key::Login)}</button>
                    </form>
                </div>
                <form method="post" action="/set-lang" class="flex justify-center gap-3 mt-4">
                    <input type="hidden" name="return_to" value="/login"/>
                    {[Lang::De, Lang::En].into_iter().map(|l| {
                        let class = if l == lang {
                            "text-xs uppercase text-white"
                        } else {
                            "text-xs uppercase text-gray-500 hover:text-gray-300"
                        };
                        view! { <button type="submit" name="lang" value=l.code() class=class>{l.code()}</button> }
                    }).collect_view()}
                </form>
            </div>
        </div>
    }
}

/// Login form. A failed attempt re-renders in place with the backend's error.
pub fn render_login(lang: Lang, error: Option<&str>, username: &str) -> String {
    let error = error.map(str::to_string);
    let username = username.to_string();
    render(move || {
        view! {
            <Shell lang=lang title=t(lang, Key::Login)>
                <LoginPage lang=lang error=error username=username/>
            </Shell>
        }
    })
}
