use leptos::prelude::*;

use crate::components::section::{BUTTON_DANGER, BUTTON_PRIMARY, BUTTON_SECONDARY};

/// Overlay dialog. Closing is a plain link back to the page.
#[component]
pub fn Modal(
    #[prop(into)] title: String,
    #[prop(into)] close_href: String,
    children: Children,
) -> impl IntoView {
    view! {
        <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/50">
            <div class="bg-gray-800 border border-gray-700 p-6 w-full max-w-lg mx-4">
                <div class="flex items-center justify-between mb-4">
                    <h3 class="text-lg font-medium text-white">{title}</h3>
                    <a href=close_href class="text-gray-400 hover:text-white">"×"</a>
                </div>
                {children()}
            </div>
        </div>
    }
}

/// Form footer with cancel link and submit button.
#[component]
pub fn FormButtons(
    #[prop(into)] cancel_href: String,
    #[prop(into)] submit_label: String,
    #[prop(default = BUTTON_PRIMARY)] button: &'static str,
) -> impl IntoView {
    view! {
        <div class="flex justify-end gap-3 mt-6">
            <a href=cancel_href class=BUTTON_SECONDARY>"Cancel"</a>
            <button type="submit" class=button>{submit_label}</button>
        </div>
    }
}

#[derive(Debug, Clone)]
pub struct Confirm {
    pub title: String,
    pub message: String,
    /// Form target performing the action.
    pub action: String,
    pub hidden: Vec<(&'static str, String)>,
    pub confirm_label: String,
    pub cancel_href: String,
    pub danger: bool,
}

/// Blocking confirmation: nothing happens until the form is submitted.
#[component]
pub fn ConfirmModal(confirm: Confirm) -> impl IntoView {
    let Confirm {
        title,
        message,
        action,
        hidden,
        confirm_label,
        cancel_href,
        danger,
    } = confirm;
    let button = if danger { BUTTON_DANGER } else { BUTTON_PRIMARY };

    view! {
        <Modal title=title close_href=cancel_href.clone()>
            <p class="text-sm text-gray-300 mb-2">{message}</p>
            <form method="post" action=action>
                {hidden.into_iter().map(|(name, value)| view! {
                    <input type="hidden" name=name value=value/>
                }).collect_view()}
                <FormButtons cancel_href=cancel_href submit_label=confirm_label button=button/>
            </form>
        </Modal>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render;

    #[test]
    fn confirm_posts_hidden_key() {
        let confirm = Confirm {
            title: "Delete user".into(),
            message: r#"Delete user "alice"?"#.into(),
            action: "/manage/users/delete".into(),
            hidden: vec![("key", "alice".into())],
            confirm_label: "Delete".into(),
            cancel_href: "/manage?tab=users".into(),
            danger: true,
        };
        let html = render(move || view! { <ConfirmModal confirm=confirm/> });
        assert!(html.contains(r#"action="/manage/users/delete""#));
        assert!(html.contains(r#"name="key" value="alice""#));
        assert!(html.contains(r#"Delete user "alice"?"#));
        assert!(html.contains("bg-red-600"));
    }
}
