use leptos::prelude::*;

#[component]
pub fn Section(#[prop(optional, into)] title: Option<String>, children: Children) -> impl IntoView {
    view! {
        <section class="mx-6 my-4 bg-gray-800 border border-gray-700 p-5">
            {title.map(|t| view! {
                <h2 class="text-sm font-semibold text-gray-300 uppercase tracking-wider mb-4">{t}</h2>
            })}
            {children()}
        </section>
    }
}

/// Section whose heading carries right-aligned actions.
#[component]
pub fn SectionWithActions(
    #[prop(into)] title: String,
    actions: AnyView,
    children: Children,
) -> impl IntoView {
    view! {
        <section class="mx-6 my-4 bg-gray-800 border border-gray-700 p-5">
            <div class="flex items-center justify-between mb-4">
                <h2 class="text-sm font-semibold text-gray-300 uppercase tracking-wider">{title}</h2>
                <div class="flex items-center gap-2">{actions}</div>
            </div>
            {children()}
        </section>
    }
}

#[component]
pub fn StatCard(stat: &'static str, #[prop(into)] label: String, #[prop(into)] value: String) -> impl IntoView {
    view! {
        <div class="bg-gray-800 border border-gray-700 p-4">
            <p class="text-xs text-gray-500 uppercase tracking-wider mb-1">{label}</p>
            <p class="text-2xl font-bold text-white">
                <span data-stat=stat>{value}</span>
            </p>
        </div>
    }
}

#[component]
pub fn EmptyState(#[prop(into)] text: String) -> impl IntoView {
    view! { <div class="text-center py-8 text-gray-500">{text}</div> }
}

pub const BUTTON_PRIMARY: &str = "px-4 py-2 text-sm bg-blue-600 hover:bg-blue-700 text-white";
pub const BUTTON_DANGER: &str = "px-4 py-2 text-sm bg-red-600 hover:bg-red-700 text-white";
pub const BUTTON_SECONDARY: &str = "px-4 py-2 text-sm bg-gray-700 hover:bg-gray-600 text-gray-200";
pub const INPUT: &str = "w-full px-3 py-2 bg-gray-900 border border-gray-600 text-white text-sm focus:outline-none focus:border-blue-500";
pub const LABEL: &str = "block text-sm font-medium text-gray-300 mb-1";
pub const TABLE_HEAD: &str = "text-left text-xs text-gray-500 uppercase tracking-wider";
pub const ROW: &str = "border-t border-gray-700/50";
