use leptos::prelude::*;

use crate::utils::Tone;

/// Pill in one of the console tones. `title` becomes the hover text, e.g.
/// the raw hangup cause behind "Failed".
#[component]
pub fn Badge(
    tone: Tone,
    #[prop(into)] label: String,
    #[prop(default = None)] title: Option<String>,
) -> impl IntoView {
    view! {
        <span class=format!("px-2 py-0.5 text-xs font-medium border {}", tone.classes()) title=title>
            {label}
        </span>
    }
}

/// Online/offline pill keyed on the backend status string.
#[component]
pub fn StatusBadge(#[prop(into)] status: String, #[prop(into)] label: String) -> impl IntoView {
    let tone = match status.as_str() {
        "online" | "up" | "registered" => Tone::Success,
        "offline" | "down" => Tone::Secondary,
        "error" => Tone::Danger,
        _ => Tone::Warning,
    };
    view! { <Badge tone=tone label=label/> }
}

/// In/Out pill for call direction.
#[component]
pub fn DirectionBadge(#[prop(into)] direction: String) -> impl IntoView {
    if direction == "inbound" {
        view! { <Badge tone=Tone::Success label="In"/> }.into_any()
    } else {
        view! { <Badge tone=Tone::Primary label="Out"/> }.into_any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render;

    #[test]
    fn direction_labels() {
        assert!(render(|| view! { <DirectionBadge direction="inbound"/> }).contains(">In</span>"));
        assert!(render(|| view! { <DirectionBadge direction="outbound"/> }).contains(">Out</span>"));
        assert!(render(|| view! { <DirectionBadge direction=""/> }).contains(">Out</span>"));
    }

    #[test]
    fn title_is_optional() {
        let html = render(|| view! { <Badge tone=Tone::Danger label="Failed" title=Some("CALL_REJECTED".to_string())/> });
        assert!(html.contains(r#"title="CALL_REJECTED""#));
        assert!(html.contains("bg-red-500/20"));
        let plain = render(|| view! { <Badge tone=Tone::Danger label="Failed"/> });
        assert!(!plain.contains("title="));
    }
}
