//! Landing page markup. The template is a plain HTML file; the generated
//! sections are leptos views rendered to strings and spliced into it.

use leptos::prelude::*;
use sw_client::types::PublicConfig;

use crate::integrations::{Integration, IntegrationsData, StatusLabel};

/// Placeholder replaced with the integrations tables.
pub const INTEGRATIONS_SLOT: &str = "<!--integrations-->";
/// Placeholder replaced with the live configuration snapshot.
pub const LIVE_CONFIG_SLOT: &str = "<!--live-config-->";

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="de">
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1"/>
<title>SIP Wrapper</title>
<style>
body{font-family:system-ui,-apple-system,sans-serif;margin:0;color:#1e293b;background:#f8fafc}
header{background:#0f172a;color:#fff;padding:48px 24px;text-align:center}
main{max-width:1100px;margin:0 auto;padding:24px}
section{background:#fff;border:1px solid #e2e8f0;border-radius:8px;padding:24px;margin-bottom:24px}
.integration-table{width:100%;border-collapse:collapse;font-size:.9rem}
.integration-table th,.integration-table td{padding:8px;border-bottom:1px solid #e2e8f0;text-align:left}
.status{display:inline-block;padding:2px 8px;border-radius:4px;font-size:.75rem;font-weight:600}
.status-ok{background:#dcfce7;color:#166534}
.status-test{background:#fef9c3;color:#854d0e}
.status-wip{background:#dbeafe;color:#1e40af}
.status-pending{background:#f1f5f9;color:#475569}
.config-grid{display:grid;grid-template-columns:repeat(auto-fit,minmax(240px,1fr));gap:16px}
.config-row{display:flex;align-items:center;gap:8px;padding:8px 0;border-bottom:1px solid #eee}
.pill{padding:2px 8px;border-radius:4px;font-size:.875rem;color:#fff}
.muted{color:#999}
</style>
</head>
<body>
<header><h1>SIP Wrapper</h1><p>Verbindet Telefonanlagen und SIP-Trunks mit KI-Telefonie Plattformen</p></header>
<main>
<!--live-config-->
<!--integrations-->
</main>
</body>
</html>
"#;

fn to_html<V: IntoView>(view: impl FnOnce() -> V) -> String {
    Owner::new().with(|| view().to_html())
}

#[component]
fn StatusCell(label: StatusLabel) -> impl IntoView {
    view! {
        <td>
            <span class=format!("status {}", label.class) title=label.description>{label.label}</span>
        </td>
    }
}

fn matrix(data: &IntegrationsData, rows: &[Integration]) -> AnyView {
    let body = rows
        .iter()
        .map(|p| {
            let name = if p.kind.is_empty() {
                view! { <strong>{p.name.clone()}</strong> }.into_any()
            } else {
                view! { <strong>{p.name.clone()}</strong>{format!(" {}", p.kind)} }.into_any()
            };
            view! {
                <tr>
                    <td>{name}</td>
                    <td>{p.description.clone()}</td>
                    <StatusCell label=data.label_for(&p.outbound_wrapper)/>
                    <StatusCell label=data.label_for(&p.outbound_ai)/>
                    <StatusCell label=data.label_for(&p.inbound_wrapper)/>
                    <StatusCell label=data.label_for(&p.inbound_ai)/>
                </tr>
            }
        })
        .collect_view();

    view! {
        <table class="integration-table">
            <thead>
                <tr>
                    <th>"Name"</th>
                    <th>"Beschreibung"</th>
                    <th colspan="2">"Outbound"</th>
                    <th colspan="2">"Inbound"</th>
                </tr>
                <tr style="font-size: 0.75rem; color: #666;">
                    <th></th>
                    <th></th>
                    <th>"Wrapper"</th>
                    <th>"AI"</th>
                    <th>"Wrapper"</th>
                    <th>"AI"</th>
                </tr>
            </thead>
            <tbody>{body}</tbody>
        </table>
    }
    .into_any()
}

fn legend(data: &IntegrationsData) -> Option<AnyView> {
    if data.status_labels.is_empty() {
        return None;
    }
    let items = data
        .status_labels
        .values()
        .cloned()
        .map(|l| {
            view! {
                <span class=format!("status {}", l.class)>{l.label}</span>
                " "
                <span class="muted">{l.description}</span>
                " "
            }
        })
        .collect_view();
    Some(view! { <p class="legend">{items}</p> }.into_any())
}

fn integrations(data: &IntegrationsData) -> AnyView {
    if data.is_empty() {
        return view! {
            <section id="integrations"><p style="color: #999;">"Keine Daten"</p></section>
        }
        .into_any();
    }
    let providers = (!data.providers.is_empty()).then(|| {
        view! {
            <h3>"SIP-Provider & Telefonanlagen"</h3>
            <div id="providers-table">{matrix(data, &data.providers)}</div>
        }
    });
    let ai_platforms = (!data.ai_platforms.is_empty()).then(|| {
        view! {
            <h3>"KI-Plattformen"</h3>
            <div id="ai-platforms-table">{matrix(data, &data.ai_platforms)}</div>
        }
    });

    view! {
        <section id="integrations">
            <h2>"Integrationen"</h2>
            {legend(data)}
            {providers}
            {ai_platforms}
        </section>
    }
    .into_any()
}

/// Provider and AI platform tables. An empty list omits its table.
pub fn render_integrations(data: &IntegrationsData) -> String {
    to_html(|| integrations(data))
}

fn empty(text: &'static str) -> AnyView {
    view! { <span class="muted">{text}</span> }.into_any()
}

#[component]
fn ConfigBlock(title: &'static str, id: &'static str, children: Children) -> impl IntoView {
    view! {
        <div>
            <h3>{title}</h3>
            <div id=id>{children()}</div>
        </div>
    }
}

fn pill(text: String, style: &'static str) -> AnyView {
    view! { <span class="pill" style=style>{text}</span> }.into_any()
}

fn live_config(config: &PublicConfig) -> AnyView {
    let users = if config.users.is_empty() {
        empty("Keine Benutzer")
    } else {
        config
            .users
            .iter()
            .map(|u| {
                view! {
                    <div class="config-row" style="justify-content: space-between;">
                        <code>{u.username.clone()}</code>
                        {pill(u.extension.clone(), "background: #e0f2fe; color: #0c4a6e;")}
                    </div>
                }
            })
            .collect_view()
            .into_any()
    };

    let inbound = if config.inbound_routes.is_empty() {
        empty("Keine Inbound-Routen")
    } else {
        config
            .inbound_routes
            .iter()
            .map(|r| {
                view! {
                    <div class="config-row">
                        {pill(r.gateway.clone(), "background: #10b981;")}
                        <span>"→"</span>
                        <code>{r.extension.clone()}</code>
                    </div>
                }
            })
            .collect_view()
            .into_any()
    };

    let outbound = if !config.outbound_user_routes.is_empty() {
        config
            .outbound_user_routes
            .iter()
            .map(|r| {
                view! {
                    <div class="config-row">
                        <code>{r.username.clone()}</code>
                        <span>"→"</span>
                        {pill(r.gateway.clone(), "background: #2563eb;")}
                    </div>
                }
            })
            .collect_view()
            .into_any()
    } else if !config.default_gateway.is_empty() {
        view! { <div>"Default: "{pill(config.default_gateway.clone(), "background: #2563eb;")}</div> }.into_any()
    } else {
        empty("Keine Outbound-Routen")
    };

    let gateways = if config.gateways.is_empty() {
        empty("Keine Gateways")
    } else {
        config
            .gateways
            .iter()
            .map(|g| {
                view! {
                    <div style="display: inline-block; background: #f1f5f9; padding: 4px 12px; border-radius: 20px; margin: 4px; font-size: 0.875rem;">
                        {g.name.clone()}
                    </div>
                }
            })
            .collect_view()
            .into_any()
    };

    view! {
        <section id="live-config">
            <h2>"Aktuelle Konfiguration"</h2>
            <div class="config-grid">
                <ConfigBlock title="Benutzer" id="config-users">{users}</ConfigBlock>
                <ConfigBlock title="Inbound" id="config-inbound">{inbound}</ConfigBlock>
                <ConfigBlock title="Outbound" id="config-outbound">{outbound}</ConfigBlock>
                <ConfigBlock title="Gateways" id="config-gateways">{gateways}</ConfigBlock>
            </div>
        </section>
    }
    .into_any()
}

/// Read-only snapshot of the running configuration. `None` (fetch failed)
/// renders nothing.
pub fn render_live_config(config: Option<&PublicConfig>) -> String {
    match config {
        Some(config) => to_html(|| live_config(config)),
        None => String::new(),
    }
}

/// Fill the template's placeholders. A template without a placeholder gets
/// the section appended before `</main>` (or at the end).
pub fn render_page(template: Option<&str>, data: &IntegrationsData, live: Option<&PublicConfig>) -> String {
    let template = template.unwrap_or(DEFAULT_TEMPLATE);
    let mut page = template.to_string();
    for (slot, html) in [
        (LIVE_CONFIG_SLOT, render_live_config(live)),
        (INTEGRATIONS_SLOT, render_integrations(data)),
    ] {
        if page.contains(slot) {
            page = page.replace(slot, &html);
        } else if let Some(pos) = page.rfind("</main>") {
            page.insert_str(pos, &html);
        } else {
            page.push_str(&html);
        }
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_client::types::{PublicGateway, PublicUser, UserRoute};

    #[test]
    fn matrix_headers_and_cells() {
        let html = render_integrations(&IntegrationsData::builtin());
        assert!(html.contains(r#"<th colspan="2">Outbound</th>"#));
        assert!(html.contains("<th>Beschreibung</th>"));
        assert!(html.contains("<strong>Placetel</strong> SIP Trunk"));
        assert!(html.contains("<strong>NFON</strong></td>"));
        assert!(html.contains("status status-ok"));
        assert!(html.contains(">Produktiv</span>"));
        assert!(html.contains("SIP-Provider &amp; Telefonanlagen"));
        assert!(html.contains(r#"id="ai-platforms-table""#));
    }

    #[test]
    fn no_data() {
        let html = render_integrations(&IntegrationsData::default());
        assert!(html.contains("Keine Daten"));
        assert!(!html.contains("<table"));
    }

    #[test]
    fn empty_list_omits_table() {
        let mut data = IntegrationsData::builtin();
        data.ai_platforms.clear();
        let html = render_integrations(&data);
        assert!(html.contains("providers-table"));
        assert!(!html.contains("ai-platforms-table"));
    }

    #[test]
    fn live_config_hidden_on_failure() {
        assert_eq!(render_live_config(None), "");
        let page = render_page(None, &IntegrationsData::builtin(), None);
        assert!(!page.contains("live-config"));
        assert!(!page.contains(LIVE_CONFIG_SLOT));
        assert!(page.contains("integration-table"));
    }

    #[test]
    fn live_config_sections() {
        let empty = PublicConfig::default();
        let html = render_live_config(Some(&empty));
        assert!(html.contains("Keine Benutzer"));
        assert!(html.contains("Keine Inbound-Routen"));
        assert!(html.contains("Keine Outbound-Routen"));
        assert!(html.contains("Keine Gateways"));

        let config = PublicConfig {
            users: vec![PublicUser {
                username: "alice".into(),
                extension: "101".into(),
            }],
            default_gateway: "sipgate".into(),
            gateways: vec![PublicGateway { name: "sipgate".into() }],
            ..Default::default()
        };
        let html = render_live_config(Some(&config));
        assert!(html.contains("<code>alice</code>"));
        assert!(html.contains("Default: <span"));
        assert!(html.contains(">sipgate</span>"));

        let routed = PublicConfig {
            outbound_user_routes: vec![UserRoute {
                username: "alice".into(),
                gateway: "telekom".into(),
            }],
            ..config
        };
        let html = render_live_config(Some(&routed));
        assert!(!html.contains("Default:"));
        assert!(html.contains("telekom"));
    }

    #[test]
    fn custom_template_slots() {
        let tpl = "<html><main><h1>Custom</h1><!--integrations--></main></html>";
        let page = render_page(Some(tpl), &IntegrationsData::default(), None);
        assert!(page.contains("<h1>Custom</h1>"));
        assert!(page.contains("Keine Daten"));
        assert!(!page.contains(INTEGRATIONS_SLOT));

        let bare = render_page(Some("<html><main></main></html>"), &IntegrationsData::default(), None);
        assert!(bare.contains("<main><section id=\"integrations\">"));
    }
}
