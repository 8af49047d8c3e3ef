//! Dashboard page and the fragments the poll script swaps in.

use leptos::prelude::*;
use sw_client::types::{ActiveCall, CallRecord, LogLine, SipUser};
use sw_monitor::DashboardSnapshot;

use crate::components::layout::{Layout, PageContext};
use crate::components::section::{EmptyState, ROW, Section, StatCard, TABLE_HEAD};
use crate::components::status_badge::{Badge, DirectionBadge};
use crate::i18n::{Key, Lang, t};
use crate::render;
use crate::utils::{CallResult, Tone, format_duration, parse_seconds, trim_call_time, truncate};

const LOG_PREVIEW_CHARS: usize = 120;

/// Regions that can be fetched from `/fragments/{name}` on this page.
pub const FRAGMENTS: [&str; 6] = ["stats", "users", "gateways", "active-calls", "cdr", "logs"];

/// Render one dashboard fragment by name. `None` for unknown names.
pub fn fragment(name: &str, lang: Lang, users: &[SipUser], snap: &DashboardSnapshot) -> Option<String> {
    Some(match name {
        "stats" => render(|| stats(lang, snap)),
        "users" => render(|| user_cards(lang, users, snap)),
        "gateways" => render(|| gateways(lang, snap)),
        "active-calls" => render(|| active_calls(lang, snap)),
        "cdr" => render(|| cdr_table(lang, snap)),
        "logs" => render(|| logs(snap)),
        _ => return None,
    })
}

fn stats(lang: Lang, snap: &DashboardSnapshot) -> AnyView {
    let (gw_online, gw_total, users_online, profiles) = snap
        .status
        .as_ref()
        .map(|s| {
            (
                s.gateways_online(),
                s.gateways.len(),
                s.registrations.len(),
                s.profiles_online(),
            )
        })
        .unwrap_or_default();
    let calls = snap.call_count();

    view! {
        <div class="grid grid-cols-2 md:grid-cols-4 gap-4">
            <StatCard stat="gateways" label=t(lang, Key::Gateways) value=format!("{gw_online}/{gw_total}")/>
            <StatCard stat="users" label=t(lang, Key::Users) value=users_online.to_string()/>
            <StatCard stat="profiles" label=t(lang, Key::Profiles) value=profiles.to_string()/>
            <StatCard stat="calls" label=t(lang, Key::ActiveCalls) value=calls.to_string()/>
        </div>
    }
    .into_any()
}

#[component]
fn UserCard(lang: Lang, name: String, extension: String, online: bool) -> impl IntoView {
    let (border, tone, state, footer_class, footer) = if online {
        (
            "border-green-500/50",
            Tone::Success,
            t(lang, Key::Online),
            "text-green-400",
            format!("✓ {}", t(lang, Key::Registered)),
        )
    } else {
        (
            "border-gray-700",
            Tone::Secondary,
            t(lang, Key::Offline),
            "text-gray-500",
            format!("– {}", t(lang, Key::NotRegistered)),
        )
    };

    view! {
        <div data-user=name.clone() class=format!("bg-gray-900 border {border} p-4")>
            <div class="flex items-center justify-between mb-2">
                <span class="font-medium text-white">{name.clone()}</span>
                <Badge tone=tone label=state/>
            </div>
            <p class="text-xs text-gray-400 mb-2">
                {format!("{}: ", t(lang, Key::Extension))}
                <code>{extension}</code>
            </p>
            <p class="text-xs">
                <span class=footer_class>{footer}</span>
            </p>
        </div>
    }
}

/// One card per configured user, online when a registration matches.
fn user_cards(lang: Lang, users: &[SipUser], snap: &DashboardSnapshot) -> Option<AnyView> {
    if users.is_empty() {
        return None;
    }
    let cards: Vec<_> = users
        .iter()
        .map(|u| {
            let online = snap
                .status
                .as_ref()
                .is_some_and(|s| s.is_registered(&u.username));
            view! { <UserCard lang=lang name=u.username.clone() extension=u.extension.clone() online=online/> }
        })
        .collect();

    Some(view! {
        <Section title=t(lang, Key::UserRegistrations)>
            <div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-4 gap-3">{cards}</div>
        </Section>
    }
    .into_any())
}

fn gateways(lang: Lang, snap: &DashboardSnapshot) -> Option<AnyView> {
    let status = snap.status.as_ref().filter(|s| !s.gateways.is_empty())?;
    let items: Vec<_> = status
        .gateways
        .iter()
        .map(|g| {
            let (tone, label) = if g.is_online() {
                (Tone::Success, t(lang, Key::Online))
            } else {
                (Tone::Secondary, t(lang, Key::Offline))
            };
            view! {
                <div data-gateway=g.name.clone() class="flex items-center justify-between bg-gray-900 border border-gray-700 px-4 py-3">
                    <span class="text-sm text-white">{g.name.clone()}</span>
                    <Badge tone=tone label=label/>
                </div>
            }
        })
        .collect();

    Some(view! {
        <Section title=t(lang, Key::GatewayStatus)>
            <div class="grid grid-cols-1 md:grid-cols-3 gap-3">{items}</div>
        </Section>
    }
    .into_any())
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() { placeholder } else { value }.to_string()
}

fn call_flow(call: &ActiveCall) -> AnyView {
    let (from_class, to_class) = if call.direction == "inbound" {
        ("bg-gray-700 text-gray-200", "bg-green-500/20 text-green-400")
    } else {
        ("bg-green-500/20 text-green-400", "bg-gray-700 text-gray-200")
    };
    view! {
        <div class="flex items-center gap-1 flex-wrap">
            <code class=format!("px-1 {from_class}")>{or_placeholder(&call.cid_num, "?")}</code>
            <span class="text-gray-500">"→"</span>
            <span class="text-cyan-400 text-xs">{or_placeholder(&call.name, "GW")}</span>
            <span class="text-gray-500">"→"</span>
            <code class=format!("px-1 {to_class}")>{or_placeholder(&call.dest, "?")}</code>
        </div>
    }
    .into_any()
}

/// Active calls table. Nothing when idle so the region collapses.
fn active_calls(lang: Lang, snap: &DashboardSnapshot) -> Option<AnyView> {
    let calls = snap.calls.as_ref().map(|c| c.calls.as_slice()).unwrap_or_default();
    if calls.is_empty() {
        return None;
    }
    let title = format!("{} ({})", t(lang, Key::ActiveCalls), calls.len());
    let rows: Vec<_> = calls
        .iter()
        .map(|c| {
            view! {
                <tr class=ROW>
                    <td class="py-2"><DirectionBadge direction=c.direction.clone()/></td>
                    <td class="py-2">{call_flow(c)}</td>
                    <td class="py-2"><Badge tone=Tone::Warning label=c.state.clone()/></td>
                    <td class="py-2 text-xs text-gray-500">{c.created.clone()}</td>
                </tr>
            }
        })
        .collect();

    Some(view! {
        <Section title=title>
            <table class="w-full text-sm">
                <thead>
                    <tr class=TABLE_HEAD>
                        <th class="pb-2 w-24">{t(lang, Key::Direction)}</th>
                        <th class="pb-2">{t(lang, Key::CallFlow)}</th>
                        <th class="pb-2 w-28">{t(lang, Key::Status)}</th>
                        <th class="pb-2 w-32">{t(lang, Key::Time)}</th>
                    </tr>
                </thead>
                <tbody>{rows}</tbody>
            </table>
        </Section>
    }
    .into_any())
}

fn cdr_row(call: &CallRecord) -> AnyView {
    let duration = if parse_seconds(&call.billsec) > 0 {
        view! { <span class="text-green-400">{format_duration(&call.billsec)}</span> }.into_any()
    } else {
        view! { <span class="text-gray-500">"0:00"</span> }.into_any()
    };
    let result = CallResult::from_hangup_cause(&call.hangup_cause);
    // the raw cause is only worth a hover when the call failed
    let cause = (result == CallResult::Failed).then(|| call.hangup_cause.clone());

    view! {
        <tr class=ROW>
            <td class="py-2"><DirectionBadge direction=call.direction.clone()/></td>
            <td class="py-2"><code>{call.caller_num.clone()}</code></td>
            <td class="py-2"><code>{call.dest.clone()}</code></td>
            <td class="py-2">{duration}</td>
            <td class="py-2"><Badge tone=result.tone() label=result.label() title=cause/></td>
            <td class="py-2 text-xs text-gray-500">{trim_call_time(&call.start).to_string()}</td>
        </tr>
    }
    .into_any()
}

fn cdr_table(lang: Lang, snap: &DashboardSnapshot) -> AnyView {
    let calls = snap.cdr.as_ref().map(|c| c.calls.as_slice()).unwrap_or_default();
    if calls.is_empty() {
        return view! { <EmptyState text="No calls recorded"/> }.into_any();
    }
    let rows: Vec<_> = calls.iter().map(cdr_row).collect();

    view! {
        <table class="w-full text-sm">
            <thead>
                <tr class=TABLE_HEAD>
                    <th class="pb-2 w-24">{t(lang, Key::Direction)}</th>
                    <th class="pb-2">{t(lang, Key::From)}</th>
                    <th class="pb-2">{t(lang, Key::To)}</th>
                    <th class="pb-2 w-20">{t(lang, Key::Duration)}</th>
                    <th class="pb-2 w-24">{t(lang, Key::Result)}</th>
                    <th class="pb-2 w-40">{t(lang, Key::Time)}</th>
                </tr>
            </thead>
            <tbody>{rows}</tbody>
        </table>
    }
    .into_any()
}

fn log_line(line: &LogLine) -> AnyView {
    let class = match line.level.as_str() {
        "error" => "bg-red-500/10 text-red-400",
        "warning" => "bg-yellow-500/10 text-yellow-300",
        "debug" => "text-gray-500",
        _ => "text-gray-300",
    };
    view! {
        <div class=format!("px-2 py-1 border-b border-gray-700/50 {class}")>
            {truncate(&line.text, LOG_PREVIEW_CHARS)}
        </div>
    }
    .into_any()
}

fn logs(snap: &DashboardSnapshot) -> AnyView {
    let logs = snap.logs.as_ref().map(|l| l.logs.as_slice()).unwrap_or_default();
    if logs.is_empty() {
        return view! { <div class="p-2 text-center text-gray-500 text-xs">"No logs"</div> }.into_any();
    }
    let lines: Vec<_> = logs.iter().map(log_line).collect();
    view! { <div class="font-mono text-xs">{lines}</div> }.into_any()
}

/// Warning shown above the stats when the backend cannot reach the PBX.
fn status_banner(lang: Lang, snap: &DashboardSnapshot) -> Option<AnyView> {
    if snap.session_expired {
        return Some(
            view! {
                <div class="mx-6 mt-4 px-4 py-3 bg-yellow-500/20 border border-yellow-500/50 text-yellow-300 text-sm">
                    "Session expired. "
                    <a href="/login" class="underline">"Login"</a>
                </div>
            }
            .into_any(),
        );
    }
    let status = snap.status.as_ref()?;
    let text = match status.error.as_deref().filter(|e| !e.is_empty()) {
        Some(err) => format!("{}: {}", t(lang, Key::ConnectionError), err),
        None if !status.fs_access => t(lang, Key::ConnectionError).to_string(),
        None => return None,
    };
    Some(
        view! {
            <div class="mx-6 mt-4 px-4 py-3 bg-red-500/20 border border-red-500/50 text-red-300 text-sm">{text}</div>
        }
        .into_any(),
    )
}

#[component]
fn Region(name: &'static str, children: Children) -> impl IntoView {
    view! { <div data-fragment=name>{children()}</div> }
}

pub fn render_dashboard(ctx: &PageContext, users: &[SipUser], snap: &DashboardSnapshot) -> String {
    let lang = ctx.lang;
    let ctx = ctx.clone();
    render(|| {
        let banner = status_banner(lang, snap);
        let stats = stats(lang, snap);
        let calls = active_calls(lang, snap);
        let cards = user_cards(lang, users, snap);
        let gateways = gateways(lang, snap);
        let cdr = cdr_table(lang, snap);
        let logs = logs(snap);

        view! {
            <Layout ctx=ctx title=t(lang, Key::Dashboard)>
                {banner}
                <div class="mx-6 my-4">
                    <Region name="stats">{stats}</Region>
                </div>
                <Region name="active-calls">{calls}</Region>
                <Region name="users">{cards}</Region>
                <Region name="gateways">{gateways}</Region>
                <Section title=t(lang, Key::CallLogs)>
                    <Region name="cdr">{cdr}</Region>
                </Section>
                <Section title=t(lang, Key::Logs)>
                    <Region name="logs">{logs}</Region>
                </Section>
            </Layout>
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_client::types::{
        ActiveCalls, CdrList, GatewayStatus, LogList, ProfileStatus, Registration, SystemStatus,
    };
    use sw_common::prefs::RefreshInterval;

    use crate::components::layout::Nav;

    fn html(name: &str, lang: Lang, users: &[SipUser], snap: &DashboardSnapshot) -> String {
        fragment(name, lang, users, snap).unwrap()
    }

    fn user(name: &str) -> SipUser {
        serde_json::from_value(serde_json::json!({"username": name, "extension": "100"})).unwrap()
    }

    fn snapshot() -> DashboardSnapshot {
        DashboardSnapshot {
            status: Some(SystemStatus {
                profiles: vec![ProfileStatus {
                    name: "internal".into(),
                    status: "online".into(),
                }],
                gateways: vec![
                    GatewayStatus {
                        name: "sipgate".into(),
                        status: "online".into(),
                        registered: true,
                    },
                    GatewayStatus {
                        name: "telekom".into(),
                        status: "offline".into(),
                        registered: false,
                    },
                ],
                registrations: vec![Registration {
                    user: "alice@pbx.local".into(),
                    ..Default::default()
                }],
                fs_access: true,
                error: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn stats_counts() {
        let html = html("stats", Lang::En, &[], &snapshot());
        assert!(html.contains(r#"data-stat="gateways">1/2<"#));
        assert!(html.contains(r#"data-stat="users">1<"#));
        assert!(html.contains(r#"data-stat="profiles">1<"#));
        assert!(html.contains(r#"data-stat="calls">0<"#));
    }

    #[test]
    fn user_cards_follow_registrations() {
        let html = html("users", Lang::De, &[user("alice"), user("bob")], &snapshot());
        let alice = html.split(r#"data-user="alice""#).nth(1).unwrap();
        let alice = alice.split("data-user=").next().unwrap();
        assert!(alice.contains("Registriert"));
        let bob = html.split(r#"data-user="bob""#).nth(1).unwrap();
        assert!(bob.contains("Nicht registriert"));
        assert!(bob.contains("Offline"));
    }

    #[test]
    fn active_calls_hidden_when_idle() {
        assert!(!html("active-calls", Lang::En, &[], &snapshot()).contains("<table"));
        let mut snap = snapshot();
        snap.calls = Some(ActiveCalls {
            calls: vec![ActiveCall {
                direction: "inbound".into(),
                cid_num: "+4930123".into(),
                state: "CS_EXECUTE".into(),
                ..Default::default()
            }],
            count: 1,
            error: None,
        });
        let html = html("active-calls", Lang::En, &[], &snap);
        assert!(html.contains("Active Calls (1)"));
        assert!(html.contains("+4930123"));
        assert!(html.contains(">GW<"));
        assert!(html.contains(">?<"));
        assert!(html.contains(">In<"));
    }

    #[test]
    fn cdr_rows() {
        let mut snap = snapshot();
        assert!(html("cdr", Lang::En, &[], &snap).contains("No calls recorded"));

        snap.cdr = Some(CdrList {
            calls: vec![
                CallRecord {
                    caller_num: "100".into(),
                    dest: "0301234".into(),
                    billsec: "125".into(),
                    hangup_cause: "NORMAL_CLEARING".into(),
                    start: "Fri 2025-01-31 14:05:09".into(),
                    direction: "outbound".into(),
                    ..Default::default()
                },
                CallRecord {
                    billsec: "0".into(),
                    hangup_cause: "CALL_REJECTED".into(),
                    ..Default::default()
                },
            ],
            count: 2,
        });
        let html = html("cdr", Lang::En, &[], &snap);
        assert!(html.contains(r#"<span class="text-green-400">2:05</span>"#));
        assert!(html.contains(r#"<span class="text-gray-500">0:00</span>"#));
        assert!(html.contains(">OK<"));
        assert!(html.contains(r#"title="CALL_REJECTED""#));
        assert!(html.contains(">Failed</span>"));
        assert_eq!(html.matches("title=").count(), 1);
        assert!(html.contains(">2025-01-31 14:05:09<"));
    }

    #[test]
    fn log_preview() {
        let mut snap = snapshot();
        assert!(html("logs", Lang::En, &[], &snap).contains("No logs"));
        snap.logs = Some(LogList {
            logs: vec![LogLine {
                text: "e".repeat(150),
                level: "error".into(),
            }],
            count: 1,
        });
        let html = html("logs", Lang::En, &[], &snap);
        assert!(html.contains(&format!("{}...", "e".repeat(120))));
        assert!(!html.contains(&"e".repeat(121)));
        assert!(html.contains("text-red-400"));
    }

    #[test]
    fn banner_on_backend_error() {
        let banner = |snap: &DashboardSnapshot| render(|| status_banner(Lang::En, snap));
        let mut snap = snapshot();
        assert!(status_banner(Lang::En, &snap).is_none());
        snap.status.as_mut().unwrap().error = Some("ESL refused".into());
        assert!(banner(&snap).contains("Connection error to FreeSWITCH: ESL refused"));
        snap.session_expired = true;
        assert!(banner(&snap).contains("Session expired"));
    }

    #[test]
    fn page_declares_fragments() {
        let ctx = PageContext::new(Lang::En, Nav::Dashboard, RefreshInterval::from_millis(5000).unwrap());
        let html = render_dashboard(&ctx, &[user("alice")], &snapshot());
        for name in FRAGMENTS {
            assert!(html.contains(&format!(r#"data-fragment="{name}""#)), "{name}");
        }
        assert!(fragment("bogus", Lang::En, &[], &snapshot()).is_none());
    }
}
