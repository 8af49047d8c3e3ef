use leptos::prelude::*;
use sw_client::types::{
    AutoBlacklistSettings, BlacklistEntry, Fail2banInfo, FailedAttempt, FailedAttempts, SecurityOverview,
    WhitelistEntry,
};

use crate::components::layout::{Layout, PageContext};
use crate::components::modal::{Confirm, ConfirmModal, FormButtons, Modal};
use crate::components::section::{
    BUTTON_PRIMARY, BUTTON_SECONDARY, EmptyState, INPUT, LABEL, ROW, Section, SectionWithActions, TABLE_HEAD,
};
use crate::components::status_badge::Badge;
use crate::html::href;
use crate::i18n::{Key, t};
use crate::render;
use crate::utils::{Fail2banState, Severity, Tone, attempt_percent, blocked_count_tone};

/// Comment attached to IPs blocked from the failed-attempts table.
pub const QUICK_BLOCK_COMMENT: &str = "Manually blocked from monitor";

/// Submits the whitelist toggle as soon as it changes.
const WHITELIST_SCRIPT: &str = r#"
(function(){
  var toggle = document.getElementById('whitelist-mode');
  if (toggle) { toggle.addEventListener('change', function(){ toggle.form.submit(); }); }
})();
"#;

#[derive(Debug, Clone, Default)]
pub struct SecurityData {
    pub overview: SecurityOverview,
    pub auto: AutoBlacklistSettings,
    pub attempts: FailedAttempts,
    pub fail2ban: Fail2banInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityModal {
    AddBlacklist,
    AddWhitelist,
    RemoveBlacklist(String),
    RemoveWhitelist(String),
    Ban(String),
    Unban(String),
    Block(String),
    ResetCount(String),
}

impl SecurityModal {
    /// `?action=<name>&ip=<addr>`.
    pub fn from_query(action: Option<&str>, ip: Option<&str>) -> Option<Self> {
        let ip = ip.map(str::trim).filter(|ip| !ip.is_empty()).map(str::to_string);
        match (action?, ip) {
            ("add-blacklist", _) => Some(SecurityModal::AddBlacklist),
            ("add-whitelist", _) => Some(SecurityModal::AddWhitelist),
            ("remove-blacklist", Some(ip)) => Some(SecurityModal::RemoveBlacklist(ip)),
            ("remove-whitelist", Some(ip)) => Some(SecurityModal::RemoveWhitelist(ip)),
            ("ban", Some(ip)) => Some(SecurityModal::Ban(ip)),
            ("unban", Some(ip)) => Some(SecurityModal::Unban(ip)),
            ("block", Some(ip)) => Some(SecurityModal::Block(ip)),
            ("reset-count", Some(ip)) => Some(SecurityModal::ResetCount(ip)),
            _ => None,
        }
    }
}

fn link(action: &str, ip: &str) -> String {
    href("/security", &[("action", action), ("ip", ip)])
}

fn comment_line(comment: &str) -> Option<AnyView> {
    (!comment.is_empty()).then(|| {
        let comment = comment.to_string();
        view! { <small class="block text-xs text-gray-500">{comment}</small> }.into_any()
    })
}

fn blacklist_row(entry: &BlacklistEntry) -> AnyView {
    let count = entry.blocked_count.unwrap_or(1);
    let status = if entry.fail2ban_banned {
        view! { <Badge tone=Tone::Danger label="Fail2Ban"/> }.into_any()
    } else {
        view! { <Badge tone=Tone::Info label="ACL only"/> }.into_any()
    };
    let f2b_action = if entry.fail2ban_banned {
        view! {
            <a href=link("unban", &entry.ip) class="text-yellow-400 hover:text-yellow-300 text-xs mr-3" title="Remove from Fail2Ban">
                "Unban"
            </a>
        }
        .into_any()
    } else {
        view! {
            <a href=link("ban", &entry.ip) class="text-gray-300 hover:text-white text-xs mr-3" title="Add to Fail2Ban">
                "Ban"
            </a>
        }
        .into_any()
    };

    view! {
        <tr class=ROW>
            <td class="py-2">
                <code class="text-red-400">{entry.ip.clone()}</code>
                {comment_line(&entry.comment)}
            </td>
            <td class="py-2"><Badge tone=blocked_count_tone(entry.blocked_count) label=format!("{count}x")/></td>
            <td class="py-2">{status}</td>
            <td class="py-2 text-right">
                {f2b_action}
                <a href=link("reset-count", &entry.ip) class="text-gray-400 hover:text-white text-xs mr-3" title="Reset count">"Reset"</a>
                <a href=link("remove-blacklist", &entry.ip) class="text-red-400 hover:text-red-300 text-xs" title="Remove">"Remove"</a>
            </td>
        </tr>
    }
    .into_any()
}

fn add_link(action: &str) -> AnyView {
    view! { <a href=href("/security", &[("action", action)]) class=BUTTON_PRIMARY>"Add"</a> }.into_any()
}

fn blacklist_section(list: &[BlacklistEntry]) -> AnyView {
    let body = if list.is_empty() {
        view! { <EmptyState text="No blocked IPs"/> }.into_any()
    } else {
        let rows = list.iter().map(blacklist_row).collect_view();
        view! {
            <table class="w-full text-sm">
                <thead>
                    <tr class=TABLE_HEAD>
                        <th class="pb-2">"IP"</th>
                        <th class="pb-2">"Blocked"</th>
                        <th class="pb-2">"Status"</th>
                        <th class="pb-2"></th>
                    </tr>
                </thead>
                <tbody>{rows}</tbody>
            </table>
        }
        .into_any()
    };

    view! {
        <SectionWithActions title="Blacklist" actions=add_link("add-blacklist")>
            {body}
        </SectionWithActions>
    }
    .into_any()
}

fn whitelist_row(entry: &WhitelistEntry) -> AnyView {
    view! {
        <tr class=ROW>
            <td class="py-2">
                <code class="text-green-400">{entry.ip.clone()}</code>
                {comment_line(&entry.comment)}
            </td>
            <td class="py-2 text-right">
                <a href=link("remove-whitelist", &entry.ip) class="text-red-400 hover:text-red-300 text-xs" title="Remove">"Remove"</a>
            </td>
        </tr>
    }
    .into_any()
}

fn whitelist_section(overview: &SecurityOverview) -> AnyView {
    let list = if overview.whitelist.is_empty() {
        view! { <EmptyState text="No allowed IPs"/> }.into_any()
    } else {
        let rows = overview.whitelist.iter().map(whitelist_row).collect_view();
        view! { <table class="w-full text-sm"><tbody>{rows}</tbody></table> }.into_any()
    };
    let whitelist_enabled = overview.whitelist_enabled;

    view! {
        <SectionWithActions title="Whitelist" actions=add_link("add-whitelist")>
            <form method="post" action="/security/whitelist-mode" class="flex items-center gap-2 mb-4">
                <input type="hidden" name="submitted" value="1"/>
                <label class="flex items-center gap-2 text-sm text-gray-300">
                    <input type="checkbox" id="whitelist-mode" name="enabled" value="on" checked=whitelist_enabled/>
                    "Whitelist mode (only allowed IPs may register)"
                </label>
            </form>
            {list}
        </SectionWithActions>
    }
    .into_any()
}

fn number_field(label: &'static str, name: &'static str, value: u64) -> AnyView {
    view! {
        <div>
            <label class=LABEL>{label}</label>
            <input type="number" min="1" name=name value=value.to_string() class=INPUT/>
        </div>
    }
    .into_any()
}

fn enabled_checkbox(label: &'static str, on: bool) -> AnyView {
    view! {
        <label class="flex items-center gap-2 text-sm text-gray-300">
            <input type="checkbox" name="enabled" value="on" checked=on/>
            {label}
        </label>
    }
    .into_any()
}

fn auto_blacklist_section(auto: &AutoBlacklistSettings) -> AnyView {
    let enabled = enabled_checkbox("Enabled", auto.enabled);
    let fields = vec![
        number_field("Max attempts", "max_attempts", u64::from(auto.max_attempts)),
        number_field("Time window (s)", "time_window", auto.time_window),
        number_field("Block duration (s)", "block_duration", auto.block_duration),
    ];

    view! {
        <Section title="Auto-Blacklist">
            <form method="post" action="/security/auto-blacklist" class="space-y-4">
                {enabled}
                <div class="grid grid-cols-1 md:grid-cols-3 gap-4">{fields}</div>
                <button type="submit" class=BUTTON_PRIMARY>"Save"</button>
            </form>
            <form method="post" action="/security/check-blacklist" class="mt-3">
                <button type="submit" class=BUTTON_SECONDARY>"Check now"</button>
            </form>
        </Section>
    }
    .into_any()
}

fn attempt_row(attempt: &FailedAttempt, max_attempts: u32) -> AnyView {
    let severity = Severity::classify(attempt.count, max_attempts);
    let max = if max_attempts == 0 { 10 } else { max_attempts };
    let text = match severity {
        Severity::Critical => "text-red-400 font-semibold",
        Severity::Warning => "text-yellow-400",
        Severity::Monitoring => "text-gray-300",
    };
    let width = format!("width: {}%", attempt_percent(attempt.count, max_attempts));

    view! {
        <tr class=ROW>
            <td class="py-2"><code class=text>{attempt.ip.clone()}</code></td>
            <td class="py-2">
                <div class="flex items-center gap-2">
                    <div class="w-16 h-1.5 bg-gray-700">
                        <div class=format!("h-1.5 {}", severity.bar_class()) style=width></div>
                    </div>
                    <small class=text>{format!("{}/{max}", attempt.count)}</small>
                </div>
            </td>
            <td class="py-2"><Badge tone=severity.tone() label=severity.label()/></td>
            <td class="py-2 text-right">
                <a href=link("block", &attempt.ip) class="text-red-400 hover:text-red-300 text-xs" title="Block immediately">"Block"</a>
            </td>
        </tr>
    }
    .into_any()
}

fn failed_attempts(data: &FailedAttempts, fallback_max: u32) -> AnyView {
    let max = data
        .settings
        .as_ref()
        .map(|s| s.max_attempts)
        .unwrap_or(fallback_max);
    let notice = (!data.auto_blocked.is_empty()).then(|| {
        view! {
            <div class="mb-3 px-3 py-2 bg-green-500/20 border border-green-500/50 text-green-300 text-sm">
                {format!("{} IP(s) have been blocked", data.auto_blocked.len())}
            </div>
        }
    });
    if data.attempts.is_empty() {
        return view! { {notice} <EmptyState text="No suspicious activity detected"/> }.into_any();
    }
    let rows = data.attempts.iter().map(|a| attempt_row(a, max)).collect_view();

    view! {
        {notice}
        <table class="w-full text-sm">
            <thead>
                <tr class=TABLE_HEAD>
                    <th class="pb-2">"IP Address"</th>
                    <th class="pb-2">"Attempts"</th>
                    <th class="pb-2">"Status"</th>
                    <th class="pb-2"></th>
                </tr>
            </thead>
            <tbody>{rows}</tbody>
        </table>
    }
    .into_any()
}

/// Failed-attempts region, refreshed on the shared interval. `max_attempts`
/// comes from the response's own settings when present.
pub fn failed_attempts_fragment(data: &FailedAttempts, fallback_max: u32) -> String {
    render(|| failed_attempts(data, fallback_max))
}

fn fail2ban_section(info: &Fail2banInfo) -> AnyView {
    let state = Fail2banState::from_status(info.status.as_ref());
    let (status, hint) = match &state {
        Fail2banState::Error(e) => (
            view! { <Badge tone=state.tone() label="Error" title=Some(e.clone())/> }.into_any(),
            Some(view! { <small class="block mt-1 text-red-400">{e.clone()}</small> }.into_any()),
        ),
        Fail2banState::JailMissing => (
            view! { <Badge tone=state.tone() label=state.label()/> }.into_any(),
            Some(view! { <small class="block mt-1 text-gray-500">"Create the jail in Fail2Ban config"</small> }.into_any()),
        ),
        _ => (view! { <Badge tone=state.tone() label=state.label()/> }.into_any(), None),
    };
    let s = &info.settings;
    let enabled = enabled_checkbox("Ban blacklisted IPs in Fail2Ban", s.enabled);
    let threshold = number_field("Threshold (blocked count)", "threshold", u64::from(s.threshold));
    let jail = s.jail_name.clone();

    view! {
        <Section title="Fail2Ban">
            <div id="fail2ban-status" class="mb-4">{status}{hint}</div>
            <form method="post" action="/security/fail2ban" class="space-y-4">
                {enabled}
                <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                    {threshold}
                    <div>
                        <label class=LABEL>"Jail"</label>
                        <input name="jail_name" value=jail class=INPUT/>
                    </div>
                </div>
                <button type="submit" class=BUTTON_PRIMARY>"Save"</button>
            </form>
        </Section>
    }
    .into_any()
}

fn add_form(title: &'static str, action: &'static str) -> AnyView {
    view! {
        <Modal title=title close_href="/security">
            <form method="post" action=action class="space-y-4">
                <div>
                    <label class=LABEL>"IP"</label>
                    <input name="ip" placeholder="192.0.2.10" class=INPUT/>
                </div>
                <div>
                    <label class=LABEL>"Comment"</label>
                    <input name="comment" class=INPUT/>
                </div>
                <FormButtons cancel_href="/security" submit_label="Add"/>
            </form>
        </Modal>
    }
    .into_any()
}

fn confirm(title: &str, message: String, action: &str, ip: &str, label: &str, danger: bool) -> AnyView {
    let confirm = Confirm {
        title: title.to_string(),
        message,
        action: action.to_string(),
        hidden: vec![("ip", ip.to_string())],
        confirm_label: label.to_string(),
        cancel_href: "/security".to_string(),
        danger,
    };
    view! { <ConfirmModal confirm=confirm/> }.into_any()
}

fn modal_view(modal: &SecurityModal) -> AnyView {
    match modal {
        SecurityModal::AddBlacklist => add_form("Add to Blacklist", "/security/blacklist"),
        SecurityModal::AddWhitelist => add_form("Add to Whitelist", "/security/whitelist"),
        SecurityModal::RemoveBlacklist(ip) => confirm(
            "Remove from Blacklist",
            format!("Remove {ip} from blacklist?"),
            "/security/blacklist/remove",
            ip,
            "Remove",
            true,
        ),
        SecurityModal::RemoveWhitelist(ip) => confirm(
            "Remove from Whitelist",
            format!("Remove {ip} from whitelist?"),
            "/security/whitelist/remove",
            ip,
            "Remove",
            true,
        ),
        SecurityModal::Ban(ip) => confirm(
            "Fail2Ban",
            format!("Add IP {ip} to Fail2Ban (firewall block)?"),
            "/security/fail2ban/ban",
            ip,
            "Ban",
            true,
        ),
        SecurityModal::Unban(ip) => confirm(
            "Fail2Ban",
            format!("Remove IP {ip} from Fail2Ban?"),
            "/security/fail2ban/unban",
            ip,
            "Unban",
            false,
        ),
        SecurityModal::Block(ip) => confirm(
            "Block IP",
            format!("Block IP {ip} immediately?"),
            "/security/quick-block",
            ip,
            "Block",
            true,
        ),
        SecurityModal::ResetCount(ip) => confirm(
            "Reset Count",
            format!("Reset blocked count for {ip}?"),
            "/security/blacklist/reset-count",
            ip,
            "Reset",
            false,
        ),
    }
}

pub fn render_security(ctx: &PageContext, data: &SecurityData, modal: Option<&SecurityModal>) -> String {
    let ctx = ctx.clone();
    render(|| {
        let blacklist = blacklist_section(&data.overview.blacklist);
        let whitelist = whitelist_section(&data.overview);
        let auto = auto_blacklist_section(&data.auto);
        let attempts = failed_attempts(&data.attempts, data.auto.max_attempts);
        let fail2ban = fail2ban_section(&data.fail2ban);
        let overlay = modal.map(modal_view);
        let title = t(ctx.lang, Key::Security);

        view! {
            <Layout ctx=ctx title=title>
                <div class="grid grid-cols-1 lg:grid-cols-2">{blacklist}{whitelist}</div>
                {auto}
                <Section title="Failed Attempts">
                    <div data-fragment="failed-attempts">{attempts}</div>
                </Section>
                {fail2ban}
                {overlay}
                <script>{WHITELIST_SCRIPT}</script>
            </Layout>
        }
    })
}
