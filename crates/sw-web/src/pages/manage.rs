//! Configuration page: CRUD tables, their modals and the config tools.

use leptos::prelude::*;
use sw_client::types::{AclUser, Defaults, Gateway, License, Routes, Settings, SipUser};

use crate::components::layout::{Layout, PageContext};
use crate::components::modal::{Confirm, ConfirmModal, FormButtons, Modal};
use crate::components::section::{
    BUTTON_PRIMARY, BUTTON_SECONDARY, INPUT, LABEL, ROW, Section, SectionWithActions, TABLE_HEAD,
};
use crate::components::status_badge::Badge;
use crate::html::href;
use crate::i18n::{Key, Lang, t};
use crate::render;
use crate::utils::Tone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManageTab {
    #[default]
    Users,
    AclUsers,
    Gateways,
    Routes,
    Settings,
    Config,
}

impl ManageTab {
    pub const ALL: [ManageTab; 6] = [
        ManageTab::Users,
        ManageTab::AclUsers,
        ManageTab::Gateways,
        ManageTab::Routes,
        ManageTab::Settings,
        ManageTab::Config,
    ];

    pub fn parse(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.slug() == slug)
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ManageTab::Users => "users",
            ManageTab::AclUsers => "acl-users",
            ManageTab::Gateways => "gateways",
            ManageTab::Routes => "routes",
            ManageTab::Settings => "settings",
            ManageTab::Config => "config",
        }
    }

    fn label(&self, lang: Lang) -> &'static str {
        match self {
            ManageTab::Users => t(lang, Key::Users),
            ManageTab::AclUsers => t(lang, Key::AclUsers),
            ManageTab::Gateways => t(lang, Key::Gateways),
            ManageTab::Routes => t(lang, Key::Routing),
            ManageTab::Settings => t(lang, Key::Settings),
            ManageTab::Config => "Import / Export",
        }
    }

    /// Page link for this tab with extra query parameters.
    pub fn link(&self, extra: &[(&str, &str)]) -> String {
        let mut params = vec![("tab", self.slug())];
        params.extend_from_slice(extra);
        href("/manage", &params)
    }
}

/// Overlay selected by the page query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageModal {
    AddUser,
    EditUser(String),
    DeleteUser(String),
    AddAclUser,
    EditAclUser(String),
    DeleteAclUser(String),
    AddGateway,
    EditGateway(String),
    DeleteGateway(String),
    AddInboundRoute,
    DeleteInboundRoute(String),
    AddUserRoute,
    DeleteUserRoute(String),
    ConfirmApply,
    ConfirmImportEnv,
}

impl ManageModal {
    /// `?action=add`, `?edit=<key>` and `?delete=<key>` relative to the tab.
    /// The routes tab names its targets with `action=add-inbound`,
    /// `add-user-route`, `delete-inbound` and `delete-user-route`.
    pub fn from_query(
        tab: ManageTab,
        action: Option<&str>,
        edit: Option<&str>,
        delete: Option<&str>,
    ) -> Option<Self> {
        let key = |k: Option<&str>| k.filter(|k| !k.is_empty()).map(str::to_string);
        match action.unwrap_or_default() {
            "apply" => return Some(ManageModal::ConfirmApply),
            "import-env" => return Some(ManageModal::ConfirmImportEnv),
            _ => {}
        }
        match tab {
            ManageTab::Users => match (action, key(edit), key(delete)) {
                (Some("add"), _, _) => Some(ManageModal::AddUser),
                (_, Some(k), _) => Some(ManageModal::EditUser(k)),
                (_, _, Some(k)) => Some(ManageModal::DeleteUser(k)),
                _ => None,
            },
            ManageTab::AclUsers => match (action, key(edit), key(delete)) {
                (Some("add"), _, _) => Some(ManageModal::AddAclUser),
                (_, Some(k), _) => Some(ManageModal::EditAclUser(k)),
                (_, _, Some(k)) => Some(ManageModal::DeleteAclUser(k)),
                _ => None,
            },
            ManageTab::Gateways => match (action, key(edit), key(delete)) {
                (Some("add"), _, _) => Some(ManageModal::AddGateway),
                (_, Some(k), _) => Some(ManageModal::EditGateway(k)),
                (_, _, Some(k)) => Some(ManageModal::DeleteGateway(k)),
                _ => None,
            },
            ManageTab::Routes => match (action, key(delete)) {
                (Some("add-inbound"), _) => Some(ManageModal::AddInboundRoute),
                (Some("add-user-route"), _) => Some(ManageModal::AddUserRoute),
                (Some("delete-inbound"), Some(k)) => Some(ManageModal::DeleteInboundRoute(k)),
                (Some("delete-user-route"), Some(k)) => Some(ManageModal::DeleteUserRoute(k)),
                _ => None,
            },
            ManageTab::Settings | ManageTab::Config => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ManageData {
    pub users: Vec<SipUser>,
    pub acl_users: Vec<AclUser>,
    pub gateways: Vec<Gateway>,
    pub routes: Routes,
    pub settings: Settings,
    pub license: License,
    pub defaults: Defaults,
}

#[derive(Debug, Clone, Default)]
pub struct ManageView {
    pub tab: ManageTab,
    pub modal: Option<ManageModal>,
}

#[component]
fn ActionLinks(tab: ManageTab, key: String) -> impl IntoView {
    view! {
        <a href=tab.link(&[("edit", key.as_str())]) class="text-blue-400 hover:text-blue-300 text-xs mr-3">"Edit"</a>
        <a href=tab.link(&[("delete", key.as_str())]) class="text-red-400 hover:text-red-300 text-xs">"Delete"</a>
    }
}

#[component]
fn EnabledBadge(enabled: bool) -> impl IntoView {
    if enabled {
        view! { <Badge tone=Tone::Success label="Enabled"/> }.into_any()
    } else {
        view! { <Badge tone=Tone::Secondary label="Disabled"/> }.into_any()
    }
}

fn dash(value: &str) -> String {
    if value.is_empty() { "-" } else { value }.to_string()
}

/// Table with a header row; `empty` spans the whole row when there are no rows.
fn table(headers: Vec<&'static str>, rows: Vec<AnyView>, empty: &'static str) -> AnyView {
    let colspan = headers.len().to_string();
    let body = if rows.is_empty() {
        view! {
            <tr>
                <td colspan=colspan class="py-4 text-center text-gray-500">{empty}</td>
            </tr>
        }
        .into_any()
    } else {
        rows.into_any()
    };

    view! {
        <table class="w-full text-sm">
            <thead>
                <tr class=TABLE_HEAD>
                    {headers.into_iter().map(|h| view! { <th class="pb-2">{h}</th> }).collect_view()}
                </tr>
            </thead>
            <tbody>{body}</tbody>
        </table>
    }
    .into_any()
}

fn add_button(tab: ManageTab, action: &str, label: &'static str) -> AnyView {
    view! { <a href=tab.link(&[("action", action)]) class=BUTTON_PRIMARY>{label}</a> }.into_any()
}

fn users_tab(lang: Lang, users: &[SipUser]) -> AnyView {
    let rows = users
        .iter()
        .map(|u| {
            view! {
                <tr class=ROW>
                    <td class="py-2 font-semibold">{u.username.clone()}</td>
                    <td class="py-2"><Badge tone=Tone::Primary label=u.extension.clone()/></td>
                    <td class="py-2"><EnabledBadge enabled=u.enabled/></td>
                    <td class="py-2 text-right"><ActionLinks tab=ManageTab::Users key=u.username.clone()/></td>
                </tr>
            }
            .into_any()
        })
        .collect();
    let table = table(
        vec![t(lang, Key::Username), t(lang, Key::Extension), t(lang, Key::Status), ""],
        rows,
        "No users configured",
    );

    view! {
        <SectionWithActions title=t(lang, Key::Users) actions=add_button(ManageTab::Users, "add", "Add User")>
            {table}
        </SectionWithActions>
    }
    .into_any()
}

fn acl_users_tab(lang: Lang, acl_users: &[AclUser]) -> AnyView {
    let rows = acl_users
        .iter()
        .map(|u| {
            view! {
                <tr class=ROW>
                    <td class="py-2 font-semibold">{u.username.clone()}</td>
                    <td class="py-2"><code>{u.ip_address.clone()}</code></td>
                    <td class="py-2"><Badge tone=Tone::Primary label=dash(&u.extension)/></td>
                    <td class="py-2">{dash(&u.caller_id)}</td>
                    <td class="py-2 text-right"><ActionLinks tab=ManageTab::AclUsers key=u.username.clone()/></td>
                </tr>
            }
            .into_any()
        })
        .collect();
    let table = table(
        vec![
            t(lang, Key::Username),
            t(lang, Key::IpAddress),
            t(lang, Key::Extension),
            "Caller ID",
            "",
        ],
        rows,
        "No ACL users configured",
    );

    view! {
        <SectionWithActions title=t(lang, Key::AclUsers) actions=add_button(ManageTab::AclUsers, "add", "Add ACL User")>
            {table}
        </SectionWithActions>
    }
    .into_any()
}

fn gateways_tab(lang: Lang, gateways: &[Gateway]) -> AnyView {
    let rows = gateways
        .iter()
        .map(|g| {
            let register = if g.register {
                view! { <span class="text-green-400">"✓"</span> }.into_any()
            } else {
                view! { <span class="text-gray-500">"–"</span> }.into_any()
            };
            view! {
                <tr class=ROW>
                    <td class="py-2 font-semibold">{g.name.clone()}</td>
                    <td class="py-2">{g.host.clone()}</td>
                    <td class="py-2">{g.port.to_string()}</td>
                    <td class="py-2">{dash(&g.username)}</td>
                    <td class="py-2">{register}</td>
                    <td class="py-2"><EnabledBadge enabled=g.enabled/></td>
                    <td class="py-2 text-right"><ActionLinks tab=ManageTab::Gateways key=g.name.clone()/></td>
                </tr>
            }
            .into_any()
        })
        .collect();
    let table = table(
        vec!["Name", "Host", "Port", t(lang, Key::Username), "Register", t(lang, Key::Status), ""],
        rows,
        "No gateways configured",
    );

    view! {
        <SectionWithActions title=t(lang, Key::Gateways) actions=add_button(ManageTab::Gateways, "add", "Add Gateway")>
            {table}
        </SectionWithActions>
    }
    .into_any()
}

/// `-- Select --` followed by every gateway, preselecting `current`.
fn gateway_options(gateways: &[Gateway], current: &str) -> AnyView {
    let options = gateways
        .iter()
        .map(|g| {
            view! { <option value=g.name.clone() selected={g.name == current}>{g.name.clone()}</option> }
        })
        .collect_view();
    view! {
        <option value="" selected={current.is_empty()}>"-- Select --"</option>
        {options}
    }
    .into_any()
}

/// SIP users first, then ACL users.
fn user_options(users: &[SipUser], acl_users: &[AclUser]) -> AnyView {
    users
        .iter()
        .map(|u| u.username.clone())
        .chain(acl_users.iter().map(|u| u.username.clone()))
        .map(|name| view! { <option value=name.clone()>{name.clone()}</option> })
        .collect_view()
        .into_any()
}

fn routes_tab(lang: Lang, data: &ManageData) -> AnyView {
    let routes = &data.routes;

    let inbound_rows = routes
        .inbound
        .iter()
        .map(|r| {
            let tone = if r.destination_type == "gateway" { Tone::Warning } else { Tone::Info };
            let delete = ManageTab::Routes.link(&[("action", "delete-inbound"), ("delete", r.did.as_str())]);
            view! {
                <tr class=ROW>
                    <td class="py-2"><code>{r.did.clone()}</code></td>
                    <td class="py-2 font-semibold">{r.destination.clone()}</td>
                    <td class="py-2"><Badge tone=tone label=r.destination_type.clone()/></td>
                    <td class="py-2 text-right">
                        <a href=delete class="text-red-400 hover:text-red-300 text-xs">"Delete"</a>
                    </td>
                </tr>
            }
            .into_any()
        })
        .collect();

    let user_rows = routes
        .user_routes
        .iter()
        .map(|r| {
            let delete = ManageTab::Routes.link(&[("action", "delete-user-route"), ("delete", r.username.as_str())]);
            view! {
                <tr class=ROW>
                    <td class="py-2 font-semibold">{r.username.clone()}</td>
                    <td class="py-2">{r.gateway.clone()}</td>
                    <td class="py-2 text-right">
                        <a href=delete class="text-red-400 hover:text-red-300 text-xs">"Delete"</a>
                    </td>
                </tr>
            }
            .into_any()
        })
        .collect();

    let gateway_select = gateway_options(&data.gateways, &routes.default_gateway);
    let default_extension = routes.default_extension.clone();
    let inbound = table(
        vec![t(lang, Key::Did), t(lang, Key::Destination), "Type", ""],
        inbound_rows,
        "No inbound routes",
    );
    let user_routes = table(
        vec![t(lang, Key::Username), "Gateway", ""],
        user_rows,
        "No user routes (using default gateway)",
    );

    view! {
        <Section title="Default Routes">
            <form method="post" action="/manage/routes/defaults" class="grid grid-cols-1 md:grid-cols-3 gap-4 items-end">
                <div>
                    <label class=LABEL>{t(lang, Key::DefaultGateway)}</label>
                    <select name="default_gateway" class=INPUT>{gateway_select}</select>
                </div>
                <div>
                    <label class=LABEL>{t(lang, Key::DefaultExtension)}</label>
                    <input name="default_extension" value=default_extension class=INPUT/>
                </div>
                <div>
                    <button type="submit" class=BUTTON_PRIMARY>{t(lang, Key::Save)}</button>
                </div>
            </form>
        </Section>
        <SectionWithActions
            title=t(lang, Key::InboundRouting)
            actions=add_button(ManageTab::Routes, "add-inbound", "Add Inbound Route")
        >
            {inbound}
        </SectionWithActions>
        <SectionWithActions
            title=t(lang, Key::UserRouting)
            actions=add_button(ManageTab::Routes, "add-user-route", "Add User Route")
        >
            {user_routes}
        </SectionWithActions>
    }
    .into_any()
}

fn text_field(label: &str, name: &'static str, value: impl Into<String>) -> AnyView {
    let label = label.to_string();
    let value = value.into();
    view! {
        <div>
            <label class=LABEL>{label}</label>
            <input name=name value=value class=INPUT/>
        </div>
    }
    .into_any()
}

fn settings_tab(lang: Lang, data: &ManageData) -> AnyView {
    let s = &data.settings;
    let fields = vec![
        text_field(t(lang, Key::Domain), "fs_domain", &s.fs_domain),
        text_field(t(lang, Key::ExternalIp), "external_sip_ip", &s.external_sip_ip),
        text_field("Internal SIP Port", "internal_sip_port", s.internal_sip_port.to_string()),
        text_field("External SIP Port", "external_sip_port", s.external_sip_port.to_string()),
        text_field(t(lang, Key::Codecs), "codec_prefs", &s.codec_prefs),
        text_field("Country Code", "default_country_code", &s.default_country_code),
        text_field("Outbound Caller ID", "outbound_caller_id", &data.defaults.outbound_caller_id),
    ];
    let license = vec![
        text_field("License Key", "license_key", &data.license.key),
        text_field(t(lang, Key::Client), "client_name", &data.license.client_name),
    ];

    view! {
        <Section title=t(lang, Key::Settings)>
            <form method="post" action="/manage/settings">
                <div class="grid grid-cols-1 md:grid-cols-2 gap-4">{fields}</div>
                <h3 class="text-sm font-semibold text-gray-300 uppercase tracking-wider mt-6 mb-4">
                    {t(lang, Key::License)}
                </h3>
                <div class="grid grid-cols-1 md:grid-cols-2 gap-4">{license}</div>
                <div class="mt-6">
                    <button type="submit" class=BUTTON_PRIMARY>{t(lang, Key::Save)}</button>
                </div>
            </form>
        </Section>
    }
    .into_any()
}

fn config_tab() -> AnyView {
    view! {
        <Section title="Export">
            <p class="text-sm text-gray-400 mb-4">"Download the complete configuration as JSON."</p>
            <a href="/manage/export" class=BUTTON_PRIMARY>"Export Config"</a>
        </Section>
        <Section title="Import">
            <form method="post" action="/manage/import" enctype="multipart/form-data" class="space-y-4">
                <input type="file" name="file" accept=".json,application/json" class="block text-sm text-gray-300"/>
                <label class="flex items-center gap-2 text-sm text-gray-300">
                    <input type="checkbox" name="confirm" value="on"/>
                    "Import config will overwrite all current settings"
                </label>
                <button type="submit" class=BUTTON_PRIMARY>"Import Config"</button>
            </form>
        </Section>
        <Section title="ENV">
            <p class="text-sm text-gray-400 mb-4">
                "Merge the configuration from ENV variables into the current settings."
            </p>
            <a href=ManageTab::Config.link(&[("action", "import-env")]) class=BUTTON_SECONDARY>"Import from ENV"</a>
        </Section>
    }
    .into_any()
}

fn hidden_edit_mode(key: Option<&str>) -> AnyView {
    let key = key.unwrap_or_default().to_string();
    view! { <input type="hidden" name="edit_mode" value=key/> }.into_any()
}

/// Key field: read-only in edit mode so it still posts.
fn key_field(label: &str, name: &'static str, value: &str, editing: bool) -> AnyView {
    let label = label.to_string();
    let value = value.to_string();
    view! {
        <div>
            <label class=LABEL>{label}</label>
            <input name=name value=value readonly=editing required={!editing} class=INPUT/>
        </div>
    }
    .into_any()
}

fn checkbox(label: &'static str, name: &'static str, on: bool) -> AnyView {
    view! {
        <label class="flex items-center gap-2 text-sm text-gray-300">
            <input type="checkbox" name=name value="on" checked=on/>
            {label}
        </label>
    }
    .into_any()
}

fn form_modal(title: &'static str, cancel: String, lang: Lang, action: &'static str, fields: Vec<AnyView>) -> AnyView {
    view! {
        <Modal title=title close_href=cancel.clone()>
            <form method="post" action=action class="space-y-4">
                {fields}
                <FormButtons cancel_href=cancel submit_label=t(lang, Key::Save)/>
            </form>
        </Modal>
    }
    .into_any()
}

fn user_form(lang: Lang, user: Option<&SipUser>) -> AnyView {
    let key = user.map(|u| u.username.as_str());
    let fields = vec![
        hidden_edit_mode(key),
        key_field(t(lang, Key::Username), "username", key.unwrap_or_default(), user.is_some()),
        text_field(t(lang, Key::Password), "password", user.map(|u| u.password.as_str()).unwrap_or_default()),
        text_field(t(lang, Key::Extension), "extension", user.map(|u| u.extension.as_str()).unwrap_or_default()),
        checkbox("Enabled", "enabled", user.is_none_or(|u| u.enabled)),
    ];
    let title = if user.is_some() { "Edit User" } else { "Add User" };
    form_modal(title, ManageTab::Users.link(&[]), lang, "/manage/users", fields)
}

fn acl_user_form(lang: Lang, user: Option<&AclUser>) -> AnyView {
    let key = user.map(|u| u.username.as_str());
    let fields = vec![
        hidden_edit_mode(key),
        key_field(t(lang, Key::Username), "username", key.unwrap_or_default(), user.is_some()),
        text_field(t(lang, Key::IpAddress), "ip_address", user.map(|u| u.ip_address.as_str()).unwrap_or_default()),
        text_field(t(lang, Key::Extension), "extension", user.map(|u| u.extension.as_str()).unwrap_or_default()),
        text_field("Caller ID", "caller_id", user.map(|u| u.caller_id.as_str()).unwrap_or_default()),
    ];
    let title = if user.is_some() { "Edit ACL User" } else { "Add ACL User" };
    form_modal(title, ManageTab::AclUsers.link(&[]), lang, "/manage/acl-users", fields)
}

fn gateway_form(lang: Lang, gateway: Option<&Gateway>) -> AnyView {
    let defaults = Gateway::default();
    let gw = gateway.unwrap_or(&defaults);
    let transports = ["udp", "tcp", "tls"]
        .into_iter()
        .map(|tr| view! { <option value=tr selected={gw.transport == tr}>{tr.to_uppercase()}</option> })
        .collect_view();
    let fields = vec![
        hidden_edit_mode(gateway.map(|g| g.name.as_str())),
        key_field("Name", "name", &gw.name, gateway.is_some()),
        text_field("Host", "host", &gw.host),
        text_field("Port", "port", gw.port.to_string()),
        text_field(t(lang, Key::Username), "username", &gw.username),
        text_field(t(lang, Key::Password), "password", &gw.password),
        text_field("Auth Username", "auth_username", &gw.auth_username),
        view! {
            <div>
                <label class=LABEL>"Transport"</label>
                <select name="transport" class=INPUT>{transports}</select>
            </div>
        }
        .into_any(),
        view! {
            <div class="flex gap-6">
                {checkbox("Register", "register", gw.register)}
                {checkbox("Enabled", "enabled", gw.enabled)}
            </div>
        }
        .into_any(),
    ];
    let title = if gateway.is_some() { "Edit Gateway" } else { "Add Gateway" };
    form_modal(title, ManageTab::Gateways.link(&[]), lang, "/manage/gateways", fields)
}

fn inbound_route_form(lang: Lang) -> AnyView {
    let fields = vec![
        text_field(t(lang, Key::Did), "did", ""),
        view! {
            <div>
                <label class=LABEL>"Type"</label>
                <select name="destination_type" class=INPUT>
                    <option value="extension" selected>"extension"</option>
                    <option value="gateway">"gateway"</option>
                </select>
            </div>
        }
        .into_any(),
        text_field(t(lang, Key::Destination), "destination", ""),
    ];
    form_modal("Add Inbound Route", ManageTab::Routes.link(&[]), lang, "/manage/routes/inbound", fields)
}

fn user_route_form(lang: Lang, data: &ManageData) -> AnyView {
    let users = user_options(&data.users, &data.acl_users);
    let gateways = gateway_options(&data.gateways, "");
    let fields = vec![
        view! {
            <div>
                <label class=LABEL>{t(lang, Key::Username)}</label>
                <select name="username" class=INPUT>{users}</select>
            </div>
        }
        .into_any(),
        view! {
            <div>
                <label class=LABEL>"Gateway"</label>
                <select name="gateway" class=INPUT>{gateways}</select>
            </div>
        }
        .into_any(),
    ];
    form_modal("Add User Route", ManageTab::Routes.link(&[]), lang, "/manage/routes/user", fields)
}

fn delete_confirm(
    tab: ManageTab,
    title: &str,
    message: String,
    action: &str,
    field: &'static str,
    key: &str,
) -> AnyView {
    let confirm = Confirm {
        title: title.to_string(),
        message,
        action: action.to_string(),
        hidden: vec![(field, key.to_string())],
        confirm_label: "Delete".to_string(),
        cancel_href: tab.link(&[]),
        danger: true,
    };
    view! { <ConfirmModal confirm=confirm/> }.into_any()
}

fn plain_confirm(tab: ManageTab, title: &str, message: &str, action: &str, label: &str) -> AnyView {
    let confirm = Confirm {
        title: title.to_string(),
        message: message.to_string(),
        action: action.to_string(),
        hidden: Vec::new(),
        confirm_label: label.to_string(),
        cancel_href: tab.link(&[]),
        danger: false,
    };
    view! { <ConfirmModal confirm=confirm/> }.into_any()
}

/// Modal view. Edit and delete targets that are no longer cached render
/// nothing, the same as a closed dialog.
fn modal_view(lang: Lang, tab: ManageTab, modal: &ManageModal, data: &ManageData) -> Option<AnyView> {
    Some(match modal {
        ManageModal::AddUser => user_form(lang, None),
        ManageModal::EditUser(k) => user_form(lang, Some(data.users.iter().find(|u| &u.username == k)?)),
        ManageModal::DeleteUser(k) => delete_confirm(
            ManageTab::Users,
            "Delete User",
            format!(r#"Delete user "{k}"?"#),
            "/manage/users/delete",
            "key",
            k,
        ),
        ManageModal::AddAclUser => acl_user_form(lang, None),
        ManageModal::EditAclUser(k) => {
            acl_user_form(lang, Some(data.acl_users.iter().find(|u| &u.username == k)?))
        }
        ManageModal::DeleteAclUser(k) => delete_confirm(
            ManageTab::AclUsers,
            "Delete ACL User",
            format!(r#"Delete ACL user "{k}"?"#),
            "/manage/acl-users/delete",
            "key",
            k,
        ),
        ManageModal::AddGateway => gateway_form(lang, None),
        ManageModal::EditGateway(k) => gateway_form(lang, Some(data.gateways.iter().find(|g| &g.name == k)?)),
        ManageModal::DeleteGateway(k) => delete_confirm(
            ManageTab::Gateways,
            "Delete Gateway",
            format!(r#"Delete gateway "{k}"?"#),
            "/manage/gateways/delete",
            "key",
            k,
        ),
        ManageModal::AddInboundRoute => inbound_route_form(lang),
        ManageModal::DeleteInboundRoute(did) => delete_confirm(
            ManageTab::Routes,
            "Delete Inbound Route",
            format!(r#"Delete inbound route for "{did}"?"#),
            "/manage/routes/inbound/delete",
            "did",
            did,
        ),
        ManageModal::AddUserRoute => user_route_form(lang, data),
        ManageModal::DeleteUserRoute(user) => delete_confirm(
            ManageTab::Routes,
            "Remove User Route",
            format!(r#"Remove route for user "{user}"?"#),
            "/manage/routes/user/delete",
            "username",
            user,
        ),
        ManageModal::ConfirmApply => plain_confirm(
            tab,
            t(lang, Key::ApplyChanges),
            "Apply configuration and reload FreeSWITCH?",
            "/manage/apply",
            "Apply",
        ),
        ManageModal::ConfirmImportEnv => plain_confirm(
            tab,
            "Import from ENV",
            "Import from ENV variables? This will merge ENV config into current settings.",
            "/manage/import-env",
            "Import",
        ),
    })
}

#[component]
fn TabBar(lang: Lang, current: ManageTab) -> impl IntoView {
    view! {
        <div class="mx-6 mt-4 flex items-center justify-between border-b border-gray-700">
            <nav class="flex">
                {ManageTab::ALL.into_iter().map(|tab| {
                    let class = if tab == current {
                        "px-4 py-2 text-sm text-white border-b-2 border-blue-500"
                    } else {
                        "px-4 py-2 text-sm text-gray-400 hover:text-white"
                    };
                    view! { <a href=tab.link(&[]) class=class>{tab.label(lang)}</a> }
                }).collect_view()}
            </nav>
            <a href=current.link(&[("action", "apply")]) class=format!("{BUTTON_PRIMARY} mb-2")>
                {t(lang, Key::ApplyChanges)}
            </a>
        </div>
    }
}

pub fn render_manage(ctx: &PageContext, data: &ManageData, view: &ManageView) -> String {
    let lang = ctx.lang;
    let ctx = ctx.clone();
    let tab = view.tab;
    render(|| {
        let body = match tab {
            ManageTab::Users => users_tab(lang, &data.users),
            ManageTab::AclUsers => acl_users_tab(lang, &data.acl_users),
            ManageTab::Gateways => gateways_tab(lang, &data.gateways),
            ManageTab::Routes => routes_tab(lang, data),
            ManageTab::Settings => settings_tab(lang, data),
            ManageTab::Config => config_tab(),
        };
        let overlay = view.modal.as_ref().and_then(|m| modal_view(lang, tab, m, data));

        view! {
            <Layout ctx=ctx title=t(lang, Key::Config)>
                <TabBar lang=lang current=tab/>
                {body}
                {overlay}
            </Layout>
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_client::types::{InboundRoute, UserRoute};
    use sw_common::prefs::RefreshInterval;

    use crate::components::layout::Nav;

    fn ctx() -> PageContext {
        PageContext::new(Lang::En, Nav::Manage, RefreshInterval::PAUSED)
    }

    fn data() -> ManageData {
        let user: SipUser =
            serde_json::from_value(serde_json::json!({"username": "alice", "password": "pw", "extension": "101"}))
                .unwrap();
        ManageData {
            users: vec![user],
            acl_users: vec![AclUser {
                username: "pbx".into(),
                ip_address: "10.0.0.5".into(),
                ..Default::default()
            }],
            gateways: vec![Gateway {
                name: "sipgate".into(),
                host: "sipgate.de".into(),
                ..Default::default()
            }],
            routes: Routes {
                default_gateway: "sipgate".into(),
                default_extension: "100".into(),
                inbound: vec![InboundRoute {
                    did: "+49 30 1234".into(),
                    destination: "101".into(),
                    destination_type: "extension".into(),
                }],
                user_routes: vec![UserRoute {
                    username: "alice".into(),
                    gateway: "sipgate".into(),
                }],
            },
            ..Default::default()
        }
    }

    fn view(tab: ManageTab, modal: Option<ManageModal>) -> ManageView {
        ManageView { tab, modal }
    }

    #[test]
    fn modal_query_mapping() {
        assert_eq!(
            ManageModal::from_query(ManageTab::Users, Some("add"), None, None),
            Some(ManageModal::AddUser)
        );
        assert_eq!(
            ManageModal::from_query(ManageTab::Gateways, None, Some("sipgate"), None),
            Some(ManageModal::EditGateway("sipgate".into()))
        );
        assert_eq!(
            ManageModal::from_query(ManageTab::AclUsers, None, None, Some("pbx")),
            Some(ManageModal::DeleteAclUser("pbx".into()))
        );
        assert_eq!(
            ManageModal::from_query(ManageTab::Routes, Some("delete-inbound"), None, Some("+4930")),
            Some(ManageModal::DeleteInboundRoute("+4930".into()))
        );
        assert_eq!(
            ManageModal::from_query(ManageTab::Settings, Some("apply"), None, None),
            Some(ManageModal::ConfirmApply)
        );
        assert_eq!(ManageModal::from_query(ManageTab::Users, None, Some(""), None), None);
        assert_eq!(ManageTab::parse("acl-users"), Some(ManageTab::AclUsers));
        assert_eq!(ManageTab::parse("nope"), None);
    }

    #[test]
    fn add_form_has_empty_edit_marker() {
        let html = render_manage(&ctx(), &data(), &view(ManageTab::Users, Some(ManageModal::AddUser)));
        assert!(html.contains(r#"name="edit_mode" value="""#));
        assert!(html.contains("Add User"));
        assert!(html.contains(r#"name="username" value="" required"#));
    }

    #[test]
    fn edit_form_carries_key_in_edit_marker() {
        let html = render_manage(
            &ctx(),
            &data(),
            &view(ManageTab::Users, Some(ManageModal::EditUser("alice".into()))),
        );
        assert!(html.contains(r#"name="edit_mode" value="alice""#));
        assert!(html.contains(r#"name="username" value="alice" readonly"#));
    }

    #[test]
    fn unknown_edit_target_renders_no_modal() {
        let html = render_manage(
            &ctx(),
            &data(),
            &view(ManageTab::Users, Some(ManageModal::EditUser("ghost".into()))),
        );
        assert!(!html.contains("edit_mode"));
    }

    #[test]
    fn gateway_form_defaults() {
        let html = render_manage(&ctx(), &data(), &view(ManageTab::Gateways, Some(ManageModal::AddGateway)));
        assert!(html.contains(r#"name="port" value="5060""#));
        assert!(html.contains(r#"<option value="udp" selected>UDP</option>"#));
        assert!(html.contains(r#"name="register" value="on" checked"#));
    }

    #[test]
    fn delete_requires_confirmation() {
        let html = render_manage(
            &ctx(),
            &data(),
            &view(ManageTab::Users, Some(ManageModal::DeleteUser("alice".into()))),
        );
        assert!(html.contains(r#"Delete user "alice"?"#));
        assert!(html.contains(r#"action="/manage/users/delete""#));
    }

    #[test]
    fn routes_tab_selects() {
        let d = data();
        let html = render_manage(&ctx(), &d, &view(ManageTab::Routes, Some(ManageModal::AddUserRoute)));
        assert!(html.contains(r#"<option value="">-- Select --</option>"#));
        assert!(html.contains(r#"<option value="sipgate" selected>sipgate</option>"#));
        assert!(html.contains("delete=%2B49%2030%201234"));

        let alice = html.find(r#"<option value="alice">alice</option>"#).unwrap();
        let pbx = html.find(r#"<option value="pbx">pbx</option>"#).unwrap();
        assert!(alice < pbx);
    }

    #[test]
    fn empty_tables() {
        let html = render_manage(&ctx(), &ManageData::default(), &view(ManageTab::Gateways, None));
        assert!(html.contains("No gateways configured"));
        let html = render_manage(&ctx(), &ManageData::default(), &view(ManageTab::Routes, None));
        assert!(html.contains("No inbound routes"));
        assert!(html.contains("No user routes (using default gateway)"));
    }

    #[test]
    fn apply_confirmation() {
        let html = render_manage(&ctx(), &data(), &view(ManageTab::Settings, Some(ManageModal::ConfirmApply)));
        assert!(html.contains("Apply configuration and reload FreeSWITCH?"));
        assert!(html.contains(r#"action="/manage/apply""#));
    }
}
