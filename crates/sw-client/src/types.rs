//! Mirrors of the records the SIP Wrapper backend owns.
//!
//! Every field tolerates absence; the backend is free to omit anything.

use serde::{Deserialize, Deserializer, Serialize};

fn default_true() -> bool {
    true
}

fn default_sip_port() -> u16 {
    5060
}

fn default_external_sip_port() -> u16 {
    5080
}

fn default_transport() -> String {
    "udp".into()
}

fn default_country_code() -> String {
    "49".into()
}

fn default_destination_type() -> String {
    "extension".into()
}

fn default_max_attempts() -> u32 {
    10
}

fn default_time_window() -> u64 {
    300
}

fn default_block_duration() -> u64 {
    3600
}

fn default_fail2ban_threshold() -> u32 {
    50
}

fn default_jail_name() -> String {
    "sip-blacklist".into()
}

/// Accepts a JSON string, number or null and keeps it as text.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

// ── Status ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub profiles: Vec<ProfileStatus>,
    #[serde(default)]
    pub gateways: Vec<GatewayStatus>,
    #[serde(default)]
    pub registrations: Vec<Registration>,
    #[serde(default)]
    pub fs_access: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileStatus {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayStatus {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub registered: bool,
}

impl GatewayStatus {
    pub fn is_online(&self) -> bool {
        self.status == "online"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub agent: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub host: String,
}

impl Registration {
    /// Username part of `user@domain`.
    pub fn username(&self) -> &str {
        self.user.split('@').next().unwrap_or_default()
    }
}

impl SystemStatus {
    pub fn gateways_online(&self) -> usize {
        self.gateways.iter().filter(|g| g.is_online()).count()
    }

    pub fn profiles_online(&self) -> usize {
        self.profiles.iter().filter(|p| p.status == "online").count()
    }

    pub fn is_registered(&self, username: &str) -> bool {
        !username.is_empty() && self.registrations.iter().any(|r| r.username() == username)
    }
}

// ── Calls & logs ────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveCalls {
    #[serde(default)]
    pub calls: Vec<ActiveCall>,
    #[serde(default)]
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveCall {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub cid_name: String,
    #[serde(default)]
    pub cid_num: String,
    #[serde(default)]
    pub dest: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CdrList {
    #[serde(default)]
    pub calls: Vec<CallRecord>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub caller_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub caller_num: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dest: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub end: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub billsec: String,
    #[serde(default)]
    pub hangup_cause: String,
    #[serde(default)]
    pub direction: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogList {
    #[serde(default)]
    pub logs: Vec<LogLine>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub level: String,
}

// ── CRUD entities ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub extension: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AclUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub extension: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub caller_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gateway {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_sip_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub auth_username: String,
    #[serde(default = "default_transport")]
    pub transport: String,
    #[serde(default = "default_true")]
    pub register: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for Gateway {
    fn default() -> Self {
        serde_json::from_str("{}").unwrap()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Routes {
    #[serde(default)]
    pub default_gateway: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub default_extension: String,
    #[serde(default)]
    pub inbound: Vec<InboundRoute>,
    #[serde(default)]
    pub user_routes: Vec<UserRoute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundRoute {
    #[serde(default, deserialize_with = "lenient_string")]
    pub did: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub destination: String,
    #[serde(default = "default_destination_type")]
    pub destination_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRoute {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub gateway: String,
}

/// Body of `PUT /api/crud/routes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultRoutes {
    pub default_gateway: String,
    pub default_extension: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub fs_domain: String,
    #[serde(default)]
    pub external_sip_ip: String,
    #[serde(default = "default_sip_port")]
    pub internal_sip_port: u16,
    #[serde(default = "default_external_sip_port")]
    pub external_sip_port: u16,
    #[serde(default)]
    pub codec_prefs: String,
    #[serde(default = "default_country_code", deserialize_with = "lenient_string")]
    pub default_country_code: String,
}

impl Default for Settings {
    fn default() -> Self {
        serde_json::from_str("{}").unwrap()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub client_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub default_gateway: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub default_extension: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub outbound_caller_id: String,
}

// ── Mutation results ────────────────────────────────────────

/// Response body of every mutating endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    /// Text to show the operator, preferring `message` then `error`.
    pub fn text(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub stats: Option<ImportStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportStats {
    #[serde(default)]
    pub users: usize,
    #[serde(default)]
    pub gateways: usize,
    #[serde(default)]
    pub acl_users: usize,
    #[serde(default)]
    pub inbound_routes: usize,
    #[serde(default)]
    pub user_routes: usize,
}

/// Downloaded config file.
#[derive(Debug, Clone)]
pub struct ExportedConfig {
    pub filename: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

// ── Security ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityOverview {
    #[serde(default)]
    pub blacklist: Vec<BlacklistEntry>,
    #[serde(default)]
    pub whitelist: Vec<WhitelistEntry>,
    #[serde(default)]
    pub whitelist_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub added_at: String,
    #[serde(default)]
    pub blocked_count: Option<u64>,
    #[serde(default)]
    pub fail2ban_banned: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoBlacklistSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_time_window")]
    pub time_window: u64,
    #[serde(default = "default_block_duration")]
    pub block_duration: u64,
}

impl Default for AutoBlacklistSettings {
    fn default() -> Self {
        serde_json::from_str("{}").unwrap()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailedAttempts {
    #[serde(default)]
    pub attempts: Vec<FailedAttempt>,
    #[serde(default, alias = "blocked")]
    pub auto_blocked: Vec<String>,
    #[serde(default)]
    pub settings: Option<AutoBlacklistSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailedAttempt {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub last_attempt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckBlacklistResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub blocked: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fail2banInfo {
    #[serde(default)]
    pub settings: Fail2banSettings,
    #[serde(default)]
    pub status: Option<Fail2banStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fail2banSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_fail2ban_threshold")]
    pub threshold: u32,
    #[serde(default = "default_jail_name")]
    pub jail_name: String,
}

impl Default for Fail2banSettings {
    fn default() -> Self {
        serde_json::from_str("{}").unwrap()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fail2banStatus {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub jail_exists: bool,
    #[serde(default)]
    pub banned_ips: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ── Public landing snapshot ─────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicConfig {
    #[serde(default)]
    pub users: Vec<PublicUser>,
    #[serde(default)]
    pub inbound_routes: Vec<PublicInboundRoute>,
    #[serde(default)]
    pub outbound_user_routes: Vec<UserRoute>,
    #[serde(default)]
    pub default_gateway: String,
    #[serde(default)]
    pub gateways: Vec<PublicGateway>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    #[serde(default)]
    pub username: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub extension: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicInboundRoute {
    #[serde(default)]
    pub gateway: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub extension: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicGateway {
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_username_strips_domain() {
        let reg = Registration {
            user: "alice@pbx.local".into(),
            ..Default::default()
        };
        assert_eq!(reg.username(), "alice");

        let status = SystemStatus {
            registrations: vec![reg],
            ..Default::default()
        };
        assert!(status.is_registered("alice"));
        assert!(!status.is_registered("bob"));
        assert!(!status.is_registered(""));
    }

    #[test]
    fn gateway_defaults() {
        let gw: Gateway = serde_json::from_str(r#"{"name":"sipgate","host":"sipgate.de"}"#).unwrap();
        assert_eq!(gw.port, 5060);
        assert_eq!(gw.transport, "udp");
        assert!(gw.register);
        assert!(gw.enabled);
    }

    #[test]
    fn cdr_billsec_accepts_numbers() {
        let cdr: CdrList = serde_json::from_str(
            r#"{"calls":[{"caller_num":4930123,"dest":"100","billsec":125,"hangup_cause":"NORMAL_CLEARING"}],"count":1}"#,
        )
        .unwrap();
        assert_eq!(cdr.calls[0].billsec, "125");
        assert_eq!(cdr.calls[0].caller_num, "4930123");
    }

    #[test]
    fn failed_attempts_accepts_both_blocked_keys() {
        let a: FailedAttempts =
            serde_json::from_str(r#"{"attempts":[],"auto_blocked":["1.2.3.4"]}"#).unwrap();
        let b: FailedAttempts =
            serde_json::from_str(r#"{"attempts":[],"blocked":["1.2.3.4"]}"#).unwrap();
        assert_eq!(a.auto_blocked, b.auto_blocked);
    }

    #[test]
    fn action_result_text() {
        let ok: ActionResult = serde_json::from_str(r#"{"success":true,"message":"User added"}"#).unwrap();
        assert_eq!(ok.text("Done"), "User added");
        let err: ActionResult = serde_json::from_str(r#"{"success":false,"error":"Missing required key: users"}"#).unwrap();
        assert_eq!(err.text("Failed"), "Missing required key: users");
        assert_eq!(ActionResult::default().text("Failed"), "Failed");
    }

    #[test]
    fn status_counters() {
        let status: SystemStatus = serde_json::from_str(
            r#"{"profiles":[{"name":"internal","status":"online"},{"name":"external","status":"down"}],
                "gateways":[{"name":"a","status":"online"},{"name":"b","status":"offline"},{"name":"c","status":"online"}],
                "registrations":[],"fs_access":true}"#,
        )
        .unwrap();
        assert_eq!(status.gateways_online(), 2);
        assert_eq!(status.profiles_online(), 1);
    }
}
