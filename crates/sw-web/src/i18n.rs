/// Console UI language. German is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    De,
    En,
}

impl Lang {
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "de" => Some(Lang::De),
            "en" => Some(Lang::En),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Lang::De => "de",
            Lang::En => "en",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Dashboard,
    Config,
    Security,
    Gateways,
    Users,
    AclUsers,
    Routing,
    Settings,
    Logs,
    Login,
    Logout,
    Username,
    Password,
    Save,
    Status,
    Online,
    Offline,
    Registered,
    NotRegistered,
    GatewayStatus,
    UserRegistrations,
    License,
    Client,
    Domain,
    ExternalIp,
    Codecs,
    Language,
    ApplyChanges,
    ConnectionError,
    Profiles,
    Extension,
    IpAddress,
    InboundRouting,
    UserRouting,
    DefaultGateway,
    DefaultExtension,
    Destination,
    Did,
    NoRoutes,
    ActiveCalls,
    CallFlow,
    CallLogs,
    Direction,
    From,
    To,
    Duration,
    Result,
    Time,
    Refresh,
    Paused,
}

pub fn t(lang: Lang, key: Key) -> &'static str {
    match lang {
        Lang::De => de(key),
        Lang::En => en(key),
    }
}

fn de(key: Key) -> &'static str {
    match key {
        Key::Dashboard => "Dashboard",
        Key::Config => "Konfiguration",
        Key::Security => "Sicherheit",
        Key::Gateways => "Gateways",
        Key::Users => "Benutzer",
        Key::AclUsers => "ACL-Benutzer",
        Key::Routing => "Routing",
        Key::Settings => "Einstellungen",
        Key::Logs => "Logs",
        Key::Login => "Anmelden",
        Key::Logout => "Abmelden",
        Key::Username => "Benutzername",
        Key::Password => "Passwort",
        Key::Save => "Speichern",
        Key::Status => "Status",
        Key::Online => "Online",
        Key::Offline => "Offline",
        Key::Registered => "Registriert",
        Key::NotRegistered => "Nicht registriert",
        Key::GatewayStatus => "Gateway Status",
        Key::UserRegistrations => "Benutzer Registrierungen",
        Key::License => "Lizenz",
        Key::Client => "Kunde",
        Key::Domain => "Domain",
        Key::ExternalIp => "Externe IP",
        Key::Codecs => "Codecs",
        Key::Language => "Sprache",
        Key::ApplyChanges => "Änderungen anwenden",
        Key::ConnectionError => "Verbindungsfehler zu FreeSWITCH",
        Key::Profiles => "Profile",
        Key::Extension => "Nebenstelle",
        Key::IpAddress => "IP-Adresse",
        Key::InboundRouting => "Eingehende Routen",
        Key::UserRouting => "Benutzer-Routen",
        Key::DefaultGateway => "Standard-Gateway",
        Key::DefaultExtension => "Standard-Nebenstelle",
        Key::Destination => "Ziel",
        Key::Did => "DID/Rufnummer",
        Key::NoRoutes => "Keine Routen konfiguriert",
        Key::ActiveCalls => "Aktive Anrufe",
        Key::CallFlow => "Verbindung",
        Key::CallLogs => "Anrufverlauf",
        Key::Direction => "Richtung",
        Key::From => "Von",
        Key::To => "Zu",
        Key::Duration => "Dauer",
        Key::Result => "Ergebnis",
        Key::Time => "Zeit",
        Key::Refresh => "Aktualisierung",
        Key::Paused => "Pausiert",
    }
}

fn en(key: Key) -> &'static str {
    match key {
        Key::Dashboard => "Dashboard",
        Key::Config => "Configuration",
        Key::Security => "Security",
        Key::Gateways => "Gateways",
        Key::Users => "Users",
        Key::AclUsers => "ACL Users",
        Key::Routing => "Routing",
        Key::Settings => "Settings",
        Key::Logs => "Logs",
        Key::Login => "Login",
        Key::Logout => "Logout",
        Key::Username => "Username",
        Key::Password => "Password",
        Key::Save => "Save",
        Key::Status => "Status",
        Key::Online => "Online",
        Key::Offline => "Offline",
        Key::Registered => "Registered",
        Key::NotRegistered => "Not registered",
        Key::GatewayStatus => "Gateway Status",
        Key::UserRegistrations => "User Registrations",
        Key::License => "License",
        Key::Client => "Client",
        Key::Domain => "Domain",
        Key::ExternalIp => "External IP",
        Key::Codecs => "Codecs",
        Key::Language => "Language",
        Key::ApplyChanges => "Apply changes",
        Key::ConnectionError => "Connection error to FreeSWITCH",
        Key::Profiles => "Profiles",
        Key::Extension => "Extension",
        Key::IpAddress => "IP address",
        Key::InboundRouting => "Inbound routes",
        Key::UserRouting => "User routes",
        Key::DefaultGateway => "Default gateway",
        Key::DefaultExtension => "Default extension",
        Key::Destination => "Destination",
        Key::Did => "DID/Number",
        Key::NoRoutes => "No routes configured",
        Key::ActiveCalls => "Active Calls",
        Key::CallFlow => "Connection",
        Key::CallLogs => "Call Logs",
        Key::Direction => "Direction",
        Key::From => "From",
        Key::To => "To",
        Key::Duration => "Duration",
        Key::Result => "Result",
        Key::Time => "Time",
        Key::Refresh => "Refresh",
        Key::Paused => "Paused",
    }
}
