/// Badge colour classes shared by every status pill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Danger,
    Info,
    Primary,
    Secondary,
}

impl Tone {
    pub fn classes(&self) -> &'static str {
        match self {
            Tone::Success => "bg-green-500/20 text-green-400 border-green-500/30",
            Tone::Warning => "bg-yellow-500/20 text-yellow-400 border-yellow-500/30",
            Tone::Danger => "bg-red-500/20 text-red-400 border-red-500/30",
            Tone::Info => "bg-cyan-500/20 text-cyan-400 border-cyan-500/30",
            Tone::Primary => "bg-blue-500/20 text-blue-400 border-blue-500/30",
            Tone::Secondary => "bg-gray-500/20 text-gray-400 border-gray-500/30",
        }
    }
}

/// Outcome of a finished call, derived from its hangup cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallResult {
    Ok,
    Busy,
    NoAnswer,
    Cancelled,
    Failed,
}

impl CallResult {
    pub fn from_hangup_cause(cause: &str) -> Self {
        if cause.contains("NORMAL") || cause.contains("SUCCESS") {
            CallResult::Ok
        } else if cause.contains("BUSY") {
            CallResult::Busy
        } else if cause.contains("NO_ANSWER") {
            CallResult::NoAnswer
        } else if cause.contains("CANCEL") {
            CallResult::Cancelled
        } else {
            CallResult::Failed
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CallResult::Ok => "OK",
            CallResult::Busy => "Busy",
            CallResult::NoAnswer => "No Answer",
            CallResult::Cancelled => "Cancelled",
            CallResult::Failed => "Failed",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            CallResult::Ok => Tone::Success,
            CallResult::Busy => Tone::Warning,
            CallResult::NoAnswer | CallResult::Cancelled => Tone::Secondary,
            CallResult::Failed => Tone::Danger,
        }
    }
}

/// Billed seconds as `m:ss`. Unparsable input counts as zero.
pub fn format_duration(billsec: &str) -> String {
    let secs = parse_seconds(billsec);
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn parse_seconds(billsec: &str) -> u64 {
    let trimmed = billsec.trim();
    let digits: &str = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .map(|end| &trimmed[..end])
        .unwrap_or(trimmed);
    digits.parse().unwrap_or(0)
}

/// Keep the trailing `YYYY-MM-DD HH:MM:SS` of a longer timestamp.
pub fn trim_call_time(start: &str) -> &str {
    let count = start.chars().count();
    if count > 19 {
        let skip = start
            .char_indices()
            .nth(count - 19)
            .map(|(i, _)| i)
            .unwrap_or(0);
        &start[skip..]
    } else {
        start
    }
}

/// Cut to `max` characters and append "..." when longer.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Display class of a failed-attempt counter relative to the block threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Monitoring,
    Warning,
    Critical,
}

impl Severity {
    /// `count` against `max_attempts` (10 when unset): strictly above 80% is
    /// critical, from 50% a warning.
    ///
    /// Exactly 80% stays `Warning` (8 of 10, 4 of 5), unlike the old
    /// browser-side counter which used `>=` and showed it as critical.
    pub fn classify(count: u32, max_attempts: u32) -> Self {
        let max = u64::from(if max_attempts == 0 { 10 } else { max_attempts });
        let count = u64::from(count);
        if count * 10 > max * 8 {
            Severity::Critical
        } else if count * 10 >= max * 5 {
            Severity::Warning
        } else {
            Severity::Monitoring
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Monitoring => "Monitoring",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Severity::Monitoring => Tone::Secondary,
            Severity::Warning => Tone::Warning,
            Severity::Critical => Tone::Danger,
        }
    }

    /// Fill colour of the progress bar.
    pub fn bar_class(&self) -> &'static str {
        match self {
            Severity::Monitoring => "bg-cyan-500",
            Severity::Warning => "bg-yellow-500",
            Severity::Critical => "bg-red-500",
        }
    }
}

/// Progress towards the block threshold, capped at 100.
pub fn attempt_percent(count: u32, max_attempts: u32) -> u32 {
    let max = f64::from(if max_attempts == 0 { 10 } else { max_attempts });
    let pct = (f64::from(count) * 100.0 / max).round();
    pct.min(100.0) as u32
}

/// Colour of the "blocked N times" counter. Entries without a counter count once.
pub fn blocked_count_tone(count: Option<u64>) -> Tone {
    match count.unwrap_or(1) {
        n if n >= 50 => Tone::Danger,
        n if n >= 20 => Tone::Warning,
        _ => Tone::Secondary,
    }
}

/// Fail2Ban integration state as shown in the panel header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fail2banState {
    Unknown,
    Error(String),
    NotInstalled,
    JailMissing,
    Active { banned: usize },
}

impl Fail2banState {
    pub fn from_status(status: Option<&sw_client::types::Fail2banStatus>) -> Self {
        match status {
            None => Fail2banState::Unknown,
            Some(s) => match &s.error {
                Some(e) if !e.is_empty() => Fail2banState::Error(e.clone()),
                _ if !s.available => Fail2banState::NotInstalled,
                _ if !s.jail_exists => Fail2banState::JailMissing,
                _ => Fail2banState::Active {
                    banned: s.banned_ips.len(),
                },
            },
        }
    }

    pub fn label(&self) -> String {
        match self {
            Fail2banState::Unknown => "Unknown".into(),
            Fail2banState::Error(e) => format!("Error: {e}"),
            Fail2banState::NotInstalled => "Not installed".into(),
            Fail2banState::JailMissing => "Jail not found".into(),
            Fail2banState::Active { banned } => format!("Active ({banned} banned)"),
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Fail2banState::Unknown | Fail2banState::NotInstalled => Tone::Secondary,
            Fail2banState::Error(_) => Tone::Danger,
            Fail2banState::JailMissing => Tone::Warning,
            Fail2banState::Active { .. } => Tone::Success,
        }
    }

    pub fn is_usable(&self) -> bool {
        matches!(self, Fail2banState::Active { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_client::types::Fail2banStatus;

    #[test]
    fn hangup_causes() {
        assert_eq!(CallResult::from_hangup_cause("NORMAL_CLEARING"), CallResult::Ok);
        assert_eq!(CallResult::from_hangup_cause("SUCCESS"), CallResult::Ok);
        assert_eq!(CallResult::from_hangup_cause("USER_BUSY"), CallResult::Busy);
        assert_eq!(CallResult::from_hangup_cause("NO_ANSWER"), CallResult::NoAnswer);
        assert_eq!(CallResult::from_hangup_cause("ORIGINATOR_CANCEL"), CallResult::Cancelled);
        assert_eq!(CallResult::from_hangup_cause("CALL_REJECTED"), CallResult::Failed);
        assert_eq!(CallResult::from_hangup_cause(""), CallResult::Failed);
        assert_eq!(CallResult::Ok.label(), "OK");
        assert_eq!(CallResult::Failed.tone(), Tone::Danger);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration("125"), "2:05");
        assert_eq!(format_duration("0"), "0:00");
        assert_eq!(format_duration(""), "0:00");
        assert_eq!(format_duration("abc"), "0:00");
        assert_eq!(format_duration("3600"), "60:00");
        assert_eq!(format_duration("59s"), "0:59");
    }

    #[test]
    fn call_time_keeps_last_19_chars() {
        assert_eq!(trim_call_time("2025-01-31 14:05:09"), "2025-01-31 14:05:09");
        assert_eq!(trim_call_time("Fri 2025-01-31 14:05:09"), "2025-01-31 14:05:09");
        assert_eq!(trim_call_time(""), "");
    }

    #[test]
    fn log_truncation() {
        let long = "x".repeat(130);
        let cut = truncate(&long, 120);
        assert_eq!(cut.len(), 123);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("short", 120), "short");
        assert_eq!(truncate(&"y".repeat(120), 120).len(), 120);
    }

    #[test]
    fn severity_thresholds() {
        assert_eq!(Severity::classify(9, 10), Severity::Critical);
        assert_eq!(Severity::classify(7, 10), Severity::Warning);
        assert_eq!(Severity::classify(5, 10), Severity::Warning);
        assert_eq!(Severity::classify(4, 10), Severity::Monitoring);
        assert_eq!(Severity::classify(4, 0), Severity::Monitoring);
        assert_eq!(Severity::classify(20, 0), Severity::Critical);
    }

    #[test]
    fn eight_of_ten_is_warning() {
        let sev = Severity::classify(8, 10);
        assert_eq!(sev, Severity::Warning);
        assert_ne!(sev, Severity::Critical);
        assert_eq!(Severity::classify(4, 5), Severity::Warning);
        assert_eq!(Severity::classify(41, 50), Severity::Critical);
    }

    #[test]
    fn percentages() {
        assert_eq!(attempt_percent(8, 10), 80);
        assert_eq!(attempt_percent(1, 3), 33);
        assert_eq!(attempt_percent(2, 3), 67);
        assert_eq!(attempt_percent(25, 10), 100);
        assert_eq!(attempt_percent(5, 0), 50);
    }

    #[test]
    fn blocked_counts() {
        assert_eq!(blocked_count_tone(None), Tone::Secondary);
        assert_eq!(blocked_count_tone(Some(19)), Tone::Secondary);
        assert_eq!(blocked_count_tone(Some(20)), Tone::Warning);
        assert_eq!(blocked_count_tone(Some(50)), Tone::Danger);
    }

    #[test]
    fn fail2ban_states() {
        assert_eq!(Fail2banState::from_status(None), Fail2banState::Unknown);

        let mut status = Fail2banStatus {
            error: Some("fail2ban-client timed out".into()),
            ..Default::default()
        };
        assert_eq!(
            Fail2banState::from_status(Some(&status)).label(),
            "Error: fail2ban-client timed out"
        );

        status.error = None;
        assert_eq!(Fail2banState::from_status(Some(&status)), Fail2banState::NotInstalled);

        status.available = true;
        assert_eq!(Fail2banState::from_status(Some(&status)), Fail2banState::JailMissing);

        status.jail_exists = true;
        status.banned_ips = vec!["198.51.100.4".into(), "198.51.100.5".into()];
        let state = Fail2banState::from_status(Some(&status));
        assert_eq!(state, Fail2banState::Active { banned: 2 });
        assert!(state.is_usable());
        assert_eq!(state.label(), "Active (2 banned)");
    }
}
