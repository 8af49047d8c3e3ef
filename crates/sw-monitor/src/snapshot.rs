use chrono::{DateTime, Utc};
use sw_client::types::{ActiveCalls, CdrList, LogList, SystemStatus};

/// Dashboard regions refreshed independently on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Status,
    ActiveCalls,
    Cdr,
    Logs,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::Status, Region::ActiveCalls, Region::Cdr, Region::Logs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Status => "status",
            Region::ActiveCalls => "active-calls",
            Region::Cdr => "cdr",
            Region::Logs => "logs",
        }
    }
}

/// Latest successful response per region. `None` until the first success.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub status: Option<SystemStatus>,
    pub calls: Option<ActiveCalls>,
    pub cdr: Option<CdrList>,
    pub logs: Option<LogList>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Set when the backend rejected the session cookie.
    pub session_expired: bool,
}

#[derive(Debug, Clone)]
pub enum RegionUpdate {
    Status(SystemStatus),
    ActiveCalls(ActiveCalls),
    Cdr(CdrList),
    Logs(LogList),
}

impl RegionUpdate {
    pub fn region(&self) -> Region {
        match self {
            RegionUpdate::Status(_) => Region::Status,
            RegionUpdate::ActiveCalls(_) => Region::ActiveCalls,
            RegionUpdate::Cdr(_) => Region::Cdr,
            RegionUpdate::Logs(_) => Region::Logs,
        }
    }
}

impl DashboardSnapshot {
    /// Overwrite one region. Whatever lands last wins.
    pub fn apply(&mut self, update: RegionUpdate) {
        match update {
            RegionUpdate::Status(s) => self.status = Some(s),
            RegionUpdate::ActiveCalls(c) => self.calls = Some(c),
            RegionUpdate::Cdr(c) => self.cdr = Some(c),
            RegionUpdate::Logs(l) => self.logs = Some(l),
        }
        self.updated_at = Some(Utc::now());
        self.session_expired = false;
    }

    /// Active call count, preferring the backend's own counter.
    pub fn call_count(&self) -> usize {
        self.calls
            .as_ref()
            .map(|c| if c.count > 0 { c.count } else { c.calls.len() })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_client::types::ActiveCall;

    #[test]
    fn apply_overwrites_region() {
        let mut snap = DashboardSnapshot::default();
        snap.apply(RegionUpdate::Cdr(CdrList { calls: vec![], count: 3 }));
        snap.apply(RegionUpdate::Cdr(CdrList { calls: vec![], count: 7 }));
        assert_eq!(snap.cdr.unwrap().count, 7);
        assert!(snap.status.is_none());
    }

    #[test]
    fn call_count_falls_back_to_rows() {
        let mut snap = DashboardSnapshot::default();
        assert_eq!(snap.call_count(), 0);
        snap.apply(RegionUpdate::ActiveCalls(ActiveCalls {
            calls: vec![ActiveCall::default(), ActiveCall::default()],
            count: 0,
            error: None,
        }));
        assert_eq!(snap.call_count(), 2);
    }

    #[test]
    fn success_clears_expired_flag() {
        let mut snap = DashboardSnapshot {
            session_expired: true,
            ..Default::default()
        };
        snap.apply(RegionUpdate::Logs(LogList::default()));
        assert!(!snap.session_expired);
        assert!(snap.updated_at.is_some());
    }
}
