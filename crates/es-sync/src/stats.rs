use es_core::{ScanJob, ScanStatus};

/// Percentage change of each headline figure against an earlier period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatTrends {
    pub findings_change: f64,
    pub critical_change: f64,
    pub completed_change: f64,
}

/// Source of historical comparisons for the dashboard.
pub trait TrendSource: Send + Sync {
    fn trends(&self, current: &DashboardStats) -> Option<StatTrends>;
}

/// No history available; trends are left out.
pub struct NoTrends;

impl TrendSource for NoTrends {
    fn trends(&self, _current: &DashboardStats) -> Option<StatTrends> {
        None
    }
}

/// Headline figures computed from the reconciled scan collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    /// Pending or running
    pub active_scans: usize,
    pub total_findings: u64,
    pub critical_findings: u64,
    pub completed_scans: usize,
    pub trends: Option<StatTrends>,
}

impl DashboardStats {
    pub fn from_scans(scans: &[ScanJob], trends: &dyn TrendSource) -> Self {
        let mut stats = scans.iter().fold(Self::default(), |mut stats, scan| {
            if scan.status.is_active() {
                stats.active_scans += 1;
            }
            if scan.status == ScanStatus::Completed {
                stats.completed_scans += 1;
            }
            stats.total_findings += u64::from(scan.vulnerabilities_found);
            stats.critical_findings += u64::from(scan.critical_count);
            stats
        });
        stats.trends = trends.trends(&stats);
        stats
    }
}
