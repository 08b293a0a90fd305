//! Whether the site may publish sitemaps right now.

/// Site-level gate checked before scheduling and before every task.
///
/// Any `Fn() -> bool` closure is a valid check, which lets hosts wire in a
/// live setting lookup.
pub trait SiteEligibility: Send + Sync {
    /// `true` when sitemaps may be generated.
    fn is_eligible(&self) -> bool;
}

/// A fixed answer, usually taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticEligibility(pub bool);

impl SiteEligibility for StaticEligibility {
    fn is_eligible(&self) -> bool {
        self.0
    }
}

impl<F> SiteEligibility for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_eligible(&self) -> bool {
        self()
    }
}
