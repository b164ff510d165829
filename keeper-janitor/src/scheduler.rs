use std::time::Duration;

use crate::cleanup::Cleaner;

/// What the loop does before its first cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartupMode {
    /// Run a cycle as soon as the loop starts.
    Immediate,
    /// Wait one full interval before the first cycle.
    Delayed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SchedulerState {
    Idle,
    Running,
}

/// Run cleanup cycles forever, one at a time, waiting `interval` after each cycle completes.
///
/// A cycle that overruns the interval pushes the next one back; cycles are never stacked.
pub async fn cleanup_loop<C>(
    cleaner: C,
    interval: Duration,
    startup: StartupMode,
) -> eyre::Result<()>
where
    C: Cleaner,
{
    let mut state = SchedulerState::Idle;

    if startup == StartupMode::Delayed {
        tracing::debug!(
            ?state,
            interval_secs = interval.as_secs(),
            "waiting before first cycle"
        );
        tokio::time::sleep(interval).await;
    }

    loop {
        state = SchedulerState::Running;
        tracing::debug!(?state, "starting cleanup cycle");
        cleaner.cleanup().await;

        state = SchedulerState::Idle;
        tracing::debug!(
            ?state,
            interval_secs = interval.as_secs(),
            "next cleanup cycle scheduled"
        );
        tokio::time::sleep(interval).await;
    }
}
