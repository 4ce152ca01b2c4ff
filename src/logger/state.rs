// Logger lifecycle

/// Lifecycle of a [`super::MetricLogger`].
///
/// Enabled loggers are `Active` as soon as construction returns; a disabled
/// logger stays `NotStarted` for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    NotStarted,
    Active,
    Finished,
}

impl LoggerState {
    pub fn is_active(&self) -> bool {
        matches!(self, LoggerState::Active)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, LoggerState::Finished)
    }
}
