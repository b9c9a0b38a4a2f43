//! Progress reporting hooks.

/// Phase of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Schema,
    Content,
    Cleanup,
    DeleteSource,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Schema => "schema",
            Stage::Content => "content",
            Stage::Cleanup => "cleanup",
            Stage::DeleteSource => "delete-source",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationEvent {
    StageStarted(Stage),
    /// Root records queued for the content pass.
    ContentQueued { total: usize },
    /// Emitted after each root is dequeued; `remaining` never increases.
    RootProcessed { remaining: usize },
}

pub trait MigrationObserver {
    fn on_event(&mut self, _event: &MigrationEvent) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MigrationObserver for NoopObserver {}

impl MigrationObserver for Vec<MigrationEvent> {
    fn on_event(&mut self, event: &MigrationEvent) {
        self.push(*event);
    }
}
