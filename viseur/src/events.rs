use crate::CurrentTime;

/// Things that happened inside [`Viseur`](crate::Viseur) that the front end
/// may want to react to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViseurEvent {
    /// A gamelog was loaded and the game has started.
    Ready,
    GamelogLoaded,
    /// A streamed delta was appended to the gamelog.
    GamelogUpdated,
    /// The streamed gamelog is complete and will no longer change.
    GamelogFinalized,
    /// The current state changed to the one at this index.
    StateChanged(usize),
    /// The state passed through this index while skipping ahead.
    StateChangedStep(usize),
    TimeUpdated(CurrentTime),
    Playing,
    Paused,
}

/// Events waiting to be handled, drained once per frame.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<ViseurEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(16),
        }
    }

    pub fn push(&mut self, event: ViseurEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<ViseurEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViseurEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
