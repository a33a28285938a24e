// src/splitter.rs

use crate::event::Event;

//
// ===============================
// MARK: Sub-block steps
// ===============================
//

/// One step of a split callback.
///
/// Produced by [`EventSplitter`].
/// Consumed by the Engine (audio thread).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    /// Render `frames` frames starting at `offset` within the callback.
    ///
    /// Never zero-length.
    Render { offset: usize, frames: usize },

    /// Deliver an event before any audio at or after its offset is produced.
    Deliver(&'a Event),
}

//
// ===============================
// MARK: Event splitter
// ===============================
//

/// Partitions one callback into event-free sub-blocks.
///
/// Invariants:
/// - Render lengths sum to exactly the callback's frame count
/// - Every event is yielded exactly once, in queue order
/// - Events sharing an offset are all yielded before audio for that offset
/// - No allocation; safe to drive from the audio thread
///
/// The queue must be sorted and every offset must lie in `[0, frames)`.
/// Out-of-range offsets are clamped to `frames` so the frame count still adds up.
#[derive(Debug, Clone)]
pub struct EventSplitter<'a> {
    frames: usize,
    events: &'a [Event],
    cursor: usize,
    next_event: usize,
}

impl<'a> EventSplitter<'a> {
    pub fn new(frames: usize, events: &'a [Event]) -> Self {
        Self {
            frames,
            events,
            cursor: 0,
            next_event: 0,
        }
    }
}

impl<'a> Iterator for EventSplitter<'a> {
    type Item = Step<'a>;

    fn next(&mut self) -> Option<Step<'a>> {
        if let Some(event) = self.events.get(self.next_event) {
            let boundary = event.offset.min(self.frames).max(self.cursor);

            if boundary > self.cursor {
                let step = Step::Render {
                    offset: self.cursor,
                    frames: boundary - self.cursor,
                };
                self.cursor = boundary;
                return Some(step);
            }

            self.next_event += 1;
            return Some(Step::Deliver(event));
        }

        if self.cursor < self.frames {
            let step = Step::Render {
                offset: self.cursor,
                frames: self.frames - self.cursor,
            };
            self.cursor = self.frames;
            return Some(step);
        }

        None
    }
}
