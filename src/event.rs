// src/event.rs

/// ===============================
/// Driver-side timed events
/// ===============================

/// Longest message carried inline. Channel-voice MIDI messages fit in three bytes.
pub const MAX_EVENT_BYTES: usize = 3;

/// A raw MIDI-like message.
///
/// Stored inline so that event queues never allocate on the audio thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMessage {
    bytes: [u8; MAX_EVENT_BYTES],
    len: u8,
}

impl RawMessage {
    /// Wrap up to three bytes. Longer input is truncated.
    pub fn new(data: &[u8]) -> Self {
        let len = data.len().min(MAX_EVENT_BYTES);
        let mut bytes = [0; MAX_EVENT_BYTES];
        bytes[..len].copy_from_slice(&data[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F])
    }

    pub fn note_off(channel: u8, note: u8) -> Self {
        Self::new(&[0x80 | (channel & 0x0F), note & 0x7F, 0])
    }

    pub fn control_change(channel: u8, controller: u8, value: u8) -> Self {
        Self::new(&[0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F])
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

/// A message tagged with its frame offset inside the current callback.
///
/// A callback's queue must be sorted by offset (non-decreasing) and every
/// offset must lie in `[0, frames)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub offset: usize,
    pub message: RawMessage,
}

impl Event {
    pub fn new(offset: usize, message: RawMessage) -> Self {
        Self { offset, message }
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        self.message.as_bytes()
    }
}

/// ===============================
/// Unit-side parsed messages
/// ===============================

/// The subset of channel-voice messages the bundled units react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    NoteOn { note: u8, velocity: u8 },

    NoteOff { note: u8, velocity: u8 },

    ControlChange { controller: u8, value: u8 },

    Other,
}

impl Message {
    /// Decode a raw message. Short or unknown messages map to [`Message::Other`].
    pub fn parse(data: &[u8]) -> Self {
        match data {
            [status, note, velocity, ..] if status & 0xF0 == 0x90 => Message::NoteOn {
                note: *note,
                velocity: *velocity,
            },
            [status, note, velocity, ..] if status & 0xF0 == 0x80 => Message::NoteOff {
                note: *note,
                velocity: *velocity,
            },
            [status, controller, value, ..] if status & 0xF0 == 0xB0 => {
                Message::ControlChange {
                    controller: *controller,
                    value: *value,
                }
            }
            _ => Message::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_message_round_trips_bytes() {
        let msg = RawMessage::note_on(2, 60, 100);
        assert_eq!(msg.as_bytes(), &[0x92, 60, 100]);
    }

    #[test]
    fn raw_message_truncates_long_input() {
        let msg = RawMessage::new(&[0xF0, 1, 2, 3, 4]);
        assert_eq!(msg.as_bytes().len(), MAX_EVENT_BYTES);
    }

    #[test]
    fn parse_note_messages() {
        assert_eq!(
            Message::parse(&[0x90, 64, 90]),
            Message::NoteOn {
                note: 64,
                velocity: 90
            }
        );
        assert_eq!(
            Message::parse(&[0x83, 64, 0]),
            Message::NoteOff {
                note: 64,
                velocity: 0
            }
        );
    }

    #[test]
    fn parse_short_message_is_other() {
        assert_eq!(Message::parse(&[0x90, 64]), Message::Other);
        assert_eq!(Message::parse(&[]), Message::Other);
        assert_eq!(Message::parse(&[0xE0, 0, 64]), Message::Other);
    }
}
