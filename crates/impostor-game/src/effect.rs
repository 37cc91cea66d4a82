//! Effects produced by room transitions.
//!
//! The round controller never touches sockets or clocks. Each operation
//! returns [`Effects`]: events to deliver and timer instructions, which the
//! room actor carries out in order.

use std::time::Duration;

use impostor_protocol::{PlayerId, Recipient, ServerEvent};

/// The timeout a room is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Role reveal before the first round.
    Reveal,
    /// The current speaker's turn.
    Turn,
    /// The vote window.
    Vote,
    /// Results display before the next round.
    NextRound,
    /// Results display before `gameOver`.
    Finish,
}

/// Identifies one armed timer. A firing whose ticket no longer matches the
/// room's pending ticket is stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerTicket {
    pub kind: TimerKind,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver an event to the matching current members.
    Send { to: Recipient, event: ServerEvent },
    /// Arm the room's timer, replacing whatever was armed.
    ArmTimer { ticket: TimerTicket, after: Duration },
    /// Disarm the room's timer.
    CancelTimer,
}

/// Ordered effects of one transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects(Vec<Effect>);

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broadcast(&mut self, event: ServerEvent) {
        self.0.push(Effect::Send {
            to: Recipient::All,
            event,
        });
    }

    pub fn to(&mut self, player: PlayerId, event: ServerEvent) {
        self.0.push(Effect::Send {
            to: Recipient::Player(player),
            event,
        });
    }

    pub fn except(&mut self, player: PlayerId, event: ServerEvent) {
        self.0.push(Effect::Send {
            to: Recipient::AllExcept(player),
            event,
        });
    }

    pub fn arm(&mut self, ticket: TimerTicket, after: Duration) {
        self.0.push(Effect::ArmTimer { ticket, after });
    }

    pub fn cancel(&mut self) {
        self.0.push(Effect::CancelTimer);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Effect> {
        self.0.iter()
    }

    /// Events `player` would receive, in order.
    pub fn events_for(&self, player: PlayerId) -> Vec<&ServerEvent> {
        self.0
            .iter()
            .filter_map(|effect| match effect {
                Effect::Send { to, event } if to.includes(player) => Some(event),
                _ => None,
            })
            .collect()
    }

    /// Every event regardless of recipient, in order.
    pub fn events(&self) -> Vec<&ServerEvent> {
        self.0
            .iter()
            .filter_map(|effect| match effect {
                Effect::Send { event, .. } => Some(event),
                _ => None,
            })
            .collect()
    }
}

impl IntoIterator for Effects {
    type Item = Effect;
    type IntoIter = std::vec::IntoIter<Effect>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
