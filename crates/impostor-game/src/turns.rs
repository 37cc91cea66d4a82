//! Clue-turn rotation.
//!
//! The scheduler owns the round's speaking order and a cursor into it.
//! Finding the next speaker scans at most one lap from the cursor, so a
//! round always ends even if every remaining player has gone quiet.

use std::collections::BTreeSet;

use impostor_protocol::PlayerId;

use crate::GameError;

/// One recorded turn: a clue, or a skip when the speaker timed out or left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clue {
    pub from: PlayerId,
    pub text: String,
    pub skipped: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TurnScheduler {
    order: Vec<PlayerId>,
    cursor: usize,
    submitted: BTreeSet<PlayerId>,
    holder: Option<PlayerId>,
    clues: Vec<Clue>,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new clue phase over `order`, with the cursor at `start`
    /// (wrapped into range).
    pub fn begin(&mut self, order: Vec<PlayerId>, start: usize) {
        self.cursor = if order.is_empty() { 0 } else { start % order.len() };
        self.order = order;
        self.submitted.clear();
        self.clues.clear();
        self.holder = None;
    }

    /// Forgets everything, as between games.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Picks the next speaker: the first id at or after the cursor, within
    /// one lap, that is eligible and has not had a turn yet. The cursor
    /// moves onto the chosen id.
    ///
    /// Returns `None` when nobody is left, which ends the clue phase.
    pub fn next_speaker(&mut self, is_eligible: impl Fn(PlayerId) -> bool) -> Option<PlayerId> {
        self.holder = None;
        let len = self.order.len();
        for step in 0..len {
            let index = (self.cursor + step) % len;
            let id = self.order[index];
            if is_eligible(id) && !self.submitted.contains(&id) {
                self.cursor = index;
                self.holder = Some(id);
                return Some(id);
            }
        }
        None
    }

    /// Records a clue from the current holder and moves past them.
    pub fn submit(&mut self, from: PlayerId, text: String) -> Result<&Clue, GameError> {
        if self.holder != Some(from) {
            return Err(GameError::NotYourTurn);
        }
        Ok(self.record(from, text, false))
    }

    /// Records an empty turn for the current holder and moves past them.
    pub fn skip_current(&mut self) -> Option<&Clue> {
        let holder = self.holder?;
        Some(self.record(holder, String::new(), true))
    }

    fn record(&mut self, from: PlayerId, text: String, skipped: bool) -> &Clue {
        self.submitted.insert(from);
        self.holder = None;
        self.advance();
        self.clues.push(Clue {
            from,
            text,
            skipped,
        });
        &self.clues[self.clues.len() - 1]
    }

    fn advance(&mut self) {
        if self.order.is_empty() {
            self.cursor = 0;
        } else {
            self.cursor = (self.cursor + 1) % self.order.len();
        }
    }

    /// Drops a player from the order. The rest keep their relative order
    /// and the cursor keeps pointing at the same upcoming player.
    ///
    /// Returns `false` if the player was not in the order.
    pub fn remove(&mut self, id: PlayerId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.order.remove(index);
        self.submitted.remove(&id);
        if self.holder == Some(id) {
            self.holder = None;
        }
        if index < self.cursor {
            self.cursor -= 1;
        }
        if self.cursor >= self.order.len() {
            self.cursor = 0;
        }
        true
    }

    /// Moves the cursor to `index`, wrapped into range.
    pub fn seek(&mut self, index: usize) {
        self.cursor = if self.order.is_empty() {
            0
        } else {
            index % self.order.len()
        };
    }

    pub fn position(&self, id: PlayerId) -> Option<usize> {
        self.order.iter().position(|&p| p == id)
    }

    pub fn order(&self) -> &[PlayerId] {
        &self.order
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn holder(&self) -> Option<PlayerId> {
        self.holder
    }

    pub fn submitted(&self) -> &BTreeSet<PlayerId> {
        &self.submitted
    }

    pub fn clues(&self) -> &[Clue] {
        &self.clues
    }
}
