//! Vote collection and ejection.
//!
//! Resolution is a pure function of the ballots, the alive list, the
//! impostor and a random source. Candidates are always visited in id order,
//! so a seeded source reproduces the same ejection.

use std::collections::BTreeMap;

use impostor_protocol::PlayerId;
use rand::Rng;

use crate::GameError;

/// How a vote was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    pub ejected: PlayerId,
    pub was_impostor: bool,
    /// Votes received per target. Targets with no votes are absent.
    pub counts: BTreeMap<PlayerId, u32>,
    /// The ejection was drawn at random because nobody voted.
    pub random: bool,
}

/// Ballots for one vote, one per voter.
#[derive(Debug, Clone, Default)]
pub struct VoteTally {
    ballots: BTreeMap<PlayerId, PlayerId>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `voter`'s ballot, replacing any earlier one.
    ///
    /// Both voter and target must be alive members.
    pub fn cast(
        &mut self,
        voter: PlayerId,
        target: PlayerId,
        is_alive: impl Fn(PlayerId) -> bool,
    ) -> Result<(), GameError> {
        if !is_alive(voter) {
            return Err(GameError::NotAlive);
        }
        if !is_alive(target) {
            return Err(GameError::InvalidTarget(target));
        }
        self.ballots.insert(voter, target);
        Ok(())
    }

    /// Drops ballots cast by or for a player who left.
    pub fn forget(&mut self, id: PlayerId) {
        self.ballots.remove(&id);
        self.ballots.retain(|_, target| *target != id);
    }

    pub fn clear(&mut self) {
        self.ballots.clear();
    }

    pub fn ballots(&self) -> &BTreeMap<PlayerId, PlayerId> {
        &self.ballots
    }

    pub fn has_voted(&self, voter: PlayerId) -> bool {
        self.ballots.contains_key(&voter)
    }

    pub fn len(&self) -> usize {
        self.ballots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty()
    }

    /// `true` once everyone in `alive` has a ballot in.
    pub fn is_complete(&self, alive: &[PlayerId]) -> bool {
        alive.iter().all(|id| self.ballots.contains_key(id))
    }

    /// Votes received per target.
    pub fn counts(&self) -> BTreeMap<PlayerId, u32> {
        let mut counts = BTreeMap::new();
        for target in self.ballots.values() {
            *counts.entry(*target).or_insert(0) += 1;
        }
        counts
    }

    /// Settles the vote.
    ///
    /// With no ballots a random alive member is ejected; otherwise the most
    /// voted target is, with ties drawn at random. Returns `None` only when
    /// `alive` is empty.
    pub fn resolve<R: Rng>(
        &self,
        alive: &[PlayerId],
        impostor: PlayerId,
        rng: &mut R,
    ) -> Option<VoteOutcome> {
        let counts = self.counts();

        let (ejected, random) = if counts.is_empty() {
            if alive.is_empty() {
                return None;
            }
            let mut candidates = alive.to_vec();
            candidates.sort();
            (candidates[rng.random_range(0..candidates.len())], true)
        } else {
            let max = counts.values().copied().max().unwrap_or(0);
            let leaders: Vec<PlayerId> = counts
                .iter()
                .filter(|&(_, &n)| n == max)
                .map(|(&id, _)| id)
                .collect();
            let pick = if leaders.len() == 1 {
                leaders[0]
            } else {
                leaders[rng.random_range(0..leaders.len())]
            };
            (pick, false)
        };

        Some(VoteOutcome {
            ejected,
            was_impostor: ejected == impostor,
            counts,
            random,
        })
    }
}
