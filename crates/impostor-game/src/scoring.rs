//! Round scoring.

use std::collections::BTreeMap;

use impostor_protocol::PlayerId;

/// Who earns a point this round. Exactly one of the two applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreAward {
    /// Everyone who voted for the impostor, in id order.
    Detectives(Vec<PlayerId>),
    /// Nobody found the impostor, who scores instead.
    Impostor(PlayerId),
}

impl ScoreAward {
    /// Players receiving one point each.
    pub fn recipients(&self) -> &[PlayerId] {
        match self {
            Self::Detectives(ids) => ids,
            Self::Impostor(id) => std::slice::from_ref(id),
        }
    }
}

/// Scores a round from its ballots (voter → target).
pub fn score_round(ballots: &BTreeMap<PlayerId, PlayerId>, impostor: PlayerId) -> ScoreAward {
    let detectives: Vec<PlayerId> = ballots
        .iter()
        .filter(|&(_, &target)| target == impostor)
        .map(|(&voter, _)| voter)
        .collect();
    if detectives.is_empty() {
        ScoreAward::Impostor(impostor)
    } else {
        ScoreAward::Detectives(detectives)
    }
}
