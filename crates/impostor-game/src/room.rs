//! The round controller: one room's game state and its transitions.
//!
//! ```text
//! Lobby → Reveal → ClueTurns → Vote → Results → ClueTurns …
//!                                        ↘ GameOver → Lobby
//! ```
//!
//! Every operation either fails with a [`GameError`] and leaves the room
//! untouched, or mutates the room and returns the [`Effects`] the actor must
//! carry out. Timer firings come back in through [`Room::on_timer`].

use std::collections::BTreeMap;
use std::fmt;

use impostor_protocol::{
    GameOverReason, PlayerId, Role, RoomId, RoomSummary, RoundResult, ServerEvent, Standing,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_WORDS, whole_secs};
use crate::effect::{Effects, TimerKind, TimerTicket};
use crate::roster::Roster;
use crate::scoring::score_round;
use crate::turns::TurnScheduler;
use crate::votes::VoteTally;
use crate::{GameConfig, GameError};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for the host to start. Joins and ready flags are only
    /// accepted here.
    Lobby,
    /// Roles have been dealt; the first round has not begun.
    Reveal,
    ClueTurns,
    Vote,
    /// An ejection is being shown before the next round.
    Results,
    /// The game is decided; `gameOver` goes out when the timer fires.
    GameOver,
}

impl Phase {
    /// `true` from the moment a game starts until the room is back in the
    /// lobby.
    pub fn in_game(self) -> bool {
        !matches!(self, Self::Lobby)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::Reveal => write!(f, "reveal"),
            Self::ClueTurns => write!(f, "clue turns"),
            Self::Vote => write!(f, "vote"),
            Self::Results => write!(f, "results"),
            Self::GameOver => write!(f, "game over"),
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One room's state machine.
pub struct Room {
    id: RoomId,
    config: GameConfig,
    roster: Roster,
    phase: Phase,
    word: Option<String>,
    impostor: Option<PlayerId>,
    /// Members of the current game. Ejected players map to `false`;
    /// players who left are removed.
    alive: BTreeMap<PlayerId, bool>,
    turns: TurnScheduler,
    votes: VoteTally,
    round: u32,
    pending: Option<TimerTicket>,
    next_generation: u64,
    /// Why the game ended and the standings at that moment, held until
    /// the `Finish` timer announces them.
    verdict: Option<(GameOverReason, Vec<Standing>)>,
    rng: StdRng,
}

impl Room {
    /// Creates an empty room seeded from the OS.
    pub fn new(id: RoomId, config: GameConfig) -> Self {
        Self::with_rng(id, config, StdRng::from_os_rng())
    }

    /// Creates an empty room whose draws (word, impostor, first speaker,
    /// tie-breaks) are reproducible.
    pub fn with_seed(id: RoomId, config: GameConfig, seed: u64) -> Self {
        Self::with_rng(id, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(id: RoomId, config: GameConfig, rng: StdRng) -> Self {
        let roster = Roster::new(config.max_players, config.max_name_chars);
        Self {
            id,
            config,
            roster,
            phase: Phase::Lobby,
            word: None,
            impostor: None,
            alive: BTreeMap::new(),
            turns: TurnScheduler::new(),
            votes: VoteTally::new(),
            round: 0,
            pending: None,
            next_generation: 0,
            verdict: None,
            rng,
        }
    }

    // -- Roster --------------------------------------------------------------

    /// Adds a member. Only possible in the lobby.
    pub fn join(&mut self, player: PlayerId, name: Option<&str>) -> Result<Effects, GameError> {
        if self.roster.contains(player) {
            return Err(GameError::AlreadyJoined(player));
        }
        if self.phase.in_game() {
            return Err(GameError::GameInProgress);
        }
        let summary = self.roster.add(player, name)?.summary();

        info!(
            room_id = %self.id,
            player_id = %player,
            name = %summary.name,
            players = self.roster.len(),
            "player joined"
        );

        let mut fx = Effects::new();
        fx.to(
            player,
            ServerEvent::Joined {
                room: self.id.clone(),
                host_id: self.roster.host().unwrap_or(player),
                players: self.roster.summaries(),
            },
        );
        fx.except(
            player,
            ServerEvent::PlayerJoined {
                room: self.id.clone(),
                player: summary,
            },
        );
        fx.broadcast(self.lobby_info());
        Ok(fx)
    }

    /// Removes a member, whether they asked to leave or their connection
    /// dropped. A departure during a game is folded into the current phase.
    pub fn leave(&mut self, player: PlayerId) -> Result<Effects, GameError> {
        let departure = self
            .roster
            .remove(player)
            .ok_or(GameError::UnknownPlayer(player))?;

        info!(
            room_id = %self.id,
            player_id = %player,
            phase = %self.phase,
            players = self.roster.len(),
            "player left"
        );

        let mut fx = Effects::new();
        fx.broadcast(ServerEvent::PlayerLeft {
            room: self.id.clone(),
            id: player,
        });
        if let Some(host_id) = departure.new_host {
            fx.broadcast(ServerEvent::HostChanged { host_id });
        }
        fx.broadcast(self.lobby_info());

        if self.phase.in_game() {
            self.fold_departure(player, &mut fx);
        }
        Ok(fx)
    }

    fn fold_departure(&mut self, player: PlayerId, fx: &mut Effects) {
        self.alive.remove(&player);
        self.votes.forget(player);

        if self.phase == Phase::GameOver {
            return;
        }
        if self.impostor == Some(player) {
            self.turns.remove(player);
            self.conclude(GameOverReason::ImpostorLeft, fx);
            return;
        }
        if self.alive_count() <= 2 {
            self.turns.remove(player);
            self.conclude(GameOverReason::TooFewPlayers, fx);
            return;
        }

        match self.phase {
            Phase::ClueTurns if self.turns.holder() == Some(player) => {
                self.skip_holder(fx);
                self.turns.remove(player);
                self.advance_turn(fx);
            }
            Phase::Vote => {
                self.turns.remove(player);
                if self.votes.is_complete(&self.alive_ids()) {
                    self.cancel_timer(fx);
                    self.resolve_vote(fx);
                }
            }
            _ => {
                self.turns.remove(player);
            }
        }
    }

    /// Sets or clears a member's ready flag. Lobby only.
    pub fn set_ready(&mut self, player: PlayerId, ready: bool) -> Result<Effects, GameError> {
        self.require_member(player)?;
        if self.phase != Phase::Lobby {
            return Err(GameError::WrongPhase {
                action: "change ready state",
                phase: self.phase,
            });
        }
        self.roster.set_ready(player, ready)?;

        let mut fx = Effects::new();
        if ready {
            fx.broadcast(ServerEvent::PlayerReady { id: player });
            if self.roster.all_ready() {
                fx.broadcast(ServerEvent::AllReady);
            }
        } else {
            fx.broadcast(ServerEvent::PlayerUnready { id: player });
        }
        Ok(fx)
    }

    // -- Game ----------------------------------------------------------------

    /// Deals roles and starts the reveal countdown. Host only.
    pub fn start_game(&mut self, player: PlayerId) -> Result<Effects, GameError> {
        self.require_member(player)?;
        if self.phase != Phase::Lobby {
            return Err(GameError::WrongPhase {
                action: "start the game",
                phase: self.phase,
            });
        }
        if self.roster.host() != Some(player) {
            return Err(GameError::NotHost);
        }
        if self.roster.len() < self.config.min_players {
            return Err(GameError::NotEnoughPlayers {
                required: self.config.min_players,
                present: self.roster.len(),
            });
        }
        if self.config.require_all_ready && !self.roster.all_ready() {
            return Err(GameError::NotAllReady);
        }

        let word = self.draw_word();
        let members = self.roster.ids();
        let impostor = members[self.rng.random_range(0..members.len())];

        self.word = Some(word.clone());
        self.impostor = Some(impostor);
        self.alive = members.iter().map(|&id| (id, true)).collect();
        self.turns.clear();
        self.votes.clear();
        self.round = 0;
        self.verdict = None;
        self.phase = Phase::Reveal;

        info!(
            room_id = %self.id,
            players = members.len(),
            impostor = %impostor,
            "game started"
        );

        let mut fx = Effects::new();
        for &id in &members {
            let role = if id == impostor {
                Role::Impostor
            } else {
                Role::Crew { word: word.clone() }
            };
            fx.to(
                id,
                ServerEvent::GameStarted {
                    role,
                    reveal_seconds: whole_secs(self.config.reveal_delay),
                    turn_seconds: whole_secs(self.config.turn_timeout),
                    vote_seconds: whole_secs(self.config.vote_timeout),
                },
            );
        }
        self.arm(TimerKind::Reveal, &mut fx);
        Ok(fx)
    }

    fn draw_word(&mut self) -> String {
        let words: Vec<&String> = self
            .config
            .words
            .iter()
            .filter(|w| !w.trim().is_empty())
            .collect();
        if words.is_empty() {
            let index = self.rng.random_range(0..DEFAULT_WORDS.len());
            return DEFAULT_WORDS[index].to_string();
        }
        words[self.rng.random_range(0..words.len())].trim().to_string()
    }

    /// Records the current speaker's clue and hands the turn on.
    pub fn submit_clue(&mut self, player: PlayerId, text: &str) -> Result<Effects, GameError> {
        self.require_member(player)?;
        if self.phase != Phase::ClueTurns {
            return Err(GameError::WrongPhase {
                action: "submit a clue",
                phase: self.phase,
            });
        }
        if !self.is_alive(player) {
            return Err(GameError::NotAlive);
        }
        let text: String = text.trim().chars().take(self.config.max_clue_chars).collect();
        let clue = self.turns.submit(player, text)?.clone();

        debug!(room_id = %self.id, player_id = %player, "clue submitted");

        let mut fx = Effects::new();
        fx.broadcast(ServerEvent::ClueReceived {
            from: clue.from,
            text: clue.text,
            count: self.turns.submitted().len(),
            total: self.turns.order().len(),
            skipped: false,
        });
        self.cancel_timer(&mut fx);
        self.advance_turn(&mut fx);
        Ok(fx)
    }

    /// Records a ballot. The vote closes as soon as every alive member has
    /// one in.
    pub fn vote(&mut self, player: PlayerId, target: PlayerId) -> Result<Effects, GameError> {
        self.require_member(player)?;
        if self.phase != Phase::Vote {
            return Err(GameError::WrongPhase {
                action: "vote",
                phase: self.phase,
            });
        }
        let alive = &self.alive;
        self.votes
            .cast(player, target, |id| alive.get(&id) == Some(&true))?;

        debug!(room_id = %self.id, player_id = %player, target = %target, "vote cast");

        let mut fx = Effects::new();
        fx.broadcast(ServerEvent::VoteReceived { from: player });
        if self.votes.is_complete(&self.alive_ids()) {
            self.cancel_timer(&mut fx);
            self.resolve_vote(&mut fx);
        }
        Ok(fx)
    }

    /// Handles a timer firing. Stale tickets produce no effects.
    pub fn on_timer(&mut self, ticket: TimerTicket) -> Effects {
        let mut fx = Effects::new();
        if self.pending != Some(ticket) {
            debug!(
                room_id = %self.id,
                kind = ?ticket.kind,
                generation = ticket.generation,
                "ignoring stale timer"
            );
            return fx;
        }
        self.pending = None;

        match ticket.kind {
            TimerKind::Reveal | TimerKind::NextRound => self.start_round(&mut fx),
            TimerKind::Turn => {
                if let Some(holder) = self.turns.holder() {
                    debug!(room_id = %self.id, player_id = %holder, "turn timed out");
                }
                self.skip_holder(&mut fx);
                self.advance_turn(&mut fx);
            }
            TimerKind::Vote => self.resolve_vote(&mut fx),
            TimerKind::Finish => self.finish_game(&mut fx),
        }
        fx
    }

    // -- Transitions -----------------------------------------------------------

    fn start_round(&mut self, fx: &mut Effects) {
        self.round += 1;
        let order: Vec<PlayerId> = self
            .roster
            .ids()
            .into_iter()
            .filter(|id| self.is_alive(*id))
            .collect();
        let start = if self.round == 1 {
            self.rng.random_range(0..order.len().max(1))
        } else {
            // Left pointing at whoever followed the ejected player.
            self.turns.cursor()
        };
        self.turns.begin(order.clone(), start);
        self.votes.clear();
        self.phase = Phase::ClueTurns;

        info!(room_id = %self.id, round = self.round, alive = order.len(), "round started");

        fx.broadcast(ServerEvent::RoundStarted {
            round: self.round,
            order,
            alive: self.alive.clone(),
        });
        self.advance_turn(fx);
    }

    fn skip_holder(&mut self, fx: &mut Effects) {
        let Some(clue) = self.turns.skip_current().cloned() else {
            return;
        };
        fx.broadcast(ServerEvent::ClueReceived {
            from: clue.from,
            text: clue.text,
            count: self.turns.submitted().len(),
            total: self.turns.order().len(),
            skipped: true,
        });
    }

    fn advance_turn(&mut self, fx: &mut Effects) {
        let alive = &self.alive;
        match self.turns.next_speaker(|id| alive.get(&id) == Some(&true)) {
            Some(id) => {
                fx.broadcast(ServerEvent::TurnStarted {
                    id,
                    seconds: whole_secs(self.config.turn_timeout),
                });
                self.arm(TimerKind::Turn, fx);
            }
            None => {
                fx.broadcast(ServerEvent::AllCluesSubmitted);
                self.open_vote(fx);
            }
        }
    }

    fn open_vote(&mut self, fx: &mut Effects) {
        self.phase = Phase::Vote;
        self.votes.clear();
        let alive = &self.alive;
        let players = self.roster.statuses(|id| alive.get(&id) == Some(&true));
        fx.broadcast(ServerEvent::VotingStarted {
            players,
            seconds: whole_secs(self.config.vote_timeout),
        });
        self.arm(TimerKind::Vote, fx);
    }

    fn resolve_vote(&mut self, fx: &mut Effects) {
        let Some(impostor) = self.impostor else {
            warn!(room_id = %self.id, "vote closed without an impostor");
            return;
        };
        let alive_ids = self.alive_ids();
        let Some(outcome) = self.votes.resolve(&alive_ids, impostor, &mut self.rng) else {
            warn!(room_id = %self.id, "vote closed with nobody alive");
            return;
        };

        let award = score_round(self.votes.ballots(), impostor);
        for &id in award.recipients() {
            self.roster.add_score(id, 1);
        }
        self.votes.clear();

        let ejected = outcome.ejected;
        self.alive.insert(ejected, false);
        if let Some(position) = self.turns.position(ejected) {
            self.turns.remove(ejected);
            self.turns.seek(position);
        }
        self.phase = Phase::Results;

        info!(
            room_id = %self.id,
            round = self.round,
            ejected = %ejected,
            was_impostor = outcome.was_impostor,
            random = outcome.random,
            "player ejected"
        );

        let results = self
            .roster
            .iter()
            .map(|p| RoundResult {
                id: p.id,
                name: p.name.clone(),
                votes: outcome.counts.get(&p.id).copied().unwrap_or(0),
                was_impostor: outcome.was_impostor && p.id == ejected,
                score: p.score,
            })
            .collect();
        fx.broadcast(ServerEvent::RoundResults { results });
        fx.broadcast(ServerEvent::PlayerEjected {
            id: ejected,
            was_impostor: outcome.was_impostor,
            alive: self.alive.clone(),
        });

        if outcome.was_impostor {
            self.conclude(GameOverReason::ImpostorEjected, fx);
        } else if self.alive_count() <= 2 {
            self.conclude(GameOverReason::TooFewPlayers, fx);
        } else {
            self.arm(TimerKind::NextRound, fx);
        }
    }

    fn conclude(&mut self, reason: GameOverReason, fx: &mut Effects) {
        self.phase = Phase::GameOver;
        self.verdict = Some((reason, self.roster.standings()));
        self.arm(TimerKind::Finish, fx);
    }

    fn finish_game(&mut self, fx: &mut Effects) {
        let (reason, standings) = self
            .verdict
            .take()
            .unwrap_or_else(|| (GameOverReason::TooFewPlayers, self.roster.standings()));

        info!(room_id = %self.id, reason = ?reason, rounds = self.round, "game over");

        fx.broadcast(ServerEvent::GameOver {
            standings,
            impostor_id: self.impostor,
            word: self.word.clone(),
            reason,
        });

        self.phase = Phase::Lobby;
        self.word = None;
        self.impostor = None;
        self.alive.clear();
        self.turns.clear();
        self.votes.clear();
        self.round = 0;
        self.roster.clear_ready();
        fx.broadcast(self.lobby_info());
    }

    // -- Timer bookkeeping -----------------------------------------------------

    fn arm(&mut self, kind: TimerKind, fx: &mut Effects) {
        let after = match kind {
            TimerKind::Reveal => self.config.reveal_delay,
            TimerKind::Turn => self.config.turn_timeout,
            TimerKind::Vote => self.config.vote_timeout,
            TimerKind::NextRound => self.config.results_delay,
            TimerKind::Finish => self.config.game_over_delay,
        };
        self.next_generation += 1;
        let ticket = TimerTicket {
            kind,
            generation: self.next_generation,
        };
        self.pending = Some(ticket);
        fx.arm(ticket, after);
    }

    fn cancel_timer(&mut self, fx: &mut Effects) {
        if self.pending.take().is_some() {
            fx.cancel();
        }
    }

    // -- Queries ---------------------------------------------------------------

    fn require_member(&self, player: PlayerId) -> Result<(), GameError> {
        if self.roster.contains(player) {
            Ok(())
        } else {
            Err(GameError::UnknownPlayer(player))
        }
    }

    fn lobby_info(&self) -> ServerEvent {
        ServerEvent::LobbyInfo {
            room: self.id.clone(),
            count: self.roster.len(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.roster.host()
    }

    pub fn member_ids(&self) -> Vec<PlayerId> {
        self.roster.ids()
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }

    pub fn impostor(&self) -> Option<PlayerId> {
        self.impostor
    }

    pub fn is_alive(&self, player: PlayerId) -> bool {
        self.alive.get(&player) == Some(&true)
    }

    /// The alive map of the current game.
    pub fn alive(&self) -> &BTreeMap<PlayerId, bool> {
        &self.alive
    }

    /// Alive members in id order.
    pub fn alive_ids(&self) -> Vec<PlayerId> {
        self.alive
            .iter()
            .filter(|&(_, &alive)| alive)
            .map(|(&id, _)| id)
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.alive.values().filter(|&&alive| alive).count()
    }

    pub fn turns(&self) -> &TurnScheduler {
        &self.turns
    }

    pub fn turn_holder(&self) -> Option<PlayerId> {
        self.turns.holder()
    }

    pub fn votes(&self) -> &VoteTally {
        &self.votes
    }

    pub fn score(&self, player: PlayerId) -> Option<u32> {
        self.roster.get(player).map(|p| p.score)
    }

    /// The timer the room is waiting on, if any.
    pub fn pending_timer(&self) -> Option<TimerTicket> {
        self.pending
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            count: self.roster.len(),
            in_game: self.phase.in_game(),
        }
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("round", &self.round)
            .field("players", &self.roster.len())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
