//! Room actor: an isolated Tokio task that owns one room's game.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. The actor applies the [`Effects`] returned by
//! the round controller: events go out on the members' channels, timer
//! instructions go to the room's [`PhaseTimer`].

use std::collections::HashMap;

use impostor_game::{Effect, Effects, GameError, Phase, Room, TimerTicket};
use impostor_protocol::{ClientCommand, PlayerId, Recipient, RoomId, RoomSummary, ServerEvent};
use impostor_timer::PhaseTimer;
use tokio::sync::{mpsc, oneshot};

use crate::RoomError;

/// Channel sender for delivering outbound events to a player.
///
/// Unbounded so a room never waits on a slow socket; the connection's
/// writer task drains it.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// A command a member sends to their room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    Ready,
    Unready,
    StartGame,
    SubmitClue { text: String },
    Vote { target: PlayerId },
}

impl PlayerAction {
    /// Picks out the commands that are handled inside a room. Room listing,
    /// joining and leaving go to the registry instead.
    pub fn from_command(cmd: ClientCommand) -> Option<Self> {
        match cmd {
            ClientCommand::Ready => Some(Self::Ready),
            ClientCommand::Unready => Some(Self::Unready),
            ClientCommand::StartGame => Some(Self::StartGame),
            ClientCommand::SubmitClue { text } => Some(Self::SubmitClue { text }),
            ClientCommand::VoteImpostor { target_id } => Some(Self::Vote { target: target_id }),
            ClientCommand::ListRooms | ClientCommand::Join { .. } | ClientCommand::Leave => None,
        }
    }
}

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    /// Add a player to the room.
    Join {
        player_id: PlayerId,
        name: Option<String>,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a player. Replies with the number of members left.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// Deliver a member's in-room command.
    Action {
        sender: PlayerId,
        action: PlayerAction,
    },

    /// Request a metadata snapshot.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room.
    Shutdown,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: Phase,
    pub round: u32,
    pub player_count: usize,
    pub max_players: usize,
    pub host: Option<PlayerId>,
}

impl RoomInfo {
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.room_id.clone(),
            count: self.player_count,
            in_game: self.phase.in_game(),
        }
    }
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone: it wraps an `mpsc::Sender`. The registry holds one of
/// these per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's ID.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }

    /// Sends a join request to the room.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: Option<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Sends a leave request to the room. Returns how many members remain.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Sends an in-room command (fire-and-forget). Rejections are reported
    /// to the sender on their event channel.
    pub async fn send_action(&self, sender: PlayerId, action: PlayerAction) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Action { sender, action })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Per-member outbound channels.
    senders: HashMap<PlayerId, PlayerSender>,
    timer: PhaseTimer<TimerTicket>,
    receiver: mpsc::Receiver<RoomCommand>,
    /// Members whose channel turned out closed while delivering; they are
    /// removed once the current event is fully applied.
    unreachable: Vec<PlayerId>,
}

impl RoomActor {
    /// Runs the actor loop until shutdown or until every handle is dropped.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room.id(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                ticket = self.timer.wait() => {
                    let fx = self.room.on_timer(ticket);
                    self.apply(fx);
                }
            }
            self.drop_unreachable();
        }

        tracing::info!(
            room_id = %self.room.id(),
            timers_fired = self.timer.metrics().fired,
            "room actor stopped"
        );
    }

    /// Returns `false` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player_id,
                name,
                sender,
                reply,
            } => {
                let result = self.handle_join(player_id, name.as_deref(), sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = self.handle_leave(player_id);
                let _ = reply.send(result);
            }
            RoomCommand::Action { sender, action } => {
                self.handle_action(sender, action);
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.room.id(), "room shutting down");
                self.timer.cancel();
                return false;
            }
        }
        true
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: Option<&str>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let fx = self.room.join(player_id, name)?;
        self.senders.insert(player_id, sender);
        self.apply(fx);
        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<usize, RoomError> {
        let fx = self.room.leave(player_id)?;
        self.senders.remove(&player_id);
        self.apply(fx);
        Ok(self.room.len())
    }

    fn handle_action(&mut self, sender: PlayerId, action: PlayerAction) {
        if !self.senders.contains_key(&sender) {
            tracing::warn!(
                room_id = %self.room.id(),
                player_id = %sender,
                "action from non-member, ignoring"
            );
            return;
        }

        let result = match action {
            PlayerAction::Ready => self.room.set_ready(sender, true),
            PlayerAction::Unready => self.room.set_ready(sender, false),
            PlayerAction::StartGame => self.room.start_game(sender),
            PlayerAction::SubmitClue { text } => self.room.submit_clue(sender, &text),
            PlayerAction::Vote { target } => self.room.vote(sender, target),
        };

        match result {
            Ok(fx) => self.apply(fx),
            Err(err) => self.reject(sender, &err),
        }
    }

    /// Tells only the sender why their command was refused.
    fn reject(&mut self, sender: PlayerId, err: &GameError) {
        tracing::debug!(
            room_id = %self.room.id(),
            player_id = %sender,
            phase = %self.room.phase(),
            %err,
            "command rejected"
        );
        self.send_to(sender, ServerEvent::error(err.kind(), err.to_string()));
    }

    /// Carries out a transition's effects in order.
    fn apply(&mut self, fx: Effects) {
        for effect in fx {
            match effect {
                Effect::Send { to, event } => self.dispatch(&to, event),
                Effect::ArmTimer { ticket, after } => self.timer.arm(ticket, after),
                Effect::CancelTimer => {
                    self.timer.cancel();
                }
            }
        }
    }

    /// Delivers an event to the current members `to` selects.
    fn dispatch(&mut self, to: &Recipient, event: ServerEvent) {
        if let Recipient::Player(id) = to {
            self.send_to(*id, event);
            return;
        }
        for id in self.room.member_ids() {
            if to.includes(id) {
                self.send_to(id, event.clone());
            }
        }
    }

    /// Sends an event to one member. A closed channel means the player is
    /// gone; they are queued for removal instead of failing the transition.
    fn send_to(&mut self, player_id: PlayerId, event: ServerEvent) {
        let Some(sender) = self.senders.get(&player_id) else {
            return;
        };
        if sender.send(event).is_err() && !self.unreachable.contains(&player_id) {
            tracing::debug!(
                room_id = %self.room.id(),
                player_id = %player_id,
                "delivery failed, treating as disconnect"
            );
            self.unreachable.push(player_id);
        }
    }

    /// Removes members whose channel closed, each as its own departure.
    fn drop_unreachable(&mut self) {
        while let Some(player_id) = self.unreachable.pop() {
            self.senders.remove(&player_id);
            match self.room.leave(player_id) {
                Ok(fx) => self.apply(fx),
                Err(GameError::UnknownPlayer(_)) => {}
                Err(err) => tracing::warn!(
                    room_id = %self.room.id(),
                    player_id = %player_id,
                    %err,
                    "failed to remove unreachable player"
                ),
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room.id().clone(),
            phase: self.room.phase(),
            round: self.room.round(),
            player_count: self.room.len(),
            max_players: self.room.config().max_players,
            host: self.room.host(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `channel_size` controls backpressure: if the channel fills up, senders
/// wait (bounded channel).
pub(crate) fn spawn_room(room: Room, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let room_id = room.id().clone();

    let actor = RoomActor {
        room,
        senders: HashMap::new(),
        timer: PhaseTimer::new(),
        receiver: rx,
        unreachable: Vec::new(),
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_command() {
        assert_eq!(
            PlayerAction::from_command(ClientCommand::VoteImpostor {
                target_id: PlayerId(3)
            }),
            Some(PlayerAction::Vote {
                target: PlayerId(3)
            })
        );
        assert_eq!(
            PlayerAction::from_command(ClientCommand::SubmitClue { text: "hi".into() }),
            Some(PlayerAction::SubmitClue { text: "hi".into() })
        );
        assert_eq!(PlayerAction::from_command(ClientCommand::Leave), None);
        assert_eq!(PlayerAction::from_command(ClientCommand::ListRooms), None);
    }

    #[test]
    fn test_info_summary() {
        let info = RoomInfo {
            room_id: RoomId("r1".into()),
            phase: Phase::Vote,
            round: 2,
            player_count: 4,
            max_players: 8,
            host: Some(PlayerId(1)),
        };
        let summary = info.summary();
        assert_eq!(summary.count, 4);
        assert!(summary.in_game);
    }
}
