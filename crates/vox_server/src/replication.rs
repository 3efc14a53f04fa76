//! Replication core — the single world task.
//!
//! All mutation of the authoritative [`World`] happens on one logical
//! thread: network callbacks enqueue [`ServerCommand`]s, and the run loop
//! interleaves them with the fixed-rate tick. A command or tick always runs
//! to completion before the next is processed, so no two dispatches ever
//! overlap and the world needs no locking.
//!
//! On connect the new peer first receives a welcome frame carrying its
//! assigned id, then a catch-up: one synthesized `AvatarSpawn` per live
//! avatar, in creation order, before any live broadcast can reach it. The
//! peer's own join is deferred by the settle delay, cancelled if it
//! disconnects first, and announced to every peer — the joiner included, so
//! it learns its own avatar from the same stream as everyone else's.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vox_component::{Avatar, PlayerId, Position};
use vox_net::{codec, Action, Envelope};
use vox_world::{MovementSystem, RegenSystem, Scheduler, World};

use crate::peers::PeerRegistry;
use crate::settings::Settings;

/// Requests into the world task. The only way the network layer touches
/// world state.
#[derive(Debug)]
pub enum ServerCommand {
    /// A transport connection was accepted.
    Connected {
        /// Channel the writer task drains.
        outbound: mpsc::UnboundedSender<Vec<u8>>,
        /// Receives the assigned connection id.
        reply: oneshot::Sender<PlayerId>,
    },
    /// The peer's connection dropped (transport loss or clean close).
    Disconnected {
        /// The departing peer.
        player_id: PlayerId,
    },
    /// One wire frame arrived from a peer.
    Frame {
        /// The sending peer.
        player_id: PlayerId,
        /// Raw frame payload.
        bytes: Vec<u8>,
    },
    /// The peer's settle delay elapsed; spawn it if still connected.
    JoinSettled {
        /// The peer whose join settled.
        player_id: PlayerId,
    },
}

/// The authoritative server: world, scheduler, peers, and the command loop.
pub struct GameServer {
    world: World,
    scheduler: Scheduler,
    peers: PeerRegistry,
    settings: Settings,
    commands_tx: mpsc::UnboundedSender<ServerCommand>,
    commands_rx: mpsc::UnboundedReceiver<ServerCommand>,
    /// Settle timers by peer, aborted on early disconnect.
    pending_joins: HashMap<PlayerId, JoinHandle<()>>,
}

impl GameServer {
    /// Create a server with the default system set registered.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let mut scheduler = Scheduler::new();
        scheduler.add_system(MovementSystem);
        scheduler.add_throttled(RegenSystem::default(), Duration::from_secs(1));

        Self {
            world: World::headless(),
            scheduler,
            peers: PeerRegistry::new(),
            settings,
            commands_tx,
            commands_rx,
            pending_joins: HashMap::new(),
        }
    }

    /// Sender for enqueueing commands from transport tasks.
    #[must_use]
    pub fn command_sender(&self) -> mpsc::UnboundedSender<ServerCommand> {
        self.commands_tx.clone()
    }

    /// The authoritative world (read access for diagnostics and tests).
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Drive the tick loop and command processing until the command channel
    /// closes.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.settings.tick_duration());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            tick_rate = self.settings.tick_rate_hz,
            settle_ms = self.settings.settle_delay_ms,
            "game server running"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(self.settings.tick_duration());
                }
                cmd = self.commands_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
            }
        }
        info!("game server stopped");
    }

    /// Advance the simulation one step.
    pub fn tick(&mut self, dt: Duration) {
        self.scheduler.tick(&mut self.world, dt);
    }

    /// Apply one command to completion.
    pub fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connected { outbound, reply } => {
                let id = self.handle_connected(outbound);
                let _ = reply.send(id);
            }
            ServerCommand::Disconnected { player_id } => self.handle_disconnected(&player_id),
            ServerCommand::Frame { player_id, bytes } => self.handle_frame(&player_id, &bytes),
            ServerCommand::JoinSettled { player_id } => self.handle_join_settled(&player_id),
        }
    }

    fn handle_connected(&mut self, outbound: mpsc::UnboundedSender<Vec<u8>>) -> PlayerId {
        let id = self.peers.register(outbound);
        info!(player_id = %id, "peer connected");

        // The peer learns its assigned id before anything else.
        match codec::encode_welcome(&id) {
            Ok(frame) => self.peers.send_to(&id, frame),
            Err(err) => warn!(%err, "failed to encode welcome"),
        }

        // Join-time catch-up: the new peer has no history, so it receives one
        // spawn per live avatar, in creation order, before anything else.
        let catchup: Vec<Action> = self
            .world
            .avatars()
            .filter_map(|entity| {
                let avatar = self.world.get::<Avatar>(entity)?;
                let position = self.world.get::<Position>(entity)?;
                Some(Action::AvatarSpawn {
                    player_id: avatar.player_id.clone(),
                    position: position.0,
                })
            })
            .collect();
        for action in &catchup {
            self.send_action_to(&id, action);
        }
        debug!(player_id = %id, avatars = catchup.len(), "catch-up sent");

        // Spawn the peer's own player only after the settle delay, and never
        // if it disconnects first.
        let delay = self.settings.settle_delay();
        let tx = self.commands_tx.clone();
        let settled_id = id.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ServerCommand::JoinSettled {
                player_id: settled_id,
            });
        });
        self.pending_joins.insert(id.clone(), timer);

        id
    }

    fn handle_join_settled(&mut self, player_id: &PlayerId) {
        self.pending_joins.remove(player_id);
        if !self.peers.contains(player_id) {
            // Peer raced its own settle delay and lost; suppress the spawn.
            debug!(%player_id, "orphaned join-spawn suppressed");
            return;
        }

        let join = Action::PlayerJoin {
            player_id: player_id.clone(),
        };
        let spawn = Action::AvatarSpawn {
            player_id: player_id.clone(),
            position: self.settings.spawn_position,
        };
        // Announced to everyone, the joiner included: the joiner discovers
        // its own player and avatar from the stream, after its catch-up.
        self.apply_and_announce(&join);
        self.apply_and_announce(&spawn);
        self.peers.mark_joined(player_id);
        info!(%player_id, "peer joined world");
    }

    fn handle_disconnected(&mut self, player_id: &PlayerId) {
        if let Some(timer) = self.pending_joins.remove(player_id) {
            timer.abort();
        }
        if !self.peers.remove(player_id) {
            return;
        }
        info!(%player_id, peers = self.peers.len(), "peer disconnected");

        // Symmetric leave: tear the avatar down first, then the player
        // record, and tell everyone who is left.
        let death = Action::AvatarDeath {
            player_id: player_id.clone(),
        };
        let left = Action::PlayerLeft {
            player_id: player_id.clone(),
        };
        self.apply_and_broadcast(player_id, &death);
        self.apply_and_broadcast(player_id, &left);
    }

    fn handle_frame(&mut self, player_id: &PlayerId, bytes: &[u8]) {
        match codec::decode_envelope(bytes) {
            Ok(Envelope::Dispatch { action }) => {
                let Some(action) = self.readdress(player_id, action) else {
                    return;
                };
                self.apply_and_broadcast(player_id, &action);
            }
            Ok(Envelope::Welcome { .. }) => {
                // The greeting only ever flows server to peer.
                warn!(%player_id, "dropping welcome frame from peer");
            }
            Err(err) if err.is_ignorable() => {
                // Forward compatibility: a newer peer's action kind.
                warn!(%player_id, %err, "ignoring unknown action");
            }
            Err(err) => {
                warn!(%player_id, %err, "dropping undecodable frame");
            }
        }
    }

    /// Entity ids are local to each world, so an entity-addressed action
    /// received from a peer cannot be relayed as-is: the same id names a
    /// different entity (or none) on every other client. Re-address it by
    /// the controlling player before it is applied or relayed; a despawn
    /// whose entity resolves to no live avatar is dropped.
    fn readdress(&self, origin: &PlayerId, action: Action) -> Option<Action> {
        match action {
            Action::AvatarDespawn { entity } => {
                let Some(avatar) = self.world.get::<Avatar>(entity) else {
                    warn!(%origin, %entity, "despawn of unknown avatar dropped");
                    return None;
                };
                Some(Action::AvatarDeath {
                    player_id: avatar.player_id.clone(),
                })
            }
            other => Some(other),
        }
    }

    /// Dispatch an action into the authoritative world; on success, fan it
    /// out to every connected peer, the subject included.
    fn apply_and_announce(&mut self, action: &Action) {
        if let Err(err) = self.world.dispatch(action) {
            warn!(%err, ?action, "dispatch rejected");
            return;
        }
        match codec::encode_action(action) {
            Ok(frame) => self.peers.broadcast(&frame),
            Err(err) => warn!(%err, "failed to encode broadcast"),
        }
    }

    /// Dispatch an action into the authoritative world; on success, fan it
    /// out to every peer except `origin`. Per-action failures are downgraded
    /// to a diagnostic — one bad action never halts the loop.
    fn apply_and_broadcast(&mut self, origin: &PlayerId, action: &Action) {
        if let Err(err) = self.world.dispatch(action) {
            warn!(%origin, %err, ?action, "dispatch rejected");
            return;
        }
        match codec::encode_action(action) {
            Ok(frame) => self.peers.broadcast_except(origin, &frame),
            Err(err) => warn!(%err, "failed to encode broadcast"),
        }
    }

    fn send_action_to(&self, peer: &PlayerId, action: &Action) {
        match codec::encode_action(action) {
            Ok(frame) => self.peers.send_to(peer, frame),
            Err(err) => warn!(%err, "failed to encode catch-up"),
        }
    }

    #[cfg(test)]
    fn recv_command(&mut self) -> impl std::future::Future<Output = Option<ServerCommand>> + '_ {
        self.commands_rx.recv()
    }
}

impl std::fmt::Debug for GameServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameServer")
            .field("peers", &self.peers.len())
            .field("entities", &self.world.entity_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use vox_component::Entity;

    use super::*;

    fn test_settings() -> Settings {
        Settings {
            settle_delay_ms: 50,
            ..Settings::default()
        }
    }

    /// Connect a peer, returning its id and outbound receiver.
    fn connect(server: &mut GameServer) -> (PlayerId, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (reply_tx, mut reply_rx) = oneshot::channel();
        server.handle_command(ServerCommand::Connected {
            outbound: tx,
            reply: reply_tx,
        });
        let id = reply_rx.try_recv().unwrap();
        (id, rx)
    }

    fn settle(server: &mut GameServer, id: &PlayerId) {
        server.handle_command(ServerCommand::JoinSettled {
            player_id: id.clone(),
        });
    }

    fn decode_envelopes(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<Envelope> {
        let mut envelopes = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            envelopes.push(codec::decode_envelope(&frame).unwrap());
        }
        envelopes
    }

    /// Drain a peer's outbox, keeping only dispatched actions.
    fn decode_actions(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<Action> {
        decode_envelopes(rx)
            .into_iter()
            .filter_map(|env| match env {
                Envelope::Dispatch { action } => Some(action),
                Envelope::Welcome { .. } => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_settled_join_spawns_and_broadcasts() {
        let mut server = GameServer::new(test_settings());
        let (p1, mut rx1) = connect(&mut server);
        settle(&mut server, &p1);

        assert!(server.world().player_entity(&p1).is_some());
        assert!(server.world().avatar_entity(&p1).is_some());
        // The joiner hears its own join and spawn from the stream.
        assert_eq!(
            decode_actions(&mut rx1),
            vec![
                Action::PlayerJoin {
                    player_id: p1.clone()
                },
                Action::AvatarSpawn {
                    player_id: p1.clone(),
                    position: server.settings.spawn_position,
                },
            ]
        );

        let (p2, mut rx2) = connect(&mut server);
        settle(&mut server, &p2);

        // p1 observes p2's join and spawn, in order.
        let seen = decode_actions(&mut rx1);
        assert_eq!(
            seen,
            vec![
                Action::PlayerJoin {
                    player_id: p2.clone()
                },
                Action::AvatarSpawn {
                    player_id: p2.clone(),
                    position: server.settings.spawn_position,
                },
            ]
        );
        // p2's stream: catch-up with p1's live avatar, then its own pair.
        let stream = decode_actions(&mut rx2);
        assert_eq!(stream.len(), 3);
        assert!(matches!(
            &stream[0],
            Action::AvatarSpawn { player_id, .. } if player_id == &p1
        ));
        assert!(matches!(
            &stream[1],
            Action::PlayerJoin { player_id } if player_id == &p2
        ));
        assert!(matches!(
            &stream[2],
            Action::AvatarSpawn { player_id, .. } if player_id == &p2
        ));
    }

    #[tokio::test]
    async fn test_welcome_is_first_frame_with_assigned_id() {
        let mut server = GameServer::new(test_settings());
        let (p1, _rx1) = connect(&mut server);
        settle(&mut server, &p1);

        let (p2, mut rx2) = connect(&mut server);
        let frames = decode_envelopes(&mut rx2);
        assert_eq!(
            frames[0],
            Envelope::Welcome {
                player_id: p2.clone()
            }
        );
        // Catch-up follows the greeting.
        assert!(matches!(
            &frames[1],
            Envelope::Dispatch {
                action: Action::AvatarSpawn { player_id, .. }
            } if player_id == &p1
        ));
    }

    #[tokio::test]
    async fn test_catchup_in_creation_order_before_live_traffic() {
        let mut server = GameServer::new(test_settings());
        let (p1, _rx1) = connect(&mut server);
        let (p2, _rx2) = connect(&mut server);
        settle(&mut server, &p1);
        settle(&mut server, &p2);

        let (p3, mut rx3) = connect(&mut server);
        // A live broadcast lands after the catch-up was queued.
        settle(&mut server, &p3);

        let frames = decode_actions(&mut rx3);
        // First two are catch-up spawns in avatar creation order (p1 before
        // p2); nothing precedes them.
        assert!(matches!(&frames[0], Action::AvatarSpawn { player_id, .. } if player_id == &p1));
        assert!(matches!(&frames[1], Action::AvatarSpawn { player_id, .. } if player_id == &p2));
    }

    #[tokio::test]
    async fn test_disconnect_tears_down_and_broadcasts() {
        let mut server = GameServer::new(test_settings());
        let (p1, mut rx1) = connect(&mut server);
        let (p2, _rx2) = connect(&mut server);
        settle(&mut server, &p1);
        settle(&mut server, &p2);
        decode_actions(&mut rx1);

        server.handle_command(ServerCommand::Disconnected {
            player_id: p2.clone(),
        });

        assert!(server.world().player_entity(&p2).is_none());
        assert!(server.world().avatar_entity(&p2).is_none());
        let seen = decode_actions(&mut rx1);
        assert_eq!(
            seen,
            vec![
                Action::AvatarDeath {
                    player_id: p2.clone()
                },
                Action::PlayerLeft { player_id: p2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_reconnect_gets_fresh_identity_and_entities() {
        let mut server = GameServer::new(test_settings());
        let (p1, _rx1) = connect(&mut server);
        settle(&mut server, &p1);
        let old_avatar = server.world().avatar_entity(&p1).unwrap();

        server.handle_command(ServerCommand::Disconnected {
            player_id: p1.clone(),
        });

        let (p2, _rx2) = connect(&mut server);
        settle(&mut server, &p2);

        assert_ne!(p1, p2);
        let new_avatar = server.world().avatar_entity(&p2).unwrap();
        assert_ne!(old_avatar, new_avatar);
        // The old avatar stays dead.
        assert!(server.world().avatar_entity(&p1).is_none());
    }

    #[tokio::test]
    async fn test_disconnect_before_settle_suppresses_spawn() {
        let mut server = GameServer::new(test_settings());
        let (p1, _rx1) = connect(&mut server);
        server.handle_command(ServerCommand::Disconnected {
            player_id: p1.clone(),
        });

        // The timer may still fire; the settled handler must notice the peer
        // is gone and do nothing.
        settle(&mut server, &p1);
        assert!(server.world().player_entity(&p1).is_none());
        assert!(server.world().avatar_entity(&p1).is_none());
        assert_eq!(server.world().entity_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_timer_enqueues_join() {
        let mut server = GameServer::new(test_settings());
        let (p1, _rx1) = connect(&mut server);

        // Paused time auto-advances while awaiting the command channel.
        let cmd = server.recv_command().await.unwrap();
        match cmd {
            ServerCommand::JoinSettled { player_id } => assert_eq!(player_id, p1),
            other => panic!("expected JoinSettled, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_peer_frame_is_applied_and_relayed() {
        let mut server = GameServer::new(test_settings());
        let (p1, _rx1) = connect(&mut server);
        let (p2, mut rx2) = connect(&mut server);
        settle(&mut server, &p1);
        settle(&mut server, &p2);
        decode_actions(&mut rx2);

        let action = Action::AvatarMove {
            player_id: p1.clone(),
            position: Vec3::new(5.0, 2.0, 1.0),
            yaw: 0.3,
            pitch: 0.0,
        };
        server.handle_command(ServerCommand::Frame {
            player_id: p1.clone(),
            bytes: codec::encode_action(&action).unwrap(),
        });

        let e = server.world().avatar_entity(&p1).unwrap();
        assert_eq!(
            server.world().get::<Position>(e).unwrap().0,
            Vec3::new(5.0, 2.0, 1.0)
        );
        assert_eq!(decode_actions(&mut rx2), vec![action]);
    }

    #[tokio::test]
    async fn test_peer_despawn_relayed_by_player_id() {
        let mut server = GameServer::new(test_settings());
        let (p1, _rx1) = connect(&mut server);
        let (p2, mut rx2) = connect(&mut server);
        settle(&mut server, &p1);
        settle(&mut server, &p2);
        decode_actions(&mut rx2);

        let avatar = server.world().avatar_entity(&p1).unwrap();
        server.handle_command(ServerCommand::Frame {
            player_id: p1.clone(),
            bytes: codec::encode_action(&Action::AvatarDespawn { entity: avatar }).unwrap(),
        });

        assert!(server.world().avatar_entity(&p1).is_none());
        // Other peers hear a player-addressed death, never a raw entity id.
        assert_eq!(
            decode_actions(&mut rx2),
            vec![Action::AvatarDeath { player_id: p1 }]
        );
    }

    #[tokio::test]
    async fn test_despawn_of_unknown_entity_is_dropped() {
        let mut server = GameServer::new(test_settings());
        let (p1, _rx1) = connect(&mut server);
        let (p2, mut rx2) = connect(&mut server);
        settle(&mut server, &p1);
        settle(&mut server, &p2);
        decode_actions(&mut rx2);
        let entities = server.world().entity_count();

        server.handle_command(ServerCommand::Frame {
            player_id: p1.clone(),
            bytes: codec::encode_action(&Action::AvatarDespawn {
                entity: Entity::from_raw(4096),
            })
            .unwrap(),
        });

        assert_eq!(server.world().entity_count(), entities);
        assert!(decode_actions(&mut rx2).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_action_frame_changes_nothing() {
        let mut server = GameServer::new(test_settings());
        let (p1, _rx1) = connect(&mut server);
        let (p2, mut rx2) = connect(&mut server);
        settle(&mut server, &p1);
        settle(&mut server, &p2);
        decode_actions(&mut rx2);
        let entities = server.world().entity_count();

        server.handle_command(ServerCommand::Frame {
            player_id: p1.clone(),
            bytes: br#"{"t":"dispatch","action":{"kind":"warpDrive"}}"#.to_vec(),
        });

        assert_eq!(server.world().entity_count(), entities);
        assert!(decode_actions(&mut rx2).is_empty());
    }

    #[tokio::test]
    async fn test_tick_runs_movement() {
        let mut server = GameServer::new(test_settings());
        let (p1, _rx1) = connect(&mut server);
        settle(&mut server, &p1);
        // Movement with zero velocity: position stays at spawn.
        server.tick(Duration::from_millis(16));
        let e = server.world().avatar_entity(&p1).unwrap();
        assert_eq!(
            server.world().get::<Position>(e).unwrap().0,
            server.settings.spawn_position
        );
    }
}
