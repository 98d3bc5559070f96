use super::lobby::LobbyState;
use super::messages::{ClientMessage, ServerMessage};
use super::ws::{ConnectionContext, ConnectionHandler, run_connection};
use axum::extract::ws::WebSocket;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

impl ConnectionHandler for LobbyState {
    async fn handle_message(
        self: Arc<Self>,
        msg: ClientMessage,
        tx: broadcast::Sender<ServerMessage>,
        ctx: &mut ConnectionContext,
    ) {
        match msg {
            ClientMessage::CreateRoom { nickname } => {
                match self.create_room(&nickname, tx.clone()) {
                    Ok((room, player)) => {
                        ctx.player_id = Some(player.id.clone());
                        let _ = tx.send(ServerMessage::RoomCreated { room, player });
                    }
                    Err(err) => send_error(&tx, err),
                }
            }
            ClientMessage::JoinRoom { room_id, nickname } => {
                match self.join_room(&room_id, &nickname, tx.clone()) {
                    Ok((room, player)) => {
                        ctx.player_id = Some(player.id.clone());
                        self.broadcast_to_room(
                            &room_id,
                            ServerMessage::PlayerJoined { player, room },
                        );
                    }
                    Err(err) => send_error(&tx, err),
                }
            }
            ClientMessage::Reconnect { room_id, player_id } => {
                match self.reconnect(&room_id, &player_id, tx.clone()) {
                    Ok((player, game_state)) => {
                        ctx.player_id = Some(player.id.clone());
                        self.broadcast_to_room(
                            &room_id,
                            ServerMessage::PlayerReconnected { player, game_state },
                        );
                    }
                    Err(err) => send_error(&tx, err),
                }
            }
            ClientMessage::ListRooms => {
                let _ = tx.send(ServerMessage::RoomList {
                    rooms: self.room_list(),
                });
            }
            ClientMessage::LeaveRoom => {
                let Some(player_id) = ctx.player_id.take() else {
                    return;
                };
                let Some(info) = self.leave_room(&player_id) else {
                    return;
                };
                if let Some(room) = info.room {
                    // The leaver's channel is already unregistered, so
                    // confirm to them directly and tell the rest of the room
                    let _ = tx.send(ServerMessage::PlayerLeft {
                        player: info.player.clone(),
                        room: room.clone(),
                    });
                    self.broadcast_to_room(
                        &info.room_id,
                        ServerMessage::PlayerLeft {
                            player: info.player,
                            room,
                        },
                    );
                    if let Some(game_state) = info.word_phase {
                        self.broadcast_to_room(
                            &info.room_id,
                            ServerMessage::AllTopicsProposed { game_state },
                        );
                    }
                }
            }
            ClientMessage::StartGame {
                max_rounds,
                minimum_variance,
            } => {
                let Some(player_id) = ctx.player_id.clone() else {
                    return send_not_in_room(&tx);
                };
                match self.start_game(&player_id, max_rounds, minimum_variance) {
                    Ok(game_state) => {
                        let room_id = game_state.room_id.clone();
                        self.broadcast_to_room(&room_id, ServerMessage::GameStarted { game_state });
                    }
                    Err(err) => send_error(&tx, err),
                }
            }
            ClientMessage::ProposeTopic { topic } => {
                let Some(player_id) = ctx.player_id.clone() else {
                    return send_not_in_room(&tx);
                };
                match self.propose_topic(&player_id, &topic) {
                    Ok(accepted) => {
                        let room_id = accepted.game_state.room_id.clone();
                        self.broadcast_to_room(
                            &room_id,
                            ServerMessage::TopicProposed {
                                topic: accepted.topic,
                                game_state: accepted.game_state,
                            },
                        );
                        if let Some(game_state) = accepted.word_phase {
                            self.broadcast_to_room(
                                &room_id,
                                ServerMessage::AllTopicsProposed { game_state },
                            );
                        }
                    }
                    Err(err) => send_error(&tx, err),
                }
            }
            ClientMessage::ProposeWord {
                word,
                related_topic,
            } => {
                let Some(player_id) = ctx.player_id.clone() else {
                    return send_not_in_room(&tx);
                };
                match self.propose_word(&player_id, &word, &related_topic) {
                    Ok(accepted) => {
                        let room_id = accepted.game_state.room_id.clone();
                        self.broadcast_to_room(
                            &room_id,
                            ServerMessage::WordProposed {
                                round: accepted.round,
                                game_state: accepted.game_state,
                            },
                        );
                        spawn_vote_timer(self.clone(), room_id);
                    }
                    Err(err) => send_error(&tx, err),
                }
            }
            ClientMessage::VoteOnWord { score } => {
                let Some(player_id) = ctx.player_id.clone() else {
                    return send_not_in_room(&tx);
                };
                match self.vote_on_word(&player_id, score) {
                    Ok(accepted) => {
                        let room_id = accepted.game_state.room_id.clone();
                        self.broadcast_to_room(
                            &room_id,
                            ServerMessage::VoteCast {
                                vote: accepted.vote,
                            },
                        );
                        if accepted.round_completed {
                            self.broadcast_to_room(
                                &room_id,
                                ServerMessage::VotingCompleted {
                                    game_state: accepted.game_state,
                                },
                            );
                            spawn_turn_advance(self.clone(), room_id);
                        }
                    }
                    Err(err) => send_error(&tx, err),
                }
            }
            ClientMessage::GetGameState => {
                let Some(player_id) = ctx.player_id.clone() else {
                    return send_not_in_room(&tx);
                };
                match self.get_game_state(&player_id) {
                    Ok(game_state) => {
                        let _ = tx.send(ServerMessage::CurrentState { game_state });
                    }
                    Err(err) => send_error(&tx, err),
                }
            }
        }
    }

    fn handle_disconnect(&self, player_id: &str, tx: &broadcast::Sender<ServerMessage>) {
        let Some(info) = self.mark_disconnected(player_id, tx) else {
            return;
        };
        if let Some(room) = info.room {
            self.broadcast_to_room(
                &info.room_id,
                ServerMessage::PlayerDisconnected {
                    player: info.player,
                    room,
                },
            );
        }
    }
}

fn send_error<E: std::fmt::Display>(tx: &broadcast::Sender<ServerMessage>, err: E) {
    warn!(%err, "Rejected client action");
    let _ = tx.send(ServerMessage::Error {
        message: err.to_string(),
    });
}

fn send_not_in_room(tx: &broadcast::Sender<ServerMessage>) {
    let _ = tx.send(ServerMessage::Error {
        message: "join a room first".to_string(),
    });
}

/// The core never self-schedules; this task is the external clock that
/// polls the expiry predicate once the vote window has elapsed.
fn spawn_vote_timer(lobby: Arc<LobbyState>, room_id: String) {
    let timeout = lobby.vote_timeout();
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        let Some(game_state) = lobby.force_complete_if_expired(&room_id) else {
            // Already closed through the vote-count threshold
            return;
        };
        lobby.broadcast_to_room(&room_id, ServerMessage::VotingCompleted { game_state });
        advance_after_results(lobby, room_id).await;
    });
}

/// Give clients a moment to show the results, then move the game along.
fn spawn_turn_advance(lobby: Arc<LobbyState>, room_id: String) {
    tokio::spawn(advance_after_results(lobby, room_id));
}

async fn advance_after_results(lobby: Arc<LobbyState>, room_id: String) {
    tokio::time::sleep(lobby.results_delay()).await;
    let Some((game_state, finished)) = lobby.advance_turn(&room_id) else {
        return;
    };
    let msg = if finished {
        ServerMessage::GameEnded { game_state }
    } else {
        ServerMessage::NextPlayerTurn { game_state }
    };
    lobby.broadcast_to_room(&room_id, msg);
}

pub async fn handle_connection(socket: WebSocket, state: Arc<LobbyState>) {
    run_connection(socket, state).await;
}
