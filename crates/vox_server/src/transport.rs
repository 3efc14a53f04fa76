//! TCP transport — accept loop and per-connection tasks.
//!
//! Each accepted socket gets a reader task (frames in → [`ServerCommand`]s)
//! and a writer task (outbound channel → frames out). The transport never
//! touches world state; everything funnels through the command channel into
//! the single world task.

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use vox_component::PlayerId;
use vox_net::{framing, NetError};

use crate::replication::ServerCommand;
use crate::settings::Settings;

/// Accept connections until the listener fails or the world task goes away.
pub async fn run_listener(
    listener: TcpListener,
    commands: mpsc::UnboundedSender<ServerCommand>,
    settings: Settings,
) {
    info!(addr = %listener.local_addr().map(|a| a.to_string()).unwrap_or_default(), "listening");
    loop {
        match listener.accept().await {
            Ok((socket, addr)) => {
                debug!(%addr, "accepted connection");
                let commands = commands.clone();
                let max_frame = settings.max_frame_bytes;
                tokio::spawn(async move {
                    if let Err(err) = handle_socket(socket, commands, max_frame).await {
                        warn!(%addr, %err, "connection task ended with error");
                    }
                });
            }
            Err(err) => {
                warn!(%err, "accept failed");
                break;
            }
        }
    }
}

/// Run one connection to completion: register, pump frames, deregister.
async fn handle_socket(
    socket: TcpStream,
    commands: mpsc::UnboundedSender<ServerCommand>,
    max_frame: usize,
) -> Result<(), NetError> {
    let (read_half, write_half) = socket.into_split();

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = oneshot::channel();
    if commands
        .send(ServerCommand::Connected {
            outbound: outbound_tx,
            reply: reply_tx,
        })
        .is_err()
    {
        return Ok(()); // World task already gone.
    }
    let Ok(player_id) = reply_rx.await else {
        return Ok(());
    };

    let writer = tokio::spawn(write_loop(write_half, outbound_rx, max_frame));
    let result = read_loop(read_half, &commands, &player_id, max_frame).await;

    // Reader finished (EOF or error): the peer is gone either way.
    let _ = commands.send(ServerCommand::Disconnected {
        player_id: player_id.clone(),
    });
    writer.abort();
    result
}

async fn read_loop(
    mut read_half: OwnedReadHalf,
    commands: &mpsc::UnboundedSender<ServerCommand>,
    player_id: &PlayerId,
    max_frame: usize,
) -> Result<(), NetError> {
    loop {
        match framing::read_frame(&mut read_half, max_frame).await {
            Ok(Some(bytes)) => {
                if commands
                    .send(ServerCommand::Frame {
                        player_id: player_id.clone(),
                        bytes,
                    })
                    .is_err()
                {
                    return Ok(());
                }
            }
            Ok(None) => return Ok(()),
            Err(err) => return Err(err),
        }
    }
}

async fn write_loop(
    mut write_half: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    max_frame: usize,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(err) = framing::write_frame(&mut write_half, &frame, max_frame).await {
            debug!(%err, "write failed, dropping writer");
            break;
        }
    }
}
