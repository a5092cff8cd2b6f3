use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::SendError;
use tokio::sync::broadcast::{Receiver, Sender};
use tracing::{info, instrument, warn};

use crate::dtos::ServerFrame;
use crate::ws::BROADCAST_CHANNEL_CAPACITY;

/// Mappa delle stanze livechat con almeno un utente connesso.
/// Ogni stanza ha la testa tx di un canale broadcast; i task di scrittura
/// delle connessioni tengono le teste rx.
pub struct RoomMap {
    channels: DashMap<i32, Sender<Arc<ServerFrame>>>,
}

impl RoomMap {
    pub fn new() -> Self {
        RoomMap {
            channels: DashMap::new(),
        }
    }

    #[instrument(skip(self), fields(room_id))]
    pub fn subscribe(&self, room_id: &i32) -> Receiver<Arc<ServerFrame>> {
        match self.channels.get(room_id) {
            // prima connessione alla stanza: creiamo il canale
            None => {
                info!("Creating new broadcast channel for room");
                // Arc<ServerFrame> per condividere il riferimento, non il frame
                let (tx, rx) = broadcast::channel::<Arc<ServerFrame>>(BROADCAST_CHANNEL_CAPACITY);
                self.channels.insert(*room_id, tx);
                rx
            }
            // iscriversi a un canale esistente == prendere una testa rx
            Some(c) => {
                info!("Subscribing to existing broadcast channel");
                c.value().subscribe()
            }
        }
    }

    #[instrument(skip(self, frame), fields(room_id))]
    pub fn send(
        &self,
        room_id: &i32,
        frame: Arc<ServerFrame>,
    ) -> Result<usize, SendError<Arc<ServerFrame>>> {
        if let Some(room) = self.channels.get(room_id) {
            match room.send(frame.clone()) {
                Ok(n) => {
                    info!(receivers = n, "Frame broadcast to receivers");
                    Ok(n)
                }
                Err(e) => {
                    warn!("No active receivers, removing channel");
                    // Nessuno sta ascoltando, rimuovi il channel
                    drop(room); // Rilascia il lock
                    self.channels.remove(room_id);
                    Err(e)
                }
            }
        } else {
            warn!("Attempted to send to a room with no listeners");
            Err(SendError(frame))
        }
    }

    /// Numero di stanze con almeno un canale attivo
    pub fn active_rooms(&self) -> usize {
        self.channels.len()
    }
}
