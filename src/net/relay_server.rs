//! Relay-Server: axum-WebSocket-Endpunkt `/socket` plus Relay-Actor.
//!
//! Alle Verbindungen reichen Ereignisse über einen Kanal an genau einen Actor,
//! der den `Relay` (inkl. UDP-Pool) exklusiv besitzt. Dadurch gibt es keinen
//! geteilten veränderlichen Zustand; die Reihenfolge ergibt sich aus dem Kanal.

use crate::osc::{EndpointPool, UdpEndpointFactory};
use crate::session::{ClientId, ClientMessage, Envelope, Relay, ServerMessage};
use crate::shared::StudioOptions;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

/// Ausstehende Nachrichten pro Client, bevor er als zu langsam getrennt wird.
const OUTBOUND_QUEUE_CAPACITY: usize = 1024;

/// Ereignisse der Socket-Tasks an den Actor.
#[derive(Debug)]
enum RelayEvent {
    Connected {
        outbound: mpsc::Sender<ServerMessage>,
        reply: oneshot::Sender<ClientId>,
    },
    Message {
        from: ClientId,
        message: ClientMessage,
    },
    Disconnected {
        client: ClientId,
    },
}

#[derive(Clone)]
struct ServerState {
    events: mpsc::UnboundedSender<RelayEvent>,
}

/// Startet den Relay auf `0.0.0.0:<port>` und läuft bis Ctrl-C.
pub async fn serve(port: u16, options: &StudioOptions) -> anyhow::Result<()> {
    let pool = EndpointPool::new(UdpEndpointFactory);
    let relay = Relay::new(pool, options.authority_policy);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let actor = tokio::spawn(run_actor(relay, events_rx));

    let app = Router::new()
        .route("/socket", get(handle_websocket))
        .with_state(ServerState { events: events_tx });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Relay lauscht auf ws://{}/socket", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Ctrl-C-Handler fehlgeschlagen: {}", e);
            }
            log::info!("Relay wird beendet");
        })
        .await?;

    actor.abort();
    Ok(())
}

async fn handle_websocket(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: ServerState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_QUEUE_CAPACITY);
    // Nur der Actor hält den starken Sender; lässt er ihn fallen, endet die Verbindung
    let error_tx = outbound_tx.downgrade();

    let (reply_tx, reply_rx) = oneshot::channel();
    if state
        .events
        .send(RelayEvent::Connected {
            outbound: outbound_tx,
            reply: reply_tx,
        })
        .is_err()
    {
        return;
    }
    let Ok(client) = reply_rx.await else {
        return;
    };

    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            match message.to_json() {
                Ok(json) => {
                    if ws_tx.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => log::error!("Nachricht nicht serialisierbar: {}", e),
            }
        }
        let _ = ws_tx.close().await;
    });

    let events = state.events.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = ws_rx.next().await {
            match frame {
                Message::Text(text) => match ClientMessage::from_json(text.as_str()) {
                    Ok(message) => {
                        if events.send(RelayEvent::Message { from: client, message }).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::debug!("Ungültige Nachricht von {}: {}", client, e);
                        if let Some(tx) = error_tx.upgrade() {
                            let _ = tx.try_send(ServerMessage::Error {
                                message: format!("Ungültige Nachricht: {}", e),
                            });
                        }
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    let _ = state.events.send(RelayEvent::Disconnected { client });
}

/// Besitzt den Relay und stellt dessen Ausgaben zu.
async fn run_actor(
    mut relay: Relay<UdpEndpointFactory>,
    mut events: mpsc::UnboundedReceiver<RelayEvent>,
) {
    let mut clients: HashMap<ClientId, mpsc::Sender<ServerMessage>> = HashMap::new();

    while let Some(event) = events.recv().await {
        let envelopes = match event {
            RelayEvent::Connected { outbound, reply } => {
                let (client, envelopes) = relay.connect();
                clients.insert(client, outbound);
                if reply.send(client).is_err() {
                    // Socket schon weg, bevor die ID ankam
                    clients.remove(&client);
                    let mut out = envelopes;
                    out.extend(relay.disconnect(client));
                    out
                } else {
                    envelopes
                }
            }
            RelayEvent::Message { from, message } => relay.handle(from, message),
            RelayEvent::Disconnected { client } => {
                clients.remove(&client);
                relay.disconnect(client)
            }
        };
        deliver(&mut clients, envelopes);
    }
}

/// Stellt zu. Clients mit voller Warteschlange werden aus der Zustellung
/// entfernt; ihr Socket schließt, sobald die Warteschlange abgearbeitet ist,
/// und der Relay erhält dann `Disconnected`.
fn deliver(clients: &mut HashMap<ClientId, mpsc::Sender<ServerMessage>>, envelopes: Vec<Envelope>) {
    for Envelope { to, message } in envelopes {
        let Some(tx) = clients.get(&to) else {
            log::debug!("Nachricht an getrennten Client {} verworfen", to);
            continue;
        };
        match tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!(
                    "Client {} liest zu langsam ({} ausstehende Nachrichten), Verbindung wird getrennt",
                    to,
                    OUTBOUND_QUEUE_CAPACITY
                );
                clients.remove(&to);
            }
            Err(TrySendError::Closed(_)) => {
                log::debug!("Client {} nicht mehr erreichbar", to);
            }
        }
    }
}
