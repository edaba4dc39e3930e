//! Per-connection task: one inbound pump and one outbound pump.
//!
//! Each accepted connection gets its own Tokio task running
//! [`run_session`]. The flow is:
//!   1. Register a session with the hub
//!   2. Inbound pump: read frame → decode envelope → dispatch
//!   3. Outbound pump: drain the session's queue → encode → write
//!   4. When the peer goes away (or the session is closed from elsewhere),
//!      unregister, let the outbound pump drain, close the connection
//!
//! The pumps run concurrently on the same task via `tokio::join!`, so a
//! slow write never delays reading and vice versa.

use std::sync::Arc;

use skirmish_hub::{Hub, Session};
use skirmish_protocol::{Codec, Envelope};
use skirmish_transport::Connection;
use tokio::sync::mpsc;

/// Drives one connection from registration to teardown.
///
/// Returns once both pumps have finished and the connection is closed.
pub async fn run_session<C, K>(conn: C, hub: Arc<Hub>, codec: K)
where
    C: Connection,
    K: Codec,
{
    let conn_id = conn.id();
    let (session, outbound) = hub.connect().await;
    tracing::info!(%conn_id, session_id = %session.id(), "client connected");

    tokio::join!(
        inbound_pump(&conn, &hub, &session, &codec),
        outbound_pump(&conn, &session, outbound, &codec),
    );

    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
    tracing::info!(%conn_id, session_id = %session.id(), "client disconnected");
}

async fn inbound_pump<C, K>(conn: &C, hub: &Hub, session: &Arc<Session>, codec: &K)
where
    C: Connection,
    K: Codec,
{
    let session_id = session.id();

    loop {
        let frame = tokio::select! {
            frame = conn.recv() => frame,
            () = session.closed() => break,
        };

        let text = match frame {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!(%session_id, "connection closed by peer");
                break;
            }
            Err(e) => {
                tracing::debug!(%session_id, error = %e, "read failed");
                break;
            }
        };

        let envelope: Envelope = match codec.decode(&text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(%session_id, error = %e, "failed to decode envelope");
                continue;
            }
        };

        let kind = envelope.kind.clone();
        match hub.dispatch_envelope(session, envelope).await {
            Ok(()) => {}
            Err(e) if e.is_protocol() => {
                tracing::debug!(%session_id, %kind, error = %e, "event not handled");
            }
            Err(e) => {
                tracing::warn!(%session_id, %kind, error = %e, "event rejected");
            }
        }
    }

    hub.unregister(session_id).await;
}

async fn outbound_pump<C, K>(
    conn: &C,
    session: &Session,
    mut outbound: mpsc::Receiver<Envelope>,
    codec: &K,
) where
    C: Connection,
    K: Codec,
{
    while let Some(envelope) = outbound.recv().await {
        let text = match codec.encode(&envelope) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(session_id = %session.id(), error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&text).await {
            tracing::debug!(
                session_id = %session.id(),
                kind = %envelope.kind,
                error = %e,
                "write failed"
            );
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
