// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound command handling.
//!
//! Every `set` message is handled in its own task so a slow gateway call
//! never holds up later messages. Failures are logged and dropped; the
//! message is acknowledged either way.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::Result;
use crate::protocol::{Acknowledger, Gateway, InboundMessage, Publisher};
use crate::state::UnitCommand;
use crate::sync::Synchronizer;

/// What happened to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The command was written to the gateway.
    Applied(UnitCommand),
    /// The topic does not name a settable channel.
    Ignored,
}

/// Translates one `set` message and applies it.
///
/// # Errors
///
/// Returns any error from [`Synchronizer::apply_command`].
pub async fn handle_message<G, P>(
    synchronizer: &Synchronizer<G, P>,
    topic: &str,
    payload: &str,
) -> Result<MessageOutcome>
where
    G: Gateway,
    P: Publisher,
{
    let Some(command) = UnitCommand::from_message(topic, payload, synchronizer.layout()) else {
        return Ok(MessageOutcome::Ignored);
    };

    synchronizer.apply_command(&command).await?;
    Ok(MessageOutcome::Applied(command))
}

/// Consumes inbound messages until the stream closes.
///
/// Each message is handled concurrently and acknowledged after processing,
/// whatever the outcome. Returns once the stream has closed and every
/// in-flight message has been handled.
pub async fn serve_commands<G, P>(
    synchronizer: Arc<Synchronizer<G, P>>,
    mut inbound: mpsc::Receiver<InboundMessage>,
) where
    G: Gateway + 'static,
    P: Publisher + Acknowledger + 'static,
{
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            message = inbound.recv() => {
                let Some(message) = message else { break };
                in_flight.spawn(process(Arc::clone(&synchronizer), message));
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Command task panicked");
                }
            }
        }
    }

    tracing::info!(pending = in_flight.len(), "Inbound message stream closed");
    while in_flight.join_next().await.is_some() {}
}

/// Handles one message, then acknowledges it.
async fn process<G, P>(synchronizer: Arc<Synchronizer<G, P>>, message: InboundMessage)
where
    G: Gateway,
    P: Publisher + Acknowledger,
{
    tracing::info!(
        topic = %message.topic(),
        payload = %message.payload(),
        "Command received"
    );

    match handle_message(&synchronizer, message.topic(), message.payload()).await {
        Ok(MessageOutcome::Applied(command)) => {
            tracing::debug!(unit = %command.address, "Command applied");
        }
        Ok(MessageOutcome::Ignored) => {
            tracing::warn!(topic = %message.topic(), "Ignoring message on unsupported topic");
        }
        Err(e) => {
            tracing::error!(
                topic = %message.topic(),
                payload = %message.payload(),
                error = %e,
                "Failed to apply command"
            );
        }
    }

    if let Err(e) = synchronizer.publisher().ack(&message).await {
        tracing::warn!(topic = %message.topic(), error = %e, "Failed to acknowledge message");
    }
}
