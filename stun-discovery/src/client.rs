use crate::transport::Transport;
use crate::DiscoveryError;
use bytes::Bytes;
use log::debug;
use std::io;
use std::time::Duration;
use stun_proto::{MessageDecoder, MessageEncoder, MessageEncoderBuilder, StunMessage};
use tokio::time::Instant;

/// Sends STUN requests over a [`Transport`] and waits for the matching responses
#[derive(Debug)]
pub struct StunClient<T> {
    transport: T,
    encoder: MessageEncoder,
    decoder: MessageDecoder,
}

impl<T: Transport> StunClient<T> {
    /// Creates a client that decodes responses with the default decoder
    pub fn new(transport: T) -> Self {
        Self::with_decoder(transport, MessageDecoder::default())
    }

    /// Creates a client that decodes responses with `decoder`
    pub fn with_decoder(transport: T, decoder: MessageDecoder) -> Self {
        Self {
            transport,
            encoder: MessageEncoderBuilder::default().build(),
            decoder,
        }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consumes the client returning its transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Sends `msg` and waits up to `timeout` for a message carrying the same transaction
    /// id. Anything else received in the meantime is dropped.
    pub async fn send_and_await(
        &mut self,
        msg: &StunMessage,
        timeout: Duration,
    ) -> Result<StunMessage, DiscoveryError> {
        let buffer = self.encoder.encode_to_vec(msg)?;
        self.transport.send(Bytes::from(buffer)).await?;

        let deadline = Instant::now() + timeout;
        loop {
            let buffer = match tokio::time::timeout_at(deadline, self.transport.recv()).await {
                Ok(Some(buffer)) => buffer,
                Ok(None) => {
                    return Err(DiscoveryError::Io(io::Error::new(
                        io::ErrorKind::ConnectionAborted,
                        "Transport closed",
                    )))
                }
                Err(_) => {
                    debug!("Transaction {} timed out", msg.transaction_id());
                    return Err(DiscoveryError::Timeout);
                }
            };

            let response = match self.decoder.decode(&buffer) {
                Ok((response, _)) => response,
                Err(e) => {
                    debug!("Dropping undecodable message of {} bytes: {}", buffer.len(), e);
                    continue;
                }
            };

            if response.transaction_id() != msg.transaction_id()
                || response.cookie() != msg.cookie()
            {
                debug!(
                    "Dropping message for transaction {}, waiting for {}",
                    response.transaction_id(),
                    msg.transaction_id()
                );
                continue;
            }

            return Ok(response);
        }
    }
}
