//! NAT behavior discovery, as described in
//! [`RFC 5780`](https://datatracker.ietf.org/doc/html/rfc5780#section-4.3).
//!
//! The mapping behavior is found by comparing the addresses mapped for requests sent to
//! the primary and alternate addresses of the server. The filtering behavior is found by
//! asking the server to answer from its alternate address and port with the
//! `CHANGE-REQUEST` attribute.

use crate::behavior::{FilteringBehavior, MappingBehavior, NatType};
use crate::client::StunClient;
use crate::local::{InterfaceAddresses, LocalAddresses};
use crate::transport::Transport;
use crate::{resolve, DiscoveryError};
use log::{debug, info, warn};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use stun_proto::attributes::{ChangeRequest, Software};
use stun_proto::methods::BINDING;
use stun_proto::{
    Cookie, DecoderContextBuilder, Dialect, MessageClass, MessageDecoderBuilder, StunMessage,
    StunMessageBuilder,
};

/// Default STUN port
pub const DEFAULT_PORT: u16 = 3478;
/// Default time to wait for the response to each probe
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(6);

/// Requests sent during the discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    /// Binding request to the primary address
    Mapping1,
    /// Binding request to the alternate IP address and primary port
    Mapping2,
    /// Binding request to the alternate address
    Mapping3,
    /// Binding request asking to change IP address and port
    Filtering1,
    /// Binding request asking to change port
    Filtering2,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Probe::Mapping1 => "mapping test I",
            Probe::Mapping2 => "mapping test II",
            Probe::Mapping3 => "mapping test III",
            Probe::Filtering1 => "filtering test II",
            Probe::Filtering2 => "filtering test III",
        };
        write!(f, "{}", name)
    }
}

/// What happened to a probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A success response arrived, carrying the mapped address if any
    Response(Option<SocketAddr>),
    /// Nothing arrived in time
    Timeout,
    /// The request could not be sent or the response was not usable
    Failed(String),
}

/// Diagnostic record of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Probe sent
    pub probe: Probe,
    /// Address the request was sent to
    pub target: SocketAddr,
    /// Result of the probe
    pub outcome: ProbeOutcome,
}

/// Result of a discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatClassification {
    mapping: MappingBehavior,
    filtering: FilteringBehavior,
    public_address: bool,
    mapped_address: Option<SocketAddr>,
    alternate_address: Option<SocketAddr>,
    probes: Vec<ProbeReport>,
}

impl NatClassification {
    /// Mapping behavior
    pub fn mapping(&self) -> MappingBehavior {
        self.mapping
    }

    /// Filtering behavior
    pub fn filtering(&self) -> FilteringBehavior {
        self.filtering
    }

    /// Returns `true` if the address mapped by the server is one of the host addresses
    pub fn public_address(&self) -> bool {
        self.public_address
    }

    /// Address mapped for the first request
    pub fn mapped_address(&self) -> Option<SocketAddr> {
        self.mapped_address
    }

    /// Alternate address announced by the server
    pub fn alternate_address(&self) -> Option<SocketAddr> {
        self.alternate_address
    }

    /// Probes in the order they were sent
    pub fn probes(&self) -> &[ProbeReport] {
        &self.probes
    }

    /// RFC 3489 name of the NAT
    pub fn nat_type(&self) -> NatType {
        NatType::from_behavior(self.mapping, self.filtering, self.public_address)
    }
}

struct NatClassifierParameters<T> {
    host: String,
    port: u16,
    timeout: Duration,
    software: Option<Software>,
    dialect: Option<Dialect>,
    transport: T,
    local: Box<dyn LocalAddresses + Send + Sync>,
}

/// Builder of [`NatClassifier`]
pub struct NatClassifierBuilder<T>(NatClassifierParameters<T>);

impl<T: Transport> NatClassifierBuilder<T> {
    /// Creates a builder for a classifier that probes `host` over `transport`
    pub fn new<S: Into<String>>(host: S, transport: T) -> Self {
        Self(NatClassifierParameters {
            host: host.into(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            software: None,
            dialect: None,
            transport,
            local: Box::new(InterfaceAddresses),
        })
    }

    /// Server port, [`DEFAULT_PORT`] if not set
    pub fn with_port(mut self, port: u16) -> Self {
        self.0.port = port;
        self
    }

    /// Time to wait for each response, [`DEFAULT_TIMEOUT`] if not set
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.0.timeout = timeout;
        self
    }

    /// Adds a `SOFTWARE` attribute to every request
    pub fn with_software(mut self, software: Software) -> Self {
        self.0.software = Some(software);
        self
    }

    /// Dialect spoken to the server. [`Dialect::Rfc3489`] sends requests without the magic
    /// cookie and decodes responses with the RFC 3489 attributes only. Any other dialect
    /// decodes responses with [`Dialect::Mix`], since an RFC 5780 response mixes attributes
    /// from RFC 5389 and RFC 5780.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.0.dialect = Some(dialect);
        self
    }

    /// Source of the host addresses, [`InterfaceAddresses`] if not set
    pub fn with_local_addresses<L>(mut self, local: L) -> Self
    where
        L: LocalAddresses + Send + Sync + 'static,
    {
        self.0.local = Box::new(local);
        self
    }

    /// Creates the classifier
    pub fn build(self) -> NatClassifier<T> {
        NatClassifier::new(self.0)
    }
}

/// Discovers the behavior of the NATs between this host and a STUN server
pub struct NatClassifier<T> {
    host: String,
    port: u16,
    timeout: Duration,
    software: Option<Software>,
    dialect: Option<Dialect>,
    local: Box<dyn LocalAddresses + Send + Sync>,
    client: StunClient<T>,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Init,
    MappingProbe1,
    MappingProbe2 {
        mapped: SocketAddr,
        alternate: SocketAddr,
    },
    MappingProbe3 {
        mapped: SocketAddr,
        alternate: SocketAddr,
    },
    FilteringProbe1,
    FilteringProbe2,
    Done,
}

// State of one discovery
struct Session {
    server: SocketAddr,
    local: Vec<IpAddr>,
    mapping: MappingBehavior,
    filtering: FilteringBehavior,
    public_address: bool,
    mapped_address: Option<SocketAddr>,
    alternate_address: Option<SocketAddr>,
    probes: Vec<ProbeReport>,
}

impl<T: Transport> NatClassifier<T> {
    fn new(params: NatClassifierParameters<T>) -> Self {
        let decoder = match params.dialect {
            Some(Dialect::Rfc3489) => MessageDecoderBuilder::default()
                .with_context(
                    DecoderContextBuilder::default()
                        .with_dialect(Dialect::Rfc3489)
                        .build(),
                )
                .build(),
            Some(_) => MessageDecoderBuilder::default()
                .with_context(
                    DecoderContextBuilder::default()
                        .with_dialect(Dialect::Mix)
                        .build(),
                )
                .build(),
            None => MessageDecoderBuilder::default().build(),
        };

        Self {
            host: params.host,
            port: params.port,
            timeout: params.timeout,
            software: params.software,
            dialect: params.dialect,
            local: params.local,
            client: StunClient::with_decoder(params.transport, decoder),
        }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        self.client.transport()
    }

    /// Runs the discovery. Lost, malformed or error responses only drive the
    /// classification; errors are returned when the server can not be resolved, or
    /// when the host addresses can not be read.
    pub async fn check(&mut self) -> Result<NatClassification, DiscoveryError> {
        let mut session = Session {
            server: SocketAddr::from(([0, 0, 0, 0], self.port)),
            local: Vec::new(),
            mapping: MappingBehavior::Blocked,
            filtering: FilteringBehavior::Blocked,
            public_address: false,
            mapped_address: None,
            alternate_address: None,
            probes: Vec::new(),
        };

        let mut step = Step::Init;
        let result = loop {
            debug!("Discovery step: {:?}", step);
            step = match self.step(&mut session, step).await {
                Ok(Step::Done) => break Ok(()),
                Ok(next) => next,
                Err(e) => break Err(e),
            };
        };

        if let Err(e) = self.client.transport_mut().disconnect().await {
            debug!("Error disconnecting transport: {}", e);
        }
        result?;

        let classification = NatClassification {
            mapping: session.mapping,
            filtering: session.filtering,
            public_address: session.public_address,
            mapped_address: session.mapped_address,
            alternate_address: session.alternate_address,
            probes: session.probes,
        };
        info!(
            "NAT behind {}: {} mapping, {} filtering ({})",
            session.server,
            classification.mapping,
            classification.filtering,
            classification.nat_type()
        );
        Ok(classification)
    }

    async fn step(&mut self, session: &mut Session, step: Step) -> Result<Step, DiscoveryError> {
        let next = match step {
            Step::Init => {
                session.server = resolve(&self.host, self.port).await?;
                session.local = self.local.local_addresses()?;
                Step::MappingProbe1
            }
            Step::MappingProbe1 => {
                let target = session.server;
                let Some(mapped) = self.mapping_probe(session, Probe::Mapping1, target).await?
                else {
                    session.mapping = MappingBehavior::Blocked;
                    return Ok(Step::FilteringProbe1);
                };
                session.mapped_address = Some(mapped.0);
                session.alternate_address = mapped.1;

                if session.local.contains(&mapped.0.ip()) && mapped.0.port() == self.port {
                    debug!("Mapped address {} is a local address", mapped.0);
                    session.public_address = true;
                    session.mapping = MappingBehavior::EndpointIndependent;
                    return Ok(Step::FilteringProbe1);
                }

                match mapped.1 {
                    Some(alternate) => Step::MappingProbe2 {
                        mapped: mapped.0,
                        alternate,
                    },
                    None => {
                        warn!("Server {} did not announce an alternate address", target);
                        session.mapping = MappingBehavior::Blocked;
                        Step::FilteringProbe1
                    }
                }
            }
            Step::MappingProbe2 { mapped, alternate } => {
                let target = SocketAddr::new(alternate.ip(), session.server.port());
                session.mapping = match self
                    .mapping_probe(session, Probe::Mapping2, target)
                    .await?
                {
                    None => MappingBehavior::Blocked,
                    Some((second, _)) if second == mapped => MappingBehavior::EndpointIndependent,
                    Some((second, _)) => {
                        return Ok(Step::MappingProbe3 {
                            mapped: second,
                            alternate,
                        })
                    }
                };
                Step::FilteringProbe1
            }
            Step::MappingProbe3 { mapped, alternate } => {
                session.mapping = match self
                    .mapping_probe(session, Probe::Mapping3, alternate)
                    .await?
                {
                    None => MappingBehavior::Blocked,
                    Some((third, _)) if third == mapped => MappingBehavior::AddressDependent,
                    Some(_) => MappingBehavior::AddressAndPortDependent,
                };
                Step::FilteringProbe1
            }
            Step::FilteringProbe1 => {
                let (server, change) = (session.server, ChangeRequest::new(true, true));
                if self
                    .probe(session, Probe::Filtering1, server, Some(change))
                    .await?
                    .is_some()
                {
                    session.filtering = FilteringBehavior::EndpointIndependent;
                    Step::Done
                } else {
                    Step::FilteringProbe2
                }
            }
            Step::FilteringProbe2 => {
                let (server, change) = (session.server, ChangeRequest::new(false, true));
                session.filtering = match self
                    .probe(session, Probe::Filtering2, server, Some(change))
                    .await?
                {
                    Some(_) => FilteringBehavior::AddressDependent,
                    None => FilteringBehavior::AddressAndPortDependent,
                };
                Step::Done
            }
            Step::Done => Step::Done,
        };
        Ok(next)
    }

    // Returns the mapped and alternate addresses of the response
    async fn mapping_probe(
        &mut self,
        session: &mut Session,
        probe: Probe,
        target: SocketAddr,
    ) -> Result<Option<(SocketAddr, Option<SocketAddr>)>, DiscoveryError> {
        Ok(self
            .probe(session, probe, target, None)
            .await?
            .and_then(|response| {
                let mapped = response.reflexive_address()?;
                Some((mapped, response.alternate_address()))
            }))
    }

    fn request(&self, change: Option<ChangeRequest>) -> StunMessage {
        let mut builder = StunMessageBuilder::new(BINDING, MessageClass::Request);
        if self.dialect == Some(Dialect::Rfc3489) {
            builder = builder.with_cookie(Cookie::random());
        }
        if let Some(change) = change {
            builder = builder.with_attribute(change);
        }
        if let Some(software) = &self.software {
            builder = builder.with_attribute(software.clone());
        }
        builder.build()
    }

    // Sends one request. Only encoding errors are returned, anything else that prevents
    // getting a success response is recorded as a failed probe.
    async fn probe(
        &mut self,
        session: &mut Session,
        probe: Probe,
        target: SocketAddr,
        change: Option<ChangeRequest>,
    ) -> Result<Option<StunMessage>, DiscoveryError> {
        let request = self.request(change);
        let result = match self.client.transport_mut().connect(target).await {
            Ok(()) => self.client.send_and_await(&request, self.timeout).await,
            Err(e) => Err(DiscoveryError::Io(e)),
        };

        let (outcome, response) = match result {
            Ok(response) => match check_response(&response) {
                Ok(()) => (
                    ProbeOutcome::Response(response.reflexive_address()),
                    Some(response),
                ),
                Err(e) => {
                    warn!("{} to {}: {}", probe, target, e);
                    (ProbeOutcome::Failed(e.to_string()), None)
                }
            },
            Err(DiscoveryError::Timeout) => (ProbeOutcome::Timeout, None),
            Err(e @ DiscoveryError::Encode(_)) => return Err(e),
            Err(e) => {
                warn!("{} to {} failed: {}", probe, target, e);
                (ProbeOutcome::Failed(e.to_string()), None)
            }
        };

        debug!("{} to {}: {:?}", probe, target, outcome);
        session.probes.push(ProbeReport {
            probe,
            target,
            outcome,
        });
        Ok(response)
    }
}

fn check_response(response: &StunMessage) -> Result<(), DiscoveryError> {
    if response.method() != BINDING {
        return Err(DiscoveryError::UnexpectedResponse(format!(
            "method {:#06x}",
            response.method().as_u16()
        )));
    }

    match response.class() {
        MessageClass::SuccessResponse => Ok(()),
        MessageClass::ErrorResponse => Err(DiscoveryError::UnexpectedResponse(
            match response.error_code() {
                Some(error) => format!("error {} {}", error.code(), error.reason()),
                None => String::from("error response"),
            },
        )),
        class => Err(DiscoveryError::UnexpectedResponse(format!("{:?}", class))),
    }
}
