//! Classifies the NAT in front of this host.
//!
//! ```text
//! cargo run --example nat_check -- stun.example.org [3478] [udp|tcp]
//! ```

use std::env;
use std::net::SocketAddr;
use std::process;
use stun_discovery::{
    DiscoveryError, NatClassification, NatClassifierBuilder, TcpTransport, Transport,
    UdpTransport, DEFAULT_PORT,
};
use stun_proto::attributes::Software;

fn usage() -> ! {
    eprintln!("Usage: nat_check <host> [port] [udp|tcp]");
    process::exit(2);
}

async fn classify<T: Transport>(
    host: &str,
    port: u16,
    transport: T,
) -> Result<NatClassification, DiscoveryError> {
    let software = Software::new(concat!("nat_check ", env!("CARGO_PKG_VERSION")))
        .expect("Can not create Software");
    NatClassifierBuilder::new(host, transport)
        .with_port(port)
        .with_software(software)
        .build()
        .check()
        .await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let host = match args.first() {
        Some(host) => host.as_str(),
        None => usage(),
    };
    let port = match args.get(1) {
        Some(port) => port.parse().unwrap_or_else(|_| usage()),
        None => DEFAULT_PORT,
    };
    let local = SocketAddr::from(([0, 0, 0, 0], 0));

    let result = match args.get(2).map(String::as_str) {
        None | Some("udp") => match UdpTransport::bind(local).await {
            Ok(transport) => classify(host, port, transport).await,
            Err(e) => Err(DiscoveryError::Io(e)),
        },
        Some("tcp") => classify(host, port, TcpTransport::new(local)).await,
        Some(_) => usage(),
    };

    match result {
        Ok(classification) => {
            println!("NAT type:          {}", classification.nat_type());
            println!("Mapping behavior:  {}", classification.mapping());
            println!("Filtering behavior: {}", classification.filtering());
            if let Some(addr) = classification.mapped_address() {
                println!("Mapped address:    {}", addr);
            }
            if let Some(addr) = classification.alternate_address() {
                println!("Alternate address: {}", addr);
            }
            for report in classification.probes() {
                println!("  {} to {}: {:?}", report.probe, report.target, report.outcome);
            }
        }
        Err(e) => {
            eprintln!("Discovery failed: {}", e);
            process::exit(1);
        }
    }
}
