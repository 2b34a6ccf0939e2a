use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use stun_proto::attributes::{
    AddressAttribute, AddressRole, ChangeRequest, ErrorCode, Fingerprint, MessageIntegrity, Nonce,
    Padding, Password, Realm, ResponsePort, Software, Unknown, UnknownAttributes, UserName,
};
use stun_proto::methods::{BINDING, SHARED_SECRET};
use stun_proto::{
    AttributeType, Cookie, DecoderContextBuilder, Dialect, HMACKey, MessageClass, MessageDecoder,
    MessageDecoderBuilder, MessageEncoderBuilder, StunAttribute, StunMessage, StunMessageBuilder,
    TransactionId,
};

const RAW: [u8; 12] = [0x11; 12];

fn round_trip(msg: &StunMessage, decoder: &MessageDecoder) -> StunMessage {
    let encoder = MessageEncoderBuilder::default().build();
    let buffer = encoder
        .encode_to_vec(msg)
        .expect("Failed to encode StunMessage");
    assert_eq!(buffer.len(), msg.encoded_size());

    let (decoded, size) = decoder
        .decode(&buffer)
        .expect("Failed to decode StunMessage");
    assert_eq!(size, buffer.len());
    decoded
}

fn addresses() -> Vec<SocketAddr> {
    vec![
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 65535),
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 3478),
        SocketAddr::new(
            IpAddr::V6(Ipv6Addr::new(
                0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
            )),
            65535,
        ),
    ]
}

#[test]
fn test_stun_attributes_request() {
    const USERNAME: &str = "\u{30DE}\u{30C8}\u{30EA}\u{30C3}\u{30AF}\u{30B9}";
    const SOFTWARE: &str = "STUN test";
    const NONCE: &str = "f//499k954d6OL34oL9FSTvy64sA";
    const REALM: &str = "example.org";

    let username = UserName::new(USERNAME).expect("Failed to create UserName");
    let nonce = Nonce::new(NONCE).expect("Failed to create Nonce");
    let realm = Realm::new(REALM).expect("Failed to create Realm");
    let software = Software::new(SOFTWARE).expect("Failed to create Software");
    let key = HMACKey::new_long_term(&username, &realm, "TheMatrIX")
        .expect("Failed to create HMACKey");

    let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
        .with_transaction_id(TransactionId::from(RAW))
        .with_attribute(username)
        .with_attribute(nonce)
        .with_attribute(realm)
        .with_attribute(software)
        .with_attribute(MessageIntegrity::new(key.clone()))
        .with_attribute(Fingerprint::default())
        .build();

    let ctx = DecoderContextBuilder::default()
        .with_key(key)
        .with_validation()
        .build();
    let decoder = MessageDecoderBuilder::default().with_context(ctx).build();
    let decoded = round_trip(&msg, &decoder);

    assert_eq!(decoded.method(), BINDING);
    assert_eq!(decoded.class(), MessageClass::Request);
    assert_eq!(decoded.transaction_id(), &TransactionId::from(RAW));
    assert_eq!(decoded.message_length(), msg.message_length());

    let attribute = decoded
        .get(AttributeType::USER_NAME)
        .expect("USERNAME not found");
    assert!(attribute.is_user_name());
    assert_eq!(attribute.expect_user_name(), USERNAME);

    let nonce = decoded
        .get(AttributeType::NONCE)
        .expect("NONCE not found")
        .as_nonce()
        .expect("NONCE expected");
    assert_eq!(nonce, NONCE);

    let realm = decoded
        .get(AttributeType::REALM)
        .expect("REALM not found")
        .as_realm()
        .expect("REALM expected");
    assert_eq!(realm, REALM);

    let software = decoded
        .get(AttributeType::SOFTWARE)
        .expect("SOFTWARE not found")
        .as_software()
        .expect("SOFTWARE expected");
    assert_eq!(software, SOFTWARE);

    let integrity = decoded
        .get(AttributeType::MESSAGE_INTEGRITY)
        .expect("MESSAGE-INTEGRITY not found")
        .expect_message_integrity();
    assert!(integrity.hmac().is_some());
    assert!(decoded
        .get(AttributeType::FINGERPRINT)
        .expect("FINGERPRINT not found")
        .expect_fingerprint()
        .value()
        .is_some());
}

#[test]
fn test_address_attributes() {
    let decoder = MessageDecoderBuilder::default().build();
    let roles = [
        AddressRole::MappedAddress,
        AddressRole::XorMappedAddress,
        AddressRole::AlternateServer,
        AddressRole::ResponseOrigin,
        AddressRole::OtherAddress,
    ];

    for addr in addresses() {
        let mut builder = StunMessageBuilder::new(BINDING, MessageClass::SuccessResponse);
        for role in roles {
            builder = builder.with_attribute(AddressAttribute::new(role, addr));
        }
        let msg = builder.build();
        let decoded = round_trip(&msg, &decoder);
        assert_eq!(decoded, msg);
        assert_eq!(decoded.xor_mapped_address(), Some(addr));
        assert_eq!(decoded.other_address(), Some(addr));
    }
}

#[test]
fn test_rfc3489_attributes() {
    let decoder = MessageDecoderBuilder::default().build();
    let roles = [
        AddressRole::MappedAddress,
        AddressRole::ResponseAddress,
        AddressRole::SourceAddress,
        AddressRole::ChangedAddress,
        AddressRole::ReflectedFrom,
    ];

    for addr in addresses() {
        let mut builder = StunMessageBuilder::new(BINDING, MessageClass::Request)
            .with_cookie(Cookie::random())
            .with_attribute(ChangeRequest::new(true, false));
        for role in roles {
            builder = builder.with_attribute(AddressAttribute::new(role, addr));
        }
        let msg = builder.build();
        let decoded = round_trip(&msg, &decoder);
        assert!(!decoded.has_magic_cookie());
        assert_eq!(decoded, msg);
    }

    let msg = StunMessageBuilder::new(SHARED_SECRET, MessageClass::SuccessResponse)
        .with_cookie(Cookie::random())
        .with_attribute(UserName::new("user").expect("Failed to create UserName"))
        .with_attribute(
            Password::new(vec![0xde, 0xad, 0xbe, 0xef, 0x01]).expect("Failed to create Password"),
        )
        .build();
    assert_eq!(round_trip(&msg, &decoder), msg);

    // RFC 3489 accepts error classes below 3
    let msg = StunMessageBuilder::new(BINDING, MessageClass::ErrorResponse)
        .with_cookie(Cookie::random())
        .with_attribute(ErrorCode::new(100, "Legacy").expect("Failed to create ErrorCode"))
        .with_attribute(UnknownAttributes::new(vec![
            AttributeType::new(0x0024),
            AttributeType::new(0x0025),
            AttributeType::new(0x0026),
        ]))
        .build();
    let decoded = round_trip(&msg, &decoder);
    assert_eq!(decoded, msg);
    let error = decoded.error_code().expect("ERROR-CODE expected");
    assert_eq!(error.class(), 1);
    assert_eq!(error.number(), 0);
}

#[test]
fn test_rfc5780_attributes() {
    let ctx = DecoderContextBuilder::default()
        .with_dialect(Dialect::Rfc5780)
        .build();
    let decoder = MessageDecoderBuilder::default().with_context(ctx).build();

    for port in [0, 1, 3479, 65535] {
        let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
            .with_attribute(ChangeRequest::new(true, true))
            .with_attribute(ResponsePort::new(port))
            .with_attribute(Padding::new(vec![0u8; 7]).expect("Failed to create Padding"))
            .build();
        assert_eq!(round_trip(&msg, &decoder), msg);
    }

    // Fixed dialects keep what they do not know
    let msg = StunMessageBuilder::new(BINDING, MessageClass::Request)
        .with_attribute(Software::new("client").expect("Failed to create Software"))
        .build();
    let decoded = round_trip(&msg, &decoder);
    let unknown = decoded.attributes()[0].expect_unknown();
    assert_eq!(unknown.value(), b"client");
}

#[test]
fn test_error_response() {
    let decoder = MessageDecoderBuilder::default().build();
    let msg = StunMessageBuilder::new(BINDING, MessageClass::ErrorResponse)
        .with_attribute(
            ErrorCode::new(420, "Unknown Attribute").expect("Failed to create ErrorCode"),
        )
        .with_attribute(UnknownAttributes::new(vec![AttributeType::new(0x0024)]))
        .build();
    let decoded = round_trip(&msg, &decoder);
    assert_eq!(decoded, msg);

    let error = decoded.error_code().expect("ERROR-CODE expected");
    assert_eq!(error.code(), 420);
    assert_eq!(error.reason(), "Unknown Attribute");
    let unknown = decoded
        .get(AttributeType::UNKNOWN_ATTRIBUTES)
        .expect("UNKNOWN-ATTRIBUTES not found")
        .expect_unknown_attributes();
    assert_eq!(unknown.attributes(), &[AttributeType::new(0x0024)]);
}

#[test]
fn test_unknown_attributes_round_trip() {
    let decoder = MessageDecoderBuilder::default().build();
    for size in [0usize, 1, 2, 3, 4, 5] {
        let value: Vec<u8> = (0..size as u8).collect();
        let msg = StunMessageBuilder::new(BINDING, MessageClass::Indication)
            .with_attribute(Unknown::new(AttributeType::new(0xc001), value.clone()))
            .with_attribute(StunAttribute::from(
                Software::new("x").expect("Failed to create Software"),
            ))
            .build();
        let decoded = round_trip(&msg, &decoder);
        assert_eq!(decoded, msg);
        assert_eq!(decoded.attributes()[0].expect_unknown().value(), &value[..]);
    }
}
