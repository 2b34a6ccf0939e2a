use crate::error::{StunError, StunErrorType};
use rand::RngCore;
use std::convert::TryFrom;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

pub(crate) const MAGIC_COOKIE_SIZE: usize = 4;
pub(crate) const TRANSACTION_ID_SIZE: usize = 12;

/// The 32 bits following the length field of the STUN header. RFC 5389 fixes them to
/// [`MAGIC_COOKIE`]; in RFC 3489 they are the most significant bits of a 128-bit transaction id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cookie(u32);

impl Cookie {
    /// Creates a cookie from its wire value
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Creates a random value that is never the magic cookie. Used to build RFC 3489 requests,
    /// whose transaction id spans the cookie bits.
    pub fn random() -> Self {
        let mut rng = rand::rng();
        loop {
            let value = rng.next_u32();
            if value != MAGIC_COOKIE.0 {
                return Self(value);
            }
        }
    }

    /// Returns the cookie as `u32`
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns `true` if this is the RFC 5389 magic cookie
    pub fn is_magic(&self) -> bool {
        *self == MAGIC_COOKIE
    }
}

impl Default for Cookie {
    fn default() -> Self {
        MAGIC_COOKIE
    }
}

impl PartialEq<u32> for Cookie {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl PartialEq<Cookie> for u32 {
    fn eq(&self, other: &Cookie) -> bool {
        *self == other.0
    }
}

impl From<[u8; MAGIC_COOKIE_SIZE]> for Cookie {
    fn from(value: [u8; MAGIC_COOKIE_SIZE]) -> Self {
        Self(u32::from_be_bytes(value))
    }
}

/// The magic cookie field **MUST** contain the fixed value `0x2112A442` in network byte order.
pub const MAGIC_COOKIE: Cookie = Cookie(0x2112_A442);

/// The transaction ID is a 96-bit identifier, used to uniquely identify STUN transactions.
/// The default value is drawn from a cryptographically strong random source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId([u8; TRANSACTION_ID_SIZE]);

impl TransactionId {
    /// Returns a reference to the bytes that represents the identifier.
    pub fn as_bytes(&self) -> &[u8; TRANSACTION_ID_SIZE] {
        &self.0
    }
}

fn fmt_transaction_id(bytes: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    for byte in bytes {
        write!(f, "{:02X}", byte)?;
    }
    write!(f, ")")
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TransactionId(0x")?;
        fmt_transaction_id(self.as_ref(), f)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "transaction id (0x")?;
        fmt_transaction_id(self.as_ref(), f)
    }
}

impl Deref for TransactionId {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for TransactionId {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl From<[u8; TRANSACTION_ID_SIZE]> for TransactionId {
    fn from(buff: [u8; TRANSACTION_ID_SIZE]) -> Self {
        Self(buff)
    }
}

impl From<&[u8; TRANSACTION_ID_SIZE]> for TransactionId {
    fn from(buff: &[u8; TRANSACTION_ID_SIZE]) -> Self {
        Self(*buff)
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        let mut buffer = [0u8; TRANSACTION_ID_SIZE];
        rand::rng().fill_bytes(&mut buffer);
        Self(buffer)
    }
}

/// Address family carried by the address attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    /// IP version 4
    IPv4 = 0x01,
    /// IP version 6
    IPv6 = 0x02,
}

impl TryFrom<u8> for AddressFamily {
    type Error = StunError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(AddressFamily::IPv4),
            0x02 => Ok(AddressFamily::IPv6),
            _ => Err(StunError::new(
                StunErrorType::UnknownAddressFamily,
                format!("Unknown address family: {:#04x}", value),
            )),
        }
    }
}

/// Credential mechanism used to derive the key of the `MESSAGE-INTEGRITY` attribute
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum CredentialMechanism {
    /// Short-term credential mechanism
    ShortTerm,
    /// Long-term credential mechanism
    LongTerm,
}

impl CredentialMechanism {
    /// Returns `true` if this is a short-term credential mechanism
    pub fn is_short_term(&self) -> bool {
        matches!(self, CredentialMechanism::ShortTerm)
    }

    /// Returns `true` if this is a long-term credential mechanism
    pub fn is_long_term(&self) -> bool {
        matches!(self, CredentialMechanism::LongTerm)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct HMACKeyPriv {
    mechanism: CredentialMechanism,
    key: Vec<u8>,
}

/// Key used to compute and verify `MESSAGE-INTEGRITY`.
///
/// For short-term credentials the key is the password itself. For long-term credentials
/// the key is `MD5(username ":" realm ":" password)`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct HMACKey(Arc<HMACKeyPriv>);

impl HMACKey {
    /// Creates a short-term credential key
    pub fn new_short_term<S>(password: S) -> Result<Self, StunError>
    where
        S: AsRef<str>,
    {
        let password = password.as_ref();
        if password.is_empty() {
            return Err(StunError::new(
                StunErrorType::InvalidParam,
                "Password can not be empty",
            ));
        }
        Ok(HMACKey(Arc::new(HMACKeyPriv {
            mechanism: CredentialMechanism::ShortTerm,
            key: password.as_bytes().to_vec(),
        })))
    }

    /// Creates a long-term credential key
    pub fn new_long_term<A, B, C>(username: A, realm: B, password: C) -> Result<Self, StunError>
    where
        A: AsRef<str>,
        B: AsRef<str>,
        C: AsRef<str>,
    {
        if username.as_ref().is_empty() || password.as_ref().is_empty() {
            return Err(StunError::new(
                StunErrorType::InvalidParam,
                "Username and password can not be empty",
            ));
        }
        let key_str = format!(
            "{}:{}:{}",
            username.as_ref(),
            realm.as_ref(),
            password.as_ref()
        );
        let digest = md5::compute(key_str.as_bytes());
        Ok(HMACKey(Arc::new(HMACKeyPriv {
            mechanism: CredentialMechanism::LongTerm,
            key: digest.to_vec(),
        })))
    }

    /// Returns the key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0.key
    }

    /// Returns the credential mechanism the key was created for
    pub fn mechanism(&self) -> CredentialMechanism {
        self.0.mechanism
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie() {
        assert!(MAGIC_COOKIE.is_magic());
        assert_eq!(MAGIC_COOKIE, 0x2112_A442);
        assert_eq!(Cookie::default(), MAGIC_COOKIE);
        assert_eq!(Cookie::from([0x21, 0x12, 0xa4, 0x42]), MAGIC_COOKIE);
        for _ in 0..16 {
            assert!(!Cookie::random().is_magic());
        }
    }

    #[test]
    fn transaction_id() {
        let tid = TransactionId::from([0xab; TRANSACTION_ID_SIZE]);
        assert_eq!(tid.as_bytes(), &[0xab; TRANSACTION_ID_SIZE]);
        assert_eq!(
            format!("{:?}", tid),
            "TransactionId(0xABABABABABABABABABABABAB)"
        );
        assert_eq!(
            format!("{}", tid),
            "transaction id (0xABABABABABABABABABABABAB)"
        );
        // Two random identifiers colliding is practically impossible
        assert_ne!(TransactionId::default(), TransactionId::default());
    }

    #[test]
    fn address_family() {
        assert_eq!(
            AddressFamily::try_from(0x01).expect("Can not get family"),
            AddressFamily::IPv4
        );
        assert_eq!(
            AddressFamily::try_from(0x02).expect("Can not get family"),
            AddressFamily::IPv6
        );
        assert_eq!(
            AddressFamily::try_from(0x03).expect_err("Error expected"),
            StunErrorType::UnknownAddressFamily
        );
    }

    #[test]
    fn short_term_key() {
        let key = HMACKey::new_short_term("VOkJxbRl1RmTxUk/WvJxBt").expect("Can not create key");
        assert!(key.mechanism().is_short_term());
        assert_eq!(key.as_bytes(), b"VOkJxbRl1RmTxUk/WvJxBt");
        assert_eq!(
            HMACKey::new_short_term("").expect_err("Error expected"),
            StunErrorType::InvalidParam
        );
    }

    #[test]
    fn long_term_key() {
        let key = HMACKey::new_long_term("user", "realm", "pass").expect("Can not create key");
        assert!(key.mechanism().is_long_term());
        assert_eq!(
            key.as_bytes(),
            md5::compute(b"user:realm:pass").to_vec().as_slice()
        );
        assert_eq!(
            HMACKey::new_long_term("", "realm", "pass").expect_err("Error expected"),
            StunErrorType::InvalidParam
        );
    }
}
