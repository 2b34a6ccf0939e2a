use crate::attributes::{stun_attribute, AsVerifiable, DecodeAttributeValue, EncodeAttributeValue};
use crate::context::AttributeContext;
use crate::cursor::{BitCursor, BitWriter};
use crate::error::{StunError, StunErrorType};

fn check_max_size(name: &str, size: usize, max_size: usize) -> Result<(), StunError> {
    if size > max_size {
        return Err(StunError::new(
            StunErrorType::ValueTooLong,
            format!("{} of {} bytes exceeds {}", name, size, max_size),
        ));
    }
    Ok(())
}

// Creates a STUN attribute holding an UTF-8 string of bounded size
macro_rules! string_attribute {
    (
        $(#[$meta:meta])*
        $class_name:ident,
        $attr_type:ident,
        $max_size:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $class_name(String);

        impl $class_name {
            /// Maximum size in bytes of the value
            pub const MAX_SIZE: usize = $max_size;

            /// Creates the attribute, failing with `ValueTooLong` above the maximum size
            pub fn new<S>(value: S) -> Result<Self, StunError>
            where
                S: Into<String>,
            {
                let value = value.into();
                check_max_size(std::stringify!($attr_type), value.len(), Self::MAX_SIZE)?;
                Ok(Self(value))
            }

            /// Returns the value as `&str`
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $class_name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $class_name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $class_name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::fmt::Display for $class_name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl DecodeAttributeValue for $class_name {
            fn decode(_ctx: &AttributeContext, cursor: &mut BitCursor) -> Result<Self, StunError> {
                check_max_size(
                    std::stringify!($attr_type),
                    cursor.remaining_bytes(),
                    Self::MAX_SIZE,
                )?;
                let value = std::str::from_utf8(cursor.read_remaining()?)?;
                Ok(Self(value.to_string()))
            }
        }

        impl EncodeAttributeValue for $class_name {
            fn value_size(&self) -> usize {
                self.0.len()
            }

            fn encode(
                &self,
                _ctx: &AttributeContext,
                writer: &mut BitWriter,
            ) -> Result<(), StunError> {
                writer.write_bytes(self.0.as_bytes())
            }
        }

        impl AsVerifiable for $class_name {}

        stun_attribute!($class_name, $attr_type);
    };
}

// Creates a STUN attribute holding opaque bytes
macro_rules! opaque_attribute {
    (
        $(#[$meta:meta])*
        $class_name:ident,
        $attr_type:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $class_name(Vec<u8>);

        impl $class_name {
            /// Creates the attribute. The value must fit in the 16-bit attribute length.
            pub fn new<T>(value: T) -> Result<Self, StunError>
            where
                T: Into<Vec<u8>>,
            {
                let value = value.into();
                check_max_size(std::stringify!($attr_type), value.len(), u16::MAX as usize)?;
                Ok(Self(value))
            }

            /// Returns the value
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }
        }

        impl AsRef<[u8]> for $class_name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl DecodeAttributeValue for $class_name {
            fn decode(_ctx: &AttributeContext, cursor: &mut BitCursor) -> Result<Self, StunError> {
                Ok(Self(cursor.read_remaining()?.to_vec()))
            }
        }

        impl EncodeAttributeValue for $class_name {
            fn value_size(&self) -> usize {
                self.0.len()
            }

            fn encode(
                &self,
                _ctx: &AttributeContext,
                writer: &mut BitWriter,
            ) -> Result<(), StunError> {
                writer.write_bytes(&self.0)
            }
        }

        impl AsVerifiable for $class_name {}

        stun_attribute!($class_name, $attr_type);
    };
}

string_attribute!(
    /// The `USERNAME` attribute is used for message integrity. It identifies the username
    /// and password combination used in the message-integrity check.
    UserName,
    USER_NAME,
    513
);

string_attribute!(
    /// The `REALM` attribute is present in requests and responses using the long-term
    /// credential mechanism.
    Realm,
    REALM,
    763
);

string_attribute!(
    /// The `NONCE` attribute may be present in requests and responses using the long-term
    /// credential mechanism.
    Nonce,
    NONCE,
    763
);

string_attribute!(
    /// The `SOFTWARE` attribute contains a textual description of the software being used
    /// by the agent sending the message.
    /// # Examples
    ///```rust
    /// # use stun_proto::attributes::Software;
    /// let attr = Software::new("STUN test client").unwrap();
    /// assert_eq!(attr, "STUN test client");
    ///```
    Software,
    SOFTWARE,
    763
);

opaque_attribute!(
    /// The RFC 3489 `PASSWORD` attribute, returned in Shared Secret responses.
    Password,
    PASSWORD
);

opaque_attribute!(
    /// The `PADDING` attribute allows for the entire message to be padded to force the
    /// STUN message to be divided into IP fragments. Its content is ignored.
    Padding,
    PADDING
);
