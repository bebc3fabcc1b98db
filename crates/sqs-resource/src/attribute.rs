//! Queue attribute table and value coercion.
//!
//! Every typed accessor on [`Queue`](crate::Queue) is backed by one
//! [`QueueAttribute`] entry. The entry names the accessor, the value kind, and
//! optionally the service attribute key when it does not follow the
//! snake_case to PascalCase convention.

use crate::error::AttributeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
#[path = "attribute_tests.rs"]
mod tests;

/// How an attribute's string value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    String,
    Integer,
    Timestamp,
}

/// Queue attributes with a registered accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueAttribute {
    Policy,
    VisibilityTimeout,
    MaximumMessageSize,
    MessageRetentionPeriod,
    ApproximateNumberOfMessages,
    ApproximateNumberOfMessagesNotVisible,
    CreatedTimestamp,
    LastModifiedTimestamp,
    Arn,
    ApproximateNumberOfMessagesDelayed,
    DelaySeconds,
    ReceiveMessageWaitTimeSeconds,
    RedrivePolicy,
}

impl QueueAttribute {
    pub const ALL: [QueueAttribute; 13] = [
        Self::Policy,
        Self::VisibilityTimeout,
        Self::MaximumMessageSize,
        Self::MessageRetentionPeriod,
        Self::ApproximateNumberOfMessages,
        Self::ApproximateNumberOfMessagesNotVisible,
        Self::CreatedTimestamp,
        Self::LastModifiedTimestamp,
        Self::Arn,
        Self::ApproximateNumberOfMessagesDelayed,
        Self::DelaySeconds,
        Self::ReceiveMessageWaitTimeSeconds,
        Self::RedrivePolicy,
    ];

    /// Accessor identifier, e.g. `visibility_timeout`
    pub fn accessor(self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::VisibilityTimeout => "visibility_timeout",
            Self::MaximumMessageSize => "maximum_message_size",
            Self::MessageRetentionPeriod => "message_retention_period",
            Self::ApproximateNumberOfMessages => "approximate_number_of_messages",
            Self::ApproximateNumberOfMessagesNotVisible => {
                "approximate_number_of_messages_not_visible"
            }
            Self::CreatedTimestamp => "created_timestamp",
            Self::LastModifiedTimestamp => "last_modified_timestamp",
            Self::Arn => "arn",
            Self::ApproximateNumberOfMessagesDelayed => "approximate_number_of_messages_delayed",
            Self::DelaySeconds => "delay_seconds",
            Self::ReceiveMessageWaitTimeSeconds => "receive_message_wait_time_seconds",
            Self::RedrivePolicy => "redrive_policy",
        }
    }

    pub fn kind(self) -> AttributeKind {
        match self {
            Self::Policy | Self::Arn | Self::RedrivePolicy => AttributeKind::String,
            Self::CreatedTimestamp | Self::LastModifiedTimestamp => AttributeKind::Timestamp,
            _ => AttributeKind::Integer,
        }
    }

    fn name_override(self) -> Option<&'static str> {
        match self {
            Self::Arn => Some("QueueArn"),
            _ => None,
        }
    }

    /// Key of this attribute in the service's attribute map
    pub fn service_name(self) -> Cow<'static, str> {
        match self.name_override() {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(pascal_case(self.accessor())),
        }
    }

    /// Look up an attribute by accessor identifier
    pub fn from_accessor(accessor: &str) -> Option<Self> {
        if accessor == "queue_arn" {
            return Some(Self::Arn);
        }
        Self::ALL.into_iter().find(|attr| attr.accessor() == accessor)
    }

    /// Interpret a raw service value according to this attribute's kind
    pub fn parse(self, raw: &str) -> Result<AttributeValue, AttributeError> {
        match self.kind() {
            AttributeKind::String => Ok(AttributeValue::String(raw.to_string())),
            AttributeKind::Integer => raw
                .parse::<i64>()
                .map(AttributeValue::Integer)
                .map_err(|source| AttributeError::InvalidInteger {
                    name: self.service_name().into_owned(),
                    value: raw.to_string(),
                    source,
                }),
            AttributeKind::Timestamp => {
                let invalid = || AttributeError::InvalidTimestamp {
                    name: self.service_name().into_owned(),
                    value: raw.to_string(),
                };
                let seconds = raw.parse::<i64>().map_err(|_| invalid())?;
                Timestamp::from_epoch_seconds(seconds)
                    .map(AttributeValue::Timestamp)
                    .ok_or_else(invalid)
            }
        }
    }
}

impl fmt::Display for QueueAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.accessor())
    }
}

impl FromStr for QueueAttribute {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_accessor(s).ok_or_else(|| AttributeError::UnknownAttribute {
            accessor: s.to_string(),
        })
    }
}

/// Convert `snake_case` to `PascalCase`
pub fn pascal_case(identifier: &str) -> String {
    identifier
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Coerced attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Timestamp(Timestamp),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Self::Timestamp(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "{}", value),
            Self::Integer(value) => write!(f, "{}", value),
            Self::Timestamp(value) => write!(f, "{}", value),
        }
    }
}

/// Timestamp wrapper for consistent time handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current time
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create timestamp from whole seconds since the Unix epoch
    pub fn from_epoch_seconds(seconds: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp(seconds, 0).map(Self)
    }

    /// Create timestamp from DateTime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Whole seconds since the Unix epoch
    pub fn epoch_seconds(&self) -> i64 {
        self.0.timestamp()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}
