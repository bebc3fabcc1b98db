//! Client trait and request/response types for the SQS operations the
//! resource wrappers delegate to.
//!
//! Request types carry every field the service call needs, including the
//! queue URL. [`Queue`](crate::Queue) and [`Message`](crate::Message) accept
//! these requests from callers and overwrite the identity fields
//! (`queue_url`, `receipt_handle`) before forwarding, so a value supplied by
//! the caller for those fields never reaches the client.

use crate::error::SqsError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Attribute name that asks the service for every queue attribute.
pub const ALL_ATTRIBUTES: &str = "All";

/// Operations of the queue service used by the resource wrappers.
///
/// Implementations perform exactly one service call per method and report
/// failures as [`SqsError`] without retrying.
#[async_trait]
pub trait SqsApi: Send + Sync {
    /// Fetch queue attributes
    async fn get_queue_attributes(
        &self,
        request: GetQueueAttributesRequest,
    ) -> Result<GetQueueAttributesOutput, SqsError>;

    /// Receive up to `max_number_of_messages` messages
    async fn receive_message(
        &self,
        request: ReceiveMessageRequest,
    ) -> Result<ReceiveMessageOutput, SqsError>;

    /// Delete a batch of messages by receipt handle
    async fn delete_message_batch(
        &self,
        request: DeleteMessageBatchRequest,
    ) -> Result<DeleteMessageBatchOutput, SqsError>;

    /// Change the visibility timeout of one received message
    async fn change_message_visibility(
        &self,
        request: ChangeMessageVisibilityRequest,
    ) -> Result<ChangeMessageVisibilityOutput, SqsError>;

    /// Update queue attributes
    async fn set_queue_attributes(
        &self,
        request: SetQueueAttributesRequest,
    ) -> Result<SetQueueAttributesOutput, SqsError>;
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetQueueAttributesRequest {
    pub queue_url: String,
    pub attribute_names: Vec<String>,
}

impl GetQueueAttributesRequest {
    /// Request every attribute of the queue
    pub fn all(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            attribute_names: vec![ALL_ATTRIBUTES.to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveMessageRequest {
    pub queue_url: String,
    pub max_number_of_messages: Option<i32>,
    pub visibility_timeout: Option<i32>,
    pub wait_time_seconds: Option<i32>,
    pub message_attribute_names: Vec<String>,
    pub message_system_attribute_names: Vec<String>,
    pub receive_request_attempt_id: Option<String>,
}

impl ReceiveMessageRequest {
    /// Create empty request
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_number_of_messages(mut self, max: i32) -> Self {
        self.max_number_of_messages = Some(max);
        self
    }

    pub fn with_visibility_timeout(mut self, seconds: i32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }

    pub fn with_wait_time_seconds(mut self, seconds: i32) -> Self {
        self.wait_time_seconds = Some(seconds);
        self
    }

    pub fn with_message_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.message_attribute_names.push(name.into());
        self
    }

    pub fn with_message_system_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.message_system_attribute_names.push(name.into());
        self
    }
}

/// One message to delete in a batch, identified by a caller-chosen id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMessageBatchEntry {
    pub id: String,
    pub receipt_handle: String,
}

impl DeleteMessageBatchEntry {
    pub fn new(id: impl Into<String>, receipt_handle: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            receipt_handle: receipt_handle.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMessageBatchRequest {
    pub queue_url: String,
    pub entries: Vec<DeleteMessageBatchEntry>,
}

impl DeleteMessageBatchRequest {
    pub fn new(entries: Vec<DeleteMessageBatchEntry>) -> Self {
        Self {
            queue_url: String::new(),
            entries,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeMessageVisibilityRequest {
    pub queue_url: String,
    pub receipt_handle: String,
    pub visibility_timeout: i32,
}

impl ChangeMessageVisibilityRequest {
    pub fn new(visibility_timeout: i32) -> Self {
        Self {
            visibility_timeout,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetQueueAttributesRequest {
    pub queue_url: String,
    pub attributes: HashMap<String, String>,
}

impl SetQueueAttributesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

// ============================================================================
// Outputs
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetQueueAttributesOutput {
    pub attributes: HashMap<String, String>,
}

/// Typed value of a user-defined message attribute.
///
/// Binary values serialize as base64 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAttributeValue {
    pub data_type: String,
    pub string_value: Option<String>,
    #[serde(default, with = "optional_bytes_serde")]
    pub binary_value: Option<Bytes>,
}

/// Base64 serialization for optional binary values
mod optional_bytes_serde {
    use base64::{engine::general_purpose, Engine as _};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Option<Bytes>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bytes
            .as_ref()
            .map(|bytes| general_purpose::STANDARD.encode(bytes))
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Bytes>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| {
                general_purpose::STANDARD
                    .decode(encoded)
                    .map(Bytes::from)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}

impl MessageAttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: "String".to_string(),
            string_value: Some(value.into()),
            binary_value: None,
        }
    }

    pub fn number(value: impl ToString) -> Self {
        Self {
            data_type: "Number".to_string(),
            string_value: Some(value.to_string()),
            binary_value: None,
        }
    }

    pub fn binary(value: Bytes) -> Self {
        Self {
            data_type: "Binary".to_string(),
            string_value: None,
            binary_value: Some(value),
        }
    }
}

/// A message record exactly as the receive operation returned it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
    pub md5_of_body: Option<String>,
    pub attributes: HashMap<String, String>,
    pub message_attributes: HashMap<String, MessageAttributeValue>,
    pub md5_of_message_attributes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveMessageOutput {
    pub messages: Vec<RawMessage>,
}

/// Per-entry failure of a batch operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResultError {
    pub id: String,
    pub code: String,
    pub message: Option<String>,
    pub sender_fault: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMessageBatchOutput {
    /// Ids of entries deleted successfully
    pub successful: Vec<String>,
    pub failed: Vec<BatchResultError>,
}

impl DeleteMessageBatchOutput {
    /// True when no entry failed
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeMessageVisibilityOutput {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetQueueAttributesOutput {}
