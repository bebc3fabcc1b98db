//! Message resource wrapping one received message record.

use crate::client::{
    ChangeMessageVisibilityOutput, ChangeMessageVisibilityRequest, DeleteMessageBatchEntry,
    MessageAttributeValue, RawMessage,
};
use crate::error::{SerializationError, SqsError};
use crate::queue::Queue;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::debug;

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

/// A message received from a [`Queue`].
///
/// Fields are a snapshot taken at receive time. Operations forwarded to the
/// service do not update them.
#[derive(Debug, Clone)]
pub struct Message {
    attrs: RawMessage,
    queue: Queue,
}

impl Message {
    pub(crate) fn new(attrs: RawMessage, queue: Queue) -> Self {
        Self { attrs, queue }
    }

    /// Queue this message was received from
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn message_id(&self) -> Option<&str> {
        self.attrs.message_id.as_deref()
    }

    /// Token authorizing follow-up operations on this delivery
    pub fn receipt_handle(&self) -> Option<&str> {
        self.attrs.receipt_handle.as_deref()
    }

    pub fn md5_of_body(&self) -> Option<&str> {
        self.attrs.md5_of_body.as_deref()
    }

    pub fn body(&self) -> Option<&str> {
        self.attrs.body.as_deref()
    }

    /// System attributes such as `ApproximateReceiveCount` or `SentTimestamp`
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attrs.attributes
    }

    /// User-defined message attributes
    pub fn message_attributes(&self) -> &HashMap<String, MessageAttributeValue> {
        &self.attrs.message_attributes
    }

    pub fn md5_of_message_attributes(&self) -> Option<&str> {
        self.attrs.md5_of_message_attributes.as_deref()
    }

    /// Decode the body as JSON
    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, SerializationError> {
        let body = self.body().ok_or(SerializationError::MissingBody)?;
        Ok(serde_json::from_str(body)?)
    }

    /// Batch-delete entry for this message under the caller-chosen `id`
    pub fn delete_entry(&self, id: impl Into<String>) -> DeleteMessageBatchEntry {
        DeleteMessageBatchEntry::new(id, self.receipt_handle().unwrap_or_default())
    }

    /// Change this message's visibility timeout.
    ///
    /// The request's `queue_url` and `receipt_handle` are replaced by the
    /// owning queue's URL and this message's receipt handle.
    pub async fn change_visibility(
        &self,
        mut request: ChangeMessageVisibilityRequest,
    ) -> Result<ChangeMessageVisibilityOutput, SqsError> {
        request.queue_url = self.queue.url().to_string();
        request.receipt_handle = self.receipt_handle().unwrap_or_default().to_string();
        debug!(
            queue_url = %request.queue_url,
            message_id = ?self.message_id(),
            visibility_timeout = request.visibility_timeout,
            "Changing message visibility"
        );
        self.queue.client().change_message_visibility(request).await
    }
}
