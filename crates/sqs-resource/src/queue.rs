//! Queue resource bound to one queue URL.
//!
//! A [`Queue`] forwards receive, delete and set-attribute calls to the shared
//! [`SqsApi`] client with its own URL injected, and exposes the queue's
//! attributes through typed accessors.
//!
//! ## Attribute caching
//!
//! The attribute map is fetched on first use with `AttributeNames=All` and kept
//! for the lifetime of the queue handle (and every clone of it). Writes through
//! [`Queue::set_attributes`] do not refresh the cache, so accessors keep
//! returning the values observed at fetch time until
//! [`Queue::invalidate_attributes`] is called.

use crate::attribute::{AttributeValue, QueueAttribute, Timestamp};
use crate::client::{
    DeleteMessageBatchOutput, DeleteMessageBatchRequest, GetQueueAttributesRequest,
    ReceiveMessageRequest, SetQueueAttributesOutput, SetQueueAttributesRequest, SqsApi,
};
use crate::error::{AttributeError, SqsError};
use crate::message::Message;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

/// Attribute map as returned by the service
pub type AttributeMap = HashMap<String, String>;

enum AttributeCache {
    Unfetched,
    Fetched(Arc<AttributeMap>),
}

/// A queue identified by its URL.
///
/// Cloning is cheap; clones share the client and the attribute cache.
#[derive(Clone)]
pub struct Queue {
    url: Arc<str>,
    client: Arc<dyn SqsApi>,
    attributes: Arc<RwLock<AttributeCache>>,
}

impl Queue {
    /// Create a queue handle for `queue_url` using `client` for all calls
    pub fn new(queue_url: impl Into<String>, client: Arc<dyn SqsApi>) -> Self {
        Self {
            url: Arc::from(queue_url.into()),
            client,
            attributes: Arc::new(RwLock::new(AttributeCache::Unfetched)),
        }
    }

    /// Queue URL supplied at construction
    pub fn url(&self) -> &str {
        &self.url
    }

    /// True when the URL names a FIFO queue
    pub fn is_fifo(&self) -> bool {
        self.url.ends_with(".fifo")
    }

    pub(crate) fn client(&self) -> &Arc<dyn SqsApi> {
        &self.client
    }

    /// All queue attributes, fetched once and cached.
    ///
    /// Concurrent first calls are serialized so the service sees a single
    /// `GetQueueAttributes` request.
    pub async fn attributes(&self) -> Result<Arc<AttributeMap>, SqsError> {
        if let AttributeCache::Fetched(map) = &*self.attributes.read().await {
            return Ok(Arc::clone(map));
        }

        let mut cache = self.attributes.write().await;
        if let AttributeCache::Fetched(map) = &*cache {
            return Ok(Arc::clone(map));
        }

        debug!(queue_url = %self.url, "Fetching queue attributes");
        let output = self
            .client
            .get_queue_attributes(GetQueueAttributesRequest::all(self.url()))
            .await?;

        let map = Arc::new(output.attributes);
        *cache = AttributeCache::Fetched(Arc::clone(&map));
        debug!(
            queue_url = %self.url,
            attribute_count = map.len(),
            "Cached queue attributes"
        );
        Ok(map)
    }

    /// Drop the cached attribute map so the next access fetches it again
    pub async fn invalidate_attributes(&self) {
        let mut cache = self.attributes.write().await;
        if matches!(*cache, AttributeCache::Fetched(_)) {
            debug!(queue_url = %self.url, "Invalidated cached queue attributes");
        }
        *cache = AttributeCache::Unfetched;
    }

    /// Typed value of one registered attribute; `None` when the service did
    /// not report it
    pub async fn attribute(
        &self,
        attribute: QueueAttribute,
    ) -> Result<Option<AttributeValue>, AttributeError> {
        let attributes = self.attributes().await?;
        attributes
            .get(&*attribute.service_name())
            .map(|raw| attribute.parse(raw))
            .transpose()
    }

    async fn string_attribute(
        &self,
        attribute: QueueAttribute,
    ) -> Result<Option<String>, AttributeError> {
        Ok(self
            .attribute(attribute)
            .await?
            .and_then(|value| value.as_str().map(str::to_string)))
    }

    async fn integer_attribute(
        &self,
        attribute: QueueAttribute,
    ) -> Result<Option<i64>, AttributeError> {
        Ok(self
            .attribute(attribute)
            .await?
            .and_then(|value| value.as_integer()))
    }

    async fn timestamp_attribute(
        &self,
        attribute: QueueAttribute,
    ) -> Result<Option<Timestamp>, AttributeError> {
        Ok(self
            .attribute(attribute)
            .await?
            .and_then(|value| value.as_timestamp().copied()))
    }

    /// The queue's access policy
    pub async fn policy(&self) -> Result<Option<String>, AttributeError> {
        self.string_attribute(QueueAttribute::Policy).await
    }

    /// Visibility timeout in seconds
    pub async fn visibility_timeout(&self) -> Result<Option<i64>, AttributeError> {
        self.integer_attribute(QueueAttribute::VisibilityTimeout).await
    }

    /// Largest accepted message body in bytes
    pub async fn maximum_message_size(&self) -> Result<Option<i64>, AttributeError> {
        self.integer_attribute(QueueAttribute::MaximumMessageSize).await
    }

    /// Seconds a message is retained
    pub async fn message_retention_period(&self) -> Result<Option<i64>, AttributeError> {
        self.integer_attribute(QueueAttribute::MessageRetentionPeriod).await
    }

    pub async fn approximate_number_of_messages(&self) -> Result<Option<i64>, AttributeError> {
        self.integer_attribute(QueueAttribute::ApproximateNumberOfMessages).await
    }

    /// Messages received but neither deleted nor timed out
    pub async fn approximate_number_of_messages_not_visible(
        &self,
    ) -> Result<Option<i64>, AttributeError> {
        self.integer_attribute(QueueAttribute::ApproximateNumberOfMessagesNotVisible).await
    }

    pub async fn created_timestamp(&self) -> Result<Option<Timestamp>, AttributeError> {
        self.timestamp_attribute(QueueAttribute::CreatedTimestamp).await
    }

    pub async fn last_modified_timestamp(&self) -> Result<Option<Timestamp>, AttributeError> {
        self.timestamp_attribute(QueueAttribute::LastModifiedTimestamp).await
    }

    /// The queue's ARN, read from the `QueueArn` attribute
    pub async fn arn(&self) -> Result<Option<String>, AttributeError> {
        self.string_attribute(QueueAttribute::Arn).await
    }

    /// Same as [`Queue::arn`]
    pub async fn queue_arn(&self) -> Result<Option<String>, AttributeError> {
        self.arn().await
    }

    /// Messages waiting for their delivery delay to pass
    pub async fn approximate_number_of_messages_delayed(
        &self,
    ) -> Result<Option<i64>, AttributeError> {
        self.integer_attribute(QueueAttribute::ApproximateNumberOfMessagesDelayed).await
    }

    /// Default delivery delay in seconds
    pub async fn delay_seconds(&self) -> Result<Option<i64>, AttributeError> {
        self.integer_attribute(QueueAttribute::DelaySeconds).await
    }

    /// Default long-poll wait for receive calls
    pub async fn receive_message_wait_time_seconds(&self) -> Result<Option<i64>, AttributeError> {
        self.integer_attribute(QueueAttribute::ReceiveMessageWaitTimeSeconds).await
    }

    /// Dead letter queue configuration as a JSON document
    pub async fn redrive_policy(&self) -> Result<Option<String>, AttributeError> {
        self.string_attribute(QueueAttribute::RedrivePolicy).await
    }

    /// Delete a batch of messages. The request's `queue_url` is replaced by
    /// this queue's URL.
    pub async fn delete_messages(
        &self,
        mut request: DeleteMessageBatchRequest,
    ) -> Result<DeleteMessageBatchOutput, SqsError> {
        request.queue_url = self.url.to_string();
        debug!(
            queue_url = %self.url,
            entries = request.entries.len(),
            "Deleting message batch"
        );
        self.client.delete_message_batch(request).await
    }

    /// Receive messages, wrapping each returned record in a [`Message`] bound
    /// to this queue. The request's `queue_url` is replaced by this queue's
    /// URL.
    pub async fn receive_messages(
        &self,
        mut request: ReceiveMessageRequest,
    ) -> Result<Vec<Message>, SqsError> {
        request.queue_url = self.url.to_string();
        let output = self.client.receive_message(request).await?;
        debug!(
            queue_url = %self.url,
            count = output.messages.len(),
            "Received messages"
        );

        Ok(output
            .messages
            .into_iter()
            .map(|raw| Message::new(raw, self.clone()))
            .collect())
    }

    /// Update queue attributes. The request's `queue_url` is replaced by this
    /// queue's URL; the local attribute cache is left untouched.
    pub async fn set_attributes(
        &self,
        mut request: SetQueueAttributesRequest,
    ) -> Result<SetQueueAttributesOutput, SqsError> {
        request.queue_url = self.url.to_string();
        debug!(
            queue_url = %self.url,
            attributes = ?request.attributes.keys().collect::<Vec<_>>(),
            "Setting queue attributes"
        );
        self.client.set_queue_attributes(request).await
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue").field("url", &self.url).finish()
    }
}

impl PartialEq for Queue {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}
