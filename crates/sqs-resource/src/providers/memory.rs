//! In-memory SQS client for testing and development.
//!
//! This module provides a functional in-memory queue service that:
//! - Creates queues with the service's default attributes
//! - Hides received messages for their visibility timeout
//! - Reports approximate message counts and timestamps as attributes
//! - Fails individual batch-delete entries with invalid receipt handles
//! - Computes body and message-attribute MD5 digests the way SQS does
//!
//! Long polling is not emulated: `wait_time_seconds` is range-checked and
//! otherwise ignored. Attribute values are range-checked when a queue is
//! created or updated.

use crate::attribute::Timestamp;
use crate::client::{
    BatchResultError, ChangeMessageVisibilityOutput, ChangeMessageVisibilityRequest,
    DeleteMessageBatchOutput, DeleteMessageBatchRequest, GetQueueAttributesOutput,
    GetQueueAttributesRequest, MessageAttributeValue, RawMessage, ReceiveMessageOutput,
    ReceiveMessageRequest, SetQueueAttributesOutput, SetQueueAttributesRequest, SqsApi,
    ALL_ATTRIBUTES,
};
use crate::error::SqsError;
use async_trait::async_trait;
use chrono::Duration;
use md5::{Digest, Md5};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// Account id used in generated queue URLs and ARNs
pub const DEFAULT_ACCOUNT_ID: &str = "000000000000";

/// Region used in generated queue URLs and ARNs
pub const DEFAULT_REGION: &str = "us-east-1";

const MAX_BATCH_ENTRIES: usize = 10;
const MAX_RECEIVE_MESSAGES: i32 = 10;
const MAX_VISIBILITY_TIMEOUT: i32 = 43_200;
const MAX_WAIT_TIME_SECONDS: i32 = 20;

/// Attributes a caller may change through `SetQueueAttributes`, with the
/// accepted range for integer values
const SETTABLE_ATTRIBUTES: &[(&str, Option<(i64, i64)>)] = &[
    ("DelaySeconds", Some((0, 900))),
    ("MaximumMessageSize", Some((1_024, 262_144))),
    ("MessageRetentionPeriod", Some((60, 1_209_600))),
    ("Policy", None),
    ("ReceiveMessageWaitTimeSeconds", Some((0, 20))),
    ("RedrivePolicy", None),
    ("VisibilityTimeout", Some((0, 43_200))),
];

// ============================================================================
// Internal Storage Structures
// ============================================================================

#[derive(Default)]
struct ServiceState {
    queues: HashMap<String, InMemoryQueue>,
}

impl ServiceState {
    fn queue_mut(&mut self, queue_url: &str) -> Result<&mut InMemoryQueue, SqsError> {
        self.queues
            .get_mut(queue_url)
            .ok_or_else(|| SqsError::QueueNotFound {
                queue_url: queue_url.to_string(),
            })
    }
}

struct InMemoryQueue {
    attributes: HashMap<String, String>,
    messages: Vec<StoredMessage>,
    created_at: Timestamp,
    last_modified_at: Timestamp,
}

impl InMemoryQueue {
    fn new(arn: String, overrides: HashMap<String, String>) -> Self {
        let mut attributes: HashMap<String, String> = [
            ("VisibilityTimeout", "30"),
            ("MaximumMessageSize", "262144"),
            ("MessageRetentionPeriod", "345600"),
            ("DelaySeconds", "0"),
            ("ReceiveMessageWaitTimeSeconds", "0"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
        attributes.insert("QueueArn".to_string(), arn);
        attributes.extend(overrides);

        let now = Timestamp::now();
        Self {
            attributes,
            messages: Vec::new(),
            created_at: now,
            last_modified_at: now,
        }
    }

    fn integer_attribute(&self, name: &str) -> i64 {
        self.attributes
            .get(name)
            .and_then(|value| value.parse().ok())
            .unwrap_or(0)
    }

    /// Current attribute map including computed counters and timestamps
    fn snapshot(&self, now: Timestamp) -> HashMap<String, String> {
        let mut visible = 0;
        let mut in_flight = 0;
        let mut delayed = 0;
        for message in &self.messages {
            match message.state(now) {
                MessageState::Visible => visible += 1,
                MessageState::InFlight => in_flight += 1,
                MessageState::Delayed => delayed += 1,
            }
        }

        let mut attributes = self.attributes.clone();
        attributes.insert(
            "ApproximateNumberOfMessages".to_string(),
            visible.to_string(),
        );
        attributes.insert(
            "ApproximateNumberOfMessagesNotVisible".to_string(),
            in_flight.to_string(),
        );
        attributes.insert(
            "ApproximateNumberOfMessagesDelayed".to_string(),
            delayed.to_string(),
        );
        attributes.insert(
            "CreatedTimestamp".to_string(),
            self.created_at.epoch_seconds().to_string(),
        );
        attributes.insert(
            "LastModifiedTimestamp".to_string(),
            self.last_modified_at.epoch_seconds().to_string(),
        );
        attributes
    }

    fn find_by_receipt(&self, receipt_handle: &str) -> Option<usize> {
        self.messages
            .iter()
            .position(|message| message.receipt_handle.as_deref() == Some(receipt_handle))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum MessageState {
    Visible,
    InFlight,
    Delayed,
}

struct StoredMessage {
    message_id: String,
    body: String,
    md5_of_body: String,
    message_attributes: HashMap<String, MessageAttributeValue>,
    sent_at: Timestamp,
    visible_at: Timestamp,
    receipt_handle: Option<String>,
    receive_count: u32,
    first_received_at: Option<Timestamp>,
}

impl StoredMessage {
    fn state(&self, now: Timestamp) -> MessageState {
        if self.visible_at <= now {
            MessageState::Visible
        } else if self.receive_count == 0 {
            MessageState::Delayed
        } else {
            MessageState::InFlight
        }
    }

    fn system_attributes(&self) -> HashMap<String, String> {
        let mut attributes = HashMap::new();
        attributes.insert(
            "ApproximateReceiveCount".to_string(),
            self.receive_count.to_string(),
        );
        attributes.insert(
            "SentTimestamp".to_string(),
            self.sent_at.as_datetime().timestamp_millis().to_string(),
        );
        if let Some(first) = self.first_received_at {
            attributes.insert(
                "ApproximateFirstReceiveTimestamp".to_string(),
                first.as_datetime().timestamp_millis().to_string(),
            );
        }
        attributes.insert("SenderId".to_string(), DEFAULT_ACCOUNT_ID.to_string());
        attributes
    }

    fn to_raw(&self, request: &ReceiveMessageRequest) -> RawMessage {
        let system_attributes = filter_by_names(
            self.system_attributes(),
            &request.message_system_attribute_names,
        );
        let message_attributes = filter_by_names(
            self.message_attributes.clone(),
            &request.message_attribute_names,
        );
        let attributes_digest = md5_of_message_attributes(&message_attributes);

        RawMessage {
            message_id: Some(self.message_id.clone()),
            receipt_handle: self.receipt_handle.clone(),
            body: Some(self.body.clone()),
            md5_of_body: Some(self.md5_of_body.clone()),
            attributes: system_attributes,
            message_attributes,
            md5_of_message_attributes: attributes_digest,
        }
    }
}

/// Keep entries named in `names`; `All` or `.*` keeps everything
fn filter_by_names<V>(map: HashMap<String, V>, names: &[String]) -> HashMap<String, V> {
    if names
        .iter()
        .any(|name| name == ALL_ATTRIBUTES || name == ".*")
    {
        return map;
    }

    map.into_iter()
        .filter(|(key, _)| {
            names.iter().any(|name| match name.strip_suffix(".*") {
                Some(prefix) => key.starts_with(prefix),
                None => name == key,
            })
        })
        .collect()
}

fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// MD5 digest of message attributes in the service's canonical encoding:
/// attributes sorted by name, each as length-prefixed name, length-prefixed
/// data type, a transport byte (1 string, 2 binary) and the length-prefixed
/// value.
pub fn md5_of_message_attributes(
    attributes: &HashMap<String, MessageAttributeValue>,
) -> Option<String> {
    if attributes.is_empty() {
        return None;
    }

    let mut names: Vec<&String> = attributes.keys().collect();
    names.sort();

    fn push_field(buf: &mut Vec<u8>, bytes: &[u8]) {
        buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        buf.extend_from_slice(bytes);
    }

    let mut buf: Vec<u8> = Vec::new();
    for name in names {
        let value = &attributes[name];
        push_field(&mut buf, name.as_bytes());
        push_field(&mut buf, value.data_type.as_bytes());

        if value.data_type.starts_with("Binary") {
            buf.push(2);
            if let Some(binary) = &value.binary_value {
                push_field(&mut buf, binary);
            }
        } else {
            buf.push(1);
            if let Some(string) = &value.string_value {
                push_field(&mut buf, string.as_bytes());
            }
        }
    }

    Some(md5_hex(&buf))
}

/// Check names and values against the settable attribute table
fn validate_attributes(
    operation: &str,
    attributes: &HashMap<String, String>,
) -> Result<(), SqsError> {
    for (name, value) in attributes {
        let range = SETTABLE_ATTRIBUTES
            .iter()
            .find(|(settable, _)| settable == name)
            .map(|(_, range)| *range)
            .ok_or_else(|| SqsError::Service {
                operation: operation.to_string(),
                code: "InvalidAttributeName".to_string(),
                message: format!("Unknown Attribute {}.", name),
            })?;

        if let Some((min, max)) = range {
            let in_range = value
                .parse::<i64>()
                .is_ok_and(|parsed| (min..=max).contains(&parsed));
            if !in_range {
                return Err(SqsError::Service {
                    operation: operation.to_string(),
                    code: "InvalidAttributeValue".to_string(),
                    message: format!(
                        "Invalid value for the parameter {}: must be between {} and {}.",
                        name, min, max
                    ),
                });
            }
        }
    }
    Ok(())
}

fn invalid_parameter(operation: &str, message: String) -> SqsError {
    SqsError::Service {
        operation: operation.to_string(),
        code: "InvalidParameterValue".to_string(),
        message,
    }
}

// ============================================================================
// InMemorySqsClient
// ============================================================================

/// In-memory implementation of [`SqsApi`]
#[derive(Clone)]
pub struct InMemorySqsClient {
    state: Arc<Mutex<ServiceState>>,
    base_url: String,
}

impl InMemorySqsClient {
    /// Create a client whose queue URLs look like
    /// `https://sqs.us-east-1.amazonaws.com/000000000000/<name>`
    pub fn new() -> Self {
        Self::with_base_url(format!(
            "https://sqs.{}.amazonaws.com/{}",
            DEFAULT_REGION, DEFAULT_ACCOUNT_ID
        ))
    }

    /// Create a client generating queue URLs under `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServiceState::default())),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a queue with default attributes and return its URL.
    ///
    /// Creating an existing queue returns the existing URL unchanged.
    pub async fn create_queue(&self, name: &str) -> String {
        self.insert_queue(name, HashMap::new()).await
    }

    /// Create a queue, overriding default attributes with `attributes`.
    ///
    /// Overrides follow the same name and range rules as
    /// `SetQueueAttributes`.
    pub async fn create_queue_with_attributes(
        &self,
        name: &str,
        attributes: HashMap<String, String>,
    ) -> Result<String, SqsError> {
        validate_attributes("CreateQueue", &attributes)?;
        Ok(self.insert_queue(name, attributes).await)
    }

    async fn insert_queue(&self, name: &str, attributes: HashMap<String, String>) -> String {
        let url = format!("{}/{}", self.base_url, name);
        let arn = format!("arn:aws:sqs:{}:{}:{}", DEFAULT_REGION, DEFAULT_ACCOUNT_ID, name);

        let mut state = self.state.lock().await;
        state
            .queues
            .entry(url.clone())
            .or_insert_with(|| InMemoryQueue::new(arn, attributes));
        debug!(queue_url = %url, "Created in-memory queue");
        url
    }

    /// Enqueue a message and return its id
    pub async fn send_message(&self, queue_url: &str, body: &str) -> Result<String, SqsError> {
        self.send_message_with_attributes(queue_url, body, HashMap::new()).await
    }

    /// Enqueue a message carrying user-defined attributes
    pub async fn send_message_with_attributes(
        &self,
        queue_url: &str,
        body: &str,
        message_attributes: HashMap<String, MessageAttributeValue>,
    ) -> Result<String, SqsError> {
        let mut state = self.state.lock().await;
        let queue = state.queue_mut(queue_url)?;

        let max_size = queue.integer_attribute("MaximumMessageSize");
        if body.len() as i64 > max_size {
            return Err(invalid_parameter(
                "SendMessage",
                format!(
                    "Message must be shorter than {} bytes, got {}",
                    max_size,
                    body.len()
                ),
            ));
        }

        let now = Timestamp::now();
        let delay = queue.integer_attribute("DelaySeconds");
        let message_id = uuid::Uuid::new_v4().to_string();
        queue.messages.push(StoredMessage {
            message_id: message_id.clone(),
            body: body.to_string(),
            md5_of_body: md5_hex(body.as_bytes()),
            message_attributes,
            sent_at: now,
            visible_at: Timestamp::from_datetime(now.as_datetime() + Duration::seconds(delay)),
            receipt_handle: None,
            receive_count: 0,
            first_received_at: None,
        });

        Ok(message_id)
    }
}

impl Default for InMemorySqsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SqsApi for InMemorySqsClient {
    async fn get_queue_attributes(
        &self,
        request: GetQueueAttributesRequest,
    ) -> Result<GetQueueAttributesOutput, SqsError> {
        let mut state = self.state.lock().await;
        let queue = state.queue_mut(&request.queue_url)?;
        let snapshot = queue.snapshot(Timestamp::now());

        Ok(GetQueueAttributesOutput {
            attributes: filter_by_names(snapshot, &request.attribute_names),
        })
    }

    async fn receive_message(
        &self,
        request: ReceiveMessageRequest,
    ) -> Result<ReceiveMessageOutput, SqsError> {
        let max = request.max_number_of_messages.unwrap_or(1);
        if !(1..=MAX_RECEIVE_MESSAGES).contains(&max) {
            return Err(invalid_parameter(
                "ReceiveMessage",
                format!(
                    "MaxNumberOfMessages must be between 1 and {}, got {}",
                    MAX_RECEIVE_MESSAGES, max
                ),
            ));
        }
        if let Some(timeout) = request.visibility_timeout {
            if !(0..=MAX_VISIBILITY_TIMEOUT).contains(&timeout) {
                return Err(invalid_parameter(
                    "ReceiveMessage",
                    format!(
                        "VisibilityTimeout must be between 0 and {}, got {}",
                        MAX_VISIBILITY_TIMEOUT, timeout
                    ),
                ));
            }
        }
        if let Some(wait) = request.wait_time_seconds {
            if !(0..=MAX_WAIT_TIME_SECONDS).contains(&wait) {
                return Err(invalid_parameter(
                    "ReceiveMessage",
                    format!(
                        "WaitTimeSeconds must be between 0 and {}, got {}",
                        MAX_WAIT_TIME_SECONDS, wait
                    ),
                ));
            }
        }

        let mut state = self.state.lock().await;
        let queue = state.queue_mut(&request.queue_url)?;
        let visibility_timeout = request
            .visibility_timeout
            .map(i64::from)
            .unwrap_or_else(|| queue.integer_attribute("VisibilityTimeout"));

        let now = Timestamp::now();
        let hidden_until =
            Timestamp::from_datetime(now.as_datetime() + Duration::seconds(visibility_timeout));

        let mut messages = Vec::new();
        for stored in queue
            .messages
            .iter_mut()
            .filter(|message| message.state(now) == MessageState::Visible)
            .take(max as usize)
        {
            stored.receive_count += 1;
            stored.first_received_at.get_or_insert(now);
            stored.receipt_handle = Some(uuid::Uuid::new_v4().to_string());
            stored.visible_at = hidden_until;
            messages.push(stored.to_raw(&request));
        }

        Ok(ReceiveMessageOutput { messages })
    }

    async fn delete_message_batch(
        &self,
        request: DeleteMessageBatchRequest,
    ) -> Result<DeleteMessageBatchOutput, SqsError> {
        let batch_error = |code: &str, message: &str| SqsError::Service {
            operation: "DeleteMessageBatch".to_string(),
            code: code.to_string(),
            message: message.to_string(),
        };

        if request.entries.is_empty() {
            return Err(batch_error(
                "AWS.SimpleQueueService.EmptyBatchRequest",
                "There should be at least one DeleteMessageBatchRequestEntry in the request",
            ));
        }
        if request.entries.len() > MAX_BATCH_ENTRIES {
            return Err(batch_error(
                "AWS.SimpleQueueService.TooManyEntriesInBatchRequest",
                "Maximum number of entries per request are 10",
            ));
        }
        let mut ids = HashSet::new();
        if !request.entries.iter().all(|entry| ids.insert(&entry.id)) {
            return Err(batch_error(
                "AWS.SimpleQueueService.BatchEntryIdsNotDistinct",
                "Id values must be unique within a batch request",
            ));
        }

        let mut state = self.state.lock().await;
        let queue = state.queue_mut(&request.queue_url)?;

        let mut output = DeleteMessageBatchOutput::default();
        for entry in request.entries {
            match queue.find_by_receipt(&entry.receipt_handle) {
                Some(index) => {
                    queue.messages.remove(index);
                    output.successful.push(entry.id);
                }
                None => output.failed.push(BatchResultError {
                    id: entry.id,
                    code: "ReceiptHandleIsInvalid".to_string(),
                    message: Some(format!(
                        "The input receipt handle \"{}\" is not a valid receipt handle.",
                        entry.receipt_handle
                    )),
                    sender_fault: true,
                }),
            }
        }

        Ok(output)
    }

    async fn change_message_visibility(
        &self,
        request: ChangeMessageVisibilityRequest,
    ) -> Result<ChangeMessageVisibilityOutput, SqsError> {
        if !(0..=MAX_VISIBILITY_TIMEOUT).contains(&request.visibility_timeout) {
            return Err(invalid_parameter(
                "ChangeMessageVisibility",
                format!(
                    "VisibilityTimeout must be between 0 and {}, got {}",
                    MAX_VISIBILITY_TIMEOUT, request.visibility_timeout
                ),
            ));
        }

        let mut state = self.state.lock().await;
        let queue = state.queue_mut(&request.queue_url)?;
        let index = queue
            .find_by_receipt(&request.receipt_handle)
            .ok_or_else(|| SqsError::ReceiptHandleInvalid {
                receipt_handle: request.receipt_handle.clone(),
            })?;

        let now = Timestamp::now();
        let message = &mut queue.messages[index];
        if message.state(now) != MessageState::InFlight {
            return Err(SqsError::Service {
                operation: "ChangeMessageVisibility".to_string(),
                code: "AWS.SimpleQueueService.MessageNotInflight".to_string(),
                message: "Message is not in flight".to_string(),
            });
        }

        message.visible_at = Timestamp::from_datetime(
            now.as_datetime() + Duration::seconds(i64::from(request.visibility_timeout)),
        );
        Ok(ChangeMessageVisibilityOutput::default())
    }

    async fn set_queue_attributes(
        &self,
        request: SetQueueAttributesRequest,
    ) -> Result<SetQueueAttributesOutput, SqsError> {
        validate_attributes("SetQueueAttributes", &request.attributes)?;

        let mut state = self.state.lock().await;
        let queue = state.queue_mut(&request.queue_url)?;
        queue.attributes.extend(request.attributes);
        queue.last_modified_at = Timestamp::now();
        Ok(SetQueueAttributesOutput::default())
    }
}
