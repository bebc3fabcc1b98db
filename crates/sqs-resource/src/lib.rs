//! # SQS Resource
//!
//! Resource-style wrappers over the Amazon SQS client API.
//!
//! This library provides:
//! - [`Queue`], a handle bound to one queue URL with typed, lazily cached
//!   attribute accessors
//! - [`Message`], a received message that remembers its queue and receipt
//!   handle for follow-up calls
//! - The [`SqsApi`] client trait with an AWS SDK backed implementation and an
//!   in-memory one
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for service calls, attributes and configuration
//! - [`client`] - Client trait plus request and response types
//! - [`attribute`] - Queue attribute registry and value parsing
//! - [`queue`] - Queue resource
//! - [`message`] - Message resource
//! - [`config`] - Client configuration loading
//! - [`providers`] - Client implementations
//!
//! ## Example
//!
//! ```no_run
//! use sqs_resource::{ChangeMessageVisibilityRequest, InMemorySqsClient, Queue, ReceiveMessageRequest};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = InMemorySqsClient::new();
//! let url = client.create_queue("jobs").await;
//! client.send_message(&url, "hello").await?;
//!
//! let queue = Queue::new(url, Arc::new(client));
//! println!("visibility timeout: {:?}", queue.visibility_timeout().await?);
//!
//! for message in queue.receive_messages(ReceiveMessageRequest::new()).await? {
//!     message
//!         .change_visibility(ChangeMessageVisibilityRequest::new(60))
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod providers;
pub mod queue;

pub use attribute::{AttributeKind, AttributeValue, QueueAttribute, Timestamp};
pub use client::{
    BatchResultError, ChangeMessageVisibilityOutput, ChangeMessageVisibilityRequest,
    DeleteMessageBatchEntry, DeleteMessageBatchOutput, DeleteMessageBatchRequest,
    GetQueueAttributesOutput, GetQueueAttributesRequest, MessageAttributeValue, RawMessage,
    ReceiveMessageOutput, ReceiveMessageRequest, SetQueueAttributesOutput,
    SetQueueAttributesRequest, SqsApi, ALL_ATTRIBUTES,
};
pub use config::SqsClientConfig;
pub use error::{AttributeError, ConfigurationError, SerializationError, SqsError};
pub use message::Message;
pub use providers::{AwsSqsClient, InMemorySqsClient};
pub use queue::{AttributeMap, Queue};
