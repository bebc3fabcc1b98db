//! AWS SQS client backed by the official SDK.
//!
//! [`AwsSqsClient`] translates the crate's request types into `aws-sdk-sqs`
//! fluent builders and maps SDK outputs and errors back. It issues exactly one
//! SDK call per operation; retry behavior is whatever the SDK configuration
//! carries.
//!
//! ## Example
//!
//! ```no_run
//! use sqs_resource::{AwsSqsClient, Queue, ReceiveMessageRequest, SqsClientConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SqsClientConfig::default().with_region("us-east-1");
//! let client = AwsSqsClient::from_config(&config).await?;
//!
//! let queue = Queue::new(
//!     "https://sqs.us-east-1.amazonaws.com/123456789012/jobs",
//!     Arc::new(client),
//! );
//! for message in queue.receive_messages(ReceiveMessageRequest::new()).await? {
//!     println!("{:?}", message.body());
//! }
//! # Ok(())
//! # }
//! ```

use crate::client::{
    BatchResultError, ChangeMessageVisibilityOutput, ChangeMessageVisibilityRequest,
    DeleteMessageBatchOutput, DeleteMessageBatchRequest, GetQueueAttributesOutput,
    GetQueueAttributesRequest, MessageAttributeValue, RawMessage, ReceiveMessageOutput,
    ReceiveMessageRequest, SetQueueAttributesOutput, SetQueueAttributesRequest, SqsApi,
};
use crate::config::SqsClientConfig;
use crate::error::{ConfigurationError, SqsError};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::types::{
    DeleteMessageBatchRequestEntry, MessageSystemAttributeName, QueueAttributeName,
};
use bytes::Bytes;
use std::collections::HashMap;
use tracing::debug;

#[cfg(test)]
#[path = "aws_tests.rs"]
mod tests;

// ============================================================================
// Error Mapping
// ============================================================================

/// Map a service error code onto [`SqsError`]
fn classify_service_error(
    operation: &str,
    queue_url: &str,
    receipt_handle: Option<&str>,
    code: Option<&str>,
    message: Option<&str>,
) -> SqsError {
    let code = code.unwrap_or("Unknown");
    match code {
        "AWS.SimpleQueueService.NonExistentQueue" | "QueueDoesNotExist" => {
            SqsError::QueueNotFound {
                queue_url: queue_url.to_string(),
            }
        }
        "ReceiptHandleIsInvalid" | "InvalidReceiptHandle" if receipt_handle.is_some() => {
            SqsError::ReceiptHandleInvalid {
                receipt_handle: receipt_handle.unwrap_or_default().to_string(),
            }
        }
        _ => SqsError::Service {
            operation: operation.to_string(),
            code: code.to_string(),
            message: message.unwrap_or("Unknown error").to_string(),
        },
    }
}

/// Map an SDK failure onto [`SqsError`]
fn map_sdk_error<E>(
    operation: &str,
    queue_url: &str,
    receipt_handle: Option<&str>,
    err: SdkError<E>,
) -> SqsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let detail = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::ServiceError(context) => {
            let service_err = context.err();
            classify_service_error(
                operation,
                queue_url,
                receipt_handle,
                service_err.code(),
                service_err.message(),
            )
        }
        SdkError::TimeoutError(_) => SqsError::Timeout {
            operation: operation.to_string(),
        },
        SdkError::DispatchFailure(_) => SqsError::Network {
            operation: operation.to_string(),
            message: detail,
        },
        SdkError::ResponseError(_) => SqsError::Response {
            operation: operation.to_string(),
            message: detail,
        },
        SdkError::ConstructionFailure(_) => SqsError::Construction {
            operation: operation.to_string(),
            message: detail,
        },
        _ => SqsError::Service {
            operation: operation.to_string(),
            code: "Unknown".to_string(),
            message: detail,
        },
    }
}

// ============================================================================
// Type Conversion
// ============================================================================

fn message_attribute_from_sdk(
    value: &aws_sdk_sqs::types::MessageAttributeValue,
) -> MessageAttributeValue {
    MessageAttributeValue {
        data_type: value.data_type().to_string(),
        string_value: value.string_value().map(str::to_string),
        binary_value: value
            .binary_value()
            .map(|blob| Bytes::copy_from_slice(blob.as_ref())),
    }
}

fn raw_message_from_sdk(message: &aws_sdk_sqs::types::Message) -> RawMessage {
    RawMessage {
        message_id: message.message_id().map(str::to_string),
        receipt_handle: message.receipt_handle().map(str::to_string),
        body: message.body().map(str::to_string),
        md5_of_body: message.md5_of_body().map(str::to_string),
        attributes: message
            .attributes()
            .into_iter()
            .flatten()
            .map(|(name, value)| (name.as_str().to_string(), value.clone()))
            .collect(),
        message_attributes: message
            .message_attributes()
            .into_iter()
            .flatten()
            .map(|(name, value)| (name.clone(), message_attribute_from_sdk(value)))
            .collect(),
        md5_of_message_attributes: message.md5_of_message_attributes().map(str::to_string),
    }
}

fn queue_attribute_names(names: &[String]) -> Option<Vec<QueueAttributeName>> {
    if names.is_empty() {
        return None;
    }
    Some(
        names
            .iter()
            .map(|name| QueueAttributeName::from(name.as_str()))
            .collect(),
    )
}

fn system_attribute_names(names: &[String]) -> Option<Vec<MessageSystemAttributeName>> {
    if names.is_empty() {
        return None;
    }
    Some(
        names
            .iter()
            .map(|name| MessageSystemAttributeName::from(name.as_str()))
            .collect(),
    )
}

// ============================================================================
// AwsSqsClient
// ============================================================================

/// [`SqsApi`] implementation over `aws_sdk_sqs::Client`
#[derive(Debug, Clone)]
pub struct AwsSqsClient {
    client: aws_sdk_sqs::Client,
}

impl AwsSqsClient {
    /// Wrap an existing SDK client
    pub fn new(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }

    /// Build an SDK client from configuration, falling back to the AWS
    /// default provider chain for anything not set
    pub async fn from_config(config: &SqsClientConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let sdk_config = loader.load().await;
        debug!(
            region = ?sdk_config.region().map(|region| region.to_string()),
            endpoint_url = ?config.endpoint_url,
            "Created SQS client"
        );
        Ok(Self::new(aws_sdk_sqs::Client::new(&sdk_config)))
    }

    /// Underlying SDK client
    pub fn sdk_client(&self) -> &aws_sdk_sqs::Client {
        &self.client
    }
}

#[async_trait]
impl SqsApi for AwsSqsClient {
    async fn get_queue_attributes(
        &self,
        request: GetQueueAttributesRequest,
    ) -> Result<GetQueueAttributesOutput, SqsError> {
        let output = self
            .client
            .get_queue_attributes()
            .queue_url(&request.queue_url)
            .set_attribute_names(queue_attribute_names(&request.attribute_names))
            .send()
            .await
            .map_err(|e| map_sdk_error("GetQueueAttributes", &request.queue_url, None, e))?;

        Ok(GetQueueAttributesOutput {
            attributes: output
                .attributes()
                .into_iter()
                .flatten()
                .map(|(name, value)| (name.as_str().to_string(), value.clone()))
                .collect(),
        })
    }

    async fn receive_message(
        &self,
        request: ReceiveMessageRequest,
    ) -> Result<ReceiveMessageOutput, SqsError> {
        let message_attribute_names = if request.message_attribute_names.is_empty() {
            None
        } else {
            Some(request.message_attribute_names.clone())
        };

        let output = self
            .client
            .receive_message()
            .queue_url(&request.queue_url)
            .set_max_number_of_messages(request.max_number_of_messages)
            .set_visibility_timeout(request.visibility_timeout)
            .set_wait_time_seconds(request.wait_time_seconds)
            .set_message_attribute_names(message_attribute_names)
            .set_message_system_attribute_names(system_attribute_names(
                &request.message_system_attribute_names,
            ))
            .set_receive_request_attempt_id(request.receive_request_attempt_id.clone())
            .send()
            .await
            .map_err(|e| map_sdk_error("ReceiveMessage", &request.queue_url, None, e))?;

        Ok(ReceiveMessageOutput {
            messages: output.messages().iter().map(raw_message_from_sdk).collect(),
        })
    }

    async fn delete_message_batch(
        &self,
        request: DeleteMessageBatchRequest,
    ) -> Result<DeleteMessageBatchOutput, SqsError> {
        let entries = request
            .entries
            .iter()
            .map(|entry| {
                DeleteMessageBatchRequestEntry::builder()
                    .id(&entry.id)
                    .receipt_handle(&entry.receipt_handle)
                    .build()
                    .map_err(|e| SqsError::Construction {
                        operation: "DeleteMessageBatch".to_string(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .delete_message_batch()
            .queue_url(&request.queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(|e| map_sdk_error("DeleteMessageBatch", &request.queue_url, None, e))?;

        Ok(DeleteMessageBatchOutput {
            successful: output
                .successful()
                .iter()
                .map(|entry| entry.id().to_string())
                .collect(),
            failed: output
                .failed()
                .iter()
                .map(|entry| BatchResultError {
                    id: entry.id().to_string(),
                    code: entry.code().to_string(),
                    message: entry.message().map(str::to_string),
                    sender_fault: entry.sender_fault(),
                })
                .collect(),
        })
    }

    async fn change_message_visibility(
        &self,
        request: ChangeMessageVisibilityRequest,
    ) -> Result<ChangeMessageVisibilityOutput, SqsError> {
        self.client
            .change_message_visibility()
            .queue_url(&request.queue_url)
            .receipt_handle(&request.receipt_handle)
            .visibility_timeout(request.visibility_timeout)
            .send()
            .await
            .map_err(|e| {
                map_sdk_error(
                    "ChangeMessageVisibility",
                    &request.queue_url,
                    Some(&request.receipt_handle),
                    e,
                )
            })?;

        Ok(ChangeMessageVisibilityOutput::default())
    }

    async fn set_queue_attributes(
        &self,
        request: SetQueueAttributesRequest,
    ) -> Result<SetQueueAttributesOutput, SqsError> {
        let attributes: HashMap<QueueAttributeName, String> = request
            .attributes
            .iter()
            .map(|(name, value)| (QueueAttributeName::from(name.as_str()), value.clone()))
            .collect();

        self.client
            .set_queue_attributes()
            .queue_url(&request.queue_url)
            .set_attributes(Some(attributes))
            .send()
            .await
            .map_err(|e| map_sdk_error("SetQueueAttributes", &request.queue_url, None, e))?;

        Ok(SetQueueAttributesOutput::default())
    }
}
