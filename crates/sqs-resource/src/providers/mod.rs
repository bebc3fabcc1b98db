//! [`SqsApi`](crate::SqsApi) implementations.
//!
//! - [`aws`] calls Amazon SQS through `aws-sdk-sqs`
//! - [`memory`] keeps queues in process, for tests and local development

pub mod aws;
pub mod memory;

pub use aws::AwsSqsClient;
pub use memory::InMemorySqsClient;
