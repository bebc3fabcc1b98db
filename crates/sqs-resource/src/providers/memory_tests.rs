//! Tests for the in-memory SQS client.

use super::*;
use crate::client::DeleteMessageBatchEntry;

async fn client_with_queue() -> (InMemorySqsClient, String) {
    let client = InMemorySqsClient::new();
    let url = client.create_queue("jobs").await;
    (client, url)
}

fn receive_all(url: &str) -> ReceiveMessageRequest {
    ReceiveMessageRequest {
        queue_url: url.to_string(),
        ..ReceiveMessageRequest::new().with_max_number_of_messages(10)
    }
}

#[tokio::test]
async fn test_create_queue_urls_and_defaults() {
    let (client, url) = client_with_queue().await;
    assert_eq!(url, "https://sqs.us-east-1.amazonaws.com/000000000000/jobs");

    // Creating again returns the same queue
    assert_eq!(client.create_queue("jobs").await, url);

    let output = client
        .get_queue_attributes(GetQueueAttributesRequest::all(&url))
        .await
        .unwrap();
    let attributes = output.attributes;
    assert_eq!(attributes["VisibilityTimeout"], "30");
    assert_eq!(attributes["MaximumMessageSize"], "262144");
    assert_eq!(attributes["MessageRetentionPeriod"], "345600");
    assert_eq!(attributes["DelaySeconds"], "0");
    assert_eq!(
        attributes["QueueArn"],
        "arn:aws:sqs:us-east-1:000000000000:jobs"
    );
    assert_eq!(attributes["ApproximateNumberOfMessages"], "0");
    assert!(attributes["CreatedTimestamp"].parse::<i64>().is_ok());
}

#[tokio::test]
async fn test_get_queue_attributes_filters_by_name() {
    let (client, url) = client_with_queue().await;

    let output = client
        .get_queue_attributes(GetQueueAttributesRequest {
            queue_url: url,
            attribute_names: vec!["QueueArn".to_string(), "DelaySeconds".to_string()],
        })
        .await
        .unwrap();

    assert_eq!(output.attributes.len(), 2);
    assert!(output.attributes.contains_key("QueueArn"));
    assert!(output.attributes.contains_key("DelaySeconds"));
}

#[tokio::test]
async fn test_unknown_queue_is_reported() {
    let client = InMemorySqsClient::new();
    let result = client
        .get_queue_attributes(GetQueueAttributesRequest::all("https://nowhere/queue"))
        .await;
    assert!(matches!(result, Err(SqsError::QueueNotFound { .. })));

    let result = client.send_message("https://nowhere/queue", "x").await;
    assert!(matches!(result, Err(SqsError::QueueNotFound { .. })));
}

#[tokio::test]
async fn test_receive_hides_messages_and_updates_counts() {
    let (client, url) = client_with_queue().await;
    client.send_message(&url, "first").await.unwrap();
    client.send_message(&url, "second").await.unwrap();

    let output = client.receive_message(receive_all(&url)).await.unwrap();
    let bodies: Vec<_> = output
        .messages
        .iter()
        .map(|message| message.body.as_deref().unwrap())
        .collect();
    assert_eq!(bodies, vec!["first", "second"]);
    assert!(output
        .messages
        .iter()
        .all(|message| message.receipt_handle.is_some()));
    assert_eq!(
        output.messages[0].md5_of_body.as_deref(),
        Some("8b04d5e3775d298e78455efc5ca404d5")
    );

    // In flight messages are not delivered again
    let again = client.receive_message(receive_all(&url)).await.unwrap();
    assert!(again.messages.is_empty());

    let attributes = client
        .get_queue_attributes(GetQueueAttributesRequest::all(&url))
        .await
        .unwrap()
        .attributes;
    assert_eq!(attributes["ApproximateNumberOfMessages"], "0");
    assert_eq!(attributes["ApproximateNumberOfMessagesNotVisible"], "2");
}

#[tokio::test]
async fn test_receive_defaults_to_one_message() {
    let (client, url) = client_with_queue().await;
    client.send_message(&url, "a").await.unwrap();
    client.send_message(&url, "b").await.unwrap();

    let output = client
        .receive_message(ReceiveMessageRequest {
            queue_url: url,
            ..ReceiveMessageRequest::new()
        })
        .await
        .unwrap();
    assert_eq!(output.messages.len(), 1);
}

#[tokio::test]
async fn test_receive_rejects_out_of_range_count() {
    let (client, url) = client_with_queue().await;

    for max in [0, 11] {
        let result = client
            .receive_message(ReceiveMessageRequest {
                queue_url: url.clone(),
                ..ReceiveMessageRequest::new().with_max_number_of_messages(max)
            })
            .await;
        let error = result.unwrap_err();
        assert_eq!(error.code(), Some("InvalidParameterValue"));
    }
}

#[tokio::test]
async fn test_receive_filters_system_attributes() {
    let (client, url) = client_with_queue().await;
    client.send_message(&url, "body").await.unwrap();

    let request = ReceiveMessageRequest {
        queue_url: url,
        ..ReceiveMessageRequest::new().with_message_system_attribute_name("ApproximateReceiveCount")
    };
    let output = client.receive_message(request).await.unwrap();
    let attributes = &output.messages[0].attributes;

    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes["ApproximateReceiveCount"], "1");
}

#[tokio::test]
async fn test_message_attributes_are_returned_when_requested() {
    let (client, url) = client_with_queue().await;
    let mut attributes = HashMap::new();
    attributes.insert("trace.id".to_string(), MessageAttributeValue::string("abc"));
    attributes.insert("priority".to_string(), MessageAttributeValue::number(5));
    client
        .send_message_with_attributes(&url, "body", attributes)
        .await
        .unwrap();

    let request = ReceiveMessageRequest {
        queue_url: url,
        ..ReceiveMessageRequest::new().with_message_attribute_name("trace.*")
    };
    let output = client.receive_message(request).await.unwrap();
    let message = &output.messages[0];

    assert_eq!(message.message_attributes.len(), 1);
    assert_eq!(
        message.message_attributes["trace.id"],
        MessageAttributeValue::string("abc")
    );
    assert!(message.md5_of_message_attributes.is_some());
}

#[tokio::test]
async fn test_message_attributes_omitted_by_default() {
    let (client, url) = client_with_queue().await;
    let mut attributes = HashMap::new();
    attributes.insert("priority".to_string(), MessageAttributeValue::number(5));
    client
        .send_message_with_attributes(&url, "body", attributes)
        .await
        .unwrap();

    let output = client.receive_message(receive_all(&url)).await.unwrap();
    assert!(output.messages[0].message_attributes.is_empty());
    assert!(output.messages[0].md5_of_message_attributes.is_none());
}

#[test]
fn test_md5_of_message_attributes_ignores_insertion_order() {
    let mut first = HashMap::new();
    first.insert("a".to_string(), MessageAttributeValue::string("1"));
    first.insert("b".to_string(), MessageAttributeValue::number(2));

    let mut second = HashMap::new();
    second.insert("b".to_string(), MessageAttributeValue::number(2));
    second.insert("a".to_string(), MessageAttributeValue::string("1"));

    let digest = md5_of_message_attributes(&first).unwrap();
    assert_eq!(digest.len(), 32);
    assert_eq!(Some(digest), md5_of_message_attributes(&second));

    second.insert("a".to_string(), MessageAttributeValue::string("changed"));
    assert_ne!(md5_of_message_attributes(&first), md5_of_message_attributes(&second));

    assert!(md5_of_message_attributes(&HashMap::new()).is_none());
}

#[tokio::test]
async fn test_send_rejects_oversized_body() {
    let mut overrides = HashMap::new();
    overrides.insert("MaximumMessageSize".to_string(), "1024".to_string());
    let client = InMemorySqsClient::new();
    let url = client
        .create_queue_with_attributes("small", overrides)
        .await
        .unwrap();

    assert!(client.send_message(&url, &"x".repeat(1024)).await.is_ok());
    let error = client
        .send_message(&url, &"x".repeat(1025))
        .await
        .unwrap_err();
    assert_eq!(error.code(), Some("InvalidParameterValue"));
}

#[tokio::test]
async fn test_delay_seconds_hides_new_messages() {
    let mut overrides = HashMap::new();
    overrides.insert("DelaySeconds".to_string(), "60".to_string());
    let client = InMemorySqsClient::new();
    let url = client
        .create_queue_with_attributes("delayed", overrides)
        .await
        .unwrap();
    client.send_message(&url, "later").await.unwrap();

    let output = client.receive_message(receive_all(&url)).await.unwrap();
    assert!(output.messages.is_empty());

    let attributes = client
        .get_queue_attributes(GetQueueAttributesRequest::all(&url))
        .await
        .unwrap()
        .attributes;
    assert_eq!(attributes["ApproximateNumberOfMessagesDelayed"], "1");
    assert_eq!(attributes["ApproximateNumberOfMessages"], "0");
}

#[tokio::test]
async fn test_create_queue_rejects_out_of_range_overrides() {
    let client = InMemorySqsClient::new();

    let mut overrides = HashMap::new();
    overrides.insert("DelaySeconds".to_string(), i64::MAX.to_string());
    let error = client
        .create_queue_with_attributes("huge-delay", overrides)
        .await
        .unwrap_err();
    assert_eq!(error.code(), Some("InvalidAttributeValue"));

    let mut overrides = HashMap::new();
    overrides.insert("QueueArn".to_string(), "arn:x".to_string());
    let error = client
        .create_queue_with_attributes("renamed", overrides)
        .await
        .unwrap_err();
    assert_eq!(error.code(), Some("InvalidAttributeName"));
}

#[tokio::test]
async fn test_delete_batch_reports_per_entry_results() {
    let (client, url) = client_with_queue().await;
    client.send_message(&url, "doomed").await.unwrap();
    let received = client.receive_message(receive_all(&url)).await.unwrap();
    let handle = received.messages[0].receipt_handle.clone().unwrap();

    let output = client
        .delete_message_batch(DeleteMessageBatchRequest {
            queue_url: url.clone(),
            entries: vec![
                DeleteMessageBatchEntry::new("ok", handle),
                DeleteMessageBatchEntry::new("bad", "not-a-handle"),
            ],
        })
        .await
        .unwrap();

    assert_eq!(output.successful, vec!["ok".to_string()]);
    assert_eq!(output.failed.len(), 1);
    assert_eq!(output.failed[0].id, "bad");
    assert_eq!(output.failed[0].code, "ReceiptHandleIsInvalid");
    assert!(output.failed[0].sender_fault);
    assert!(!output.all_succeeded());

    let attributes = client
        .get_queue_attributes(GetQueueAttributesRequest::all(&url))
        .await
        .unwrap()
        .attributes;
    assert_eq!(attributes["ApproximateNumberOfMessagesNotVisible"], "0");
}

#[tokio::test]
async fn test_delete_batch_validates_entries() {
    let (client, url) = client_with_queue().await;

    let empty = client
        .delete_message_batch(DeleteMessageBatchRequest {
            queue_url: url.clone(),
            entries: Vec::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(empty.code(), Some("AWS.SimpleQueueService.EmptyBatchRequest"));

    let too_many = client
        .delete_message_batch(DeleteMessageBatchRequest {
            queue_url: url.clone(),
            entries: (0..11)
                .map(|i| DeleteMessageBatchEntry::new(i.to_string(), "h"))
                .collect(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        too_many.code(),
        Some("AWS.SimpleQueueService.TooManyEntriesInBatchRequest")
    );

    let duplicate = client
        .delete_message_batch(DeleteMessageBatchRequest {
            queue_url: url,
            entries: vec![
                DeleteMessageBatchEntry::new("same", "h1"),
                DeleteMessageBatchEntry::new("same", "h2"),
            ],
        })
        .await
        .unwrap_err();
    assert_eq!(
        duplicate.code(),
        Some("AWS.SimpleQueueService.BatchEntryIdsNotDistinct")
    );
}

#[tokio::test]
async fn test_change_visibility_to_zero_makes_message_visible() {
    let (client, url) = client_with_queue().await;
    client.send_message(&url, "retry me").await.unwrap();
    let received = client.receive_message(receive_all(&url)).await.unwrap();
    let handle = received.messages[0].receipt_handle.clone().unwrap();

    client
        .change_message_visibility(ChangeMessageVisibilityRequest {
            queue_url: url.clone(),
            receipt_handle: handle,
            visibility_timeout: 0,
        })
        .await
        .unwrap();

    let again = client
        .receive_message(ReceiveMessageRequest {
            queue_url: url.clone(),
            ..ReceiveMessageRequest::new().with_message_system_attribute_name(ALL_ATTRIBUTES)
        })
        .await
        .unwrap();
    assert_eq!(again.messages.len(), 1);
    assert_eq!(
        again.messages[0]
            .attributes
            .get("ApproximateReceiveCount")
            .map(String::as_str),
        Some("2")
    );
}

#[tokio::test]
async fn test_change_visibility_errors() {
    let (client, url) = client_with_queue().await;

    let unknown = client
        .change_message_visibility(ChangeMessageVisibilityRequest {
            queue_url: url.clone(),
            receipt_handle: "missing".to_string(),
            visibility_timeout: 30,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        unknown,
        SqsError::ReceiptHandleInvalid { ref receipt_handle } if receipt_handle == "missing"
    ));

    let out_of_range = client
        .change_message_visibility(ChangeMessageVisibilityRequest {
            queue_url: url,
            receipt_handle: "missing".to_string(),
            visibility_timeout: MAX_VISIBILITY_TIMEOUT + 1,
        })
        .await
        .unwrap_err();
    assert_eq!(out_of_range.code(), Some("InvalidParameterValue"));
}

#[tokio::test]
async fn test_set_queue_attributes_updates_values() {
    let (client, url) = client_with_queue().await;

    client
        .set_queue_attributes(SetQueueAttributesRequest {
            queue_url: url.clone(),
            ..SetQueueAttributesRequest::new().with_attribute("VisibilityTimeout", "45")
        })
        .await
        .unwrap();

    let attributes = client
        .get_queue_attributes(GetQueueAttributesRequest::all(&url))
        .await
        .unwrap()
        .attributes;
    assert_eq!(attributes["VisibilityTimeout"], "45");
}

#[tokio::test]
async fn test_set_queue_attributes_validates_names_and_values() {
    let (client, url) = client_with_queue().await;

    let unknown = client
        .set_queue_attributes(SetQueueAttributesRequest {
            queue_url: url.clone(),
            ..SetQueueAttributesRequest::new().with_attribute("QueueArn", "arn:x")
        })
        .await
        .unwrap_err();
    assert_eq!(unknown.code(), Some("InvalidAttributeName"));

    let bad_value = client
        .set_queue_attributes(SetQueueAttributesRequest {
            queue_url: url,
            ..SetQueueAttributesRequest::new().with_attribute("DelaySeconds", "soon")
        })
        .await
        .unwrap_err();
    assert_eq!(bad_value.code(), Some("InvalidAttributeValue"));
}

#[tokio::test]
async fn test_set_queue_attributes_rejects_out_of_range_values() {
    let (client, url) = client_with_queue().await;

    for (name, value) in [
        ("DelaySeconds", "9223372036854775807"),
        ("DelaySeconds", "901"),
        ("VisibilityTimeout", "99999999999999999"),
        ("VisibilityTimeout", "-1"),
        ("MaximumMessageSize", "1023"),
        ("MessageRetentionPeriod", "59"),
        ("ReceiveMessageWaitTimeSeconds", "21"),
    ] {
        let error = client
            .set_queue_attributes(SetQueueAttributesRequest {
                queue_url: url.clone(),
                ..SetQueueAttributesRequest::new().with_attribute(name, value)
            })
            .await
            .unwrap_err();
        assert_eq!(
            error.code(),
            Some("InvalidAttributeValue"),
            "{} = {} was accepted",
            name,
            value
        );
    }

    // Rejected values never reach the queue, so later calls still work
    client.send_message(&url, "still fine").await.unwrap();
    let output = client.receive_message(receive_all(&url)).await.unwrap();
    assert_eq!(output.messages.len(), 1);

    let attributes = client
        .get_queue_attributes(GetQueueAttributesRequest::all(&url))
        .await
        .unwrap()
        .attributes;
    assert_eq!(attributes["DelaySeconds"], "0");
    assert_eq!(attributes["VisibilityTimeout"], "30");
}

#[tokio::test]
async fn test_set_queue_attributes_accepts_range_bounds() {
    let (client, url) = client_with_queue().await;

    client
        .set_queue_attributes(SetQueueAttributesRequest {
            queue_url: url.clone(),
            ..SetQueueAttributesRequest::new()
                .with_attribute("DelaySeconds", "900")
                .with_attribute("VisibilityTimeout", "43200")
        })
        .await
        .unwrap();

    client.send_message(&url, "delayed").await.unwrap();
    let output = client.receive_message(receive_all(&url)).await.unwrap();
    assert!(output.messages.is_empty());
}

#[tokio::test]
async fn test_receive_rejects_out_of_range_visibility_and_wait() {
    let (client, url) = client_with_queue().await;
    client.send_message(&url, "body").await.unwrap();

    for request in [
        ReceiveMessageRequest::new().with_visibility_timeout(-1),
        ReceiveMessageRequest::new().with_visibility_timeout(MAX_VISIBILITY_TIMEOUT + 1),
        ReceiveMessageRequest::new().with_wait_time_seconds(21),
    ] {
        let error = client
            .receive_message(ReceiveMessageRequest {
                queue_url: url.clone(),
                ..request
            })
            .await
            .unwrap_err();
        assert_eq!(error.code(), Some("InvalidParameterValue"));
    }

    // The message was not consumed by the rejected calls
    let output = client.receive_message(receive_all(&url)).await.unwrap();
    assert_eq!(output.messages.len(), 1);
    assert!(client
        .receive_message(receive_all(&url))
        .await
        .unwrap()
        .messages
        .is_empty());
}
