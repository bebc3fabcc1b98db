//! Tests for client request and response types.

use super::*;

#[test]
fn test_get_queue_attributes_requests_all() {
    let request = GetQueueAttributesRequest::all("https://example.com/q");
    assert_eq!(request.queue_url, "https://example.com/q");
    assert_eq!(request.attribute_names, vec!["All".to_string()]);
}

#[test]
fn test_receive_request_builder() {
    let request = ReceiveMessageRequest::new()
        .with_max_number_of_messages(10)
        .with_visibility_timeout(45)
        .with_wait_time_seconds(20)
        .with_message_attribute_name("All")
        .with_message_system_attribute_name("ApproximateReceiveCount");

    assert_eq!(request.queue_url, "");
    assert_eq!(request.max_number_of_messages, Some(10));
    assert_eq!(request.visibility_timeout, Some(45));
    assert_eq!(request.wait_time_seconds, Some(20));
    assert_eq!(request.message_attribute_names, vec!["All".to_string()]);
    assert_eq!(
        request.message_system_attribute_names,
        vec!["ApproximateReceiveCount".to_string()]
    );
}

#[test]
fn test_change_visibility_request_defaults() {
    let request = ChangeMessageVisibilityRequest::new(30);
    assert_eq!(request.visibility_timeout, 30);
    assert!(request.queue_url.is_empty());
    assert!(request.receipt_handle.is_empty());
}

#[test]
fn test_set_attributes_builder() {
    let request = SetQueueAttributesRequest::new()
        .with_attribute("VisibilityTimeout", "60")
        .with_attribute("DelaySeconds", "5");

    assert_eq!(
        request.attributes.get("VisibilityTimeout"),
        Some(&"60".to_string())
    );
    assert_eq!(request.attributes.len(), 2);
}

#[test]
fn test_delete_batch_output_status() {
    let mut output = DeleteMessageBatchOutput {
        successful: vec!["0".to_string()],
        failed: Vec::new(),
    };
    assert!(output.all_succeeded());

    output.failed.push(BatchResultError {
        id: "1".to_string(),
        code: "ReceiptHandleIsInvalid".to_string(),
        message: None,
        sender_fault: true,
    });
    assert!(!output.all_succeeded());
}

#[test]
fn test_message_attribute_value_constructors() {
    let text = MessageAttributeValue::string("hello");
    assert_eq!(text.data_type, "String");
    assert_eq!(text.string_value.as_deref(), Some("hello"));

    let number = MessageAttributeValue::number(42);
    assert_eq!(number.data_type, "Number");
    assert_eq!(number.string_value.as_deref(), Some("42"));

    let binary = MessageAttributeValue::binary(Bytes::from_static(b"\x01\x02"));
    assert_eq!(binary.data_type, "Binary");
    assert!(binary.string_value.is_none());
    assert_eq!(binary.binary_value.as_deref(), Some(&b"\x01\x02"[..]));
}

#[test]
fn test_binary_attribute_serializes_as_base64() {
    let binary = MessageAttributeValue::binary(Bytes::from_static(b"\x00\xff\x10"));

    let json = serde_json::to_value(&binary).unwrap();
    assert_eq!(json["data_type"], "Binary");
    assert_eq!(json["binary_value"], "AP8Q");

    let restored: MessageAttributeValue = serde_json::from_value(json).unwrap();
    assert_eq!(restored, binary);
}

#[test]
fn test_string_attribute_without_binary_field_deserializes() {
    let value: MessageAttributeValue =
        serde_json::from_str(r#"{"data_type":"String","string_value":"hello"}"#).unwrap();
    assert_eq!(value, MessageAttributeValue::string("hello"));

    let json = serde_json::to_value(MessageAttributeValue::string("hello")).unwrap();
    assert!(json["binary_value"].is_null());
}

#[test]
fn test_invalid_base64_binary_value_is_rejected() {
    let result = serde_json::from_str::<MessageAttributeValue>(
        r#"{"data_type":"Binary","string_value":null,"binary_value":"not base64!"}"#,
    );
    assert!(result.is_err());
}
