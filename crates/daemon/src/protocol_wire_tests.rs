use super::*;
use std::io::Cursor;

#[tokio::test]
async fn round_trips_a_request_through_the_wire_format() {
    let request = Request::Status;
    let bytes = encode(&request).unwrap();
    let mut framed = Vec::new();
    write_message(&mut framed, &bytes).await.unwrap();

    let mut cursor = Cursor::new(framed);
    let read_back = read_message(&mut cursor).await.unwrap();
    let decoded: Request = decode(&read_back).unwrap();
    assert_eq!(decoded, request);
}

#[tokio::test]
async fn write_request_then_read_response_round_trips_through_a_duplex_stream() {
    let (mut client, mut server) = tokio::io::duplex(1024);

    write_request(&mut client, &Request::Ping, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    let received = read_request(&mut server, DEFAULT_TIMEOUT).await.unwrap();
    assert_eq!(received, Request::Ping);

    write_response(&mut server, &Response::Pong, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    let reply = read_response(&mut client, DEFAULT_TIMEOUT).await.unwrap();
    assert_eq!(reply, Response::Pong);
}

#[tokio::test]
async fn read_message_reports_connection_closed_on_empty_input() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn rejects_a_declared_length_over_the_message_cap() {
    let mut framed = Vec::new();
    framed.extend_from_slice(&((MAX_MESSAGE_SIZE as u32) + 1).to_be_bytes());
    let mut cursor = Cursor::new(framed);
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}
