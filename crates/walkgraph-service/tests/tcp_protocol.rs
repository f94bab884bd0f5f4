//! End-to-end tests of the framed TCP protocol.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use walkgraph_service::{process_frames, serve, ServeOptions};
use walkgraph_service_shared::codec::decode_json;
use walkgraph_service_shared::test_utils::{
    far_place, fine_grained_state, one_to_all, one_to_one, test_state, walk,
};
use walkgraph_service_shared::{
    read_frame, write_json, AppState, Request, Response, Status, DEFAULT_MAX_FRAME_BYTES,
    PROBLEM_INVALID_REQUEST, PROBLEM_PATH_NOT_FOUND, PROBLEM_UNKNOWN_LOCATION,
};

struct TestServer {
    addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

async fn start(state: AppState, options: ServeOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        serve(listener, state, options, async {
            let _ = rx.await;
        })
        .await
        .unwrap();
    });
    TestServer {
        addr,
        _shutdown: tx,
    }
}

async fn call(stream: &mut TcpStream, request: &Request) -> Response {
    write_json(stream, request).await.unwrap();
    receive(stream).await
}

async fn receive(stream: &mut TcpStream) -> Response {
    let payload = read_frame(stream, DEFAULT_MAX_FRAME_BYTES)
        .await
        .unwrap()
        .expect("server closed the connection");
    decode_json(&payload).unwrap()
}

fn place(i: u32) -> (f64, f64) {
    let location = far_place(i);
    (location.x, location.y)
}

#[tokio::test]
async fn test_requests_on_one_connection_are_answered_in_order() {
    let server = start(fine_grained_state(), ServeOptions::default()).await;
    let mut stream = TcpStream::connect(server.addr).await.unwrap();

    let recorded = call(
        &mut stream,
        &walk(&[(0.0, 0.0), (3.0, 0.0), (3.0, 4.0)], &[5, 5]),
    )
    .await;
    assert!(recorded.is_ok());
    assert_eq!(recorded.walk.unwrap().new_edges, 2);

    let shortest = call(&mut stream, &one_to_one((0.0, 0.0), (3.0, 4.0))).await;
    assert_eq!(shortest.shortest_path_length, Some(10));

    let total = call(&mut stream, &one_to_all((0.0, 0.0))).await;
    assert_eq!(total.total_length, Some(15));

    let stats = call(&mut stream, &Request::Stats).await;
    let stats = stats.stats.unwrap();
    assert_eq!(stats.nodes, 3);
    assert_eq!(stats.edges, 2);
}

#[tokio::test]
async fn test_failures_carry_problem_details() {
    let server = start(test_state(), ServeOptions::default()).await;
    let mut stream = TcpStream::connect(server.addr).await.unwrap();

    let unknown = call(&mut stream, &one_to_one(place(0), place(1))).await;
    assert_eq!(unknown.status, Status::Error);
    let problem = unknown.problem.unwrap();
    assert_eq!(problem.type_uri, PROBLEM_UNKNOWN_LOCATION);
    assert_eq!(problem.status, 404);
    assert!(!problem.retryable);

    call(&mut stream, &walk(&[place(0), place(1)], &[4])).await;
    call(&mut stream, &walk(&[place(2), place(3)], &[4])).await;
    let disconnected = call(&mut stream, &one_to_one(place(0), place(3))).await;
    assert_eq!(
        disconnected.problem.unwrap().type_uri,
        PROBLEM_PATH_NOT_FOUND
    );

    let mismatched = call(&mut stream, &walk(&[place(0), place(1)], &[4, 4])).await;
    assert_eq!(mismatched.problem.unwrap().type_uri, PROBLEM_INVALID_REQUEST);

    // The connection stays usable after failures.
    let shortest = call(&mut stream, &one_to_one(place(0), place(1))).await;
    assert_eq!(shortest.shortest_path_length, Some(4));
}

#[tokio::test]
async fn test_malformed_json_is_rejected_without_closing() {
    let server = start(test_state(), ServeOptions::default()).await;
    let mut stream = TcpStream::connect(server.addr).await.unwrap();

    walkgraph_service_shared::write_frame(&mut stream, b"{\"walk\": 12")
        .await
        .unwrap();
    let reply = receive(&mut stream).await;
    assert_eq!(reply.problem.unwrap().type_uri, PROBLEM_INVALID_REQUEST);

    let stats = call(&mut stream, &Request::Stats).await;
    assert!(stats.is_ok());
}

#[tokio::test]
async fn test_oversized_frame_is_rejected_and_connection_closed() {
    let options = ServeOptions {
        max_frame_bytes: 64,
        ..ServeOptions::default()
    };
    let server = start(test_state(), options).await;
    let mut stream = TcpStream::connect(server.addr).await.unwrap();

    stream.write_all(&1000u32.to_be_bytes()).await.unwrap();
    stream.flush().await.unwrap();

    let reply = receive(&mut stream).await;
    let problem = reply.problem.unwrap();
    assert_eq!(problem.type_uri, PROBLEM_INVALID_REQUEST);
    assert!(problem.detail.unwrap().contains("1000"));

    let next = read_frame(&mut stream, DEFAULT_MAX_FRAME_BYTES).await.unwrap();
    assert!(next.is_none());
}

#[tokio::test]
async fn test_concurrent_clients_share_one_graph() {
    let state = test_state();
    let server = start(state.clone(), ServeOptions::default()).await;

    let mut clients = Vec::new();
    for i in 0..8u32 {
        let addr = server.addr;
        clients.push(tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            for round in 0..10u32 {
                let reply = call(&mut stream, &walk(&[place(0), place(i + 1)], &[round + 1])).await;
                assert!(reply.is_ok());
                let reply = call(&mut stream, &one_to_all(place(0))).await;
                assert!(reply.is_ok());
            }
        }));
    }
    for client in clients {
        client.await.unwrap();
    }

    let stats = state.stats();
    assert_eq!(stats.nodes, 9);
    assert_eq!(stats.edges, 8);
    assert_eq!(stats.observations, 80);
}

#[tokio::test]
async fn test_connection_limit_holds_back_extra_clients() {
    let options = ServeOptions {
        max_connections: 1,
        ..ServeOptions::default()
    };
    let server = start(test_state(), options).await;

    let mut first = TcpStream::connect(server.addr).await.unwrap();
    assert!(call(&mut first, &Request::Stats).await.is_ok());

    let mut second = TcpStream::connect(server.addr).await.unwrap();
    write_json(&mut second, &Request::Stats).await.unwrap();
    let waiting = tokio::time::timeout(Duration::from_millis(300), receive(&mut second)).await;
    assert!(waiting.is_err(), "second client was served while the slot was taken");

    drop(first);
    let served = tokio::time::timeout(Duration::from_secs(5), receive(&mut second))
        .await
        .expect("second client was never served");
    assert!(served.is_ok());
}

#[tokio::test]
async fn test_process_frames_over_in_memory_stream() {
    let state = test_state();
    let (client, server) = tokio::io::duplex(4096);
    let (mut server_reader, mut server_writer) = tokio::io::split(server);

    let handle = {
        let state = state.clone();
        tokio::spawn(async move {
            process_frames(
                &mut server_reader,
                &mut server_writer,
                &state,
                DEFAULT_MAX_FRAME_BYTES,
            )
            .await
        })
    };

    let (mut client_reader, mut client_writer) = tokio::io::split(client);
    write_json(&mut client_writer, &walk(&[place(0), place(1)], &[7]))
        .await
        .unwrap();
    write_json(&mut client_writer, &Request::Reset).await.unwrap();

    for _ in 0..2 {
        let payload = read_frame(&mut client_reader, DEFAULT_MAX_FRAME_BYTES)
            .await
            .unwrap()
            .unwrap();
        let reply: Response = decode_json(&payload).unwrap();
        assert!(reply.is_ok());
    }

    client_writer.shutdown().await.unwrap();
    assert_eq!(handle.await.unwrap(), 2);
    assert_eq!(state.stats().nodes, 0);
}
