//! End-to-end GET/SET/DEL over a real `TcpStream`, exercising
//! `blockkv_server::wire` against `blockkv_server::handle_connection`.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

use blockkv_core::{Config, HashTable};

fn spawn_echo_server() -> (std::net::SocketAddr, std::thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let table = HashTable::new(Config::default());

    let handle = std::thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            blockkv_server::handle_connection(stream, &table);
        }
    });
    (addr, handle)
}

fn write_get(stream: &mut TcpStream, key: &[u8]) {
    stream.write_all(&[0]).unwrap();
    stream.write_all(&(key.len() as u32).to_be_bytes()).unwrap();
    stream.write_all(key).unwrap();
}

fn write_set(stream: &mut TcpStream, key: &[u8], value: &[u8]) {
    stream.write_all(&[1]).unwrap();
    stream.write_all(&(key.len() as u32).to_be_bytes()).unwrap();
    stream.write_all(key).unwrap();
    stream.write_all(&(value.len() as u32).to_be_bytes()).unwrap();
    stream.write_all(value).unwrap();
}

fn write_del(stream: &mut TcpStream, key: &[u8]) {
    stream.write_all(&[2]).unwrap();
    stream.write_all(&(key.len() as u32).to_be_bytes()).unwrap();
    stream.write_all(key).unwrap();
}

fn read_response(stream: &mut TcpStream) -> (u8, Vec<u8>) {
    let mut status = [0u8; 1];
    stream.read_exact(&mut status).unwrap();
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).unwrap();
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut value = vec![0u8; len];
    stream.read_exact(&mut value).unwrap();
    (status[0], value)
}

#[test]
fn get_on_missing_key_returns_key_error() {
    let (addr, _server) = spawn_echo_server();
    let mut client = TcpStream::connect(addr).unwrap();

    write_get(&mut client, b"missing");
    let (status, value) = read_response(&mut client);
    assert_eq!(status, 1, "KEY_ERROR");
    assert!(value.is_empty());
}

#[test]
fn set_then_get_round_trips_over_the_wire() {
    let (addr, _server) = spawn_echo_server();
    let mut client = TcpStream::connect(addr).unwrap();

    write_set(&mut client, b"k", b"hello world");
    let (status, value) = read_response(&mut client);
    assert_eq!(status, 0, "OK");
    assert!(value.is_empty(), "SET acknowledges with no body");

    write_get(&mut client, b"k");
    let (status, value) = read_response(&mut client);
    assert_eq!(status, 0, "OK");
    assert_eq!(value, b"hello world");
}

#[test]
fn del_then_get_returns_key_error() {
    let (addr, _server) = spawn_echo_server();
    let mut client = TcpStream::connect(addr).unwrap();

    write_set(&mut client, b"k", b"v");
    read_response(&mut client);

    write_del(&mut client, b"k");
    let (status, _) = read_response(&mut client);
    assert_eq!(status, 0, "OK");

    write_get(&mut client, b"k");
    let (status, _) = read_response(&mut client);
    assert_eq!(status, 1, "KEY_ERROR");
}

#[test]
fn multiple_requests_share_one_connection() {
    let (addr, _server) = spawn_echo_server();
    let mut client = TcpStream::connect(addr).unwrap();

    for i in 0..10u8 {
        write_set(&mut client, &[i], &[i; 4]);
        let (status, _) = read_response(&mut client);
        assert_eq!(status, 0);
    }
    for i in 0..10u8 {
        write_get(&mut client, &[i]);
        let (status, value) = read_response(&mut client);
        assert_eq!(status, 0);
        assert_eq!(value, vec![i; 4]);
    }
}
