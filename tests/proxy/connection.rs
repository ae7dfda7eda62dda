//! Actions returning a child service: registration under a fresh address,
//! direct calls to the child, and closing it.

use serde_json::json;
use service_proxy::bus::{BusError, Message, Outcome, Transport};
use service_proxy::proxy::{CallArgs, CallError};
use std::thread;
use std::time::Duration;

use crate::support::{fixture, ConnectionProxy, ADDRESS};

#[test]
fn create_use_and_close_connection() {
    let fx = fixture();

    let outcome = fx
        .bus
        .request(
            ADDRESS,
            Message::action("createConnection", json!({ "str": "9" })),
            Duration::from_secs(1),
        )
        .unwrap()
        .wait()
        .unwrap();
    let reply = match outcome {
        Outcome::Reply(reply) => reply,
        Outcome::Failure(err) => panic!("unexpected failure: {}", err),
    };
    assert_eq!(reply.body, json!(null));
    let address = reply.proxy_address().unwrap().to_string();
    assert_ne!(address, ADDRESS);
    assert!(fx.bus.is_registered(&address));

    fx.bus
        .send(&address, Message::action("close", json!({})))
        .unwrap();
    assert!(!fx.bus.is_registered(&address));

    let err = fx
        .bus
        .send(&address, Message::action("close", json!({})))
        .unwrap_err();
    assert_eq!(err, BusError::NoHandlers(address.clone()));

    assert_eq!(fx.log.calls(), vec!["createConnection(9)", "close(9)"]);
}

#[test]
fn typed_child_proxy() {
    let fx = fixture();
    let conn: ConnectionProxy = fx
        .client
        .call_proxy("createConnection", CallArgs::new().arg("str", "c1".to_string()))
        .unwrap();

    assert_eq!(conn.start_transaction().unwrap(), "tx-c1");
    conn.close().unwrap();

    let err = conn.start_transaction().unwrap_err();
    assert_eq!(
        err,
        CallError::Transport(BusError::NoHandlers(conn.address().to_string()))
    );
}

#[test]
fn each_connection_gets_its_own_address() {
    let fx = fixture();
    let a: ConnectionProxy = fx
        .client
        .call_proxy("createConnection", CallArgs::new().arg("str", "a".to_string()))
        .unwrap();
    let b: ConnectionProxy = fx
        .client
        .call_proxy("createConnection", CallArgs::new().arg("str", "b".to_string()))
        .unwrap();

    assert_ne!(a.address(), b.address());
    assert_eq!(fx.handle.children().len(), 2);

    a.close().unwrap();
    assert_eq!(fx.handle.children(), vec![b.address().to_string()]);
    assert_eq!(b.start_transaction().unwrap(), "tx-b");
}

#[test]
fn child_actions_decode_arguments() {
    let fx = fixture();
    let conn: ConnectionProxy = fx
        .client
        .call_proxy("createConnection", CallArgs::new().arg("str", "d".to_string()))
        .unwrap();

    fx.bus
        .send(
            conn.address(),
            Message::action("insert", json!({ "name": "row", "data": { "x": 1, "y": 2 } })),
        )
        .unwrap();
    assert!(fx.log.calls().contains(&"insert(row,2)".to_string()));
}

#[test]
fn unregistering_twice_is_a_no_op() {
    let fx = fixture();
    let conn: ConnectionProxy = fx
        .client
        .call_proxy("createConnection", CallArgs::new().arg("str", "e".to_string()))
        .unwrap();
    let registrar = fx.handle.registrar();

    assert!(registrar.unregister(conn.address()));
    assert!(!registrar.unregister(conn.address()));
    assert!(fx.bus.is_registered(ADDRESS));
}

#[test]
fn service_teardown_removes_connections() {
    let fx = fixture();
    for id in ["1", "2", "3"] {
        fx.client
            .call_proxy::<ConnectionProxy>("createConnection", CallArgs::new().arg("str", id.to_string()))
            .unwrap();
    }
    assert_eq!(fx.bus.addresses().len(), 4);

    assert_eq!(fx.handle.unregister(), 3);
    assert!(fx.bus.addresses().is_empty());
}

#[test]
fn concurrent_connections_open_and_close_cleanly() {
    const WORKERS: usize = 8;
    let fx = fixture();

    let workers: Vec<_> = (0..WORKERS)
        .map(|n| {
            let client = fx.client.clone();
            thread::spawn(move || {
                let id = format!("w{}", n);
                let conn: ConnectionProxy = client
                    .call_proxy("createConnection", CallArgs::new().arg("str", id.clone()))
                    .unwrap();
                let tx = conn.start_transaction().unwrap();
                conn.close().unwrap();
                (id, conn.address().to_string(), tx)
            })
        })
        .collect();
    let results: Vec<(String, String, String)> =
        workers.into_iter().map(|w| w.join().unwrap()).collect();

    for (id, _, tx) in &results {
        assert_eq!(tx, &format!("tx-{}", id));
    }
    let mut addresses: Vec<&str> = results.iter().map(|(_, a, _)| a.as_str()).collect();
    addresses.sort();
    addresses.dedup();
    assert_eq!(addresses.len(), WORKERS);

    let calls = fx.log.calls();
    for (id, _, _) in &results {
        let opened = format!("createConnection({})", id);
        let closed = format!("close({})", id);
        assert_eq!(calls.iter().filter(|c| **c == opened).count(), 1);
        assert_eq!(calls.iter().filter(|c| **c == closed).count(), 1);
    }
    assert!(fx.handle.children().is_empty());
    assert_eq!(fx.bus.addresses(), vec![ADDRESS.to_string()]);
}
