//! Actions with results: encoding of every result shape and the
//! exactly-one-outcome guarantee.

use std::collections::HashSet;
use std::sync::mpsc;
use std::time::Duration;

use serde_json::json;
use service_proxy::bus::{Message, Outcome, Transport};
use service_proxy::proxy::{CallArgs, CallError, DROPPED_REPLY};
use service_proxy::wire::WireObject;
use service_proxy::FAILURE_CODE;

use crate::support::{fixture, SomeEnum, TestDataObject, ADDRESS};

fn reply_body(action: &str) -> serde_json::Value {
    let fx = fixture();
    let outcome = fx
        .bus
        .request(ADDRESS, Message::action(action, json!({})), Duration::from_secs(1))
        .unwrap()
        .wait()
        .unwrap();
    match outcome {
        Outcome::Reply(reply) => reply.body,
        Outcome::Failure(err) => panic!("{} failed: {}", action, err),
    }
}

#[test]
fn scalar_results() {
    let fx = fixture();
    assert_eq!(
        fx.client.call::<String>("stringHandler", CallArgs::new()).unwrap(),
        "foobar"
    );
    assert_eq!(fx.client.call::<char>("charHandler", CallArgs::new()).unwrap(), 'X');
    fx.client.call::<()>("voidHandler", CallArgs::new()).unwrap();
    assert_eq!(
        fx.client.call::<SomeEnum>("enumHandler", CallArgs::new()).unwrap(),
        SomeEnum::Wobble
    );
}

#[test]
fn wire_encoding_of_results() {
    assert_eq!(reply_body("charHandler"), json!(88));
    assert_eq!(reply_body("voidHandler"), json!(null));
    assert_eq!(reply_body("enumHandler"), json!("Wobble"));
    assert_eq!(reply_body("listCharHandler"), json!([88, 89, 90]));
    assert_eq!(reply_body("listStringHandler"), json!(["foo", "bar", "wibble"]));
    assert_eq!(
        reply_body("dataObjectHandler"),
        json!({ "string": "foo", "number": 123, "flag": true })
    );
}

#[test]
fn records_and_json_objects() {
    let fx = fixture();
    let record: TestDataObject = fx.client.call("dataObjectHandler", CallArgs::new()).unwrap();
    assert_eq!(record.number, 123);

    let object: WireObject = fx.client.call("jsonObjectHandler", CallArgs::new()).unwrap();
    assert_eq!(object.get("blah"), Some(&json!("wibble")));
}

#[test]
fn set_result_collapses_duplicates() {
    let body = reply_body("setStringHandler");
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.contains(&json!("a")));
    assert!(items.contains(&json!("b")));

    let fx = fixture();
    let set: HashSet<String> = fx.client.call("setStringHandler", CallArgs::new()).unwrap();
    let expected: HashSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
    assert_eq!(set, expected);
}

#[test]
fn reply_from_another_thread() {
    let fx = fixture();
    let result: String = fx
        .client
        .call("delayedHandler", CallArgs::new().arg("str", "late".to_string()))
        .unwrap();
    assert_eq!(result, "LATE");
}

#[test]
fn failure_is_delivered_verbatim() {
    let fx = fixture();
    let err = fx
        .client
        .call::<String>("failingMethod", CallArgs::new())
        .unwrap_err();
    assert!(matches!(err, CallError::Remote(_)));
    assert_eq!(err.code(), FAILURE_CODE);
    assert_eq!(err.message(), "wibble");
}

#[test]
fn dropped_reply_still_answers() {
    let fx = fixture();
    let err = fx
        .client
        .call::<String>("forgetfulHandler", CallArgs::new())
        .unwrap_err();
    assert_eq!(err.message(), DROPPED_REPLY);
}

#[test]
fn callback_style_call() {
    let fx = fixture();
    let (tx, rx) = mpsc::channel();
    fx.client
        .call_with(
            "listStringHandler",
            CallArgs::new(),
            move |result: Result<Vec<String>, CallError>| tx.send(result).unwrap(),
        )
        .join()
        .unwrap();
    assert_eq!(rx.recv().unwrap().unwrap(), vec!["foo", "bar", "wibble"]);
}
