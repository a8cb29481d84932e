//! Property checks: whatever the operator supplies is exactly what is sent

mod common;

use fraud_prediction_client::client::{PREDICT_BATCH_PATH, PREDICT_PATH};
use fraud_prediction_client::Transaction;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[A-Za-z0-9_ ]{0,16}".prop_map(Value::from),
    ]
}

fn field_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => scalar(),
        1 => prop::collection::vec(scalar(), 0..4).prop_map(Value::from),
    ]
}

fn transaction() -> impl Strategy<Value = Transaction> {
    prop::collection::vec(("[A-Za-z_][A-Za-z0-9_]{0,11}", field_value()), 0..10).prop_map(
        |fields| {
            let mut map = Map::new();
            for (key, value) in fields {
                map.insert(key, value);
            }
            Transaction::from(map)
        },
    )
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #[test]
    fn test_single_body_equals_transaction(tx in transaction()) {
        let client = common::client();
        client.transport().respond(PREDICT_PATH, Ok(json!({"ok": true})));

        block_on(client.predict_single(&tx)).unwrap();

        let requests = client.transport().requests();
        prop_assert_eq!(requests.len(), 1);

        // Through the wire encoding and back
        let wire = serde_json::to_string(requests[0].body.as_ref().unwrap()).unwrap();
        let decoded = Transaction::from_json_str(&wire).unwrap();
        let decoded_keys: Vec<&String> = decoded.fields().keys().collect();
        let given_keys: Vec<&String> = tx.fields().keys().collect();
        prop_assert_eq!(decoded_keys, given_keys);
        prop_assert_eq!(decoded, tx);
    }

    #[test]
    fn test_batch_body_wraps_sequence_in_order(txs in prop::collection::vec(transaction(), 0..6)) {
        let client = common::client();
        client.transport().respond(PREDICT_BATCH_PATH, Ok(json!({"results": []})));

        block_on(client.predict_batch(&txs)).unwrap();

        let requests = client.transport().requests();
        prop_assert_eq!(requests.len(), 1);

        let expected: Vec<Value> = txs.iter().cloned().map(Transaction::into_value).collect();
        prop_assert_eq!(
            requests[0].body.clone().unwrap(),
            json!({ "transactions": expected })
        );
    }
}
