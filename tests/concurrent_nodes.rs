mod support;

use std::sync::Arc;

use meshcfg::protocol::{AccessMessage, StatusCode, pack_key_indexes};
use meshcfg::{ExchangeCoordinator, KeyIndex, Opcode, StateTag};

use support::{AddressBook, Event, Recorder, SimBearer, access_pdu, node};

// One coordinator per node, each driven from its own task.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn coordinators_progress_independently() {
    let mut handles = Vec::new();
    for index in 0..8u16 {
        handles.push(tokio::spawn(async move {
            let node = Arc::new(node(&format!("node-{index}"), 0x0010 + index * 4));
            let mut coordinator = ExchangeCoordinator::new(
                SimBearer::default(),
                Recorder::default(),
                AddressBook::default(),
            );
            coordinator
                .send_app_key_add(
                    Arc::clone(&node),
                    index,
                    "63964771734fbd76e3b40519d1d94a48",
                    false,
                )
                .unwrap();
            tokio::task::yield_now().await;
            coordinator.on_write_complete(&node, &[]);

            let mut params = vec![StatusCode::Success.as_u8()];
            params.extend_from_slice(&pack_key_indexes(
                KeyIndex::default(),
                KeyIndex::new(index).unwrap(),
            ));
            let status = AccessMessage::new(Opcode::CONFIG_APPKEY_STATUS, params);
            tokio::task::yield_now().await;
            coordinator.on_notification(
                &node,
                &access_pdu(node.unicast_address, node.configuration_src, &status),
            );

            (index, coordinator.current_state(), coordinator.into_parts().1)
        }));
    }

    for handle in handles {
        let (index, state, recorder) = handle.await.unwrap();
        assert_eq!(state, StateTag::NoOperation);
        match recorder.received()[..] {
            [Event::AppKey(status, _)] => assert_eq!(status.app_key_index.value(), index),
            ref other => panic!("node {index}: unexpected events {other:?}"),
        }
    }
}
