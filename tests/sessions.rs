//! Key generation driven over async channels with adversarial message
//! ordering: a dispatcher that shuffles deliveries, exercising the
//! session layer's out-of-order caching.

use std::collections::BTreeMap;

use cmp_ecdsa::sessions::{make_keygen_session, ToSend};
use cmp_ecdsa::{KeyShareSeed, PartyId, PartyIdx, SessionInfo};
use rand::seq::SliceRandom;
use rand_core::OsRng;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

type MessageOut = (PartyIdx, PartyIdx, Box<[u8]>);
type MessageIn = (PartyIdx, Box<[u8]>);

async fn node_session(
    tx: mpsc::Sender<MessageOut>,
    mut rx: mpsc::Receiver<MessageIn>,
    session_info: SessionInfo,
    party_idx: PartyIdx,
) -> KeyShareSeed {
    let num_parties = session_info.num_parties();
    let mut session = make_keygen_session(&mut OsRng, &session_info, party_idx).unwrap();

    while !session.is_complete() {
        let to_send = session.get_messages(&mut OsRng).unwrap();

        match to_send {
            ToSend::Broadcast(message) => {
                for to in (0..num_parties).filter(|to| *to != party_idx.as_usize()) {
                    tx.send((party_idx, PartyIdx::from_usize(to), message.clone()))
                        .await
                        .unwrap();
                }
            }
            ToSend::Direct(messages) => {
                for (to, message) in messages.into_iter() {
                    tx.send((party_idx, to, message)).await.unwrap();
                }
            }
        };

        while session.has_cached_messages() {
            session.receive_cached_message().unwrap();
        }

        while !session.is_finished_receiving().unwrap() {
            let (from, message_bytes) = rx.recv().await.unwrap();
            session.receive(from, &message_bytes).unwrap();
        }

        session.finalize_stage(&mut OsRng).unwrap();
    }

    session.result().unwrap()
}

async fn message_dispatcher(
    txs: BTreeMap<PartyIdx, mpsc::Sender<MessageIn>>,
    mut rx: mpsc::Receiver<MessageOut>,
) {
    let mut messages = Vec::<MessageOut>::new();
    loop {
        let msg = match rx.recv().await {
            Some(msg) => msg,
            None => break,
        };
        messages.push(msg);

        while let Ok(msg) = rx.try_recv() {
            messages.push(msg)
        }
        messages.shuffle(&mut rand::thread_rng());

        while !messages.is_empty() {
            let (from, to, message_bytes) = messages.pop().unwrap();
            txs[&to].send((from, message_bytes)).await.unwrap();

            // Give up execution so that the tasks could process messages.
            sleep(Duration::from_millis(0)).await;

            if let Ok(msg) = rx.try_recv() {
                messages.push(msg);
                messages.shuffle(&mut rand::thread_rng());
            };
        }
    }
}

#[tokio::test]
async fn keygen_over_shuffled_channels() {
    let session_info = SessionInfo::new(
        b"async keygen session",
        vec![PartyId(111), PartyId(222), PartyId(333)],
    );
    let num_parties = session_info.num_parties();

    let (dispatcher_tx, dispatcher_rx) = mpsc::channel::<MessageOut>(100);

    let channels = (0..num_parties).map(|_| mpsc::channel::<MessageIn>(100));
    let (txs, rxs): (Vec<_>, Vec<_>) = channels.unzip();
    let tx_map = (0..num_parties)
        .map(PartyIdx::from_usize)
        .zip(txs.into_iter())
        .collect();

    let dispatcher = tokio::spawn(message_dispatcher(tx_map, dispatcher_rx));

    let handles: Vec<tokio::task::JoinHandle<KeyShareSeed>> = rxs
        .into_iter()
        .enumerate()
        .map(|(idx, rx)| {
            tokio::spawn(node_session(
                dispatcher_tx.clone(),
                rx,
                session_info.clone(),
                PartyIdx::from_usize(idx),
            ))
        })
        .collect();

    // Drop the last copy of the dispatcher's incoming channel
    // so that it could finish.
    drop(dispatcher_tx);

    let mut seeds = Vec::new();
    for handle in handles {
        seeds.push(handle.await.unwrap());
    }
    dispatcher.await.unwrap();

    // Every party ends up with the same public key set and session hash.
    for seed in &seeds[1..] {
        assert_eq!(seed.verifying_key(), seeds[0].verifying_key());
        assert_eq!(
            seed.session_hash(&session_info),
            seeds[0].session_hash(&session_info)
        );
    }
}
