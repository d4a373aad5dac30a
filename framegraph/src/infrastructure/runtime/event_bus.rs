// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The event bus: stages and the controller `post` [`Event`]s; a dedicated
//! dispatch thread drains them, runs every registered watcher, and falls
//! back to [`Event::default_handle_flag`] when no watcher intercepts.
//! Grounded on `modules/core/include/cnstream_eventbus.hpp`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;

use framegraph_domain::event::{Event, EventHandleFlag, EventType, StreamMsg};

type Watcher = Box<dyn Fn(&Event) -> Option<EventHandleFlag> + Send + Sync>;

/// How long the dispatch thread blocks on an empty queue before re-checking
/// the stop flag.
const DISPATCH_POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Receiving end of the translated [`StreamMsg`] stream an application
/// observer polls.
pub struct StreamMsgQueue {
    rx: Receiver<StreamMsg>,
}

impl StreamMsgQueue {
    pub fn try_recv(&self) -> Option<StreamMsg> {
        self.rx.try_recv().ok()
    }

    pub fn recv(&self) -> Option<StreamMsg> {
        self.rx.recv().ok()
    }
}

pub struct EventBus {
    tx: Sender<Event>,
    watchers: Arc<RwLock<Vec<Watcher>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    stopped: Arc<AtomicBool>,
}

fn translate(event: &Event, flag: EventHandleFlag) -> Option<StreamMsg> {
    match flag {
        EventHandleFlag::Null | EventHandleFlag::Interception => None,
        EventHandleFlag::Stop => Some(StreamMsg::Stop),
        EventHandleFlag::Synced => match event.event_type {
            EventType::Eos => Some(StreamMsg::Eos {
                stream_id: event.stream_id.clone().unwrap_or_default(),
            }),
            EventType::StreamFrameError => Some(StreamMsg::FrameError {
                stream_id: event.stream_id.clone().unwrap_or_default(),
                pts: 0,
            }),
            EventType::StreamError => Some(StreamMsg::StreamError {
                stream_id: event.stream_id.clone().unwrap_or_default(),
                message: event.message.clone(),
            }),
            _ => Some(StreamMsg::Error {
                stream_id: event.stream_id.clone(),
                module_name: event.module_name.clone(),
                message: event.message.clone(),
            }),
        },
    }
}

impl EventBus {
    /// Spawns the dispatch thread and returns the bus plus the queue an
    /// application observer polls for translated messages.
    pub fn start() -> (Self, StreamMsgQueue) {
        let (tx, event_rx) = unbounded::<Event>();
        let (msg_tx, msg_rx) = unbounded::<StreamMsg>();
        let watchers: Arc<RwLock<Vec<Watcher>>> = Arc::new(RwLock::new(Vec::new()));
        let dispatch_watchers = watchers.clone();
        let stopped = Arc::new(AtomicBool::new(false));
        let dispatch_stopped = stopped.clone();

        let dispatcher = std::thread::Builder::new()
            .name("eventbus-dispatch".into())
            .spawn(move || loop {
                if dispatch_stopped.load(Ordering::Acquire) {
                    return;
                }
                let event = match event_rx.recv_timeout(DISPATCH_POLL_TIMEOUT) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => return,
                };
                let mut flag = None;
                for watcher in dispatch_watchers.read().iter() {
                    if let Some(f) = watcher(&event) {
                        flag = Some(f);
                        break;
                    }
                }
                let flag = flag.unwrap_or_else(|| event.default_handle_flag());
                if let Some(msg) = translate(&event, flag) {
                    let is_stop = matches!(msg, StreamMsg::Stop);
                    if msg_tx.send(msg).is_err() {
                        return;
                    }
                    if is_stop {
                        return;
                    }
                }
            })
            .expect("failed to spawn event bus dispatch thread");

        (
            EventBus {
                tx,
                watchers,
                dispatcher: Mutex::new(Some(dispatcher)),
                stopped,
            },
            StreamMsgQueue { rx: msg_rx },
        )
    }

    pub fn post(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Registers a watcher consulted before the default policy; watchers
    /// run in registration order and the first to return `Some` wins.
    pub fn subscribe(&self, watcher: Watcher) {
        self.watchers.write().push(watcher);
    }

    /// Signals the dispatch thread to exit and joins it. Idempotent: a
    /// second call is a no-op since the handle is only taken once.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        if let Some(handle) = self.dispatcher.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_policy_routes_eos_to_stream_msg() {
        let (bus, queue) = EventBus::start();
        bus.post(Event {
            event_type: EventType::Eos,
            module_name: "decode".into(),
            stream_id: Some("s1".into()),
            message: String::new(),
        });
        std::thread::sleep(Duration::from_millis(20));
        match queue.try_recv() {
            Some(StreamMsg::Eos { stream_id }) => assert_eq!(stream_id, "s1"),
            other => panic!("expected Eos, got {other:?}"),
        }
    }

    #[test]
    fn watcher_can_intercept_before_default_policy() {
        let (bus, queue) = EventBus::start();
        bus.subscribe(Box::new(|_event| Some(EventHandleFlag::Interception)));
        bus.post(Event {
            event_type: EventType::Error,
            module_name: "decode".into(),
            stream_id: None,
            message: "boom".into(),
        });
        std::thread::sleep(Duration::from_millis(20));
        assert!(queue.try_recv().is_none());
    }

    #[test]
    fn stop_joins_the_dispatch_thread_and_is_idempotent() {
        let (bus, _queue) = EventBus::start();
        bus.stop();
        bus.stop();
        assert!(bus.dispatcher.lock().unwrap().is_none());
    }
}
