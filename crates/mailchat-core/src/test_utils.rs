//! Shared helpers for the crate's tests: row seeding and mock
//! collaborators.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::chat::{ChatId, ChatType};
use crate::contact::ContactId;
use crate::event::{Event, EventEmitter};
use crate::job::{JobAction, JobScheduler};
use crate::message::{MsgId, MsgState, MsgType};
use crate::param::Param;
use crate::remote::{LoginParams, RemoteLocation, RemoteMailbox, SeenOutcome};
use crate::storage::Storage;

pub(crate) async fn set_config(storage: &Storage, key: &str, value: &str) {
    let guard = storage.lock().await;
    guard.set_config(key, value).await.unwrap();
}

pub(crate) async fn insert_contact(
    storage: &Storage,
    id: i64,
    name: &str,
    addr: &str,
) -> ContactId {
    let guard = storage.lock().await;
    sqlx::query("INSERT INTO contacts (id, name, addr) VALUES (?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(addr)
        .execute(guard.pool())
        .await
        .unwrap();
    ContactId::new(id)
}

pub(crate) async fn insert_chat(storage: &Storage, id: i64, chat_type: ChatType, name: &str) -> ChatId {
    let guard = storage.lock().await;
    sqlx::query("INSERT INTO chats (id, type, name, grpid) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(chat_type.to_i64())
        .bind(name)
        .bind(format!("grp{id}"))
        .execute(guard.pool())
        .await
        .unwrap();
    ChatId::new(id)
}

pub(crate) async fn add_chat_member(storage: &Storage, chat_id: ChatId, contact_id: ContactId) {
    let guard = storage.lock().await;
    sqlx::query("INSERT INTO chats_contacts (chat_id, contact_id) VALUES (?, ?)")
        .bind(chat_id.0)
        .bind(contact_id.0)
        .execute(guard.pool())
        .await
        .unwrap();
}

/// Field bundle for seeding a message row.
pub(crate) struct MsgSeed {
    pub id: i64,
    pub global_id: String,
    pub server_folder: String,
    pub server_uid: u32,
    pub chat_id: ChatId,
    pub from_id: ContactId,
    pub to_id: ContactId,
    pub timestamp: i64,
    pub msg_type: MsgType,
    pub state: MsgState,
    pub is_chat_message: bool,
    pub text: String,
    pub param: Param,
    pub byte_size: i64,
}

impl MsgSeed {
    pub(crate) fn new(id: i64, chat_id: ChatId) -> Self {
        Self {
            id,
            global_id: format!("msg-{id}@example.com"),
            server_folder: "INBOX".to_string(),
            server_uid: u32::try_from(id).unwrap_or(0),
            chat_id,
            from_id: ContactId::SELF,
            to_id: ContactId::new(0),
            timestamp: 1_700_000_000,
            msg_type: MsgType::Text,
            state: MsgState::InUnseen,
            is_chat_message: true,
            text: "hi".to_string(),
            param: Param::new(),
            byte_size: 0,
        }
    }
}

pub(crate) async fn insert_msg(storage: &Storage, seed: &MsgSeed) -> MsgId {
    let guard = storage.lock().await;
    sqlx::query(
        r"
        INSERT INTO msgs
            (id, global_id, server_folder, server_uid, chat_id, from_id, to_id,
             timestamp, type, state, is_chat_msg, txt, param, bytes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(seed.id)
    .bind(&seed.global_id)
    .bind(&seed.server_folder)
    .bind(seed.server_uid)
    .bind(seed.chat_id.0)
    .bind(seed.from_id.0)
    .bind(seed.to_id.0)
    .bind(seed.timestamp)
    .bind(seed.msg_type.to_i64())
    .bind(seed.state.to_i64())
    .bind(i64::from(seed.is_chat_message))
    .bind(&seed.text)
    .bind(seed.param.to_packed())
    .bind(seed.byte_size)
    .execute(guard.pool())
    .await
    .unwrap();
    MsgId::new(seed.id)
}

/// Remote mailbox double recording every call.
pub(crate) struct MockRemote {
    pub connected: AtomicBool,
    pub connect_succeeds: AtomicBool,
    pub delete_result: AtomicBool,
    pub deletes: Mutex<Vec<(String, String, u32)>>,
    pub seen_calls: Mutex<Vec<(String, u32, bool)>>,
    pub seen_outcome: Mutex<SeenOutcome>,
}

impl MockRemote {
    pub(crate) fn connected() -> Self {
        Self {
            connected: AtomicBool::new(true),
            connect_succeeds: AtomicBool::new(true),
            delete_result: AtomicBool::new(true),
            deletes: Mutex::new(Vec::new()),
            seen_calls: Mutex::new(Vec::new()),
            seen_outcome: Mutex::new(SeenOutcome::Updated(None)),
        }
    }

    pub(crate) fn unreachable() -> Self {
        let remote = Self::connected();
        remote.connected.store(false, Ordering::SeqCst);
        remote.connect_succeeds.store(false, Ordering::SeqCst);
        remote
    }
}

impl RemoteMailbox for MockRemote {
    async fn connect(&self, _params: &LoginParams) -> bool {
        let ok = self.connect_succeeds.load(Ordering::SeqCst);
        self.connected.store(ok, Ordering::SeqCst);
        ok
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn fetch(&self) -> bool {
        true
    }

    async fn watch_and_wait(&self) {}

    fn interrupt_watch(&self) {}

    async fn append(&self, _timestamp: i64, _raw: &[u8]) -> Option<RemoteLocation> {
        None
    }

    async fn mark_seen(&self, folder: &str, uid: u32, also_move: bool) -> SeenOutcome {
        self.seen_calls
            .lock()
            .unwrap()
            .push((folder.to_string(), uid, also_move));
        self.seen_outcome.lock().unwrap().clone()
    }

    async fn delete(&self, global_id: &str, folder: &str, uid: u32) -> bool {
        self.deletes
            .lock()
            .unwrap()
            .push((global_id.to_string(), folder.to_string(), uid));
        self.delete_result.load(Ordering::SeqCst)
    }
}

/// Scheduler double recording enqueued jobs.
#[derive(Default)]
pub(crate) struct MockScheduler {
    pub jobs: Mutex<Vec<(JobAction, MsgId)>>,
}

impl JobScheduler for MockScheduler {
    async fn enqueue(&self, action: JobAction, foreign_id: MsgId, _param: Param) {
        self.jobs.lock().unwrap().push((action, foreign_id));
    }
}

/// Event sink collecting everything it is told.
#[derive(Default)]
pub(crate) struct CollectEmitter {
    pub events: Mutex<Vec<Event>>,
}

impl EventEmitter for CollectEmitter {
    fn notify(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}
