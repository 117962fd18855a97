use crate::error::{Result, StrataError};
use crate::types::Rank;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, mpsc};

/// Address of one ordered point-to-point lane.
///
/// Messages on the same lane are delivered in send order. `src`/`dst` are
/// fabric (world) addresses, never communicator-local ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MailboxKey {
    pub comm_id: u32,
    pub src: Rank,
    pub dst: Rank,
    pub tag: u16,
}

/// A lane. Lazily created by whichever side touches it first; the sender
/// and the receiver get the same underlying channel. Dropped again once it
/// is drained and nobody waits on it.
struct Mailbox {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: Inbox,
}

type Inbox = Arc<Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>;

impl Mailbox {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

/// In-process message fabric shared by every communicator of a local job.
///
/// Sends never block: they enqueue on the lane and return. Receives wait
/// for the next message on their lane. Ranks marked dead with [`close`]
/// fail every subsequent send or receive that involves them.
///
/// [`close`]: Fabric::close
pub struct Fabric {
    mailboxes: Mutex<HashMap<MailboxKey, Mailbox>>,
    dead: RwLock<HashSet<Rank>>,
}

impl Fabric {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            mailboxes: Mutex::new(HashMap::new()),
            dead: RwLock::new(HashSet::new()),
        })
    }

    /// Enqueue `data` on the lane `key`.
    pub async fn send(&self, key: MailboxKey, data: Vec<u8>) -> Result<()> {
        self.check_alive(key.src, key.dst).await?;
        // Enqueue under the map lock so a lane is never retired with a
        // message in flight.
        let mut map = self.mailboxes.lock().await;
        map.entry(key)
            .or_insert_with(Mailbox::new)
            .tx
            .send(data)
            .map_err(|_| StrataError::PeerDisconnected { rank: key.dst })
    }

    /// Wait for the next message on the lane `key`.
    pub async fn recv(&self, key: MailboxKey) -> Result<Vec<u8>> {
        self.check_alive(key.dst, key.src).await?;
        let rx = {
            let mut map = self.mailboxes.lock().await;
            Arc::clone(&map.entry(key).or_insert_with(Mailbox::new).rx)
        };
        let msg = rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(StrataError::PeerDisconnected { rank: key.src })?;
        self.retire_if_idle(key, &rx).await;
        Ok(msg)
    }

    /// Remove the lane `key` if it holds no messages and no other receiver
    /// references it.
    async fn retire_if_idle(&self, key: MailboxKey, rx: &Inbox) {
        let mut map = self.mailboxes.lock().await;
        let idle = map.get(&key).is_some_and(|mb| {
            Arc::ptr_eq(&mb.rx, rx)
                && Arc::strong_count(rx) == 2
                && rx.try_lock().is_ok_and(|r| r.is_empty())
        });
        if idle {
            map.remove(&key);
        }
    }

    /// Number of live lanes.
    pub async fn lanes(&self) -> usize {
        self.mailboxes.lock().await.len()
    }

    /// Mark `rank` dead. Pending receives from it are not woken; callers
    /// rely on the collective timeout for those.
    pub async fn close(&self, rank: Rank) {
        self.dead.write().await.insert(rank);
        tracing::warn!(rank, "fabric: rank closed");
    }

    async fn check_alive(&self, me: Rank, peer: Rank) -> Result<()> {
        let dead = self.dead.read().await;
        if dead.contains(&me) {
            return Err(StrataError::transport(format!("rank {me} is closed")));
        }
        if dead.contains(&peer) {
            return Err(StrataError::PeerDisconnected { rank: peer });
        }
        Ok(())
    }
}
