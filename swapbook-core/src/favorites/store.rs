//! Single-writer favorites store
//!
//! One task owns the committed set. Toggles are queued over an mpsc
//! channel and applied in arrival order, each against the set as
//! committed so far. A new snapshot is published only after the backend
//! accepted the write, so observers never see a set storage doesn't hold.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use super::{FavoriteKey, FavoritesBackend, StorageError};

/// The favorites set as committed at one revision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesSnapshot {
    /// Bumped once per committed toggle; 0 is the set loaded at open
    pub revision: u64,
    pub keys: Arc<BTreeSet<FavoriteKey>>,
}

impl FavoritesSnapshot {
    pub fn contains(&self, key: &FavoriteKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FavoriteKey> {
        self.keys.iter()
    }
}

type ToggleReply = oneshot::Sender<Result<bool, StorageError>>;

enum Command {
    Toggle {
        key: FavoriteKey,
        reply: Option<ToggleReply>,
    },
}

/// Handle to the favorites store; cheap to clone
///
/// The writer task stops once every handle is dropped.
#[derive(Clone)]
pub struct FavoritesStore {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<FavoritesSnapshot>,
}

impl FavoritesStore {
    /// Load the persisted set and start the writer task
    ///
    /// Must be called from within a tokio runtime. A backend that cannot
    /// be read is an error rather than an empty set, so a later toggle
    /// can't overwrite favorites that merely failed to load.
    pub fn open<B: FavoritesBackend>(backend: B) -> Result<Self, StorageError> {
        let initial = backend.load()?;
        debug!(
            "Opened favorites store at {} ({} keys)",
            backend.describe(),
            initial.len()
        );

        let (snapshot_tx, snapshot_rx) = watch::channel(FavoritesSnapshot {
            revision: 0,
            keys: Arc::new(initial.clone()),
        });
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_writer(Arc::new(backend), initial, command_rx, snapshot_tx));

        Ok(Self {
            commands: command_tx,
            snapshots: snapshot_rx,
        })
    }

    /// The latest committed snapshot
    pub fn current(&self) -> FavoritesSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn contains(&self, key: &FavoriteKey) -> bool {
        self.snapshots.borrow().contains(key)
    }

    /// Watch receiver over committed snapshots
    pub fn subscribe(&self) -> watch::Receiver<FavoritesSnapshot> {
        self.snapshots.clone()
    }

    /// Stream that yields the current snapshot immediately, then each new commit
    pub fn observe(&self) -> WatchStream<FavoritesSnapshot> {
        WatchStream::new(self.snapshots.clone())
    }

    /// Flip membership of `key` and wait for the commit
    ///
    /// Returns whether the key is a favorite afterwards.
    pub async fn toggle(&self, key: FavoriteKey) -> Result<bool, StorageError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Toggle {
                key,
                reply: Some(reply_tx),
            })
            .map_err(|_| StorageError::Closed)?;

        reply_rx.await.map_err(|_| StorageError::Closed)?
    }

    /// Queue a toggle without waiting; failures are logged by the writer
    pub fn request_toggle(&self, key: FavoriteKey) -> Result<(), StorageError> {
        self.commands
            .send(Command::Toggle { key, reply: None })
            .map_err(|_| StorageError::Closed)
    }
}

async fn run_writer<B: FavoritesBackend>(
    backend: Arc<B>,
    mut committed: BTreeSet<FavoriteKey>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<FavoritesSnapshot>,
) {
    let mut revision = 0u64;

    while let Some(command) = commands.recv().await {
        match command {
            Command::Toggle { key, reply } => {
                let result = apply_toggle(&backend, &mut committed, &key).await;

                match &result {
                    Ok(now_favorite) => {
                        revision += 1;
                        snapshots.send_replace(FavoritesSnapshot {
                            revision,
                            keys: Arc::new(committed.clone()),
                        });
                        debug!(
                            key = %key,
                            favorite = now_favorite,
                            revision,
                            "Committed favorite toggle"
                        );
                    }
                    Err(e) => {
                        warn!(key = %key, "Favorite toggle not committed: {}", e);
                    }
                }

                if let Some(reply) = reply {
                    // Caller may have stopped waiting; the commit stands either way
                    let _ = reply.send(result);
                }
            }
        }
    }

    debug!("Favorites writer stopped at revision {}", revision);
}

/// Flip `key` against the committed set and persist; the set only changes if the save succeeds
///
/// Backends do blocking IO, so the save runs on the blocking pool.
async fn apply_toggle<B: FavoritesBackend>(
    backend: &Arc<B>,
    committed: &mut BTreeSet<FavoriteKey>,
    key: &FavoriteKey,
) -> Result<bool, StorageError> {
    let mut next = committed.clone();
    let now_favorite = if next.remove(key) {
        false
    } else {
        next.insert(key.clone());
        true
    };

    let writer = Arc::clone(backend);
    let next = tokio::task::spawn_blocking(move || writer.save(&next).map(|()| next))
        .await
        .map_err(StorageError::Task)??;

    *committed = next;
    Ok(now_favorite)
}
