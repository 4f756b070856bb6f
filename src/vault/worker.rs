//! Running vault operations off the caller's thread.
//!
//! Key derivation, encryption and file I/O all block.  `AsyncVault` moves
//! them onto tokio's blocking pool and hands back a `VaultTask` that can be
//! awaited or polled with `is_finished`.  A dropped task is detached, not
//! cancelled: the operation still runs to completion.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};

use super::record::CredentialRecord;
use super::store::{OpenStatus, Vault, VaultOptions};

/// A vault operation running on the blocking pool.
pub struct VaultTask<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T> VaultTask<T> {
    /// True once the operation has completed, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for VaultTask<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) => Err(VaultError::TaskFailed(e.to_string())),
        })
    }
}

/// A shareable handle to one `Vault`.
///
/// Clones share the same vault; operations are serialized by its lock.
#[derive(Clone, Default)]
pub struct AsyncVault {
    inner: Arc<Mutex<Vault>>,
    options: VaultOptions,
}

impl AsyncVault {
    pub fn new(options: VaultOptions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vault::new())),
            options,
        }
    }

    pub fn create(&self, path: PathBuf, passphrase: Zeroizing<String>) -> VaultTask<()> {
        let options = self.options;
        self.spawn(move |vault| vault.create_with(&path, &passphrase, &options))
    }

    pub fn open(&self, path: PathBuf, passphrase: Zeroizing<String>) -> VaultTask<OpenStatus> {
        let options = self.options;
        self.spawn(move |vault| vault.open_with(&path, &passphrase, &options))
    }

    pub fn repair(&self, path: PathBuf, passphrase: Zeroizing<String>) -> VaultTask<Option<PathBuf>> {
        let options = self.options;
        self.spawn(move |vault| vault.repair_with(&path, &passphrase, &options))
    }

    pub fn save(&self) -> VaultTask<()> {
        self.spawn(|vault| vault.save())
    }

    pub fn add_record(&self, record: CredentialRecord) -> VaultTask<()> {
        self.spawn(move |vault| vault.add_record(record))
    }

    pub fn update_record(&self, index: usize, record: CredentialRecord) -> VaultTask<()> {
        self.spawn(move |vault| vault.update_record(index, record))
    }

    pub fn remove_record(&self, index: usize) -> VaultTask<CredentialRecord> {
        self.spawn(move |vault| vault.remove_record(index))
    }

    /// Matching records, cloned out of the vault.
    pub async fn search(&self, term: &str) -> Vec<CredentialRecord> {
        let vault = self.inner.lock().await;
        vault.search(term).into_iter().cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.inner.lock().await.count()
    }

    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.is_open()
    }

    pub async fn current_name(&self) -> Option<String> {
        self.inner.lock().await.current_name()
    }

    pub async fn close(&self) {
        self.inner.lock().await.close();
    }

    fn spawn<T, F>(&self, op: F) -> VaultTask<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Vault) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::task::spawn_blocking(move || {
            let mut vault = inner.blocking_lock();
            op(&mut vault)
        });
        VaultTask { handle }
    }
}
