use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::handle::{PluginHandle, UiHandle};
use crate::host::{UiCallbacks, UiHost};
use crate::plugin::EnginePlugin;

/// Progress of the single deferred editor construction retry.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// The first construction succeeded, or has not run yet.
    Unused = 0,
    /// The first construction failed; the next idle tick may try once more.
    Pending = 1,
    /// The retry has been spent, whatever its outcome.
    Exhausted = 2,
}

#[derive(Debug)]
struct RetryGate(AtomicU8);

impl RetryGate {
    const fn new() -> Self {
        Self(AtomicU8::new(RetryState::Unused as u8))
    }

    fn state(&self) -> RetryState {
        match self.0.load(Ordering::Acquire) {
            0 => RetryState::Unused,
            1 => RetryState::Pending,
            _ => RetryState::Exhausted,
        }
    }

    fn arm(&self) {
        let _ = self.0.compare_exchange(
            RetryState::Unused as u8,
            RetryState::Pending as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Only one caller ever gets `true`.
    fn claim(&self) -> bool {
        self.0
            .compare_exchange(
                RetryState::Pending as u8,
                RetryState::Exhausted as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// Host editor backed by one engine editor.
///
/// Some hosts create the editor before its window is realized, and the
/// engine then refuses to attach. Construction is attempted once right away
/// and at most once more on the first idle tick after that; if both fail the
/// editor stays empty and every callback becomes a no-op. Audio processing is
/// unaffected either way.
pub struct EngineUi<H: UiHost> {
    inner: Mutex<Option<UiHandle>>,
    retry: RetryGate,
    plugin: Arc<PluginHandle>,
    host: H,
}

impl<H: UiHost> EngineUi<H> {
    pub fn new(host: H, plugin: &EnginePlugin) -> Self {
        Self::with_handle(host, Arc::clone(plugin.handle()))
    }

    pub fn with_handle(host: H, plugin: Arc<PluginHandle>) -> Self {
        let ui = Self {
            inner: Mutex::new(None),
            retry: RetryGate::new(),
            plugin,
            host,
        };
        {
            let mut slot = ui.inner.lock();
            if !ui.initialize(&mut slot) {
                ui.retry.arm();
            }
        }
        ui
    }

    /// Must be called with the editor lock held.
    fn initialize(&self, slot: &mut Option<UiHandle>) -> bool {
        if slot.is_some() {
            return true;
        }

        let result = UiHandle::new(
            self.host.native_window(),
            &self.plugin,
            self.host.width(),
            self.host.height(),
            self.host.scale_factor(),
        );
        match result {
            Ok(Some(handle)) => {
                tracing::info!("engine editor attached");
                *slot = Some(handle);
                true
            }
            Ok(None) => {
                tracing::warn!("engine refused to create the editor");
                false
            }
            Err(err) => {
                tracing::error!(%err, "engine editor unavailable");
                false
            }
        }
    }

    pub fn is_attached(&self) -> bool {
        self.inner.lock().is_some()
    }

    pub fn retry_state(&self) -> RetryState {
        self.retry.state()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn plugin(&self) -> &Arc<PluginHandle> {
        &self.plugin
    }
}

impl<H: UiHost> UiCallbacks for EngineUi<H> {
    fn on_resize(&self, width: u32, height: u32) {
        let slot = self.inner.lock();
        if let Some(ui) = slot.as_ref() {
            ui.set_size(width, height, self.host.scale_factor());
        }
    }

    fn idle(&self) {
        // `Pending` implies the slot is empty, so the retry can be claimed
        // before the lock is taken.
        if self.retry.claim() {
            tracing::info!("retrying engine editor construction");
            let mut slot = self.inner.lock();
            self.initialize(&mut slot);
            return;
        }

        // Forwarded ticks are frequent; skip this one rather than wait.
        let Some(slot) = self.inner.try_lock() else {
            return;
        };
        if let Some(ui) = slot.as_ref() {
            ui.idle();
        }
    }
}
