//! Render context - the processing endpoint a graph attaches to
//!
//! A context owns the sample rate and block size every attached graph
//! renders at. Exactly one graph can be attached at a time; the slot is an
//! atomic shared with the graph so either side can observe it without locks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Processing endpoint with a fixed sample rate and block size
pub struct RenderContext {
    sample_rate: u32,
    block_size: usize,
    /// Set while a graph is attached
    attached: Arc<AtomicBool>,
    open: bool,
}

impl RenderContext {
    /// Open a context with the configured sample rate and block size
    pub fn open(config: &EngineConfig) -> EngineResult<Self> {
        if config.sample_rate == 0 {
            return Err(EngineError::InvalidArgument(
                "sample rate must be nonzero".into(),
            ));
        }
        if config.block_size == 0 {
            return Err(EngineError::InvalidArgument(
                "block size must be nonzero".into(),
            ));
        }

        info!(
            "render context open: {}Hz, {} frame blocks",
            config.sample_rate, config.block_size
        );
        Ok(Self {
            sample_rate: config.sample_rate,
            block_size: config.block_size,
            attached: Arc::new(AtomicBool::new(false)),
            open: true,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Whether a graph currently holds the attach slot
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Claim the attach slot; fails if another graph already holds it
    pub(crate) fn try_attach(&mut self) -> EngineResult<Arc<AtomicBool>> {
        if !self.open {
            return Err(EngineError::InvalidArgument(
                "render context is closed".into(),
            ));
        }
        if self
            .attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EngineError::AlreadyConnected);
        }
        Ok(Arc::clone(&self.attached))
    }

    /// Close the context. Rejected while a graph is attached, so a graph can
    /// never end up rendering into a dead endpoint.
    pub fn close(&mut self) -> EngineResult<()> {
        if self.is_attached() {
            return Err(EngineError::InvalidArgument(
                "cannot close render context while a graph is attached".into(),
            ));
        }
        self.open = false;
        info!("render context closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_validates_config() {
        let mut config = EngineConfig::default();
        config.sample_rate = 0;
        assert!(RenderContext::open(&config).is_err());

        let mut config = EngineConfig::default();
        config.block_size = 0;
        assert!(RenderContext::open(&config).is_err());
    }

    #[test]
    fn test_attach_slot_is_exclusive() {
        let mut ctx = RenderContext::open(&EngineConfig::default()).unwrap();
        let slot = ctx.try_attach().unwrap();
        assert!(matches!(ctx.try_attach(), Err(EngineError::AlreadyConnected)));

        // Releasing the slot makes it claimable again
        slot.store(false, Ordering::Release);
        assert!(ctx.try_attach().is_ok());
    }

    #[test]
    fn test_close_rejected_while_attached() {
        let mut ctx = RenderContext::open(&EngineConfig::default()).unwrap();
        let slot = ctx.try_attach().unwrap();
        assert!(ctx.close().is_err());

        slot.store(false, Ordering::Release);
        assert!(ctx.close().is_ok());
        assert!(ctx.try_attach().is_err(), "closed context rejects attach");
    }
}
