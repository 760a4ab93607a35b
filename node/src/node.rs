//! The trust node: an LMDB store wired to a block processor from config.

use std::sync::Arc;

use tracing::info;

use wot_store_lmdb::LmdbTrustStore;

use crate::block_processor::BlockProcessor;
use crate::config::NodeConfig;
use crate::selection::{BlockAssembler, StandardPolicy};
use crate::NodeError;

pub struct TrustNode {
    config: NodeConfig,
    processor: BlockProcessor<LmdbTrustStore>,
}

impl TrustNode {
    /// Open (or create) the store under `config.data_dir`.
    pub fn open(config: NodeConfig) -> Result<Self, NodeError> {
        config.trust.validate()?;
        let store = LmdbTrustStore::open(&config.data_dir, config.map_size())?;
        let processor = BlockProcessor::new(Arc::new(store), &config.trust)?
            .with_parallel_decode(config.parallel_decode);
        let tip = processor.tip()?;
        info!(
            data_dir = %config.data_dir.display(),
            tip = ?tip.map(|t| t.height),
            "trust node opened"
        );
        Ok(Self { config, processor })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn processor(&self) -> &BlockProcessor<LmdbTrustStore> {
        &self.processor
    }

    pub fn selection_policy(&self) -> StandardPolicy {
        StandardPolicy::new(self.config.selection.clone())
    }

    pub fn block_assembler(&self) -> BlockAssembler<StandardPolicy> {
        BlockAssembler::new(self.selection_policy(), self.config.selection.max_block_vsize)
    }
}
