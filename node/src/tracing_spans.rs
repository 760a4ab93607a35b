//! Span constructors shared by the block processor, so connect and
//! disconnect traces carry the same field names.

use tracing::{info_span, Span};
use wot_types::{BlockHash, BlockHeight};

/// Span covering the connection of one block.
pub fn block_connect_span(height: BlockHeight, hash: &BlockHash) -> Span {
    info_span!("block_connect", height, hash = %hash)
}

/// Span covering the disconnection of one block.
pub fn block_disconnect_span(height: BlockHeight, hash: &BlockHash) -> Span {
    info_span!("block_disconnect", height, hash = %hash)
}
