pub mod error;
pub mod inline_block;
pub mod loop_condition;
pub mod pipeline;

pub use error::TransformError;
pub use inline_block::{inline_block_before_node, inline_block_replacing_node};
pub use loop_condition::{
    inline_loop_condition, InlineStats, LoopConditionConfig, LoopConditionInliner,
};
pub use pipeline::{run_passes, Pass, Pipeline};
