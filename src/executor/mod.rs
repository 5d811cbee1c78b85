pub mod cache_key;
pub mod context;
pub mod error;
pub mod invalidation;
pub mod pipeline;
pub mod slot;
pub mod step;

pub use cache_key::{effective_key, EffectiveKey};
pub use context::Context;
pub use error::StepError;
pub use invalidation::{invalidate, InvalidationReport, InvalidationTag, PREFIX_DELIMITER};
pub use pipeline::{Pipeline, ACCOUNT_CONFIG_KEY};
pub use slot::Slot;
pub use step::{Step, StepRunner};
