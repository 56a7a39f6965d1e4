mod catalog;
mod reconcile;

pub use catalog::{RewardCatalog, RewardSpec};
pub use reconcile::RewardSync;
