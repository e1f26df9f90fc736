use thiserror::Error;

use crate::model::{ActivityError, AssetError, BadgeError, IdError, ProgressError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Badge(#[from] BadgeError),
    #[error(transparent)]
    Activity(#[from] ActivityError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
