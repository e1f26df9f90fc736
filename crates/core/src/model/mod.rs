mod activity;
pub mod asset;
mod badge;
mod ids;
mod progress;

pub use activity::{ActivityError, ActivityEvent, ActivityKind, BucketKey, bucket_events};
pub use asset::{Asset, AssetError, AssetKind, NewAsset};
pub use badge::{Badge, BadgeError};
pub use ids::{AssetId, IdError, LessonId, ProfileId};
pub use progress::{
    CompletedLesson, CompletionOutcome, DEFAULT_CATALOG_SIZE, LearnerProgress, POINTS_PER_LESSON,
    ProgressError,
};
