pub mod dispatch;
pub mod gateway;

pub use dispatch::{CommitDispatcher, CommitSink};
pub use gateway::{
    CommitAck, CommitField, CommitJob, CommitPayload, DebounceDelays, PendingCommit,
    PersistenceGateway, Resolution,
};
