pub mod domain;
pub mod ports;
pub mod tracker;

pub use domain::{
    Contribution, ContributionDetail, Language, NewText, Search, Session, Text, Url, User,
    UserCredentials, Word,
};
pub use ports::{
    ContributionStore, IdentityStore, PageFetcher, PortError, PortResult, Translator,
    VocabularyStore,
};
