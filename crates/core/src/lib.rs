pub mod auth;
pub mod backend;
pub mod category;
pub mod config;
pub mod identity;
pub mod search;
pub mod testing;
pub mod torrents;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use backend::{
    BackendError, DownloadRecord, HttpBackendClient, MuleBackend, SearchHit, SearchResponse,
    SharedFileRecord,
};
pub use category::{Category, CategoryLookup, StaticCategories};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use identity::{
    borrowed_to_native, native_to_borrowed, parse_native_link, ConversionError,
    HashIdentityMapping, HashIdentityStore, HashStoreError, MappingMetadata, SqliteHashStore,
};
pub use search::{
    SearchError, SearchFeedBuilder, SearchGateway, SearchKind, SearchOutcome, SearchRequest,
};
pub use torrents::{
    AddOutcome, ControllerError, DeleteOutcome, DownloadController, TorrentFile, TorrentInfo,
    TorrentProperties, TorrentState,
};
