//! Hash identity: the ed2k <-> magnet codec and the persistent mapping store.

mod codec;
mod sqlite;
mod store;

pub use codec::{
    borrowed_hash_for, borrowed_to_native, format_native_link, native_hash_for,
    native_to_borrowed, parse_native_link, BorrowedLink, ConversionError, DecodedLink, NativeLink,
    BORROWED_HASH_LEN, HASH_PAD, NATIVE_HASH_LEN,
};
pub use sqlite::SqliteHashStore;
pub use store::*;
