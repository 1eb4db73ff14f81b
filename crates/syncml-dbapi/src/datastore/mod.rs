pub mod admin;
pub mod blob;
pub mod map_table;
pub mod state;
pub mod token;

pub use admin::{AdminBlob, AdminStore};
pub use blob::{BlobChunk, BlobReader, BlobWriter, DEFAULT_BLOCK_SIZE};
pub use map_table::{MapRecord, MapTable};
pub use state::{DatastoreState, State};
pub use token::{is_changed, is_resumed, Token};
