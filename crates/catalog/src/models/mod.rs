mod asset;
mod name;
mod record;
mod version;

pub use self::asset::{AssetKind, UnknownExtension};
pub use self::name::{CanonicalName, describe};
pub use self::record::{CatalogDocument, LibraryRecord};
pub use self::version::LibraryVersion;
