pub mod compression;
pub use compression::tfdce::PlaneOrder;

mod archive;
pub use archive::{count_entries, Archive, ArchiveError, FatRecord, MAX_ENTRY_SIZE};

mod bitplane;
pub use bitplane::{BitOrder, BitplaneError, BitplaneImage, BitplaneLayout};

mod config;
pub use config::{Config, ConfigError, PaletteSource};

mod face;
pub use face::{Face, FACE_HEIGHT, FACE_WIDTH};

mod palette;
pub use palette::{ColorIndex, Palette};

mod unpack;
pub use unpack::{PackedEntry, PackedFile, UnpackError};
