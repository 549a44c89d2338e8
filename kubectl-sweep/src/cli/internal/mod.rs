//! Internal helpers shared by CLI commands.

mod resource;

pub use self::resource::ResourceResolver;
