//! Server configuration file editing.
//!
//! Minecraft servers are configured through two line-oriented files in the
//! install root: `server.properties` (`key=value` pairs) and `eula.txt`
//! (a single boolean flag plus comments). Both editors here use whole-file
//! read/rewrite semantics; there is no partial-write durability guarantee
//! and concurrent external writers are not protected against.

mod eula;
mod properties;

pub use eula::Eula;
pub use properties::ServerProperties;
