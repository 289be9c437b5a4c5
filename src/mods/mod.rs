//! Mod directory hygiene.
//!
//! Modpacks routinely ship client-side mods that crash a dedicated server
//! at startup. The filter here moves known client-only jars into a
//! quarantine directory next to `mods/` (never deleting them), keyed off a
//! compiled-in pattern list.

mod filter;
mod patterns;

pub use filter::{is_client_only, quarantine, QUARANTINE_DIR};
