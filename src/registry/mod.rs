// src/registry/mod.rs

//! Resource registry.
//!
//! Keeps the in-memory inventories of hash sets, dictionaries, rules and
//! masks (direct children of their configured directories) and the
//! algorithm catalog exposed by the external tool.
//!
//! Inventories are replaced wholesale: a scan builds the complete new
//! sequence first and only then publishes it, so readers always see the
//! result of one completed scan and a failed scan leaves the previous
//! inventory in place.

pub mod hashcat;
pub mod inventory;
pub mod resource_registry;
pub mod scan;

pub use hashcat::{parse_hash_modes, AlgorithmSource, Hashcat, HelpOutputSource, StaticAlgorithms};
pub use inventory::{fingerprint_algorithms, fingerprint_resources, Algorithm, Resource};
pub use resource_registry::ResourceRegistry;
pub use scan::{build_exclude_set, scan_directory};
