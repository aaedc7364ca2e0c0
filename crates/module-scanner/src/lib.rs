#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ModuleScannerError`)
//! - [`config`]: Scanner configuration (`ModuleScannerConfig`, builder)
//! - [`types`]: Domain types (`ModuleIdentity`, `CoordinateDocument`, `ResolvedCoordinate`, `Item`)
//! - [`archive`]: JAR access (`Archive` trait, `JarArchive`, ZIP index, manifest)
//! - [`module`]: Module identity resolution (`ModuleIdentityResolver`, name grammar, derivation)
//! - [`pom`]: Coordinate documents (`PomParser`, `CoordinateResolver`, parent loaders)
//! - [`known`]: Known module database (`KnownModules`)
//! - [`classify`]: Trust buckets (`Classifier`, `Classification`)
//! - [`summary`]: Scan aggregation and rendering (`Summary`, `ScanReport`)
//! - [`scanner`]: Main orchestrator (`ModuleScanner`, `ModuleScannerBuilder`)
//! - [`testing`]: JAR fixture builders for tests and benchmarks
//!
//! # Architecture
//!
//! ```text
//! ScanObject --> ArtifactRecord --> JarArchive --> ModuleIdentityResolver --> ModuleIdentity
//!                      |                                                            |
//!                      +--> pom.xml --> PomParser --> CoordinateResolver ----> ResolvedCoordinate
//!                                                          |                        |
//!                                                   DocumentLoader                 Item
//!                                                                                   |
//!                                                         KnownModules --> Classifier
//!                                                                                   |
//!                                                                               Summary
//! ```

pub mod archive;
pub mod classify;
pub mod config;
pub mod error;
pub mod known;
pub mod module;
pub mod pom;
pub mod scanner;
pub mod summary;
pub mod testing;
pub mod types;

// --- Public API Re-exports ---

// Scanner (main orchestrator)
pub use scanner::{
    ArtifactAnalyzer, ArtifactRecord, ModuleScanner, ModuleScannerBuilder, ScanObject,
    ScanOutcome, load_known_modules,
};

// Configuration
pub use config::{ModuleScannerConfig, ModuleScannerConfigBuilder};

// Error
pub use error::ModuleScannerError;

// Types
pub use types::{
    CoordinateDocument, Item, ModuleIdentity, ModuleSource, ParentReference, ResolvedCoordinate,
};

// Archive
pub use archive::{Archive, JarArchive};

// Module identity
pub use module::{ModuleIdentityResolver, Resolution, derive_from_file_name, is_valid_module_name};

// Coordinates
pub use pom::{
    CoordinateResolver, DocumentCache, DocumentLoader, NoParentLoader, PomParser, RepositoryLoader,
};

// Classification
pub use classify::{Classification, Classifier};
pub use known::KnownModules;
pub use summary::{ReportEntry, ScanErrorRecord, ScanReport, Summary, Suspicious};
