#![doc = "blogsync-core: core logic library for blogsync."]

//! This crate holds everything that decides *what* gets pushed from a Hugo
//! site to DEV: the Markdown rewrites, the per-post reconciliation rules and
//! the synchronisation loop. It talks to the outside world only through the
//! traits in [`contract`], so the CLI crate supplies the real HTTP client and
//! tests supply mocks.
//!
//! # Modules
//! - [`transform`]: shortcode and image rewrites
//! - [`anchor`]: heading slug remapping between Hugo and DEV
//! - [`reconcile`]: per-post decision engine and document composition
//! - [`synchronise`]: fetch, match, push with rate-limit retry
//! - [`content`]: the Hugo content source
//! - [`front_matter`]: typed front matter access and write-back

pub mod anchor;
pub mod content;
pub mod contract;
pub mod diff;
pub mod error;
pub mod front_matter;
pub mod reconcile;
pub mod synchronise;
pub mod transform;
