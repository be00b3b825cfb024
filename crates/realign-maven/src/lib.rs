//! Build descriptor collaborators: reading `pom.xml` files into the core
//! model, discovering the module tree, and loading override sources (BOMs
//! and service documents) into ready-made version maps.

pub mod bom;
pub mod pom;
pub mod reactor;
pub mod service;
