//! Limits and constraints for schema loading
//!
//! This module defines limits that bound the only blocking boundary of a run
//! (file reads) so pathological inputs fail fast: accidental symlink farms,
//! enormous schema trees, runaway include chains, deeply nested XML.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Global limits configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of schema files loaded in one run
    pub max_schema_files: usize,

    /// Maximum size of a single schema file in bytes
    pub max_schema_size: usize,

    /// Maximum total bytes read across all schema files
    pub max_total_size: usize,

    /// Maximum depth of import/include chains
    pub max_schema_depth: usize,

    /// Maximum XML element nesting depth inside one document
    pub max_xml_depth: usize,

    /// Maximum number of type declarations in the graph
    pub max_type_declarations: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_schema_files: 10_000,
            max_schema_size: 100 * 1024 * 1024, // 100 MB
            max_total_size: 1024 * 1024 * 1024, // 1 GB
            max_schema_depth: 100,
            max_xml_depth: 1000,
            max_type_declarations: 100_000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_schema_files: 500,
            max_schema_size: 10 * 1024 * 1024, // 10 MB
            max_total_size: 100 * 1024 * 1024, // 100 MB
            max_schema_depth: 20,
            max_xml_depth: 100,
            max_type_declarations: 10_000,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_schema_files: 1_000_000,
            max_schema_size: 1024 * 1024 * 1024, // 1 GB
            max_total_size: usize::MAX,
            max_schema_depth: 1000,
            max_xml_depth: 10_000,
            max_type_declarations: 10_000_000,
        }
    }

    /// Check if the number of loaded schema files is within limits
    pub fn check_schema_files(&self, count: usize) -> Result<()> {
        if count > self.max_schema_files {
            Err(Error::LimitExceeded(format!(
                "Schema file count {} exceeds maximum {}",
                count, self.max_schema_files
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a single schema file size is within limits
    pub fn check_schema_size(&self, size: usize) -> Result<()> {
        if size > self.max_schema_size {
            Err(Error::LimitExceeded(format!(
                "Schema size {} bytes exceeds maximum {} bytes",
                size, self.max_schema_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the total bytes read are within limits
    pub fn check_total_size(&self, size: usize) -> Result<()> {
        if size > self.max_total_size {
            Err(Error::LimitExceeded(format!(
                "Total schema size {} bytes exceeds maximum {} bytes",
                size, self.max_total_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if import/include depth is within limits
    pub fn check_schema_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_schema_depth {
            Err(Error::LimitExceeded(format!(
                "Schema depth {} exceeds maximum {}",
                depth, self.max_schema_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if XML depth is within limits
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_xml_depth {
            Err(Error::LimitExceeded(format!(
                "XML depth {} exceeds maximum {}",
                depth, self.max_xml_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of type declarations is within limits
    pub fn check_type_declarations(&self, count: usize) -> Result<()> {
        if count > self.max_type_declarations {
            Err(Error::LimitExceeded(format!(
                "Type declaration count {} exceeds maximum {}",
                count, self.max_type_declarations
            )))
        } else {
            Ok(())
        }
    }
}
