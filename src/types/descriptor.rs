//! Variable catalog: decoded descriptors and the name lookup map

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::layout::{Header, VAR_HEADER_SIZE, VarHeaderView};
use crate::types::VarType;
use crate::{Result, SdkError};

/// Owned, decoded form of one variable descriptor record.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDescriptor {
    /// Variable name as published by the simulator
    pub name: String,
    /// Data type of the variable
    pub var_type: VarType,
    /// Byte offset within any telemetry buffer
    pub offset: usize,
    /// Number of elements (1 for scalar, >1 for arrays)
    pub count: usize,
    /// Whether the simulator treats the sample count as elapsed time
    pub count_as_time: bool,
    /// Units of measurement (e.g. "m/s", "C", "N*m")
    pub unit: String,
    /// Human-readable description
    pub desc: String,
}

impl VarDescriptor {
    pub(crate) fn decode(view: &VarHeaderView<'_>) -> Result<Self> {
        let var_type = VarType::from_code(view.type_code()?)?;
        let offset = view.offset()?;
        let count = view.count()?;
        if offset < 0 || count < 0 {
            return Err(SdkError::parse_error(
                "Variable descriptor decoding",
                format!("Negative offset {} or count {}", offset, count),
            ));
        }
        Ok(Self {
            name: view.name()?,
            var_type,
            offset: offset as usize,
            count: count as usize,
            count_as_time: view.count_as_time()?,
            unit: view.unit()?,
            desc: view.desc()?,
        })
    }

    /// Total bytes this variable occupies in a telemetry buffer.
    pub fn byte_len(&self) -> usize {
        self.var_type.size() * self.count
    }
}

/// Ordered variable list plus the name lookup map.
///
/// Built once per attachment on first access and kept until shutdown; the
/// simulator does not renegotiate the variable set within a connection.
/// Duplicate names resolve last-write-wins (they do not occur in practice).
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    vars: Vec<VarDescriptor>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Enumerate the descriptor table described by `header`.
    pub fn build(region: &[u8], header: &Header<'_>) -> Result<Self> {
        let num_vars = usize::try_from(header.num_vars().max(0)).unwrap_or(0);
        let table_base = usize::try_from(header.var_header_offset().max(0)).unwrap_or(0);
        debug!(num_vars, table_base, "Building variable catalog");

        let mut vars = Vec::with_capacity(num_vars);
        let mut index = HashMap::with_capacity(num_vars);
        for i in 0..num_vars {
            let view = VarHeaderView::new(region, table_base + i * VAR_HEADER_SIZE)?;
            let descriptor = match VarDescriptor::decode(&view) {
                Ok(d) => d,
                Err(e) => {
                    warn!(error = %e, record = i, "Skipping undecodable variable descriptor");
                    continue;
                }
            };
            if descriptor.name.is_empty() {
                continue;
            }
            if index.contains_key(&descriptor.name) {
                warn!(name = %descriptor.name, "Duplicate variable name, keeping last");
            }
            index.insert(descriptor.name.clone(), vars.len());
            vars.push(descriptor);
        }

        debug!(decoded = vars.len(), "Variable catalog ready");
        Ok(Self { vars, index })
    }

    /// Descriptor lookup by name (O(1)).
    pub fn get(&self, name: &str) -> Option<&VarDescriptor> {
        self.index.get(name).map(|&i| &self.vars[i])
    }

    /// Whether a variable with `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of distinct variable names.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Variable names in descriptor-table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|v| v.name.as_str())
    }

    /// Descriptors in descriptor-table order.
    pub fn iter(&self) -> impl Iterator<Item = &VarDescriptor> {
        self.vars.iter()
    }

    /// Check every entry fits inside a telemetry buffer of `buf_len` bytes.
    pub fn validate(&self, buf_len: usize) -> Result<()> {
        for var in &self.vars {
            if var.offset + var.byte_len() > buf_len {
                return Err(SdkError::parse_error(
                    "Catalog validation",
                    format!(
                        "Variable '{}' extends to {} past buffer length {}",
                        var.name,
                        var.offset + var.byte_len(),
                        buf_len
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RegionBuilder, TestVar};

    fn sample_region() -> Vec<u8> {
        RegionBuilder::new()
            .var(TestVar::scalar("SessionNum", VarType::Int32))
            .var(TestVar::scalar("Speed", VarType::Float32).unit("m/s"))
            .var(TestVar::array("CarIdxLap", VarType::Int32, 4))
            .var(TestVar::scalar("OnPitRoad", VarType::Bool))
            .build()
    }

    #[test]
    fn catalog_has_one_entry_per_declared_variable() {
        let region = sample_region();
        let header = Header::new(&region).unwrap();
        let catalog = Catalog::build(&region, &header).unwrap();

        assert_eq!(catalog.len(), header.num_vars() as usize);
        assert!(catalog.contains("Speed"));
        assert!(catalog.contains("CarIdxLap"));
        assert!(!catalog.contains("NotAVariable"));
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["SessionNum", "Speed", "CarIdxLap", "OnPitRoad"]
        );
    }

    #[test]
    fn every_entry_fits_inside_the_buffer() {
        let region = sample_region();
        let header = Header::new(&region).unwrap();
        let catalog = Catalog::build(&region, &header).unwrap();
        let buf_len = header.buf_len() as usize;

        catalog.validate(buf_len).unwrap();
        for var in catalog.iter() {
            assert!(var.offset + var.byte_len() <= buf_len);
        }
    }

    #[test]
    fn duplicate_names_resolve_last_write_wins() {
        let region = RegionBuilder::new()
            .var(TestVar::scalar("Gear", VarType::Int32))
            .var(TestVar::scalar("Gear", VarType::Float32))
            .build();
        let header = Header::new(&region).unwrap();
        let catalog = Catalog::build(&region, &header).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Gear").unwrap().var_type, VarType::Float32);
        // the ordered list still carries both records
        assert_eq!(catalog.names().count(), 2);
    }

    #[test]
    fn array_descriptor_reports_count_and_byte_len() {
        let region = sample_region();
        let header = Header::new(&region).unwrap();
        let catalog = Catalog::build(&region, &header).unwrap();

        let laps = catalog.get("CarIdxLap").unwrap();
        assert_eq!(laps.count, 4);
        assert_eq!(laps.byte_len(), 16);
    }
}
