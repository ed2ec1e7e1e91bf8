//! Synthetic region builders for tests
//!
//! Real telemetry regions come from the simulator; these builders
//! assemble byte-for-byte compatible stand-ins (header, descriptor table,
//! rotating buffers, session document) so the full client can be
//! exercised cross-platform through the test-file attachment path.

#![doc(hidden)]

use crate::layout::{
    DISK_SUB_HEADER_OFFSET, VAR_BUF_ENTRY_SIZE, VAR_BUF_TABLE_OFFSET, VAR_HEADER_SIZE,
};
use crate::types::{Value, VarType};

/// One variable declaration for a synthetic region.
#[derive(Debug, Clone)]
pub struct TestVar {
    name: String,
    var_type: VarType,
    count: usize,
    unit: String,
    desc: String,
    count_as_time: bool,
    /// One value per rotating buffer; buffers without an entry stay zeroed.
    per_buffer: Vec<Value>,
}

impl TestVar {
    pub fn scalar(name: &str, var_type: VarType) -> Self {
        Self {
            name: name.to_string(),
            var_type,
            count: 1,
            unit: String::new(),
            desc: String::new(),
            count_as_time: false,
            per_buffer: Vec::new(),
        }
    }

    pub fn array(name: &str, var_type: VarType, count: usize) -> Self {
        Self { count, ..Self::scalar(name, var_type) }
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    pub fn desc(mut self, desc: &str) -> Self {
        self.desc = desc.to_string();
        self
    }

    pub fn count_as_time(mut self) -> Self {
        self.count_as_time = true;
        self
    }

    /// Same value in every rotating buffer.
    pub fn value(mut self, value: Value) -> Self {
        self.per_buffer = vec![value];
        self
    }

    /// One value per rotating buffer, in slot order.
    pub fn per_buffer(mut self, values: Vec<Value>) -> Self {
        self.per_buffer = values;
        self
    }

    fn value_for_buffer(&self, slot: usize) -> Option<&Value> {
        match self.per_buffer.len() {
            0 => None,
            1 => self.per_buffer.first(),
            _ => self.per_buffer.get(slot),
        }
    }

    fn byte_len(&self) -> usize {
        self.var_type.size() * self.count
    }
}

/// Encode one test value at the variable's wire width.
fn encode_value(value: &Value, var_type: VarType, count: usize) -> Vec<u8> {
    fn scalar_bytes(value: &Value, var_type: VarType) -> Vec<u8> {
        match (value, var_type) {
            (Value::Char(v), VarType::Char) => vec![*v],
            (Value::Bool(v), VarType::Bool) => vec![u8::from(*v)],
            (Value::Int32(v), VarType::Int32) => v.to_le_bytes().to_vec(),
            (Value::UInt32(v), VarType::UInt32) => v.to_le_bytes().to_vec(),
            (Value::Float32(v), VarType::Float32) => v.to_le_bytes().to_vec(),
            (Value::Float64(v), VarType::Float64) => v.to_le_bytes().to_vec(),
            (value, var_type) => {
                panic!("Test value {:?} does not match declared type {:?}", value, var_type)
            }
        }
    }

    match value {
        Value::Array(elements) => {
            assert_eq!(elements.len(), count, "array value length must match declared count");
            elements.iter().flat_map(|e| scalar_bytes(e, var_type)).collect()
        }
        scalar => {
            assert_eq!(count, 1, "scalar value for array variable");
            scalar_bytes(scalar, var_type)
        }
    }
}

/// Builder for a complete in-memory telemetry region.
#[derive(Debug, Clone)]
pub struct RegionBuilder {
    version: i32,
    status: i32,
    tick_rate: i32,
    session_info_update: i32,
    session_doc: Option<String>,
    tick_counts: Vec<i32>,
    vars: Vec<TestVar>,
}

impl Default for RegionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionBuilder {
    pub fn new() -> Self {
        Self {
            version: 2,
            status: 1,
            tick_rate: 60,
            session_info_update: 0,
            session_doc: None,
            tick_counts: vec![100],
            vars: Vec::new(),
        }
    }

    pub fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn status(mut self, status: i32) -> Self {
        self.status = status;
        self
    }

    pub fn tick_rate(mut self, tick_rate: i32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn session_info_update(mut self, update: i32) -> Self {
        self.session_info_update = update;
        self
    }

    /// Embed a session document. A trailing NUL run is appended, as the
    /// simulator leaves slack at the end of the metadata window.
    pub fn session_info(mut self, doc: &str) -> Self {
        self.session_doc = Some(doc.to_string());
        self
    }

    /// Rotating-buffer tick counts, one per slot (sets `num_buf`).
    pub fn tick_counts(mut self, ticks: &[i32]) -> Self {
        self.tick_counts = ticks.to_vec();
        self
    }

    pub fn var(mut self, var: TestVar) -> Self {
        self.vars.push(var);
        self
    }

    /// Frame length implied by the declared variables.
    pub fn buf_len(&self) -> usize {
        self.vars.iter().map(TestVar::byte_len).sum()
    }

    pub fn build(&self) -> Vec<u8> {
        let num_buf = self.tick_counts.len();
        let var_table_offset = (VAR_BUF_TABLE_OFFSET + num_buf * VAR_BUF_ENTRY_SIZE).max(144);
        let session_bytes = self
            .session_doc
            .as_ref()
            .map(|doc| {
                let mut bytes = doc.clone().into_bytes();
                bytes.extend_from_slice(&[0u8; 16]);
                bytes
            })
            .unwrap_or_default();
        let session_offset = var_table_offset + self.vars.len() * VAR_HEADER_SIZE;
        let buf_len = self.buf_len();
        let buffers_offset = session_offset + session_bytes.len();
        let total = buffers_offset + num_buf * buf_len.max(1);

        let mut region = vec![0u8; total];
        let write_i32 = |region: &mut [u8], offset: usize, value: i32| {
            region[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        };

        write_i32(&mut region, 0, self.version);
        write_i32(&mut region, 4, self.status);
        write_i32(&mut region, 8, self.tick_rate);
        write_i32(&mut region, 12, self.session_info_update);
        write_i32(&mut region, 16, session_bytes.len() as i32);
        write_i32(&mut region, 20, if session_bytes.is_empty() { 0 } else { session_offset as i32 });
        write_i32(&mut region, 24, self.vars.len() as i32);
        write_i32(&mut region, 28, var_table_offset as i32);
        write_i32(&mut region, 32, num_buf as i32);
        write_i32(&mut region, 36, buf_len as i32);

        for (slot, &tick) in self.tick_counts.iter().enumerate() {
            let base = VAR_BUF_TABLE_OFFSET + slot * VAR_BUF_ENTRY_SIZE;
            write_i32(&mut region, base, tick);
            write_i32(&mut region, base + 4, (buffers_offset + slot * buf_len) as i32);
        }

        let mut var_offset = 0usize;
        for (i, var) in self.vars.iter().enumerate() {
            let base = var_table_offset + i * VAR_HEADER_SIZE;
            write_i32(&mut region, base, var.var_type.code());
            write_i32(&mut region, base + 4, var_offset as i32);
            write_i32(&mut region, base + 8, var.count as i32);
            region[base + 12] = u8::from(var.count_as_time);
            write_fixed(&mut region, base + 16, 32, &var.name);
            write_fixed(&mut region, base + 48, 64, &var.desc);
            write_fixed(&mut region, base + 112, 32, &var.unit);

            for slot in 0..num_buf {
                if let Some(value) = var.value_for_buffer(slot) {
                    let bytes = encode_value(value, var.var_type, var.count);
                    let at = buffers_offset + slot * buf_len + var_offset;
                    region[at..at + bytes.len()].copy_from_slice(&bytes);
                }
            }
            var_offset += var.byte_len();
        }

        region[session_offset..session_offset + session_bytes.len()]
            .copy_from_slice(&session_bytes);

        region
    }

    /// Write the region to a temp file and return its guard.
    #[cfg(test)]
    pub fn build_file(&self) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().expect("create fixture file");
        std::fs::write(file.path(), self.build()).expect("write fixture file");
        file
    }
}

/// Builder for a recorded telemetry file (disk layout).
#[derive(Debug, Clone)]
pub struct IbtBuilder {
    session_doc: Option<String>,
    vars: Vec<TestVar>,
    records: Vec<Vec<Value>>,
    start_date: u64,
    start_time: f64,
    end_time: f64,
    lap_count: i32,
}

impl Default for IbtBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IbtBuilder {
    pub fn new() -> Self {
        Self {
            session_doc: None,
            vars: Vec::new(),
            records: Vec::new(),
            start_date: 1_700_000_000,
            start_time: 0.0,
            end_time: 0.0,
            lap_count: 0,
        }
    }

    pub fn session_info(mut self, doc: &str) -> Self {
        self.session_doc = Some(doc.to_string());
        self
    }

    pub fn var(mut self, var: TestVar) -> Self {
        self.vars.push(var);
        self
    }

    pub fn lap_count(mut self, laps: i32) -> Self {
        self.lap_count = laps;
        self
    }

    /// Append one record; values in variable declaration order.
    pub fn record(mut self, values: Vec<Value>) -> Self {
        assert_eq!(values.len(), self.vars.len(), "one value per declared variable");
        self.records.push(values);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let var_table_offset = 144usize;
        let session_bytes =
            self.session_doc.as_ref().map(|d| d.clone().into_bytes()).unwrap_or_default();
        let session_offset = var_table_offset + self.vars.len() * VAR_HEADER_SIZE;
        let buf_len: usize = self.vars.iter().map(TestVar::byte_len).sum();
        let records_offset = session_offset + session_bytes.len();
        let total = records_offset + self.records.len() * buf_len;

        let mut region = vec![0u8; total];
        let write_i32 = |region: &mut [u8], offset: usize, value: i32| {
            region[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        };

        write_i32(&mut region, 0, 2); // version
        write_i32(&mut region, 4, 0); // status: recording, not live
        write_i32(&mut region, 8, 60);
        write_i32(&mut region, 16, session_bytes.len() as i32);
        write_i32(&mut region, 20, if session_bytes.is_empty() { 0 } else { session_offset as i32 });
        write_i32(&mut region, 24, self.vars.len() as i32);
        write_i32(&mut region, 28, var_table_offset as i32);
        write_i32(&mut region, 32, 1);
        write_i32(&mut region, 36, buf_len as i32);
        // var_buf[0]: tick of the descriptor snapshot plus the records base
        write_i32(&mut region, VAR_BUF_TABLE_OFFSET, 0);
        write_i32(&mut region, VAR_BUF_TABLE_OFFSET + 4, records_offset as i32);

        let disk = DISK_SUB_HEADER_OFFSET;
        region[disk..disk + 8].copy_from_slice(&self.start_date.to_le_bytes());
        region[disk + 8..disk + 16].copy_from_slice(&self.start_time.to_le_bytes());
        region[disk + 16..disk + 24].copy_from_slice(&self.end_time.to_le_bytes());
        write_i32(&mut region, disk + 24, self.lap_count);
        write_i32(&mut region, disk + 28, self.records.len() as i32);

        let mut var_offset = 0usize;
        for (i, var) in self.vars.iter().enumerate() {
            let base = var_table_offset + i * VAR_HEADER_SIZE;
            write_i32(&mut region, base, var.var_type.code());
            write_i32(&mut region, base + 4, var_offset as i32);
            write_i32(&mut region, base + 8, var.count as i32);
            region[base + 12] = u8::from(var.count_as_time);
            write_fixed(&mut region, base + 16, 32, &var.name);
            write_fixed(&mut region, base + 48, 64, &var.desc);
            write_fixed(&mut region, base + 112, 32, &var.unit);

            for (record, values) in self.records.iter().enumerate() {
                let bytes = encode_value(&values[i], var.var_type, var.count);
                let at = records_offset + record * buf_len + var_offset;
                region[at..at + bytes.len()].copy_from_slice(&bytes);
            }
            var_offset += var.byte_len();
        }

        region[session_offset..session_offset + session_bytes.len()]
            .copy_from_slice(&session_bytes);

        region
    }

    #[cfg(test)]
    pub fn build_file(&self) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().expect("create fixture file");
        std::fs::write(file.path(), self.build()).expect("write fixture file");
        file
    }
}

fn write_fixed(region: &mut [u8], offset: usize, width: usize, text: &str) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(width - 1);
    region[offset..offset + len].copy_from_slice(&bytes[..len]);
}
