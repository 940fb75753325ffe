//! Configuration and constants for the analyzer.

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Binary trace record layout (struct blk_io_trace)
pub const RECORD_HEADER_SIZE: usize = 48;
pub const TRACE_MAGIC: u32 = 0x6561_7400;
pub const TRACE_MAGIC_MASK: u32 = 0xffff_ff00;

/// Number of leading records dumped at debug level while decoding
pub const DEBUG_DUMP_RECORDS: usize = 5;

/// Default cap on the number of actions recorded per nugget
pub const DEFAULT_MAX_PATH_LEN: usize = 20;

/// Upper bound accepted for `--max-path-len`
pub const MAX_PATH_LEN_LIMIT: usize = 256;

/// Bytes per sector, used to compute a request's end sector
pub const SECTOR_SIZE: u64 = 512;

/// Aggregators each statistics family can hold
pub const REGISTRY_CAPACITY: usize = 8;

// CPU table grows in chunks; ids at or above MAX_CPU are ignored
pub const CPU_CHUNK: usize = 8;
pub const MAX_CPU: u32 = 128;

/// Path characters that keep a path out of the final report
/// (plug/pending, unplug, unknown action)
pub const EXCLUDED_PATH_MARKERS: &[char] = &['P', 'U', '?'];

/// Rows shown per table in the text report
pub const DEFAULT_SUMMARY_ROWS: usize = 20;
