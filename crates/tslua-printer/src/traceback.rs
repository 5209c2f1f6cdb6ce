//! Generated-line to source-line table for `__TS__SourceMapTraceBack`.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::source_map::Mapping;

/// Placeholder line the printer leaves for the table.
pub const TRACEBACK_PLACEHOLDER: &str = "{#SourceMapTraceback}";

/// Smallest original line mapped from each generated line, both 1-based.
pub fn traceback_table(mappings: &[Mapping]) -> BTreeMap<u32, u32> {
    let mut table = BTreeMap::new();
    for mapping in mappings {
        let line = mapping.original_line + 1;
        table
            .entry(mapping.generated_line + 1)
            .and_modify(|existing: &mut u32| *existing = (*existing).min(line))
            .or_insert(line);
    }
    table
}

/// `__TS__SourceMapTraceBack(debug.getinfo(1).short_src, {["1"] = 1, ...});`
pub fn traceback_call(table: &BTreeMap<u32, u32>) -> String {
    let mut entries = String::new();
    for (index, (generated, original)) in table.iter().enumerate() {
        if index > 0 {
            entries.push_str(", ");
        }
        let _ = write!(entries, "[\"{}\"] = {}", generated, original);
    }
    format!(
        "__TS__SourceMapTraceBack(debug.getinfo(1).short_src, {{{}}});",
        entries
    )
}
