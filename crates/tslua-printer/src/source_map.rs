//! Source map v3 generation.

use serde::Serialize;

/// Base64 VLQ as used by the `mappings` field.
pub mod vlq {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    const SHIFT: u32 = 5;
    const MASK: i64 = (1 << SHIFT) - 1;
    const CONTINUATION: i64 = 1 << SHIFT;

    pub fn encode(value: i64) -> String {
        let mut rest = if value < 0 { ((-value) << 1) | 1 } else { value << 1 };
        let mut result = String::new();
        loop {
            let mut digit = rest & MASK;
            rest >>= SHIFT;
            if rest > 0 {
                digit |= CONTINUATION;
            }
            result.push(CHARS[digit as usize] as char);
            if rest == 0 {
                return result;
            }
        }
    }

    /// Decode one value, returning it and the number of bytes consumed.
    pub fn decode(input: &str) -> Option<(i64, usize)> {
        let mut result = 0i64;
        let mut shift = 0;
        for (consumed, byte) in input.bytes().enumerate() {
            let digit = CHARS.iter().position(|&c| c == byte)? as i64;
            result |= (digit & MASK) << shift;
            if digit & CONTINUATION == 0 {
                let value = if result & 1 == 1 { -(result >> 1) } else { result >> 1 };
                return Some((value, consumed + 1));
            }
            shift += SHIFT;
        }
        None
    }
}

/// One generated position mapped back to the source. All fields are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub original_line: u32,
    pub original_column: u32,
    pub name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap<'a> {
    version: u32,
    file: &'a str,
    sources: &'a [String],
    names: &'a [String],
    mappings: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources_content: Option<Vec<&'a str>>,
}

/// Collects mappings of one generated file against one source file.
#[derive(Debug, Clone, Default)]
pub struct SourceMapGenerator {
    file: String,
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    names: Vec<String>,
    mappings: Vec<(Mapping, u32)>,
}

impl SourceMapGenerator {
    pub fn new(file: String) -> Self {
        Self {
            file,
            ..Self::default()
        }
    }

    pub fn add_source(&mut self, source: String) -> u32 {
        self.sources.push(source);
        self.sources_content.push(None);
        (self.sources.len() - 1) as u32
    }

    pub fn add_source_with_content(&mut self, source: String, content: String) -> u32 {
        let index = self.add_source(source);
        self.sources_content[index as usize] = Some(content);
        index
    }

    pub fn add_name(&mut self, name: String) -> u32 {
        if let Some(index) = self.names.iter().position(|existing| *existing == name) {
            return index as u32;
        }
        self.names.push(name);
        (self.names.len() - 1) as u32
    }

    /// Mappings must arrive in generated order.
    pub fn add_mapping(&mut self, mapping: Mapping, source: u32) {
        self.mappings.push((mapping, source));
    }

    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter().map(|(mapping, _)| mapping)
    }

    fn encode_mappings(&mut self) -> String {
        let names: Vec<Option<String>> = self.mappings.iter().map(|(mapping, _)| mapping.name.clone()).collect();
        let named: Vec<Option<u32>> = names
            .into_iter()
            .map(|name| name.map(|name| self.add_name(name)))
            .collect();

        let mut result = String::new();
        let mut line = 0;
        let mut previous_column = 0i64;
        let mut previous_source = 0i64;
        let mut previous_original_line = 0i64;
        let mut previous_original_column = 0i64;
        let mut previous_name = 0i64;
        let mut first_on_line = true;

        for ((mapping, source), name) in self.mappings.iter().zip(named) {
            while line < mapping.generated_line {
                result.push(';');
                line += 1;
                previous_column = 0;
                first_on_line = true;
            }
            if !first_on_line {
                result.push(',');
            }
            first_on_line = false;

            result.push_str(&vlq::encode(mapping.generated_column as i64 - previous_column));
            previous_column = mapping.generated_column as i64;
            result.push_str(&vlq::encode(*source as i64 - previous_source));
            previous_source = *source as i64;
            result.push_str(&vlq::encode(mapping.original_line as i64 - previous_original_line));
            previous_original_line = mapping.original_line as i64;
            result.push_str(&vlq::encode(mapping.original_column as i64 - previous_original_column));
            previous_original_column = mapping.original_column as i64;
            if let Some(name) = name {
                result.push_str(&vlq::encode(name as i64 - previous_name));
                previous_name = name as i64;
            }
        }
        result
    }

    pub fn to_json(&mut self) -> Result<String, serde_json::Error> {
        let mappings = self.encode_mappings();
        let sources_content = self
            .sources_content
            .iter()
            .any(Option::is_some)
            .then(|| self.sources_content.iter().map(|content| content.as_deref().unwrap_or("")).collect());
        serde_json::to_string(&RawSourceMap {
            version: 3,
            file: &self.file,
            sources: &self.sources,
            names: &self.names,
            mappings,
            sources_content,
        })
    }
}

pub(crate) fn base64_encode(data: &[u8]) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut result = String::with_capacity(data.len().div_ceil(3) * 4);

    for chunk in data.chunks(3) {
        let mut buf = [0u8; 3];
        buf[..chunk.len()].copy_from_slice(chunk);

        result.push(CHARS[(buf[0] >> 2) as usize] as char);
        result.push(CHARS[(((buf[0] & 0x03) << 4) | (buf[1] >> 4)) as usize] as char);
        result.push(if chunk.len() > 1 {
            CHARS[(((buf[1] & 0x0f) << 2) | (buf[2] >> 6)) as usize] as char
        } else {
            '='
        });
        result.push(if chunk.len() > 2 {
            CHARS[(buf[2] & 0x3f) as usize] as char
        } else {
            '='
        });
    }

    result
}
