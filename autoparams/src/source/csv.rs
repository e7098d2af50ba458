//! CSV rows, from explicit records or a text block.

use tracing::debug;

use crate::descriptor::{
    AttributeDecl, AttributeDefault, AttributeKind, AttributeValue, DescriptorAdapter,
    DescriptorInterface, ValueDescriptor, trim_indent,
};
use crate::error::ResolutionError;
use crate::runner::TestSignature;
use crate::source::{ArgumentsProvider, Asset, AssetRow};

/// Attributes of a CSV source declaration
pub static CSV_SOURCE: DescriptorInterface = DescriptorInterface::new(
    "CsvSource",
    &[
        AttributeDecl::with_default("value", AttributeKind::Strings, AttributeDefault::Empty),
        AttributeDecl::with_default("text_block", AttributeKind::Str, AttributeDefault::Empty),
        AttributeDecl::with_default(
            "use_headers_in_display_name",
            AttributeKind::Bool,
            AttributeDefault::Bool(false),
        ),
        AttributeDecl::with_default(
            "quote_character",
            AttributeKind::Char,
            AttributeDefault::Char('\''),
        ),
        AttributeDecl::with_default("delimiter", AttributeKind::Char, AttributeDefault::Char('\0')),
        AttributeDecl::with_default(
            "delimiter_string",
            AttributeKind::Str,
            AttributeDefault::Empty,
        ),
        AttributeDecl::with_default("empty_value", AttributeKind::Str, AttributeDefault::Empty),
        AttributeDecl::with_default("null_values", AttributeKind::Strings, AttributeDefault::Empty),
        AttributeDecl::with_default(
            "max_chars_per_column",
            AttributeKind::Int,
            AttributeDefault::Int(4096),
        ),
        AttributeDecl::with_default(
            "ignore_leading_and_trailing_whitespace",
            AttributeKind::Bool,
            AttributeDefault::Bool(true),
        ),
    ],
);

enum Field {
    Quoted(String),
    Unquoted(String),
}

/// Reads rows from a CSV source declaration
#[derive(Debug, Clone)]
pub struct CsvArgumentsProvider {
    records: Vec<String>,
    use_headers: bool,
    quote: char,
    delimiter: String,
    empty_value: String,
    null_values: Vec<String>,
    max_chars: Option<usize>,
    trim: bool,
}

impl CsvArgumentsProvider {
    /// Read and validate the settings of a CSV declaration
    pub fn accept(descriptor: &DescriptorAdapter) -> Result<Self, ResolutionError> {
        descriptor.expect_interface(&CSV_SOURCE)?;

        let value: Vec<String> = descriptor.value("value")?;
        let text_block: String = descriptor.value("text_block")?;
        let records = match (value.is_empty(), text_block.is_empty()) {
            (false, true) => value,
            (true, false) => text_block
                .lines()
                .filter(|line| {
                    let line = line.trim();
                    !line.is_empty() && !line.starts_with('#')
                })
                .map(str::to_string)
                .collect(),
            _ => {
                return Err(ResolutionError::source_error(
                    "either value or text_block must be declared, but not both",
                ));
            }
        };

        let delimiter_char: char = descriptor.value("delimiter")?;
        let delimiter_string: String = descriptor.value("delimiter_string")?;
        let delimiter = match (delimiter_char, delimiter_string.is_empty()) {
            ('\0', true) => ",".to_string(),
            ('\0', false) => delimiter_string,
            (c, true) => c.to_string(),
            (_, false) => {
                return Err(ResolutionError::source_error(
                    "the delimiter and delimiter_string attributes cannot be set simultaneously",
                ));
            }
        };

        let max_chars = match descriptor.value::<i32>("max_chars_per_column")? {
            -1 => None,
            limit if limit > 0 => Some(limit as usize),
            limit => {
                return Err(ResolutionError::source_error(format!(
                    "max_chars_per_column must be a positive number or -1, got {}",
                    limit
                )));
            }
        };

        Ok(Self {
            records,
            use_headers: descriptor.value("use_headers_in_display_name")?,
            quote: descriptor.value("quote_character")?,
            delimiter,
            empty_value: descriptor.value("empty_value")?,
            null_values: descriptor.value("null_values")?,
            max_chars,
            trim: descriptor.value("ignore_leading_and_trailing_whitespace")?,
        })
    }

    /// Split one record into assets
    pub fn parse_record(&self, record: &str) -> Result<Vec<Asset>, ResolutionError> {
        self.split(record)?
            .into_iter()
            .map(|field| self.to_asset(field))
            .collect()
    }

    fn split(&self, record: &str) -> Result<Vec<Field>, ResolutionError> {
        let chars: Vec<char> = record.chars().collect();
        let delimiter: Vec<char> = self.delimiter.chars().collect();
        let at_delimiter = |index: usize| chars[index..].starts_with(&delimiter);

        let mut fields = Vec::new();
        let mut index = 0;
        loop {
            let mut start = index;
            while start < chars.len() && chars[start].is_whitespace() && !at_delimiter(start) {
                start += 1;
            }

            let field = if start < chars.len() && chars[start] == self.quote {
                let mut text = String::new();
                let mut cursor = start + 1;
                loop {
                    match chars.get(cursor) {
                        None => {
                            return Err(ResolutionError::source_error(format!(
                                "unterminated quoted value in record '{}'",
                                record
                            )));
                        }
                        Some(&c) if c == self.quote => {
                            if chars.get(cursor + 1) == Some(&self.quote) {
                                text.push(c);
                                cursor += 2;
                            } else {
                                cursor += 1;
                                break;
                            }
                        }
                        Some(&c) => {
                            text.push(c);
                            cursor += 1;
                        }
                    }
                }
                while cursor < chars.len()
                    && chars[cursor].is_whitespace()
                    && !at_delimiter(cursor)
                {
                    cursor += 1;
                }
                if cursor < chars.len() && !at_delimiter(cursor) {
                    return Err(ResolutionError::source_error(format!(
                        "unexpected character '{}' after quoted value in record '{}'",
                        chars[cursor], record
                    )));
                }
                index = cursor;
                Field::Quoted(text)
            } else {
                let mut cursor = index;
                while cursor < chars.len() && !at_delimiter(cursor) {
                    cursor += 1;
                }
                let raw: String = chars[index..cursor].iter().collect();
                index = cursor;
                Field::Unquoted(raw)
            };
            fields.push(field);

            if index < chars.len() {
                index += delimiter.len();
            } else {
                break;
            }
        }
        Ok(fields)
    }

    fn to_asset(&self, field: Field) -> Result<Asset, ResolutionError> {
        let text = match field {
            Field::Quoted(text) if text.is_empty() => self.empty_value.clone(),
            Field::Quoted(text) => text,
            Field::Unquoted(raw) => {
                let text = if self.trim { raw.trim().to_string() } else { raw };
                if text.is_empty() {
                    return Ok(Asset::Null);
                }
                text
            }
        };

        if let Some(limit) = self.max_chars {
            let length = text.chars().count();
            if length > limit {
                return Err(ResolutionError::source_error(format!(
                    "column value of {} characters exceeds max_chars_per_column of {}",
                    length, limit
                )));
            }
        }

        if self.null_values.contains(&text) {
            Ok(Asset::Null)
        } else {
            Ok(Asset::Text(text))
        }
    }
}

impl ArgumentsProvider for CsvArgumentsProvider {
    fn provide_rows(&self, signature: &TestSignature) -> Result<Vec<AssetRow>, ResolutionError> {
        let mut records = self.records.iter();
        let headers = if self.use_headers {
            match records.next() {
                Some(record) => Some(self.parse_record(record)?),
                None => {
                    return Err(ResolutionError::source_error(
                        "use_headers_in_display_name requires a header record",
                    ));
                }
            }
        } else {
            None
        };

        let rows = records
            .map(|record| {
                let assets = self.parse_record(record)?;
                let row = match &headers {
                    Some(headers) => {
                        let name = headers
                            .iter()
                            .zip(&assets)
                            .map(|(header, asset)| format!("{} = {}", header, asset))
                            .collect::<Vec<_>>()
                            .join(", ");
                        AssetRow::new(assets).named(name)
                    }
                    None => AssetRow::new(assets),
                };
                Ok(row)
            })
            .collect::<Result<Vec<_>, ResolutionError>>()?;

        debug!(test = signature.name(), rows = rows.len(), "parsed csv rows");
        Ok(rows)
    }
}

/// Native CSV declaration.
///
/// Unset options take the defaults of [`CSV_SOURCE`]; the text block is
/// stripped of its common indentation before it is handed over.
#[derive(Debug, Clone, Default)]
pub struct CsvAutoSource {
    value: Vec<String>,
    text_block: Option<String>,
    use_headers_in_display_name: Option<bool>,
    quote_character: Option<char>,
    delimiter: Option<char>,
    delimiter_string: Option<String>,
    empty_value: Option<String>,
    null_values: Vec<String>,
    max_chars_per_column: Option<i32>,
    ignore_leading_and_trailing_whitespace: Option<bool>,
}

impl CsvAutoSource {
    /// Declaration with explicit records
    pub fn new<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value: records.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Declaration with a multi-line text block
    pub fn text_block(text: impl Into<String>) -> Self {
        Self {
            text_block: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn use_headers_in_display_name(mut self, enabled: bool) -> Self {
        self.use_headers_in_display_name = Some(enabled);
        self
    }

    pub fn quote_character(mut self, quote: char) -> Self {
        self.quote_character = Some(quote);
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn delimiter_string(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter_string = Some(delimiter.into());
        self
    }

    pub fn empty_value(mut self, value: impl Into<String>) -> Self {
        self.empty_value = Some(value.into());
        self
    }

    pub fn null_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_chars_per_column(mut self, limit: i32) -> Self {
        self.max_chars_per_column = Some(limit);
        self
    }

    pub fn ignore_leading_and_trailing_whitespace(mut self, enabled: bool) -> Self {
        self.ignore_leading_and_trailing_whitespace = Some(enabled);
        self
    }

    /// The attribute values this declaration supplies
    pub fn descriptor(&self) -> ValueDescriptor {
        let mut descriptor = ValueDescriptor::new();
        if !self.value.is_empty() {
            descriptor = descriptor.with("value", self.value.clone());
        }
        if let Some(text) = &self.text_block {
            descriptor = descriptor.with("text_block", trim_indent(text));
        }
        if let Some(enabled) = self.use_headers_in_display_name {
            descriptor = descriptor.with("use_headers_in_display_name", enabled);
        }
        if let Some(quote) = self.quote_character {
            descriptor = descriptor.with("quote_character", quote);
        }
        if let Some(delimiter) = self.delimiter {
            descriptor = descriptor.with("delimiter", delimiter);
        }
        if let Some(delimiter) = &self.delimiter_string {
            descriptor = descriptor.with("delimiter_string", delimiter.as_str());
        }
        if let Some(value) = &self.empty_value {
            descriptor = descriptor.with("empty_value", value.as_str());
        }
        if !self.null_values.is_empty() {
            descriptor = descriptor.with(
                "null_values",
                AttributeValue::Strings(self.null_values.clone()),
            );
        }
        if let Some(limit) = self.max_chars_per_column {
            descriptor = descriptor.with("max_chars_per_column", limit);
        }
        if let Some(enabled) = self.ignore_leading_and_trailing_whitespace {
            descriptor = descriptor.with("ignore_leading_and_trailing_whitespace", enabled);
        }
        descriptor
    }

    /// This declaration seen through the base CSV interface
    pub fn adapter(&self) -> Result<DescriptorAdapter, ResolutionError> {
        Ok(DescriptorAdapter::create(&CSV_SOURCE, self.descriptor())?)
    }

    pub fn provider(&self) -> Result<CsvArgumentsProvider, ResolutionError> {
        CsvArgumentsProvider::accept(&self.adapter()?)
    }
}
