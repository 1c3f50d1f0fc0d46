//! `.env` file parsing and write-back
//!
//! Handles comments, escaped `=` in keys, single/double quoting, and the
//! usual escape sequences. Writing back preserves untouched lines of the
//! original file so comments and ordering survive a restore.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use envault_core::SecretSet;

pub struct EnvFileParser;

impl EnvFileParser {
    pub fn parse_file(path: &Path) -> Result<SecretSet> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Self::parse_content(&content)
    }

    pub fn parse_content(content: &str) -> Result<SecretSet> {
        let mut vars = SecretSet::new();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(eq_pos) = Self::find_unescaped_equals(line) {
                let key = line[..eq_pos].trim();
                let value = line[eq_pos + 1..].trim();

                if key.is_empty() {
                    continue;
                }

                vars.insert(key, Self::unquote_value(value));
            }
        }

        Ok(vars)
    }

    fn find_unescaped_equals(s: &str) -> Option<usize> {
        let mut escaped = false;

        for (i, ch) in s.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }

            if ch == '\\' {
                escaped = true;
            } else if ch == '=' {
                return Some(i);
            }
        }

        None
    }

    fn unquote_value(value: &str) -> String {
        let value = value.trim();

        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            let inner = &value[1..value.len() - 1];
            Self::unescape_value(inner)
        } else {
            value.to_string()
        }
    }

    fn unescape_value(s: &str) -> String {
        let mut result = String::new();
        let mut chars = s.chars();

        while let Some(ch) = chars.next() {
            if ch == '\\' {
                if let Some(next) = chars.next() {
                    match next {
                        'n' => result.push('\n'),
                        't' => result.push('\t'),
                        'r' => result.push('\r'),
                        '\\' => result.push('\\'),
                        '"' => result.push('"'),
                        '\'' => result.push('\''),
                        _ => {
                            result.push('\\');
                            result.push(next);
                        }
                    }
                } else {
                    result.push('\\');
                }
            } else {
                result.push(ch);
            }
        }

        result
    }

    pub fn write_file(path: &Path, vars: &SecretSet, preserve_original: bool) -> Result<()> {
        let content = if preserve_original && path.exists() {
            let original = fs::read_to_string(path)?;
            Self::update_content(&original, vars)
        } else {
            Self::create_content(vars)
        };

        fs::write(path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        Ok(())
    }

    fn update_content(original: &str, vars: &SecretSet) -> String {
        let mut result = Vec::new();
        let mut processed_keys = std::collections::HashSet::new();

        for line in original.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                result.push(line.to_string());
                continue;
            }

            if let Some(eq_pos) = Self::find_unescaped_equals(trimmed) {
                let key = trimmed[..eq_pos].trim();

                if let Some(new_value) = vars.get(key) {
                    result.push(format!("{}={}", key, Self::quote_value(new_value)));
                    processed_keys.insert(key.to_string());
                } else {
                    result.push(line.to_string());
                }
            } else {
                result.push(line.to_string());
            }
        }

        for (key, value) in vars.iter() {
            if !processed_keys.contains(key) {
                result.push(format!("{}={}", key, Self::quote_value(value)));
            }
        }

        result.join("\n")
    }

    fn create_content(vars: &SecretSet) -> String {
        let lines: Vec<String> = vars
            .iter()
            .map(|(k, v)| format!("{}={}", k, Self::quote_value(v)))
            .collect();

        lines.join("\n")
    }

    fn quote_value(value: &str) -> String {
        if value.contains(' ')
            || value.contains('\n')
            || value.contains('\t')
            || value.contains('"')
            || value.contains('\'')
        {
            format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
        } else {
            value.to_string()
        }
    }
}
