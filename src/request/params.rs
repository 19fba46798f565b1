//! Request URL parameter parsing
//!
//! The parser is a pure function of the URL, a [`ParameterTable`] and the
//! [`ServiceLayout`]; it never touches the network.

use std::collections::HashSet;

use regex::Regex;

use crate::config::{ParameterKind, ParameterRule};
use crate::error::{Error, RequestError, Result};
use crate::layout::{ServiceLayout, compile};
use crate::types::{RequestSpec, parse_timestamp};

/// Kinds every parameter table must declare as required
const CORE_KINDS: [ParameterKind; 4] = [
    ParameterKind::BeginTime,
    ParameterKind::EndTime,
    ParameterKind::Format,
    ParameterKind::RowLimit,
];

#[derive(Clone, Debug)]
struct CompiledRule {
    name: String,
    kind: ParameterKind,
    required: bool,
    pattern: Regex,
}

/// Immutable table of recognized request parameters and their format rules
#[derive(Clone, Debug)]
pub struct ParameterTable {
    rules: Vec<CompiledRule>,
}

impl ParameterTable {
    /// Compile a parameter table
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a pattern does not compile, a name is
    /// declared twice, or one of the begin/end/format/limit kinds is missing
    /// or not required.
    pub fn new(rules: &[ParameterRule]) -> Result<Self> {
        let mut names = HashSet::new();
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            if !names.insert(rule.name.as_str()) {
                return Err(Error::Config {
                    message: format!("parameter '{}' declared twice", rule.name),
                    key: Some("parameters".to_string()),
                });
            }
            compiled.push(CompiledRule {
                name: rule.name.clone(),
                kind: rule.kind,
                required: rule.required,
                pattern: compile(&format!("parameters.{}", rule.name), &rule.pattern)?,
            });
        }

        for kind in CORE_KINDS {
            if !compiled.iter().any(|r| r.kind == kind && r.required) {
                return Err(Error::Config {
                    message: format!("no required parameter of kind {:?}", kind),
                    key: Some("parameters".to_string()),
                });
            }
        }

        Ok(Self { rules: compiled })
    }

    fn rule(&self, name: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Names of the required parameters, in declaration order
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(|r| r.required)
            .map(|r| r.name.as_str())
    }
}

#[derive(Default)]
struct Collected<'a> {
    begin: Option<&'a str>,
    end: Option<&'a str>,
    format: Option<&'a str>,
    limit: Option<i64>,
    exec_dpa: Option<bool>,
    include_provenance: Option<bool>,
}

impl RequestSpec {
    /// Parse and syntactically validate an asynchronous request URL
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// delimiter split, `name=value` split, recognized name, value format,
    /// negative row limit, required parameters, time order, instrument.
    pub fn parse(
        url: &str,
        table: &ParameterTable,
        layout: &ServiceLayout,
    ) -> std::result::Result<Self, RequestError> {
        let mut parts = url.split('?');
        let query = match (parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(query), None) => query,
            _ => {
                return Err(RequestError::MalformedUrl {
                    url: url.to_string(),
                });
            }
        };

        let mut seen = HashSet::new();
        let mut values = Collected::default();

        for token in query.split('&') {
            let (name, value) = match token.split_once('=') {
                Some((name, value)) if !value.contains('=') => (name, value),
                _ => {
                    return Err(RequestError::MalformedParameter {
                        parameter: token.to_string(),
                    });
                }
            };

            let rule = table
                .rule(name)
                .ok_or_else(|| RequestError::UnknownParameter {
                    name: name.to_string(),
                })?;

            let invalid = || RequestError::InvalidParameterValue {
                name: name.to_string(),
                value: value.to_string(),
            };
            if !rule.pattern.is_match(value) {
                return Err(invalid());
            }

            match rule.kind {
                ParameterKind::BeginTime => values.begin = Some(value),
                ParameterKind::EndTime => values.end = Some(value),
                ParameterKind::Format => values.format = Some(value),
                ParameterKind::RowLimit => {
                    let limit: i64 = value.parse().map_err(|_| invalid())?;
                    if limit >= 0 {
                        return Err(RequestError::SynchronousRequestRejected { limit });
                    }
                    values.limit = Some(limit);
                }
                ParameterKind::ExecDpa => values.exec_dpa = Some(value == "true"),
                ParameterKind::IncludeProvenance => {
                    values.include_provenance = Some(value == "true")
                }
            }
            seen.insert(name);
        }

        if let Some(missing) = table.required().find(|name| !seen.contains(name)) {
            return Err(RequestError::MissingRequiredParameter {
                name: missing.to_string(),
            });
        }

        // the table guarantees every core kind is required, so these are set
        let (Some(begin_raw), Some(end_raw), Some(format), Some(limit)) =
            (values.begin, values.end, values.format, values.limit)
        else {
            return Err(RequestError::MissingRequiredParameter {
                name: table.required().next().unwrap_or_default().to_string(),
            });
        };

        let timestamp = |name: &str, raw: &str| {
            parse_timestamp(raw).ok_or_else(|| RequestError::InvalidParameterValue {
                name: name.to_string(),
                value: raw.to_string(),
            })
        };
        let begin = timestamp(table.name_of(ParameterKind::BeginTime), begin_raw)?;
        let end = timestamp(table.name_of(ParameterKind::EndTime), end_raw)?;
        if begin > end {
            return Err(RequestError::InvalidTimeOrder {
                begin: begin_raw.to_string(),
                end: end_raw.to_string(),
            });
        }

        let instrument = layout
            .instrument(url)
            .ok_or_else(|| RequestError::MissingInstrument {
                url: url.to_string(),
            })?;

        Ok(Self {
            url: url.to_string(),
            instrument,
            begin,
            end,
            begin_raw: begin_raw.to_string(),
            end_raw: end_raw.to_string(),
            format: format.to_string(),
            limit,
            exec_dpa: values.exec_dpa,
            include_provenance: values.include_provenance,
        })
    }
}

impl ParameterTable {
    fn name_of(&self, kind: ParameterKind) -> &str {
        self.rules
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| r.name.as_str())
            .unwrap_or_default()
    }
}
