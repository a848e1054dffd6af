//! # Shareable Links
//!
//! Compact text form of a world's parameters:
//!
//! ```text
//! v2:12345:50,50,50,50,50,50,50,50,50,50
//! ```
//!
//! Decoding never fails. Missing pieces take defaults, vars are clamped,
//! an unknown version decodes as the current one, and a seed that is not
//! an integer is hashed into one, so any text a visitor pastes opens some
//! world.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::key::{GenerationKey, MacroVars, MappingVersion, RegionCoord};
use crate::mixer::{hash_values, HashPart};

/// Separator between link fields.
pub const FIELD_SEPARATOR: char = ':';

/// Separator between macro vars.
pub const VAR_SEPARATOR: char = ',';

/// Decoded world parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShareLink {
    /// Mapping version.
    pub mapping: MappingVersion,
    /// World seed.
    pub seed: i64,
    /// Macro vars.
    pub vars: MacroVars,
}

impl Default for ShareLink {
    fn default() -> Self {
        Self {
            mapping: MappingVersion::CURRENT,
            seed: 0,
            vars: MacroVars::default(),
        }
    }
}

impl ShareLink {
    /// Creates a link.
    #[must_use]
    pub const fn new(mapping: MappingVersion, seed: i64, vars: MacroVars) -> Self {
        Self { mapping, seed, vars }
    }

    /// The parameters of a key. The region is not part of a link.
    #[must_use]
    pub const fn from_key(key: &GenerationKey) -> Self {
        Self::new(key.mapping(), key.seed(), *key.vars())
    }

    /// Key for these parameters at `region`.
    #[must_use]
    pub const fn key_at(&self, region: RegionCoord) -> GenerationKey {
        GenerationKey::with_mapping(region, self.seed, self.vars, self.mapping)
    }

    /// Text form.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parses any text into a link.
    #[must_use]
    pub fn decode(text: &str) -> Self {
        Self::decode_or(text, MappingVersion::CURRENT)
    }

    /// Parses any text into a link, using `default_mapping` when the text
    /// names no version or an unknown one.
    #[must_use]
    pub fn decode_or(text: &str, default_mapping: MappingVersion) -> Self {
        let fields: Vec<&str> = text.trim().splitn(3, FIELD_SEPARATOR).collect();
        let version_field = fields.first().and_then(|f| parse_version(f));

        let (mapping, rest) = match version_field {
            Some(version) => (version.unwrap_or(default_mapping), &fields[1..]),
            None if fields.len() == 3 => (default_mapping, &fields[1..]),
            None => (default_mapping, &fields[..]),
        };

        let seed = rest.first().map_or(0, |s| parse_seed(s));
        let vars = rest.get(1).map_or_else(MacroVars::default, |v| parse_vars(v));

        Self { mapping, seed, vars }
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}", self.mapping, self.seed)?;
        for (i, value) in self.vars.values().iter().enumerate() {
            if i > 0 {
                write!(f, "{VAR_SEPARATOR}")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl FromStr for ShareLink {
    type Err = Infallible;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(Self::decode(text))
    }
}

/// `None` if the field is not a version at all, `Some(None)` for a
/// well-formed but unknown tag, which still occupies the version field.
fn parse_version(field: &str) -> Option<Option<MappingVersion>> {
    let field = field.trim();
    let digits = field.strip_prefix(['v', 'V'])?;
    let tag: u8 = digits.parse().ok()?;
    Some(MappingVersion::from_tag(tag))
}

fn parse_seed(field: &str) -> i64 {
    let field = field.trim();
    if field.is_empty() {
        return 0;
    }
    field
        .parse::<i64>()
        .unwrap_or_else(|_| i64::from(hash_values(&[HashPart::Str(field)])))
}

fn parse_vars(field: &str) -> MacroVars {
    let values: Vec<f64> = field
        .split(VAR_SEPARATOR)
        .map(|v| v.trim().parse::<f64>().unwrap_or(f64::NAN))
        .collect();
    MacroVars::from_floats(&values)
}
