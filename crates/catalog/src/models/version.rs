//! Library version ordering.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A library version as published in the catalog.
///
/// cdnjs versions are *mostly* semver, but not reliably: two-component
/// versions (`1.2`), leading `v`s and suffixes glued to the patch number
/// (`1.0.0rc1`) all show up. Parsing therefore never fails:
///
/// - A leading `v`/`V` is ignored and a one- or two-component core is padded
///   with zeros, then the text is parsed with [`semver`].
/// - Text that still isn't semver (`1.0.0rc1`, `1.2.3.4`, `1..2`) is split
///   loosely: the numeric part ends at the first character that is neither a
///   digit nor a dot, empty components count as `0`, and whatever follows is
///   the pre-release suffix (minus one leading `-`), up to any `+`.
///
/// Numeric parts compare component by component, missing trailing components
/// counting as `0` (`1.2` == `1.2.0`). When they are equal, a version
/// *without* a pre-release suffix is the greater one and two suffixes compare
/// lexicographically as plain strings, so `rc.10` sorts below `rc.9`. Build
/// metadata after `+` is kept in the raw text but never affects ordering:
/// `1.0.0+build` == `1.0.0`, and `1.0.0+beta` is a release while
/// `1.0.0-beta` is not.
///
/// ```
/// use lcdnjs_catalog::models::LibraryVersion;
///
/// let v = |s: &str| s.parse::<LibraryVersion>().unwrap();
/// assert!(v("9.0.0") < v("10.0.0"));
/// assert!(v("1.0.0-beta") < v("1.0.0"));
/// assert!(v("1.0.0-alpha") < v("1.0.0-beta"));
/// assert_eq!(v("1.2"), v("1.2.0"));
/// assert_eq!(v("1.0.0+build.5"), v("1.0.0"));
/// ```
#[derive(Debug, Clone)]
pub struct LibraryVersion {
    raw: String,
    numbers: Vec<u64>,
    pre: String,
}
impl LibraryVersion {
    /// The version text exactly as it appeared in the catalog.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
        let (numbers, pre) = match semver::Version::parse(&pad(body)) {
            Ok(version) => (vec![version.major, version.minor, version.patch], version.pre.as_str().to_string()),
            Err(_) => loose(body),
        };
        Self { raw: raw.to_string(), numbers, pre }
    }

    fn component(&self, index: usize) -> u64 {
        self.numbers.get(index).copied().unwrap_or(0)
    }
}

/// `1` → `1.0.0`, `1.2-beta` → `1.2.0-beta`. Anything else is left alone.
fn pad(body: &str) -> String {
    let split = body.find(['-', '+']).unwrap_or(body.len());
    let (core, rest) = body.split_at(split);
    let components = core.split('.').count();
    let numeric = core.split('.').all(|c| !c.is_empty() && c.bytes().all(|b| b.is_ascii_digit()));
    if !numeric || components >= 3 {
        return body.to_string();
    }
    format!("{core}{}{rest}", ".0".repeat(3 - components))
}

fn loose(body: &str) -> (Vec<u64>, String) {
    let split = body.find(|c: char| !c.is_ascii_digit() && c != '.').unwrap_or(body.len());
    let (numeric, rest) = body.split_at(split);
    let numbers = numeric
        .split('.')
        .map(|component| match component {
            "" => 0,
            // Only digits remain, so the only possible failure is overflow.
            digits => digits.parse().unwrap_or(u64::MAX),
        })
        .collect();
    let pre = rest.split('+').next().unwrap_or_default();
    (numbers, pre.strip_prefix('-').unwrap_or(pre).to_string())
}
impl Default for LibraryVersion {
    fn default() -> Self {
        Self::parse("")
    }
}
impl FromStr for LibraryVersion {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
impl From<&str> for LibraryVersion {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}
impl From<String> for LibraryVersion {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl Ord for LibraryVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.numbers.len().max(other.numbers.len());
        for index in 0..len {
            match self.component(index).cmp(&other.component(index)) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        match (self.pre.is_empty(), other.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.pre.cmp(&other.pre),
        }
    }
}
impl PartialOrd for LibraryVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for LibraryVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for LibraryVersion {}
impl Hash for LibraryVersion {
    // Must agree with Eq: trailing zero components are insignificant.
    fn hash<H: Hasher>(&self, state: &mut H) {
        let significant = self.numbers.iter().rposition(|n| *n != 0).map_or(0, |i| i + 1);
        self.numbers[..significant].hash(state);
        self.pre.hash(state);
    }
}

impl Display for LibraryVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.raw)
    }
}

impl Serialize for LibraryVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
impl<'de> Deserialize<'de> for LibraryVersion {
    /// A `null` version is treated like a missing one: the lowest possible
    /// version, so any real version seen later replaces it.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.map(Self::from).unwrap_or_default())
    }
}
