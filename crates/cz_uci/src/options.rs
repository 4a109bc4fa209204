// Copyright 2024 The chess-zero Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The UCI options surface (§6, §9): a tagged sum of option kinds rather
//! than the teacher's `option`/`option_check`/`option_spin`/... virtual
//! base hierarchy (`original_source/uci/uci.hpp`), with one variant --
//! `FloatRange` -- that has no counterpart there, added for the MCTS
//! tuning knobs (`PB C Base`, `Dirichlet Alpha`, ...) which are
//! real-valued rather than integer `spin`s.

use cz_utils::error::ProtocolError;

#[derive(Clone, Debug)]
pub enum OptionKind {
    Check { value: bool },
    Spin { value: i64, min: i64, max: i64 },
    Combo { value: String, alternatives: Vec<String> },
    Button,
    String { value: String },
    FloatRange { value: f64, min: f64, max: f64 },
}

impl OptionKind {
    /// Renders the `type ...` tail of a `uci`-time `option name <N> ...`
    /// announcement, mirroring each of the teacher's `option_*::insert`
    /// overrides.
    fn describe(&self) -> String {
        match self {
            OptionKind::Check { value } => format!("type check default {value}"),
            OptionKind::Spin { value, min, max } => format!("type spin default {value} min {min} max {max}"),
            OptionKind::Combo { value, alternatives } => {
                let mut out = format!("type combo default {value}");
                for alt in alternatives {
                    out.push_str(" var ");
                    out.push_str(alt);
                }
                out
            }
            OptionKind::Button => "type button".to_string(),
            OptionKind::String { value } => format!("type string default {value}"),
            OptionKind::FloatRange { value, min, max } => format!("type string default {value} min {min} max {max}"),
        }
    }

    fn set(&mut self, name: &str, raw: &str) -> Result<(), ProtocolError> {
        match self {
            OptionKind::Check { value } => {
                *value = match raw {
                    "true" => true,
                    "false" => false,
                    _ => return Err(ProtocolError::Malformed(format!("check option `{name}` value must be true/false"))),
                };
            }
            OptionKind::Spin { value, min, max } => {
                let parsed: i64 = raw
                    .parse()
                    .map_err(|_| ProtocolError::Malformed(format!("spin option `{name}` value `{raw}` is not an integer")))?;
                if parsed < *min || parsed > *max {
                    return Err(ProtocolError::OutOfRange { name: name.to_string(), value: raw.to_string() });
                }
                *value = parsed;
            }
            OptionKind::Combo { value, alternatives } => {
                if !alternatives.iter().any(|alt| alt == raw) {
                    return Err(ProtocolError::OutOfRange { name: name.to_string(), value: raw.to_string() });
                }
                *value = raw.to_string();
            }
            OptionKind::Button => {}
            OptionKind::String { value } => *value = raw.to_string(),
            OptionKind::FloatRange { value, min, max } => {
                let parsed: f64 = raw
                    .parse()
                    .map_err(|_| ProtocolError::Malformed(format!("float option `{name}` value `{raw}` is not a number")))?;
                if parsed < *min || parsed > *max {
                    return Err(ProtocolError::OutOfRange { name: name.to_string(), value: raw.to_string() });
                }
                *value = parsed;
            }
        }
        Ok(())
    }
}

/// A name-ordered registry of engine options, mirroring `uci::options` but
/// backed by an insertion-ordered `Vec` (a `uci`-command announcement
/// should list options in a stable, predictable order; the teacher's
/// `unordered_map` leaves that to hash iteration order).
#[derive(Clone, Debug, Default)]
pub struct Options {
    entries: Vec<(String, OptionKind)>,
}

impl Options {
    pub fn new() -> Self {
        Options::default()
    }

    pub fn add(&mut self, name: &str, kind: OptionKind) {
        self.entries.push((name.to_string(), kind));
    }

    fn find(&self, name: &str) -> Option<&OptionKind> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, kind)| kind)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut OptionKind> {
        self.entries.iter_mut().find(|(n, _)| n == name).map(|(_, kind)| kind)
    }

    pub fn set(&mut self, name: &str, value: &str) -> Result<(), ProtocolError> {
        self.find_mut(name).ok_or_else(|| ProtocolError::UnknownOption(name.to_string()))?.set(name, value)
    }

    pub fn get_bool(&self, name: &str) -> bool {
        match self.find(name) {
            Some(OptionKind::Check { value }) => *value,
            _ => panic!("`{name}` is not a registered check option"),
        }
    }

    pub fn get_i64(&self, name: &str) -> i64 {
        match self.find(name) {
            Some(OptionKind::Spin { value, .. }) => *value,
            _ => panic!("`{name}` is not a registered spin option"),
        }
    }

    pub fn get_f64(&self, name: &str) -> f64 {
        match self.find(name) {
            Some(OptionKind::FloatRange { value, .. }) => *value,
            _ => panic!("`{name}` is not a registered float-range option"),
        }
    }

    pub fn get_string(&self, name: &str) -> String {
        match self.find(name) {
            Some(OptionKind::String { value }) => value.clone(),
            Some(OptionKind::Combo { value, .. }) => value.clone(),
            _ => panic!("`{name}` is not a registered string/combo option"),
        }
    }

    /// One `option name <N> <type...>` line per registered option, the
    /// announcement sent in response to `uci`.
    pub fn to_uci_lines(&self) -> String {
        self.entries
            .iter()
            .map(|(name, kind)| format!("option name {name} {}", kind.describe()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_options() -> Options {
        let mut options = Options::new();
        options.add("Threads", OptionKind::Spin { value: 1, min: 1, max: 1 });
        options.add("PB C Base", OptionKind::FloatRange { value: 19652.0, min: 0.0, max: 1_000_000.0 });
        options
    }

    #[test]
    fn setting_a_spin_within_range_updates_its_value() {
        let mut options = sample_options();
        options.set("Threads", "1").unwrap();
        assert_eq!(options.get_i64("Threads"), 1);
    }

    #[test]
    fn setting_a_spin_out_of_range_is_rejected() {
        let mut options = sample_options();
        let err = options.set("Threads", "4").unwrap_err();
        assert!(matches!(err, ProtocolError::OutOfRange { .. }));
    }

    #[test]
    fn setting_an_unknown_option_is_rejected() {
        let mut options = sample_options();
        let err = options.set("Ponder", "true").unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownOption(_)));
    }

    #[test]
    fn float_range_accepts_values_within_bounds() {
        let mut options = sample_options();
        options.set("PB C Base", "20000.0").unwrap();
        assert!((options.get_f64("PB C Base") - 20000.0).abs() < 1e-9);
    }

    #[test]
    fn float_range_rejects_non_numeric_values() {
        let mut options = sample_options();
        let err = options.set("PB C Base", "not-a-number").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }
}
