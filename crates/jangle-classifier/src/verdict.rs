//! Mapping from predicted class to Jangle's verdict

use jangle_core::{DURIAN, INEDIBLE};
use serde::Serialize;

/// Whether Jangle eats the thing, and why not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Edible and not durian
    WillEat,
    /// Durian, the one food Jangle refuses
    RefusesDurian,
    /// Not food at all
    RefusesInedible,
}

impl Verdict {
    /// Look up the verdict for a predicted label.
    ///
    /// Anything that is neither `durian` nor `inedible` is the edible class.
    pub fn for_label(label: &str) -> Self {
        match label {
            DURIAN => Self::RefusesDurian,
            INEDIBLE => Self::RefusesInedible,
            _ => Self::WillEat,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::WillEat => "✅ Jangle will eat this!",
            Self::RefusesDurian => "🚫 Jangle will NOT eat this! (It's durian)",
            Self::RefusesInedible => "🚫 Jangle will NOT eat this! (It's not food)",
        }
    }

    pub fn will_eat(&self) -> bool {
        matches!(self, Self::WillEat)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_table() {
        assert_eq!(Verdict::for_label("durian"), Verdict::RefusesDurian);
        assert_eq!(Verdict::for_label("inedible"), Verdict::RefusesInedible);
        assert_eq!(Verdict::for_label("non_durian_edible"), Verdict::WillEat);
        assert_eq!(Verdict::for_label("snacks"), Verdict::WillEat);
    }

    #[test]
    fn test_messages() {
        assert!(Verdict::RefusesDurian.message().contains("(It's durian)"));
        assert!(Verdict::RefusesInedible.message().contains("(It's not food)"));
        assert!(Verdict::WillEat.message().contains("will eat this!"));
        assert!(!Verdict::WillEat.message().contains("NOT"));
    }

    #[test]
    fn test_will_eat() {
        assert!(Verdict::WillEat.will_eat());
        assert!(!Verdict::RefusesDurian.will_eat());
        assert!(!Verdict::RefusesInedible.will_eat());
    }
}
