use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Control flags a user can put in the trigger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    /// Reply to the parent of the summoning message instead
    Parent,
    WhyWarren,
    StateOfRace,
}

impl Flag {
    pub const ALL: [Flag; 3] = [Flag::Parent, Flag::WhyWarren, Flag::StateOfRace];

    /// Every spelling that selects this flag.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Parent => &["--parent", "--tell-parent"],
            Self::WhyWarren => &["--why-warren"],
            Self::StateOfRace => &["--state-of-race", "--state-of-the-race", "--status-check"],
        }
    }

    pub fn from_alias(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.aliases().contains(&token))
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::WhyWarren => "why_warren",
            Self::StateOfRace => "state_of_race",
        }
    }
}

/// Membership-only set of flags present in a message.
pub type Options = BTreeSet<Flag>;
