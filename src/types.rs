use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of resource the launcher keeps an inventory of.
///
/// `Tool` is the install directory of the external binary; its "inventory"
/// is the algorithm catalog rather than a list of files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Hashes,
    Dictionaries,
    Rules,
    Masks,
    Tool,
}

impl ResourceCategory {
    /// The four directory-backed categories, in scan order.
    pub const DIRECTORIES: [ResourceCategory; 4] = [
        ResourceCategory::Hashes,
        ResourceCategory::Dictionaries,
        ResourceCategory::Rules,
        ResourceCategory::Masks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Hashes => "hashes",
            ResourceCategory::Dictionaries => "dictionaries",
            ResourceCategory::Rules => "rules",
            ResourceCategory::Masks => "masks",
            ResourceCategory::Tool => "tool",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attack mode understood by the external tool (`--attack-mode=<n>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackMode {
    /// Straight wordlist attack, optionally with rules.
    Dictionary,
    /// Two wordlists, every left word joined with every right word.
    Combinator,
    /// Brute force over a mask.
    Mask,
    /// Wordlist followed by a mask.
    HybridDictMask,
    /// Mask followed by a wordlist.
    HybridMaskDict,
}

impl AttackMode {
    /// Numeric code passed to the tool.
    pub fn code(&self) -> u8 {
        match self {
            AttackMode::Dictionary => 0,
            AttackMode::Combinator => 1,
            AttackMode::Mask => 3,
            AttackMode::HybridDictMask => 6,
            AttackMode::HybridMaskDict => 7,
        }
    }
}

impl Default for AttackMode {
    fn default() -> Self {
        AttackMode::Dictionary
    }
}

impl FromStr for AttackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dictionary" | "straight" | "0" => Ok(AttackMode::Dictionary),
            "combinator" | "combination" | "1" => Ok(AttackMode::Combinator),
            "mask" | "brute-force" | "3" => Ok(AttackMode::Mask),
            "hybrid-dict-mask" | "hybrid_dict_mask" | "6" => Ok(AttackMode::HybridDictMask),
            "hybrid-mask-dict" | "hybrid_mask_dict" | "7" => Ok(AttackMode::HybridMaskDict),
            other => Err(format!(
                "invalid attack mode: {other} (expected dictionary, combinator, mask, hybrid-dict-mask or hybrid-mask-dict)"
            )),
        }
    }
}
