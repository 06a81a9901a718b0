//! Robot subsystems a move can drive

use serde::{Deserialize, Serialize};
use std::fmt;

/// One independently controllable part of the robot body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    /// Manipulator arm and gripper
    Arm,
    /// Legs and footstep placement
    Legs,
    /// Body pose (height, orientation)
    Body,
}

impl Subsystem {
    /// All subsystems in declaration order
    pub const ALL: [Subsystem; 3] = [Subsystem::Arm, Subsystem::Legs, Subsystem::Body];
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Subsystem::Arm => "arm",
            Subsystem::Legs => "legs",
            Subsystem::Body => "body",
        })
    }
}

/// Set of subsystems driven by a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Subsystems {
    /// Move drives the arm
    #[serde(default)]
    pub arm: bool,
    /// Move drives the legs
    #[serde(default)]
    pub legs: bool,
    /// Move drives the body pose
    #[serde(default)]
    pub body: bool,
}

impl Subsystems {
    /// Empty set
    pub const NONE: Subsystems = Subsystems {
        arm: false,
        legs: false,
        body: false,
    };

    /// Arm only
    pub const ARM: Subsystems = Subsystems {
        arm: true,
        legs: false,
        body: false,
    };

    /// Legs and body together, the common case for locomotion moves
    pub const LEGS_BODY: Subsystems = Subsystems {
        arm: false,
        legs: true,
        body: true,
    };

    /// Body only
    pub const BODY: Subsystems = Subsystems {
        arm: false,
        legs: false,
        body: true,
    };

    /// Build a set from explicit flags
    pub const fn new(arm: bool, legs: bool, body: bool) -> Self {
        Self { arm, legs, body }
    }

    /// Whether the set contains `subsystem`
    pub fn contains(&self, subsystem: Subsystem) -> bool {
        match subsystem {
            Subsystem::Arm => self.arm,
            Subsystem::Legs => self.legs,
            Subsystem::Body => self.body,
        }
    }

    /// Whether two sets share at least one subsystem
    pub fn intersects(&self, other: &Subsystems) -> bool {
        (self.arm && other.arm) || (self.legs && other.legs) || (self.body && other.body)
    }

    /// Subsystems present in both sets
    pub fn shared_with(&self, other: &Subsystems) -> Vec<Subsystem> {
        self.iter().filter(|s| other.contains(*s)).collect()
    }

    /// Iterate the contained subsystems in declaration order
    pub fn iter(&self) -> impl Iterator<Item = Subsystem> + '_ {
        Subsystem::ALL.into_iter().filter(|s| self.contains(*s))
    }

    /// Whether no subsystem is driven
    pub fn is_empty(&self) -> bool {
        !(self.arm || self.legs || self.body)
    }
}

impl fmt::Display for Subsystems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<String> = self.iter().map(|s| s.to_string()).collect();
        f.write_str(&names.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_and_legs_do_not_intersect() {
        assert!(!Subsystems::ARM.intersects(&Subsystems::new(false, true, false)));
        assert!(Subsystems::LEGS_BODY.intersects(&Subsystems::BODY));
    }

    #[test]
    fn shared_subsystems_are_listed_in_order() {
        let shared = Subsystems::LEGS_BODY.shared_with(&Subsystems::new(true, true, true));
        assert_eq!(shared, vec![Subsystem::Legs, Subsystem::Body]);
        assert_eq!(Subsystems::LEGS_BODY.to_string(), "legs+body");
    }
}
