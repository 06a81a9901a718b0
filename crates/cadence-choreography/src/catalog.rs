//! Move Catalog
//!
//! Static registry of known move types and their declared constraints. The
//! catalog is built once at startup (from the builtin table or a TOML file) and
//! is read-only afterwards, so it is shared behind an `Arc` without locking.

use cadence_core::config::{into_config_error, ConfigValidator};
use cadence_core::{
    CadenceError, CadenceResult, MoveInfo, MoveParamsKind, MoveParamsPayload, Subsystems,
    TransitionState,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Registry of move types keyed by name
#[derive(Debug, Clone, Default)]
pub struct MoveCatalog {
    moves: BTreeMap<String, MoveInfo>,
    move_params_config: String,
}

/// On-disk layout of a catalog file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Move declarations (`[[moves]]` tables)
    #[serde(default)]
    pub moves: Vec<MoveInfo>,
}

impl MoveCatalog {
    /// Build a catalog, rejecting duplicate names and inconsistent declarations.
    pub fn new(moves: Vec<MoveInfo>) -> CadenceResult<Self> {
        validate_declarations(&moves)?;

        let mut by_name = BTreeMap::new();
        for info in moves {
            if by_name.contains_key(&info.name) {
                return Err(CadenceError::config(format!(
                    "move '{}' is declared more than once",
                    info.name
                )));
            }
            by_name.insert(info.name.clone(), info);
        }

        debug!(moves = by_name.len(), "move catalog built");
        Ok(Self {
            moves: by_name,
            move_params_config: String::new(),
        })
    }

    /// Attach the raw move-parameter configuration returned by `ListAllMoves`.
    ///
    /// The text is passed through untouched.
    pub fn with_move_params_config(mut self, raw: impl Into<String>) -> Self {
        self.move_params_config = raw.into();
        self
    }

    /// Parse a catalog from TOML text
    pub fn from_toml_str(text: &str) -> CadenceResult<Self> {
        let file: CatalogFile = toml::from_str(text)?;
        Self::new(file.moves)
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> CadenceResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CadenceError::config(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        let catalog = Self::from_toml_str(&text)?;
        info!(path = %path.display(), moves = catalog.len(), "loaded move catalog");
        Ok(catalog)
    }

    /// Catalog of the standard move set
    pub fn builtin() -> CadenceResult<Self> {
        let catalog = Self::new(builtin_moves())?;
        let defaults = default_params_document()?;
        Ok(catalog.with_move_params_config(defaults))
    }

    /// All moves, ordered by name
    pub fn list_moves(&self) -> Vec<MoveInfo> {
        self.moves.values().cloned().collect()
    }

    /// Move declaration for `name`
    pub fn lookup(&self, name: &str) -> CadenceResult<&MoveInfo> {
        self.moves
            .get(name)
            .ok_or_else(|| CadenceError::not_found(format!("move type '{name}'")))
    }

    /// Whether `name` is a known move
    pub fn contains(&self, name: &str) -> bool {
        self.moves.contains_key(name)
    }

    /// Raw move-parameter configuration text
    pub fn move_params_config(&self) -> &str {
        &self.move_params_config
    }

    /// Number of moves
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

fn validate_declarations(moves: &[MoveInfo]) -> CadenceResult<()> {
    let mut validator = ConfigValidator::new();
    validator.each("moves", moves, |v, _, info| {
        v.custom("name", &info.name, |n| !n.trim().is_empty(), "must not be empty");
        v.range("move_length_slices", info.move_length_slices, Some(1), None);
        v.range("min_time", info.min_time, Some(0.0), None);
        v.custom(
            "max_time",
            &info.max_time,
            |max| *max >= info.min_time,
            "must not be below min_time",
        );
        v.custom(
            "entrance_states",
            &info.entrance_states,
            |states| !states.is_empty(),
            "must list at least one state",
        );
    });
    validator.result().map_err(into_config_error)
}

/// Default payload of every parameter kind, keyed by wire slot name, as JSON
fn default_params_document() -> CadenceResult<String> {
    let defaults: BTreeMap<&'static str, MoveParamsPayload> = MoveParamsKind::ALL
        .iter()
        .map(|kind| (kind.slot_name(), MoveParamsPayload::default_for(*kind)))
        .collect();
    Ok(serde_json::to_string_pretty(&defaults)?)
}

struct Builtin {
    name: &'static str,
    length: u32,
    extendable: bool,
    entrance: &'static [TransitionState],
    exit: TransitionState,
    min_time: f64,
    max_time: f64,
    controls: Subsystems,
    params: MoveParamsKind,
}

const ANY_POSTURE: &[TransitionState] = &[
    TransitionState::Unknown,
    TransitionState::Stand,
    TransitionState::Kneel,
    TransitionState::Sit,
    TransitionState::Sprawl,
];
const STAND: &[TransitionState] = &[TransitionState::Stand];
const KNEEL: &[TransitionState] = &[TransitionState::Kneel];
const STAND_OR_KNEEL: &[TransitionState] = &[TransitionState::Stand, TransitionState::Kneel];

const BUILTIN_MOVES: &[Builtin] = &[
    Builtin { name: "jump", length: 4, extendable: false, entrance: STAND, exit: TransitionState::Stand, min_time: 0.4, max_time: 4.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::Jump },
    Builtin { name: "rotate_body", length: 4, extendable: true, entrance: STAND, exit: TransitionState::Stand, min_time: 0.2, max_time: 10.0, controls: Subsystems::BODY, params: MoveParamsKind::RotateBody },
    Builtin { name: "step", length: 2, extendable: false, entrance: STAND, exit: TransitionState::Stand, min_time: 0.2, max_time: 4.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::Step },
    Builtin { name: "butt_circle", length: 8, extendable: true, entrance: STAND, exit: TransitionState::Stand, min_time: 1.0, max_time: 30.0, controls: Subsystems::BODY, params: MoveParamsKind::ButtCircle },
    Builtin { name: "turn", length: 4, extendable: false, entrance: STAND, exit: TransitionState::Stand, min_time: 0.5, max_time: 4.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::Turn },
    Builtin { name: "pace_2x", length: 4, extendable: false, entrance: STAND, exit: TransitionState::Stand, min_time: 0.5, max_time: 4.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::Pace2x },
    Builtin { name: "twerk", length: 2, extendable: false, entrance: STAND, exit: TransitionState::Stand, min_time: 0.2, max_time: 2.0, controls: Subsystems::BODY, params: MoveParamsKind::Twerk },
    Builtin { name: "chicken_head", length: 8, extendable: true, entrance: STAND, exit: TransitionState::Stand, min_time: 1.0, max_time: 60.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::ChickenHead },
    Builtin { name: "clap", length: 4, extendable: false, entrance: STAND, exit: TransitionState::Stand, min_time: 0.5, max_time: 4.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::Clap },
    Builtin { name: "front_up", length: 4, extendable: false, entrance: STAND, exit: TransitionState::Stand, min_time: 0.5, max_time: 4.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::FrontUp },
    Builtin { name: "sway", length: 4, extendable: true, entrance: STAND, exit: TransitionState::Stand, min_time: 0.4, max_time: 30.0, controls: Subsystems::BODY, params: MoveParamsKind::Sway },
    Builtin { name: "body_hold", length: 4, extendable: true, entrance: STAND, exit: TransitionState::Stand, min_time: 0.1, max_time: 60.0, controls: Subsystems::BODY, params: MoveParamsKind::BodyHold },
    Builtin { name: "arm_move", length: 4, extendable: true, entrance: ANY_POSTURE, exit: TransitionState::Unknown, min_time: 0.2, max_time: 30.0, controls: Subsystems::ARM, params: MoveParamsKind::ArmMove },
    Builtin { name: "kneel_leg_move", length: 4, extendable: true, entrance: KNEEL, exit: TransitionState::Stand, min_time: 0.5, max_time: 30.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::KneelLegMove },
    Builtin { name: "running_man", length: 4, extendable: true, entrance: STAND, exit: TransitionState::Stand, min_time: 1.0, max_time: 60.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::RunningMan },
    Builtin { name: "kneel_circle", length: 8, extendable: true, entrance: STAND_OR_KNEEL, exit: TransitionState::Kneel, min_time: 1.0, max_time: 30.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::KneelCircle },
    Builtin { name: "gripper", length: 1, extendable: true, entrance: ANY_POSTURE, exit: TransitionState::Unknown, min_time: 0.1, max_time: 10.0, controls: Subsystems::ARM, params: MoveParamsKind::Gripper },
    Builtin { name: "hop", length: 2, extendable: false, entrance: STAND, exit: TransitionState::Stand, min_time: 0.3, max_time: 2.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::Hop },
    Builtin { name: "random_rotate", length: 4, extendable: true, entrance: STAND, exit: TransitionState::Stand, min_time: 0.5, max_time: 60.0, controls: Subsystems::BODY, params: MoveParamsKind::RandomRotate },
    Builtin { name: "crawl", length: 4, extendable: true, entrance: STAND, exit: TransitionState::Stand, min_time: 1.0, max_time: 60.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::Crawl },
    Builtin { name: "side", length: 2, extendable: false, entrance: STAND, exit: TransitionState::Stand, min_time: 0.3, max_time: 2.0, controls: Subsystems::LEGS_BODY, params: MoveParamsKind::Side },
];

fn builtin_moves() -> Vec<MoveInfo> {
    BUILTIN_MOVES
        .iter()
        .map(|b| MoveInfo {
            name: b.name.to_string(),
            move_length_slices: b.length,
            is_extendable: b.extendable,
            entrance_states: b.entrance.iter().copied().collect(),
            exit_state: b.exit,
            min_time: b.min_time,
            max_time: b.max_time,
            controls: b.controls,
            params: b.params,
        })
        .collect()
}
