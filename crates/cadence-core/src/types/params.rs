//! Move-specific parameter payloads
//!
//! Every move instance carries exactly one payload drawn from a closed set of
//! parameter kinds. The set is declared once through `move_params!`, which
//! generates the typed payload enum, its kind discriminant, and the slot struct
//! used by the wire form (one optional field per kind).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-component vector in the robot body frame (metres or m/s)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec3 {
    /// Forward component
    pub x: f64,
    /// Left component
    pub y: f64,
    /// Up component
    pub z: f64,
}

/// Planar offset (metres)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec2 {
    /// Forward component
    pub x: f64,
    /// Left component
    pub y: f64,
}

/// Body orientation as yaw/pitch/roll (radians)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EulerZyx {
    /// Yaw (radians)
    pub yaw: f64,
    /// Pitch (radians)
    pub pitch: f64,
    /// Roll (radians)
    pub roll: f64,
}

/// Point of the body a rotation pivots around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pivot {
    /// Front hips
    Front,
    /// Body centre
    #[default]
    Center,
    /// Hind hips
    Hind,
}

/// Foot selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    /// Front left foot
    #[default]
    FrontLeft,
    /// Front right foot
    FrontRight,
    /// Hind left foot
    HindLeft,
    /// Hind right foot
    HindRight,
}

/// Interpolation profile between keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant rate
    #[default]
    Linear,
    /// Quadratic ease in and out
    QuadraticInOut,
    /// Cubic ease in and out
    CubicInOut,
    /// Exponential ease
    Exponential,
}

/// Where the front feet rest during a kneeling circle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KneelLocation {
    /// Body centre
    #[default]
    Center,
    /// Left of the body
    Left,
    /// Right of the body
    Right,
}

/// Two-footed jump with an optional turn and translation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpParams {
    /// Yaw change (radians)
    pub yaw: f64,
    /// Slices spent airborne
    pub flight_slices: u32,
    /// Distance between left and right feet (metres)
    pub stance_width: f64,
    /// Distance between front and hind feet (metres)
    pub stance_length: f64,
    /// Body translation (metres)
    pub translation: Vec2,
    /// Fraction of the move spent in the first half of a split jump
    pub split_fraction: f64,
}

/// Body rotation in place
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateBodyParams {
    /// Target body orientation
    pub rotation: EulerZyx,
    /// Return to the starting orientation before the move ends
    pub return_to_start_pose: bool,
}

/// Single step, optionally with a second foot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepParams {
    /// Foot that steps
    pub foot: Leg,
    /// Foot displacement (metres)
    pub offset: Vec3,
    /// Foot stepping together with `foot`, if any
    pub second_foot: Option<Leg>,
    /// Foot clearance during swing (metres)
    pub swing_height: f64,
    /// Vertical foot speed at liftoff (m/s)
    pub liftoff_velocity: f64,
    /// Vertical foot speed at touchdown (m/s)
    pub touchdown_velocity: f64,
    /// Mirror the move left to right
    pub mirror: bool,
}

/// Hips tracing circles around a pivot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtCircleParams {
    /// Circle radius (metres)
    pub radius: f64,
    /// Slices per full circle
    pub beats_per_circle: u32,
    /// Circles completed over the move
    pub number_of_circles: f64,
    /// Point the rotation pivots around
    pub pivot: Pivot,
    /// Circle clockwise as seen from above
    pub clockwise: bool,
    /// Angle the circle starts from (radians)
    pub starting_angle: f64,
}

/// Turn in place on all four feet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnParams {
    /// Total yaw change (radians)
    pub yaw: f64,
    /// Body height above the ground during the turn (metres)
    pub ground_clearance: f64,
    /// Foot clearance during swing (metres)
    pub swing_height: f64,
    /// Foot speed during swing (m/s)
    pub swing_velocity: f64,
}

/// Pacing gait at double time
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pace2xParams {
    /// Yaw change (radians)
    pub yaw: f64,
    /// Foot clearance during swing (metres)
    pub swing_height: f64,
    /// Foot speed during swing (m/s)
    pub swing_velocity: f64,
}

/// Rapid hind-leg bounce
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TwerkParams {
    /// Bounce height (metres)
    pub height: f64,
}

/// Body bobbing while the gripper holds still in the world
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChickenHeadParams {
    /// Bob amplitude along each axis (metres)
    pub bob_magnitude: Vec3,
    /// Slices per bob cycle
    pub beats_per_cycle: u32,
    /// Let the gripper follow the body instead of holding still
    pub follow: bool,
}

/// Gripper clap at a point relative to the body
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClapParams {
    /// Clap direction in the body frame (radians)
    pub direction: f64,
    /// Clap position in the body frame (metres)
    pub location: Vec3,
    /// Gripper speed (m/s)
    pub speed: f64,
    /// Gripper travel between claps (metres)
    pub clap_distance: f64,
}

/// Front legs lifted off the ground
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontUpParams {
    /// Mirror the move left to right
    pub mirror: bool,
}

/// Rhythmic body sway
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwayParams {
    /// Vertical sway amplitude (metres)
    pub vertical: f64,
    /// Horizontal sway amplitude (metres)
    pub horizontal: f64,
    /// Roll amplitude (radians)
    pub roll: f64,
    /// Point the rotation pivots around
    pub pivot: Pivot,
    /// Emphasis of the sway, 0 to 1
    pub pronounced: f64,
}

/// Static body pose held for the move's duration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyHoldParams {
    /// Target body orientation
    pub rotation: EulerZyx,
    /// Body translation (metres)
    pub translation: Vec3,
    /// Slices spent moving into the pose
    pub entry_slices: u32,
    /// Slices spent moving out of the pose
    pub exit_slices: u32,
}

/// Arm joint targets interpolated over the move
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmMoveParams {
    /// Shoulder joint 0 target (radians)
    pub shoulder_0: f64,
    /// Shoulder joint 1 target (radians)
    pub shoulder_1: f64,
    /// Elbow joint 0 target (radians)
    pub elbow_0: f64,
    /// Elbow joint 1 target (radians)
    pub elbow_1: f64,
    /// Wrist joint 0 target (radians)
    pub wrist_0: f64,
    /// Wrist joint 1 target (radians)
    pub wrist_1: f64,
    /// Interpolation profile toward the targets
    pub easing: Easing,
    /// Gripper open angle (radians)
    pub gripper: f64,
}

/// Front leg joint targets while kneeling
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KneelLegMoveParams {
    /// Left hip x joint target (radians)
    pub left_hip_x: f64,
    /// Left hip y joint target (radians)
    pub left_hip_y: f64,
    /// Left knee joint target (radians)
    pub left_knee: f64,
    /// Right hip x joint target (radians)
    pub right_hip_x: f64,
    /// Right hip y joint target (radians)
    pub right_hip_y: f64,
    /// Right knee joint target (radians)
    pub right_knee: f64,
    /// Interpolation profile toward the targets
    pub easing: Easing,
}

/// Running man dance step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunningManParams {
    /// Foot clearance during swing (metres)
    pub swing_height: f64,
    /// Lateral spread of the feet (metres)
    pub spread: f64,
    /// Run the step backwards
    pub reverse: bool,
    /// Cadence multiplier relative to the tempo
    pub speed_multiplier: f64,
    /// Cycles spent getting into the step
    pub pre_move_cycles: u32,
    /// Stride length (metres)
    pub stride_length: f64,
}

/// Body circles while kneeling on the front legs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KneelCircleParams {
    /// Where the front feet rest
    pub location: KneelLocation,
    /// Slices per full circle
    pub beats_per_circle: u32,
    /// Circles completed over the move
    pub number_of_circles: f64,
    /// Body offset from the kneeling point (metres)
    pub offset: f64,
    /// Circle size (metres)
    pub size: f64,
    /// Circle clockwise as seen from above
    pub clockwise: bool,
}

/// Gripper open angle change
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GripperParams {
    /// Target open angle (radians)
    pub angle: f64,
    /// Angular speed (rad/s)
    pub speed: f64,
}

/// Repeated hops with a body velocity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HopParams {
    /// Body velocity during the hops (m/s)
    pub velocity: Vec3,
    /// Yaw rate (rad/s)
    pub yaw_rate: f64,
    /// Time on the ground between hops (seconds)
    pub stand_time: f64,
}

/// Randomised body rotation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomRotateParams {
    /// Rotation amplitude per axis (radians)
    pub amplitude: EulerZyx,
    /// Mean rotation speed (rad/s)
    pub speed: f64,
    /// Relative spread of speeds
    pub speed_variation: f64,
    /// Number of distinct speeds
    pub num_speed_tiers: u32,
    /// Spread between speed tiers
    pub tier_variation: f64,
}

/// Low crawling gait
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlParams {
    /// Slices per leg swing
    pub swing_slices: u32,
    /// Forward speed (m/s)
    pub velocity: f64,
    /// Distance between left and right feet (metres)
    pub stance_width: f64,
    /// Distance between front and hind feet (metres)
    pub stance_length: f64,
}

/// Side step with a leading and trailing foot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SideParams {
    /// Foot that moves first
    pub lead: Leg,
    /// Foot that follows
    pub trail: Leg,
    /// Sideways step distance (metres)
    pub offset: f64,
    /// Exaggerate the step
    pub strut: bool,
    /// Foot clearance during swing (metres)
    pub swing_height: f64,
}

macro_rules! move_params {
    ($( $variant:ident => $slot:ident : $ty:ty ),+ $(,)?) => {
        /// Discriminant of a parameter payload
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum MoveParamsKind {
            $(
                #[doc = concat!("Carried in `", stringify!($slot), "`")]
                $variant
            ),+
        }

        impl MoveParamsKind {
            /// Every kind in declaration order
            pub const ALL: &'static [MoveParamsKind] = &[$(MoveParamsKind::$variant),+];

            /// Name of the wire field carrying this kind
            pub fn slot_name(&self) -> &'static str {
                match self {
                    $(MoveParamsKind::$variant => stringify!($slot)),+
                }
            }
        }

        /// Typed parameter payload of a move instance
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum MoveParamsPayload {
            $(
                #[doc = concat!("[`", stringify!($ty), "`] payload")]
                $variant($ty)
            ),+
        }

        impl MoveParamsPayload {
            /// Kind of this payload
            pub fn kind(&self) -> MoveParamsKind {
                match self {
                    $(MoveParamsPayload::$variant(_) => MoveParamsKind::$variant),+
                }
            }

            /// Default payload for `kind`
            pub fn default_for(kind: MoveParamsKind) -> Self {
                match kind {
                    $(MoveParamsKind::$variant => MoveParamsPayload::$variant(<$ty>::default())),+
                }
            }
        }

        /// Wire form of the payload one-of: one optional slot per kind.
        ///
        /// A well-formed record has exactly one slot filled.
        #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
        pub struct MoveParamsSlots {
            $(
                #[doc = concat!("Slot for [`", stringify!($ty), "`]")]
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $slot: Option<$ty>,
            )+
        }

        impl MoveParamsSlots {
            /// Kinds whose slot is filled, in declaration order
            pub fn filled(&self) -> Vec<MoveParamsKind> {
                let mut kinds = Vec::new();
                $(
                    if self.$slot.is_some() {
                        kinds.push(MoveParamsKind::$variant);
                    }
                )+
                kinds
            }

            /// Collapse the slots into a typed payload.
            pub fn into_payload(self) -> Result<MoveParamsPayload, PayloadShapeError> {
                let filled = self.filled();
                match filled.len() {
                    0 => Err(PayloadShapeError::Missing),
                    1 => {
                        $(
                            if let Some(params) = self.$slot {
                                return Ok(MoveParamsPayload::$variant(params));
                            }
                        )+
                        Err(PayloadShapeError::Missing)
                    }
                    _ => Err(PayloadShapeError::Multiple(filled)),
                }
            }
        }

        impl From<MoveParamsPayload> for MoveParamsSlots {
            fn from(payload: MoveParamsPayload) -> Self {
                let mut slots = MoveParamsSlots::default();
                match payload {
                    $(MoveParamsPayload::$variant(params) => slots.$slot = Some(params)),+
                }
                slots
            }
        }
    };
}

move_params! {
    Jump => jump_params: JumpParams,
    RotateBody => rotate_body_params: RotateBodyParams,
    Step => step_params: StepParams,
    ButtCircle => butt_circle_params: ButtCircleParams,
    Turn => turn_params: TurnParams,
    Pace2x => pace_2x_params: Pace2xParams,
    Twerk => twerk_params: TwerkParams,
    ChickenHead => chicken_head_params: ChickenHeadParams,
    Clap => clap_params: ClapParams,
    FrontUp => front_up_params: FrontUpParams,
    Sway => sway_params: SwayParams,
    BodyHold => body_hold_params: BodyHoldParams,
    ArmMove => arm_move_params: ArmMoveParams,
    KneelLegMove => kneel_leg_move_params: KneelLegMoveParams,
    RunningMan => running_man_params: RunningManParams,
    KneelCircle => kneel_circle_params: KneelCircleParams,
    Gripper => gripper_params: GripperParams,
    Hop => hop_params: HopParams,
    RandomRotate => random_rotate_params: RandomRotateParams,
    Crawl => crawl_params: CrawlParams,
    Side => side_params: SideParams,
}

/// Why a wire payload could not be collapsed into a single typed payload
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadShapeError {
    /// No slot was filled
    #[error("no parameter payload present")]
    Missing,
    /// More than one slot was filled
    #[error("multiple parameter payloads present: {}", slot_list(.0))]
    Multiple(Vec<MoveParamsKind>),
}

fn slot_list(kinds: &[MoveParamsKind]) -> String {
    kinds
        .iter()
        .map(MoveParamsKind::slot_name)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for MoveParamsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slot_name().trim_end_matches("_params"))
    }
}

impl MoveParamsPayload {
    /// One-line human summary of the salient parameters
    pub fn describe(&self) -> String {
        match self {
            MoveParamsPayload::Jump(p) => {
                format!("jump yaw={:.2} flight_slices={}", p.yaw, p.flight_slices)
            }
            MoveParamsPayload::RotateBody(p) => format!(
                "rotate_body yaw={:.2} pitch={:.2} roll={:.2}",
                p.rotation.yaw, p.rotation.pitch, p.rotation.roll
            ),
            MoveParamsPayload::Step(p) => format!(
                "step foot={:?} offset=({:.2},{:.2},{:.2})",
                p.foot, p.offset.x, p.offset.y, p.offset.z
            ),
            MoveParamsPayload::ButtCircle(p) => format!(
                "butt_circle radius={:.2} circles={:.1} pivot={:?}",
                p.radius, p.number_of_circles, p.pivot
            ),
            MoveParamsPayload::Turn(p) => format!("turn yaw={:.2}", p.yaw),
            MoveParamsPayload::Pace2x(p) => format!("pace_2x yaw={:.2}", p.yaw),
            MoveParamsPayload::Twerk(p) => format!("twerk height={:.2}", p.height),
            MoveParamsPayload::ChickenHead(p) => {
                format!("chicken_head beats_per_cycle={}", p.beats_per_cycle)
            }
            MoveParamsPayload::Clap(p) => format!("clap speed={:.2}", p.speed),
            MoveParamsPayload::FrontUp(p) => format!("front_up mirror={}", p.mirror),
            MoveParamsPayload::Sway(p) => format!(
                "sway vertical={:.2} horizontal={:.2}",
                p.vertical, p.horizontal
            ),
            MoveParamsPayload::BodyHold(p) => format!(
                "body_hold entry={} exit={}",
                p.entry_slices, p.exit_slices
            ),
            MoveParamsPayload::ArmMove(p) => {
                format!("arm_move easing={:?} gripper={:.2}", p.easing, p.gripper)
            }
            MoveParamsPayload::KneelLegMove(p) => format!("kneel_leg_move easing={:?}", p.easing),
            MoveParamsPayload::RunningMan(p) => format!(
                "running_man stride={:.2} reverse={}",
                p.stride_length, p.reverse
            ),
            MoveParamsPayload::KneelCircle(p) => format!(
                "kneel_circle location={:?} circles={:.1}",
                p.location, p.number_of_circles
            ),
            MoveParamsPayload::Gripper(p) => format!("gripper angle={:.2}", p.angle),
            MoveParamsPayload::Hop(p) => format!("hop yaw_rate={:.2}", p.yaw_rate),
            MoveParamsPayload::RandomRotate(p) => format!("random_rotate speed={:.2}", p.speed),
            MoveParamsPayload::Crawl(p) => format!("crawl velocity={:.2}", p.velocity),
            MoveParamsPayload::Side(p) => format!("side lead={:?} offset={:.2}", p.lead, p.offset),
        }
    }
}
