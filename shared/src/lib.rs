pub mod camera;
pub mod constants;
pub mod interaction;
pub mod loading;
pub mod ordering;
pub mod physics;
pub mod playback;
pub mod proximity;
pub mod scene;
pub mod session;
pub mod settings;
pub mod tween;
pub mod types;
pub mod vehicle;

pub use camera::CameraRig;
pub use interaction::{ClickOutcome, LidState, PairId, PairPhase, PairingError, PickRay};
pub use loading::{LoadError, LoadKind, LoadRequest, LoadedModel};
pub use ordering::{OrderingError, PositionKey, quick_sort, sort_full_population};
pub use physics::{BodyShape, ContactMaterial, PhysicsWorld};
pub use playback::Playback;
pub use proximity::{Prompt, PromptLabel, ProximityPhase};
pub use scene::{NodeId, NodeKind, PartState, SceneError, SceneGraph, SceneNode};
pub use session::{FrameReport, SceneSession};
pub use settings::SceneConfig;
pub use types::{Bounds, Pose, Quat, Vec3};
pub use vehicle::{DriveKey, KeyEdge};
