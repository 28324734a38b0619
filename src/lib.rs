#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod demo;
pub mod geometry;
pub mod layout;
pub mod layout_dump;
pub mod member;
pub mod presentation;
pub mod render;
pub mod stabilizer;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, ConfigError, load_config, parse_config};
pub use geometry::{BoundingBox, GeometryProvider, GeometrySnapshot, NodeRef, ViewportBox};
pub use layout::{
    ConnectorDescriptor, ConnectorKind, FamilyGroup, Generations, RowLayout, TreeLayout, compute_static_tree,
    compute_tree, group_by_generation, group_families, route_connectors,
};
pub use member::{Member, MemberError, MemberId, load_members, parse_members};
pub use presentation::{NavAction, Navigator, PresentationState, Transform, ViewMode, fit_transform};
pub use stabilizer::{LayoutStabilizer, RetrySchedule, SettleStrategy, SettledSignal};
