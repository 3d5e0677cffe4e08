//! Scene model and interaction engine for the Inkboard diagramming canvas.
//!
//! The crate compiles to WebAssembly for the browser and natively for tests
//! and the `inkboard` CLI. It owns the element and connection stores, turns
//! raw pointer events into scene mutations, keeps pan/zoom camera state, and
//! draws each frame to a 2D surface. The host page wires DOM events to the
//! [`engine::Engine`] and reacts to the [`engine::Action`]s it returns
//! (persisting snapshots, opening the text editor, setting the cursor).
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Pointer state machine ([`engine::EngineCore`]) and the browser-facing wrapper |
//! | [`doc`] | Element and connection types, the stores, and the [`doc::Scene`] arena |
//! | [`geometry`] | Rotation, outlines, containment, and boundary snapping |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Tools, modifiers, and the gesture state enum |
//! | [`hit`] | Handle and element hit-testing |
//! | [`transform`] | Snapshot-based translate, resize, and rotate |
//! | [`binding`] | Arrow endpoint snapping and connection creation |
//! | [`render`] | Frame drawing over the [`render::Surface`] trait |
//! | [`presence`] | Peer cursor publish/subscribe |
//! | [`config`] | Runtime tunables |
//! | [`consts`] | Shared numeric constants |

pub mod binding;
pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod geometry;
pub mod hit;
pub mod input;
pub mod presence;
pub mod render;
pub mod transform;
