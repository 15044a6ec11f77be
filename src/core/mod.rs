//! Core geometry shared by every part of the globe scene.

pub mod coordinates;
