//! Terminal presentation: theme, frame composition and the render loop.

pub mod runtime;
pub mod theme;
pub mod view;
