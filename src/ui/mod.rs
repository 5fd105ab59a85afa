//! Terminal UI: a single-screen dashboard with a progress gauge and a
//! results panel, driven by the main-thread poll loop.

pub(crate) mod model;
pub(crate) mod render;
#[cfg(test)]
mod tests;

pub(crate) use render::run_ui;
