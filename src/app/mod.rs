mod headless;
mod indicator;
pub(crate) mod summary;

pub(crate) use headless::run_headless;
