mod builder;
mod orchestrator;


pub use builder::PocketcamAppBuilder;
pub use orchestrator::PocketcamApp;
