pub mod loading;
pub mod pipeline;
