mod stage;

pub use stage::{StageArgs, cmd_stage};
