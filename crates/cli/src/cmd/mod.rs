mod assemble;
mod generate;
mod info;

pub use assemble::{AssembleArgs, cmd_assemble};
pub use generate::{GenerateArgs, cmd_generate};
pub use info::cmd_info;
