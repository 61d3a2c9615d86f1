use std::io::{self, Read};

use clap::Args;

use crate::catalog::Operation;
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct InvokeArgs {
    /// Tool call as JSON: {"name": "...", "arguments": {...}}. Read from stdin when omitted.
    pub call: Option<String>,
}

pub fn read_operation(args: InvokeArgs) -> AppResult<Operation> {
    let raw = match args.call {
        Some(call) => call,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Operation::from_tool_call(raw.trim())
}
