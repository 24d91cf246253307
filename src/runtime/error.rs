use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "Failed trying to execute utility '{utility}'. Make sure it is in your $PATH and you have execution permissions."
    )]
    ToolNotExecutable { utility: String },

    #[error(
        "Utility '{}' failed on execute '{}'{}",
        utility,
        cmd,
        Error::format_msg_as_detail(msg)
    )]
    ToolExecution {
        utility: String,
        cmd: String,
        msg: Option<String>,
    },

    #[error("Failed parsing {}{}", context, Error::format_msg_as_detail(msg))]
    Parse {
        context: String,
        msg: Option<String>,
    },

    #[error(
        "Contamination {contamination_pct}% plus unmapped {unmapped_pct}% exceeds the 101% consistency bound"
    )]
    InvariantViolation {
        contamination_pct: f64,
        unmapped_pct: f64,
    },

    #[error("No organisms in the screen table, cannot derive a contamination rate")]
    EmptyInput,

    #[error("No memory samples to aggregate, the invoker must at least supply the unsampled sentinel")]
    EmptySamples,

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    #[cold]
    pub fn tool_not_executable<U: Into<String>>(utility: U) -> Self {
        Error::ToolNotExecutable {
            utility: utility.into(),
        }
    }

    #[cold]
    pub fn tool_execution<U: Into<String>, C: Into<String>, M: Into<String>>(
        utility: U,
        cmd: C,
        msg: Option<M>,
    ) -> Self {
        Error::ToolExecution {
            utility: utility.into(),
            cmd: cmd.into(),
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn parse_error<C: Into<String>, M: Into<String>>(context: C, msg: Option<M>) -> Self {
        Error::Parse {
            context: context.into(),
            msg: msg.map(|m| m.into()),
        }
    }

    pub fn format_msg_as_detail(msg: &Option<String>) -> String {
        match msg {
            Some(m) => format!(" ({})", m),
            None => String::new(),
        }
    }
}
